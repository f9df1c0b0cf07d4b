// src/common/error.rs

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::documents::{DocumentAction, DocumentKindTag};
use crate::models::rbac::PermissionCode;
use crate::models::register::DrawerEventType;

const GENERIC_FORBIDDEN: &str = "Você não tem permissão para realizar esta ação.";
const GENERIC_VALIDATION: &str = "Um ou mais campos são inválidos.";
const GENERIC_SERVER: &str = "Ocorreu um erro inesperado no servidor.";

/// As quatro famílias de falha que a interface trata de forma diferente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Sem resposta do servidor. O status da sessão fica como está.
    Network,
    /// Token inválido ou ausente. A sessão é limpa.
    Authentication,
    /// Permissão negada (prevista no cliente ou 403 do servidor).
    Authorization,
    /// Entrada inválida ou transição inválida.
    Validation,
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    // A mensagem é genérica de propósito; o detalhe vai só para o log.
    #[error("Não foi possível conectar ao servidor. Verifique sua conexão.")]
    Network(String),

    #[error("Sessão inválida ou expirada. Faça login novamente.")]
    Unauthorized,

    #[error("Usuário ou senha inválidos.")]
    InvalidCredentials,

    #[error("Nenhuma sessão ativa. Faça login para continuar.")]
    NotAuthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("Você precisa da permissão '{0}' para realizar esta ação.")]
    MissingPermission(PermissionCode),

    #[error("A operação '{0}' exige autorização de gerente (permissão MANAGE_REGISTER).")]
    ManagerApprovalRequired(DrawerEventType),

    #[error("A permissão '{0}' é protegida e não pode ser concedida nem revogada por exceção.")]
    ProtectedPermission(PermissionCode),

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Mensagem do servidor repassada sem alteração, ou pré-validação do cliente.
    #[error("{0}")]
    Validation(String),

    #[error("A ação '{action}' não é permitida para documentos com status {status}.")]
    InvalidTransition { status: String, action: DocumentAction },

    #[error("Já existe um(a) {0} em elaboração. Conclua ou descarte antes de iniciar outro(a).")]
    DraftAlreadyActive(DocumentKindTag),

    #[error("Nenhum documento em elaboração.")]
    NoActiveDraft,

    #[error("Este caixa já tem um turno aberto por outro operador.")]
    RegisterOccupied { register_id: Uuid, operator_id: Uuid },

    #[error("Você já tem um turno aberto em outro caixa.")]
    ShiftAlreadyOpen { register_id: Uuid },

    #[error("Nenhum turno aberto neste caixa.")]
    NoOpenShift,

    // O fechamento foi aceito; só a releitura do resultado falhou.
    #[error("Turno fechado, mas não foi possível consultar o resultado. Consulte o turno novamente para ver a diferença de caixa.")]
    ShiftClosedUnconfirmed {
        session_id: Uuid,
        #[source]
        source: Box<AppError>,
    },

    #[error("Aguarde a conclusão da operação em andamento.")]
    RequestInFlight,

    #[error("A resposta foi descartada porque a seleção mudou durante a requisição.")]
    Superseded,

    #[error("Erro do servidor ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Resposta inválida do servidor: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Erro interno: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Network(_) => ErrorCategory::Network,

            AppError::ShiftClosedUnconfirmed { source, .. } => source.category(),

            AppError::Unauthorized | AppError::InvalidCredentials | AppError::NotAuthenticated => {
                ErrorCategory::Authentication
            }

            AppError::Forbidden(_)
            | AppError::MissingPermission(_)
            | AppError::ManagerApprovalRequired(_) => ErrorCategory::Authorization,

            AppError::ProtectedPermission(_)
            | AppError::ValidationError(_)
            | AppError::Validation(_)
            | AppError::InvalidTransition { .. }
            | AppError::DraftAlreadyActive(_)
            | AppError::NoActiveDraft
            | AppError::RegisterOccupied { .. }
            | AppError::ShiftAlreadyOpen { .. }
            | AppError::NoOpenShift
            | AppError::RequestInFlight => ErrorCategory::Validation,

            AppError::Superseded
            | AppError::Server { .. }
            | AppError::Decode(_)
            | AppError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// Só um 401 de uma requisição autenticada derruba a sessão.
    pub fn clears_session(&self) -> bool {
        matches!(self, AppError::Unauthorized)
    }

    /// Texto para o painel que disparou a ação.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationError(errors) => {
                let mut messages: Vec<String> = Vec::new();
                for (field, field_errors) in errors.field_errors() {
                    for e in field_errors.iter() {
                        match &e.message {
                            Some(m) => messages.push(format!("{}: {}", field, m)),
                            None => messages.push(format!("{}: {}", field, e.code)),
                        }
                    }
                }
                messages.sort();

                if messages.is_empty() {
                    GENERIC_VALIDATION.to_string()
                } else {
                    messages.join("; ")
                }
            }
            other => other.to_string(),
        }
    }

    /// Converte uma resposta de erro do servidor.
    /// O corpo segue o formato `{ "error": "...", "details": {...} }`.
    pub fn from_response(status: u16, body: &str) -> AppError {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_message);

        match status {
            401 => AppError::Unauthorized,
            403 => AppError::Forbidden(message.unwrap_or_else(|| GENERIC_FORBIDDEN.to_string())),
            400 | 404 | 409 | 422 => {
                AppError::Validation(message.unwrap_or_else(|| GENERIC_VALIDATION.to_string()))
            }
            _ => AppError::Server {
                status,
                message: message.unwrap_or_else(|| GENERIC_SERVER.to_string()),
            },
        }
    }
}

// O corpo de erro que a API devolve
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    // Alguns endpoints antigos usam "message"
    pub message: Option<String>,
    pub details: Option<Value>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error
            .or(self.message)
            .filter(|m| !m.trim().is_empty())
    }
}
