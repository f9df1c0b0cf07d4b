// src/models/documents.rs

// Tipos comuns aos documentos operacionais (devolução, transferência, contagem).
// Cada tipo concreto vive no seu próprio módulo e implementa `DocumentKind`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::models::rbac::PermissionCode;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKindTag {
    Return,
    Transfer,
    Count,
}

impl fmt::Display for DocumentKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKindTag::Return => f.write_str("devolução"),
            DocumentKindTag::Transfer => f.write_str("transferência"),
            DocumentKindTag::Count => f.write_str("contagem"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentAction {
    Approve,
    Reject,
    Complete,
    Ship,
    Receive,
    Cancel,
    Post,
}

impl DocumentAction {
    pub const ALL: [DocumentAction; 7] = [
        DocumentAction::Approve,
        DocumentAction::Reject,
        DocumentAction::Complete,
        DocumentAction::Ship,
        DocumentAction::Receive,
        DocumentAction::Cancel,
        DocumentAction::Post,
    ];

    // Segmento final da rota: POST /api/{kind}/{id}/{action}
    pub fn path_segment(self) -> &'static str {
        match self {
            DocumentAction::Approve => "approve",
            DocumentAction::Reject => "reject",
            DocumentAction::Complete => "complete",
            DocumentAction::Ship => "ship",
            DocumentAction::Receive => "receive",
            DocumentAction::Cancel => "cancel",
            DocumentAction::Post => "post",
        }
    }
}

impl fmt::Display for DocumentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

// --- Tabela de transições ---

pub trait DocumentStatus:
    fmt::Debug + fmt::Display + Copy + Eq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Todos os status, o inicial primeiro.
    const ALL: &'static [Self];

    fn initial() -> Self {
        Self::ALL[0]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Transition<S: 'static> {
    pub action: DocumentAction,
    pub from: &'static [S],
    pub to: S,
}

#[derive(Debug)]
pub struct TransitionTable<S: 'static> {
    edges: &'static [Transition<S>],
}

impl<S: DocumentStatus> TransitionTable<S> {
    pub const fn new(edges: &'static [Transition<S>]) -> Self {
        Self { edges }
    }

    /// Status de destino, se `action` for uma aresta de saída de `from`.
    pub fn target(&self, from: S, action: DocumentAction) -> Option<S> {
        self.edges
            .iter()
            .find(|t| t.action == action && t.from.contains(&from))
            .map(|t| t.to)
    }

    pub fn actions_from(&self, from: S) -> Vec<DocumentAction> {
        self.edges
            .iter()
            .filter(|t| t.from.contains(&from))
            .map(|t| t.action)
            .collect()
    }

    pub fn is_terminal(&self, status: S) -> bool {
        !self.edges.iter().any(|t| t.from.contains(&status))
    }

    pub fn edges(&self) -> &'static [Transition<S>] {
        self.edges
    }
}

// --- Escopo de loja ---

/// Uma loja só, ou origem/destino no caso das transferências.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreScope {
    #[serde(rename_all = "camelCase")]
    Transfer { from_store_id: Uuid, to_store_id: Uuid },
    #[serde(rename_all = "camelCase")]
    Single { store_id: Uuid },
}

// --- O tipo de documento ---

/// Descreve um tipo de documento para o motor genérico de workflow:
/// tabela de transições, formato das linhas e regras de quantidade.
pub trait DocumentKind: fmt::Debug + Clone + Send + Sync + 'static {
    type Status: DocumentStatus;
    /// Linha como o servidor devolve.
    type Line: fmt::Debug + Clone + Serialize + DeserializeOwned + Send + Sync;
    /// Linha como a tela monta.
    type LineInput: Send;
    /// Linha como vai para o servidor.
    type LinePayload: Serialize + Send + Sync;
    /// Cabeçalho do documento (POST /api/{kind}).
    type Header: Serialize + Validate + Send + Sync;

    const TAG: DocumentKindTag;
    /// Segmento da rota: "returns", "transfers", "counts".
    const RESOURCE: &'static str;

    fn transitions() -> &'static TransitionTable<Self::Status>;

    /// Criar o documento e incluir linhas.
    fn draft_permission() -> PermissionCode;

    fn action_permission(action: DocumentAction) -> PermissionCode;

    fn check_header(header: &Self::Header) -> Result<(), AppError> {
        header.validate()?;
        Ok(())
    }

    /// Pré-validação da linha. O servidor valida de novo e tem a palavra final.
    fn prepare_line(input: Self::LineInput) -> Result<Self::LinePayload, AppError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct Document<K: DocumentKind> {
    pub id: Uuid,
    #[serde(flatten)]
    pub scope: StoreScope,
    pub status: K::Status,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub lines: Vec<K::Line>,
}

impl<K: DocumentKind> Document<K> {
    pub fn kind(&self) -> DocumentKindTag {
        K::TAG
    }

    pub fn is_terminal(&self) -> bool {
        K::transitions().is_terminal(self.status)
    }

    pub fn is_draft(&self) -> bool {
        self.status == K::Status::initial()
    }

    /// Ações que a tabela permite a partir do status atual.
    pub fn allowed_actions(&self) -> Vec<DocumentAction> {
        K::transitions().actions_from(self.status)
    }
}
