// src/services/session_store.rs

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::error::AppError;
use crate::models::auth::{Identity, User};
use crate::models::rbac::{PermissionCode, PermissionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Validação da sessão em andamento (ou sem resposta do servidor).
    Unknown,
    Authenticated,
    Guest,
}

/// Token bearer opaco. Nunca aparece em logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        SessionToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// O que cada chamada de saída recebe: o token e a geração da sessão que o emitiu.
#[derive(Debug, Clone)]
pub struct SessionContext {
    token: SessionToken,
    generation: u64,
}

impl SessionContext {
    pub fn bearer(&self) -> &str {
        self.token.as_str()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
struct SessionState {
    status: AuthStatus,
    token: Option<SessionToken>,
    identity: Option<Identity>,
    // Incrementa a cada login/logout; respostas de gerações antigas são ignoradas
    generation: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            status: AuthStatus::Guest,
            token: None,
            identity: None,
            generation: 0,
        }
    }
}

/// Dono único do token. Escrito só por login/logout/401, lido por toda requisição.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Escrita (login, logout, 401) ---

    /// Guarda um token novo. A identidade só chega depois do `validate`.
    pub fn begin_session(&self, token: SessionToken) -> SessionContext {
        let mut state = self.inner.write();
        state.generation += 1;
        state.token = Some(token.clone());
        state.identity = None;
        state.status = AuthStatus::Unknown;

        SessionContext { token, generation: state.generation }
    }

    /// Marca a sessão atual como "validando" (tela de carregamento).
    pub fn mark_validating(&self) -> Option<SessionContext> {
        let mut state = self.inner.write();
        let token = state.token.clone()?;
        state.status = AuthStatus::Unknown;
        Some(SessionContext { token, generation: state.generation })
    }

    /// Aplica a resposta do `validate`. Retorna `false` se a sessão mudou nesse meio tempo.
    pub fn apply_identity(&self, generation: u64, identity: Identity) -> bool {
        let mut state = self.inner.write();
        if state.generation != generation || state.token.is_none() {
            tracing::warn!("Identidade de uma sessão anterior descartada.");
            return false;
        }
        state.identity = Some(identity);
        state.status = AuthStatus::Authenticated;
        true
    }

    /// Logout: apaga token e identidade e rebaixa para convidado.
    pub fn clear(&self) {
        let mut state = self.inner.write();
        state.generation += 1;
        state.token = None;
        state.identity = None;
        state.status = AuthStatus::Guest;
    }

    /// Chamado com o resultado de toda requisição autenticada que falhou.
    /// 401 limpa a sessão que emitiu o token; falha de rede não mexe em nada.
    pub fn observe_failure(&self, generation: u64, error: &AppError) {
        if !error.clears_session() {
            return;
        }

        let mut state = self.inner.write();
        if state.generation != generation {
            // O token rejeitado já foi substituído por um login mais novo
            tracing::debug!("401 de uma sessão anterior ignorado.");
            return;
        }

        tracing::warn!("Token rejeitado pelo servidor. Sessão encerrada.");
        state.generation += 1;
        state.token = None;
        state.identity = None;
        state.status = AuthStatus::Guest;
    }

    // --- Leitura ---

    pub fn status(&self) -> AuthStatus {
        self.inner.read().status
    }

    pub fn context(&self) -> Option<SessionContext> {
        let state = self.inner.read();
        state.token.clone().map(|token| SessionContext {
            token,
            generation: state.generation,
        })
    }

    pub fn identity(&self) -> Option<Identity> {
        let state = self.inner.read();
        match state.status {
            AuthStatus::Authenticated => state.identity.clone(),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<User> {
        self.identity().map(|i| i.user)
    }

    /// Conjunto efetivo da sessão. Vazio enquanto não autenticado.
    pub fn permissions(&self) -> PermissionSet {
        self.identity().map(|i| i.permissions).unwrap_or_default()
    }

    pub fn has_permission(&self, code: &PermissionCode) -> bool {
        let state = self.inner.read();
        state.status == AuthStatus::Authenticated
            && state
                .identity
                .as_ref()
                .is_some_and(|i| i.permissions.contains(code))
    }
}
