// src/middleware/rbac.rs

// Guardião de permissão do lado do cliente. Só antecipa o 403 do servidor
// para não mandar uma requisição que seria recusada.

use crate::{
    common::error::AppError,
    models::rbac::PermissionCode,
    services::session_store::{AuthStatus, SessionStore},
};

pub fn require_permission(store: &SessionStore, code: &PermissionCode) -> Result<(), AppError> {
    require_any(store, std::slice::from_ref(code))
}

/// Pelo menos uma das permissões.
pub fn require_any(store: &SessionStore, any_of: &[PermissionCode]) -> Result<(), AppError> {
    if store.status() != AuthStatus::Authenticated {
        return Err(AppError::NotAuthenticated);
    }

    if any_of.is_empty() || any_of.iter().any(|code| store.has_permission(code)) {
        return Ok(());
    }

    let required = any_of[0].clone();
    tracing::warn!("Ação bloqueada no cliente: falta a permissão '{}'.", required);
    Err(AppError::MissingPermission(required))
}
