// src/services/rbac_service.rs

use uuid::Uuid;
use validator::Validate;

use crate::{
    api::AdminApi,
    common::error::AppError,
    middleware::{auth::with_session, rbac::require_permission},
    models::rbac::{
        AssignRolePayload, CreateOverridePayload, OverrideType, PermissionCatalog, PermissionCode,
        PermissionOverride, PermissionSet, UserAccess,
    },
    services::{permission_resolver, session_store::SessionStore},
};

/// Administração de acesso: catálogo, cargos e exceções por usuário.
/// Toda escrita exige MANAGE_USERS; o servidor confere de novo.
#[derive(Clone)]
pub struct RbacService {
    api: AdminApi,
    store: SessionStore,
}

impl RbacService {
    pub fn new(api: AdminApi, store: SessionStore) -> Self {
        Self { api, store }
    }

    pub async fn list_permission_catalog(&self) -> Result<PermissionCatalog, AppError> {
        let descriptors = with_session(&self.store, |ctx| async move {
            self.api.list_permissions(&ctx).await
        })
        .await?;

        Ok(PermissionCatalog::load(descriptors))
    }

    pub async fn user_access(&self, user_id: Uuid) -> Result<UserAccess, AppError> {
        require_permission(&self.store, &PermissionCode::ManageUsers)?;

        with_session(&self.store, |ctx| async move {
            self.api.user_access(&ctx, user_id).await
        })
        .await
    }

    /// Conjunto efetivo calculado no cliente, para a tela de administração.
    pub async fn preview_effective(&self, user_id: Uuid) -> Result<PermissionSet, AppError> {
        let access = self.user_access(user_id).await?;
        Ok(permission_resolver::resolve_access(&access))
    }

    pub async fn assign_role(&self, user_id: Uuid, role_name: &str) -> Result<(), AppError> {
        require_permission(&self.store, &PermissionCode::ManageUsers)?;

        let payload = AssignRolePayload { role_name: role_name.trim().to_string() };
        payload.validate()?;

        with_session(&self.store, |ctx| async move {
            self.api.assign_role(&ctx, user_id, &payload).await
        })
        .await?;

        tracing::info!("Cargo '{}' atribuído ao usuário {}.", role_name.trim(), user_id);
        Ok(())
    }

    pub async fn remove_role(&self, user_id: Uuid, role_name: &str) -> Result<(), AppError> {
        require_permission(&self.store, &PermissionCode::ManageUsers)?;

        with_session(&self.store, |ctx| async move {
            self.api.remove_role(&ctx, user_id, role_name).await
        })
        .await?;

        tracing::info!("Cargo '{}' removido do usuário {}.", role_name, user_id);
        Ok(())
    }

    pub async fn grant_override(
        &self,
        user_id: Uuid,
        code: PermissionCode,
        reason: &str,
    ) -> Result<PermissionOverride, AppError> {
        self.create_override(user_id, code, OverrideType::Grant, reason).await
    }

    pub async fn deny_override(
        &self,
        user_id: Uuid,
        code: PermissionCode,
        reason: &str,
    ) -> Result<PermissionOverride, AppError> {
        self.create_override(user_id, code, OverrideType::Deny, reason).await
    }

    pub async fn create_override(
        &self,
        user_id: Uuid,
        code: PermissionCode,
        override_type: OverrideType,
        reason: &str,
    ) -> Result<PermissionOverride, AppError> {
        require_permission(&self.store, &PermissionCode::ManageUsers)?;
        reject_protected(&code)?;

        let payload = CreateOverridePayload {
            permission_code: code,
            override_type,
            reason: reason.trim().to_string(),
        };
        payload.validate()?;

        let created = with_session(&self.store, |ctx| async move {
            self.api.create_override(&ctx, user_id, &payload).await
        })
        .await?;

        tracing::info!(
            "Exceção {:?} de '{}' criada para o usuário {}.",
            created.override_type,
            created.permission_code,
            user_id
        );
        Ok(created)
    }

    pub async fn revoke_override(&self, user_id: Uuid, code: &PermissionCode) -> Result<(), AppError> {
        require_permission(&self.store, &PermissionCode::ManageUsers)?;
        reject_protected(code)?;

        with_session(&self.store, |ctx| async move {
            self.api.revoke_override(&ctx, user_id, code).await
        })
        .await?;

        tracing::info!("Exceção de '{}' revogada do usuário {}.", code, user_id);
        Ok(())
    }
}

fn reject_protected(code: &PermissionCode) -> Result<(), AppError> {
    if code.is_protected() {
        tracing::warn!("Tentativa de exceção sobre a permissão protegida '{}'.", code);
        return Err(AppError::ProtectedPermission(code.clone()));
    }
    Ok(())
}
