// src/api/admin_api.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    api::path_segment,
    common::error::AppError,
    gateway::api_gateway::{call, ApiGateway, ApiRequest},
    models::rbac::{
        AssignRolePayload, CreateOverridePayload, PermissionCode, PermissionDescriptor,
        PermissionOverride, UserAccess,
    },
    services::session_store::SessionContext,
};

// Catálogo, cargos e exceções (/api/permissions, /api/admin/users)
#[derive(Clone)]
pub struct AdminApi {
    gateway: Arc<dyn ApiGateway>,
}

impl AdminApi {
    pub fn new(gateway: Arc<dyn ApiGateway>) -> Self {
        Self { gateway }
    }

    pub async fn list_permissions(
        &self,
        ctx: &SessionContext,
    ) -> Result<Vec<PermissionDescriptor>, AppError> {
        call(&*self.gateway, Some(ctx), ApiRequest::get("/api/permissions")).await
    }

    pub async fn user_access(&self, ctx: &SessionContext, user_id: Uuid) -> Result<UserAccess, AppError> {
        let path = format!("/api/admin/users/{}/access", user_id);
        call(&*self.gateway, Some(ctx), ApiRequest::get(path)).await
    }

    pub async fn assign_role(
        &self,
        ctx: &SessionContext,
        user_id: Uuid,
        payload: &AssignRolePayload,
    ) -> Result<(), AppError> {
        let path = format!("/api/admin/users/{}/roles", user_id);
        self.gateway
            .send(Some(ctx), ApiRequest::post_json(path, payload)?)
            .await?;
        Ok(())
    }

    pub async fn remove_role(&self, ctx: &SessionContext, user_id: Uuid, role_name: &str) -> Result<(), AppError> {
        let path = format!("/api/admin/users/{}/roles/{}", user_id, path_segment(role_name)?);
        self.gateway.send(Some(ctx), ApiRequest::delete(path)).await?;
        Ok(())
    }

    pub async fn create_override(
        &self,
        ctx: &SessionContext,
        user_id: Uuid,
        payload: &CreateOverridePayload,
    ) -> Result<PermissionOverride, AppError> {
        let path = format!("/api/admin/users/{}/permission-overrides", user_id);
        call(&*self.gateway, Some(ctx), ApiRequest::post_json(path, payload)?).await
    }

    pub async fn revoke_override(
        &self,
        ctx: &SessionContext,
        user_id: Uuid,
        code: &PermissionCode,
    ) -> Result<(), AppError> {
        let path = format!(
            "/api/admin/users/{}/permission-overrides/{}",
            user_id,
            path_segment(&code.to_string())?
        );
        self.gateway.send(Some(ctx), ApiRequest::delete(path)).await?;
        Ok(())
    }
}
