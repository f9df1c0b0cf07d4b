// src/api/register_api.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    gateway::api_gateway::{call, ApiGateway, ApiRequest},
    models::register::{
        CashDropPayload, CloseSessionPayload, DrawerEvent, NoSalePayload, OpenShiftPayload,
        Register, RegisterSession,
    },
    services::session_store::SessionContext,
};

// Caixas, turnos e gaveta (/api/registers)
#[derive(Clone)]
pub struct RegisterApi {
    gateway: Arc<dyn ApiGateway>,
}

impl RegisterApi {
    pub fn new(gateway: Arc<dyn ApiGateway>) -> Self {
        Self { gateway }
    }

    pub async fn list_registers(&self, ctx: &SessionContext) -> Result<Vec<Register>, AppError> {
        call(&*self.gateway, Some(ctx), ApiRequest::get("/api/registers")).await
    }

    // `null` quando o caixa está livre
    pub async fn current_session(
        &self,
        ctx: &SessionContext,
        register_id: Uuid,
    ) -> Result<Option<RegisterSession>, AppError> {
        let path = format!("/api/registers/{}/sessions/current", register_id);
        call(&*self.gateway, Some(ctx), ApiRequest::get(path)).await
    }

    pub async fn get_session(&self, ctx: &SessionContext, session_id: Uuid) -> Result<RegisterSession, AppError> {
        let path = format!("/api/registers/sessions/{}", session_id);
        call(&*self.gateway, Some(ctx), ApiRequest::get(path)).await
    }

    pub async fn open_shift(
        &self,
        ctx: &SessionContext,
        register_id: Uuid,
        payload: &OpenShiftPayload,
    ) -> Result<RegisterSession, AppError> {
        let path = format!("/api/registers/{}/shifts/open", register_id);
        call(&*self.gateway, Some(ctx), ApiRequest::post_json(path, payload)?).await
    }

    pub async fn close_session(
        &self,
        ctx: &SessionContext,
        session_id: Uuid,
        payload: &CloseSessionPayload,
    ) -> Result<(), AppError> {
        let path = format!("/api/registers/sessions/{}/close", session_id);
        self.gateway
            .send(Some(ctx), ApiRequest::post_json(path, payload)?)
            .await?;
        Ok(())
    }

    pub async fn no_sale(
        &self,
        ctx: &SessionContext,
        session_id: Uuid,
        payload: &NoSalePayload,
    ) -> Result<DrawerEvent, AppError> {
        let path = format!("/api/registers/sessions/{}/drawer/no-sale", session_id);
        call(&*self.gateway, Some(ctx), ApiRequest::post_json(path, payload)?).await
    }

    pub async fn cash_drop(
        &self,
        ctx: &SessionContext,
        session_id: Uuid,
        payload: &CashDropPayload,
    ) -> Result<DrawerEvent, AppError> {
        let path = format!("/api/registers/sessions/{}/drawer/cash-drop", session_id);
        call(&*self.gateway, Some(ctx), ApiRequest::post_json(path, payload)?).await
    }

    pub async fn list_drawer_events(
        &self,
        ctx: &SessionContext,
        session_id: Uuid,
    ) -> Result<Vec<DrawerEvent>, AppError> {
        let path = format!("/api/registers/sessions/{}/drawer", session_id);
        call(&*self.gateway, Some(ctx), ApiRequest::get(path)).await
    }
}
