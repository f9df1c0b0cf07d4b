// src/api/auth_api.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    gateway::api_gateway::{call, ApiGateway, ApiRequest},
    models::auth::{
        AuthResponse, LoginUserPayload, PinLoginPayload, RegisterUserPayload, ValidateResponse,
    },
    services::session_store::SessionContext,
};

// Endpoints de identidade (/api/auth)
#[derive(Clone)]
pub struct AuthApi {
    gateway: Arc<dyn ApiGateway>,
}

impl AuthApi {
    pub fn new(gateway: Arc<dyn ApiGateway>) -> Self {
        Self { gateway }
    }

    // Rotas públicas: saem sem token
    pub async fn login(&self, payload: &LoginUserPayload) -> Result<AuthResponse, AppError> {
        call(&*self.gateway, None, ApiRequest::post_json("/api/auth/login", payload)?).await
    }

    pub async fn login_pin(&self, payload: &PinLoginPayload) -> Result<AuthResponse, AppError> {
        call(&*self.gateway, None, ApiRequest::post_json("/api/auth/login-pin", payload)?).await
    }

    pub async fn register(&self, payload: &RegisterUserPayload) -> Result<AuthResponse, AppError> {
        call(&*self.gateway, None, ApiRequest::post_json("/api/auth/register", payload)?).await
    }

    pub async fn validate(&self, ctx: &SessionContext) -> Result<ValidateResponse, AppError> {
        call(&*self.gateway, Some(ctx), ApiRequest::post("/api/auth/validate")).await
    }
}
