// src/gateway/api_gateway.rs

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::common::error::AppError;
use crate::services::session_store::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
            HttpMethod::Delete => f.write_str("DELETE"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    // Sempre começa com "/api/"
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: HttpMethod::Get, path: path.into(), body: None }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self { method: HttpMethod::Delete, path: path.into(), body: None }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self { method: HttpMethod::Post, path: path.into(), body: None }
    }

    pub fn post_json<T: Serialize>(path: impl Into<String>, body: &T) -> Result<Self, AppError> {
        Ok(Self {
            method: HttpMethod::Post,
            path: path.into(),
            body: Some(serde_json::to_value(body)?),
        })
    }
}

/// O único componente que faz I/O de rede. Tudo o mais recebe dados por aqui.
///
/// Sem `session` a requisição sai sem `Authorization` (só vale para login/registro).
#[async_trait]
pub trait ApiGateway: Send + Sync {
    async fn send(
        &self,
        session: Option<&SessionContext>,
        request: ApiRequest,
    ) -> Result<Value, AppError>;
}

/// `send` + desserialização para o tipo esperado.
pub async fn call<T: DeserializeOwned>(
    gateway: &dyn ApiGateway,
    session: Option<&SessionContext>,
    request: ApiRequest,
) -> Result<T, AppError> {
    let value = gateway.send(session, request).await?;
    Ok(serde_json::from_value(value)?)
}
