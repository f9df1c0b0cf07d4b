// src/gateway/http_gateway.rs

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::common::error::AppError;
use crate::gateway::api_gateway::{ApiGateway, ApiRequest, HttpMethod};
use crate::services::session_store::SessionContext;

/// `ApiGateway` sobre HTTP/JSON (reqwest).
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Falha ao criar o cliente HTTP: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ApiGateway for HttpGateway {
    async fn send(
        &self,
        session: Option<&SessionContext>,
        request: ApiRequest,
    ) -> Result<Value, AppError> {
        let url = self.url(&request.path);
        tracing::debug!("{} {}", request.method, request.path);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        if let Some(ctx) = session {
            builder = builder.bearer_auth(ctx.bearer());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        // Sem resposta: erro de rede (não prova que o token é inválido)
        let response = builder.send().await.map_err(|e| {
            tracing::warn!("Falha de conexão em {} {}: {}", request.method, request.path, e);
            AppError::Network(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!("{} {} -> {}", request.method, request.path, status);
            return Err(AppError::from_response(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
