// src/gateway/fake_gateway.rs

// Gateway em memória para os testes unitários: responde com um handler
// e grava toda requisição, para dar para afirmar "nenhuma requisição saiu".

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::common::error::AppError;
use crate::gateway::api_gateway::{ApiGateway, ApiRequest, HttpMethod};
use crate::services::session_store::SessionContext;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

type Handler = Box<dyn Fn(&RecordedRequest) -> Result<Value, AppError> + Send + Sync>;

pub struct FakeGateway {
    handler: Handler,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeGateway {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Result<Value, AppError> + Send + Sync + 'static,
    {
        Self { handler: Box::new(handler), requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// "POST /api/returns", na ordem em que saíram.
    pub fn calls(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

#[async_trait]
impl ApiGateway for FakeGateway {
    async fn send(
        &self,
        session: Option<&SessionContext>,
        request: ApiRequest,
    ) -> Result<Value, AppError> {
        let recorded = RecordedRequest {
            method: request.method,
            path: request.path,
            body: request.body,
            bearer: session.map(|s| s.bearer().to_string()),
        };
        self.requests.lock().push(recorded.clone());
        (self.handler)(&recorded)
    }
}
