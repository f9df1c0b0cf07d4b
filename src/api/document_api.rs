// src/api/document_api.rs

use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    gateway::api_gateway::{call, ApiGateway, ApiRequest},
    models::documents::{Document, DocumentAction, DocumentKind},
    services::session_store::SessionContext,
};

/// Endpoints de um tipo de documento: /api/{returns|transfers|counts}.
pub struct DocumentApi<K: DocumentKind> {
    gateway: Arc<dyn ApiGateway>,
    _kind: PhantomData<K>,
}

impl<K: DocumentKind> Clone for DocumentApi<K> {
    fn clone(&self) -> Self {
        Self { gateway: self.gateway.clone(), _kind: PhantomData }
    }
}

impl<K: DocumentKind> DocumentApi<K> {
    pub fn new(gateway: Arc<dyn ApiGateway>) -> Self {
        Self { gateway, _kind: PhantomData }
    }

    fn root() -> String {
        format!("/api/{}", K::RESOURCE)
    }

    pub async fn list(&self, ctx: &SessionContext) -> Result<Vec<Document<K>>, AppError> {
        call(&*self.gateway, Some(ctx), ApiRequest::get(Self::root())).await
    }

    pub async fn get(&self, ctx: &SessionContext, id: Uuid) -> Result<Document<K>, AppError> {
        let path = format!("{}/{}", Self::root(), id);
        call(&*self.gateway, Some(ctx), ApiRequest::get(path)).await
    }

    // Cria só o cabeçalho; as linhas vão depois, uma chamada por linha
    pub async fn create(&self, ctx: &SessionContext, header: &K::Header) -> Result<Document<K>, AppError> {
        call(&*self.gateway, Some(ctx), ApiRequest::post_json(Self::root(), header)?).await
    }

    // A resposta é ignorada: o documento é relido em seguida
    pub async fn add_line(&self, ctx: &SessionContext, id: Uuid, line: &K::LinePayload) -> Result<(), AppError> {
        let path = format!("{}/{}/lines", Self::root(), id);
        self.gateway
            .send(Some(ctx), ApiRequest::post_json(path, line)?)
            .await?;
        Ok(())
    }

    pub async fn transition(&self, ctx: &SessionContext, id: Uuid, action: DocumentAction) -> Result<(), AppError> {
        let path = format!("{}/{}/{}", Self::root(), id, action.path_segment());
        self.gateway.send(Some(ctx), ApiRequest::post(path)).await?;
        Ok(())
    }
}
