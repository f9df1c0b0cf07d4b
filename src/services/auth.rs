// src/services/auth.rs

use validator::Validate;

use crate::{
    api::AuthApi,
    common::error::AppError,
    models::auth::{Identity, LoginUserPayload, PinLoginPayload, RegisterUserPayload},
    services::session_store::{SessionContext, SessionStore, SessionToken},
};

#[derive(Clone)]
pub struct AuthService {
    api: AuthApi,
    store: SessionStore,
}

impl AuthService {
    pub fn new(api: AuthApi, store: SessionStore) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, AppError> {
        let payload = LoginUserPayload {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        payload.validate()?;

        let response = self.api.login(&payload).await.map_err(credentials_error)?;
        tracing::info!("Login de '{}' aceito. Validando sessão.", payload.username);
        self.establish(response.token).await
    }

    /// Login rápido do PDV por PIN.
    pub async fn login_pin(&self, username: &str, pin: &str) -> Result<Identity, AppError> {
        let payload = PinLoginPayload {
            username: username.trim().to_string(),
            pin: pin.to_string(),
        };
        payload.validate()?;

        let response = self.api.login_pin(&payload).await.map_err(credentials_error)?;
        tracing::info!("Login por PIN de '{}' aceito.", payload.username);
        self.establish(response.token).await
    }

    pub async fn register(&self, payload: RegisterUserPayload) -> Result<Identity, AppError> {
        payload.validate()?;

        let response = self.api.register(&payload).await?;
        tracing::info!("Usuário '{}' registrado.", payload.username);
        self.establish(response.token).await
    }

    /// Retoma um token emitido antes (ex.: guardado entre execuções).
    pub async fn restore(&self, token: impl Into<String>) -> Result<Identity, AppError> {
        self.establish(token.into()).await
    }

    /// Revalida o token atual e atualiza a identidade (usuário + permissões).
    pub async fn validate(&self) -> Result<Identity, AppError> {
        let ctx = self.store.mark_validating().ok_or(AppError::NotAuthenticated)?;
        self.validate_context(ctx).await
    }

    pub fn logout(&self) {
        self.store.clear();
        tracing::info!("Sessão encerrada pelo usuário.");
    }

    // --- Internos ---

    async fn establish(&self, token: String) -> Result<Identity, AppError> {
        let ctx = self.store.begin_session(SessionToken::new(token));
        self.validate_context(ctx).await
    }

    // A identidade é sempre a resposta do validate, nunca montada no cliente
    async fn validate_context(&self, ctx: SessionContext) -> Result<Identity, AppError> {
        let generation = ctx.generation();

        match self.api.validate(&ctx).await {
            Ok(response) => {
                let identity = Identity::from(response);
                if !self.store.apply_identity(generation, identity.clone()) {
                    return Err(AppError::Superseded);
                }
                tracing::info!(
                    "Sessão de '{}' validada com {} permissões.",
                    identity.user.username,
                    identity.permissions.len()
                );
                Ok(identity)
            }
            Err(err) => {
                // 401 derruba a sessão; rede fora deixa o status como desconhecido
                self.store.observe_failure(generation, &err);
                if let AppError::Network(detail) = &err {
                    tracing::warn!("Validação da sessão sem resposta: {}", detail);
                }
                Err(err)
            }
        }
    }
}

// Sem sessão, 401 no login significa credencial errada
fn credentials_error(err: AppError) -> AppError {
    match err {
        AppError::Unauthorized => AppError::InvalidCredentials,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::gateway::fake_gateway::FakeGateway;
    use crate::models::rbac::PermissionCode;
    use crate::services::session_store::AuthStatus;

    fn validate_body() -> serde_json::Value {
        json!({
            "user": {
                "id": "0b6f7c1e-7a51-4d55-9a3e-2f1e0d9c8b7a",
                "username": "ana",
                "storeId": null,
                "isActive": true
            },
            "permissions": ["CREATE_SALE", "POST_SALE"]
        })
    }

    fn service(gateway: FakeGateway) -> (AuthService, Arc<FakeGateway>) {
        let gateway = Arc::new(gateway);
        let service = AuthService::new(AuthApi::new(gateway.clone()), SessionStore::new());
        (service, gateway)
    }

    #[tokio::test]
    async fn login_stores_token_then_validates() {
        let (auth, gateway) = service(FakeGateway::new(|req| match req.path.as_str() {
            "/api/auth/login" => Ok(json!({ "token": "tok-1" })),
            "/api/auth/validate" => Ok(validate_body()),
            _ => Err(AppError::Network("rota inesperada".into())),
        }));

        let identity = auth.login("ana", "segredo").await.unwrap();

        assert_eq!(identity.user.username, "ana");
        assert_eq!(auth.store().status(), AuthStatus::Authenticated);
        assert!(auth.store().has_permission(&PermissionCode::PostSale));

        let requests = gateway.requests();
        assert_eq!(requests[0].bearer, None);
        assert_eq!(requests[1].bearer.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let (auth, _) = service(FakeGateway::new(|_| Err(AppError::Unauthorized)));

        let result = auth.login("ana", "errada").await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
        assert_eq!(auth.store().status(), AuthStatus::Guest);
    }

    #[tokio::test]
    async fn invalid_pin_never_reaches_the_server() {
        let (auth, gateway) = service(FakeGateway::new(|_| Ok(json!({ "token": "x" }))));

        let result = auth.login_pin("ana", "12a").await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(gateway.request_count(), 0);
    }

    #[tokio::test]
    async fn network_failure_during_validate_leaves_status_unknown() {
        let (auth, _) = service(FakeGateway::new(|_| Err(AppError::Network("timeout".into()))));

        let result = auth.restore("tok-antigo").await;

        assert!(matches!(result, Err(AppError::Network(_))));
        assert_eq!(auth.store().status(), AuthStatus::Unknown);
        assert!(auth.store().context().is_some());
    }

    #[tokio::test]
    async fn rejected_token_on_restore_becomes_guest() {
        let (auth, _) = service(FakeGateway::new(|_| Err(AppError::Unauthorized)));

        let result = auth.restore("tok-expirado").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
        assert_eq!(auth.store().status(), AuthStatus::Guest);
        assert!(auth.store().context().is_none());
    }

    #[tokio::test]
    async fn validate_without_token_sends_nothing() {
        let (auth, gateway) = service(FakeGateway::new(|_| Ok(validate_body())));

        assert!(matches!(auth.validate().await, Err(AppError::NotAuthenticated)));
        assert_eq!(gateway.request_count(), 0);
    }

    #[tokio::test]
    async fn logout_clears_identity() {
        let (auth, _) = service(FakeGateway::new(|_| Ok(validate_body())));
        auth.restore("tok").await.unwrap();

        auth.logout();

        assert_eq!(auth.store().status(), AuthStatus::Guest);
        assert!(auth.store().permissions().is_empty());
    }
}
