// src/config.rs

use std::{env, fmt, sync::Arc, time::Duration};

use anyhow::{bail, Context};

use crate::{
    api::{AdminApi, AuthApi, DocumentApi, RegisterApi},
    gateway::{ApiGateway, HttpGateway},
    services::{
        auth_gate::{default_navigation, AuthGate},
        AuthService, CountWorkflow, RbacService, RegisterSessionMachine, ReturnWorkflow,
        SessionStore, TransferWorkflow,
    },
};

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_PAGE: &str = "dashboard";

#[derive(Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout: Duration,
    // Token emitido antes, para retomar a sessão sem login
    pub token: Option<String>,
    pub default_page: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("default_page", &self.default_page)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ClientConfig {
    /// Lê o ambiente (e o `.env`, se existir).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Valor vazio conta como ausente
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = var("MAESTRO_API_URL").context("MAESTRO_API_URL deve ser definida")?;
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            bail!("MAESTRO_API_URL deve começar com http:// ou https:// (recebido: '{}')", api_url);
        }

        let timeout_secs = match var("MAESTRO_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("MAESTRO_TIMEOUT_SECS inválido: '{}'", raw))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            bail!("MAESTRO_TIMEOUT_SECS deve ser maior que zero");
        }

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            token: var("MAESTRO_TOKEN"),
            default_page: var("MAESTRO_DEFAULT_PAGE").unwrap_or_else(|| DEFAULT_PAGE.to_string()),
            username: var("MAESTRO_USERNAME"),
            password: var("MAESTRO_PASSWORD"),
        })
    }
}

// O estado compartilhado do cliente: uma sessão e os serviços que a usam
#[derive(Clone)]
pub struct AppState {
    pub session: SessionStore,
    pub gate: AuthGate,
    pub auth_service: AuthService,
    pub rbac_service: RbacService,
    pub registers: Arc<RegisterSessionMachine>,
    pub returns: Arc<ReturnWorkflow>,
    pub transfers: Arc<TransferWorkflow>,
    pub counts: Arc<CountWorkflow>,
}

impl AppState {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let gateway = HttpGateway::new(&config.api_url, config.timeout)?;
        tracing::info!("Cliente configurado para {}.", config.api_url);
        Ok(Self::with_gateway(Arc::new(gateway)))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_gateway(gateway: Arc<dyn ApiGateway>) -> Self {
        let session = SessionStore::new();

        Self {
            gate: AuthGate::new(session.clone(), default_navigation()),
            auth_service: AuthService::new(AuthApi::new(gateway.clone()), session.clone()),
            rbac_service: RbacService::new(AdminApi::new(gateway.clone()), session.clone()),
            registers: Arc::new(RegisterSessionMachine::new(
                RegisterApi::new(gateway.clone()),
                session.clone(),
            )),
            returns: Arc::new(ReturnWorkflow::new(DocumentApi::new(gateway.clone()), session.clone())),
            transfers: Arc::new(TransferWorkflow::new(DocumentApi::new(gateway.clone()), session.clone())),
            counts: Arc::new(CountWorkflow::new(DocumentApi::new(gateway), session.clone())),
            session,
        }
    }
}
