// src/main.rs

use maestro_client::{
    common::error::AppError,
    config::{AppState, ClientConfig},
    services::{auth_gate::PageState, AuthStatus},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Inicializa o logger (RUST_LOG, padrão "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, o cliente não deve iniciar
    let config = ClientConfig::from_env()?;
    let state = AppState::new(&config)?;

    // --- Sessão: token salvo primeiro, depois usuário/senha ---
    if let Some(token) = &config.token {
        match state.auth_service.restore(token.clone()).await {
            Ok(_) => {}
            Err(AppError::Network(detail)) => {
                tracing::error!("🔥 Servidor indisponível: {}", detail);
            }
            Err(e) => tracing::warn!("Token salvo não aceito: {}", e),
        }
    }

    if state.session.status() == AuthStatus::Guest {
        match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                if let Err(e) = state.auth_service.login(username, password).await {
                    tracing::error!("Falha no login de '{}': {}", username, e.user_message());
                }
            }
            _ => tracing::info!("Nenhuma credencial configurada. Continuando como convidado."),
        }
    }

    // --- Resumo ---
    let status = state.session.status();
    match state.session.user() {
        Some(user) => println!("Usuário: {} ({:?})", user.username, status),
        None => println!("Sem usuário autenticado ({:?})", status),
    }

    let permissions = state.session.permissions();
    println!("Permissões efetivas ({}):", permissions.len());
    for code in permissions.iter() {
        println!("  - {}", code);
    }

    println!("Menu:");
    for entry in state.gate.navigation() {
        println!("  [{}] {}", entry.id, entry.label);
    }

    let page = PageState::new(state.gate.menu(), &config.default_page);
    println!(
        "Página inicial '{}': {:?}",
        page.current(),
        state.gate.page_access(page.current())
    );

    Ok(())
}
