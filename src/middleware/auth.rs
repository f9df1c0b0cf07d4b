// src/middleware/auth.rs

use std::future::Future;

use crate::{
    common::error::AppError,
    services::session_store::{SessionContext, SessionStore},
};

/// Executa uma chamada autenticada.
///
/// O contexto (token + geração) é tirado do `SessionStore` e passado
/// explicitamente para a chamada. Se a resposta for 401, a sessão que emitiu
/// o token é encerrada, não importa qual componente fez a chamada.
pub async fn with_session<T, F, Fut>(store: &SessionStore, call: F) -> Result<T, AppError>
where
    F: FnOnce(SessionContext) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let ctx = store.context().ok_or(AppError::NotAuthenticated)?;
    let generation = ctx.generation();

    let result = call(ctx).await;

    if let Err(err) = &result {
        store.observe_failure(generation, err);
    }
    result
}
