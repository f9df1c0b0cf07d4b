pub mod admin_api;
pub use admin_api::AdminApi;
pub mod auth_api;
pub use auth_api::AuthApi;
pub mod document_api;
pub use document_api::DocumentApi;
pub mod register_api;
pub use register_api::RegisterApi;

use reqwest::Url;

use crate::common::error::AppError;

/// Codifica um valor livre (nome de cargo, código) como um único segmento de caminho.
pub(crate) fn path_segment(raw: &str) -> Result<String, AppError> {
    let mut url = Url::parse("http://segment.invalid/").map_err(|e| AppError::InternalError(e.into()))?;
    url.path_segments_mut()
        .map_err(|_| AppError::InternalError(anyhow::anyhow!("URL base sem caminho")))?
        .pop_if_empty()
        .push(raw);

    // "." e ".." são descartados pelo push
    let encoded = url.path().trim_start_matches('/');
    if encoded.is_empty() {
        return Err(AppError::Validation(format!("Identificador inválido: '{}'.", raw)));
    }
    Ok(encoded.to_string())
}
