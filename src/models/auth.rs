// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_blank, validate_pin};
use crate::models::rbac::{PermissionCode, PermissionSet};

// Snapshot do usuário autenticado. O dono é o servidor; o cliente só lê.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    // Loja do usuário (nulo para usuários da organização)
    pub store_id: Option<Uuid>,
    pub is_active: bool,
    #[serde(default)]
    pub is_developer: bool,
}

// Dados para login
#[derive(Debug, Serialize, Validate)]
pub struct LoginUserPayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub username: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

// Login rápido do PDV
#[derive(Debug, Serialize, Validate)]
pub struct PinLoginPayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub username: String,
    #[validate(custom(function = "validate_pin"))]
    pub pin: String,
}

// Dados para registro de um novo usuário
#[derive(Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub username: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    pub store_id: Option<Uuid>,
}

// Resposta de autenticação com o token
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

// POST /api/auth/validate
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateResponse {
    pub user: User,
    #[serde(default)]
    pub permissions: Vec<PermissionCode>,
}

/// Quem está logado e o que pode fazer, exatamente como o servidor respondeu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: User,
    pub permissions: PermissionSet,
}

impl From<ValidateResponse> for Identity {
    fn from(response: ValidateResponse) -> Self {
        Identity {
            user: response.user,
            permissions: response.permissions.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use validator::Validate;

    #[test]
    fn validate_response_becomes_identity() {
        let response: ValidateResponse = serde_json::from_value(json!({
            "user": {
                "id": "0b6f7c1e-7a51-4d55-9a3e-2f1e0d9c8b7a",
                "username": "ana",
                "storeId": null,
                "isActive": true
            },
            "permissions": ["CREATE_SALE", "CREATE_SALE", "NEW_THING"]
        }))
        .unwrap();

        let identity = Identity::from(response);
        assert_eq!(identity.user.username, "ana");
        assert!(!identity.user.is_developer);
        assert_eq!(identity.permissions.len(), 2);
        assert!(identity.permissions.contains(&PermissionCode::parse("NEW_THING")));
    }

    #[test]
    fn payload_validation() {
        let bad = PinLoginPayload { username: " ".into(), pin: "12".into() };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
        assert!(errors.field_errors().contains_key("pin"));

        let register = RegisterUserPayload {
            username: "ana".into(),
            email: "nao-e-email".into(),
            password: "123".into(),
            store_id: None,
        };
        let errors = register.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }
}
