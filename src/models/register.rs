// src/models/register.rs

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_blank, validate_not_negative, validate_positive};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrawerEventType {
    NoSale,
    CashDrop,
}

impl fmt::Display for DrawerEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawerEventType::NoSale => f.write_str("abertura sem venda"),
            DrawerEventType::CashDrop => f.write_str("sangria"),
        }
    }
}

// --- Sessão de caixa (um turno) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSession {
    pub id: Uuid,
    pub register_id: Uuid,
    pub operator_id: Uuid,
    pub status: SessionStatus,
    pub opening_cash: Decimal,
    pub closing_cash: Option<Decimal>,
    // Calculados pelo servidor no fechamento
    pub expected_cash: Option<Decimal>,
    pub variance: Option<Decimal>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl RegisterSession {
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Só existe depois que o servidor devolveu a diferença.
    pub fn cash_variance(&self) -> Option<CashVariance> {
        self.variance.map(CashVariance::from_variance)
    }
}

/// Diferença de caixa (fechamento - esperado) como o operador a lê.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashVariance {
    Short(Decimal),
    Over(Decimal),
    Balanced,
}

impl CashVariance {
    pub fn from_variance(variance: Decimal) -> Self {
        if variance.is_zero() {
            CashVariance::Balanced
        } else if variance.is_sign_negative() {
            CashVariance::Short(variance.abs())
        } else {
            CashVariance::Over(variance)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Register {
    pub id: Uuid,
    pub name: String,
    pub store_id: Option<Uuid>,
    // Turno aberto neste caixa, se houver
    pub open_session: Option<RegisterSession>,
}

// --- Eventos de gaveta (somente inclusão) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawerEvent {
    pub id: Uuid,
    pub session_id: Uuid,
    #[serde(rename = "type")]
    pub event_type: DrawerEventType,
    pub amount: Option<Decimal>,
    pub reason: String,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// --- Payloads ---

#[derive(Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftPayload {
    #[validate(custom(function = "validate_not_negative"))]
    pub opening_cash: Decimal,
}

#[derive(Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionPayload {
    #[validate(custom(function = "validate_not_negative"))]
    pub closing_cash: Decimal,
}

#[derive(Debug, Serialize, Validate)]
pub struct NoSalePayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Validate)]
pub struct CashDropPayload {
    #[validate(custom(function = "validate_positive"))]
    pub amount: Decimal,
    #[validate(custom(function = "validate_not_blank"))]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn variance_sign_reads_as_short_or_over() {
        assert_eq!(CashVariance::from_variance(Decimal::from(-200)), CashVariance::Short(Decimal::from(200)));
        assert_eq!(CashVariance::from_variance(Decimal::from(35)), CashVariance::Over(Decimal::from(35)));
        assert_eq!(CashVariance::from_variance(Decimal::ZERO), CashVariance::Balanced);
    }

    #[test]
    fn open_session_has_no_variance_yet() {
        let session: RegisterSession = serde_json::from_value(json!({
            "id": "1d7a5a8e-9c1b-4e5a-8f7e-111111111111",
            "registerId": "1d7a5a8e-9c1b-4e5a-8f7e-222222222222",
            "operatorId": "1d7a5a8e-9c1b-4e5a-8f7e-333333333333",
            "status": "OPEN",
            "openingCash": 100,
            "closingCash": null,
            "expectedCash": null,
            "variance": null,
            "openedAt": "2026-10-18T08:00:00Z",
            "closedAt": null
        }))
        .unwrap();
        assert!(session.is_open());
        assert_eq!(session.cash_variance(), None);
    }

    #[test]
    fn cash_drop_needs_positive_amount_and_reason() {
        let payload = CashDropPayload { amount: Decimal::ZERO, reason: "".into() };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("amount"));
        assert!(errors.field_errors().contains_key("reason"));
    }
}
