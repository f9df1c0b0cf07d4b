// src/models/counts.rs

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::common::validation::is_whole_number;
use crate::models::documents::{
    Document, DocumentAction, DocumentKind, DocumentKindTag, DocumentStatus, Transition,
    TransitionTable,
};
use crate::models::rbac::PermissionCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CountStatus {
    Pending,
    Approved,
    Posted,
    Cancelled,
}

impl DocumentStatus for CountStatus {
    const ALL: &'static [Self] = &[
        CountStatus::Pending,
        CountStatus::Approved,
        CountStatus::Posted,
        CountStatus::Cancelled,
    ];
}

impl fmt::Display for CountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CountStatus::Pending => "PENDING",
            CountStatus::Approved => "APPROVED",
            CountStatus::Posted => "POSTED",
            CountStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

// PENDING -> APPROVED -> POSTED; PENDING -> CANCELLED
pub static COUNT_TRANSITIONS: TransitionTable<CountStatus> = TransitionTable::new(&[
    Transition {
        action: DocumentAction::Approve,
        from: &[CountStatus::Pending],
        to: CountStatus::Approved,
    },
    Transition {
        action: DocumentAction::Post,
        from: &[CountStatus::Approved],
        to: CountStatus::Posted,
    },
    Transition {
        action: DocumentAction::Cancel,
        from: &[CountStatus::Pending],
        to: CountStatus::Cancelled,
    },
]);

// Esperado e diferença vêm do servidor (saldo no momento da contagem)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub expected_quantity: Option<Decimal>,
    pub actual_quantity: Decimal,
    pub variance: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountLineInput {
    pub product_id: Uuid,
    pub actual_quantity: Decimal,
}

#[derive(Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCount {
    pub store_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct CountKind;

pub type CountDocument = Document<CountKind>;

impl DocumentKind for CountKind {
    type Status = CountStatus;
    type Line = CountLine;
    type LineInput = CountLineInput;
    type LinePayload = CountLineInput;
    type Header = NewCount;

    const TAG: DocumentKindTag = DocumentKindTag::Count;
    const RESOURCE: &'static str = "counts";

    fn transitions() -> &'static TransitionTable<CountStatus> {
        &COUNT_TRANSITIONS
    }

    fn draft_permission() -> PermissionCode {
        PermissionCode::ManageCounts
    }

    fn action_permission(action: DocumentAction) -> PermissionCode {
        match action {
            DocumentAction::Approve | DocumentAction::Post => PermissionCode::ApproveCount,
            _ => PermissionCode::ManageCounts,
        }
    }

    // Quantidade contada: inteiro não negativo (zero é uma contagem válida)
    fn prepare_line(input: CountLineInput) -> Result<CountLineInput, AppError> {
        if input.actual_quantity.is_sign_negative() && !input.actual_quantity.is_zero() {
            return Err(AppError::Validation(
                "A quantidade contada não pode ser negativa.".to_string(),
            ));
        }
        if !is_whole_number(&input.actual_quantity) {
            return Err(AppError::Validation(
                "A quantidade contada deve ser um número inteiro.".to_string(),
            ));
        }
        Ok(input)
    }
}
