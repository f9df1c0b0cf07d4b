// src/models/returns.rs

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::models::documents::{
    Document, DocumentAction, DocumentKind, DocumentKindTag, DocumentStatus, Transition,
    TransitionTable,
};
use crate::models::rbac::PermissionCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnStatus {
    Pending,
    Approved,
    Completed,
    Rejected,
}

impl DocumentStatus for ReturnStatus {
    const ALL: &'static [Self] = &[
        ReturnStatus::Pending,
        ReturnStatus::Approved,
        ReturnStatus::Completed,
        ReturnStatus::Rejected,
    ];
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReturnStatus::Pending => "PENDING",
            ReturnStatus::Approved => "APPROVED",
            ReturnStatus::Completed => "COMPLETED",
            ReturnStatus::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

// PENDING -> APPROVED -> COMPLETED; PENDING -> REJECTED
pub static RETURN_TRANSITIONS: TransitionTable<ReturnStatus> = TransitionTable::new(&[
    Transition {
        action: DocumentAction::Approve,
        from: &[ReturnStatus::Pending],
        to: ReturnStatus::Approved,
    },
    Transition {
        action: DocumentAction::Reject,
        from: &[ReturnStatus::Pending],
        to: ReturnStatus::Rejected,
    },
    Transition {
        action: DocumentAction::Complete,
        from: &[ReturnStatus::Approved],
        to: ReturnStatus::Completed,
    },
]);

// Linha devolvida pelo servidor. O estorno de CMV é calculado lá.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLine {
    pub id: Uuid,
    pub sale_line_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub refund_amount: Option<Decimal>,
    pub cogs_reversal: Option<Decimal>,
}

/// Linha da venda original, como a tela de devolução a carregou.
#[derive(Debug, Clone)]
pub struct SaleLineRef {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Clone)]
pub struct ReturnLineInput {
    pub sale_line: SaleLineRef,
    pub quantity: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLinePayload {
    pub sale_line_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewReturn {
    pub sale_id: Uuid,
    pub store_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReturnKind;

pub type ReturnDocument = Document<ReturnKind>;

impl DocumentKind for ReturnKind {
    type Status = ReturnStatus;
    type Line = ReturnLine;
    type LineInput = ReturnLineInput;
    type LinePayload = ReturnLinePayload;
    type Header = NewReturn;

    const TAG: DocumentKindTag = DocumentKindTag::Return;
    const RESOURCE: &'static str = "returns";

    fn transitions() -> &'static TransitionTable<ReturnStatus> {
        &RETURN_TRANSITIONS
    }

    fn draft_permission() -> PermissionCode {
        PermissionCode::ProcessReturn
    }

    fn action_permission(action: DocumentAction) -> PermissionCode {
        match action {
            DocumentAction::Approve | DocumentAction::Reject => PermissionCode::ApproveReturn,
            _ => PermissionCode::ProcessReturn,
        }
    }

    // A quantidade é limitada a [0, quantidade vendida]
    fn prepare_line(input: ReturnLineInput) -> Result<ReturnLinePayload, AppError> {
        let sold = input.sale_line.quantity.max(Decimal::ZERO);
        let quantity = input.quantity.clamp(Decimal::ZERO, sold);

        if quantity != input.quantity {
            tracing::debug!(
                "Quantidade de devolução ajustada de {} para {} (linha {}).",
                input.quantity,
                quantity,
                input.sale_line.id
            );
        }

        if quantity.is_zero() {
            return Err(AppError::Validation(
                "Não há quantidade a devolver para esta linha.".to_string(),
            ));
        }

        Ok(ReturnLinePayload {
            sale_line_id: input.sale_line.id,
            quantity,
        })
    }
}
