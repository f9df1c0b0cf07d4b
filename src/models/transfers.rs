// src/models/transfers.rs

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
pub enum TransferStatus {
    Pending,
    Approved,
    InTransit,
    Received,
    Cancelled,
}

impl DocumentStatus for TransferStatus {
    const ALL: &'static [Self] = &[
        TransferStatus::Pending,
        TransferStatus::Approved,
        TransferStatus::InTransit,
        TransferStatus::Received,
        TransferStatus::Cancelled,
    ];
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Approved => "APPROVED",
            TransferStatus::InTransit => "IN_TRANSIT",
            TransferStatus::Received => "RECEIVED",
            TransferStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

// PENDING -> APPROVED -> IN_TRANSIT -> RECEIVED; PENDING|APPROVED -> CANCELLED
pub static TRANSFER_TRANSITIONS: TransitionTable<TransferStatus> = TransitionTable::new(&[
    Transition {
        action: DocumentAction::Approve,
        from: &[TransferStatus::Pending],
        to: TransferStatus::Approved,
    },
    Transition {
        action: DocumentAction::Ship,
        from: &[TransferStatus::Approved],
        to: TransferStatus::InTransit,
    },
    Transition {
        action: DocumentAction::Receive,
        from: &[TransferStatus::InTransit],
        to: TransferStatus::Received,
    },
    Transition {
        action: DocumentAction::Cancel,
        from: &[TransferStatus::Pending, TransferStatus::Approved],
        to: TransferStatus::Cancelled,
    },
]);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub received_quantity: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferLineInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTransfer {
    pub from_store_id: Uuid,
    pub to_store_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct TransferKind;

pub type TransferDocument = Document<TransferKind>;

impl DocumentKind for TransferKind {
    type Status = TransferStatus;
    type Line = TransferLine;
    type LineInput = TransferLineInput;
    type LinePayload = TransferLineInput;
    type Header = NewTransfer;

    const TAG: DocumentKindTag = DocumentKindTag::Transfer;
    const RESOURCE: &'static str = "transfers";

    fn transitions() -> &'static TransitionTable<TransferStatus> {
        &TRANSFER_TRANSITIONS
    }

    fn draft_permission() -> PermissionCode {
        PermissionCode::ManageTransfers
    }

    fn action_permission(action: DocumentAction) -> PermissionCode {
        match action {
            DocumentAction::Approve => PermissionCode::ApproveTransfer,
            DocumentAction::Receive => PermissionCode::ReceiveTransfer,
            _ => PermissionCode::ManageTransfers,
        }
    }

    fn check_header(header: &NewTransfer) -> Result<(), AppError> {
        header.validate()?;
        if header.from_store_id == header.to_store_id {
            return Err(AppError::Validation(
                "A loja de origem e a de destino devem ser diferentes.".to_string(),
            ));
        }
        Ok(())
    }

    // Quantidade inteira e positiva
    fn prepare_line(input: TransferLineInput) -> Result<TransferLineInput, AppError> {
        if input.quantity <= Decimal::ZERO || !is_whole_number(&input.quantity) {
            return Err(AppError::Validation(
                "A quantidade transferida deve ser um número inteiro maior que zero.".to_string(),
            ));
        }
        Ok(input)
    }
}
