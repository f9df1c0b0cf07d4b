// src/models/rbac.rs

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::validate_not_blank;

// --- Códigos de permissão ---

/// Código de permissão do catálogo global.
/// Códigos que o cliente ainda não conhece chegam como `Unknown` e seguem opacos.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PermissionCode {
    ViewInventory,
    ManageInventory,
    CreateSale,
    PostSale,
    ProcessReturn,
    ApproveReturn,
    ManageTransfers,
    ApproveTransfer,
    ReceiveTransfer,
    ManageCounts,
    ApproveCount,
    ManageRegister,
    ClockInOut,
    ViewCommunications,
    ViewPromotions,
    ViewReports,
    ManageUsers,
    DeveloperAccess,
    Unknown(String),
}

impl PermissionCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "VIEW_INVENTORY" => Self::ViewInventory,
            "MANAGE_INVENTORY" => Self::ManageInventory,
            "CREATE_SALE" => Self::CreateSale,
            "POST_SALE" => Self::PostSale,
            "PROCESS_RETURN" => Self::ProcessReturn,
            "APPROVE_RETURN" => Self::ApproveReturn,
            "MANAGE_TRANSFERS" => Self::ManageTransfers,
            "APPROVE_TRANSFER" => Self::ApproveTransfer,
            "RECEIVE_TRANSFER" => Self::ReceiveTransfer,
            "MANAGE_COUNTS" => Self::ManageCounts,
            "APPROVE_COUNT" => Self::ApproveCount,
            "MANAGE_REGISTER" => Self::ManageRegister,
            "CLOCK_IN_OUT" => Self::ClockInOut,
            "VIEW_COMMUNICATIONS" => Self::ViewCommunications,
            "VIEW_PROMOTIONS" => Self::ViewPromotions,
            "VIEW_REPORTS" => Self::ViewReports,
            "MANAGE_USERS" => Self::ManageUsers,
            "DEVELOPER_ACCESS" => Self::DeveloperAccess,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ViewInventory => "VIEW_INVENTORY",
            Self::ManageInventory => "MANAGE_INVENTORY",
            Self::CreateSale => "CREATE_SALE",
            Self::PostSale => "POST_SALE",
            Self::ProcessReturn => "PROCESS_RETURN",
            Self::ApproveReturn => "APPROVE_RETURN",
            Self::ManageTransfers => "MANAGE_TRANSFERS",
            Self::ApproveTransfer => "APPROVE_TRANSFER",
            Self::ReceiveTransfer => "RECEIVE_TRANSFER",
            Self::ManageCounts => "MANAGE_COUNTS",
            Self::ApproveCount => "APPROVE_COUNT",
            Self::ManageRegister => "MANAGE_REGISTER",
            Self::ClockInOut => "CLOCK_IN_OUT",
            Self::ViewCommunications => "VIEW_COMMUNICATIONS",
            Self::ViewPromotions => "VIEW_PROMOTIONS",
            Self::ViewReports => "VIEW_REPORTS",
            Self::ManageUsers => "MANAGE_USERS",
            Self::DeveloperAccess => "DEVELOPER_ACCESS",
            Self::Unknown(code) => code,
        }
    }

    /// Códigos que nenhuma exceção (override) pode afetar.
    pub fn is_protected(&self) -> bool {
        matches!(self, Self::DeveloperAccess)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    pub fn category(&self) -> PermissionCategory {
        match self {
            Self::ViewInventory | Self::ManageInventory => PermissionCategory::Inventory,
            Self::CreateSale | Self::PostSale | Self::ProcessReturn | Self::ApproveReturn => {
                PermissionCategory::Sales
            }
            Self::ManageTransfers
            | Self::ApproveTransfer
            | Self::ReceiveTransfer
            | Self::ManageCounts
            | Self::ApproveCount => PermissionCategory::Documents,
            Self::ManageRegister => PermissionCategory::Registers,
            Self::ClockInOut => PermissionCategory::Timekeeping,
            Self::ViewCommunications => PermissionCategory::Communications,
            Self::ViewPromotions => PermissionCategory::Promotions,
            Self::ViewReports => PermissionCategory::Reports,
            Self::ManageUsers => PermissionCategory::Users,
            Self::DeveloperAccess => PermissionCategory::System,
            Self::Unknown(_) => PermissionCategory::Other,
        }
    }
}

impl From<String> for PermissionCode {
    fn from(code: String) -> Self {
        PermissionCode::parse(&code)
    }
}

impl From<&str> for PermissionCode {
    fn from(code: &str) -> Self {
        PermissionCode::parse(code)
    }
}

impl From<PermissionCode> for String {
    fn from(code: PermissionCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionCategory {
    Inventory,
    Sales,
    Registers,
    Documents,
    Users,
    System,
    Timekeeping,
    Communications,
    Promotions,
    Reports,
    #[serde(other)]
    Other,
}

// --- Conjunto efetivo ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<PermissionCode>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, code: &PermissionCode) -> bool {
        self.0.contains(code)
    }

    /// "Pelo menos uma de". Lista vazia nunca é satisfeita aqui.
    pub fn contains_any(&self, codes: &[PermissionCode]) -> bool {
        codes.iter().any(|c| self.0.contains(c))
    }

    pub fn insert(&mut self, code: PermissionCode) -> bool {
        self.0.insert(code)
    }

    pub fn remove(&mut self, code: &PermissionCode) -> bool {
        self.0.remove(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionCode> {
        self.0.iter()
    }
}

impl FromIterator<PermissionCode> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = PermissionCode>>(iter: I) -> Self {
        PermissionSet(iter.into_iter().collect())
    }
}

impl IntoIterator for PermissionSet {
    type Item = PermissionCode;
    type IntoIter = std::collections::btree_set::IntoIter<PermissionCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// --- Catálogo (GET /api/permissions) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDescriptor {
    pub code: PermissionCode,
    pub category: PermissionCategory,
    pub description: Option<String>,
}

/// Catálogo carregado do servidor. Códigos que o cliente não reconhece
/// continuam válidos, só não têm variante própria.
#[derive(Debug, Clone, Default)]
pub struct PermissionCatalog {
    entries: HashMap<PermissionCode, PermissionDescriptor>,
}

impl PermissionCatalog {
    pub fn load(descriptors: Vec<PermissionDescriptor>) -> Self {
        let mut entries = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if !descriptor.code.is_known() {
                tracing::warn!(
                    "Permissão '{}' do catálogo não é conhecida por esta versão do cliente.",
                    descriptor.code
                );
            }
            entries.insert(descriptor.code.clone(), descriptor);
        }
        Self { entries }
    }

    pub fn get(&self, code: &PermissionCode) -> Option<&PermissionDescriptor> {
        self.entries.get(code)
    }

    pub fn contains(&self, code: &PermissionCode) -> bool {
        self.entries.contains_key(code)
    }

    // A categoria do servidor vale mais que a do cliente
    pub fn category_of(&self, code: &PermissionCode) -> PermissionCategory {
        self.entries
            .get(code)
            .map(|d| d.category)
            .unwrap_or_else(|| code.category())
    }

    pub fn unknown_codes(&self) -> Vec<&PermissionCode> {
        let mut codes: Vec<&PermissionCode> =
            self.entries.keys().filter(|c| !c.is_known()).collect();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// --- Cargos e exceções ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub organization_id: Option<Uuid>,
    #[serde(default)]
    pub permissions: Vec<PermissionCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideType {
    Grant,
    Deny,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionOverride {
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub permission_code: PermissionCode,
    #[serde(rename = "type")]
    pub override_type: OverrideType,
    pub is_active: bool,

    // Trilha de auditoria
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub revoked_by: Option<Uuid>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

// GET /api/admin/users/{id}/access
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccess {
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub overrides: Vec<PermissionOverride>,
}

// --- Payloads ---

#[derive(Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRolePayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub role_name: String,
}

#[derive(Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOverridePayload {
    pub permission_code: PermissionCode,
    #[serde(rename = "type")]
    pub override_type: OverrideType,
    // O motivo vai para a trilha de auditoria
    #[validate(custom(function = "validate_not_blank"))]
    pub reason: String,
}
