// src/services/auth_gate.rs

use reqwest::Url;

use crate::models::rbac::{PermissionCode, PermissionSet};
use crate::services::session_store::{AuthStatus, SessionStore};

const PAGE_PARAM: &str = "page";

// --- Requisito de permissão ---

/// "Pelo menos uma de". Vazio = qualquer usuário autenticado.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionRequirement {
    any_of: Vec<PermissionCode>,
}

impl PermissionRequirement {
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn any_of(codes: impl IntoIterator<Item = PermissionCode>) -> Self {
        Self { any_of: codes.into_iter().collect() }
    }

    pub fn codes(&self) -> &[PermissionCode] {
        &self.any_of
    }

    pub fn is_satisfied_by(&self, effective: &PermissionSet) -> bool {
        self.any_of.is_empty() || effective.contains_any(&self.any_of)
    }
}

// --- Guarda de rota ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Validação da sessão em andamento: mostrar carregando.
    Pending,
    LoginRequired,
    Allowed,
    /// Tela fixa de acesso negado, nunca conteúdo parcial.
    Denied,
}

pub fn guard_route(
    status: AuthStatus,
    effective: &PermissionSet,
    requirement: &PermissionRequirement,
) -> RouteAccess {
    match status {
        AuthStatus::Unknown => RouteAccess::Pending,
        AuthStatus::Guest => RouteAccess::LoginRequired,
        AuthStatus::Authenticated if requirement.is_satisfied_by(effective) => RouteAccess::Allowed,
        AuthStatus::Authenticated => RouteAccess::Denied,
    }
}

// --- Menu ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub id: String,
    pub label: String,
    // Sem etiqueta = sempre visível
    pub requires: Option<PermissionRequirement>,
}

impl NavEntry {
    pub fn public(id: &str, label: &str) -> Self {
        Self { id: id.to_string(), label: label.to_string(), requires: None }
    }

    pub fn gated(id: &str, label: &str, any_of: &[PermissionCode]) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            requires: Some(PermissionRequirement::any_of(any_of.iter().cloned())),
        }
    }
}

/// Entradas sem etiqueta sempre aparecem; as etiquetadas só com sessão
/// autenticada e pelo menos uma das permissões. Status desconhecido esconde.
pub fn visible_entries<'a>(
    menu: &'a [NavEntry],
    status: AuthStatus,
    effective: &PermissionSet,
) -> Vec<&'a NavEntry> {
    menu.iter()
        .filter(|entry| match &entry.requires {
            None => true,
            Some(req) => {
                status == AuthStatus::Authenticated
                    && !req.codes().is_empty()
                    && effective.contains_any(req.codes())
            }
        })
        .collect()
}

/// Menu do shell da suíte (variante com permissões).
pub fn default_navigation() -> Vec<NavEntry> {
    use PermissionCode::*;

    vec![
        NavEntry::public("dashboard", "Painel"),
        NavEntry::gated("inventory", "Estoque", &[ViewInventory, ManageInventory]),
        NavEntry::gated("sales", "Vendas", &[CreateSale, PostSale]),
        NavEntry::gated("returns", "Devoluções", &[ProcessReturn, ApproveReturn]),
        NavEntry::gated("transfers", "Transferências", &[ManageTransfers, ApproveTransfer, ReceiveTransfer]),
        NavEntry::gated("counts", "Contagens", &[ManageCounts, ApproveCount]),
        NavEntry::gated("registers", "Caixas", &[ManageRegister, CreateSale]),
        NavEntry::gated("timekeeping", "Ponto", &[ClockInOut]),
        NavEntry::gated("communications", "Comunicados", &[ViewCommunications]),
        NavEntry::gated("promotions", "Promoções", &[ViewPromotions]),
        NavEntry::gated("reports", "Relatórios", &[ViewReports]),
        NavEntry::gated("users", "Usuários", &[ManageUsers]),
        NavEntry::gated("developer", "Desenvolvedor", &[DeveloperAccess]),
    ]
}

// --- Página ativa no endereço ---

/// Página ativa guardada no parâmetro `page` da URL, para voltar/avançar/recarregar.
/// Ids fora do menu caem na página padrão.
#[derive(Debug, Clone)]
pub struct PageState {
    known: Vec<String>,
    default_page: String,
    current: String,
}

impl PageState {
    pub fn new(menu: &[NavEntry], default_page: &str) -> Self {
        let known: Vec<String> = menu.iter().map(|e| e.id.clone()).collect();
        let default_page = if known.iter().any(|k| k == default_page) {
            default_page.to_string()
        } else {
            known.first().cloned().unwrap_or_else(|| default_page.to_string())
        };

        Self { known, current: default_page.clone(), default_page }
    }

    pub fn from_url(menu: &[NavEntry], default_page: &str, url: &Url) -> Self {
        let mut state = Self::new(menu, default_page);
        if let Some((_, page)) = url.query_pairs().find(|(k, _)| k == PAGE_PARAM) {
            state.select(&page);
        }
        state
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn select(&mut self, id: &str) -> &str {
        if self.known.iter().any(|k| k == id) {
            self.current = id.to_string();
        } else {
            tracing::debug!("Página '{}' desconhecida, usando '{}'.", id, self.default_page);
            self.current = self.default_page.clone();
        }
        &self.current
    }

    /// Grava a página atual na URL, preservando os outros parâmetros.
    pub fn write_to_url(&self, url: &mut Url) {
        let others: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != PAGE_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &others {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(PAGE_PARAM, &self.current);
    }
}

// --- AuthGate ---

/// Liga o `SessionStore` ao menu e às rotas.
#[derive(Debug, Clone)]
pub struct AuthGate {
    store: SessionStore,
    menu: Vec<NavEntry>,
}

impl AuthGate {
    pub fn new(store: SessionStore, menu: Vec<NavEntry>) -> Self {
        Self { store, menu }
    }

    pub fn menu(&self) -> &[NavEntry] {
        &self.menu
    }

    pub fn route(&self, requirement: &PermissionRequirement) -> RouteAccess {
        guard_route(self.store.status(), &self.store.permissions(), requirement)
    }

    /// Acesso à página de um item do menu, pela etiqueta do próprio item.
    pub fn page_access(&self, page_id: &str) -> RouteAccess {
        let requirement = self
            .menu
            .iter()
            .find(|e| e.id == page_id)
            .and_then(|e| e.requires.clone())
            .unwrap_or_default();
        self.route(&requirement)
    }

    pub fn navigation(&self) -> Vec<&NavEntry> {
        visible_entries(&self.menu, self.store.status(), &self.store.permissions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::PermissionCode::*;

    fn set(codes: &[PermissionCode]) -> PermissionSet {
        codes.iter().cloned().collect()
    }

    fn ids(entries: Vec<&NavEntry>) -> Vec<&str> {
        entries.into_iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn route_guard_outcomes() {
        let req = PermissionRequirement::any_of([ManageUsers, DeveloperAccess]);
        let effective = set(&[ManageUsers]);

        assert_eq!(guard_route(AuthStatus::Authenticated, &effective, &req), RouteAccess::Allowed);
        assert_eq!(guard_route(AuthStatus::Authenticated, &set(&[CreateSale]), &req), RouteAccess::Denied);
        assert_eq!(guard_route(AuthStatus::Unknown, &effective, &req), RouteAccess::Pending);
        assert_eq!(guard_route(AuthStatus::Guest, &effective, &req), RouteAccess::LoginRequired);
        assert_eq!(
            guard_route(AuthStatus::Authenticated, &PermissionSet::new(), &PermissionRequirement::authenticated()),
            RouteAccess::Allowed
        );
    }

    #[test]
    fn denied_inventory_entry_is_hidden() {
        let menu = default_navigation();
        let visible = ids(visible_entries(&menu, AuthStatus::Authenticated, &PermissionSet::new()));
        assert!(!visible.contains(&"inventory"));
        assert_eq!(visible, vec!["dashboard"]);
    }

    #[test]
    fn tagged_entries_hidden_while_status_unknown() {
        let menu = default_navigation();
        let everything = set(&[ViewInventory, ManageUsers, CreateSale]);

        assert_eq!(ids(visible_entries(&menu, AuthStatus::Unknown, &everything)), vec!["dashboard"]);
        assert_eq!(ids(visible_entries(&menu, AuthStatus::Guest, &everything)), vec!["dashboard"]);

        let visible = ids(visible_entries(&menu, AuthStatus::Authenticated, &everything));
        assert_eq!(visible, vec!["dashboard", "inventory", "sales", "registers", "users"]);
    }

    #[test]
    fn page_state_round_trips_through_url() {
        let menu = default_navigation();
        let mut url = Url::parse("https://pdv.local/app?store=7").unwrap();

        let mut state = PageState::new(&menu, "dashboard");
        state.select("transfers");
        state.write_to_url(&mut url);
        assert_eq!(url.query(), Some("store=7&page=transfers"));

        let restored = PageState::from_url(&menu, "dashboard", &url);
        assert_eq!(restored.current(), "transfers");
    }

    #[test]
    fn unknown_page_falls_back_to_default() {
        let menu = default_navigation();
        let url = Url::parse("https://pdv.local/app?page=hacker-tools").unwrap();
        assert_eq!(PageState::from_url(&menu, "dashboard", &url).current(), "dashboard");

        let mut state = PageState::new(&menu, "nao-existe");
        assert_eq!(state.current(), "dashboard");
        assert_eq!(state.select("counts"), "counts");
        assert_eq!(state.select(""), "dashboard");
    }
}
