// src/services/register_session.rs

// Ciclo de um turno de caixa: CLOSED -> OPEN -> CLOSED. Cada turno novo é uma
// sessão nova no servidor; uma sessão fechada nunca é reaberta.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::RegisterApi,
    common::{
        busy::BusyFlag,
        error::{AppError, ErrorCategory},
        request_seq::RequestSequencer,
    },
    middleware::auth::with_session,
    models::{
        rbac::PermissionCode,
        register::{
            CashDropPayload, CashVariance, CloseSessionPayload, DrawerEvent, DrawerEventType,
            NoSalePayload, OpenShiftPayload, Register, RegisterSession,
        },
    },
    services::session_store::{AuthStatus, SessionStore},
};

/// O que se sabe do caixa selecionado para o usuário atual.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterSelection {
    /// Descoberta em andamento (ou ainda não confirmada pelo servidor).
    Pending,
    Available,
    /// Turno aberto do próprio usuário: retomar sem pedir troco inicial.
    Resume(RegisterSession),
    OccupiedByOther { operator_id: Uuid },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShiftStart {
    Opened(RegisterSession),
    Resumed(RegisterSession),
}

impl ShiftStart {
    pub fn session(&self) -> &RegisterSession {
        match self {
            ShiftStart::Opened(s) | ShiftStart::Resumed(s) => s,
        }
    }
}

/// Turno fechado, relido do servidor (esperado e diferença calculados lá).
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedShift {
    pub session: RegisterSession,
    pub variance: Option<CashVariance>,
}

#[derive(Debug)]
struct RegisterState {
    // Usuário a quem pertencem seleção, turno atual e eventos
    owner: Option<Uuid>,
    registers: Vec<Register>,
    selected: Option<Uuid>,
    selection: RegisterSelection,
    current: Option<RegisterSession>,
    drawer_events: Vec<DrawerEvent>,
    discovery: RequestSequencer,
}

impl Default for RegisterState {
    fn default() -> Self {
        Self {
            owner: None,
            registers: Vec::new(),
            selected: None,
            selection: RegisterSelection::Pending,
            current: None,
            drawer_events: Vec::new(),
            discovery: RequestSequencer::default(),
        }
    }
}

pub struct RegisterSessionMachine {
    api: RegisterApi,
    store: SessionStore,
    state: Mutex<RegisterState>,
    busy: BusyFlag,
}

impl RegisterSessionMachine {
    pub fn new(api: RegisterApi, store: SessionStore) -> Self {
        Self {
            api,
            store,
            state: Mutex::new(RegisterState::default()),
            busy: BusyFlag::default(),
        }
    }

    // --- Leitura do estado ---

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn registers(&self) -> Vec<Register> {
        self.state.lock().registers.clone()
    }

    pub fn selected_register(&self) -> Option<Uuid> {
        self.sync_owner()?;
        self.state.lock().selected
    }

    pub fn selection(&self) -> RegisterSelection {
        match self.sync_owner() {
            Some(_) => self.state.lock().selection.clone(),
            None => RegisterSelection::Pending,
        }
    }

    pub fn current_session(&self) -> Option<RegisterSession> {
        self.sync_owner()?;
        self.state.lock().current.clone()
    }

    pub fn drawer_events(&self) -> Vec<DrawerEvent> {
        match self.sync_owner() {
            Some(_) => self.state.lock().drawer_events.clone(),
            None => Vec::new(),
        }
    }

    // --- Descoberta ---

    pub async fn load_registers(&self) -> Result<Vec<Register>, AppError> {
        let api = &self.api;
        let registers = with_session(&self.store, |ctx| async move { api.list_registers(&ctx).await }).await?;

        self.state.lock().registers = registers.clone();
        Ok(registers)
    }

    /// Seleciona um caixa e consulta o turno aberto nele.
    /// Um turno do próprio usuário vira "retomar" e passa a ser o turno atual.
    pub async fn select_register(&self, register_id: Uuid) -> Result<RegisterSelection, AppError> {
        let user_id = self.current_user_id()?;
        self.state.lock().selected = Some(register_id);
        self.discover(register_id, user_id).await
    }

    // --- Abertura ---

    pub async fn open_shift(&self, register_id: Uuid, opening_cash: Decimal) -> Result<ShiftStart, AppError> {
        let _busy = self.busy.try_acquire()?;
        let user_id = self.current_user_id()?;

        // 1. O que já se sabe do caixa; sem informação, pergunta ao servidor
        let selection = match self.known_selection(register_id, user_id) {
            Some(known) => known,
            None => {
                self.state.lock().selected = Some(register_id);
                self.discover(register_id, user_id).await?
            }
        };

        // 2. Exclusão mútua local, antes de qualquer requisição
        let occupant = match &selection {
            RegisterSelection::OccupiedByOther { operator_id } => Some(*operator_id),
            RegisterSelection::Resume(session) if session.operator_id != user_id => Some(session.operator_id),
            _ => None,
        };
        if let Some(operator_id) = occupant {
            tracing::warn!(
                "Abertura recusada: caixa {} tem turno aberto do operador {}.",
                register_id,
                operator_id
            );
            return Err(AppError::RegisterOccupied { register_id, operator_id });
        }

        match selection {
            RegisterSelection::Resume(session) => {
                let mut state = self.state.lock();
                state.selected = Some(register_id);
                state.current = Some(session.clone());
                tracing::info!("Turno {} retomado no caixa {}.", session.id, register_id);
                return Ok(ShiftStart::Resumed(session));
            }
            RegisterSelection::Pending | RegisterSelection::Available | RegisterSelection::OccupiedByOther { .. } => {}
        }

        // 3. Um turno por operador
        if let Some(other) = self.own_open_register_elsewhere(register_id, user_id) {
            return Err(AppError::ShiftAlreadyOpen { register_id: other });
        }

        // 4. Troco inicial
        let payload = OpenShiftPayload { opening_cash };
        payload.validate()?;

        // 5. Abre no servidor
        let api = &self.api;
        let payload = &payload;
        let result = with_session(&self.store, |ctx| async move {
            api.open_shift(&ctx, register_id, payload).await
        })
        .await;

        match result {
            Ok(session) => {
                let mut state = self.state.lock();
                state.selected = Some(register_id);
                state.selection = RegisterSelection::Resume(session.clone());
                state.current = Some(session.clone());
                state.drawer_events.clear();
                if let Some(register) = state.registers.iter_mut().find(|r| r.id == register_id) {
                    register.open_session = Some(session.clone());
                }
                tracing::info!("Turno {} aberto no caixa {}.", session.id, register_id);
                Ok(ShiftStart::Opened(session))
            }
            Err(err) => {
                // A recusa do servidor é a verdade: relê o caixa e descarta o que se supunha
                if matches!(err.category(), ErrorCategory::Validation | ErrorCategory::Authorization) {
                    if let Err(e) = self.discover(register_id, user_id).await {
                        tracing::debug!("Redescoberta do caixa {} falhou: {}", register_id, e);
                    }
                }
                Err(err)
            }
        }
    }

    // --- Eventos de gaveta ---

    pub async fn no_sale(&self, reason: &str) -> Result<DrawerEvent, AppError> {
        let _busy = self.busy.try_acquire()?;
        self.require_manager(DrawerEventType::NoSale)?;
        let session_id = self.open_session_id()?;

        let payload = NoSalePayload { reason: reason.trim().to_string() };
        payload.validate()?;

        let api = &self.api;
        let payload = &payload;
        let event = with_session(&self.store, |ctx| async move {
            api.no_sale(&ctx, session_id, payload).await
        })
        .await?;

        self.record_event(event.clone());
        Ok(event)
    }

    pub async fn cash_drop(&self, amount: Decimal, reason: &str) -> Result<DrawerEvent, AppError> {
        let _busy = self.busy.try_acquire()?;
        self.require_manager(DrawerEventType::CashDrop)?;
        let session_id = self.open_session_id()?;

        let payload = CashDropPayload { amount, reason: reason.trim().to_string() };
        payload.validate()?;

        let api = &self.api;
        let payload = &payload;
        let event = with_session(&self.store, |ctx| async move {
            api.cash_drop(&ctx, session_id, payload).await
        })
        .await?;

        self.record_event(event.clone());
        Ok(event)
    }

    /// Histórico de gaveta do turno atual, relido do servidor.
    pub async fn refresh_drawer_events(&self) -> Result<Vec<DrawerEvent>, AppError> {
        let session_id = self.open_session_id()?;

        let api = &self.api;
        let events = with_session(&self.store, |ctx| async move {
            api.list_drawer_events(&ctx, session_id).await
        })
        .await?;

        let mut state = self.state.lock();
        if state.current.as_ref().is_some_and(|s| s.id == session_id) {
            state.drawer_events = events.clone();
        }
        Ok(events)
    }

    // --- Fechamento ---

    pub async fn close_shift(&self, closing_cash: Decimal) -> Result<ClosedShift, AppError> {
        let _busy = self.busy.try_acquire()?;
        let user_id = self.current_user_id()?;
        let (session_id, register_id) = {
            let state = self.state.lock();
            let session = state
                .current
                .as_ref()
                .filter(|s| s.is_open() && s.operator_id == user_id)
                .ok_or(AppError::NoOpenShift)?;
            (session.id, session.register_id)
        };

        let payload = CloseSessionPayload { closing_cash };
        payload.validate()?;

        // 1. Fecha
        let api = &self.api;
        let payload = &payload;
        with_session(&self.store, |ctx| async move {
            api.close_session(&ctx, session_id, payload).await
        })
        .await?;

        // Fechado no servidor: o turno local acaba aqui, mesmo que a releitura falhe
        {
            let mut state = self.state.lock();
            state.current = None;
            state.drawer_events.clear();
            if state.selected == Some(register_id) {
                state.selection = RegisterSelection::Pending;
            }
            if let Some(register) = state.registers.iter_mut().find(|r| r.id == register_id) {
                register.open_session = None;
            }
        }
        tracing::info!("Turno {} fechado no caixa {} com {} contados.", session_id, register_id, closing_cash);

        // 2. Relê: esperado e diferença só existem no servidor
        let reread = self.closed_shift(session_id).await;

        // 3. Próximo turno do caixa: só "livre" depois que o servidor confirmar
        if self.selected_register() == Some(register_id) {
            if let Err(e) = self.discover(register_id, user_id).await {
                tracing::warn!("Não foi possível consultar o caixa {} após o fechamento: {}", register_id, e);
            }
        }

        reread.map_err(|source| {
            tracing::warn!("Turno {} fechado, mas a releitura falhou: {}", session_id, source);
            AppError::ShiftClosedUnconfirmed {
                session_id,
                source: Box::new(source),
            }
        })
    }

    /// Relê um turno já fechado: esperado e diferença vêm do servidor.
    pub async fn closed_shift(&self, session_id: Uuid) -> Result<ClosedShift, AppError> {
        let api = &self.api;
        let session = with_session(&self.store, |ctx| async move {
            api.get_session(&ctx, session_id).await
        })
        .await?;

        let variance = session.cash_variance();
        tracing::info!(
            "Turno {}: esperado {:?}, diferença {:?}.",
            session.id,
            session.expected_cash,
            session.variance
        );
        Ok(ClosedShift { session, variance })
    }

    // --- Internos ---

    fn current_user_id(&self) -> Result<Uuid, AppError> {
        self.sync_owner().ok_or(AppError::NotAuthenticated)
    }

    /// O cache pertence a um usuário; com outro usuário logado ele é descartado.
    fn sync_owner(&self) -> Option<Uuid> {
        let user_id = self.store.user().map(|u| u.id)?;

        let mut state = self.state.lock();
        if state.owner != Some(user_id) {
            if state.owner.is_some() {
                tracing::info!("Operador trocado: seleção e turno do anterior descartados.");
            }
            state.owner = Some(user_id);
            state.selected = None;
            state.selection = RegisterSelection::Pending;
            state.current = None;
            state.drawer_events.clear();
        }
        Some(user_id)
    }

    /// Turno aberto do próprio usuário.
    fn open_session_id(&self) -> Result<Uuid, AppError> {
        let user_id = self.current_user_id()?;
        self.state
            .lock()
            .current
            .as_ref()
            .filter(|s| s.is_open() && s.operator_id == user_id)
            .map(|s| s.id)
            .ok_or(AppError::NoOpenShift)
    }

    fn require_manager(&self, event: DrawerEventType) -> Result<(), AppError> {
        if self.store.status() != AuthStatus::Authenticated {
            return Err(AppError::NotAuthenticated);
        }
        if !self.store.has_permission(&PermissionCode::ManageRegister) {
            tracing::warn!("'{}' bloqueada: operador sem MANAGE_REGISTER.", event);
            return Err(AppError::ManagerApprovalRequired(event));
        }
        Ok(())
    }

    fn record_event(&self, event: DrawerEvent) {
        let mut state = self.state.lock();
        if state.current.as_ref().is_some_and(|s| s.id == event.session_id) {
            tracing::info!("Evento de gaveta '{}' registrado.", event.event_type);
            state.drawer_events.push(event);
        }
    }

    fn known_selection(&self, register_id: Uuid, user_id: Uuid) -> Option<RegisterSelection> {
        let state = self.state.lock();

        if state.selected == Some(register_id) {
            match &state.selection {
                RegisterSelection::Pending => {}
                // Retomada de outro usuário não vale: pergunta de novo
                RegisterSelection::Resume(s) if s.operator_id != user_id => {}
                known => return Some(known.clone()),
            }
        }

        // A listagem também conta, mas só para dizer que está ocupado
        let listed = state
            .registers
            .iter()
            .find(|r| r.id == register_id)
            .and_then(|r| r.open_session.clone());
        match classify(listed, user_id) {
            occupied @ RegisterSelection::OccupiedByOther { .. } => Some(occupied),
            _ => None,
        }
    }

    fn own_open_register_elsewhere(&self, register_id: Uuid, user_id: Uuid) -> Option<Uuid> {
        let state = self.state.lock();

        if let Some(current) = state.current.as_ref().filter(|s| s.is_open() && s.operator_id == user_id) {
            if current.register_id != register_id {
                return Some(current.register_id);
            }
        }

        state
            .registers
            .iter()
            .filter(|r| r.id != register_id)
            .find(|r| {
                r.open_session
                    .as_ref()
                    .is_some_and(|s| s.is_open() && s.operator_id == user_id)
            })
            .map(|r| r.id)
    }

    async fn discover(&self, register_id: Uuid, user_id: Uuid) -> Result<RegisterSelection, AppError> {
        let ticket = {
            let mut state = self.state.lock();
            state.selection = RegisterSelection::Pending;
            state.discovery.issue(register_id)
        };

        let api = &self.api;
        let session = with_session(&self.store, |ctx| async move {
            api.current_session(&ctx, register_id).await
        })
        .await?;

        if self.store.user().map(|u| u.id) != Some(user_id) {
            tracing::debug!("Resposta do caixa {} descartada: operador mudou.", register_id);
            return Err(AppError::Superseded);
        }

        let mut state = self.state.lock();
        if state.owner != Some(user_id)
            || state.selected != Some(register_id)
            || !state.discovery.is_latest(register_id, ticket)
        {
            tracing::debug!("Resposta do caixa {} descartada: seleção mudou.", register_id);
            return Err(AppError::Superseded);
        }

        let open = session.filter(|s| s.is_open());
        if let Some(register) = state.registers.iter_mut().find(|r| r.id == register_id) {
            register.open_session = open.clone();
        }

        let selection = classify(open, user_id);
        match &selection {
            RegisterSelection::Resume(session) => state.current = Some(session.clone()),
            _ => {
                if state.current.as_ref().is_some_and(|c| c.register_id == register_id) {
                    state.current = None;
                    state.drawer_events.clear();
                }
            }
        }
        state.selection = selection.clone();
        Ok(selection)
    }
}

fn classify(session: Option<RegisterSession>, user_id: Uuid) -> RegisterSelection {
    match session {
        Some(s) if s.is_open() && s.operator_id == user_id => RegisterSelection::Resume(s),
        Some(s) if s.is_open() => RegisterSelection::OccupiedByOther { operator_id: s.operator_id },
        _ => RegisterSelection::Available,
    }
}
