// src/services/workflow.rs

// Motor único para devoluções, transferências e contagens. O que muda entre
// eles (tabela de transições, formato da linha, permissões) vem de `DocumentKind`.

use std::collections::HashMap;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    api::DocumentApi,
    common::{
        busy::BusyFlag,
        error::{AppError, ErrorCategory},
        request_seq::RequestSequencer,
    },
    middleware::{auth::with_session, rbac::require_permission},
    models::{
        counts::CountKind,
        documents::{Document, DocumentAction, DocumentKind, DocumentStatus},
        returns::ReturnKind,
        transfers::TransferKind,
    },
    services::session_store::SessionStore,
};

pub type ReturnWorkflow = DocumentWorkflow<ReturnKind>;
pub type TransferWorkflow = DocumentWorkflow<TransferKind>;
pub type CountWorkflow = DocumentWorkflow<CountKind>;

struct WorkflowState<K: DocumentKind> {
    documents: HashMap<Uuid, Document<K>>,
    // No máximo um documento em elaboração por tipo, de um usuário
    active_draft: Option<Uuid>,
    draft_owner: Option<Uuid>,
    // Linha aceita pelo servidor, mas o documento não foi relido depois
    draft_needs_refresh: bool,
    reads: RequestSequencer,
}

impl<K: DocumentKind> Default for WorkflowState<K> {
    fn default() -> Self {
        Self {
            documents: HashMap::new(),
            active_draft: None,
            draft_owner: None,
            draft_needs_refresh: false,
            reads: RequestSequencer::default(),
        }
    }
}

impl<K: DocumentKind> WorkflowState<K> {
    fn clear_draft(&mut self) {
        self.active_draft = None;
        self.draft_owner = None;
        self.draft_needs_refresh = false;
    }

    /// Rascunho do usuário atual. O de outro usuário é solto; sem usuário, nada aparece.
    fn claim_draft(&mut self, user: Option<Uuid>) -> Option<Uuid> {
        let user = user?;
        if self.active_draft.is_some() && self.draft_owner != Some(user) {
            tracing::info!("{} em elaboração de outro usuário liberada.", K::TAG);
            self.clear_draft();
        }
        self.active_draft
    }
}

pub struct DocumentWorkflow<K: DocumentKind> {
    api: DocumentApi<K>,
    store: SessionStore,
    state: Mutex<WorkflowState<K>>,
    busy: BusyFlag,
}

impl<K: DocumentKind> DocumentWorkflow<K> {
    pub fn new(api: DocumentApi<K>, store: SessionStore) -> Self {
        Self {
            api,
            store,
            state: Mutex::new(WorkflowState::default()),
            busy: BusyFlag::default(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    // --- Leitura ---

    pub async fn list(&self) -> Result<Vec<Document<K>>, AppError> {
        let mark = self.state.lock().reads.watermark();

        let api = &self.api;
        let documents = with_session(&self.store, |ctx| async move { api.list(&ctx).await }).await?;

        let mut state = self.state.lock();
        for doc in &documents {
            // Uma leitura individual mais nova vale mais que a listagem
            if state.reads.issued_after(doc.id, mark) {
                continue;
            }
            if state.active_draft == Some(doc.id) && !doc.is_draft() {
                state.clear_draft();
            }
            state.documents.insert(doc.id, doc.clone());
        }
        Ok(documents)
    }

    /// Relê um documento. Respostas que chegam depois de uma leitura mais nova são descartadas.
    pub async fn refresh(&self, id: Uuid) -> Result<Document<K>, AppError> {
        self.fetch(id).await
    }

    pub fn document(&self, id: Uuid) -> Option<Document<K>> {
        self.state.lock().documents.get(&id).cloned()
    }

    pub fn active_draft(&self) -> Option<Document<K>> {
        let user = self.current_user();
        let mut state = self.state.lock();
        state.claim_draft(user).and_then(|id| state.documents.get(&id).cloned())
    }

    /// Ações da tabela a partir do último status lido do servidor.
    pub fn allowed_actions(&self, id: Uuid) -> Vec<DocumentAction> {
        self.state
            .lock()
            .documents
            .get(&id)
            .map(|doc| doc.allowed_actions())
            .unwrap_or_default()
    }

    /// Ações que a tela deve oferecer: permitidas pela tabela e pela sessão.
    pub fn offered_actions(&self, id: Uuid) -> Vec<DocumentAction> {
        self.allowed_actions(id)
            .into_iter()
            .filter(|action| self.store.has_permission(&K::action_permission(*action)))
            .collect()
    }

    // --- Elaboração ---

    /// Cria o cabeçalho e o torna o documento em elaboração.
    pub async fn start_draft(&self, header: K::Header) -> Result<Document<K>, AppError> {
        let _busy = self.busy.try_acquire()?;
        require_permission(&self.store, &K::draft_permission())?;

        let user = self.current_user();
        let active = self.state.lock().claim_draft(user);
        if active.is_some() {
            return Err(AppError::DraftAlreadyActive(K::TAG));
        }
        K::check_header(&header)?;

        let api = &self.api;
        let header = &header;
        let doc = with_session(&self.store, |ctx| async move { api.create(&ctx, header).await }).await?;

        {
            let mut state = self.state.lock();
            state.active_draft = Some(doc.id);
            state.draft_owner = user;
            state.draft_needs_refresh = false;
            state.documents.insert(doc.id, doc.clone());
        }
        tracing::info!("{} {} criada.", K::TAG, doc.id);
        Ok(doc)
    }

    /// Inclui uma linha no documento em elaboração e relê o documento.
    pub async fn add_line(&self, input: K::LineInput) -> Result<Document<K>, AppError> {
        let _busy = self.busy.try_acquire()?;
        require_permission(&self.store, &K::draft_permission())?;

        let user = self.current_user();
        let (id, status) = {
            let mut state = self.state.lock();
            let id = state.claim_draft(user).ok_or(AppError::NoActiveDraft)?;
            let status = state.documents.get(&id).map(|d| d.status).ok_or(AppError::NoActiveDraft)?;
            (id, status)
        };
        if status != <K::Status as DocumentStatus>::initial() {
            return Err(AppError::Validation(format!(
                "Não é possível incluir linhas em um documento com status {}.",
                status
            )));
        }

        let payload = K::prepare_line(input)?;

        let api = &self.api;
        let payload = &payload;
        with_session(&self.store, |ctx| async move { api.add_line(&ctx, id, payload).await }).await?;

        let reread = self.fetch(id).await;
        if let Err(e) = &reread {
            if !matches!(e, AppError::Superseded) {
                tracing::warn!("{} {}: linha incluída, mas a releitura falhou: {}", K::TAG, id, e);
                let mut state = self.state.lock();
                if state.active_draft == Some(id) {
                    state.draft_needs_refresh = true;
                }
            }
        }
        reread
    }

    /// Termina a elaboração e libera a vaga. Exige pelo menos uma linha.
    pub fn submit_draft(&self) -> Result<Document<K>, AppError> {
        if self.busy.is_busy() {
            return Err(AppError::RequestInFlight);
        }

        let user = self.current_user();
        let mut state = self.state.lock();
        let id = state.claim_draft(user).ok_or(AppError::NoActiveDraft)?;
        let doc = state.documents.get(&id).cloned().ok_or(AppError::NoActiveDraft)?;
        if state.draft_needs_refresh {
            return Err(AppError::Validation(
                "Há linhas incluídas que ainda não foram relidas. Atualize o documento antes de enviar.".to_string(),
            ));
        }
        if doc.lines.is_empty() {
            return Err(AppError::Validation(
                "O documento precisa de pelo menos uma linha.".to_string(),
            ));
        }

        state.clear_draft();
        tracing::info!("{} {} enviada com {} linha(s).", K::TAG, id, doc.lines.len());
        Ok(doc)
    }

    /// Descarta o documento em elaboração. Cancela no servidor quando o tipo
    /// permite cancelar um pendente; senão só libera a vaga.
    pub async fn abandon_draft(&self) -> Result<Option<Document<K>>, AppError> {
        let _busy = self.busy.try_acquire()?;

        let user = self.current_user();
        let (id, status) = {
            let mut state = self.state.lock();
            let id = state.claim_draft(user).ok_or(AppError::NoActiveDraft)?;
            (id, state.documents.get(&id).map(|d| d.status))
        };

        let cancellable = status
            .is_some_and(|s| K::transitions().target(s, DocumentAction::Cancel).is_some());

        if cancellable {
            let doc = self.perform(id, DocumentAction::Cancel).await?;
            self.release_draft(id);
            return Ok(Some(doc));
        }

        self.release_draft(id);
        tracing::info!("{} {} descartada sem cancelamento no servidor.", K::TAG, id);
        Ok(None)
    }

    // --- Transições ---

    pub async fn transition(&self, id: Uuid, action: DocumentAction) -> Result<Document<K>, AppError> {
        let _busy = self.busy.try_acquire()?;
        self.perform(id, action).await
    }

    // --- Internos ---

    async fn perform(&self, id: Uuid, action: DocumentAction) -> Result<Document<K>, AppError> {
        // 1. Status mais recente (lê do servidor se ainda não estiver em cache)
        let doc = match self.document(id) {
            Some(doc) => doc,
            None => self.fetch(id).await?,
        };

        // 2. A ação precisa ser uma aresta de saída do status atual
        if K::transitions().target(doc.status, action).is_none() {
            tracing::warn!("{} {}: '{}' recusada no status {}.", K::TAG, id, action, doc.status);
            return Err(AppError::InvalidTransition {
                status: doc.status.to_string(),
                action,
            });
        }

        // 3. Permissão da ação
        require_permission(&self.store, &K::action_permission(action))?;

        // 4. Nada é aprovado vazio
        if action == DocumentAction::Approve && doc.lines.is_empty() {
            return Err(AppError::Validation(
                "Inclua pelo menos uma linha antes de aprovar.".to_string(),
            ));
        }

        // 5. Envia sob a sessão atual
        let api = &self.api;
        let result = with_session(&self.store, |ctx| async move {
            api.transition(&ctx, id, action).await
        })
        .await;

        if let Err(err) = result {
            // Recusa do servidor: relê para recalcular as ações a partir do status real
            if err.category() == ErrorCategory::Validation {
                if let Err(e) = self.fetch(id).await {
                    tracing::debug!("Releitura de {} {} falhou: {}", K::TAG, id, e);
                }
            }
            return Err(err);
        }
        tracing::info!("{} {}: '{}' executada.", K::TAG, id, action);

        // 6. Relê: campos calculados no servidor não são montados aqui
        self.fetch(id).await
    }

    async fn fetch(&self, id: Uuid) -> Result<Document<K>, AppError> {
        let ticket = self.state.lock().reads.issue(id);

        let api = &self.api;
        let doc = with_session(&self.store, |ctx| async move { api.get(&ctx, id).await }).await?;

        self.apply_read(id, ticket, doc)
    }

    fn apply_read(&self, id: Uuid, ticket: u64, doc: Document<K>) -> Result<Document<K>, AppError> {
        let mut state = self.state.lock();
        if !state.reads.is_latest(id, ticket) {
            tracing::debug!("Leitura antiga de {} {} descartada.", K::TAG, id);
            return Err(AppError::Superseded);
        }

        if state.active_draft == Some(id) {
            if doc.is_draft() {
                state.draft_needs_refresh = false;
            } else {
                // Saiu de PENDING: a vaga de elaboração fica livre
                state.clear_draft();
            }
        }
        state.documents.insert(id, doc.clone());
        Ok(doc)
    }

    fn current_user(&self) -> Option<Uuid> {
        self.store.user().map(|u| u.id)
    }

    fn release_draft(&self, id: Uuid) {
        let mut state = self.state.lock();
        if state.active_draft == Some(id) {
            state.clear_draft();
        }
    }
}
