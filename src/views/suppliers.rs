use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::client::InventoryApi;
use crate::api::errors::ApiError;
use crate::api::types::Supplier;
use crate::views::forms::SupplierDraft;
use crate::views::list::{ListView, SupplierListFilters, SupplierSource};
use crate::views::modal::ModalState;
use crate::views::search::SearchDebouncer;
use crate::workflows::confirm::Confirmer;
use crate::workflows::errors::WorkflowError;

/// What a modal submit or delete ended in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplierChange {
    Created(Supplier),
    Updated(Supplier),
    Deleted(String),
    Declined,
    /// Backend refused; the list has been re-fetched
    Rejected(String),
}

/// Supplier directory: paginated table, debounced search, and the
/// add/edit/delete dialog.
pub struct SupplierListView {
    list: ListView<SupplierSource>,
    search: SearchDebouncer,
    search_input: String,
    modal: ModalState<Supplier>,
}

impl SupplierListView {
    pub fn new(api: Arc<dyn InventoryApi>, page_size: u32, debounce: Duration) -> Self {
        Self {
            list: ListView::new(api, SupplierSource, page_size),
            search: SearchDebouncer::new(debounce),
            search_input: String::new(),
            modal: ModalState::Closed,
        }
    }

    pub fn list(&self) -> &ListView<SupplierSource> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListView<SupplierSource> {
        &mut self.list
    }

    pub fn modal(&self) -> &ModalState<Supplier> {
        &self.modal
    }

    pub fn modal_mut(&mut self) -> &mut ModalState<Supplier> {
        &mut self.modal
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        self.list.refresh().await
    }

    /// Keystroke in the search box: remember the text and (re)start the timer
    pub fn type_search(&mut self, text: impl Into<String>) {
        self.search_input = text.into();
        self.search.push(self.search_input.clone());
    }

    /// A keystroke is waiting to settle
    pub fn search_pending(&self) -> bool {
        self.search.is_pending()
    }

    /// Wait for the search box to settle; `None` at once if nothing was typed
    pub async fn next_search(&mut self) -> Option<String> {
        self.search.next().await
    }

    pub fn try_next_search(&mut self) -> Option<String> {
        self.search.try_next()
    }

    /// Apply a settled search term. If the page is not 1 the reset to page 1
    /// is what fetches; if it already is, the search fetches directly. Either
    /// way it is one request.
    pub async fn apply_search(&mut self, term: &str) -> Result<bool, ApiError> {
        let term = term.trim();
        let search = (!term.is_empty()).then(|| term.to_string());
        if search == self.list.filters().search {
            return Ok(false);
        }
        debug!(
            search = term,
            page = self.list.state().page,
            "Applying supplier search"
        );
        let filters = SupplierListFilters {
            search,
            ..self.list.filters().clone()
        };
        self.list.set_filters(filters).await
    }

    /// Wait for the next settled term and apply it
    pub async fn settle_search(&mut self) -> Result<bool, ApiError> {
        match self.next_search().await {
            Some(term) => self.apply_search(&term).await,
            None => Ok(false),
        }
    }

    pub async fn set_active_filter(&mut self, is_active: Option<bool>) -> Result<bool, ApiError> {
        self.list.update_filters(|f| f.is_active = is_active).await
    }

    /// Submit the add or edit dialog
    pub async fn save(&mut self, draft: &SupplierDraft) -> Result<SupplierChange, WorkflowError> {
        let input = draft.validate()?;
        let api = Arc::clone(self.list.api());

        let result = match &self.modal {
            ModalState::Adding => api.create_supplier(&input).await.map(SupplierChange::Created),
            ModalState::Editing(supplier) => api
                .update_supplier(&supplier.id, &input)
                .await
                .map(SupplierChange::Updated),
            other => {
                return Err(WorkflowError::validation(format!(
                    "no supplier form is open (dialog is {})",
                    other.mode()
                )))
            }
        };
        self.finish(result).await
    }

    /// Confirm the delete dialog
    pub async fn confirm_delete(
        &mut self,
        confirmer: &dyn Confirmer,
    ) -> Result<SupplierChange, WorkflowError> {
        let supplier = match &self.modal {
            ModalState::Deleting(supplier) => supplier.clone(),
            other => {
                return Err(WorkflowError::validation(format!(
                    "no supplier is selected for deletion (dialog is {})",
                    other.mode()
                )))
            }
        };
        if !confirmer.confirm(&format!("Delete supplier {}?", supplier.name)) {
            return Ok(SupplierChange::Declined);
        }

        let api = Arc::clone(self.list.api());
        let result = api
            .delete_supplier(&supplier.id)
            .await
            .map(|_| SupplierChange::Deleted(supplier.id.clone()));
        self.finish(result).await
    }

    /// Re-fetch after a change. A failure stays in `list().error()` and does
    /// not undo what the backend already accepted.
    async fn resync(&mut self) {
        if let Err(err) = self.list.refresh().await {
            warn!(error = %err, "Supplier list re-fetch failed; keeping previous rows");
        }
    }

    async fn finish(
        &mut self,
        result: Result<SupplierChange, ApiError>,
    ) -> Result<SupplierChange, WorkflowError> {
        match result {
            Ok(change) => {
                info!(?change, "Supplier saved");
                self.modal.close();
                self.resync().await;
                Ok(change)
            }
            Err(err) if err.is_not_found() => {
                self.modal.close();
                self.resync().await;
                Err(err.into())
            }
            Err(err) => {
                let message = err.user_message();
                warn!(error = %message, "Supplier change rejected, re-fetching");
                self.resync().await;
                Ok(SupplierChange::Rejected(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mocks::{ApiCall, InMemoryBackend};
    use crate::workflows::confirm::{AutoConfirm, DeclineAll};

    fn supplier_searches(backend: &InMemoryBackend) -> Vec<Option<String>> {
        backend
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::ListSuppliers(filter) => Some(filter.search),
                _ => None,
            })
            .collect()
    }

    fn view(backend: &Arc<InMemoryBackend>, page_size: u32) -> SupplierListView {
        SupplierListView::new(backend.clone(), page_size, Duration::from_millis(500))
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_quickly_issues_one_query() {
        let backend = Arc::new(InMemoryBackend::with_sample_data());
        let mut suppliers = view(&backend, 10);
        suppliers.refresh().await.unwrap();
        backend.clear_calls();

        suppliers.type_search("a");
        tokio::time::sleep(Duration::from_millis(100)).await;
        suppliers.type_search("ab");
        assert!(suppliers.settle_search().await.unwrap());

        assert_eq!(supplier_searches(&backend), vec![Some("ab".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_without_pending_search_returns_at_once() {
        let backend = Arc::new(InMemoryBackend::with_sample_data());
        let mut suppliers = view(&backend, 10);
        let idle = tokio::time::timeout(Duration::from_secs(3600), suppliers.settle_search()).await;
        assert!(matches!(idle, Ok(Ok(false))));

        suppliers.type_search("acme");
        assert!(suppliers.search_pending());
        assert!(suppliers.settle_search().await.unwrap());
        assert!(!suppliers.search_pending());

        let again = tokio::time::timeout(Duration::from_secs(3600), suppliers.settle_search()).await;
        assert!(matches!(again, Ok(Ok(false))));
        assert_eq!(supplier_searches(&backend), vec![Some("acme".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_from_later_page_fetches_once_on_page_one() {
        let backend = Arc::new(InMemoryBackend::new());
        for i in 0..12 {
            backend.insert_supplier(&format!("Supplier {i:02}"), true);
        }
        let mut suppliers = view(&backend, 5);
        suppliers.list_mut().set_page(3).await.unwrap();
        backend.clear_calls();

        suppliers.type_search("supplier 1");
        suppliers.settle_search().await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            ApiCall::ListSuppliers(filter) => {
                assert_eq!(filter.page, 1);
                assert_eq!(filter.search.as_deref(), Some("supplier 1"));
            }
            other => panic!("unexpected call {other:?}"),
        }
        assert_eq!(suppliers.list().state().total, 2);
    }

    #[tokio::test]
    async fn test_unchanged_search_is_not_refetched() {
        let backend = Arc::new(InMemoryBackend::with_sample_data());
        let mut suppliers = view(&backend, 10);
        assert!(suppliers.apply_search("acme").await.unwrap());
        assert!(!suppliers.apply_search(" acme ").await.unwrap());
        assert!(suppliers.apply_search("").await.unwrap());
        assert_eq!(supplier_searches(&backend), vec![Some("acme".into()), None]);
    }

    #[tokio::test]
    async fn test_add_supplier_closes_modal_and_refetches() {
        let backend = Arc::new(InMemoryBackend::new());
        let mut suppliers = view(&backend, 10);
        suppliers.modal_mut().add();

        let draft = SupplierDraft {
            name: "Globex".into(),
            ..Default::default()
        };
        let change = suppliers.save(&draft).await.unwrap();
        assert!(matches!(change, SupplierChange::Created(ref s) if s.name == "Globex"));
        assert!(!suppliers.modal().is_open());
        assert_eq!(suppliers.list().rows().len(), 1);
    }

    #[tokio::test]
    async fn test_save_without_open_form_is_rejected_before_request() {
        let backend = Arc::new(InMemoryBackend::new());
        let mut suppliers = view(&backend, 10);
        let draft = SupplierDraft {
            name: "Globex".into(),
            ..Default::default()
        };
        assert!(suppliers.save(&draft).await.is_err());
        assert_eq!(backend.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let backend = Arc::new(InMemoryBackend::new());
        let id = backend.insert_supplier("Initech", true);
        let mut suppliers = view(&backend, 10);
        suppliers.refresh().await.unwrap();
        let supplier = suppliers.list().rows()[0].clone();
        suppliers.modal_mut().delete(supplier);

        assert_eq!(
            suppliers.confirm_delete(&DeclineAll).await.unwrap(),
            SupplierChange::Declined
        );
        assert_eq!(backend.mutation_count(), 0);
        assert!(suppliers.modal().is_open());

        assert_eq!(
            suppliers.confirm_delete(&AutoConfirm).await.unwrap(),
            SupplierChange::Deleted(id)
        );
        assert!(suppliers.list().rows().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_delete_keeps_dialog_and_resyncs() {
        let backend = Arc::new(InMemoryBackend::with_sample_data());
        let mut suppliers = view(&backend, 10);
        suppliers.refresh().await.unwrap();
        let acme = suppliers.list().rows()[0].clone();
        suppliers.modal_mut().delete(acme);

        let change = suppliers.confirm_delete(&AutoConfirm).await.unwrap();
        assert_eq!(
            change,
            SupplierChange::Rejected("Supplier is referenced by purchase orders".into())
        );
        assert!(suppliers.modal().is_open());
        assert_eq!(suppliers.list().rows().len(), 3);
    }
}
