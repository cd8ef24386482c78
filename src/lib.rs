// inventory-admin library - purchase order workflows and list views over an inventory REST API
// Exposes the core components for testing and integration

pub mod api;
pub mod cli;
pub mod config;
pub mod observability;
pub mod shutdown;
pub mod telemetry;
pub mod views;
pub mod workflows;

// Re-export key types for easy access
pub use api::{ApiCall, ApiError, HttpInventoryClient, InMemoryBackend, InventoryApi};
pub use config::InventoryAdminConfig;
pub use observability::{api_metrics, ApiMetrics, OperationTimer};
pub use shutdown::ShutdownCoordinator;
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use views::{ListView, ModalState, PurchaseOrderDraft, SearchDebouncer, SupplierDraft, SupplierListView};
pub use workflows::{
    available_actions, AutoConfirm, Confirmer, OrderAction, PurchaseOrderController,
    StateTransition, TransitionResult, WorkflowError,
};
