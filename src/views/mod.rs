// State behind the list, detail and form screens

pub mod forms;
pub mod list;
pub mod modal;
pub mod search;
pub mod suppliers;

pub use forms::{DraftItem, PurchaseOrderDraft, SupplierDraft};
pub use list::{
    ListSource, ListState, ListView, OrderListFilters, ProductListFilters, ProductListView,
    ProductSource, PurchaseOrderListView, PurchaseOrderSource, SupplierListFilters, SupplierSource,
};
pub use modal::ModalState;
pub use search::SearchDebouncer;
pub use suppliers::{SupplierChange, SupplierListView};
