pub mod client;
pub mod errors;
pub mod mocks;
pub mod types;

pub use client::{HttpInventoryClient, InventoryApi};
pub use errors::ApiError;
pub use mocks::{ApiCall, InMemoryBackend};
pub use types::{
    Page, Product, ProductFilter, PurchaseOrder, PurchaseOrderFilter, PurchaseOrderItem,
    PurchaseOrderStatus, Supplier, SupplierFilter, SupplierInput,
};
