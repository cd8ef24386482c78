use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn, Instrument};

use crate::api::client::InventoryApi;
use crate::api::errors::ApiError;
use crate::api::types::*;
use crate::telemetry::create_list_span;

/// One backend collection that can be shown as a paginated table
#[async_trait]
pub trait ListSource: Send + Sync {
    type Row: Clone + Send + Sync;
    type Filters: Clone + Default + PartialEq + Send + Sync + std::fmt::Debug;

    fn resource(&self) -> &'static str;

    async fn fetch(
        &self,
        api: &dyn InventoryApi,
        page: u32,
        limit: u32,
        filters: &Self::Filters,
    ) -> Result<Page<Self::Row>, ApiError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderListFilters {
    pub status: Option<PurchaseOrderStatus>,
    pub supplier_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplierListFilters {
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductListFilters {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PurchaseOrderSource;

#[derive(Debug, Clone, Copy, Default)]
pub struct SupplierSource;

#[derive(Debug, Clone, Copy, Default)]
pub struct ProductSource;

#[async_trait]
impl ListSource for PurchaseOrderSource {
    type Row = PurchaseOrder;
    type Filters = OrderListFilters;

    fn resource(&self) -> &'static str {
        "purchase_orders"
    }

    async fn fetch(
        &self,
        api: &dyn InventoryApi,
        page: u32,
        limit: u32,
        filters: &OrderListFilters,
    ) -> Result<Page<PurchaseOrder>, ApiError> {
        let filter = PurchaseOrderFilter {
            page,
            limit,
            status: filters.status,
            supplier_id: filters.supplier_id.clone(),
        };
        api.list_purchase_orders(&filter).await
    }
}

#[async_trait]
impl ListSource for SupplierSource {
    type Row = Supplier;
    type Filters = SupplierListFilters;

    fn resource(&self) -> &'static str {
        "suppliers"
    }

    async fn fetch(
        &self,
        api: &dyn InventoryApi,
        page: u32,
        limit: u32,
        filters: &SupplierListFilters,
    ) -> Result<Page<Supplier>, ApiError> {
        let filter = SupplierFilter {
            page,
            limit,
            is_active: filters.is_active,
            search: filters.search.clone(),
        };
        api.list_suppliers(&filter).await
    }
}

#[async_trait]
impl ListSource for ProductSource {
    type Row = Product;
    type Filters = ProductListFilters;

    fn resource(&self) -> &'static str {
        "products"
    }

    async fn fetch(
        &self,
        api: &dyn InventoryApi,
        page: u32,
        limit: u32,
        filters: &ProductListFilters,
    ) -> Result<Page<Product>, ApiError> {
        let filter = ProductFilter {
            page,
            limit,
            category: filters.category.clone(),
            search: filters.search.clone(),
        };
        api.list_products(&filter).await
    }
}

/// Pagination counters shown under every table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListState {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl ListState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total: 0,
            total_pages: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Table state for one collection. Any change to page, page size or filters
/// triggers exactly one fetch; setting a value to what it already is does not.
pub struct ListView<S: ListSource> {
    api: Arc<dyn InventoryApi>,
    source: S,
    state: ListState,
    filters: S::Filters,
    rows: Vec<S::Row>,
    loading: watch::Sender<bool>,
    error: Option<String>,
}

pub type PurchaseOrderListView = ListView<PurchaseOrderSource>;
pub type ProductListView = ListView<ProductSource>;

impl<S: ListSource> ListView<S> {
    pub fn new(api: Arc<dyn InventoryApi>, source: S, page_size: u32) -> Self {
        Self {
            api,
            source,
            state: ListState::new(page_size),
            filters: S::Filters::default(),
            rows: Vec::new(),
            loading: watch::channel(false).0,
            error: None,
        }
    }

    pub fn with_filters(mut self, filters: S::Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.state.page = page.max(1);
        self
    }

    pub fn rows(&self) -> &[S::Row] {
        &self.rows
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn filters(&self) -> &S::Filters {
        &self.filters
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Subscribe before calling `refresh` to see the in-flight flag flip
    pub fn loading_updates(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn api(&self) -> &Arc<dyn InventoryApi> {
        &self.api
    }

    /// Fetch the current page. On failure the previous rows stay visible and
    /// the message is kept in `error`.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        let span = create_list_span(self.source.resource(), self.state.page, self.state.page_size);
        self.loading.send_replace(true);
        let result = self
            .source
            .fetch(
                self.api.as_ref(),
                self.state.page,
                self.state.page_size,
                &self.filters,
            )
            .instrument(span)
            .await;
        self.loading.send_replace(false);

        match result {
            Ok(page) => {
                debug!(
                    resource = self.source.resource(),
                    rows = page.data.len(),
                    total = page.total,
                    "List refreshed"
                );
                self.rows = page.data;
                self.state.total = page.total;
                self.state.total_pages = page.total_pages;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                warn!(resource = self.source.resource(), error = %err, "List refresh failed");
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Returns whether a fetch happened
    pub async fn set_page(&mut self, page: u32) -> Result<bool, ApiError> {
        let page = page.max(1);
        if page == self.state.page {
            return Ok(false);
        }
        self.state.page = page;
        self.refresh().await.map(|_| true)
    }

    pub async fn next_page(&mut self) -> Result<bool, ApiError> {
        if !self.state.has_next() {
            return Ok(false);
        }
        self.set_page(self.state.page + 1).await
    }

    pub async fn previous_page(&mut self) -> Result<bool, ApiError> {
        if !self.state.has_previous() {
            return Ok(false);
        }
        self.set_page(self.state.page - 1).await
    }

    /// Changing the page size goes back to page 1
    pub async fn set_page_size(&mut self, page_size: u32) -> Result<bool, ApiError> {
        let page_size = page_size.max(1);
        if page_size == self.state.page_size {
            return Ok(false);
        }
        self.state.page_size = page_size;
        self.state.page = 1;
        self.refresh().await.map(|_| true)
    }

    /// Replace the filters. The page resets to 1; whether or not it was
    /// already 1, only one fetch is issued.
    pub async fn set_filters(&mut self, filters: S::Filters) -> Result<bool, ApiError> {
        if filters == self.filters {
            return Ok(false);
        }
        debug!(resource = self.source.resource(), ?filters, "Filters changed");
        self.filters = filters;
        self.state.page = 1;
        self.refresh().await.map(|_| true)
    }

    pub async fn update_filters<F>(&mut self, change: F) -> Result<bool, ApiError>
    where
        F: FnOnce(&mut S::Filters),
    {
        let mut filters = self.filters.clone();
        change(&mut filters);
        self.set_filters(filters).await
    }
}
