// In-process backend - keeps the same authority rules as the real server

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::client::InventoryApi;
use crate::api::errors::ApiError;
use crate::api::types::*;

/// Every call the backend has served, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ListPurchaseOrders(PurchaseOrderFilter),
    GetPurchaseOrder(String),
    CreatePurchaseOrder(CreatePurchaseOrderRequest),
    UpdatePurchaseOrder { id: String, request: UpdatePurchaseOrderRequest },
    SubmitPurchaseOrder(String),
    ApprovePurchaseOrder(String),
    CancelPurchaseOrder(String),
    ReceiveItem { order_id: String, item_id: String, quantity: u32 },
    ReceiveAllItems(String),
    ListSuppliers(SupplierFilter),
    GetSupplier(String),
    CreateSupplier(SupplierInput),
    UpdateSupplier { id: String, input: SupplierInput },
    DeleteSupplier(String),
    ListProducts(ProductFilter),
}

impl ApiCall {
    /// True for calls that ask the backend to change something
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            ApiCall::ListPurchaseOrders(_)
                | ApiCall::GetPurchaseOrder(_)
                | ApiCall::ListSuppliers(_)
                | ApiCall::GetSupplier(_)
                | ApiCall::ListProducts(_)
        )
    }
}

#[derive(Debug, Default)]
struct BackendState {
    orders: BTreeMap<String, PurchaseOrder>,
    suppliers: BTreeMap<String, Supplier>,
    products: BTreeMap<String, Product>,
    calls: Vec<ApiCall>,
    next_id: u64,
    pending_rejection: Option<String>,
}

impl BackendState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn take_rejection(&mut self) -> Result<(), ApiError> {
        match self.pending_rejection.take() {
            Some(message) => Err(ApiError::rejected(409, message)),
            None => Ok(()),
        }
    }

    fn order_mut(&mut self, id: &str) -> Result<&mut PurchaseOrder, ApiError> {
        self.orders
            .get_mut(id)
            .ok_or_else(|| ApiError::not_found("purchase order", id))
    }
}

/// Inventory backend held entirely in memory.
///
/// Used by tests and by the `demo` command. Status transitions and receipt
/// limits are enforced here exactly as the server would, so the client code
/// can be exercised against rejections too.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<BackendState>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Backend pre-loaded with a handful of suppliers, products and orders
    pub fn with_sample_data() -> Self {
        let backend = Self::new();
        let acme = backend.insert_supplier("Acme Components", true);
        let north = backend.insert_supplier("Northwind Traders", true);
        backend.insert_supplier("Dormant Supply Co", false);

        let bolts = backend.insert_product("Hex bolt M8", "HB-M8", Some("hardware"), 45);
        let nuts = backend.insert_product("Lock nut M8", "LN-M8", Some("hardware"), 20);
        let glue = backend.insert_product("Epoxy 50ml", "EP-50", Some("adhesives"), 899);

        backend.insert_order(&acme, PurchaseOrderStatus::Draft, &[(&bolts, 100, 30)]);
        backend.insert_order(&north, PurchaseOrderStatus::Pending, &[(&glue, 12, 650)]);
        backend.insert_order(
            &acme,
            PurchaseOrderStatus::Approved,
            &[(&bolts, 10, 30), (&nuts, 25, 12)],
        );
        backend
    }

    pub fn insert_supplier(&self, name: &str, is_active: bool) -> String {
        let mut state = self.state();
        let id = state.next_id("sup");
        let now = Utc::now();
        state.suppliers.insert(
            id.clone(),
            Supplier {
                id: id.clone(),
                name: name.to_string(),
                contact_name: None,
                email: None,
                phone: None,
                address: None,
                notes: None,
                is_active,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn insert_product(&self, name: &str, sku: &str, category: Option<&str>, price: i64) -> String {
        let mut state = self.state();
        let id = state.next_id("prod");
        state.products.insert(
            id.clone(),
            Product {
                id: id.clone(),
                name: name.to_string(),
                sku: sku.to_string(),
                category: category.map(str::to_string),
                description: None,
                price,
                cost: None,
                stock_quantity: 0,
                is_active: true,
            },
        );
        id
    }

    /// Seed an order directly in `status`; items are `(product_id, quantity, unit_cost)`
    pub fn insert_order(
        &self,
        supplier_id: &str,
        status: PurchaseOrderStatus,
        items: &[(&str, u32, i64)],
    ) -> String {
        let mut state = self.state();
        let request = CreatePurchaseOrderRequest {
            supplier_id: supplier_id.to_string(),
            notes: None,
            expected_delivery_date: None,
            items: items
                .iter()
                .map(|(product_id, quantity, cost)| NewPurchaseOrderItem {
                    product_id: product_id.to_string(),
                    variant_id: None,
                    quantity_ordered: *quantity,
                    unit_cost: *cost,
                    notes: None,
                })
                .collect(),
        };
        let mut order = build_order(&mut state, &request);
        order.status = status;
        let id = order.id.clone();
        state.orders.insert(id.clone(), order);
        id
    }

    /// Simulate another user receiving stock in between our fetch and our request
    pub fn set_quantity_received(&self, order_id: &str, item_id: &str, quantity: u32) {
        let mut state = self.state();
        if let Some(item) = state
            .orders
            .get_mut(order_id)
            .and_then(|order| order.items.iter_mut().find(|item| item.id == item_id))
        {
            item.quantity_received = quantity.min(item.quantity_ordered);
        }
    }

    /// Simulate another user changing the status behind our back
    pub fn force_status(&self, order_id: &str, status: PurchaseOrderStatus) {
        if let Some(order) = self.state().orders.get_mut(order_id) {
            order.status = status;
        }
    }

    /// Make the next mutating call fail with `message`
    pub fn reject_next(&self, message: &str) {
        self.state().pending_rejection = Some(message.to_string());
    }

    pub fn order(&self, id: &str) -> Option<PurchaseOrder> {
        self.state().orders.get(id).cloned()
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.state().calls.iter().filter(|c| c.is_mutation()).count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn record(&self, call: ApiCall) -> MutexGuard<'_, BackendState> {
        let mut state = self.state();
        state.calls.push(call);
        state
    }
}

fn build_order(state: &mut BackendState, request: &CreatePurchaseOrderRequest) -> PurchaseOrder {
    let id = state.next_id("po");
    let now = Utc::now();
    let supplier = state.suppliers.get(&request.supplier_id).map(|s| SupplierSummary {
        id: s.id.clone(),
        name: s.name.clone(),
    });

    let mut items = Vec::with_capacity(request.items.len());
    for new_item in &request.items {
        let item_id = state.next_id("poi");
        let product = state.products.get(&new_item.product_id).map(|p| ProductSummary {
            id: p.id.clone(),
            name: p.name.clone(),
            sku: Some(p.sku.clone()),
        });
        items.push(PurchaseOrderItem {
            id: item_id,
            product_id: new_item.product_id.clone(),
            variant_id: new_item.variant_id.clone(),
            product,
            variant: None,
            quantity_ordered: new_item.quantity_ordered,
            quantity_received: 0,
            unit_cost: new_item.unit_cost,
            line_total: new_item
                .unit_cost
                .saturating_mul(i64::from(new_item.quantity_ordered)),
            notes: new_item.notes.clone(),
        });
    }

    let total_amount = items
        .iter()
        .map(|i| i.line_total)
        .fold(0, i64::saturating_add);
    PurchaseOrder {
        order_number: Some(format!("PO-{:05}", state.next_id)),
        id,
        supplier_id: request.supplier_id.clone(),
        supplier,
        items,
        total_amount,
        status: PurchaseOrderStatus::Draft,
        notes: request.notes.clone(),
        expected_delivery_date: request.expected_delivery_date,
        received_date: None,
        created_at: now,
        updated_at: now,
    }
}

fn paginate<T: Clone>(rows: Vec<T>, page: u32, limit: u32) -> Page<T> {
    let total = rows.len() as u64;
    let limit = limit.max(1);
    let offset = (page.max(1) as usize - 1) * limit as usize;
    Page {
        data: rows.into_iter().skip(offset).take(limit as usize).collect(),
        total,
        total_pages: total_pages(total, limit),
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(needle))
        .unwrap_or(false)
}

fn conflict(message: &str) -> ApiError {
    ApiError::rejected(409, message)
}

fn unprocessable(message: String) -> ApiError {
    ApiError::rejected(422, message)
}

#[async_trait]
impl InventoryApi for InMemoryBackend {
    async fn list_purchase_orders(
        &self,
        filter: &PurchaseOrderFilter,
    ) -> Result<Page<PurchaseOrder>, ApiError> {
        let state = self.record(ApiCall::ListPurchaseOrders(filter.clone()));
        let rows: Vec<PurchaseOrder> = state
            .orders
            .values()
            .filter(|o| filter.status.map_or(true, |s| o.status == s))
            .filter(|o| {
                filter
                    .supplier_id
                    .as_deref()
                    .map_or(true, |id| o.supplier_id == id)
            })
            .cloned()
            .collect();
        Ok(paginate(rows, filter.page, filter.limit))
    }

    async fn get_purchase_order(&self, id: &str) -> Result<PurchaseOrder, ApiError> {
        let state = self.record(ApiCall::GetPurchaseOrder(id.to_string()));
        state
            .orders
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("purchase order", id))
    }

    async fn create_purchase_order(
        &self,
        request: &CreatePurchaseOrderRequest,
    ) -> Result<PurchaseOrder, ApiError> {
        let mut state = self.record(ApiCall::CreatePurchaseOrder(request.clone()));
        state.take_rejection()?;
        if request.items.is_empty() {
            return Err(unprocessable("Purchase order must contain at least one item".into()));
        }
        if !state.suppliers.contains_key(&request.supplier_id) {
            return Err(unprocessable(format!(
                "Supplier {} does not exist",
                request.supplier_id
            )));
        }
        let order = build_order(&mut state, request);
        state.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn update_purchase_order(
        &self,
        id: &str,
        request: &UpdatePurchaseOrderRequest,
    ) -> Result<(), ApiError> {
        let mut state = self.record(ApiCall::UpdatePurchaseOrder {
            id: id.to_string(),
            request: request.clone(),
        });
        state.take_rejection()?;
        let supplier = match &request.supplier_id {
            Some(supplier_id) => Some(
                state
                    .suppliers
                    .get(supplier_id)
                    .map(|s| SupplierSummary {
                        id: s.id.clone(),
                        name: s.name.clone(),
                    })
                    .ok_or_else(|| unprocessable(format!("Supplier {supplier_id} does not exist")))?,
            ),
            None => None,
        };

        let order = state.order_mut(id)?;
        if !matches!(
            order.status,
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Pending
        ) {
            return Err(conflict("Only draft or pending purchase orders can be edited"));
        }
        if let Some(summary) = supplier {
            order.supplier_id = summary.id.clone();
            order.supplier = Some(summary);
        }
        if let Some(notes) = &request.notes {
            order.notes = Some(notes.clone());
        }
        if let Some(date) = request.expected_delivery_date {
            order.expected_delivery_date = Some(date);
        }
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn submit_purchase_order(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.record(ApiCall::SubmitPurchaseOrder(id.to_string()));
        state.take_rejection()?;
        let order = state.order_mut(id)?;
        if order.status != PurchaseOrderStatus::Draft {
            return Err(conflict("Only draft purchase orders can be submitted"));
        }
        order.status = PurchaseOrderStatus::Pending;
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn approve_purchase_order(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.record(ApiCall::ApprovePurchaseOrder(id.to_string()));
        state.take_rejection()?;
        let order = state.order_mut(id)?;
        if order.status != PurchaseOrderStatus::Pending {
            return Err(conflict("Only pending purchase orders can be approved"));
        }
        order.status = PurchaseOrderStatus::Approved;
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn cancel_purchase_order(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.record(ApiCall::CancelPurchaseOrder(id.to_string()));
        state.take_rejection()?;
        let order = state.order_mut(id)?;
        if !matches!(
            order.status,
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Pending | PurchaseOrderStatus::Approved
        ) {
            return Err(conflict(&format!(
                "Cannot cancel a purchase order that is {}",
                order.status
            )));
        }
        order.status = PurchaseOrderStatus::Cancelled;
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn receive_item(
        &self,
        order_id: &str,
        item_id: &str,
        request: ReceiveItemRequest,
    ) -> Result<(), ApiError> {
        let mut state = self.record(ApiCall::ReceiveItem {
            order_id: order_id.to_string(),
            item_id: item_id.to_string(),
            quantity: request.quantity_received,
        });
        state.take_rejection()?;
        let order = state.order_mut(order_id)?;
        if order.status != PurchaseOrderStatus::Approved {
            return Err(conflict("Only approved purchase orders can be received"));
        }
        let item = order
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| ApiError::not_found("purchase order item", item_id))?;

        let remaining = item.remaining();
        if request.quantity_received == 0 || request.quantity_received > remaining {
            return Err(unprocessable(format!(
                "Cannot receive {} units; only {} remaining",
                request.quantity_received, remaining
            )));
        }
        item.quantity_received += request.quantity_received;

        let now = Utc::now();
        if order.items.iter().all(PurchaseOrderItem::is_fully_received) {
            order.status = PurchaseOrderStatus::Received;
            order.received_date = Some(now);
        }
        order.updated_at = now;
        Ok(())
    }

    async fn receive_all_items(&self, order_id: &str) -> Result<(), ApiError> {
        let mut state = self.record(ApiCall::ReceiveAllItems(order_id.to_string()));
        state.take_rejection()?;
        let order = state.order_mut(order_id)?;
        if order.status != PurchaseOrderStatus::Approved {
            return Err(conflict("Only approved purchase orders can be received"));
        }
        for item in order.items.iter_mut() {
            item.quantity_received = item.quantity_ordered;
        }
        let now = Utc::now();
        order.status = PurchaseOrderStatus::Received;
        order.received_date = Some(now);
        order.updated_at = now;
        Ok(())
    }

    async fn list_suppliers(&self, filter: &SupplierFilter) -> Result<Page<Supplier>, ApiError> {
        let state = self.record(ApiCall::ListSuppliers(filter.clone()));
        let needle = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let rows: Vec<Supplier> = state
            .suppliers
            .values()
            .filter(|s| filter.is_active.map_or(true, |active| s.is_active == active))
            .filter(|s| match &needle {
                Some(needle) => {
                    contains_ci(Some(&s.name), needle)
                        || contains_ci(s.contact_name.as_deref(), needle)
                        || contains_ci(s.email.as_deref(), needle)
                }
                None => true,
            })
            .cloned()
            .collect();
        Ok(paginate(rows, filter.page, filter.limit))
    }

    async fn get_supplier(&self, id: &str) -> Result<Supplier, ApiError> {
        let state = self.record(ApiCall::GetSupplier(id.to_string()));
        state
            .suppliers
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("supplier", id))
    }

    async fn create_supplier(&self, input: &SupplierInput) -> Result<Supplier, ApiError> {
        let mut state = self.record(ApiCall::CreateSupplier(input.clone()));
        state.take_rejection()?;
        if input.name.trim().is_empty() {
            return Err(unprocessable("Supplier name is required".into()));
        }
        let id = state.next_id("sup");
        let now = Utc::now();
        let supplier = supplier_from_input(id.clone(), input, now, now);
        state.suppliers.insert(id, supplier.clone());
        Ok(supplier)
    }

    async fn update_supplier(&self, id: &str, input: &SupplierInput) -> Result<Supplier, ApiError> {
        let mut state = self.record(ApiCall::UpdateSupplier {
            id: id.to_string(),
            input: input.clone(),
        });
        state.take_rejection()?;
        let existing = state
            .suppliers
            .get(id)
            .ok_or_else(|| ApiError::not_found("supplier", id))?;
        let supplier = supplier_from_input(id.to_string(), input, existing.created_at, Utc::now());
        state.suppliers.insert(id.to_string(), supplier.clone());
        Ok(supplier)
    }

    async fn delete_supplier(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.record(ApiCall::DeleteSupplier(id.to_string()));
        state.take_rejection()?;
        if !state.suppliers.contains_key(id) {
            return Err(ApiError::not_found("supplier", id));
        }
        if state.orders.values().any(|o| o.supplier_id == id) {
            return Err(conflict("Supplier is referenced by purchase orders"));
        }
        state.suppliers.remove(id);
        Ok(())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Page<Product>, ApiError> {
        let state = self.record(ApiCall::ListProducts(filter.clone()));
        let needle = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let rows: Vec<Product> = state
            .products
            .values()
            .filter(|p| {
                filter
                    .category
                    .as_deref()
                    .map_or(true, |c| p.category.as_deref() == Some(c))
            })
            .filter(|p| match &needle {
                Some(needle) => {
                    contains_ci(Some(&p.name), needle) || contains_ci(Some(&p.sku), needle)
                }
                None => true,
            })
            .cloned()
            .collect();
        Ok(paginate(rows, filter.page, filter.limit))
    }
}

fn supplier_from_input(
    id: String,
    input: &SupplierInput,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Supplier {
    Supplier {
        id,
        name: input.name.trim().to_string(),
        contact_name: input.contact_name.clone(),
        email: input.email.clone(),
        phone: input.phone.clone(),
        address: input.address.clone(),
        notes: input.notes.clone(),
        is_active: input.is_active,
        created_at,
        updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pagination_beyond_last_page_is_empty() {
        let backend = InMemoryBackend::new();
        for i in 0..5 {
            backend.insert_supplier(&format!("Supplier {i}"), true);
        }
        let filter = SupplierFilter {
            page: 3,
            limit: 2,
            ..Default::default()
        };
        let page = backend.list_suppliers(&filter).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.data.len(), 1);

        let beyond = SupplierFilter {
            page: 9,
            limit: 2,
            ..Default::default()
        };
        let page = backend.list_suppliers(&beyond).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total_pages, 3);
    }

    #[tokio::test]
    async fn test_backend_rejects_approve_unless_pending() {
        let backend = InMemoryBackend::new();
        let supplier = backend.insert_supplier("Acme", true);
        let product = backend.insert_product("Bolt", "B-1", None, 10);
        let order = backend.insert_order(&supplier, PurchaseOrderStatus::Draft, &[(&product, 1, 5)]);

        let err = backend.approve_purchase_order(&order).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected { status: 409, .. }));
        assert_eq!(backend.order(&order).unwrap().status, PurchaseOrderStatus::Draft);
    }

    #[tokio::test]
    async fn test_receiving_last_units_marks_order_received() {
        let backend = InMemoryBackend::new();
        let supplier = backend.insert_supplier("Acme", true);
        let product = backend.insert_product("Bolt", "B-1", None, 10);
        let order_id =
            backend.insert_order(&supplier, PurchaseOrderStatus::Approved, &[(&product, 3, 5)]);
        let item_id = backend.order(&order_id).unwrap().items[0].id.clone();

        backend
            .receive_item(&order_id, &item_id, ReceiveItemRequest { quantity_received: 3 })
            .await
            .unwrap();
        let order = backend.order(&order_id).unwrap();
        assert_eq!(order.status, PurchaseOrderStatus::Received);
        assert!(order.received_date.is_some());
    }

    #[tokio::test]
    async fn test_reject_next_is_one_shot() {
        let backend = InMemoryBackend::new();
        backend.reject_next("Backend maintenance");
        let input = SupplierInput {
            name: "Acme".into(),
            is_active: true,
            ..Default::default()
        };
        let err = backend.create_supplier(&input).await.unwrap_err();
        assert_eq!(err.user_message(), "Backend maintenance");
        assert!(backend.create_supplier(&input).await.is_ok());
        assert_eq!(backend.mutation_count(), 2);
    }

    #[tokio::test]
    async fn test_supplier_search_is_case_insensitive() {
        let backend = InMemoryBackend::with_sample_data();
        let filter = SupplierFilter {
            page: 1,
            limit: 10,
            is_active: None,
            search: Some("NORTH".into()),
        };
        let page = backend.list_suppliers(&filter).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].name, "Northwind Traders");
    }
}
