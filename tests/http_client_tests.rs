//! HTTP client tests against a wiremock backend
//!
//! Verifies request shapes (paths, query parameters, auth header, bodies)
//! and how backend failures map onto `ApiError`.

use inventory_admin::api::types::{
    PurchaseOrderFilter, PurchaseOrderStatus, ReceiveItemRequest, SupplierFilter,
};
use inventory_admin::api::{ApiError, HttpInventoryClient, InventoryApi};
use inventory_admin::cli::commands::{orders, CommandContext};
use inventory_admin::cli::OrderCommands;
use inventory_admin::config::{ApiConfig, InventoryAdminConfig, RateLimitConfig};
use inventory_admin::views::{
    PurchaseOrderListView, PurchaseOrderSource, SupplierChange, SupplierDraft, SupplierListView,
};
use inventory_admin::workflows::{
    AutoConfirm, PurchaseOrderController, TransitionResult, WorkflowError,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Inventory backend mock server
struct InventoryApiMock {
    server: MockServer,
}

impl InventoryApiMock {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    fn client(&self) -> HttpInventoryClient {
        let config = ApiConfig {
            base_url: format!("{}/api", self.server.uri()),
            token: Some("test-token".to_string()),
            timeout_seconds: 5,
            rate_limit: RateLimitConfig {
                requests_per_second: 1000,
                burst_capacity: 1000,
            },
        };
        HttpInventoryClient::new(&config).expect("client should build")
    }

    async fn mock_order(&self, id: &str, status: &str, received: u32) {
        Mock::given(method("GET"))
            .and(path(format!("/api/purchase-orders/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(order_json(id, status, received)))
            .mount(&self.server)
            .await;
    }
}

fn order_json(id: &str, status: &str, received: u32) -> Value {
    json!({
        "id": id,
        "order_number": "PO-00042",
        "supplier_id": "sup-1",
        "supplier": { "id": "sup-1", "name": "Acme Components" },
        "items": [{
            "id": "poi-1",
            "product_id": "prod-1",
            "product": { "id": "prod-1", "name": "Hex bolt M8", "sku": "HB-M8" },
            "quantity_ordered": 10,
            "quantity_received": received,
            "unit_cost": 30,
            "line_total": 300
        }],
        "total_amount": 300,
        "status": status,
        "created_at": "2026-01-05T10:00:00Z",
        "updated_at": "2026-01-05T10:00:00Z"
    })
}

#[tokio::test]
async fn test_list_sends_pagination_and_filters() {
    let mock = InventoryApiMock::new().await;
    Mock::given(method("GET"))
        .and(path("/api/purchase-orders"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "5"))
        .and(query_param("status", "approved"))
        .and(query_param("supplierId", "sup-1"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [order_json("po-1", "approved", 0)],
            "total": 6,
            "totalPages": 2
        })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let page = mock
        .client()
        .list_purchase_orders(&PurchaseOrderFilter {
            page: 2,
            limit: 5,
            status: Some(PurchaseOrderStatus::Approved),
            supplier_id: Some("sup-1".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(page.total, 6);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.data[0].status, PurchaseOrderStatus::Approved);
    assert_eq!(page.data[0].supplier_name(), "Acme Components");
}

#[tokio::test]
async fn test_supplier_search_uses_backend_param_names() {
    let mock = InventoryApiMock::new().await;
    Mock::given(method("GET"))
        .and(path("/api/suppliers"))
        .and(query_param("isActive", "true"))
        .and(query_param("search", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [], "total": 0, "totalPages": 0
        })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let page = mock
        .client()
        .list_suppliers(&SupplierFilter {
            page: 1,
            limit: 10,
            is_active: Some(true),
            search: Some("acme".to_string()),
        })
        .await
        .unwrap();
    assert!(page.data.is_empty());
}

#[tokio::test]
async fn test_missing_order_maps_to_not_found() {
    let mock = InventoryApiMock::new().await;
    Mock::given(method("GET"))
        .and(path("/api/purchase-orders/po-missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Purchase order not found"
        })))
        .mount(&mock.server)
        .await;

    let err = mock
        .client()
        .get_purchase_order("po-missing")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.troubleshooting().contains("Go back to the list"));
}

#[tokio::test]
async fn test_rejection_message_is_passed_through_verbatim() {
    let mock = InventoryApiMock::new().await;
    Mock::given(method("POST"))
        .and(path("/api/purchase-orders/po-1/approve"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Only pending purchase orders can be approved"
        })))
        .mount(&mock.server)
        .await;

    let err = mock.client().approve_purchase_order("po-1").await.unwrap_err();
    match err {
        ApiError::Rejected { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "Only pending purchase orders can be approved");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_is_distinct_from_rejection() {
    let mock = InventoryApiMock::new().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&mock.server)
        .await;

    let err = mock
        .client()
        .list_products(&Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "token expired"));
}

#[tokio::test]
async fn test_receive_item_posts_quantity_body() {
    let mock = InventoryApiMock::new().await;
    Mock::given(method("POST"))
        .and(path("/api/purchase-orders/po-1/items/poi-1/receive"))
        .and(body_json(json!({ "quantity_received": 4 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&mock.server)
        .await;

    mock.client()
        .receive_item("po-1", "poi-1", ReceiveItemRequest { quantity_received: 4 })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_controller_refetches_after_successful_receive() {
    let mock = InventoryApiMock::new().await;
    // first load sees 0 received, every later load sees 4
    Mock::given(method("GET"))
        .and(path("/api/purchase-orders/po-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_json("po-1", "approved", 0)))
        .up_to_n_times(1)
        .mount(&mock.server)
        .await;
    mock.mock_order("po-1", "approved", 4).await;
    Mock::given(method("POST"))
        .and(path("/api/purchase-orders/po-1/items/poi-1/receive"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock.server)
        .await;

    let api: Arc<dyn InventoryApi> = Arc::new(mock.client());
    let mut controller = PurchaseOrderController::new(api, "po-1");
    controller.load().await.unwrap();

    let result = controller
        .receive_item("poi-1", 4, &AutoConfirm)
        .await
        .unwrap();
    assert!(result.is_success());
    let item = controller.snapshot().unwrap().item("poi-1").unwrap();
    assert_eq!(item.quantity_received, 4);
    assert_eq!(item.remaining(), 6);
}

#[tokio::test]
async fn test_controller_surfaces_server_rejection_and_resyncs() {
    let mock = InventoryApiMock::new().await;
    mock.mock_order("po-1", "pending", 0).await;
    Mock::given(method("POST"))
        .and(path("/api/purchase-orders/po-1/approve"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "Supplier is on credit hold"
        })))
        .mount(&mock.server)
        .await;

    let api: Arc<dyn InventoryApi> = Arc::new(mock.client());
    let mut controller = PurchaseOrderController::new(api, "po-1");
    let result = controller.approve(&AutoConfirm).await.unwrap();

    assert_eq!(
        result,
        TransitionResult::Rejected {
            message: "Supplier is on credit hold".to_string(),
            previous_status: PurchaseOrderStatus::Pending,
            current_status: PurchaseOrderStatus::Pending,
        }
    );
    assert_eq!(controller.last_error(), Some("Supplier is on credit hold"));

    let gets = mock
        .server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    assert_eq!(gets, 2, "initial load plus one re-fetch");
}

async fn get_count(mock: &InventoryApiMock) -> usize {
    mock.server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .count()
}

#[tokio::test]
async fn test_json_output_still_fails_on_rejection() {
    let mock = InventoryApiMock::new().await;
    mock.mock_order("po-1", "pending", 0).await;
    Mock::given(method("POST"))
        .and(path("/api/purchase-orders/po-1/approve"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Supplier is on credit hold"
        })))
        .mount(&mock.server)
        .await;

    let api: Arc<dyn InventoryApi> = Arc::new(mock.client());
    let ctx = CommandContext::new(api, InventoryAdminConfig::default(), true, true);
    let err = orders::run(&ctx, OrderCommands::Approve { id: "po-1".into() })
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Supplier is on credit hold"));
    assert_eq!(get_count(&mock).await, 2, "initial load plus one re-fetch");
}

#[tokio::test]
async fn test_missing_line_item_is_named_and_order_resynced() {
    let mock = InventoryApiMock::new().await;
    mock.mock_order("po-1", "approved", 0).await;
    Mock::given(method("POST"))
        .and(path("/api/purchase-orders/po-1/items/poi-1/receive"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock.server)
        .await;

    let api: Arc<dyn InventoryApi> = Arc::new(mock.client());
    let mut controller = PurchaseOrderController::new(api, "po-1");
    controller.load().await.unwrap();
    let err = controller
        .receive_item("poi-1", 2, &AutoConfirm)
        .await
        .unwrap_err();

    match err {
        WorkflowError::Api(ApiError::NotFound { resource, id }) => {
            assert_eq!(resource, "purchase order item");
            assert_eq!(id, "poi-1");
        }
        other => panic!("expected item not found, got {other:?}"),
    }
    assert_eq!(get_count(&mock).await, 2);
}

#[tokio::test]
async fn test_list_is_loading_until_response_arrives() {
    let mock = InventoryApiMock::new().await;
    Mock::given(method("GET"))
        .and(path("/api/purchase-orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [], "total": 0, "totalPages": 0 }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock.server)
        .await;

    let api: Arc<dyn InventoryApi> = Arc::new(mock.client());
    let mut view = PurchaseOrderListView::new(api, PurchaseOrderSource, 10);
    let mut loading = view.loading_updates();
    assert!(!*loading.borrow());

    let observed = async {
        loading.changed().await.unwrap();
        let during = *loading.borrow_and_update();
        loading.changed().await.unwrap();
        (during, *loading.borrow_and_update())
    };
    let (refreshed, (during, after)) = tokio::join!(view.refresh(), observed);

    refreshed.unwrap();
    assert!(during, "flag should be up while the request is in flight");
    assert!(!after);
    assert!(!view.is_loading());
}

#[tokio::test]
async fn test_order_load_is_loading_until_response_arrives() {
    let mock = InventoryApiMock::new().await;
    Mock::given(method("GET"))
        .and(path("/api/purchase-orders/po-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(order_json("po-1", "draft", 0))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock.server)
        .await;

    let api: Arc<dyn InventoryApi> = Arc::new(mock.client());
    let mut controller = PurchaseOrderController::new(api, "po-1");
    let mut loading = controller.loading_updates();

    let observed = async {
        loading.changed().await.unwrap();
        *loading.borrow_and_update()
    };
    let (loaded, during) = tokio::join!(controller.load(), observed);

    assert!(loaded.is_ok());
    assert!(during);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn test_supplier_saved_even_when_list_refetch_fails() {
    let mock = InventoryApiMock::new().await;
    Mock::given(method("POST"))
        .and(path("/api/suppliers"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "sup-9",
            "name": "Globex",
            "is_active": true,
            "created_at": "2026-01-05T10:00:00Z",
            "updated_at": "2026-01-05T10:00:00Z"
        })))
        .expect(1)
        .mount(&mock.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/suppliers"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&mock.server)
        .await;

    let api: Arc<dyn InventoryApi> = Arc::new(mock.client());
    let mut suppliers = SupplierListView::new(api, 10, Duration::from_millis(500));
    suppliers.modal_mut().add();
    let draft = SupplierDraft {
        name: "Globex".into(),
        ..Default::default()
    };

    let change = suppliers.save(&draft).await.unwrap();
    assert!(matches!(change, SupplierChange::Created(ref s) if s.id == "sup-9"));
    assert!(!suppliers.modal().is_open());
    assert_eq!(suppliers.list().error(), Some("database unavailable"));
}
