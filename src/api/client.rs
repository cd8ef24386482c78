use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::errors::ApiError;
use crate::api::types::*;
use crate::config::ApiConfig;
use crate::observability::{api_metrics, OperationTimer};

/// Backend operations used by the workflow controller and list views.
///
/// The server is the only authority over order status and quantities; none
/// of these calls are expected to hand back state the caller applies
/// locally, so mutations return `()` and callers re-fetch.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    async fn list_purchase_orders(
        &self,
        filter: &PurchaseOrderFilter,
    ) -> Result<Page<PurchaseOrder>, ApiError>;
    async fn get_purchase_order(&self, id: &str) -> Result<PurchaseOrder, ApiError>;
    async fn create_purchase_order(
        &self,
        request: &CreatePurchaseOrderRequest,
    ) -> Result<PurchaseOrder, ApiError>;
    async fn update_purchase_order(
        &self,
        id: &str,
        request: &UpdatePurchaseOrderRequest,
    ) -> Result<(), ApiError>;
    async fn submit_purchase_order(&self, id: &str) -> Result<(), ApiError>;
    async fn approve_purchase_order(&self, id: &str) -> Result<(), ApiError>;
    async fn cancel_purchase_order(&self, id: &str) -> Result<(), ApiError>;
    async fn receive_item(
        &self,
        order_id: &str,
        item_id: &str,
        request: ReceiveItemRequest,
    ) -> Result<(), ApiError>;
    async fn receive_all_items(&self, order_id: &str) -> Result<(), ApiError>;

    async fn list_suppliers(&self, filter: &SupplierFilter) -> Result<Page<Supplier>, ApiError>;
    async fn get_supplier(&self, id: &str) -> Result<Supplier, ApiError>;
    async fn create_supplier(&self, input: &SupplierInput) -> Result<Supplier, ApiError>;
    async fn update_supplier(&self, id: &str, input: &SupplierInput) -> Result<Supplier, ApiError>;
    async fn delete_supplier(&self, id: &str) -> Result<(), ApiError>;

    async fn list_products(&self, filter: &ProductFilter) -> Result<Page<Product>, ApiError>;
}

/// Rate-limited REST client for the inventory backend
#[derive(Debug)]
pub struct HttpInventoryClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl HttpInventoryClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        if config.base_url.trim().is_empty() {
            return Err(ApiError::Config("api.base_url must not be empty".to_string()));
        }

        let per_second = NonZeroU32::new(config.rate_limit.requests_per_second.max(1))
            .unwrap_or(NonZeroU32::MIN);
        let burst =
            NonZeroU32::new(config.rate_limit.burst_capacity.max(1)).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(per_second).allow_burst(burst);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        resource: &str,
        id: &str,
    ) -> Result<Response, ApiError> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        let metrics = api_metrics();
        metrics.record_request();

        let timer = OperationTimer::new(resource);
        let response = builder.send().await.map_err(|e| {
            metrics.record_error();
            warn!(resource, error = %e, "Inventory API request failed");
            ApiError::from(e)
        })?;
        timer.finish();

        let status = response.status();
        debug!(resource, status = status.as_u16(), "Inventory API response");
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        match status {
            StatusCode::NOT_FOUND => {
                metrics.record_not_found();
                Err(ApiError::not_found(resource, id))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                metrics.record_error();
                Err(ApiError::Unauthorized(message))
            }
            _ => {
                metrics.record_rejection();
                Err(ApiError::rejected(status.as_u16(), message))
            }
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        resource: &str,
        id: &str,
    ) -> Result<T, ApiError> {
        let response = self.send(builder, resource, id).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn execute(&self, builder: RequestBuilder, resource: &str, id: &str) -> Result<(), ApiError> {
        // Body (if any) is deliberately dropped: callers re-fetch instead.
        self.send(builder, resource, id).await.map(|_| ())
    }
}

/// Pull the server's message out of an error body, falling back to the
/// raw text and then the status reason.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
        for key in ["message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

const ORDER: &str = "purchase order";
const ORDER_ITEM: &str = "purchase order item";
const SUPPLIER: &str = "supplier";

#[async_trait]
impl InventoryApi for HttpInventoryClient {
    async fn list_purchase_orders(
        &self,
        filter: &PurchaseOrderFilter,
    ) -> Result<Page<PurchaseOrder>, ApiError> {
        let builder = self
            .request(Method::GET, "purchase-orders")
            .query(&filter.query_pairs());
        self.fetch_json(builder, ORDER, "list").await
    }

    async fn get_purchase_order(&self, id: &str) -> Result<PurchaseOrder, ApiError> {
        let builder = self.request(Method::GET, &format!("purchase-orders/{id}"));
        self.fetch_json(builder, ORDER, id).await
    }

    async fn create_purchase_order(
        &self,
        request: &CreatePurchaseOrderRequest,
    ) -> Result<PurchaseOrder, ApiError> {
        let builder = self.request(Method::POST, "purchase-orders").json(request);
        self.fetch_json(builder, ORDER, "new").await
    }

    async fn update_purchase_order(
        &self,
        id: &str,
        request: &UpdatePurchaseOrderRequest,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &format!("purchase-orders/{id}"))
            .json(request);
        self.execute(builder, ORDER, id).await
    }

    async fn submit_purchase_order(&self, id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, &format!("purchase-orders/{id}/submit"));
        self.execute(builder, ORDER, id).await
    }

    async fn approve_purchase_order(&self, id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, &format!("purchase-orders/{id}/approve"));
        self.execute(builder, ORDER, id).await
    }

    async fn cancel_purchase_order(&self, id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, &format!("purchase-orders/{id}/cancel"));
        self.execute(builder, ORDER, id).await
    }

    async fn receive_item(
        &self,
        order_id: &str,
        item_id: &str,
        request: ReceiveItemRequest,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(
                Method::POST,
                &format!("purchase-orders/{order_id}/items/{item_id}/receive"),
            )
            .json(&request);
        self.execute(builder, ORDER_ITEM, item_id).await
    }

    async fn receive_all_items(&self, order_id: &str) -> Result<(), ApiError> {
        let builder = self.request(
            Method::POST,
            &format!("purchase-orders/{order_id}/receive-all"),
        );
        self.execute(builder, ORDER, order_id).await
    }

    async fn list_suppliers(&self, filter: &SupplierFilter) -> Result<Page<Supplier>, ApiError> {
        let builder = self
            .request(Method::GET, "suppliers")
            .query(&filter.query_pairs());
        self.fetch_json(builder, SUPPLIER, "list").await
    }

    async fn get_supplier(&self, id: &str) -> Result<Supplier, ApiError> {
        let builder = self.request(Method::GET, &format!("suppliers/{id}"));
        self.fetch_json(builder, SUPPLIER, id).await
    }

    async fn create_supplier(&self, input: &SupplierInput) -> Result<Supplier, ApiError> {
        let builder = self.request(Method::POST, "suppliers").json(input);
        self.fetch_json(builder, SUPPLIER, "new").await
    }

    async fn update_supplier(&self, id: &str, input: &SupplierInput) -> Result<Supplier, ApiError> {
        let builder = self
            .request(Method::PUT, &format!("suppliers/{id}"))
            .json(input);
        self.fetch_json(builder, SUPPLIER, id).await
    }

    async fn delete_supplier(&self, id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("suppliers/{id}"));
        self.execute(builder, SUPPLIER, id).await
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Page<Product>, ApiError> {
        let builder = self
            .request(Method::GET, "products")
            .query(&filter.query_pairs());
        self.fetch_json(builder, "product", "list").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;

    fn api_config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            token: Some("secret".to_string()),
            timeout_seconds: 5,
            rate_limit: RateLimitConfig {
                requests_per_second: 0,
                burst_capacity: 0,
            },
        }
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = HttpInventoryClient::new(&api_config("http://localhost:3000/api/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
    }

    #[test]
    fn test_empty_base_url_is_a_config_error() {
        let err = HttpInventoryClient::new(&api_config("  ")).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }
}
