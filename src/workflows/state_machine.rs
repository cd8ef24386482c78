// Purchase order workflow controller.
// The backend is the source of truth: every request is followed by a full
// re-fetch, and the snapshot is never patched locally.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn, Instrument};

use crate::api::client::InventoryApi;
use crate::api::errors::ApiError;
use crate::api::types::{PurchaseOrder, PurchaseOrderStatus, ReceiveItemRequest, UpdatePurchaseOrderRequest};
use crate::telemetry::{create_workflow_span, generate_correlation_id};
use crate::views::forms::PurchaseOrderDraft;
use crate::workflows::confirm::Confirmer;
use crate::workflows::errors::WorkflowError;
use crate::workflows::status::{self, OrderAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTransition {
    Submit,
    Approve,
    Cancel,
}

impl StateTransition {
    pub fn action(&self) -> OrderAction {
        match self {
            StateTransition::Submit => OrderAction::Submit,
            StateTransition::Approve => OrderAction::Approve,
            StateTransition::Cancel => OrderAction::Cancel,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            StateTransition::Submit => "Submit",
            StateTransition::Approve => "Approve",
            StateTransition::Cancel => "Cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    Success {
        previous_status: PurchaseOrderStatus,
        new_status: PurchaseOrderStatus,
    },
    /// Backend refused; `current_status` is what the re-fetch reported
    Rejected {
        message: String,
        previous_status: PurchaseOrderStatus,
        current_status: PurchaseOrderStatus,
    },
    /// User did not confirm; nothing was sent
    Declined,
}

impl TransitionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TransitionResult::Success { .. })
    }
}

/// Holds the last fetched copy of one purchase order and requests changes to it
pub struct PurchaseOrderController {
    api: Arc<dyn InventoryApi>,
    order_id: String,
    snapshot: Option<PurchaseOrder>,
    loading: watch::Sender<bool>,
    last_error: Option<String>,
}

impl PurchaseOrderController {
    pub fn new(api: Arc<dyn InventoryApi>, order_id: impl Into<String>) -> Self {
        Self {
            api,
            order_id: order_id.into(),
            snapshot: None,
            loading: watch::channel(false).0,
            last_error: None,
        }
    }

    /// Validate the draft, create the order, then load it like any other
    pub async fn create(
        api: Arc<dyn InventoryApi>,
        draft: &PurchaseOrderDraft,
    ) -> Result<Self, WorkflowError> {
        let request = draft.validate()?;
        let created = api.create_purchase_order(&request).await?;
        info!(order_id = %created.id, items = request.items.len(), "Purchase order created");

        let mut controller = Self::new(api, created.id);
        controller.load().await?;
        Ok(controller)
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn snapshot(&self) -> Option<&PurchaseOrder> {
        self.snapshot.as_ref()
    }

    pub fn status(&self) -> Option<PurchaseOrderStatus> {
        self.snapshot.as_ref().map(|order| order.status)
    }

    /// True while a fetch of the order is in flight
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn loading_updates(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn available_actions(&self) -> Vec<OrderAction> {
        self.snapshot
            .as_ref()
            .map(status::available_actions)
            .unwrap_or_default()
    }

    /// Fetch the order and replace the snapshot. On failure the previous
    /// snapshot stays in place.
    pub async fn load(&mut self) -> Result<&PurchaseOrder, WorkflowError> {
        self.loading.send_replace(true);
        let result = self.api.get_purchase_order(&self.order_id).await;
        self.loading.send_replace(false);

        match result {
            Ok(order) => {
                self.last_error = None;
                Ok(&*self.snapshot.insert(order))
            }
            Err(err) => {
                self.last_error = Some(err.user_message());
                Err(err.into())
            }
        }
    }

    async fn ensure_loaded(&mut self) -> Result<(), WorkflowError> {
        if self.snapshot.is_none() {
            self.load().await?;
        }
        Ok(())
    }

    fn require(&self, action: OrderAction) -> Result<&PurchaseOrder, WorkflowError> {
        let order = self
            .snapshot
            .as_ref()
            .ok_or_else(|| WorkflowError::validation("purchase order has not been loaded"))?;
        if !status::is_available(order, action) {
            return Err(WorkflowError::ActionUnavailable {
                action,
                status: order.status,
            });
        }
        Ok(order)
    }

    pub async fn transition(
        &mut self,
        transition: StateTransition,
        confirmer: &dyn Confirmer,
    ) -> Result<TransitionResult, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(
            transition.action().label(),
            Some(self.order_id.as_str()),
            Some(correlation_id.as_str()),
        );
        async move {
            self.ensure_loaded().await?;
            let (previous_status, prompt) = {
                let order = self.require(transition.action())?;
                (
                    order.status,
                    format!("{} purchase order {}?", transition.verb(), order.display_number()),
                )
            };
            if !confirmer.confirm(&prompt) {
                info!("Transition declined by user");
                return Ok(TransitionResult::Declined);
            }

            let api = Arc::clone(&self.api);
            let result = match transition {
                StateTransition::Submit => api.submit_purchase_order(&self.order_id).await,
                StateTransition::Approve => api.approve_purchase_order(&self.order_id).await,
                StateTransition::Cancel => api.cancel_purchase_order(&self.order_id).await,
            };
            self.settle(previous_status, result).await
        }
        .instrument(span)
        .await
    }

    pub async fn approve(&mut self, confirmer: &dyn Confirmer) -> Result<TransitionResult, WorkflowError> {
        self.transition(StateTransition::Approve, confirmer).await
    }

    pub async fn cancel(&mut self, confirmer: &dyn Confirmer) -> Result<TransitionResult, WorkflowError> {
        self.transition(StateTransition::Cancel, confirmer).await
    }

    pub async fn submit(&mut self, confirmer: &dyn Confirmer) -> Result<TransitionResult, WorkflowError> {
        self.transition(StateTransition::Submit, confirmer).await
    }

    /// Receive `quantity` units of one line. `0 < quantity <= remaining` is
    /// checked against the snapshot before anything is sent.
    pub async fn receive_item(
        &mut self,
        item_id: &str,
        quantity: u32,
        confirmer: &dyn Confirmer,
    ) -> Result<TransitionResult, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(
            "receive_item",
            Some(self.order_id.as_str()),
            Some(correlation_id.as_str()),
        );
        async move {
            self.ensure_loaded().await?;
            let (previous_status, prompt) = {
                let order = self.require(OrderAction::ReceiveItem)?;
                let item = order.item(item_id).ok_or_else(|| {
                    WorkflowError::validation(format!(
                        "item {item_id} is not part of purchase order {}",
                        order.display_number()
                    ))
                })?;
                let remaining = item.remaining();
                if quantity == 0 {
                    return Err(WorkflowError::validation(
                        "quantity to receive must be greater than zero",
                    ));
                }
                if remaining == 0 {
                    return Err(WorkflowError::validation(format!(
                        "{} is already fully received",
                        item.display_name()
                    )));
                }
                if quantity > remaining {
                    return Err(WorkflowError::validation(format!(
                        "cannot receive {quantity} units of {}; only {remaining} remaining",
                        item.display_name()
                    )));
                }
                (
                    order.status,
                    format!("Receive {quantity} x {}?", item.display_name()),
                )
            };
            if !confirmer.confirm(&prompt) {
                return Ok(TransitionResult::Declined);
            }

            let api = Arc::clone(&self.api);
            let result = api
                .receive_item(
                    &self.order_id,
                    item_id,
                    ReceiveItemRequest {
                        quantity_received: quantity,
                    },
                )
                .await;
            self.settle(previous_status, result).await
        }
        .instrument(span)
        .await
    }

    pub async fn receive_all_items(
        &mut self,
        confirmer: &dyn Confirmer,
    ) -> Result<TransitionResult, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(
            "receive_all",
            Some(self.order_id.as_str()),
            Some(correlation_id.as_str()),
        );
        async move {
            self.ensure_loaded().await?;
            let (previous_status, prompt) = {
                let order = self.require(OrderAction::ReceiveAll)?;
                (
                    order.status,
                    format!(
                        "Receive all {} remaining units on {}?",
                        order.total_remaining(),
                        order.display_number()
                    ),
                )
            };
            if !confirmer.confirm(&prompt) {
                return Ok(TransitionResult::Declined);
            }

            let api = Arc::clone(&self.api);
            let result = api.receive_all_items(&self.order_id).await;
            self.settle(previous_status, result).await
        }
        .instrument(span)
        .await
    }

    /// Change supplier, notes or delivery date while the order is editable
    pub async fn update_header(
        &mut self,
        request: UpdatePurchaseOrderRequest,
    ) -> Result<TransitionResult, WorkflowError> {
        if request.is_empty() {
            return Err(WorkflowError::validation("nothing to update"));
        }
        if matches!(&request.supplier_id, Some(id) if id.trim().is_empty()) {
            return Err(WorkflowError::validation("supplier must not be empty"));
        }
        self.ensure_loaded().await?;
        let previous_status = self.require(OrderAction::Edit)?.status;

        let api = Arc::clone(&self.api);
        let result = api.update_purchase_order(&self.order_id, &request).await;
        self.settle(previous_status, result).await
    }

    async fn settle(
        &mut self,
        previous_status: PurchaseOrderStatus,
        result: Result<(), ApiError>,
    ) -> Result<TransitionResult, WorkflowError> {
        match result {
            Ok(()) => {
                let new_status = self.load().await?.status;
                info!(%previous_status, %new_status, "Purchase order updated");
                Ok(TransitionResult::Success {
                    previous_status,
                    new_status,
                })
            }
            Err(err) if err.is_not_found() => {
                // the order can outlive a missing line item
                if let Err(resync) = self.load().await {
                    debug!(error = %resync, "Re-fetch after not-found failed");
                }
                self.last_error = Some(err.user_message());
                Err(err.into())
            }
            Err(err) => {
                let message = err.user_message();
                warn!(error = %message, "Backend rejected purchase order request, re-fetching");
                if let Err(resync) = self.load().await {
                    warn!(error = %resync, "Re-fetch after rejection failed; keeping previous snapshot");
                }
                self.last_error = Some(message.clone());
                Ok(TransitionResult::Rejected {
                    message,
                    previous_status,
                    current_status: self.status().unwrap_or(previous_status),
                })
            }
        }
    }
}
