use thiserror::Error;

use crate::api::errors::ApiError;
use crate::api::types::PurchaseOrderStatus;
use crate::workflows::status::OrderAction;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Rejected client-side; no request was sent
    #[error("{0}")]
    Validation(String),
    #[error("cannot {action} a purchase order that is {status}")]
    ActionUnavailable {
        action: OrderAction,
        status: PurchaseOrderStatus,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkflowError::Api(err) if err.is_not_found())
    }
}
