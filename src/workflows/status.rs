// Which actions the client offers for an order, derived only from the last
// fetched snapshot. The backend still has the final say on every request.

use std::fmt;

use crate::api::types::{PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderAction {
    Edit,
    Submit,
    Approve,
    Cancel,
    ReceiveItem,
    ReceiveAll,
}

impl OrderAction {
    pub fn label(&self) -> &'static str {
        match self {
            OrderAction::Edit => "edit",
            OrderAction::Submit => "submit",
            OrderAction::Approve => "approve",
            OrderAction::Cancel => "cancel",
            OrderAction::ReceiveItem => "receive item",
            OrderAction::ReceiveAll => "receive all",
        }
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl PurchaseOrderStatus {
    /// Items, supplier and notes may still change
    pub fn is_editable(&self) -> bool {
        matches!(self, PurchaseOrderStatus::Draft | PurchaseOrderStatus::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PurchaseOrderStatus::Received | PurchaseOrderStatus::Cancelled
        )
    }

    pub fn can_submit(&self) -> bool {
        *self == PurchaseOrderStatus::Draft
    }

    pub fn can_approve(&self) -> bool {
        *self == PurchaseOrderStatus::Pending
    }

    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Pending | PurchaseOrderStatus::Approved
        )
    }

    pub fn can_receive(&self) -> bool {
        *self == PurchaseOrderStatus::Approved
    }
}

/// Receiving one line is offered only on approved orders with stock outstanding
pub fn can_receive_item(order: &PurchaseOrder, item: &PurchaseOrderItem) -> bool {
    order.status.can_receive() && item.remaining() > 0
}

pub fn is_available(order: &PurchaseOrder, action: OrderAction) -> bool {
    let status = order.status;
    match action {
        OrderAction::Edit => status.is_editable(),
        OrderAction::Submit => status.can_submit(),
        OrderAction::Approve => status.can_approve(),
        OrderAction::Cancel => status.can_cancel(),
        OrderAction::ReceiveItem | OrderAction::ReceiveAll => {
            status.can_receive() && order.items.iter().any(|item| item.remaining() > 0)
        }
    }
}

pub fn available_actions(order: &PurchaseOrder) -> Vec<OrderAction> {
    [
        OrderAction::Edit,
        OrderAction::Submit,
        OrderAction::Approve,
        OrderAction::Cancel,
        OrderAction::ReceiveItem,
        OrderAction::ReceiveAll,
    ]
    .into_iter()
    .filter(|action| is_available(order, *action))
    .collect()
}
