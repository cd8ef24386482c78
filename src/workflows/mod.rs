// Purchase order workflow: status rules, confirmation, and the controller
// that requests transitions from the backend.

pub mod confirm;
pub mod errors;
pub mod state_machine;
pub mod status;

pub use confirm::{AutoConfirm, Confirmer, DeclineAll};
pub use errors::WorkflowError;
pub use state_machine::{PurchaseOrderController, StateTransition, TransitionResult};
pub use status::{available_actions, can_receive_item, is_available, OrderAction};
