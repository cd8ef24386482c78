// Form drafts for the add/edit dialogs. Validation runs before any request.

use chrono::NaiveDate;

use crate::api::types::{
    CreatePurchaseOrderRequest, NewPurchaseOrderItem, Supplier, SupplierInput,
};
use crate::workflows::errors::WorkflowError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftItem {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity_ordered: u32,
    pub unit_cost: i64,
    pub notes: Option<String>,
}

impl DraftItem {
    pub fn new(product_id: impl Into<String>, quantity_ordered: u32, unit_cost: i64) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: None,
            quantity_ordered,
            unit_cost,
            notes: None,
        }
    }

    pub fn line_total(&self) -> i64 {
        self.unit_cost.saturating_mul(i64::from(self.quantity_ordered))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseOrderDraft {
    pub supplier_id: Option<String>,
    pub notes: Option<String>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub items: Vec<DraftItem>,
}

impl PurchaseOrderDraft {
    pub fn new(supplier_id: impl Into<String>) -> Self {
        Self {
            supplier_id: Some(supplier_id.into()),
            ..Default::default()
        }
    }

    pub fn add_item(&mut self, item: DraftItem) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn remove_item(&mut self, index: usize) -> Option<DraftItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Preview only; the backend computes the real total
    pub fn estimated_total(&self) -> i64 {
        self.items
            .iter()
            .map(DraftItem::line_total)
            .fold(0, i64::saturating_add)
    }

    pub fn validate(&self) -> Result<CreatePurchaseOrderRequest, WorkflowError> {
        let supplier_id = self
            .supplier_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| WorkflowError::validation("Please select a supplier"))?;

        if self.items.is_empty() {
            return Err(WorkflowError::validation("Please add at least one item"));
        }

        let mut items = Vec::with_capacity(self.items.len());
        let mut total: i64 = 0;
        for (index, item) in self.items.iter().enumerate() {
            let line = index + 1;
            if item.product_id.trim().is_empty() {
                return Err(WorkflowError::validation(format!(
                    "Item {line}: please select a product"
                )));
            }
            if item.quantity_ordered == 0 {
                return Err(WorkflowError::validation(format!(
                    "Item {line}: quantity must be greater than zero"
                )));
            }
            if item.unit_cost < 0 {
                return Err(WorkflowError::validation(format!(
                    "Item {line}: unit cost cannot be negative"
                )));
            }
            total = item
                .unit_cost
                .checked_mul(i64::from(item.quantity_ordered))
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or_else(|| {
                    WorkflowError::validation(format!("Item {line}: order total is too large"))
                })?;
            items.push(NewPurchaseOrderItem {
                product_id: item.product_id.trim().to_string(),
                variant_id: item.variant_id.clone(),
                quantity_ordered: item.quantity_ordered,
                unit_cost: item.unit_cost,
                notes: item.notes.clone(),
            });
        }

        Ok(CreatePurchaseOrderRequest {
            supplier_id: supplier_id.to_string(),
            notes: self.notes.clone().filter(|n| !n.trim().is_empty()),
            expected_delivery_date: self.expected_delivery_date,
            items,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierDraft {
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
}

impl Default for SupplierDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            contact_name: None,
            email: None,
            phone: None,
            address: None,
            notes: None,
            is_active: true,
        }
    }
}

impl From<&Supplier> for SupplierDraft {
    fn from(supplier: &Supplier) -> Self {
        Self {
            name: supplier.name.clone(),
            contact_name: supplier.contact_name.clone(),
            email: supplier.email.clone(),
            phone: supplier.phone.clone(),
            address: supplier.address.clone(),
            notes: supplier.notes.clone(),
            is_active: supplier.is_active,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl SupplierDraft {
    pub fn validate(&self) -> Result<SupplierInput, WorkflowError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(WorkflowError::validation("Supplier name is required"));
        }
        let email = non_blank(&self.email);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(WorkflowError::validation(format!(
                    "'{email}' is not a valid email address"
                )));
            }
        }
        Ok(SupplierInput {
            name: name.to_string(),
            contact_name: non_blank(&self.contact_name),
            email,
            phone: non_blank(&self.phone),
            address: non_blank(&self.address),
            notes: non_blank(&self.notes),
            is_active: self.is_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_items_is_rejected() {
        let draft = PurchaseOrderDraft::new("sup-1");
        let err = draft.validate().unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(ref m) if m.contains("at least one item")));
    }

    #[test]
    fn test_missing_supplier_is_rejected() {
        let mut draft = PurchaseOrderDraft::default();
        draft.add_item(DraftItem::new("prod-1", 1, 100));
        assert!(matches!(draft.validate(), Err(WorkflowError::Validation(_))));
    }

    #[test]
    fn test_zero_quantity_line_is_rejected() {
        let mut draft = PurchaseOrderDraft::new("sup-1");
        draft
            .add_item(DraftItem::new("prod-1", 2, 100))
            .add_item(DraftItem::new("prod-2", 0, 100));
        let err = draft.validate().unwrap_err();
        assert!(err.to_string().starts_with("Item 2"));
    }

    #[test]
    fn test_oversized_order_total_is_rejected() {
        let mut draft = PurchaseOrderDraft::new("sup-1");
        draft
            .add_item(DraftItem::new("prod-1", 1, 100))
            .add_item(DraftItem::new("prod-2", u32::MAX, i64::MAX / 2));
        assert_eq!(draft.estimated_total(), i64::MAX);

        let err = draft.validate().unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(ref m) if m == "Item 2: order total is too large"));
    }

    #[test]
    fn test_valid_draft_builds_request() {
        let mut draft = PurchaseOrderDraft::new(" sup-1 ");
        draft.notes = Some("  ".into());
        draft.add_item(DraftItem::new("prod-1", 3, 250));
        assert_eq!(draft.estimated_total(), 750);

        let request = draft.validate().unwrap();
        assert_eq!(request.supplier_id, "sup-1");
        assert_eq!(request.notes, None);
        assert_eq!(request.items[0].quantity_ordered, 3);
    }

    #[test]
    fn test_remove_item_out_of_range() {
        let mut draft = PurchaseOrderDraft::new("sup-1");
        draft.add_item(DraftItem::new("prod-1", 1, 1));
        assert!(draft.remove_item(3).is_none());
        assert!(draft.remove_item(0).is_some());
        assert!(draft.items.is_empty());
    }

    #[test]
    fn test_supplier_draft_validation() {
        let mut draft = SupplierDraft::default();
        assert!(draft.validate().is_err());

        draft.name = "Acme".into();
        draft.email = Some("not-an-email".into());
        assert!(draft.validate().is_err());

        draft.email = Some("orders@acme.test".into());
        draft.phone = Some("   ".into());
        let input = draft.validate().unwrap();
        assert_eq!(input.phone, None);
        assert!(input.is_active);
    }
}
