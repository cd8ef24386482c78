// Plain-text rendering for the CLI tables and detail views

use crate::api::types::{Page, Product, PurchaseOrder, Supplier};
use crate::views::list::ListState;
use crate::workflows::status::{self, OrderAction};

/// Minor units to a two-decimal string, e.g. 12345 -> "123.45"
pub fn format_amount(minor_units: i64) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    let abs = minor_units.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Render rows as a left-aligned table with a header rule
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let render_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&render_row(headers.to_vec()));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

pub fn pagination_footer(state: &ListState) -> String {
    if state.total_pages == 0 {
        return format!("No results (page {})", state.page);
    }
    format!(
        "Page {} of {} · {} total · {} per page",
        state.page, state.total_pages, state.total, state.page_size
    )
}

pub fn purchase_order_table(orders: &[PurchaseOrder]) -> String {
    let rows: Vec<Vec<String>> = orders
        .iter()
        .map(|o| {
            vec![
                o.id.clone(),
                o.display_number().to_string(),
                o.supplier_name().to_string(),
                o.status.to_string(),
                o.items.len().to_string(),
                format_amount(o.total_amount),
                o.expected_delivery_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    table(
        &["ID", "NUMBER", "SUPPLIER", "STATUS", "ITEMS", "TOTAL", "EXPECTED"],
        &rows,
    )
}

pub fn supplier_table(suppliers: &[Supplier]) -> String {
    let rows: Vec<Vec<String>> = suppliers
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.name.clone(),
                s.contact_name.clone().unwrap_or_else(|| "-".into()),
                s.email.clone().unwrap_or_else(|| "-".into()),
                s.phone.clone().unwrap_or_else(|| "-".into()),
                if s.is_active { "active" } else { "inactive" }.to_string(),
            ]
        })
        .collect();
    table(&["ID", "NAME", "CONTACT", "EMAIL", "PHONE", "STATUS"], &rows)
}

pub fn product_table(products: &[Product]) -> String {
    let rows: Vec<Vec<String>> = products
        .iter()
        .map(|p| {
            vec![
                p.id.clone(),
                p.sku.clone(),
                p.name.clone(),
                p.category.clone().unwrap_or_else(|| "-".into()),
                format_amount(p.price),
                p.stock_quantity.to_string(),
            ]
        })
        .collect();
    table(&["ID", "SKU", "NAME", "CATEGORY", "PRICE", "STOCK"], &rows)
}

pub fn purchase_order_detail(order: &PurchaseOrder) -> String {
    let mut out = String::new();
    out.push_str(&format!("📋 Purchase order {} ({})\n", order.display_number(), order.id));
    out.push_str(&format!("   🏭 Supplier: {}\n", order.supplier_name()));
    out.push_str(&format!("   🏷️  Status:   {}\n", order.status));
    out.push_str(&format!("   💰 Total:    {}\n", format_amount(order.total_amount)));
    if let Some(date) = order.expected_delivery_date {
        out.push_str(&format!("   📅 Expected: {date}\n"));
    }
    if let Some(received) = order.received_date {
        out.push_str(&format!("   📦 Received: {}\n", received.format("%Y-%m-%d %H:%M UTC")));
    }
    if let Some(notes) = order.notes.as_deref().filter(|n| !n.is_empty()) {
        out.push_str(&format!("   📝 Notes:    {notes}\n"));
    }
    out.push('\n');

    let rows: Vec<Vec<String>> = order
        .items
        .iter()
        .map(|item| {
            vec![
                item.id.clone(),
                item.display_name(),
                item.quantity_ordered.to_string(),
                item.quantity_received.to_string(),
                item.remaining().to_string(),
                format_amount(item.unit_cost),
                format_amount(item.line_total),
                if status::can_receive_item(order, item) { "yes" } else { "" }.to_string(),
            ]
        })
        .collect();
    out.push_str(&table(
        &["ITEM", "PRODUCT", "ORDERED", "RECEIVED", "REMAINING", "UNIT", "LINE", "RECEIVABLE"],
        &rows,
    ));

    let actions = status::available_actions(order);
    out.push('\n');
    if actions.is_empty() {
        out.push_str("No further actions: this order is closed.\n");
    } else {
        let labels: Vec<&str> = actions.iter().map(OrderAction::label).collect();
        out.push_str(&format!("Available actions: {}\n", labels.join(", ")));
    }
    out
}

pub fn supplier_detail(supplier: &Supplier) -> String {
    let mut out = format!("🏭 {} ({})\n", supplier.name, supplier.id);
    let fields = [
        ("Contact", &supplier.contact_name),
        ("Email", &supplier.email),
        ("Phone", &supplier.phone),
        ("Address", &supplier.address),
        ("Notes", &supplier.notes),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            out.push_str(&format!("   {label}: {value}\n"));
        }
    }
    out.push_str(&format!(
        "   Status: {}\n",
        if supplier.is_active { "active" } else { "inactive" }
    ));
    out
}

/// JSON body for `--json` list output
pub fn page_json<T: serde::Serialize + Clone>(rows: &[T], state: &ListState) -> serde_json::Value {
    let page = Page {
        data: rows.to_vec(),
        total: state.total,
        total_pages: state.total_pages,
    };
    serde_json::json!({ "page": state.page, "limit": state.page_size, "result": page })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0.00");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(12345), "123.45");
        assert_eq!(format_amount(-250), "-2.50");
    }

    #[test]
    fn test_table_pads_columns() {
        let out = table(
            &["ID", "NAME"],
            &[vec!["1".into(), "Acme".into()], vec!["22".into(), "B".into()]],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ID  NAME");
        assert_eq!(lines[2], "1   Acme");
        assert_eq!(lines[3], "22  B");
    }

    #[test]
    fn test_footer_for_empty_result() {
        let state = ListState::new(10);
        assert_eq!(pagination_footer(&state), "No results (page 1)");
    }
}
