use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::api::client::InventoryApi;
use crate::api::mocks::{ApiCall, InMemoryBackend};
use crate::api::types::{ProductFilter, SupplierFilter};
use crate::cli::commands::{report_error, report_transition, CommandContext};
use crate::cli::render;
use crate::views::forms::{DraftItem, PurchaseOrderDraft};
use crate::views::list::{ListView, PurchaseOrderSource};
use crate::views::suppliers::SupplierListView;
use crate::workflows::confirm::AutoConfirm;
use crate::workflows::state_machine::PurchaseOrderController;

/// Scripted walkthrough against the in-memory backend: create, submit,
/// approve, receive partially, receive the rest, then try an action the
/// closed order no longer offers.
pub async fn run(ctx: &CommandContext) -> Result<()> {
    let backend = Arc::new(InMemoryBackend::with_sample_data());
    let api: Arc<dyn InventoryApi> = backend.clone();
    let confirm = AutoConfirm;

    println!("🎬 inventory-admin demo (in-memory backend, nothing leaves this process)");
    println!();

    let mut orders = ListView::new(Arc::clone(&api), PurchaseOrderSource, ctx.config.ui.page_size);
    orders.refresh().await?;
    println!("📋 Existing purchase orders");
    print!("{}", render::purchase_order_table(orders.rows()));
    println!("{}", render::pagination_footer(orders.state()));
    println!();

    let suppliers = api
        .list_suppliers(&SupplierFilter {
            page: 1,
            limit: 10,
            is_active: Some(true),
            search: None,
        })
        .await?;
    let products = api
        .list_products(&ProductFilter {
            page: 1,
            limit: 10,
            ..Default::default()
        })
        .await?;
    let (Some(supplier), [first, second, ..]) = (suppliers.data.first(), products.data.as_slice())
    else {
        bail!("sample data is missing suppliers or products");
    };

    let mut draft = PurchaseOrderDraft::new(supplier.id.clone());
    draft
        .add_item(DraftItem::new(first.id.clone(), 10, 30))
        .add_item(DraftItem::new(second.id.clone(), 4, 650));
    println!(
        "📝 Drafting an order for {} (estimated {})",
        supplier.name,
        render::format_amount(draft.estimated_total())
    );

    let mut controller = PurchaseOrderController::create(Arc::clone(&api), &draft).await?;
    println!("✅ Created {}", controller.order_id());
    report_transition("Submit", &controller.submit(&confirm).await?);
    report_transition("Approve", &controller.approve(&confirm).await?);

    let first_item = controller
        .snapshot()
        .and_then(|order| order.items.first())
        .map(|item| item.id.clone());
    if let Some(item_id) = first_item {
        report_transition(
            "Receive 4",
            &controller.receive_item(&item_id, 4, &confirm).await?,
        );
        println!("🔎 Trying to over-receive 7 units (only 6 remain)");
        if let Err(err) = controller.receive_item(&item_id, 7, &confirm).await {
            report_error(&err);
        }
    }
    report_transition("Receive all", &controller.receive_all_items(&confirm).await?);

    println!("🔎 Trying to cancel a received order");
    if let Err(err) = controller.cancel(&confirm).await {
        report_error(&err);
    }
    println!();
    if let Some(order) = controller.snapshot() {
        print!("{}", render::purchase_order_detail(order));
    }

    println!();
    println!("⌨️  Typing 'n', 'no', 'nor' into the supplier search within the debounce window");
    let mut directory = SupplierListView::new(
        Arc::clone(&api),
        ctx.config.ui.page_size,
        Duration::from_millis(ctx.config.ui.search_debounce_ms),
    );
    backend.clear_calls();
    for term in ["n", "no", "nor"] {
        directory.type_search(term);
        tokio::time::sleep(Duration::from_millis(
            ctx.config.ui.search_debounce_ms / 10,
        ))
        .await;
    }
    directory.settle_search().await?;
    let queries = backend
        .calls()
        .iter()
        .filter(|call| matches!(call, ApiCall::ListSuppliers(_)))
        .count();
    println!("   {queries} supplier query sent");
    print!("{}", render::supplier_table(directory.list().rows()));

    println!();
    println!("🎉 Demo complete");
    Ok(())
}
