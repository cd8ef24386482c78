use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

use crate::api::types::{PurchaseOrderStatus, UpdatePurchaseOrderRequest};
use crate::cli::commands::{print_json, report_transition, with_loading, CommandContext};
use crate::cli::render;
use crate::cli::{OrderCommands, PageArgs};
use crate::views::forms::{DraftItem, PurchaseOrderDraft};
use crate::views::list::{ListView, OrderListFilters, PurchaseOrderSource};
use crate::workflows::state_machine::{PurchaseOrderController, StateTransition, TransitionResult};

pub async fn run(ctx: &CommandContext, command: OrderCommands) -> Result<()> {
    match command {
        OrderCommands::List {
            page,
            status,
            supplier,
        } => list(ctx, page, status, supplier).await,
        OrderCommands::Show { id } => show(ctx, &id).await,
        OrderCommands::Create {
            supplier,
            items,
            notes,
            expected,
        } => create(ctx, supplier, &items, notes, expected).await,
        OrderCommands::Update {
            id,
            supplier,
            notes,
            expected,
        } => update(ctx, &id, supplier, notes, expected).await,
        OrderCommands::Submit { id } => transition(ctx, &id, StateTransition::Submit).await,
        OrderCommands::Approve { id } => transition(ctx, &id, StateTransition::Approve).await,
        OrderCommands::Cancel { id } => transition(ctx, &id, StateTransition::Cancel).await,
        OrderCommands::Receive { id, item, quantity } => receive(ctx, &id, &item, quantity).await,
        OrderCommands::ReceiveAll { id } => receive_all(ctx, &id).await,
    }
}

async fn list(
    ctx: &CommandContext,
    page: PageArgs,
    status: Option<String>,
    supplier: Option<String>,
) -> Result<()> {
    let status = status
        .as_deref()
        .map(str::parse::<PurchaseOrderStatus>)
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let filters = OrderListFilters {
        status,
        supplier_id: supplier,
    };
    let mut view = ListView::new(
        Arc::clone(&ctx.api),
        PurchaseOrderSource,
        ctx.page_size(page.limit),
    )
    .with_filters(filters)
    .with_page(page.page);
    with_loading(ctx, "purchase orders", view.refresh()).await?;

    if ctx.json {
        return print_json(&render::page_json(view.rows(), view.state()));
    }

    if view.rows().is_empty() {
        println!("📋 No purchase orders match");
    } else {
        print!("{}", render::purchase_order_table(view.rows()));
    }
    println!();
    println!("{}", render::pagination_footer(view.state()));
    if view.state().has_next() {
        println!("   💡 Next page: --page {}", view.state().page + 1);
    }
    Ok(())
}

/// Fetch the order up front so the user sees progress before any prompt
async fn load(ctx: &CommandContext, id: &str) -> Result<PurchaseOrderController> {
    let mut controller = PurchaseOrderController::new(Arc::clone(&ctx.api), id);
    with_loading(ctx, &format!("purchase order {id}"), controller.load()).await?;
    Ok(controller)
}

async fn show(ctx: &CommandContext, id: &str) -> Result<()> {
    let controller = load(ctx, id).await?;
    let Some(order) = controller.snapshot() else {
        bail!("purchase order {id} could not be loaded");
    };
    if ctx.json {
        return print_json(order);
    }
    print!("{}", render::purchase_order_detail(order));
    Ok(())
}

/// PRODUCT_ID:QUANTITY:UNIT_COST
pub fn parse_item(raw: &str) -> Result<DraftItem> {
    let parts: Vec<&str> = raw.split(':').collect();
    let [product, quantity, cost] = parts.as_slice() else {
        bail!("item '{raw}' must look like PRODUCT_ID:QUANTITY:UNIT_COST");
    };
    let quantity: u32 = quantity
        .trim()
        .parse()
        .with_context(|| format!("invalid quantity in item '{raw}'"))?;
    let cost: i64 = cost
        .trim()
        .parse()
        .with_context(|| format!("invalid unit cost in item '{raw}'"))?;
    Ok(DraftItem::new(product.trim(), quantity, cost))
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("'{value}' is not a date (expected YYYY-MM-DD)"))
}

async fn create(
    ctx: &CommandContext,
    supplier: Option<String>,
    items: &[String],
    notes: Option<String>,
    expected: Option<String>,
) -> Result<()> {
    let mut draft = PurchaseOrderDraft {
        supplier_id: supplier,
        notes,
        expected_delivery_date: expected.as_deref().map(parse_date).transpose()?,
        items: Vec::new(),
    };
    for raw in items {
        draft.add_item(parse_item(raw)?);
    }
    debug!(items = draft.items.len(), "Creating purchase order");

    let controller = PurchaseOrderController::create(Arc::clone(&ctx.api), &draft).await?;
    let Some(order) = controller.snapshot() else {
        bail!("purchase order was created but could not be loaded");
    };
    if ctx.json {
        return print_json(order);
    }
    println!("✅ Created draft {}", order.display_number());
    println!();
    print!("{}", render::purchase_order_detail(order));
    Ok(())
}

async fn update(
    ctx: &CommandContext,
    id: &str,
    supplier: Option<String>,
    notes: Option<String>,
    expected: Option<String>,
) -> Result<()> {
    let request = UpdatePurchaseOrderRequest {
        supplier_id: supplier,
        notes,
        expected_delivery_date: expected.as_deref().map(parse_date).transpose()?,
    };
    let mut controller = load(ctx, id).await?;
    let result = controller.update_header(request).await?;
    finish(ctx, &controller, "Update", &result)
}

async fn transition(ctx: &CommandContext, id: &str, transition: StateTransition) -> Result<()> {
    let mut controller = load(ctx, id).await?;
    let result = controller
        .transition(transition, ctx.confirmer.as_ref())
        .await?;
    finish(ctx, &controller, transition.action().label(), &result)
}

async fn receive(ctx: &CommandContext, id: &str, item_id: &str, quantity: u32) -> Result<()> {
    let mut controller = load(ctx, id).await?;
    let result = controller
        .receive_item(item_id, quantity, ctx.confirmer.as_ref())
        .await?;
    finish(ctx, &controller, "Receive", &result)
}

async fn receive_all(ctx: &CommandContext, id: &str) -> Result<()> {
    let mut controller = load(ctx, id).await?;
    let result = controller
        .receive_all_items(ctx.confirmer.as_ref())
        .await?;
    finish(ctx, &controller, "Receive all", &result)
}

/// Show the re-fetched order; a backend rejection fails the command in
/// both output modes.
fn finish(
    ctx: &CommandContext,
    controller: &PurchaseOrderController,
    action: &str,
    result: &TransitionResult,
) -> Result<()> {
    if ctx.json {
        if let Some(order) = controller.snapshot() {
            print_json(order)?;
        }
    } else {
        report_transition(action, result);
        if let Some(order) = controller.snapshot() {
            println!();
            print!("{}", render::purchase_order_detail(order));
        }
    }
    if let TransitionResult::Rejected { message, .. } = result {
        bail!("{action} rejected: {message}");
    }
    Ok(())
}
