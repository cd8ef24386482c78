use anyhow::{bail, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::cli::commands::{print_json, report_api_error, with_loading, CommandContext};
use crate::cli::render;
use crate::cli::{PageArgs, SupplierCommands, SupplierFields};
use crate::shutdown::ShutdownCoordinator;
use crate::api::types::Supplier;
use crate::views::forms::SupplierDraft;
use crate::views::list::{ListView, SupplierListFilters, SupplierSource};
use crate::views::suppliers::{SupplierChange, SupplierListView};

pub async fn run(ctx: &CommandContext, command: SupplierCommands) -> Result<()> {
    match command {
        SupplierCommands::List {
            page,
            active,
            search,
        } => list(ctx, page, active, search).await,
        SupplierCommands::Show { id } => {
            let supplier = fetch(ctx, &id).await?;
            if ctx.json {
                return print_json(&supplier);
            }
            print!("{}", render::supplier_detail(&supplier));
            Ok(())
        }
        SupplierCommands::Create { fields } => create(ctx, fields).await,
        SupplierCommands::Update { id, fields } => update(ctx, &id, fields).await,
        SupplierCommands::Delete { id } => delete(ctx, &id).await,
        SupplierCommands::Search => interactive_search(ctx).await,
    }
}

fn view(ctx: &CommandContext, limit: Option<u32>) -> SupplierListView {
    SupplierListView::new(
        Arc::clone(&ctx.api),
        ctx.page_size(limit),
        ctx.search_debounce(),
    )
}

async fn fetch(ctx: &CommandContext, id: &str) -> Result<Supplier> {
    Ok(with_loading(ctx, &format!("supplier {id}"), ctx.api.get_supplier(id)).await?)
}

fn print_page(ctx: &CommandContext, list: &ListView<SupplierSource>) -> Result<()> {
    if ctx.json {
        return print_json(&render::page_json(list.rows(), list.state()));
    }
    if list.rows().is_empty() {
        println!("🏭 No suppliers match");
    } else {
        print!("{}", render::supplier_table(list.rows()));
    }
    println!();
    println!("{}", render::pagination_footer(list.state()));
    Ok(())
}

async fn list(
    ctx: &CommandContext,
    page: PageArgs,
    active: Option<bool>,
    search: Option<String>,
) -> Result<()> {
    let filters = SupplierListFilters {
        is_active: active,
        search: search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    };
    let mut list = ListView::new(Arc::clone(&ctx.api), SupplierSource, ctx.page_size(page.limit))
        .with_filters(filters)
        .with_page(page.page);
    with_loading(ctx, "suppliers", list.refresh()).await?;
    print_page(ctx, &list)
}

fn apply_fields(draft: &mut SupplierDraft, fields: SupplierFields) {
    if let Some(name) = fields.name {
        draft.name = name;
    }
    let optional = [
        (&mut draft.contact_name, fields.contact),
        (&mut draft.email, fields.email),
        (&mut draft.phone, fields.phone),
        (&mut draft.address, fields.address),
        (&mut draft.notes, fields.notes),
    ];
    for (slot, value) in optional {
        if value.is_some() {
            *slot = value;
        }
    }
    if fields.inactive {
        draft.is_active = false;
    } else if fields.active {
        draft.is_active = true;
    }
}

async fn create(ctx: &CommandContext, fields: SupplierFields) -> Result<()> {
    let mut draft = SupplierDraft::default();
    apply_fields(&mut draft, fields);

    let mut suppliers = view(ctx, None);
    suppliers.modal_mut().add();
    let change = suppliers.save(&draft).await?;
    report_change(ctx, change)
}

async fn update(ctx: &CommandContext, id: &str, fields: SupplierFields) -> Result<()> {
    let current = fetch(ctx, id).await?;
    let mut draft = SupplierDraft::from(&current);
    apply_fields(&mut draft, fields);

    let mut suppliers = view(ctx, None);
    suppliers.modal_mut().edit(current);
    let change = suppliers.save(&draft).await?;
    report_change(ctx, change)
}

async fn delete(ctx: &CommandContext, id: &str) -> Result<()> {
    let current = fetch(ctx, id).await?;
    let mut suppliers = view(ctx, None);
    suppliers.modal_mut().delete(current);
    let change = suppliers.confirm_delete(ctx.confirmer.as_ref()).await?;
    report_change(ctx, change)
}

fn report_change(ctx: &CommandContext, change: SupplierChange) -> Result<()> {
    match change {
        SupplierChange::Created(supplier) | SupplierChange::Updated(supplier) if ctx.json => {
            print_json(&supplier)
        }
        SupplierChange::Created(supplier) => {
            println!("✅ Added supplier {} ({})", supplier.name, supplier.id);
            Ok(())
        }
        SupplierChange::Updated(supplier) => {
            println!("✅ Updated supplier {}", supplier.name);
            print!("{}", render::supplier_detail(&supplier));
            Ok(())
        }
        SupplierChange::Deleted(id) => {
            println!("🗑️  Deleted supplier {id}");
            Ok(())
        }
        SupplierChange::Declined => {
            println!("⏭️  Nothing changed");
            Ok(())
        }
        SupplierChange::Rejected(message) => bail!("supplier change rejected: {message}"),
    }
}

/// Read search terms from stdin, one per line, and refresh the table once
/// input has been quiet for the debounce period. Ends on EOF or ctrl-c.
async fn interactive_search(ctx: &CommandContext) -> Result<()> {
    let shutdown = ShutdownCoordinator::new();
    shutdown.install_signal_handlers();

    let mut suppliers = view(ctx, None);
    with_loading(ctx, "suppliers", suppliers.refresh()).await?;
    print_page(ctx, suppliers.list())?;
    println!();
    println!(
        "🔎 Type to search ({}ms debounce). Empty line clears, ctrl-d or ctrl-c exits.",
        ctx.config.ui.search_debounce_ms
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let searching = suppliers.search_pending();
        tokio::select! {
            _ = ShutdownCoordinator::wait_for_shutdown(shutdown.subscribe()) => {
                info!("Leaving supplier search");
                break;
            }
            line = lines.next_line() => {
                match line? {
                    Some(term) => suppliers.type_search(term),
                    None => {
                        // EOF: apply the last term without waiting out the timer
                        let term = suppliers.search_input().to_string();
                        apply(ctx, &mut suppliers, &term).await?;
                        break;
                    }
                }
            }
            term = suppliers.next_search(), if searching => {
                if let Some(term) = term {
                    apply(ctx, &mut suppliers, &term).await?;
                }
            }
        }
    }
    Ok(())
}

async fn apply(ctx: &CommandContext, suppliers: &mut SupplierListView, term: &str) -> Result<()> {
    debug!(term, "Search settled");
    match suppliers.apply_search(term).await {
        Ok(true) => {
            println!();
            print_page(ctx, suppliers.list())
        }
        Ok(false) => Ok(()),
        Err(err) => {
            report_api_error(&err);
            Ok(())
        }
    }
}
