use anyhow::Result;
use std::sync::Arc;

use crate::cli::commands::{print_json, with_loading, CommandContext};
use crate::cli::render;
use crate::cli::{PageArgs, ProductCommands};
use crate::views::list::{ListView, ProductListFilters, ProductSource};

pub async fn run(ctx: &CommandContext, command: ProductCommands) -> Result<()> {
    match command {
        ProductCommands::List {
            page,
            category,
            search,
        } => {
            let filters = ProductListFilters { category, search };
            let mut view = ListView::new(
                Arc::clone(&ctx.api),
                ProductSource,
                ctx.page_size(page.limit),
            )
            .with_filters(filters)
            .with_page(page.page);
            with_loading(ctx, "products", view.refresh()).await?;

            if ctx.json {
                return print_json(&render::page_json(view.rows(), view.state()));
            }
            if view.rows().is_empty() {
                println!("🛒 No products match");
            } else {
                print!("{}", render::product_table(view.rows()));
            }
            println!();
            println!("{}", render::pagination_footer(view.state()));
            Ok(())
        }
    }
}
