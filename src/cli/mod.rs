use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;
pub mod render;

#[derive(Parser)]
#[command(name = "inventory-admin")]
#[command(version)]
#[command(about = "Back-office console for purchase orders, suppliers and products")]
#[command(long_about = "inventory-admin drives an inventory backend over its REST API: browse \
                       paginated purchase orders, suppliers and products, and move purchase orders \
                       through draft → pending → approved → received. Start with \
                       'inventory-admin orders list'.")]
pub struct Cli {
    /// Skip confirmation prompts for workflow actions
    #[arg(short = 'y', long, global = true, help = "Answer yes to every confirmation prompt")]
    pub yes: bool,
    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true, help = "Emit JSON on stdout instead of tables")]
    pub json: bool,
    /// Configuration file
    #[arg(long, global = true, default_value = "inventory-admin.toml")]
    pub config: PathBuf,
    /// Override api.base_url from the config file
    #[arg(long, global = true, help = "Backend base URL, e.g. http://localhost:3000/api")]
    pub base_url: Option<String>,
    /// Run against a built-in in-memory backend with sample data
    #[arg(long, global = true, help = "Use the in-memory sample backend instead of HTTP")]
    pub sample_backend: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse and drive purchase orders
    #[command(subcommand)]
    Orders(OrderCommands),
    /// Manage the supplier directory
    #[command(subcommand)]
    Suppliers(SupplierCommands),
    /// Browse the product catalog
    #[command(subcommand)]
    Products(ProductCommands),
    /// Walk through a complete purchase order lifecycle against sample data
    Demo,
    /// Write the effective configuration to a file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Rows per page (defaults to ui.page_size)
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// List purchase orders
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Only orders in this status (draft, pending, approved, received, cancelled)
        #[arg(long)]
        status: Option<String>,
        /// Only orders for this supplier id
        #[arg(long)]
        supplier: Option<String>,
    },
    /// Show one purchase order with its line items and available actions
    Show { id: String },
    /// Create a draft purchase order
    Create {
        /// Supplier id
        #[arg(long)]
        supplier: Option<String>,
        /// Line item as PRODUCT_ID:QUANTITY:UNIT_COST (cost in minor units); repeatable
        #[arg(long = "item", value_name = "PRODUCT:QTY:COST")]
        items: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Expected delivery date (YYYY-MM-DD)
        #[arg(long)]
        expected: Option<String>,
    },
    /// Edit header fields of a draft or pending order
    Update {
        id: String,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Expected delivery date (YYYY-MM-DD)
        #[arg(long)]
        expected: Option<String>,
    },
    /// Submit a draft for approval
    Submit { id: String },
    /// Approve a pending order
    Approve { id: String },
    /// Cancel an order that has not been received
    Cancel { id: String },
    /// Receive units of one line item
    Receive {
        id: String,
        /// Line item id
        #[arg(long)]
        item: String,
        #[arg(long)]
        quantity: u32,
    },
    /// Receive every outstanding unit
    ReceiveAll { id: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct SupplierFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub contact: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Mark the supplier inactive
    #[arg(long, conflicts_with = "active")]
    pub inactive: bool,
    /// Mark the supplier active
    #[arg(long)]
    pub active: bool,
}

#[derive(Subcommand)]
pub enum SupplierCommands {
    /// List suppliers
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Only active (true) or inactive (false) suppliers
        #[arg(long)]
        active: Option<bool>,
        /// Case-insensitive name search
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one supplier
    Show { id: String },
    /// Add a supplier
    Create {
        #[command(flatten)]
        fields: SupplierFields,
    },
    /// Edit a supplier; omitted fields keep their current value
    Update {
        id: String,
        #[command(flatten)]
        fields: SupplierFields,
    },
    /// Delete a supplier
    Delete { id: String },
    /// Interactive search: type a term per line, results refresh once typing settles
    Search,
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// List products
    List {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
}
