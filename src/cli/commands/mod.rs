use anyhow::Result;
use std::future::Future;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use crate::api::client::InventoryApi;
use crate::api::errors::ApiError;
use crate::config::InventoryAdminConfig;
use crate::workflows::confirm::{AutoConfirm, Confirmer};
use crate::workflows::errors::WorkflowError;
use crate::workflows::state_machine::TransitionResult;

pub mod demo;
pub mod orders;
pub mod products;
pub mod suppliers;

/// Everything a command needs: the backend handle, settings, and how to
/// ask the user for confirmation.
pub struct CommandContext {
    pub api: Arc<dyn InventoryApi>,
    pub config: InventoryAdminConfig,
    pub confirmer: Box<dyn Confirmer>,
    pub json: bool,
}

impl CommandContext {
    pub fn new(
        api: Arc<dyn InventoryApi>,
        config: InventoryAdminConfig,
        assume_yes: bool,
        json: bool,
    ) -> Self {
        let confirmer: Box<dyn Confirmer> = if assume_yes {
            Box::new(AutoConfirm)
        } else {
            Box::new(StdinConfirmer)
        };
        Self {
            api,
            config,
            confirmer,
            json,
        }
    }

    pub fn page_size(&self, limit: Option<u32>) -> u32 {
        limit.unwrap_or(self.config.ui.page_size).max(1)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.config.ui.search_debounce_ms)
    }

    fn indicator(&self, text: &str) {
        if self.json {
            eprint!("{text}");
            let _ = std::io::stderr().flush();
        } else {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
    }
}

/// y/N prompt on the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        print!("❓ {prompt} [y/N] ");
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

/// Show "🔄 Loading ..." until the first response arrives, then ✅ or ❌.
/// With `--json` the indicator goes to stderr so stdout stays parseable.
pub async fn with_loading<T, E, Fut>(ctx: &CommandContext, what: &str, fut: Fut) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    ctx.indicator(&format!("🔄 Loading {what}... "));
    let result = fut.await;
    ctx.indicator(if result.is_ok() { "✅\n" } else { "❌\n" });
    result
}

pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a workflow outcome the way every order command reports it
pub fn report_transition(action: &str, result: &TransitionResult) {
    match result {
        TransitionResult::Success {
            previous_status,
            new_status,
        } => {
            println!("✅ {action}: {previous_status} → {new_status}");
        }
        TransitionResult::Rejected {
            message,
            current_status,
            ..
        } => {
            println!("❌ {action} rejected by the backend: {message}");
            println!("   🔄 Re-fetched order; current status is {current_status}");
        }
        TransitionResult::Declined => {
            println!("⏭️  {action} cancelled; nothing was sent");
        }
    }
}

/// Inline error block. Not-found errors point back at the list instead of
/// leaving the user on a dead detail view.
pub fn report_error(err: &WorkflowError) {
    match err {
        WorkflowError::Api(api_err) => report_api_error(api_err),
        WorkflowError::Validation(message) => {
            println!("⚠️  {message}");
        }
        WorkflowError::ActionUnavailable { action, status } => {
            println!("⚠️  '{action}' is not available while the order is {status}");
        }
    }
}

pub fn report_api_error(err: &ApiError) {
    println!("❌ {}", err.user_message());
    println!();
    println!("{}", err.troubleshooting());
}

pub async fn show_how_to_get_started() -> Result<()> {
    println!("📦 inventory-admin - Purchase order and supplier console");
    println!();
    println!("Purchase orders:");
    println!("  📋 inventory-admin orders list            # Browse orders");
    println!("  🔍 inventory-admin orders show <id>       # Line items and actions");
    println!("  ✅ inventory-admin orders approve <id>    # Approve a pending order");
    println!("  📦 inventory-admin orders receive-all <id>");
    println!();
    println!("Directory:");
    println!("  🏭 inventory-admin suppliers list");
    println!("  🔎 inventory-admin suppliers search       # Live search");
    println!("  🛒 inventory-admin products list");
    println!();
    println!("💡 Try 'inventory-admin demo' to see a full order lifecycle without a backend");
    Ok(())
}
