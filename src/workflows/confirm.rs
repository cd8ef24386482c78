/// Asks the user to confirm a workflow action before any request is sent
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirms everything (`--yes` and tests)
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Declines everything
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclineAll;

impl Confirmer for DeclineAll {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}
