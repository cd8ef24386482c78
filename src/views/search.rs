use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Debounced search input.
///
/// Each `push` cancels the pending timer and schedules a new one; a value is
/// delivered by `next` only once the input has been quiet for `delay` and no
/// newer value has been pushed since.
#[derive(Debug)]
pub struct SearchDebouncer {
    delay: Duration,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<(u64, String)>,
    rx: mpsc::UnboundedReceiver<(u64, String)>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            delay,
            generation: 0,
            pending: None,
            tx,
            rx,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a keystroke. Must be called inside a tokio runtime.
    pub fn push(&mut self, value: impl Into<String>) {
        self.cancel();

        let generation = self.generation;
        let value = value.into();
        let delay = self.delay;
        let tx = self.tx.clone();
        trace!(generation, "Scheduling debounced search");
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send((generation, value));
        }));
    }

    /// Drop the pending timer, if any. A value it already delivered but
    /// nobody consumed is dropped too.
    pub fn cancel(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// A pushed value has not been consumed or cancelled yet
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Wait for the next settled value. Values superseded by a later push
    /// are skipped even if their timer already fired. Returns `None` at once
    /// when nothing is pending.
    pub async fn next(&mut self) -> Option<String> {
        while self.pending.is_some() {
            let (generation, value) = self.rx.recv().await?;
            if generation == self.generation {
                self.pending = None;
                return Some(value);
            }
        }
        None
    }

    /// Non-blocking variant of `next`
    pub fn try_next(&mut self) -> Option<String> {
        if self.pending.is_none() {
            return None;
        }
        while let Ok((generation, value)) = self.rx.try_recv() {
            if generation == self.generation {
                self.pending = None;
                return Some(value);
            }
        }
        None
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout};

    #[tokio::test(start_paused = true)]
    async fn test_quick_keystrokes_settle_once() {
        let mut debouncer = SearchDebouncer::new(Duration::from_millis(500));
        debouncer.push("a");
        sleep(Duration::from_millis(100)).await;
        debouncer.push("ab");

        assert_eq!(debouncer.next().await.as_deref(), Some("ab"));

        sleep(Duration::from_secs(2)).await;
        assert_eq!(debouncer.try_next(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_fires_before_quiet_period() {
        let mut debouncer = SearchDebouncer::new(Duration::from_millis(500));
        debouncer.push("acme");
        sleep(Duration::from_millis(499)).await;
        assert_eq!(debouncer.try_next(), None);
        assert!(debouncer.is_pending());

        sleep(Duration::from_millis(2)).await;
        assert_eq!(debouncer.try_next().as_deref(), Some("acme"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_pauses_fire_separately() {
        let mut debouncer = SearchDebouncer::new(Duration::from_millis(500));
        debouncer.push("a");
        assert_eq!(debouncer.next().await.as_deref(), Some("a"));
        debouncer.push("ab");
        assert_eq!(debouncer.next().await.as_deref(), Some("ab"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_returns_immediately_when_idle() {
        let mut debouncer = SearchDebouncer::new(Duration::from_millis(500));
        let idle = timeout(Duration::from_secs(3600), debouncer.next()).await;
        assert_eq!(idle, Ok(None));

        debouncer.push("acme");
        assert_eq!(debouncer.next().await.as_deref(), Some("acme"));
        let drained = timeout(Duration::from_secs(3600), debouncer.next()).await;
        assert_eq!(drained, Ok(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_discards_value() {
        let mut debouncer = SearchDebouncer::new(Duration::from_millis(500));
        debouncer.push("north");
        sleep(Duration::from_secs(1)).await;
        debouncer.cancel();
        assert_eq!(debouncer.try_next(), None);
        let idle = timeout(Duration::from_secs(3600), debouncer.next()).await;
        assert_eq!(idle, Ok(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_value() {
        let mut debouncer = SearchDebouncer::new(Duration::from_millis(500));
        debouncer.push("north");
        debouncer.cancel();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(debouncer.try_next(), None);
        assert!(!debouncer.is_pending());
    }
}
