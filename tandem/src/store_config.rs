/// Configuration of a [`TransactionsStore`](crate::transaction::TransactionsStore).
///
/// # Examples
///
/// ```rust
/// use tandem::StoreConfig;
///
/// let config = StoreConfig::new().skip_redundant_notifications(true);
/// assert!(config.is_notify_on_subscribe());
/// assert!(config.is_skip_redundant_notifications());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    notify_on_subscribe: bool,
    skip_redundant_notifications: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            notify_on_subscribe: true,
            skip_redundant_notifications: false,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver the current history state to a subscriber as soon as it subscribes.
    pub fn notify_on_subscribe(mut self, enabled: bool) -> Self {
        self.notify_on_subscribe = enabled;
        self
    }

    /// Only notify subscribers when the history state differs from the last one delivered.
    pub fn skip_redundant_notifications(mut self, enabled: bool) -> Self {
        self.skip_redundant_notifications = enabled;
        self
    }

    pub fn is_notify_on_subscribe(&self) -> bool {
        self.notify_on_subscribe
    }

    pub fn is_skip_redundant_notifications(&self) -> bool {
        self.skip_redundant_notifications
    }
}
