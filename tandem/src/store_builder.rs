use crate::patch::{JsonPatchEngine, PatchEngine};
use crate::store_config::StoreConfig;
use crate::transaction::TransactionsStore;

/// Builder for [`TransactionsStore`].
///
/// # Examples
///
/// ```rust
/// use tandem::patch::{ArrayDiff, JsonPatchConfig, JsonPatchEngine};
/// use tandem::transaction::TransactionsStore;
///
/// let store = TransactionsStore::builder()
///     .engine(JsonPatchEngine::with_config(
///         JsonPatchConfig::new().array_diff(ArrayDiff::Replace),
///     ))
///     .notify_on_subscribe(false)
///     .build();
/// assert!(!store.config().is_notify_on_subscribe());
/// ```
pub struct TransactionsStoreBuilder<E: PatchEngine = JsonPatchEngine> {
    engine: E,
    config: StoreConfig,
}

impl Default for TransactionsStoreBuilder<JsonPatchEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionsStoreBuilder<JsonPatchEngine> {
    pub fn new() -> Self {
        TransactionsStoreBuilder {
            engine: JsonPatchEngine::new(),
            config: StoreConfig::new(),
        }
    }
}

impl<E: PatchEngine + 'static> TransactionsStoreBuilder<E> {
    /// Swaps the patch engine, keeping the configuration.
    pub fn engine<F: PatchEngine + 'static>(self, engine: F) -> TransactionsStoreBuilder<F> {
        TransactionsStoreBuilder {
            engine,
            config: self.config,
        }
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn notify_on_subscribe(mut self, enabled: bool) -> Self {
        self.config = self.config.notify_on_subscribe(enabled);
        self
    }

    pub fn skip_redundant_notifications(mut self, enabled: bool) -> Self {
        self.config = self.config.skip_redundant_notifications(enabled);
        self
    }

    pub fn build(self) -> TransactionsStore<E> {
        TransactionsStore::from_parts(self.engine, self.config)
    }
}
