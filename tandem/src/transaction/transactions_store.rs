use super::core::{Transaction, TransactionChange};
use super::ephemeral::EphemeralStaging;
use super::manager::{HistoryState, TransactionsManager};
use crate::common::{
    atomic, Atomic, EventBus, EventCallback, EventListener, ReadExecutor, SubscriberRef,
    WriteExecutor,
};
use crate::container::{Container, ContainerId};
use crate::errors::{ErrorKind, TandemError, TandemResult};
use crate::patch::{FinishedDraft, JsonPatchEngine, PatchEngine};
use crate::store_builder::TransactionsStoreBuilder;
use crate::store_config::StoreConfig;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Transaction ids on both history stacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// Applied transactions, oldest first
    pub current: Vec<String>,
    /// Undone transactions, the next one to redo last
    pub undone: Vec<String>,
}

/// Multi-container transaction builder with undo/redo history.
///
/// A store turns one batch edit over several containers into a single
/// [`Transaction`], stages provisional ("ephemeral") edits per container, and
/// tells subscribers whether undo and redo are available after every history
/// change.
///
/// Handles are cheap to clone and share the same history.
///
/// Mutators, container setters and subscribers run on the calling thread.
/// None of them may record, undo or redo on the same store while it runs.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use tandem::atomic;
/// use tandem::container::Container;
/// use tandem::transaction::TransactionsStore;
///
/// let store = TransactionsStore::new();
/// let user = Container::new(atomic(json!({"age": 99, "name": "ali"})));
///
/// store
///     .create_transaction(&[user.clone()], |drafts| drafts[0]["age"] = json!(100))
///     .unwrap();
/// assert_eq!(user.get(), json!({"age": 100, "name": "ali"}));
///
/// store.undo().unwrap();
/// assert_eq!(user.get(), json!({"age": 99, "name": "ali"}));
/// assert!(store.can_redo());
/// ```
pub struct TransactionsStore<E: PatchEngine = JsonPatchEngine> {
    inner: Arc<TransactionsStoreInner<E>>,
}

impl<E: PatchEngine> Clone for TransactionsStore<E> {
    fn clone(&self) -> Self {
        TransactionsStore {
            inner: self.inner.clone(),
        }
    }
}

impl Default for TransactionsStore<JsonPatchEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionsStore<JsonPatchEngine> {
    /// Creates a store over the default JSON patch engine.
    pub fn new() -> Self {
        Self::from_parts(JsonPatchEngine::new(), StoreConfig::default())
    }

    pub fn builder() -> TransactionsStoreBuilder<JsonPatchEngine> {
        TransactionsStoreBuilder::new()
    }
}

impl<E: PatchEngine + 'static> TransactionsStore<E> {
    pub fn with_engine(engine: E) -> Self {
        Self::from_parts(engine, StoreConfig::default())
    }

    pub(crate) fn from_parts(engine: E, config: StoreConfig) -> Self {
        let engine = Arc::new(engine);
        TransactionsStore {
            inner: Arc::new(TransactionsStoreInner {
                manager: Mutex::new(TransactionsManager::new(engine.clone())),
                engine,
                config,
                staging: EphemeralStaging::new(),
                subscribers: EventBus::new(),
                state: atomic(HistoryState::default()),
                last_delivered: atomic(HistoryState::default()),
            }),
        }
    }

    pub fn engine(&self) -> &E {
        &self.inner.engine
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Runs `mutator` over drafts of `containers` and records the result as one transaction.
    ///
    /// Drafts are passed in the order of `containers`. Containers whose draft
    /// was left unchanged are not part of the transaction; if none changed,
    /// nothing is recorded. Subscribers are notified either way.
    ///
    /// Fails without writing anything if a container is listed twice or if a
    /// changed container has staged ephemeral updates.
    pub fn create_transaction(
        &self,
        containers: &[Container<E::Value>],
        mutator: impl FnOnce(&mut [E::Draft]),
    ) -> TandemResult<()> {
        self.record(containers, false, |drafts| {
            mutator(drafts);
            Ok(())
        })
        .map(|_| ())
    }

    /// Runs `mutator` over drafts of `containers` and writes the result straight
    /// into the containers, outside of history.
    ///
    /// The first ephemeral edit of a container stages its previous value as the
    /// baseline that [`commit_ephemeral_updates`](Self::commit_ephemeral_updates)
    /// and [`discard_ephemeral_updates`](Self::discard_ephemeral_updates) work
    /// from; later edits keep that baseline. Subscribers are not notified.
    pub fn create_ephemeral_transaction(
        &self,
        containers: &[Container<E::Value>],
        mutator: impl FnOnce(&mut [E::Draft]),
    ) -> TandemResult<()> {
        self.record(containers, true, |drafts| {
            mutator(drafts);
            Ok(())
        })
        .map(|_| ())
    }

    /// Like [`create_transaction`](Self::create_transaction), for mutators that can fail.
    ///
    /// A mutator error is returned as [`ErrorKind::MutatorFailed`] and leaves
    /// every container untouched.
    pub fn try_create_transaction(
        &self,
        containers: &[Container<E::Value>],
        ephemeral: bool,
        mutator: impl FnOnce(&mut [E::Draft]) -> anyhow::Result<()>,
    ) -> TandemResult<()> {
        self.record(containers, ephemeral, |drafts| {
            mutator(drafts).map_err(|err| {
                log::error!("Mutator failed: {:#}", err);
                TandemError::from(err)
            })
        })
        .map(|_| ())
    }

    /// Collapses the staged ephemeral edits of `container` into one transaction.
    ///
    /// The transaction takes the container from its staged baseline to its
    /// current value. If recording fails the container keeps its live value
    /// and its baseline stays staged.
    pub fn commit_ephemeral_updates(&self, container: &Container<E::Value>) -> TandemResult<()> {
        let baseline = self.take_baseline(container, "commit")?;
        let live = container.get();
        container.set(baseline.clone());

        let committed = live.clone();
        let result = self.record(std::slice::from_ref(container), false, move |drafts| {
            if let Some(draft) = drafts.first_mut() {
                **draft = committed;
            }
            Ok(())
        });

        match result {
            Ok(true) => {
                log::debug!("Committed ephemeral updates of container {}", container.id());
                Ok(())
            }
            Ok(false) => {
                log::warn!(
                    "Ephemeral updates of container {} cancel out, nothing recorded",
                    container.id()
                );
                Ok(())
            }
            Err(err) => {
                container.set(live);
                self.inner.staging.stage(container.id(), baseline);
                Err(err)
            }
        }
    }

    /// Restores `container` to its staged baseline without recording anything.
    pub fn discard_ephemeral_updates(&self, container: &Container<E::Value>) -> TandemResult<()> {
        let baseline = self.take_baseline(container, "discard")?;
        container.set(baseline);
        log::debug!("Discarded ephemeral updates of container {}", container.id());
        Ok(())
    }

    pub fn has_ephemeral_updates(&self, container: &Container<E::Value>) -> bool {
        self.inner.staging.contains(&container.id())
    }

    /// Forgets the staged baseline of `container` and returns it.
    ///
    /// The container keeps its live value. Use this before dropping a container
    /// whose ephemeral edits will never be committed or discarded.
    pub fn release_ephemeral_updates(&self, container: &Container<E::Value>) -> Option<E::Value> {
        let released = self.inner.staging.take(&container.id());
        if released.is_some() {
            log::debug!("Released ephemeral baseline of container {}", container.id());
        }
        released
    }

    /// Returns the value `container` has in history: its staged baseline while
    /// it has ephemeral updates, its live value otherwise.
    pub fn committed_value(&self, container: &Container<E::Value>) -> E::Value {
        self.inner
            .staging
            .baseline(&container.id())
            .unwrap_or_else(|| container.get())
    }

    /// Reverts the most recent transaction. Returns `false` if there was none.
    ///
    /// Fails without writing anything if the transaction touches a container
    /// with staged ephemeral updates.
    pub fn undo(&self) -> TandemResult<bool> {
        let undone = {
            let mut manager = self.inner.manager.lock();
            self.ensure_unstaged(manager.current().last(), "undo")?;
            manager.undo()?
        };
        self.publish();
        Ok(undone)
    }

    /// Reapplies the most recently undone transaction. Returns `false` if there was none.
    ///
    /// Fails without writing anything if the transaction touches a container
    /// with staged ephemeral updates.
    pub fn redo(&self) -> TandemResult<bool> {
        let redone = {
            let mut manager = self.inner.manager.lock();
            self.ensure_unstaged(manager.undone().last(), "redo")?;
            manager.redo()?
        };
        self.publish();
        Ok(redone)
    }

    /// Reverts every applied transaction, keeping all of them redoable.
    ///
    /// Fails without reverting anything if any applied transaction touches a
    /// container with staged ephemeral updates.
    pub fn reset(&self) -> TandemResult<usize> {
        let result = {
            let mut manager = self.inner.manager.lock();
            for transaction in manager.current() {
                self.ensure_unstaged(Some(transaction), "reset")?;
            }
            manager.reset()
        };
        // a failed reset may still have reverted some transactions
        self.publish();
        result
    }

    /// Forgets the history. Container values and staged ephemeral edits are kept.
    pub fn clear(&self) {
        self.inner.manager.lock().clear();
        self.publish();
    }

    pub fn can_undo(&self) -> bool {
        self.history_state().can_undo
    }

    pub fn can_redo(&self) -> bool {
        self.history_state().can_redo
    }

    pub fn history_state(&self) -> HistoryState {
        self.inner.state.read_with(|state| *state)
    }

    pub fn undo_depth(&self) -> usize {
        self.inner.manager.lock().current().len()
    }

    pub fn redo_depth(&self) -> usize {
        self.inner.manager.lock().undone().len()
    }

    pub fn history(&self) -> HistorySnapshot {
        let manager = self.inner.manager.lock();
        HistorySnapshot {
            current: transaction_ids(manager.current()),
            undone: transaction_ids(manager.undone()),
        }
    }

    /// Registers `callback` for history state changes.
    ///
    /// Unless disabled in [`StoreConfig`], the callback is invoked right away
    /// with the current state.
    pub fn subscribe(&self, callback: impl EventCallback<HistoryState> + 'static) -> SubscriberRef {
        let listener = EventListener::new(callback);
        let subscriber = self.inner.subscribers.register(listener.clone());
        if self.inner.config.is_notify_on_subscribe() {
            listener.handle(&self.history_state());
        }
        subscriber
    }

    /// Removes a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, subscriber: &SubscriberRef) -> bool {
        self.inner.subscribers.deregister(subscriber)
    }

    fn record(
        &self,
        containers: &[Container<E::Value>],
        ephemeral: bool,
        mutator: impl FnOnce(&mut [E::Draft]) -> TandemResult<()>,
    ) -> TandemResult<bool> {
        let mut seen = HashSet::with_capacity(containers.len());
        for container in containers {
            if !seen.insert(container.id()) {
                log::error!("Container {} is listed twice in one transaction", container.id());
                return Err(TandemError::new(
                    &format!("Container {} is listed twice in one transaction", container.id()),
                    ErrorKind::DuplicateContainer,
                ));
            }
        }

        let engine = &self.inner.engine;
        let bases: Vec<E::Value> = containers.iter().map(|container| container.get()).collect();
        let mut drafts: Vec<E::Draft> =
            bases.iter().map(|base| engine.create_draft(base)).collect();
        mutator(drafts.as_mut_slice())?;

        let mut changed = Vec::with_capacity(containers.len());
        for ((container, base), draft) in containers.iter().zip(bases).zip(drafts) {
            let finished = engine.finish_draft(draft)?;
            if finished.is_empty() {
                log::trace!("Container {} is unchanged", container.id());
                continue;
            }
            changed.push((container, base, finished));
        }

        if ephemeral {
            self.stage(changed);
            return Ok(false);
        }

        for (container, _, _) in &changed {
            self.ensure_not_staged(container.id(), "record a transaction on")?;
        }

        let mut transaction = Transaction::new();
        for (container, _, finished) in changed {
            log::trace!(
                "Container {} changed with {} patches",
                container.id(),
                finished.patches.len()
            );
            transaction.add(TransactionChange::new(
                container.clone(),
                finished.patches,
                finished.reverse_patches,
            )?)?;
        }

        let recorded = self.inner.manager.lock().add(transaction)?;
        self.publish();
        Ok(recorded)
    }

    fn ensure_unstaged(
        &self,
        transaction: Option<&Transaction<E>>,
        action: &str,
    ) -> TandemResult<()> {
        match transaction {
            Some(transaction) => transaction
                .changes()
                .iter()
                .try_for_each(|change| self.ensure_not_staged(change.container().id(), action)),
            None => Ok(()),
        }
    }

    fn ensure_not_staged(&self, id: ContainerId, action: &str) -> TandemResult<()> {
        if !self.inner.staging.contains(&id) {
            return Ok(());
        }
        log::error!("Cannot {} container {}: uncommitted ephemeral updates", action, id);
        Err(TandemError::new(
            &format!(
                "Container {} has uncommitted ephemeral updates, commit or discard them first",
                id
            ),
            ErrorKind::UncommittedEphemeralUpdate,
        ))
    }

    fn stage(
        &self,
        changed: Vec<(&Container<E::Value>, E::Value, FinishedDraft<E::Value, E::Patch>)>,
    ) {
        for (container, base, finished) in changed {
            container.set(finished.value);
            if self.inner.staging.stage(container.id(), base) {
                log::debug!("Staged ephemeral baseline of container {}", container.id());
            }
        }
    }

    fn take_baseline(
        &self,
        container: &Container<E::Value>,
        action: &str,
    ) -> TandemResult<E::Value> {
        self.inner.staging.take(&container.id()).ok_or_else(|| {
            log::error!("Cannot {} container {}: no ephemeral updates", action, container.id());
            TandemError::new(
                &format!("Container {} has no ephemeral updates to {}", container.id(), action),
                ErrorKind::NoEphemeralUpdates,
            )
        })
    }

    fn publish(&self) {
        let state = self.inner.manager.lock().state();
        self.inner.state.write_with(|cached| *cached = state);

        if self.inner.config.is_skip_redundant_notifications() {
            let redundant = self
                .inner
                .last_delivered
                .write_with(|last| std::mem::replace(last, state) == state);
            if redundant {
                return;
            }
        }
        self.inner.subscribers.publish(&state);
    }
}

impl<E: PatchEngine> Debug for TransactionsStore<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionsStore")
            .field("config", &self.inner.config)
            .field("staging", &self.inner.staging)
            .field("subscribers", &self.inner.subscribers)
            .finish()
    }
}

struct TransactionsStoreInner<E: PatchEngine> {
    engine: Arc<E>,
    config: StoreConfig,
    manager: Mutex<TransactionsManager<E>>,
    staging: EphemeralStaging<E::Value>,
    subscribers: EventBus<HistoryState>,
    state: Atomic<HistoryState>,
    last_delivered: Atomic<HistoryState>,
}

fn transaction_ids<E: PatchEngine>(transactions: &[Transaction<E>]) -> Vec<String> {
    transactions
        .iter()
        .map(|transaction| transaction.id().to_string())
        .collect()
}
