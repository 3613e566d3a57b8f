//! Store fixtures

use crate::data_gen::generate_user;
use serde_json::Value;
use tandem::container::{Container, ObservableStore};
use tandem::transaction::TransactionsStore;

/// Installs a logger once; benchmarks run with `RUST_LOG` unset by default.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A store together with the containers it edits
pub struct BenchContext {
    pub store: TransactionsStore,
    pub users: Vec<ObservableStore<Value>>,
}

impl BenchContext {
    pub fn containers(&self) -> Vec<Container<Value>> {
        self.users.iter().map(|user| user.container()).collect()
    }
}

pub fn create_context(user_count: usize) -> BenchContext {
    BenchContext {
        store: TransactionsStore::new(),
        users: (0..user_count)
            .map(|id| ObservableStore::new(generate_user(id)))
            .collect(),
    }
}

/// Records `count` single-container transactions bumping the user's age.
pub fn fill_history(ctx: &BenchContext, count: usize) {
    let containers = ctx.containers();
    if containers.is_empty() {
        return;
    }
    for step in 0..count {
        let target = &containers[step % containers.len()];
        let result = ctx.store.create_transaction(std::slice::from_ref(target), |drafts| {
            let age = drafts[0]["age"].as_i64().unwrap_or_default();
            drafts[0]["age"] = Value::from(age + 1);
        });
        if let Err(err) = result {
            log::warn!("Failed to record transaction {}: {}", step, err);
        }
    }
}
