use serde_json::{json, Value};
use std::backtrace::Backtrace;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tandem::container::ObservableStore;
use tandem::errors::{ErrorKind, TandemError, TandemResult};
use tandem::transaction::{HistoryState, TransactionsStore};
use tandem::StoreConfig;

/// Runs a test between a setup and a teardown step.
/// `after` runs even when `test` fails, and any failure or panic is reported with
/// the elapsed time before the test is failed.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> TandemResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> TandemResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> TandemResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx)
                    .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let elapsed = start_time.elapsed();
    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((e, bt))) => (e, bt),
        Err(panic_err) => {
            let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            (format!("Panic: {}", err_msg), String::new())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", elapsed);
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("Test failed. Error: {}", error);
}

#[derive(Clone)]
pub struct TestContext {
    store: TransactionsStore,
}

impl TestContext {
    pub fn new(store: TransactionsStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> TransactionsStore {
        self.store.clone()
    }
}

pub fn create_test_context() -> TandemResult<TestContext> {
    Ok(TestContext::new(TransactionsStore::new()))
}

pub fn create_test_context_with(config: StoreConfig) -> TandemResult<TestContext> {
    Ok(TestContext::new(
        TransactionsStore::builder().config(config).build(),
    ))
}

/// Drops the history and checks that it is gone.
pub fn cleanup(ctx: TestContext) -> TandemResult<()> {
    let store = ctx.store();
    store.clear();
    if store.can_undo() || store.can_redo() {
        return Err(TandemError::new(
            "History is not empty after clear",
            ErrorKind::InternalError,
        ));
    }
    Ok(())
}

pub fn user(age: u32, name: &str) -> ObservableStore<Value> {
    ObservableStore::new(json!({"age": age, "name": name}))
}

pub fn point(x: i64, y: i64) -> ObservableStore<Value> {
    ObservableStore::new(json!({"x": x, "y": y}))
}

/// Subscribes to `store` and collects every delivered state.
pub fn record_states(store: &TransactionsStore) -> Arc<Mutex<Vec<HistoryState>>> {
    let states = Arc::new(Mutex::new(Vec::new()));
    let sink = states.clone();
    store.subscribe(move |state: &HistoryState| {
        if let Ok(mut states) = sink.lock() {
            states.push(*state);
        }
    });
    states
}

pub fn state(can_undo: bool, can_redo: bool) -> HistoryState {
    HistoryState { can_undo, can_redo }
}
