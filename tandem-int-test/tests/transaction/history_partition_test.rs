use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::collections::HashSet;
use tandem::atomic;
use tandem::container::Container;
use tandem::errors::TandemResult;
use tandem::transaction::TransactionsStore;
use tandem_int_test::test_util::{cleanup, create_test_context, run_test};

/// Expected history, tracked alongside the store.
#[derive(Default)]
struct Model {
    current: Vec<(String, i64)>,
    undone: Vec<(String, i64)>,
    value: i64,
}

fn check(store: &TransactionsStore, counter: &Container<serde_json::Value>, model: &Model) {
    let history = store.history();

    let expected_current: Vec<String> = model.current.iter().map(|(id, _)| id.clone()).collect();
    let expected_undone: Vec<String> = model.undone.iter().map(|(id, _)| id.clone()).collect();
    assert_eq!(history.current, expected_current);
    assert_eq!(history.undone, expected_undone);

    // every recorded transaction sits on exactly one stack
    let mut seen = HashSet::new();
    for id in history.current.iter().chain(history.undone.iter()) {
        assert!(seen.insert(id.clone()), "transaction {} is on both stacks", id);
    }

    assert_eq!(store.can_undo(), !model.current.is_empty());
    assert_eq!(store.can_redo(), !model.undone.is_empty());
    assert_eq!(counter.get(), json!({"n": model.value}));
}

fn run_random_operations(store: &TransactionsStore, seed: u64, steps: usize) -> TandemResult<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let counter = Container::new(atomic(json!({"n": 0})));
    let mut model = Model::default();

    for _ in 0..steps {
        match rng.random_range(0..10) {
            0..=4 => {
                let next: i64 = rng.random_range(0..4);
                let before = model.value;
                store.create_transaction(&[counter.clone()], |drafts| {
                    drafts[0]["n"] = json!(next)
                })?;

                if next != before {
                    let id = store
                        .history()
                        .current
                        .last()
                        .cloned()
                        .unwrap_or_default();
                    model.current.push((id, before));
                    model.undone.clear();
                    model.value = next;
                }
            }
            5 | 6 => {
                let undone = store.undo()?;
                assert_eq!(undone, !model.current.is_empty());
                if let Some((id, before)) = model.current.pop() {
                    let after = model.value;
                    model.value = before;
                    model.undone.push((id, after));
                }
            }
            7 | 8 => {
                let redone = store.redo()?;
                assert_eq!(redone, !model.undone.is_empty());
                if let Some((id, after)) = model.undone.pop() {
                    let before = model.value;
                    model.value = after;
                    model.current.push((id, before));
                }
            }
            _ => {
                if rng.random_bool(0.5) {
                    let reverted = store.reset()?;
                    assert_eq!(reverted, model.current.len());
                    while let Some((id, before)) = model.current.pop() {
                        let after = model.value;
                        model.value = before;
                        model.undone.push((id, after));
                    }
                } else {
                    store.clear();
                    model.current.clear();
                    model.undone.clear();
                }
            }
        }
        check(store, &counter, &model);
    }
    Ok(())
}

#[test]
fn test_random_operations_keep_stacks_partitioned() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            for seed in 0..20 {
                store.clear();
                run_random_operations(&store, seed, 200)?;
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
