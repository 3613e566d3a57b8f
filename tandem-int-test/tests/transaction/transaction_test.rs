use serde_json::json;
use tandem::atomic;
use tandem::container::{Container, FnContainer};
use tandem::errors::ErrorKind;
use tandem::patch::{ArrayDiff, JsonPatchConfig, JsonPatchEngine};
use tandem::transaction::TransactionsStore;
use tandem_int_test::test_util::{cleanup, create_test_context, point, run_test, user};

// ==================== Undo / Redo ====================

#[test]
fn test_undo_redo_single_field() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let ali = user(99, "ali");
            let container = ali.container();

            store.create_transaction(&[container.clone()], |drafts| {
                drafts[0]["age"] = json!(100)
            })?;
            assert_eq!(ali.get(), json!({"age": 100, "name": "ali"}));

            assert!(store.undo()?);
            assert_eq!(ali.get(), json!({"age": 99, "name": "ali"}));

            assert!(store.redo()?);
            assert_eq!(ali.get(), json!({"age": 100, "name": "ali"}));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_undo_reverts_all_containers_at_once() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let ali = user(30, "ali");
            let origin = point(0, 0);

            store.create_transaction(&[ali.container(), origin.container()], |drafts| {
                drafts[0]["name"] = json!("ali baba");
                drafts[1]["x"] = json!(10);
                drafts[1]["y"] = json!(-3);
            })?;
            assert_eq!(store.undo_depth(), 1);

            store.undo()?;
            assert_eq!(ali.get(), json!({"age": 30, "name": "ali"}));
            assert_eq!(origin.get(), json!({"x": 0, "y": 0}));
            assert!(!store.can_undo());
            assert!(store.can_redo());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_undo_redo_on_empty_history_are_no_ops() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            assert!(!store.undo()?);
            assert!(!store.redo()?);
            assert_eq!(store.reset()?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_new_transaction_after_undo_drops_redo() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let counter = Container::new(atomic(json!({"n": 0})));

            store.create_transaction(&[counter.clone()], |drafts| drafts[0]["n"] = json!(1))?;
            store.undo()?;
            assert!(store.can_redo());

            store.create_transaction(&[counter.clone()], |drafts| drafts[0]["n"] = json!(2))?;
            assert!(!store.can_redo());
            assert_eq!(store.redo_depth(), 0);
            assert!(!store.redo()?);
            assert_eq!(counter.get(), json!({"n": 2}));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_empty_mutator_is_not_recorded() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let ali = user(99, "ali");

            store.create_transaction(&[ali.container()], |_| {})?;
            store.create_transaction(&[ali.container()], |drafts| {
                drafts[0]["age"] = json!(99)
            })?;

            assert!(!store.can_undo());
            assert!(store.history().current.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_reset_then_redo_in_original_order() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let list = Container::new(atomic(json!([])));

            for item in ["a", "b", "c"] {
                store.create_transaction(&[list.clone()], |drafts| {
                    if let Some(items) = drafts[0].as_array_mut() {
                        items.push(json!(item));
                    }
                })?;
            }

            assert_eq!(store.reset()?, 3);
            assert_eq!(list.get(), json!([]));
            assert!(!store.can_undo());

            store.redo()?;
            assert_eq!(list.get(), json!(["a"]));
            store.redo()?;
            assert_eq!(list.get(), json!(["a", "b"]));
            store.redo()?;
            assert_eq!(list.get(), json!(["a", "b", "c"]));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_clear_keeps_values() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let origin = point(0, 0);

            store.create_transaction(&[origin.container()], |drafts| drafts[0]["x"] = json!(4))?;
            store.clear();

            assert!(!store.can_undo());
            assert!(!store.can_redo());
            assert_eq!(origin.get(), json!({"x": 4, "y": 0}));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

// ==================== Failures ====================

#[test]
fn test_duplicate_container_is_rejected() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let ali = user(1, "ali");

            let result = store.create_transaction(&[ali.container(), ali.container()], |drafts| {
                drafts[0]["age"] = json!(2)
            });

            assert_eq!(result.unwrap_err().kind(), &ErrorKind::DuplicateContainer);
            assert_eq!(ali.get(), json!({"age": 1, "name": "ali"}));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_failing_mutator_changes_nothing() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let ali = user(1, "ali");
            let origin = point(0, 0);

            let result = store.try_create_transaction(
                &[ali.container(), origin.container()],
                false,
                |drafts| {
                    drafts[0]["age"] = json!(2);
                    drafts[1]["x"] = json!(2);
                    Err(anyhow::anyhow!("age must not change"))
                },
            );

            let err = result.unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::MutatorFailed);
            assert!(err.message().contains("age must not change"));
            assert_eq!(ali.get(), json!({"age": 1, "name": "ali"}));
            assert_eq!(origin.get(), json!({"x": 0, "y": 0}));
            assert!(!store.can_undo());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_successful_fallible_mutator_records() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let ali = user(1, "ali");

            store.try_create_transaction(&[ali.container()], false, |drafts| {
                drafts[0]["age"] = json!(2);
                Ok(())
            })?;

            assert!(store.can_undo());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_undo_failure_keeps_history() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let counter = Container::new(atomic(json!({"n": 0})));

            store.create_transaction(&[counter.clone()], |drafts| drafts[0]["n"] = json!(1))?;
            // changed behind the store's back
            counter.set(json!("not an object"));

            let err = store.undo().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidPatch);
            assert!(store.can_undo());
            assert!(!store.can_redo());
            assert_eq!(counter.get(), json!("not an object"));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

// ==================== Containers and engines ====================

#[test]
fn test_closure_adapter_participates() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let backing = atomic(json!({"title": "draft"}));
            let (read, write) = (backing.clone(), backing.clone());
            let container = Container::new(FnContainer::new(
                move || read.read().clone(),
                move |value: serde_json::Value| *write.write() = value,
            ));

            store.create_transaction(&[container.clone()], |drafts| {
                drafts[0]["title"] = json!("final")
            })?;
            assert_eq!(*backing.read(), json!({"title": "final"}));

            store.undo()?;
            assert_eq!(*backing.read(), json!({"title": "draft"}));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_array_replace_engine() {
    let store = TransactionsStore::with_engine(JsonPatchEngine::with_config(
        JsonPatchConfig::new().array_diff(ArrayDiff::Replace),
    ));
    let list = Container::new(atomic(json!({"items": [1, 2, 3]})));

    store
        .create_transaction(&[list.clone()], |drafts| drafts[0]["items"] = json!([3, 1]))
        .unwrap();
    assert_eq!(list.get(), json!({"items": [3, 1]}));

    store.undo().unwrap();
    assert_eq!(list.get(), json!({"items": [1, 2, 3]}));
}

#[test]
fn test_root_value_replacement() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let value = Container::new(atomic(json!(null)));

            store.create_transaction(&[value.clone()], |drafts| {
                *drafts[0] = json!({"created": true})
            })?;
            assert_eq!(value.get(), json!({"created": true}));

            store.undo()?;
            assert_eq!(value.get(), json!(null));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
