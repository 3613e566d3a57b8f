use serde_json::json;
use std::sync::{Arc, Mutex};
use tandem::transaction::HistoryState;
use tandem::StoreConfig;
use tandem_int_test::test_util::{
    cleanup, create_test_context, create_test_context_with, point, record_states, run_test, state,
};

#[test]
fn test_subscriber_gets_current_state_on_subscribe() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let origin = point(0, 0);
            store.create_transaction(&[origin.container()], |drafts| drafts[0]["x"] = json!(1))?;

            let states = record_states(&store);
            assert_eq!(*states.lock().unwrap(), vec![state(true, false)]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_subscriber_sees_every_history_change() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let states = record_states(&store);
            let origin = point(0, 0);

            store.create_transaction(&[origin.container()], |drafts| drafts[0]["x"] = json!(1))?;
            store.create_transaction(&[origin.container()], |drafts| drafts[0]["x"] = json!(2))?;
            store.undo()?;
            store.reset()?;
            store.redo()?;
            store.clear();

            assert_eq!(
                *states.lock().unwrap(),
                vec![
                    state(false, false),
                    state(true, false),
                    state(true, false),
                    state(true, true),
                    state(false, true),
                    state(true, true),
                    state(false, false),
                ]
            );
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_empty_transaction_still_notifies() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let states = record_states(&store);
            let origin = point(0, 0);

            store.create_transaction(&[origin.container()], |_| {})?;
            assert_eq!(states.lock().unwrap().len(), 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_subscribers_are_called_in_subscription_order() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let order = Arc::new(Mutex::new(Vec::new()));
            for tag in ["first", "second", "third"] {
                let order = order.clone();
                store.subscribe(move |_: &HistoryState| order.lock().unwrap().push(tag));
            }

            order.lock().unwrap().clear();
            store.clear();
            assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_unsubscribe_stops_delivery() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let calls = Arc::new(Mutex::new(0));
            let counter = calls.clone();
            let subscriber = store.subscribe(move |_: &HistoryState| *counter.lock().unwrap() += 1);
            let other = record_states(&store);

            assert!(store.unsubscribe(&subscriber));
            store.clear();

            assert_eq!(*calls.lock().unwrap(), 1);
            assert_eq!(other.lock().unwrap().len(), 2);
            assert!(!store.unsubscribe(&subscriber));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_same_callback_subscribed_twice_is_called_twice() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let calls = Arc::new(Mutex::new(0));
            let callback = {
                let calls = calls.clone();
                move |_: &HistoryState| *calls.lock().unwrap() += 1
            };

            let first = store.subscribe(callback.clone());
            let second = store.subscribe(callback);
            assert_ne!(first, second);

            store.clear();
            assert_eq!(*calls.lock().unwrap(), 4);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_subscriber_can_query_store() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let seen = Arc::new(Mutex::new(Vec::new()));
            let (reader, sink) = (store.clone(), seen.clone());
            store.subscribe(move |state: &HistoryState| {
                sink.lock()
                    .unwrap()
                    .push((state.can_undo == reader.can_undo(), reader.undo_depth()))
            });

            let origin = point(0, 0);
            store.create_transaction(&[origin.container()], |drafts| drafts[0]["x"] = json!(1))?;

            assert_eq!(*seen.lock().unwrap(), vec![(true, 0), (true, 1)]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_quiet_configuration() {
    run_test(
        || {
            create_test_context_with(
                StoreConfig::new()
                    .notify_on_subscribe(false)
                    .skip_redundant_notifications(true),
            )
        },
        |ctx| {
            let store = ctx.store();
            let states = record_states(&store);
            let origin = point(0, 0);

            assert!(states.lock().unwrap().is_empty());
            store.create_transaction(&[origin.container()], |drafts| drafts[0]["x"] = json!(1))?;
            store.create_transaction(&[origin.container()], |drafts| drafts[0]["x"] = json!(2))?;
            store.undo()?;
            store.undo()?;

            assert_eq!(
                *states.lock().unwrap(),
                vec![state(true, false), state(true, true), state(false, true)]
            );
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
