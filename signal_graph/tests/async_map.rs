use any_spawner::Executor;
use futures::{
    channel::{mpsc, oneshot},
    StreamExt,
};
use signal_graph::{
    computed::{
        map_async, map_async_local, map_async_tracked, map_async_with,
        AsyncOptions, CancellationToken, IdleTracker,
    },
    prelude::*,
    signal::Mutable,
    subscription::Subscription,
};
use std::{
    collections::HashMap,
    rc::Rc,
    sync::{Arc, Mutex},
    time::Duration,
};

pub async fn tick() {
    tokio::time::sleep(Duration::from_micros(1)).await;
}

/// Forwards every value of `signal` into a channel.
fn notifications<T>(
    signal: impl Into<signal_graph::signal::Signal<T>>,
) -> (Subscription, mpsc::UnboundedReceiver<T>)
where
    T: Clone + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::unbounded();
    let sub = Subscription::new(signal, move |value| {
        _ = tx.unbounded_send(value);
    });
    (sub, rx)
}

#[tokio::test]
async fn map_async_computes_on_creation_and_on_change() {
    _ = Executor::init_tokio();

    let input = Mutable::new(1);
    let value = map_async(&input, 0, |n| async move { n * 10 });
    assert_eq!(value.get(), 0);
    assert!(value.is_loading());

    value.ready().await;
    assert_eq!(value.get(), 10);
    assert!(!value.is_loading());

    input.set(2);
    value.ready().await;
    assert_eq!(value.get(), 20);
}

#[tokio::test]
async fn last_completion_wins() {
    _ = Executor::init_tokio();

    let (first_tx, first_rx) = oneshot::channel::<&'static str>();
    let (second_tx, second_rx) = oneshot::channel::<&'static str>();
    let pending = Arc::new(Mutex::new(HashMap::from([
        (1, first_rx),
        (2, second_rx),
    ])));

    let input = Mutable::new(0_u32);
    let value = map_async(&input, "initial", move |n: u32| {
        let gate = pending.lock().unwrap().remove(&n);
        async move {
            match gate {
                Some(gate) => gate.await.unwrap_or("dropped"),
                None => "immediate",
            }
        }
    });
    value.ready().await;
    assert_eq!(value.get(), "immediate");

    let (_sub, mut seen) = notifications(&value);
    input.set(1u32);
    input.set(2u32);

    // the later input finishes first...
    second_tx.send("second").unwrap();
    assert_eq!(seen.next().await, Some("second"));
    assert_eq!(value.get(), "second");

    // ...and is then overwritten by the stale result of the earlier one
    first_tx.send("first").unwrap();
    assert_eq!(seen.next().await, Some("first"));
    value.ready().await;
    assert_eq!(value.get(), "first");
}

#[tokio::test]
async fn idle_tracker_counts_computations() {
    _ = Executor::init_tokio();

    let idle = IdleTracker::new();
    let (_idle_sub, mut idle_changes) = notifications(&idle);

    let (tx, rx) = oneshot::channel::<u32>();
    let gate = Arc::new(Mutex::new(Some(rx)));
    let input = Mutable::new(0_u32);
    let value = map_async_tracked(&input, 0, &idle, move |n| {
        let gate = gate.lock().unwrap().take();
        async move {
            match gate {
                Some(gate) => gate.await.unwrap_or(0),
                None => n,
            }
        }
    });

    assert_eq!(idle.in_flight(), 1);
    assert!(!idle.is_idle());
    assert_eq!(idle_changes.next().await, Some(false));

    input.set(7u32);
    assert_eq!(idle.in_flight(), 2);
    assert_eq!(idle_changes.next().await, Some(false));

    // the ungated computation finishes on its own
    assert_eq!(idle_changes.next().await, Some(false));
    assert_eq!(idle.in_flight(), 1);
    assert_eq!(value.get(), 7);

    tx.send(5).unwrap();
    assert_eq!(idle_changes.next().await, Some(true));
    assert!(idle.is_idle());
    assert_eq!(value.get(), 5);
}

#[tokio::test]
async fn cancelled_computations_release_the_tracker_and_drop_results() {
    _ = Executor::init_tokio();

    let idle = IdleTracker::new();
    let token = CancellationToken::new();
    let (tx, rx) = oneshot::channel::<u32>();
    let gate = Arc::new(Mutex::new(Some(rx)));

    let input = Mutable::new(1_u32);
    let value = map_async_with(
        &input,
        0,
        AsyncOptions::new().idle(&idle).cancellation(&token),
        move |n| {
            let gate = gate.lock().unwrap().take();
            async move {
                match gate {
                    Some(gate) => gate.await.unwrap_or(99),
                    None => n,
                }
            }
        },
    );
    assert_eq!(idle.in_flight(), 1);

    token.cancel();
    value.ready().await;
    assert!(idle.is_idle());
    assert_eq!(value.get(), 0);
    // the abandoned computation dropped its gate
    assert!(tx.send(1).is_err());

    // later changes launch nothing
    input.set(2u32);
    assert!(!value.is_loading());
    assert!(idle.is_idle());
    tick().await;
    assert_eq!(value.get(), 0);
}

#[tokio::test]
async fn cancellation_token_wakes_waiters() {
    _ = Executor::init_tokio();

    let token = CancellationToken::new();
    let waiter = tokio::spawn({
        let token = token.clone();
        async move { token.cancelled().await }
    });

    tick().await;
    assert!(!token.is_cancelled());
    token.cancel();
    waiter.await.unwrap();
    assert!(token.is_cancelled());

    // resolves immediately once cancelled
    token.cancelled().await;
}

#[tokio::test]
async fn panicking_computation_still_ends() {
    _ = Executor::init_tokio();

    let idle = IdleTracker::new();
    let input = Mutable::new(0);
    let value = map_async_tracked(&input, -1, &idle, |n: i32| async move {
        if n > 0 {
            panic!("computation failed");
        }
        n
    });
    value.ready().await;
    assert_eq!(value.get(), 0);

    input.set(1);
    value.ready().await;
    assert!(idle.is_idle());
    assert_eq!(value.get(), 0);
}

#[tokio::test]
async fn fallible_computations_produce_results() {
    _ = Executor::init_tokio();

    let input = Mutable::new(String::from("12"));
    let parsed = map_async(&input, Ok(0), |text: String| async move {
        text.parse::<u32>().map_err(|e| e.to_string())
    });
    parsed.ready().await;
    assert_eq!(parsed.get(), Ok(12));

    input.set("twelve");
    parsed.ready().await;
    assert!(parsed.get().is_err());
}

#[tokio::test]
async fn dropping_the_signal_while_in_flight() {
    _ = Executor::init_tokio();

    let idle = IdleTracker::new();
    let (tx, rx) = oneshot::channel::<u32>();
    let gate = Arc::new(Mutex::new(Some(rx)));
    let input = Mutable::new(0);
    let value = map_async_tracked(&input, 0, &idle, move |_| {
        let gate = gate.lock().unwrap().take();
        async move {
            match gate {
                Some(gate) => gate.await.unwrap_or(0),
                None => 0,
            }
        }
    });
    let ready = value.ready();
    drop(value);
    assert!(!input.has_dependencies());

    tx.send(3).unwrap();
    ready.await;
    assert!(idle.is_idle());
}

#[tokio::test]
async fn local_computations_need_not_be_send() {
    _ = Executor::init_tokio();

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let input = Mutable::new(2);
            let value = map_async_local(&input, 0, AsyncOptions::new(), |n| {
                let shared = Rc::new(n);
                async move {
                    tick().await;
                    *shared * 3
                }
            });
            value.ready().await;
            assert_eq!(value.get(), 6);

            input.set(5);
            value.ready().await;
            assert_eq!(value.get(), 15);
        })
        .await;
}

#[tokio::test]
async fn async_signal_feeds_other_signals() {
    _ = Executor::init_tokio();

    let input = Mutable::new(3);
    let value = map_async(&input, 0, |n| async move { n + 1 });
    let described = value.signal().map(|n| format!("#{n}"));
    value.ready().await;
    assert_eq!(described.get(), "#4");
}
