use any_spawner::Executor;
use futures::{channel::mpsc, SinkExt, StreamExt};
use signal_graph::{
    prelude::*,
    signal::{from_stream, from_stream_local},
    subscription::Subscription,
};
use std::time::Duration;

pub async fn tick() {
    tokio::time::sleep(Duration::from_micros(1)).await;
}

#[tokio::test]
async fn stream_items_become_values() {
    _ = Executor::init_tokio();

    let (mut tx, rx) = mpsc::unbounded::<u32>();
    let value = from_stream(0, rx);
    assert_eq!(value.get(), 0);

    let (seen_tx, mut seen) = mpsc::unbounded();
    let _sub = Subscription::new(&value, move |n| {
        _ = seen_tx.unbounded_send(n);
    });

    tx.send(1).await.unwrap();
    tx.send(1).await.unwrap();
    tx.send(2).await.unwrap();
    assert_eq!(seen.next().await, Some(1));
    assert_eq!(seen.next().await, Some(1));
    assert_eq!(seen.next().await, Some(2));
    assert_eq!(value.get(), 2);
}

#[tokio::test]
async fn dropping_the_signal_stops_the_stream() {
    _ = Executor::init_tokio();

    let (tx, rx) = mpsc::unbounded::<u32>();
    let value = from_stream(0, rx);
    tick().await;
    assert!(!tx.is_closed());

    drop(value);
    tick().await;
    assert!(tx.is_closed());
}

#[tokio::test]
async fn local_streams() {
    _ = Executor::init_tokio();

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let items = futures::stream::iter(vec!["a", "b", "c"]);
            let value = from_stream_local("", items);
            let (seen_tx, seen) = mpsc::unbounded();
            let _sub = Subscription::new(&value, move |item| {
                _ = seen_tx.unbounded_send(item);
            });

            let seen: Vec<_> = seen.take(3).collect().await;
            assert_eq!(seen, vec!["a", "b", "c"]);
            assert_eq!(value.get(), "c");
        })
        .await;
}
