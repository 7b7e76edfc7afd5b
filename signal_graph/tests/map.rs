use signal_graph::{
    computed::{filter, map, map2, merge},
    prelude::*,
    signal::Mutable,
    subscription::Subscription,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

#[test]
fn map_notifies_on_every_set() {
    let m = Mutable::new(5);
    let s = map(&m, |x| x * 2);

    let printed = Arc::new(Mutex::new(Vec::new()));
    let _sub = Subscription::new(&s, {
        let printed = Arc::clone(&printed);
        move |value| printed.lock().unwrap().push(value)
    });

    m.set(7);
    assert_eq!(*printed.lock().unwrap(), vec![14]);
    m.set(7);
    assert_eq!(*printed.lock().unwrap(), vec![14, 14]);
}

#[test]
fn map_computes_lazily_and_at_most_once_per_change() {
    let runs = Arc::new(AtomicUsize::new(0));
    let m = Mutable::new(1);
    let s = map(&m, {
        let runs = Arc::clone(&runs);
        move |x| {
            runs.fetch_add(1, Ordering::Relaxed);
            x + 1
        }
    });
    assert_eq!(runs.load(Ordering::Relaxed), 0);

    assert_eq!(s.get(), 2);
    assert_eq!(s.get(), 2);
    assert_eq!(runs.load(Ordering::Relaxed), 1);

    m.set(2);
    m.set(3);
    assert_eq!(runs.load(Ordering::Relaxed), 1);
    assert_eq!(s.get(), 4);
    assert_eq!(s.get(), 4);
    assert_eq!(runs.load(Ordering::Relaxed), 2);
}

#[test]
fn chained_maps() {
    let m = Mutable::new(2);
    let squared = m.read_only().map(|x| x * x);
    let described = squared.map(|x| format!("{x}!"));
    assert_eq!(described.get(), "4!");

    m.set(3);
    assert_eq!(described.get(), "9!");
}

#[test]
fn map2_fires_once_per_upstream_signal() {
    let a = Mutable::new(1);
    let b = Mutable::new(10);
    let sum = map2(&a, &b, |a, b| a + b);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let _sub = Subscription::new(&sum, {
        let seen = Arc::clone(&seen);
        move |value| seen.lock().unwrap().push(value)
    });

    a.set(2);
    b.set(20);
    assert_eq!(*seen.lock().unwrap(), vec![12, 22]);
}

#[test]
fn dropping_a_map_unregisters_it() {
    let m = Mutable::new(0);
    let s = map(&m, |x| *x);
    assert!(m.has_dependencies());
    drop(s);
    assert!(!m.has_dependencies());
}

#[test]
#[should_panic(expected = "boom")]
fn panics_in_map_reach_the_reader() {
    let m = Mutable::new(0);
    let s = map(&m, |x| {
        if *x > 0 {
            panic!("boom");
        }
        *x
    });
    assert_eq!(s.get(), 0);
    m.set(1);
    s.get();
}

#[test]
fn filter_keeps_passing_values() {
    let input = Mutable::new(3);
    let even = filter(&input, 0, |n| n % 2 == 0);
    assert_eq!(even.get(), 0);

    let count = Arc::new(AtomicUsize::new(0));
    let _sub = Subscription::new(&even, {
        let count = Arc::clone(&count);
        move |_| {
            count.fetch_add(1, Ordering::Relaxed);
        }
    });

    input.set(4);
    input.set(5);
    input.set(6);
    assert_eq!(even.get(), 6);
    assert_eq!(count.load(Ordering::Relaxed), 2);
}

#[test]
fn filter_starts_with_the_source_when_it_passes() {
    let input = Mutable::new(8);
    let even = input.read_only().filter(1, |n| n % 2 == 0);
    assert_eq!(even.get(), 8);
}

#[test]
fn merge_takes_the_latest() {
    let a = Mutable::new("a1");
    let b = Mutable::new("b1");
    let latest = merge(&a, &b);
    assert_eq!(latest.get(), "a1");

    b.set("b2");
    assert_eq!(latest.get(), "b2");
    a.set("a2");
    assert_eq!(latest.get(), "a2");
}
