use signal_graph::{
    computed::map,
    prelude::*,
    signal::Mutable,
    subscription::Subscription,
};
use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex},
};

fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl FnMut(T) + Send + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let callback = {
        let seen = Arc::clone(&seen);
        move |value| seen.lock().unwrap().push(value)
    };
    (seen, callback)
}

#[test]
fn subscription_receives_new_values() {
    let a = Mutable::new(0);
    let (seen, callback) = recorder();
    let _sub = Subscription::new(&a, callback);

    a.set(1);
    a.set(2);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
}

#[test]
fn double_dispose_is_a_no_op() {
    let a = Mutable::new(0);
    let (seen, callback) = recorder();
    let sub = Subscription::new(&a, callback);

    a.set(1);
    sub.dispose();
    sub.dispose();
    assert!(sub.is_disposed());

    a.set(2);
    assert_eq!(*seen.lock().unwrap(), vec![1]);
    assert!(!a.has_dependencies());
}

#[test]
fn dropping_a_subscription_stops_it() {
    let a = Mutable::new(0);
    let (seen, callback) = recorder();
    drop(Subscription::new(&a, callback));

    a.set(1);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn once_delivers_a_single_notification() {
    let a = Mutable::new(0);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sub = Subscription::once(&a, {
        let seen = Arc::clone(&seen);
        move |value| seen.lock().unwrap().push(value)
    });

    a.set(1);
    a.set(2);
    assert_eq!(*seen.lock().unwrap(), vec![1]);
    assert!(sub.is_disposed());
}

#[test]
fn copy_to_sets_the_target_unconditionally() {
    let source = Mutable::new(1);
    let target = Mutable::new(0);
    let _copy = Subscription::copy_to(&target, &source);
    assert_eq!(target.get(), 0);

    let (seen, callback) = recorder();
    let _watch = Subscription::new(&target, callback);

    source.set(5);
    source.set(5);
    assert_eq!(target.get(), 5);
    assert_eq!(*seen.lock().unwrap(), vec![5, 5]);
}

#[test]
fn copy_step_folds_into_the_target() {
    let deltas = Mutable::new(0);
    let total = Mutable::new(100);
    let _fold = Subscription::copy_step(&total, &deltas, |total, delta| total + delta);

    deltas.set(5);
    deltas.set(-20);
    deltas.set(5);
    assert_eq!(total.get(), 90);
}

#[test]
fn disposing_another_subscription_mid_pass_skips_it() {
    let a = Mutable::new(0);
    let victim: Arc<Mutex<Option<Subscription>>> = Default::default();
    let (seen, callback) = recorder::<i32>();

    // registered first, so it runs before the victim
    let _killer = Subscription::new(&a, {
        let victim = Arc::clone(&victim);
        move |_| {
            if let Some(victim) = &*victim.lock().unwrap() {
                victim.dispose();
            }
        }
    });
    *victim.lock().unwrap() = Some(Subscription::new(&a, callback));

    let (others, other_callback) = recorder::<i32>();
    let _other = Subscription::new(&a, other_callback);

    a.set(1);
    a.set(2);
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(*others.lock().unwrap(), vec![1, 2]);
}

#[test]
fn subscription_may_dispose_itself() {
    let a = Mutable::new(0);
    let slot: Arc<Mutex<Option<Subscription>>> = Default::default();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sub = Subscription::new(&a, {
        let slot = Arc::clone(&slot);
        let seen = Arc::clone(&seen);
        move |value: i32| {
            seen.lock().unwrap().push(value);
            if value >= 2 {
                if let Some(sub) = &*slot.lock().unwrap() {
                    sub.dispose();
                }
            }
        }
    });
    *slot.lock().unwrap() = Some(sub);

    for value in 1..=4 {
        a.set(value);
    }
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
}

#[test]
fn delivery_resumes_after_a_panicking_map() {
    let m = Mutable::new(0);
    let s = map(&m, |x| {
        if *x == 1 {
            panic!("cannot map 1");
        }
        x * 2
    });
    let (seen, callback) = recorder();
    let _sub = Subscription::new(&s, callback);

    let failed = catch_unwind(AssertUnwindSafe(|| m.set(1)));
    assert!(failed.is_err());

    m.set(2);
    assert_eq!(*seen.lock().unwrap(), vec![4]);
    assert_eq!(s.get(), 4);
}

#[test]
fn delivery_resumes_after_a_panicking_callback() {
    let a = Mutable::new(0);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let _sub = Subscription::new(&a, {
        let seen = Arc::clone(&seen);
        move |value: i32| {
            if value < 0 {
                panic!("negative");
            }
            seen.lock().unwrap().push(value);
        }
    });

    let failed = catch_unwind(AssertUnwindSafe(|| a.set(-1)));
    assert!(failed.is_err());

    a.set(3);
    assert_eq!(*seen.lock().unwrap(), vec![3]);
}
