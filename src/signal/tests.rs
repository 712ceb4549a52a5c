use assert_call::{call, CallRecorder};

use crate::{autorun, signal, Signal};

#[test]
fn new_get() {
    let s = Signal::new(10);
    assert_eq!(s.get(), 10);
}

#[test]
fn set() {
    let s = signal(10);
    s.set(20);
    assert_eq!(s.get(), 20);

    s.set(30);
    assert_eq!(s.get(), 30);
}

#[test]
fn set_reruns_consumer_before_returning() {
    let mut cr = CallRecorder::new();
    let s = signal(10);
    let s0 = s.clone();
    let _e = autorun(move || {
        call!("{}", s0.get());
    });
    cr.verify("10");

    s.set(20);
    cr.verify("20"); // synchronous, no deferred pass
}

#[test]
fn set_equal_value_does_not_notify() {
    let mut cr = CallRecorder::new();
    let s = signal(10);
    let s0 = s.clone();
    let _e = autorun(move || {
        call!("{}", s0.get());
    });
    cr.verify("10");

    s.set(10);
    cr.verify(());

    s.set(20);
    cr.verify("20");
}

#[test]
fn set_force_notifies_on_equal_value() {
    let mut cr = CallRecorder::new();
    let s = signal(10);
    let s0 = s.clone();
    let _e = autorun(move || {
        call!("{}", s0.get());
    });
    cr.verify("10");

    s.set_force(10);
    cr.verify("10");
}

#[test]
fn update_mutates_in_place() {
    let mut cr = CallRecorder::new();
    let s = signal(vec![1, 2]);
    let s0 = s.clone();
    let _e = autorun(move || {
        call!("{}", s0.borrow().len());
    });
    cr.verify("2");

    s.update(|v| v.push(3));
    cr.verify("3");
}

#[test]
fn clone_shares_the_cell() {
    let s = signal(1);
    let t = s.clone();
    t.set(2);
    assert_eq!(s.get(), 2);
    assert!(s.ptr_eq(&t));
    assert!(!s.ptr_eq(&signal(2)));
}

#[test]
fn serde_round_trip() {
    let s = signal(10);
    let json = serde_json::to_string(&s).unwrap();
    assert_eq!(json, "10");

    let t: Signal<i32> = serde_json::from_str("20").unwrap();
    assert_eq!(t.get(), 20);
}
