use assert_call::{call, CallRecorder};

use crate::{autorun, batch, signal, watch};

#[test]
fn runs_immediately_once() {
    let mut cr = CallRecorder::new();
    let _e = autorun(|| call!("run"));
    cr.verify("run");
    cr.verify(());
}

#[test]
fn reruns_on_tracked_change() {
    let mut cr = CallRecorder::new();
    let s = signal(10);
    let s0 = s.clone();
    let _e = autorun(move || call!("{}", s0.get()));
    cr.verify("10");

    s.set(20);
    cr.verify("20");

    s.set(30);
    cr.verify("30");
}

#[test]
fn only_read_dependencies_trigger() {
    let mut cr = CallRecorder::new();
    let a = signal(1);
    let b = signal(2);
    let a0 = a.clone();
    let _e = autorun(move || call!("{}", a0.get()));
    cr.verify("1");

    b.set(20);
    cr.verify(()); // `b` was never read

    a.set(10);
    cr.verify("10");
}

#[test]
fn dependency_set_follows_last_run() {
    let mut cr = CallRecorder::new();
    let cond = signal(true);
    let a = signal(1);
    let b = signal(2);
    let (c0, a0, b0) = (cond.clone(), a.clone(), b.clone());
    let _e = autorun(move || {
        let v = if c0.get() { a0.get() } else { b0.get() };
        call!("{v}");
    });
    cr.verify("1");

    cond.set(false);
    cr.verify("2");

    a.set(10);
    cr.verify(()); // `a` is no longer a dependency

    b.set(20);
    cr.verify("20");
}

#[test]
fn disposed_effect_never_reruns() {
    let mut cr = CallRecorder::new();
    let s = signal(10);
    let s0 = s.clone();
    let e = autorun(move || call!("{}", s0.get()));
    cr.verify("10");

    e.dispose();
    s.set(20);
    cr.verify(());
}

#[test]
fn drop_disposes() {
    let mut cr = CallRecorder::new();
    let s = signal(10);
    let s0 = s.clone();
    let e = autorun(move || call!("{}", s0.get()));
    cr.verify("10");

    drop(e);
    s.set(20);
    cr.verify(());
}

#[test]
fn batch_coalesces_reruns() {
    let mut cr = CallRecorder::new();
    let a = signal(1);
    let b = signal(2);
    let (a0, b0) = (a.clone(), b.clone());
    let _e = autorun(move || call!("{}", a0.get() + b0.get()));
    cr.verify("3");

    batch(|| {
        a.set(10);
        b.set(20);
        cr.verify(()); // deferred until the batch exits
    });
    cr.verify("30");
}

#[test]
fn writes_inside_effect_defer_until_run_completes() {
    let mut cr = CallRecorder::new();
    let src = signal(1);
    let dst = signal(0);
    let (s0, d0) = (src.clone(), dst.clone());
    let _mirror = autorun(move || d0.set(s0.get() * 10));
    let d1 = dst.clone();
    let _e = autorun(move || call!("{}", d1.get()));
    cr.verify("10");

    src.set(2);
    cr.verify("20");
}

#[test]
fn watch_does_not_fire_at_creation() {
    let mut cr = CallRecorder::new();
    let s = signal(10);
    let s0 = s.clone();
    let _w = watch(move || s0.get(), |new, old| call!("{old}->{new}"));
    cr.verify(());

    s.set(20);
    cr.verify("10->20");

    s.set(30);
    cr.verify("20->30");
}

#[test]
fn watch_ignores_unchanged_result() {
    let mut cr = CallRecorder::new();
    let s = signal(1);
    let s0 = s.clone();
    let _w = watch(move || s0.get() > 0, |new, old| call!("{old}->{new}"));
    cr.verify(());

    s.set(2);
    cr.verify(()); // source re-evaluated, result unchanged

    s.set(-1);
    cr.verify("true->false");
}

#[test]
fn watch_dispose_stops_callbacks() {
    let mut cr = CallRecorder::new();
    let s = signal(10);
    let s0 = s.clone();
    let w = watch(move || s0.get(), |new, old| call!("{old}->{new}"));
    w.dispose();

    s.set(20);
    cr.verify(());
}
