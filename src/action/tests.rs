use assert_call::{call, CallRecorder};

use crate::{action, autorun, batch, create_action, signal};

#[test]
fn nested_batches_flush_once_at_outermost_exit() {
    let mut cr = CallRecorder::new();
    let a = signal(1);
    let b = signal(2);
    let (a0, b0) = (a.clone(), b.clone());
    let _e = autorun(move || call!("{}", a0.get() + b0.get()));
    cr.verify("3");

    batch(|| {
        a.set(10);
        batch(|| {
            b.set(20);
        });
        cr.verify(()); // inner exit must not flush
    });
    cr.verify("30");
}

#[test]
fn action_is_a_batch() {
    let mut cr = CallRecorder::new();
    let a = signal(1);
    let b = signal(2);
    let (a0, b0) = (a.clone(), b.clone());
    let _e = autorun(move || call!("{}", a0.get() + b0.get()));
    cr.verify("3");

    let ret = action(|| {
        a.set(10);
        b.set(20);
        "done"
    });
    assert_eq!(ret, "done");
    cr.verify("30");
}

#[test]
fn create_action_wraps_every_call() {
    let mut cr = CallRecorder::new();
    let a = signal(1);
    let b = signal(2);
    let (a0, b0) = (a.clone(), b.clone());
    let _e = autorun(move || call!("{}", a0.get() + b0.get()));
    cr.verify("3");

    let (a1, b1) = (a.clone(), b.clone());
    let mut bump = create_action(move || {
        a1.set(a1.get_untracked() + 1);
        b1.set(b1.get_untracked() + 1);
    });
    bump();
    cr.verify("5");

    bump();
    cr.verify("7");
}
