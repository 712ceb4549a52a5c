use assert_call::{call, CallRecorder};

use crate::{autorun, computed, signal};

#[test]
fn lazy_until_first_read() {
    let mut cr = CallRecorder::new();
    let a = signal(1);
    let a0 = a.clone();
    let c = computed(move || {
        call!("eval");
        a0.get() * 2
    });
    cr.verify(());

    assert_eq!(c.get(), 2);
    cr.verify("eval");
}

#[test]
fn cached_between_invalidations() {
    let mut cr = CallRecorder::new();
    let a = signal(1);
    let a0 = a.clone();
    let c = computed(move || {
        call!("eval");
        a0.get() * 2
    });
    assert_eq!(c.get(), 2);
    assert_eq!(c.get(), 2);
    assert_eq!(c.get_untracked(), 2);
    cr.verify("eval"); // one evaluation serves every read

    a.set(2);
    assert_eq!(c.get(), 4);
    cr.verify("eval");
}

#[test]
fn observed_getter_runs_once_per_dependency_change() {
    let mut cr = CallRecorder::new();
    let aa = signal(1);
    let bb = signal(2);
    let (a0, b0) = (aa.clone(), bb.clone());
    let cc = computed(move || {
        call!("getter");
        a0.get() + b0.get()
    });
    let c0 = cc.clone();
    let _e = autorun(move || {
        call!("sum {}", c0.get());
    });
    cr.verify(["getter", "sum 3"]);

    aa.set(10);
    cr.verify(["getter", "sum 12"]); // exactly one re-evaluation
    assert_eq!(cc.get(), 12);
    cr.verify(());
}

#[test]
fn unchanged_result_does_not_rerun_dependents() {
    let mut cr = CallRecorder::new();
    let a = signal(1);
    let a0 = a.clone();
    let c = computed(move || a0.get() > 0);
    let c0 = c.clone();
    let _e = autorun(move || {
        call!("{}", c0.get());
    });
    cr.verify("true");

    a.set(2);
    cr.verify(()); // recomputed, but the result did not change

    a.set(-1);
    cr.verify("false");
}

#[test]
fn chained_computed() {
    let a = signal(1);
    let a0 = a.clone();
    let double = computed(move || a0.get() * 2);
    let d0 = double.clone();
    let quad = computed(move || d0.get() * 2);
    assert_eq!(quad.get(), 4);

    a.set(3);
    assert_eq!(quad.get(), 12);
}

#[test]
fn try_get_detects_cycle() {
    let mut cr = CallRecorder::new();
    let holder = signal(None::<crate::Computed<i32>>);
    let h0 = holder.clone();
    let c = computed(move || match h0.get_untracked() {
        Some(inner) => match inner.try_get() {
            Ok(v) => v + 1,
            Err(e) => {
                call!("{}", e);
                -1
            }
        },
        None => 0,
    });
    holder.set_force(Some(c.clone()));
    assert_eq!(c.try_get().unwrap(), -1);
    cr.verify("detect cyclic dependency"); // the re-entrant read fails
}

#[test]
#[should_panic(expected = "detect cyclic dependency")]
fn get_panics_on_cycle() {
    let holder = signal(None::<crate::Computed<i32>>);
    let h0 = holder.clone();
    let c = computed(move || match h0.get_untracked() {
        Some(inner) => inner.get() + 1,
        None => 0,
    });
    holder.set_force(Some(c.clone()));
    c.get();
}
