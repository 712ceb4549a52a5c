use std::rc::Rc;

use assert_call::{call, CallRecorder};

use crate::{autorun, ReactiveWeakSet};

#[test]
fn membership_is_per_identity() {
    let set: ReactiveWeakSet<String> = ReactiveWeakSet::new();
    let v1 = Rc::new("x".to_string());
    let v2 = Rc::new("x".to_string());
    set.insert(&v1);
    assert!(set.contains(&v1));
    assert!(!set.contains(&v2)); // equal contents, distinct identity
}

#[test]
fn contains_tracks_per_member() {
    let mut cr = CallRecorder::new();
    let set: ReactiveWeakSet<String> = ReactiveWeakSet::new();
    let a = Rc::new("a".to_string());
    let b = Rc::new("b".to_string());
    let (s, a0) = (set.clone(), a.clone());
    let _e = autorun(move || call!("{}", s.contains(&a0)));
    cr.verify("false");

    set.insert(&b);
    cr.verify(()); // unrelated member

    set.insert(&a);
    cr.verify("true");

    set.remove(&a);
    cr.verify("false");
}

#[test]
fn duplicate_insert_and_absent_remove_are_noops() {
    let mut cr = CallRecorder::new();
    let set: ReactiveWeakSet<String> = ReactiveWeakSet::new();
    let a = Rc::new("a".to_string());
    set.insert(&a);
    let (s, a0) = (set.clone(), a.clone());
    let _e = autorun(move || call!("{}", s.contains(&a0)));
    cr.verify("true");

    assert!(!set.insert(&a));
    cr.verify(());

    let b = Rc::new("b".to_string());
    assert!(!set.remove(&b));
    cr.verify(());
}

#[test]
fn dropped_members_behave_as_absent() {
    let set: ReactiveWeakSet<String> = ReactiveWeakSet::new();
    let keep = Rc::new("keep".to_string());
    set.insert(&keep);
    {
        let gone = Rc::new("gone".to_string());
        set.insert(&gone);
        assert!(set.contains(&gone));
    }
    set.insert(&keep); // prunes the dead slot
    assert!(set.contains(&keep));
}
