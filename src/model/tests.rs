use assert_call::{call, CallRecorder};
use rstest::rstest;
use serde_json::json;

use crate::{
    autorun, define, make_observable, model, observable, Annotation, Arr, Func, Obj, Value,
};

#[rstest]
#[case::int(Value::Int(4))]
#[case::float(Value::Float(1.5))]
#[case::string(Value::str("s"))]
#[case::bool(Value::Bool(true))]
#[case::null(Value::Null)]
fn define_passes_primitives_through(#[case] target: Value) {
    let result = define(target.clone(), &[("value", Annotation::Computed)]);
    assert_eq!(result, target);
}

#[test]
fn define_passes_functions_through() {
    let f = Func::new(|_, _| Value::Null);
    let result = define(Value::Func(f.clone()), &[("value", Annotation::Computed)]);
    assert_eq!(result, Value::Func(f));
}

#[test]
fn define_passes_arrays_through() {
    let arr = Arr::from_iter([Value::Int(1)]);
    let result = define(Value::Arr(arr.clone()), &[("0", Annotation::Observable)]);
    assert_eq!(result, Value::Arr(arr));
}

#[test]
fn define_wraps_raw_objects() {
    let result = define(Value::raw(json!({"a": 1})), &[("a", Annotation::Observable)]);
    assert_eq!(result.as_obj().unwrap().get("a"), Value::Int(1));
}

#[test]
fn computed_annotation_caches_and_reevaluates_once() {
    let mut cr = CallRecorder::new();
    let obj = Obj::new();
    obj.set("aa", Value::Int(1));
    obj.set("bb", Value::Int(2));
    obj.set(
        "cc",
        Value::Func(Func::new(|this, _| {
            call!("getter");
            Value::Int(
                this.get("aa").as_int().unwrap_or(0) + this.get("bb").as_int().unwrap_or(0),
            )
        })),
    );
    make_observable(&obj, &[("cc", Annotation::Computed)]);
    cr.verify(()); // getter is lazy

    let o = obj.clone();
    let _e = autorun(move || call!("sum {:?}", o.get("cc")));
    cr.verify(["getter", "sum 3"]);

    obj.set("aa", Value::Int(10));
    cr.verify(["getter", "sum 12"]); // exactly one re-evaluation
    assert_eq!(obj.get("cc"), Value::Int(12));
    cr.verify(());
}

#[test]
fn action_annotation_batches_the_body() {
    let mut cr = CallRecorder::new();
    let obj = Obj::new();
    obj.set("a", Value::Int(1));
    obj.set("b", Value::Int(2));
    obj.set(
        "bump",
        Value::Func(Func::new(|this, _| {
            let a = this.get("a").as_int().unwrap_or(0);
            let b = this.get("b").as_int().unwrap_or(0);
            this.set("a", Value::Int(a + 1));
            this.set("b", Value::Int(b + 1));
            Value::Null
        })),
    );
    make_observable(&obj, &[("bump", Annotation::Action)]);

    let o = obj.clone();
    let _e = autorun(move || {
        let sum = o.get("a").as_int().unwrap_or(0) + o.get("b").as_int().unwrap_or(0);
        call!("{sum}");
    });
    cr.verify("3");

    obj.call("bump", &[]);
    cr.verify("5"); // two writes, one re-run
}

#[test]
fn ref_annotation_skips_deep_wrapping() {
    let obj = Obj::new();
    make_observable(&obj, &[("opaque", Annotation::Ref)]);
    obj.set("opaque", Value::raw(json!({"x": 1})));
    assert!(matches!(obj.get("opaque"), Value::Raw(_)));
}

#[test]
fn shallow_annotation_wraps_one_level() {
    let obj = Obj::new();
    make_observable(&obj, &[("cfg", Annotation::Shallow)]);
    obj.set("cfg", Value::raw(json!({"top": 1, "nested": {"x": 1}})));
    let cfg = obj.get("cfg");
    let cfg = cfg.as_obj().unwrap();
    assert_eq!(cfg.get("top"), Value::Int(1));
    assert!(matches!(cfg.get("nested"), Value::Raw(_)));
}

#[test]
fn boxed_annotation_boxes_existing_value() {
    let obj = Obj::new();
    obj.set("n", Value::Int(1));
    make_observable(&obj, &[("n", Annotation::Boxed)]);
    assert!(matches!(obj.get("n"), Value::Box(_)));
}

#[test]
fn model_makes_fields_observable_and_methods_actions() {
    let mut cr = CallRecorder::new();
    let raw = Obj::new();
    raw.raw().set("count", Value::Int(0));
    raw.raw().set(
        "increment",
        Value::Func(Func::new(|this, _| {
            let n = this.get("count").as_int().unwrap_or(0);
            this.set("count", Value::Int(n + 1));
            Value::Null
        })),
    );
    let m = model(Value::Obj(raw));
    let obj = m.as_obj().unwrap().clone();

    let o = obj.clone();
    let _e = autorun(move || call!("{:?}", o.get("count")));
    cr.verify("0");

    obj.call("increment", &[]);
    cr.verify("1");
}

#[rstest]
#[case::int(Value::Int(4))]
#[case::string(Value::str("s"))]
fn model_passes_primitives_through(#[case] target: Value) {
    assert_eq!(model(target.clone()), target);
}

#[test]
fn builder_composes_annotated_fields() {
    let mut cr = CallRecorder::new();
    let counter = Obj::builder()
        .field("count", 0)
        .computed("double", |this| {
            Value::Int(this.get("count").as_int().unwrap_or(0) * 2)
        })
        .action("add", |this, args| {
            let n = this.get("count").as_int().unwrap_or(0);
            let d = args.first().and_then(Value::as_int).unwrap_or(1);
            this.set("count", Value::Int(n + d));
            Value::Null
        })
        .build();

    let c = counter.clone();
    let _e = autorun(move || call!("{:?}", c.get("double")));
    cr.verify("0");

    counter.call("add", &[Value::Int(5)]);
    cr.verify("10");
    assert_eq!(counter.get("count"), Value::Int(5));
}

#[test]
fn observable_passes_primitives_through() {
    assert_eq!(observable(Value::Int(4)), Value::Int(4));
    assert_eq!(observable(Value::str("s")), Value::str("s"));
}
