use serde_json::json;

use crate::{Arr, BoxValue, Func, Obj, Value};

#[test]
fn primitives_compare_by_value() {
    assert_eq!(Value::Null, Value::Null);
    assert_eq!(Value::Bool(true), Value::Bool(true));
    assert_eq!(Value::Int(3), Value::Int(3));
    assert_ne!(Value::Int(3), Value::Int(4));
    assert_eq!(Value::Float(1.5), Value::Float(1.5));
    assert_eq!(Value::Int(2), Value::Float(2.0)); // numeric cross-compare
    assert_eq!(Value::str("a"), Value::str("a"));
    assert_ne!(Value::str("a"), Value::str("b"));
    assert_ne!(Value::Int(0), Value::Null);
}

#[test]
fn containers_compare_by_identity() {
    let o1 = Obj::new();
    let o2 = Obj::new();
    assert_eq!(Value::Obj(o1.clone()), Value::Obj(o1.clone()));
    assert_ne!(Value::Obj(o1), Value::Obj(o2));

    let a1 = Arr::new();
    assert_eq!(Value::Arr(a1.clone()), Value::Arr(a1.clone()));
    assert_ne!(Value::Arr(Arr::new()), Value::Arr(Arr::new()));

    let f1 = Func::new(|_, _| Value::Null);
    assert_eq!(Value::Func(f1.clone()), Value::Func(f1.clone()));
    assert_ne!(
        Value::Func(Func::new(|_, _| Value::Null)),
        Value::Func(f1)
    );

    let b1 = BoxValue::new(Value::Int(1));
    let b2 = BoxValue::new(Value::Int(1));
    assert_eq!(Value::Box(b1.clone()), Value::Box(b1));
    assert_ne!(Value::Box(b2.clone()), Value::Box(BoxValue::new(Value::Int(1))));
    drop(b2);
}

#[test]
fn from_json_builds_reactive_containers() {
    let v = Value::from_json(json!({"user": {"name": "ada"}, "tags": [1, 2]}));
    let obj = v.as_obj().unwrap();
    let user = obj.get("user");
    assert!(user.as_obj().is_some());
    assert_eq!(user.as_obj().unwrap().get("name").as_str(), Some("ada"));
    let tags = obj.get("tags");
    assert_eq!(tags.as_arr().unwrap().len(), 2);
}

#[test]
fn to_json_round_trip() {
    let json = json!({"a": 1, "b": [true, null], "c": "x"});
    let v = Value::from_json(json.clone());
    assert_eq!(v.to_json(), json);
}

#[test]
fn funcs_serialize_as_null() {
    assert_eq!(
        Value::Func(Func::new(|_, _| Value::Null)).to_json(),
        serde_json::Value::Null
    );
}

#[test]
fn box_serializes_as_contents() {
    let b = BoxValue::new(Value::Int(7));
    assert_eq!(Value::Box(b).to_json(), json!(7));
}

#[test]
fn conversions() {
    assert_eq!(Value::from(3i64), Value::Int(3));
    assert_eq!(Value::from(3i32), Value::Int(3));
    assert_eq!(Value::from(true), Value::Bool(true));
    assert_eq!(Value::from(1.5), Value::Float(1.5));
    assert_eq!(Value::from("s"), Value::str("s"));
    assert_eq!(Value::from("s".to_string()), Value::str("s"));
}

#[test]
fn func_call_receives_this_and_args() {
    let f = Func::new(|this, args| {
        let base = this.get("base").as_int().unwrap_or(0);
        let add = args.first().and_then(Value::as_int).unwrap_or(0);
        Value::Int(base + add)
    });
    let obj = Obj::new();
    obj.set("base", Value::Int(10));
    assert_eq!(f.call(&obj, &[Value::Int(5)]), Value::Int(15));
}

#[test]
fn serde_deserialize_into_containers() {
    let v: Value = serde_json::from_str(r#"{"n": 1}"#).unwrap();
    assert_eq!(v.as_obj().unwrap().get("n"), Value::Int(1));
}
