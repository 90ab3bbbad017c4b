use datamodel_kernel::{
    DataModelStore, ManualClock, RegisterOptions, SharedDataModelStore, StoreAction, StoreError,
    Value,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

fn doc(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn cart_store() -> DataModelStore {
    let mut store = DataModelStore::with_clock(Arc::new(ManualClock::new(1_700_000_000_000)));
    store
        .register_data_model("cart", doc(json!({"items": [], "total": 0})), RegisterOptions::default())
        .unwrap();
    store
}

#[test]
fn cart_scenario_end_to_end() {
    let mut store = cart_store();

    let patch_id = store.set_in("cart", "total", 30).unwrap().unwrap();
    assert_eq!(store.get_in("cart", "total"), Some(&Value::from(30)));
    assert_eq!(store.get_store_changes().len(), 1);
    assert_eq!(store.get_store_changes()[0].previous_value, Some(Value::from(0)));

    store.apply_patch(&patch_id).unwrap();
    assert_eq!(store.get_in("cart", "total"), Some(&Value::from(0)));
    assert_eq!(store.get_store_changes().len(), 2);
}

#[test]
fn reads_are_immune_to_caller_mutation() {
    let store = cart_store();
    let mut whole = store.get_by_id("cart").unwrap().clone();
    let mut items = store.get_in("cart", "items").unwrap().clone();

    whole
        .as_object_mut()
        .unwrap()
        .insert("total".into(), Value::from(999));
    items.as_array_mut().unwrap().push(Value::from("sneaky"));

    assert_eq!(store.get_in("cart", "total"), Some(&Value::from(0)));
    assert_eq!(store.get_in("cart", "items"), Some(&Value::array()));
}

#[test]
fn earlier_reads_survive_later_writes() {
    let mut store = DataModelStore::new();
    store
        .register_data_model("s", doc(json!({"a": {"b": 1}})), RegisterOptions::default())
        .unwrap();
    let before = store.get_by_id("s").unwrap().clone();

    store.set_in("s", "a.b", 5).unwrap();

    assert_eq!(before.get_in(&["a", "b"]), Some(&Value::from(1)));
    assert_eq!(store.get_in("s", "a.b"), Some(&Value::from(5)));
}

#[test]
fn equal_scalar_write_changes_nothing() {
    let mut store = cart_store();
    let before = store.get_by_id("cart").unwrap().clone();

    assert!(store.set_in("cart", "total", 0).unwrap().is_none());

    assert!(store.get_store_changes().is_empty());
    assert!(store.get_by_id("cart").unwrap().same_node(&before));
}

#[test]
fn undo_round_trip_grows_the_log() {
    let mut store = cart_store();
    store.set_in("cart", "total", 10).unwrap();
    let last = store.set_in("cart", "total", 20).unwrap().unwrap();

    store.apply_patch(&last).unwrap();

    assert_eq!(store.get_in("cart", "total"), Some(&Value::from(10)));
    assert_eq!(store.get_store_changes().len(), 3);
}

#[test]
fn redo_of_undo_is_possible() {
    let mut store = cart_store();
    let write = store.set_in("cart", "total", 10).unwrap().unwrap();
    let undo = store.apply_patch(&write).unwrap().unwrap();
    store.apply_patch(&undo).unwrap();
    assert_eq!(store.get_in("cart", "total"), Some(&Value::from(10)));
    assert_eq!(store.get_store_changes().len(), 3);
}

#[test]
fn duplicate_registration() {
    let mut store = DataModelStore::new();
    store
        .register_data_model("x", Value::object(), RegisterOptions::default())
        .unwrap();
    assert_eq!(
        store.register_data_model("x", Value::object(), RegisterOptions::default()),
        Err(StoreError::DuplicateKey("x".into()))
    );
    store
        .register_data_model("x", doc(json!({"replaced": true})), RegisterOptions::overwrite())
        .unwrap();
    assert_eq!(store.get_in("x", "replaced"), Some(&Value::Bool(true)));
}

#[test]
fn deregistration_purges_history() {
    let mut store = cart_store();
    store
        .register_data_model("wishlist", doc(json!({"items": []})), RegisterOptions::default())
        .unwrap();
    store.set_in("cart", "total", 30).unwrap();
    store.set_in("wishlist", "items", doc(json!([{"id": 3}]))).unwrap();

    store.deregister_data_model("cart").unwrap();

    assert!(store.get_store_changes().iter().all(|p| p.store_id != "cart"));
    assert_eq!(store.get_store_changes().len(), 1);
    assert_eq!(store.get_all_data_model_ids(), vec!["wishlist"]);
}

#[test]
fn purged_patch_can_no_longer_be_applied() {
    let mut store = cart_store();
    let id = store.set_in("cart", "total", 30).unwrap().unwrap();
    store.deregister_data_model("cart").unwrap();
    assert_eq!(store.apply_patch(&id), Err(StoreError::PatchNotFound(id)));
}

#[test]
fn listeners_run_in_subscription_order() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut store = DataModelStore::new();
    for name in ["A", "B"] {
        let calls = Arc::clone(&calls);
        store.on_store_change(move |change| {
            calls
                .lock()
                .unwrap()
                .push(format!("{name}:{}", change.patch.operation.as_str()));
        });
    }

    store
        .register_data_model("s", Value::object(), RegisterOptions::default())
        .unwrap();
    store.set_in("s", "x", 1).unwrap();
    store.set_in("s", "y", 2).unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "A:register",
            "B:register",
            "A:edit",
            "B:edit",
            "A:edit",
            "B:edit"
        ]
    );
}

#[test]
fn both_path_forms_address_the_same_node() {
    let mut store = DataModelStore::new();
    store
        .register_data_model("session", Value::object(), RegisterOptions::default())
        .unwrap();
    store
        .set_in("session", ["user", "email"], "user@example.com")
        .unwrap();
    store
        .set_in("session", vec!["user".to_owned(), "role".to_owned()], "admin")
        .unwrap();

    assert_eq!(
        store.get_in("session", "user.email"),
        Some(&Value::from("user@example.com"))
    );
    assert_eq!(store.get_in("session", ["user", "role"]), Some(&Value::from("admin")));
    let patch = store.get_store_changes().last().unwrap();
    assert_eq!(patch.patched_path.as_deref(), Some("user.role"));
    assert_eq!(patch.operation, StoreAction::Edit);
}

#[test]
fn array_elements_are_addressable() {
    let mut store = DataModelStore::new();
    store
        .register_data_model(
            "cart",
            doc(json!({"items": [{"id": 1, "price": 10}, {"id": 2, "price": 20}]})),
            RegisterOptions::default(),
        )
        .unwrap();
    store.set_in("cart", "items[1].price", 25).unwrap();
    assert_eq!(store.get_in("cart", "items.1.price"), Some(&Value::from(25)));
    assert_eq!(store.get_in("cart", "items[0].price"), Some(&Value::from(10)));
}

#[test]
fn shared_store_notifies_listeners_under_the_lock() {
    let shared = SharedDataModelStore::new(DataModelStore::new());
    let seen = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&seen);
    shared.with(|store| {
        store.on_store_change(move |_| *sink.lock().unwrap() += 1);
        store.register_data_model("s", Value::object(), RegisterOptions::default())
    })
    .unwrap();
    shared.with(|store| store.set_in("s", "a", 1)).unwrap();
    assert_eq!(*seen.lock().unwrap(), 2);
}

#[test]
fn index_padding_round_trips_through_undo_and_redo() {
    let mut store = DataModelStore::new();
    store
        .register_data_model("cart", doc(json!({"items": ["a", "b"]})), RegisterOptions::default())
        .unwrap();

    let write = store.set_in("cart", "items.3", "d").unwrap().unwrap();
    let padded = store.get_in("cart", "items").unwrap().clone();

    let undo = store.apply_patch(&write).unwrap().unwrap();
    assert_eq!(store.get_in("cart", "items"), Some(&doc(json!(["a", "b"]))));

    store.apply_patch(&undo).unwrap();
    assert_eq!(store.get_in("cart", "items"), Some(&padded));
    assert_eq!(store.get_store_changes().len(), 3);
}
