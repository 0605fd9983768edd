use tests::prelude::*;

use keel::{ColumnType, FieldMapping, FieldMeta, JsonConverter, TableMapping};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn table_metadata_and_listing() {
    let fx = Fixture::setup(models!(Employee, Counter)).await;

    let table = assert_ok!(
        fx.session
            .get_table_metadata(fx.database(), "employee", None)
            .await
    );
    let columns: Vec<_> = table.columns.iter().map(|column| column.name.as_str()).collect();
    assert_eq!(columns, ["id", "name", "age", "magic"]);
    assert!(!table.columns[1].nullable);

    let mut tables = assert_ok!(fx.session.list_tables(fx.database(), None).await);
    tables.sort();
    assert_eq!(tables, ["counter", "employee"]);

    let err = assert_err!(
        fx.factory
            .get_table_metadata(fx.database(), "nowhere", None)
            .await
    );
    assert!(err.to_string().contains("nowhere"), "{err}");

    fx.teardown().await;
}

#[tokio::test]
async fn create_table_is_idempotent() {
    let fx = Fixture::setup(models!(Employee)).await;

    assert_ok!(fx.session.persist(Employee::new(1, "Ada", 36, 7), None).await);
    assert_ok!(fx.session.create_table(Employee::mapping(), None).await);

    // The existing table and its rows are kept
    assert_some!(assert_ok!(fx.session.find::<Employee>(1, None).await));

    let invalid = TableMapping::new("");
    assert_err!(fx.session.create_table(invalid, None).await);

    fx.teardown().await;
}

#[tokio::test]
async fn objects_by_table_name() {
    let fx = Fixture::setup(models!(Employee)).await;
    let session = &fx.session;

    let row = Object::new()
        .with("id", 1)
        .with("name", "Ada")
        .with("age", 36)
        .with("magic", 7);
    assert_ok!(session.persist_by_name("employee", row, None).await);

    let qualified = format!("{}.employee", fx.database());
    let found = assert_some!(assert_ok!(session.find_by_name(&qualified, 1, None).await));
    assert_eq!(found.get("name"), Some(&Value::from("Ada")));

    assert_ok!(
        session
            .update_by_name("employee", 1, Object::new().with("age", 37), None)
            .await
    );
    assert_ok!(
        session
            .save_by_name(
                "employee",
                Object::new().with("id", 2).with("name", "Alan"),
                None
            )
            .await
    );

    // Typed and by-name access see the same rows
    let ada = assert_some!(assert_ok!(session.find::<Employee>(1, None).await));
    assert_eq!(ada.age, Some(37));
    let alan = assert_some!(assert_ok!(session.find::<Employee>(2, None).await));
    assert_eq!(alan.magic, None);

    assert_ok!(session.remove_by_name("employee", 2, None).await);
    assert_none!(assert_ok!(session.find_by_name("employee", 2, None).await));

    assert_err!(session.find_by_name("no_such_table", 1, None).await);

    fx.teardown().await;
}

#[tokio::test]
async fn column_names_differ_from_field_names() {
    let fx = Fixture::setup(models!(Counter)).await;

    let counter = assert_ok!(
        fx.session
            .persist(Counter { id: None, label: "hits".into() }, None)
            .await
    );

    let row = assert_some!(assert_ok!(
        fx.session.find_by_name("counter", counter.id, None).await
    ));
    assert_eq!(row.get("counter_label"), Some(&Value::from("hits")));
    assert_eq!(row.get("label"), None);

    let mapping = assert_ok!(fx.factory.get_mapping::<Counter>(None).await);
    let label = assert_some!(mapping.field("label"));
    assert_eq!(label.column_name, "counter_label");

    fx.teardown().await;
}

#[tokio::test]
async fn unmapped_columns_get_default_fields() {
    let fx = Fixture::setup(models!(Employee)).await;

    let mapping = assert_ok!(fx.factory.get_mapping_by_name("employee", None).await);
    let fields: Vec<_> = mapping.fields.iter().map(|field| field.field_name.as_str()).collect();
    assert_eq!(fields, ["id", "name", "age", "magic"]);

    fx.teardown().await;
}

#[tokio::test]
async fn sparse_fields_share_a_column() {
    let fx = Fixture::setup(models!(Profile)).await;

    let profile = Profile {
        id: 1,
        color: Some("red".into()),
        size: Some(3),
    };
    assert_ok!(fx.session.persist(profile.clone(), None).await);

    let found = assert_some!(assert_ok!(fx.session.find::<Profile>(1, None).await));
    assert_eq!(found, profile);

    // Read by name, the column holds the JSON text
    let row = assert_some!(assert_ok!(fx.session.find_by_name("profile", 1, None).await));
    assert_eq!(
        row.get("extras"),
        Some(&Value::from(r#"{"color":"red","size":3}"#))
    );

    fx.teardown().await;
}

#[tokio::test]
async fn type_converters_apply_by_column_type() {
    tests::init_tracing();

    // A pool of its own, since converters are registered pool-wide
    let mut properties = tests::properties();
    properties.host = "converters".to_string();

    let factory = assert_ok!(keel::connect(properties, models!(Profile), None).await);
    let session = assert_ok!(factory.open_session(None).await);
    assert_ok!(session.create_table(Profile::mapping(), None).await);

    let profile = Profile {
        id: 1,
        color: Some("blue".into()),
        size: None,
    };
    assert_ok!(session.persist(profile, None).await);

    factory.register_type_converter("json", Some(Arc::new(JsonConverter)));

    let row = assert_some!(assert_ok!(session.find_by_name("profile", 1, None).await));
    let extras = assert_some!(row.get("extras").and_then(Value::as_object));
    assert_eq!(extras.get("color"), Some(&Value::from("blue")));

    factory.register_type_converter("json", None);
    let row = assert_some!(assert_ok!(session.find_by_name("profile", 1, None).await));
    assert!(row.get("extras").and_then(Value::as_str).is_some());

    assert_ok!(factory.close(None).await);
}

#[tokio::test]
async fn factory_close_ends_sessions() {
    let fx = Fixture::setup(models!(Employee)).await;

    let second = assert_ok!(fx.factory.open_session(None).await);
    assert_eq!(fx.factory.open_session_count(), 2);

    assert_ok!(second.close(None).await);
    assert_eq!(fx.factory.open_session_count(), 1);

    let factory = fx.factory.clone();
    fx.teardown().await;

    assert!(factory.is_closed());
    assert_err!(factory.open_session(None).await);
}

#[tokio::test]
async fn connect_rejects_unknown_adapter() {
    let properties = ConnectionProperties::new("carrier-pigeon");
    let err = assert_err!(keel::connect(properties, models!(), None).await);
    assert!(err.to_string().contains("unsupported adapter"), "{err}");

    let properties = assert_ok!(ConnectionProperties::from_url("memory://localhost/inventory"));
    assert_eq!(properties.database, "inventory");

    let mapping = TableMapping::new("widget")
        .map_field(FieldMapping::new("id").meta(FieldMeta::new(ColumnType::Int).primary_key()));
    assert!(mapping.is_valid());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_use_shares_one_handler() {
    let fx = Fixture::setup(models!(Employee)).await;

    // Nothing has resolved a handler yet; these all race to build one
    let typed: Vec<_> = (0..8)
        .map(|_| fx.session.create_query::<Employee>(None))
        .collect();
    let named: Vec<_> = (0..8)
        .map(|_| fx.session.create_query_by_name("employee", None))
        .collect();

    let mut typed_handlers = vec![];
    for promise in typed {
        let query = assert_ok!(promise.await);
        typed_handlers.push(query.domain_type().handler().clone());
    }

    let mut named_handlers = vec![];
    for promise in named {
        let query = assert_ok!(promise.await);
        named_handlers.push(query.domain_type().handler().clone());
    }

    for handler in &typed_handlers[1..] {
        assert!(Arc::ptr_eq(&typed_handlers[0], handler));
    }
    for handler in &named_handlers[1..] {
        assert!(Arc::ptr_eq(&named_handlers[0], handler));
    }

    // Later uses get the cached handler too
    let query = assert_ok!(fx.session.create_query::<Employee>(None).await);
    assert!(Arc::ptr_eq(&typed_handlers[0], query.domain_type().handler()));

    fx.teardown().await;
}

#[tokio::test]
async fn factories_share_a_pool_until_the_last_closes() {
    tests::init_tracing();

    // A connection key no other test uses
    let mut properties = tests::properties();
    properties.host = "shared-pool".to_string();
    let database = properties.database.clone();

    let first = assert_ok!(keel::connect(properties.clone(), models!(Employee), None).await);
    let second = assert_ok!(keel::connect(properties.clone(), models!(Employee), None).await);

    let writer = assert_ok!(first.open_session(None).await);
    assert_ok!(writer.persist(Employee::new(1, "Ada", 36, 7), None).await);

    // The second factory reads the row through the same pool
    let reader = assert_ok!(second.open_session(None).await);
    assert_some!(assert_ok!(reader.find::<Employee>(1, None).await));

    assert_ok!(first.close(None).await);
    assert!(first.is_closed());
    assert_some!(assert_ok!(reader.find::<Employee>(1, None).await));

    assert_ok!(second.close(None).await);

    // Once both are closed, connecting again starts from an empty pool
    let third = assert_ok!(keel::connect(properties, models!(Employee), None).await);
    let session = assert_ok!(third.open_session(None).await);
    assert!(assert_ok!(session.list_tables(&database, None).await).is_empty());
    assert_ok!(third.close(None).await);
}

#[tokio::test]
async fn standalone_session_closes_its_factory() {
    tests::init_tracing();

    let session = assert_ok!(keel::open_session(tests::properties(), models!(Employee), None).await);
    assert_ok!(session.create_table(Employee::mapping(), None).await);
    assert_ok!(session.persist(Employee::new(1, "Ada", 36, 7), None).await);

    let factory = session.factory().clone();
    assert_ok!(session.close(None).await);

    assert!(factory.is_closed());
    assert_eq!(factory.open_session_count(), 0);
    assert_err!(factory.open_session(None).await);
}
