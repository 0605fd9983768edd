use tests::prelude::*;

use pretty_assertions::assert_eq;

#[tokio::test]
async fn persist_then_find() {
    let fx = Fixture::setup(models!(Employee)).await;
    let session = &fx.session;

    let ada = Employee::new(1, "Ada", 36, 7);
    let persisted = assert_ok!(session.persist(ada.clone(), None).await);
    assert_eq!(persisted, ada);

    let found = assert_some!(assert_ok!(session.find::<Employee>(1, None).await));
    assert_eq!(found, ada);

    // Any unique index can serve a find
    let by_magic = assert_ok!(
        session
            .find::<Employee>(Object::new().with("magic", 7), None)
            .await
    );
    assert_eq!(by_magic, Some(ada));

    fx.teardown().await;
}

#[tokio::test]
async fn find_missing_row_is_none() {
    let fx = Fixture::setup(models!(Employee)).await;

    let found = assert_ok!(fx.session.find::<Employee>(42, None).await);
    assert_none!(found);

    // Not finding a row does not doom a transaction
    let tx = fx.session.current_transaction();
    assert_ok!(tx.begin(None).await);
    assert_none!(assert_ok!(fx.session.find::<Employee>(42, None).await));
    assert_eq!(tx.state(), TransactionState::Active);
    assert_ok!(tx.rollback(None).await);

    fx.teardown().await;
}

#[tokio::test]
async fn update_and_remove() {
    let fx = Fixture::setup(models!(Employee)).await;
    let session = &fx.session;

    assert_ok!(session.persist(Employee::new(1, "Ada", 36, 7), None).await);

    assert_ok!(
        session
            .update::<Employee>(1, Object::new().with("age", 37), None)
            .await
    );
    let found = assert_some!(assert_ok!(session.find::<Employee>(1, None).await));
    assert_eq!(found.age, Some(37));
    assert_eq!(found.name, "Ada");

    assert_ok!(session.remove::<Employee>(1, None).await);
    assert_none!(assert_ok!(session.find::<Employee>(1, None).await));

    // Removing again matches no row
    assert_sqlstate!(session.remove::<Employee>(1, None).await, "02000");

    fx.teardown().await;
}

#[tokio::test]
async fn update_missing_row_fails() {
    let fx = Fixture::setup(models!(Employee)).await;

    let err = assert_sqlstate!(
        fx.session
            .update::<Employee>(9, Object::new().with("name", "Nobody"), None)
            .await,
        "02000"
    );
    assert!(err.is_not_found());

    fx.teardown().await;
}

#[tokio::test]
async fn load_fills_instance() {
    let fx = Fixture::setup(models!(Employee)).await;
    let session = &fx.session;

    assert_ok!(session.persist(Employee::new(3, "Grace", 45, 11), None).await);

    let shell = Employee {
        id: 3,
        ..Default::default()
    };
    let loaded = assert_ok!(session.load(shell, None).await);
    assert_eq!(loaded, Employee::new(3, "Grace", 45, 11));

    fx.teardown().await;
}

#[tokio::test]
async fn persist_duplicate_key_fails() {
    let fx = Fixture::setup(models!(Employee)).await;
    let session = &fx.session;

    assert_ok!(session.persist(Employee::new(1, "Ada", 36, 7), None).await);

    let err = assert_sqlstate!(
        session.persist(Employee::new(1, "Alan", 41, 8), None).await,
        "23000"
    );
    assert_eq!(err.code(), Some(1062));

    // A unique index other than the primary key collides too
    assert_sqlstate!(
        session.persist(Employee::new(2, "Alan", 41, 7), None).await,
        "23000"
    );

    fx.teardown().await;
}

#[tokio::test]
async fn persist_missing_required_field_fails() {
    let fx = Fixture::setup(models!(Employee)).await;

    let err = assert_sqlstate!(
        fx.session
            .persist_by_name("employee", Object::new().with("id", 5), None)
            .await,
        "23000"
    );
    assert_eq!(err.code(), Some(1048));

    fx.teardown().await;
}

#[tokio::test]
async fn save_inserts_or_replaces() {
    let fx = Fixture::setup(models!(Employee)).await;
    let session = &fx.session;

    assert_ok!(session.save(Employee::new(1, "Ada", 36, 7), None).await);
    assert_ok!(session.save(Employee::new(1, "Ada Lovelace", 37, 7), None).await);

    let found = assert_some!(assert_ok!(session.find::<Employee>(1, None).await));
    assert_eq!(found.name, "Ada Lovelace");
    assert_eq!(found.age, Some(37));

    fx.teardown().await;
}

#[tokio::test]
async fn auto_increment_key_is_returned() {
    let fx = Fixture::setup(models!(Counter)).await;
    let session = &fx.session;

    let first = assert_ok!(
        session
            .persist(Counter { id: None, label: "one".into() }, None)
            .await
    );
    let second = assert_ok!(
        session
            .persist(Counter { id: None, label: "two".into() }, None)
            .await
    );
    assert_eq!(first.id, Some(1));
    assert_eq!(second.id, Some(2));

    // An explicit key moves the counter past it
    assert_ok!(
        session
            .persist(Counter { id: Some(10), label: "ten".into() }, None)
            .await
    );
    let next = assert_ok!(
        session
            .persist(Counter { id: None, label: "eleven".into() }, None)
            .await
    );
    assert_eq!(next.id, Some(11));

    let found = assert_some!(assert_ok!(session.find::<Counter>(2i64, None).await));
    assert_eq!(found.label, "two");

    fx.teardown().await;
}

#[tokio::test]
async fn unmapped_type_is_rejected() {
    let fx = Fixture::setup(models!(Employee)).await;

    assert_err!(fx.session.find::<Counter>(1i64, None).await);

    fx.teardown().await;
}

#[tokio::test]
async fn closed_session_rejects_operations() {
    let fx = Fixture::setup(models!(Employee)).await;

    assert_ok!(fx.session.close(None).await);
    assert!(fx.session.is_closed());
    assert_eq!(fx.factory.open_session_count(), 0);

    let err = assert_err!(fx.session.find::<Employee>(1, None).await);
    assert!(err.to_string().contains("session is closed"));

    // Closing twice is harmless
    assert_ok!(fx.session.close(None).await);

    fx.teardown().await;
}
