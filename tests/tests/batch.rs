use tests::prelude::*;

use pretty_assertions::assert_eq;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

#[tokio::test]
async fn execute_runs_operations_in_order() {
    let fx = Fixture::setup(models!(Employee)).await;
    let batch = fx.session.create_batch();

    let ada = batch.persist(Employee::new(1, "Ada", 36, 7), None);
    let alan = batch.persist(Employee::new(2, "Alan", 41, 8), None);
    let update = batch.update::<Employee>(1, Object::new().with("age", 37), None);
    let found = batch.find::<Employee>(1, None);
    assert_eq!(batch.get_operation_count(), 4);

    assert_ok!(batch.execute(None).await);
    assert_eq!(batch.get_operation_count(), 0);

    assert_ok!(ada.await);
    assert_ok!(alan.await);
    assert_ok!(update.await);

    // The find sees the update queued before it
    let found = assert_some!(assert_ok!(found.await));
    assert_eq!(found.age, Some(37));

    fx.teardown().await;
}

#[tokio::test]
async fn one_failure_does_not_fail_the_others() {
    let fx = Fixture::setup(models!(Employee)).await;
    assert_ok!(fx.session.persist(Employee::new(1, "Ada", 36, 7), None).await);

    let batch = fx.session.create_batch();
    let duplicate = batch.persist(Employee::new(1, "Ada", 36, 7), None);
    let fresh = batch.persist(Employee::new(2, "Alan", 41, 8), None);
    let missing = batch.find::<Employee>(3, None);

    assert_ok!(batch.execute(None).await);

    assert_sqlstate!(duplicate.await, "23000");
    assert_ok!(fresh.await);
    assert_none!(assert_ok!(missing.await));

    fx.teardown().await;
}

#[tokio::test]
async fn clear_fails_queued_operations() {
    let fx = Fixture::setup(models!(Employee)).await;
    let batch = fx.session.create_batch();

    let seen = Arc::new(Mutex::new(vec![]));
    let callback = {
        let seen = seen.clone();
        Box::new(move |result: keel::Result<Employee>| {
            seen.lock().unwrap().push(result.map(|e| e.id).map_err(|e| e.to_string()));
        })
    };

    let persisted = batch.persist(Employee::new(1, "Ada", 36, 7), Some(callback));
    let removed = batch.remove::<Employee>(5, None);
    assert_eq!(batch.get_operation_count(), 2);

    batch.clear();
    assert_eq!(batch.get_operation_count(), 0);

    let err = assert_err!(persisted.await);
    assert!(err.is_batch_cleared());
    assert_eq!(err.to_string(), "Batch was cleared");
    assert!(assert_err!(removed.await).is_batch_cleared());

    // The callback ran before `clear` returned
    assert_eq!(*seen.lock().unwrap(), vec![Err("Batch was cleared".to_string())]);

    // Nothing reached storage
    assert_ok!(batch.execute(None).await);
    assert_none!(assert_ok!(fx.session.find::<Employee>(1, None).await));

    fx.teardown().await;
}

#[tokio::test]
async fn empty_batch_executes() {
    let fx = Fixture::setup(models!(Employee)).await;
    let batch = fx.session.create_batch();

    assert_eq!(batch.get_operation_count(), 0);
    assert_ok!(batch.execute(None).await);

    fx.teardown().await;
}

#[tokio::test]
async fn batch_joins_the_session_transaction() {
    let fx = Fixture::setup(models!(Employee)).await;
    let tx = fx.session.current_transaction();

    assert_ok!(tx.begin(None).await);

    let batch = fx.session.create_batch();
    let ada = batch.persist(Employee::new(1, "Ada", 36, 7), None);
    let missing = batch.update::<Employee>(9, Object::new().with("age", 1), None);
    assert_ok!(batch.execute(None).await);

    assert_ok!(ada.await);
    assert_sqlstate!(missing.await, "02000");
    assert!(tx.get_rollback_only());

    assert_ok!(tx.rollback(None).await);
    assert_none!(assert_ok!(fx.session.find::<Employee>(1, None).await));

    fx.teardown().await;
}

#[tokio::test]
async fn unmapped_type_fails_only_its_operation() {
    let fx = Fixture::setup(models!(Employee)).await;
    let batch = fx.session.create_batch();

    let unmapped = batch.find::<Counter>(1i64, None);
    let ada = batch.persist(Employee::new(1, "Ada", 36, 7), None);

    assert_ok!(batch.execute(None).await);
    assert_err!(unmapped.await);
    assert_ok!(ada.await);

    fx.teardown().await;
}

#[tokio::test]
async fn concurrent_executes_all_settle() {
    let fx = Fixture::setup(models!(Employee)).await;
    let batch = fx.session.create_batch();

    // Both wait on the same pending entry; one runs it, the other finds the
    // queue empty
    let first = batch.execute(None);
    let second = batch.execute(None);
    let ada = batch.persist(Employee::new(1, "Ada", 36, 7), None);

    let limit = Duration::from_secs(5);
    assert_ok!(assert_ok!(tokio::time::timeout(limit, first).await));
    assert_ok!(assert_ok!(tokio::time::timeout(limit, second).await));
    assert_ok!(assert_ok!(tokio::time::timeout(limit, ada).await));

    assert_some!(assert_ok!(fx.session.find::<Employee>(1, None).await));
    assert_eq!(batch.get_operation_count(), 0);

    fx.teardown().await;
}
