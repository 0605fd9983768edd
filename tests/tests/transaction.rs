use tests::prelude::*;

use pretty_assertions::assert_eq;

#[tokio::test]
async fn commit_keeps_changes() {
    let fx = Fixture::setup(models!(Employee)).await;
    let tx = fx.session.current_transaction();

    assert_eq!(tx.state(), TransactionState::Idle);
    assert_ok!(tx.begin(None).await);
    assert!(tx.is_active());

    assert_ok!(fx.session.persist(Employee::new(1, "Ada", 36, 7), None).await);
    assert_ok!(tx.commit(None).await);
    assert_eq!(tx.state(), TransactionState::Idle);

    assert_some!(assert_ok!(fx.session.find::<Employee>(1, None).await));

    fx.teardown().await;
}

#[tokio::test]
async fn rollback_discards_changes() {
    let fx = Fixture::setup(models!(Employee)).await;
    let tx = fx.session.current_transaction();

    assert_ok!(fx.session.persist(Employee::new(1, "Ada", 36, 7), None).await);

    assert_ok!(tx.begin(None).await);
    assert_ok!(fx.session.persist(Employee::new(2, "Alan", 41, 8), None).await);
    assert_ok!(fx.session.remove::<Employee>(1, None).await);
    assert_ok!(tx.rollback(None).await);

    assert_some!(assert_ok!(fx.session.find::<Employee>(1, None).await));
    assert_none!(assert_ok!(fx.session.find::<Employee>(2, None).await));

    fx.teardown().await;
}

#[tokio::test]
async fn illegal_transitions_report_25000() {
    let fx = Fixture::setup(models!(Employee)).await;
    let tx = fx.session.current_transaction();

    let err = assert_sqlstate!(tx.commit(None).await, "25000");
    assert_eq!(err.to_string(), "Illegal state: Idle cannot commit.");
    assert_sqlstate!(tx.rollback(None).await, "25000");
    assert_sqlstate!(tx.set_rollback_only(), "25000");

    assert_ok!(tx.begin(None).await);
    let err = assert_sqlstate!(tx.begin(None).await, "25000");
    assert_eq!(err.to_string(), "Illegal state: Active cannot begin.");

    // A failed transition leaves the state alone
    assert_eq!(tx.state(), TransactionState::Active);
    assert_ok!(tx.rollback(None).await);

    fx.teardown().await;
}

#[tokio::test]
async fn rollback_only_cannot_commit() {
    let fx = Fixture::setup(models!(Employee)).await;
    let tx = fx.session.current_transaction();

    assert_ok!(tx.begin(None).await);
    assert_ok!(tx.set_rollback_only());
    assert!(tx.get_rollback_only());
    assert!(tx.is_active());

    assert_sqlstate!(tx.begin(None).await, "25000");
    assert_sqlstate!(tx.commit(None).await, "25000");
    assert_eq!(tx.state(), TransactionState::RollbackOnly);

    assert_ok!(tx.rollback(None).await);
    assert_eq!(tx.state(), TransactionState::Idle);

    fx.teardown().await;
}

#[tokio::test]
async fn failed_operation_marks_rollback_only() {
    let fx = Fixture::setup(models!(Employee)).await;
    let tx = fx.session.current_transaction();

    assert_ok!(tx.begin(None).await);
    assert_ok!(fx.session.persist(Employee::new(1, "Ada", 36, 7), None).await);

    assert_sqlstate!(
        fx.session
            .update::<Employee>(2, Object::new().with("age", 50), None)
            .await,
        "02000"
    );
    assert_eq!(tx.state(), TransactionState::RollbackOnly);

    assert_sqlstate!(tx.commit(None).await, "25000");
    assert_ok!(tx.rollback(None).await);

    assert_none!(assert_ok!(fx.session.find::<Employee>(1, None).await));

    fx.teardown().await;
}

#[tokio::test]
async fn failure_outside_transaction_leaves_it_idle() {
    let fx = Fixture::setup(models!(Employee)).await;
    let tx = fx.session.current_transaction();

    assert_ok!(fx.session.persist(Employee::new(1, "Ada", 36, 7), None).await);
    assert_sqlstate!(
        fx.session.persist(Employee::new(1, "Ada", 36, 7), None).await,
        "23000"
    );
    assert_eq!(tx.state(), TransactionState::Idle);

    fx.teardown().await;
}

#[tokio::test]
async fn callback_sees_the_promise_outcome() {
    let fx = Fixture::setup(models!(Employee)).await;
    let tx = fx.session.current_transaction();

    let (send, recv) = tokio::sync::oneshot::channel();
    let promise = tx.commit(Some(Box::new(move |result: keel::Result<()>| {
        let _ = send.send(result.map_err(|err| err.to_string()));
    })));

    let err = assert_err!(promise.await);
    let seen = assert_ok!(recv.await);
    assert_eq!(seen, Err(err.to_string()));

    fx.teardown().await;
}
