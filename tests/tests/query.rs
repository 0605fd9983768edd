use tests::prelude::*;

use pretty_assertions::assert_eq;

async fn staff() -> Fixture {
    let fx = Fixture::setup(models!(Employee)).await;

    for employee in [
        Employee::new(1, "Ada", 36, 7),
        Employee::new(2, "Alan", 41, 8),
        Employee::new(3, "Grace", 45, 11),
        Employee::new(4, "Edsger", 29, 13),
        Employee {
            id: 5,
            name: "Barbara".into(),
            age: None,
            magic: None,
        },
    ] {
        assert_ok!(fx.session.persist(employee, None).await);
    }

    fx
}

fn ids(employees: &[Employee]) -> Vec<i32> {
    employees.iter().map(|employee| employee.id).collect()
}

#[tokio::test]
async fn plan_picks_the_access_path() {
    let fx = staff().await;
    let session = &fx.session;

    let plan_of = |field: &'static str, range: bool| {
        let session = session.clone();
        async move {
            let mut query = assert_ok!(session.create_query::<Employee>(None).await);
            let field = assert_ok!(query.field(field));
            let predicate = if range {
                field.gt(query.param("p"))
            } else {
                field.eq(query.param("p"))
            };
            assert_ok!(query.where_(predicate));
            query.plan().query_type().code()
        }
    };

    assert_eq!(plan_of("id", false).await, 0);
    assert_eq!(plan_of("magic", false).await, 1);
    assert_eq!(plan_of("age", true).await, 2);
    assert_eq!(plan_of("name", false).await, 3);

    let query = assert_ok!(session.create_query::<Employee>(None).await);
    assert_eq!(query.plan().query_type().code(), 3);

    fx.teardown().await;
}

#[tokio::test]
async fn key_lookups() {
    let fx = staff().await;

    let mut query = assert_ok!(fx.session.create_query::<Employee>(None).await);
    let id = assert_ok!(query.field("id"));
    assert_ok!(query.where_(id.eq(query.param("id"))));

    let found = assert_ok!(
        query
            .execute(Object::new().with("id", 3), QueryOptions::new(), None)
            .await
    );
    assert_eq!(found, vec![Employee::new(3, "Grace", 45, 11)]);

    let none = assert_ok!(
        query
            .execute(Object::new().with("id", 99), QueryOptions::new(), None)
            .await
    );
    assert!(none.is_empty());

    let mut query = assert_ok!(fx.session.create_query::<Employee>(None).await);
    let magic = assert_ok!(query.field("magic"));
    assert_ok!(query.where_(magic.eq(query.param("magic"))));

    let found = assert_ok!(
        query
            .execute(Object::new().with("magic", 8), QueryOptions::new(), None)
            .await
    );
    assert_eq!(ids(&found), [2]);

    fx.teardown().await;
}

#[tokio::test]
async fn index_scan_with_order_and_paging() {
    let fx = staff().await;

    let mut query = assert_ok!(fx.session.create_query::<Employee>(None).await);
    let age = assert_ok!(query.field("age"));
    assert_ok!(query.where_(age.ge(query.param("min"))));

    let params = Object::new().with("min", 36);

    let ascending = assert_ok!(
        query
            .execute(params.clone(), QueryOptions::new().order("asc"), None)
            .await
    );
    assert_eq!(ids(&ascending), [1, 2, 3]);

    let top_two = assert_ok!(
        query
            .execute(params.clone(), QueryOptions::new().order("DESC").limit(2), None)
            .await
    );
    assert_eq!(ids(&top_two), [3, 2]);

    let skipped = assert_ok!(
        query
            .execute(params, QueryOptions::new().order("asc").skip(1), None)
            .await
    );
    assert_eq!(ids(&skipped), [2, 3]);

    fx.teardown().await;
}

#[tokio::test]
async fn table_scan_combines_predicates() {
    let fx = staff().await;

    let mut query = assert_ok!(fx.session.create_query::<Employee>(None).await);
    let age = assert_ok!(query.field("age"));
    let name = assert_ok!(query.field("name"));
    assert_ok!(query.where_(
        age.between(query.param("low"), query.param("high"))
            .and(name.eq(query.param("name")).not())
    ));

    let params = Object::new()
        .with("low", 30)
        .with("high", 45)
        .with("name", "Alan");
    let mut found = assert_ok!(query.execute(params, QueryOptions::new(), None).await);
    found.sort_by_key(|employee| employee.id);
    assert_eq!(ids(&found), [1, 3]);

    let mut query = assert_ok!(fx.session.create_query::<Employee>(None).await);
    let name = assert_ok!(query.field("name"));
    let age = assert_ok!(query.field("age"));
    assert_ok!(query.where_(name.in_(query.param("names")).or(age.is_null())));

    let names = Value::List(vec!["Ada".into(), "Edsger".into()]);
    let mut found = assert_ok!(
        query
            .execute(Object::new().with("names", names), QueryOptions::new(), None)
            .await
    );
    found.sort_by_key(|employee| employee.id);
    assert_eq!(ids(&found), [1, 4, 5]);

    fx.teardown().await;
}

#[tokio::test]
async fn nulls_sort_first() {
    let fx = staff().await;

    let query = assert_ok!(fx.session.create_query::<Employee>(None).await);
    let all = assert_ok!(
        query
            .execute(Object::new(), QueryOptions::new().order("asc"), None)
            .await
    );

    // Without a predicate the primary key orders the rows
    assert_eq!(ids(&all), [1, 2, 3, 4, 5]);

    // The age index orders these, with the missing age first
    let mut query = assert_ok!(fx.session.create_query::<Employee>(None).await);
    let age = assert_ok!(query.field("age"));
    assert_ok!(query.where_(age.lt(query.param("max")).or(age.is_null())));
    assert_eq!(query.plan().query_type().code(), 2);

    let found = assert_ok!(
        query
            .execute(Object::new().with("max", 40), QueryOptions::new().order("asc"), None)
            .await
    );
    assert_eq!(ids(&found), [5, 4, 1]);

    fx.teardown().await;
}

#[tokio::test]
async fn query_by_name_returns_objects() {
    let fx = staff().await;

    let mut query = assert_ok!(fx.session.create_query_by_name("employee", None).await);
    let age = assert_ok!(query.field("age"));
    assert_ok!(query.where_(age.gt(query.param("min"))));

    let rows = assert_ok!(
        query
            .execute(Object::new().with("min", 40), QueryOptions::new().order("asc"), None)
            .await
    );
    let names: Vec<_> = rows.iter().map(|row| row.get("name").cloned()).collect();
    assert_eq!(names, [Some(Value::from("Alan")), Some(Value::from("Grace"))]);

    fx.teardown().await;
}

#[tokio::test]
async fn invalid_options_are_rejected() {
    let fx = staff().await;
    let query = assert_ok!(fx.session.create_query::<Employee>(None).await);

    let err = assert_err!(
        query
            .execute(Object::new(), QueryOptions::new().order("sideways"), None)
            .await
    );
    assert!(err.to_string().contains("Bad order parameter 'sideways'"));

    let err = assert_err!(
        query
            .execute(Object::new(), QueryOptions::new().skip(2), None)
            .await
    );
    assert!(err.to_string().contains("skip requires order"));

    let err = assert_err!(
        query
            .execute(Object::new(), QueryOptions::new().limit(-1), None)
            .await
    );
    assert!(err.to_string().contains("Bad limit parameter '-1'"));

    fx.teardown().await;
}

#[tokio::test]
async fn missing_parameter_is_rejected() {
    let fx = staff().await;

    let mut query = assert_ok!(fx.session.create_query::<Employee>(None).await);
    let age = assert_ok!(query.field("age"));
    assert_ok!(query.where_(age.gt(query.param("min"))));

    let err = assert_err!(query.execute(Object::new(), QueryOptions::new(), None).await);
    assert!(err.to_string().contains("`min`"));

    // The predicate cannot be replaced
    let id = assert_ok!(query.field("id"));
    assert_err!(query.where_(id.eq(query.param("id"))));

    assert_err!(query.field("salary"));

    fx.teardown().await;
}

#[tokio::test]
async fn or_over_a_key_still_finds_every_row() {
    let fx = staff().await;

    let mut query = assert_ok!(fx.session.create_query::<Employee>(None).await);
    let id = assert_ok!(query.field("id"));
    let name = assert_ok!(query.field("name"));
    assert_ok!(query.where_(id.eq(query.param("id")).or(name.eq(query.param("name")))));

    // Planned as a key lookup, but rows outside the key still match
    assert_eq!(query.plan().query_type().code(), 0);

    let params = Object::new().with("id", 1).with("name", "Grace");
    let mut found = assert_ok!(query.execute(params, QueryOptions::new(), None).await);
    found.sort_by_key(|employee| employee.id);
    assert_eq!(ids(&found), [1, 3]);

    fx.teardown().await;
}
