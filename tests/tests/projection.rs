use tests::prelude::*;

use pretty_assertions::assert_eq;

async fn league() -> Fixture {
    let fx = Fixture::setup(models!(Team, Member)).await;
    let session = &fx.session;

    for (id, name) in [(1, "Engines"), (2, "Compilers")] {
        let team = Team {
            id,
            name: name.into(),
            members: vec![],
        };
        assert_ok!(session.persist(team, None).await);
    }

    for member in [
        Member::new(10, "Ada", 1),
        Member::new(11, "Charles", 1),
        Member::new(12, "Grace", 3),
    ] {
        assert_ok!(session.persist(member, None).await);
    }

    fx
}

fn names(objects: &[Object], field: &str) -> Vec<Value> {
    objects
        .iter()
        .map(|object| object.get(field).cloned().unwrap_or_default())
        .collect()
}

#[tokio::test]
async fn one_to_many_through_foreign_key() {
    let fx = league().await;

    let projection = Projection::of::<Team>()
        .field("name")
        .relationship("members", Projection::of::<Member>().field("name"));

    let team = assert_some!(assert_ok!(
        fx.session.find_with_projection::<Team>(&projection, 1, None).await
    ));
    assert_eq!(team.name, "Engines");
    assert_eq!(
        names(&team.members, "name"),
        [Value::from("Ada"), Value::from("Charles")]
    );

    // Only projected fields are read; keys always are
    assert_eq!(team.members[0].get("id"), Some(&Value::I32(10)));
    assert_eq!(team.members[0].get("team_id"), Some(&Value::Null));

    fx.teardown().await;
}

#[tokio::test]
async fn root_without_related_rows() {
    let fx = league().await;

    let projection = Projection::of::<Team>().relationship("members", Projection::of::<Member>());

    let team = assert_some!(assert_ok!(
        fx.session.find_with_projection::<Team>(&projection, 2, None).await
    ));
    assert_eq!(team.name, "Compilers");
    assert!(team.members.is_empty());

    let missing = assert_ok!(
        fx.session.find_with_projection::<Team>(&projection, 9, None).await
    );
    assert!(missing.is_none());

    fx.teardown().await;
}

#[tokio::test]
async fn many_to_one_from_the_child() {
    let fx = league().await;

    let projection = Projection::of::<Member>().relationship("team", Projection::of::<Team>());

    let member = assert_some!(assert_ok!(
        fx.session.find_with_projection::<Member>(&projection, 11, None).await
    ));
    let team = assert_some!(member.team);
    assert_eq!(team.get("name"), Some(&Value::from("Engines")));

    // Grace's team does not exist
    let member = assert_some!(assert_ok!(
        fx.session.find_with_projection::<Member>(&projection, 12, None).await
    ));
    assert!(member.team.is_none());

    fx.teardown().await;
}

#[tokio::test]
async fn many_to_many_through_join_table() {
    let fx = Fixture::with_tables(models!(Student, Course), vec![enrollment()]).await;
    let session = &fx.session;

    for (id, title) in [(1, "Logic"), (2, "Algebra"), (3, "Topology")] {
        let course = Course {
            id,
            title: title.into(),
        };
        assert_ok!(session.persist(course, None).await);
    }
    let student = Student {
        id: 7,
        name: "Emmy".into(),
        courses: vec![],
    };
    assert_ok!(session.persist(student, None).await);

    for course_id in [2, 3] {
        let row = Object::new().with("student_id", 7).with("course_id", course_id);
        assert_ok!(session.persist_by_name("enrollment", row, None).await);
    }

    let projection = Projection::of::<Student>().relationship("courses", Projection::of::<Course>());
    let resolved = assert_ok!(session.validate_projection(&projection, None).await);
    assert_eq!(resolved.sectors().len(), 2);
    assert_eq!(resolved.row_width(), 4);

    let student = assert_some!(assert_ok!(
        session.find_with_projection::<Student>(&projection, 7, None).await
    ));
    assert_eq!(
        names(&student.courses, "title"),
        [Value::from("Algebra"), Value::from("Topology")]
    );

    fx.teardown().await;
}

#[tokio::test]
async fn recursive_projection_is_rejected() {
    let fx = league().await;

    let projection = Projection::of::<Team>().relationship(
        "members",
        Projection::of::<Member>().relationship("team", Projection::of::<Team>()),
    );

    let err = assert_err!(fx.session.validate_projection(&projection, None).await);
    assert!(err.to_string().contains("recursive projection"), "{err}");

    fx.teardown().await;
}

#[tokio::test]
async fn every_problem_is_reported() {
    let fx = league().await;

    let projection = Projection::of::<Team>()
        .fields(["budget", "members"])
        .relationship("name", Projection::of::<Member>());

    let err = assert_err!(fx.session.validate_projection(&projection, None).await);
    let message = err.to_string();
    assert!(message.contains("has no field `budget`"), "{message}");
    assert!(message.contains("`members` is a relationship"), "{message}");
    assert!(message.contains("`name` is not a relationship"), "{message}");

    // The projection's root must be the type read
    assert_err!(
        fx.session
            .find_with_projection::<Member>(&Projection::of::<Team>(), 1, None)
            .await
    );

    fx.teardown().await;
}

#[tokio::test]
async fn unmapped_type_in_projection() {
    let fx = Fixture::setup(models!(Course)).await;

    let err = assert_err!(
        fx.session
            .validate_projection(&Projection::of::<Employee>(), None)
            .await
    );
    assert!(err.to_string().contains("is not mapped"), "{err}");

    fx.teardown().await;
}
