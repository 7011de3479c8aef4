use std::sync::Arc;

use bragboard_api::auth::{AuthState, PgUserDirectory};
use bragboard_api::models::{CommentView, FeedItem, FeedResponse};
use bragboard_api::routes::comments::{add_comment, fetch_comments};
use bragboard_api::routes::departments::{DepartmentsResponse, list_departments};
use bragboard_api::routes::reactions::{ToggleReactionResponse, toggle_reaction};
use bragboard_api::routes::reports::{ReportResponse, report_comment, report_shoutout};
use bragboard_api::routes::shoutouts::{create_shoutout, feed};
use bragboard_api::test_support::{
    TestDatabase, TestDatabaseError, TestFixtures, TestRocketBuilder, test_auth_state,
};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use rocket::routes;
use serde_json::{Value, json};

struct Harness {
    client: Client,
    state: AuthState,
}

impl Harness {
    fn bearer(&self, user_id: i32) -> Header<'static> {
        let token = self
            .state
            .jwt_service
            .issue_access_token(user_id)
            .expect("issue token");
        Header::new("Authorization", format!("Bearer {}", token.token))
    }
}

async fn harness(test_db: &TestDatabase) -> Harness {
    let pool = test_db.pool_clone();
    let state = test_auth_state(Arc::new(PgUserDirectory::new(pool.clone())));
    let client = TestRocketBuilder::new()
        .manage_pg_pool(pool)
        .manage_auth_state(state.clone())
        .mount_api_routes(routes![
            create_shoutout,
            feed,
            toggle_reaction,
            fetch_comments,
            add_comment,
            report_shoutout,
            report_comment,
            list_departments,
        ])
        .async_client()
        .await;
    Harness { client, state }
}

macro_rules! test_db_or_skip {
    ($name:literal) => {
        match TestDatabase::new_from_env().await {
            Ok(db) => db,
            Err(TestDatabaseError::MissingUrl) => {
                eprintln!("skipping {}: no test database configured", $name);
                return;
            }
            Err(err) => panic!("failed to provision test database: {err:?}"),
        }
    };
}

#[tokio::test]
async fn shoutout_lifecycle_through_the_feed() {
    let test_db = test_db_or_skip!("shoutout lifecycle test");
    let h = harness(&test_db).await;
    let fixtures = TestFixtures::new(test_db.pool());

    let sender = fixtures
        .insert_user("Ada", "ada@example.com", Some("Engineering"), "employee", "x")
        .await
        .expect("sender");
    let grace = fixtures
        .insert_user("Grace", "grace@example.com", Some("Design"), "employee", "x")
        .await
        .expect("recipient");
    let linus = fixtures
        .insert_user("Linus", "linus@example.com", Some("Design"), "employee", "x")
        .await
        .expect("recipient");

    let response = h
        .client
        .post("/api/v1/shoutout/create")
        .header(ContentType::JSON)
        .header(h.bearer(sender))
        .body(json!({ "message": "  Great launch!  ", "recipient_ids": [grace, linus, grace] }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let created: FeedItem = response.into_json().await.expect("created shoutout");
    assert_eq!(created.shoutout.message, "Great launch!");
    assert_eq!(created.shoutout.department.as_deref(), Some("Engineering"));
    assert_eq!(created.recipients.len(), 2);
    let shoutout_id = created.shoutout.id;

    let response = h
        .client
        .post("/api/v1/reaction/toggle")
        .header(ContentType::JSON)
        .header(h.bearer(grace))
        .body(json!({ "shoutout_id": shoutout_id, "type": "clap" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let toggled: ToggleReactionResponse = response.into_json().await.expect("toggle");
    assert!(toggled.active);
    assert_eq!(toggled.counts.clap, 1);

    let response = h
        .client
        .post("/api/v1/comment/add")
        .header(ContentType::JSON)
        .header(h.bearer(linus))
        .body(json!({ "shoutout_id": shoutout_id, "content": "Well deserved" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = h
        .client
        .get("/api/v1/shoutout/feed?department=Engineering")
        .header(h.bearer(grace))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let feed: FeedResponse = response.into_json().await.expect("feed");
    assert_eq!(feed.items.len(), 1);
    assert_eq!(feed.items[0].reactions.clap, 1);
    assert_eq!(feed.items[0].comments_count, 1);

    let response = h
        .client
        .get("/api/v1/shoutout/feed?department=Design")
        .header(h.bearer(grace))
        .dispatch()
        .await;
    let feed: FeedResponse = response.into_json().await.expect("feed");
    assert!(feed.items.is_empty());

    let response = h
        .client
        .post("/api/v1/reaction/toggle")
        .header(ContentType::JSON)
        .header(h.bearer(grace))
        .body(json!({ "shoutout_id": shoutout_id, "type": "clap" }).to_string())
        .dispatch()
        .await;
    let toggled: ToggleReactionResponse = response.into_json().await.expect("toggle");
    assert!(!toggled.active);
    assert_eq!(toggled.counts.clap, 0);

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn unknown_recipients_and_targets_are_rejected() {
    let test_db = test_db_or_skip!("shoutout validation test");
    let h = harness(&test_db).await;
    let fixtures = TestFixtures::new(test_db.pool());
    let sender = fixtures
        .insert_user("Ada", "ada@example.com", None, "employee", "x")
        .await
        .expect("sender");

    let response = h
        .client
        .post("/api/v1/shoutout/create")
        .header(ContentType::JSON)
        .header(h.bearer(sender))
        .body(json!({ "message": "hi", "recipient_ids": [9999] }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(fixtures.count("shoutouts").await.expect("count"), 0);

    let response = h
        .client
        .post("/api/v1/shoutout/create")
        .header(ContentType::JSON)
        .header(h.bearer(sender))
        .body(json!({ "message": "   " }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    let response = h
        .client
        .get("/api/v1/comment/fetch/4242")
        .header(h.bearer(sender))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    let response = h
        .client
        .post("/api/v1/reaction/toggle")
        .header(ContentType::JSON)
        .header(h.bearer(sender))
        .body(json!({ "shoutout_id": 4242, "type": "like" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
    let body: Value = response.into_json().await.expect("error body");
    assert_eq!(body["error"], "NotFound");

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn comments_and_reports_are_recorded() {
    let test_db = test_db_or_skip!("comment and report test");
    let h = harness(&test_db).await;
    let fixtures = TestFixtures::new(test_db.pool());
    let ada = fixtures
        .insert_user("Ada", "ada@example.com", None, "employee", "x")
        .await
        .expect("user");
    let grace = fixtures
        .insert_user("Grace", "grace@example.com", None, "employee", "x")
        .await
        .expect("user");
    let shoutout_id = fixtures
        .insert_shoutout(ada, "Thanks!", None, &[grace])
        .await
        .expect("shoutout");
    let first = fixtures
        .insert_comment(shoutout_id, grace, "first")
        .await
        .expect("comment");
    fixtures
        .insert_comment(shoutout_id, ada, "second")
        .await
        .expect("comment");

    let response = h
        .client
        .get(format!("/api/v1/comment/fetch/{shoutout_id}"))
        .header(h.bearer(ada))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let comments: Vec<CommentView> = response.into_json().await.expect("comments");
    let contents: Vec<_> = comments.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, ["first", "second"]);
    assert_eq!(comments[0].user.as_ref().map(|u| u.name.as_str()), Some("Grace"));

    let response = h
        .client
        .post("/api/v1/shoutout/report")
        .header(ContentType::JSON)
        .header(h.bearer(grace))
        .body(json!({ "shoutout_id": shoutout_id, "reason": "off-topic" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let report: ReportResponse = response.into_json().await.expect("report");
    assert!(report.report_id > 0);

    let response = h
        .client
        .post("/api/v1/comment/report")
        .header(ContentType::JSON)
        .header(h.bearer(ada))
        .body(json!({ "comment_id": first, "reason": "rude" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(fixtures.count("reports").await.expect("count"), 2);

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn departments_are_public_and_sorted() {
    let test_db = test_db_or_skip!("departments test");
    let h = harness(&test_db).await;
    let fixtures = TestFixtures::new(test_db.pool());
    for name in ["Marketing", "Design", "Finance"] {
        fixtures.insert_department(name).await.expect("department");
    }

    let response = h.client.get("/api/v1/departments").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: DepartmentsResponse = response.into_json().await.expect("departments");
    assert_eq!(body.departments, ["Design", "Finance", "Marketing"]);

    test_db.close().await.expect("failed to drop test database");
}
