use std::sync::Arc;

use bragboard_api::auth::responses::{LoginResponse, RegisterResponse, Role, SigningMetadata};
use bragboard_api::auth::routes::{login, login_form, me, register, signing_metadata};
use bragboard_api::auth::{AuthError, PgUserDirectory, UserDirectory};
use bragboard_api::models::{NewUser, UserProfile};
use bragboard_api::test_support::{
    MemoryUserDirectory, TestDatabase, TestDatabaseError, TestFixtures, TestRocketBuilder,
    test_auth_state,
};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use rocket::routes;
use serde_json::{Value, json};

async fn client_with(users: Arc<MemoryUserDirectory>) -> Client {
    TestRocketBuilder::new()
        .mount_api_routes(routes![register, login, login_form, me, signing_metadata])
        .manage_auth_state(test_auth_state(users))
        .async_client()
        .await
}

async fn register_user(client: &Client, email: &str, role: Option<&str>) -> RegisterResponse {
    let mut body = json!({
        "name": "Grace Hopper",
        "email": email,
        "password": "correct horse",
        "department": "Engineering",
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }

    let response = client
        .post("/api/v1/register")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    response.into_json().await.expect("register response")
}

async fn login_token(client: &Client, email: &str, password: &str) -> String {
    let response = client
        .post("/api/v1/login")
        .header(ContentType::JSON)
        .body(json!({ "email": email, "password": password }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: LoginResponse = response.into_json().await.expect("login response");
    assert_eq!(body.token_type, "bearer");
    body.access_token
}

fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {token}"))
}

#[rocket::async_test]
async fn register_login_and_fetch_profile() {
    let users = Arc::new(MemoryUserDirectory::default());
    let client = client_with(users.clone()).await;

    let registered = register_user(&client, "grace@example.com", None).await;
    assert_eq!(registered.message, "User created successfully");

    let token = login_token(&client, "grace@example.com", "correct horse").await;

    let response = client.get("/api/v1/user/me").header(bearer(&token)).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let profile: UserProfile = response.into_json().await.expect("profile");
    assert_eq!(profile.id, registered.user_id);
    assert_eq!(profile.email, "grace@example.com");
    assert_eq!(profile.role, Some(Role::Employee));
}

#[rocket::async_test]
async fn employees_are_forbidden_from_admin_routes() {
    let users = Arc::new(MemoryUserDirectory::default());
    let client = client_with(users).await;

    register_user(&client, "grace@example.com", Some("admin")).await;
    let token = login_token(&client, "grace@example.com", "correct horse").await;

    let response = client
        .get("/api/v1/admin/auth/metadata")
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
    let body: Value = response.into_json().await.expect("error body");
    assert_eq!(body["message"], "Admin privileges required");
}

#[rocket::async_test]
async fn admins_can_read_signing_metadata() {
    let users = Arc::new(MemoryUserDirectory::default());
    let state = test_auth_state(users.clone());
    let hash = state.password_service.hash_password("s3cret").expect("hash");
    users.insert("Root", "root@example.com", &hash, Some(Role::Admin));
    let client = client_with(users).await;

    let token = login_token(&client, "root@example.com", "s3cret").await;
    let response = client
        .get("/api/v1/admin/auth/metadata")
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let metadata: SigningMetadata = response.into_json().await.expect("metadata");
    assert_eq!(metadata.algorithm, "HS256");
    assert_eq!(metadata.access_token_ttl_minutes, 30);
    assert!(!metadata.default_secret_in_use);
}

#[rocket::async_test]
async fn missing_token_gets_bearer_challenge() {
    let client = client_with(Arc::new(MemoryUserDirectory::default())).await;

    let response = client.get("/api/v1/user/me").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(response.headers().get_one("WWW-Authenticate"), Some("Bearer"));
    let body: Value = response.into_json().await.expect("error body");
    assert_eq!(body["message"], "Not authenticated");

    let response = client
        .get("/api/v1/user/me")
        .header(bearer("not-a-jwt"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(response.headers().get_one("WWW-Authenticate"), Some("Bearer"));
    let body: Value = response.into_json().await.expect("error body");
    assert_eq!(body["message"], "Invalid or expired token");
}

#[rocket::async_test]
async fn duplicate_registration_is_rejected() {
    let users = Arc::new(MemoryUserDirectory::default());
    let client = client_with(users.clone()).await;

    register_user(&client, "grace@example.com", None).await;
    let response = client
        .post("/api/v1/register")
        .header(ContentType::JSON)
        .body(json!({ "name": "Imposter", "email": "grace@example.com", "password": "x" }).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().await.expect("error body");
    assert_eq!(body["status"], 400);
    assert_eq!(body["message"], "Email already registered");
    assert_eq!(users.len(), 1);
}

#[rocket::async_test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let client = client_with(Arc::new(MemoryUserDirectory::default())).await;
    register_user(&client, "grace@example.com", None).await;

    let mut bodies = Vec::new();
    for (email, password) in [("grace@example.com", "wrong"), ("nobody@example.com", "correct horse")] {
        let response = client
            .post("/api/v1/login")
            .header(ContentType::JSON)
            .body(json!({ "email": email, "password": password }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
        bodies.push(response.into_json::<Value>().await.expect("error body"));
    }
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[0]["message"], "Invalid email or password");
}

#[rocket::async_test]
async fn form_login_uses_username_field() {
    let client = client_with(Arc::new(MemoryUserDirectory::default())).await;
    register_user(&client, "grace@example.com", None).await;

    let response = client
        .post("/api/v1/login")
        .header(ContentType::Form)
        .body("username=grace%40example.com&password=correct+horse")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: LoginResponse = response.into_json().await.expect("login response");
    assert!(!body.access_token.is_empty());
}

#[rocket::async_test]
async fn register_and_login_against_postgres() {
    let test_db = match TestDatabase::new_from_env().await {
        Ok(db) => db,
        Err(TestDatabaseError::MissingUrl) => {
            eprintln!("skipping postgres auth test: no test database configured");
            return;
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    };
    let directory = PgUserDirectory::new(test_db.pool_clone());
    let client = TestRocketBuilder::new()
        .mount_api_routes(routes![register, login, me])
        .manage_auth_state(test_auth_state(Arc::new(directory.clone())))
        .async_client()
        .await;

    let registered = register_user(&client, " grace@example.com ", None).await;
    let token = login_token(&client, "grace@example.com", "correct horse").await;

    let response = client.get("/api/v1/user/me").header(bearer(&token)).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let profile: UserProfile = response.into_json().await.expect("profile");
    assert_eq!(profile.id, registered.user_id);
    assert_eq!(profile.email, "grace@example.com");
    assert_eq!(profile.department.as_deref(), Some("Engineering"));
    assert_eq!(profile.role, Some(Role::Employee));

    let duplicate = directory
        .create(NewUser {
            name: "Imposter".into(),
            email: "grace@example.com".into(),
            password_hash: "x".into(),
            department: None,
            designation: None,
            profile_pic: None,
            role: Role::Admin,
        })
        .await;
    assert!(matches!(duplicate, Err(AuthError::Conflict)));

    let response = client
        .post("/api/v1/register")
        .header(ContentType::JSON)
        .body(json!({ "name": "Imposter", "email": "grace@example.com", "password": "x" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    let fixtures = TestFixtures::new(test_db.pool());
    assert_eq!(fixtures.count("users").await.expect("count"), 1);

    drop(response);
    drop(client);
    test_db.close().await.expect("failed to drop test database");
}
