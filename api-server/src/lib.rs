#[macro_use]
extern crate rocket;

pub mod auth;
pub mod catchers;
pub mod db;
pub mod error;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod seed_data;

use crate::auth::{AuthConfig, AuthState, PgUserDirectory};
use crate::request_logger::RequestLogger;
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, Cors, CorsOptions};
use rocket_db_pools::sqlx::PgPool;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::{Arc, Once};

static LOGGER: Once = Once::new();

const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:8000",
    "http://127.0.0.1:8000",
];

pub fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

/// Allowed browser origins from a comma-separated list, or the local
/// development origins when the list is absent or empty.
pub fn cors_origins(raw: Option<&str>) -> Vec<String> {
    let configured: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    if configured.is_empty() {
        DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect()
    } else {
        configured
    }
}

/// CORS fairing allowing `origins` with credentials.
pub fn cors_layer(origins: &[String]) -> Result<Cors, rocket_cors::Error> {
    CorsOptions::default()
        .allowed_origins(AllowedOrigins::some_exact(origins))
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Delete, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true)
        .to_cors()
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    let origins = cors_origins(std::env::var("BRAGBOARD_CORS_ORIGINS").ok().as_deref());
    log::info!("CORS origins: {}", origins.join(", "));

    let rocket = rocket::build().attach(RequestLogger);
    let rocket = match cors_layer(&origins) {
        Ok(cors) => rocket.attach(cors),
        Err(e) => {
            let reason = e.to_string();
            rocket.attach(AdHoc::try_on_ignite("CORS", move |rocket| async move {
                log::error!("invalid BRAGBOARD_CORS_ORIGINS: {reason}");
                Err(rocket)
            }))
        }
    };

    rocket
        // Probe the database, run migrations, then share the pool with handlers.
        .attach(AdHoc::try_on_ignite("Prepare Database", |rocket| async move {
            let pool = match db::pool_config(rocket.figment()).map(|config| db::lazy_pool(&config)) {
                Ok(Ok(pool)) => pool,
                Ok(Err(e)) => {
                    log::error!("invalid database url: {}", e);
                    return Err(rocket);
                }
                Err(e) => {
                    log::error!("missing or invalid database configuration: {}", e);
                    return Err(rocket);
                }
            };

            match db::prepare_database(&pool).await {
                Ok(()) => Ok(rocket.manage(pool)),
                Err(e) => {
                    log::error!("database startup failed: {}", e);
                    Err(rocket)
                }
            }
        }))
        .attach(AdHoc::try_on_ignite("Authentication", |rocket| async move {
            let Some(pool) = rocket.state::<PgPool>().cloned() else {
                log::error!("authentication needs the database pool");
                return Err(rocket);
            };

            let state = AuthConfig::from_env()
                .and_then(|config| AuthState::from_config(config, Arc::new(PgUserDirectory::new(pool))));
            match state {
                Ok(state) => {
                    log::info!(
                        "authentication ready ({:?}, tokens valid {} minutes)",
                        state.config.jwt_algorithm,
                        state.config.access_token_ttl_minutes
                    );
                    Ok(rocket.manage(state))
                }
                Err(e) => {
                    log::error!("invalid authentication configuration: {}", e);
                    Err(rocket)
                }
            }
        }))
        .register("/", catchers::all())
        .mount(
            "/api/v1",
            openapi_get_routes![
                // Health routes
                routes::health::health_check,
                routes::health::database_health,
                // Auth routes
                auth::routes::register,
                auth::routes::login,
                auth::routes::login_form,
                auth::routes::me,
                // Directory routes
                routes::users::list_users,
                routes::departments::list_departments,
                // Shoutout routes
                routes::shoutouts::create_shoutout,
                routes::shoutouts::feed,
                routes::reactions::toggle_reaction,
                routes::comments::fetch_comments,
                routes::comments::add_comment,
                routes::reports::report_shoutout,
                routes::reports::report_comment,
                // Admin routes
                routes::admin::list_users,
                routes::admin::delete_user,
                routes::admin::list_shoutouts,
                routes::admin::delete_shoutout,
                routes::admin::list_reports,
                routes::admin::dismiss_report,
                routes::admin::analytics,
                auth::routes::signing_metadata,
            ],
        )
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../v1/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("BragBoard API", "../../v1/openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use std::sync::Arc;

    use chrono::Utc;
    use parking_lot::Mutex;
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use rocket_db_pools::sqlx::{self, PgPool};

    use crate::auth::responses::Role;
    use crate::auth::{
        AuthConfig, AuthError, AuthResult, AuthState, JwtService, PasswordService, UserDirectory,
    };
    use crate::models::{NewUser, User};

    pub use database::{TestDatabase, TestDatabaseError};

    /// Signing secret used by every test configuration.
    pub const TEST_JWT_SECRET: &str = "bragboard-test-secret";

    /// Fast, deterministic auth configuration for tests.
    pub fn test_auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            jwt_algorithm: jsonwebtoken::Algorithm::HS256,
            access_token_ttl_minutes: 30,
            bcrypt_cost: 4,
            allow_role_selection: false,
        }
    }

    pub fn test_auth_state(users: Arc<dyn UserDirectory>) -> AuthState {
        test_auth_state_with(users, |_| {})
    }

    /// Like [`test_auth_state`] with a chance to tweak the configuration first.
    pub fn test_auth_state_with(
        users: Arc<dyn UserDirectory>,
        configure: impl FnOnce(&mut AuthConfig),
    ) -> AuthState {
        let mut config = test_auth_config();
        configure(&mut config);
        let password_service =
            PasswordService::new(config.bcrypt_cost).expect("valid test bcrypt cost");
        let jwt_service = JwtService::from_config(&config).expect("valid test jwt config");
        AuthState::new(config, password_service, jwt_service, users)
    }

    /// In-process [`UserDirectory`] for tests that do not need PostgreSQL.
    #[derive(Default)]
    pub struct MemoryUserDirectory {
        users: Mutex<Vec<User>>,
    }

    impl MemoryUserDirectory {
        /// Store a user directly, bypassing uniqueness checks.
        pub fn insert(&self, name: &str, email: &str, password_hash: &str, role: Option<Role>) -> User {
            let mut users = self.users.lock();
            let user = User {
                id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
                name: name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                department: None,
                designation: None,
                profile_pic: None,
                role,
                joined_at: Some(Utc::now()),
            };
            users.push(user.clone());
            user
        }

        pub fn remove(&self, id: i32) {
            self.users.lock().retain(|u| u.id != id);
        }

        pub fn get(&self, id: i32) -> Option<User> {
            self.users.lock().iter().find(|u| u.id == id).cloned()
        }

        pub fn len(&self) -> usize {
            self.users.lock().len()
        }

        pub fn is_empty(&self) -> bool {
            self.users.lock().is_empty()
        }
    }

    #[rocket::async_trait]
    impl UserDirectory for MemoryUserDirectory {
        async fn find_by_id(&self, id: i32) -> AuthResult<Option<User>> {
            Ok(self.get(id))
        }

        async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
            Ok(self.users.lock().iter().find(|u| u.email == email).cloned())
        }

        async fn create(&self, new_user: NewUser) -> AuthResult<User> {
            let mut users = self.users.lock();
            if users.iter().any(|u| u.email == new_user.email) {
                return Err(AuthError::Conflict);
            }
            let user = User {
                id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
                name: new_user.name,
                email: new_user.email,
                password_hash: new_user.password_hash,
                department: new_user.department,
                designation: new_user.designation,
                profile_pic: new_user.profile_pic,
                role: Some(new_user.role),
                joined_at: Some(Utc::now()),
            };
            users.push(user.clone());
            Ok(user)
        }
    }

    /// Convenience helpers for seeding rows in database-backed tests.
    pub struct TestFixtures<'a> {
        pool: &'a PgPool,
    }

    impl<'a> TestFixtures<'a> {
        /// Create a fixture helper bound to the provided pool.
        pub fn new(pool: &'a PgPool) -> Self {
            Self { pool }
        }

        pub async fn insert_department(&self, name: &str) -> Result<i32, sqlx::Error> {
            sqlx::query_scalar("INSERT INTO departments (name) VALUES ($1) RETURNING id")
                .bind(name)
                .fetch_one(self.pool)
                .await
        }

        /// Insert a user row, returning the new user id.
        pub async fn insert_user(
            &self,
            name: &str,
            email: &str,
            department: Option<&str>,
            role: &str,
            password_hash: &str,
        ) -> Result<i32, sqlx::Error> {
            sqlx::query_scalar(
                "INSERT INTO users (name, email, password_hash, department, role) VALUES ($1, $2, $3, $4, $5) RETURNING id",
            )
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .bind(department)
            .bind(role)
            .fetch_one(self.pool)
            .await
        }

        /// Insert a shoutout and its recipients, returning the shoutout id.
        pub async fn insert_shoutout(
            &self,
            sender_id: i32,
            message: &str,
            department: Option<&str>,
            recipient_ids: &[i32],
        ) -> Result<i32, sqlx::Error> {
            let shoutout_id: i32 = sqlx::query_scalar(
                "INSERT INTO shoutouts (sender_id, message, department) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(sender_id)
            .bind(message)
            .bind(department)
            .fetch_one(self.pool)
            .await?;

            for recipient_id in recipient_ids {
                sqlx::query(
                    "INSERT INTO shoutout_recipients (shoutout_id, recipient_id) VALUES ($1, $2)",
                )
                .bind(shoutout_id)
                .bind(recipient_id)
                .execute(self.pool)
                .await?;
            }

            Ok(shoutout_id)
        }

        pub async fn insert_comment(
            &self,
            shoutout_id: i32,
            user_id: i32,
            content: &str,
        ) -> Result<i32, sqlx::Error> {
            sqlx::query_scalar(
                "INSERT INTO comments (shoutout_id, user_id, content) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(shoutout_id)
            .bind(user_id)
            .bind(content)
            .fetch_one(self.pool)
            .await
        }

        pub async fn insert_shoutout_report(
            &self,
            shoutout_id: i32,
            reported_by: i32,
            reason: &str,
        ) -> Result<i32, sqlx::Error> {
            sqlx::query_scalar(
                "INSERT INTO reports (shoutout_id, reported_by, reason) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(shoutout_id)
            .bind(reported_by)
            .bind(reason)
            .fetch_one(self.pool)
            .await
        }

        /// Number of rows in `table`. Only for fixed, trusted table names.
        pub async fn count(&self, table: &str) -> Result<i64, sqlx::Error> {
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(self.pool)
                .await
        }
    }

    pub mod database {
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use testcontainers_modules::postgres::Postgres;
        use thiserror::Error;
        use tokio::runtime::Handle;
        use uuid::Uuid;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("neither TEST_DATABASE_URL nor BRAGBOARD_TEST_CONTAINERS is set")]
            MissingUrl,
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Ephemeral database factory for integration tests.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            /// Provision a fresh, migrated database. Uses `TEST_DATABASE_URL`
            /// when set, otherwise a disposable container when
            /// `BRAGBOARD_TEST_CONTAINERS` is set.
            pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
                if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
                    return Self::create(&url, None).await;
                }
                if std::env::var_os("BRAGBOARD_TEST_CONTAINERS").is_some() {
                    return Self::with_container().await;
                }
                Err(TestDatabaseError::MissingUrl)
            }

            async fn with_container() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().start().await?;
                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
                Self::create(&url, Some(container)).await
            }

            async fn create(
                base_url: &str,
                container: Option<ContainerAsync<Postgres>>,
            ) -> Result<Self, TestDatabaseError> {
                let base_options: PgConnectOptions = base_url.parse()?;
                let base_options = base_options.log_statements(LevelFilter::Off);

                let base_name = base_options
                    .get_database()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "postgres".to_string());

                let admin_options = base_options.clone().database("postgres");
                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await?;

                let new_db_name = format!("{}_{}", base_name, Uuid::new_v4().simple());
                let create_sql = format!("CREATE DATABASE \"{}\" TEMPLATE template0", new_db_name);
                sqlx::query(&create_sql).execute(&admin_pool).await?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.clone().database(&new_db_name))
                    .await?;

                crate::db::run_migrations(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    database_name: new_db_name,
                    container,
                })
            }

            /// Cloneable connection pool for use in tests and Rocket state.
            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close pool connections and drop the ephemeral database.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                drop_database_with_fallback(self.admin_options.clone(), &self.database_name)
                    .await?;

                if let Some(container) = self.container.take() {
                    drop(container);
                }

                Ok(())
            }
        }

        async fn drop_database_with_fallback(
            admin_options: PgConnectOptions,
            database_name: &str,
        ) -> Result<(), sqlx::Error> {
            let admin_pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_with(admin_options)
                .await?;

            let drop_force = format!("DROP DATABASE \"{}\" WITH (FORCE)", database_name);
            match sqlx::query(&drop_force).execute(&admin_pool).await {
                Ok(_) => Ok(()),
                Err(err) if force_drop_unsupported(&err) => {
                    let drop_sql = format!("DROP DATABASE \"{}\"", database_name);
                    sqlx::query(&drop_sql).execute(&admin_pool).await?;
                    Ok(())
                }
                Err(err) => Err(err),
            }
        }

        fn force_drop_unsupported(err: &sqlx::Error) -> bool {
            matches!(
                err,
                sqlx::Error::Database(db_err)
                    if db_err
                        .code()
                        .map(|code| code == "42601" || code == "0A000")
                        .unwrap_or(false)
            )
        }

        impl Drop for TestDatabase {
            fn drop(&mut self) {
                if let Some(pool) = self.pool.take() {
                    let admin_options = self.admin_options.clone();
                    let db_name = self.database_name.clone();
                    if let Ok(handle) = Handle::try_current() {
                        handle.spawn(async move {
                            pool.close().await;
                            let _ = drop_database_with_fallback(admin_options, &db_name).await;
                        });
                    } else {
                        std::thread::spawn(move || {
                            if let Ok(rt) = tokio::runtime::Runtime::new() {
                                rt.block_on(async move {
                                    pool.close().await;
                                    let _ =
                                        drop_database_with_fallback(admin_options, &db_name).await;
                                });
                            }
                        });
                    }
                }

                if let Some(container) = self.container.take() {
                    drop(container);
                }
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    #[derive(Default)]
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        pg_pool: Option<PgPool>,
        auth_state: Option<AuthState>,
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                ..Default::default()
            }
        }

        /// Mount routes under `/api/v1`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/api/v1".to_string(), routes));
            self
        }

        /// Manage a `PgPool` instance for tests that exercise database-backed routes.
        pub fn manage_pg_pool(mut self, pool: PgPool) -> Self {
            self.pg_pool = Some(pool);
            self
        }

        pub fn manage_auth_state(mut self, state: AuthState) -> Self {
            self.auth_state = Some(state);
            self
        }

        /// Finish building the Rocket instance with the JSON catchers registered.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment).register("/", crate::catchers::all());

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            if let Some(pool) = self.pg_pool {
                rocket = rocket.manage(pool);
            }

            if let Some(state) = self.auth_state {
                rocket = rocket.manage(state);
            }

            rocket
        }

        /// Convenience helper to produce a blocking local client.
        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        /// Convenience helper to produce an asynchronous local client.
        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
