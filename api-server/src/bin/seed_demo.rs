use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, Postgres, Transaction};

use bragboard_api::auth::config::DEFAULT_BCRYPT_COST;
use bragboard_api::auth::passwords::PasswordService;
use bragboard_api::auth::responses::Role;
use bragboard_api::db::run_migrations;
use bragboard_api::seed_data::{self as demo, DEPARTMENTS};

#[derive(Parser, Debug)]
#[command(
    name = "seed_demo",
    about = "Populate a BragBoard database with demo departments, users and activity"
)]
struct Args {
    /// Seed for reproducible output; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// bcrypt work factor for the demo passwords.
    #[arg(long, default_value_t = DEFAULT_BCRYPT_COST)]
    cost: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    run_migrations(&pool).await?;

    let passwords = PasswordService::new(args.cost)?;
    let password_hash = passwords.hash_password(demo::DEMO_PASSWORD)?;

    let mut tx = pool.begin().await?;

    for department in DEPARTMENTS {
        sqlx::query("INSERT INTO departments (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(department)
            .execute(&mut *tx)
            .await?;
    }
    log::info!("departments ready");

    let mut created = 0;
    for department in DEPARTMENTS {
        for index in 0..demo::EMPLOYEES_PER_DEPARTMENT {
            let email = demo::employee_email(department, index);
            let name = demo::random_name(&mut rng);
            let designation = demo::random_designation(&mut rng);
            if insert_user_if_missing(
                &mut tx,
                &name,
                &email,
                &password_hash,
                department,
                designation,
                Role::Employee,
            )
            .await?
            {
                created += 1;
            }
        }
    }
    if insert_user_if_missing(
        &mut tx,
        demo::ADMIN_NAME,
        demo::ADMIN_EMAIL,
        &password_hash,
        demo::ADMIN_DEPARTMENT,
        demo::ADMIN_DESIGNATION,
        Role::Admin,
    )
    .await?
    {
        created += 1;
    }
    log::info!("created {created} user(s)");

    let users: Vec<(i32, Option<String>)> =
        sqlx::query_as("SELECT id, department FROM users ORDER BY id")
            .fetch_all(&mut *tx)
            .await?;
    if users.is_empty() {
        log::warn!("no users available; skipping activity");
        tx.commit().await?;
        return Ok(());
    }
    let user_ids: Vec<i32> = users.iter().map(|(id, _)| *id).collect();

    let mut shoutout_ids = Vec::with_capacity(demo::SHOUTOUT_COUNT);
    for _ in 0..demo::SHOUTOUT_COUNT {
        let (sender_id, department) = &users[rng.gen_range(0..users.len())];
        let shoutout_id: i32 = sqlx::query_scalar(
            "INSERT INTO shoutouts (sender_id, message, department) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(sender_id)
        .bind(demo::random_shoutout_message(&mut rng))
        .bind(department.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        let recipients = demo::sample_distinct(&mut rng, &user_ids, demo::RECIPIENTS_PER_SHOUTOUT);
        sqlx::query(
            "INSERT INTO shoutout_recipients (shoutout_id, recipient_id) SELECT $1, UNNEST($2::int[])",
        )
        .bind(shoutout_id)
        .bind(recipients.as_slice())
        .execute(&mut *tx)
        .await?;

        shoutout_ids.push(shoutout_id);
    }

    let mut comment_ids = Vec::new();
    for shoutout_id in &shoutout_ids {
        for _ in 0..rng.gen_range(1..=3) {
            let commenter = user_ids[rng.gen_range(0..user_ids.len())];
            let comment_id: i32 = sqlx::query_scalar(
                "INSERT INTO comments (shoutout_id, user_id, content) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(shoutout_id)
            .bind(commenter)
            .bind(demo::random_comment(&mut rng))
            .fetch_one(&mut *tx)
            .await?;
            comment_ids.push(comment_id);
        }

        let reaction_count = rng.gen_range(3..=6);
        let reactors = demo::sample_distinct(&mut rng, &user_ids, reaction_count);
        for user_id in reactors {
            sqlx::query(
                "INSERT INTO reactions (shoutout_id, user_id, type) VALUES ($1, $2, $3) \
                 ON CONFLICT (shoutout_id, user_id, type) DO NOTHING",
            )
            .bind(shoutout_id)
            .bind(user_id)
            .bind(demo::random_reaction(&mut rng).as_str())
            .execute(&mut *tx)
            .await?;
        }
    }

    for _ in 0..demo::SHOUTOUT_REPORTS {
        let shoutout_id = shoutout_ids[rng.gen_range(0..shoutout_ids.len())];
        insert_report(&mut tx, "shoutout_id", shoutout_id, &user_ids, &mut rng).await?;
    }
    for _ in 0..demo::COMMENT_REPORTS {
        let comment_id = comment_ids[rng.gen_range(0..comment_ids.len())];
        insert_report(&mut tx, "comment_id", comment_id, &user_ids, &mut rng).await?;
    }

    tx.commit().await?;
    log::info!(
        "seeded {} shoutouts, {} comments and {} reports",
        shoutout_ids.len(),
        comment_ids.len(),
        demo::SHOUTOUT_REPORTS + demo::COMMENT_REPORTS
    );
    Ok(())
}

async fn insert_user_if_missing(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    email: &str,
    password_hash: &str,
    department: &str,
    designation: &str,
    role: Role,
) -> Result<bool, sqlx::Error> {
    let inserted = sqlx::query(
        "INSERT INTO users (name, email, password_hash, department, designation, profile_pic, role) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (email) DO NOTHING",
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(department)
    .bind(designation)
    .bind(demo::avatar_url(email))
    .bind(role.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(inserted.rows_affected() > 0)
}

/// `target_column` is one of the two fixed report target columns.
async fn insert_report(
    conn: &mut PgConnection,
    target_column: &str,
    target_id: i32,
    user_ids: &[i32],
    rng: &mut StdRng,
) -> Result<(), sqlx::Error> {
    let reporter = user_ids[rng.gen_range(0..user_ids.len())];
    sqlx::query(&format!(
        "INSERT INTO reports ({target_column}, reported_by, reason) VALUES ($1, $2, $3)"
    ))
    .bind(target_id)
    .bind(reporter)
    .bind(demo::random_report_reason(rng))
    .execute(conn)
    .await?;
    Ok(())
}
