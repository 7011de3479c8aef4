use std::io::{self, Write};

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use bragboard_api::auth::config::DEFAULT_BCRYPT_COST;
use bragboard_api::auth::passwords::PasswordService;
use bragboard_api::auth::responses::Role;

#[derive(Parser, Debug)]
#[command(
    name = "create_user",
    about = "Create a BragBoard account with an explicit role"
)]
struct Args {
    /// Email address for the account (stored and matched exactly).
    #[arg(long)]
    email: String,

    /// Plaintext password to hash and store for this user.
    #[arg(long)]
    password: String,

    /// Display name.
    #[arg(long)]
    name: String,

    #[arg(long)]
    department: Option<String>,

    #[arg(long)]
    designation: Option<String>,

    /// Role to assign (`employee` or `admin`).
    #[arg(long, default_value = "employee")]
    role: String,

    /// bcrypt work factor.
    #[arg(long, default_value_t = DEFAULT_BCRYPT_COST)]
    cost: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let email = args.email.trim().to_string();
    let name = args.name.trim().to_string();

    if !email.contains('@') {
        writeln!(io::stderr(), "error: email must contain '@'")?;
        std::process::exit(1);
    }
    if name.is_empty() {
        writeln!(io::stderr(), "error: name must not be empty")?;
        std::process::exit(1);
    }

    let Some(role) = Role::parse(args.role.trim()) else {
        writeln!(
            io::stderr(),
            "error: unsupported role '{}'. Use 'employee' or 'admin'.",
            args.role
        )?;
        std::process::exit(1);
    };

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let mut tx = pool.begin().await?;

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(&email)
        .fetch_one(&mut *tx)
        .await?;

    if existing > 0 {
        writeln!(
            io::stderr(),
            "error: a user with email '{email}' already exists."
        )?;
        std::process::exit(1);
    }

    let password_service = PasswordService::new(args.cost)?;
    let password_hash = password_service.hash_password(&args.password)?;

    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password_hash, department, designation, role) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(&name)
    .bind(&email)
    .bind(password_hash)
    .bind(args.department.as_deref())
    .bind(args.designation.as_deref())
    .bind(role.as_str())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    println!("Created {} user '{email}' with id {user_id}", role.as_str());
    Ok(())
}
