//! Account Administration CLI
//!
//! Operator commands for managing accounts and sessions directly against
//! the database, without going through the HTTP API.

use std::sync::Arc;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use uuid::Uuid;

use account_service::{
    config::database_config_from_env,
    database::{run_migrations, Pagination, PgStore, SessionStore},
    models::{Plan, SignupRequest, UpdatePlanRequest, User},
    service::UserService,
    utils::{password::SaltedSha256Hasher, security::generate_secure_token},
};

/// Length of passwords generated when `create` is given none
const GENERATED_PASSWORD_LENGTH: usize = 20;

/// Account administration CLI
#[derive(Parser)]
#[command(name = "user-admin", about = "Account administration CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account on the free plan
    Create(CreateArgs),
    /// List accounts, oldest first
    List(ListArgs),
    /// Show one account by ID or email
    Get(GetArgs),
    /// Change the subscription plan of an account
    Plan(PlanArgs),
    /// Re-enable a disabled account
    Activate(IdArgs),
    /// Disable an account and revoke its sessions
    Deactivate(IdArgs),
    /// Delete an account and its sessions
    Delete(IdArgs),
    /// Remove expired and revoked sessions
    CleanupSessions,
    /// Delete every account
    Reset(ResetArgs),
}

#[derive(Args)]
struct CreateArgs {
    /// Email address
    #[arg(short, long)]
    email: String,

    /// Password; a random one is generated and printed when omitted
    #[arg(short, long)]
    password: Option<String>,

    /// Display name
    #[arg(short, long)]
    name: Option<String>,
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, default_value = "1")]
    page: u32,

    #[arg(long, default_value = "20")]
    per_page: u32,
}

#[derive(Args)]
struct GetArgs {
    /// Account ID or email address
    account: String,
}

#[derive(Args)]
struct PlanArgs {
    /// Account ID
    id: Uuid,

    /// free, basic or premium
    plan: Plan,

    /// Days the plan stays in force
    #[arg(short, long, default_value = "30")]
    days: u32,
}

#[derive(Args)]
struct IdArgs {
    /// Account ID
    id: Uuid,
}

#[derive(Args)]
struct ResetArgs {
    /// Confirm deleting every account
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let db_config = database_config_from_env()?;
    let pool = db_config.create_pool().await?;

    // Run migrations to ensure database is up to date
    run_migrations(&pool).await?;

    let store = Arc::new(PgStore::new(pool));
    let service = UserService::new(
        store.clone(),
        store.clone(),
        Arc::new(SaltedSha256Hasher::new()),
    );

    match cli.command {
        Commands::Create(args) => create_user(&service, args).await?,
        Commands::List(args) => list_users(&service, args).await?,
        Commands::Get(args) => get_user(&service, args).await?,
        Commands::Plan(args) => change_plan(&service, args).await?,
        Commands::Activate(args) => set_active(&service, args, true).await?,
        Commands::Deactivate(args) => set_active(&service, args, false).await?,
        Commands::Delete(args) => delete_user(&service, args).await?,
        Commands::CleanupSessions => cleanup_sessions(store.as_ref()).await?,
        Commands::Reset(args) => reset(&service, args).await?,
    }

    Ok(())
}

async fn create_user(
    service: &UserService,
    args: CreateArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔧 Creating new account...");

    let generated = args.password.is_none();
    let password = args
        .password
        .unwrap_or_else(|| generate_secure_token(GENERATED_PASSWORD_LENGTH));

    let user = service
        .create_user(SignupRequest {
            email: args.email,
            password: password.clone(),
            name: args.name,
            image: None,
        })
        .await?;

    println!("✅ Account created successfully!");
    println!();
    print_user(&user);

    if generated {
        println!();
        println!("🔑 Generated password: {}", password);
        println!("⚠️  WARNING: The password is only shown once. Save it securely!");
    }

    Ok(())
}

async fn list_users(
    service: &UserService,
    args: ListArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let pagination = Pagination::new(args.page, args.per_page);
    let response = service.list_users(pagination).await?;

    if response.users.is_empty() {
        println!("No accounts found on page {}.", response.page);
        return Ok(());
    }

    println!(
        "{:<38} {:<32} {:<8} {:<8} {:<20}",
        "ID", "Email", "Plan", "Active", "Created"
    );
    println!("{}", "-".repeat(108));

    let now = Utc::now();
    for user in &response.users {
        println!(
            "{:<38} {:<32} {:<8} {:<8} {:<20}",
            user.id,
            truncate_string(&user.email, 31),
            user.effective_plan(now),
            if user.is_active { "✅" } else { "❌" },
            user.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    println!(
        "Page {} ({} per page). Use --page to see more.",
        response.page, response.per_page
    );

    Ok(())
}

async fn get_user(service: &UserService, args: GetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let user = match args.account.parse::<Uuid>() {
        Ok(id) => service.get_user_by_id(id).await?,
        Err(_) => service.get_user_by_email(&args.account).await?,
    };

    print_user(&user);
    Ok(())
}

async fn change_plan(
    service: &UserService,
    args: PlanArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = service
        .update_plan(
            args.id,
            UpdatePlanRequest {
                plan: args.plan,
                duration_days: args.days,
            },
        )
        .await?;

    println!("✅ Plan updated");
    println!("   Plan: {}", response.plan_details.plan);
    println!("   Activated: {}", response.plan_details.activated_at);
    println!("   Expires: {}", response.plan_details.expires_at);

    Ok(())
}

async fn set_active(
    service: &UserService,
    args: IdArgs,
    active: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = service.set_active(args.id, active).await?;

    if active {
        println!("✅ Account {} enabled", user.id);
    } else {
        println!("⛔ Account {} disabled; its sessions were revoked", user.id);
    }

    Ok(())
}

async fn delete_user(
    service: &UserService,
    args: IdArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    service.delete_user(args.id).await?;
    println!("🗑️  Deleted account {}", args.id);
    Ok(())
}

async fn cleanup_sessions(store: &PgStore) -> Result<(), Box<dyn std::error::Error>> {
    let removed = store.delete_expired_sessions(Utc::now()).await?;
    println!("🧹 Removed {} expired or revoked sessions", removed);
    Ok(())
}

async fn reset(service: &UserService, args: ResetArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.yes {
        println!("Refusing to delete every account without --yes");
        return Ok(());
    }

    let removed = service.delete_all_users().await?;
    println!("🗑️  Deleted {} accounts", removed);
    Ok(())
}

fn print_user(user: &User) {
    println!("📋 Account Details:");
    println!("   ID: {}", user.id);
    println!("   Email: {}", user.email);
    println!("   Name: {}", user.name.as_deref().unwrap_or("-"));
    println!("   Plan: {}", user.effective_plan(Utc::now()));
    if let Some(expires_at) = user.plan_expires_at {
        println!("   Plan expires: {}", expires_at);
    }
    println!("   Active: {}", if user.is_active { "✅ Yes" } else { "❌ No" });
    println!("   Created: {}", user.created_at);
    println!("   Updated: {}", user.updated_at);
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
