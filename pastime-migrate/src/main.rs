use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pastime_server::db::{repositories::UserRepository, Database};
use pastime_server::password::{hash_password, is_hashed};
use uuid::Uuid;

/// PasTime database maintenance utility
#[derive(Parser, Debug)]
#[command(name = "pastime-migrate")]
#[command(about = "Create, seed and maintain a PasTime database", long_about = None)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(short, long, global = true, env = "DATABASE_PATH", default_value = "./pastime.db")]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the schema (safe to run repeatedly)
    Init,
    /// Create the schema and insert the demo users, groups and posts
    Seed,
    /// Print row counts for every table
    Stats,
    /// Replace legacy plaintext credentials with argon2 hashes
    RehashPasswords {
        /// Report what would change without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

const TABLES: [&str; 9] = [
    "users",
    "posts",
    "groups",
    "hobbies",
    "user_hobbies",
    "friends",
    "group_details",
    "saved_posts",
    "sessions",
];

/// Outcome of a rehash run
#[derive(Debug, Default)]
struct RehashStats {
    users_checked: usize,
    already_hashed: usize,
    rehashed: usize,
    errors: Vec<String>,
}

/// Open an existing database file
fn connect_database(path: &str) -> Result<Database> {
    if !std::path::Path::new(path).exists() {
        anyhow::bail!("Database file not found: {}", path);
    }

    let db = Database::new(path).context("Failed to open database connection")?;
    let conn = db.connection()?;
    let has_users: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='users'",
            [],
            |row| row.get::<_, i64>(0).map(|count| count > 0),
        )
        .context("Failed to check for users table")?;

    if !has_users {
        anyhow::bail!("Database schema is invalid - users table not found (run `init` first)");
    }

    Ok(db)
}

fn table_counts(db: &Database) -> Result<Vec<(&'static str, i64)>> {
    let conn = db.connection()?;
    TABLES
        .iter()
        .map(|table| {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| {
                    row.get(0)
                })
                .with_context(|| format!("Failed to count rows in {}", table))?;
            Ok((*table, count))
        })
        .collect()
}

fn rehash_one(repo: &UserRepository, user_id: &Uuid, stored: &str) -> Result<()> {
    let hash = hash_password(stored)?;
    repo.update_password_hash(user_id, &hash)
        .with_context(|| format!("Failed to store new hash for user {}", user_id))
}

fn rehash_passwords(db: &Database, dry_run: bool) -> Result<RehashStats> {
    let repo = UserRepository::new(db.pool.clone());
    let mut stats = RehashStats::default();

    for (user_id, stored) in repo.list_credentials()? {
        stats.users_checked += 1;
        if is_hashed(&stored) {
            stats.already_hashed += 1;
            continue;
        }

        if dry_run {
            stats.rehashed += 1;
            continue;
        }

        match rehash_one(&repo, &user_id, &stored) {
            Ok(()) => stats.rehashed += 1,
            Err(e) => {
                let error_msg = format!("Error rehashing user {}: {:#}", user_id, e);
                eprintln!("ERROR: {}", error_msg);
                stats.errors.push(error_msg);
            }
        }
    }

    Ok(stats)
}

fn display_rehash_stats(stats: &RehashStats, dry_run: bool) {
    println!();
    println!("Rehash Summary");
    println!("==============");
    println!();
    println!("Users checked: {}", stats.users_checked);
    println!("Already hashed: {}", stats.already_hashed);
    if dry_run {
        println!("Would rehash: {}", stats.rehashed);
    } else {
        println!("Rehashed: {}", stats.rehashed);
    }

    if !stats.errors.is_empty() {
        println!();
        println!("Errors encountered: {}", stats.errors.len());
        for (i, error) in stats.errors.iter().enumerate() {
            println!("  {}. {}", i + 1, error);
        }
    }

    println!();
    if dry_run {
        println!("This was a dry run - no changes were made to the database.");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("PasTime Database Utility");
    println!("========================");
    println!("Database: {}", cli.database);
    println!();

    match cli.command {
        Command::Init => {
            let db = Database::new(&cli.database)?;
            db.initialize()?;
            println!("Schema initialized.");
        }
        Command::Seed => {
            let db = Database::new(&cli.database)?;
            db.initialize()?;
            db.seed_demo_data()?;
            println!("Demo data seeded.");
        }
        Command::Stats => {
            let db = connect_database(&cli.database)?;
            for (table, count) in table_counts(&db)? {
                println!("{:<14} {}", table, count);
            }
        }
        Command::RehashPasswords { dry_run } => {
            let db = connect_database(&cli.database)?;
            let stats = rehash_passwords(&db, dry_run)?;
            display_rehash_stats(&stats, dry_run);
        }
    }

    Ok(())
}
