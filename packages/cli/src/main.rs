//! `yatube`: admin command-line interface for the Yatube blog API.
//!
//! The HTTP API has no registration or group-management routes, so accounts
//! and groups are created here, directly in the server's SQLite database:
//!
//! - **`create-user`**: add an account that can log in at `/jwt/create/`.
//! - **`create-group`**: add a group posts can be filed under.
//! - **`list-groups`**: print every group.
//!
//! Every subcommand takes `--db` (or `YATUBE_DB`), the same database file the
//! server is started with.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use yatube::validation::{validate_slug, validate_title, validate_username};
use yatube::ValidationError;
use yatube_api::GroupRepr;
use yatube_server::{
    password::hash_password,
    storage::NewGroup,
    SqliteStorage, Storage, StorageError,
};

/// yatube: Yatube admin CLI
///
/// Manage accounts and groups of a Yatube server.
#[derive(Parser)]
#[command(name = "yatube", version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database file.
    #[arg(long, env = "YATUBE_DB", value_name = "PATH", global = true, default_value = "yatube.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a user account.
    ///
    /// Examples:
    ///   yatube create-user alice --password s3cret
    ///   YATUBE_PASSWORD=s3cret yatube create-user alice
    CreateUser {
        /// Login name: letters, digits and @/./+/-/_ only.
        username: String,

        /// Account password; stored as an Argon2id hash.
        #[arg(long, env = "YATUBE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create a group.
    CreateGroup {
        /// Display name.
        title: String,

        /// Unique URL-safe identifier.
        slug: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// List all groups.
    ListGroups {
        /// Print JSON instead of one line per group.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let db = cli.db.to_string_lossy().into_owned();
    let storage = SqliteStorage::open(&db)
        .unwrap_or_else(|e| fatal(&format!("cannot open database {db}: {e}")));

    match cli.command {
        Command::CreateUser { username, password } => {
            check("username", validate_username(&username));
            if password.is_empty() {
                fatal("password: This field may not be blank.");
            }
            let hash = hash_password(&password).unwrap_or_else(|e| fatal(&e.to_string()));
            match storage.create_user(&username, &hash).await {
                Ok(user) => println!("created user {} (id {})", user.username, user.id),
                Err(StorageError::Conflict(_)) => {
                    fatal(&format!("a user named {username:?} already exists"))
                }
                Err(e) => fatal(&e.to_string()),
            }
        }

        Command::CreateGroup {
            title,
            slug,
            description,
        } => {
            check("title", validate_title(&title));
            check("slug", validate_slug(&slug));
            let group = NewGroup {
                title,
                slug,
                description,
            };
            match storage.create_group(&group).await {
                Ok(g) => println!("created group {} (id {})", g.slug, g.id),
                Err(StorageError::Conflict(_)) => {
                    fatal(&format!("a group with slug {:?} already exists", group.slug))
                }
                Err(e) => fatal(&e.to_string()),
            }
        }

        Command::ListGroups { json } => {
            let groups = storage
                .list_groups()
                .await
                .unwrap_or_else(|e| fatal(&e.to_string()));
            if json {
                let reprs: Vec<GroupRepr> = groups.into_iter().map(GroupRepr::from).collect();
                match serde_json::to_string_pretty(&reprs) {
                    Ok(s) => println!("{s}"),
                    Err(e) => fatal(&e.to_string()),
                }
            } else if groups.is_empty() {
                println!("no groups");
            } else {
                for g in groups {
                    println!("{:>4}  {:<20}  {}", g.id.0, g.slug, g.title);
                }
            }
        }
    }
}

fn check(field: &str, result: Result<(), ValidationError>) {
    if let Err(e) = result {
        fatal(&format!("{field}: {e}"));
    }
}

fn fatal(msg: &str) -> ! {
    eprintln!("yatube: {msg}");
    process::exit(2);
}
