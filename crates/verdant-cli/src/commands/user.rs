//! User management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use verdant_auth::{PasswordHasher, PasswordValidator};
use verdant_core::error::AppError;
use verdant_core::types::pagination::PageRequest;
use verdant_database::repositories::user::UserRepository;
use verdant_entity::user::model::{CreateUser, User};
use verdant_entity::user::role::UserRole;
use verdant_entity::user::status::UserStatus;

use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a new user (prompts for missing fields)
    Create {
        /// Username
        #[arg(short, long)]
        username: Option<String>,
        /// Email
        #[arg(short, long)]
        email: Option<String>,
        /// Role: owner, admin, member or guest
        #[arg(short, long, default_value = "admin")]
        role: String,
        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// List users
    List {
        /// Page number
        #[arg(long, default_value = "1")]
        page: u64,
        /// Results per page
        #[arg(long, default_value = "50")]
        page_size: u64,
    },
    /// Change a user's role
    Role {
        /// Username
        username: String,
        /// New role: owner, admin, member or guest
        role: String,
    },
    /// Enable a user
    Enable {
        /// Username
        username: String,
    },
    /// Disable a user
    Disable {
        /// Username
        username: String,
    },
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    /// User ID
    id: String,
    /// Username
    username: String,
    /// Email
    email: String,
    /// Role
    role: String,
    /// Status
    status: String,
    /// Created at
    created_at: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.to_string(),
            username: u.username.clone(),
            email: u.email.clone().unwrap_or_default(),
            role: u.role.to_string(),
            status: u.status.to_string(),
            created_at: u.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute user commands
pub async fn execute(args: &UserArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;
    let user_repo = UserRepository::new(pool.clone());

    match &args.command {
        UserCommand::Create {
            username,
            email,
            role,
            password,
        } => {
            let role: UserRole = role.parse()?;

            let username = match username {
                Some(u) => u.clone(),
                None => dialoguer::Input::new()
                    .with_prompt("Username")
                    .interact_text()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
            };

            let email = match email {
                Some(e) => Some(e.clone()),
                None => {
                    let e: String = dialoguer::Input::new()
                        .with_prompt("Email (optional, press Enter to skip)")
                        .allow_empty(true)
                        .interact_text()
                        .map_err(|e| AppError::internal(format!("Input error: {e}")))?;
                    if e.is_empty() { None } else { Some(e) }
                }
            };

            let password = match password {
                Some(p) => p.clone(),
                None => dialoguer::Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords do not match")
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
            };

            let validator = PasswordValidator::new(&config.auth);
            validator.validate(&password, &[&username])?;

            let hasher = PasswordHasher::new();
            let password_hash = hasher.hash_password(&password)?;

            let create_user = CreateUser {
                username: username.clone(),
                email,
                password_hash,
                display_name: Some(username.clone()),
                role,
            };

            let user = user_repo.create(&create_user).await?;

            output::print_success(&format!(
                "User '{}' created with role {} (id: {})",
                username, user.role, user.id
            ));
        }
        UserCommand::List { page, page_size } => {
            let request = PageRequest::new(*page, *page_size);
            let response = user_repo.find_all(&request).await?;

            let rows: Vec<UserRow> = response.items.iter().map(UserRow::from).collect();
            output::print_list(&rows, format);

            if format == OutputFormat::Table {
                println!(
                    "Page {} of {} ({} users total)",
                    response.page, response.total_pages, response.total_items
                );
            }
        }
        UserCommand::Role { username, role } => {
            let role: UserRole = role.parse()?;
            let user = find_user(&user_repo, username).await?;

            user_repo.update_role(user.id, role).await?;
            output::print_success(&format!("User '{username}' is now {role}"));
        }
        UserCommand::Enable { username } => {
            let user = find_user(&user_repo, username).await?;

            user_repo.update_status(user.id, UserStatus::Active).await?;
            output::print_success(&format!("User '{username}' enabled"));
        }
        UserCommand::Disable { username } => {
            let user = find_user(&user_repo, username).await?;

            user_repo.update_status(user.id, UserStatus::Disabled).await?;
            output::print_success(&format!("User '{username}' disabled"));
        }
    }

    Ok(())
}

async fn find_user(repo: &UserRepository, username: &str) -> Result<User, AppError> {
    repo.find_by_username(username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))
}
