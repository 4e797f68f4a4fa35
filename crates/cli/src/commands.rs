//! CLI commands

use anyhow::{Context, Result};
use churn_http::ApiClient;
use churn_http::UserForm;
use churn_http::types::Client;
use churn_session::{
    Credentials, FileStore, Role, SessionManager, SessionState, UserProfile,
    require_authenticated, require_role,
};
use clap::Subcommand;
use std::sync::Arc;
use tracing::info;

use crate::config::ConsoleConfig;
use crate::state_dir::StateDir;

/// Roles allowed to contact clients directly
const OUTREACH_ROLES: &[Role] = &[Role::Admin, Role::MarketingManager];

const ADMIN_ROLES: &[Role] = &[Role::Admin];

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and keep the session for later commands
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "CHURN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Show whether a session is active
    Status,

    /// Exchange the refresh token for a new access token now
    Refresh,

    /// Client records
    Clients {
        #[command(subcommand)]
        command: ClientCommands,
    },

    /// Churn prediction for a client
    Predict { client_id: u64 },

    /// Analyze the sentiment of client feedback
    Sentiment { client_id: u64, text: String },

    /// Send an email to a client
    Email {
        client_id: u64,

        #[arg(long)]
        subject: String,

        #[arg(long)]
        content: String,
    },

    /// Send an SMS to a client
    Sms { client_id: u64, message: String },

    /// Manage console users (admin only)
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum ClientCommands {
    /// List all clients
    List,

    /// Show one client
    Show { id: u64 },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List console users
    List,

    /// Create a user
    Create {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        /// admin, data_scientist, marketing_manager or user
        #[arg(long, default_value = "marketing_manager")]
        role: Role,
    },

    /// Change fields of an existing user
    Update {
        id: u64,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        role: Option<Role>,
    },

    /// Delete a user
    Delete { id: u64 },
}

/// The session and the layered API client built on it
pub struct Console {
    pub session: SessionManager,
    pub api: ApiClient,
}

impl Console {
    /// Restore the persisted session and wire it into an API client
    pub fn connect(config: &ConsoleConfig, state: &StateDir) -> Result<Self> {
        let mut builder = ApiClient::builder()
            .base_url(&config.api.base_url)
            .timeout(config.timeout())
            .endpoints(config.auth.endpoints());
        if let Some(user_agent) = &config.api.user_agent {
            builder = builder.user_agent(user_agent);
        }
        let base = builder.build().context("Failed to build API client")?;

        let store_path = config
            .session
            .store_path
            .clone()
            .unwrap_or_else(|| state.session_file());
        let session = SessionManager::restore(
            Arc::new(base.clone()),
            Arc::new(FileStore::new(store_path)),
            config.session.session_config(),
        );
        let api = base.with_auth_layer(Arc::new(session.clone()));

        Ok(Self { session, api })
    }
}

impl Commands {
    pub async fn execute(self, config: ConsoleConfig, state: StateDir) -> Result<()> {
        let console = Console::connect(&config, &state)?;
        let Console { session, api } = &console;

        match self {
            Self::Login { username, password } => {
                let profile = session
                    .login(&Credentials::new(username, password))
                    .await
                    .context("Login failed")?;
                info!(user_id = profile.id, "Logged in");
                println!("Logged in as {} ({})", profile.display_name(), profile.role);
            }
            Self::Logout => {
                session.logout();
                println!("Logged out");
            }
            Self::Whoami => {
                let user = require_authenticated(session)?;
                println!("{}", serde_json::to_string_pretty(&user)?);
            }
            Self::Status => match session.state() {
                SessionState::LoggedIn => {
                    let user = require_authenticated(session)?;
                    println!("Logged in as {} ({})", user.username, user.role);
                }
                SessionState::LoggedOut => println!("Logged out"),
            },
            Self::Refresh => {
                require_authenticated(session)?;
                session
                    .refresh_access_token()
                    .await
                    .context("Refresh failed")?;
                println!("Access token refreshed");
            }
            Self::Clients { command } => {
                require_authenticated(session)?;
                match command {
                    ClientCommands::List => {
                        for client in api.list_clients().await? {
                            print_client(&client);
                        }
                    }
                    ClientCommands::Show { id } => print_client(&api.get_client(id).await?),
                }
            }
            Self::Predict { client_id } => {
                require_authenticated(session)?;
                let prediction = api.churn_prediction(client_id).await?;
                println!(
                    "Client {}: churn probability {:.1}%",
                    prediction.client_id,
                    prediction.probability * 100.0
                );
                for factor in &prediction.factors {
                    println!("  - {factor}");
                }
            }
            Self::Sentiment { client_id, text } => {
                require_authenticated(session)?;
                let analysis = api.analyze_sentiment(client_id, &text).await?;
                println!(
                    "Client {}: {} ({:.2})",
                    analysis.client_id, analysis.sentiment, analysis.score
                );
            }
            Self::Email {
                client_id,
                subject,
                content,
            } => {
                require_role(session, OUTREACH_ROLES)?;
                let receipt = api.send_email(client_id, &subject, &content).await?;
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            }
            Self::Sms { client_id, message } => {
                require_role(session, OUTREACH_ROLES)?;
                let receipt = api.send_sms(client_id, &message).await?;
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            }
            Self::Users { command } => {
                require_role(session, ADMIN_ROLES)?;
                command.execute(api).await?;
            }
            Self::Config => println!("{}", serde_json::to_string_pretty(&config)?),
        }

        Ok(())
    }
}

impl UserCommands {
    async fn execute(self, api: &ApiClient) -> Result<()> {
        match self {
            Self::List => {
                for user in api.list_users().await? {
                    print_user(&user);
                }
            }
            Self::Create {
                username,
                email,
                first_name,
                last_name,
                role,
            } => {
                let form = UserForm {
                    username,
                    email,
                    first_name,
                    last_name,
                    role,
                };
                let user = api.create_user(&form).await?;
                info!(user_id = user.id, "Created user");
                print_user(&user);
            }
            Self::Update {
                id,
                username,
                email,
                first_name,
                last_name,
                role,
            } => {
                let current = api
                    .list_users()
                    .await?
                    .into_iter()
                    .find(|user| user.id == id)
                    .with_context(|| format!("No user with id {id}"))?;
                let mut form = UserForm::from(&current);
                if let Some(username) = username {
                    form.username = username;
                }
                if let Some(email) = email {
                    form.email = email;
                }
                if let Some(first_name) = first_name {
                    form.first_name = first_name;
                }
                if let Some(last_name) = last_name {
                    form.last_name = last_name;
                }
                if let Some(role) = role {
                    form.role = role;
                }
                print_user(&api.update_user(id, &form).await?);
            }
            Self::Delete { id } => {
                api.delete_user(id).await?;
                println!("Deleted user {id}");
            }
        }
        Ok(())
    }
}

fn print_user(user: &UserProfile) {
    println!(
        "{:>6}  {:<20} {:<30} {:<18} {}",
        user.id,
        user.username,
        user.email,
        user.role,
        if user.is_active { "active" } else { "inactive" }
    );
}

fn print_client(client: &Client) {
    println!(
        "{:>6}  {:<30} {:>5.1}%  {:<10} {}",
        client.id,
        client.name,
        client.churn_risk * 100.0,
        client.sentiment,
        client.email
    );
}
