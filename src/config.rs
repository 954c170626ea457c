//! Configuration for the WorkStation gate
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::auth::{extract_token_from_header, Permission};
use crate::db::Decision;

/// Lifetimes of the two token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConfig {
    /// Pending challenge lifetime in seconds
    pub challenge_ttl_seconds: u64,
    /// Session lifetime in seconds
    pub session_ttl_seconds: u64,
}

pub const DEFAULT_CHALLENGE_TTL_SECONDS: u64 = 5 * 60;
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 60 * 60;
/// Upper bound for either lifetime
pub const MAX_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            challenge_ttl_seconds: DEFAULT_CHALLENGE_TTL_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }
}

/// WorkStation gate - login, MFA and access checks against a SQLite store
#[derive(Parser, Debug, Clone)]
#[command(name = "workstation-gate")]
#[command(about = "Authorization and session-trust core for WorkStation")]
pub struct Args {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "workstation.sqlite")]
    pub database: PathBuf,

    /// Enable development mode (well-known JWT secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Pending MFA challenge lifetime in seconds
    #[arg(long, env = "CHALLENGE_TTL_SECONDS", default_value_t = DEFAULT_CHALLENGE_TTL_SECONDS)]
    pub challenge_ttl_seconds: u64,

    /// Session token lifetime in seconds
    #[arg(long, env = "SESSION_TTL_SECONDS", default_value_t = DEFAULT_SESSION_TTL_SECONDS)]
    pub session_ttl_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Bearer token for commands that act as a logged-in principal
#[derive(ClapArgs, Debug, Clone)]
pub struct TokenArg {
    /// Session token from `verify`
    #[arg(long, env = "WORKSTATION_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl TokenArg {
    /// Token with any `Bearer ` prefix removed
    pub fn bearer(&self) -> Option<&str> {
        extract_token_from_header(self.token.as_deref())
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Register a principal; the role is derived from the email
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "WORKSTATION_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Check the password and start the MFA challenge
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "WORKSTATION_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Exchange a challenge token and the MFA code for a session token
    Verify {
        #[arg(long)]
        temp_token: String,
        #[arg(long)]
        code: String,
    },

    /// Check whether the session holds a permission
    Check {
        permission: Permission,
        #[command(flatten)]
        token: TokenArg,
    },

    /// List principals the session may message
    Contacts {
        #[command(flatten)]
        token: TokenArg,
    },

    /// List Employees; Managers and Admins only
    Roster {
        #[command(flatten)]
        token: TokenArg,
    },

    /// Document vault
    #[command(subcommand)]
    Documents(DocumentCommand),

    /// Inbox and sending
    #[command(subcommand)]
    Messages(MessageCommand),

    /// Access requests
    #[command(subcommand)]
    Requests(RequestCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum DocumentCommand {
    /// Record an uploaded file and its visibility
    Upload {
        #[arg(long)]
        filename: String,
        #[arg(long)]
        stored_name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        visible_to_admin: bool,
        #[arg(long)]
        visible_to_manager: bool,
        #[arg(long)]
        visible_to_employee: bool,
        #[command(flatten)]
        token: TokenArg,
    },
    /// List documents visible to the session
    List {
        #[command(flatten)]
        token: TokenArg,
    },
    /// Resolve a document for download
    Download {
        id: u64,
        #[command(flatten)]
        token: TokenArg,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum MessageCommand {
    /// Send to one principal or to a role-group
    Send {
        #[arg(long, conflicts_with = "group", required_unless_present = "group")]
        to: Option<u64>,
        /// all_admins, all_managers, all_employees or all
        #[arg(long)]
        group: Option<String>,
        content: String,
        #[command(flatten)]
        token: TokenArg,
    },
    /// Messages readable by the session
    Inbox {
        #[command(flatten)]
        token: TokenArg,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum RequestCommand {
    /// File an access request
    Submit {
        #[arg(long)]
        resource: String,
        #[arg(long, default_value = "")]
        reason: String,
        /// Stored as-is, never verified
        #[arg(long)]
        signature: Option<String>,
        #[command(flatten)]
        token: TokenArg,
    },
    /// Requests visible to the session
    List {
        #[command(flatten)]
        token: TokenArg,
    },
    /// Approve or reject a request
    Decide {
        id: u64,
        #[arg(value_enum)]
        decision: Decision,
        #[command(flatten)]
        token: TokenArg,
    },
}

impl Args {
    /// Configured JWT secret, if non-empty
    pub fn jwt_secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref().filter(|s| !s.is_empty())
    }

    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            challenge_ttl_seconds: self.challenge_ttl_seconds,
            session_ttl_seconds: self.session_ttl_seconds,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret().is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.challenge_ttl_seconds == 0 || self.session_ttl_seconds == 0 {
            return Err("Token lifetimes must be greater than zero".to_string());
        }

        if self.challenge_ttl_seconds.max(self.session_ttl_seconds) > MAX_TTL_SECONDS {
            return Err(format!(
                "Token lifetimes must not exceed {MAX_TTL_SECONDS} seconds"
            ));
        }

        if self.challenge_ttl_seconds > self.session_ttl_seconds {
            return Err(
                "CHALLENGE_TTL_SECONDS must not exceed SESSION_TTL_SECONDS".to_string(),
            );
        }

        Ok(())
    }
}
