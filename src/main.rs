//! WorkStation gate CLI
//!
//! Drives the authorization core against a SQLite database. Results are
//! printed to stdout as JSON; logs go to stderr.

use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workstation_gate::{
    auth::{get_permission_description, TokenCodec},
    config::{Args, Command, DocumentCommand, MessageCommand, RequestCommand},
    db::SqliteStore,
    services::{DocumentUpload, MessageDraft, RequestDraft, Workstation},
    visibility::RequestedVisibility,
    AuthError,
};

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Logs go to stderr so stdout stays machine-readable
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("workstation_gate={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let codec = match args.jwt_secret() {
        Some(secret) => TokenCodec::new(secret)?,
        None => {
            warn!("Using development JWT secret");
            TokenCodec::new_dev()
        }
    };

    let mode = if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" };
    info!(database = %args.database.display(), mode, "Opening WorkStation store");
    let store = Arc::new(SqliteStore::open(&args.database)?);

    let workstation = Workstation::builder(store, Arc::new(codec))
        .config(args.gate_config())
        .build();

    if let Err(e) = run(&workstation, args.command) {
        error!(status = %e.status_code(), "{}", e);
        let (status, body) = e.into_status_code_and_body();
        eprintln!("{body}");
        std::process::exit(exit_code(status.as_u16()));
    }

    Ok(())
}

fn run(ws: &Workstation, command: Command) -> Result<(), AuthError> {
    match command {
        Command::Register {
            username,
            email,
            password,
        } => print(&ws.register(&username, &email, &password)?),

        Command::Login { email, password } => print(&ws.begin_login(&email, &password)?),

        Command::Verify { temp_token, code } => print(&ws.complete_login(&temp_token, &code)?),

        Command::Check { permission, token } => {
            let principal = ws.authorize(token.bearer(), permission)?;
            print(&serde_json::json!({
                "granted": true,
                "permission": permission,
                "description": get_permission_description(permission),
                "principal": principal,
            }))
        }

        Command::Contacts { token } => print(&ws.contacts(token.bearer())?),

        Command::Roster { token } => print(&ws.team_roster(token.bearer())?),

        Command::Documents(cmd) => match cmd {
            DocumentCommand::Upload {
                filename,
                stored_name,
                description,
                visible_to_admin,
                visible_to_manager,
                visible_to_employee,
                token,
            } => {
                let upload = DocumentUpload {
                    filename,
                    stored_name,
                    description,
                    visibility: RequestedVisibility {
                        admin: visible_to_admin,
                        manager: visible_to_manager,
                        employee: visible_to_employee,
                    },
                };
                print(&ws.upload_document(token.bearer(), upload)?)
            }
            DocumentCommand::List { token } => print(&ws.list_documents(token.bearer())?),
            DocumentCommand::Download { id, token } => {
                print(&ws.download_document(token.bearer(), id)?)
            }
        },

        Command::Messages(cmd) => match cmd {
            MessageCommand::Send {
                to,
                group,
                content,
                token,
            } => {
                let draft = MessageDraft {
                    recipient_id: to,
                    recipient_group: group,
                    content,
                };
                print(&ws.send_message(token.bearer(), draft)?)
            }
            MessageCommand::Inbox { token } => print(&ws.inbox(token.bearer())?),
        },

        Command::Requests(cmd) => match cmd {
            RequestCommand::Submit {
                resource,
                reason,
                signature,
                token,
            } => {
                let draft = RequestDraft {
                    resource,
                    reason,
                    digital_signature: signature,
                };
                print(&ws.submit_request(token.bearer(), draft)?)
            }
            RequestCommand::List { token } => print(&ws.list_requests(token.bearer())?),
            RequestCommand::Decide {
                id,
                decision,
                token,
            } => print(&ws.decide_request(token.bearer(), id, decision)?),
        },
    }
}

fn print<T: Serialize>(value: &T) -> Result<(), AuthError> {
    let out = serde_json::to_string_pretty(value).map_err(|e| AuthError::Internal(e.to_string()))?;
    println!("{out}");
    Ok(())
}

/// 4xx → 2, 5xx → 1
fn exit_code(status: u16) -> i32 {
    if (400..500).contains(&status) {
        2
    } else {
        1
    }
}
