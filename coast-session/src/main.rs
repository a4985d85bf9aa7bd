//! coast-session - Manage the locally stored Coastwatch login session

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use libcoastwatch::logging::LoggingConfig;
use libcoastwatch::service::GateState;
use libcoastwatch::session::SESSION_MAX_AGE_SECS;
use libcoastwatch::{CoastwatchError, CoastwatchService, Config};
use serde_json::json;

#[derive(Parser)]
#[command(name = "coast-session")]
#[command(version, about = "Manage the stored Coastwatch login session")]
#[command(long_about = r#"Manage the stored Coastwatch login session.

Sessions are valid for 7 days from login. An expired session is removed the
next time it is checked.

EXAMPLES:
    # Record a token obtained from the sign-in flow
    coast-session login

    # Non-interactive (scripts, agents)
    echo "$TOKEN" | coast-session login --stdin --user-id 64f1c2

    # Is the session still valid?
    coast-session status
    coast-session status --format json

    # Where would the app route on launch?
    coast-session gate

    coast-session logout

EXIT CODES:
    0 - Success
    1 - Error (config, storage)
    2 - Not logged in or session expired (status)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a session token
    Login {
        /// Read the token from stdin (for automation/agents)
        #[arg(long)]
        stdin: bool,

        /// User id attached to submitted reports
        #[arg(long, value_name = "ID")]
        user_id: Option<String>,
    },

    /// Show whether a valid session is stored
    Status {
        /// Output format
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Remove the session and user record
    Logout,

    /// Run the launch gate and print the resolved route
    Gate {
        /// Output format
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run_command(cli.command).await {
        eprintln!("Error: {}", e);
        let code = e
            .downcast_ref::<CoastwatchError>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run_command(command: Commands) -> Result<()> {
    let config = Config::load()?;
    let service = CoastwatchService::from_config(config)?;

    match command {
        Commands::Login { stdin, user_id } => login(&service, stdin, user_id),
        Commands::Status { format } => status(&service, &format),
        Commands::Logout => logout(&service),
        Commands::Gate { format } => gate(&service, &format).await,
    }
}

fn login(service: &CoastwatchService, use_stdin: bool, user_id: Option<String>) -> Result<()> {
    let token = if use_stdin {
        use std::io::{self, Read};
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer.trim().to_string()
    } else {
        if !atty::is(atty::Stream::Stdin) {
            bail!("Not a TTY. Use --stdin to read the token from stdin.");
        }
        rpassword::prompt_password("Session token: ")?
            .trim()
            .to_string()
    };

    if token.is_empty() {
        bail!("Token cannot be empty");
    }

    let sessions = service.sessions();
    sessions.save(&token)?;

    if let Some(id) = user_id {
        sessions
            .save_user(&json!({ "id": id }))
            .context("Failed to store user record")?;
    }

    println!("✓ Logged in; session valid for 7 days");
    Ok(())
}

fn status(service: &CoastwatchService, format: &str) -> Result<()> {
    let now = Utc::now();
    let session = service.sessions().load_valid(now)?;
    let user_id = service.sessions().user_id();

    match (&session, format) {
        (Some(session), "json") => {
            let expires_at =
                session.issued_at() + chrono::Duration::seconds(SESSION_MAX_AGE_SECS);
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "logged_in": true,
                    "issued_at": session.issued_at().to_rfc3339(),
                    "expires_at": expires_at.to_rfc3339(),
                    "user_id": user_id,
                }))?
            );
        }
        (Some(session), _) => {
            let remaining = session
                .remaining(now)
                .to_std()
                .map(|d| std::time::Duration::from_secs(d.as_secs()))
                .unwrap_or_default();
            println!("✓ Logged in");
            println!("  Issued:  {}", session.issued_at().format("%Y-%m-%d %H:%M:%S UTC"));
            println!("  Expires: in {}", humantime::format_duration(remaining));
            if let Some(id) = &user_id {
                println!("  User:    {}", id);
            }
        }
        (None, "json") => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "logged_in": false }))?
            );
        }
        (None, _) => {}
    }

    if session.is_none() {
        return Err(CoastwatchError::AuthRequired(
            "Not logged in. Run 'coast-session login' first.".to_string(),
        )
        .into());
    }
    Ok(())
}

fn logout(service: &CoastwatchService) -> Result<()> {
    let had_session = service.sessions().load()?.is_some();
    service.sessions().sign_out()?;

    if had_session {
        println!("✓ Logged out");
    } else {
        println!("No session stored");
    }
    Ok(())
}

async fn gate(service: &CoastwatchService, format: &str) -> Result<()> {
    let state = service.gate().run().await;

    let route = match state {
        GateState::Authenticated => "main",
        GateState::Unauthenticated | GateState::Checking => "login",
    };

    if format == "json" {
        println!(
            "{}",
            serde_json::to_string(&json!({ "state": state, "route": route }))?
        );
    } else {
        println!("{:?} → {}", state, route);
    }
    Ok(())
}
