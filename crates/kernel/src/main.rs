//! Folio CLI
//!
//! Inspect and change the content document and exercise the security
//! engine against the configured store.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use folio_kernel::events::wire::Envelope;
use folio_kernel::{AppState, Config};

#[derive(Parser, Debug)]
#[command(name = "folio", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current content document.
    Show,

    /// Apply a wire-form event, e.g. '{"event":"blog_updated","data":{...}}'.
    Emit {
        /// Event envelope as JSON.
        json: String,
    },

    /// Check whether an identity may attempt a login.
    LoginCheck { identity: String },

    /// Record a login attempt outcome for an identity.
    Login {
        identity: String,

        #[arg(long, conflicts_with = "failure", required_unless_present = "failure")]
        success: bool,

        #[arg(long)]
        failure: bool,
    },

    /// Check a password against the strength rules.
    Password { password: String },

    /// Sanitize text and report whether it looked like an XSS attempt.
    Sanitize { text: String },

    /// Print the security log.
    Logs {
        /// Clear the log after printing.
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    let state = AppState::new(&config).context("failed to initialize application state")?;

    match cli.command {
        Command::Show => {
            state.content().log_summary();
            print_json(&state.content().document())?;
        }
        Command::Emit { json } => {
            let envelope: Envelope =
                serde_json::from_str(&json).context("event must be a JSON object")?;
            let id = state
                .content()
                .emit_raw(&envelope.event, envelope.data)
                .context("event rejected")?;
            state.content().settled().await;
            info!(update_id = id, "event applied");
            print_json(&state.content().document())?;
        }
        Command::LoginCheck { identity } => {
            print_json(&state.security().check_login_attempts(&identity))?;
        }
        Command::Login {
            identity,
            success,
            failure: _,
        } => {
            let (check, session) = state.security().attempt_login(&identity, || success);
            if !check.can_login {
                print_json(&check)?;
                bail!("'{identity}' is locked out");
            }
            match session {
                Some(session) => print_json(&session)?,
                None => println!(
                    "login failed, {} attempt(s) remaining",
                    state.security().lockout().attempts_remaining(&identity)
                ),
            }
        }
        Command::Password { password } => {
            let check = state.security().validate_password(&password);
            if check.is_valid {
                println!("password ok");
            } else {
                for error in &check.errors {
                    println!("{error}");
                }
            }
        }
        Command::Sanitize { text } => {
            if state.security().detect_xss(&text) {
                state
                    .security()
                    .log_security_event("xss_attempt", serde_json::json!({ "input": text }));
            }
            println!("{}", state.security().sanitize_input(&text));
        }
        Command::Logs { clear } => {
            print_json(&state.security().security_logs())?;
            if clear {
                state.security().clear_security_logs();
            }
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{out}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
