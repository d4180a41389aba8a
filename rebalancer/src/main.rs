//! CLI entry point for the weightbook rebalancer.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use weightbook::Mode;
use zeroize::Zeroizing;

use weightbook_rebalancer::config::Config;
use weightbook_rebalancer::error::{Error, Result};
use weightbook_rebalancer::doctor;
use weightbook_rebalancer::report::{AccountsTable, DoctorReport, PlanReport, PortfolioTable};
use weightbook_rebalancer::target::{PlanFile, TargetSpec};
use weightbook_rebalancer::workflow::{self, App};

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Target-weight portfolio rebalancer for Tinkoff Invest")]
#[command(version)]
struct Cli {
    /// Path to config.toml (defaults are used if it does not exist)
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate an API token and store it encrypted
    Login {
        /// API token (prompted for if neither this nor --token-file is given)
        #[arg(long, env = "TINKOFF_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Read the token from a file
        #[arg(long)]
        token_file: Option<PathBuf>,

        /// Name to store with the token (defaults to the first account's name)
        #[arg(long)]
        username: Option<String>,
    },

    /// End the current session, keeping the stored token
    Logout,

    /// Delete the stored token of the current session
    Forget {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Show whether a session is active
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Check the encryption key, session store and stored token
    Doctor {
        #[arg(long)]
        json: bool,
    },

    /// List the accounts visible to the stored token
    Accounts {
        #[arg(long)]
        json: bool,
    },

    /// Show an account's holdings
    Portfolio {
        /// Account id
        account: String,

        #[arg(long)]
        json: bool,
    },

    /// Fetch an account's holdings and compute a plan toward target.json
    Rebalance {
        /// Account id
        account: String,

        /// Path to target.json
        target: PathBuf,

        /// buy_only or buy_and_sell (overrides the target file and config)
        #[arg(long)]
        mode: Option<Mode>,

        #[arg(long)]
        json: bool,
    },

    /// Compute a plan offline from a file of positions and targets
    Plan {
        /// Path to plan.json
        plan: PathBuf,

        /// buy_only or buy_and_sell (overrides the plan file and config)
        #[arg(long)]
        mode: Option<Mode>,

        #[arg(long)]
        json: bool,
    },
}

impl Command {
    fn json(&self) -> bool {
        match self {
            Command::Status { json }
            | Command::Doctor { json }
            | Command::Accounts { json }
            | Command::Portfolio { json, .. }
            | Command::Rebalance { json, .. }
            | Command::Plan { json, .. } => *json,
            Command::Login { .. } | Command::Logout | Command::Forget { .. } => false,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    let json = cli.command.json();

    if let Err(e) = run(cli) {
        let code = e.exit_code();
        if json {
            let body = serde_json::json!({ "error": e.to_string(), "kind": e.kind() });
            println!("{body}");
        } else {
            match &e {
                Error::Aborted(msg) => eprintln!("{msg}"),
                Error::Rebalance(_) => eprintln!("\nRejected: {e}"),
                _ => eprintln!("Error: {e}"),
            }
        }
        process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load_or_default(&cli.config)?;
    // Checks run before the app opens, which would create a key on first use.
    if let Command::Doctor { json } = cli.command {
        return run_doctor(&config, json);
    }
    let mut app = App::open(config)?;

    match cli.command {
        Command::Login {
            token,
            token_file,
            username,
        } => {
            let token = match (token_file, token) {
                (Some(path), _) => read_token_file(&path)?,
                (None, Some(token)) => Zeroizing::new(token),
                (None, None) => workflow::prompt_token()?,
            };
            let outcome = app.login(&token, username.as_deref())?;
            println!("Logged in as {}", outcome.username);
            print!("{}", AccountsTable(&outcome.accounts));
        }
        Command::Logout => {
            if app.logout()? {
                println!("Logged out. The stored token is kept; run `rebalancer forget` to delete it.");
            } else {
                println!("No active session.");
            }
        }
        Command::Forget { force } => {
            if !force {
                workflow::confirm("Delete the stored token for this session?")?;
            }
            if app.forget()? {
                println!("Stored token deleted.");
            } else {
                println!("No stored token for this session.");
            }
        }
        Command::Status { json } => {
            let status = app.status()?;
            if json {
                print_json(&status)?;
            } else {
                match &status.username {
                    Some(user) => println!("Logged in as {user}"),
                    None => println!("Not logged in"),
                }
            }
        }
        Command::Doctor { json } => run_doctor(app.config(), json)?,
        Command::Accounts { json } => {
            let accounts = app.accounts()?;
            if json {
                print_json(&accounts)?;
            } else {
                print!("{}", AccountsTable(&accounts));
            }
        }
        Command::Portfolio { account, json } => {
            let portfolio = app.portfolio(&account)?;
            if json {
                print_json(&portfolio)?;
            } else {
                print!("{}", PortfolioTable(&portfolio));
            }
        }
        Command::Rebalance {
            account,
            target,
            mode,
            json,
        } => {
            let spec = TargetSpec::load(&target)?;
            let result = app.rebalance(&account, &spec, &target.display().to_string(), mode)?;
            if json {
                print_json(&result)?;
            } else {
                print!("{}", PlanReport(&result));
            }
        }
        Command::Plan { plan, mode, json } => {
            let file = PlanFile::load(&plan)?;
            let result = app.plan(&file, &plan.display().to_string(), mode)?;
            if json {
                print_json(&result)?;
            } else {
                print!("{}", PlanReport(&result));
            }
        }
    }

    Ok(())
}

fn run_doctor(config: &Config, json: bool) -> Result<()> {
    let checks = doctor::run(config);
    if json {
        print_json(&checks)?;
    } else {
        print!("{}", DoctorReport(&checks));
    }
    match doctor::failures(&checks) {
        0 => Ok(()),
        n => Err(Error::Unhealthy(n)),
    }
}

fn read_token_file(path: &Path) -> Result<Zeroizing<String>> {
    let contents = Zeroizing::new(std::fs::read_to_string(path)?);
    Ok(Zeroizing::new(contents.trim().to_string()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    println!("{out}");
    Ok(())
}
