mod accounts;
mod assets;
mod cli;
mod console;
mod results;

use crate::cli::{Args, Command};
use account_client::{ActionRequest, Credential, HttpBackend, ServiceConfig};
use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::*;
use console::ConsoleObserver;
use roster_engine::{BatchConfig, BatchRunner, RetryPolicy, aggregate};
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Exit code for a run cut short by Ctrl-C, after the partial summary.
const EXIT_CANCELLED: i32 = 130;

type RequestFactory = Box<dyn Fn(usize, &Credential) -> ActionRequest + Send + Sync>;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(args).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<i32> {
    let mut credentials = accounts::load_credentials(&args.accounts)?;
    let request_for = build_request_factory(&args.command, &mut credentials)?;

    let mut service = ServiceConfig::default();
    if let Some(url) = args.service_url.as_deref() {
        service = service.with_base_url(url);
    }
    let client = HttpBackend::build_client(&service).context("could not build the HTTP client")?;
    let backend = Arc::new(HttpBackend::new(service, client));

    let config = BatchConfig {
        concurrency: args.max_concurrent.max(1),
        inter_account_delay: Duration::from_secs(args.delay),
        login_retry: RetryPolicy {
            max_attempts: args.retries.max(1),
            ..RetryPolicy::default()
        },
        ..BatchConfig::default()
    };

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    info!(
        accounts = credentials.len(),
        concurrency = config.concurrency,
        "starting run"
    );
    let observer = Arc::new(ConsoleObserver::new(credentials.len()));
    let runner = BatchRunner::new(backend, config).with_observer(observer.clone());
    let outcomes = runner.run(credentials, request_for, token.clone()).await;
    observer.finish();

    let summary = aggregate(&outcomes);
    console::print_summary(&summary);

    if args.save_results {
        let path = results::save_results(Path::new("."), &outcomes, &summary)?;
        println!("{} results saved to {}", "✓".green(), path.display());
    }

    Ok(if token.is_cancelled() { EXIT_CANCELLED } else { 0 })
}

/// Turn the subcommand into a per-slot request source, adjusting the
/// roster where the action demands it (a gift recipient never sends to
/// itself).
fn build_request_factory(
    command: &Command,
    credentials: &mut Vec<Credential>,
) -> Result<RequestFactory> {
    match command {
        Command::Avatar { avatars } => {
            let pool = assets::load_avatars(avatars)?;
            if pool.wraps_for(credentials.len()) {
                warn!(
                    images = pool.len(),
                    accounts = credentials.len(),
                    "fewer images than accounts, some will repeat"
                );
            }
            Ok(Box::new(move |index, _| {
                ActionRequest::ChangeAvatar(pool.get(index).clone())
            }))
        }

        Command::Profile { data } => {
            let pools = assets::ProfilePools::load(data)?;
            if pools.wraps_for(credentials.len()) {
                warn!(
                    accounts = credentials.len(),
                    "profile pools are smaller than the roster, values will repeat"
                );
            }
            Ok(Box::new(move |index, _| {
                ActionRequest::UpdateProfile(pools.fields_for(index))
            }))
        }

        Command::Gift {
            recipient_id,
            recipient_login,
        } => {
            let recipient = match (recipient_id, recipient_login) {
                (Some(id), _) => id.clone(),
                (None, Some(login)) => {
                    if !credentials.iter().any(|c| c.identifier == *login) {
                        bail!(
                            "recipient `{login}` is not in the accounts file; \
                             pass --recipient-id to gift an outside account"
                        );
                    }
                    credentials.retain(|c| c.identifier != *login);
                    if credentials.is_empty() {
                        bail!("the recipient was the only loaded account, nothing to send");
                    }
                    info!(recipient = %login, "recipient excluded from the sending roster");
                    login.clone()
                }
                (None, None) => bail!("gift needs --recipient-id or --recipient-login"),
            };
            Ok(Box::new(move |_, _| ActionRequest::SendGift {
                recipient: recipient.clone(),
            }))
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_level(verbose))
        .init();
}
