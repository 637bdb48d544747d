use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weighstation_config::{
    ConfigLoad, ConfigLoader, ConfigLoaderOptions, loader::normalize_base_url,
};
use weighstation_kiosk::{
    KioskSession,
    console::{ConsoleCommand, ConsolePresentation, HELP},
    domains::tickets::TicketStateCache,
};

#[derive(Parser, Debug)]
#[command(name = "weighstation-kiosk")]
#[command(
    about = "Weighbridge kiosk: RFID card polling, scale monitoring and ticket handling"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "WEIGHSTATION_CONFIG")]
    config: Option<PathBuf>,

    /// Env file loaded before reading the environment
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Ticket backend URL (overrides config)
    #[arg(long)]
    server_url: Option<String>,

    /// Do not start card reader polling on launch
    #[arg(long, default_value_t = false)]
    no_card_polling: bool,

    /// Confirm ticket deletions without prompting
    #[arg(short, long, default_value_t = false)]
    yes: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let ConfigLoad {
        mut config,
        warnings,
    } = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: cli.config.clone(),
        env_file: Some(cli.env_file.clone()),
    })
    .load()
    .context("failed to load configuration")?;

    if let Some(url) = cli.server_url.as_deref() {
        config.server.base_url =
            normalize_base_url(url).context("invalid --server-url")?;
    }
    if cli.no_card_polling {
        config.card_reader.autostart = false;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,weighstation_kiosk=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "loaded config file");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    let tickets = Arc::new(TicketStateCache::new());
    let presentation = Arc::new(ConsolePresentation::new(
        Arc::clone(&tickets),
        config.tickets.snapshot_path.clone(),
        cli.yes,
    ));
    presentation.reload_tickets();

    let session = Arc::new(
        KioskSession::connect(&config, presentation.clone(), tickets)
            .context("failed to create API client")?,
    );
    session.start();
    info!(
        server = %config.server.base_url,
        policy = %config.card_reader.injection_policy,
        "kiosk ready, type `help` for commands"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if !presentation.answer_pending(&line) {
                        dispatch(&session, &line);
                    }
                }
                Ok(None) => {
                    info!("stdin closed, running until interrupted");
                    stdin_open = false;
                }
                Err(err) => {
                    warn!(error = %err, "failed to read stdin");
                    stdin_open = false;
                }
            },
        }
    }

    session.shutdown();
    Ok(())
}

/// Run one console command. Ticket and customer operations report their
/// own outcome through the presentation, so their results are dropped here.
fn dispatch(session: &Arc<KioskSession>, line: &str) {
    let command = match ConsoleCommand::parse(line) {
        Ok(command) => command,
        Err(usage) => {
            warn!("{usage}");
            return;
        }
    };

    match command {
        ConsoleCommand::Empty => {}
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Card { card, source } => {
            if !session.inject_card(&card, source) {
                warn!("ignoring blank card id");
            }
        }
        ConsoleCommand::StartPolling => session.cards().start(),
        ConsoleCommand::StopPolling => session.cards().stop(),
        ConsoleCommand::Delete(ticket_id) => {
            let session = Arc::clone(session);
            tokio::spawn(async move {
                let _ = session.correlator().delete_ticket(&ticket_id).await;
            });
        }
        ConsoleCommand::Print(ticket_id) => {
            let session = Arc::clone(session);
            tokio::spawn(async move {
                let _ = session.correlator().print_receipt(&ticket_id).await;
            });
        }
        ConsoleCommand::Register { card, name } => {
            let session = Arc::clone(session);
            tokio::spawn(async move {
                let _ = session
                    .customers()
                    .register_customer(&name, &card)
                    .await;
            });
        }
        ConsoleCommand::PrintLabel(customer_id) => {
            let session = Arc::clone(session);
            tokio::spawn(async move {
                let _ = session
                    .customers()
                    .print_customer_label(&customer_id)
                    .await;
            });
        }
        ConsoleCommand::Status => {
            let card = session.cards().last_card();
            let reading_age_ms = session
                .scale()
                .latest_sample()
                .map(|sample| (Utc::now() - sample.timestamp).num_milliseconds());
            info!(
                weight = session.scale().current_weight(),
                reading_age_ms,
                scale_connected = session.scale().is_connected(),
                card = card.as_ref().map(|c| c.as_str()),
                card_polling = session.cards().is_polling(),
                ticket_busy = session.correlator().is_busy(),
                "kiosk status"
            );
        }
    }
}
