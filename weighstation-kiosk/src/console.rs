//! Line-oriented console front end for the kiosk binary.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, error, info, trace, warn};
use weighstation_model::{CustomerId, ScanSource, TicketId, WeightSample};

use crate::domains::presentation::{
    CardDisplay, ConfirmAction, LoadingTarget, Presentation, StatusLevel,
};
use crate::domains::tickets::TicketStateCache;
use crate::infra::constants::messages;

pub const HELP: &str = "\
commands:
  <card-id>                 manual card entry
  quick:<card-id>           quick-select card
  start | stop              toggle card reader polling
  delete <ticket-id>        delete a ticket (asks for confirmation)
  print <ticket-id>         print a ticket receipt
  register <card-id> <name> register a customer
  label <customer-id>       print a customer label
  status                    show scale and card state
  help                      show this text";

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Card { card: String, source: ScanSource },
    StartPolling,
    StopPolling,
    Delete(TicketId),
    Print(TicketId),
    Register { card: String, name: String },
    PrintLabel(CustomerId),
    Status,
    Help,
    Empty,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "start" if rest.is_empty() => Self::StartPolling,
            "stop" if rest.is_empty() => Self::StopPolling,
            "status" if rest.is_empty() => Self::Status,
            "help" | "?" if rest.is_empty() => Self::Help,
            "delete" => {
                Self::Delete(TicketId::new(required(rest, "delete <ticket-id>")?))
            }
            "print" => {
                Self::Print(TicketId::new(required(rest, "print <ticket-id>")?))
            }
            "label" => Self::PrintLabel(CustomerId::new(required(
                rest,
                "label <customer-id>",
            )?)),
            "register" => {
                let usage = "register <card-id> <name>";
                let (card, name) = required(rest, usage)?
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| format!("usage: {usage}"))?;
                Self::Register {
                    card: card.to_string(),
                    name: name.trim().to_string(),
                }
            }
            _ => match line.strip_prefix("quick:") {
                Some(card) => Self::Card {
                    card: required(card, "quick:<card-id>")?.to_string(),
                    source: ScanSource::QuickSelect,
                },
                None => Self::Card {
                    card: line.to_string(),
                    source: ScanSource::Manual,
                },
            },
        };
        Ok(command)
    }
}

fn required<'a>(value: &'a str, usage: &str) -> Result<&'a str, String> {
    let value = value.trim();
    if value.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(value)
    }
}

/// Presentation that writes through `tracing` and takes confirmations
/// from the console's input lines.
#[derive(Debug)]
pub struct ConsolePresentation {
    tickets: Arc<TicketStateCache>,
    snapshot_path: Option<PathBuf>,
    auto_confirm: bool,
    pending: Mutex<Option<oneshot::Sender<bool>>>,
    last_card: Mutex<Option<CardDisplay>>,
}

impl ConsolePresentation {
    pub fn new(
        tickets: Arc<TicketStateCache>,
        snapshot_path: Option<PathBuf>,
        auto_confirm: bool,
    ) -> Self {
        Self {
            tickets,
            snapshot_path,
            auto_confirm,
            pending: Mutex::new(None),
            last_card: Mutex::new(None),
        }
    }

    /// Feed an input line to an outstanding confirmation prompt.
    ///
    /// Only `y`/`yes`/`n`/`no` or an empty line answer the prompt. Returns
    /// false when the line is not an answer and should be handled as a
    /// command; the prompt then stays open.
    pub fn answer_pending(&self, line: &str) -> bool {
        let mut pending = self.pending.lock();
        if pending.is_none() {
            return false;
        }
        let accepted = match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => true,
            "" | "n" | "no" => false,
            _ => {
                debug!("confirmation still pending, line handled as a command");
                return false;
            }
        };
        if let Some(reply) = pending.take() {
            let _ = reply.send(accepted);
        }
        info!(accepted, "confirmation answered");
        true
    }

    pub fn has_pending_confirmation(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Reload the ticket view from the snapshot file, if one is configured.
    pub fn reload_tickets(&self) {
        let Some(path) = self.snapshot_path.as_deref() else {
            return;
        };
        match self.tickets.reload_from(path) {
            Ok(open) => info!(open_tickets = open, "ticket view refreshed"),
            Err(err) => warn!(
                path = %path.display(),
                error = %err,
                "could not reload ticket snapshot"
            ),
        }
    }
}

#[async_trait]
impl Presentation for ConsolePresentation {
    fn report_status(&self, message: &str, level: StatusLevel) {
        match level {
            StatusLevel::Info | StatusLevel::Success => info!("{message}"),
            StatusLevel::Warning => warn!("{message}"),
            StatusLevel::Danger => error!("{message}"),
        }
    }

    fn report_error(&self, message: &str) {
        error!("{message}");
    }

    async fn request_confirmation(&self, action: &ConfirmAction) -> bool {
        if self.auto_confirm {
            info!("{action} [auto-confirmed]");
            return true;
        }

        let (tx, rx) = oneshot::channel();
        // A newer prompt supersedes an unanswered one, which then reads as "no".
        *self.pending.lock() = Some(tx);
        info!("{action} [y/N]");
        rx.await.unwrap_or(false)
    }

    fn refresh_view(&self) {
        self.reload_tickets();
    }

    fn highlight(&self, ticket_id: &TicketId) {
        info!(%ticket_id, "open ticket #{ticket_id} for this card");
    }

    fn report_weight(&self, sample: &WeightSample) {
        trace!(weight = sample.display_value(), "scale reading");
    }

    fn report_scale_connection(&self, connected: bool) {
        if connected {
            info!("scale connected");
        } else {
            error!("{}", messages::SCALE_ERROR);
        }
    }

    fn report_card(&self, shown: &CardDisplay) {
        let mut last = self.last_card.lock();
        if last.as_ref() == Some(shown) {
            trace!(status = %shown.status, "card display unchanged");
            return;
        }
        let card = shown.card.as_ref().map_or("None", |c| c.as_str());
        info!(card, "{}", shown.status);
        *last = Some(shown.clone());
    }

    fn report_polling(&self, active: bool) {
        info!(
            "card polling {}",
            if active { "active" } else { "inactive" }
        );
    }

    fn set_loading(&self, target: &LoadingTarget, loading: bool) {
        debug!(?target, loading, "loading state");
    }
}
