//! Presentation interface
//!
//! The kiosk core never renders anything itself. Every status line, error,
//! confirmation prompt and refresh goes through [`Presentation`], which the
//! embedding UI implements.

use std::fmt;

use async_trait::async_trait;
use weighstation_model::{CardId, TicketId, WeightSample};

use crate::infra::constants::messages;

/// Severity of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Danger,
}

/// Destructive action that needs operator confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteTicket(TicketId),
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteTicket(id) => write!(
                f,
                "Are you sure you want to delete ticket #{id}? This action cannot be undone."
            ),
        }
    }
}

/// UI element showing a loading state while a one-shot request runs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LoadingTarget {
    DeleteTicket(TicketId),
    PrintTicket(TicketId),
}

/// What the card panel should say about the card on the reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardStatus {
    OpenTicket(TicketId),
    ReadyForNewTicket,
    NoCard,
    Error(String),
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenTicket(id) => {
                write!(f, "Open ticket #{id} found for this card")
            }
            Self::ReadyForNewTicket => f.write_str(messages::READY_FOR_NEW_TICKET),
            Self::NoCard => f.write_str(messages::NO_CARD),
            Self::Error(message) => f.write_str(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDisplay {
    pub card: Option<CardId>,
    pub status: CardStatus,
}

impl CardDisplay {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            card: None,
            status: CardStatus::Error(message.into()),
        }
    }
}

/// Sink for everything the kiosk wants to show the operator.
///
/// Implementations must be cheap and non-blocking except for
/// [`request_confirmation`](Presentation::request_confirmation), which may
/// wait on the operator.
#[async_trait]
pub trait Presentation: Send + Sync {
    fn report_status(&self, message: &str, level: StatusLevel);

    fn report_error(&self, message: &str);

    /// Ask the operator to confirm a destructive action.
    async fn request_confirmation(&self, action: &ConfirmAction) -> bool;

    /// Reload the ticket-state view from its source.
    fn refresh_view(&self);

    fn highlight(&self, ticket_id: &TicketId);

    fn report_weight(&self, sample: &WeightSample);

    /// Scale connectivity changed.
    fn report_scale_connection(&self, connected: bool);

    fn report_card(&self, display: &CardDisplay);

    fn report_polling(&self, _active: bool) {}

    fn set_loading(&self, _target: &LoadingTarget, _loading: bool) {}
}
