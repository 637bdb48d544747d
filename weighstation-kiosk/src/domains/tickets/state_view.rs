use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use parking_lot::RwLock;
use tracing::debug;
use weighstation_model::{CardId, TicketRef};

/// Read-only lookup into the current set of open tickets.
///
/// The kiosk trusts this snapshot when deciding between opening and
/// closing a ticket; the server guarantees at most one open ticket per card.
pub trait TicketStateView: Send + Sync {
    fn find_open_ticket(&self, card_id: &CardId) -> Option<TicketRef>;
}

/// In-memory ticket-state view, replaced wholesale on every refresh.
#[derive(Debug, Default)]
pub struct TicketStateCache {
    open: RwLock<HashMap<CardId, TicketRef>>,
}

impl TicketStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tickets(tickets: impl IntoIterator<Item = TicketRef>) -> Self {
        let cache = Self::new();
        cache.replace(tickets);
        cache
    }

    /// Swap in a fresh snapshot. Closed tickets are ignored.
    pub fn replace(&self, tickets: impl IntoIterator<Item = TicketRef>) {
        let open: HashMap<CardId, TicketRef> = tickets
            .into_iter()
            .filter(TicketRef::is_open)
            .map(|ticket| (ticket.card_id.clone(), ticket))
            .collect();
        debug!(open_tickets = open.len(), "ticket state replaced");
        *self.open.write() = open;
    }

    pub fn len(&self) -> usize {
        self.open.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.read().is_empty()
    }

    /// Reload from a JSON file holding a list of tickets.
    pub fn reload_from(&self, path: &Path) -> io::Result<usize> {
        let tickets = load_snapshot_file(path)?;
        self.replace(tickets);
        Ok(self.len())
    }
}

impl TicketStateView for TicketStateCache {
    fn find_open_ticket(&self, card_id: &CardId) -> Option<TicketRef> {
        self.open.read().get(card_id).cloned()
    }
}

/// Parse a ticket snapshot file: a JSON array of `TicketRef`.
pub fn load_snapshot_file(path: &Path) -> io::Result<Vec<TicketRef>> {
    let raw = fs::read(path)?;
    serde_json::from_slice(&raw)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
