#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::{CardId, TicketId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TicketStatus {
    #[default]
    Open,
    Closed,
}

/// A ticket as mirrored into the kiosk's ticket-state view.
///
/// The server owns ticket lifecycle; the kiosk only reads these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TicketRef {
    pub ticket_id: TicketId,
    pub card_id: CardId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: TicketStatus,
}

impl TicketRef {
    pub fn open(ticket_id: TicketId, card_id: CardId) -> Self {
        Self {
            ticket_id,
            card_id,
            status: TicketStatus::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TicketStatus::Open
    }
}
