use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::CardId;

/// Where a card identifier came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScanSource {
    /// Read from the hardware reader by the polling loop
    Polled,
    /// Typed in by an operator
    Manual,
    /// Picked from the customer quick-select list
    QuickSelect,
}

impl ScanSource {
    /// Injected sources bypass edge-triggering.
    pub fn is_injected(&self) -> bool {
        !matches!(self, ScanSource::Polled)
    }
}

impl std::fmt::Display for ScanSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Polled => write!(f, "polled"),
            Self::Manual => write!(f, "manual"),
            Self::QuickSelect => write!(f, "quick-select"),
        }
    }
}

/// A detected or injected card identifier. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CardEvent {
    card_id: CardId,
    source: ScanSource,
    timestamp: DateTime<Utc>,
}

impl CardEvent {
    pub fn new(card_id: CardId, source: ScanSource) -> Self {
        Self::at(card_id, source, Utc::now())
    }

    pub fn at(
        card_id: CardId,
        source: ScanSource,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            card_id,
            source,
            timestamp,
        }
    }

    pub fn card_id(&self) -> &CardId {
        &self.card_id
    }

    pub fn source(&self) -> ScanSource {
        self.source
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
