//! Convenience re-exports for downstream crates.

pub use crate::card::{CardEvent, ScanSource};
pub use crate::ids::{CardId, CustomerId, TicketId};
pub use crate::ticket::{TicketRef, TicketStatus};
pub use crate::weight::WeightSample;
