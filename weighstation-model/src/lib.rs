//! Core data model definitions shared across weighstation crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod card;
pub mod error;
pub mod ids;
pub mod prelude;
pub mod ticket;
pub mod weight;

pub use card::{CardEvent, ScanSource};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{CardId, CustomerId, TicketId};
pub use ticket::{TicketRef, TicketStatus};
pub use weight::WeightSample;
