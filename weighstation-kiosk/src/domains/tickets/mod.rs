pub mod correlator;
pub mod state_view;

pub use correlator::{TicketCorrelator, TicketOutcome};
pub use state_view::{TicketStateCache, TicketStateView};
