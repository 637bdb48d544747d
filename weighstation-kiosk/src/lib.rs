//! Weighstation kiosk core
//!
//! Polls an RFID reader and a weighbridge scale through the ticket backend,
//! and turns each new card into exactly one ticket operation: opening a
//! ticket at gross weight, or closing the card's open ticket at tare weight.
//!
//! - [`domains::scale`] keeps the last good weight and the scale's health.
//! - [`domains::card`] turns reader polls and operator input into card events.
//! - [`domains::tickets`] correlates cards with tickets behind a single
//!   in-flight guard.
//! - [`app::KioskSession`] wires them together around a
//!   [`Presentation`](domains::presentation::Presentation).

pub mod app;
pub mod console;
pub mod domains;
pub mod error;
pub mod infra;

pub use app::KioskSession;
pub use error::{KioskError, KioskResult, ValidationError};
pub use infra::testing;
