pub mod card;
pub mod customers;
pub mod presentation;
pub mod scale;
pub mod tickets;
