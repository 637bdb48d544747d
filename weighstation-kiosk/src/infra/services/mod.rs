pub mod api;

pub use api::KioskApi;
#[cfg(test)]
pub use api::MockKioskApi;
