pub mod monitor;

pub use monitor::ScaleMonitor;
