pub mod source;

pub use source::{CardSink, CardSource};
