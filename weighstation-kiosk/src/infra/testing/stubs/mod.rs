pub mod api;
pub mod presentation;

pub use api::{ApiCall, ScriptedApi};
pub use presentation::{PresentationEvent, RecordingPresentation};
