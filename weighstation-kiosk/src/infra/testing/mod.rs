//! Hand-written fakes for exercising the kiosk without a backend or UI.

pub mod stubs;

pub use stubs::{
    ApiCall, PresentationEvent, RecordingPresentation, ScriptedApi,
};
