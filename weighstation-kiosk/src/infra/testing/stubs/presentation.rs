use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use weighstation_model::{TicketId, WeightSample};

use crate::domains::presentation::{
    CardDisplay, ConfirmAction, LoadingTarget, Presentation, StatusLevel,
};

/// Everything a [`RecordingPresentation`] was asked to show
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationEvent {
    Status { message: String, level: StatusLevel },
    Error(String),
    Confirmation(ConfirmAction),
    Refresh,
    Highlight(TicketId),
    Weight(f64),
    ScaleConnection(bool),
    Card(CardDisplay),
    Polling(bool),
    Loading { target: LoadingTarget, loading: bool },
}

/// Presentation that records every call in order.
#[derive(Debug)]
pub struct RecordingPresentation {
    events: Mutex<Vec<PresentationEvent>>,
    confirm: AtomicBool,
}

impl Default for RecordingPresentation {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPresentation {
    /// Confirmation prompts are accepted unless changed with
    /// [`set_confirm`](RecordingPresentation::set_confirm).
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            confirm: AtomicBool::new(true),
        }
    }

    pub fn set_confirm(&self, answer: bool) {
        self.confirm.store(answer, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<PresentationEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn errors(&self) -> Vec<String> {
        self.collect(|event| match event {
            PresentationEvent::Error(message) => Some(message.clone()),
            _ => None,
        })
    }

    pub fn statuses(&self) -> Vec<(String, StatusLevel)> {
        self.collect(|event| match event {
            PresentationEvent::Status { message, level } => {
                Some((message.clone(), *level))
            }
            _ => None,
        })
    }

    pub fn cards(&self) -> Vec<CardDisplay> {
        self.collect(|event| match event {
            PresentationEvent::Card(display) => Some(display.clone()),
            _ => None,
        })
    }

    pub fn connection_changes(&self) -> Vec<bool> {
        self.collect(|event| match event {
            PresentationEvent::ScaleConnection(connected) => Some(*connected),
            _ => None,
        })
    }

    pub fn refresh_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, PresentationEvent::Refresh))
            .count()
    }

    fn collect<T>(
        &self,
        pick: impl Fn(&PresentationEvent) -> Option<T>,
    ) -> Vec<T> {
        self.events.lock().iter().filter_map(pick).collect()
    }

    fn push(&self, event: PresentationEvent) {
        self.events.lock().push(event);
    }
}

#[async_trait]
impl Presentation for RecordingPresentation {
    fn report_status(&self, message: &str, level: StatusLevel) {
        self.push(PresentationEvent::Status {
            message: message.to_string(),
            level,
        });
    }

    fn report_error(&self, message: &str) {
        self.push(PresentationEvent::Error(message.to_string()));
    }

    async fn request_confirmation(&self, action: &ConfirmAction) -> bool {
        self.push(PresentationEvent::Confirmation(action.clone()));
        self.confirm.load(Ordering::SeqCst)
    }

    fn refresh_view(&self) {
        self.push(PresentationEvent::Refresh);
    }

    fn highlight(&self, ticket_id: &TicketId) {
        self.push(PresentationEvent::Highlight(ticket_id.clone()));
    }

    fn report_weight(&self, sample: &WeightSample) {
        self.push(PresentationEvent::Weight(sample.value));
    }

    fn report_scale_connection(&self, connected: bool) {
        self.push(PresentationEvent::ScaleConnection(connected));
    }

    fn report_card(&self, display: &CardDisplay) {
        self.push(PresentationEvent::Card(display.clone()));
    }

    fn report_polling(&self, active: bool) {
        self.push(PresentationEvent::Polling(active));
    }

    fn set_loading(&self, target: &LoadingTarget, loading: bool) {
        self.push(PresentationEvent::Loading {
            target: target.clone(),
            loading,
        });
    }
}
