//! Card-to-ticket correlation
//!
//! A scanned card either opens a new ticket (gross weight) or closes the
//! card's open ticket (tare weight). The decision trusts the ticket-state
//! view; the server enforces one open ticket per card.
//!
//! Create and close share a single in-flight flag for their whole
//! duration. A scan arriving while another mutation is pending is dropped,
//! not queued. The flag is released by a drop guard, so neither an error
//! nor a panic in a presentation callback can leave the kiosk stuck busy.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};
use weighstation_model::{CardId, TicketId};

use crate::domains::presentation::{
    ConfirmAction, LoadingTarget, Presentation, StatusLevel,
};
use crate::domains::tickets::state_view::TicketStateView;
use crate::error::{KioskError, KioskResult, ValidationError};
use crate::infra::constants::messages;
use crate::infra::services::api::KioskApi;

/// What a ticket mutation request ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketOutcome {
    Created(TicketId),
    Closed(TicketId),
    /// Another create or close was in flight; nothing was done.
    Dropped,
}

#[derive(Clone)]
pub struct TicketCorrelator {
    api: Arc<dyn KioskApi>,
    presentation: Arc<dyn Presentation>,
    tickets: Arc<dyn TicketStateView>,
    refresh_delay: Duration,
    in_flight: Arc<AtomicBool>,
}

impl std::fmt::Debug for TicketCorrelator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketCorrelator")
            .field("refresh_delay", &self.refresh_delay)
            .field("busy", &self.is_busy())
            .finish()
    }
}

/// Holds the in-flight flag; releases it on drop.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Shows a loading state for the lifetime of a one-shot request.
struct LoadingGuard<'a> {
    presentation: &'a dyn Presentation,
    target: LoadingTarget,
}

impl<'a> LoadingGuard<'a> {
    fn new(presentation: &'a dyn Presentation, target: LoadingTarget) -> Self {
        presentation.set_loading(&target, true);
        Self {
            presentation,
            target,
        }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.presentation.set_loading(&self.target, false);
    }
}

impl TicketCorrelator {
    pub fn new(
        api: Arc<dyn KioskApi>,
        presentation: Arc<dyn Presentation>,
        tickets: Arc<dyn TicketStateView>,
        refresh_delay: Duration,
    ) -> Self {
        Self {
            api,
            presentation,
            tickets,
            refresh_delay,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a create or close is pending.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Open or close the ticket for a scanned card.
    ///
    /// Invalid input is reported and rejected before any request. While
    /// another mutation is pending the call is dropped without side effects.
    pub async fn handle(
        &self,
        card_id: &CardId,
        weight: f64,
    ) -> KioskResult<TicketOutcome> {
        if card_id.is_empty() {
            return Err(self.reject(ValidationError::EmptyCardId));
        }
        self.validate_weight(weight)?;

        let Some(_guard) = InFlightGuard::try_acquire(&self.in_flight) else {
            debug!(card_id = %card_id, "ticket operation in flight, dropping scan");
            return Ok(TicketOutcome::Dropped);
        };

        self.presentation
            .report_status(messages::PROCESSING_CARD, StatusLevel::Info);

        match self.tickets.find_open_ticket(card_id) {
            Some(open) => {
                debug!(card_id = %card_id, ticket_id = %open.ticket_id, "closing open ticket");
                self.close_guarded(&open.ticket_id, weight)
                    .await
                    .map(|()| TicketOutcome::Closed(open.ticket_id))
            }
            None => self
                .create_guarded(card_id, weight)
                .await
                .map(TicketOutcome::Created),
        }
    }

    /// Open a ticket for a card with its gross weight.
    pub async fn create_ticket(
        &self,
        card_id: &CardId,
        gross_weight: f64,
    ) -> KioskResult<TicketOutcome> {
        if card_id.is_empty() {
            return Err(self.reject(ValidationError::EmptyCardId));
        }
        self.validate_weight(gross_weight)?;
        let Some(_guard) = InFlightGuard::try_acquire(&self.in_flight) else {
            return Ok(TicketOutcome::Dropped);
        };
        self.create_guarded(card_id, gross_weight)
            .await
            .map(TicketOutcome::Created)
    }

    /// Close a ticket with its tare weight.
    pub async fn close_ticket(
        &self,
        ticket_id: &TicketId,
        tare_weight: f64,
    ) -> KioskResult<TicketOutcome> {
        self.validate_weight(tare_weight)?;
        let Some(_guard) = InFlightGuard::try_acquire(&self.in_flight) else {
            return Ok(TicketOutcome::Dropped);
        };
        self.close_guarded(ticket_id, tare_weight)
            .await
            .map(|()| TicketOutcome::Closed(ticket_id.clone()))
    }

    /// Delete a ticket after operator confirmation.
    ///
    /// Returns `Ok(false)` when the operator declines.
    pub async fn delete_ticket(&self, ticket_id: &TicketId) -> KioskResult<bool> {
        let action = ConfirmAction::DeleteTicket(ticket_id.clone());
        if !self.presentation.request_confirmation(&action).await {
            debug!(ticket_id = %ticket_id, "delete declined");
            return Ok(false);
        }

        let _loading = LoadingGuard::new(
            self.presentation.as_ref(),
            LoadingTarget::DeleteTicket(ticket_id.clone()),
        );
        match self.api.delete_ticket(ticket_id).await {
            Ok(()) => {
                info!(ticket_id = %ticket_id, "ticket deleted");
                self.presentation
                    .report_status(messages::TICKET_DELETED, StatusLevel::Success);
                self.schedule_refresh();
                Ok(true)
            }
            Err(err) => Err(self.fail("delete", Some(ticket_id), err)),
        }
    }

    /// Send a ticket receipt to the printer.
    pub async fn print_receipt(&self, ticket_id: &TicketId) -> KioskResult<String> {
        self.presentation
            .report_status(messages::SENDING_PRINT_JOB, StatusLevel::Info);
        let _loading = LoadingGuard::new(
            self.presentation.as_ref(),
            LoadingTarget::PrintTicket(ticket_id.clone()),
        );

        match self.api.print_ticket(ticket_id).await {
            Ok(message) => {
                let message = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| {
                        format!("Ticket #{ticket_id} printed successfully")
                    });
                info!(ticket_id = %ticket_id, "receipt printed");
                self.presentation
                    .report_status(&message, StatusLevel::Success);
                Ok(message)
            }
            Err(err) => Err(self.fail("print", Some(ticket_id), err)),
        }
    }

    async fn create_guarded(
        &self,
        card_id: &CardId,
        gross_weight: f64,
    ) -> KioskResult<TicketId> {
        self.presentation
            .report_status(messages::CREATING_TICKET, StatusLevel::Info);

        match self.api.create_ticket(card_id, gross_weight).await {
            Ok(ticket_id) => {
                info!(card_id = %card_id, ticket_id = %ticket_id, gross_weight, "ticket created");
                self.presentation.report_status(
                    &format!("Ticket #{ticket_id} created successfully!"),
                    StatusLevel::Success,
                );
                self.schedule_refresh();
                Ok(ticket_id)
            }
            Err(err) => Err(self.fail("create", None, err)),
        }
    }

    async fn close_guarded(
        &self,
        ticket_id: &TicketId,
        tare_weight: f64,
    ) -> KioskResult<()> {
        self.presentation.report_status(
            &format!("Closing ticket #{ticket_id}..."),
            StatusLevel::Info,
        );

        match self.api.close_ticket(ticket_id, tare_weight).await {
            Ok(()) => {
                info!(ticket_id = %ticket_id, tare_weight, "ticket closed");
                self.presentation.report_status(
                    &format!("Ticket #{ticket_id} closed successfully!"),
                    StatusLevel::Success,
                );
                self.schedule_refresh();
                Ok(())
            }
            Err(err) => Err(self.fail("close", Some(ticket_id), err)),
        }
    }

    fn validate_weight(&self, weight: f64) -> KioskResult<()> {
        if weight.is_finite() && weight > 0.0 {
            Ok(())
        } else {
            Err(self.reject(ValidationError::InvalidWeight(weight)))
        }
    }

    fn reject(&self, err: ValidationError) -> KioskError {
        debug!(error = %err, "rejected ticket request");
        self.presentation.report_error(&err.to_string());
        err.into()
    }

    fn fail(
        &self,
        operation: &'static str,
        ticket_id: Option<&TicketId>,
        err: KioskError,
    ) -> KioskError {
        warn!(
            operation,
            ticket_id = ticket_id.map(TicketId::as_str),
            status = err.status(),
            error = %err,
            "ticket operation failed"
        );
        self.presentation.report_error(&err.to_string());
        err
    }

    fn schedule_refresh(&self) {
        let presentation = Arc::clone(&self.presentation);
        let delay = self.refresh_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            presentation.refresh_view();
        });
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use weighstation_model::{TicketRef, WeightSample};

    use super::*;
    use crate::domains::presentation::CardDisplay;
    use crate::domains::tickets::state_view::TicketStateCache;
    use crate::infra::services::api::MockKioskApi;
    use crate::infra::testing::{
        ApiCall, PresentationEvent, RecordingPresentation, ScriptedApi,
    };

    fn card(id: &str) -> CardId {
        CardId::new_unchecked(id)
    }

    fn correlator(
        api: Arc<dyn KioskApi>,
        presentation: Arc<RecordingPresentation>,
        tickets: Arc<TicketStateCache>,
    ) -> TicketCorrelator {
        TicketCorrelator::new(api, presentation, tickets, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn invalid_weight_never_reaches_the_network() {
        let presentation = Arc::new(RecordingPresentation::new());
        let c = correlator(
            Arc::new(MockKioskApi::new()),
            presentation.clone(),
            Arc::new(TicketStateCache::new()),
        );

        for weight in [0.0, -3.5, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = c.handle(&card("A1"), weight).await.expect_err("invalid");
            assert!(err.is_validation());
        }
        assert_eq!(
            presentation.errors(),
            vec!["Invalid weight reading. Please check the scale."; 5]
        );
        assert!(!c.is_busy());
    }

    #[tokio::test]
    async fn empty_card_never_reaches_the_network() {
        let presentation = Arc::new(RecordingPresentation::new());
        let c = correlator(
            Arc::new(MockKioskApi::new()),
            presentation.clone(),
            Arc::new(TicketStateCache::new()),
        );

        for raw in ["", "   "] {
            let err = c.handle(&card(raw), 42.5).await.expect_err("invalid");
            assert_eq!(err.to_string(), "Invalid card ID");
        }
        assert!(presentation.statuses().is_empty());
    }

    #[tokio::test]
    async fn unknown_card_creates_exactly_once() {
        let mut api = MockKioskApi::new();
        api.expect_create_ticket()
            .withf(|card_id, weight| card_id.as_str() == "A1" && *weight == 42.5)
            .times(1)
            .returning(|_, _| Ok(TicketId::from(12)));
        api.expect_close_ticket().never();

        let presentation = Arc::new(RecordingPresentation::new());
        let c = correlator(
            Arc::new(api),
            presentation.clone(),
            Arc::new(TicketStateCache::new()),
        );

        let outcome = c.handle(&card("A1"), 42.5).await.expect("created");
        assert_eq!(outcome, TicketOutcome::Created(TicketId::from(12)));
        assert_eq!(
            presentation.statuses(),
            vec![
                ("Processing card...".to_string(), StatusLevel::Info),
                ("Creating new ticket...".to_string(), StatusLevel::Info),
                (
                    "Ticket #12 created successfully!".to_string(),
                    StatusLevel::Success
                ),
            ]
        );
        assert!(!c.is_busy());
    }

    #[tokio::test]
    async fn card_with_open_ticket_closes_it() {
        let mut api = MockKioskApi::new();
        api.expect_close_ticket()
            .withf(|ticket_id, weight| ticket_id.as_str() == "7" && *weight == 10.0)
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_create_ticket().never();

        let tickets = Arc::new(TicketStateCache::from_tickets([TicketRef::open(
            TicketId::from(7),
            card("A1"),
        )]));
        let presentation = Arc::new(RecordingPresentation::new());
        let c = correlator(Arc::new(api), presentation.clone(), tickets);

        let outcome = c.handle(&card("A1"), 10.0).await.expect("closed");
        assert_eq!(outcome, TicketOutcome::Closed(TicketId::from(7)));
        assert!(presentation.statuses().contains(&(
            "Ticket #7 closed successfully!".to_string(),
            StatusLevel::Success
        )));
    }

    #[tokio::test]
    async fn overlapping_scans_are_dropped_while_busy() {
        let api = ScriptedApi::new();
        api.hold_mutations();
        let presentation = Arc::new(RecordingPresentation::new());
        let c = correlator(
            Arc::new(api.clone()),
            presentation.clone(),
            Arc::new(TicketStateCache::new()),
        );

        let first = tokio::spawn({
            let c = c.clone();
            async move { c.handle(&card("A1"), 500.0).await }
        });
        while !c.is_busy() {
            tokio::task::yield_now().await;
        }

        presentation.clear();
        let dropped = c.handle(&card("B2"), 700.0).await.expect("dropped");
        assert_eq!(dropped, TicketOutcome::Dropped);
        let dropped = c
            .close_ticket(&TicketId::from(3), 700.0)
            .await
            .expect("dropped");
        assert_eq!(dropped, TicketOutcome::Dropped);
        assert!(presentation.events().is_empty());

        api.release_mutations();
        let outcome = first.await.expect("join").expect("created");
        assert_eq!(outcome, TicketOutcome::Created(TicketId::from(1)));
        assert!(!c.is_busy());
        assert_eq!(
            api.mutation_calls(),
            vec![ApiCall::CreateTicket {
                card_id: card("A1"),
                gross_weight: 500.0
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn application_error_is_reported_without_refresh() {
        let api = ScriptedApi::new();
        api.push_create(Err(KioskError::application(500, "db down")));
        let presentation = Arc::new(RecordingPresentation::new());
        let c = correlator(
            Arc::new(api.clone()),
            presentation.clone(),
            Arc::new(TicketStateCache::new()),
        );

        let err = c.handle(&card("A1"), 42.5).await.expect_err("failed");
        assert_eq!(err.to_string(), "db down");
        assert_eq!(presentation.errors(), vec!["db down".to_string()]);
        assert!(!c.is_busy());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(presentation.refresh_count(), 0);

        // The kiosk accepts the next scan.
        let outcome = c.handle(&card("A1"), 42.5).await.expect("retry");
        assert!(matches!(outcome, TicketOutcome::Created(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn success_refreshes_after_delay() {
        let api = ScriptedApi::new();
        let presentation = Arc::new(RecordingPresentation::new());
        let c = correlator(
            Arc::new(api),
            presentation.clone(),
            Arc::new(TicketStateCache::new()),
        );

        c.handle(&card("A1"), 42.5).await.expect("created");
        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(presentation.refresh_count(), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(presentation.refresh_count(), 1);
    }

    /// Presentation whose success callback blows up.
    struct PanicOnSuccess;

    #[async_trait]
    impl Presentation for PanicOnSuccess {
        fn report_status(&self, _message: &str, level: StatusLevel) {
            if level == StatusLevel::Success {
                panic!("success handler failed");
            }
        }
        fn report_error(&self, _message: &str) {}
        async fn request_confirmation(&self, _action: &ConfirmAction) -> bool {
            true
        }
        fn refresh_view(&self) {}
        fn highlight(&self, _ticket_id: &TicketId) {}
        fn report_weight(&self, _sample: &WeightSample) {}
        fn report_scale_connection(&self, _connected: bool) {}
        fn report_card(&self, _display: &CardDisplay) {}
    }

    #[tokio::test]
    async fn flag_is_released_when_success_handler_panics() {
        let c = TicketCorrelator::new(
            Arc::new(ScriptedApi::new()),
            Arc::new(PanicOnSuccess),
            Arc::new(TicketStateCache::new()),
            Duration::from_secs(1),
        );

        let task = tokio::spawn({
            let c = c.clone();
            async move { c.handle(&card("A1"), 42.5).await }
        });
        let join = task.await;
        assert!(join.is_err_and(|err| err.is_panic()));
        assert!(!c.is_busy());
    }

    #[tokio::test]
    async fn declined_delete_sends_nothing() {
        let mut api = MockKioskApi::new();
        api.expect_delete_ticket().never();
        let presentation = Arc::new(RecordingPresentation::new());
        presentation.set_confirm(false);
        let c = correlator(
            Arc::new(api),
            presentation.clone(),
            Arc::new(TicketStateCache::new()),
        );

        assert!(!c.delete_ticket(&TicketId::from(4)).await.expect("declined"));
        assert_eq!(
            presentation.events(),
            vec![PresentationEvent::Confirmation(ConfirmAction::DeleteTicket(
                TicketId::from(4)
            ))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_delete_toggles_loading_and_refreshes() {
        let api = ScriptedApi::new();
        let presentation = Arc::new(RecordingPresentation::new());
        let c = correlator(
            Arc::new(api.clone()),
            presentation.clone(),
            Arc::new(TicketStateCache::new()),
        );

        assert!(c.delete_ticket(&TicketId::from(4)).await.expect("deleted"));
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let target = LoadingTarget::DeleteTicket(TicketId::from(4));
        assert_eq!(
            presentation.events(),
            vec![
                PresentationEvent::Confirmation(ConfirmAction::DeleteTicket(
                    TicketId::from(4)
                )),
                PresentationEvent::Loading {
                    target: target.clone(),
                    loading: true
                },
                PresentationEvent::Status {
                    message: "Ticket deleted successfully".to_string(),
                    level: StatusLevel::Success
                },
                PresentationEvent::Loading {
                    target,
                    loading: false
                },
                PresentationEvent::Refresh,
            ]
        );
        assert_eq!(api.calls(), vec![ApiCall::DeleteTicket(TicketId::from(4))]);
    }

    #[tokio::test]
    async fn delete_failure_is_reported() {
        let api = ScriptedApi::new();
        api.push_delete(Err(KioskError::application(404, "Ticket not found")));
        let presentation = Arc::new(RecordingPresentation::new());
        let c = correlator(
            Arc::new(api),
            presentation.clone(),
            Arc::new(TicketStateCache::new()),
        );

        let err = c.delete_ticket(&TicketId::from(9)).await.expect_err("failed");
        assert_eq!(err.status(), Some(404));
        assert_eq!(presentation.errors(), vec!["Ticket not found".to_string()]);
        assert_eq!(presentation.refresh_count(), 0);
    }

    #[tokio::test]
    async fn print_reports_server_message_or_fallback() {
        let api = ScriptedApi::new();
        api.push_print(Ok(Some("Ticket sent to PiPrinter".to_string())));
        api.push_print(Ok(None));
        api.push_print(Err(KioskError::server_status(503)));
        let presentation = Arc::new(RecordingPresentation::new());
        let c = correlator(
            Arc::new(api),
            presentation.clone(),
            Arc::new(TicketStateCache::new()),
        );
        let id = TicketId::from(5);

        assert_eq!(
            c.print_receipt(&id).await.expect("printed"),
            "Ticket sent to PiPrinter"
        );
        assert_eq!(
            c.print_receipt(&id).await.expect("printed"),
            "Ticket #5 printed successfully"
        );
        let err = c.print_receipt(&id).await.expect_err("printer down");
        assert_eq!(err.to_string(), "Server error: 503");

        assert_eq!(
            presentation
                .statuses()
                .iter()
                .filter(|(m, _)| m == "Sending print job...")
                .count(),
            3
        );
    }
}
