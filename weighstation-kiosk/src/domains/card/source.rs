use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};
use weighstation_config::{CardReaderConfig, InjectionPolicy};
use weighstation_model::{CardEvent, CardId, ScanSource};

use crate::domains::presentation::{CardDisplay, CardStatus, Presentation};
use crate::domains::tickets::state_view::TicketStateView;
use crate::error::KioskResult;
use crate::infra::constants::messages;
use crate::infra::poller::PollTask;
use crate::infra::services::api::KioskApi;

/// Downstream consumer of card events.
pub trait CardSink: Send + Sync {
    fn on_card(&self, event: CardEvent);
}

impl<F> CardSink for F
where
    F: Fn(CardEvent) + Send + Sync,
{
    fn on_card(&self, event: CardEvent) {
        self(event)
    }
}

/// Produces card events from the RFID reader and from operator input.
///
/// Polled reads are edge-triggered: an event fires only when the reader
/// reports a card different from the last polled one. Injected cards
/// (manual entry, quick-select) always fire. Every poll tick also reports
/// the card on display, whether or not it changed.
pub struct CardSource {
    inner: Arc<CardInner>,
    poll: Mutex<Option<PollTask>>,
}

struct CardInner {
    api: Arc<dyn KioskApi>,
    presentation: Arc<dyn Presentation>,
    tickets: Arc<dyn TicketStateView>,
    sink: Arc<dyn CardSink>,
    config: CardReaderConfig,
    state: Mutex<CardState>,
}

#[derive(Debug, Default)]
struct CardState {
    last_polled: Option<CardId>,
    last_injected: Option<CardId>,
}

impl std::fmt::Debug for CardSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardSource")
            .field("config", &self.inner.config)
            .field("state", &*self.inner.state.lock())
            .field("polling", &self.is_polling())
            .finish()
    }
}

impl CardSource {
    pub fn new(
        api: Arc<dyn KioskApi>,
        presentation: Arc<dyn Presentation>,
        tickets: Arc<dyn TicketStateView>,
        sink: Arc<dyn CardSink>,
        config: &CardReaderConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CardInner {
                api,
                presentation,
                tickets,
                sink,
                config: config.clone(),
                state: Mutex::new(CardState::default()),
            }),
            poll: Mutex::new(None),
        }
    }

    /// Start polling the reader, polling once immediately. No-op when
    /// already polling.
    pub fn start(&self) {
        let mut slot = self.poll.lock();
        if slot.as_ref().is_some_and(|poll| !poll.is_finished()) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        *slot = Some(PollTask::spawn(
            "card",
            self.inner.config.poll_interval,
            true,
            move || {
                let inner = Arc::clone(&inner);
                async move {
                    let _ = inner.poll_once().await;
                }
            },
        ));
        drop(slot);

        info!(interval = ?self.inner.config.poll_interval, "card polling started");
        self.inner.presentation.report_polling(true);
    }

    pub fn stop(&self) {
        if let Some(poll) = self.poll.lock().take() {
            drop(poll.stop());
            info!("card polling stopped");
        }
        self.inner.presentation.report_polling(false);
    }

    pub fn is_polling(&self) -> bool {
        self.poll
            .lock()
            .as_ref()
            .is_some_and(|poll| !poll.is_finished())
    }

    /// Record and forward an operator-supplied card, bypassing the
    /// edge trigger. Blank input is ignored.
    pub fn inject(&self, raw: &str, source: ScanSource) -> Option<CardEvent> {
        self.inner.inject(raw, source)
    }

    /// Run a single reader poll outside the loop.
    pub async fn poll_once(&self) -> KioskResult<Option<CardEvent>> {
        self.inner.poll_once().await
    }

    /// Last known card, preferring an injected one.
    pub fn last_card(&self) -> Option<CardId> {
        let state = self.inner.state.lock();
        state
            .last_injected
            .clone()
            .or_else(|| state.last_polled.clone())
    }

    /// Re-report the displayed card, e.g. after the ticket view changed.
    pub fn refresh_display(&self) {
        let card = self.last_card();
        self.inner.report_display(card);
    }
}

impl CardInner {
    async fn poll_once(&self) -> KioskResult<Option<CardEvent>> {
        let response = match self.api.current_card().await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "{}", messages::POLL_ERROR);
                self.presentation
                    .report_card(&CardDisplay::error(err.to_string()));
                return Err(err);
            }
        };

        let reported = response.card();
        let event = {
            let mut state = self.state.lock();
            match &reported {
                Some(card) if state.last_polled.as_ref() != Some(card) => {
                    state.last_polled = Some(card.clone());
                    Some(CardEvent::new(card.clone(), ScanSource::Polled))
                }
                _ => None,
            }
        };

        if let Some(event) = &event {
            debug!(card_id = %event.card_id(), "new card on reader");
            self.sink.on_card(event.clone());
        }

        let shown =
            reported.or_else(|| self.state.lock().last_injected.clone());
        self.report_display(shown);
        Ok(event)
    }

    fn inject(&self, raw: &str, source: ScanSource) -> Option<CardEvent> {
        let Ok(card) = CardId::parse(raw) else {
            debug!(?source, "ignoring blank card input");
            return None;
        };

        {
            let mut state = self.state.lock();
            state.last_injected = Some(card.clone());
            if self.config.injection_policy == InjectionPolicy::SyncPolled {
                state.last_polled = Some(card.clone());
            }
        }

        debug!(card_id = %card, %source, "card injected");
        let event = CardEvent::new(card.clone(), source);
        self.sink.on_card(event.clone());
        self.report_display(Some(card.clone()));

        if let Some(open) = self.tickets.find_open_ticket(&card) {
            self.presentation.highlight(&open.ticket_id);
        }
        Some(event)
    }

    fn report_display(&self, card: Option<CardId>) {
        let status = match &card {
            None => CardStatus::NoCard,
            Some(card) => match self.tickets.find_open_ticket(card) {
                Some(open) => CardStatus::OpenTicket(open.ticket_id),
                None => CardStatus::ReadyForNewTicket,
            },
        };
        self.presentation.report_card(&CardDisplay { card, status });
    }
}
