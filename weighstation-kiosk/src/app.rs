//! Kiosk session wiring
//!
//! Builds the scale monitor, card source and ticket correlator around one
//! API client and one presentation, and routes every new card event into
//! the correlator together with the scale's current weight.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use weighstation_config::Config;
use weighstation_model::{CardEvent, ScanSource};

use crate::domains::card::{CardSink, CardSource};
use crate::domains::customers::CustomerDesk;
use crate::domains::presentation::Presentation;
use crate::domains::scale::ScaleMonitor;
use crate::domains::tickets::{TicketCorrelator, TicketStateView};
use crate::error::KioskResult;
use crate::infra::api_client::ApiClient;
use crate::infra::services::api::KioskApi;

pub struct KioskSession {
    scale: Arc<ScaleMonitor>,
    cards: CardSource,
    correlator: TicketCorrelator,
    customers: CustomerDesk,
    autostart_cards: bool,
}

impl std::fmt::Debug for KioskSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KioskSession")
            .field("scale", &self.scale)
            .field("cards", &self.cards)
            .field("correlator", &self.correlator)
            .field("autostart_cards", &self.autostart_cards)
            .finish()
    }
}

/// Forwards card events to the correlator on the current runtime.
struct CorrelatingSink {
    correlator: TicketCorrelator,
    scale: Arc<ScaleMonitor>,
}

impl CardSink for CorrelatingSink {
    fn on_card(&self, event: CardEvent) {
        let weight = self.scale.current_weight();
        let correlator = self.correlator.clone();

        let Ok(runtime) = Handle::try_current() else {
            warn!(card_id = %event.card_id(), "no runtime, card event ignored");
            return;
        };
        runtime.spawn(async move {
            if let Ok(outcome) = correlator.handle(event.card_id(), weight).await {
                debug!(
                    card_id = %event.card_id(),
                    source = %event.source(),
                    ?outcome,
                    "card handled"
                );
            }
        });
    }
}

impl KioskSession {
    pub fn new(
        config: &Config,
        api: Arc<dyn KioskApi>,
        presentation: Arc<dyn Presentation>,
        tickets: Arc<dyn TicketStateView>,
    ) -> Self {
        let scale = Arc::new(ScaleMonitor::new(
            Arc::clone(&api),
            Arc::clone(&presentation),
            &config.scale,
        ));
        let correlator = TicketCorrelator::new(
            Arc::clone(&api),
            Arc::clone(&presentation),
            Arc::clone(&tickets),
            config.tickets.refresh_delay,
        );
        let sink = CorrelatingSink {
            correlator: correlator.clone(),
            scale: Arc::clone(&scale),
        };
        let cards = CardSource::new(
            Arc::clone(&api),
            Arc::clone(&presentation),
            tickets,
            Arc::new(sink),
            &config.card_reader,
        );
        let customers = CustomerDesk::new(api, presentation);

        Self {
            scale,
            cards,
            correlator,
            customers,
            autostart_cards: config.card_reader.autostart,
        }
    }

    /// Session talking HTTP to the configured backend.
    pub fn connect(
        config: &Config,
        presentation: Arc<dyn Presentation>,
        tickets: Arc<dyn TicketStateView>,
    ) -> KioskResult<Self> {
        let api = ApiClient::new(&config.server)?;
        Ok(Self::new(config, Arc::new(api), presentation, tickets))
    }

    /// Start the scale monitor and, if configured, card polling.
    pub fn start(&self) {
        self.scale.start();
        if self.autostart_cards {
            self.cards.start();
        }
        info!(card_polling = self.cards.is_polling(), "kiosk session started");
    }

    /// Stop both polling loops. Requests already in flight still complete.
    pub fn shutdown(&self) {
        self.cards.stop();
        self.scale.stop();
        info!(busy = self.correlator.is_busy(), "kiosk session stopped");
    }

    /// Manual or quick-select card entry.
    pub fn inject_card(&self, raw: &str, source: ScanSource) -> bool {
        self.cards.inject(raw, source).is_some()
    }

    pub fn scale(&self) -> &ScaleMonitor {
        &self.scale
    }

    pub fn cards(&self) -> &CardSource {
        &self.cards
    }

    pub fn correlator(&self) -> &TicketCorrelator {
        &self.correlator
    }

    pub fn customers(&self) -> &CustomerDesk {
        &self.customers
    }
}
