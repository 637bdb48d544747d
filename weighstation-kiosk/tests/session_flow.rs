mod support;

use std::sync::Arc;
use std::time::Duration;

use weighstation_config::Config;
use weighstation_kiosk::KioskSession;
use weighstation_kiosk::domains::tickets::TicketStateCache;
use weighstation_kiosk::testing::RecordingPresentation;
use weighstation_model::{CardId, ScanSource, TicketId, TicketRef};

use support::{StubServer, start_stub_server};

struct Kiosk {
    server: StubServer,
    presentation: Arc<RecordingPresentation>,
    tickets: Arc<TicketStateCache>,
    session: KioskSession,
}

async fn kiosk() -> Kiosk {
    let server = start_stub_server().await;
    let mut config = Config::default();
    config.server.base_url = server.base_url.clone();
    config.tickets.refresh_delay = Duration::from_millis(50);

    let presentation = Arc::new(RecordingPresentation::new());
    let tickets = Arc::new(TicketStateCache::new());
    let session =
        KioskSession::connect(&config, presentation.clone(), tickets.clone())
            .expect("session");
    Kiosk {
        server,
        presentation,
        tickets,
        session,
    }
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn server_error_message_reaches_operator_and_guard_resets() {
    let k = kiosk().await;
    k.server.state.set_weight(42.5);
    k.session.scale().poll_once().await.expect("weight");

    k.server.state.set_card(Some("FAIL"));
    k.session.cards().poll_once().await.expect("poll");

    wait_until(|| !k.presentation.errors().is_empty()).await;
    assert_eq!(k.presentation.errors(), vec!["db down".to_string()]);
    wait_until(|| !k.session.correlator().is_busy()).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(k.presentation.refresh_count(), 0);
}

#[tokio::test]
async fn each_new_polled_card_opens_one_ticket() {
    let k = kiosk().await;
    k.server.state.set_weight(1520.0);
    k.session.scale().poll_once().await.expect("weight");

    for (card, creates) in [("A1", 1), ("A1", 1), ("B2", 2)] {
        k.server.state.set_card(Some(card));
        k.session.cards().poll_once().await.expect("poll");
        wait_until(|| {
            k.server.state.requests_exact("POST /api/tickets").len() == creates
                && !k.session.correlator().is_busy()
        })
        .await;
    }

    let cards: Vec<_> = k
        .server
        .state
        .requests_exact("POST /api/tickets")
        .into_iter()
        .map(|(_, body)| body["rfid_card"].as_str().map(str::to_string))
        .collect();
    assert_eq!(cards, vec![Some("A1".to_string()), Some("B2".to_string())]);

    wait_until(|| k.presentation.refresh_count() == 2).await;
}

#[tokio::test]
async fn injected_card_with_open_ticket_closes_it_at_current_weight() {
    let k = kiosk().await;
    k.tickets
        .replace([TicketRef::open(TicketId::from(7), CardId::new_unchecked("C3"))]);
    k.server.state.set_weight(8100.0);
    k.session.scale().poll_once().await.expect("weight");

    assert!(k.session.inject_card("C3", ScanSource::QuickSelect));

    wait_until(|| !k.server.state.requests_to("POST /api/tickets/7").is_empty())
        .await;
    let closes = k.server.state.requests_to("POST /api/tickets/7/close");
    assert_eq!(closes.len(), 1);
    assert_eq!(closes[0].1["tare_weight"], 8100.0);
    assert!(k.server.state.requests_exact("POST /api/tickets").is_empty());

    wait_until(|| {
        k.presentation.statuses().iter().any(|(message, _)| {
            message == "Ticket #7 closed successfully!"
        })
    })
    .await;
}

#[tokio::test]
async fn scale_outage_is_reported_once_and_recovers() {
    let k = kiosk().await;
    k.server.state.set_weight(500.0);
    k.session.scale().poll_once().await.expect("weight");

    k.server.state.set_weight(-1.0);
    for _ in 0..4 {
        assert!(k.session.scale().poll_once().await.is_err());
    }
    assert!(!k.session.scale().is_connected());
    assert_eq!(k.session.scale().current_weight(), 500.0);

    k.server.state.set_weight(650.0);
    k.session.scale().poll_once().await.expect("recovered");
    assert_eq!(
        k.presentation.connection_changes(),
        vec![true, false, true]
    );
}
