use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use weighstation_model::{CardId, CustomerId, TicketId};

use crate::error::KioskResult;
use crate::infra::api_types::CurrentCardResponse;
use crate::infra::services::api::KioskApi;

/// A request observed by [`ScriptedApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    CurrentCard,
    ReadWeight,
    CreateTicket { card_id: CardId, gross_weight: f64 },
    CloseTicket { ticket_id: TicketId, tare_weight: f64 },
    DeleteTicket(TicketId),
    PrintTicket(TicketId),
    RegisterCustomer { name: String, card_id: CardId },
    PrintCustomerLabel(CustomerId),
}

impl ApiCall {
    /// Create or close, the calls covered by the in-flight guard.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::CreateTicket { .. } | Self::CloseTicket { .. })
    }
}

/// In-memory [`KioskApi`] that replays scripted results and records calls.
///
/// Each endpoint pops its next scripted result; once a queue is empty the
/// endpoint falls back to a benign default (no card, the configured weight,
/// sequential ticket ids, plain success).
#[derive(Debug, Clone)]
pub struct ScriptedApi {
    inner: Arc<Mutex<InnerApiState>>,
    mutation_gate: Arc<watch::Sender<bool>>,
}

#[derive(Debug)]
struct InnerApiState {
    cards: VecDeque<KioskResult<Option<String>>>,
    weights: VecDeque<KioskResult<f64>>,
    default_weight: f64,
    creates: VecDeque<KioskResult<TicketId>>,
    closes: VecDeque<KioskResult<()>>,
    deletes: VecDeque<KioskResult<()>>,
    prints: VecDeque<KioskResult<Option<String>>>,
    customers: VecDeque<KioskResult<CustomerId>>,
    next_ticket: u64,
    next_customer: u64,
    calls: Vec<ApiCall>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedApi {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            inner: Arc::new(Mutex::new(InnerApiState {
                cards: VecDeque::new(),
                weights: VecDeque::new(),
                default_weight: 0.0,
                creates: VecDeque::new(),
                closes: VecDeque::new(),
                deletes: VecDeque::new(),
                prints: VecDeque::new(),
                customers: VecDeque::new(),
                next_ticket: 1,
                next_customer: 1,
                calls: Vec::new(),
            })),
            mutation_gate: Arc::new(gate),
        }
    }

    pub fn push_card(&self, card: Option<&str>) {
        self.inner.lock().cards.push_back(Ok(card.map(str::to_string)));
    }

    pub fn push_card_result(&self, result: KioskResult<Option<String>>) {
        self.inner.lock().cards.push_back(result);
    }

    pub fn push_weight(&self, result: KioskResult<f64>) {
        self.inner.lock().weights.push_back(result);
    }

    /// Weight returned once the scripted readings run out.
    pub fn set_weight(&self, weight: f64) {
        self.inner.lock().default_weight = weight;
    }

    pub fn push_create(&self, result: KioskResult<TicketId>) {
        self.inner.lock().creates.push_back(result);
    }

    pub fn push_close(&self, result: KioskResult<()>) {
        self.inner.lock().closes.push_back(result);
    }

    pub fn push_delete(&self, result: KioskResult<()>) {
        self.inner.lock().deletes.push_back(result);
    }

    pub fn push_print(&self, result: KioskResult<Option<String>>) {
        self.inner.lock().prints.push_back(result);
    }

    pub fn push_customer(&self, result: KioskResult<CustomerId>) {
        self.inner.lock().customers.push_back(result);
    }

    /// Keep create/close requests pending until [`release_mutations`]
    /// is called. The call is recorded before it blocks.
    ///
    /// [`release_mutations`]: ScriptedApi::release_mutations
    pub fn hold_mutations(&self) {
        self.mutation_gate.send_replace(true);
    }

    pub fn release_mutations(&self) {
        self.mutation_gate.send_replace(false);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.inner.lock().calls.clone()
    }

    pub fn mutation_calls(&self) -> Vec<ApiCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&ApiCall) -> bool) -> usize {
        self.inner.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: ApiCall) {
        self.inner.lock().calls.push(call);
    }

    async fn wait_for_gate(&self) {
        let mut rx = self.mutation_gate.subscribe();
        let _ = rx.wait_for(|held| !*held).await;
    }
}

#[async_trait]
impl KioskApi for ScriptedApi {
    async fn current_card(&self) -> KioskResult<CurrentCardResponse> {
        self.record(ApiCall::CurrentCard);
        let next = self.inner.lock().cards.pop_front();
        next.unwrap_or(Ok(None))
            .map(|card_id| CurrentCardResponse { card_id })
    }

    async fn read_weight(&self) -> KioskResult<f64> {
        self.record(ApiCall::ReadWeight);
        let mut guard = self.inner.lock();
        let fallback = guard.default_weight;
        guard.weights.pop_front().unwrap_or(Ok(fallback))
    }

    async fn create_ticket(
        &self,
        card_id: &CardId,
        gross_weight: f64,
    ) -> KioskResult<TicketId> {
        self.record(ApiCall::CreateTicket {
            card_id: card_id.clone(),
            gross_weight,
        });
        self.wait_for_gate().await;

        let mut guard = self.inner.lock();
        match guard.creates.pop_front() {
            Some(result) => result,
            None => {
                let id = guard.next_ticket;
                guard.next_ticket += 1;
                Ok(TicketId::from(id))
            }
        }
    }

    async fn close_ticket(
        &self,
        ticket_id: &TicketId,
        tare_weight: f64,
    ) -> KioskResult<()> {
        self.record(ApiCall::CloseTicket {
            ticket_id: ticket_id.clone(),
            tare_weight,
        });
        self.wait_for_gate().await;
        let next = self.inner.lock().closes.pop_front();
        next.unwrap_or(Ok(()))
    }

    async fn delete_ticket(&self, ticket_id: &TicketId) -> KioskResult<()> {
        self.record(ApiCall::DeleteTicket(ticket_id.clone()));
        let next = self.inner.lock().deletes.pop_front();
        next.unwrap_or(Ok(()))
    }

    async fn print_ticket(
        &self,
        ticket_id: &TicketId,
    ) -> KioskResult<Option<String>> {
        self.record(ApiCall::PrintTicket(ticket_id.clone()));
        let next = self.inner.lock().prints.pop_front();
        next.unwrap_or(Ok(None))
    }

    async fn register_customer(
        &self,
        name: &str,
        card_id: &CardId,
    ) -> KioskResult<CustomerId> {
        self.record(ApiCall::RegisterCustomer {
            name: name.to_string(),
            card_id: card_id.clone(),
        });
        let mut guard = self.inner.lock();
        match guard.customers.pop_front() {
            Some(result) => result,
            None => {
                let id = guard.next_customer;
                guard.next_customer += 1;
                Ok(CustomerId::from(id))
            }
        }
    }

    async fn print_customer_label(
        &self,
        customer_id: &CustomerId,
    ) -> KioskResult<()> {
        self.record(ApiCall::PrintCustomerLabel(customer_id.clone()));
        Ok(())
    }
}
