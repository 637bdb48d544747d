//! API service trait and its HTTP implementation
//!
//! Components talk to the backend only through [`KioskApi`], so tests can swap
//! in scripted or mocked services.

use async_trait::async_trait;
use serde::de::IgnoredAny;
use weighstation_model::{CardId, CustomerId, TicketId};

use crate::error::KioskResult;
use crate::infra::api_client::ApiClient;
use crate::infra::api_types::{
    CloseTicketRequest, CreateCustomerRequest, CreateTicketRequest,
    CreatedCustomerResponse, CreatedTicketResponse, CurrentCardResponse,
    PrintResponse, WeightResponse,
};
use crate::infra::constants::routes;

/// Backend operations consumed by the kiosk
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KioskApi: Send + Sync {
    /// Card currently presented to the reader, if any
    async fn current_card(&self) -> KioskResult<CurrentCardResponse>;

    /// Current scale reading
    async fn read_weight(&self) -> KioskResult<f64>;

    /// Open a ticket for a card with its gross weight
    async fn create_ticket(
        &self,
        card_id: &CardId,
        gross_weight: f64,
    ) -> KioskResult<TicketId>;

    /// Close an open ticket with its tare weight
    async fn close_ticket(
        &self,
        ticket_id: &TicketId,
        tare_weight: f64,
    ) -> KioskResult<()>;

    async fn delete_ticket(&self, ticket_id: &TicketId) -> KioskResult<()>;

    /// Send a ticket receipt to the printer. Returns the server's message.
    async fn print_ticket(
        &self,
        ticket_id: &TicketId,
    ) -> KioskResult<Option<String>>;

    async fn register_customer(
        &self,
        name: &str,
        card_id: &CardId,
    ) -> KioskResult<CustomerId>;

    async fn print_customer_label(
        &self,
        customer_id: &CustomerId,
    ) -> KioskResult<()>;
}

#[async_trait]
impl KioskApi for ApiClient {
    async fn current_card(&self) -> KioskResult<CurrentCardResponse> {
        self.get(routes::CURRENT_CARD).await
    }

    async fn read_weight(&self) -> KioskResult<f64> {
        let reading: WeightResponse = self.get(routes::READ_WEIGHT).await?;
        Ok(reading.weight)
    }

    async fn create_ticket(
        &self,
        card_id: &CardId,
        gross_weight: f64,
    ) -> KioskResult<TicketId> {
        let body = CreateTicketRequest {
            rfid_card: card_id.clone(),
            gross_weight,
        };
        let created: CreatedTicketResponse =
            self.post(routes::TICKETS, &body).await?;
        Ok(created.id)
    }

    async fn close_ticket(
        &self,
        ticket_id: &TicketId,
        tare_weight: f64,
    ) -> KioskResult<()> {
        let body = CloseTicketRequest { tare_weight };
        let _: IgnoredAny = self
            .post(&routes::close_ticket(ticket_id.as_str()), &body)
            .await?;
        Ok(())
    }

    async fn delete_ticket(&self, ticket_id: &TicketId) -> KioskResult<()> {
        let _: IgnoredAny =
            self.delete(&routes::ticket(ticket_id.as_str())).await?;
        Ok(())
    }

    async fn print_ticket(
        &self,
        ticket_id: &TicketId,
    ) -> KioskResult<Option<String>> {
        let printed: PrintResponse = self
            .post_empty(&routes::print_ticket(ticket_id.as_str()))
            .await?;
        Ok(printed.message)
    }

    async fn register_customer(
        &self,
        name: &str,
        card_id: &CardId,
    ) -> KioskResult<CustomerId> {
        let body = CreateCustomerRequest {
            name: name.to_string(),
            rfid_card: card_id.clone(),
        };
        let created: CreatedCustomerResponse =
            self.post(routes::CUSTOMERS, &body).await?;
        Ok(created.id)
    }

    async fn print_customer_label(
        &self,
        customer_id: &CustomerId,
    ) -> KioskResult<()> {
        let _: IgnoredAny = self
            .post_empty(&routes::print_customer_label(customer_id.as_str()))
            .await?;
        Ok(())
    }
}
