//! Wire types for the ticket backend's JSON API.

use serde::{Deserialize, Serialize};
use weighstation_model::{CardId, CustomerId, TicketId};

/// `GET /api/rfid/current`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CurrentCardResponse {
    #[serde(default)]
    pub card_id: Option<String>,
}

impl CurrentCardResponse {
    /// The reported card, treating an empty string like no card.
    pub fn card(&self) -> Option<CardId> {
        self.card_id.as_deref().and_then(|raw| CardId::parse(raw).ok())
    }
}

/// `GET /api/weight/read`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct WeightResponse {
    pub weight: f64,
}

/// `POST /api/tickets`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub rfid_card: CardId,
    pub gross_weight: f64,
}

/// `POST /api/tickets/{id}/close`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloseTicketRequest {
    pub tare_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreatedTicketResponse {
    pub id: TicketId,
}

/// `POST /api/tickets/{id}/print`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrintResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /api/customers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub rfid_card: CardId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreatedCustomerResponse {
    pub id: CustomerId,
}

/// Error payload carried by non-2xx JSON responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
