use std::sync::Arc;

use tracing::{info, warn};
use weighstation_model::{CardId, CustomerId};

use crate::domains::presentation::{Presentation, StatusLevel};
use crate::error::{KioskError, KioskResult, ValidationError};
use crate::infra::services::api::KioskApi;

/// Customer registration and label printing.
///
/// Independent of the ticket in-flight guard.
#[derive(Clone)]
pub struct CustomerDesk {
    api: Arc<dyn KioskApi>,
    presentation: Arc<dyn Presentation>,
}

impl std::fmt::Debug for CustomerDesk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerDesk").finish_non_exhaustive()
    }
}

impl CustomerDesk {
    pub fn new(
        api: Arc<dyn KioskApi>,
        presentation: Arc<dyn Presentation>,
    ) -> Self {
        Self { api, presentation }
    }

    /// Register a customer against an RFID card.
    pub async fn register_customer(
        &self,
        name: &str,
        card: &str,
    ) -> KioskResult<CustomerId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.reject(ValidationError::EmptyCustomerName));
        }
        let Ok(card_id) = CardId::parse(card) else {
            return Err(self.reject(ValidationError::EmptyCardId));
        };

        match self.api.register_customer(name, &card_id).await {
            Ok(customer_id) => {
                info!(%customer_id, card_id = %card_id, "customer registered");
                self.presentation.report_status(
                    &format!("Customer {name} registered"),
                    StatusLevel::Success,
                );
                Ok(customer_id)
            }
            Err(err) => Err(self.fail("register customer", err)),
        }
    }

    pub async fn print_customer_label(
        &self,
        customer_id: &CustomerId,
    ) -> KioskResult<()> {
        match self.api.print_customer_label(customer_id).await {
            Ok(()) => {
                info!(%customer_id, "customer label printed");
                self.presentation.report_status(
                    &format!("Label for customer #{customer_id} printed"),
                    StatusLevel::Success,
                );
                Ok(())
            }
            Err(err) => Err(self.fail("print label", err)),
        }
    }

    fn reject(&self, err: ValidationError) -> KioskError {
        self.presentation.report_error(&err.to_string());
        err.into()
    }

    fn fail(&self, operation: &'static str, err: KioskError) -> KioskError {
        warn!(operation, error = %err, "customer operation failed");
        self.presentation.report_error(&err.to_string());
        err
    }
}
