//! Backend routes and operator-facing messages.

pub mod routes {
    pub const CURRENT_CARD: &str = "/api/rfid/current";
    pub const READ_WEIGHT: &str = "/api/weight/read";
    pub const TICKETS: &str = "/api/tickets";
    pub const CUSTOMERS: &str = "/api/customers";

    pub fn ticket(id: &str) -> String {
        format!("{TICKETS}/{id}")
    }

    pub fn close_ticket(id: &str) -> String {
        format!("{TICKETS}/{id}/close")
    }

    pub fn print_ticket(id: &str) -> String {
        format!("{TICKETS}/{id}/print")
    }

    pub fn print_customer_label(id: &str) -> String {
        format!("{CUSTOMERS}/{id}/print-label")
    }
}

pub mod messages {
    pub const PROCESSING_CARD: &str = "Processing card...";
    pub const CREATING_TICKET: &str = "Creating new ticket...";
    pub const SENDING_PRINT_JOB: &str = "Sending print job...";
    pub const TICKET_DELETED: &str = "Ticket deleted successfully";
    pub const SCALE_ERROR: &str = "Error connecting to weight scale";
    pub const NO_CARD: &str = "No card detected";
    pub const READY_FOR_NEW_TICKET: &str = "Card ready for new ticket";
    pub const POLL_ERROR: &str = "Error polling for card";
}
