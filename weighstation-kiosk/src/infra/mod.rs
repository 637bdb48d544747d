pub mod api_client;
pub mod api_types;
pub mod constants;
pub mod poller;
pub mod services;
pub mod testing;
