pub mod client;
pub mod error;
pub mod listing;
pub mod transport;
