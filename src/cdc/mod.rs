pub mod client;
pub mod decoder;
pub mod error;
pub mod reference;
pub mod scan;
