//! Reference market clients.
//!
//! - [`http`]: JSON-over-HTTP venue client
//! - [`paper`]: fills every order immediately, for local runs

pub mod http;
pub mod paper;

pub use http::HttpReferenceMarket;
pub use paper::PaperReferenceMarket;
