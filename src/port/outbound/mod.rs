//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies: the balance ledger,
//! the external reference market, and persistence.

pub mod ledger;
pub mod reference;
pub mod store;
