//! Hedge replication: runtime settings, the dispatcher, and its worker pool.

pub mod dispatcher;
pub mod pool;
pub mod settings;

pub use dispatcher::HedgeDispatcher;
pub use pool::{HedgeOutcome, HedgeQueue, HedgeWorkerPool};
pub use settings::HedgeSettings;
