//! Unified operator capability surface for inbound adapters.

use super::configuration::ConfigurationOperator;
use super::maintenance::MaintenanceOperator;
use super::runtime::RuntimeOperator;

/// Unified operator capability surface consumed by inbound adapters.
pub trait OperatorPort: ConfigurationOperator + MaintenanceOperator + RuntimeOperator {}

impl<T> OperatorPort for T where T: ConfigurationOperator + MaintenanceOperator + RuntimeOperator {}
