//! Maintenance operator implementation.

use chrono::Utc;

use crate::domain::snapshot::RiskSnapshot;
use crate::error::Result;
use crate::infrastructure::bootstrap::Maintenance;
use crate::infrastructure::config::settings::Config;
use crate::port::inbound::operator::maintenance::MaintenanceOperator;
use crate::port::inbound::risk::{RiskDashboard, SweepSummary};

use super::entry::Operator;

fn open(config_toml: &str) -> Result<Maintenance> {
    let config = Config::parse_toml(config_toml)?;
    config.init_logging();
    Maintenance::open(&config)
}

impl MaintenanceOperator for Operator {
    fn sweep(&self, config_toml: &str) -> Result<SweepSummary> {
        open(config_toml)?.sweep.run(Utc::now())
    }

    fn snapshot(&self, config_toml: &str) -> Result<RiskSnapshot> {
        open(config_toml)?.risk.take_snapshot(Utc::now())
    }

    fn dashboard(&self, config_toml: &str) -> Result<RiskDashboard> {
        open(config_toml)?.risk.dashboard(Utc::now())
    }
}
