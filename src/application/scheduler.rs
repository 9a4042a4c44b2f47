//! Periodic risk snapshot and recovery sweep.
//!
//! Each job runs on its own interval, independent of request traffic. The
//! first tick fires one full interval after start.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::application::recovery::RecoverySweep;
use crate::application::risk::manager::RiskManager;

/// Intervals for the scheduled jobs.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub snapshot_every: Duration,
    pub sweep_every: Duration,
}

/// Handle to the running jobs.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    #[must_use]
    pub fn start(risk: Arc<RiskManager>, sweep: Arc<RecoverySweep>, schedule: Schedule) -> Self {
        let (shutdown, stop) = watch::channel(false);

        let snapshot_job = spawn_periodic("risk_snapshot", schedule.snapshot_every, stop.clone(), {
            move || {
                if let Err(e) = risk.take_snapshot(Utc::now()) {
                    error!(error = %e, "Risk snapshot failed");
                }
            }
        });
        let sweep_job = spawn_periodic("recovery_sweep", schedule.sweep_every, stop, move || {
            if let Err(e) = sweep.run(Utc::now()) {
                error!(error = %e, "Recovery sweep failed");
            }
        });

        info!(
            snapshot_secs = schedule.snapshot_every.as_secs(),
            sweep_secs = schedule.sweep_every.as_secs(),
            "Scheduler started"
        );
        Self {
            shutdown,
            handles: vec![snapshot_job, sweep_job],
        }
    }

    /// Stop both jobs and wait for them.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("Scheduler stopped");
    }
}

fn spawn_periodic<F>(
    name: &'static str,
    every: Duration,
    mut stop: watch::Receiver<bool>,
    job: F,
) -> JoinHandle<()>
where
    F: Fn() + Send + 'static,
{
    tokio::spawn(async move {
        let every = every.max(Duration::from_secs(1));
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => job(),
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
        info!(job = name, "Scheduled job stopped");
    })
}
