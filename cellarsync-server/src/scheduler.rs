//! Periodic sync scheduling.
//!
//! Each tick spawns a cycle on its own task. A cycle still running when the
//! next tick fires makes that tick a no-op.

use cellarsync_engine::{CycleReport, SyncDriver};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

/// What a single trigger of the job did.
#[derive(Debug)]
pub enum JobRun {
    Completed(CycleReport),
    /// Another cycle held the guard.
    AlreadyRunning,
    /// The pipeline failed to start; nothing to run.
    Unavailable,
}

/// The sync job plus its skip-if-running guard.
pub struct SyncJob {
    driver: Result<SyncDriver, String>,
    running: Mutex<()>,
}

impl SyncJob {
    pub fn new(driver: SyncDriver) -> Self {
        Self {
            driver: Ok(driver),
            running: Mutex::new(()),
        }
    }

    /// A job whose pipeline failed to assemble. Every run logs `reason`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            driver: Err(reason.into()),
            running: Mutex::new(()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.driver.is_ok()
    }

    pub async fn run_once(&self) -> JobRun {
        let driver = match &self.driver {
            Ok(driver) => driver,
            Err(reason) => {
                error!("sync skipped, pipeline unavailable: {reason}");
                return JobRun::Unavailable;
            }
        };

        let Ok(_guard) = self.running.try_lock() else {
            info!("previous sync cycle still running, skipping this tick");
            return JobRun::AlreadyRunning;
        };

        JobRun::Completed(driver.run_cycle().await)
    }
}

/// Fires `job` immediately and then every `every`.
pub fn spawn_periodic(job: Arc<SyncJob>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let job = job.clone();
            tokio::spawn(async move {
                job.run_once().await;
            });
        }
    })
}
