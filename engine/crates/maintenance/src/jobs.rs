use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::fee::ToggleFeeConfig;
use crate::kill_abuse::KillAbuseConfig;
use crate::schedule::spawn_repeating;

/// Work a maintenance job asks the synchronous context to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceTask {
    ResetKillCounters,
    ChargeToggleFees,
}

/// Intervals for the two background jobs; `None` leaves a job unscheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobSchedule {
    pub kill_abuse: Option<Duration>,
    pub toggle_fee: Option<Duration>,
}

impl JobSchedule {
    pub fn from_config(kill_abuse: &KillAbuseConfig, fees: &ToggleFeeConfig) -> Self {
        Self {
            kill_abuse: kill_abuse.cleanup_interval(),
            toggle_fee: fees.interval(),
        }
    }
}

/// Handles of the running maintenance jobs.
///
/// The jobs only decide when something is due; `dispatch` hands the task
/// over to whoever owns actor state. A `false` from `dispatch` stops the job.
#[derive(Debug, Default)]
pub struct MaintenanceJobs {
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl MaintenanceJobs {
    pub fn spawn<D>(schedule: JobSchedule, shutdown: watch::Receiver<bool>, dispatch: D) -> Self
    where
        D: Fn(MaintenanceTask) -> bool + Clone + Send + 'static,
    {
        let mut handles = Vec::new();
        if let Some(interval) = schedule.kill_abuse {
            let dispatch = dispatch.clone();
            handles.push((
                "kill_abuse_cleanup",
                spawn_repeating("kill_abuse_cleanup", interval, interval, shutdown.clone(), move || {
                    dispatch(MaintenanceTask::ResetKillCounters)
                }),
            ));
        }
        if let Some(interval) = schedule.toggle_fee {
            handles.push((
                "pvp_toggle_fee",
                spawn_repeating("pvp_toggle_fee", Duration::ZERO, interval, shutdown, move || {
                    dispatch(MaintenanceTask::ChargeToggleFees)
                }),
            ));
        }
        tracing::info!(jobs = handles.len(), "maintenance jobs started");
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handles.iter().map(|(name, _)| *name).collect()
    }

    /// Wait for every job to observe shutdown.
    pub async fn join(self) {
        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                tracing::warn!(job = name, error = %e, "maintenance job ended abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn dispatches_both_tasks() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let schedule = JobSchedule {
            kill_abuse: Some(Duration::from_millis(10)),
            toggle_fee: Some(Duration::from_millis(10)),
        };
        let jobs = MaintenanceJobs::spawn(schedule, shutdown_rx, move |task| tx.send(task).is_ok());
        assert_eq!(jobs.names(), vec!["kill_abuse_cleanup", "pvp_toggle_fee"]);

        tokio::time::sleep(Duration::from_millis(35)).await;
        shutdown_tx.send(true).unwrap();
        jobs.join().await;

        let mut seen = Vec::new();
        while let Ok(task) = rx.try_recv() {
            seen.push(task);
        }
        // The fee job fires immediately; the cleanup waits one interval.
        assert_eq!(seen.first(), Some(&MaintenanceTask::ChargeToggleFees));
        assert!(seen.contains(&MaintenanceTask::ResetKillCounters));
    }

    #[tokio::test]
    async fn disabled_jobs_are_not_spawned() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let schedule = JobSchedule::from_config(&KillAbuseConfig::default(), &ToggleFeeConfig::default());
        let jobs = MaintenanceJobs::spawn(schedule, shutdown_rx, |_| true);
        assert_eq!(jobs.names(), vec!["kill_abuse_cleanup"]);
        assert_eq!(jobs.len(), 1);
    }
}
