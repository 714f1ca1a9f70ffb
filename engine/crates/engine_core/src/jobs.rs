use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use combat_tag::ExpiryScan;
use maintenance::{spawn_repeating, JobSchedule, MaintenanceJobs};

use crate::command::EngineCommand;
use crate::settings::CombatSettings;

/// Timer tasks feeding the tick thread.
#[derive(Debug)]
pub struct BackgroundJobs {
    scan: JoinHandle<()>,
    maintenance: MaintenanceJobs,
}

/// Start the tag expiry scan and the maintenance jobs. None of them touch
/// actor state; their results arrive at the tick thread as commands.
pub fn spawn_background_jobs(
    scan: ExpiryScan,
    settings: &CombatSettings,
    shutdown: watch::Receiver<bool>,
    tx: UnboundedSender<EngineCommand>,
) -> BackgroundJobs {
    let interval = settings.scan.interval();
    let scan_tx = tx.clone();
    let scan = spawn_repeating("tag_expiry_scan", interval, interval, shutdown.clone(), move || {
        let report = scan.run();
        report.expired.is_empty() || scan_tx.send(EngineCommand::TagsExpired(report.expired)).is_ok()
    });

    let schedule = JobSchedule::from_config(&settings.kill_abuse, &settings.toggle);
    let maintenance = MaintenanceJobs::spawn(schedule, shutdown, move |task| tx.send(task.into()).is_ok());

    BackgroundJobs { scan, maintenance }
}

impl BackgroundJobs {
    pub fn maintenance(&self) -> &MaintenanceJobs {
        &self.maintenance
    }

    pub async fn join(self) {
        if let Err(e) = self.scan.await {
            tracing::warn!(error = %e, "expiry scan ended abnormally");
        }
        self.maintenance.join().await;
    }
}
