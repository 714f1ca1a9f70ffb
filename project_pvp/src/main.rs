use std::sync::Arc;

use tokio::io::BufReader;

use combat_model::{Clock, SystemClock, ZoneId};
use combat_tag::ExpiryScan;
use engine_core::{spawn_background_jobs, TickLoop};

use project_pvp::bridge::{read_host_events, write_outputs};
use project_pvp::config::parse_cli_args;
use project_pvp::server::{build_core, run_tick_thread};
use project_pvp::shutdown::{shutdown_channel, wait_for_signal};

#[tokio::main]
async fn main() {
    observability::init_logging();

    let config = match parse_cli_args() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };
    tracing::info!(
        tps = config.tick.tps,
        combat_timeout_secs = config.combat.combat_timeout_secs,
        zones = config.zones.len(),
        "PvP server starting..."
    );

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    // Channels between async tasks and the tick thread
    let (routed_tx, routed_rx) = tokio::sync::mpsc::unbounded_channel();
    let (job_tx, job_rx) = tokio::sync::mpsc::unbounded_channel();
    let (output_tx, output_rx) = tokio::sync::mpsc::unbounded_channel();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let core = build_core(&config, Arc::clone(&clock));
    let scan = ExpiryScan::new(core.tracker().clone(), clock);
    let settings = Arc::clone(core.settings());
    let jobs = spawn_background_jobs(scan, &settings, shutdown_rx.clone().into_inner(), job_tx);
    tracing::info!(jobs = ?jobs.maintenance().names(), "background jobs started");

    let tick_loop = TickLoop::new(config.to_tick_config(), core).with_inbox(job_rx);
    let starting_balance = config.host.starting_balance;
    let tick_shutdown = shutdown_rx.clone();
    let tick_handle = std::thread::Builder::new()
        .name("tick".into())
        .spawn(move || run_tick_thread(tick_loop, routed_rx, starting_balance, tick_shutdown, output_tx));
    let tick_handle = match tick_handle {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "failed to spawn tick thread");
            return;
        }
    };

    let writer = tokio::spawn(write_outputs(output_rx, tokio::io::stdout()));
    let default_zone = ZoneId::new(config.combat.default_zone.clone());
    let reader = read_host_events(BufReader::new(tokio::io::stdin()), default_zone, routed_tx);

    tokio::select! {
        _ = wait_for_signal() => {
            tracing::info!("Shutdown signal received, stopping server...");
        }
        forwarded = reader => {
            tracing::info!(forwarded, "host disconnected, stopping server...");
        }
    }
    shutdown_tx.trigger();

    jobs.join().await;
    match tokio::task::spawn_blocking(move || tick_handle.join()).await {
        Ok(Ok(tick_loop)) => tracing::info!(ticks = tick_loop.current_tick, "tick thread joined"),
        Ok(Err(_)) => tracing::error!("tick thread panicked"),
        Err(e) => tracing::error!(error = %e, "failed to join tick thread"),
    }
    match writer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "output stream failed"),
        Err(e) => tracing::warn!(error = %e, "output writer ended abnormally"),
    }

    tracing::info!("Server stopped.");
}
