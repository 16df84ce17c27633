//! Proctoring signal worker binary.
//!
//! Reads frame observations as JSON lines from `PROCTOR_INPUT` (or stdin) and
//! writes frame reports as JSON lines to stdout.
//!
//! `proctor-worker schema` prints the JSON schemas of both line formats.

use anyhow::Context;
use proctor_models::{FrameObservation, FrameReport};
use proctor_signal::SystemClock;
use proctor_worker::{
    init_tracing, install_metrics_exporter, load_stabilizer_config, ReplaySession, SessionLogger,
    WorkerConfig,
};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{error, info, warn, Instrument};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    if std::env::args().nth(1).as_deref() == Some("schema") {
        let schemas = serde_json::json!({
            "frame_observation": schemars::schema_for!(FrameObservation),
            "frame_report": schemars::schema_for!(FrameReport),
        });
        println!("{}", serde_json::to_string_pretty(&schemas)?);
        return Ok(());
    }

    let config = WorkerConfig::from_env();
    init_tracing(config.json_logs);

    info!("Starting proctor-worker");
    info!("Worker config: {:?}", config);

    if let Some(port) = config.metrics_port {
        match install_metrics_exporter(port) {
            Ok(addr) => info!(%addr, "Prometheus exporter listening"),
            Err(e) => warn!("{}", e),
        }
    }

    let stabilizer = load_stabilizer_config(config.config_path.as_deref())
        .await
        .context("invalid stabilizer configuration")?;

    let (reader, source): (Box<dyn AsyncBufRead + Unpin + Send>, String) = match &config.input_path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            (Box::new(BufReader::new(file)), path.display().to_string())
        }
        None => (Box::new(BufReader::new(tokio::io::stdin())), "stdin".to_string()),
    };

    let logger = SessionLogger::new(&source);
    let span = logger.create_span();

    let mut session = ReplaySession::new(stabilizer, SystemClock::shared(), logger, config.report_every)?;
    let mut stdout = tokio::io::stdout();

    let interrupted = tokio::select! {
        result = session.run(reader, &mut stdout).instrument(span.clone()) => {
            if let Err(e) = result {
                error!("Replay failed: {}", e);
                return Err(e.into());
            }
            false
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            true
        }
    };

    if interrupted {
        session.finish(&mut stdout).instrument(span).await?;
    }

    let stats = session.stats();
    info!(
        frames = stats.frames,
        skipped = stats.skipped(),
        reports = stats.reports_written,
        alerts = stats.alerts_raised,
        "Worker shutdown complete"
    );
    Ok(())
}
