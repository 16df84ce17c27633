//! Replay loop: newline-delimited frame observations in, frame reports out.
//!
//! Frames carrying a `timestamp` are processed at that time; frames without
//! one use the session clock. The first frame fixes the time base for the
//! whole stream, and later frames using the other one are skipped. Lines that
//! fail to parse, go back in time or switch time base are skipped with a
//! warning, since a perception hiccup must never stop a session. A report line is written whenever the displayed alerts change,
//! and additionally every `report_every` frames when that is non-zero.

use metrics::counter;
use proctor_models::{FrameObservation, FrameReport};
use proctor_signal::{SharedClock, SignalPipeline, StabilizerConfig};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::SessionLogger;

const LINES_SKIPPED_TOTAL: &str = "proctor_replay_lines_skipped_total";

/// Counters for one replay session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Frames fed to the pipeline
    pub frames: u64,
    /// Lines that were not a valid frame observation
    pub malformed: u64,
    /// Frames older than the previous frame
    pub out_of_order: u64,
    /// Frames whose time base differs from the first frame's
    pub mixed_time_base: u64,
    /// Report lines written
    pub reports_written: u64,
    /// Alerts pushed to the display queue
    pub alerts_raised: u64,
}

impl ReplayStats {
    pub fn skipped(&self) -> u64 {
        self.malformed + self.out_of_order + self.mixed_time_base
    }
}

/// One monitored session driven from recorded or live observations.
pub struct ReplaySession {
    config: StabilizerConfig,
    clock: SharedClock,
    pipeline: Option<SignalPipeline>,
    logger: SessionLogger,
    report_every: u64,
    last_time: Option<f64>,
    timestamped: Option<bool>,
    last_alerts: Vec<String>,
    stats: ReplayStats,
}

impl ReplaySession {
    /// Create a session. The pipeline is built on the first frame so the
    /// liveness blink timer starts at that frame's time.
    pub fn new(
        config: StabilizerConfig,
        clock: SharedClock,
        logger: SessionLogger,
        report_every: u64,
    ) -> WorkerResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            pipeline: None,
            logger,
            report_every,
            last_time: None,
            timestamped: None,
            last_alerts: Vec::new(),
            stats: ReplayStats::default(),
        })
    }

    /// Handle one input line, returning the report to write, if any.
    pub fn process_line(&mut self, line_no: u64, line: &str) -> WorkerResult<Option<FrameReport>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let frame: FrameObservation = match serde_json::from_str(line) {
            Ok(frame) => frame,
            Err(e) => {
                self.skip(line_no, "malformed", &e.to_string());
                self.stats.malformed += 1;
                return Ok(None);
            }
        };

        let timestamped = frame.timestamp.is_some();
        if *self.timestamped.get_or_insert(timestamped) != timestamped {
            let detail = if timestamped {
                "timestamped frame in a clock-driven stream"
            } else {
                "frame without timestamp in a timestamped stream"
            };
            self.skip(line_no, "mixed_time_base", detail);
            self.stats.mixed_time_base += 1;
            return Ok(None);
        }

        let now = match frame.timestamp {
            Some(t) if !t.is_finite() => {
                self.skip(line_no, "malformed", "non-finite timestamp");
                self.stats.malformed += 1;
                return Ok(None);
            }
            Some(t) => t,
            None => self.clock.now(),
        };

        if let Some(last) = self.last_time {
            if now < last {
                self.skip(
                    line_no,
                    "out_of_order",
                    &format!("timestamp {now} precedes previous frame at {last}"),
                );
                self.stats.out_of_order += 1;
                return Ok(None);
            }
        }
        self.last_time = Some(now);

        let report = self.pipeline_at(now)?.process_frame_at(&frame, now)?;
        self.stats.frames += 1;

        let changed = report.active_alerts != self.last_alerts;
        if changed {
            self.logger.log_alerts(report.timestamp, &report.active_alerts);
            self.last_alerts = report.active_alerts.clone();
        }
        let periodic = self.report_every > 0 && self.stats.frames % self.report_every == 0;

        Ok((changed || periodic).then_some(report))
    }

    /// Read frames until EOF, writing report lines to `writer`.
    pub async fn run<R, W>(&mut self, reader: R, writer: &mut W) -> WorkerResult<ReplayStats>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.logger.log_start();

        let mut lines = reader.lines();
        let mut line_no = 0u64;
        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            if let Some(report) = self.process_line(line_no, &line)? {
                let mut json = serde_json::to_vec(&report)?;
                json.push(b'\n');
                writer.write_all(&json).await?;
                self.stats.reports_written += 1;
            }
        }
        self.finish(writer).await
    }

    /// Flush `writer` and log session completion.
    ///
    /// Also called on shutdown when `run` was interrupted.
    pub async fn finish<W>(&self, writer: &mut W) -> WorkerResult<ReplayStats>
    where
        W: AsyncWrite + Unpin,
    {
        writer.flush().await?;

        let stats = self.stats();
        self.logger
            .log_completion(stats.frames, stats.skipped(), stats.alerts_raised);
        Ok(stats)
    }

    /// Counters so far.
    pub fn stats(&self) -> ReplayStats {
        ReplayStats {
            alerts_raised: self
                .pipeline
                .as_ref()
                .map_or(0, |p| p.alert_stats().emitted()),
            ..self.stats
        }
    }

    pub fn logger(&self) -> &SessionLogger {
        &self.logger
    }

    fn pipeline_at(&mut self, now: f64) -> WorkerResult<&mut SignalPipeline> {
        if self.pipeline.is_none() {
            debug!(session_id = %self.logger.session_id(), start = now, "Building signal pipeline");
            let pipeline = SignalPipeline::starting_at(self.config.clone(), self.clock.clone(), now)?;
            self.pipeline = Some(pipeline);
        }
        self.pipeline
            .as_mut()
            .ok_or_else(|| WorkerError::config_error("signal pipeline unavailable"))
    }

    fn skip(&self, line_no: u64, reason: &'static str, detail: &str) {
        self.logger.log_skipped(line_no, detail);
        counter!(LINES_SKIPPED_TOTAL, "reason" => reason).increment(1);
    }
}
