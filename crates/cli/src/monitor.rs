//! One tick of the monitor: pull a reading, resolve the anomaly check,
//! evaluate.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use carwatch_core::{ExternalAnomaly, Reading, Status, Verdict};
use carwatch_ingest::TelemetrySource;
use carwatch_llm::AnomalyDetector;
use carwatch_rules::Engine;

/// Everything produced for a single tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub at: DateTime<Utc>,
    pub reading: Reading,
    pub verdict: Verdict,
}

/// Why [`Monitor::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TickLimit,
    Interrupted,
    Exhausted,
}

pub struct Monitor {
    source: Box<dyn TelemetrySource + Send>,
    detector: Box<dyn AnomalyDetector>,
    engine: Engine,
    anomaly_timeout: Duration,
    tick: u64,
    last_status: Option<Status>,
}

impl Monitor {
    pub fn new(
        source: Box<dyn TelemetrySource + Send>,
        detector: Box<dyn AnomalyDetector>,
        engine: Engine,
        anomaly_timeout: Duration,
    ) -> Self {
        Self {
            source,
            detector,
            engine,
            anomaly_timeout,
            tick: 0,
            last_status: None,
        }
    }

    /// Run one tick. Returns `None` once the source is exhausted.
    pub async fn step(&mut self) -> Option<TickReport> {
        let mut reading = self.source.next_reading()?;
        self.tick += 1;

        // A recorded anomaly wins over asking the detector again.
        if reading.external_anomaly.is_none() {
            reading.external_anomaly = self.resolve_anomaly(&reading).await;
        }

        let verdict = self.engine.evaluate(&reading);
        self.log_transition(&verdict);

        Some(TickReport {
            tick: self.tick,
            at: Utc::now(),
            reading,
            verdict,
        })
    }

    /// Tick every `period` until `limit` ticks ran, the source runs dry or
    /// `shutdown` resolves. `shutdown` is watched while waiting for the next
    /// tick and while a tick is in flight. A tick that overruns the period
    /// pushes the schedule back instead of bursting.
    pub async fn run<S, F>(
        &mut self,
        period: Duration,
        limit: Option<u64>,
        shutdown: S,
        mut on_tick: F,
    ) -> anyhow::Result<(u64, StopReason)>
    where
        S: Future<Output = ()>,
        F: FnMut(&TickReport) -> anyhow::Result<()>,
    {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut ticks = 0u64;
        let reason = 'ticks: loop {
            if limit.is_some_and(|n| ticks >= n) {
                break 'ticks StopReason::TickLimit;
            }

            tokio::select! {
                _ = &mut shutdown => break 'ticks StopReason::Interrupted,
                _ = interval.tick() => {}
            }

            let report = tokio::select! {
                _ = &mut shutdown => break 'ticks StopReason::Interrupted,
                report = self.step() => report,
            };

            match report {
                Some(report) => on_tick(&report)?,
                None => break 'ticks StopReason::Exhausted,
            }
            ticks += 1;
        };

        info!(ticks, reason = ?reason, "monitor stopped");
        Ok((ticks, reason))
    }

    async fn resolve_anomaly(&self, reading: &Reading) -> Option<ExternalAnomaly> {
        match tokio::time::timeout(self.anomaly_timeout, self.detector.check(reading)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    tick = self.tick,
                    timeout_ms = self.anomaly_timeout.as_millis() as u64,
                    "anomaly check timed out, treating as absent"
                );
                None
            }
        }
    }

    fn log_transition(&mut self, verdict: &Verdict) {
        let status = verdict.status;
        if self.last_status != Some(status) {
            info!(tick = self.tick, status = %status, "status changed");
        }
        if status == Status::SeriousProblem {
            warn!(tick = self.tick, details = %verdict.details(), "serious problem");
        } else {
            debug!(tick = self.tick, status = %status, "tick evaluated");
        }
        self.last_status = Some(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use carwatch_ingest::ReplaySource;
    use carwatch_llm::DisabledDetector;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    /// Detector that answers after a fixed delay.
    struct SlowDetector {
        delay: Duration,
        answer: ExternalAnomaly,
    }

    #[async_trait]
    impl AnomalyDetector for SlowDetector {
        async fn check(&self, _reading: &Reading) -> Option<ExternalAnomaly> {
            tokio::time::sleep(self.delay).await;
            Some(self.answer.clone())
        }
    }

    fn replay(readings: &[Reading]) -> Box<dyn TelemetrySource + Send> {
        let lines: Vec<String> = readings
            .iter()
            .map(|r| serde_json::to_string(r).unwrap())
            .collect();
        Box::new(ReplaySource::from_reader(Cursor::new(lines.join("\n"))))
    }

    #[tokio::test]
    async fn ticks_until_source_runs_dry() {
        let hot = Reading::nominal().with_engine_temp(110);
        let mut monitor = Monitor::new(
            replay(&[hot.clone(), hot.clone(), hot]),
            Box::new(DisabledDetector),
            Engine::new(),
            Duration::from_millis(100),
        );

        let mut ticks = Vec::new();
        while let Some(report) = monitor.step().await {
            assert_eq!(report.verdict.status, Status::Warning);
            ticks.push(report.tick);
        }
        assert_eq!(ticks, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn detected_anomaly_is_serious() {
        let mut monitor = Monitor::new(
            replay(&[Reading::nominal()]),
            Box::new(SlowDetector {
                delay: Duration::from_millis(1),
                answer: ExternalAnomaly::detected("Odd vibration pattern."),
            }),
            Engine::new(),
            Duration::from_secs(5),
        );

        let report = monitor.step().await.unwrap();
        assert_eq!(report.verdict.status, Status::SeriousProblem);
        assert!(report.verdict.details().contains("Odd vibration pattern."));
        assert!(report.reading.external_anomaly.is_some());
    }

    #[tokio::test]
    async fn timed_out_check_counts_as_absent() {
        let mut monitor = Monitor::new(
            replay(&[Reading::nominal()]),
            Box::new(SlowDetector {
                delay: Duration::from_secs(10),
                answer: ExternalAnomaly::detected("too late"),
            }),
            Engine::new(),
            Duration::from_millis(20),
        );

        let report = monitor.step().await.unwrap();
        assert!(report.reading.external_anomaly.is_none());
        assert!(report.verdict.is_normal());
    }

    #[tokio::test]
    async fn recorded_anomaly_is_kept() {
        let recorded = Reading::nominal()
            .with_external_anomaly(Some(ExternalAnomaly::detected("recorded")));
        let mut monitor = Monitor::new(
            replay(&[recorded]),
            Box::new(SlowDetector {
                delay: Duration::from_millis(1),
                answer: ExternalAnomaly::clear("fresh"),
            }),
            Engine::new(),
            Duration::from_secs(5),
        );

        let report = monitor.step().await.unwrap();
        assert_eq!(report.reading.external_anomaly.unwrap().details, "recorded");
        assert_eq!(report.verdict.status, Status::SeriousProblem);
    }

    /// Detector that records when each check started.
    struct RecordingDetector {
        delay: Duration,
        started: Arc<Mutex<Vec<Instant>>>,
    }

    #[async_trait]
    impl AnomalyDetector for RecordingDetector {
        async fn check(&self, _reading: &Reading) -> Option<ExternalAnomaly> {
            self.started.lock().unwrap().push(Instant::now());
            tokio::time::sleep(self.delay).await;
            None
        }
    }

    /// Source that never runs dry.
    struct Endless;

    impl TelemetrySource for Endless {
        fn next_reading(&mut self) -> Option<Reading> {
            Some(Reading::nominal())
        }
    }

    fn nominal_stream() -> Box<dyn TelemetrySource + Send> {
        Box::new(Endless)
    }

    #[tokio::test(start_paused = true)]
    async fn slow_ticks_delay_the_schedule() {
        let started = Arc::new(Mutex::new(Vec::new()));
        let mut monitor = Monitor::new(
            nominal_stream(),
            Box::new(RecordingDetector {
                delay: Duration::from_millis(50),
                started: started.clone(),
            }),
            Engine::new(),
            Duration::from_secs(5),
        );

        let (ticks, reason) = monitor
            .run(
                Duration::from_millis(10),
                Some(4),
                std::future::pending::<()>(),
                |_| Ok(()),
            )
            .await
            .unwrap();
        assert_eq!((ticks, reason), (4, StopReason::TickLimit));

        let started = started.lock().unwrap();
        for pair in started.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(60));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_a_tick_in_flight() {
        let mut monitor = Monitor::new(
            nominal_stream(),
            Box::new(SlowDetector {
                delay: Duration::from_secs(3),
                answer: ExternalAnomaly::clear("late"),
            }),
            Engine::new(),
            Duration::from_secs(5),
        );

        let begun = Instant::now();
        let mut seen = 0;
        let (ticks, reason) = monitor
            .run(
                Duration::from_millis(10),
                None,
                tokio::time::sleep(Duration::from_millis(100)),
                |_| {
                    seen += 1;
                    Ok(())
                },
            )
            .await
            .unwrap();

        assert_eq!((ticks, reason), (0, StopReason::Interrupted));
        assert_eq!(seen, 0);
        assert!(begun.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn run_stops_when_source_is_exhausted() {
        let mut monitor = Monitor::new(
            replay(&[Reading::nominal(), Reading::nominal()]),
            Box::new(DisabledDetector),
            Engine::new(),
            Duration::from_millis(100),
        );

        let mut statuses = Vec::new();
        let (ticks, reason) = monitor
            .run(
                Duration::from_millis(1),
                Some(10),
                std::future::pending::<()>(),
                |report| {
                    statuses.push(report.verdict.status);
                    Ok(())
                },
            )
            .await
            .unwrap();

        assert_eq!((ticks, reason), (2, StopReason::Exhausted));
        assert_eq!(statuses, vec![Status::Normal, Status::Normal]);
    }
}
