//! Per-row failure boundary around "encode, then write".
//!
//! Row-level errors are recorded and skipped; anything returned as
//! [`PrepError`] aborts the run.

use crate::container::{ContainerSink, ContainerWriter};
use crate::encoder::RecordEncoder;
use crate::error::{PrepError, PrepResult, RowError, RowErrorKind};
use crate::progress::{PrepEvent, ProgressSink};
use crate::record::FeatureRecord;
use crate::rows::ManifestRow;
use crate::summary::PrepRunId;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Stage a row had reached when it failed. Rows move `Pending -> Decoding ->
/// Encoding` and end written ([`PrepEvent::RowWritten`]) or skipped
/// ([`PrepEvent::RowSkipped`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowState {
    Pending,
    Decoding,
    Encoding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub line: u64,
    pub relative_path: Option<String>,
    pub kind: RowErrorKind,
    /// Last state reached before the failure.
    pub stage: RowState,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub seen: u64,
    pub written: u64,
    pub skipped: u64,
    pub skips: Vec<SkippedRow>,
}

impl RunReport {
    #[must_use]
    pub fn skipped_by_kind(&self) -> BTreeMap<RowErrorKind, u64> {
        let mut out = BTreeMap::new();
        for skip in &self.skips {
            *out.entry(skip.kind).or_insert(0) += 1;
        }
        out
    }
}

/// Result of attempting one row, before it is written or skipped.
struct RowAttempt {
    line: u64,
    relative_path: Option<String>,
    outcome: Result<FeatureRecord, RowError>,
}

impl RowAttempt {
    fn run(encoder: &RecordEncoder, row: ManifestRow) -> Self {
        let outcome = encoder.encode(&row);
        Self { line: row.line, relative_path: Some(row.relative_path), outcome }
    }

    fn unreadable(error: RowError) -> Self {
        let line = match &error {
            RowError::RowFormat { line, .. } => *line,
            _ => 0,
        };
        Self { line, relative_path: None, outcome: Err(error) }
    }
}

pub struct Supervisor<'a> {
    run_id: PrepRunId,
    sink: &'a dyn ProgressSink,
}

impl<'a> Supervisor<'a> {
    #[must_use]
    pub fn new(run_id: PrepRunId, sink: &'a dyn ProgressSink) -> Self {
        Self { run_id, sink }
    }

    /// Process rows one at a time, in order.
    pub fn run<I, S>(&self, rows: I, encoder: &RecordEncoder, writer: &mut ContainerWriter<S>) -> PrepResult<RunReport>
    where
        I: IntoIterator<Item = Result<ManifestRow, RowError>>,
        S: ContainerSink,
    {
        let mut report = RunReport::default();
        for row in rows {
            let attempt = match row {
                Ok(row) => RowAttempt::run(encoder, row),
                Err(e) => RowAttempt::unreadable(e),
            };
            self.settle(attempt, writer, &mut report)?;
        }
        Ok(report)
    }

    /// Encode up to `jobs` rows at once on the blocking pool.
    ///
    /// Results are consumed through an ordered buffer, so the container sees
    /// rows in the same order as [`Supervisor::run`] would write them.
    pub async fn run_concurrent<I, S>(
        &self,
        rows: I,
        encoder: Arc<RecordEncoder>,
        writer: &mut ContainerWriter<S>,
        jobs: usize,
    ) -> PrepResult<RunReport>
    where
        I: IntoIterator<Item = Result<ManifestRow, RowError>>,
        S: ContainerSink,
    {
        let attempts = stream::iter(rows)
            .map(|row| {
                let encoder = Arc::clone(&encoder);
                async move {
                    match row {
                        Ok(row) => tokio::task::spawn_blocking(move || RowAttempt::run(&encoder, row))
                            .await
                            .map_err(|e| PrepError::Worker(e.to_string())),
                        Err(e) => Ok(RowAttempt::unreadable(e)),
                    }
                }
            })
            .buffered(jobs.max(1));
        futures::pin_mut!(attempts);

        let mut report = RunReport::default();
        while let Some(attempt) = attempts.next().await {
            self.settle(attempt?, writer, &mut report)?;
        }
        Ok(report)
    }

    fn settle<S: ContainerSink>(
        &self,
        attempt: RowAttempt,
        writer: &mut ContainerWriter<S>,
        report: &mut RunReport,
    ) -> PrepResult<()> {
        report.seen += 1;
        let RowAttempt { line, relative_path, outcome } = attempt;

        match outcome {
            Ok(record) => {
                writer.write(&record)?;
                report.written += 1;
                let index = writer.count() - 1;
                let relative_path = relative_path.unwrap_or_default();
                debug!(line, path = %relative_path, index, "row written");
                self.sink.on_event(PrepEvent::RowWritten { run_id: self.run_id.clone(), line, relative_path, index });
            }
            Err(error) => {
                let kind = error.kind();
                let message = error.to_string();
                warn!(line, path = relative_path.as_deref().unwrap_or("-"), %kind, "skipping row: {message}");

                report.skipped += 1;
                report.skips.push(SkippedRow {
                    line,
                    relative_path: relative_path.clone(),
                    kind,
                    stage: error.stage(),
                    message: message.clone(),
                });
                self.sink.on_event(PrepEvent::RowSkipped {
                    run_id: self.run_id.clone(),
                    line,
                    relative_path,
                    kind,
                    message,
                });
            }
        }
        Ok(())
    }
}
