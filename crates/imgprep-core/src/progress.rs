use crate::error::RowErrorKind;
use crate::summary::PrepRunId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrepEvent {
    Started { run_id: PrepRunId, container: PathBuf },
    ManifestLoaded { run_id: PrepRunId, entries: Vec<(String, String)> },
    RowWritten { run_id: PrepRunId, line: u64, relative_path: String, index: u64 },
    RowSkipped { run_id: PrepRunId, line: u64, relative_path: Option<String>, kind: RowErrorKind, message: String },
    Finished { run_id: PrepRunId, seen: u64, written: u64, skipped: u64 },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: PrepEvent);
}

#[derive(Debug, Default)]
pub struct StdoutProgressSink;

impl ProgressSink for StdoutProgressSink {
    fn on_event(&self, event: PrepEvent) {
        match event {
            PrepEvent::Started { run_id, container } => {
                println!("[prep:{run_id}] writing {}", container.display());
            }
            PrepEvent::ManifestLoaded { run_id, entries } => {
                for (key, value) in entries {
                    println!("[prep:{run_id}] {key} => {value}");
                }
            }
            PrepEvent::RowWritten { run_id, line, relative_path, index } => {
                println!("[prep:{run_id}] line {line}: {relative_path} ok (record {index})");
            }
            PrepEvent::RowSkipped { run_id, line, relative_path, kind, message } => {
                let path = relative_path.as_deref().unwrap_or("-");
                println!("[prep:{run_id}] line {line}: {path} skipped ({kind}): {message}");
            }
            PrepEvent::Finished { run_id, seen, written, skipped } => {
                println!("[prep:{run_id}] finished: seen={seen} written={written} skipped={skipped}");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_event(&self, _event: PrepEvent) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct CollectingSink {
        pub events: Mutex<Vec<PrepEvent>>,
    }

    impl ProgressSink for CollectingSink {
        fn on_event(&self, event: PrepEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
