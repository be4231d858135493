//! Persistence sinks for run summaries and module metric rows
//!
//! Both sinks are append-only. `JsonlRunSink` writes one JSON object per line
//! under a data directory; `InMemoryRunSink` keeps everything in process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{component_debug, component_warn, ComponentId, ModuleMetricRow, RunSummary, Vertical};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::RunSink;

fn matches(summary: &RunSummary, vertical: Option<&Vertical>, since: DateTime<Utc>) -> bool {
    summary.finished_at >= since && vertical.map_or(true, |v| &summary.vertical == v)
}

/// Process-local sink, used in tests and when no data directory is configured
#[derive(Debug, Default)]
pub struct InMemoryRunSink {
    runs: Mutex<Vec<RunSummary>>,
    metrics: Mutex<Vec<ModuleMetricRow>>,
}

impl InMemoryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn module_metrics(&self) -> Vec<ModuleMetricRow> {
        self.metrics.lock().await.clone()
    }

    pub async fn run_count(&self) -> usize {
        self.runs.lock().await.len()
    }
}

#[async_trait]
impl RunSink for InMemoryRunSink {
    async fn append_run(&self, summary: &RunSummary) -> OrchestratorResult<()> {
        self.runs.lock().await.push(summary.clone());
        Ok(())
    }

    async fn append_module_metrics(&self, rows: &[ModuleMetricRow]) -> OrchestratorResult<()> {
        self.metrics.lock().await.extend_from_slice(rows);
        Ok(())
    }

    async fn load_runs(&self, vertical: Option<Vertical>, since: DateTime<Utc>) -> OrchestratorResult<Vec<RunSummary>> {
        let runs = self.runs.lock().await;
        Ok(runs
            .iter()
            .filter(|summary| matches(summary, vertical.as_ref(), since))
            .cloned()
            .collect())
    }
}

/// Append-only JSON Lines sink
pub struct JsonlRunSink {
    base_dir: PathBuf,
    /// Serializes appends so concurrent runs never interleave lines
    write_lock: Mutex<()>,
}

impl JsonlRunSink {
    /// Sink writing under `./data`
    pub fn new() -> Self {
        Self::with_base_dir(PathBuf::from("./data"))
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            write_lock: Mutex::new(()),
        }
    }

    pub fn runs_path(&self) -> PathBuf {
        self.base_dir.join("runs.jsonl")
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.base_dir.join("module_metrics.jsonl")
    }

    async fn append_lines(&self, path: &Path, lines: Vec<String>) -> OrchestratorResult<()> {
        if lines.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;

        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| OrchestratorError::persistence(format!("create {}", self.base_dir.display()), e))?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| OrchestratorError::persistence(format!("open {}", path.display()), e))?;

        let mut buffer = String::new();
        if !ends_with_newline(&mut file)
            .await
            .map_err(|e| OrchestratorError::persistence(format!("inspect {}", path.display()), e))?
        {
            // Terminate a torn line so the new records start on their own lines
            buffer.push('\n');
        }
        for line in lines {
            buffer.push_str(&line);
            buffer.push('\n');
        }

        file.write_all(buffer.as_bytes())
            .await
            .map_err(|e| OrchestratorError::persistence(format!("append {}", path.display()), e))?;
        file.flush()
            .await
            .map_err(|e| OrchestratorError::persistence(format!("flush {}", path.display()), e))?;

        Ok(())
    }
}

/// True for an empty file or one whose last byte is a newline
async fn ends_with_newline(file: &mut fs::File) -> std::io::Result<bool> {
    if file.metadata().await?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}

impl Default for JsonlRunSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunSink for JsonlRunSink {
    async fn append_run(&self, summary: &RunSummary) -> OrchestratorResult<()> {
        let line = serde_json::to_string(summary)?;
        self.append_lines(&self.runs_path(), vec![line]).await?;
        component_debug!(
            ComponentId::Recorder,
            "💾 Appended run {} for '{}' to {}",
            summary.run_id,
            summary.vertical,
            self.runs_path().display()
        );
        Ok(())
    }

    async fn append_module_metrics(&self, rows: &[ModuleMetricRow]) -> OrchestratorResult<()> {
        let lines = rows
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        self.append_lines(&self.metrics_path(), lines).await
    }

    async fn load_runs(&self, vertical: Option<Vertical>, since: DateTime<Utc>) -> OrchestratorResult<Vec<RunSummary>> {
        let path = self.runs_path();
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(OrchestratorError::persistence(format!("read {}", path.display()), e)),
        };

        // A crash mid-append leaves a torn line; skip it rather than lose the history
        let mut runs = Vec::new();
        for (index, line) in content.lines().enumerate().filter(|(_, line)| !line.trim().is_empty()) {
            let summary: RunSummary = match serde_json::from_str(line) {
                Ok(summary) => summary,
                Err(e) => {
                    component_warn!(
                        ComponentId::Recorder,
                        "⚠️ Skipping malformed line {} in {}: {}",
                        index + 1,
                        path.display(),
                        e
                    );
                    continue;
                }
            };
            if matches(&summary, vertical.as_ref(), since) {
                runs.push(summary);
            }
        }
        Ok(runs)
    }
}
