//! Atomic JSON persistence of run results.
//!
//! All files are written to a temp file in the output directory and
//! renamed into place, so an interrupt never leaves a torn document.
//! Intermediate and partial files are named by the number of completed
//! sentences and are never rewritten.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{json, Map, Value};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::domain::{ItemResult, RunState, Statistics};

/// A checkpoint or result write failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Writes checkpoint and result documents for one run.
pub struct CheckpointWriter {
    output_dir: PathBuf,
    stage_names: Vec<String>,
    results_filename: String,
    config_snapshot: Value,
}

impl CheckpointWriter {
    /// Create a writer for the given output directory.
    ///
    /// `stage_names` drive the per-stage field names in sentence
    /// objects; `config_snapshot` is embedded in final metadata.
    pub fn new(
        output_dir: PathBuf,
        stage_names: Vec<String>,
        results_filename: String,
        config_snapshot: Value,
    ) -> Self {
        Self {
            output_dir,
            stage_names,
            results_filename,
            config_snapshot,
        }
    }

    /// The directory this writer targets
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write a periodic checkpoint of everything completed so far.
    pub fn write_intermediate(&self, results: &[ItemResult]) -> Result<PathBuf, PersistenceError> {
        let document = json!({
            "processed_count": results.len(),
            "timestamp": Utc::now().to_rfc3339(),
            "sentences": self.sentences_json(results),
        });

        self.write_atomic(
            &format!("intermediate_results_{}.json", results.len()),
            &document,
        )
    }

    /// Write the partial result file for an aborted run.
    pub fn write_partial(
        &self,
        state: &RunState,
        expected: usize,
        reason: &str,
    ) -> Result<PathBuf, PersistenceError> {
        let statistics = Statistics::from_distances(&state.distances());

        let document = json!({
            "metadata": {
                "status": "PARTIAL",
                "reason": reason,
                "run_id": state.run_id,
                "timestamp": Utc::now().to_rfc3339(),
                "sentences_processed": state.results.len(),
                "sentences_expected": expected,
            },
            "statistics": statistics,
            "sentences": self.sentences_json(&state.results),
        });

        self.write_atomic(
            &format!("partial_results_{}_sentences.json", state.results.len()),
            &document,
        )
    }

    /// Write the complete result file after a successful run.
    pub fn write_final(
        &self,
        state: &RunState,
        statistics: &Statistics,
    ) -> Result<PathBuf, PersistenceError> {
        let duration_seconds = state
            .ended_at
            .map(|end| (end - state.started_at).num_milliseconds() as f64 / 1000.0);

        let document = json!({
            "metadata": {
                "run_id": state.run_id,
                "timestamp": Utc::now().to_rfc3339(),
                "total_sentences": state.results.len(),
                "start_time": state.started_at.to_rfc3339(),
                "end_time": state.ended_at.map(|t| t.to_rfc3339()),
                "duration_seconds": duration_seconds,
                "config": self.config_snapshot,
            },
            "statistics": statistics,
            "sentences": self.sentences_json(&state.results),
        });

        self.write_atomic(&self.results_filename, &document)
    }

    fn sentences_json(&self, results: &[ItemResult]) -> Vec<Value> {
        results.iter().map(|item| self.sentence_json(item)).collect()
    }

    /// Build one sentence object: per-stage `<name>_translation` fields
    /// for every hop except the last, which becomes `final_sentence`.
    fn sentence_json(&self, item: &ItemResult) -> Value {
        let mut object = Map::new();
        object.insert("index".to_string(), json!(item.index));
        object.insert("original_sentence".to_string(), json!(item.original));

        let last = item.stage_outputs.len().saturating_sub(1);
        for (i, output) in item.stage_outputs.iter().enumerate() {
            if i == last {
                break;
            }
            let name = self
                .stage_names
                .get(i)
                .map(String::as_str)
                .unwrap_or("stage");
            object.insert(format!("{name}_translation"), json!(output));
        }

        object.insert("final_sentence".to_string(), json!(item.final_sentence()));
        object.insert("cosine_distance".to_string(), json!(item.cosine_distance));
        object.insert(
            "processing_time".to_string(),
            json!(item.processing_time.as_secs_f64()),
        );
        object.insert(
            "timestamp".to_string(),
            json!(item.timestamp.to_rfc3339()),
        );

        Value::Object(object)
    }

    fn write_atomic(&self, filename: &str, document: &Value) -> Result<PathBuf, PersistenceError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| {
            PersistenceError::CreateDir {
                path: self.output_dir.clone(),
                source,
            }
        })?;

        let path = self.output_dir.join(filename);

        let mut file = NamedTempFile::new_in(&self.output_dir).map_err(|source| {
            PersistenceError::Write {
                path: path.clone(),
                source,
            }
        })?;

        serde_json::to_writer_pretty(&mut file, document)?;

        file.persist(&path).map_err(|err| PersistenceError::Write {
            path: path.clone(),
            source: err.error,
        })?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn item(index: usize) -> ItemResult {
        ItemResult {
            index,
            original: format!("original {index}"),
            stage_outputs: vec![
                format!("russian {index}"),
                format!("hebrew {index}"),
                format!("english {index}"),
            ],
            cosine_distance: 0.1 * index as f64,
            processing_time: Duration::from_millis(1500),
            timestamp: Utc::now(),
        }
    }

    fn writer(dir: &TempDir) -> CheckpointWriter {
        CheckpointWriter::new(
            dir.path().to_path_buf(),
            vec![
                "russian".to_string(),
                "hebrew".to_string(),
                "english".to_string(),
            ],
            "translation_results.json".to_string(),
            json!({"num_sentences": 2}),
        )
    }

    #[test]
    fn test_sentence_object_field_names() {
        let dir = TempDir::new().unwrap();
        let value = writer(&dir).sentence_json(&item(1));
        let object = value.as_object().unwrap();

        assert_eq!(object["index"], 1);
        assert_eq!(object["original_sentence"], "original 1");
        assert_eq!(object["russian_translation"], "russian 1");
        assert_eq!(object["hebrew_translation"], "hebrew 1");
        assert_eq!(object["final_sentence"], "english 1");
        assert!(!object.contains_key("english_translation"));
        assert_eq!(object["processing_time"], 1.5);
    }

    #[test]
    fn test_intermediate_file_naming_and_content() {
        let dir = TempDir::new().unwrap();
        let results = vec![item(1), item(2)];

        let path = writer(&dir).write_intermediate(&results).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "intermediate_results_2.json"
        );

        let document: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document["processed_count"], 2);
        assert_eq!(document["sentences"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_partial_file_carries_status_and_counts() {
        let dir = TempDir::new().unwrap();
        let mut state = RunState::new();
        state.results = vec![item(1), item(2)];

        let path = writer(&dir)
            .write_partial(&state, 5, "stage 'second' gave up")
            .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "partial_results_2_sentences.json"
        );

        let document: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document["metadata"]["status"], "PARTIAL");
        assert_eq!(document["metadata"]["sentences_processed"], 2);
        assert_eq!(document["metadata"]["sentences_expected"], 5);
        assert!(document["statistics"]["mean"].is_f64());
    }

    #[test]
    fn test_final_file_metadata() {
        let dir = TempDir::new().unwrap();
        let mut state = RunState::new();
        state.results = vec![item(1)];
        state.ended_at = Some(state.started_at + chrono::Duration::seconds(30));

        let statistics = Statistics::from_distances(&state.distances()).unwrap();
        let path = writer(&dir).write_final(&state, &statistics).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "translation_results.json"
        );

        let document: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document["metadata"]["total_sentences"], 1);
        assert_eq!(document["metadata"]["duration_seconds"], 30.0);
        assert_eq!(document["metadata"]["config"]["num_sentences"], 2);
        assert!(document["statistics"]["median"].is_f64());
    }
}
