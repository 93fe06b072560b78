// ============================================================
// Layer 4 - Raw Split Loader
// ============================================================
// Reads one dataset split stored as JSON lines in the
// CommonsenseQA layout:
//
//   {"answerKey": "A",
//    "id": "075e483d21c29a511267ef62bedc0461",
//    "question": {"stem": "The sanctions against the school were ...",
//                 "choices": [{"label": "A", "text": "ignore",
//                              "evidence": ["..."]}, ...]}}
//
// "answerKey" is absent in test files. "evidence" only appears
// in the OMCS-augmented files and defaults to empty.
//
// Unlike a best-effort corpus reader, every problem here is
// fatal: a missing file, an unparsable line or an answer key
// that names no choice stops the run with the file and line.

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::preprocessor::Preprocessor;
use crate::domain::config::DatasetSplit;
use crate::domain::error::RunError;
use crate::domain::question::{Choice, McQuestion};
use crate::domain::task::ProcessorKind;

#[derive(Debug, Deserialize)]
struct RawRecord {
    id:         String,
    #[serde(rename = "answerKey", default)]
    answer_key: Option<String>,
    question:   RawQuestion,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    stem:    String,
    choices: Vec<Choice>,
}

/// Location of a split's raw file under the dataset root.
pub fn split_file(kind: ProcessorKind, dataset_dir: &Path, split: DatasetSplit) -> PathBuf {
    match kind {
        ProcessorKind::Baseline => {
            let name = match split {
                DatasetSplit::Train => "train_rand_split.jsonl",
                DatasetSplit::Dev   => "dev_rand_split.jsonl",
                DatasetSplit::Test  => "test_rand_split_no_answers.jsonl",
            };
            dataset_dir.join("csqa").join(name)
        }
        ProcessorKind::Omcs => dataset_dir
            .join("omcs")
            .join(format!("{}_omcs.jsonl", split.as_str())),
    }
}

pub struct JsonlLoader {
    path:         PathBuf,
    preprocessor: Preprocessor,
}

impl JsonlLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), preprocessor: Preprocessor::new() }
    }

    /// Parse every non-blank line into a question.
    pub fn load_all(&self) -> Result<Vec<McQuestion>, RunError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| RunError::data_load(&self.path, e))?;

        let mut questions = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: RawRecord = serde_json::from_str(line)
                .map_err(|e| RunError::data_load(&self.path, format!("line {}: {e}", idx + 1)))?;
            questions.push(self.to_question(record, idx + 1)?);
        }

        tracing::debug!("Parsed {} records from '{}'", questions.len(), self.path.display());
        Ok(questions)
    }

    fn to_question(&self, record: RawRecord, line_no: usize) -> Result<McQuestion, RunError> {
        let choices: Vec<Choice> = record
            .question
            .choices
            .into_iter()
            .map(|c| Choice {
                label:    c.label.trim().to_string(),
                text:     self.preprocessor.clean(&c.text),
                evidence: self.preprocessor.clean_all(&c.evidence),
            })
            .collect();

        if choices.is_empty() {
            return Err(RunError::data_load(
                &self.path,
                format!("line {line_no}: question '{}' has no choices", record.id),
            ));
        }

        let mut question = McQuestion {
            id:     record.id,
            stem:   self.preprocessor.clean(&record.question.stem),
            choices,
            answer: None,
        };

        if let Some(key) = record.answer_key {
            let key = key.trim();
            let idx = question.index_of_label(key).ok_or_else(|| {
                RunError::data_load(
                    &self.path,
                    format!("line {line_no}: answer key '{key}' matches no choice of '{}'", question.id),
                )
            })?;
            question.answer = Some(idx);
        }

        Ok(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{"answerKey": "B", "id": "q1", "question": {"stem": "Where  is milk kept?", "choices": [{"label": "A", "text": "oven"}, {"label": "B", "text": "fridge", "evidence": ["milk is kept in a fridge", " "]}]}}"#;

    fn write(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("split.jsonl");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_parses_record() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), &format!("{RECORD}\n\n"));
        let qs   = JsonlLoader::new(path).load_all().unwrap();

        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].stem, "Where is milk kept?");
        assert_eq!(qs[0].answer, Some(1));
        assert_eq!(qs[0].choices[1].evidence, vec!["milk is kept in a fridge".to_string()]);
        assert!(qs[0].choices[0].evidence.is_empty());
    }

    #[test]
    fn test_unlabelled_record() {
        let tmp  = tempfile::tempdir().unwrap();
        let line = RECORD.replace(r#""answerKey": "B", "#, "");
        let path = write(tmp.path(), &line);
        let qs   = JsonlLoader::new(path).load_all().unwrap();
        assert_eq!(qs[0].answer, None);
    }

    #[test]
    fn test_missing_file_is_data_load_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = JsonlLoader::new(tmp.path().join("nope.jsonl")).load_all().unwrap_err();
        assert!(matches!(err, RunError::DataLoad { .. }));
    }

    #[test]
    fn test_malformed_line_names_line_number() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), &format!("{RECORD}\n{{not json\n"));
        let err  = JsonlLoader::new(path).load_all().unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_bad_answer_key() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), &RECORD.replace(r#""answerKey": "B""#, r#""answerKey": "E""#));
        let err  = JsonlLoader::new(path).load_all().unwrap_err();
        assert!(err.to_string().contains("answer key 'E'"));
    }

    #[test]
    fn test_split_file_layout() {
        let root = Path::new("/data");
        assert_eq!(
            split_file(ProcessorKind::Baseline, root, DatasetSplit::Test),
            PathBuf::from("/data/csqa/test_rand_split_no_answers.jsonl")
        );
        assert_eq!(
            split_file(ProcessorKind::Omcs, root, DatasetSplit::Dev),
            PathBuf::from("/data/omcs/dev_omcs.jsonl")
        );
    }
}
