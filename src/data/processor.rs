// ============================================================
// Layer 4 - Data Processor
// ============================================================
// One processor per (task data source, split). It is the
// DataProcessor collaborator the orchestrator drives:
//
//   load_data()       → read the raw split, sample OMCS evidence
//   make_dataloader() → encode every (stem, choice) pair and
//                       wrap the samples in a BatchSource
//
// Origin tasks use the question and choice text only. OMCS
// tasks append up to cs_num supporting sentences to each
// choice; when a choice has more, cs_num of them are sampled
// with the run's seeded RNG and kept in their original order.

use rand::{rngs::StdRng, seq::index};
use std::path::PathBuf;

use crate::data::dataset::{BatchSource, ChoiceDataset, ChoiceSample};
use crate::data::loader::{split_file, JsonlLoader};
use crate::domain::config::{DatasetSplit, RunConfig};
use crate::domain::error::RunError;
use crate::domain::question::{Choice, McQuestion};
use crate::domain::task::ProcessorKind;
use crate::domain::traits::DataProcessor;
use crate::infra::tokenizer_store::PretrainedTokenizer;

pub struct McProcessor {
    kind:      ProcessorKind,
    split:     DatasetSplit,
    path:      PathBuf,
    cs_num:    usize,
    seed:      u64,
    rng:       StdRng,
    questions: Vec<McQuestion>,
}

impl McProcessor {
    pub fn new(kind: ProcessorKind, config: &RunConfig, split: DatasetSplit, rng: StdRng) -> Self {
        Self {
            kind,
            split,
            path: split_file(kind, &config.dataset_dir, split),
            cs_num: config.cs_num,
            seed: config.seed,
            rng,
            questions: Vec::new(),
        }
    }

    pub fn questions(&self) -> &[McQuestion] {
        &self.questions
    }

    /// Second segment of the pair for one choice.
    fn choice_text(&self, choice: &Choice) -> String {
        match self.kind {
            ProcessorKind::Omcs if !choice.evidence.is_empty() => {
                format!("{} {}", choice.text, choice.evidence.join(" "))
            }
            _ => choice.text.clone(),
        }
    }

    fn check(&self) -> Result<(), RunError> {
        let first = self
            .questions
            .first()
            .ok_or_else(|| RunError::data_load(&self.path, "split contains no questions"))?;

        let width = first.num_choices();
        if let Some(q) = self.questions.iter().find(|q| q.num_choices() != width) {
            return Err(RunError::data_load(
                &self.path,
                format!("question '{}' has {} choices, expected {}", q.id, q.num_choices(), width),
            ));
        }

        if self.split != DatasetSplit::Test {
            if let Some(q) = self.questions.iter().find(|q| q.answer.is_none()) {
                return Err(RunError::data_load(
                    &self.path,
                    format!("question '{}' has no answer key in the {} split", q.id, self.split.as_str()),
                ));
            }
        }
        Ok(())
    }
}

/// Keep at most `keep` sentences, sampled without replacement, original order.
fn sample_evidence(evidence: &mut Vec<String>, keep: usize, rng: &mut StdRng) {
    if evidence.len() <= keep {
        return;
    }
    let mut picked = index::sample(rng, evidence.len(), keep).into_vec();
    picked.sort_unstable();
    let kept: Vec<String> = picked.into_iter().map(|i| evidence[i].clone()).collect();
    *evidence = kept;
}

impl DataProcessor for McProcessor {
    type Tokenizer = PretrainedTokenizer;
    type Loader    = BatchSource;

    fn load_data(&mut self) -> Result<(), RunError> {
        tracing::info!(
            "Loading {} split ({:?}) from '{}'",
            self.split.as_str(),
            self.kind,
            self.path.display()
        );
        self.questions = JsonlLoader::new(&self.path).load_all()?;
        self.check()?;

        if self.kind == ProcessorKind::Omcs {
            for q in &mut self.questions {
                for choice in &mut q.choices {
                    sample_evidence(&mut choice.evidence, self.cs_num, &mut self.rng);
                }
            }
        }

        tracing::info!("Loaded {} {} questions", self.questions.len(), self.split.as_str());
        Ok(())
    }

    fn make_dataloader(
        &self,
        tokenizer:   &PretrainedTokenizer,
        batch_size:  usize,
        max_seq_len: usize,
        shuffle:     bool,
    ) -> Result<BatchSource, RunError> {
        if self.questions.is_empty() {
            return Err(RunError::data_load(&self.path, "no questions loaded before building batches"));
        }

        let mut samples = Vec::with_capacity(self.questions.len());
        for q in &self.questions {
            let mut sample = ChoiceSample {
                input_ids:      Vec::with_capacity(q.num_choices()),
                token_type_ids: Vec::with_capacity(q.num_choices()),
                attention_mask: Vec::with_capacity(q.num_choices()),
                label:          q.answer,
            };
            for choice in &q.choices {
                let enc = tokenizer
                    .encode_pair(&q.stem, &self.choice_text(choice), max_seq_len)
                    .map_err(|e| RunError::data_load(&self.path, format!("question '{}': {e}", q.id)))?;
                sample.input_ids.push(enc.input_ids);
                sample.token_type_ids.push(enc.token_type_ids);
                sample.attention_mask.push(enc.attention_mask);
            }
            samples.push(sample);
        }

        let shuffle_seed = shuffle.then_some(self.seed);
        tracing::debug!(
            "Encoded {} {} questions (batch_size={}, max_seq_len={}, shuffle={})",
            samples.len(),
            self.split.as_str(),
            batch_size,
            max_seq_len,
            shuffle
        );
        Ok(BatchSource::new(ChoiceDataset::new(samples), batch_size, shuffle_seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::TokenizerFamily;
    use crate::infra::tokenizer_store::write_test_vocab;
    use rand::SeedableRng;
    use std::{fs, path::Path};

    fn record(id: &str, answer: Option<&str>, evidence: &[&str]) -> String {
        let key = answer.map(|a| format!(r#""answerKey": "{a}", "#)).unwrap_or_default();
        let ev  = serde_json::to_string(evidence).unwrap();
        format!(
            r#"{{{key}"id": "{id}", "question": {{"stem": "where is the milk", "choices": [{{"label": "A", "text": "oven", "evidence": {ev}}}, {{"label": "B", "text": "fridge", "evidence": {ev}}}]}}}}"#
        )
    }

    fn config(dataset_dir: &Path, cs_num: usize) -> RunConfig {
        RunConfig {
            dataset_dir: dataset_dir.to_path_buf(),
            cs_num,
            ..RunConfig::default()
        }
    }

    fn write_split(root: &Path, kind: ProcessorKind, split: DatasetSplit, lines: &[String]) {
        let path = split_file(kind, root, split);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, lines.join("\n")).unwrap();
    }

    #[test]
    fn test_omcs_keeps_cs_num_sentences() {
        let tmp = tempfile::tempdir().unwrap();
        let evidence = ["s one", "s two", "s three", "s four"];
        write_split(tmp.path(), ProcessorKind::Omcs, DatasetSplit::Train, &[record("q1", Some("B"), &evidence)]);

        let mut p = McProcessor::new(
            ProcessorKind::Omcs,
            &config(tmp.path(), 2),
            DatasetSplit::Train,
            StdRng::seed_from_u64(7),
        );
        p.load_data().unwrap();

        let kept = &p.questions()[0].choices[0].evidence;
        assert_eq!(kept.len(), 2);
        // original relative order survives sampling
        let pos: Vec<usize> = kept
            .iter()
            .map(|s| evidence.iter().position(|e| e == s).unwrap())
            .collect();
        assert!(pos[0] < pos[1]);
    }

    #[test]
    fn test_evidence_sampling_is_seeded() {
        let tmp = tempfile::tempdir().unwrap();
        let evidence = ["a", "b", "c", "d", "e", "f"];
        write_split(tmp.path(), ProcessorKind::Omcs, DatasetSplit::Dev, &[record("q1", Some("A"), &evidence)]);

        let run = || {
            let mut p = McProcessor::new(
                ProcessorKind::Omcs,
                &config(tmp.path(), 3),
                DatasetSplit::Dev,
                StdRng::seed_from_u64(42),
            );
            p.load_data().unwrap();
            p.questions()[0].choices[1].evidence.clone()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_train_split_requires_answers() {
        let tmp = tempfile::tempdir().unwrap();
        write_split(tmp.path(), ProcessorKind::Baseline, DatasetSplit::Train, &[record("q1", None, &[])]);

        let mut p = McProcessor::new(
            ProcessorKind::Baseline,
            &config(tmp.path(), 0),
            DatasetSplit::Train,
            StdRng::seed_from_u64(0),
        );
        assert!(matches!(p.load_data(), Err(RunError::DataLoad { .. })));
    }

    #[test]
    fn test_missing_split_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut p = McProcessor::new(
            ProcessorKind::Baseline,
            &config(tmp.path(), 0),
            DatasetSplit::Dev,
            StdRng::seed_from_u64(0),
        );
        let err = p.load_data().unwrap_err();
        assert!(err.to_string().contains("dev_rand_split.jsonl"));
    }

    #[test]
    fn test_make_dataloader_encodes_every_choice() {
        let tmp   = tempfile::tempdir().unwrap();
        let vocab = tmp.path().join("bert-base");
        write_test_vocab(&vocab, TokenizerFamily::Bert, &["where", "is", "the", "milk", "oven", "fridge"]);
        let tokenizer = PretrainedTokenizer::from_pretrained(TokenizerFamily::Bert, &vocab).unwrap();

        write_split(
            tmp.path(),
            ProcessorKind::Baseline,
            DatasetSplit::Test,
            &[record("q1", None, &[]), record("q2", None, &[])],
        );
        let mut p = McProcessor::new(
            ProcessorKind::Baseline,
            &config(tmp.path(), 0),
            DatasetSplit::Test,
            StdRng::seed_from_u64(0),
        );
        p.load_data().unwrap();

        let source = p.make_dataloader(&tokenizer, 4, 16, false).unwrap();
        assert_eq!(source.num_examples(), 2);
        assert_eq!(source.num_batches(), 1);
        assert!(!source.is_shuffled());
    }

    #[test]
    fn test_make_dataloader_before_load_fails() {
        let tmp   = tempfile::tempdir().unwrap();
        let vocab = tmp.path().join("bert-base");
        write_test_vocab(&vocab, TokenizerFamily::Bert, &["milk"]);
        let tokenizer = PretrainedTokenizer::from_pretrained(TokenizerFamily::Bert, &vocab).unwrap();

        let p = McProcessor::new(
            ProcessorKind::Baseline,
            &config(tmp.path(), 0),
            DatasetSplit::Dev,
            StdRng::seed_from_u64(0),
        );
        assert!(p.make_dataloader(&tokenizer, 4, 16, false).is_err());
    }
}
