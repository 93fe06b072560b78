use burn::{
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    prelude::*,
};
use std::sync::Arc;

use crate::data::batcher::{ChoiceBatch, ChoiceBatcher};

/// One question encoded as `num_choices` padded sequences.
/// Row i is: [CLS] stem [SEP] choice_i [SEP] [PAD]...
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceSample {
    pub input_ids:      Vec<Vec<u32>>,
    pub token_type_ids: Vec<Vec<u32>>,
    pub attention_mask: Vec<Vec<u32>>,
    /// None for unlabelled (test) questions.
    pub label:          Option<usize>,
}

impl ChoiceSample {
    pub fn num_choices(&self) -> usize {
        self.input_ids.len()
    }

    pub fn seq_len(&self) -> usize {
        self.input_ids.first().map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone)]
pub struct ChoiceDataset {
    samples: Arc<Vec<ChoiceSample>>,
}

impl ChoiceDataset {
    pub fn new(samples: Vec<ChoiceSample>) -> Self {
        Self { samples: Arc::new(samples) }
    }
}

impl Dataset<ChoiceSample> for ChoiceDataset {
    fn get(&self, index: usize) -> Option<ChoiceSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Backend-agnostic batch source handed from a data processor to the
/// controller. The controller turns it into a burn DataLoader on the
/// device and backend it trains or evaluates with.
#[derive(Debug, Clone)]
pub struct BatchSource {
    dataset:      ChoiceDataset,
    batch_size:   usize,
    shuffle_seed: Option<u64>,
}

impl BatchSource {
    pub fn new(dataset: ChoiceDataset, batch_size: usize, shuffle_seed: Option<u64>) -> Self {
        Self { dataset, batch_size, shuffle_seed }
    }

    pub fn num_examples(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle_seed.is_some()
    }

    /// Batches per pass over the data (the last batch may be short).
    pub fn num_batches(&self) -> usize {
        self.num_examples().div_ceil(self.batch_size.max(1))
    }

    pub fn build<B: Backend>(&self, device: &B::Device) -> Arc<dyn DataLoader<ChoiceBatch<B>>> {
        let builder = DataLoaderBuilder::new(ChoiceBatcher::<B>::new(device.clone()))
            .batch_size(self.batch_size)
            .num_workers(1);
        let builder = match self.shuffle_seed {
            Some(seed) => builder.shuffle(seed),
            None       => builder,
        };
        builder.build(self.dataset.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(label: Option<usize>) -> ChoiceSample {
        ChoiceSample {
            input_ids:      vec![vec![2, 5, 3, 0]; 3],
            token_type_ids: vec![vec![0, 0, 0, 0]; 3],
            attention_mask: vec![vec![1, 1, 1, 0]; 3],
            label,
        }
    }

    #[test]
    fn test_dataset_get_and_len() {
        let ds = ChoiceDataset::new(vec![sample(Some(1)), sample(None)]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(1).unwrap().label, None);
        assert!(ds.get(2).is_none());
    }

    #[test]
    fn test_batch_count_rounds_up() {
        let ds  = ChoiceDataset::new(vec![sample(Some(0)); 5]);
        let src = BatchSource::new(ds, 2, None);
        assert_eq!(src.num_batches(), 3);
        assert!(!src.is_shuffled());
    }

    #[test]
    fn test_sample_shape() {
        let s = sample(Some(0));
        assert_eq!(s.num_choices(), 3);
        assert_eq!(s.seq_len(), 4);
    }
}
