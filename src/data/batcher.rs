// ============================================================
// Layer 4 - Multiple-Choice Batcher
// ============================================================
// Implements Burn's Batcher trait: stacks N ChoiceSamples,
// each holding C sequences of length S, into tensors of shape
// [N, C, S]. Every sample in a split has the same C and S (the
// data processor checks C, the tokenizer pads S), so the flat
// buffers reshape directly.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::ChoiceSample;

#[derive(Debug, Clone)]
pub struct ChoiceBatch<B: Backend> {
    /// [batch, choices, seq_len]
    pub input_ids:      Tensor<B, 3, Int>,
    /// [batch, choices, seq_len]
    pub token_type_ids: Tensor<B, 3, Int>,
    /// [batch, choices, seq_len]; 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 3, Int>,
    /// [batch]; 0 for unlabelled questions
    pub labels:         Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct ChoiceBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ChoiceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn stack(&self, rows: Vec<i32>, shape: [usize; 3]) -> Tensor<B, 3, Int> {
        Tensor::<B, 1, Int>::from_ints(rows.as_slice(), &self.device).reshape(shape)
    }
}

fn flatten(items: &[ChoiceSample], field: impl Fn(&ChoiceSample) -> &Vec<Vec<u32>>) -> Vec<i32> {
    items
        .iter()
        .flat_map(|s| field(s).iter().flatten().map(|&x| x as i32))
        .collect()
}

impl<B: Backend> Batcher<ChoiceSample, ChoiceBatch<B>> for ChoiceBatcher<B> {
    fn batch(&self, items: Vec<ChoiceSample>) -> ChoiceBatch<B> {
        let shape = [items.len(), items[0].num_choices(), items[0].seq_len()];

        let input_ids      = self.stack(flatten(&items, |s| &s.input_ids), shape);
        let token_type_ids = self.stack(flatten(&items, |s| &s.token_type_ids), shape);
        let attention_mask = self.stack(flatten(&items, |s| &s.attention_mask), shape);

        let labels: Vec<i32> = items
            .iter()
            .map(|s| s.label.unwrap_or(0) as i32)
            .collect();
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ChoiceBatch { input_ids, token_type_ids, attention_mask, labels }
    }
}
