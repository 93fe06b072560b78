// ============================================================
// Layer 5 - Multiple-Choice Model
// ============================================================
// A transformer encoder scores every (question, choice) pair;
// the scores of one question's choices form its logits.
//
//   input [batch, choices, seq] → [batch*choices, seq]
//     → token + position + segment embeddings
//     → N encoder blocks (padding masked)
//     → pooling head (per architecture)
//     → linear scorer → [batch, choices]
//
// Pooling heads:
//   AlbertBaseline - [CLS] state
//   AlbertCsqa     - attention-weighted merge of token states
//   AlbertAddTfm   - one more encoder block, then attention merge
//   BertAttRanker  - [CLS] state ++ merge over tanh-projected keys
//
// Reference: Burn Book §3 (Building Blocks)
//            Devlin et al. (2019) BERT, Lan et al. (2020) ALBERT

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{gelu, softmax, tanh},
};

use crate::domain::task::ModelArchitecture;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct MultipleChoiceConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    #[config(default = 256)]
    pub d_model:     usize,
    #[config(default = 4)]
    pub num_heads:   usize,
    #[config(default = 4)]
    pub num_layers:  usize,
    #[config(default = 1024)]
    pub d_ff:        usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
    #[config(default = 2)]
    pub type_vocab:  usize,
}

impl MultipleChoiceConfig {
    pub fn init<B: Backend>(
        &self,
        architecture: ModelArchitecture,
        device:       &B::Device,
    ) -> MultipleChoiceModel<B> {
        let layers = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();

        let uses_merge = !matches!(architecture, ModelArchitecture::AlbertBaseline);
        let attn_query = uses_merge.then(|| LinearConfig::new(self.d_model, 1).init(device));
        let extra_block = matches!(architecture, ModelArchitecture::AlbertAddTfm)
            .then(|| self.build_encoder_block(device));
        let rank_proj = matches!(architecture, ModelArchitecture::BertAttRanker)
            .then(|| LinearConfig::new(self.d_model, self.d_model).init(device));

        let scorer_in = if rank_proj.is_some() { 2 * self.d_model } else { self.d_model };

        MultipleChoiceModel {
            token_embedding:    EmbeddingConfig::new(self.vocab_size, self.d_model).init(device),
            position_embedding: EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device),
            type_embedding:     EmbeddingConfig::new(self.type_vocab, self.d_model).init(device),
            embed_norm:         LayerNormConfig::new(self.d_model).init(device),
            layers,
            extra_block,
            attn_query,
            rank_proj,
            scorer:             LinearConfig::new(scorer_in, 1).init(device),
            dropout:            DropoutConfig::new(self.dropout).init(),
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        EncoderBlock {
            self_attn:   MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
                .with_dropout(self.dropout)
                .init(device),
            ffn_linear1: LinearConfig::new(self.d_model, self.d_ff).init(device),
            ffn_linear2: LinearConfig::new(self.d_ff, self.d_model).init(device),
            norm1:       LayerNormConfig::new(self.d_model).init(device),
            norm2:       LayerNormConfig::new(self.d_model).init(device),
            dropout:     DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// `pad`: [n, seq], true at padding positions.
    pub fn forward(&self, x: Tensor<B, 3>, pad: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn = self
            .self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_pad(pad))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(attn));
        let ffn = self.ffn_linear2.forward(gelu(self.ffn_linear1.forward(x.clone())));
        self.norm2.forward(x + self.dropout.forward(ffn))
    }
}

#[derive(Module, Debug)]
pub struct MultipleChoiceModel<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub type_embedding:     Embedding<B>,
    pub embed_norm:         LayerNorm<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub extra_block:        Option<EncoderBlock<B>>,
    pub attn_query:         Option<Linear<B>>,
    pub rank_proj:          Option<Linear<B>>,
    pub scorer:             Linear<B>,
    pub dropout:            Dropout,
}

impl<B: Backend> MultipleChoiceModel<B> {
    /// All inputs [batch, choices, seq] → logits [batch, choices].
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 3, Int>,
        token_type_ids: Tensor<B, 3, Int>,
        attention_mask: Tensor<B, 3, Int>,
    ) -> Tensor<B, 2> {
        let [batch, choices, seq] = input_ids.dims();
        let n = batch * choices;

        let ids   = input_ids.reshape([n, seq]);
        let types = token_type_ids.reshape([n, seq]);
        let pad   = attention_mask.reshape([n, seq]).equal_elem(0);

        let hidden = self.encode(ids, types, pad.clone());
        let hidden = match &self.extra_block {
            Some(block) => block.forward(hidden, pad.clone()),
            None        => hidden,
        };

        let pooled = match &self.attn_query {
            None => cls_state(hidden),
            Some(query) => {
                let merged = attention_merge(hidden.clone(), pad, query, self.rank_proj.as_ref());
                if self.rank_proj.is_some() {
                    Tensor::cat(vec![cls_state(hidden), merged], 1)
                } else {
                    merged
                }
            }
        };

        self.scorer
            .forward(self.dropout.forward(pooled))
            .reshape([batch, choices])
    }

    /// Cross-entropy over the choices of each question.
    pub fn forward_loss(
        &self,
        input_ids:      Tensor<B, 3, Int>,
        token_type_ids: Tensor<B, 3, Int>,
        attention_mask: Tensor<B, 3, Int>,
        labels:         Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(input_ids, token_type_ids, attention_mask);
        let ce = CrossEntropyLossConfig::new().init(&logits.device());
        (ce.forward(logits.clone(), labels), logits)
    }

    fn encode(
        &self,
        ids:   Tensor<B, 2, Int>,
        types: Tensor<B, 2, Int>,
        pad:   Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let [n, seq] = ids.dims();
        let device = ids.device();

        let positions = Tensor::<B, 1, Int>::arange(0..seq as i64, &device)
            .unsqueeze::<2>()
            .expand([n, seq]);

        let x = self.token_embedding.forward(ids)
            + self.position_embedding.forward(positions)
            + self.type_embedding.forward(types);
        let mut x = self.dropout.forward(self.embed_norm.forward(x));

        for layer in &self.layers {
            x = layer.forward(x, pad.clone());
        }
        x
    }
}

fn cls_state<B: Backend>(hidden: Tensor<B, 3>) -> Tensor<B, 2> {
    let [n, _, d] = hidden.dims();
    hidden.slice([0..n, 0..1, 0..d]).reshape([n, d])
}

/// Softmax-weighted sum of token states; padding gets no weight.
fn attention_merge<B: Backend>(
    hidden: Tensor<B, 3>,
    pad:    Tensor<B, 2, Bool>,
    query:  &Linear<B>,
    proj:   Option<&Linear<B>>,
) -> Tensor<B, 2> {
    let [n, seq, d] = hidden.dims();

    let keys = match proj {
        Some(p) => tanh(p.forward(hidden.clone())),
        None    => hidden.clone(),
    };
    let scores  = query.forward(keys).reshape([n, seq]).mask_fill(pad, -1.0e4);
    let weights = softmax(scores, 1).unsqueeze_dim::<3>(2).expand([n, seq, d]);

    (hidden * weights).sum_dim(1).reshape([n, d])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn inputs(batch: usize, choices: usize, seq: usize) -> [Tensor<TestBackend, 3, Int>; 3] {
        let device = Default::default();
        let n = batch * choices * seq;
        let ids: Vec<i32> = (0..n).map(|i| (i % 7) as i32 + 1).collect();
        let mask: Vec<i32> = (0..n).map(|i| if i % seq < seq - 1 { 1 } else { 0 }).collect();
        let zeros = vec![0i32; n];
        let shape = [batch, choices, seq];
        [
            Tensor::<TestBackend, 1, Int>::from_ints(ids.as_slice(), &device).reshape(shape),
            Tensor::<TestBackend, 1, Int>::from_ints(zeros.as_slice(), &device).reshape(shape),
            Tensor::<TestBackend, 1, Int>::from_ints(mask.as_slice(), &device).reshape(shape),
        ]
    }

    fn small_config() -> MultipleChoiceConfig {
        MultipleChoiceConfig::new(16, 8)
            .with_d_model(16)
            .with_num_heads(2)
            .with_num_layers(1)
            .with_d_ff(32)
            .with_dropout(0.0)
    }

    #[test]
    fn test_every_architecture_scores_each_choice() {
        let device = Default::default();
        for arch in [
            ModelArchitecture::AlbertBaseline,
            ModelArchitecture::AlbertCsqa,
            ModelArchitecture::AlbertAddTfm,
            ModelArchitecture::BertAttRanker,
        ] {
            let model = small_config().init::<TestBackend>(arch, &device);
            let [ids, types, mask] = inputs(2, 3, 8);
            let logits = model.forward(ids, types, mask);
            assert_eq!(logits.dims(), [2, 3], "{arch:?}");
        }
    }

    #[test]
    fn test_heads_match_architecture() {
        let device = Default::default();
        let base   = small_config().init::<TestBackend>(ModelArchitecture::AlbertBaseline, &device);
        assert!(base.attn_query.is_none() && base.extra_block.is_none());

        let tfm = small_config().init::<TestBackend>(ModelArchitecture::AlbertAddTfm, &device);
        assert!(tfm.attn_query.is_some() && tfm.extra_block.is_some());

        let ranker = small_config().init::<TestBackend>(ModelArchitecture::BertAttRanker, &device);
        assert!(ranker.rank_proj.is_some());
    }

    #[test]
    fn test_loss_is_finite() {
        let device = Default::default();
        let model  = small_config().init::<TestBackend>(ModelArchitecture::AlbertCsqa, &device);
        let [ids, types, mask] = inputs(2, 3, 8);
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([0, 2], &device);
        let (loss, _) = model.forward_loss(ids, types, mask, labels);
        let value: f64 = loss.into_scalar().elem::<f64>();
        assert!(value.is_finite() && value > 0.0);
    }
}
