// ============================================================
// Layer 6 - Tokenizer Store
// ============================================================
// Loads the pretrained tokenizer shipped in a vocabulary
// directory (<vocab_dir>/tokenizer.json, HuggingFace format)
// and encodes (question, choice) pairs into fixed-length model
// inputs:
//
//   [CLS] question [SEP] choice [SEP] [PAD] ...
//    0     0...0    0    1...1   1     0
//                                      └ token type ids
//
// Special tokens are looked up by the family's spelling, so a
// vocabulary missing any of them is rejected at load time
// instead of producing silently wrong ids later.

use anyhow::{anyhow, Result};
use std::path::Path;
use tokenizers::Tokenizer;

use crate::domain::error::RunError;
use crate::domain::task::TokenizerFamily;

pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// One encoded sequence, padded to the requested length.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPair {
    pub input_ids:      Vec<u32>,
    pub token_type_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

pub struct PretrainedTokenizer {
    inner:  Tokenizer,
    cls_id: u32,
    sep_id: u32,
    pad_id: u32,
}

impl PretrainedTokenizer {
    /// Load `<vocab_dir>/tokenizer.json` for the given family.
    pub fn from_pretrained(family: TokenizerFamily, vocab_dir: &Path) -> Result<Self, RunError> {
        let path = vocab_dir.join(TOKENIZER_FILE);
        let inner = Tokenizer::from_file(&path).map_err(|e| RunError::TokenizerLoad {
            path:   path.clone(),
            reason: e.to_string(),
        })?;

        let special = |token: &str| {
            inner.token_to_id(token).ok_or_else(|| RunError::TokenizerLoad {
                path:   path.clone(),
                reason: format!("vocabulary has no '{token}' token"),
            })
        };
        let cls_id = special(family.cls_token())?;
        let sep_id = special(family.sep_token())?;
        let pad_id = special(family.pad_token())?;

        tracing::info!(
            "Loaded {:?} tokenizer from '{}' ({} tokens)",
            family,
            path.display(),
            inner.get_vocab_size(true)
        );
        Ok(Self { inner, cls_id, sep_id, pad_id })
    }

    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    pub fn pad_id(&self) -> u32 {
        self.pad_id
    }

    /// Token ids for `text` without any special tokens.
    pub fn tokenize(&self, text: &str) -> Result<Vec<u32>> {
        let enc = self
            .inner
            .encode(text, false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
        Ok(enc.get_ids().to_vec())
    }

    /// Encode a sentence pair, truncating the longer side first and
    /// padding to exactly `max_len` tokens.
    pub fn encode_pair(&self, first: &str, second: &str, max_len: usize) -> Result<EncodedPair> {
        if max_len < 3 {
            return Err(anyhow!("max_len {max_len} leaves no room for special tokens"));
        }
        let mut a = self.tokenize(first)?;
        let mut b = self.tokenize(second)?;

        let budget = max_len - 3;
        while a.len() + b.len() > budget {
            if a.len() > b.len() {
                a.pop();
            } else {
                b.pop();
            }
        }

        let mut input_ids = Vec::with_capacity(max_len);
        input_ids.push(self.cls_id);
        input_ids.extend_from_slice(&a);
        input_ids.push(self.sep_id);
        let first_len = input_ids.len();
        input_ids.extend_from_slice(&b);
        input_ids.push(self.sep_id);

        let used = input_ids.len();
        let mut token_type_ids = vec![0u32; first_len];
        token_type_ids.resize(used, 1);
        let mut attention_mask = vec![1u32; used];

        input_ids.resize(max_len, self.pad_id);
        token_type_ids.resize(max_len, 0);
        attention_mask.resize(max_len, 0);

        Ok(EncodedPair { input_ids, token_type_ids, attention_mask })
    }
}

/// Write a small word-level tokenizer.json for tests.
#[cfg(test)]
pub(crate) fn write_test_vocab(dir: &Path, family: TokenizerFamily, words: &[&str]) {
    let mut vocab = serde_json::json!({});
    let specials = [family.pad_token(), "[UNK]", family.cls_token(), family.sep_token()];
    for (id, token) in specials.iter().chain(words.iter()).enumerate() {
        vocab[*token] = serde_json::json!(id);
    }
    let added: Vec<serde_json::Value> = specials
        .iter()
        .enumerate()
        .map(|(id, token)| {
            serde_json::json!({
                "id": id, "content": token, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true
            })
        })
        .collect();
    let tokenizer_json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": added,
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": null,
            "lowercase": true
        },
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": { "type": "WordLevel", "vocab": vocab, "unk_token": "[UNK]" }
    });
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(
        dir.join(TOKENIZER_FILE),
        serde_json::to_string_pretty(&tokenizer_json).unwrap(),
    )
    .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bert_tokenizer(dir: &Path) -> PretrainedTokenizer {
        write_test_vocab(dir, TokenizerFamily::Bert, &["where", "is", "the", "milk", "fridge"]);
        PretrainedTokenizer::from_pretrained(TokenizerFamily::Bert, dir).unwrap()
    }

    #[test]
    fn test_encode_pair_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let tok = bert_tokenizer(tmp.path());

        // [PAD]=0 [UNK]=1 [CLS]=2 [SEP]=3 where=4 is=5 the=6 milk=7 fridge=8
        let enc = tok.encode_pair("Where is the milk?", "fridge", 10).unwrap();
        assert_eq!(enc.input_ids, vec![2, 4, 5, 6, 7, 1, 3, 8, 3, 0]);
        assert_eq!(enc.token_type_ids, vec![0, 0, 0, 0, 0, 0, 0, 1, 1, 0]);
        assert_eq!(enc.attention_mask, vec![1, 1, 1, 1, 1, 1, 1, 1, 1, 0]);
    }

    #[test]
    fn test_truncates_longest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let tok = bert_tokenizer(tmp.path());

        let enc = tok.encode_pair("where is the milk", "fridge", 6).unwrap();
        // budget 3: question keeps 2 tokens, choice keeps 1
        assert_eq!(enc.input_ids, vec![2, 4, 5, 3, 8, 3]);
        assert!(enc.attention_mask.iter().all(|&m| m == 1));
    }

    #[test]
    fn test_albert_pad_token() {
        let tmp = tempfile::tempdir().unwrap();
        write_test_vocab(tmp.path(), TokenizerFamily::Albert, &["milk"]);
        let tok = PretrainedTokenizer::from_pretrained(TokenizerFamily::Albert, tmp.path()).unwrap();
        assert_eq!(tok.pad_id(), 0);
        assert!(tok.vocab_size() >= 5);
    }

    #[test]
    fn test_missing_tokenizer_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = PretrainedTokenizer::from_pretrained(TokenizerFamily::Bert, tmp.path())
            .err()
            .unwrap();
        assert!(matches!(err, RunError::TokenizerLoad { .. }));
    }

    #[test]
    fn test_wrong_family_specials_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write_test_vocab(tmp.path(), TokenizerFamily::Bert, &["milk"]);
        // BERT vocab has no "<pad>"
        let err = PretrainedTokenizer::from_pretrained(TokenizerFamily::Albert, tmp.path())
            .err()
            .unwrap();
        assert!(err.to_string().contains("<pad>"));
    }
}
