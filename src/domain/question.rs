// ============================================================
// Layer 3 - Multiple-Choice Question
// ============================================================
// One CommonsenseQA-style record: a question stem, a small set
// of labelled answer choices and, when known, the index of the
// correct one. Choices read from the OMCS source also carry
// supporting sentences ("evidence").
//
// Example:
//   stem:    "Where would you put a plate after washing it?"
//   choices: A "cupboard", B "table", C "restaurant", ...
//   answer:  Some(0)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub label:    String,
    pub text:     String,
    #[serde(default)]
    pub evidence: Vec<String>,
}

#[cfg(test)]
impl Choice {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label:    label.into(),
            text:     text.into(),
            evidence: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McQuestion {
    pub id:      String,
    pub stem:    String,
    pub choices: Vec<Choice>,
    /// Index into `choices`; None for unlabelled (test) records.
    pub answer:  Option<usize>,
}

impl McQuestion {
    pub fn num_choices(&self) -> usize {
        self.choices.len()
    }

    /// Position of the choice carrying `label`, if any.
    pub fn index_of_label(&self, label: &str) -> Option<usize> {
        self.choices.iter().position(|c| c.label == label)
    }
}
