// ============================================================
// Layer 4 - Text Preprocessor
// ============================================================
// Normalises question stems, choice texts and supporting
// sentences before tokenisation. Crowd-sourced QA data carries
// the usual debris: non-breaking spaces, zero-width spaces,
// stray tabs and newlines inside a single field.
//
// Every field is a single line after cleaning:
//   1. Unicode whitespace variants and control characters
//      become a plain space
//   2. Runs of spaces collapse to one
//   3. Leading/trailing spaces are trimmed

#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean one text field into a single normalised line.
    pub fn clean(&self, text: &str) -> String {
        let mut out        = String::with_capacity(text.len());
        let mut last_space = true;

        for c in text.chars() {
            let c = match c {
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_whitespace() || c.is_control() => ' ',
                c => c,
            };
            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        out.trim_end().to_string()
    }

    /// Clean each sentence and drop the ones that end up empty.
    pub fn clean_all(&self, sentences: &[String]) -> Vec<String> {
        sentences
            .iter()
            .map(|s| self.clean(s))
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("where   is\tthe milk"), "where is the milk");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  fridge  "), "fridge");
    }

    #[test]
    fn test_flattens_newlines_and_invisible_chars() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("a\r\nb\u{00A0}c\u{200B}d\x01e"), "a b c d e");
    }

    #[test]
    fn test_clean_all_drops_empty() {
        let p = Preprocessor::new();
        let out = p.clean_all(&["  ".to_string(), "milk is cold ".to_string()]);
        assert_eq!(out, vec!["milk is cold".to_string()]);
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(Preprocessor::new().clean(""), "");
    }
}
