//! Yes/no answers from classifier prompts.

use serde::{Deserialize, Serialize};

/// A binary classifier verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    Yes,
    No,
}

impl Judgment {
    /// Parse raw model output.
    ///
    /// An exact first word wins. Otherwise a case-insensitive "yes" anywhere
    /// counts as [`Judgment::Yes`]. Everything else, including empty or
    /// rambling output, is [`Judgment::No`].
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        let first_word: String = lower
            .chars()
            .skip_while(|c| !c.is_alphanumeric())
            .take_while(|c| c.is_alphanumeric())
            .collect();

        match first_word.as_str() {
            "yes" => Self::Yes,
            "no" => Self::No,
            _ if lower.contains("yes") => Self::Yes,
            _ => Self::No,
        }
    }

    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}
