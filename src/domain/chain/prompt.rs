//! Prompt templates for each hop position

use serde::{Deserialize, Serialize};

const INPUT_PLACEHOLDER: &str = "{input}";
const CONTEXT_PLACEHOLDER: &str = "{context}";
const EMPTY_CONTEXT: &str = "(no earlier responses were available)";

/// Position of a hop within its pattern
///
/// Computed from the hop's original pattern index, so a failed hop still
/// occupies its slot for templating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopPosition {
    First,
    Middle,
    Last,
}

impl HopPosition {
    /// A single-hop pattern uses the `First` template
    pub fn for_index(index: usize, hop_count: usize) -> Self {
        if index == 0 {
            Self::First
        } else if index + 1 >= hop_count {
            Self::Last
        } else {
            Self::Middle
        }
    }
}

/// Templates for the first, middle and last hop of a chain
///
/// `{input}` is replaced with the original input and `{context}` with the
/// numbered responses of earlier successful hops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplates {
    pub first: String,
    pub middle: String,
    pub last: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            first: "Answer the following question thoroughly and accurately.\n\n\
                    Question: {input}"
                .to_string(),
            middle: "Original question: {input}\n\n\
                     Earlier responses:\n{context}\n\n\
                     Build on the above: add what is missing, correct any mistakes, \
                     and contribute a perspective the earlier responses did not cover."
                .to_string(),
            last: "Original question: {input}\n\n\
                   Earlier responses:\n{context}\n\n\
                   Synthesize the above into one clear, complete answer to the original \
                   question."
                .to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn template_for(&self, position: HopPosition) -> &str {
        match position {
            HopPosition::First => &self.first,
            HopPosition::Middle => &self.middle,
            HopPosition::Last => &self.last,
        }
    }

    /// Build the prompt for a hop
    pub fn render(&self, position: HopPosition, input: &str, prior: &[&str]) -> String {
        let context = format_context(prior);

        // Substituted text is never rescanned for placeholders
        self.template_for(position)
            .split(CONTEXT_PLACEHOLDER)
            .map(|segment| segment.replace(INPUT_PLACEHOLDER, input))
            .collect::<Vec<_>>()
            .join(&context)
    }
}

fn format_context(prior: &[&str]) -> String {
    if prior.is_empty() {
        return EMPTY_CONTEXT.to_string();
    }

    prior
        .iter()
        .enumerate()
        .map(|(i, content)| format!("[Response {}]\n{}", i + 1, content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
