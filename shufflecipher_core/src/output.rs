//! Stream items and message rendering.
//!
//! Transforms operate on mixed streams: defined symbols carry a lexical
//! value, anything else rides along as a literal. Rendering turns a
//! finished stream into either symbol text (literals inline, in place) or
//! the raw value sequence (literals omitted).

use serde::{Deserialize, Serialize};

use crate::alphabet::Alphabet;

/// One element of a transform stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamItem {
    /// A defined symbol's lexical value.
    Value(usize),
    /// A passthrough symbol outside the alphabet.
    Literal(char),
}

/// Rendering selector for console feedback and returned values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Values,
}

/// A rendered transform result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransformOutput {
    Text(String),
    Values(Vec<usize>),
}

impl TransformOutput {
    pub fn into_text(self) -> Option<String> {
        match self {
            TransformOutput::Text(text) => Some(text),
            TransformOutput::Values(_) => None,
        }
    }

    pub fn into_values(self) -> Option<Vec<usize>> {
        match self {
            TransformOutput::Text(_) => None,
            TransformOutput::Values(values) => Some(values),
        }
    }
}

/// Renders a stream as symbol text with literals inline.
pub fn render_text(alphabet: &Alphabet, items: &[StreamItem]) -> String {
    items
        .iter()
        .map(|item| match *item {
            StreamItem::Value(value) => alphabet.symbol(value),
            StreamItem::Literal(symbol) => symbol,
        })
        .collect()
}

/// Renders a stream as its raw value sequence; literal positions are
/// dropped from this form.
pub fn render_values(items: &[StreamItem]) -> Vec<usize> {
    items
        .iter()
        .filter_map(|item| match *item {
            StreamItem::Value(value) => Some(value),
            StreamItem::Literal(_) => None,
        })
        .collect()
}

pub fn render(alphabet: &Alphabet, items: &[StreamItem], format: OutputFormat) -> TransformOutput {
    match format {
        OutputFormat::Text => TransformOutput::Text(render_text(alphabet, items)),
        OutputFormat::Values => TransformOutput::Values(render_values(items)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rendering_keeps_literals_in_place() {
        let alphabet = Alphabet::lowercase();
        let items = [
            StreamItem::Value(7),
            StreamItem::Literal(' '),
            StreamItem::Value(8),
            StreamItem::Literal('!'),
        ];
        assert_eq!(render_text(&alphabet, &items), "h i!");
    }

    #[test]
    fn values_rendering_drops_literals() {
        let items = [
            StreamItem::Value(7),
            StreamItem::Literal(' '),
            StreamItem::Value(8),
        ];
        assert_eq!(render_values(&items), vec![7, 8]);
    }

    #[test]
    fn render_selects_format() {
        let alphabet = Alphabet::lowercase();
        let items = [StreamItem::Value(0)];
        assert_eq!(
            render(&alphabet, &items, OutputFormat::Text),
            TransformOutput::Text("a".to_string())
        );
        assert_eq!(
            render(&alphabet, &items, OutputFormat::Values),
            TransformOutput::Values(vec![0])
        );
    }
}
