use super::model::{Lexicon, builtin_category, pos_category};
use super::reader::Word;
use crate::engine::Engine;
use crate::error::BackendError;
use tracing::debug;

/// A word with its assigned category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedWord {
    pub word: String,
    pub pos: String,
    pub ner: Option<String>,
    pub category: String,
}

/// One parse produced by [`SupertagEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedSentence {
    /// 1-based sequence number of this parse within its engine.
    pub id: u64,
    pub root: String,
    pub words: Vec<TaggedWord>,
}

/// Assigns one category to every word of a sentence.
///
/// Priority, highest first: the loaded lexicon, the input's own POS tag, the
/// built-in closed-class table, the built-in shape rules. The engine counts
/// the parses it has produced, so it is stateful and not reentrant.
#[derive(Debug)]
pub struct SupertagEngine {
    lexicon: Lexicon,
    max_length: usize,
    root: String,
    parses: u64,
}

impl SupertagEngine {
    pub fn new(lexicon: Lexicon, max_length: usize, root: impl Into<String>) -> Self {
        Self { lexicon, max_length, root: root.into(), parses: 0 }
    }

    /// Parses produced so far.
    pub fn parses(&self) -> u64 {
        self.parses
    }

    fn tag(&self, word: &Word) -> TaggedWord {
        let (builtin_cat, builtin_pos) = builtin_category(&word.text);
        let pos = word.pos.clone();

        let (category, pos) = if let Some(entry) = self.lexicon.lookup(&word.text) {
            (entry.category.clone(), pos.or_else(|| entry.pos.clone()).unwrap_or_else(|| builtin_pos.to_string()))
        } else if let Some(category) = pos.as_deref().and_then(pos_category) {
            (category.to_string(), pos.unwrap_or_default())
        } else {
            (builtin_cat.to_string(), pos.unwrap_or_else(|| builtin_pos.to_string()))
        };

        TaggedWord { word: word.text.clone(), pos, ner: word.ner.clone(), category }
    }
}

impl Engine for SupertagEngine {
    type Input = Vec<Word>;
    type Output = TaggedSentence;

    fn parse(&mut self, input: &Vec<Word>) -> Result<Option<TaggedSentence>, BackendError> {
        if input.is_empty() {
            return Ok(None);
        }
        if input.len() > self.max_length {
            debug!(words = input.len(), max_length = self.max_length, "sentence too long - skipped");
            return Ok(None);
        }

        let words = input.iter().map(|w| self.tag(w)).collect();
        self.parses += 1;
        Ok(Some(TaggedSentence { id: self.parses, root: self.root.clone(), words }))
    }
}
