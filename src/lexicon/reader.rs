use crate::engine::Reader;
use crate::error::BackendError;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Annotations an input format carries beyond the bare word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InputShape: u8 {
        const POS = 1 << 0;
        const NER = 1 << 1;
    }
}

/// How request text is split into words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Whitespace-separated words; trailing sentence punctuation is split off.
    #[default]
    Tokenized,
    /// `word|POS` tokens.
    PosTagged,
    /// `word|POS|NER` tokens.
    PosAndNerTagged,
}

impl InputFormat {
    pub fn shape(self) -> InputShape {
        match self {
            InputFormat::Tokenized => InputShape::empty(),
            InputFormat::PosTagged => InputShape::POS,
            InputFormat::PosAndNerTagged => InputShape::POS | InputShape::NER,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InputFormat::Tokenized => "tokenized",
            InputFormat::PosTagged => "postagged",
            InputFormat::PosAndNerTagged => "posandnertagged",
        }
    }

    fn fields(self) -> usize {
        match self {
            InputFormat::Tokenized => 1,
            InputFormat::PosTagged => 2,
            InputFormat::PosAndNerTagged => 3,
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputFormat {
    type Err = String;

    /// Case-insensitive, so `POStagged` and `postagged` are the same format.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tokenized" => Ok(InputFormat::Tokenized),
            "postagged" => Ok(InputFormat::PosTagged),
            "posandnertagged" => Ok(InputFormat::PosAndNerTagged),
            other => Err(format!("unknown input format '{other}' (expected tokenized, postagged or posandnertagged)")),
        }
    }
}

/// One input word plus whatever annotations the input format carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub pos: Option<String>,
    pub ner: Option<String>,
}

impl Word {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), pos: None, ner: None }
    }
}

/// Characters split off the end of a tokenized word.
const SENTENCE_PUNCT: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Splits request text into [`Word`]s according to an [`InputFormat`].
#[derive(Debug, Clone, Copy)]
pub struct TokenReader {
    format: InputFormat,
}

impl TokenReader {
    pub fn new(format: InputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> InputFormat {
        self.format
    }

    fn read_tokenized(text: &str) -> Vec<Word> {
        let mut words = Vec::new();
        for token in text.split_whitespace() {
            match token.char_indices().last() {
                Some((idx, c)) if idx > 0 && SENTENCE_PUNCT.contains(&c) && !token[..idx].ends_with(SENTENCE_PUNCT) => {
                    words.push(Word::plain(&token[..idx]));
                    words.push(Word::plain(&token[idx..]));
                }
                _ => words.push(Word::plain(token)),
            }
        }
        words
    }

    fn read_tagged(&self, text: &str) -> Result<Vec<Word>, BackendError> {
        let expected = self.format.fields();
        text.split_whitespace()
            .map(|token| {
                let fields: Vec<&str> = token.split('|').collect();
                if fields.len() != expected || fields.iter().any(|f| f.is_empty()) {
                    return Err(BackendError::MalformedInput(format!(
                        "expected {expected} '|'-separated fields in '{token}' for {} input",
                        self.format
                    )));
                }
                Ok(Word {
                    text: fields[0].to_string(),
                    pos: fields.get(1).map(|s| s.to_string()),
                    ner: fields.get(2).map(|s| s.to_string()),
                })
            })
            .collect()
    }
}

impl Reader<Vec<Word>> for TokenReader {
    fn read(&self, text: &str) -> Result<Vec<Word>, BackendError> {
        match self.format {
            InputFormat::Tokenized => Ok(Self::read_tokenized(text)),
            InputFormat::PosTagged | InputFormat::PosAndNerTagged => self.read_tagged(text),
        }
    }
}
