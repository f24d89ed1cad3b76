//! Built-in lexicon backend.
//!
//! A small deterministic supertagger that plugs into the gateway through
//! [`EngineFactory`], so the binary is usable without an external parser.
//!
//! ```text
//! "The cat sat."
//!       │ TokenReader (reader.rs)        tokenized | postagged | posandnertagged
//!       v
//! [The, cat, sat, .]
//!       │ SupertagEngine (tagger.rs)     lexicon ▸ input POS ▸ closed class ▸ shape rules
//!       v                                (model.rs)
//! TaggedSentence { id, root, words }
//!       │ SentencePrinter (printer.rs)   CCGBANK | SUPERTAGS | HTML | PROLOG | EXTENDED
//!       v
//! "(<T S[dcl] 0 4> (<L NP[nb]/N DT DT The NP[nb]/N>) ...)"
//! ```
//!
//! Every `build` validates the output format against the configured input
//! format, then loads its own copy of `<model_dir>/lexicon`; sessions never
//! share engine state.

#[path = "lexicon/model.rs"]
mod model;
#[path = "lexicon/printer.rs"]
mod printer;
#[path = "lexicon/reader.rs"]
mod reader;
#[path = "lexicon/tagger.rs"]
mod tagger;


pub use model::{Entry, LEXICON_FILE, Lexicon};
pub use printer::{OutputFormat, SentencePrinter};
pub use reader::{InputFormat, InputShape, TokenReader, Word};
pub use tagger::{SupertagEngine, TaggedSentence, TaggedWord};

use crate::engine::{EngineFactory, Pipeline};
use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// `[lexicon]` section of the gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Directory holding the `lexicon` file.
    pub model_dir: PathBuf,
    pub input_format: InputFormat,
    /// Longest sentence, in words, that gets a parse.
    pub max_length: usize,
    /// Category printed at the root of CCGBANK derivations.
    pub root_category: String,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("model"),
            input_format: InputFormat::Tokenized,
            max_length: 70,
            root_category: "S[dcl]".to_string(),
        }
    }
}

/// Builds lexicon pipelines for any supported output format.
#[derive(Debug, Clone, Default)]
pub struct LexiconFactory {
    config: LexiconConfig,
}

impl LexiconFactory {
    pub fn new(config: LexiconConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LexiconConfig {
        &self.config
    }

    /// Resolve an identifier to a format this factory's reader can feed.
    pub fn output_format(&self, format: &str) -> Result<OutputFormat, BuildError> {
        let output: OutputFormat = format.parse().map_err(|()| {
            let known: Vec<_> = OutputFormat::ALL.iter().map(|f| f.as_str()).collect();
            BuildError::unsupported_format(format, format!("expected one of {}", known.join(", ")))
        })?;

        let input = self.config.input_format;
        if !input.shape().contains(output.required_shape()) {
            return Err(BuildError::unsupported_format(
                format,
                format!("needs POS and NER tagged input, reader is configured for {input} input"),
            ));
        }
        Ok(output)
    }
}

impl EngineFactory for LexiconFactory {
    type Engine = SupertagEngine;

    fn build(&self, format: &str) -> Result<Pipeline<SupertagEngine>, BuildError> {
        let output = self.output_format(format)?;
        let lexicon = Lexicon::load(&self.config.model_dir)?;
        debug!(
            format = %output,
            input = %self.config.input_format,
            entries = lexicon.len(),
            path = %lexicon.path().display(),
            "lexicon loaded"
        );

        let engine = SupertagEngine::new(lexicon, self.config.max_length, self.config.root_category.clone());
        Ok(Pipeline::new(engine, TokenReader::new(self.config.input_format), SentencePrinter::new(output)))
    }
}
