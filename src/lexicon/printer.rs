use super::reader::InputShape;
use super::tagger::{TaggedSentence, TaggedWord};
use crate::engine::Formatter;
use crate::error::BackendError;
use std::fmt::{self, Write};
use std::str::FromStr;

/// Output formats, selected by their upper-case identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Bracketed derivation, CCGbank style.
    CcgBank,
    /// `word|POS|category` per word.
    Supertags,
    /// One `<div>` per parse.
    Html,
    /// One `ccg/2` fact per parse.
    Prolog,
    /// `word|POS|NER|category` per word, prefixed with the parse id.
    Extended,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] =
        [OutputFormat::CcgBank, OutputFormat::Supertags, OutputFormat::Html, OutputFormat::Prolog, OutputFormat::Extended];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::CcgBank => "CCGBANK",
            OutputFormat::Supertags => "SUPERTAGS",
            OutputFormat::Html => "HTML",
            OutputFormat::Prolog => "PROLOG",
            OutputFormat::Extended => "EXTENDED",
        }
    }

    /// Annotations the input must carry for this format to be rendered.
    pub fn required_shape(self) -> InputShape {
        match self {
            OutputFormat::Prolog | OutputFormat::Extended => InputShape::POS | InputShape::NER,
            _ => InputShape::empty(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ();

    /// Exact match on the upper-case identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::ALL.into_iter().find(|f| f.as_str() == s).ok_or(())
    }
}

/// Renders a [`TaggedSentence`] as a single line in one [`OutputFormat`].
#[derive(Debug, Clone, Copy)]
pub struct SentencePrinter {
    format: OutputFormat,
}

impl SentencePrinter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format
    }
}

impl Formatter<TaggedSentence> for SentencePrinter {
    fn format(&self, sentence: &TaggedSentence, request_id: usize) -> Result<String, BackendError> {
        let mut out = String::new();
        let written = match self.format {
            OutputFormat::CcgBank => write_ccgbank(&mut out, sentence),
            OutputFormat::Supertags => write_supertags(&mut out, sentence),
            OutputFormat::Html => write_html(&mut out, sentence, request_id),
            OutputFormat::Prolog => write_prolog(&mut out, sentence, request_id),
            OutputFormat::Extended => write_extended(&mut out, sentence),
        };
        written.map_err(|_| BackendError::Format(format!("couldn't render parse {} as {}", sentence.id, self.format)))?;
        Ok(out)
    }
}

// --- Writers ------------------------------------------------------------------

fn write_ccgbank(out: &mut String, sentence: &TaggedSentence) -> fmt::Result {
    write!(out, "(<T {} 0 {}>", sentence.root, sentence.words.len())?;
    for w in &sentence.words {
        write!(out, " (<L {cat} {pos} {pos} {word} {cat}>)", cat = w.category, pos = w.pos, word = w.word)?;
    }
    out.write_char(')')
}

fn write_supertags(out: &mut String, sentence: &TaggedSentence) -> fmt::Result {
    for (i, w) in sentence.words.iter().enumerate() {
        if i > 0 {
            out.write_char(' ')?;
        }
        write!(out, "{}|{}|{}", w.word, w.pos, w.category)?;
    }
    Ok(())
}

fn write_html(out: &mut String, sentence: &TaggedSentence, request_id: usize) -> fmt::Result {
    write!(out, "<div class=\"parse\" id=\"parse-{request_id}\">")?;
    for w in &sentence.words {
        write!(
            out,
            "<span class=\"word\" title=\"{}\">{}</span>",
            html_escape(&w.category),
            html_escape(&w.word)
        )?;
    }
    out.write_str("</div>")
}

fn write_prolog(out: &mut String, sentence: &TaggedSentence, request_id: usize) -> fmt::Result {
    write!(out, "ccg({}, [", request_id + 1)?;
    for (i, w) in sentence.words.iter().enumerate() {
        if i > 0 {
            out.write_str(", ")?;
        }
        write!(
            out,
            "w({}, {}, {}, {}, {}, {}, {})",
            request_id + 1,
            i + 1,
            prolog_atom(&w.word),
            prolog_atom(&w.word.to_lowercase()),
            prolog_atom(&w.pos),
            prolog_atom(ner(w)),
            prolog_atom(&w.category.to_lowercase())
        )?;
    }
    out.write_str("]).")
}

fn write_extended(out: &mut String, sentence: &TaggedSentence) -> fmt::Result {
    write!(out, "ID={}", sentence.id)?;
    for w in &sentence.words {
        write!(out, " {}|{}|{}|{}", w.word, w.pos, ner(w), w.category)?;
    }
    Ok(())
}

fn ner(w: &TaggedWord) -> &str {
    w.ner.as_deref().unwrap_or("O")
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn prolog_atom(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}
