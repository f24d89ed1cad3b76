use crate::error::BuildError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the word list inside a model directory.
pub const LEXICON_FILE: &str = "lexicon";

/// A lexicon entry: the category a word is always given, and optionally its POS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub category: String,
    pub pos: Option<String>,
}

/// Word list loaded from `<model_dir>/lexicon`.
///
/// One entry per line, `word<TAB>category[<TAB>pos]`; blank lines and lines
/// starting with `#` are ignored. Words are matched case-insensitively and a
/// later line for the same word replaces an earlier one.
#[derive(Debug, Clone)]
pub struct Lexicon {
    path: PathBuf,
    entries: HashMap<String, Entry>,
}

impl Lexicon {
    pub fn load(model_dir: &Path) -> Result<Self, BuildError> {
        if !model_dir.is_dir() {
            return Err(BuildError::model_load(model_dir, "model directory does not exist"));
        }
        let path = model_dir.join(LEXICON_FILE);
        let text = fs::read_to_string(&path).map_err(|err| BuildError::model_load(&path, err.to_string()))?;
        let entries = parse_entries(&text).map_err(|reason| BuildError::model_load(&path, reason))?;
        Ok(Self { path, entries })
    }

    pub fn lookup(&self, word: &str) -> Option<&Entry> {
        self.entries.get(&word.to_lowercase())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_entries(text: &str) -> Result<HashMap<String, Entry>, String> {
    let mut entries = HashMap::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        let (word, category, pos) = match fields.as_slice() {
            [word, category] => (*word, *category, None),
            [word, category, pos] => (*word, *category, Some(*pos)),
            _ => return Err(format!("line {}: expected word<TAB>category[<TAB>pos]", lineno + 1)),
        };
        if word.is_empty() || category.is_empty() || pos.is_some_and(str::is_empty) {
            return Err(format!("line {}: empty field", lineno + 1));
        }

        entries.insert(word.to_lowercase(), Entry { category: category.to_string(), pos: pos.map(str::to_string) });
    }
    Ok(entries)
}

// --- Built-in tables ----------------------------------------------------------

/// Categories for closed-class words, keyed by lowercase form.
static CLOSED_CLASS: Lazy<HashMap<&'static str, (&'static str, &'static str)>> = Lazy::new(|| {
    HashMap::from([
        ("the", ("NP[nb]/N", "DT")),
        ("a", ("NP[nb]/N", "DT")),
        ("an", ("NP[nb]/N", "DT")),
        ("this", ("NP[nb]/N", "DT")),
        ("that", ("NP[nb]/N", "DT")),
        ("every", ("NP[nb]/N", "DT")),
        ("some", ("NP[nb]/N", "DT")),
        ("i", ("NP", "PRP")),
        ("you", ("NP", "PRP")),
        ("he", ("NP", "PRP")),
        ("she", ("NP", "PRP")),
        ("it", ("NP", "PRP")),
        ("we", ("NP", "PRP")),
        ("they", ("NP", "PRP")),
        ("him", ("NP", "PRP")),
        ("her", ("NP", "PRP")),
        ("them", ("NP", "PRP")),
        ("of", ("(NP\\NP)/NP", "IN")),
        ("in", ("((S\\NP)\\(S\\NP))/NP", "IN")),
        ("on", ("((S\\NP)\\(S\\NP))/NP", "IN")),
        ("at", ("((S\\NP)\\(S\\NP))/NP", "IN")),
        ("with", ("((S\\NP)\\(S\\NP))/NP", "IN")),
        ("to", ("(S[to]\\NP)/(S[b]\\NP)", "TO")),
        ("and", ("conj", "CC")),
        ("or", ("conj", "CC")),
        ("but", ("conj", "CC")),
        ("is", ("(S[dcl]\\NP)/NP", "VBZ")),
        ("are", ("(S[dcl]\\NP)/NP", "VBP")),
        ("was", ("(S[dcl]\\NP)/NP", "VBD")),
        ("were", ("(S[dcl]\\NP)/NP", "VBD")),
        ("not", ("(S\\NP)\\(S\\NP)", "RB")),
        ("very", ("(N/N)/(N/N)", "RB")),
    ])
});

/// Categories for Penn Treebank tags, used when the input carries POS tags.
static POS_CATEGORIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("NN", "N"),
        ("NNS", "N"),
        ("NNP", "N"),
        ("NNPS", "N"),
        ("PRP", "NP"),
        ("DT", "NP[nb]/N"),
        ("JJ", "N/N"),
        ("CD", "N/N"),
        ("IN", "((S\\NP)\\(S\\NP))/NP"),
        ("TO", "(S[to]\\NP)/(S[b]\\NP)"),
        ("CC", "conj"),
        ("RB", "(S\\NP)\\(S\\NP)"),
        ("VB", "S[b]\\NP"),
        ("VBD", "S[dcl]\\NP"),
        ("VBZ", "S[dcl]\\NP"),
        ("VBP", "S[dcl]\\NP"),
        ("VBG", "S[ng]\\NP"),
        ("VBN", "S[pss]\\NP"),
        ("MD", "(S[dcl]\\NP)/(S[b]\\NP)"),
        (".", "."),
        (",", ","),
        (":", ":"),
    ])
});

/// Shape-based rules for words no table knows, tried in order.
static FALLBACK_RULES: Lazy<Vec<(&'static Regex, &'static str, &'static str)>> = Lazy::new(|| {
    vec![
        (regex!(r"^[.!?]$"), ".", "."),
        (regex!(r"^[,;]$"), ",", ","),
        (regex!(r"^:$"), ":", ":"),
        (regex!(r"^[0-9][0-9,.]*$"), "N/N", "CD"),
        (regex!(r"^[a-z]+ly$"), "(S\\NP)\\(S\\NP)", "RB"),
        (regex!(r"^[a-z]+ing$"), "S[ng]\\NP", "VBG"),
        (regex!(r"^[a-z]+ed$"), "S[dcl]\\NP", "VBD"),
        (regex!(r"^[A-Z][A-Za-z'-]*$"), "N", "NNP"),
        (regex!(r"^[a-z]+s$"), "N", "NNS"),
    ]
});

/// Category and POS for `word` from the built-in tables.
///
/// Every word gets an answer; anything unrecognized is a common noun.
pub(crate) fn builtin_category(word: &str) -> (&'static str, &'static str) {
    if let Some(hit) = CLOSED_CLASS.get(word.to_lowercase().as_str()) {
        return *hit;
    }
    FALLBACK_RULES
        .iter()
        .find(|(re, _, _)| re.is_match(word))
        .map(|(_, category, pos)| (*category, *pos))
        .unwrap_or(("N", "NN"))
}

/// Category for a Penn Treebank tag, if the tag is known.
pub(crate) fn pos_category(pos: &str) -> Option<&'static str> {
    POS_CATEGORIES.get(pos).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_entries_accepts_comments_and_optional_pos() {
        let entries = parse_entries("# comment\n\ncat\tN\tNN\nSat\tS[dcl]\\NP\n").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["cat"].pos.as_deref(), Some("NN"));
        assert_eq!(entries["sat"], Entry { category: "S[dcl]\\NP".into(), pos: None });
    }

    #[test]
    fn parse_entries_rejects_malformed_lines() {
        let err = parse_entries("cat\tN\nbroken line\n").unwrap_err();
        assert!(err.starts_with("line 2:"), "{err}");
        assert!(parse_entries("cat\t\n").is_err());
    }

    #[test]
    fn builtin_tables_cover_every_word() {
        let cases = [
            ("The", ("NP[nb]/N", "DT")),
            (".", (".", ".")),
            ("1,000", ("N/N", "CD")),
            ("quickly", ("(S\\NP)\\(S\\NP)", "RB")),
            ("walked", ("S[dcl]\\NP", "VBD")),
            ("London", ("N", "NNP")),
            ("dogs", ("N", "NNS")),
            ("cat", ("N", "NN")),
        ];
        for (word, expected) in cases {
            assert_eq!(builtin_category(word), expected, "word: {word}");
        }
        assert_eq!(pos_category("VBD"), Some("S[dcl]\\NP"));
        assert_eq!(pos_category("XYZ"), None);
    }
}
