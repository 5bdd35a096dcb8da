//! Reporting-verb detection over dependency parses.

use std::{collections::HashSet, path::Path};

use crate::{
    error::{Error, Result},
    parser::{DepLabel, ParsedSentence, Pos, Token},
};

/// Read a newline-delimited lexicon of reporting verbs.
///
/// Entries are trimmed and lower-cased; blank lines are skipped.
pub fn load_lexicon(path: &Path) -> Result<HashSet<String>> {
    if !path.is_file() {
        return Err(Error::LexiconNotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_lexicon(&contents))
}

pub fn parse_lexicon(contents: &str) -> HashSet<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect()
}

const SUBJECT_DEPS: &[DepLabel] = &[DepLabel::Nsubj, DepLabel::Nsubjpass];

const OBJECT_DEPS: &[DepLabel] = &[
    DepLabel::Dobj,
    DepLabel::Iobj,
    DepLabel::Pobj,
    DepLabel::Attr,
    DepLabel::Oprd,
];

const CLAUSE_DEPS: &[DepLabel] = &[
    DepLabel::Ccomp,
    DepLabel::Xcomp,
    DepLabel::Acl,
    DepLabel::Advcl,
    DepLabel::Relcl,
];

const PREP_OBJECT_DEPS: &[DepLabel] = &[DepLabel::Pobj, DepLabel::Pcomp];

/// Finds verbs of attribution that carry some syntactic evidence of
/// reporting.
///
/// A token qualifies when it is a verb or auxiliary, its lemma (or its
/// surface form) is in the lexicon, and at least one of these holds:
///
/// - it has a nominal subject
/// - it has an object or attribute dependent
/// - it has a clausal dependent
/// - it has a preposition that itself has an object or complement
/// - a quotation mark appears in its subtree
///
/// This is a filter, not a grammar. The only promise is that the same
/// parse always yields the same verbs.
#[derive(Debug, Clone, Default)]
pub struct ReportingVerbDetector {
    lexicon: HashSet<String>,
}

impl ReportingVerbDetector {
    pub fn new(lexicon: HashSet<String>) -> Self {
        Self {
            lexicon: lexicon.into_iter().map(|v| v.to_lowercase()).collect(),
        }
    }

    pub fn lexicon(&self) -> &HashSet<String> {
        &self.lexicon
    }

    fn in_lexicon(&self, token: &Token) -> bool {
        self.lexicon.contains(&token.lemma.to_lowercase())
            || self.lexicon.contains(&token.text.to_lowercase())
    }

    /// Indices of reporting verbs in `parsed`, in sentence order.
    pub fn detect(&self, parsed: &ParsedSentence) -> Vec<usize> {
        parsed
            .tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| matches!(t.pos, Pos::Verb | Pos::Aux))
            .filter(|(_, t)| self.in_lexicon(t))
            .filter(|(i, _)| has_reporting_evidence(parsed, *i))
            .map(|(i, _)| i)
            .collect()
    }
}

fn has_reporting_evidence(parsed: &ParsedSentence, verb: usize) -> bool {
    let dep_of = |i: usize| parsed.tokens[i].dep;
    let has_child = |deps: &[DepLabel]| {
        parsed.children(verb).any(|c| deps.contains(&dep_of(c)))
    };

    let has_prep_object = parsed.children(verb).any(|c| {
        dep_of(c) == DepLabel::Prep
            && parsed
                .children(c)
                .any(|g| PREP_OBJECT_DEPS.contains(&dep_of(g)))
    });

    has_child(SUBJECT_DEPS)
        || has_child(OBJECT_DEPS)
        || has_child(CLAUSE_DEPS)
        || has_prep_object
        || parsed
            .subtree(verb)
            .into_iter()
            .any(|i| parsed.tokens[i].is_quote)
}
