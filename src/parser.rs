//! Dependency parses for reporting-verb detection.
//!
//! [`ParsedSentence`] is the structure the detector walks: tokens with a
//! lemma, a coarse part of speech and a labelled head. [`DependencyParser`]
//! is the seam for a statistical parser. [`HeuristicParser`] is the
//! built-in rule-based one: it tokenises with a regex, tags from closed
//! word lists plus suffix rules, lemmatises with an irregular-form table,
//! and attaches subjects, objects, prepositions and clauses with a handful
//! of positional rules. It only has to be good enough to expose the
//! relations the detector asks about.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

/// Coarse part of speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Pos {
    Verb,
    Aux,
    Noun,
    Propn,
    Pron,
    Adp,
    Det,
    Adj,
    Adv,
    Sconj,
    Cconj,
    Part,
    Punct,
    Num,
    Other,
}

/// Dependency relation to a token's head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DepLabel {
    Root,
    Nsubj,
    Nsubjpass,
    Dobj,
    Iobj,
    Pobj,
    Attr,
    Oprd,
    Ccomp,
    Xcomp,
    Acl,
    Advcl,
    Relcl,
    Prep,
    Pcomp,
    Punct,
    Det,
    Aux,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub text: String,
    pub lemma: String,
    pub pos: Pos,
    pub dep: DepLabel,
    /// `None` for the root and for unattached tokens.
    pub head: Option<usize>,
    pub is_quote: bool,
}

impl Token {
    /// An unattached token.
    pub fn new(
        text: impl Into<String>,
        lemma: impl Into<String>,
        pos: Pos,
    ) -> Self {
        let text = text.into();
        let is_quote = is_quote(&text);
        Self {
            text,
            lemma: lemma.into(),
            pos,
            dep: DepLabel::Other,
            head: None,
            is_quote,
        }
    }
}

fn is_quote(text: &str) -> bool {
    matches!(
        text,
        "\"" | "'"
            | "`"
            | "\u{201C}"
            | "\u{201D}"
            | "\u{2018}"
            | "\u{2019}"
            | "\u{AB}"
            | "\u{BB}"
    )
}

fn is_double_quote(text: &str) -> bool {
    matches!(text, "\"" | "\u{201C}" | "\u{201D}")
}

/// A parsed sentence. Heads index into `tokens`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedSentence {
    pub tokens: Vec<Token>,
}

impl ParsedSentence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Attach `child` to `head`, replacing any previous attachment.
    pub fn attach(&mut self, child: usize, head: usize, dep: DepLabel) {
        self.tokens[child].head = Some(head);
        self.tokens[child].dep = dep;
    }

    /// Direct dependents of token `i`, in sentence order.
    pub fn children(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.head == Some(i))
            .map(|(j, _)| j)
    }

    /// Token `i` and everything below it, in sentence order.
    pub fn subtree(&self, i: usize) -> Vec<usize> {
        let mut seen = vec![false; self.tokens.len()];
        let mut stack = vec![i];
        while let Some(t) = stack.pop() {
            if std::mem::replace(&mut seen[t], true) {
                continue;
            }
            stack.extend(self.children(t));
        }
        seen.iter()
            .enumerate()
            .filter(|(_, s)| **s)
            .map(|(j, _)| j)
            .collect()
    }

    /// Token texts joined by single spaces, with `n't` re-attached.
    pub fn text(&self) -> String {
        self.render(|i| self.tokens[i].text.clone())
    }

    /// Like [`text`](Self::text) with a custom rendering per token index.
    pub fn render<F>(&self, mut token_text: F) -> String
    where
        F: FnMut(usize) -> String,
    {
        (0..self.tokens.len())
            .map(&mut token_text)
            .collect::<Vec<_>>()
            .join(" ")
            .replace(" n't", "n't")
            .replace(" n\u{2019}t", "n\u{2019}t")
    }
}

/// Anything that can produce a dependency parse for one sentence.
pub trait DependencyParser: Send + Sync {
    fn parse(&self, sentence: &str) -> ParsedSentence;
}

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w+(?:['\u{2019}]\w+)*|[^\w\s]").expect("valid regex")
});

const CLITICS: &[&str] = &["s", "re", "ve", "ll", "d", "m"];

/// Split a sentence into word, clitic and punctuation tokens.
///
/// Negative contractions split before `n't` (`didn't` becomes `did n't`)
/// and other clitics before the apostrophe (`China's` becomes
/// `China 's`).
pub fn tokenize(sentence: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for m in TOKEN_RE.find_iter(sentence) {
        split_clitics(m.as_str(), &mut tokens);
    }
    tokens
}

fn split_clitics(word: &str, out: &mut Vec<String>) {
    for neg in ["n't", "n\u{2019}t"] {
        let cut = word.len().saturating_sub(neg.len());
        if cut > 0
            && word.is_char_boundary(cut)
            && word[cut..].to_lowercase() == neg
        {
            out.push(word[..cut].to_string());
            out.push(word[cut..].to_string());
            return;
        }
    }

    if let Some(pos) = word.rfind(|c| c == '\'' || c == '\u{2019}')
        && pos > 0
    {
        let (stem, clitic) = word.split_at(pos);
        let tail: String = clitic.chars().skip(1).collect();
        if CLITICS.contains(&tail.to_lowercase().as_str()) {
            out.push(stem.to_string());
            out.push(clitic.to_string());
            return;
        }
    }
    out.push(word.to_string());
}

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "these", "those", "each", "every", "some",
    "any", "no", "another", "all", "both", "his", "her", "its", "their",
    "our", "my", "your",
];

const PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them",
    "who", "whom", "which", "what", "someone", "everyone", "nobody",
    "something", "nothing", "anyone", "himself", "herself", "themselves",
];

const NOMINATIVE: &[&str] = &["i", "you", "he", "she", "it", "we", "they"];

const RELATIVES: &[&str] = &["who", "which", "that"];

const ADPOSITIONS: &[&str] = &[
    "of", "in", "on", "at", "by", "for", "with", "from", "about", "into",
    "over", "after", "before", "under", "between", "through", "during",
    "against", "among", "without", "within", "across", "toward", "towards",
    "upon", "via", "per", "despite", "amid", "behind", "near", "onto",
];

const SUBORDINATORS: &[&str] = &[
    "that", "because", "if", "whether", "although", "though", "while",
    "since", "unless", "whereas", "when", "where", "as",
];

/// Subordinators that introduce a clausal complement.
const COMPLEMENTIZERS: &[&str] = &["that", "whether", "if"];

const COORDINATORS: &[&str] = &["and", "or", "but", "nor", "yet"];

const ADVERBS: &[&str] = &[
    "also", "very", "never", "already", "still", "just", "now", "then",
    "here", "there", "yesterday", "today", "tomorrow", "however", "too",
    "only", "even", "again", "soon", "later", "often", "always", "once",
    "instead", "recently", "reportedly", "so",
];

const MODALS: &[&str] = &[
    "will", "would", "shall", "should", "can", "could", "may", "might",
    "must",
];

const ADJECTIVE_SUFFIXES: &[&str] = &[
    "ous", "ful", "ive", "ical", "able", "ible", "less", "ary", "ese", "ian",
];

const AUX_FORMS: &[(&str, &str)] = &[
    ("is", "be"),
    ("am", "be"),
    ("are", "be"),
    ("was", "be"),
    ("were", "be"),
    ("be", "be"),
    ("been", "be"),
    ("being", "be"),
    ("'re", "be"),
    ("'s", "be"),
    ("'m", "be"),
    ("has", "have"),
    ("have", "have"),
    ("had", "have"),
    ("having", "have"),
    ("'ve", "have"),
    ("do", "do"),
    ("does", "do"),
    ("did", "do"),
    ("will", "will"),
    ("'ll", "will"),
    ("wo", "will"),
    ("would", "would"),
    ("'d", "would"),
    ("shall", "shall"),
    ("should", "should"),
    ("can", "can"),
    ("ca", "can"),
    ("could", "could"),
    ("may", "may"),
    ("might", "might"),
    ("must", "must"),
];

const IRREGULAR_VERBS: &[(&str, &str)] = &[
    ("said", "say"),
    ("says", "say"),
    ("told", "tell"),
    ("thought", "think"),
    ("knew", "know"),
    ("known", "know"),
    ("wrote", "write"),
    ("written", "write"),
    ("spoke", "speak"),
    ("spoken", "speak"),
    ("made", "make"),
    ("went", "go"),
    ("gone", "go"),
    ("came", "come"),
    ("took", "take"),
    ("taken", "take"),
    ("gave", "give"),
    ("given", "give"),
    ("found", "find"),
    ("felt", "feel"),
    ("meant", "mean"),
    ("held", "hold"),
    ("left", "leave"),
    ("got", "get"),
    ("gotten", "get"),
    ("saw", "see"),
    ("seen", "see"),
    ("heard", "hear"),
    ("began", "begin"),
    ("begun", "begin"),
    ("became", "become"),
    ("met", "meet"),
    ("sent", "send"),
    ("built", "build"),
    ("rose", "rise"),
    ("risen", "rise"),
    ("fell", "fall"),
    ("fallen", "fall"),
    ("won", "win"),
    ("lost", "lose"),
    ("led", "lead"),
    ("brought", "bring"),
    ("taught", "teach"),
    ("sought", "seek"),
    ("stood", "stand"),
    ("understood", "understand"),
    ("kept", "keep"),
    ("paid", "pay"),
    ("ran", "run"),
    ("spent", "spend"),
    ("forecast", "forecast"),
];

/// Base forms recognised as verbs without any lexicon.
const BASE_VERBS: &[&str] = &[
    "say", "tell", "state", "claim", "report", "announce", "add", "note",
    "argue", "explain", "insist", "warn", "deny", "confirm", "admit",
    "suggest", "believe", "think", "know", "write", "speak", "ask", "reply",
    "respond", "describe", "accuse", "agree", "acknowledge", "declare",
    "stress", "emphasize", "reveal", "mention", "predict", "promise",
    "urge", "estimate", "allege", "assert", "maintain", "observe",
    "comment", "recall", "complain", "criticize", "praise", "propose",
    "recommend", "indicate", "conclude", "find", "feel", "go", "come",
    "make", "take", "give", "get", "see", "hear", "want", "need", "change",
    "become", "seem", "continue", "meet", "hold", "leave", "begin",
    "increase", "expect", "plan", "help", "win", "lose", "send", "build",
    "rise", "fall", "raise", "sign", "visit", "launch", "fail", "resign",
    "try", "keep", "pay", "run", "spend", "look", "call", "show", "let",
];

fn lookup<'a>(table: &[(&str, &'a str)], word: &str) -> Option<&'a str> {
    table.iter().find(|(form, _)| *form == word).map(|(_, lemma)| *lemma)
}

fn aux_lemma(word: &str) -> Option<&'static str> {
    lookup(AUX_FORMS, &word.replace('\u{2019}', "'"))
}

/// Lemma candidates for an inflected verb form, most plausible first.
fn verb_candidates(word: &str) -> Vec<String> {
    let mut out = Vec::new();
    let stems = |suffix: &str, out: &mut Vec<String>| {
        let Some(stem) = word.strip_suffix(suffix) else {
            return;
        };
        let mut tail = stem.chars().rev();
        let (Some(last), Some(prev)) = (tail.next(), tail.next()) else {
            return;
        };
        let doubled = tail.next().is_some()
            && last == prev
            && !matches!(last, 'l' | 's' | 'e' | 'o');
        if doubled {
            out.push(stem[..stem.len() - last.len_utf8()].to_string());
        }
        if matches!(last, 'c' | 'v' | 'u' | 'z' | 'g') {
            out.push(format!("{stem}e"));
            out.push(stem.to_string());
        } else {
            out.push(stem.to_string());
            out.push(format!("{stem}e"));
        }
    };

    if let Some(stem) = word.strip_suffix("ied") {
        out.push(format!("{stem}y"));
    }
    if let Some(stem) = word.strip_suffix("ies") {
        out.push(format!("{stem}y"));
    }
    stems("ed", &mut out);
    stems("ing", &mut out);
    if let Some(stem) = word.strip_suffix("es")
        && ["ch", "sh", "x", "ss", "z"].iter().any(|s| stem.ends_with(s))
    {
        out.push(stem.to_string());
    }
    if let Some(stem) = word.strip_suffix('s')
        && stem.len() >= 2
        && !stem.ends_with('s')
    {
        out.push(stem.to_string());
    }
    out
}

fn is_negation(token: &Token) -> bool {
    token.pos == Pos::Part && token.lemma == "not"
}

fn is_possessive(token: &Token) -> bool {
    token.pos == Pos::Part && token.lemma == "'s"
}

fn in_noun_phrase(token: &Token) -> bool {
    matches!(
        token.pos,
        Pos::Det | Pos::Adj | Pos::Num | Pos::Noun | Pos::Propn
    ) || is_possessive(token)
}

fn starts_noun_phrase(pos: Pos) -> bool {
    matches!(
        pos,
        Pos::Det | Pos::Adj | Pos::Num | Pos::Noun | Pos::Propn | Pos::Pron
    )
}

fn is_nominal(pos: Pos) -> bool {
    matches!(pos, Pos::Noun | Pos::Propn | Pos::Pron | Pos::Num)
}

/// Rule-based tagger, lemmatiser and attacher.
#[derive(Debug, Clone)]
pub struct HeuristicParser {
    known_verbs: HashSet<String>,
}

impl Default for HeuristicParser {
    fn default() -> Self {
        Self {
            known_verbs: BASE_VERBS.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl HeuristicParser {
    /// Add base forms that should always be tagged as verbs, typically the
    /// reporting-verb lexicon.
    pub fn with_verbs<I, S>(mut self, verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known_verbs
            .extend(verbs.into_iter().map(|v| v.as_ref().to_lowercase()));
        self
    }

    /// Base form of `word` if it reads as a verb form.
    fn verb_lemma(&self, word: &str) -> Option<String> {
        if let Some(lemma) = lookup(IRREGULAR_VERBS, word) {
            return Some(lemma.to_string());
        }
        if self.known_verbs.contains(word) {
            return Some(word.to_string());
        }
        verb_candidates(word)
            .into_iter()
            .find(|c| self.known_verbs.contains(c))
    }

    fn lexical_pos(&self, word: &str, lower: &str, first: bool) -> Pos {
        if !word.chars().any(char::is_alphanumeric) {
            return Pos::Punct;
        }
        if word.chars().all(|c| c.is_ascii_digit()) {
            return Pos::Num;
        }
        let key = lower.replace('\u{2019}', "'");
        match key.as_str() {
            "not" | "n't" | "'s" => return Pos::Part,
            "to" => return Pos::Part,
            _ => {}
        }
        if aux_lemma(&key).is_some() {
            return Pos::Aux;
        }
        let lists: [(&[&str], Pos); 6] = [
            (DETERMINERS, Pos::Det),
            (PRONOUNS, Pos::Pron),
            (SUBORDINATORS, Pos::Sconj),
            (COORDINATORS, Pos::Cconj),
            (ADPOSITIONS, Pos::Adp),
            (ADVERBS, Pos::Adv),
        ];
        for (list, pos) in lists {
            if list.contains(&key.as_str()) {
                return pos;
            }
        }
        if self.verb_lemma(lower).is_some() {
            return Pos::Verb;
        }
        if !first && word.chars().next().is_some_and(char::is_uppercase) {
            return Pos::Propn;
        }
        if lower.len() > 4 && lower.ends_with("ly") {
            return Pos::Adv;
        }
        if lower.len() > 4 && lower.ends_with("ed") {
            return Pos::Verb;
        }
        if ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            return Pos::Adj;
        }
        Pos::Noun
    }

    /// Revise lexical tags using their neighbours.
    fn contextual_pos(&self, lowers: &[String], pos: &mut [Pos]) {
        let n = pos.len();
        for i in 0..n {
            let word = lowers[i].replace('\u{2019}', "'");
            let prev = i.checked_sub(1).map(|j| pos[j]);
            let next = pos.get(i + 1).copied();

            // Previous token, skipping adverbs and negation.
            let governor = (0..i)
                .rev()
                .find(|&j| {
                    pos[j] != Pos::Adv
                        && !matches!(lowers[j].as_str(), "not" | "n't")
                })
                .map(|j| (pos[j], lowers[j].replace('\u{2019}', "'")));

            pos[i] = match (pos[i], word.as_str()) {
                (Pos::Part, "to") => {
                    if matches!(next, Some(Pos::Verb)) {
                        Pos::Part
                    } else {
                        Pos::Adp
                    }
                }
                (Pos::Part, "'s") if prev == Some(Pos::Pron) => Pos::Aux,
                (Pos::Sconj, "that") => match (prev, next) {
                    (Some(Pos::Verb | Pos::Aux), _) => Pos::Sconj,
                    (
                        Some(Pos::Noun | Pos::Propn | Pos::Pron),
                        Some(Pos::Verb | Pos::Aux | Pos::Adv),
                    ) => Pos::Pron,
                    (_, Some(Pos::Noun | Pos::Adj | Pos::Num)) => Pos::Det,
                    _ => Pos::Sconj,
                },
                (Pos::Det, "her" | "this" | "these" | "those")
                    if !next.is_some_and(starts_noun_phrase)
                        || next == Some(Pos::Pron) =>
                {
                    Pos::Pron
                }
                (Pos::Verb, _) if matches!(prev, Some(Pos::Det | Pos::Adj)) => {
                    if word.ends_with("ed") {
                        Pos::Adj
                    } else {
                        Pos::Noun
                    }
                }
                (Pos::Noun | Pos::Adj, _) => match governor {
                    Some((Pos::Aux, ref g))
                        if aux_lemma(g).is_some_and(|l| {
                            l == "do" || MODALS.contains(&l)
                        }) =>
                    {
                        Pos::Verb
                    }
                    Some((Pos::Part, ref g)) if g == "to" => Pos::Verb,
                    Some((Pos::Aux, _))
                        if word.ends_with("ed") || word.ends_with("en") =>
                    {
                        Pos::Verb
                    }
                    Some((Pos::Pron, ref g))
                        if NOMINATIVE.contains(&g.as_str())
                            && prev == Some(Pos::Pron) =>
                    {
                        Pos::Verb
                    }
                    _ => pos[i],
                },
                (current, _) => current,
            };
        }
    }

    fn lemma(&self, lower: &str, pos: Pos) -> String {
        let key = lower.replace('\u{2019}', "'");
        match pos {
            Pos::Aux => aux_lemma(&key)
                .map_or_else(|| lower.to_string(), str::to_string),
            Pos::Verb => self.verb_lemma(lower).unwrap_or_else(|| {
                verb_candidates(lower)
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| lower.to_string())
            }),
            Pos::Part if key == "n't" => "not".to_string(),
            Pos::Part => key,
            Pos::Noun => {
                if lower.len() > 4
                    && let Some(stem) = lower.strip_suffix("ies")
                {
                    format!("{stem}y")
                } else if lower.len() > 3
                    && lower.ends_with('s')
                    && !["ss", "us", "is"].iter().any(|s| lower.ends_with(s))
                {
                    lower[..lower.len() - 1].to_string()
                } else {
                    lower.to_string()
                }
            }
            _ => lower.to_string(),
        }
    }

    fn tag(&self, words: &[String]) -> Vec<Token> {
        let lowers: Vec<String> =
            words.iter().map(|w| w.to_lowercase()).collect();
        let mut pos: Vec<Pos> = words
            .iter()
            .zip(&lowers)
            .enumerate()
            .map(|(i, (w, l))| self.lexical_pos(w, l, i == 0))
            .collect();
        self.contextual_pos(&lowers, &mut pos);

        words
            .iter()
            .zip(&lowers)
            .zip(pos)
            .map(|((word, lower), pos)| {
                Token::new(word.clone(), self.lemma(lower, pos), pos)
            })
            .collect()
    }
}

impl DependencyParser for HeuristicParser {
    fn parse(&self, sentence: &str) -> ParsedSentence {
        let words = tokenize(sentence);
        let mut tokens = self.tag(&words);
        attach(&mut tokens);
        ParsedSentence::new(tokens)
    }
}

/// Set `child`'s head unless it already has one or the link would close a
/// cycle.
fn link(
    tokens: &mut [Token],
    child: usize,
    head: usize,
    dep: DepLabel,
) -> bool {
    if child == head
        || tokens[child].head.is_some()
        || tokens[child].dep == DepLabel::Root
    {
        return false;
    }
    let mut cursor = Some(head);
    let mut steps = 0;
    while let Some(c) = cursor {
        if c == child || steps > tokens.len() {
            return false;
        }
        cursor = tokens[c].head;
        steps += 1;
    }
    tokens[child].head = Some(head);
    tokens[child].dep = dep;
    true
}

/// Index just past the noun phrase starting at `start`, and its head.
fn noun_phrase(tokens: &[Token], start: usize) -> Option<(usize, usize)> {
    if tokens[start].pos == Pos::Pron {
        return Some((start, start + 1));
    }
    let mut end = start;
    while end < tokens.len() && in_noun_phrase(&tokens[end]) {
        end += 1;
    }
    let span = start..end;
    span.clone()
        .rev()
        .find(|&i| matches!(tokens[i].pos, Pos::Noun | Pos::Propn | Pos::Num))
        .or_else(|| span.rev().find(|&i| tokens[i].pos == Pos::Adj))
        .map(|head| (head, end))
}

/// First index of the noun phrase whose head is `head`.
fn noun_phrase_start(tokens: &[Token], head: usize) -> usize {
    if tokens[head].pos == Pos::Pron {
        return head;
    }
    let mut start = head;
    while start > 0 && in_noun_phrase(&tokens[start - 1]) {
        start -= 1;
    }
    start
}

fn is_predicate(tokens: &[Token], i: usize) -> bool {
    tokens[i].pos == Pos::Verb
        || (tokens[i].pos == Pos::Aux
            && (tokens[i].head.is_none() || tokens[i].dep == DepLabel::Root))
}

/// Leftmost auxiliary attached to `p`, or `p` itself.
fn chain_start(tokens: &[Token], p: usize) -> usize {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.head == Some(p) && t.dep == DepLabel::Aux)
        .map(|(i, _)| i)
        .min()
        .unwrap_or(p)
        .min(p)
}

fn is_passive(tokens: &[Token], p: usize) -> bool {
    let verb = &tokens[p];
    let be_aux = tokens.iter().any(|t| {
        t.head == Some(p) && t.dep == DepLabel::Aux && t.lemma == "be"
    });
    be_aux
        && verb.pos == Pos::Verb
        && !verb.text.to_lowercase().ends_with("ing")
        && verb.lemma != verb.text.to_lowercase()
}

/// Subject head directly left of a clause starting at `start`, and the
/// first index of its noun phrase.
fn find_subject(tokens: &mut [Token], start: usize) -> Option<(usize, usize)> {
    let mut k = start;
    while k > 0 && tokens[k - 1].pos == Pos::Adv {
        k -= 1;
    }
    let candidate = k.checked_sub(1)?;
    if !is_nominal(tokens[candidate].pos) {
        return None;
    }

    let mut head = candidate;
    let mut first = noun_phrase_start(tokens, head);
    // "The minister of finance said": climb over prepositional modifiers.
    while first >= 2
        && tokens[first - 1].pos == Pos::Adp
        && is_nominal(tokens[first - 2].pos)
    {
        let adp = first - 1;
        let outer = first - 2;
        link(tokens, head, adp, DepLabel::Pobj);
        link(tokens, adp, outer, DepLabel::Prep);
        head = outer;
        first = noun_phrase_start(tokens, outer);
    }
    Some((head, first))
}

fn clause_link(
    tokens: &mut [Token],
    p: usize,
    start: usize,
    root: usize,
    previous: Option<usize>,
    inside_quote: &[bool],
) -> (usize, DepLabel) {
    if inside_quote[p] && !inside_quote[root] {
        return (root, DepLabel::Ccomp);
    }
    let fallback = previous.unwrap_or(root);

    // Relative pronoun subject right after a noun.
    let first = &tokens[start];
    if first.pos == Pos::Pron
        && RELATIVES.contains(&first.lemma.as_str())
        && start > 0
        && matches!(tokens[start - 1].pos, Pos::Noun | Pos::Propn)
    {
        return (start - 1, DepLabel::Relcl);
    }

    let mut k = start;
    while k > 0 && tokens[k - 1].pos == Pos::Adv {
        k -= 1;
    }
    let Some(before) = k.checked_sub(1) else {
        return (root, DepLabel::Advcl);
    };

    match tokens[before].pos {
        Pos::Sconj => {
            let marker = before;
            let mut m = marker;
            while m > 0
                && matches!(tokens[m - 1].pos, Pos::Adv | Pos::Punct)
                && !tokens[m - 1].is_quote
            {
                m -= 1;
            }
            let lemma = tokens[marker].lemma.clone();
            link(tokens, marker, p, DepLabel::Other);
            match m.checked_sub(1) {
                Some(g)
                    if COMPLEMENTIZERS.contains(&lemma.as_str())
                        && is_predicate(tokens, g) =>
                {
                    (g, DepLabel::Ccomp)
                }
                Some(g)
                    if lemma == "that"
                        && matches!(tokens[g].pos, Pos::Noun | Pos::Propn) =>
                {
                    (g, DepLabel::Acl)
                }
                _ => (fallback, DepLabel::Advcl),
            }
        }
        Pos::Part if tokens[before].lemma == "to" => {
            link(tokens, before, p, DepLabel::Aux);
            (fallback, DepLabel::Xcomp)
        }
        Pos::Adp => (before, DepLabel::Pcomp),
        Pos::Cconj => {
            link(tokens, before, p, DepLabel::Other);
            (fallback, DepLabel::Other)
        }
        Pos::Punct if !tokens[before].is_quote => (fallback, DepLabel::Other),
        _ => (fallback, DepLabel::Ccomp),
    }
}

/// Objects and prepositional phrases to the right of predicate `p`.
fn attach_objects(tokens: &mut [Token], p: usize) {
    let n = tokens.len();
    let copula = tokens[p].pos == Pos::Aux;
    let mut has_object = false;
    let mut j = p + 1;

    while j < n {
        let pos = tokens[j].pos;
        if pos == Pos::Adv || is_negation(&tokens[j]) {
            j += 1;
            continue;
        }

        if pos == Pos::Adp {
            if !link(tokens, j, p, DepLabel::Prep) {
                break;
            }
            let adp = j;
            j += 1;
            if j < n
                && starts_noun_phrase(tokens[j].pos)
                && let Some((head, end)) = noun_phrase(tokens, j)
                && tokens[head].head.is_none()
            {
                link(tokens, head, adp, DepLabel::Pobj);
                j = end;
            }
            continue;
        }

        if !starts_noun_phrase(pos) || has_object {
            break;
        }
        let Some((head, end)) = noun_phrase(tokens, j) else {
            break;
        };
        // Already the subject of a complement clause.
        if tokens[head].head.is_some() {
            break;
        }
        let dep = match (copula, tokens[head].pos) {
            (_, Pos::Adj) => DepLabel::Other,
            (true, _) => DepLabel::Attr,
            (false, _) => DepLabel::Dobj,
        };
        link(tokens, head, p, dep);
        has_object = true;
        j = end;

        // "told him the news", "called him reckless"
        if dep == DepLabel::Dobj
            && j < n
            && starts_noun_phrase(tokens[j].pos)
            && let Some((second, second_end)) = noun_phrase(tokens, j)
            && tokens[second].head.is_none()
        {
            if tokens[second].pos == Pos::Adj {
                link(tokens, second, p, DepLabel::Oprd);
            } else {
                tokens[head].dep = DepLabel::Iobj;
                link(tokens, second, p, DepLabel::Dobj);
            }
            j = second_end;
        }
    }
}

fn attach(tokens: &mut [Token]) {
    let n = tokens.len();
    if n == 0 {
        return;
    }

    // Auxiliaries hang off the verb they precede.
    for i in 0..n {
        if tokens[i].pos != Pos::Aux {
            continue;
        }
        let mut j = i + 1;
        while j < n
            && (matches!(tokens[j].pos, Pos::Adv | Pos::Aux)
                || is_negation(&tokens[j]))
        {
            j += 1;
        }
        if j < n && tokens[j].pos == Pos::Verb {
            link(tokens, i, j, DepLabel::Aux);
        }
    }

    let predicates: Vec<usize> =
        (0..n).filter(|&i| is_predicate(tokens, i)).collect();

    let mut inside_quote = vec![false; n];
    let mut open = false;
    for (i, token) in tokens.iter().enumerate() {
        inside_quote[i] = open && !is_double_quote(&token.text);
        if is_double_quote(&token.text) {
            open = !open;
        }
    }

    let root = predicates
        .iter()
        .copied()
        .find(|&p| !inside_quote[p])
        .or_else(|| predicates.first().copied());
    let Some(root) = root else {
        let root = (0..n).find(|&i| tokens[i].pos != Pos::Punct).unwrap_or(0);
        tokens[root].dep = DepLabel::Root;
        for i in 0..n {
            let dep = if tokens[i].pos == Pos::Punct {
                DepLabel::Punct
            } else {
                DepLabel::Other
            };
            link(tokens, i, root, dep);
        }
        return;
    };
    tokens[root].dep = DepLabel::Root;

    let mut clause_start = vec![0; n];
    for &p in &predicates {
        let start = chain_start(tokens, p);
        clause_start[p] = start;
        if let Some((subject, first)) = find_subject(tokens, start) {
            let dep = if is_passive(tokens, p) {
                DepLabel::Nsubjpass
            } else {
                DepLabel::Nsubj
            };
            if link(tokens, subject, p, dep) {
                clause_start[p] = first;
            }
        }
    }

    for (idx, &p) in predicates.iter().enumerate() {
        if p == root {
            continue;
        }
        let previous = predicates[..idx].last().copied();
        let (head, dep) = clause_link(
            tokens,
            p,
            clause_start[p],
            root,
            previous,
            &inside_quote,
        );
        if !link(tokens, p, head, dep) && head != root {
            link(tokens, p, root, DepLabel::Other);
        }
    }

    for &p in &predicates {
        attach_objects(tokens, p);
    }

    // Noun-phrase internals hang off the phrase head.
    for i in 0..n {
        if i == root
            || tokens[i].head.is_some()
            || !in_noun_phrase(&tokens[i])
        {
            continue;
        }
        let mut end = i;
        while end < n && in_noun_phrase(&tokens[end]) {
            end += 1;
        }
        if let Some(head) = (i + 1..end).rev().find(|&h| {
            matches!(tokens[h].pos, Pos::Noun | Pos::Propn | Pos::Num)
        }) {
            let dep = if tokens[i].pos == Pos::Det {
                DepLabel::Det
            } else {
                DepLabel::Other
            };
            link(tokens, i, head, dep);
        }
    }

    let nearest_predicate = |i: usize| {
        predicates
            .iter()
            .rev()
            .copied()
            .find(|&q| q < i)
            .or_else(|| predicates.iter().copied().find(|&q| q > i))
            .unwrap_or(root)
    };

    for i in 0..n {
        if i == root || tokens[i].head.is_some() {
            continue;
        }
        if tokens[i].pos == Pos::Punct {
            let head = if tokens[i].is_quote || i + 1 == n {
                root
            } else {
                nearest_predicate(i)
            };
            if !link(tokens, i, head, DepLabel::Punct) {
                link(tokens, i, root, DepLabel::Punct);
            }
        } else if !link(tokens, i, nearest_predicate(i), DepLabel::Other) {
            link(tokens, i, root, DepLabel::Other);
        }
    }
}
