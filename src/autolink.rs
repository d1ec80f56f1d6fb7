//! First-occurrence glossary autolinking over rendered markup.
//!
//! For every term, in the order supplied, the linker
//!
//! 1. skips the term when the document is that term's own glossary entry,
//! 2. skips it when the content already holds an anchor pointing at the
//!    term's target URI,
//! 3. otherwise wraps the first eligible whole-word occurrence in an anchor.
//!
//! Occurrences inside tags, shortcodes, anchors and headings are not eligible.
//! Each term sees the content as rewritten by the terms before it.

use crate::markup;
use crate::term::GlossaryTerm;
use html_escape::encode_double_quoted_attribute;
use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, trace, warn};

pub const DEFAULT_CLASS_NAME: &str = "glossary-item";
pub const DEFAULT_TITLE_PREFIX: &str = "Glossary page for";
const DEFAULT_CACHE_CAPACITY: usize = 1024;

static SHARED_LINKER: Lazy<Autolinker> = Lazy::new(Autolinker::default);

/// Links glossary terms in `content` using the default configuration.
///
/// Output depends only on the arguments; compiled patterns are memoised
/// process-wide.
pub fn autolink(content: &str, terms: &[GlossaryTerm], context: &DocumentContext) -> String {
    SHARED_LINKER.link(content, terms, context)
}

/// What the host knows about the document being rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContext {
    pub title: Option<String>,
    pub is_glossary_entry: bool,
}

impl DocumentContext {
    /// No document identity; the self-reference guard never fires.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn page(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            is_glossary_entry: false,
        }
    }

    pub fn glossary_entry(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            is_glossary_entry: true,
        }
    }

    fn is_entry_for(&self, term: &GlossaryTerm) -> bool {
        self.is_glossary_entry
            && self
                .title
                .as_deref()
                .is_some_and(|title| title.trim() == term.match_title())
    }
}

/// How eligible occurrences are located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Lookahead pattern over the raw text. Compatible with existing glossary output.
    #[default]
    Pattern,
    /// Scan only text runs of a tokenized document.
    Markup,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Pattern => write!(f, "pattern"),
            MatchStrategy::Markup => write!(f, "markup"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutolinkConfig {
    /// Class attribute of inserted anchors.
    pub class_name: String,
    /// Inserted anchors get `title="{title_prefix} {term}"`.
    pub title_prefix: String,
    pub strategy: MatchStrategy,
    pub cache_capacity: usize,
}

impl Default for AutolinkConfig {
    fn default() -> Self {
        Self {
            class_name: DEFAULT_CLASS_NAME.to_string(),
            title_prefix: DEFAULT_TITLE_PREFIX.to_string(),
            strategy: MatchStrategy::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    EmptyTitle,
    MissingTarget,
    SelfReference,
    AlreadyLinked,
    NoEligibleOccurrence,
    PatternError,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::EmptyTitle => "empty title",
            SkipReason::MissingTarget => "missing target URI",
            SkipReason::SelfReference => "document is the term's own entry",
            SkipReason::AlreadyLinked => "already linked",
            SkipReason::NoEligibleOccurrence => "no eligible occurrence",
            SkipReason::PatternError => "pattern error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTerm {
    pub title: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutolinkReport {
    pub content: String,
    /// Titles that received a link, in processing order.
    pub linked: Vec<String>,
    pub skipped: Vec<SkippedTerm>,
}

#[derive(Debug)]
pub struct PatternError(regex::Error);

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "regex error: {}", self.0)
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<regex::Error> for PatternError {
    fn from(value: regex::Error) -> Self {
        PatternError(value)
    }
}

/// The compiled matchers for one (title, target URI) pair.
struct TermPatterns {
    /// `<a ... {uri} ... >`, any attribute, any case.
    linked: Regex,
    /// Whole-word candidate; group 1 is the title. Whether the candidate
    /// sits outside tags, shortcodes, anchors and headings is checked by
    /// [`closes_markup`].
    candidate: Regex,
    /// Bare case-insensitive title, boundaries checked by the caller.
    word: Regex,
}

impl TermPatterns {
    fn compile(title: &str, target_uri: &str) -> Result<Self, PatternError> {
        let linked = Regex::new(&format!("(?i)<a.*{}.*>", regex::escape(target_uri)))?;
        let title = regex::escape(title);
        let candidate = Regex::new(&format!(
            r"(?i)(?:^|[^a-zA-Z0-9_>\[-])({title})(?:[^a-zA-Z0-9_<\]-]|$)"
        ))?;
        let word = Regex::new(&format!("(?i){title}"))?;
        Ok(Self {
            linked,
            candidate,
            word,
        })
    }

    /// First candidate whose trailing text does not close a tag, shortcode,
    /// anchor or heading.
    fn first_eligible(&self, content: &str) -> Option<Range<usize>> {
        let mut pos = 0;
        while let Some(caps) = self.candidate.captures_at(content, pos) {
            let (Some(whole), Some(title)) = (caps.get(0), caps.get(1)) else {
                return None;
            };
            if !closes_markup(&content[whole.end()..]) {
                return Some(title.start()..title.end());
            }
            // The boundary character may start the next candidate.
            pos = next_char_boundary(content, whole.start());
        }
        None
    }
}

/// True when `rest` reaches a `>` or `]` before the next `<`, or when that
/// `<` opens `</a` or `</h1>`..`</h6>`.
fn closes_markup(rest: &str) -> bool {
    let open = rest.find('<').unwrap_or(rest.len());
    if rest[..open].contains(['>', ']']) {
        return true;
    }
    let closer = rest[open..].as_bytes();
    match closer {
        [b'<', b'/', a, ..] if a.eq_ignore_ascii_case(&b'a') => true,
        [b'<', b'/', h, b'1'..=b'6', b'>', ..] => h.eq_ignore_ascii_case(&b'h'),
        _ => false,
    }
}

fn next_char_boundary(content: &str, from: usize) -> usize {
    content[from..]
        .chars()
        .next()
        .map_or(content.len(), |ch| from + ch.len_utf8())
}

type PatternKey = (String, String);

/// Reusable autolinker. Holds its configuration and a cache of compiled
/// per-term patterns; the cache never affects output.
pub struct Autolinker {
    config: AutolinkConfig,
    patterns: Mutex<LruCache<PatternKey, Arc<TermPatterns>>>,
}

impl Default for Autolinker {
    fn default() -> Self {
        Self::new(AutolinkConfig::default())
    }
}

impl Autolinker {
    pub fn new(config: AutolinkConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            patterns: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn config(&self) -> &AutolinkConfig {
        &self.config
    }

    pub fn link(&self, content: &str, terms: &[GlossaryTerm], context: &DocumentContext) -> String {
        self.link_report(content, terms, context).content
    }

    /// Links `content` and reports what happened to every term.
    pub fn link_report(
        &self,
        content: &str,
        terms: &[GlossaryTerm],
        context: &DocumentContext,
    ) -> AutolinkReport {
        let mut report = AutolinkReport {
            content: content.to_string(),
            ..AutolinkReport::default()
        };
        for term in terms {
            match self.link_term(&report.content, term, context) {
                Ok(linked) => {
                    trace!(term = %term.match_title(), uri = %term.target_uri, "linked glossary term");
                    report.content = linked;
                    report.linked.push(term.match_title().to_string());
                }
                Err(reason) => {
                    debug!(term = %term.match_title(), %reason, "skipped glossary term");
                    report.skipped.push(SkippedTerm {
                        title: term.match_title().to_string(),
                        reason,
                    });
                }
            }
        }
        report
    }

    /// Links each `(content, context)` pair independently, in parallel.
    /// Results are returned in input order.
    pub fn link_many<S>(&self, documents: &[(S, DocumentContext)], terms: &[GlossaryTerm]) -> Vec<String>
    where
        S: AsRef<str> + Sync,
    {
        documents
            .par_iter()
            .map(|(content, context)| self.link(content.as_ref(), terms, context))
            .collect()
    }

    fn link_term(
        &self,
        content: &str,
        term: &GlossaryTerm,
        context: &DocumentContext,
    ) -> Result<String, SkipReason> {
        let title = term.match_title();
        if !term.is_linkable() {
            return Err(if title.is_empty() {
                SkipReason::EmptyTitle
            } else {
                SkipReason::MissingTarget
            });
        }
        if context.is_entry_for(term) {
            return Err(SkipReason::SelfReference);
        }
        let patterns = self.patterns_for(term).map_err(|err| {
            warn!(term = %title, error = %err, "failed to compile glossary pattern");
            SkipReason::PatternError
        })?;
        if patterns.linked.is_match(content) {
            return Err(SkipReason::AlreadyLinked);
        }

        let span = match self.config.strategy {
            MatchStrategy::Pattern => patterns.first_eligible(content),
            MatchStrategy::Markup => markup::find_in_text(content, &patterns.word),
        }
        .ok_or(SkipReason::NoEligibleOccurrence)?;

        Ok(self.wrap(content, span, term))
    }

    fn wrap(&self, content: &str, span: Range<usize>, term: &GlossaryTerm) -> String {
        let link_title = format!("{} {}", self.config.title_prefix, term.match_title());
        let mut out = String::with_capacity(content.len() + term.target_uri.len() + 96);
        out.push_str(&content[..span.start]);
        out.push_str(&format!(
            r#"<a href="{}" title="{}" class="{}">"#,
            term.target_uri,
            encode_double_quoted_attribute(&link_title),
            encode_double_quoted_attribute(&self.config.class_name),
        ));
        out.push_str(&content[span.clone()]);
        out.push_str("</a>");
        out.push_str(&content[span.end..]);
        out
    }

    fn patterns_for(&self, term: &GlossaryTerm) -> Result<Arc<TermPatterns>, PatternError> {
        let key = (term.match_title().to_string(), term.target_uri.clone());
        if let Some(hit) = self.patterns.lock().get(&key) {
            return Ok(Arc::clone(hit));
        }
        let compiled = Arc::new(TermPatterns::compile(&key.0, &key.1)?);
        self.patterns.lock().put(key, Arc::clone(&compiled));
        Ok(compiled)
    }
}
