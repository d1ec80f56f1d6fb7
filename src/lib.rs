//! Glossary support for rendered content: links the first occurrence of each
//! glossary term to its entry in a letter-filtered glossary listing, and
//! provides the listing helpers (letter index, filters, ordering, paging).
//!
//! ```
//! use simple_glossary_rs::{DocumentContext, GlossaryUris, autolink};
//!
//! let uris = GlossaryUris::new("https://example.com");
//! let terms = uris.terms(["API"]);
//! let html = autolink("<p>Call the API.</p>", &terms, &DocumentContext::none());
//! assert!(html.contains(r#"<a href="https://example.com/glossary/letter/A/#API""#));
//! ```

mod autolink;
pub mod listing;
pub mod markup;
mod term;
mod terms;
mod uri;

pub use autolink::{
    AutolinkConfig, AutolinkReport, Autolinker, DocumentContext, MatchStrategy, PatternError,
    SkipReason, SkippedTerm, autolink,
};
pub use listing::{
    ListingFilter, ListingPage, ListingQuery, TermIndex, first_letter_counts, list_terms,
};
pub use term::{GlossaryTerm, first_letter, normalize_title};
pub use terms::{TermEntry, TermsError, TermsFile};
pub use uri::{GlossaryUris, encode_fragment};
