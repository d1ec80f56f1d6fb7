use crate::listing::ListingFilter;
use crate::term::{GlossaryTerm, normalize_title};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

/// Characters left untouched in a term fragment; matches form-urlencoding.
const FRAGMENT_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');
const SEGMENT_SET: &AsciiSet = &FRAGMENT_SET.remove(b'~');

pub const DEFAULT_SITE_URL: &str = "http://localhost";
pub const DEFAULT_ARCHIVE_SLUG: &str = "glossary";

/// Builds the listing and per-term URIs the autolinker points at.
///
/// Term URIs have the shape `{site}/{slug}/letter/{first char}/#{encoded title}`,
/// so they are stable for a given trimmed title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryUris {
    pub site_url: String,
    pub archive_slug: String,
}

impl Default for GlossaryUris {
    fn default() -> Self {
        Self {
            site_url: DEFAULT_SITE_URL.to_string(),
            archive_slug: DEFAULT_ARCHIVE_SLUG.to_string(),
        }
    }
}

impl GlossaryUris {
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            ..Self::default()
        }
    }

    pub fn with_archive_slug(mut self, slug: impl Into<String>) -> Self {
        self.archive_slug = slug.into();
        self
    }

    /// URI of the unfiltered glossary listing, always with a trailing slash.
    pub fn archive_uri(&self) -> String {
        let site = self.site_url.trim_end_matches('/');
        let slug = self.archive_slug.trim_matches('/');
        if slug.is_empty() {
            format!("{site}/")
        } else {
            format!("{site}/{slug}/")
        }
    }

    /// URI of the listing filtered to `letter`.
    ///
    /// With `remove_active` set and `letter` exactly equal to the active letter
    /// filter, the plain archive URI is returned so the link toggles the filter
    /// off. The comparison is case-sensitive.
    pub fn filter_uri(&self, letter: &str, active: &ListingFilter, remove_active: bool) -> String {
        let archive = self.archive_uri();
        if remove_active && matches!(active, ListingFilter::Letter(current) if current == letter) {
            return archive;
        }
        format!(
            "{archive}letter/{}/",
            utf8_percent_encode(letter, SEGMENT_SET)
        )
    }

    pub fn term_uri(&self, title: &str) -> String {
        let title = normalize_title(title);
        let letter: String = title.chars().take(1).collect();
        let listing = self.filter_uri(&letter, &ListingFilter::None, false);
        format!("{listing}#{}", encode_fragment(title))
    }

    /// Where a request for a single glossary entry should be redirected.
    /// Entries have no page of their own; they live in the letter listing.
    pub fn canonical_entry_uri(&self, title: &str) -> String {
        self.term_uri(title)
    }

    pub fn term(&self, title: &str) -> GlossaryTerm {
        GlossaryTerm::new(title, self.term_uri(title))
    }

    pub fn terms<I, S>(&self, titles: I) -> Vec<GlossaryTerm>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        titles
            .into_iter()
            .map(|title| self.term(title.as_ref()))
            .collect()
    }
}

/// Form-urlencodes a title for use as a fragment: spaces become `+`.
pub fn encode_fragment(title: &str) -> String {
    title
        .split(' ')
        .map(|part| utf8_percent_encode(part, FRAGMENT_SET).to_string())
        .collect::<Vec<_>>()
        .join("+")
}
