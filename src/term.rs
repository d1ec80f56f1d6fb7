use serde::{Deserialize, Serialize};

/// A glossary entry as seen by the autolinker: the display title and the
/// fully-qualified URI of its entry in the filtered listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub title: String,
    pub target_uri: String,
}

impl GlossaryTerm {
    /// Builds a term, trimming surrounding whitespace from the title.
    pub fn new(title: impl AsRef<str>, target_uri: impl Into<String>) -> Self {
        Self {
            title: normalize_title(title.as_ref()).to_string(),
            target_uri: target_uri.into(),
        }
    }

    /// The title used for matching. Always trimmed, even for terms built by hand.
    pub fn match_title(&self) -> &str {
        normalize_title(&self.title)
    }

    /// Whether the term can produce a link at all.
    pub fn is_linkable(&self) -> bool {
        !self.match_title().is_empty() && !self.target_uri.is_empty()
    }
}

pub fn normalize_title(title: &str) -> &str {
    title.trim()
}

/// Upper-cased first character of a trimmed title, used for letter grouping.
pub fn first_letter(title: &str) -> Option<String> {
    normalize_title(title)
        .chars()
        .next()
        .map(|ch| ch.to_uppercase().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_title() {
        let term = GlossaryTerm::new("  API Gateway \n", "https://example.com/x");
        assert_eq!(term.title, "API Gateway");
    }

    #[test]
    fn whitespace_titles_are_not_linkable() {
        assert!(!GlossaryTerm::new("   ", "https://example.com").is_linkable());
        assert!(!GlossaryTerm::new("", "https://example.com").is_linkable());
        assert!(!GlossaryTerm::new("cat", "").is_linkable());
        assert!(GlossaryTerm::new("cat", "https://example.com").is_linkable());
    }

    #[test]
    fn hand_built_terms_match_on_trimmed_title() {
        let term = GlossaryTerm {
            title: " padded ".to_string(),
            target_uri: "u".to_string(),
        };
        assert_eq!(term.match_title(), "padded");
    }

    #[test]
    fn first_letter_is_uppercased() {
        assert_eq!(first_letter(" apple"), Some("A".to_string()));
        assert_eq!(first_letter("3D"), Some("3".to_string()));
        assert_eq!(first_letter("élan"), Some("É".to_string()));
        assert_eq!(first_letter("  "), None);
    }
}
