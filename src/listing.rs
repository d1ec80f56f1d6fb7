use crate::term::{GlossaryTerm, first_letter, normalize_title};
use fst::automaton::Str;
use fst::{Automaton, IntoStreamer, Map, MapBuilder, Streamer};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_PER_PAGE: usize = 10;
pub const SELECTED_CLASS: &str = "selected";

/// The filter applied to a glossary listing request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum ListingFilter {
    #[default]
    None,
    /// Titles whose first character is the given letter (or digit).
    Letter(String),
    /// Titles starting with the given text.
    BeginsWith(String),
}

impl ListingFilter {
    /// Builds the filter from request parameters. A letter filter wins over
    /// begins-with; blank values are ignored.
    pub fn from_params(letter: Option<&str>, begins_with: Option<&str>) -> Self {
        let clean = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        if let Some(letter) = clean(letter) {
            ListingFilter::Letter(letter)
        } else if let Some(prefix) = clean(begins_with) {
            ListingFilter::BeginsWith(prefix)
        } else {
            ListingFilter::None
        }
    }

    pub fn is_letter(&self, letter: &str) -> bool {
        matches!(self, ListingFilter::Letter(active) if fold(active) == fold(letter))
    }

    /// Letter listings are shown whole so every `#fragment` on the page resolves.
    pub fn disables_paging(&self) -> bool {
        matches!(self, ListingFilter::Letter(_))
    }

    pub fn matches(&self, title: &str) -> bool {
        let title = normalize_title(title);
        match self {
            ListingFilter::None => true,
            ListingFilter::Letter(letter) => title
                .chars()
                .next()
                .is_some_and(|ch| fold(&ch.to_string()) == fold(letter)),
            ListingFilter::BeginsWith(prefix) => fold(title).starts_with(&fold(prefix)),
        }
    }

    /// CSS class for a letter in the A-Z navigation.
    pub fn selected_class(&self, letter: &str) -> Option<&'static str> {
        let selected = match self {
            ListingFilter::None => false,
            ListingFilter::Letter(_) => self.is_letter(letter),
            ListingFilter::BeginsWith(prefix) => prefix
                .chars()
                .next()
                .is_some_and(|ch| fold(&ch.to_string()) == fold(letter)),
        };
        selected.then_some(SELECTED_CLASS)
    }
}

fn fold(value: &str) -> String {
    value.to_lowercase()
}

/// Counts titles per upper-cased first character, in alphabetical order.
pub fn first_letter_counts<I, S>(titles: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts = BTreeMap::new();
    for title in titles {
        if let Some(letter) = first_letter(title.as_ref()) {
            *counts.entry(letter).or_insert(0) += 1;
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub filter: ListingFilter,
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            filter: ListingFilter::None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingPage<'a> {
    pub filter: ListingFilter,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub items: Vec<&'a GlossaryTerm>,
}

/// Filters, orders alphabetically and pages a term list.
pub fn list_terms<'a>(terms: &'a [GlossaryTerm], query: &ListingQuery) -> ListingPage<'a> {
    let mut matching: Vec<&GlossaryTerm> = terms
        .iter()
        .filter(|term| query.filter.matches(&term.title))
        .collect();
    matching.sort_by(|a, b| {
        fold(a.match_title())
            .cmp(&fold(b.match_title()))
            .then_with(|| a.match_title().cmp(b.match_title()))
    });
    let total = matching.len();

    if query.filter.disables_paging() || query.per_page == 0 {
        return ListingPage {
            filter: query.filter.clone(),
            page: 1,
            total_pages: 1,
            total,
            items: matching,
        };
    }

    let total_pages = total.div_ceil(query.per_page).max(1);
    let page = query.page.max(1);
    let items = matching
        .into_iter()
        .skip((page - 1) * query.per_page)
        .take(query.per_page)
        .collect();
    ListingPage {
        filter: query.filter.clone(),
        page,
        total_pages,
        total,
        items,
    }
}

/// Case-insensitive prefix index over term titles.
pub struct TermIndex {
    map: Map<Vec<u8>>,
    groups: Vec<Vec<usize>>,
    titles: Vec<String>,
}

impl TermIndex {
    pub fn build<I, S>(titles: I) -> Result<Self, fst::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let titles: Vec<String> = titles
            .into_iter()
            .map(|title| normalize_title(title.as_ref()).to_string())
            .collect();
        let mut keyed: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, title) in titles.iter().enumerate() {
            if title.is_empty() {
                continue;
            }
            keyed.entry(fold(title)).or_default().push(idx);
        }

        let mut builder = MapBuilder::memory();
        let mut groups = Vec::with_capacity(keyed.len());
        for (key, indices) in keyed {
            builder.insert(&key, groups.len() as u64)?;
            groups.push(indices);
        }
        let map = builder.into_map();
        Ok(Self {
            map,
            groups,
            titles,
        })
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.map.contains_key(fold(normalize_title(title)))
    }

    /// Returns up to `limit` titles that start with `prefix`, ignoring case.
    pub fn prefix(&self, prefix: &str, limit: usize) -> Vec<&str> {
        let folded = fold(normalize_title(prefix));
        let automaton = Str::new(&folded).starts_with();
        let mut stream = self.map.search(automaton).into_stream();
        let mut results = Vec::new();
        while let Some((_, group)) = stream.next() {
            for &idx in &self.groups[group as usize] {
                if results.len() >= limit {
                    return results;
                }
                results.push(self.titles[idx].as_str());
            }
        }
        results
    }
}
