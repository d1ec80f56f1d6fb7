//! A deliberately small markup tokenizer: tags, comments, bracket
//! shortcodes and the text between them. No tree is built.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    Comment,
    /// A `[name ...]`, `[/name]` or `[name ... /]` shortcode.
    Shortcode {
        name: String,
        closing: bool,
        self_closing: bool,
    },
    Tag {
        name: String,
        closing: bool,
        self_closing: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Byte offset of `raw` within the tokenized input.
    pub start: usize,
    pub raw: &'a str,
}

impl Token<'_> {
    pub fn span(&self) -> Range<usize> {
        self.start..self.start + self.raw.len()
    }
}

/// Splits `input` into tokens. Unterminated `<` or `[` stay part of the text.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;
    while pos < bytes.len() {
        let end = match bytes[pos] {
            b'<' => markup_end(bytes, pos),
            b'[' => shortcode_end(bytes, pos),
            _ => None,
        };
        let Some(end) = end else {
            pos += 1;
            continue;
        };
        if text_start < pos {
            tokens.push(Token {
                kind: TokenKind::Text,
                start: text_start,
                raw: &input[text_start..pos],
            });
        }
        let raw = &input[pos..end];
        tokens.push(Token {
            kind: classify(raw),
            start: pos,
            raw,
        });
        pos = end;
        text_start = end;
    }
    if text_start < bytes.len() {
        tokens.push(Token {
            kind: TokenKind::Text,
            start: text_start,
            raw: &input[text_start..],
        });
    }
    tokens
}

fn markup_end(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes[start..].starts_with(b"<!--") {
        return find(bytes, start + 4, b"-->").map(|idx| idx + 3);
    }
    match bytes.get(start + 1) {
        Some(b) if b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?') => {}
        _ => return None,
    }
    let mut quote = None;
    for (idx, &b) in bytes.iter().enumerate().skip(start + 1) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(idx + 1),
            (None, b'<') => return None,
            _ => {}
        }
    }
    None
}

fn shortcode_end(bytes: &[u8], start: usize) -> Option<usize> {
    for (idx, &b) in bytes.iter().enumerate().skip(start + 1) {
        match b {
            b']' => return Some(idx + 1),
            b'[' | b'<' | b'\n' => return None,
            _ => {}
        }
    }
    None
}

fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|idx| idx + from)
}

fn classify(raw: &str) -> TokenKind {
    if raw.starts_with("<!--") {
        return TokenKind::Comment;
    }
    let inner = &raw[1..raw.len() - 1];
    let closing = inner.starts_with('/');
    let self_closing = inner.ends_with('/');
    let name = inner
        .trim_start_matches('/')
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-'))
        .collect::<String>()
        .to_ascii_lowercase();
    if raw.starts_with('[') {
        return TokenKind::Shortcode {
            name,
            closing,
            self_closing,
        };
    }
    TokenKind::Tag {
        name,
        closing,
        self_closing,
    }
}

/// Open-element counters for the regions where terms must not be linked.
#[derive(Debug, Default)]
struct Exclusions {
    anchor: usize,
    heading: usize,
    raw_text: usize,
    /// Open enclosing shortcodes by name. Only names that are closed
    /// somewhere in the document enclose anything.
    shortcodes: HashMap<String, usize>,
}

impl Exclusions {
    fn track(&mut self, name: &str, closing: bool) {
        let depth = match name {
            "a" => &mut self.anchor,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => &mut self.heading,
            "script" | "style" | "textarea" => &mut self.raw_text,
            _ => return,
        };
        step(depth, closing);
    }

    fn track_shortcode(&mut self, name: &str, closing: bool) {
        step(self.shortcodes.entry(name.to_string()).or_default(), closing);
    }

    fn is_clear(&self) -> bool {
        self.anchor == 0
            && self.heading == 0
            && self.raw_text == 0
            && self.shortcodes.values().all(|depth| *depth == 0)
    }
}

fn step(depth: &mut usize, closing: bool) {
    if closing {
        *depth = depth.saturating_sub(1);
    } else {
        *depth += 1;
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-')
}

/// First match of `word` in `text` not touching a word character on either
/// side. The ends of `text` count as boundaries.
pub fn find_word(text: &str, word: &Regex) -> Option<Range<usize>> {
    let mut pos = 0;
    while let Some(found) = word.find_at(text, pos) {
        let before = text[..found.start()].chars().next_back();
        let after = text[found.end()..].chars().next();
        if !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char) {
            return Some(found.range());
        }
        pos = found.start() + text[found.start()..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// Finds the first whole-word match of `word` in a text run outside anchors,
/// headings, raw-text elements and paired shortcodes. Tags, comments and
/// shortcodes themselves are never searched.
pub fn find_in_text(content: &str, word: &Regex) -> Option<Range<usize>> {
    let tokens = tokenize(content);
    let closed: HashSet<&str> = tokens
        .iter()
        .filter_map(|token| match &token.kind {
            TokenKind::Shortcode {
                name,
                closing: true,
                ..
            } => Some(name.as_str()),
            _ => None,
        })
        .collect();

    let mut exclusions = Exclusions::default();
    for token in &tokens {
        match &token.kind {
            TokenKind::Tag {
                name,
                closing,
                self_closing,
            } => {
                if !self_closing {
                    exclusions.track(name, *closing);
                }
            }
            TokenKind::Shortcode {
                name,
                closing,
                self_closing,
            } => {
                if !self_closing && closed.contains(name.as_str()) {
                    exclusions.track_shortcode(name, *closing);
                }
            }
            TokenKind::Text if exclusions.is_clear() => {
                if let Some(found) = find_word(token.raw, word) {
                    return Some(token.start + found.start..token.start + found.end);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<(String, &str)> {
        tokenize(input)
            .into_iter()
            .map(|token| {
                let label = match token.kind {
                    TokenKind::Text => "text".to_string(),
                    TokenKind::Comment => "comment".to_string(),
                    TokenKind::Shortcode { name, closing, .. } => {
                        if closing {
                            format!("[/{name}]")
                        } else {
                            format!("[{name}]")
                        }
                    }
                    TokenKind::Tag { name, closing, .. } => {
                        if closing {
                            format!("/{name}")
                        } else {
                            name
                        }
                    }
                };
                (label, token.raw)
            })
            .collect()
    }

    #[test]
    fn splits_tags_shortcodes_and_text() {
        assert_eq!(
            kinds(r#"<p class="x">Hi [b id=1]there[/b]</p>"#),
            vec![
                ("p".to_string(), r#"<p class="x">"#),
                ("text".to_string(), "Hi "),
                ("[b]".to_string(), "[b id=1]"),
                ("text".to_string(), "there"),
                ("[/b]".to_string(), "[/b]"),
                ("/p".to_string(), "</p>"),
            ]
        );
    }

    #[test]
    fn quoted_angle_brackets_stay_inside_tag() {
        let tokens = kinds(r#"<img alt="a > b">tail"#);
        assert_eq!(tokens[0].1, r#"<img alt="a > b">"#);
        assert_eq!(tokens[1], ("text".to_string(), "tail"));
    }

    #[test]
    fn stray_brackets_are_text() {
        assert_eq!(
            kinds("1 < 2 and [unclosed"),
            vec![("text".to_string(), "1 < 2 and [unclosed")]
        );
    }

    #[test]
    fn comments_are_single_tokens() {
        let tokens = kinds("a<!-- <b>alpha</b> -->c");
        assert_eq!(tokens[1], ("comment".to_string(), "<!-- <b>alpha</b> -->"));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn spans_cover_input_without_gaps() {
        let input = "x<br/>y [sc] é<i>z</i>";
        let tokens = tokenize(input);
        let mut cursor = 0;
        for token in &tokens {
            assert_eq!(token.span().start, cursor);
            cursor = token.span().end;
        }
        assert_eq!(cursor, input.len());
    }

    fn alpha() -> Regex {
        Regex::new("(?i)alpha").expect("regex")
    }

    #[test]
    fn find_word_checks_both_sides() {
        let text = "alphabet _alpha alpha-beta ALPHA.";
        let span = find_word(text, &alpha()).expect("found");
        assert_eq!(span, 27..32);
        assert_eq!(find_word("alpha", &alpha()), Some(0..5));
        assert_eq!(find_word("alphas and xalpha", &alpha()), None);
    }

    #[test]
    fn find_in_text_skips_excluded_regions() {
        let content = "<h1>Alpha</h1><script>alpha</script>[x alpha]<a>alpha</a><p>ALPHA</p>";
        let span = find_in_text(content, &alpha()).expect("found");
        assert_eq!(&content[span], "ALPHA");
    }

    #[test]
    fn find_in_text_returns_none_when_only_excluded() {
        assert_eq!(find_in_text(r#"<a title="alpha">alpha</a>"#, &alpha()), None);
    }

    #[test]
    fn paired_shortcodes_enclose_their_text() {
        let content = "x [caption id=1] the alpha photo [/caption] y";
        assert_eq!(find_in_text(content, &alpha()), None);

        let content = "[caption]alpha[/caption] then alpha";
        assert_eq!(find_in_text(content, &alpha()), Some(30..35));
    }

    #[test]
    fn unpaired_and_self_closing_shortcodes_enclose_nothing() {
        let content = "[gallery ids=1,2] alpha";
        assert_eq!(find_in_text(content, &alpha()), Some(18..23));

        let content = "[embed /] alpha [/other]";
        assert_eq!(find_in_text(content, &alpha()), Some(10..15));
    }

    #[test]
    fn long_text_runs_are_searched() {
        let content = "word ".repeat(200_000) + "alpha end";
        let span = find_in_text(&content, &alpha()).expect("found");
        assert_eq!(span.start, 1_000_000);
    }
}
