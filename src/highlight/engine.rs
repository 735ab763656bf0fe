//! Highlighting Engine
//!
//! Staged regex rewriting over escaped text. Comments and strings are
//! swapped out for numbered placeholders before the looser passes run,
//! then restored in one final pass.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::keywords::KeywordRegistry;
use crate::document::Language;

/// Visual category of a highlighted span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comment,
    String,
    Number,
    Keyword,
    Tag,
    Plain,
}

impl TokenKind {
    /// CSS class used for the span, `None` for unwrapped plain text
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            TokenKind::Comment => Some("tok-comment"),
            TokenKind::String => Some("tok-string"),
            TokenKind::Number => Some("tok-number"),
            TokenKind::Keyword => Some("tok-keyword"),
            TokenKind::Tag => Some("tok-tag"),
            TokenKind::Plain => None,
        }
    }

    /// Wrap already-escaped text in this kind's span
    pub fn wrap(self, text: &str) -> String {
        match self.css_class() {
            Some(class) => format!("<span class=\"{}\">{}</span>", class, text),
            None => text.to_string(),
        }
    }
}

struct Patterns {
    protected: Regex,
    number: Regex,
    tag: Regex,
    placeholder: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        // One leftmost-first scan: whichever of comment or string starts
        // first owns the text up to its end.
        protected: Regex::new(
            r#"(?P<comment>(?s:/\*.*?\*/)|//[^\n]*)|(?P<string>"(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'|`(?:\\.|[^`])*`)"#,
        )
        .expect("valid protection pattern"),
        number: Regex::new(r"\b\d+(?:\.\d+)?\b").expect("valid number pattern"),
        tag: Regex::new(r"(&lt;/?)([a-zA-Z][a-zA-Z0-9-]*)([^&]*?&gt;)")
            .expect("valid tag pattern"),
        placeholder: Regex::new(r"___TOKEN_(\d+)___").expect("valid placeholder pattern"),
    })
}

/// Spans taken out of the text during one `highlight` call
#[derive(Debug, Default)]
struct Protected {
    records: Vec<String>,
}

impl Protected {
    fn protect(&mut self, kind: TokenKind, text: &str) -> String {
        let id = self.records.len();
        self.records.push(kind.wrap(text));
        format!("___TOKEN_{}___", id)
    }

    fn restore(&self, text: &str) -> String {
        patterns()
            .placeholder
            .replace_all(text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|id| self.records.get(id))
                    .cloned()
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

/// Regex highlighter producing HTML with `tok-*` span classes
#[derive(Debug, Clone)]
pub struct Highlighter {
    keywords: KeywordRegistry,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(KeywordRegistry::with_defaults())
    }
}

impl Highlighter {
    pub fn new(keywords: KeywordRegistry) -> Self {
        Self { keywords }
    }

    pub fn keywords(&self) -> &KeywordRegistry {
        &self.keywords
    }

    /// Highlight raw, un-annotated text.
    ///
    /// Never fails: anything no pass recognises comes back escaped but
    /// unclassified. Feeding already highlighted output back in is not
    /// supported.
    pub fn highlight(&self, text: &str, language: Language) -> String {
        if text.is_empty() {
            return String::new();
        }

        let patterns = patterns();
        let mut protected = Protected::default();

        let escaped = escape_html(text);

        let mut highlighted = patterns
            .protected
            .replace_all(&escaped, |caps: &Captures| {
                let kind = if caps.name("comment").is_some() {
                    TokenKind::Comment
                } else {
                    TokenKind::String
                };
                protected.protect(kind, &caps[0])
            })
            .into_owned();

        highlighted = patterns
            .number
            .replace_all(&highlighted, |caps: &Captures| TokenKind::Number.wrap(&caps[0]))
            .into_owned();

        highlighted = match language {
            Language::Script | Language::Style => match self.keywords.pattern(language) {
                Some(pattern) => replace_outside_markup(&highlighted, pattern, TokenKind::Keyword),
                None => highlighted,
            },
            Language::Markup => patterns
                .tag
                .replace_all(&highlighted, |caps: &Captures| {
                    format!("{}{}{}", &caps[1], TokenKind::Tag.wrap(&caps[2]), &caps[3])
                })
                .into_owned(),
        };

        protected.restore(&highlighted)
    }
}

/// Highlight with the default keyword sets.
pub fn highlight(text: &str, language: Language) -> String {
    static DEFAULT: OnceLock<Highlighter> = OnceLock::new();
    DEFAULT.get_or_init(Highlighter::default).highlight(text, language)
}

/// Escape the characters that would otherwise be read as markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Apply `pattern` only to plain text, leaving markup and entities alone.
///
/// After escaping, every literal `<` in the text opens markup added by an
/// earlier pass and every `&` opens an entity reference, so tag attributes
/// and entity names are never matched as keywords.
fn replace_outside_markup(text: &str, pattern: &Regex, kind: TokenKind) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(['<', '&']) {
        let (plain, tail) = rest.split_at(start);
        out.push_str(&pattern.replace_all(plain, |caps: &Captures| kind.wrap(&caps[0])));

        let close = if tail.starts_with('<') { '>' } else { ';' };
        let end = tail.find(close).map_or(tail.len(), |i| i + 1);
        out.push_str(&tail[..end]);
        rest = &tail[end..];
    }

    out.push_str(&pattern.replace_all(rest, |caps: &Captures| kind.wrap(&caps[0])));
    out
}
