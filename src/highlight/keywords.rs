//! Keyword Registry
//!
//! Keyword sets per language, kept as data so they can be extended from
//! TOML without touching the highlighting passes.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::document::Language;

/// Root keyword file structure (matches TOML)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct KeywordFile {
    #[serde(default)]
    pub languages: Vec<KeywordSetDef>,
}

/// Keywords contributed for one language
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct KeywordSetDef {
    pub language: Language,
    pub keywords: Vec<String>,
    /// Drop previously registered words for this language first
    #[serde(default)]
    pub replace: bool,
}

/// Keyword sets with their compiled match patterns
#[derive(Debug, Clone, Default)]
pub struct KeywordRegistry {
    sets: HashMap<Language, Vec<String>>,
    patterns: HashMap<Language, Regex>,
}

impl KeywordRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry loaded with the embedded default keyword sets
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.add_embedded_defaults();
        registry
    }

    /// Add the embedded keyword sets
    pub fn add_embedded_defaults(&mut self) {
        let embedded_toml = include_str!("../../resources/keywords.toml");

        match toml::from_str::<KeywordFile>(embedded_toml) {
            Ok(file) => self.merge(file),
            Err(e) => {
                log::warn!(
                    "Failed to parse embedded keyword sets: {}. Using minimal fallback.",
                    e
                );
                self.add_minimal_defaults();
            }
        }
    }

    fn add_minimal_defaults(&mut self) {
        self.add_keywords(
            Language::Script,
            ["const", "let", "var", "function", "return", "if", "else"],
        );
        self.add_keywords(Language::Style, ["color", "background", "margin", "padding"]);
    }

    /// Merge a parsed keyword file into the registry
    pub fn merge(&mut self, file: KeywordFile) {
        for set in file.languages {
            if set.replace {
                self.replace_keywords(set.language, set.keywords);
            } else {
                self.add_keywords(set.language, set.keywords);
            }
        }
    }

    /// Parse keyword sets from TOML text and merge them
    pub fn merge_toml(&mut self, content: &str) -> Result<()> {
        let file: KeywordFile = toml::from_str(content).context("invalid keyword file")?;
        self.merge(file);
        Ok(())
    }

    /// Load and merge a keyword file from disk
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read keyword file {}", path.display()))?;
        self.merge_toml(&content)
            .with_context(|| format!("failed to load keyword file {}", path.display()))?;
        log::info!("Loaded keyword sets from {:?}", path);
        Ok(())
    }

    /// Add words to a language, ignoring blanks and duplicates
    pub fn add_keywords<I, S>(&mut self, language: Language, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = self.sets.entry(language).or_default();
        for keyword in keywords {
            let keyword = keyword.into().trim().to_string();
            if !keyword.is_empty() && !set.contains(&keyword) {
                set.push(keyword);
            }
        }
        self.rebuild(language);
    }

    /// Replace all words of a language
    pub fn replace_keywords<I, S>(&mut self, language: Language, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sets.remove(&language);
        self.add_keywords(language, keywords);
    }

    pub fn keywords(&self, language: Language) -> &[String] {
        self.sets.get(&language).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Compiled pattern matching any keyword of the language
    pub fn pattern(&self, language: Language) -> Option<&Regex> {
        self.patterns.get(&language)
    }

    fn rebuild(&mut self, language: Language) {
        match build_pattern(self.keywords(language)) {
            Some(pattern) => {
                self.patterns.insert(language, pattern);
            }
            None => {
                self.patterns.remove(&language);
            }
        }
    }
}

/// Build one alternation over the keywords. Word boundaries are only
/// asserted on edges that are word characters, so at-rules like `@media`
/// still match. Longer words go first so `font-size` wins over `font`.
fn build_pattern(keywords: &[String]) -> Option<Regex> {
    if keywords.is_empty() {
        return None;
    }

    let mut sorted: Vec<&String> = keywords.iter().collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternatives: Vec<String> = sorted
        .into_iter()
        .map(|keyword| {
            let lead = if starts_with_word_char(keyword) { r"\b" } else { "" };
            let trail = if ends_with_word_char(keyword) { r"\b" } else { "" };
            format!("{}{}{}", lead, regex::escape(keyword), trail)
        })
        .collect();

    match Regex::new(&alternatives.join("|")) {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            log::warn!("Failed to compile keyword pattern: {}", e);
            None
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn starts_with_word_char(s: &str) -> bool {
    s.chars().next().is_some_and(is_word_char)
}

fn ends_with_word_char(s: &str) -> bool {
    s.chars().next_back().is_some_and(is_word_char)
}
