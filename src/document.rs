//! Document Model
//!
//! Language detection, path handling and new-file templates for the
//! editable pages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Highlighting language of a document, derived from its path suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// HTML and anything without a recognised suffix
    #[default]
    #[serde(alias = "html")]
    Markup,
    /// Stylesheets
    #[serde(alias = "css")]
    Style,
    /// Scripts
    #[serde(alias = "js", alias = "javascript")]
    Script,
}

impl Language {
    /// Detect the language from a storage path.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".css") {
            Language::Style
        } else if lower.ends_with(".js") {
            Language::Script
        } else {
            Language::Markup
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Markup => "markup",
            Language::Style => "style",
            Language::Script => "script",
        }
    }

    /// File extension used when a new file of this kind is created
    pub fn extension(self) -> &'static str {
        match self {
            Language::Markup => "html",
            Language::Style => "css",
            Language::Script => "js",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markup" | "html" => Ok(Language::Markup),
            "style" | "css" => Ok(Language::Style),
            "script" | "js" | "javascript" => Ok(Language::Script),
            other => Err(format!("unknown language '{}'", other)),
        }
    }
}

/// An open document: the text being edited and the text last persisted
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: String,
    pub raw_text: String,
    pub saved_text: String,
    pub language: Language,
}

impl Document {
    /// Create a clean document from freshly loaded (or freshly written) content.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let content = content.into();
        let language = Language::from_path(&path);
        Self {
            path,
            raw_text: content.clone(),
            saved_text: content,
            language,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.raw_text != self.saved_text
    }

    pub fn is_html(&self) -> bool {
        self.language == Language::Markup
            && self.path.to_ascii_lowercase().ends_with(".html")
    }
}

/// Strip leading path separators so the path is always storage-relative.
pub fn normalize_path(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

/// Append the template's extension unless the path already carries a
/// page extension (case-insensitive).
pub fn ensure_extension(path: &str, template: Language) -> String {
    let lower = path.to_ascii_lowercase();
    let has_page_extension = [".html", ".css", ".js"]
        .iter()
        .any(|ext| lower.ends_with(ext));

    if has_page_extension {
        path.to_string()
    } else {
        format!("{}.{}", path, template.extension())
    }
}

/// Starter content for a newly created file
pub fn template_content(template: Language) -> &'static str {
    match template {
        Language::Style => "/* Styles for WebPages */\nbody {\n  font-family: sans-serif;\n}",
        Language::Script => "// JavaScript for WebPages\nconsole.log('WebPages ready')",
        Language::Markup => concat!(
            "<!doctype html>\n",
            "<html>\n",
            "  <head>\n",
            "    <meta charset=\"utf-8\">\n",
            "    <title>New Page</title>\n",
            "    <link rel=\"stylesheet\" href=\"styles.css\">\n",
            "  </head>\n",
            "  <body>\n",
            "    <h1>Hello from WebPages</h1>\n",
            "    <script src=\"app.js\"></script>\n",
            "  </body>\n",
            "</html>\n",
        ),
    }
}

/// Human readable file size (B, KB, MB).
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
