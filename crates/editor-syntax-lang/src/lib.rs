#![warn(missing_docs)]
//! `editor-syntax-lang` - language identifiers and data-driven language configuration for
//! `editor-syntax`.
//!
//! This crate intentionally stays lightweight and does **not** depend on any lexing or folding
//! machinery. It answers two questions for the rest of the workspace:
//! - which built-in language does a (possibly user supplied) id or file extension refer to?
//! - which comment tokens does that language use?

use std::fmt;

/// Canonical id of the plain-text language, used whenever nothing better is known.
pub const PLAIN_TEXT_ID: &str = "plaintext";

/// The closed set of languages `editor-syntax` ships lexers and fold extractors for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageId {
    /// No highlighting, no folding.
    #[default]
    PlainText,
    /// Java.
    Java,
    /// JavaScript (including JSX/module variants).
    JavaScript,
    /// JSON.
    Json,
    /// Markdown (CommonMark flavoured).
    Markdown,
}

impl LanguageId {
    /// All built-in languages.
    pub const ALL: [LanguageId; 5] = [
        LanguageId::PlainText,
        LanguageId::Java,
        LanguageId::JavaScript,
        LanguageId::Json,
        LanguageId::Markdown,
    ];

    /// Resolve a language id (case-insensitive, aliases accepted).
    ///
    /// Unknown ids resolve to [`LanguageId::PlainText`].
    pub fn from_id(id: &str) -> Self {
        match normalize_language_id(id).as_str() {
            "java" => Self::Java,
            "javascript" | "js" | "jsx" | "mjs" | "cjs" | "javascriptreact" => Self::JavaScript,
            "json" | "jsonc" | "json5" => Self::Json,
            "markdown" | "md" | "mdown" | "mkd" => Self::Markdown,
            _ => Self::PlainText,
        }
    }

    /// Detect a language from a file extension (with or without the leading dot).
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "java" => Self::Java,
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "json" | "jsonc" => Self::Json,
            "md" | "markdown" | "mdown" | "mkd" => Self::Markdown,
            _ => Self::PlainText,
        }
    }

    /// Canonical (normalized) id string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => PLAIN_TEXT_ID,
            Self::Java => "java",
            Self::JavaScript => "javascript",
            Self::Json => "json",
            Self::Markdown => "markdown",
        }
    }

    /// Comment tokens used by this language.
    pub fn comment_config(&self) -> CommentConfig {
        match self {
            Self::Java | Self::JavaScript => CommentConfig::line_and_block("//", "/*", "*/"),
            Self::Markdown => CommentConfig::block("<!--", "-->"),
            Self::PlainText | Self::Json => CommentConfig::default(),
        }
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a language id for registry lookups.
///
/// Trims surrounding whitespace, lowercases, and maps known aliases of built-in languages to their
/// canonical id (`"JS"` → `"javascript"`). Ids that are not built-in are returned trimmed and
/// lowercased so hosts can register their own languages under them. An empty id normalizes to
/// [`PLAIN_TEXT_ID`].
pub fn normalize_language_id(id: &str) -> String {
    let lowered = id.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return PLAIN_TEXT_ID.to_string();
    }
    let canonical = match lowered.as_str() {
        "js" | "jsx" | "mjs" | "cjs" | "javascriptreact" => "javascript",
        "jsonc" | "json5" => "json",
        "md" | "mdown" | "mkd" => "markdown",
        "text" | "txt" | "plain" | "plain_text" | "plain-text" => PLAIN_TEXT_ID,
        other => return other.to_string(),
    };
    canonical.to_string()
}

/// Comment tokens/config for a given language.
///
/// Lexers and fold extractors use this to recognise comments in a language-agnostic way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentConfig {
    /// Line comment token (e.g. `//`, `#`).
    pub line: Option<String>,
    /// Block comment start token (e.g. `/*`).
    pub block_start: Option<String>,
    /// Block comment end token (e.g. `*/`).
    pub block_end: Option<String>,
}

impl CommentConfig {
    /// Create a config that supports only line comments.
    pub fn line(token: impl Into<String>) -> Self {
        Self {
            line: Some(token.into()),
            block_start: None,
            block_end: None,
        }
    }

    /// Create a config that supports only block comments.
    pub fn block(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            line: None,
            block_start: Some(start.into()),
            block_end: Some(end.into()),
        }
    }

    /// Create a config that supports both line and block comments.
    pub fn line_and_block(
        line: impl Into<String>,
        block_start: impl Into<String>,
        block_end: impl Into<String>,
    ) -> Self {
        Self {
            line: Some(line.into()),
            block_start: Some(block_start.into()),
            block_end: Some(block_end.into()),
        }
    }

    /// Returns `true` if a line comment token is configured.
    pub fn has_line(&self) -> bool {
        self.line.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Returns `true` if both block comment tokens are configured.
    pub fn has_block(&self) -> bool {
        self.block_start.as_deref().is_some_and(|s| !s.is_empty())
            && self.block_end.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// The line comment token, if configured and non-empty.
    pub fn line_token(&self) -> Option<&str> {
        self.line.as_deref().filter(|s| !s.is_empty())
    }

    /// The `(start, end)` block comment tokens, if both are configured.
    pub fn block_tokens(&self) -> Option<(&str, &str)> {
        if !self.has_block() {
            return None;
        }
        Some((self.block_start.as_deref()?, self.block_end.as_deref()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_builtin_languages() {
        assert_eq!(LanguageId::from_id("JS"), LanguageId::JavaScript);
        assert_eq!(LanguageId::from_id("  Java "), LanguageId::Java);
        assert_eq!(LanguageId::from_id("md"), LanguageId::Markdown);
        assert_eq!(LanguageId::from_id("jsonc"), LanguageId::Json);
        assert_eq!(LanguageId::from_id("cobol"), LanguageId::PlainText);
    }

    #[test]
    fn test_normalize_keeps_unknown_ids() {
        assert_eq!(normalize_language_id("JavaScript"), "javascript");
        assert_eq!(normalize_language_id("jsx"), "javascript");
        assert_eq!(normalize_language_id("Rust"), "rust");
        assert_eq!(normalize_language_id(""), PLAIN_TEXT_ID);
        assert_eq!(normalize_language_id("TXT"), PLAIN_TEXT_ID);
    }

    #[test]
    fn test_extension_detection() {
        assert_eq!(LanguageId::from_extension(".java"), LanguageId::Java);
        assert_eq!(LanguageId::from_extension("MJS"), LanguageId::JavaScript);
        assert_eq!(LanguageId::from_extension("markdown"), LanguageId::Markdown);
        assert_eq!(LanguageId::from_extension("rs"), LanguageId::PlainText);
    }

    #[test]
    fn test_canonical_ids_round_trip() {
        for lang in LanguageId::ALL {
            assert_eq!(LanguageId::from_id(lang.as_str()), lang);
            assert_eq!(normalize_language_id(lang.as_str()), lang.as_str());
        }
    }

    #[test]
    fn test_comment_config_tokens() {
        let java = LanguageId::Java.comment_config();
        assert!(java.has_line());
        assert_eq!(java.line_token(), Some("//"));
        assert_eq!(java.block_tokens(), Some(("/*", "*/")));

        let json = LanguageId::Json.comment_config();
        assert!(!json.has_line());
        assert!(json.block_tokens().is_none());

        let partial = CommentConfig {
            line: Some(String::new()),
            block_start: Some("/*".to_string()),
            block_end: None,
        };
        assert!(!partial.has_line());
        assert!(!partial.has_block());
    }
}
