//! tree-sitter-php parsing.
//!
//! The grammar tolerates malformed input: broken regions come back as
//! `ERROR` / `MISSING` nodes instead of failing the parse.

use crate::error::{ParseError, ParseResult};
use tree_sitter::{Parser, Tree};

/// PHP language parser
pub struct PhpParser {
    parser: Parser,
}

impl std::fmt::Debug for PhpParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhpParser")
            .field("language", &"PHP")
            .finish()
    }
}

impl PhpParser {
    /// Create a new PHP parser instance
    pub fn new() -> ParseResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
            .map_err(|e| ParseError::ParserInit {
                language: "PHP".to_string(),
                reason: format!("tree-sitter error: {e}"),
            })?;
        Ok(Self { parser })
    }

    /// Parse a full document. `None` only when tree-sitter gives up, which
    /// does not happen for syntax errors.
    pub fn parse(&mut self, source: &str) -> Option<Tree> {
        self.parser.parse(source, None)
    }

    /// Like [`Self::parse`], reporting a missing tree as an error for `uri`.
    pub fn parse_document(&mut self, uri: &str, source: &str) -> ParseResult<Tree> {
        self.parse(source).ok_or_else(|| ParseError::NoTree {
            uri: uri.to_string(),
        })
    }
}
