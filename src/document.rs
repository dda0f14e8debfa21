//! A parsed PHP document and its position helpers.

use crate::builder::{self, BuildOutput};
use crate::codec::DocumentRecord;
use crate::error::ParseResult;
use crate::indexing::file_info::{calculate_hash, get_utc_timestamp};
use crate::parsing::PhpParser;
use crate::resolve::DocumentContext;
use crate::storage::SymbolTableKind;
use crate::symbol::{ImportTable, Position, RefKind, Reference, ScopeVar, Symbol};

#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub uri: String,
    pub text: String,
    /// Last modification time, seconds since the epoch
    pub mtime: i64,
    pub content_hash: String,
    pub imports: ImportTable,
    /// Declarations in the order they were finished
    pub symbols: Vec<Symbol>,
    pub references: Vec<Reference>,
    /// Function, method and closure scopes
    pub scopes: Vec<ScopeVar>,
    /// Top-level variables
    pub globals: ScopeVar,
    line_starts: Vec<usize>,
}

impl SourceDocument {
    pub fn parse(
        parser: &mut PhpParser,
        uri: impl Into<String>,
        text: impl Into<String>,
        mtime: i64,
    ) -> ParseResult<Self> {
        let uri = uri.into();
        let text = text.into();
        let tree = parser.parse_document(&uri, &text)?;
        let BuildOutput {
            imports,
            globals,
            scopes,
            symbols,
            references,
        } = builder::build(&uri, &text, &tree);

        Ok(Self {
            content_hash: calculate_hash(&text),
            line_starts: line_starts(&text),
            uri,
            text,
            mtime,
            imports,
            symbols,
            references,
            scopes,
            globals,
        })
    }

    /// Parses with a throwaway parser.
    pub fn from_source(uri: impl Into<String>, text: impl Into<String>) -> ParseResult<Self> {
        let mut parser = PhpParser::new()?;
        Self::parse(&mut parser, uri, text, 0)
    }

    /// Declarations stored in the table for `kind`.
    pub fn symbols_in(&self, kind: SymbolTableKind) -> impl Iterator<Item = &Symbol> {
        self.symbols
            .iter()
            .filter(move |s| SymbolTableKind::of(s) == Some(kind))
    }

    /// Declarations ordered by where they start.
    pub fn symbols_in_source_order(&self) -> Vec<Symbol> {
        let mut symbols = self.symbols.clone();
        symbols.sort_by_key(|s| (s.location().start(), s.location().range.map(|r| r.end)));
        symbols
    }

    /// Innermost reference containing `offset`: smallest end, then latest
    /// start.
    pub fn reference_at(&self, offset: u32) -> Option<&Reference> {
        self.innermost(offset, |_| true)
    }

    /// Innermost call argument list containing `offset`.
    pub fn enclosing_call(&self, offset: u32) -> Option<&Reference> {
        self.innermost(offset, |r| r.ref_kind == RefKind::ArgumentList)
    }

    fn innermost(&self, offset: u32, accept: impl Fn(&Reference) -> bool) -> Option<&Reference> {
        self.references
            .iter()
            .filter(|r| r.location.contains(offset) && accept(r))
            .min_by_key(|r| {
                let range = r.range().unwrap_or_default();
                (range.end, std::cmp::Reverse(range.start))
            })
    }

    /// Resolution context: imports and variable scopes.
    pub fn context(&self) -> DocumentContext {
        DocumentContext {
            uri: self.uri.clone(),
            imports: self.imports.clone(),
            globals: self.globals.clone(),
            scopes: self.scopes.clone(),
        }
    }

    pub fn record(&self) -> DocumentRecord {
        DocumentRecord {
            uri: self.uri.clone(),
            mtime: self.mtime,
            content_hash: self.content_hash.clone(),
            indexed_at: get_utc_timestamp() as i64,
            imports: self.imports.clone(),
            globals: self.globals.clone(),
        }
    }

    /// Byte offset of an LSP position. `character` counts UTF-16 code
    /// units; positions past the end of a line clamp to the line end.
    pub fn get_offset(&self, line: u32, character: u32) -> u32 {
        let Some(&start) = self.line_starts.get(line as usize) else {
            return self.text.len() as u32;
        };
        let end = self
            .line_starts
            .get(line as usize + 1)
            .copied()
            .unwrap_or(self.text.len());
        let line_text = self.text[start..end].trim_end_matches(['\n', '\r']);

        let mut units = 0u32;
        for (index, ch) in line_text.char_indices() {
            if units >= character {
                return (start + index) as u32;
            }
            units += ch.len_utf16() as u32;
        }
        (start + line_text.len()) as u32
    }

    /// LSP position of a byte offset.
    pub fn get_position(&self, offset: u32) -> Position {
        let mut offset = (offset as usize).min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.line_starts.partition_point(|&s| s <= offset).saturating_sub(1);
        let start = self.line_starts.get(line).copied().unwrap_or(0);
        let character = self.text[start..offset].encode_utf16().count();
        Position::new(line as u32, character as u32)
    }
}

fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}
