//! Token table and source ranges for the SysY front end.
//!
//! The parser appends every token it produces to the [`SourceManager`];
//! all later passes only read from it. Ranges are 1-based and inclusive in
//! both line and column.

use std::fmt;
use std::num::NonZeroU32;

/// Interned string, shared across the whole compilation.
pub type Symbol = symbol_table::GlobalSymbol;

/// Index of a token in the source map.
///
/// Ids are handed out in append order, so comparing ids compares source
/// positions. This is what the resolver's declaration-before-use rule
/// relies on.
pub type TokenId = NonZeroU32;

/// A contiguous region of the source file.
///
/// `(0, 0, 0, 0)` is the empty range, used for compiler-synthesized nodes;
/// it never appears in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceRange {
    pub begin_line: u32,
    pub begin_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl SourceRange {
    pub fn new(begin_line: u32, begin_col: u32, end_line: u32, end_col: u32) -> Self {
        SourceRange {
            begin_line,
            begin_col,
            end_line,
            end_col,
        }
    }

    /// The empty range, identity element of [`SourceRange::join`].
    pub fn empty() -> Self {
        SourceRange::default()
    }

    pub fn is_empty(&self) -> bool {
        self.begin_line == 0
    }

    /// Join two ranges into the smallest range covering both: earliest
    /// begin, latest end. Commutative; the empty range is the identity.
    pub fn join(self, other: SourceRange) -> SourceRange {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let begin = if (other.begin_line, other.begin_col) < (self.begin_line, self.begin_col) {
            (other.begin_line, other.begin_col)
        } else {
            (self.begin_line, self.begin_col)
        };
        let end = if (other.end_line, other.end_col) > (self.end_line, self.end_col) {
            (other.end_line, other.end_col)
        } else {
            (self.end_line, self.end_col)
        };
        SourceRange::new(begin.0, begin.1, end.0, end.1)
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "<builtin>");
        }
        write!(
            f,
            "{}:{}-{}:{}",
            self.begin_line, self.begin_col, self.end_line, self.end_col
        )
    }
}

/// One token as produced by the lexer.
#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub text: Symbol,
    pub range: SourceRange,
}

/// Append-only table of tokens, plus the name of the file they came from.
///
/// Built by the parser, read-only afterwards.
#[derive(Debug)]
pub struct SourceManager {
    file_name: String,
    tokens: Vec<Token>,
}

impl SourceManager {
    pub fn new(file_name: impl Into<String>) -> Self {
        SourceManager {
            file_name: file_name.into(),
            tokens: Vec::new(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn add_token(&mut self, text: &str, range: SourceRange) -> TokenId {
        self.tokens.push(Token {
            text: Symbol::from(text),
            range,
        });
        TokenId::new(self.tokens.len() as u32).expect("token table overflow")
    }

    pub fn get_token(&self, id: TokenId) -> &Token {
        &self.tokens[(id.get() - 1) as usize]
    }

    pub fn token_text(&self, id: TokenId) -> Symbol {
        self.get_token(id).text
    }

    pub fn token_range(&self, id: TokenId) -> SourceRange {
        self.get_token(id).range
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_ids_are_append_ordered() {
        let mut src = SourceManager::new("t.sy");
        let a = src.add_token("int", SourceRange::new(1, 1, 1, 3));
        let b = src.add_token("main", SourceRange::new(1, 5, 1, 8));
        assert!(a < b);
        assert_eq!(src.token_text(b).as_str(), "main");
        assert_eq!(src.len(), 2);
    }

    #[test]
    fn join_takes_earliest_begin_and_latest_end() {
        let a = SourceRange::new(2, 4, 2, 9);
        let b = SourceRange::new(1, 8, 3, 1);
        let joined = a.join(b);
        assert_eq!(joined, SourceRange::new(1, 8, 3, 1));
        assert_eq!(a.join(b), b.join(a));
    }

    #[test]
    fn join_empty_is_identity() {
        let a = SourceRange::new(4, 1, 4, 7);
        assert_eq!(a.join(SourceRange::empty()), a);
        assert_eq!(SourceRange::empty().join(a), a);
    }
}
