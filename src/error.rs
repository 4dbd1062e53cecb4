//! Diagnostic taxonomy.
//!
//! Grammar-author-facing defects are typed values, never panics: fatal
//! errors ([`GrammarError`]) abort an analysis with the full list of
//! offenders, warnings ([`GrammarWarning`]) ride along with a repaired
//! grammar, and LL(1) conflicts are collected into a [`ConflictReport`]
//! because resolving them takes grammar-design judgment the engine does not
//! have.  Panics are reserved for internal invariant violations.

use alloc::string::String;
use alloc::vec::Vec;
use thiserror::Error;

use crate::check::ExTerm;
use crate::production::ProductionRule;

/// Fatal defects: further analysis of the grammar is meaningless.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("grammar has no production rules")]
    EmptyGrammar,

    #[error("start symbol `{0}` does not head any production")]
    MissingStart(String),

    #[error("`{0}` is reserved for the empty string and cannot name a non-terminal")]
    ReservedName(String),

    #[error("unsupported macro `{symbol}` in production `{rule}`")]
    UnsupportedMacro { rule: String, symbol: String },

    #[error("non-terminal `{0}` can never derive a finite terminal string")]
    Unrealizable(String),
}

/// Non-fatal findings; the grammar is still usable as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarWarning {
    #[error("non-terminal `{0}` is unreachable from the start symbol")]
    UnreachableSymbol(String),
}

/// Two alternatives of the same head answer the same lookahead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("FIRST/FIRST conflict: `{head}` has {} alternatives answering `{lookahead}`", productions.len())]
pub struct FirstFirstConflict {
    pub head: String,
    pub lookahead: ExTerm,
    pub productions: Vec<ProductionRule>,
}

/// A nullable alternative's FIRST set overlaps FOLLOW of its head.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("FIRST/FOLLOW conflict: nullable alternative `{production}` clashes with FOLLOW({head})")]
pub struct FirstFollowConflict {
    pub head: String,
    pub production: ProductionRule,
    pub overlap: Vec<ExTerm>,
}

/// A parse-table cell that admits more than one production.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("LL(1) cell ({head}, {lookahead}) admits {} productions", candidates.len())]
pub struct TableConflict {
    pub head: String,
    pub lookahead: ExTerm,
    pub candidates: Vec<ProductionRule>,
}

/// Everything that makes a grammar non-LL(1), collected in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    pub first_first: Vec<FirstFirstConflict>,
    pub first_follow: Vec<FirstFollowConflict>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.first_first.is_empty() && self.first_follow.is_empty()
    }

    pub fn len(&self) -> usize {
        self.first_first.len() + self.first_follow.len()
    }
}
