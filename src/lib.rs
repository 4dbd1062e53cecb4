//! Context-free grammar definition and LL(1) preparation.
//!
//! Grammars come in as a start symbol plus [`ProductionRule`] values whose
//! bodies may use EBNF-style conveniences (optional and repeated
//! sub-sentences, alternation).  [`prepare`] normalizes them to plain BNF,
//! cleans out structural defects, computes FIRST/FOLLOW sets and builds an
//! LL(1) [`ParsingTable`], collecting every diagnostic along the way instead
//! of stopping at the first.
//!
//! ```
//! use ll_grammar::{prepare, ProductionSet, Sentence, Symbol};
//!
//! // E → T { + T }
//! let grammar = ProductionSet::builder("E")
//!     .rule("E", Sentence::new(vec![
//!         Symbol::non_terminal("T"),
//!         Symbol::Repetition(Sentence::new(vec![
//!             Symbol::literal("+", "+"),
//!             Symbol::non_terminal("T"),
//!         ])),
//!     ]))
//!     .rule("T", Sentence::new(vec![Symbol::literal("id", "id")]))
//!     .build()
//!     .unwrap();
//!
//! let report = prepare(grammar).unwrap();
//! assert!(report.is_ll1());
//! ```

#![no_std]
extern crate alloc;

use alloc::vec::Vec;
use log::{info, warn};

pub mod check;
pub mod error;
pub mod expand;
pub mod factor;
pub mod production;
pub mod reach;
pub mod recursion;
pub mod render;
pub mod symbol;
pub mod table;

pub use check::{ExTerm, GrammarSets};
pub use error::{
    ConflictReport, FirstFirstConflict, FirstFollowConflict, GrammarError, GrammarWarning,
    TableConflict,
};
pub use production::{
    ProductionRule, ProductionSet, ProductionSetBuilder, RewriteReason, Transformation,
    TransformationLog,
};
pub use recursion::{Cycle, Derivation};
pub use render::{Notation, render_rule, render_set};
pub use symbol::{Sentence, Symbol, Terminal};
pub use table::ParsingTable;

/// Everything [`prepare`] produces: the cleaned grammar, its sets and
/// table, plus the non-fatal findings made along the way.
#[derive(Debug, Clone)]
pub struct Ll1Report {
    /// The macro-free, cleaned, factored grammar the table was built from.
    /// Its transformation log records every rewrite applied to the input.
    pub grammar: ProductionSet,
    pub sets: GrammarSets,
    pub table: ParsingTable,
    /// Unreachable symbols that were removed.
    pub warnings: Vec<GrammarWarning>,
    /// Left-recursion cycles that were eliminated, with derivation chains.
    pub cycles: Vec<Cycle>,
    /// FIRST/FIRST and FIRST/FOLLOW overlaps left after factorization.
    pub conflicts: ConflictReport,
}

impl Ll1Report {
    pub fn is_ll1(&self) -> bool {
        self.conflicts.is_empty() && self.table.is_ll1()
    }
}

/// Runs the full preparation pipeline: macro expansion, realizability
/// check, unreachable-rule removal, left-recursion elimination,
/// left-factorization, FIRST/FOLLOW computation and table construction.
///
/// Fatal problems (unsupported macros, unrealizable non-terminals) abort
/// with the collected error list.  Removed unreachable symbols, eliminated
/// cycles and residual LL(1) conflicts are not fatal; they are carried in
/// the report for the caller to audit.
pub fn prepare(grammar: ProductionSet) -> Result<Ll1Report, Vec<GrammarError>> {
    let expanded = expand::expand(&grammar).map_err(|e| alloc::vec![e])?;
    reach::check_realizable(&expanded)?;

    let (reached, warnings) = reach::remove_unreachable(&expanded);
    for warning in &warnings {
        warn!("{warning}");
    }

    let (unrecursive, cycles) = recursion::eliminate(&reached);
    let factored = factor::factor(&unrecursive);

    let sets = GrammarSets::calculate(&factored);
    let conflicts = factor::find_conflicts(&factored, &sets);
    let table = ParsingTable::build(&factored, &sets);

    info!(
        "prepared grammar `{}`: {} rules, {} rewrites, {} conflicts",
        factored.start(),
        factored.rules().len(),
        factored.log().len(),
        conflicts.len()
    );

    Ok(Ll1Report {
        grammar: factored,
        sets,
        table,
        warnings,
        cycles,
        conflicts,
    })
}
