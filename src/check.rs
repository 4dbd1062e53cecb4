//! FIRST/FOLLOW set calculator.
//!
//! Both sets are least fixpoints computed by iterated relaxation: every pass
//! walks all rules and merges new facts, and the loop stops on the first
//! pass that changes nothing.  Correctness does not depend on rule
//! visitation order, only on running each pass to quiescence, so the sets
//! come out the same for any rule ordering.
//!
//! A [`GrammarSets`] value is bound to the grammar snapshot it was computed
//! from.  It does not observe later rewrites – recompute after any
//! structural change.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use hashbrown::{HashMap, HashSet};
use log::{debug, trace};

use crate::production::ProductionSet;
use crate::symbol::{END_MARK, EPSILON, Symbol, Terminal};

/// Extended terminal domain used by LL(1) set algebra.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExTerm {
    /// synthetic end-of-input symbol ($)
    Eof,
    /// ε (the empty string) – appears only in FIRST sets
    Empty,
    /// real terminal from the grammar
    Term(Terminal),
}

impl From<Terminal> for ExTerm {
    fn from(t: Terminal) -> Self {
        ExTerm::Term(t)
    }
}

impl fmt::Display for ExTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExTerm::Eof => write!(f, "{END_MARK}"),
            ExTerm::Empty => write!(f, "{EPSILON}"),
            ExTerm::Term(t) => write!(f, "{t}"),
        }
    }
}

/// FIRST and FOLLOW for every non-terminal of one grammar snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarSets {
    /// FIRST(A) – contains [`ExTerm::Empty`] iff A is nullable
    first: HashMap<String, HashSet<ExTerm>>,
    /// FOLLOW(A) – contains [`ExTerm::Eof`] at least for the start symbol
    follow: HashMap<String, HashSet<ExTerm>>,
}

impl GrammarSets {
    /// Runs both fixpoints over a macro-free grammar.
    ///
    /// Panics if the set still contains macros: feeding an unexpanded
    /// grammar to the set algebra is a programming error, not a grammar
    /// error.  Run [`crate::expand::expand`] first.
    pub fn calculate(set: &ProductionSet) -> Self {
        assert!(
            !set.contains_macro(),
            "FIRST/FOLLOW requires a macro-free grammar; run expand first"
        );

        let mut sets = GrammarSets {
            first: set
                .non_terminals()
                .into_iter()
                .map(|name| (String::from(name), HashSet::new()))
                .collect(),
            follow: set
                .non_terminals()
                .into_iter()
                .map(|name| (String::from(name), HashSet::new()))
                .collect(),
        };
        sets.calculate_first(set);
        sets.calculate_follow(set);
        sets
    }

    /// FIRST(A).  Panics on a name that is not in the grammar.
    pub fn first(&self, name: &str) -> &HashSet<ExTerm> {
        self.first
            .get(name)
            .expect("FIRST queried for a non-terminal the grammar does not contain")
    }

    /// FOLLOW(A).  Panics on a name that is not in the grammar.
    pub fn follow(&self, name: &str) -> &HashSet<ExTerm> {
        self.follow
            .get(name)
            .expect("FOLLOW queried for a non-terminal the grammar does not contain")
    }

    pub fn is_nullable(&self, name: &str) -> bool {
        self.first(name).contains(&ExTerm::Empty)
    }

    pub fn is_sequence_nullable(&self, symbols: &[Symbol]) -> bool {
        self.first_of(symbols).contains(&ExTerm::Empty)
    }

    pub fn non_terminals(&self) -> impl Iterator<Item = &str> {
        self.first.keys().map(String::as_str)
    }

    /// FIRST of a symbol sequence, chaining through nullable prefixes:
    /// FIRST(X1) minus ε, then FIRST(X2) while X1 is nullable, and so on;
    /// ε itself iff every position is nullable.
    pub fn first_of(&self, symbols: &[Symbol]) -> HashSet<ExTerm> {
        let mut out = HashSet::new();
        for symbol in symbols {
            match symbol {
                Symbol::Terminal(t) => {
                    out.insert(ExTerm::Term(t.clone()));
                    return out;
                }
                Symbol::Epsilon => continue,
                Symbol::NonTerminal(name) => {
                    // a name without an entry has no productions at all;
                    // treat it as opaque and definitely not nullable
                    let Some(f) = self.first.get(name.as_str()) else {
                        return out;
                    };
                    out.extend(f.iter().filter(|x| **x != ExTerm::Empty).cloned());
                    if !f.contains(&ExTerm::Empty) {
                        return out;
                    }
                }
                other => unreachable!("macro symbol `{other}` survived into set algebra"),
            }
        }
        out.insert(ExTerm::Empty);
        out
    }

    fn calculate_first(&mut self, set: &ProductionSet) {
        let mut pass = 0usize;
        loop {
            pass += 1;
            let mut changed = false;
            for rule in set.rules() {
                let found = self.first_of(rule.body.symbols());
                let dest = self
                    .first
                    .get_mut(&rule.head)
                    .expect("every head was seeded with a FIRST entry");
                for item in found {
                    changed |= dest.insert(item);
                }
            }
            trace!("FIRST pass {pass}, changed: {changed}");
            if !changed {
                break;
            }
        }
        debug!("FIRST reached fixpoint after {pass} passes");
    }

    fn calculate_follow(&mut self, set: &ProductionSet) {
        self.follow
            .get_mut(set.start())
            .expect("the start symbol heads a rule, so it has a FOLLOW entry")
            .insert(ExTerm::Eof);

        let mut pass = 0usize;
        loop {
            pass += 1;
            let mut changed = false;
            for rule in set.rules() {
                for (i, symbol) in rule.body.iter().enumerate() {
                    let Symbol::NonTerminal(name) = symbol else {
                        continue;
                    };

                    let rest = &rule.body.symbols()[i + 1..];
                    let first_rest = self.first_of(rest);

                    let mut found: Vec<ExTerm> = first_rest
                        .iter()
                        .filter(|x| **x != ExTerm::Empty)
                        .cloned()
                        .collect();
                    if first_rest.contains(&ExTerm::Empty) {
                        // β nullable (or empty): FOLLOW(head) flows into FOLLOW(X)
                        found.extend(self.follow(&rule.head).iter().cloned());
                    }

                    let dest = self
                        .follow
                        .get_mut(name.as_str())
                        .expect("every non-terminal was seeded with a FOLLOW entry");
                    for item in found {
                        changed |= dest.insert(item);
                    }
                }
            }
            trace!("FOLLOW pass {pass}, changed: {changed}");
            if !changed {
                break;
            }
        }
        debug!("FOLLOW reached fixpoint after {pass} passes");
    }
}
