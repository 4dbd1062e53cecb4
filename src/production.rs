//! Production rules and the grammar snapshot they live in.
//!
//! A [`ProductionSet`] is immutable: every analyzer that rewrites the grammar
//! returns a **new** snapshot and appends [`Transformation`] entries to its
//! log, so earlier snapshots stay valid for comparison.  The only way to
//! build a set from scratch is [`ProductionSetBuilder`], which validates the
//! raw rule list and reports every defect in one pass.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashSet;

use crate::error::GrammarError;
use crate::symbol::{EPSILON, Sentence, Symbol, Terminal};

/// Why a rewrite happened; one reason per [`Transformation`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewriteReason {
    MacroExpansion,
    LeftRecursionExpansion,
    LeftFactorization,
    DeadCodeRemoval,
}

/// One automatic rewrite: `original` was replaced by `replacements`
/// (empty for a removal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformation {
    pub original: ProductionRule,
    pub replacements: Vec<ProductionRule>,
    pub reason: RewriteReason,
}

/// Ordered record of every rewrite performed on a grammar, for full
/// before/after traceability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformationLog {
    entries: Vec<Transformation>,
}

impl TransformationLog {
    pub fn entries(&self) -> &[Transformation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Transformation> {
        self.entries.iter()
    }

    pub(crate) fn push(&mut self, entry: Transformation) {
        self.entries.push(entry);
    }
}

/// `head → body`.  Immutable; "editing" a grammar always produces new rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductionRule {
    pub head: String,
    pub body: Sentence,
}

impl ProductionRule {
    pub fn new(head: impl Into<String>, body: Sentence) -> Self {
        ProductionRule {
            head: head.into(),
            body,
        }
    }
}

impl fmt::Display for ProductionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.head, self.body)
    }
}

/// An ordered collection of production rules plus the designated start
/// symbol and the log of rewrites that produced this snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionSet {
    start: String,
    rules: Vec<ProductionRule>,
    log: TransformationLog,
}

impl ProductionSet {
    pub fn builder(start: impl Into<String>) -> ProductionSetBuilder {
        ProductionSetBuilder::new(start)
    }

    /// Assembles a snapshot the analyzers already vouched for.
    pub(crate) fn from_parts(
        start: String,
        rules: Vec<ProductionRule>,
        log: TransformationLog,
    ) -> Self {
        ProductionSet { start, rules, log }
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn rules(&self) -> &[ProductionRule] {
        &self.rules
    }

    pub fn log(&self) -> &TransformationLog {
        &self.log
    }

    /// Rule indices for one head, in rule order.
    pub fn rules_for<'a>(&'a self, head: &'a str) -> impl Iterator<Item = (usize, &'a ProductionRule)> {
        self.rules
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.head == head)
    }

    /// Heads in first-appearance order, deduplicated.
    pub fn heads(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for rule in &self.rules {
            if seen.insert(rule.head.as_str()) {
                out.push(rule.head.as_str());
            }
        }
        out
    }

    /// Every non-terminal name in the set: heads plus all body occurrences,
    /// including those nested inside macro operands.
    pub fn non_terminals(&self) -> HashSet<&str> {
        let mut names: HashSet<&str> = HashSet::new();
        for rule in &self.rules {
            names.insert(rule.head.as_str());
            for symbol in &rule.body {
                collect_non_terminals(symbol, &mut names);
            }
        }
        names
    }

    /// Every distinct terminal in the set, including those nested inside
    /// macro operands.
    pub fn terminals(&self) -> HashSet<&Terminal> {
        let mut out = HashSet::new();
        for rule in &self.rules {
            for symbol in &rule.body {
                collect_terminals(symbol, &mut out);
            }
        }
        out
    }

    pub fn contains_macro(&self) -> bool {
        self.rules.iter().any(|r| r.body.contains_macro())
    }

    /// Termination measure for the macro expander: sum over rule bodies.
    pub(crate) fn expansion_weight(&self) -> u128 {
        self.rules
            .iter()
            .fold(0u128, |acc, r| acc.saturating_add(r.body.expansion_weight()))
    }

    /// A non-terminal name not used anywhere in the set, derived from `base`
    /// by priming: `A` → `A'` → `A''` → …
    pub fn fresh_non_terminal(&self, base: &str) -> String {
        let taken = self.non_terminals();
        let mut name = base.to_string();
        loop {
            name.push('\'');
            if !taken.contains(name.as_str()) {
                return name;
            }
        }
    }

    /// New snapshot with the rule at `index` replaced by `replacements`
    /// (spliced in at the same position) and one log entry recording it.
    pub(crate) fn with_replacement(
        &self,
        index: usize,
        replacements: Vec<ProductionRule>,
        reason: RewriteReason,
    ) -> ProductionSet {
        let mut rules = Vec::with_capacity(self.rules.len() + replacements.len());
        rules.extend_from_slice(&self.rules[..index]);
        rules.extend(replacements.iter().cloned());
        rules.extend_from_slice(&self.rules[index + 1..]);

        let mut log = self.log.clone();
        log.push(Transformation {
            original: self.rules[index].clone(),
            replacements,
            reason,
        });
        ProductionSet::from_parts(self.start.clone(), rules, log)
    }
}

pub(crate) fn collect_non_terminals<'a>(symbol: &'a Symbol, names: &mut HashSet<&'a str>) {
    match symbol {
        Symbol::NonTerminal(name) => {
            names.insert(name.as_str());
        }
        Symbol::Option(s) | Symbol::Repetition(s) => {
            for inner in s {
                collect_non_terminals(inner, names);
            }
        }
        Symbol::Alternation(sentences) => {
            for s in sentences {
                for inner in s {
                    collect_non_terminals(inner, names);
                }
            }
        }
        Symbol::Terminal(_) | Symbol::Epsilon | Symbol::Pipe => {}
    }
}

fn collect_terminals<'a>(symbol: &'a Symbol, out: &mut HashSet<&'a Terminal>) {
    match symbol {
        Symbol::Terminal(t) => {
            out.insert(t);
        }
        Symbol::Option(s) | Symbol::Repetition(s) => {
            for inner in s {
                collect_terminals(inner, out);
            }
        }
        Symbol::Alternation(sentences) => {
            for s in sentences {
                for inner in s {
                    collect_terminals(inner, out);
                }
            }
        }
        Symbol::NonTerminal(_) | Symbol::Epsilon | Symbol::Pipe => {}
    }
}

/// Explicit builder for the initial, author-supplied rule list.  Validation
/// collects every malformed-grammar defect rather than stopping at the first.
#[derive(Debug, Clone)]
pub struct ProductionSetBuilder {
    start: String,
    rules: Vec<ProductionRule>,
}

impl ProductionSetBuilder {
    pub fn new(start: impl Into<String>) -> Self {
        ProductionSetBuilder {
            start: start.into(),
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, head: impl Into<String>, body: Sentence) -> Self {
        self.rules.push(ProductionRule::new(head, body));
        self
    }

    pub fn push(&mut self, rule: ProductionRule) {
        self.rules.push(rule);
    }

    pub fn extend(&mut self, rules: impl IntoIterator<Item = ProductionRule>) {
        self.rules.extend(rules);
    }

    pub fn build(self) -> Result<ProductionSet, Vec<GrammarError>> {
        let mut errors = Vec::new();

        if self.rules.is_empty() {
            errors.push(GrammarError::EmptyGrammar);
        } else if !self.rules.iter().any(|r| r.head == self.start) {
            errors.push(GrammarError::MissingStart(self.start.clone()));
        }

        let set = ProductionSet::from_parts(self.start, self.rules, TransformationLog::default());
        let mut reserved: Vec<&str> = set
            .non_terminals()
            .into_iter()
            .filter(|name| *name == EPSILON)
            .collect();
        reserved.sort_unstable();
        for name in reserved {
            errors.push(GrammarError::ReservedName(name.to_string()));
        }

        if errors.is_empty() { Ok(set) } else { Err(errors) }
    }
}
