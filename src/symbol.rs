//! Symbol and sentence model.
//!
//! Everything here is a **value type**: equality and hashing are structural,
//! never by identity, so symbols can be freely copied between sentences and a
//! position inside a sentence is always addressed by integer index plus
//! structural match.
//!
//! A [`Sentence`] is normalized at construction time:
//!
//! * [`Symbol::Pipe`] markers never survive – a pipe-separated sequence is
//!   folded into a single [`Symbol::Alternation`] the moment the sentence is
//!   built.
//! * [`Symbol::Epsilon`] occurrences are dropped, so `A → ε` and a rule with
//!   an empty body are the same value.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Reserved spelling of the empty string.  Illegal as a non-terminal name.
pub const EPSILON: &str = "ε";
/// Synthetic end-of-input marker used in FOLLOW sets and parse tables.
pub const END_MARK: &str = "$";

/// A lexical token category, optionally pinned to one exact literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Terminal {
    /// name of the lexical category, e.g. `identifier`
    pub kind: String,
    /// exact spelling this terminal is pinned to, if any
    pub literal: Option<String>,
}

impl Terminal {
    pub fn new(kind: impl Into<String>) -> Self {
        Terminal {
            kind: kind.into(),
            literal: None,
        }
    }

    /// A terminal pinned to one exact spelling, e.g. the `+` operator.
    pub fn literal(kind: impl Into<String>, literal: impl Into<String>) -> Self {
        Terminal {
            kind: kind.into(),
            literal: Some(literal.into()),
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Some(lit) => write!(f, "{lit}"),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// One position of a production body.
///
/// The macro variants (`Option`, `Repetition`, `Pipe`, `Alternation`) are
/// EBNF conveniences that [`crate::expand::expand`] rewrites away; a grammar
/// handed to the FIRST/FOLLOW or table machinery must be free of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// an atomic input symbol
    Terminal(Terminal),
    /// a named syntactic category; two non-terminals are equal iff their
    /// names match exactly
    NonTerminal(String),
    /// the empty string
    Epsilon,
    /// `[ β ]` – the operand may be present once or not at all
    Option(Sentence),
    /// `{ β }` – the operand may repeat zero or more times
    Repetition(Sentence),
    /// alternative separator, consumed by [`Sentence::new`]
    Pipe,
    /// `( s1 | s2 | … )` – the folded form of pipe-separated alternatives
    Alternation(Vec<Sentence>),
}

impl Symbol {
    pub fn terminal(kind: impl Into<String>) -> Self {
        Symbol::Terminal(Terminal::new(kind))
    }

    pub fn literal(kind: impl Into<String>, lit: impl Into<String>) -> Self {
        Symbol::Terminal(Terminal::literal(kind, lit))
    }

    pub fn non_terminal(name: impl Into<String>) -> Self {
        Symbol::NonTerminal(name.into())
    }

    pub fn is_macro(&self) -> bool {
        matches!(
            self,
            Symbol::Option(_) | Symbol::Repetition(_) | Symbol::Pipe | Symbol::Alternation(_)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(self, Symbol::NonTerminal(_))
    }

    /// Termination measure for macro expansion.
    ///
    /// Multiplicative on sentences so that a rewrite which duplicates a
    /// macro-free prefix across several result rules still strictly shrinks
    /// the total (a plain macro-node count does not: expanding `A → [x] [y]`
    /// leaves two macro nodes behind).  Plain symbols weigh 1, macros weigh
    /// their operand plus a constant.
    pub(crate) fn expansion_weight(&self) -> u128 {
        match self {
            Symbol::Terminal(_) | Symbol::NonTerminal(_) | Symbol::Epsilon => 1,
            Symbol::Pipe => 2,
            Symbol::Option(s) => s.expansion_weight().saturating_add(2),
            // one more than Option: the rewrite keeps the operand *and*
            // emits two helper rules, which weigh an extra unit
            Symbol::Repetition(s) => s.expansion_weight().saturating_add(3),
            Symbol::Alternation(sentences) => sentences
                .iter()
                .fold(0u128, |acc, s| acc.saturating_add(s.expansion_weight()))
                .saturating_add(2),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(t) => write!(f, "{t}"),
            Symbol::NonTerminal(name) => write!(f, "{name}"),
            Symbol::Epsilon => write!(f, "{EPSILON}"),
            Symbol::Option(s) => write!(f, "[ {s} ]"),
            Symbol::Repetition(s) => write!(f, "{{ {s} }}"),
            Symbol::Pipe => write!(f, "|"),
            Symbol::Alternation(sentences) => {
                write!(f, "( ")?;
                for (i, s) in sentences.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{s}")?;
                }
                write!(f, " )")
            }
        }
    }
}

/// An ordered, possibly-empty sequence of symbols: the right-hand side of a
/// production, or the operand of a macro.  The empty sentence *is* the
/// epsilon body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Sentence {
    symbols: Vec<Symbol>,
}

impl Sentence {
    /// Builds a sentence, normalizing on the way in: pipes fold the sequence
    /// into one `Alternation` and loose epsilons are dropped.
    pub fn new(symbols: Vec<Symbol>) -> Self {
        if symbols.iter().any(|s| matches!(s, Symbol::Pipe)) {
            let alternatives: Vec<Sentence> = symbols
                .split(|s| matches!(s, Symbol::Pipe))
                .map(|chunk| Sentence::new(chunk.to_vec()))
                .collect();
            return Sentence {
                symbols: alloc::vec![Symbol::Alternation(alternatives)],
            };
        }

        let symbols = symbols
            .into_iter()
            .filter(|s| !matches!(s, Symbol::Epsilon))
            .collect();
        Sentence { symbols }
    }

    /// The epsilon body.
    pub fn empty() -> Self {
        Sentence::default()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Symbol> {
        self.symbols.get(index)
    }

    pub fn first_symbol(&self) -> Option<&Symbol> {
        self.symbols.first()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Symbol> {
        self.symbols.iter()
    }

    /// Index of the leftmost macro symbol, if any.
    pub fn leftmost_macro(&self) -> Option<usize> {
        self.symbols.iter().position(Symbol::is_macro)
    }

    pub fn contains_macro(&self) -> bool {
        self.leftmost_macro().is_some()
    }

    pub(crate) fn expansion_weight(&self) -> u128 {
        self.symbols
            .iter()
            .fold(1u128, |acc, s| acc.saturating_mul(s.expansion_weight()))
    }

    /// New sentence with the symbol at `index` replaced by `replacement`
    /// (which may be empty, deleting the position).  Positions are always
    /// addressed this way, never by identity.
    pub fn splice(&self, index: usize, replacement: &[Symbol]) -> Sentence {
        let mut symbols = Vec::with_capacity(self.symbols.len() + replacement.len());
        symbols.extend_from_slice(&self.symbols[..index]);
        symbols.extend_from_slice(replacement);
        symbols.extend_from_slice(&self.symbols[index + 1..]);
        Sentence::new(symbols)
    }

    /// Everything after the first symbol.
    pub fn tail(&self) -> Sentence {
        Sentence {
            symbols: self.symbols.get(1..).unwrap_or_default().to_vec(),
        }
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbols.is_empty() {
            return write!(f, "{EPSILON}");
        }
        for (i, s) in self.symbols.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{s}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Sentence {
    type Item = &'a Symbol;
    type IntoIter = core::slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.iter()
    }
}
