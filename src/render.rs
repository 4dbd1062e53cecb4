//! Textual renderings of grammars.
//!
//! Pure projections for debugging and documentation; nothing here parses
//! text back into a [`ProductionSet`].  Four notations are supported:
//!
//! * `Sentential` – the arrow form the `Display` impls already use:
//!   `E → T E'`, macros as `[ x ]`, `{ x }`, `( a | b )`.
//! * `Bnf` – `<E> ::= <T> "+"`, non-terminals in angle brackets, terminals
//!   quoted, alternatives joined with `|`.
//! * `Ebnf` – `E = T , "+" ;` with `[ x ]` for options and `{ x }` for
//!   repetitions.
//! * `EbnfKleene` – like `Ebnf` but with `( x )?` and `( x )*` suffix
//!   operators instead of bracket pairs.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::Write as _;
use itertools::Itertools;

use crate::production::{ProductionRule, ProductionSet};
use crate::symbol::{EPSILON, Sentence, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    Sentential,
    Bnf,
    Ebnf,
    EbnfKleene,
}

impl Notation {
    fn arrow(self) -> &'static str {
        match self {
            Notation::Sentential => "→",
            Notation::Bnf => "::=",
            Notation::Ebnf | Notation::EbnfKleene => "=",
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Notation::Sentential | Notation::Bnf => " ",
            Notation::Ebnf | Notation::EbnfKleene => " , ",
        }
    }

    fn terminator(self) -> &'static str {
        match self {
            Notation::Sentential | Notation::Bnf => "",
            Notation::Ebnf | Notation::EbnfKleene => " ;",
        }
    }
}

fn render_symbol(symbol: &Symbol, notation: Notation) -> String {
    match (symbol, notation) {
        (_, Notation::Sentential) => symbol.to_string(),
        (Symbol::Terminal(t), _) => alloc::format!("\"{t}\""),
        (Symbol::NonTerminal(name), Notation::Bnf) => alloc::format!("<{name}>"),
        (Symbol::NonTerminal(name), _) => name.clone(),
        (Symbol::Epsilon, Notation::Bnf) => String::from("\"\""),
        (Symbol::Epsilon, _) => String::from(EPSILON),
        (Symbol::Option(s), Notation::EbnfKleene) => {
            alloc::format!("( {} )?", render_sentence(s, notation))
        }
        (Symbol::Option(s), _) => alloc::format!("[ {} ]", render_sentence(s, notation)),
        (Symbol::Repetition(s), Notation::EbnfKleene) => {
            alloc::format!("( {} )*", render_sentence(s, notation))
        }
        (Symbol::Repetition(s), _) => alloc::format!("{{ {} }}", render_sentence(s, notation)),
        (Symbol::Pipe, _) => String::from("|"),
        (Symbol::Alternation(sentences), _) => alloc::format!(
            "( {} )",
            sentences
                .iter()
                .map(|s| render_sentence(s, notation))
                .join(" | ")
        ),
    }
}

fn render_sentence(sentence: &Sentence, notation: Notation) -> String {
    if sentence.is_empty() {
        return match notation {
            Notation::Bnf => String::from("\"\""),
            _ => String::from(EPSILON),
        };
    }
    sentence
        .iter()
        .map(|symbol| render_symbol(symbol, notation))
        .join(notation.separator())
}

/// One production in the chosen notation, without a terminator.
pub fn render_rule(rule: &ProductionRule, notation: Notation) -> String {
    let head = match notation {
        Notation::Bnf => alloc::format!("<{}>", rule.head),
        _ => rule.head.clone(),
    };
    alloc::format!(
        "{head} {} {}",
        notation.arrow(),
        render_sentence(&rule.body, notation)
    )
}

/// The whole set, one line per head with alternatives joined by `|`, in
/// first-appearance head order.
pub fn render_set(set: &ProductionSet, notation: Notation) -> String {
    let mut out = String::new();
    for head in set.heads() {
        let head_text = match notation {
            Notation::Bnf => alloc::format!("<{head}>"),
            _ => head.to_string(),
        };
        let alternatives: Vec<String> = set
            .rules_for(head)
            .map(|(_, rule)| render_sentence(&rule.body, notation))
            .collect();
        let _ = writeln!(
            out,
            "{head_text} {} {}{}",
            notation.arrow(),
            alternatives.join(" | "),
            notation.terminator()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn nt(name: &str) -> Symbol {
        Symbol::non_terminal(name)
    }

    fn t(lit: &str) -> Symbol {
        Symbol::literal(lit, lit)
    }

    fn grammar() -> ProductionSet {
        ProductionSet::builder("E")
            .rule("E", Sentence::new(vec![nt("T"), nt("E'")]))
            .rule("E'", Sentence::new(vec![t("+"), nt("T"), nt("E'")]))
            .rule("E'", Sentence::new(vec![]))
            .rule("T", Sentence::new(vec![t("id")]))
            .build()
            .unwrap()
    }

    #[test]
    fn sentential_matches_display() {
        let g = grammar();
        let rule = &g.rules()[1];
        assert_eq!(render_rule(rule, Notation::Sentential), rule.to_string());
        assert_eq!(render_rule(rule, Notation::Sentential), "E' → + T E'");
    }

    #[test]
    fn sentential_set_groups_alternatives() {
        assert_eq!(
            render_set(&grammar(), Notation::Sentential),
            "E → T E'\nE' → + T E' | ε\nT → id\n"
        );
    }

    #[test]
    fn bnf_quotes_terminals_and_brackets_heads() {
        assert_eq!(
            render_set(&grammar(), Notation::Bnf),
            "<E> ::= <T> <E'>\n<E'> ::= \"+\" <T> <E'> | \"\"\n<T> ::= \"id\"\n"
        );
    }

    #[test]
    fn ebnf_renders_macros_as_brackets() {
        let g = ProductionSet::builder("S")
            .rule(
                "S",
                Sentence::new(vec![
                    Symbol::Option(Sentence::new(vec![t("a")])),
                    Symbol::Repetition(Sentence::new(vec![t("b")])),
                ]),
            )
            .build()
            .unwrap();
        assert_eq!(render_set(&g, Notation::Ebnf), "S = [ \"a\" ] , { \"b\" } ;\n");
    }

    #[test]
    fn kleene_renders_macros_as_suffix_operators() {
        let g = ProductionSet::builder("S")
            .rule(
                "S",
                Sentence::new(vec![
                    Symbol::Option(Sentence::new(vec![t("a")])),
                    Symbol::Repetition(Sentence::new(vec![t("b"), t("c")])),
                ]),
            )
            .build()
            .unwrap();
        assert_eq!(
            render_set(&g, Notation::EbnfKleene),
            "S = ( \"a\" )? , ( \"b\" , \"c\" )* ;\n"
        );
    }

    #[test]
    fn alternation_macro_renders_grouped() {
        let alt = Symbol::Alternation(vec![
            Sentence::new(vec![t("x")]),
            Sentence::new(vec![t("y")]),
        ]);
        let rule = ProductionRule::new("S", Sentence::new(vec![alt, nt("A")]));
        assert_eq!(render_rule(&rule, Notation::Sentential), "S → ( x | y ) A");
        assert_eq!(
            render_rule(&rule, Notation::Bnf),
            "<S> ::= ( \"x\" | \"y\" ) <A>"
        );
    }
}
