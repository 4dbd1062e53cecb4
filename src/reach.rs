//! Reachability and realizability analyses.
//!
//! Reachability is plain graph reachability from the start symbol over the
//! "head mentions non-terminal in a body" relation; an unreached
//! non-terminal is harmless dead weight and only ever a warning.
//! Realizability asks whether a non-terminal can derive **any** finite
//! terminal string; one that cannot poisons every rule mentioning it, so it
//! is fatal.  Both are monotone fixpoints bounded by the non-terminal count.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use hashbrown::HashSet;
use log::debug;

use crate::error::{GrammarError, GrammarWarning};
use crate::production::{
    ProductionSet, RewriteReason, Transformation, collect_non_terminals,
};
use crate::symbol::Symbol;

/// All non-terminals in first-appearance order (heads and body mentions,
/// macro operands included), so analysis output is deterministic.
fn appearance_order(set: &ProductionSet) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    for rule in set.rules() {
        if seen.insert(rule.head.as_str()) {
            order.push(rule.head.as_str());
        }
        let mut mentioned = HashSet::new();
        for symbol in &rule.body {
            collect_non_terminals(symbol, &mut mentioned);
        }
        let mut mentioned: Vec<&str> = mentioned.into_iter().collect();
        mentioned.sort_unstable();
        for name in mentioned {
            if seen.insert(name) {
                order.push(name);
            }
        }
    }
    order
}

fn reachable_set(set: &ProductionSet) -> HashSet<&str> {
    let mut reached: HashSet<&str> = HashSet::new();
    let mut work: Vec<&str> = Vec::new();
    if reached.insert(set.start()) {
        work.push(set.start());
    }
    while let Some(name) = work.pop() {
        for (_, rule) in set.rules_for(name) {
            let mut mentioned = HashSet::new();
            for symbol in &rule.body {
                collect_non_terminals(symbol, &mut mentioned);
            }
            for found in mentioned {
                if reached.insert(found) {
                    work.push(found);
                }
            }
        }
    }
    reached
}

/// Non-terminals that no derivation from the start symbol can ever use.
pub fn unreachable_symbols(set: &ProductionSet) -> Vec<String> {
    let reached = reachable_set(set);
    appearance_order(set)
        .into_iter()
        .filter(|name| !reached.contains(name))
        .map(ToString::to_string)
        .collect()
}

/// Drops every rule headed by an unreachable non-terminal, logging each
/// removal, and reports one warning per dropped name.
pub fn remove_unreachable(set: &ProductionSet) -> (ProductionSet, Vec<GrammarWarning>) {
    let dead = unreachable_symbols(set);
    if dead.is_empty() {
        return (set.clone(), Vec::new());
    }
    debug!("removing {} unreachable non-terminals", dead.len());

    let warnings: Vec<GrammarWarning> = dead
        .iter()
        .cloned()
        .map(GrammarWarning::UnreachableSymbol)
        .collect();

    let dead_names: HashSet<&str> = dead.iter().map(String::as_str).collect();
    let mut rules = Vec::new();
    let mut log = set.log().clone();
    for rule in set.rules() {
        if dead_names.contains(rule.head.as_str()) {
            log.push(Transformation {
                original: rule.clone(),
                replacements: Vec::new(),
                reason: RewriteReason::DeadCodeRemoval,
            });
        } else {
            rules.push(rule.clone());
        }
    }

    (
        ProductionSet::from_parts(set.start().to_string(), rules, log),
        warnings,
    )
}

fn symbol_realizable(symbol: &Symbol, realizable: &HashSet<&str>) -> bool {
    match symbol {
        Symbol::Terminal(_) | Symbol::Epsilon => true,
        Symbol::NonTerminal(name) => realizable.contains(name.as_str()),
        // an optional or repeated operand can always be taken zero times
        Symbol::Option(_) | Symbol::Repetition(_) => true,
        Symbol::Alternation(alternatives) => alternatives
            .iter()
            .any(|s| s.iter().all(|inner| symbol_realizable(inner, realizable))),
        Symbol::Pipe => true,
    }
}

/// Non-terminals that can never derive a finite terminal string.
///
/// Fixpoint: a non-terminal is realizable once some production of it uses
/// only terminals, epsilon, and already-realizable non-terminals.  A name
/// that is mentioned but heads no production can never become realizable.
pub fn unrealizable_symbols(set: &ProductionSet) -> Vec<String> {
    let mut realizable: HashSet<&str> = HashSet::new();
    let mut pass = 0usize;
    loop {
        pass += 1;
        let mut changed = false;
        for rule in set.rules() {
            if realizable.contains(rule.head.as_str()) {
                continue;
            }
            if rule
                .body
                .iter()
                .all(|symbol| symbol_realizable(symbol, &realizable))
            {
                realizable.insert(rule.head.as_str());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    debug!("realizability fixpoint after {pass} passes");

    appearance_order(set)
        .into_iter()
        .filter(|name| !realizable.contains(name))
        .map(ToString::to_string)
        .collect()
}

/// Maps every unrealizable non-terminal to a fatal error, all collected in
/// one pass.
pub fn check_realizable(set: &ProductionSet) -> Result<(), Vec<GrammarError>> {
    let offenders = unrealizable_symbols(set);
    if offenders.is_empty() {
        Ok(())
    } else {
        Err(offenders
            .into_iter()
            .map(GrammarError::Unrealizable)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Sentence;
    use alloc::vec;
    use alloc::vec::Vec;

    fn nt(name: &str) -> Symbol {
        Symbol::non_terminal(name)
    }

    fn t(lit: &str) -> Symbol {
        Symbol::literal(lit, lit)
    }

    fn body(symbols: Vec<Symbol>) -> Sentence {
        Sentence::new(symbols)
    }

    #[test]
    fn flags_and_removes_unreachable_rules() {
        // Orphan is never mentioned from S
        let g = ProductionSet::builder("S")
            .rule("S", body(vec![nt("A")]))
            .rule("A", body(vec![t("a")]))
            .rule("Orphan", body(vec![t("x")]))
            .build()
            .unwrap();

        assert_eq!(unreachable_symbols(&g), vec!["Orphan"]);

        let (cleaned, warnings) = remove_unreachable(&g);
        assert_eq!(
            warnings,
            vec![GrammarWarning::UnreachableSymbol("Orphan".into())]
        );
        assert_eq!(cleaned.heads(), vec!["S", "A"]);
        assert_eq!(cleaned.log().len(), 1);
        assert_eq!(
            cleaned.log().entries()[0].reason,
            RewriteReason::DeadCodeRemoval
        );
        assert!(cleaned.log().entries()[0].replacements.is_empty());

        // fully reachable grammar passes through untouched
        let (same, warnings) = remove_unreachable(&cleaned);
        assert!(warnings.is_empty());
        assert_eq!(same.rules(), cleaned.rules());
    }

    #[test]
    fn reachability_sees_through_macro_operands() {
        let g = ProductionSet::builder("S")
            .rule("S", body(vec![Symbol::Option(body(vec![nt("A")]))]))
            .rule("A", body(vec![t("a")]))
            .build()
            .unwrap();
        assert!(unreachable_symbols(&g).is_empty());
    }

    #[test]
    fn bottomless_recursion_is_unrealizable() {
        // A → A 'a' has no base case; S inherits the problem
        let g = ProductionSet::builder("S")
            .rule("S", body(vec![nt("A")]))
            .rule("A", body(vec![nt("A"), t("a")]))
            .build()
            .unwrap();

        assert_eq!(unrealizable_symbols(&g), vec!["S", "A"]);
        let errors = check_realizable(&g).unwrap_err();
        assert!(errors.contains(&GrammarError::Unrealizable("A".into())));
        assert!(errors.contains(&GrammarError::Unrealizable("S".into())));
    }

    #[test]
    fn undefined_non_terminal_is_unrealizable() {
        let g = ProductionSet::builder("S")
            .rule("S", body(vec![nt("Ghost")]))
            .build()
            .unwrap();
        assert_eq!(unrealizable_symbols(&g), vec!["S", "Ghost"]);
    }

    #[test]
    fn realizability_chains_through_non_terminals() {
        let g = ProductionSet::builder("A")
            .rule("A", body(vec![nt("B")]))
            .rule("B", body(vec![nt("C")]))
            .rule("C", body(vec![t("c")]))
            .build()
            .unwrap();
        assert!(check_realizable(&g).is_ok());
    }

    #[test]
    fn epsilon_alternative_makes_recursion_realizable() {
        let g = ProductionSet::builder("A")
            .rule("A", body(vec![nt("A"), t("a")]))
            .rule("A", body(vec![]))
            .build()
            .unwrap();
        assert!(unrealizable_symbols(&g).is_empty());
    }
}
