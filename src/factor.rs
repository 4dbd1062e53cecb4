//! Left-factorization and LL(1) conflict detection.
//!
//! Factorization is the repairable half: alternatives of one head that share
//! an identical first symbol get the shared symbol hoisted into `A → t A'`
//! with the remainders moved under a fresh `A'`.  Conflict detection is the
//! report-only half for grammars that resist factorization (hidden left
//! recursion through nullable paths and the like): FIRST/FIRST and
//! FIRST/FOLLOW overlaps are surfaced, never resolved, because resolving
//! them takes grammar-design judgment.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use log::debug;

use crate::check::{ExTerm, GrammarSets};
use crate::error::{ConflictReport, FirstFirstConflict, FirstFollowConflict};
use crate::production::{
    ProductionRule, ProductionSet, RewriteReason, Transformation,
};
use crate::symbol::{Sentence, Symbol};

/// Alternatives of `head` that all start with `prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixGroup {
    pub head: String,
    pub prefix: Symbol,
    pub rule_indices: Vec<usize>,
}

/// Per head, the groups of alternatives sharing an identical first symbol
/// (terminal or non-terminal), in rule order.
pub fn common_prefix_groups(set: &ProductionSet) -> Vec<PrefixGroup> {
    let mut out = Vec::new();
    for head in set.heads() {
        let mut groups: Vec<(Symbol, Vec<usize>)> = Vec::new();
        for (i, rule) in set.rules_for(head) {
            let Some(first) = rule.body.first_symbol() else {
                continue;
            };
            if !first.is_terminal() && !first.is_non_terminal() {
                continue;
            }
            match groups.iter_mut().find(|(prefix, _)| prefix == first) {
                Some((_, indices)) => indices.push(i),
                None => groups.push((first.clone(), alloc::vec![i])),
            }
        }
        out.extend(
            groups
                .into_iter()
                .filter(|(_, indices)| indices.len() > 1)
                .map(|(prefix, rule_indices)| PrefixGroup {
                    head: head.to_string(),
                    prefix,
                    rule_indices,
                }),
        );
    }
    out
}

/// Hoists one shared prefix out of one group.
fn factor_group(set: &ProductionSet, group: &PrefixGroup) -> ProductionSet {
    let fresh = set.fresh_non_terminal(&group.head);
    debug!(
        "factoring `{}` out of {} alternatives of `{}` via `{fresh}`",
        group.prefix,
        group.rule_indices.len(),
        group.head
    );

    let hoisted = ProductionRule::new(
        group.head.clone(),
        Sentence::new(alloc::vec![
            group.prefix.clone(),
            Symbol::NonTerminal(fresh.clone()),
        ]),
    );
    let remainders: Vec<ProductionRule> = group
        .rule_indices
        .iter()
        .map(|&i| ProductionRule::new(fresh.clone(), set.rules()[i].body.tail()))
        .collect();

    let mut rules = Vec::with_capacity(set.rules().len());
    let first_index = group.rule_indices[0];
    for (i, rule) in set.rules().iter().enumerate() {
        if i == first_index {
            rules.push(hoisted.clone());
            rules.extend(remainders.iter().cloned());
            continue;
        }
        if group.rule_indices.contains(&i) {
            continue;
        }
        rules.push(rule.clone());
    }

    let mut log = set.log().clone();
    for (k, &i) in group.rule_indices.iter().enumerate() {
        let mut replacements = Vec::new();
        if k == 0 {
            replacements.push(hoisted.clone());
        }
        replacements.push(remainders[k].clone());
        log.push(Transformation {
            original: set.rules()[i].clone(),
            replacements,
            reason: RewriteReason::LeftFactorization,
        });
    }

    ProductionSet::from_parts(set.start().to_string(), rules, log)
}

/// Repeatedly factors the first remaining common-prefix group until no two
/// alternatives under any head share a first symbol.  Idempotent.
pub fn factor(set: &ProductionSet) -> ProductionSet {
    let mut current = set.clone();
    loop {
        let groups = common_prefix_groups(&current);
        let Some(group) = groups.first() else {
            return current;
        };
        current = factor_group(&current, group);
    }
}

/// FIRST/FIRST and FIRST/FOLLOW overlaps of a macro-free grammar, with
/// respect to sets computed from the same snapshot.
pub fn find_conflicts(set: &ProductionSet, sets: &GrammarSets) -> ConflictReport {
    let mut report = ConflictReport::default();

    // FIRST/FIRST: two alternatives of one head answering the same lookahead
    for head in set.heads() {
        let mut cells: Vec<(ExTerm, Vec<usize>)> = Vec::new();
        for (i, rule) in set.rules_for(head) {
            for item in sets.first_of(rule.body.symbols()) {
                if item == ExTerm::Empty {
                    continue;
                }
                match cells.iter_mut().find(|(term, _)| *term == item) {
                    Some((_, indices)) => indices.push(i),
                    None => cells.push((item, alloc::vec![i])),
                }
            }
        }
        for (lookahead, indices) in cells {
            if indices.len() > 1 {
                report.first_first.push(FirstFirstConflict {
                    head: head.to_string(),
                    lookahead,
                    productions: indices.iter().map(|&i| set.rules()[i].clone()).collect(),
                });
            }
        }
    }

    // FIRST/FOLLOW: when an alternative can vanish, the lookaheads that pick
    // it come from FOLLOW(head), so FOLLOW(head) must not collide with what
    // the sibling alternatives start with
    for head in set.heads() {
        let alternatives: Vec<(usize, &ProductionRule)> = set.rules_for(head).collect();
        for &(i, rule) in &alternatives {
            if !sets.is_sequence_nullable(rule.body.symbols()) {
                continue;
            }
            let sibling_first: Vec<ExTerm> = alternatives
                .iter()
                .filter(|(j, _)| *j != i)
                .flat_map(|(_, sibling)| sets.first_of(sibling.body.symbols()))
                .filter(|item| *item != ExTerm::Empty)
                .collect();
            let overlap: Vec<ExTerm> = sets
                .follow(head)
                .iter()
                .filter(|item| sibling_first.contains(item))
                .cloned()
                .collect();
            if !overlap.is_empty() {
                report.first_follow.push(FirstFollowConflict {
                    head: head.to_string(),
                    production: rule.clone(),
                    overlap,
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use crate::symbol::Terminal;

    fn nt(name: &str) -> Symbol {
        Symbol::non_terminal(name)
    }

    fn t(lit: &str) -> Symbol {
        Symbol::literal(lit, lit)
    }

    fn term(lit: &str) -> ExTerm {
        ExTerm::Term(Terminal::literal(lit, lit))
    }

    fn body(symbols: Vec<Symbol>) -> Sentence {
        Sentence::new(symbols)
    }

    fn rules_of<'a>(set: &'a ProductionSet, head: &'a str) -> Vec<&'a Sentence> {
        set.rules_for(head).map(|(_, r)| &r.body).collect()
    }

    #[test]
    fn groups_alternatives_by_first_symbol() {
        let g = ProductionSet::builder("A")
            .rule("A", body(vec![t("a"), t("b")]))
            .rule("A", body(vec![t("a"), t("c")]))
            .rule("A", body(vec![t("d")]))
            .build()
            .unwrap();

        let groups = common_prefix_groups(&g);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].head, "A");
        assert_eq!(groups[0].prefix, t("a"));
        assert_eq!(groups[0].rule_indices, vec![0, 1]);
    }

    #[test]
    fn factors_out_shared_prefix() {
        let g = ProductionSet::builder("A")
            .rule("A", body(vec![t("a"), t("b")]))
            .rule("A", body(vec![t("a"), t("c")]))
            .rule("A", body(vec![t("d")]))
            .build()
            .unwrap();

        let out = factor(&g);
        assert!(common_prefix_groups(&out).is_empty());
        assert_eq!(
            rules_of(&out, "A"),
            vec![&body(vec![t("a"), nt("A'")]), &body(vec![t("d")])]
        );
        assert_eq!(
            rules_of(&out, "A'"),
            vec![&body(vec![t("b")]), &body(vec![t("c")])]
        );
        assert!(
            out.log()
                .iter()
                .all(|e| e.reason == RewriteReason::LeftFactorization)
        );
    }

    #[test]
    fn factoring_handles_exhausted_remainders() {
        // A → a b | a: the second remainder is ε
        let g = ProductionSet::builder("A")
            .rule("A", body(vec![t("a"), t("b")]))
            .rule("A", body(vec![t("a")]))
            .build()
            .unwrap();

        let out = factor(&g);
        assert_eq!(rules_of(&out, "A"), vec![&body(vec![t("a"), nt("A'")])]);
        assert_eq!(
            rules_of(&out, "A'"),
            vec![&body(vec![t("b")]), &Sentence::empty()]
        );
    }

    #[test]
    fn factorization_is_idempotent() {
        let g = ProductionSet::builder("A")
            .rule("A", body(vec![t("a"), t("b"), t("x")]))
            .rule("A", body(vec![t("a"), t("b"), t("y")]))
            .rule("A", body(vec![nt("B"), t("z")]))
            .rule("A", body(vec![nt("B")]))
            .rule("B", body(vec![t("q")]))
            .build()
            .unwrap();

        let once = factor(&g);
        assert!(common_prefix_groups(&once).is_empty());
        let twice = factor(&once);
        assert_eq!(once.rules(), twice.rules());
        assert_eq!(once.log().len(), twice.log().len());
    }

    #[test]
    fn detects_first_first_conflict() {
        // FIRST of both S alternatives contains 'a' through different paths
        let g = ProductionSet::builder("S")
            .rule("S", body(vec![nt("A"), t("x")]))
            .rule("S", body(vec![nt("B"), t("y")]))
            .rule("A", body(vec![t("a")]))
            .rule("B", body(vec![t("a")]))
            .build()
            .unwrap();

        let sets = GrammarSets::calculate(&g);
        let report = find_conflicts(&g, &sets);
        assert_eq!(report.first_first.len(), 1);
        let conflict = &report.first_first[0];
        assert_eq!(conflict.head, "S");
        assert_eq!(conflict.lookahead, term("a"));
        assert_eq!(conflict.productions.len(), 2);
        assert!(report.first_follow.is_empty());
    }

    #[test]
    fn detects_first_follow_conflict() {
        // A derives 'x' or ε, and 'x' also follows A
        let g = ProductionSet::builder("S")
            .rule("S", body(vec![nt("A"), t("x")]))
            .rule("S", body(vec![t("y")]))
            .rule("A", body(vec![t("x")]))
            .rule("A", body(vec![]))
            .build()
            .unwrap();

        let sets = GrammarSets::calculate(&g);
        let report = find_conflicts(&g, &sets);
        assert!(report.first_first.is_empty());
        assert_eq!(report.first_follow.len(), 1);
        let conflict = &report.first_follow[0];
        assert_eq!(conflict.head, "A");
        assert!(conflict.overlap.contains(&term("x")));
    }

    #[test]
    fn no_false_first_follow_conflict_without_nullability() {
        // same shape but A is not nullable: fine
        let g = ProductionSet::builder("S")
            .rule("S", body(vec![nt("A"), t("x")]))
            .rule("S", body(vec![t("y")]))
            .rule("A", body(vec![t("x")]))
            .build()
            .unwrap();

        let sets = GrammarSets::calculate(&g);
        assert!(find_conflicts(&g, &sets).is_empty());
    }
}
