//! Left-recursion detection and elimination.
//!
//! Detection walks leftmost-derivation chains: rule `A → B …` lets `B` be
//! derived leftmost from `A`, and a chain returning to its root is a
//! left-recursion cycle.  Each cycle is reported as the ordered list of
//! [`Derivation`] steps that close it, so callers can audit the rewrite.
//!
//! Elimination is the classic algorithm: for direct recursion
//! `A → A α1 | … | A αn | β1 | … | βm` rewrite to `A → βi A'` and
//! `A' → αj A' | ε` with a fresh `A'`; indirect recursion is first made
//! direct by substituting the earlier head's alternatives into the
//! offending rule.  Every replacement is logged with
//! [`RewriteReason::LeftRecursionExpansion`].

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use either::Either;
use hashbrown::HashSet;
use itertools::Itertools;
use log::debug;

use crate::production::{
    ProductionRule, ProductionSet, RewriteReason, Transformation,
};
use crate::symbol::{Sentence, Symbol};

/// One leftmost-derivation step: applying `production` to the leftmost
/// non-terminal of `original` yields `derived`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    pub production: ProductionRule,
    pub original: Sentence,
    pub derived: Sentence,
}

/// An ordered derivation chain `head ⇒ … ⇒ head …`, i.e. a left-recursion
/// cycle rooted at `head`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub head: String,
    pub steps: Vec<Derivation>,
}

impl Cycle {
    pub fn is_direct(&self) -> bool {
        self.steps.len() == 1
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        for step in &self.steps {
            write!(f, " ⇒ {}", step.derived)?;
        }
        Ok(())
    }
}

/// Leftmost sentential form after replacing the first symbol of `form` with
/// the body of `rule`.
fn derive_leftmost(form: &Sentence, rule: &ProductionRule) -> Sentence {
    let mut symbols = rule.body.symbols().to_vec();
    symbols.extend_from_slice(&form.symbols()[1..]);
    Sentence::new(symbols)
}

fn search_cycle(
    set: &ProductionSet,
    root: &str,
    current: &str,
    form: &Sentence,
    visited: &mut HashSet<String>,
    steps: &mut Vec<Derivation>,
) -> bool {
    for (_, rule) in set.rules_for(current) {
        let derived = derive_leftmost(form, rule);
        let Some(Symbol::NonTerminal(next)) = derived.first_symbol() else {
            continue;
        };

        let step = Derivation {
            production: rule.clone(),
            original: form.clone(),
            derived: derived.clone(),
        };

        if next == root {
            steps.push(step);
            return true;
        }
        if visited.insert(next.clone()) {
            let next = next.clone();
            steps.push(step);
            if search_cycle(set, root, &next, &derived, visited, steps) {
                return true;
            }
            steps.pop();
        }
    }
    false
}

/// One cycle per non-terminal that can left-derive itself, in head order.
pub fn find_cycles(set: &ProductionSet) -> Vec<Cycle> {
    let mut cycles = Vec::new();
    for head in set.heads() {
        let root_form = Sentence::new(alloc::vec![Symbol::non_terminal(head)]);
        let mut visited = HashSet::new();
        let mut steps = Vec::new();
        if search_cycle(set, head, head, &root_form, &mut visited, &mut steps) {
            cycles.push(Cycle {
                head: head.to_string(),
                steps,
            });
        }
    }
    cycles
}

/// New snapshot with all head rules replaced in place: `new_rules` land at
/// the position of the first old rule for `head`, other rules keep their
/// relative order.
fn replace_head_rules(
    set: &ProductionSet,
    head: &str,
    new_rules: Vec<ProductionRule>,
    entries: Vec<Transformation>,
) -> ProductionSet {
    let mut rules = Vec::with_capacity(set.rules().len() + new_rules.len());
    let mut spliced = false;
    for rule in set.rules() {
        if rule.head == head {
            if !spliced {
                rules.extend(new_rules.iter().cloned());
                spliced = true;
            }
            continue;
        }
        rules.push(rule.clone());
    }

    let mut log = set.log().clone();
    for entry in entries {
        log.push(entry);
    }
    ProductionSet::from_parts(set.start().to_string(), rules, log)
}

/// Rewrites direct recursion on `head` into the right-recursive form.
/// No-op when `head` has no directly recursive alternative, and also when
/// it has no non-recursive one: such a head can never bottom out, which the
/// realizability analysis reports as fatal.
fn eliminate_direct(set: &ProductionSet, head: &str) -> ProductionSet {
    let (recursive, base): (Vec<(usize, Sentence)>, Vec<(usize, Sentence)>) = set
        .rules_for(head)
        .partition_map(|(i, rule)| match rule.body.first_symbol() {
            Some(Symbol::NonTerminal(n)) if n == head => Either::Left((i, rule.body.tail())),
            _ => Either::Right((i, rule.body.clone())),
        });

    if recursive.is_empty() || base.is_empty() {
        return set.clone();
    }

    let fresh = set.fresh_non_terminal(head);
    debug!("eliminating direct left recursion on `{head}` via `{fresh}`");

    let mut new_rules = Vec::new();
    let mut entries = Vec::new();

    for (index, beta) in &base {
        let mut symbols = beta.symbols().to_vec();
        symbols.push(Symbol::NonTerminal(fresh.clone()));
        let replacement = ProductionRule::new(head, Sentence::new(symbols));
        new_rules.push(replacement.clone());
        entries.push(Transformation {
            original: set.rules()[*index].clone(),
            replacements: alloc::vec![replacement],
            reason: RewriteReason::LeftRecursionExpansion,
        });
    }

    let mut helper_rules = Vec::new();
    for (index, alpha) in &recursive {
        // `A → A` alone carries no information; it is dropped outright
        let replacements = if alpha.is_empty() {
            Vec::new()
        } else {
            let mut symbols = alpha.symbols().to_vec();
            symbols.push(Symbol::NonTerminal(fresh.clone()));
            alloc::vec![ProductionRule::new(fresh.clone(), Sentence::new(symbols))]
        };
        helper_rules.extend(replacements.iter().cloned());
        entries.push(Transformation {
            original: set.rules()[*index].clone(),
            replacements,
            reason: RewriteReason::LeftRecursionExpansion,
        });
    }

    let epsilon_rule = ProductionRule::new(fresh.clone(), Sentence::empty());
    helper_rules.push(epsilon_rule.clone());
    if let Some(first_recursive) = entries.iter_mut().find(|e| {
        e.replacements
            .first()
            .is_some_and(|r| r.head == fresh)
    }) {
        first_recursive.replacements.push(epsilon_rule);
    }

    new_rules.extend(helper_rules);
    replace_head_rules(set, head, new_rules, entries)
}

/// Substitutes `earlier`'s alternatives into every `head` rule of the form
/// `head → earlier γ`, until none is left.  This is the step that turns
/// indirect recursion into direct recursion.
///
/// Requires that `earlier` carries no `earlier`-leading alternative of its
/// own: substituting one would reintroduce the rule just removed and the
/// loop would never drain.  `earlier` can still be in that state after its
/// own elimination pass when it has no non-recursive alternative (see
/// [`eliminate_direct`]); such a head is skipped here and left for the
/// realizability analysis to reject.
fn substitute_leading(set: &ProductionSet, head: &str, earlier: &str) -> ProductionSet {
    let still_recursive = set.rules_for(earlier).any(|(_, rule)| {
        matches!(rule.body.first_symbol(), Some(Symbol::NonTerminal(n)) if n == earlier)
    });
    if still_recursive {
        debug!("not substituting `{earlier}` into `{head}`: `{earlier}` kept its direct recursion");
        return set.clone();
    }

    let mut current = set.clone();
    loop {
        let target = current.rules_for(head).find_map(|(i, rule)| {
            match rule.body.first_symbol() {
                Some(Symbol::NonTerminal(n)) if n == earlier => Some(i),
                _ => None,
            }
        });
        let Some(index) = target else {
            return current;
        };

        let tail = current.rules()[index].body.tail();
        let replacements: Vec<ProductionRule> = current
            .rules_for(earlier)
            .map(|(_, sub)| {
                let mut symbols = sub.body.symbols().to_vec();
                symbols.extend_from_slice(tail.symbols());
                ProductionRule::new(head, Sentence::new(symbols))
            })
            .collect();

        debug!("substituting `{earlier}` into `{}`", current.rules()[index]);
        current = current.with_replacement(
            index,
            replacements,
            RewriteReason::LeftRecursionExpansion,
        );
    }
}

/// Detects every left-recursion cycle and rewrites the grammar into a
/// right-recursive equivalent.  The returned cycles are the audit trail;
/// the log on the new snapshot records each individual rewrite.
///
/// A head whose every alternative is self-leading (`A → A x` with no base
/// case) has no right-recursive equivalent and is left untouched; it can
/// never bottom out, which [`crate::reach::check_realizable`] reports as
/// fatal.  The rewrite terminates either way.
pub fn eliminate(set: &ProductionSet) -> (ProductionSet, Vec<Cycle>) {
    let cycles = find_cycles(set);
    if cycles.is_empty() {
        return (set.clone(), cycles);
    }

    // only heads that sit on some cycle take part in the rewrite; touching
    // the rest would churn rules that are already fine
    let order: Vec<String> = {
        let involved: HashSet<&str> = cycles
            .iter()
            .flat_map(|c| c.steps.iter().map(|s| s.production.head.as_str()))
            .collect();
        set.heads()
            .into_iter()
            .filter(|h| involved.contains(h))
            .map(ToString::to_string)
            .collect()
    };

    let mut current = set.clone();
    for i in 0..order.len() {
        for j in 0..i {
            current = substitute_leading(&current, &order[i], &order[j]);
        }
        current = eliminate_direct(&current, &order[i]);
    }

    (current, cycles)
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn rules_of<'a>(set: &'a ProductionSet, head: &'a str) -> Vec<&'a Sentence> {
        set.rules_for(head).map(|(_, r)| &r.body).collect()
    }

    /// No production derives its own head leftmost, directly or through a
    /// one-step chain.
    fn assert_no_residual_left_recursion(set: &ProductionSet) {
        for rule in set.rules() {
            let Some(Symbol::NonTerminal(next)) = rule.body.first_symbol() else {
                continue;
            };
            assert_ne!(next, &rule.head, "direct left recursion left in `{rule}`");
            for (_, chained) in set.rules_for(next) {
                if let Some(Symbol::NonTerminal(second)) = chained.body.first_symbol() {
                    assert_ne!(
                        second, &rule.head,
                        "one-step left-recursion chain via `{rule}` and `{chained}`"
                    );
                }
            }
        }
    }

    #[test]
    fn detects_direct_cycle_with_derivation_chain() {
        let g = ProductionSet::builder("E")
            .rule("E", body(vec![nt("E"), t("+"), nt("T")]))
            .rule("E", body(vec![nt("T")]))
            .rule("T", body(vec![t("id")]))
            .build()
            .unwrap();

        let cycles = find_cycles(&g);
        assert_eq!(cycles.len(), 1);
        let cycle = &cycles[0];
        assert_eq!(cycle.head, "E");
        assert!(cycle.is_direct());
        assert_eq!(cycle.steps[0].original, body(vec![nt("E")]));
        assert_eq!(cycle.steps[0].derived, body(vec![nt("E"), t("+"), nt("T")]));
    }

    #[test]
    fn detects_indirect_cycle() {
        // S ⇒ A a ⇒ S c a
        let g = ProductionSet::builder("S")
            .rule("S", body(vec![nt("A"), t("a")]))
            .rule("S", body(vec![t("b")]))
            .rule("A", body(vec![nt("S"), t("c")]))
            .rule("A", body(vec![t("d")]))
            .build()
            .unwrap();

        let cycles = find_cycles(&g);
        // rooted at S and rooted at A
        assert_eq!(cycles.len(), 2);
        let s_cycle = &cycles[0];
        assert_eq!(s_cycle.head, "S");
        assert_eq!(s_cycle.steps.len(), 2);
        assert_eq!(s_cycle.steps[0].derived, body(vec![nt("A"), t("a")]));
        assert_eq!(s_cycle.steps[1].derived, body(vec![nt("S"), t("c"), t("a")]));
    }

    #[test]
    fn no_cycles_in_right_recursive_grammar() {
        let g = ProductionSet::builder("L")
            .rule("L", body(vec![t("x"), nt("L")]))
            .rule("L", body(vec![]))
            .build()
            .unwrap();
        assert!(find_cycles(&g).is_empty());
        let (out, cycles) = eliminate(&g);
        assert!(cycles.is_empty());
        assert_eq!(out.rules(), g.rules());
    }

    #[test]
    fn eliminates_textbook_expression_grammar() {
        let g = ProductionSet::builder("E")
            .rule("E", body(vec![nt("E"), t("+"), nt("T")]))
            .rule("E", body(vec![nt("T")]))
            .rule("T", body(vec![nt("T"), t("*"), nt("F")]))
            .rule("T", body(vec![nt("F")]))
            .rule("F", body(vec![t("("), nt("E"), t(")")]))
            .rule("F", body(vec![t("id")]))
            .build()
            .unwrap();

        let (out, cycles) = eliminate(&g);
        assert_eq!(cycles.len(), 2, "E and T each close a direct cycle");
        assert_no_residual_left_recursion(&out);

        assert_eq!(rules_of(&out, "E"), vec![&body(vec![nt("T"), nt("E'")])]);
        assert_eq!(
            rules_of(&out, "E'"),
            vec![&body(vec![t("+"), nt("T"), nt("E'")]), &Sentence::empty()]
        );
        assert_eq!(rules_of(&out, "T"), vec![&body(vec![nt("F"), nt("T'")])]);
        assert_eq!(
            rules_of(&out, "T'"),
            vec![&body(vec![t("*"), nt("F"), nt("T'")]), &Sentence::empty()]
        );
        // F was never recursive and is untouched
        assert_eq!(
            rules_of(&out, "F"),
            vec![&body(vec![t("("), nt("E"), t(")")]), &body(vec![t("id")])]
        );

        assert!(
            out.log()
                .iter()
                .all(|e| e.reason == RewriteReason::LeftRecursionExpansion)
        );
    }

    #[test]
    fn eliminates_indirect_recursion_by_substitution() {
        let g = ProductionSet::builder("S")
            .rule("S", body(vec![nt("A"), t("a")]))
            .rule("S", body(vec![t("b")]))
            .rule("A", body(vec![nt("S"), t("c")]))
            .rule("A", body(vec![t("d")]))
            .build()
            .unwrap();

        let (out, cycles) = eliminate(&g);
        assert!(!cycles.is_empty());
        assert_no_residual_left_recursion(&out);

        // S keeps its shape; A absorbed S's alternatives and went
        // right-recursive through a fresh helper
        assert_eq!(
            rules_of(&out, "S"),
            vec![&body(vec![nt("A"), t("a")]), &body(vec![t("b")])]
        );
        assert_eq!(
            rules_of(&out, "A"),
            vec![
                &body(vec![t("b"), t("c"), nt("A'")]),
                &body(vec![t("d"), nt("A'")]),
            ]
        );
        assert_eq!(
            rules_of(&out, "A'"),
            vec![&body(vec![t("a"), t("c"), nt("A'")]), &Sentence::empty()]
        );
    }

    #[test]
    fn head_without_base_case_stays_put_and_elimination_still_ends() {
        // A can never bottom out, so it has no right-recursive equivalent;
        // substituting it into B must not be attempted (it would reinstate
        // the A-leading rule every round), and B's own recursion still gets
        // rewritten
        let g = ProductionSet::builder("B")
            .rule("A", body(vec![nt("A"), t("x")]))
            .rule("B", body(vec![nt("B"), t("z")]))
            .rule("B", body(vec![nt("A"), t("y")]))
            .rule("B", body(vec![t("b")]))
            .build()
            .unwrap();

        let (out, cycles) = eliminate(&g);
        assert_eq!(cycles.len(), 2, "A and B each close a direct cycle");

        assert_eq!(rules_of(&out, "A"), vec![&body(vec![nt("A"), t("x")])]);
        assert_eq!(
            rules_of(&out, "B"),
            vec![
                &body(vec![nt("A"), t("y"), nt("B'")]),
                &body(vec![t("b"), nt("B'")]),
            ]
        );
        assert_eq!(
            rules_of(&out, "B'"),
            vec![&body(vec![t("z"), nt("B'")]), &Sentence::empty()]
        );
    }

    #[test]
    fn untouched_heads_stay_untouched() {
        // B → A y is not on any cycle and must not be substituted into
        let g = ProductionSet::builder("S")
            .rule("S", body(vec![nt("S"), t("s")]))
            .rule("S", body(vec![nt("B")]))
            .rule("A", body(vec![t("x")]))
            .rule("B", body(vec![nt("A"), t("y")]))
            .build()
            .unwrap();

        let (out, _) = eliminate(&g);
        assert_eq!(rules_of(&out, "B"), vec![&body(vec![nt("A"), t("y")])]);
        assert_eq!(rules_of(&out, "A"), vec![&body(vec![t("x")])]);
        assert_no_residual_left_recursion(&out);
    }
}
