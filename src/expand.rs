//! Macro expander: rewrites Option/Repetition/Alternation conveniences into
//! pure BNF productions.
//!
//! The driver always picks the **leftmost** macro of the **first** rule that
//! has one (scanning in rule order) and rewrites just that occurrence, then
//! rescans, until [`ProductionSet::contains_macro`] is false.  Every rewrite
//! strictly shrinks the termination measure of the whole set, which is what
//! guarantees the loop ends; the expander asserts this after each step.

use alloc::string::ToString;
use alloc::vec;
use log::debug;

use crate::error::GrammarError;
use crate::production::{ProductionRule, ProductionSet, RewriteReason};
use crate::symbol::{Sentence, Symbol};

/// Expands every macro in `set`, returning the pure-BNF snapshot.
///
/// Option `A → α [β] γ` becomes `A → α β γ` and `A → α γ`.  Repetition
/// `A → α {β} γ` introduces a fresh `A'` and becomes `A → α A' γ`,
/// `A' → β A'`, `A' → ε`.  Alternation `A → α (s1 | … | sn) β` becomes one
/// rule per alternative with the surrounding prefix and suffix kept.  Each
/// rewrite is logged with [`RewriteReason::MacroExpansion`].
///
/// Idempotent: a macro-free grammar comes back unchanged (save for a clone).
pub fn expand(set: &ProductionSet) -> Result<ProductionSet, GrammarError> {
    let mut current = set.clone();
    loop {
        let Some((rule_idx, macro_idx)) = current
            .rules()
            .iter()
            .enumerate()
            .find_map(|(i, r)| r.body.leftmost_macro().map(|m| (i, m)))
        else {
            return Ok(current);
        };

        let weight_before = current.expansion_weight();
        let rule = current.rules()[rule_idx].clone();
        let symbol = rule.body.symbols()[macro_idx].clone();

        let replacements = match &symbol {
            Symbol::Option(operand) => vec![
                ProductionRule::new(
                    rule.head.clone(),
                    rule.body.splice(macro_idx, operand.symbols()),
                ),
                ProductionRule::new(rule.head.clone(), rule.body.splice(macro_idx, &[])),
            ],
            Symbol::Repetition(operand) => {
                let fresh = current.fresh_non_terminal(&rule.head);
                let mut helper = operand.symbols().to_vec();
                helper.push(Symbol::NonTerminal(fresh.clone()));
                vec![
                    ProductionRule::new(
                        rule.head.clone(),
                        rule.body
                            .splice(macro_idx, &[Symbol::NonTerminal(fresh.clone())]),
                    ),
                    ProductionRule::new(fresh.clone(), Sentence::new(helper)),
                    ProductionRule::new(fresh, Sentence::empty()),
                ]
            }
            Symbol::Alternation(alternatives) => alternatives
                .iter()
                .map(|alt| {
                    ProductionRule::new(
                        rule.head.clone(),
                        rule.body.splice(macro_idx, alt.symbols()),
                    )
                })
                .collect(),
            other => {
                // Pipe never survives sentence construction, and plain
                // symbols are never reported as macros; anything landing
                // here is a macro variant this expander does not know.
                return Err(GrammarError::UnsupportedMacro {
                    rule: rule.to_string(),
                    symbol: other.to_string(),
                });
            }
        };

        debug!(
            "expanding `{symbol}` at position {macro_idx} of `{rule}` into {} rules",
            replacements.len()
        );
        current = current.with_replacement(rule_idx, replacements, RewriteReason::MacroExpansion);

        let weight_after = current.expansion_weight();
        assert!(
            weight_after < weight_before,
            "macro rewrite failed to shrink the termination measure ({weight_before} → {weight_after})"
        );
    }
}
