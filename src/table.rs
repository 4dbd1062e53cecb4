//! LL(1) parse-table construction.
//!
//! A [`ParsingTable`] maps (head, lookahead) cells to candidate productions.
//! Building never fails: conflicting grammars simply get cells with more
//! than one candidate, which [`ParsingTable::conflicts`] reports and
//! [`ParsingTable::lookup`] refuses to answer.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use hashbrown::HashMap;
use log::{debug, trace};

use crate::check::{ExTerm, GrammarSets};
use crate::error::TableConflict;
use crate::production::{ProductionRule, ProductionSet};

#[derive(Debug, Clone)]
pub struct ParsingTable {
    rules: Vec<ProductionRule>,
    cells: HashMap<String, HashMap<ExTerm, Vec<usize>>>,
}

impl ParsingTable {
    /// Builds the table for a macro-free grammar against sets computed from
    /// the same snapshot.  A production lands in cell `(head, t)` for each
    /// terminal `t` in FIRST of its body, and additionally in every cell of
    /// FOLLOW(head) when the body is nullable.
    pub fn build(set: &ProductionSet, sets: &GrammarSets) -> Self {
        assert!(
            !set.contains_macro(),
            "table construction requires a macro-free grammar; run expand first"
        );

        let rules = set.rules().to_vec();
        let mut cells: HashMap<String, HashMap<ExTerm, Vec<usize>>> = HashMap::new();
        for head in set.heads() {
            cells.insert(head.to_string(), HashMap::new());
        }

        for (i, rule) in rules.iter().enumerate() {
            let first = sets.first_of(rule.body.symbols());
            let row = cells
                .get_mut(rule.head.as_str())
                .unwrap_or_else(|| panic!("no table row for head `{}`", rule.head));

            for item in &first {
                if matches!(item, ExTerm::Term(_)) {
                    trace!("cell ({}, {item}) ← rule {i}", rule.head);
                    enter(row, item.clone(), i);
                }
            }
            if first.contains(&ExTerm::Empty) {
                // the vanishing production answers whatever may follow
                for item in sets.follow(&rule.head) {
                    trace!("cell ({}, {item}) ← rule {i} via FOLLOW", rule.head);
                    enter(row, item.clone(), i);
                }
            }
        }

        let table = Self { rules, cells };
        debug!(
            "built parse table: {} rules, {} conflicting cells",
            table.rules.len(),
            table.conflicts().len()
        );
        table
    }

    pub fn rules(&self) -> &[ProductionRule] {
        &self.rules
    }

    /// Every production a cell admits, in rule order.
    pub fn candidates(&self, head: &str, lookahead: &ExTerm) -> Vec<&ProductionRule> {
        self.cells
            .get(head)
            .and_then(|row| row.get(lookahead))
            .map(|indices| indices.iter().map(|&i| &self.rules[i]).collect())
            .unwrap_or_default()
    }

    /// The unique production for a cell, or `None` when the cell is empty
    /// or conflicting.
    pub fn lookup(&self, head: &str, lookahead: &ExTerm) -> Option<&ProductionRule> {
        match self.candidates(head, lookahead).as_slice() {
            &[rule] => Some(rule),
            _ => None,
        }
    }

    /// Cells admitting more than one production, ordered by head then
    /// lookahead for stable reporting.
    pub fn conflicts(&self) -> Vec<TableConflict> {
        let mut out = Vec::new();
        for (head, row) in &self.cells {
            for (lookahead, indices) in row {
                if indices.len() > 1 {
                    out.push(TableConflict {
                        head: head.clone(),
                        lookahead: lookahead.clone(),
                        candidates: indices.iter().map(|&i| self.rules[i].clone()).collect(),
                    });
                }
            }
        }
        out.sort_by_key(|c| (c.head.clone(), c.lookahead.to_string()));
        out
    }

    pub fn is_ll1(&self) -> bool {
        self.cells
            .values()
            .all(|row| row.values().all(|indices| indices.len() == 1))
    }
}

fn enter(row: &mut HashMap<ExTerm, Vec<usize>>, lookahead: ExTerm, rule: usize) {
    let cell = row.entry(lookahead).or_default();
    // a rule can reach the same cell through FIRST and FOLLOW at once;
    // that is one candidate, not a conflict with itself
    if !cell.contains(&rule) {
        cell.push(rule);
    }
}
