//! Ordered rule chains
//!
//! Every authorization and protection decision in Bastion is an ordered list of
//! named rules evaluated first-match-wins: each rule either decides (returns
//! `Some`) or falls through (returns `None`) to the next one. Keeping the rules as
//! a flat, named list makes the precedence between them visible in one place and
//! lets tests assert which rule decided an outcome.

use std::fmt;
use tracing::{debug, trace};

/// A single rule: decide, or fall through with `None`.
pub type Rule<C, V> = fn(&mut C) -> Option<V>;

/// The rule that decided a chain, together with its decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch<V> {
    /// Name of the deciding rule
    pub rule: &'static str,
    /// The rule's decision
    pub value: V,
}

/// An ordered, named list of rules over a context `C` producing decisions `V`.
pub struct RuleChain<'r, C, V> {
    name: &'static str,
    rules: &'r [(&'static str, Rule<C, V>)],
}

impl<'r, C, V: fmt::Debug> RuleChain<'r, C, V> {
    /// Create a chain over a fixed rule list
    pub fn new(name: &'static str, rules: &'r [(&'static str, Rule<C, V>)]) -> Self {
        Self { name, rules }
    }

    /// Name of this chain, used in logs
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Rule names in evaluation order
    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|(name, _)| *name)
    }

    /// Evaluate rules in order and return the first decision.
    pub fn evaluate(&self, ctx: &mut C) -> Option<RuleMatch<V>> {
        for &(rule, check) in self.rules {
            if let Some(value) = check(ctx) {
                debug!(chain = self.name, rule, decision = ?value, "rule chain decided");
                return Some(RuleMatch { rule, value });
            }
        }
        trace!(chain = self.name, "no rule decided");
        None
    }

    /// Evaluate the chain, falling back to `default` when no rule decides.
    pub fn evaluate_or(&self, ctx: &mut C, default: V) -> RuleMatch<V> {
        self.evaluate(ctx).unwrap_or(RuleMatch {
            rule: "default",
            value: default,
        })
    }
}

impl<C, V> fmt::Debug for RuleChain<'_, C, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleChain")
            .field("name", &self.name)
            .field(
                "rules",
                &self.rules.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        visited: Vec<&'static str>,
        value: i32,
    }

    fn negative(ctx: &mut Probe) -> Option<&'static str> {
        ctx.visited.push("negative");
        (ctx.value < 0).then_some("negative")
    }

    fn even(ctx: &mut Probe) -> Option<&'static str> {
        ctx.visited.push("even");
        (ctx.value % 2 == 0).then_some("even")
    }

    fn small(ctx: &mut Probe) -> Option<&'static str> {
        ctx.visited.push("small");
        (ctx.value < 10).then_some("small")
    }

    const RULES: [(&str, Rule<Probe, &'static str>); 3] =
        [("negative", negative), ("even", even), ("small", small)];

    #[test]
    fn test_first_match_wins_and_stops() {
        let chain = RuleChain::new("probe", &RULES);
        let mut ctx = Probe {
            value: 4,
            ..Probe::default()
        };
        let decided = chain.evaluate(&mut ctx).unwrap();
        assert_eq!(decided.rule, "even");
        assert_eq!(decided.value, "even");
        assert_eq!(ctx.visited, vec!["negative", "even"]);
    }

    #[test]
    fn test_fall_through_to_default() {
        let chain = RuleChain::new("probe", &RULES);
        let mut ctx = Probe {
            value: 13,
            ..Probe::default()
        };
        assert!(chain.evaluate(&mut ctx).is_none());
        let decided = chain.evaluate_or(&mut ctx, "large");
        assert_eq!(decided.rule, "default");
        assert_eq!(decided.value, "large");
    }

    #[test]
    fn test_rule_names_in_order() {
        let chain = RuleChain::new("probe", &RULES);
        let names: Vec<_> = chain.rule_names().collect();
        assert_eq!(names, vec!["negative", "even", "small"]);
    }
}
