//! Ingredient-name normalization.
//!
//! The site spells the same ingredient several ways and mixes half- and
//! full-width brackets. [`NameNormalizer`] folds those variants onto one
//! spelling using the table from the configuration:
//!
//! 1. replacement table, in order, repeated until a pass changes nothing
//! 2. bracket characters mapped to the canonical full-width style
//! 3. the `）（` joiner collapsed into a single separator
//!
//! The function is pure and idempotent for any table whose rules converge.

use crate::config::{NormalizerConfig, Rule};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct NameNormalizer {
    replacements: Vec<Rule>,
    brackets: Vec<Rule>,
    joiner: Rule,
}

impl NameNormalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        Self {
            replacements: config.replacements.clone(),
            brackets: config.brackets.clone(),
            joiner: config.joiner.clone(),
        }
    }

    pub fn normalize(&self, name: &str) -> String {
        let out = self.normalize_brackets(&self.apply_replacements(name));
        out.replace(&self.joiner.from, &self.joiner.to)
    }

    /// Map half-width brackets to the canonical full-width ones.
    pub fn normalize_brackets(&self, name: &str) -> String {
        self.brackets
            .iter()
            .fold(name.to_string(), |acc, rule| acc.replace(&rule.from, &rule.to))
    }

    fn apply_replacements(&self, name: &str) -> String {
        // A later rule can produce the `from` of an earlier one (海老 -> えび
        // feeds むきえび), so run passes until the text is stable.
        let max_passes = self.replacements.len() + 1;
        let mut current = name.to_string();
        for _ in 0..max_passes {
            let next = self
                .replacements
                .iter()
                .fold(current.clone(), |acc, rule| acc.replace(&rule.from, &rule.to));
            if next == current {
                return current;
            }
            current = next;
        }
        warn!(name, result = %current, "Replacement table did not converge");
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarvestConfig;

    fn normalizer() -> NameNormalizer {
        NameNormalizer::new(&HarvestConfig::embedded().unwrap().normalizer)
    }

    #[test]
    fn test_table_replacement() {
        let n = normalizer();
        assert_eq!(n.normalize("豚バラブロック肉"), "豚バラブロック");
        assert_eq!(n.normalize("人参"), "にんじん");
        assert_eq!(n.normalize("ナス"), "なす");
        assert_eq!(n.normalize("薄切り牛肉"), "牛うす切り肉");
        assert_eq!(n.normalize("豚バラ肉薄切り"), "豚バラ薄切り");
    }

    #[test]
    fn test_chained_rules_converge() {
        assert_eq!(normalizer().normalize("むき海老"), "むきエビ");
    }

    #[test]
    fn test_brackets_become_full_width() {
        assert_eq!(normalizer().normalize("しょうゆ(減塩)"), "しょうゆ（減塩）");
    }

    #[test]
    fn test_normalize_brackets_only_touches_brackets() {
        assert_eq!(normalizer().normalize_brackets("人参(M)1本"), "人参（M）1本");
    }

    #[test]
    fn test_double_parenthetical_is_joined() {
        assert_eq!(normalizer().normalize("卵(M)(溶く)"), "卵（M・溶く）");
        assert_eq!(normalizer().normalize("卵（M）（溶く）"), "卵（M・溶く）");
    }

    #[test]
    fn test_unrelated_names_untouched() {
        assert_eq!(normalizer().normalize("塩"), "塩");
        assert_eq!(normalizer().normalize(""), "");
    }

    #[test]
    fn test_idempotent() {
        let n = normalizer();
        for name in [
            "むき海老",
            "豚バラ薄切り肉",
            "合挽き肉(牛豚)",
            "三つ葉)(",
            "鶏がらスープの素（顆粒）（小さじ）",
            "骨付き鶏もも肉",
            "デミグラスソース缶",
        ] {
            let once = n.normalize(name);
            assert_eq!(n.normalize(&once), once, "not idempotent for {name}");
        }
    }

    #[test]
    fn test_non_converging_table_stops() {
        let config = NormalizerConfig {
            joiner: Rule { from: "）（".into(), to: "・".into() },
            brackets: vec![],
            replacements: vec![
                Rule { from: "a".into(), to: "b".into() },
                Rule { from: "b".into(), to: "a".into() },
            ],
        };
        // Terminates rather than looping forever.
        assert_eq!(NameNormalizer::new(&config).normalize("a"), "a");
    }
}
