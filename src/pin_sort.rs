// SPDX-License-Identifier: Apache-2.0

use std::cmp::Ordering;

use indexmap::IndexMap;
use log::warn;
use regex::Regex;

use crate::{BTerm, Design, Error, PinConfig, Result, Side};

/// One element of a natural-sort key: either a run of non-numeric text or a
/// run of decimal digits. Digit runs compare numerically at any length,
/// text compares lexicographically, and a number always sorts before text at
/// the same position (the mixed case only arises when one name is a strict
/// prefix of the other up to a run boundary).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NaturalToken {
    /// Decimal digits with leading zeros stripped (`"0"` for an all-zero
    /// run). Numeric order falls out of comparing length before content.
    Num(String),
    Text(String),
}

impl NaturalToken {
    fn num(run: &str) -> NaturalToken {
        // A sign before the digits is consumed by the split but is not part
        // of the value.
        let digits = run
            .trim_start_matches(['+', '-'])
            .trim_start_matches('0');
        let digits = if digits.is_empty() { "0" } else { digits };
        NaturalToken::Num(digits.to_string())
    }
}

impl Ord for NaturalToken {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NaturalToken::Num(a), NaturalToken::Num(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (NaturalToken::Text(a), NaturalToken::Text(b)) => a.cmp(b),
            (NaturalToken::Num(_), NaturalToken::Text(_)) => Ordering::Less,
            (NaturalToken::Text(_), NaturalToken::Num(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for NaturalToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Builds the natural-sort key for a terminal name: bracket, dot, and dollar
/// characters are stripped, then the name is split into alternating text and
/// number runs. `"a2"` sorts before `"a10"`, which sorts before `"b1"`.
pub fn natural_key(name: &str) -> Vec<NaturalToken> {
    let stripped: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '.' | '$'))
        .collect();

    let number = Regex::new(r"[+-]?\d+").unwrap();
    let mut key = Vec::new();
    let mut tail = 0;
    for m in number.find_iter(&stripped) {
        key.push(NaturalToken::Text(stripped[tail..m.start()].to_string()));
        key.push(NaturalToken::num(m.as_str()));
        tail = m.end();
    }
    key.push(NaturalToken::Text(stripped[tail..].to_string()));
    key
}

/// Builds the bus-sort key for a terminal name: the integer inside a
/// trailing `[N]` suffix, or -1 if there is none. Terminals without a bus
/// index sort first, keeping their natural-sort relative order.
pub fn bus_key(name: &str) -> i64 {
    let suffix = Regex::new(r"\[(\d+)\]$").unwrap();
    suffix
        .captures(name)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(-1)
}

/// Returns all boundary terminal names in the global deterministic order:
/// natural sort, then (if `bus_sort`) a stable secondary sort by bus index.
pub fn sorted_bterm_names(design: &Design, bus_sort: bool) -> Vec<String> {
    let mut names: Vec<String> = design.bterms().iter().map(|bt| bt.name()).collect();
    names.sort_by_cached_key(|name| natural_key(name));
    if bus_sort {
        names.sort_by_cached_key(|name| bus_key(name));
    }
    names
}

/// A terminal that matched more than one side pattern. Only the first match
/// is kept; the rest are reported and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub terminal: String,
    pub kept: String,
    pub ignored: String,
}

/// Partitions globally ordered terminal names into per-side lists.
///
/// Sides are processed in N, E, S, W order, patterns within a side in file
/// order. Each pattern is anchored with a trailing `$` and must match the
/// whole name starting at its first character. A terminal is assigned at
/// most once (first match wins); later matches are returned as conflicts.
/// Terminals matching no pattern are absent from every side's list.
pub fn assign_sides(
    names: &[String],
    cfg: &PinConfig,
) -> Result<(IndexMap<Side, Vec<String>>, Vec<Conflict>)> {
    let mut sides: IndexMap<Side, Vec<String>> = IndexMap::new();
    for side in Side::ALL {
        sides.insert(side, Vec::new());
    }

    let mut assigned: IndexMap<&str, String> = IndexMap::new();
    let mut conflicts = Vec::new();

    for side in Side::ALL {
        for pattern in &cfg.patterns[&side] {
            let anchored = format!("{pattern}$");
            let re = Regex::new(&anchored).map_err(|source| Error::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            for name in names {
                if !re.find(name).is_some_and(|m| m.start() == 0) {
                    continue;
                }
                if let Some(kept) = assigned.get(name.as_str()) {
                    conflicts.push(Conflict {
                        terminal: name.clone(),
                        kept: kept.clone(),
                        ignored: anchored.clone(),
                    });
                    continue;
                }
                assigned.insert(name.as_str(), anchored.clone());
                sides[&side].push(name.clone());
            }
        }
    }

    Ok((sides, conflicts))
}

/// Sorts a design's boundary terminals and partitions them into per-side
/// ordered lists according to `cfg`. Conflicts are logged as warnings.
pub fn sort_and_assign(design: &Design, cfg: &PinConfig) -> Result<IndexMap<Side, Vec<BTerm>>> {
    let names = sorted_bterm_names(design, cfg.bus_sort);
    let (side_names, conflicts) = assign_sides(&names, cfg)?;

    for c in &conflicts {
        warn!(
            "terminal {} matches both {} and {}; keeping the first",
            c.terminal, c.kept, c.ignored
        );
    }

    let by_name: IndexMap<String, BTerm> = design
        .bterms()
        .into_iter()
        .map(|bt| (bt.name(), bt))
        .collect();

    let mut sides = IndexMap::new();
    for (side, names) in side_names {
        let bterms = names.iter().map(|name| by_name[name].clone()).collect();
        sides.insert(side, bterms);
    }
    Ok(sides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_key_splits_text_and_number_runs() {
        assert_eq!(
            natural_key("io2x"),
            vec![
                NaturalToken::Text("io".to_string()),
                NaturalToken::Num("2".to_string()),
                NaturalToken::Text("x".to_string()),
            ]
        );
    }

    #[test]
    fn natural_key_strips_bracket_dot_dollar() {
        assert_eq!(natural_key("sig[3]"), natural_key("sig3"));
        assert_eq!(natural_key("a.b$c"), natural_key("abc"));
    }

    #[test]
    fn natural_key_ignores_leading_zeros() {
        assert_eq!(natural_key("sig007"), natural_key("sig7"));
        assert!(natural_key("sig007") < natural_key("sig10"));
    }

    #[test]
    fn natural_key_handles_digit_runs_beyond_machine_integers() {
        let twenty_nines = "bus99999999999999999999";
        let twenty_one_digits = "bus100000000000000000000";
        assert!(natural_key(twenty_nines) < natural_key(twenty_one_digits));
        assert!(natural_key("bus2") < natural_key(twenty_nines));
    }

    #[test]
    fn sign_before_digits_is_dropped_from_the_key() {
        assert_eq!(natural_key("a-2"), natural_key("a2"));
        assert!(natural_key("a-2") < natural_key("a10"));
    }

    #[test]
    fn bus_key_requires_trailing_bracket() {
        assert_eq!(bus_key("sig[12]"), 12);
        assert_eq!(bus_key("sig[12]x"), -1);
        assert_eq!(bus_key("clk"), -1);
    }
}
