// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::{Error, Result};

/// A chip edge. Declaration order (N, E, S, W) is the order sides are
/// processed during assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    North,
    East,
    South,
    West,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    fn from_directive(token: &str) -> Option<Side> {
        match token {
            "#N" => Some(Side::North),
            "#E" => Some(Side::East),
            "#S" => Some(Side::South),
            "#W" => Some(Side::West),
            _ => None,
        }
    }
}

/// Parsed pin configuration: per-side ordered pattern lists plus the
/// bus-sort flag.
#[derive(Debug, Clone)]
pub struct PinConfig {
    /// Side to pattern list, in file order within each side. All four sides
    /// are always present, in N, E, S, W order.
    pub patterns: IndexMap<Side, Vec<String>>,
    /// Group bus bits by trailing `[N]` index after the natural sort.
    pub bus_sort: bool,
    /// Sides selected with the reversed-order `R` suffix. Recorded as
    /// parsed; no reversal is ever applied to patterns or terminals.
    pub reversed: Vec<Side>,
}

impl PinConfig {
    fn empty() -> PinConfig {
        let mut patterns = IndexMap::new();
        for side in Side::ALL {
            patterns.insert(side, Vec::new());
        }
        PinConfig {
            patterns,
            bus_sort: false,
            reversed: Vec::new(),
        }
    }

    /// Parses pin configuration text.
    ///
    /// The grammar is line-oriented: blank lines are ignored, and every
    /// other line holds exactly one token. `#N`, `#E`, `#S`, `#W` select a
    /// side (append `R` to request reversed order), `#BUS_SORT` enables bus
    /// sorting, and any other token is a regex pattern appended to the
    /// currently selected side. A pattern before any side directive, a
    /// multi-token line, or an unknown `#` directive is a format error.
    pub fn parse(text: &str) -> Result<PinConfig> {
        let mut cfg = PinConfig::empty();
        let mut cur_side: Option<Side> = None;

        for (lineno, line) in text.lines().enumerate() {
            let mut tokens = line.split_whitespace();
            let Some(token) = tokens.next() else {
                continue;
            };
            if tokens.next().is_some() {
                return Err(Error::Config {
                    line: lineno + 1,
                    msg: "only one entry allowed per line".to_string(),
                });
            }

            if !token.starts_with('#') {
                let Some(side) = cur_side else {
                    return Err(Error::Config {
                        line: lineno + 1,
                        msg: format!("pattern {token:?} before any side directive"),
                    });
                };
                cfg.patterns[&side].push(token.to_string());
            } else if token == "#BUS_SORT" {
                cfg.bus_sort = true;
            } else {
                let (selector, reversed) = match token.len() {
                    3 if token.ends_with('R') => (&token[..2], true),
                    _ => (token, false),
                };
                let Some(side) = Side::from_directive(selector) else {
                    return Err(Error::Config {
                        line: lineno + 1,
                        msg: format!(
                            "unknown directive {token}; valid directives are #N, #E, #S, #W \
                             (append R to reverse the default order) and #BUS_SORT"
                        ),
                    });
                };
                if reversed {
                    cfg.reversed.push(side);
                }
                cur_side = Some(side);
            }
        }

        Ok(cfg)
    }

    /// Reads and parses a pin configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<PinConfig> {
        let text = fs::read_to_string(path)?;
        PinConfig::parse(&text)
    }
}
