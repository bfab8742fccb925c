// SPDX-License-Identifier: Apache-2.0

use log::{debug, info, warn};

use crate::{Design, Inst};

/// Maximum number of relocation rounds before giving up on convergence.
const MAX_ROUNDS: usize = 5;

/// An axis-aligned forbidden placement rectangle, in scaled units (the same
/// units instance coordinates are in after division by
/// `RelocationPolicy::dbu_per_unit`). Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl ZoneRect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> ZoneRect {
        ZoneRect { x0, y0, x1, y1 }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        self.x0 <= x && x <= self.x1 && self.y0 <= y && y <= self.y1
    }
}

/// Which instances the relocator may touch, and where they must not remain.
#[derive(Debug, Clone)]
pub struct RelocationPolicy {
    /// Library prefix of relocatable masters, e.g. `sky130_fd_sc_hd`.
    pub lib_prefix: String,
    /// Cell families exempt from relocation, e.g. `decap`.
    pub whitelist: Vec<String>,
    /// Forbidden rectangles, in scaled units.
    pub zones: Vec<ZoneRect>,
    /// Database units per zone unit; instance coordinates are divided by
    /// this before the zone test. The value is a convention fixed by
    /// whatever produced the design (commonly 1000 for nm-to-um).
    pub dbu_per_unit: f64,
}

impl RelocationPolicy {
    fn is_library_cell(&self, inst: &Inst) -> bool {
        inst.master_name().starts_with(&self.lib_prefix)
    }

    /// The cell family is the token following the `__` separator in the
    /// master name, up to the next `_`; `sky130_fd_sc_hd__decap_4` is family
    /// `decap`. Masters without a `__` separator have no family.
    fn is_whitelisted(&self, inst: &Inst) -> bool {
        let master = inst.master_name();
        let Some((_, tail)) = master.split_once("__") else {
            return false;
        };
        let family = tail.split('_').next().unwrap_or(tail);
        self.whitelist.iter().any(|w| w == family)
    }

    fn in_forbidden_zone(&self, inst: &Inst) -> bool {
        let (x, y) = inst.location();
        let x = x as f64 / self.dbu_per_unit;
        let y = y as f64 / self.dbu_per_unit;
        self.zones.iter().any(|zone| zone.contains(x, y))
    }
}

/// Outcome of a single relocation round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// Instances moved this round.
    pub moved: usize,
    /// Offending instances left in place because no out-of-zone anchor was
    /// found on their nets.
    pub unresolved: usize,
}

/// Outcome of a full relocation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelocationReport {
    /// Rounds executed, including the final zero-move round if any.
    pub rounds: usize,
    /// Total moves across all rounds.
    pub moved: usize,
    /// Unresolved count of the last executed round.
    pub unresolved: usize,
}

/// Runs one relocation round over the current instance set.
///
/// Each library-prefixed, non-whitelisted instance currently inside a
/// forbidden rectangle is moved to the truncated-integer mean of the
/// locations of its connected neighbors that sit outside every rectangle
/// ("anchors"). Anchor status is evaluated against live positions, so an
/// instance moved earlier in the round anchors later ones at its new
/// location.
pub fn relocate_round(design: &Design, policy: &RelocationPolicy) -> RoundReport {
    let mut report = RoundReport::default();

    for inst in design.insts() {
        if !policy.is_library_cell(&inst) || policy.is_whitelisted(&inst) {
            continue;
        }
        if !policy.in_forbidden_zone(&inst) {
            continue;
        }

        // Average over connected neighbors outside every forbidden zone.
        let anchors: Vec<(i64, i64)> = inst
            .connected_insts()
            .iter()
            .filter(|ci| !policy.in_forbidden_zone(ci))
            .map(|ci| ci.location())
            .collect();

        if anchors.is_empty() {
            warn!(
                "no out-of-zone anchor for {} ({}); leaving in place",
                inst.name(),
                inst.master_name()
            );
            report.unresolved += 1;
            continue;
        }

        let n = anchors.len() as i64;
        let x = anchors.iter().map(|a| a.0).sum::<i64>() / n;
        let y = anchors.iter().map(|a| a.1).sum::<i64>() / n;

        debug!(
            "relocating {} ({}) to ({x}, {y})",
            inst.name(),
            inst.master_name()
        );
        inst.set_location(x, y);
        report.moved += 1;
    }

    report
}

/// Repeats relocation rounds until a round moves nothing, up to a fixed cap
/// of five rounds. There is no guarantee that every offender ends up outside
/// all forbidden rectangles; the averaging step is a heuristic pull toward
/// the cell's neighborhood, not an exact legalizer.
pub fn relocate(design: &Design, policy: &RelocationPolicy) -> RelocationReport {
    let mut report = RelocationReport::default();

    for round in 0..MAX_ROUNDS {
        let pass = relocate_round(design, policy);
        report.rounds = round + 1;
        report.moved += pass.moved;
        report.unresolved = pass.unresolved;

        info!(
            "relocation round {}: moved {}, unresolved {}",
            round + 1,
            pass.moved,
            pass.unresolved
        );

        if pass.moved == 0 {
            break;
        }
    }

    report
}
