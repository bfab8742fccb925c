// SPDX-License-Identifier: Apache-2.0

//! Post-placement fixups for placed digital-circuit layouts: relocation of
//! standard cells out of forbidden placement bands, and placement of each
//! boundary pin's buffer/diode chain into edge-adjacent rows.

use thiserror::Error;

mod design;
mod forbid;
mod iobuf;
mod pin_cfg;
mod pin_sort;

pub use design::{BTerm, Design, Inst, IoType, Net, Orientation, PlacementStatus, Row};
pub use forbid::{
    RelocationPolicy, RelocationReport, RoundReport, ZoneRect, relocate, relocate_round,
};
pub use iobuf::{ChainCells, place_io_chains};
pub use pin_cfg::{PinConfig, Side};
pub use pin_sort::{
    Conflict, NaturalToken, assign_sides, bus_key, natural_key, sort_and_assign,
    sorted_bterm_names,
};

/// Errors produced by config parsing and chain placement.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed pin configuration file; the caller must not proceed to
    /// placement.
    #[error("pin config line {line}: {msg}")]
    Config { line: usize, msg: String },
    /// A side pattern failed to compile as a regular expression.
    #[error("invalid pin pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },
    /// An OUTPUT pin's net has no buffer instance to anchor its chain.
    #[error("no buffer instance on the net of output pin {pin}")]
    MissingBuffer { pin: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
