// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;
use log::debug;

use crate::{BTerm, Design, Error, Inst, IoType, PlacementStatus, Result, Row, Side};

/// Sites of clearance between the row edge and the first chain instance.
const EDGE_MARGIN_SITES: i64 = 20;

/// Sites of clearance between consecutive chain instances.
const CHAIN_GAP_SITES: i64 = 2;

/// Master names of the two auxiliary cell types making up a pin's chain.
#[derive(Debug, Clone)]
pub struct ChainCells {
    pub buffer: String,
    pub diode: String,
}

impl ChainCells {
    pub fn new(buffer: impl AsRef<str>, diode: impl AsRef<str>) -> ChainCells {
        ChainCells {
            buffer: buffer.as_ref().to_string(),
            diode: diode.as_ref().to_string(),
        }
    }
}

/// Discovers the buffer/diode chain for one boundary terminal, in placement
/// order.
///
/// For an INPUT pin both cells sit on the pin's net, placed diode first so
/// the protection diode is nearest the pad. For an OUTPUT pin the buffer is
/// the anchor on the pin's net (its absence is a fatal configuration error)
/// and the diode, if any, sits on the buffer's `A`-pin net, placed after the
/// buffer. Where several instances of a chain master share a net, the first
/// in connection order is used.
fn discover_chain(bterm: &BTerm, cells: &ChainCells) -> Result<Vec<Inst>> {
    let on_net = |insts: &[Inst], master: &str| -> Option<Inst> {
        insts.iter().find(|i| i.master_name() == master).cloned()
    };

    let net_insts = bterm.net().insts();
    let mut chain = Vec::new();

    match bterm.io_type() {
        IoType::Input => {
            if let Some(diode) = on_net(&net_insts, &cells.diode) {
                chain.push(diode);
            }
            if let Some(buffer) = on_net(&net_insts, &cells.buffer) {
                chain.push(buffer);
            }
        }
        // Bidirectional pins carry no buffer/diode chain.
        IoType::InOut => {}
        IoType::Output => {
            let Some(buffer) = on_net(&net_insts, &cells.buffer) else {
                return Err(Error::MissingBuffer { pin: bterm.name() });
            };
            let diode = buffer
                .find_iterm("A")
                .and_then(|net| on_net(&net.insts(), &cells.diode));
            chain.push(buffer);
            if let Some(diode) = diode {
                chain.push(diode);
            }
        }
    }

    Ok(chain)
}

fn place_chain_west(chain: &[Inst], row: &Row) {
    let sw = row.site_width();
    let (_, ry) = row.origin();
    let mut x = EDGE_MARGIN_SITES * sw;
    for inst in chain {
        inst.set_orient(row.orient());
        inst.set_location(x, ry);
        inst.set_placement_status(PlacementStatus::Firm);
        x += inst.master_width() + CHAIN_GAP_SITES * sw;
    }
}

fn place_chain_east(chain: &[Inst], row: &Row) {
    let sw = row.site_width();
    let (_, ry) = row.origin();
    let mut x = (row.site_count() - EDGE_MARGIN_SITES) * sw;
    for inst in chain {
        x -= inst.master_width() + CHAIN_GAP_SITES * sw;
        inst.set_orient(row.orient());
        inst.set_location(x, ry);
        inst.set_placement_status(PlacementStatus::Firm);
    }
}

/// Places the buffer/diode chain of every West- and East-side terminal into
/// center-aligned placement rows, marking each placed instance firm.
///
/// Terminals are paired with consecutive rows (ascending y-origin) starting
/// at offset `floor((row_count - terminal_count) / 2)`; a negative offset
/// counts back from the end of the row list, so an oversized terminal list
/// pairs its leading terminals with the topmost rows. Rows outside the
/// window are untouched, and pairing stops if the rows run out. North and
/// South side lists are ignored.
pub fn place_io_chains(
    design: &Design,
    sides: &IndexMap<Side, Vec<BTerm>>,
    cells: &ChainCells,
) -> Result<()> {
    let rows = design.rows();

    for (side, bterms) in sides {
        if !matches!(side, Side::West | Side::East) {
            continue;
        }

        let offset = (rows.len() as i64 - bterms.len() as i64).div_euclid(2);
        let start = if offset >= 0 {
            offset as usize
        } else {
            (rows.len() as i64 + offset).max(0) as usize
        };

        for (row, bterm) in rows[start..].iter().zip(bterms) {
            let chain = discover_chain(bterm, cells)?;
            debug!(
                "pin {}: placing {} chain instance(s) at row y={} orient {}",
                bterm.name(),
                chain.len(),
                row.origin().1,
                row.orient().as_str()
            );
            match side {
                Side::West => place_chain_west(&chain, row),
                Side::East => place_chain_east(&chain, row),
                _ => unreachable!(),
            }
        }
    }

    Ok(())
}
