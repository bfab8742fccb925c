// SPDX-License-Identifier: Apache-2.0

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

/// Placement orientation of an instance or row, using DEF naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    N,
    S,
    E,
    W,
    FN,
    FS,
    FE,
    FW,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::N => "N",
            Orientation::S => "S",
            Orientation::E => "E",
            Orientation::W => "W",
            Orientation::FN => "FN",
            Orientation::FS => "FS",
            Orientation::FE => "FE",
            Orientation::FW => "FW",
        }
    }
}

/// Placement status of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementStatus {
    #[default]
    Unplaced,
    Placed,
    /// Location is fixed; later placement steps must not disturb it.
    Firm,
}

/// Signal direction of a chip-boundary terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoType {
    Input,
    Output,
    InOut,
}

struct MasterData {
    width: i64,
}

struct InstData {
    master: String,
    location: (i64, i64),
    orient: Orientation,
    status: PlacementStatus,
    /// Pin name to connected net name, in connection order.
    pins: IndexMap<String, String>,
}

struct NetData {
    /// Instance terminals on this net as (instance, pin), in connection order.
    iterms: Vec<(String, String)>,
}

struct BTermData {
    io_type: IoType,
    net: String,
}

struct RowData {
    origin: (i64, i64),
    orient: Orientation,
    site_width: i64,
    site_count: i64,
}

/// Data structure holding the contents of a design. Not intended to be used
/// directly; use `Design` instead, which contains a smart pointer to this
/// struct.
pub struct DesignCore {
    name: String,
    masters: IndexMap<String, MasterData>,
    insts: IndexMap<String, InstData>,
    nets: IndexMap<String, NetData>,
    bterms: IndexMap<String, BTermData>,
    rows: Vec<RowData>,
}

/// An in-memory placed design: masters, instances, nets, boundary terminals,
/// and placement rows, with mutable instance geometry.
#[derive(Clone)]
pub struct Design {
    pub(crate) core: Rc<RefCell<DesignCore>>,
}

impl Design {
    /// Creates a new, empty design with the given name.
    pub fn new(name: impl AsRef<str>) -> Design {
        Design {
            core: Rc::new(RefCell::new(DesignCore {
                name: name.as_ref().to_string(),
                masters: IndexMap::new(),
                insts: IndexMap::new(),
                nets: IndexMap::new(),
                bterms: IndexMap::new(),
                rows: Vec::new(),
            })),
        }
    }

    /// Returns the name of this design.
    pub fn name(&self) -> String {
        self.core.borrow().name.clone()
    }

    /// Defines a master (cell type) with the given name and physical width.
    pub fn add_master(&self, name: impl AsRef<str>, width: i64) {
        let mut core = self.core.borrow_mut();
        if core
            .masters
            .insert(name.as_ref().to_string(), MasterData { width })
            .is_some()
        {
            panic!("Master {} is already defined", name.as_ref());
        }
    }

    /// Creates an unplaced instance of `master` with the given name.
    pub fn add_inst(&self, name: impl AsRef<str>, master: impl AsRef<str>) -> Inst {
        let name = name.as_ref();
        let master = master.as_ref();
        {
            let mut core = self.core.borrow_mut();
            if !core.masters.contains_key(master) {
                panic!("Master {master} is not defined");
            }
            if core
                .insts
                .insert(
                    name.to_string(),
                    InstData {
                        master: master.to_string(),
                        location: (0, 0),
                        orient: Orientation::default(),
                        status: PlacementStatus::default(),
                        pins: IndexMap::new(),
                    },
                )
                .is_some()
            {
                panic!("Instance {name} already exists");
            }
        }
        Inst {
            core: self.core.clone(),
            name: name.to_string(),
        }
    }

    /// Creates a net with the given name.
    pub fn add_net(&self, name: impl AsRef<str>) -> Net {
        let name = name.as_ref();
        {
            let mut core = self.core.borrow_mut();
            if core
                .nets
                .insert(name.to_string(), NetData { iterms: Vec::new() })
                .is_some()
            {
                panic!("Net {name} already exists");
            }
        }
        Net {
            core: self.core.clone(),
            name: name.to_string(),
        }
    }

    /// Creates a chip-boundary terminal connected to `net`.
    pub fn add_bterm(&self, name: impl AsRef<str>, io_type: IoType, net: &Net) -> BTerm {
        let name = name.as_ref();
        {
            let mut core = self.core.borrow_mut();
            if !core.nets.contains_key(&net.name) {
                panic!("Net {} does not exist", net.name);
            }
            if core
                .bterms
                .insert(
                    name.to_string(),
                    BTermData {
                        io_type,
                        net: net.name.clone(),
                    },
                )
                .is_some()
            {
                panic!("Boundary terminal {name} already exists");
            }
        }
        BTerm {
            core: self.core.clone(),
            name: name.to_string(),
        }
    }

    /// Appends a placement row.
    pub fn add_row(
        &self,
        origin: (i64, i64),
        orient: Orientation,
        site_width: i64,
        site_count: i64,
    ) {
        self.core.borrow_mut().rows.push(RowData {
            origin,
            orient,
            site_width,
            site_count,
        });
    }

    /// Returns a handle to the instance with the given name, if it exists.
    pub fn find_inst(&self, name: impl AsRef<str>) -> Option<Inst> {
        let name = name.as_ref();
        self.core.borrow().insts.contains_key(name).then(|| Inst {
            core: self.core.clone(),
            name: name.to_string(),
        })
    }

    /// Returns handles to all instances, in creation order.
    pub fn insts(&self) -> Vec<Inst> {
        self.core
            .borrow()
            .insts
            .keys()
            .map(|name| Inst {
                core: self.core.clone(),
                name: name.clone(),
            })
            .collect()
    }

    /// Returns handles to all chip-boundary terminals, in creation order.
    pub fn bterms(&self) -> Vec<BTerm> {
        self.core
            .borrow()
            .bterms
            .keys()
            .map(|name| BTerm {
                core: self.core.clone(),
                name: name.clone(),
            })
            .collect()
    }

    /// Returns handles to all placement rows, ordered by ascending y-origin.
    pub fn rows(&self) -> Vec<Row> {
        let core = self.core.borrow();
        (0..core.rows.len())
            .sorted_by_key(|&i| core.rows[i].origin.1)
            .map(|index| Row {
                core: self.core.clone(),
                index,
            })
            .collect()
    }
}

/// Handle to an instance in a `Design`.
#[derive(Clone)]
pub struct Inst {
    core: Rc<RefCell<DesignCore>>,
    name: String,
}

impl Inst {
    fn data<T>(&self, f: impl FnOnce(&InstData) -> T) -> T {
        let core = self.core.borrow();
        f(&core.insts[&self.name])
    }

    fn data_mut<T>(&self, f: impl FnOnce(&mut InstData) -> T) -> T {
        let mut core = self.core.borrow_mut();
        f(&mut core.insts[&self.name])
    }

    /// Returns the name of this instance.
    pub fn name(&self) -> String {
        self.name.clone()
    }

    /// Returns the name of this instance's master.
    pub fn master_name(&self) -> String {
        self.data(|d| d.master.clone())
    }

    /// Returns the physical width of this instance's master.
    pub fn master_width(&self) -> i64 {
        let core = self.core.borrow();
        let master = &core.insts[&self.name].master;
        core.masters[master].width
    }

    /// Returns this instance's location in database units.
    pub fn location(&self) -> (i64, i64) {
        self.data(|d| d.location)
    }

    /// Moves this instance to `(x, y)` in database units.
    pub fn set_location(&self, x: i64, y: i64) {
        self.data_mut(|d| d.location = (x, y));
    }

    /// Returns this instance's orientation.
    pub fn orient(&self) -> Orientation {
        self.data(|d| d.orient)
    }

    /// Sets this instance's orientation.
    pub fn set_orient(&self, orient: Orientation) {
        self.data_mut(|d| d.orient = orient);
    }

    /// Returns this instance's placement status.
    pub fn placement_status(&self) -> PlacementStatus {
        self.data(|d| d.status)
    }

    /// Sets this instance's placement status.
    pub fn set_placement_status(&self, status: PlacementStatus) {
        self.data_mut(|d| d.status = status);
    }

    /// Connects the pin named `pin` on this instance to `net`.
    pub fn connect(&self, pin: impl AsRef<str>, net: &Net) {
        let pin = pin.as_ref();
        let mut core = self.core.borrow_mut();
        if !core.nets.contains_key(&net.name) {
            panic!("Net {} does not exist", net.name);
        }
        let inst = core.insts.get_mut(&self.name).unwrap();
        if inst.pins.insert(pin.to_string(), net.name.clone()).is_some() {
            panic!("Pin {}.{pin} is already connected", self.name);
        }
        core.nets
            .get_mut(&net.name)
            .unwrap()
            .iterms
            .push((self.name.clone(), pin.to_string()));
    }

    /// Returns the net connected to the pin named `pin`, if any.
    pub fn find_iterm(&self, pin: impl AsRef<str>) -> Option<Net> {
        let core = self.core.borrow();
        core.insts[&self.name]
            .pins
            .get(pin.as_ref())
            .map(|net| Net {
                core: self.core.clone(),
                name: net.clone(),
            })
    }

    /// Returns this instance's connected terminals as (pin, net) pairs, in
    /// connection order.
    pub fn iterms(&self) -> Vec<(String, Net)> {
        self.core.borrow().insts[&self.name]
            .pins
            .iter()
            .map(|(pin, net)| {
                (
                    pin.clone(),
                    Net {
                        core: self.core.clone(),
                        name: net.clone(),
                    },
                )
            })
            .collect()
    }

    /// Returns all distinct instances sharing a net with any of this
    /// instance's terminals, excluding this instance itself. Computed from
    /// live state on every call; never cached, since connectivity-derived
    /// facts (like which neighbors sit inside a forbidden zone) change as
    /// instances move.
    pub fn connected_insts(&self) -> Vec<Inst> {
        let mut names: IndexSet<String> = IndexSet::new();
        for (_pin, net) in self.iterms() {
            for inst in net.insts() {
                if inst.name != self.name {
                    names.insert(inst.name);
                }
            }
        }
        names
            .into_iter()
            .map(|name| Inst {
                core: self.core.clone(),
                name,
            })
            .collect()
    }
}

/// Handle to a net in a `Design`.
#[derive(Clone)]
pub struct Net {
    core: Rc<RefCell<DesignCore>>,
    name: String,
}

impl Net {
    /// Returns the name of this net.
    pub fn name(&self) -> String {
        self.name.clone()
    }

    /// Returns the instance of each terminal on this net, in connection
    /// order. An instance appears once per connected pin.
    pub fn insts(&self) -> Vec<Inst> {
        self.core.borrow().nets[&self.name]
            .iterms
            .iter()
            .map(|(inst, _pin)| Inst {
                core: self.core.clone(),
                name: inst.clone(),
            })
            .collect()
    }
}

/// Handle to a chip-boundary terminal in a `Design`.
#[derive(Clone)]
pub struct BTerm {
    core: Rc<RefCell<DesignCore>>,
    name: String,
}

impl BTerm {
    /// Returns the name of this terminal.
    pub fn name(&self) -> String {
        self.name.clone()
    }

    /// Returns the signal direction of this terminal.
    pub fn io_type(&self) -> IoType {
        self.core.borrow().bterms[&self.name].io_type
    }

    /// Returns the net this terminal connects to.
    pub fn net(&self) -> Net {
        Net {
            core: self.core.clone(),
            name: self.core.borrow().bterms[&self.name].net.clone(),
        }
    }
}

/// Handle to a placement row in a `Design`.
#[derive(Clone)]
pub struct Row {
    core: Rc<RefCell<DesignCore>>,
    index: usize,
}

impl Row {
    fn data<T>(&self, f: impl FnOnce(&RowData) -> T) -> T {
        let core = self.core.borrow();
        f(&core.rows[self.index])
    }

    /// Returns this row's origin in database units.
    pub fn origin(&self) -> (i64, i64) {
        self.data(|d| d.origin)
    }

    /// Returns this row's orientation.
    pub fn orient(&self) -> Orientation {
        self.data(|d| d.orient)
    }

    /// Returns the width of one site in this row, in database units.
    pub fn site_width(&self) -> i64 {
        self.data(|d| d.site_width)
    }

    /// Returns the number of sites in this row.
    pub fn site_count(&self) -> i64 {
        self.data(|d| d.site_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_insts_excludes_self_and_dedups() {
        let design = Design::new("top");
        design.add_master("buf", 10);
        let a = design.add_inst("a", "buf");
        let b = design.add_inst("b", "buf");
        let c = design.add_inst("c", "buf");
        let n1 = design.add_net("n1");
        let n2 = design.add_net("n2");
        a.connect("X", &n1);
        b.connect("A", &n1);
        a.connect("A", &n2);
        b.connect("X", &n2);
        c.connect("A", &n2);

        let names: Vec<String> = a.connected_insts().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn orientation_uses_def_names() {
        assert_eq!(Orientation::N.as_str(), "N");
        assert_eq!(Orientation::FS.as_str(), "FS");
        assert_eq!(Orientation::default().as_str(), "N");
    }

    #[test]
    fn rows_sorted_by_y_origin() {
        let design = Design::new("top");
        design.add_row((0, 300), Orientation::FS, 46, 100);
        design.add_row((0, 100), Orientation::N, 46, 100);
        design.add_row((0, 200), Orientation::FS, 46, 100);

        let ys: Vec<i64> = design.rows().iter().map(|r| r.origin().1).collect();
        assert_eq!(ys, vec![100, 200, 300]);
    }
}
