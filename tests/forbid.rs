// SPDX-License-Identifier: Apache-2.0

use placefix::{Design, Inst, Net, RelocationPolicy, ZoneRect, relocate, relocate_round};

const LIB: &str = "sky130_fd_sc_hd";

fn policy(zones: Vec<ZoneRect>) -> RelocationPolicy {
    RelocationPolicy {
        lib_prefix: LIB.to_string(),
        whitelist: vec![
            "conb".to_string(),
            "decap".to_string(),
            "tapvpwrvgnd".to_string(),
        ],
        zones,
        dbu_per_unit: 1000.0,
    }
}

fn test_design() -> Design {
    let design = Design::new("top");
    design.add_master(&format!("{LIB}__buf_1"), 1150);
    design.add_master(&format!("{LIB}__decap_4"), 1840);
    design.add_master("sram_macro", 50_000);
    design
}

fn buf(design: &Design, name: &str, at: (i64, i64)) -> Inst {
    let inst = design.add_inst(name, format!("{LIB}__buf_1"));
    inst.set_location(at.0, at.1);
    inst
}

fn link(a: &Inst, b: &Inst, net: &Net) {
    a.connect("X", net);
    b.connect("A", net);
}

#[test]
fn instances_outside_zones_are_never_moved() {
    let _ = env_logger::builder().is_test(true).try_init();
    let design = test_design();
    let zones = vec![ZoneRect::new(0.0, 0.0, 200.0, 200.0)];

    let a = buf(&design, "a", (300_000, 300_000));
    let b = buf(&design, "b", (400_000, 50_000));
    let net = design.add_net("n1");
    link(&a, &b, &net);

    let report = relocate(&design, &policy(zones));
    assert_eq!(report.moved, 0);
    assert_eq!(a.location(), (300_000, 300_000));
    assert_eq!(b.location(), (400_000, 50_000));
}

#[test]
fn offender_moves_to_truncated_mean_of_anchors() {
    let design = test_design();
    let zones = vec![ZoneRect::new(0.0, 0.0, 200.0, 200.0)];

    let bad = buf(&design, "bad", (100_000, 100_000));
    let a1 = buf(&design, "a1", (300_000, 20_000));
    let a2 = buf(&design, "a2", (250_001, 90_000));
    let n1 = design.add_net("n1");
    let n2 = design.add_net("n2");
    link(&bad, &a1, &n1);
    link(&a2, &bad, &n2);

    let round = relocate_round(&design, &policy(zones));
    assert_eq!(round.moved, 1);
    assert_eq!(round.unresolved, 0);
    // (300_000 + 250_001) / 2 truncates to 275_000.
    assert_eq!(bad.location(), (275_000, 55_000));
}

#[test]
fn relocation_converges_once_offender_escapes() {
    let design = test_design();
    let zones = vec![ZoneRect::new(0.0, 0.0, 200.0, 200.0)];

    let bad = buf(&design, "bad", (100_000, 100_000));
    let anchor = buf(&design, "anchor", (300_000, 300_000));
    let net = design.add_net("n1");
    link(&bad, &anchor, &net);

    let report = relocate(&design, &policy(zones));
    assert_eq!(report.moved, 1);
    assert_eq!(report.rounds, 2);
    assert_eq!(bad.location(), (300_000, 300_000));
}

#[test]
fn relocation_stops_at_round_cap_when_mean_stays_forbidden() {
    // Anchors are outside every zone, but their mean lands inside a second
    // zone, so each round moves the offender to the same forbidden spot.
    let design = test_design();
    let zones = vec![
        ZoneRect::new(0.0, 0.0, 100.0, 400.0),
        ZoneRect::new(150.0, 200.0, 250.0, 400.0),
    ];

    let bad = buf(&design, "bad", (50_000, 300_000));
    let a1 = buf(&design, "a1", (120_000, 300_000));
    let a2 = buf(&design, "a2", (280_000, 300_000));
    let n1 = design.add_net("n1");
    let n2 = design.add_net("n2");
    link(&bad, &a1, &n1);
    link(&a2, &bad, &n2);

    let report = relocate(&design, &policy(zones));
    assert_eq!(report.rounds, 5);
    assert_eq!(report.moved, 5);
    assert_eq!(bad.location(), (200_000, 300_000));
}

#[test]
fn whitelisted_families_are_exempt() {
    let design = test_design();
    let zones = vec![ZoneRect::new(0.0, 0.0, 200.0, 200.0)];

    let decap = design.add_inst("d0", format!("{LIB}__decap_4"));
    decap.set_location(100_000, 100_000);
    let anchor = buf(&design, "anchor", (300_000, 300_000));
    let net = design.add_net("n1");
    link(&decap, &anchor, &net);

    let report = relocate(&design, &policy(zones));
    assert_eq!(report.moved, 0);
    assert_eq!(decap.location(), (100_000, 100_000));
}

#[test]
fn non_library_masters_are_exempt() {
    let design = test_design();
    let zones = vec![ZoneRect::new(0.0, 0.0, 200.0, 200.0)];

    let sram = design.add_inst("sram0", "sram_macro");
    sram.set_location(100_000, 100_000);
    let anchor = buf(&design, "anchor", (300_000, 300_000));
    let net = design.add_net("n1");
    link(&sram, &anchor, &net);

    let report = relocate(&design, &policy(zones));
    assert_eq!(report.moved, 0);
    assert_eq!(sram.location(), (100_000, 100_000));
}

#[test]
fn offender_without_anchors_is_reported_unresolved() {
    let _ = env_logger::builder().is_test(true).try_init();
    let design = test_design();
    let zones = vec![ZoneRect::new(0.0, 0.0, 200.0, 200.0)];

    let bad = buf(&design, "bad", (100_000, 100_000));
    let also_bad = buf(&design, "also_bad", (150_000, 150_000));
    let net = design.add_net("n1");
    link(&bad, &also_bad, &net);

    let report = relocate(&design, &policy(zones));
    assert_eq!(report.moved, 0);
    assert_eq!(report.unresolved, 2);
    assert_eq!(report.rounds, 1);
    assert_eq!(bad.location(), (100_000, 100_000));
}

#[test]
fn zone_bounds_are_inclusive() {
    let design = test_design();
    let zones = vec![ZoneRect::new(0.0, 0.0, 200.0, 200.0)];

    let edge = buf(&design, "edge", (200_000, 200_000));
    let anchor = buf(&design, "anchor", (300_000, 300_000));
    let net = design.add_net("n1");
    link(&edge, &anchor, &net);

    let round = relocate_round(&design, &policy(zones));
    assert_eq!(round.moved, 1);
    assert_eq!(edge.location(), (300_000, 300_000));
}
