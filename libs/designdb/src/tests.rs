use test_log::test;

use crate::diagnostics::{Cause, Diagnostic, Severity};
use crate::prelude::*;

fn setup() -> (Database, LibraryId) {
    let mut db = Database::new();
    let lib = db.create_library(None, "work").unwrap();
    (db, lib)
}

#[test]
fn duplicate_cells_are_rejected() {
    let (mut db, lib) = setup();
    let first = db.create_cell(lib, "nand2").unwrap();
    let err = db.create_cell(lib, "nand2").unwrap_err();
    assert!(matches!(err, Error::DuplicateName { kind: "cell", .. }));
    assert!(err.is_structural());

    assert_eq!(db.library(lib).unwrap().cell_named("nand2"), Some(first));
    assert_eq!(db.cell_by_hierarchical_name("work.nand2"), Some(first));
    assert_eq!(db.library(lib).unwrap().cells().count(), 1);
}

#[test]
fn bounding_box_contains_abutment_box() {
    let (mut db, lib) = setup();
    let cell = db.create_cell(lib, "c").unwrap();
    let net = db.create_net(cell, "n").unwrap();
    db.create_component(
        net,
        "metal1",
        ComponentKind::Pad {
            rect: Rect::from_sides(-10, -10, -5, -5),
        },
    )
    .unwrap();

    for ab in [
        Rect::from_sides(0, 0, 10, 10),
        Rect::from_sides(-20, 5, 40, 6),
        Rect::from_sides(2, 2, 3, 3),
    ] {
        db.set_abutment_box(cell, ab).unwrap();
        let bbox = db.bounding_box(cell).unwrap();
        assert!(bbox.contains(&ab));
        assert!(bbox.contains(&Rect::from_sides(-10, -10, -5, -5)));
    }
}

#[test]
fn master_changes_reach_the_top_bounding_box() {
    let (mut db, lib) = setup();
    let top = db.create_cell(lib, "top").unwrap();
    let mid = db.create_cell(lib, "mid").unwrap();
    let leaf = db.create_cell(lib, "leaf").unwrap();
    db.set_abutment_box(leaf, Rect::from_sides(0, 0, 10, 10))
        .unwrap();
    db.create_instance(
        mid,
        "l0",
        leaf,
        Transformation::translate(100, 0),
        PlacementStatus::Placed,
    )
    .unwrap();
    db.create_instance(
        top,
        "m0",
        mid,
        Transformation::translate(0, 50),
        PlacementStatus::Placed,
    )
    .unwrap();
    assert_eq!(
        db.bounding_box(top).unwrap(),
        Rect::from_sides(100, 50, 110, 60)
    );

    db.set_abutment_box(leaf, Rect::from_sides(0, 0, 20, 20))
        .unwrap();
    assert_eq!(
        db.bounding_box(top).unwrap(),
        Rect::from_sides(100, 50, 120, 70)
    );

    db.set_abutment_box(leaf, Rect::from_sides(0, 0, 5, 5)).unwrap();
    assert_eq!(
        db.bounding_box(top).unwrap(),
        Rect::from_sides(100, 50, 105, 55)
    );
    assert_eq!(
        db.bounding_box(mid).unwrap(),
        Rect::from_sides(100, 0, 105, 5)
    );
}

#[test]
fn content_added_to_an_empty_master_reaches_its_users() {
    let (mut db, lib) = setup();
    let top = db.create_cell(lib, "top").unwrap();
    let leaf = db.create_cell(lib, "leaf").unwrap();
    db.set_abutment_box(top, Rect::from_sides(0, 0, 10, 10))
        .unwrap();
    db.create_instance(
        top,
        "l0",
        leaf,
        Transformation::translate(100, 0),
        PlacementStatus::Placed,
    )
    .unwrap();
    assert!(db.bounding_box(leaf).unwrap().is_empty());
    assert_eq!(
        db.bounding_box(top).unwrap(),
        Rect::from_sides(0, 0, 10, 10)
    );

    db.set_abutment_box(leaf, Rect::from_sides(0, 0, 5, 5)).unwrap();
    assert_eq!(
        db.bounding_box(top).unwrap(),
        Rect::from_sides(0, 0, 105, 5)
    );
}

#[test]
fn leaf_edits_leave_unrelated_caches_alone() {
    let (mut db, lib) = setup();
    let top = db.create_cell(lib, "top").unwrap();
    let other = db.create_cell(lib, "other").unwrap();
    let leaf = db.create_cell(lib, "leaf").unwrap();
    let spare = db.create_cell(lib, "spare").unwrap();
    db.set_abutment_box(leaf, Rect::from_sides(0, 0, 10, 10))
        .unwrap();
    db.set_abutment_box(spare, Rect::from_sides(0, 0, 5, 5))
        .unwrap();
    db.set_abutment_box(top, Rect::from_sides(0, 0, 100, 100))
        .unwrap();
    db.set_abutment_box(other, Rect::from_sides(0, 0, 50, 50))
        .unwrap();
    let l0 = db
        .create_instance(
            top,
            "l0",
            leaf,
            Transformation::translate(10, 10),
            PlacementStatus::Placed,
        )
        .unwrap();
    db.create_instance(
        other,
        "s0",
        spare,
        Transformation::identity(),
        PlacementStatus::Placed,
    )
    .unwrap();
    assert_eq!(
        db.bounding_box(top).unwrap(),
        Rect::from_sides(0, 0, 100, 100)
    );
    assert_eq!(
        db.bounding_box(other).unwrap(),
        Rect::from_sides(0, 0, 50, 50)
    );

    db.set_abutment_box(leaf, Rect::from_sides(0, 0, 200, 30))
        .unwrap();
    assert_eq!(
        db.bounding_box(other).unwrap(),
        Rect::from_sides(0, 0, 50, 50)
    );
    assert_eq!(
        db.bounding_box(top).unwrap(),
        Rect::from_sides(0, 0, 210, 100)
    );

    // Shrinking back recomputes the user from its leaves.
    db.set_abutment_box(leaf, Rect::from_sides(0, 0, 30, 30))
        .unwrap();
    assert_eq!(
        db.bounding_box(top).unwrap(),
        Rect::from_sides(0, 0, 100, 100)
    );
    let leaves = db
        .leaves_under(top, Rect::from_sides(10, 10, 40, 40))
        .unwrap();
    assert!(leaves.contains(&(Leaf::Instance(l0), Rect::from_sides(10, 10, 40, 40))));
}

#[test]
fn slaving_translates_placed_instances() {
    let (mut db, lib) = setup();
    let master = db.create_cell(lib, "master").unwrap();
    let slave = db.create_cell(lib, "slave").unwrap();
    let leaf = db.create_cell(lib, "leaf").unwrap();
    db.set_abutment_box(leaf, Rect::from_sides(0, 0, 2, 2)).unwrap();
    db.set_abutment_box(master, Rect::from_sides(5, 3, 15, 13))
        .unwrap();
    db.set_abutment_box(slave, Rect::from_sides(0, 0, 10, 10))
        .unwrap();
    let placed = db
        .create_instance(
            slave,
            "p",
            leaf,
            Transformation::translate(1, 1),
            PlacementStatus::Placed,
        )
        .unwrap();

    assert!(db.slave_abutment_box(slave, master).unwrap());
    assert_eq!(
        db.instance(placed).unwrap().transformation().offset,
        Point::new(6, 4)
    );
    assert_eq!(
        db.cell(slave).unwrap().abutment_box(),
        Rect::from_sides(5, 3, 15, 13)
    );
    assert!(db.cell(slave).unwrap().is_abutment_box_slaved());
    assert_eq!(db.slaved_cells(master).unwrap(), vec![slave]);

    // The slave follows its master from now on.
    db.set_abutment_box(master, Rect::from_sides(0, 0, 30, 30))
        .unwrap();
    assert_eq!(
        db.cell(slave).unwrap().abutment_box(),
        Rect::from_sides(0, 0, 30, 30)
    );
    assert!(!db.issues().has_error());

    // Editing the slave directly is refused.
    db.set_abutment_box(slave, Rect::from_sides(0, 0, 1, 1)).unwrap();
    assert_eq!(
        db.cell(slave).unwrap().abutment_box(),
        Rect::from_sides(0, 0, 30, 30)
    );
    assert!(db
        .issues()
        .iter()
        .any(|issue| matches!(issue.cause(), Cause::AbutmentBoxSlaved { .. })));
}

#[test]
fn slaving_rejects_cycles_and_shared_cells() {
    let (mut db, lib) = setup();
    let a = db.create_cell(lib, "a").unwrap();
    let b = db.create_cell(lib, "b").unwrap();
    let shared = db.create_cell(lib, "shared").unwrap();
    for name in ["s0", "s1"] {
        db.create_instance(
            a,
            name,
            shared,
            Transformation::identity(),
            PlacementStatus::Placed,
        )
        .unwrap();
    }

    assert!(db.slave_abutment_box(b, a).unwrap());
    assert!(!db.slave_abutment_box(a, b).unwrap());
    assert!(!db.slave_abutment_box(a, a).unwrap());
    assert!(!db.slave_abutment_box(shared, a).unwrap());

    let causes: Vec<_> = db.take_issues().into_iter().map(|i| i.cause().clone()).collect();
    assert!(causes
        .iter()
        .any(|c| matches!(c, Cause::SlavingCycle { .. } | Cause::SlavingMaster { .. })));
    assert!(causes.iter().any(|c| matches!(c, Cause::NotUnique { slaves: 2, .. })));
    assert!(db.slaved_cells(b).unwrap().is_empty());
}

#[test]
fn shrinking_to_zero_collapses_to_the_center() {
    let (mut db, lib) = setup();
    let cell = db.create_cell(lib, "c").unwrap();
    db.set_abutment_box(cell, Rect::from_sides(0, 0, 10, 20))
        .unwrap();
    db.shrink_abutment_box(cell, 0.0).unwrap();
    let ab = db.cell(cell).unwrap().abutment_box();
    assert!(ab.is_ponctual());
    assert_eq!(ab.center(), Point::new(5, 10));
}

/// `top` holds `m0: mid`; `mid` holds `l0, l1: leaf`.
///
/// `l0.a` reaches `top.n`; `l1.a` stops at `mid.local`.
fn flatten_design() -> (Database, CellId) {
    let (mut db, lib) = setup();
    let top = db.create_cell(lib, "top").unwrap();
    let mid = db.create_cell(lib, "mid").unwrap();
    let leaf = db.create_cell(lib, "leaf").unwrap();

    let a = db.create_net(leaf, "a").unwrap();
    db.set_net_external(a, true).unwrap();
    db.create_component(
        a,
        "metal1",
        ComponentKind::Pad {
            rect: Rect::from_sides(0, 0, 4, 4),
        },
    )
    .unwrap();

    let io = db.create_net(mid, "io").unwrap();
    db.set_net_external(io, true).unwrap();
    let local = db.create_net(mid, "local").unwrap();
    for (name, x, net) in [("l0", 10, io), ("l1", 20, local)] {
        let inst = db
            .create_instance(
                mid,
                name,
                leaf,
                Transformation::translate(x, 0),
                PlacementStatus::Placed,
            )
            .unwrap();
        db.connect_plug(inst, a, Some(net)).unwrap();
    }

    let n = db.create_net(top, "n").unwrap();
    let m0 = db
        .create_instance(top, "m0", mid, Transformation::identity(), PlacementStatus::Placed)
        .unwrap();
    db.connect_plug(m0, io, Some(n)).unwrap();
    (db, top)
}

#[test]
fn flattening_twice_skips_duplicates() {
    let (mut db, top) = flatten_design();
    let opts = FlattenOpts::default();

    let first = db.flatten_nets(top, None, &opts).unwrap();
    assert_eq!(first.deep_nets.len(), 1);
    assert_eq!(first.skipped_duplicates, 0);
    assert!(!db.issues().has_warning());
    let nets = db.cell(top).unwrap().nets().count();

    let second = db.flatten_nets(top, None, &opts).unwrap();
    assert!(second.deep_nets.is_empty());
    assert_eq!(second.skipped_duplicates, 1);
    assert_eq!(second.skipped_flattened, 1);
    assert_eq!(second.routing_pads, 0);
    assert_eq!(db.cell(top).unwrap().nets().count(), nets);

    let warnings: Vec<_> = db
        .issues()
        .iter()
        .filter(|issue| issue.severity() == Severity::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(
        warnings[0].cause(),
        Cause::DuplicateFlattenNet { net, .. } if net == "m0.local"
    ));
}

#[test]
fn uniquify_is_idempotent() {
    let (mut db, lib) = setup();
    let top = db.create_cell(lib, "top").unwrap();
    let mid = db.create_cell(lib, "mid").unwrap();
    let leaf = db.create_cell(lib, "leaf").unwrap();
    db.create_instance(mid, "l0", leaf, Transformation::identity(), PlacementStatus::Unplaced)
        .unwrap();
    for (name, x) in [("m0", 0), ("m1", 10), ("m2", 20)] {
        db.create_instance(
            top,
            name,
            mid,
            Transformation::translate(x, 0),
            PlacementStatus::Placed,
        )
        .unwrap();
    }

    assert_eq!(db.uniquify(top, 0).unwrap(), 2);
    let cells = db.library(lib).unwrap().cells().count();
    assert_eq!(db.uniquify(top, 0).unwrap(), 0);
    assert_eq!(db.library(lib).unwrap().cells().count(), cells);

    let masters: Vec<_> = db
        .cell(top)
        .unwrap()
        .instances()
        .map(|inst| db.instance(inst).unwrap().master())
        .collect();
    assert_eq!(masters.len(), 3);
    for master in &masters {
        assert!(db.cell(*master).unwrap().is_unique());
    }
    assert_eq!(db.clones(mid).unwrap().len(), 2);
}

#[test]
fn uniquify_discards_deep_nets() {
    let (mut db, top) = flatten_design();
    db.flatten_nets(top, None, &FlattenOpts::default()).unwrap();
    assert!(db.cell(top).unwrap().net_named("m0.local").is_some());

    db.uniquify(top, 0).unwrap();
    assert!(db.cell(top).unwrap().net_named("m0.local").is_none());
    assert!(!db.cell(top).unwrap().is_flattened());
}

#[test]
fn configuration_drives_flattening() {
    let config = DatabaseConfig::from_toml(
        r#"
        [flatten]
        excluded = ["m0.local"]
        "#,
    )
    .unwrap();
    let (db, top) = flatten_design();
    let mut db = {
        let mut fresh = Database::with_config(config);
        let doc = db.encode_library(db.cell(top).unwrap().library()).unwrap();
        fresh.decode_library(&doc).unwrap();
        fresh
    };
    let top = db.cell_by_hierarchical_name("work.top").unwrap();
    let opts = db.config().flatten_opts();
    let report = db.flatten_nets(top, None, &opts).unwrap();
    assert!(report.deep_nets.is_empty());
    assert_eq!(report.routing_pads, 1);
}
