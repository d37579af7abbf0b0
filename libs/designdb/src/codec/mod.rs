//! JSON persistence.
//!
//! A document is a tree of JSON objects, each tagged with a `@typename`
//! (see [`Typename`]). Members are stored under `_`-prefixed keys and
//! collections under `+`-prefixed keys. Cells are written in topological
//! order, so that the master of every instance is decoded before the
//! instance.
//!
//! Relations shared between cells are written in full by their master owner
//! and as a back-reference by every other owner. Back-references may be
//! decoded before the master record; a [`DecodeSession`] tracks the
//! relations still waiting for their master and must be
//! [finished](DecodeSession::finish) once every document has been decoded.
//!
//! Routing pads, flattened nets, extension slices and markers are not
//! persisted.

use std::io;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{span, Level};

use crate::{CellId, Database, Error, LibraryId, RelationId, Result};

mod decode;
mod encode;
pub mod registry;

pub use registry::Typename;

use decode::Decoder;

/// A relation whose owners have not all been decoded yet.
///
/// `refs` counts the owners decoded so far. `expected` is the owner count
/// written in the master record, unknown until that record is decoded.
#[derive(Debug)]
pub(crate) struct Orphan {
    pub(crate) relation: RelationId,
    pub(crate) refs: usize,
    pub(crate) expected: Option<usize>,
}

/// State shared by the decode passes of a set of related documents.
#[derive(Debug, Default)]
pub struct DecodeSession {
    pub(crate) orphans: IndexMap<String, Orphan>,
    finished: bool,
}

impl DecodeSession {
    /// Creates a new session.
    pub fn new() -> Self {
        Self::default()
    }

    /// The relations still missing their master record or some of their
    /// back-references.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.orphans.keys().map(String::as_str)
    }

    /// Ends the session.
    ///
    /// Fails if a relation is still incomplete.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        if self.orphans.is_empty() {
            return Ok(());
        }
        let tags = std::mem::take(&mut self.orphans).into_keys().collect();
        Err(Error::UnresolvedReferences(tags))
    }
}

impl Drop for DecodeSession {
    fn drop(&mut self) {
        if !self.finished && !self.orphans.is_empty() {
            tracing::error!(
                unresolved = self.orphans.len(),
                "decode session dropped with unresolved relation references"
            );
        }
    }
}

impl Database {
    /// Encodes a cell as a JSON object.
    pub fn encode_cell(&self, cell: CellId) -> Result<Value> {
        self.encode_cell_value(cell)
    }

    /// Encodes a library and its cells as a JSON object.
    pub fn encode_library(&self, lib: LibraryId) -> Result<Value> {
        self.encode_library_value(lib)
    }

    /// Decodes a cell object into this database.
    ///
    /// The cell's library must exist. Relation references are resolved
    /// against `session`.
    pub fn decode_cell(&mut self, doc: &Value, session: &mut DecodeSession) -> Result<CellId> {
        let span = span!(Level::INFO, "decode cell");
        let _guard = span.enter();
        let mut db = self.update_session();
        let mut decoder = Decoder {
            db: &mut db,
            session,
        };
        decoder.expect_cell(doc)
    }

    /// Decodes a library object into this database.
    ///
    /// Missing libraries along the library's hierarchical name are created.
    /// Every relation reference must resolve within the document; use
    /// [`Database::decode_library_in`] for designs whose relations span
    /// several library documents.
    pub fn decode_library(&mut self, doc: &Value) -> Result<LibraryId> {
        let mut session = DecodeSession::new();
        let lib = self.decode_library_in(doc, &mut session)?;
        session.finish()?;
        Ok(lib)
    }

    /// Decodes a library object, resolving relation references against
    /// `session`.
    ///
    /// References to cells of libraries decoded later in the same session
    /// stay pending until [`DecodeSession::finish`].
    pub fn decode_library_in(
        &mut self,
        doc: &Value,
        session: &mut DecodeSession,
    ) -> Result<LibraryId> {
        let span = span!(Level::INFO, "decode library");
        let _guard = span.enter();
        let mut db = self.update_session();
        let mut decoder = Decoder {
            db: &mut db,
            session,
        };
        decoder.expect_library(doc)
    }

    /// Writes a library document.
    pub fn write_library(&self, lib: LibraryId, writer: impl io::Write) -> Result<()> {
        let doc = self.encode_library(lib)?;
        serde_json::to_writer_pretty(writer, &doc)?;
        Ok(())
    }

    /// Reads a library document.
    pub fn read_library(&mut self, reader: impl io::Read) -> Result<LibraryId> {
        let doc: Value = serde_json::from_reader(reader)?;
        self.decode_library(&doc)
    }
}

#[cfg(test)]
mod tests {
    use geometry::prelude::*;
    use serde_json::json;
    use test_log::test;

    use super::*;
    use crate::diagnostics::{Cause, Diagnostic, Severity};
    use crate::instance::PlacementStatus;
    use crate::net::{ComponentKind, NetType};
    use crate::relation::RelationKind;

    fn inverter(db: &mut Database, lib: LibraryId) -> CellId {
        let inv = db.create_cell(lib, "inv").unwrap();
        db.set_abutment_box(inv, Rect::from_sides(0, 0, 10, 40))
            .unwrap();
        let a = db.create_net(inv, "a").unwrap();
        db.set_net_external(a, true).unwrap();
        db.create_component(
            a,
            "metal1",
            ComponentKind::Pin {
                rect: Rect::from_sides(0, 10, 2, 12),
            },
        )
        .unwrap();
        let vdd = db.create_net(inv, "vdd").unwrap();
        db.set_net_type(vdd, NetType::Power).unwrap();
        db.set_net_global(vdd, true).unwrap();
        db.create_component(
            vdd,
            "metal1",
            ComponentKind::Horizontal {
                y: 38,
                width: 4,
                dx_source: 0,
                dx_target: 10,
            },
        )
        .unwrap();
        db.set_annotation(inv, "author", "lab").unwrap();
        inv
    }

    #[test]
    fn cell_round_trip() {
        let mut db = Database::new();
        let lib = db.create_library(None, "work").unwrap();
        let inv = inverter(&mut db, lib);
        let doc = db.encode_cell(inv).unwrap();

        let mut other = Database::new();
        other.create_library(None, "work").unwrap();
        let mut session = DecodeSession::new();
        let decoded = other.decode_cell(&doc, &mut session).unwrap();
        session.finish().unwrap();

        let c = other.cell(decoded).unwrap();
        assert_eq!(c.name(), "inv");
        assert_eq!(c.abutment_box(), Rect::from_sides(0, 0, 10, 40));
        let vdd = c.net_named("vdd").unwrap();
        assert_eq!(other.net(vdd).unwrap().net_type(), NetType::Power);
        assert_eq!(other.encode_cell(decoded).unwrap(), doc);
    }

    #[test]
    fn library_round_trip_with_relations() {
        let mut db = Database::new();
        let lib = db.create_library(None, "work").unwrap();
        let inv = inverter(&mut db, lib);
        let top = db.create_cell(lib, "top").unwrap();
        db.set_abutment_box(top, Rect::from_sides(0, 0, 100, 100))
            .unwrap();
        let a = db.create_net(top, "a").unwrap();
        let i0 = db
            .create_instance(
                top,
                "i0",
                inv,
                Transformation::translate(20, 0),
                PlacementStatus::Placed,
            )
            .unwrap();
        let inv_a = db.cell(inv).unwrap().net_named("a").unwrap();
        db.connect_plug(i0, inv_a, Some(a)).unwrap();

        let clone = db.get_clone(inv).unwrap();
        let sub = db.create_cell(lib, "sub").unwrap();
        db.create_instance(
            top,
            "s0",
            sub,
            Transformation::identity(),
            PlacementStatus::Placed,
        )
        .unwrap();
        assert!(db.slave_abutment_box(sub, top).unwrap());

        let mut buf = Vec::new();
        db.write_library(lib, &mut buf).unwrap();

        let mut other = Database::new();
        let decoded = other.read_library(buf.as_slice()).unwrap();
        assert_eq!(other.library_hierarchical_name(decoded).unwrap(), "work");
        assert_eq!(
            other.encode_library(decoded).unwrap(),
            db.encode_library(lib).unwrap()
        );

        let cell = |name: &str| other.cell_by_hierarchical_name(name).unwrap();
        let (inv2, clone2, top2, sub2) = (
            cell("work.inv"),
            cell("work.inv_u01"),
            cell("work.top"),
            cell("work.sub"),
        );
        assert_eq!(other.clones(inv2).unwrap(), vec![clone2]);
        assert_eq!(other.clone_master(clone2).unwrap(), inv2);
        assert_eq!(other.slaved_cells(top2).unwrap(), vec![sub2]);
        assert!(other.cell(sub2).unwrap().flags.slaved_ab);
        assert_eq!(
            other.cell(sub2).unwrap().abutment_box(),
            Rect::from_sides(0, 0, 100, 100)
        );

        let i0 = other.cell(top2).unwrap().instance_named("i0").unwrap();
        let a2 = other.cell(top2).unwrap().net_named("a").unwrap();
        let inv_a2 = other.cell(inv2).unwrap().net_named("a").unwrap();
        assert_eq!(other.instance(i0).unwrap().plug_net(inv_a2), Some(a2));

        // The duplicate counter survives, so the next clone gets a fresh name.
        let next = other.get_clone(inv2).unwrap();
        assert_eq!(other.cell(next).unwrap().name(), "inv_u02");
        assert_eq!(db.cell(clone).unwrap().name(), "inv_u01");
    }

    #[test]
    fn back_references_may_precede_the_master() {
        let mut db = Database::new();
        let lib = db.create_library(None, "work").unwrap();
        let top = db.create_cell(lib, "top").unwrap();
        let sub = db.create_cell(lib, "sub").unwrap();
        db.set_abutment_box(top, Rect::from_sides(0, 0, 20, 20))
            .unwrap();
        assert!(db.slave_abutment_box(sub, top).unwrap());
        let sub_doc = db.encode_cell(sub).unwrap();
        let top_doc = db.encode_cell(top).unwrap();

        let mut other = Database::new();
        other.create_library(None, "work").unwrap();
        let mut session = DecodeSession::new();
        let sub2 = other.decode_cell(&sub_doc, &mut session).unwrap();
        assert_eq!(session.unresolved().count(), 1);
        let top2 = other.decode_cell(&top_doc, &mut session).unwrap();
        session.finish().unwrap();

        let rel = other.relation(sub2, RelationKind::Slaveds).unwrap().unwrap();
        assert_eq!(other.relation_record(rel).unwrap().master_owner(), top2);
        assert_eq!(other.slaved_cells(top2).unwrap(), vec![sub2]);
    }

    #[test]
    fn relation_records_count_every_owner() {
        let mut db = Database::new();
        let lib = db.create_library(None, "work").unwrap();
        let inv = inverter(&mut db, lib);
        db.get_clone(inv).unwrap();
        let mut doc = db.encode_library(lib).unwrap();

        let master = doc["+cellList"][0]["+propertySet"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["@typename"] == "Cell::UniquifyRelation")
            .unwrap()
            .clone();
        assert_eq!(master["_refcount"], 2);

        // Clones first: the master record arrives after its back-reference.
        doc["+cellList"].as_array_mut().unwrap().reverse();
        let mut other = Database::new();
        other.decode_library(&doc).unwrap();
        let inv2 = other.cell_by_hierarchical_name("work.inv").unwrap();
        let clone2 = other.cell_by_hierarchical_name("work.inv_u01").unwrap();
        assert_eq!(other.clones(inv2).unwrap(), vec![clone2]);
    }

    #[test]
    fn relations_may_span_libraries() {
        let mut db = Database::new();
        let a = db.create_library(None, "a").unwrap();
        let b = db.create_library(None, "b").unwrap();
        let top = db.create_cell(a, "top").unwrap();
        let sub = db.create_cell(b, "sub").unwrap();
        db.set_abutment_box(top, Rect::from_sides(0, 0, 20, 20))
            .unwrap();
        assert!(db.slave_abutment_box(sub, top).unwrap());
        let docs = [db.encode_library(a).unwrap(), db.encode_library(b).unwrap()];

        for order in [[0, 1], [1, 0]] {
            let mut other = Database::new();
            let mut session = DecodeSession::new();
            for i in order {
                other.decode_library_in(&docs[i], &mut session).unwrap();
            }
            session.finish().unwrap();
            assert!(other.issues().is_empty());

            let top2 = other.cell_by_hierarchical_name("a.top").unwrap();
            let sub2 = other.cell_by_hierarchical_name("b.sub").unwrap();
            assert_eq!(other.slaved_cells(top2).unwrap(), vec![sub2]);
            assert!(other.cell(sub2).unwrap().is_abutment_box_slaved());
            assert_eq!(
                other.cell(sub2).unwrap().abutment_box(),
                Rect::from_sides(0, 0, 20, 20)
            );
        }
    }

    #[test]
    fn collapsed_boxes_round_trip() {
        let mut db = Database::new();
        let lib = db.create_library(None, "work").unwrap();
        let cell = db.create_cell(lib, "c").unwrap();
        db.set_abutment_box(cell, Rect::from_sides(0, 0, 10, 10))
            .unwrap();
        db.set_abutment_box(cell, Rect::from_sides(0, 0, 10, 10).inflated(-20))
            .unwrap();
        let doc = db.encode_cell(cell).unwrap();

        let mut other = Database::new();
        other.create_library(None, "work").unwrap();
        let mut session = DecodeSession::new();
        let decoded = other.decode_cell(&doc, &mut session).unwrap();
        session.finish().unwrap();
        assert!(other.cell(decoded).unwrap().abutment_box().is_empty());
        assert_eq!(other.encode_cell(decoded).unwrap(), doc);
    }

    #[test]
    fn unknown_typenames_are_format_errors() {
        let mut db = Database::new();
        let err = db
            .decode_library(&json!({ "@typename": "Segment" }))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTypename(ref name) if name == "Segment"));
        assert!(err.is_format());
    }

    #[test]
    fn unmatched_back_references_fail_the_session() {
        let mut db = Database::new();
        db.create_library(None, "work").unwrap();
        let doc = json!({
            "@typename": "Cell",
            "_library": "work",
            "_name": "clone",
            "_abutmentBox": { "@typename": "Box", "_xMin": 0, "_yMin": 0, "_xMax": 5, "_yMax": 5 },
            "_terminalNetlist": false,
            "_pad": false,
            "_placed": true,
            "+netMap": [],
            "+instanceMap": [],
            "+propertySet": [
                { "@typename": "&Cell::UniquifyRelation", "_masterOwner": "work.missing" }
            ],
        });
        let mut session = DecodeSession::new();
        db.decode_cell(&doc, &mut session).unwrap();
        let err = session.finish().unwrap_err();
        assert!(matches!(err, Error::UnresolvedReferences(ref tags) if tags.len() == 1));
    }

    #[test]
    fn non_cell_master_owners_are_reported() {
        let mut db = Database::new();
        db.create_library(None, "work").unwrap();
        let doc = json!({
            "@typename": "Cell",
            "_library": "work",
            "_name": "c",
            "_abutmentBox": { "@typename": "Box", "_xMin": 0, "_yMin": 0, "_xMax": 0, "_yMax": 0 },
            "_terminalNetlist": false,
            "_pad": false,
            "_placed": false,
            "+netMap": [],
            "+instanceMap": [],
            "+propertySet": [
                { "@typename": "&Cell::SlavedsRelation", "_masterOwner": "nowhere" }
            ],
        });
        let mut session = DecodeSession::new();
        let cell = db.decode_cell(&doc, &mut session).unwrap();
        session.finish().unwrap();
        assert_eq!(db.relation(cell, RelationKind::Slaveds).unwrap(), None);
        assert!(db.issues().iter().any(|issue| issue.severity() == Severity::Error
            && matches!(issue.cause(), Cause::MasterOwnerNotCell { .. })));
    }

    #[test]
    fn ill_formed_boxes_decode_empty() {
        let mut db = Database::new();
        db.create_library(None, "work").unwrap();
        let doc = json!({
            "@typename": "Cell",
            "_library": "work",
            "_name": "c",
            "_abutmentBox": { "@typename": "Box", "_xMin": 10, "_yMin": 0, "_xMax": 0, "_yMax": 5 },
            "_terminalNetlist": false,
            "_pad": false,
            "_placed": false,
            "+netMap": [],
            "+instanceMap": [],
            "+propertySet": [],
        });
        let mut session = DecodeSession::new();
        let cell = db.decode_cell(&doc, &mut session).unwrap();
        session.finish().unwrap();
        assert!(db.cell(cell).unwrap().abutment_box().is_empty());
    }

    #[test]
    fn missing_fields_are_malformed() {
        let mut db = Database::new();
        db.create_library(None, "work").unwrap();
        let doc = json!({ "@typename": "Cell", "_library": "work" });
        let mut session = DecodeSession::new();
        let err = db.decode_cell(&doc, &mut session).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedField {
                typename: "Cell",
                field: "_name"
            }
        ));
    }
}
