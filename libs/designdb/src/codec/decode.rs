//! JSON decoding.

use geometry::prelude::*;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::Level;
use uniquify::Duplicates;

use super::registry::{self, Typename};
use super::{DecodeSession, Orphan};
use crate::diagnostics::{Cause, Severity};
use crate::instance::PlacementStatus;
use crate::net::{ComponentKind, Direction, NetType};
use crate::relation::RelationKind;
use crate::{
    CellId, ComponentId, Database, Error, InstanceId, LibraryId, NetId, Result,
};

pub(crate) type Object = Map<String, Value>;

pub(crate) type DecodeFn = fn(&mut Decoder<'_>, &Object, Owner) -> Result<Decoded>;

/// The object enclosing the one being decoded.
#[derive(Debug, Copy, Clone)]
pub(crate) enum Owner {
    None,
    Cell(CellId),
    Net(NetId),
    Instance(InstanceId),
}

/// The product of a decoder.
#[derive(Debug, Copy, Clone)]
pub(crate) enum Decoded {
    Box(Rect),
    Transformation(Transformation),
    Library(LibraryId),
    Cell(CellId),
    Net(NetId),
    Component(ComponentId),
    Instance(InstanceId),
    /// Plugs and properties are applied to their owner.
    Applied,
}

pub(crate) struct Decoder<'a> {
    pub(crate) db: &'a mut Database,
    pub(crate) session: &'a mut DecodeSession,
}

/// Typed access to the fields of one object.
struct Fields<'v> {
    obj: &'v Object,
    typename: &'static str,
}

impl<'v> Fields<'v> {
    fn new(obj: &'v Object, typename: Typename) -> Self {
        Self {
            obj,
            typename: typename.as_str(),
        }
    }

    fn malformed(&self, field: &'static str) -> Error {
        Error::MalformedField {
            typename: self.typename,
            field,
        }
    }

    fn get(&self, field: &'static str) -> Result<&'v Value> {
        self.obj.get(field).ok_or_else(|| self.malformed(field))
    }

    fn int(&self, field: &'static str) -> Result<i64> {
        self.get(field)?.as_i64().ok_or_else(|| self.malformed(field))
    }

    fn count(&self, field: &'static str) -> Result<u64> {
        self.get(field)?.as_u64().ok_or_else(|| self.malformed(field))
    }

    fn bool(&self, field: &'static str) -> Result<bool> {
        self.get(field)?.as_bool().ok_or_else(|| self.malformed(field))
    }

    fn str(&self, field: &'static str) -> Result<&'v str> {
        self.get(field)?.as_str().ok_or_else(|| self.malformed(field))
    }

    fn opt_str(&self, field: &'static str) -> Result<Option<&'v str>> {
        match self.get(field)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            _ => Err(self.malformed(field)),
        }
    }

    fn array(&self, field: &'static str) -> Result<&'v [Value]> {
        self.get(field)?
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.malformed(field))
    }

    fn parse<T: DeserializeOwned>(&self, field: &'static str) -> Result<T> {
        T::deserialize(self.get(field)?).map_err(|_| self.malformed(field))
    }
}

fn unexpected(expected: Typename, found: Typename) -> Error {
    Error::UnexpectedTypename {
        expected: expected.as_str(),
        found: found.as_str().into(),
    }
}

impl Decoder<'_> {
    /// Decodes one object through the decoder registered for its typename.
    pub(crate) fn decode(&mut self, value: &Value, owner: Owner) -> Result<(Typename, Decoded)> {
        let malformed = Error::MalformedField {
            typename: "object",
            field: "@typename",
        };
        let Some(obj) = value.as_object() else {
            return Err(malformed);
        };
        let Some(name) = obj.get("@typename").and_then(Value::as_str) else {
            return Err(malformed);
        };
        let (typename, decode) =
            registry::decoder(name).ok_or_else(|| Error::UnknownTypename(name.into()))?;
        Ok((typename, decode(self, obj, owner)?))
    }

    fn expect_rect(&mut self, value: &Value) -> Result<Rect> {
        match self.decode(value, Owner::None)? {
            (_, Decoded::Box(rect)) => Ok(rect),
            (found, _) => Err(unexpected(Typename::Box, found)),
        }
    }

    fn expect_transformation(&mut self, value: &Value) -> Result<Transformation> {
        match self.decode(value, Owner::None)? {
            (_, Decoded::Transformation(tf)) => Ok(tf),
            (found, _) => Err(unexpected(Typename::Transformation, found)),
        }
    }

    pub(crate) fn expect_cell(&mut self, value: &Value) -> Result<CellId> {
        match self.decode(value, Owner::None)? {
            (_, Decoded::Cell(cell)) => Ok(cell),
            (found, _) => Err(unexpected(Typename::Cell, found)),
        }
    }

    pub(crate) fn expect_library(&mut self, value: &Value) -> Result<LibraryId> {
        match self.decode(value, Owner::None)? {
            (_, Decoded::Library(lib)) => Ok(lib),
            (found, _) => Err(unexpected(Typename::Library, found)),
        }
    }

    /// Decodes the members of an object, checking each is one of `accepted`.
    fn decode_members(
        &mut self,
        values: &[Value],
        owner: Owner,
        accepted: &[Typename],
    ) -> Result<()> {
        for value in values {
            let (found, _) = self.decode(value, owner)?;
            if !accepted.contains(&found) {
                return Err(unexpected(accepted[0], found));
            }
        }
        Ok(())
    }

    /// Drops the orphan entry of `tag` once every owner has attached.
    fn settle(&mut self, tag: &str) {
        if let Some(orphan) = self.session.orphans.get(tag) {
            if orphan.expected == Some(orphan.refs) {
                self.session.orphans.shift_remove(tag);
                tracing::event!(Level::TRACE, tag, "resolved relation references");
            }
        }
    }
}

fn owner_cell(owner: Owner, typename: Typename) -> Result<CellId> {
    match owner {
        Owner::Cell(cell) => Ok(cell),
        _ => Err(unexpected(Typename::Cell, typename)),
    }
}

pub(crate) fn decode_box(_: &mut Decoder<'_>, obj: &Object, _: Owner) -> Result<Decoded> {
    let f = Fields::new(obj, Typename::Box);
    Ok(Decoded::Box(Rect::from_bounds(
        f.int("_xMin")?,
        f.int("_yMin")?,
        f.int("_xMax")?,
        f.int("_yMax")?,
    )))
}

pub(crate) fn decode_transformation(
    _: &mut Decoder<'_>,
    obj: &Object,
    _: Owner,
) -> Result<Decoded> {
    let f = Fields::new(obj, Typename::Transformation);
    Ok(Decoded::Transformation(Transformation::new(
        Point::new(f.int("_tx")?, f.int("_ty")?),
        f.parse::<Orientation>("_orientation")?,
    )))
}

/// Resolves the library with the given hierarchical name, creating the
/// missing levels.
fn library_path(db: &mut Database, name: &str) -> Result<LibraryId> {
    let mut current: Option<LibraryId> = None;
    for part in name.split('.') {
        let existing = match current {
            None => db.roots.get(part).copied(),
            Some(parent) => db.library(parent)?.library_named(part),
        };
        current = Some(match existing {
            Some(lib) => lib,
            None => db.create_library(current, part)?,
        });
    }
    current.ok_or_else(|| Error::UnresolvedLibrary(name.into()))
}

pub(crate) fn decode_library(d: &mut Decoder<'_>, obj: &Object, _: Owner) -> Result<Decoded> {
    let f = Fields::new(obj, Typename::Library);
    let lib = library_path(d.db, f.str("_name")?)?;
    for value in f.array("+cellList")? {
        d.expect_cell(value)?;
    }
    Ok(Decoded::Library(lib))
}

pub(crate) fn decode_cell(d: &mut Decoder<'_>, obj: &Object, _: Owner) -> Result<Decoded> {
    let f = Fields::new(obj, Typename::Cell);
    let lib_name = f.str("_library")?;
    let lib = d
        .db
        .library_by_hierarchical_name(lib_name)
        .ok_or_else(|| Error::UnresolvedLibrary(lib_name.into()))?;
    let name = f.str("_name")?;
    let cell = d.db.create_cell(lib, name)?;
    tracing::event!(Level::DEBUG, cell = name, "decoding cell");

    let ab = d.expect_rect(f.get("_abutmentBox")?)?;
    d.db.set_abutment_box_unchecked(cell, ab)?;
    let flags = &mut d.db.cell_mut(cell)?.flags;
    flags.terminal_netlist = f.bool("_terminalNetlist")?;
    flags.pad = f.bool("_pad")?;
    flags.placed = f.bool("_placed")?;

    let owner = Owner::Cell(cell);
    d.decode_members(f.array("+netMap")?, owner, &[Typename::Net])?;
    d.decode_members(f.array("+instanceMap")?, owner, &[Typename::Instance])?;
    d.decode_members(
        f.array("+propertySet")?,
        owner,
        &[
            Typename::Annotation,
            Typename::UniquifyRelation,
            Typename::UniquifyReference,
            Typename::SlavedsRelation,
            Typename::SlavedsReference,
        ],
    )?;
    Ok(Decoded::Cell(cell))
}

pub(crate) fn decode_net(d: &mut Decoder<'_>, obj: &Object, owner: Owner) -> Result<Decoded> {
    let cell = owner_cell(owner, Typename::Net)?;
    let f = Fields::new(obj, Typename::Net);
    let net = d.db.create_net(cell, f.str("_name")?)?;
    d.db.set_net_type(net, f.parse::<NetType>("_type")?)?;
    d.db.set_net_direction(net, f.parse::<Direction>("_direction")?)?;
    d.db.set_net_global(net, f.bool("_isGlobal")?)?;
    d.db.set_net_external(net, f.bool("_isExternal")?)?;
    d.decode_members(
        f.array("+componentSet")?,
        Owner::Net(net),
        &[
            Typename::Contact,
            Typename::Horizontal,
            Typename::Vertical,
            Typename::Pad,
            Typename::Pin,
        ],
    )?;
    Ok(Decoded::Net(net))
}

pub(crate) fn decode_component(
    d: &mut Decoder<'_>,
    obj: &Object,
    owner: Owner,
) -> Result<Decoded> {
    let typename = obj
        .get("@typename")
        .and_then(Value::as_str)
        .and_then(Typename::lookup)
        .unwrap_or(Typename::Contact);
    let Owner::Net(net) = owner else {
        return Err(unexpected(Typename::Net, typename));
    };
    let f = Fields::new(obj, typename);
    let kind = match typename {
        Typename::Contact => ComponentKind::Contact {
            x: f.int("_x")?,
            y: f.int("_y")?,
            width: f.int("_width")?,
            height: f.int("_height")?,
        },
        Typename::Horizontal => ComponentKind::Horizontal {
            y: f.int("_y")?,
            width: f.int("_width")?,
            dx_source: f.int("_dxSource")?,
            dx_target: f.int("_dxTarget")?,
        },
        Typename::Vertical => ComponentKind::Vertical {
            x: f.int("_x")?,
            width: f.int("_width")?,
            dy_source: f.int("_dySource")?,
            dy_target: f.int("_dyTarget")?,
        },
        Typename::Pad => ComponentKind::Pad {
            rect: d.expect_rect(f.get("_boundingBox")?)?,
        },
        Typename::Pin => ComponentKind::Pin {
            rect: d.expect_rect(f.get("_boundingBox")?)?,
        },
        other => return Err(unexpected(Typename::Contact, other)),
    };
    let id = d.db.create_component(net, f.str("_layer")?, kind)?;
    Ok(Decoded::Component(id))
}

pub(crate) fn decode_instance(
    d: &mut Decoder<'_>,
    obj: &Object,
    owner: Owner,
) -> Result<Decoded> {
    let cell = owner_cell(owner, Typename::Instance)?;
    let f = Fields::new(obj, Typename::Instance);
    let master_name = f.str("_masterCell")?;
    let master = d
        .db
        .cell_by_hierarchical_name(master_name)
        .ok_or_else(|| Error::UnresolvedCell(master_name.into()))?;
    let tf = d.expect_transformation(f.get("_transformation")?)?;
    let status = f.parse::<PlacementStatus>("_placementStatus")?;
    let inst = d.db.create_instance(cell, f.str("_name")?, master, tf, status)?;
    d.decode_members(f.array("+plugMap")?, Owner::Instance(inst), &[Typename::Plug])?;
    Ok(Decoded::Instance(inst))
}

pub(crate) fn decode_plug(d: &mut Decoder<'_>, obj: &Object, owner: Owner) -> Result<Decoded> {
    let Owner::Instance(inst) = owner else {
        return Err(unexpected(Typename::Instance, Typename::Plug));
    };
    let f = Fields::new(obj, Typename::Plug);
    let i = d.db.instance(inst)?;
    let (cell, master) = (i.cell, i.master);

    let master_net_name = f.str("_masterNet")?;
    let master_net = d
        .db
        .cell(master)?
        .net_named(master_net_name)
        .ok_or_else(|| Error::UnresolvedNet {
            net: master_net_name.into(),
            cell: d.db.cell_name(master),
        })?;
    let net = match f.opt_str("_net")? {
        Some(name) => Some(d.db.cell(cell)?.net_named(name).ok_or_else(|| {
            Error::UnresolvedNet {
                net: name.into(),
                cell: d.db.cell_name(cell),
            }
        })?),
        None => None,
    };
    d.db.connect_plug(inst, master_net, net)?;
    Ok(Decoded::Applied)
}

pub(crate) fn decode_annotation(
    d: &mut Decoder<'_>,
    obj: &Object,
    owner: Owner,
) -> Result<Decoded> {
    let cell = owner_cell(owner, Typename::Annotation)?;
    let f = Fields::new(obj, Typename::Annotation);
    d.db.set_annotation(cell, f.str("_name")?, f.str("_value")?)?;
    Ok(Decoded::Applied)
}

fn relation_kind(typename: Typename) -> RelationKind {
    match typename {
        Typename::SlavedsRelation | Typename::SlavedsReference => RelationKind::Slaveds,
        _ => RelationKind::Uniquify,
    }
}

fn orphan_tag(master: &str, kind: RelationKind) -> String {
    format!("{}::{}", master, kind.name())
}

/// Decodes the full record of a relation, written by its master owner.
///
/// `_refcount` counts every owner, the master included. The record claims
/// the placeholder created by an earlier back-reference, if any.
pub(crate) fn decode_relation(
    d: &mut Decoder<'_>,
    obj: &Object,
    owner: Owner,
) -> Result<Decoded> {
    let typename = match obj.get("@typename").and_then(Value::as_str) {
        Some(name) if name == Typename::SlavedsRelation.as_str() => Typename::SlavedsRelation,
        _ => Typename::UniquifyRelation,
    };
    let cell = owner_cell(owner, typename)?;
    let kind = relation_kind(typename);
    let f = Fields::new(obj, typename);
    let refcount = usize::try_from(f.count("_refcount")?).map_err(|_| f.malformed("_refcount"))?;

    let tag = orphan_tag(&d.db.cell_hierarchical_name(cell)?, kind);
    let rel = match d.session.orphans.get_mut(&tag) {
        Some(orphan) => {
            orphan.refs += 1;
            orphan.expected = Some(refcount);
            let rel = orphan.relation;
            d.db.set_relation_master(rel, cell)?;
            rel
        }
        None => {
            let rel = d.db.create_relation(cell, kind)?;
            if refcount > 1 {
                d.session.orphans.insert(
                    tag.clone(),
                    Orphan {
                        relation: rel,
                        refs: 1,
                        expected: Some(refcount),
                    },
                );
            }
            rel
        }
    };
    if kind == RelationKind::Uniquify {
        let duplicates =
            u32::try_from(f.count("_duplicates")?).map_err(|_| f.malformed("_duplicates"))?;
        d.db.set_duplicates(rel, Duplicates::from_raw(duplicates));
    }
    d.settle(&tag);
    Ok(Decoded::Applied)
}

/// Decodes a back-reference to a relation owned by another cell.
///
/// When the master record has not been decoded yet, a placeholder relation
/// is created and parked in the session until the master claims it.
pub(crate) fn decode_reference(
    d: &mut Decoder<'_>,
    obj: &Object,
    owner: Owner,
) -> Result<Decoded> {
    let typename = match obj.get("@typename").and_then(Value::as_str) {
        Some(name) if name == Typename::SlavedsReference.as_str() => Typename::SlavedsReference,
        _ => Typename::UniquifyReference,
    };
    let cell = owner_cell(owner, typename)?;
    let kind = relation_kind(typename);
    let f = Fields::new(obj, typename);
    let master = f.str("_masterOwner")?;

    // The master's library may belong to a document not decoded yet.
    let is_cell_name = master
        .rsplit_once('.')
        .is_some_and(|(lib, name)| !lib.is_empty() && !name.is_empty());
    if !is_cell_name {
        let cause = Cause::MasterOwnerNotCell {
            relation: kind.name(),
        };
        d.db.report(cause, Severity::Error);
        return Ok(Decoded::Applied);
    }

    let tag = orphan_tag(master, kind);
    match d.session.orphans.get_mut(&tag) {
        Some(orphan) => {
            orphan.refs += 1;
            let rel = orphan.relation;
            d.db.put_relation(cell, rel)?;
        }
        None => {
            let rel = d.db.create_relation(cell, kind)?;
            d.session.orphans.insert(
                tag.clone(),
                Orphan {
                    relation: rel,
                    refs: 1,
                    expected: None,
                },
            );
        }
    }
    if kind == RelationKind::Slaveds {
        d.db.cell_mut(cell)?.flags.slaved_ab = true;
    }
    d.settle(&tag);
    Ok(Decoded::Applied)
}
