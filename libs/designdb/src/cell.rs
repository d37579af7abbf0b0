//! Cells: the containers of a design hierarchy.
//!
//! Besides ownership of nets, instances, markers and extension slices, this
//! module maintains each cell's cached bounding box. The cache is computed on
//! demand and kept up to date by [`fit`](Database::fit) and
//! [`unfit`](Database::unfit), which also walk up the instantiation graph so
//! that every cell using an edited cell sees the change.

use arcstr::ArcStr;
use geometry::prelude::*;
use indexmap::{IndexMap, IndexSet};
use tracing::Level;

use crate::diagnostics::{Cause, Severity};
use crate::instance::PlacementStatus;
use crate::net::ComponentKind;
use crate::occurrence::Occurrence;
use crate::quadtree::QuadTree;
use crate::relation::RelationKind;
use crate::{
    CellId, ComponentId, Database, Error, InstanceId, LibraryId, MarkerId, NetId, ObserverId,
    RelationId, Result,
};

/// A cell of a design hierarchy.
#[derive(Debug, Clone)]
pub struct Cell {
    pub(crate) library: LibraryId,
    pub(crate) name: ArcStr,
    pub(crate) nets: IndexMap<ArcStr, NetId>,
    pub(crate) instances: IndexMap<ArcStr, InstanceId>,
    /// Instances, in other cells, of this cell.
    pub(crate) slave_instances: IndexSet<InstanceId>,
    pub(crate) slices: IndexMap<ArcStr, ExtensionSlice>,
    pub(crate) markers: IndexSet<MarkerId>,
    pub(crate) quadtree: QuadTree<Leaf>,
    /// Instance leaves whose rectangle must be recomputed from their master.
    pub(crate) stale_leaves: IndexSet<InstanceId>,
    pub(crate) abutment_box: Rect,
    /// Empty means "needs recompute".
    pub(crate) bounding_box: Rect,
    pub(crate) observers: IndexSet<ObserverId>,
    pub(crate) properties: IndexMap<ArcStr, Property>,
    /// Flattening proxies, keyed by the root occurrence of their hyper-net.
    pub(crate) deep_nets: IndexMap<Occurrence, NetId>,
    pub(crate) flags: CellFlags,
}

/// Boolean state of a [`Cell`].
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct CellFlags {
    /// Flattening stops at this cell.
    pub terminal_netlist: bool,
    /// The cell is an I/O pad.
    pub pad: bool,
    /// Every instance of the cell is placed.
    pub placed: bool,
    /// The nets of the cell have been flattened.
    pub flattened_nets: bool,
    /// The abutment box follows another cell's.
    pub slaved_ab: bool,
}

/// A geometric leaf of a cell's spatial index.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum Leaf {
    /// A component of one of the cell's nets.
    Component(ComponentId),
    /// An instance placed in the cell.
    Instance(InstanceId),
    /// A marker.
    Marker(MarkerId),
}

/// A named layer of auxiliary shapes attached to a cell.
#[derive(Debug, Clone)]
pub struct ExtensionSlice {
    pub(crate) name: ArcStr,
    pub(crate) mask: u64,
    pub(crate) shapes: QuadTree<usize>,
    pub(crate) next_shape: usize,
}

impl ExtensionSlice {
    /// The slice name.
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The database-wide mask bit of this slice name.
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// The union of the slice's shapes.
    pub fn bounding_box(&self) -> Rect {
        self.shapes.bounding_box()
    }

    /// Iterates over the shapes of the slice.
    pub fn shapes(&self) -> impl Iterator<Item = (usize, Rect)> + '_ {
        self.shapes.iter()
    }
}

/// An annotated area of a cell.
#[derive(Debug, Clone)]
pub struct Marker {
    pub(crate) cell: CellId,
    pub(crate) text: ArcStr,
    pub(crate) rect: Rect,
}

impl Marker {
    /// The owning cell.
    pub fn cell(&self) -> CellId {
        self.cell
    }

    /// The annotation text.
    pub fn text(&self) -> &ArcStr {
        &self.text
    }

    /// The marked area.
    pub fn rect(&self) -> Rect {
        self.rect
    }
}

/// A named property of a cell.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Property {
    /// A shared relation.
    Relation(RelationId),
    /// A plain string value.
    Annotation(ArcStr),
}

/// An event delivered to the observers of a cell.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum CellEvent {
    /// The cell is about to be restructured.
    AboutToChange,
    /// The cell was restructured.
    ///
    /// Inside an [update session](Database::update_session), delivered once
    /// per cell when the outermost session closes.
    Changed,
    /// The cell is being destroyed.
    Destroyed,
}

pub(crate) type ObserverFn = Box<dyn FnMut(CellId, CellEvent)>;

/// The kind of entity described by a [`Signature`].
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum SignatureKind {
    /// A contact. Dimensions: `[x, y, width, height]`.
    Contact,
    /// A horizontal segment. Dimensions: `[width, y, dx_source, dx_target]`.
    Horizontal,
    /// A vertical segment. Dimensions: `[width, x, dy_source, dy_target]`.
    Vertical,
    /// A pad. Dimensions: `[x_min, y_min, x_max, y_max]`.
    Pad,
    /// An instance.
    Instance,
    /// A net.
    Net,
    /// A plug.
    Plug,
}

impl SignatureKind {
    fn name(self) -> &'static str {
        match self {
            Self::Contact => "Contact",
            Self::Horizontal => "Horizontal",
            Self::Vertical => "Vertical",
            Self::Pad => "Pad",
            Self::Instance => "Instance",
            Self::Net => "Net",
            Self::Plug => "Plug",
        }
    }
}

/// A geometric description of a component, used to find it again in a
/// rebuilt cell.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Signature {
    /// The kind of entity.
    pub kind: SignatureKind,
    /// The name of the net owning the component.
    pub net: ArcStr,
    /// The layer of the component.
    pub layer: ArcStr,
    /// Kind-specific dimensions.
    pub dims: [Unit; 4],
}

impl Cell {
    pub(crate) fn new(library: LibraryId, name: ArcStr) -> Self {
        Self {
            library,
            name,
            nets: IndexMap::new(),
            instances: IndexMap::new(),
            slave_instances: IndexSet::new(),
            slices: IndexMap::new(),
            markers: IndexSet::new(),
            quadtree: QuadTree::new(),
            stale_leaves: IndexSet::new(),
            abutment_box: Rect::empty(),
            bounding_box: Rect::empty(),
            observers: IndexSet::new(),
            properties: IndexMap::new(),
            deep_nets: IndexMap::new(),
            flags: CellFlags::default(),
        }
    }

    /// The cell's name.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The library owning the cell.
    #[inline]
    pub fn library(&self) -> LibraryId {
        self.library
    }

    /// The abutment box.
    #[inline]
    pub fn abutment_box(&self) -> Rect {
        self.abutment_box
    }

    /// The cell's flags.
    #[inline]
    pub fn flags(&self) -> CellFlags {
        self.flags
    }

    /// Returns the ID of the net with the given name.
    pub fn net_named(&self, name: &str) -> Option<NetId> {
        self.nets.get(name).copied()
    }

    /// Iterates over the nets of the cell.
    pub fn nets(&self) -> impl Iterator<Item = NetId> + '_ {
        self.nets.values().copied()
    }

    /// Returns the ID of the instance with the given name.
    pub fn instance_named(&self, name: &str) -> Option<InstanceId> {
        self.instances.get(name).copied()
    }

    /// Iterates over the instances placed in the cell.
    pub fn instances(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances.values().copied()
    }

    /// Iterates over the instances of this cell in other cells.
    pub fn slave_instances(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.slave_instances.iter().copied()
    }

    /// Iterates over the markers of the cell.
    pub fn markers(&self) -> impl Iterator<Item = MarkerId> + '_ {
        self.markers.iter().copied()
    }

    /// Returns the extension slice with the given name.
    pub fn extension_slice(&self, name: &str) -> Option<&ExtensionSlice> {
        self.slices.get(name)
    }

    /// Iterates over the extension slices of the cell.
    pub fn extension_slices(&self) -> impl Iterator<Item = &ExtensionSlice> {
        self.slices.values()
    }

    /// Returns `true` if fewer than two instances use this cell.
    #[inline]
    pub fn is_unique(&self) -> bool {
        self.slave_instances.len() < 2
    }

    /// Returns `true` if the cell has no instances.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.instances.is_empty()
    }

    /// Returns `true` if flattening stops at this cell.
    #[inline]
    pub fn is_terminal_netlist(&self) -> bool {
        self.flags.terminal_netlist
    }

    /// Returns `true` if this cell is an I/O pad.
    #[inline]
    pub fn is_pad(&self) -> bool {
        self.flags.pad
    }

    /// Returns `true` if every instance of the cell was placed when last checked.
    #[inline]
    pub fn is_placed(&self) -> bool {
        self.flags.placed
    }

    /// Returns `true` if the nets of this cell have been flattened.
    #[inline]
    pub fn is_flattened(&self) -> bool {
        self.flags.flattened_nets
    }

    /// Returns `true` if the abutment box follows another cell's.
    #[inline]
    pub fn is_abutment_box_slaved(&self) -> bool {
        self.flags.slaved_ab
    }

    /// Returns the string property with the given name.
    pub fn annotation(&self, name: &str) -> Option<&ArcStr> {
        match self.properties.get(name)? {
            Property::Annotation(value) => Some(value),
            Property::Relation(_) => None,
        }
    }

    /// Iterates over the properties of the cell.
    pub fn properties(&self) -> impl Iterator<Item = (&ArcStr, &Property)> {
        self.properties.iter()
    }
}

impl Database {
    /// Creates an empty cell in `lib`.
    ///
    /// Fails if `name` is empty or already used by a cell of `lib`.
    pub fn create_cell(&mut self, lib: LibraryId, name: impl Into<ArcStr>) -> Result<CellId> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyName { kind: "cell" });
        }
        if self.library(lib)?.cells.contains_key(&name) {
            return Err(Error::DuplicateName {
                kind: "cell",
                name,
                scope: self.library_hierarchical_name(lib)?,
            });
        }
        let id = self.cells.insert(Cell::new(lib, name.clone()));
        self.library_mut(lib)?.cells.insert(name, id);
        tracing::event!(Level::DEBUG, cell = ?id, "created cell");
        Ok(id)
    }

    /// Renames a cell.
    ///
    /// Fails if `name` is empty or already used in the cell's library.
    pub fn set_cell_name(&mut self, cell: CellId, name: impl Into<ArcStr>) -> Result<()> {
        let name = name.into();
        let (lib, old) = {
            let c = self.cell(cell)?;
            (c.library, c.name.clone())
        };
        if name == old {
            return Ok(());
        }
        if name.is_empty() {
            return Err(Error::EmptyName { kind: "cell" });
        }
        if self.library(lib)?.cells.contains_key(&name) {
            return Err(Error::DuplicateName {
                kind: "cell",
                name,
                scope: self.library_hierarchical_name(lib)?,
            });
        }
        let library = self.library_mut(lib)?;
        library.cells.shift_remove(&old);
        library.cells.insert(name.clone(), cell);
        self.cell_mut(cell)?.name = name;
        Ok(())
    }

    /// Returns `<library hierarchical name>.<cell name>`.
    pub fn cell_hierarchical_name(&self, cell: CellId) -> Result<ArcStr> {
        let c = self.cell(cell)?;
        let lib = self.library_hierarchical_name(c.library)?;
        Ok(arcstr::format!("{}.{}", lib, c.name))
    }

    /// Looks up a cell by its hierarchical name.
    pub fn cell_by_hierarchical_name(&self, name: &str) -> Option<CellId> {
        let (lib, cell) = name.rsplit_once('.')?;
        let lib = self.library_by_hierarchical_name(lib)?;
        self.libraries.get(lib)?.cell_named(cell)
    }

    /// Marks whether flattening stops at `cell`.
    pub fn set_terminal_netlist(&mut self, cell: CellId, value: bool) -> Result<()> {
        self.cell_mut(cell)?.flags.terminal_netlist = value;
        Ok(())
    }

    /// Marks whether `cell` is an I/O pad.
    pub fn set_pad(&mut self, cell: CellId, value: bool) -> Result<()> {
        self.cell_mut(cell)?.flags.pad = value;
        Ok(())
    }

    /// Returns `true` if `cell` is instantiated, directly or not, by `other`.
    pub fn is_called_by(&self, cell: CellId, other: CellId) -> Result<bool> {
        for inst in self.cell(other)?.instances() {
            let master = self.instance(inst)?.master;
            if master == cell || self.is_called_by(cell, master)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns the bounding box of `cell`.
    ///
    /// Recomputed from the abutment box, the spatial index and the extension
    /// slices when the cache is empty.
    pub fn bounding_box(&mut self, cell: CellId) -> Result<Rect> {
        self.refresh_stale_leaves(cell)?;
        let c = self.cell_mut(cell)?;
        if c.bounding_box.is_empty() {
            let mut bbox = c.abutment_box;
            bbox.merge(&c.quadtree.bounding_box());
            for slice in c.slices.values() {
                bbox.merge(&slice.shapes.bounding_box());
            }
            c.bounding_box = bbox;
        }
        Ok(c.bounding_box)
    }

    /// Recomputes the rectangles of instance leaves whose master changed.
    fn refresh_stale_leaves(&mut self, cell: CellId) -> Result<()> {
        let stale: Vec<InstanceId> = self.cell_mut(cell)?.stale_leaves.drain(..).collect();
        for inst in stale {
            let Some(i) = self.instances.get(inst) else {
                continue;
            };
            let (master, tf) = (i.master, i.transformation);
            let rect = tf.apply_rect(&self.bounding_box(master)?);
            self.cell_mut(cell)?.quadtree.insert(Leaf::Instance(inst), rect);
        }
        Ok(())
    }

    /// Returns the leaves of `cell` whose rectangle intersects `area`.
    pub fn leaves_under(&mut self, cell: CellId, area: Rect) -> Result<Vec<(Leaf, Rect)>> {
        self.refresh_stale_leaves(cell)?;
        Ok(self.cell(cell)?.quadtree.query(area).collect())
    }

    /// Records that `rect` was added to `cell`.
    ///
    /// Widens a valid cache that does not contain `rect`, then propagates to
    /// every cell using `cell`. Propagation stops at a cache that already
    /// contains `rect`, never at an empty one: a cell without content keeps
    /// an empty cache while its users hold valid ones. Each user also gets
    /// the instance leaf marked stale so its rectangle is recomputed.
    pub(crate) fn fit(&mut self, cell: CellId, rect: Rect) -> Result<()> {
        if rect.is_empty() {
            return Ok(());
        }
        let c = self.cell_mut(cell)?;
        if !c.bounding_box.is_empty() {
            if c.bounding_box.contains(&rect) {
                return Ok(());
            }
            c.bounding_box.merge(&rect);
        }
        self.propagate(cell, rect, Self::fit)
    }

    /// Records that `rect` was removed from `cell`.
    ///
    /// Invalidates the cache when `rect` touched its bounds, then propagates
    /// to every cell using `cell`.
    pub(crate) fn unfit(&mut self, cell: CellId, rect: Rect) -> Result<()> {
        if rect.is_empty() {
            return Ok(());
        }
        let c = self.cell_mut(cell)?;
        if !c.bounding_box.is_empty() {
            if !c.bounding_box.is_constrained_by(&rect) {
                return Ok(());
            }
            c.bounding_box.make_empty();
        }
        self.propagate(cell, rect, Self::unfit)
    }

    fn propagate(
        &mut self,
        cell: CellId,
        rect: Rect,
        f: fn(&mut Self, CellId, Rect) -> Result<()>,
    ) -> Result<()> {
        let slaves: Vec<InstanceId> = self.cell(cell)?.slave_instances().collect();
        for inst in slaves {
            let (parent, tf) = {
                let i = self.instance(inst)?;
                (i.cell, i.transformation)
            };
            self.cell_mut(parent)?.stale_leaves.insert(inst);
            f(self, parent, tf.apply_rect(&rect))?;
        }
        Ok(())
    }

    /// Sets the abutment box of `cell` and of every cell slaved to it.
    ///
    /// If the abutment box of `cell` is slaved to another cell, the call is
    /// reported and has no effect.
    pub fn set_abutment_box(&mut self, cell: CellId, abutment_box: Rect) -> Result<()> {
        if let Some(rel) = self.relation(cell, RelationKind::Slaveds)? {
            let master = self.relation_master(rel)?;
            if master != cell {
                let cause = Cause::AbutmentBoxSlaved {
                    cell: self.cell_name(cell),
                    master: self.cell_name(master),
                };
                self.report(cause, Severity::Error);
                return Ok(());
            }
        }
        self.set_abutment_box_unchecked(cell, abutment_box)?;
        if self.cell(cell)?.flags.slaved_ab {
            return Ok(());
        }
        for slave in self.slaved_cells(cell)? {
            self.set_abutment_box_unchecked(slave, abutment_box)?;
        }
        Ok(())
    }

    pub(crate) fn set_abutment_box_unchecked(
        &mut self,
        cell: CellId,
        abutment_box: Rect,
    ) -> Result<()> {
        let old = self.cell(cell)?.abutment_box;
        if abutment_box == old {
            return Ok(());
        }
        if !old.is_empty() && (abutment_box.is_empty() || !abutment_box.contains(&old)) {
            self.unfit(cell, old)?;
        }
        self.cell_mut(cell)?.abutment_box = abutment_box;
        self.fit(cell, abutment_box)?;
        self.notify(cell, CellEvent::Changed);
        Ok(())
    }

    /// Shrinks the abutment box of `cell` about its center, snapping to the
    /// configured grid.
    ///
    /// # Panics
    ///
    /// Panics if `factor` is outside `[0, 1]`.
    pub fn shrink_abutment_box(&mut self, cell: CellId, factor: f64) -> Result<()> {
        let mut ab = self.cell(cell)?.abutment_box;
        ab.shrink_by_factor(factor, self.config.grid);
        self.set_abutment_box(cell, ab)
    }

    /// Returns the cells whose abutment box follows the abutment box of `cell`.
    ///
    /// Empty unless `cell` is the master of a slaving relation.
    pub fn slaved_cells(&self, cell: CellId) -> Result<Vec<CellId>> {
        let Some(rel) = self.relation(cell, RelationKind::Slaveds)? else {
            return Ok(Vec::new());
        };
        if self.relation_master(rel)? != cell {
            return Ok(Vec::new());
        }
        Ok(self
            .relation_owners(rel)?
            .into_iter()
            .filter(|&c| c != cell)
            .collect())
    }

    /// Makes the abutment box of `cell` follow the abutment box of `top`.
    ///
    /// The placed instances of `cell` are translated by the offset between
    /// the lower-left corners of the two abutment boxes, and the abutment box
    /// of `cell` becomes that of `top`. Returns `false`, after reporting, if
    /// `cell` is already slaved, is used by more than one instance, has cells
    /// slaved to it, or if slaving would form a cycle.
    pub fn slave_abutment_box(&mut self, cell: CellId, top: CellId) -> Result<bool> {
        let top_ab = self.cell(top)?.abutment_box;
        let c = self.cell(cell)?;
        if c.flags.slaved_ab {
            let cause = Cause::AlreadySlaved {
                cell: c.name.clone(),
            };
            self.report(cause, Severity::Error);
            return Ok(false);
        }
        if !c.is_unique() {
            let cause = Cause::NotUnique {
                cell: c.name.clone(),
                slaves: c.slave_instances.len(),
            };
            self.report(cause, Severity::Error);
            return Ok(false);
        }
        let root = match self.relation(top, RelationKind::Slaveds)? {
            Some(rel) => self.relation_master(rel)?,
            None => top,
        };
        if cell == top || root == cell {
            let cause = Cause::SlavingCycle {
                cell: self.cell_name(cell),
                top: self.cell_name(top),
            };
            self.report(cause, Severity::Error);
            return Ok(false);
        }
        if !self.slaved_cells(cell)?.is_empty() {
            let cause = Cause::SlavingMaster {
                cell: self.cell_name(cell),
            };
            self.report(cause, Severity::Error);
            return Ok(false);
        }

        let mut db = self.update_session();
        db.notify(cell, CellEvent::AboutToChange);
        let own_ab = db.cell(cell)?.abutment_box;
        if !own_ab.is_empty() && !top_ab.is_empty() {
            if own_ab.width() != top_ab.width() || own_ab.height() != top_ab.height() {
                let cause = Cause::SlavingSizeMismatch {
                    cell: db.cell_name(cell),
                    top: db.cell_name(top),
                };
                db.report(cause, Severity::Warning);
            }
            let offset = top_ab.lower_left() - own_ab.lower_left();
            let instances: Vec<InstanceId> = db.cell(cell)?.instances().collect();
            for inst in instances {
                if db.instance(inst)?.status != PlacementStatus::Unplaced {
                    db.translate_instance(inst, offset)?;
                }
            }
        }
        db.set_abutment_box_unchecked(cell, top_ab)?;

        // A leftover relation with no slaves would collide with the new one.
        db.release_relation(cell, RelationKind::Slaveds)?;
        let rel = match db.relation(top, RelationKind::Slaveds)? {
            Some(rel) => rel,
            None => db.create_relation(top, RelationKind::Slaveds)?,
        };
        db.put_relation(cell, rel)?;
        db.cell_mut(cell)?.flags.slaved_ab = true;
        tracing::event!(
            Level::INFO,
            cell = %db.cell_name(cell),
            top = %db.cell_name(top),
            "slaved abutment box"
        );
        Ok(true)
    }

    /// Adds an extension slice to `cell`, returning its mask bit.
    ///
    /// Mask bits are allocated once per slice name across the database.
    pub fn create_extension_slice(&mut self, cell: CellId, name: impl Into<ArcStr>) -> Result<u64> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyName {
                kind: "extension slice",
            });
        }
        let c = self.cell(cell)?;
        if c.slices.contains_key(&name) {
            return Err(Error::DuplicateName {
                kind: "extension slice",
                name,
                scope: c.name.clone(),
            });
        }
        let mask = match self.slice_masks.get(&name) {
            Some(&mask) => mask,
            None => {
                let bit = self.slice_masks.len();
                if bit >= u64::BITS as usize {
                    return Err(Error::SliceMasksExhausted);
                }
                let mask = 1u64 << bit;
                self.slice_masks.insert(name.clone(), mask);
                mask
            }
        };
        self.cell_mut(cell)?.slices.insert(
            name.clone(),
            ExtensionSlice {
                name,
                mask,
                shapes: QuadTree::new(),
                next_shape: 0,
            },
        );
        Ok(mask)
    }

    /// Returns the mask bit allocated to the slice name, if any.
    pub fn extension_slice_mask(&self, name: &str) -> Option<u64> {
        self.slice_masks.get(name).copied()
    }

    /// Adds a shape to an extension slice of `cell`, returning its index.
    pub fn add_slice_shape(&mut self, cell: CellId, slice: &str, rect: Rect) -> Result<usize> {
        let c = self.cell_mut(cell)?;
        let cell_name = c.name.clone();
        let slice = c.slices.get_mut(slice).ok_or_else(|| Error::UnknownSlice {
            name: slice.into(),
            cell: cell_name,
        })?;
        let index = slice.next_shape;
        slice.next_shape += 1;
        slice.shapes.insert(index, rect);
        self.fit(cell, rect)?;
        Ok(index)
    }

    /// Removes an extension slice and its shapes from `cell`.
    pub fn remove_extension_slice(&mut self, cell: CellId, slice: &str) -> Result<()> {
        let c = self.cell_mut(cell)?;
        let cell_name = c.name.clone();
        let removed = c.slices.shift_remove(slice).ok_or_else(|| Error::UnknownSlice {
            name: slice.into(),
            cell: cell_name,
        })?;
        self.unfit(cell, removed.bounding_box())
    }

    /// Adds a marker to `cell`.
    pub fn add_marker(
        &mut self,
        cell: CellId,
        text: impl Into<ArcStr>,
        rect: Rect,
    ) -> Result<MarkerId> {
        self.cell(cell)?;
        let id = self.markers.insert(Marker {
            cell,
            text: text.into(),
            rect,
        });
        let c = self.cell_mut(cell)?;
        c.markers.insert(id);
        c.quadtree.insert(Leaf::Marker(id), rect);
        self.fit(cell, rect)?;
        Ok(id)
    }

    /// Removes a marker.
    pub fn remove_marker(&mut self, marker: MarkerId) -> Result<()> {
        let m = self.markers.remove(marker).ok_or(Error::UnknownMarker)?;
        let c = self.cell_mut(m.cell)?;
        c.markers.shift_remove(&marker);
        c.quadtree.remove(Leaf::Marker(marker));
        self.unfit(m.cell, m.rect)
    }

    /// Sets a string property on `cell`.
    ///
    /// Fails if a relation is stored under the same name.
    pub fn set_annotation(
        &mut self,
        cell: CellId,
        name: impl Into<ArcStr>,
        value: impl Into<ArcStr>,
    ) -> Result<()> {
        let name = name.into();
        let c = self.cell_mut(cell)?;
        if let Some(Property::Relation(_)) = c.properties.get(&name) {
            return Err(Error::PropertyType {
                name,
                owner: c.name.clone(),
                expected: "annotation",
            });
        }
        c.properties.insert(name, Property::Annotation(value.into()));
        Ok(())
    }

    /// Registers an observer of `cell`.
    pub fn add_observer(
        &mut self,
        cell: CellId,
        observer: impl FnMut(CellId, CellEvent) + 'static,
    ) -> Result<ObserverId> {
        self.cell(cell)?;
        let id = self.observers.insert(Box::new(observer));
        self.cell_mut(cell)?.observers.insert(id);
        Ok(id)
    }

    /// Unregisters an observer of `cell`.
    pub fn remove_observer(&mut self, cell: CellId, observer: ObserverId) -> Result<()> {
        self.cell_mut(cell)?.observers.shift_remove(&observer);
        self.observers.remove(observer);
        Ok(())
    }

    /// Delivers `event` to the observers of `cell`.
    ///
    /// [`CellEvent::Changed`] is deferred while an update session is open.
    pub fn notify(&mut self, cell: CellId, event: CellEvent) {
        if event == CellEvent::Changed && self.session.depth > 0 {
            self.session.pending.insert(cell);
            return;
        }
        let Some(c) = self.cells.get(cell) else {
            return;
        };
        let observers: Vec<ObserverId> = c.observers.iter().copied().collect();
        for id in observers {
            if let Some(observer) = self.observers.get_mut(id) {
                observer(cell, event);
            }
        }
    }

    /// Finds the component of `cell` described by `signature`.
    ///
    /// A missing net, a missing component or an unsupported signature kind
    /// is reported and yields `None`.
    pub fn entity_by_signature(
        &mut self,
        cell: CellId,
        signature: &Signature,
    ) -> Result<Option<ComponentId>> {
        if !matches!(
            signature.kind,
            SignatureKind::Contact
                | SignatureKind::Horizontal
                | SignatureKind::Vertical
                | SignatureKind::Pad
        ) {
            let cause = Cause::UnsupportedSignature {
                kind: signature.kind.name(),
            };
            self.report(cause, Severity::Error);
            return Ok(None);
        }

        let c = self.cell(cell)?;
        let Some(net) = c.net_named(&signature.net) else {
            let cause = Cause::MissingNet {
                cell: c.name.clone(),
                net: signature.net.clone(),
            };
            self.report(cause, Severity::Error);
            return Ok(None);
        };

        let [d0, d1, d2, d3] = signature.dims;
        for &id in &self.net(net)?.components {
            let component = self.component(id)?;
            if component.layer != signature.layer {
                continue;
            }
            let found = match (&component.kind, signature.kind) {
                (
                    ComponentKind::Contact {
                        x,
                        y,
                        width,
                        height,
                    },
                    SignatureKind::Contact,
                ) => (*x, *y, *width, *height) == (d0, d1, d2, d3),
                (
                    ComponentKind::Vertical {
                        x,
                        width,
                        dy_source,
                        dy_target,
                    },
                    SignatureKind::Vertical,
                ) => (*width, *x, *dy_source, *dy_target) == (d0, d1, d2, d3),
                (
                    ComponentKind::Horizontal {
                        y,
                        width,
                        dx_source,
                        dx_target,
                    },
                    SignatureKind::Horizontal,
                ) => (*width, *y, *dx_source, *dx_target) == (d0, d1, d2, d3),
                (ComponentKind::Pad { rect }, SignatureKind::Pad) => {
                    (rect.x_min(), rect.y_min(), rect.x_max(), rect.y_max()) == (d0, d1, d2, d3)
                }
                _ => false,
            };
            if found {
                return Ok(Some(id));
            }
        }

        let cause = Cause::MissingComponent {
            cell: self.cell_name(cell),
            kind: signature.kind.name(),
        };
        self.report(cause, Severity::Error);
        Ok(None)
    }

    /// Destroys `cell` and everything it owns.
    ///
    /// Instances of `cell` in other cells are destroyed first. Relations held
    /// by the cell are released, and the cell is unregistered from its library.
    pub fn destroy_cell(&mut self, cell: CellId) -> Result<()> {
        self.cell(cell)?;
        self.notify(cell, CellEvent::Destroyed);
        let mut db = self.update_session();

        let slaves: Vec<InstanceId> = db.cell(cell)?.slave_instances().collect();
        for inst in slaves {
            db.destroy_instance(inst)?;
        }
        let nets: Vec<NetId> = db.cell(cell)?.nets().collect();
        for net in nets {
            db.destroy_net(net)?;
        }
        let instances: Vec<InstanceId> = db.cell(cell)?.instances().collect();
        for inst in instances {
            db.destroy_instance(inst)?;
        }
        let markers: Vec<MarkerId> = db.cell(cell)?.markers().collect();
        for marker in markers {
            db.remove_marker(marker)?;
        }
        db.cell_mut(cell)?.slices.clear();
        for kind in [RelationKind::Uniquify, RelationKind::Slaveds] {
            db.release_relation(cell, kind)?;
        }

        let c = db.cells.remove(cell).ok_or(Error::UnknownCell)?;
        for observer in c.observers {
            db.observers.remove(observer);
        }
        db.library_mut(c.library)?.cells.shift_remove(&c.name);
        tracing::event!(Level::DEBUG, cell = %c.name, "destroyed cell");
        Ok(())
    }
}
