//! A hierarchical layout database.
//!
//! A [`Database`] owns every object of a design: libraries, the cells they
//! register, and the nets, components, instances and markers of each cell.
//! Objects are addressed through copyable handles ([`CellId`], [`NetId`], ...)
//! and every mutation goes through a `Database` method, so that cached
//! bounding boxes, shared relations and observers stay consistent.
//!
//! The main transforms are [net flattening](Database::flatten_nets),
//! [uniquification](Database::uniquify) and
//! [abutment box slaving](Database::slave_abutment_box). Designs persist to
//! JSON through the [`codec`] module.
//!
//! # Examples
//!
//! ```
//! # use designdb::prelude::*;
//! let mut db = Database::new();
//! let lib = db.create_library(None, "work").unwrap();
//! let inv = db.create_cell(lib, "inv").unwrap();
//! db.set_abutment_box(inv, Rect::from_sides(0, 0, 10, 40)).unwrap();
//! assert!(db.bounding_box(inv).unwrap().contains(&Rect::from_sides(0, 0, 10, 40)));
//! ```
#![warn(missing_docs)]

use std::fmt::Debug;

use arcstr::ArcStr;
use indexmap::IndexMap;
use slotmap::SlotMap;

pub mod cell;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod flatten;
pub mod instance;
pub mod library;
pub mod net;
pub mod occurrence;
pub mod prelude;
pub mod quadtree;
pub mod relation;
pub mod session;
pub mod uniquify;

#[cfg(test)]
pub(crate) mod tests;

use crate::cell::{Cell, Marker, ObserverFn};
use crate::config::DatabaseConfig;
use crate::diagnostics::{Cause, Issue, IssueSet, Severity};
use crate::instance::Instance;
use crate::library::Library;
use crate::net::{Component, Net};
use crate::relation::Relation;
use crate::session::SessionState;

pub use error::{Error, Result};

slotmap::new_key_type! {
    /// A library identifier.
    pub struct LibraryId;
    /// A cell identifier.
    pub struct CellId;
    /// A net identifier.
    pub struct NetId;
    /// A component identifier.
    pub struct ComponentId;
    /// An instance identifier.
    pub struct InstanceId;
    /// A marker identifier.
    pub struct MarkerId;
    /// A shared relation identifier.
    pub struct RelationId;
    /// An observer registration.
    pub struct ObserverId;
}

/// The in-memory design database.
pub struct Database {
    pub(crate) libraries: SlotMap<LibraryId, Library>,
    pub(crate) roots: IndexMap<ArcStr, LibraryId>,
    pub(crate) cells: SlotMap<CellId, Cell>,
    pub(crate) nets: SlotMap<NetId, Net>,
    pub(crate) components: SlotMap<ComponentId, Component>,
    pub(crate) instances: SlotMap<InstanceId, Instance>,
    pub(crate) markers: SlotMap<MarkerId, Marker>,
    pub(crate) relations: SlotMap<RelationId, Relation>,
    pub(crate) observers: SlotMap<ObserverId, ObserverFn>,
    pub(crate) slice_masks: IndexMap<ArcStr, u64>,
    pub(crate) issues: IssueSet,
    pub(crate) session: SessionState,
    pub(crate) config: DatabaseConfig,
}

impl Default for Database {
    fn default() -> Self {
        Self::with_config(DatabaseConfig::default())
    }
}

impl Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("libraries", &self.libraries.len())
            .field("cells", &self.cells.len())
            .field("nets", &self.nets.len())
            .field("instances", &self.instances.len())
            .field("relations", &self.relations.len())
            .field("issues", &self.issues.len())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Creates an empty database with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty database with the given configuration.
    pub fn with_config(config: DatabaseConfig) -> Self {
        Self {
            libraries: SlotMap::with_key(),
            roots: IndexMap::new(),
            cells: SlotMap::with_key(),
            nets: SlotMap::with_key(),
            components: SlotMap::with_key(),
            instances: SlotMap::with_key(),
            markers: SlotMap::with_key(),
            relations: SlotMap::with_key(),
            observers: SlotMap::with_key(),
            slice_masks: IndexMap::new(),
            issues: IssueSet::new(),
            session: SessionState::default(),
            config,
        }
    }

    /// The configuration this database was created with.
    #[inline]
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// The issues reported so far.
    #[inline]
    pub fn issues(&self) -> &IssueSet {
        &self.issues
    }

    /// Removes and returns every reported issue.
    pub fn take_issues(&mut self) -> Vec<Issue> {
        self.issues.drain()
    }

    /// Logs a policy violation and records it in the issue set.
    pub(crate) fn report(&mut self, cause: Cause, severity: Severity) {
        self.issues.add(Issue::new_and_log(cause, severity));
    }

    /// Returns the library with the given ID.
    pub fn library(&self, id: LibraryId) -> Result<&Library> {
        self.libraries.get(id).ok_or(Error::UnknownLibrary)
    }

    pub(crate) fn library_mut(&mut self, id: LibraryId) -> Result<&mut Library> {
        self.libraries.get_mut(id).ok_or(Error::UnknownLibrary)
    }

    /// Returns the cell with the given ID.
    pub fn cell(&self, id: CellId) -> Result<&Cell> {
        self.cells.get(id).ok_or(Error::UnknownCell)
    }

    pub(crate) fn cell_mut(&mut self, id: CellId) -> Result<&mut Cell> {
        self.cells.get_mut(id).ok_or(Error::UnknownCell)
    }

    /// Returns the net with the given ID.
    pub fn net(&self, id: NetId) -> Result<&Net> {
        self.nets.get(id).ok_or(Error::UnknownNet)
    }

    pub(crate) fn net_mut(&mut self, id: NetId) -> Result<&mut Net> {
        self.nets.get_mut(id).ok_or(Error::UnknownNet)
    }

    /// Returns the component with the given ID.
    pub fn component(&self, id: ComponentId) -> Result<&Component> {
        self.components.get(id).ok_or(Error::UnknownComponent)
    }

    /// Returns the instance with the given ID.
    pub fn instance(&self, id: InstanceId) -> Result<&Instance> {
        self.instances.get(id).ok_or(Error::UnknownInstance)
    }

    pub(crate) fn instance_mut(&mut self, id: InstanceId) -> Result<&mut Instance> {
        self.instances.get_mut(id).ok_or(Error::UnknownInstance)
    }

    /// Returns the marker with the given ID.
    pub fn marker(&self, id: MarkerId) -> Result<&Marker> {
        self.markers.get(id).ok_or(Error::UnknownMarker)
    }

    /// The name of a cell, or `"<unknown>"` for a dead handle.
    ///
    /// Used when formatting diagnostics.
    pub(crate) fn cell_name(&self, id: CellId) -> ArcStr {
        self.cells
            .get(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| arcstr::literal!("<unknown>"))
    }
}
