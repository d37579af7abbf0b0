//! Shared relations between cells.
//!
//! A relation is a single record shared by several owner cells. Exactly one
//! owner is the *master owner*. Each owner stores the relation's ID in its
//! property map under the relation kind's name, so a cell holds at most one
//! relation of each kind.
//!
//! Two kinds exist. [`RelationKind::Uniquify`] links a cell to its clones
//! and carries the duplicate counter used to name them.
//! [`RelationKind::Slaveds`] links a cell to the cells whose abutment box
//! follows its own.

use arcstr::ArcStr;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::Level;
use uniquify::Duplicates;

use crate::cell::Property;
use crate::diagnostics::{Cause, Severity};
use crate::{CellId, Database, Error, RelationId, Result};

/// The kind of a shared relation.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum RelationKind {
    /// Links a master cell and its clones.
    Uniquify,
    /// Links a cell and the cells whose abutment box follows it.
    Slaveds,
}

impl RelationKind {
    /// The property name under which the relation is stored.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uniquify => "Cell::UniquifyRelation",
            Self::Slaveds => "Cell::SlavedsRelation",
        }
    }

    /// The kind stored under the given property name.
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Uniquify, Self::Slaveds]
            .into_iter()
            .find(|kind| kind.name() == name)
    }
}

/// Kind-specific relation state.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum RelationState {
    Uniquify(Duplicates),
    Slaveds,
}

/// A relation record.
#[derive(Debug, Clone)]
pub struct Relation {
    pub(crate) state: RelationState,
    pub(crate) master_owner: CellId,
    pub(crate) owners: IndexSet<CellId>,
}

impl Relation {
    /// The kind of this relation.
    pub fn kind(&self) -> RelationKind {
        match self.state {
            RelationState::Uniquify(_) => RelationKind::Uniquify,
            RelationState::Slaveds => RelationKind::Slaveds,
        }
    }

    /// The master owner.
    #[inline]
    pub fn master_owner(&self) -> CellId {
        self.master_owner
    }

    /// Every current owner, the master owner included.
    pub fn owners(&self) -> impl Iterator<Item = CellId> + '_ {
        self.owners.iter().copied()
    }

    /// The duplicate counter of a uniquify relation.
    pub fn duplicates(&self) -> Option<Duplicates> {
        match self.state {
            RelationState::Uniquify(duplicates) => Some(duplicates),
            RelationState::Slaveds => None,
        }
    }
}

impl Database {
    /// Returns the relation of the given kind held by `cell`.
    ///
    /// Fails if the property stored under the kind's name is not a relation
    /// of that kind.
    pub fn relation(&self, cell: CellId, kind: RelationKind) -> Result<Option<RelationId>> {
        let c = self.cell(cell)?;
        let Some(property) = c.properties.get(kind.name()) else {
            return Ok(None);
        };
        let mismatch = || Error::PropertyType {
            name: kind.name().into(),
            owner: c.name.clone(),
            expected: kind.name(),
        };
        match property {
            Property::Relation(id) => match self.relations.get(*id) {
                Some(rel) if rel.kind() == kind => Ok(Some(*id)),
                _ => Err(mismatch()),
            },
            Property::Annotation(_) => Err(mismatch()),
        }
    }

    /// Returns a relation record.
    pub fn relation_record(&self, rel: RelationId) -> Option<&Relation> {
        self.relations.get(rel)
    }

    pub(crate) fn relation_master(&self, rel: RelationId) -> Result<CellId> {
        self.relations
            .get(rel)
            .map(|r| r.master_owner)
            .ok_or(Error::PropertyType {
                name: "relation".into(),
                owner: "<released>".into(),
                expected: "live relation",
            })
    }

    pub(crate) fn relation_owners(&self, rel: RelationId) -> Result<Vec<CellId>> {
        self.relation_master(rel)?;
        Ok(self.relations[rel].owners().collect())
    }

    /// Creates a relation whose master owner is `master`, and attaches it.
    pub(crate) fn create_relation(
        &mut self,
        master: CellId,
        kind: RelationKind,
    ) -> Result<RelationId> {
        if self.relation(master, kind)?.is_some() {
            return Err(Error::RelationAttached {
                kind: kind.name(),
                owner: self.cell_name(master),
            });
        }
        let state = match kind {
            RelationKind::Uniquify => RelationState::Uniquify(Duplicates::new()),
            RelationKind::Slaveds => RelationState::Slaveds,
        };
        let id = self.relations.insert(Relation {
            state,
            master_owner: master,
            owners: IndexSet::new(),
        });
        self.put_relation(master, id)?;
        Ok(id)
    }

    /// Attaches `rel` to `cell`.
    ///
    /// Attaching a relation the cell already holds is a no-op. Fails if the
    /// cell holds a different relation of the same kind.
    pub(crate) fn put_relation(&mut self, cell: CellId, rel: RelationId) -> Result<()> {
        let kind = self
            .relations
            .get(rel)
            .map(Relation::kind)
            .ok_or(Error::PropertyType {
                name: "relation".into(),
                owner: self.cell_name(cell),
                expected: "live relation",
            })?;
        match self.relation(cell, kind)? {
            Some(existing) if existing == rel => return Ok(()),
            Some(_) => {
                return Err(Error::RelationAttached {
                    kind: kind.name(),
                    owner: self.cell_name(cell),
                })
            }
            None => (),
        }
        self.cell_mut(cell)?
            .properties
            .insert(kind.name().into(), Property::Relation(rel));
        self.relations[rel].owners.insert(cell);
        Ok(())
    }

    /// Detaches the relation of the given kind from `cell`.
    ///
    /// When the master owner releases a relation, the relation is destroyed
    /// and detached from every other owner.
    pub fn release_relation(&mut self, cell: CellId, kind: RelationKind) -> Result<()> {
        let Some(rel) = self.relation(cell, kind)? else {
            return Ok(());
        };
        self.detach(cell, kind, rel)?;
        if self.relations[rel].master_owner != cell {
            return Ok(());
        }

        let relation = self.relations.remove(rel).ok_or(Error::PropertyType {
            name: kind.name().into(),
            owner: self.cell_name(cell),
            expected: "live relation",
        })?;
        let orphans = relation.owners.len();
        for owner in relation.owners {
            self.detach(owner, kind, rel)?;
        }
        if orphans > 0 {
            let cause = Cause::RelationReleased {
                relation: kind.name(),
                owner: self.cell_name(cell),
            };
            self.report(cause, Severity::Info);
        }
        Ok(())
    }

    fn detach(&mut self, cell: CellId, kind: RelationKind, rel: RelationId) -> Result<()> {
        let c = self.cell_mut(cell)?;
        c.properties.shift_remove(kind.name());
        if kind == RelationKind::Slaveds {
            c.flags.slaved_ab = false;
        }
        if let Some(relation) = self.relations.get_mut(rel) {
            relation.owners.shift_remove(&cell);
        }
        Ok(())
    }

    /// Makes `cell` the master owner of `rel`.
    pub(crate) fn set_relation_master(&mut self, rel: RelationId, cell: CellId) -> Result<()> {
        self.put_relation(cell, rel)?;
        self.relations[rel].master_owner = cell;
        Ok(())
    }

    /// Overwrites the duplicate counter of a uniquify relation.
    pub(crate) fn set_duplicates(&mut self, rel: RelationId, duplicates: Duplicates) {
        if let Some(Relation {
            state: RelationState::Uniquify(current),
            ..
        }) = self.relations.get_mut(rel)
        {
            *current = duplicates;
        }
    }

    /// Mints the next clone name of a uniquify relation.
    ///
    /// Names already used in the master's library are skipped.
    pub(crate) fn next_unique_name(&mut self, rel: RelationId) -> Result<ArcStr> {
        let master = self.relation_master(rel)?;
        let c = self.cells.get(master).ok_or(Error::UnknownCell)?;
        let library = self.libraries.get(c.library).ok_or(Error::UnknownLibrary)?;
        let trunk = c.name.clone();
        match self.relations.get_mut(rel) {
            Some(Relation {
                state: RelationState::Uniquify(duplicates),
                ..
            }) => {
                let name = duplicates.next_name(&trunk, |n| library.cells.contains_key(n));
                tracing::event!(Level::DEBUG, %name, "minted clone name");
                Ok(name)
            }
            _ => Err(Error::PropertyType {
                name: RelationKind::Uniquify.name().into(),
                owner: trunk,
                expected: RelationKind::Uniquify.name(),
            }),
        }
    }

    /// Returns `true` if `cell` is a clone of another cell.
    pub fn is_uniquified(&self, cell: CellId) -> Result<bool> {
        Ok(match self.relation(cell, RelationKind::Uniquify)? {
            Some(rel) => self.relation_master(rel)? != cell,
            None => false,
        })
    }

    /// Returns `true` if `cell` is not a clone.
    pub fn is_uniquify_master(&self, cell: CellId) -> Result<bool> {
        Ok(!self.is_uniquified(cell)?)
    }

    /// Returns the cell `cell` was cloned from, or `cell` itself.
    pub fn clone_master(&self, cell: CellId) -> Result<CellId> {
        match self.relation(cell, RelationKind::Uniquify)? {
            Some(rel) => self.relation_master(rel),
            None => Ok(cell),
        }
    }

    /// Returns the clones of `cell`.
    ///
    /// Empty unless `cell` is the master of a uniquify relation.
    pub fn clones(&self, cell: CellId) -> Result<Vec<CellId>> {
        let Some(rel) = self.relation(cell, RelationKind::Uniquify)? else {
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
}
