//! Libraries: named, nestable registries of cells.

use arcstr::ArcStr;
use indexmap::{IndexMap, IndexSet};

use crate::{CellId, Database, Error, LibraryId, Result};

/// A named collection of cells and sub-libraries.
#[derive(Debug, Clone)]
pub struct Library {
    pub(crate) parent: Option<LibraryId>,
    pub(crate) name: ArcStr,
    pub(crate) libraries: IndexMap<ArcStr, LibraryId>,
    pub(crate) cells: IndexMap<ArcStr, CellId>,
}

impl Library {
    /// The library's name.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The enclosing library, if any.
    #[inline]
    pub fn parent(&self) -> Option<LibraryId> {
        self.parent
    }

    /// Returns the ID of the cell with the given name.
    pub fn cell_named(&self, name: &str) -> Option<CellId> {
        self.cells.get(name).copied()
    }

    /// Iterates over the cells of this library in registration order.
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.values().copied()
    }

    /// Returns the ID of the sub-library with the given name.
    pub fn library_named(&self, name: &str) -> Option<LibraryId> {
        self.libraries.get(name).copied()
    }
}

impl Database {
    /// Creates a library.
    ///
    /// A library without a parent is a root library.
    /// Fails if `name` is empty or already used in the same scope.
    pub fn create_library(
        &mut self,
        parent: Option<LibraryId>,
        name: impl Into<ArcStr>,
    ) -> Result<LibraryId> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyName { kind: "library" });
        }
        let taken = match parent {
            Some(parent) => self.library(parent)?.libraries.contains_key(&name),
            None => self.roots.contains_key(&name),
        };
        if taken {
            let scope = match parent {
                Some(parent) => self.library_hierarchical_name(parent)?,
                None => arcstr::literal!("<root>"),
            };
            return Err(Error::DuplicateName {
                kind: "library",
                name,
                scope,
            });
        }

        let id = self.libraries.insert(Library {
            parent,
            name: name.clone(),
            libraries: IndexMap::new(),
            cells: IndexMap::new(),
        });
        match parent {
            Some(parent) => {
                self.library_mut(parent)?.libraries.insert(name, id);
            }
            None => {
                self.roots.insert(name, id);
            }
        }
        Ok(id)
    }

    /// Returns the dot-separated path of a library from its root.
    pub fn library_hierarchical_name(&self, id: LibraryId) -> Result<ArcStr> {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let lib = self.library(id)?;
            parts.push(lib.name.as_str());
            current = lib.parent;
        }
        parts.reverse();
        Ok(ArcStr::from(parts.join(".")))
    }

    /// Looks up a library by its hierarchical name.
    pub fn library_by_hierarchical_name(&self, name: &str) -> Option<LibraryId> {
        let mut parts = name.split('.');
        let mut id = *self.roots.get(parts.next()?)?;
        for part in parts {
            id = self.libraries.get(id)?.library_named(part)?;
        }
        Some(id)
    }

    /// Returns the root libraries.
    pub fn root_libraries(&self) -> impl Iterator<Item = LibraryId> + '_ {
        self.roots.values().copied()
    }

    /// Returns the cells of `lib` ordered so that every cell appears after
    /// the cells of `lib` it instantiates.
    ///
    /// Masters living in other libraries are not included.
    pub fn topological_order(&self, lib: LibraryId) -> Result<Vec<CellId>> {
        let mut state = IndexSet::new();
        for cell in self.library(lib)?.cells() {
            self.dfs_postorder(lib, cell, &mut state)?;
        }
        Ok(state.into_iter().collect())
    }

    fn dfs_postorder(
        &self,
        lib: LibraryId,
        id: CellId,
        state: &mut IndexSet<CellId>,
    ) -> Result<()> {
        if state.contains(&id) {
            return Ok(());
        }
        let cell = self.cell(id)?;
        for inst in cell.instances() {
            let master = self.instance(inst)?.master;
            if self.cell(master)?.library == lib {
                self.dfs_postorder(lib, master, state)?;
            }
        }
        state.insert(id);
        Ok(())
    }
}
