//! Occurrences: entities seen through an instantiation path.
//!
//! A [`Path`] is a sequence of instances, each placed inside the master of
//! the previous one, starting in some top cell. An [`Occurrence`] pairs an
//! entity of the last master with such a path. Net occurrences connected
//! through plugs form a *hyper-net*; its *root* occurrence is the one
//! closest to the top.

use std::sync::Arc;

use arcstr::ArcStr;
use geometry::prelude::*;
use indexmap::IndexSet;

use crate::instance::PlacementStatus;
use crate::{CellId, ComponentId, Database, Error, InstanceId, NetId, Result};

/// An instantiation path, from the top cell downwards.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Path(Arc<[InstanceId]>);

impl Default for Path {
    fn default() -> Self {
        Self::empty()
    }
}

impl Path {
    /// Creates a path from instances listed top-down.
    pub fn new(instances: impl Into<Vec<InstanceId>>) -> Self {
        Self(instances.into().into())
    }

    /// The empty path, designating the top cell itself.
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// Returns `true` for the empty path.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of instances on the path.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The instances of the path, top-down.
    #[inline]
    pub fn instances(&self) -> &[InstanceId] {
        &self.0
    }

    /// The deepest instance of the path.
    pub fn last(&self) -> Option<InstanceId> {
        self.0.last().copied()
    }

    /// Returns this path extended by `inst`.
    pub fn pushed(&self, inst: InstanceId) -> Self {
        let mut v = self.0.to_vec();
        v.push(inst);
        Self::new(v)
    }

    /// Returns this path without its deepest instance.
    pub fn popped(&self) -> Self {
        let n = self.0.len().saturating_sub(1);
        Self::new(&self.0[..n])
    }

    /// Returns `true` if `inst` is on the path.
    pub fn contains(&self, inst: InstanceId) -> bool {
        self.0.contains(&inst)
    }
}

/// An entity that can occur through a path.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Entity {
    /// A net.
    Net(NetId),
    /// An instance.
    Instance(InstanceId),
    /// A component.
    Component(ComponentId),
    /// The plug of `master_net` on `instance`.
    Plug {
        /// The instance carrying the plug.
        instance: InstanceId,
        /// The master net the plug stands for.
        master_net: NetId,
    },
}

/// An entity paired with the path through which it is seen.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Occurrence {
    /// The entity.
    pub entity: Entity,
    /// The path from the top cell to the cell owning `entity`.
    pub path: Path,
}

impl Occurrence {
    /// Creates an occurrence.
    pub fn new(entity: Entity, path: Path) -> Self {
        Self { entity, path }
    }
}

impl Database {
    /// Resolves a dot-separated list of instance names, starting in `cell`.
    pub fn path_by_names(&self, cell: CellId, names: &str) -> Result<Path> {
        let mut instances = Vec::new();
        let mut current = cell;
        for name in names.split('.').filter(|n| !n.is_empty()) {
            let inst = self
                .cell(current)?
                .instance_named(name)
                .ok_or(Error::UnknownInstance)?;
            current = self.instance(inst)?.master;
            instances.push(inst);
        }
        Ok(Path::new(instances))
    }

    /// The instance names of `path`, joined with dots.
    pub fn path_name(&self, path: &Path) -> Result<ArcStr> {
        let mut names = Vec::with_capacity(path.len());
        for &inst in path.instances() {
            names.push(self.instance(inst)?.name.clone());
        }
        Ok(names.join(".").into())
    }

    fn entity_name(&self, entity: &Entity) -> Result<ArcStr> {
        Ok(match *entity {
            Entity::Net(net) => self.net(net)?.name.clone(),
            Entity::Instance(inst) => self.instance(inst)?.name.clone(),
            Entity::Component(c) => {
                let c = self.component(c)?;
                arcstr::format!("{}:{}", self.net(c.net)?.name, c.kind.typename())
            }
            Entity::Plug {
                instance,
                master_net,
            } => arcstr::format!(
                "{}.{}",
                self.instance(instance)?.name,
                self.net(master_net)?.name
            ),
        })
    }

    /// The path name and entity name of `occurrence`, joined with a dot.
    pub fn occurrence_name(&self, occurrence: &Occurrence) -> Result<ArcStr> {
        let entity = self.entity_name(&occurrence.entity)?;
        if occurrence.path.is_empty() {
            return Ok(entity);
        }
        Ok(arcstr::format!(
            "{}.{}",
            self.path_name(&occurrence.path)?,
            entity
        ))
    }

    /// The transformation from the coordinates of the deepest master of
    /// `path` to the coordinates of the top cell.
    pub fn path_transformation(&self, path: &Path) -> Result<Transformation> {
        let mut tf = Transformation::identity();
        for &inst in path.instances() {
            tf = Transformation::cascade(tf, self.instance(inst)?.transformation);
        }
        Ok(tf)
    }

    /// Returns `true` if no instance of `path` is unplaced.
    pub fn is_placed_path(&self, path: &Path) -> Result<bool> {
        for &inst in path.instances() {
            if self.instance(inst)?.status == PlacementStatus::Unplaced {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Returns `true` if the hyper-net walk does not enter `cell`.
    pub(crate) fn is_netlist_leaf(&self, cell: CellId) -> Result<bool> {
        let c = self.cell(cell)?;
        Ok(c.flags.terminal_netlist || c.is_terminal())
    }

    /// Returns the root occurrence of every hyper-net of `cell`.
    ///
    /// Every net of `cell` is a root. Below it, a net is a root if it is
    /// internal to its cell, or external but left unconnected by the
    /// instance leading to it. The walk does not enter terminal masters.
    /// Flattening proxies are not roots.
    pub fn hyper_net_root_occurrences(&self, cell: CellId) -> Result<Vec<Occurrence>> {
        let mut roots = Vec::new();
        for net in self.cell(cell)?.nets() {
            if !self.net(net)?.is_deep() {
                roots.push(Occurrence::new(Entity::Net(net), Path::empty()));
            }
        }
        self.collect_roots(cell, &Path::empty(), &mut roots)?;
        Ok(roots)
    }

    fn collect_roots(&self, cell: CellId, path: &Path, roots: &mut Vec<Occurrence>) -> Result<()> {
        for inst in self.cell(cell)?.instances() {
            let i = self.instance(inst)?;
            if self.is_netlist_leaf(i.master)? {
                continue;
            }
            let sub = path.pushed(inst);
            for net in self.cell(i.master)?.nets() {
                let n = self.net(net)?;
                if n.is_deep() {
                    continue;
                }
                if !n.external || i.plug_net(net).is_none() {
                    roots.push(Occurrence::new(Entity::Net(net), sub.clone()));
                }
            }
            self.collect_roots(i.master, &sub, roots)?;
        }
        Ok(())
    }

    /// Returns the plug occurrences, on terminal masters, reached by the
    /// hyper-net rooted at `root`.
    ///
    /// `root` must be a net occurrence.
    pub fn terminal_plug_occurrences(&self, root: &Occurrence) -> Result<Vec<Occurrence>> {
        let Entity::Net(net) = root.entity else {
            return Ok(Vec::new());
        };
        let mut plugs = Vec::new();
        let mut visited = IndexSet::new();
        self.collect_terminal_plugs(net, &root.path, &mut plugs, &mut visited)?;
        Ok(plugs)
    }

    fn collect_terminal_plugs(
        &self,
        net: NetId,
        path: &Path,
        plugs: &mut Vec<Occurrence>,
        visited: &mut IndexSet<(NetId, Path)>,
    ) -> Result<()> {
        if !visited.insert((net, path.clone())) {
            return Ok(());
        }
        let cell = self.net(net)?.cell;
        for inst in self.cell(cell)?.instances() {
            let i = self.instance(inst)?;
            for (master_net, connected) in i.plugs() {
                if connected != Some(net) {
                    continue;
                }
                if self.is_netlist_leaf(i.master)? {
                    plugs.push(Occurrence::new(
                        Entity::Plug {
                            instance: inst,
                            master_net,
                        },
                        path.clone(),
                    ));
                } else {
                    self.collect_terminal_plugs(master_net, &path.pushed(inst), plugs, visited)?;
                }
            }
        }
        Ok(())
    }

    /// Walks up from `net`, seen through `path`, to the root occurrence of
    /// its hyper-net.
    pub fn root_occurrence(&self, net: NetId, path: &Path) -> Result<Occurrence> {
        let (mut net, mut path) = (net, path.clone());
        while let Some(inst) = path.last() {
            match self.instance(inst)?.plug_net(net) {
                Some(up) => {
                    net = up;
                    path = path.popped();
                }
                None => break,
            }
        }
        Ok(Occurrence::new(Entity::Net(net), path))
    }

    /// Returns the net of `cell` carrying the terminals of the hyper-net
    /// that `leaf_net`, seen through `path`, belongs to.
    ///
    /// That is the top-level net itself when the hyper-net reaches the top,
    /// and the flattening proxy otherwise. `None` if `cell` holds no proxy
    /// for the hyper-net.
    pub fn deep_net(&self, cell: CellId, path: &Path, leaf_net: NetId) -> Result<Option<NetId>> {
        let owner = match path.last() {
            Some(inst) => self.instance(inst)?.master,
            None => cell,
        };
        if self.net(leaf_net)?.cell != owner {
            return Err(Error::ForeignEntity {
                what: "net",
                cell: self.cell_name(owner),
            });
        }
        let root = self.root_occurrence(leaf_net, path)?;
        if root.path.is_empty() {
            return Ok(match root.entity {
                Entity::Net(net) => Some(net),
                _ => None,
            });
        }
        Ok(self.cell(cell)?.deep_nets.get(&root).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_transformation_cascades_top_down() {
        let mut db = Database::new();
        let lib = db.create_library(None, "work").unwrap();
        let top = db.create_cell(lib, "top").unwrap();
        let mid = db.create_cell(lib, "mid").unwrap();
        let leaf = db.create_cell(lib, "leaf").unwrap();
        let m0 = db
            .create_instance(
                top,
                "m0",
                mid,
                Transformation::new(Point::new(100, 0), Orientation::R90),
                PlacementStatus::Placed,
            )
            .unwrap();
        let l0 = db
            .create_instance(
                mid,
                "l0",
                leaf,
                Transformation::translate(10, 0),
                PlacementStatus::Placed,
            )
            .unwrap();
        let path = db.path_by_names(top, "m0.l0").unwrap();
        assert_eq!(path.instances(), &[m0, l0]);
        assert_eq!(db.path_name(&path).unwrap(), "m0.l0");

        // (1, 0) in leaf -> (11, 0) in mid -> rotated (0, 11) + (100, 0) in top.
        let tf = db.path_transformation(&path).unwrap();
        assert_eq!(tf.apply(Point::new(1, 0)), Point::new(100, 11));
    }

    #[test]
    fn roots_stop_at_connected_plugs() {
        let mut db = Database::new();
        let lib = db.create_library(None, "work").unwrap();
        let top = db.create_cell(lib, "top").unwrap();
        let mid = db.create_cell(lib, "mid").unwrap();
        let leaf = db.create_cell(lib, "leaf").unwrap();

        let leaf_a = db.create_net(leaf, "a").unwrap();
        db.set_net_external(leaf_a, true).unwrap();
        let mid_io = db.create_net(mid, "io").unwrap();
        db.set_net_external(mid_io, true).unwrap();
        let mid_local = db.create_net(mid, "local").unwrap();
        let top_n = db.create_net(top, "n").unwrap();

        let l0 = db
            .create_instance(mid, "l0", leaf, Transformation::identity(), PlacementStatus::Placed)
            .unwrap();
        let l1 = db
            .create_instance(mid, "l1", leaf, Transformation::identity(), PlacementStatus::Placed)
            .unwrap();
        db.connect_plug(l0, leaf_a, Some(mid_io)).unwrap();
        db.connect_plug(l1, leaf_a, Some(mid_local)).unwrap();
        let m0 = db
            .create_instance(top, "m0", mid, Transformation::identity(), PlacementStatus::Placed)
            .unwrap();
        db.connect_plug(m0, mid_io, Some(top_n)).unwrap();

        let roots = db.hyper_net_root_occurrences(top).unwrap();
        let names: Vec<_> = roots
            .iter()
            .map(|occ| db.occurrence_name(occ).unwrap())
            .collect();
        assert_eq!(names, vec!["n", "m0.local"]);

        let plugs = db.terminal_plug_occurrences(&roots[0]).unwrap();
        assert_eq!(plugs.len(), 1);
        assert_eq!(db.occurrence_name(&plugs[0]).unwrap(), "m0.l0.a");

        let path = Path::new(vec![m0, l0]);
        assert_eq!(db.deep_net(top, &path, leaf_a).unwrap(), Some(top_n));
        let root = db.root_occurrence(leaf_a, &Path::new(vec![m0, l1])).unwrap();
        assert_eq!(root, Occurrence::new(Entity::Net(mid_local), Path::new(vec![m0])));
    }
}
