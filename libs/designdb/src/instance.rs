//! Instances: placements of a master cell inside another cell.

use arcstr::ArcStr;
use geometry::prelude::*;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cell::{CellEvent, Leaf};
use crate::{CellId, Database, Error, InstanceId, NetId, Result};

/// How far the placement of an instance has progressed.
#[derive(Debug, Default, Copy, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacementStatus {
    /// Not placed yet; the transformation is meaningless.
    #[default]
    Unplaced,
    /// Placed, may be moved.
    Placed,
    /// Placed and must not be moved.
    Fixed,
}

/// A placement of a master cell inside a cell.
#[derive(Debug, Clone)]
pub struct Instance {
    pub(crate) cell: CellId,
    pub(crate) master: CellId,
    pub(crate) name: ArcStr,
    pub(crate) transformation: Transformation,
    pub(crate) status: PlacementStatus,
    /// One plug per external net of the master, with the net of `cell` it
    /// connects to.
    pub(crate) plugs: IndexMap<NetId, Option<NetId>>,
}

impl Instance {
    /// The cell the instance is placed in.
    #[inline]
    pub fn cell(&self) -> CellId {
        self.cell
    }

    /// The instantiated cell.
    #[inline]
    pub fn master(&self) -> CellId {
        self.master
    }

    /// The instance name.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The placement transformation.
    #[inline]
    pub fn transformation(&self) -> Transformation {
        self.transformation
    }

    /// The placement status.
    #[inline]
    pub fn placement_status(&self) -> PlacementStatus {
        self.status
    }

    /// Iterates over `(master net, connected net)` pairs.
    pub fn plugs(&self) -> impl Iterator<Item = (NetId, Option<NetId>)> + '_ {
        self.plugs.iter().map(|(k, v)| (*k, *v))
    }

    /// Returns the net connected to the plug of `master_net`.
    pub fn plug_net(&self, master_net: NetId) -> Option<NetId> {
        self.plugs.get(&master_net).copied().flatten()
    }
}

impl Database {
    /// Places `master` inside `cell`.
    ///
    /// Fails if `name` is empty or already used by an instance of `cell`,
    /// or if `cell` would (transitively) instantiate itself.
    pub fn create_instance(
        &mut self,
        cell: CellId,
        name: impl Into<ArcStr>,
        master: CellId,
        transformation: Transformation,
        status: PlacementStatus,
    ) -> Result<InstanceId> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyName { kind: "instance" });
        }
        let c = self.cell(cell)?;
        if c.instances.contains_key(&name) {
            return Err(Error::DuplicateName {
                kind: "instance",
                name,
                scope: c.name.clone(),
            });
        }
        if master == cell || self.is_called_by(cell, master)? {
            return Err(Error::CyclicInstantiation {
                owner: self.cell_name(cell),
                master: self.cell_name(master),
            });
        }

        let plugs = self
            .cell(master)?
            .nets()
            .filter(|&n| self.nets.get(n).is_some_and(|n| n.external))
            .map(|n| (n, None))
            .collect();
        let id = self.instances.insert(Instance {
            cell,
            master,
            name: name.clone(),
            transformation,
            status,
            plugs,
        });
        self.cell_mut(cell)?.instances.insert(name, id);
        self.cell_mut(master)?.slave_instances.insert(id);

        let rect = transformation.apply_rect(&self.bounding_box(master)?);
        self.cell_mut(cell)?
            .quadtree
            .insert(Leaf::Instance(id), rect);
        self.fit(cell, rect)?;
        self.notify(cell, CellEvent::Changed);
        Ok(id)
    }

    /// Removes an instance from its cell.
    pub fn destroy_instance(&mut self, inst: InstanceId) -> Result<()> {
        let i = self.instances.remove(inst).ok_or(Error::UnknownInstance)?;
        if let Some(master) = self.cells.get_mut(i.master) {
            master.slave_instances.shift_remove(&inst);
        }
        let c = self.cell_mut(i.cell)?;
        c.instances.shift_remove(&i.name);
        c.stale_leaves.shift_remove(&inst);
        let rect = c.quadtree.remove(Leaf::Instance(inst));
        if let Some(rect) = rect {
            self.unfit(i.cell, rect)?;
        }
        self.notify(i.cell, CellEvent::Changed);
        Ok(())
    }

    /// Moves an instance.
    pub fn set_transformation(
        &mut self,
        inst: InstanceId,
        transformation: Transformation,
    ) -> Result<()> {
        let i = self.instance_mut(inst)?;
        if i.transformation == transformation {
            return Ok(());
        }
        i.transformation = transformation;
        let (cell, master) = (i.cell, i.master);
        self.replace_instance_leaf(cell, inst, master, transformation)
    }

    /// Translates an instance by `offset`.
    pub fn translate_instance(&mut self, inst: InstanceId, offset: Point) -> Result<()> {
        let mut tf = self.instance(inst)?.transformation;
        tf.translate_by(offset);
        self.set_transformation(inst, tf)
    }

    /// Sets the placement status of an instance.
    pub fn set_placement_status(&mut self, inst: InstanceId, status: PlacementStatus) -> Result<()> {
        self.instance_mut(inst)?.status = status;
        Ok(())
    }

    /// Connects the plug of `master_net` on `inst` to `net`, or disconnects it.
    ///
    /// `net` must belong to the cell `inst` is placed in, and `master_net`
    /// must be external in the master.
    pub fn connect_plug(
        &mut self,
        inst: InstanceId,
        master_net: NetId,
        net: Option<NetId>,
    ) -> Result<()> {
        let i = self.instance(inst)?;
        if let Some(net) = net {
            if self.net(net)?.cell != i.cell {
                return Err(Error::ForeignEntity {
                    what: "net",
                    cell: self.cell_name(i.cell),
                });
            }
        }
        if !i.plugs.contains_key(&master_net) {
            let mn = self.net(master_net)?;
            if mn.cell != i.master {
                return Err(Error::ForeignEntity {
                    what: "master net",
                    cell: self.cell_name(i.master),
                });
            }
            return Err(Error::NotExternal {
                net: mn.name.clone(),
                master: self.cell_name(i.master),
            });
        }
        self.instance_mut(inst)?.plugs.insert(master_net, net);
        Ok(())
    }

    /// Replaces the master of an instance.
    ///
    /// Plugs are carried over by master net name; plugs whose net does not
    /// exist, or is not external, in the new master are dropped.
    pub fn set_master_cell(&mut self, inst: InstanceId, master: CellId) -> Result<()> {
        let i = self.instance(inst)?;
        let (cell, old, tf) = (i.cell, i.master, i.transformation);
        if old == master {
            return Ok(());
        }
        if master == cell || self.is_called_by(cell, master)? {
            return Err(Error::CyclicInstantiation {
                owner: self.cell_name(cell),
                master: self.cell_name(master),
            });
        }

        let mut connections = IndexMap::new();
        for (mn, net) in i.plugs() {
            connections.insert(self.net(mn)?.name.clone(), net);
        }
        let new_master = self.cell(master)?;
        let mut plugs = IndexMap::new();
        for mn in new_master.nets() {
            let n = self.net(mn)?;
            if n.external {
                plugs.insert(mn, connections.get(&n.name).copied().flatten());
            }
        }

        if let Some(c) = self.cells.get_mut(old) {
            c.slave_instances.shift_remove(&inst);
        }
        self.cell_mut(master)?.slave_instances.insert(inst);
        let i = self.instance_mut(inst)?;
        i.master = master;
        i.plugs = plugs;
        self.replace_instance_leaf(cell, inst, master, tf)?;
        self.notify(cell, CellEvent::Changed);
        Ok(())
    }

    fn replace_instance_leaf(
        &mut self,
        cell: CellId,
        inst: InstanceId,
        master: CellId,
        tf: Transformation,
    ) -> Result<()> {
        let rect = tf.apply_rect(&self.bounding_box(master)?);
        let c = self.cell_mut(cell)?;
        c.stale_leaves.shift_remove(&inst);
        let old = c.quadtree.get(Leaf::Instance(inst));
        c.quadtree.insert(Leaf::Instance(inst), rect);
        if let Some(old) = old {
            self.unfit(cell, old)?;
        }
        self.fit(cell, rect)
    }
}
