//! Cell cloning and uniquification.
//!
//! Clones of a cell share a [`RelationKind::Uniquify`] relation with it, so
//! that the family can be enumerated from the master and traced back from
//! any clone. Clones are named `<master>_uNN`.

use tracing::{span, Level};

use crate::instance::PlacementStatus;
use crate::net::{ComponentKind, NetType};
use crate::relation::RelationKind;
use crate::{CellId, Database, InstanceId, NetId, Result};

impl Database {
    /// Sets the `placed` flag of `cell` if none of its instances is unplaced.
    ///
    /// Returns the computed value. An unplaced instance never clears a flag
    /// that is already set.
    pub fn update_placed_flag(&mut self, cell: CellId) -> Result<bool> {
        let mut placed = true;
        for inst in self.cell(cell)?.instances() {
            if self.instance(inst)?.status == PlacementStatus::Unplaced {
                placed = false;
                break;
            }
        }
        if placed {
            self.cell_mut(cell)?.flags.placed = true;
        }
        Ok(placed)
    }

    /// Creates an independent copy of `cell` in the same library.
    ///
    /// Nets (flattening proxies excepted), their components and the
    /// instances of `cell` are copied. The clone is marked placed if every
    /// copied instance is placed.
    pub fn get_clone(&mut self, cell: CellId) -> Result<CellId> {
        let mut db = self.update_session();

        let rel = match db.relation(cell, RelationKind::Uniquify)? {
            Some(rel) => rel,
            None => db.create_relation(cell, RelationKind::Uniquify)?,
        };
        let name = db.next_unique_name(rel)?;
        let c = db.cell(cell)?;
        let (lib, flags, ab) = (c.library, c.flags, c.abutment_box);
        let nets: Vec<NetId> = c.nets().collect();
        let instances: Vec<InstanceId> = c.instances().collect();

        let clone = db.create_cell(lib, name)?;
        db.put_relation(clone, rel)?;
        db.set_terminal_netlist(clone, flags.terminal_netlist)?;
        db.set_pad(clone, flags.pad)?;
        db.set_abutment_box(clone, ab)?;

        for net in nets {
            if !db.net(net)?.is_deep() {
                db.clone_net(net, clone)?;
            }
        }
        let mut placed = true;
        for inst in instances {
            let copy = db.clone_instance(inst, clone)?;
            if db.instance(copy)?.status == PlacementStatus::Unplaced {
                placed = false;
            }
        }
        db.cell_mut(clone)?.flags.placed = placed;

        tracing::event!(
            Level::DEBUG,
            cell = %db.cell_name(cell),
            clone = %db.cell_name(clone),
            "cloned cell"
        );
        Ok(clone)
    }

    fn clone_net(&mut self, net: NetId, into: CellId) -> Result<NetId> {
        let n = self.net(net)?;
        let (name, net_type, direction, external, global) =
            (n.name.clone(), n.net_type, n.direction, n.external, n.global);
        let components: Vec<_> = n
            .components()
            .filter_map(|id| self.components.get(id))
            .filter(|c| !c.kind.is_routing_pad())
            .map(|c| (c.layer.clone(), c.kind.clone()))
            .collect();

        let copy = self.create_net(into, name)?;
        if net_type != NetType::default() {
            self.set_net_type(copy, net_type)?;
        }
        self.set_net_direction(copy, direction)?;
        self.set_net_global(copy, global)?;
        self.set_net_external(copy, external)?;
        for (layer, kind) in components {
            self.create_component(copy, layer, kind)?;
        }
        Ok(copy)
    }

    fn clone_instance(&mut self, inst: InstanceId, into: CellId) -> Result<InstanceId> {
        let i = self.instance(inst)?;
        let (name, master, tf, status) = (i.name.clone(), i.master, i.transformation, i.status);
        let mut connections = Vec::new();
        for (master_net, net) in i.plugs() {
            if let Some(net) = net {
                connections.push((master_net, self.net(net)?.name.clone()));
            }
        }

        let copy = self.create_instance(into, name, master, tf, status)?;
        for (master_net, net_name) in connections {
            let net = self.cell(into)?.net_named(&net_name);
            if net.is_some() {
                self.connect_plug(copy, master_net, net)?;
            }
        }
        Ok(copy)
    }

    /// Gives `inst` its own clone of its master.
    ///
    /// Returns `None`, leaving the instance untouched, if the master is
    /// already used by `inst` alone.
    pub fn uniquify_instance(&mut self, inst: InstanceId) -> Result<Option<CellId>> {
        let master = self.instance(inst)?.master;
        if self.cell(master)?.is_unique() {
            tracing::event!(
                Level::DEBUG,
                master = %self.cell_name(master),
                "master is already unique"
            );
            return Ok(None);
        }
        let clone = self.get_clone(master)?;
        self.set_master_cell(inst, clone)?;
        Ok(Some(clone))
    }

    /// Replaces shared, inconsistently placed masters of the instances of
    /// `cell` by per-instance clones, recursing `depth` more levels.
    ///
    /// Flattening proxies of `cell` are destroyed first. A master qualifies
    /// when it is not terminal, is used by more than one instance and is not
    /// placed. Returns the number of clones created.
    pub fn uniquify(&mut self, cell: CellId, depth: usize) -> Result<usize> {
        let span = span!(Level::INFO, "uniquify", cell = %self.cell_name(cell), depth);
        let _guard = span.enter();

        let deep: Vec<NetId> = self.cell(cell)?.deep_nets.values().copied().collect();
        for net in deep {
            self.destroy_net(net)?;
        }
        self.cell_mut(cell)?.flags.flattened_nets = false;

        let mut masters = indexmap::IndexSet::new();
        let mut candidates = Vec::new();
        let instances: Vec<InstanceId> = self.cell(cell)?.instances().collect();
        for inst in instances {
            let master = self.instance(inst)?.master;
            if self.cell(master)?.is_terminal() {
                continue;
            }
            if masters.insert(master) {
                self.update_placed_flag(master)?;
            }
            let m = self.cell(master)?;
            if m.slave_instances.len() > 1 && !m.flags.placed {
                candidates.push(inst);
            }
        }

        let mut clones = 0;
        for inst in candidates {
            if let Some(clone) = self.uniquify_instance(inst)? {
                masters.insert(clone);
                clones += 1;
            }
        }

        if depth > 0 {
            for master in masters {
                clones += self.uniquify(master, depth - 1)?;
            }
        }
        Ok(clones)
    }
}
