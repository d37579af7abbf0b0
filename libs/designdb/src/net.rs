//! Nets and their components.

use arcstr::ArcStr;
use geometry::prelude::*;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::cell::{CellEvent, Leaf};
use crate::occurrence::Occurrence;
use crate::{CellId, ComponentId, Database, Error, InstanceId, NetId, Result};

/// The electrical role of a net.
#[derive(Debug, Default, Copy, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetType {
    /// An ordinary signal.
    #[default]
    Logical,
    /// A clock.
    Clock,
    /// A power supply.
    Power,
    /// A ground supply.
    Ground,
    /// A routing obstruction.
    Blockage,
}

impl NetType {
    /// Returns `true` for power and ground nets.
    pub fn is_supply(&self) -> bool {
        matches!(self, Self::Power | Self::Ground)
    }
}

/// The signal direction of an external net.
#[derive(Debug, Default, Copy, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Unspecified.
    #[default]
    Undefined,
    /// An input.
    In,
    /// An output.
    Out,
    /// A bidirectional signal.
    Inout,
}

/// A named electrical connection of a cell.
#[derive(Debug, Clone)]
pub struct Net {
    pub(crate) cell: CellId,
    pub(crate) name: ArcStr,
    pub(crate) net_type: NetType,
    pub(crate) direction: Direction,
    pub(crate) external: bool,
    pub(crate) global: bool,
    pub(crate) components: IndexSet<ComponentId>,
    /// For flattening proxies, the root occurrence of the proxied hyper-net.
    pub(crate) deep: Option<Occurrence>,
}

impl Net {
    /// The owning cell.
    #[inline]
    pub fn cell(&self) -> CellId {
        self.cell
    }

    /// The net name.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The electrical role of the net.
    #[inline]
    pub fn net_type(&self) -> NetType {
        self.net_type
    }

    /// The signal direction.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns `true` if the net is visible from instances of its cell.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.external
    }

    /// Returns `true` if the net connects by name across the hierarchy.
    #[inline]
    pub fn is_global(&self) -> bool {
        self.global
    }

    /// Returns `true` if this net is a flattening proxy.
    #[inline]
    pub fn is_deep(&self) -> bool {
        self.deep.is_some()
    }

    /// The root occurrence proxied by a flattening proxy.
    pub fn deep_occurrence(&self) -> Option<&Occurrence> {
        self.deep.as_ref()
    }

    /// Iterates over the components of the net.
    pub fn components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components.iter().copied()
    }
}

/// The geometry of a [`Component`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ComponentKind {
    /// A rectangular via centered on `(x, y)`.
    Contact {
        /// Center x-coordinate.
        x: Unit,
        /// Center y-coordinate.
        y: Unit,
        /// Width.
        width: Unit,
        /// Height.
        height: Unit,
    },
    /// A horizontal wire segment.
    Horizontal {
        /// Axis y-coordinate.
        y: Unit,
        /// Wire width.
        width: Unit,
        /// Source x-coordinate.
        dx_source: Unit,
        /// Target x-coordinate.
        dx_target: Unit,
    },
    /// A vertical wire segment.
    Vertical {
        /// Axis x-coordinate.
        x: Unit,
        /// Wire width.
        width: Unit,
        /// Source y-coordinate.
        dy_source: Unit,
        /// Target y-coordinate.
        dy_target: Unit,
    },
    /// A rectangular pad.
    Pad {
        /// The pad area.
        rect: Rect,
    },
    /// A physical pin of an external net.
    Pin {
        /// The pin area.
        rect: Rect,
    },
    /// A terminal materialized by net flattening.
    RoutingPad {
        /// The occurrence the pad stands for.
        occurrence: Occurrence,
        /// The occurrence's area in the flattened cell.
        rect: Rect,
    },
}

impl ComponentKind {
    /// The area covered by the component.
    pub fn bounding_box(&self) -> Rect {
        match *self {
            Self::Contact {
                x,
                y,
                width,
                height,
            } => Rect::from_sides(x - width / 2, y - height / 2, x + width / 2, y + height / 2),
            Self::Horizontal {
                y,
                width,
                dx_source,
                dx_target,
            } => Rect::from_sides(dx_source, y - width / 2, dx_target, y + width / 2),
            Self::Vertical {
                x,
                width,
                dy_source,
                dy_target,
            } => Rect::from_sides(x - width / 2, dy_source, x + width / 2, dy_target),
            Self::Pad { rect } | Self::Pin { rect } | Self::RoutingPad { rect, .. } => rect,
        }
    }

    /// The typename used for this kind of component.
    pub fn typename(&self) -> &'static str {
        match self {
            Self::Contact { .. } => "Contact",
            Self::Horizontal { .. } => "Horizontal",
            Self::Vertical { .. } => "Vertical",
            Self::Pad { .. } => "Pad",
            Self::Pin { .. } => "Pin",
            Self::RoutingPad { .. } => "RoutingPad",
        }
    }

    /// Returns `true` for terminals materialized by net flattening.
    #[inline]
    pub fn is_routing_pad(&self) -> bool {
        matches!(self, Self::RoutingPad { .. })
    }
}

/// A piece of geometry belonging to a net.
#[derive(Debug, Clone)]
pub struct Component {
    pub(crate) net: NetId,
    pub(crate) layer: ArcStr,
    pub(crate) kind: ComponentKind,
}

impl Component {
    /// The owning net.
    #[inline]
    pub fn net(&self) -> NetId {
        self.net
    }

    /// The layer name.
    #[inline]
    pub fn layer(&self) -> &ArcStr {
        &self.layer
    }

    /// The component's geometry.
    #[inline]
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// The area covered by the component.
    #[inline]
    pub fn bounding_box(&self) -> Rect {
        self.kind.bounding_box()
    }
}

impl Database {
    /// Creates a logical, internal net in `cell`.
    ///
    /// Fails if `name` is empty or already used by a net of `cell`.
    pub fn create_net(&mut self, cell: CellId, name: impl Into<ArcStr>) -> Result<NetId> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyName { kind: "net" });
        }
        let c = self.cell(cell)?;
        if c.nets.contains_key(&name) {
            return Err(Error::DuplicateName {
                kind: "net",
                name,
                scope: c.name.clone(),
            });
        }
        let id = self.nets.insert(Net {
            cell,
            name: name.clone(),
            net_type: NetType::default(),
            direction: Direction::default(),
            external: false,
            global: false,
            components: IndexSet::new(),
            deep: None,
        });
        self.cell_mut(cell)?.nets.insert(name, id);
        self.notify(cell, CellEvent::Changed);
        Ok(id)
    }

    /// Sets the electrical role of a net.
    pub fn set_net_type(&mut self, net: NetId, net_type: NetType) -> Result<()> {
        self.net_mut(net)?.net_type = net_type;
        Ok(())
    }

    /// Sets the signal direction of a net.
    pub fn set_net_direction(&mut self, net: NetId, direction: Direction) -> Result<()> {
        self.net_mut(net)?.direction = direction;
        Ok(())
    }

    /// Marks a net as global.
    pub fn set_net_global(&mut self, net: NetId, global: bool) -> Result<()> {
        self.net_mut(net)?.global = global;
        Ok(())
    }

    /// Makes a net visible, or invisible, from instances of its cell.
    ///
    /// Every instance of the cell gains an unconnected plug for a net that
    /// becomes external, and loses its plug for a net that becomes internal.
    pub fn set_net_external(&mut self, net: NetId, external: bool) -> Result<()> {
        let n = self.net_mut(net)?;
        if n.external == external {
            return Ok(());
        }
        n.external = external;
        let cell = n.cell;
        let slaves: Vec<InstanceId> = self.cell(cell)?.slave_instances().collect();
        for inst in slaves {
            let plugs = &mut self.instance_mut(inst)?.plugs;
            if external {
                plugs.insert(net, None);
            } else {
                plugs.shift_remove(&net);
            }
        }
        Ok(())
    }

    /// Destroys a net and its components.
    ///
    /// Plugs connected to the net are disconnected.
    pub fn destroy_net(&mut self, net: NetId) -> Result<()> {
        self.set_net_external(net, false)?;
        let n = self.net(net)?;
        let cell = n.cell;
        let components: Vec<ComponentId> = n.components().collect();
        for component in components {
            self.destroy_component(component)?;
        }

        let instances: Vec<InstanceId> = self.cell(cell)?.instances().collect();
        for inst in instances {
            for plug in self.instance_mut(inst)?.plugs.values_mut() {
                if *plug == Some(net) {
                    *plug = None;
                }
            }
        }

        let n = self.nets.remove(net).ok_or(Error::UnknownNet)?;
        let c = self.cell_mut(cell)?;
        c.nets.shift_remove(&n.name);
        if let Some(occurrence) = n.deep {
            c.deep_nets.shift_remove(&occurrence);
        }
        self.notify(cell, CellEvent::Changed);
        Ok(())
    }

    /// Adds a component to `net`.
    pub fn create_component(
        &mut self,
        net: NetId,
        layer: impl Into<ArcStr>,
        kind: ComponentKind,
    ) -> Result<ComponentId> {
        let cell = self.net(net)?.cell;
        let rect = kind.bounding_box();
        let id = self.components.insert(Component {
            net,
            layer: layer.into(),
            kind,
        });
        self.net_mut(net)?.components.insert(id);
        self.cell_mut(cell)?
            .quadtree
            .insert(Leaf::Component(id), rect);
        self.fit(cell, rect)?;
        Ok(id)
    }

    /// Destroys a component.
    pub fn destroy_component(&mut self, component: ComponentId) -> Result<()> {
        let c = self
            .components
            .remove(component)
            .ok_or(Error::UnknownComponent)?;
        let n = self.net_mut(c.net)?;
        n.components.shift_remove(&component);
        let cell = n.cell;
        self.cell_mut(cell)?
            .quadtree
            .remove(Leaf::Component(component));
        self.unfit(cell, c.bounding_box())
    }

    /// Returns the routing pads of `net`.
    pub fn routing_pads(&self, net: NetId) -> Result<Vec<ComponentId>> {
        let n = self.net(net)?;
        Ok(n
            .components()
            .filter(|&c| {
                self.components
                    .get(c)
                    .is_some_and(|c| c.kind.is_routing_pad())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_net_names_are_rejected() {
        let mut db = Database::new();
        let lib = db.create_library(None, "work").unwrap();
        let cell = db.create_cell(lib, "cell").unwrap();
        let a = db.create_net(cell, "a").unwrap();
        let err = db.create_net(cell, "a").unwrap_err();
        assert!(err.is_structural());
        assert_eq!(db.cell(cell).unwrap().net_named("a"), Some(a));
    }

    #[test]
    fn components_update_bounding_box() {
        let mut db = Database::new();
        let lib = db.create_library(None, "work").unwrap();
        let cell = db.create_cell(lib, "cell").unwrap();
        let net = db.create_net(cell, "a").unwrap();
        let wire = db
            .create_component(
                net,
                "metal1",
                ComponentKind::Horizontal {
                    y: 10,
                    width: 4,
                    dx_source: 0,
                    dx_target: 100,
                },
            )
            .unwrap();
        db.create_component(
            net,
            "via1",
            ComponentKind::Contact {
                x: 50,
                y: 10,
                width: 6,
                height: 6,
            },
        )
        .unwrap();
        assert_eq!(db.bounding_box(cell).unwrap(), Rect::from_sides(0, 7, 100, 13));

        db.destroy_component(wire).unwrap();
        assert_eq!(db.bounding_box(cell).unwrap(), Rect::from_sides(47, 7, 53, 13));

        db.destroy_net(net).unwrap();
        assert!(db.bounding_box(cell).unwrap().is_empty());
        assert_eq!(db.cell(cell).unwrap().net_named("a"), None);
    }
}
