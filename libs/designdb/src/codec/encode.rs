//! JSON encoding.

use geometry::prelude::*;
use serde_json::{json, Value};

use super::registry::Typename;
use crate::cell::Property;
use crate::net::ComponentKind;
use crate::relation::RelationState;
use crate::{CellId, ComponentId, Database, InstanceId, LibraryId, NetId, RelationId, Result};

pub(crate) fn encode_rect(rect: &Rect) -> Value {
    json!({
        "@typename": Typename::Box.as_str(),
        "_xMin": rect.x_min(),
        "_yMin": rect.y_min(),
        "_xMax": rect.x_max(),
        "_yMax": rect.y_max(),
    })
}

pub(crate) fn encode_transformation(tf: &Transformation) -> Result<Value> {
    Ok(json!({
        "@typename": Typename::Transformation.as_str(),
        "_tx": tf.offset.x,
        "_ty": tf.offset.y,
        "_orientation": serde_json::to_value(tf.orientation)?,
    }))
}

impl Database {
    pub(crate) fn encode_library_value(&self, lib: LibraryId) -> Result<Value> {
        let mut cells = Vec::new();
        for cell in self.topological_order(lib)? {
            cells.push(self.encode_cell_value(cell)?);
        }
        Ok(json!({
            "@typename": Typename::Library.as_str(),
            "_name": self.library_hierarchical_name(lib)?.as_str(),
            "+cellList": cells,
        }))
    }

    pub(crate) fn encode_cell_value(&self, cell: CellId) -> Result<Value> {
        let c = self.cell(cell)?;

        let mut nets = Vec::new();
        for net in c.nets() {
            if !self.net(net)?.is_deep() {
                nets.push(self.encode_net(net)?);
            }
        }
        let mut instances = Vec::new();
        for inst in c.instances() {
            instances.push(self.encode_instance(inst)?);
        }
        let mut properties = Vec::new();
        for (name, property) in c.properties() {
            let value = match property {
                Property::Annotation(value) => json!({
                    "@typename": Typename::Annotation.as_str(),
                    "_name": name.as_str(),
                    "_value": value.as_str(),
                }),
                Property::Relation(rel) => self.encode_relation(cell, *rel)?,
            };
            properties.push(value);
        }

        Ok(json!({
            "@typename": Typename::Cell.as_str(),
            "_library": self.library_hierarchical_name(c.library)?.as_str(),
            "_name": c.name.as_str(),
            "_abutmentBox": encode_rect(&c.abutment_box),
            "_terminalNetlist": c.flags.terminal_netlist,
            "_pad": c.flags.pad,
            "_placed": c.flags.placed,
            "+netMap": nets,
            "+instanceMap": instances,
            "+propertySet": properties,
        }))
    }

    /// The full record from the master owner, a back-reference otherwise.
    fn encode_relation(&self, cell: CellId, rel: RelationId) -> Result<Value> {
        let master = self.relation_master(rel)?;
        let relation = &self.relations[rel];
        if master != cell {
            let typename = match relation.state {
                RelationState::Uniquify(_) => Typename::UniquifyReference,
                RelationState::Slaveds => Typename::SlavedsReference,
            };
            return Ok(json!({
                "@typename": typename.as_str(),
                "_masterOwner": self.cell_hierarchical_name(master)?.as_str(),
            }));
        }
        let refcount = relation.owners.len();
        Ok(match relation.state {
            RelationState::Uniquify(duplicates) => json!({
                "@typename": Typename::UniquifyRelation.as_str(),
                "_refcount": refcount,
                "_duplicates": duplicates.get(),
            }),
            RelationState::Slaveds => json!({
                "@typename": Typename::SlavedsRelation.as_str(),
                "_refcount": refcount,
            }),
        })
    }

    fn encode_net(&self, net: NetId) -> Result<Value> {
        let n = self.net(net)?;
        let mut components = Vec::new();
        for id in n.components() {
            if let Some(value) = self.encode_component(id)? {
                components.push(value);
            }
        }
        Ok(json!({
            "@typename": Typename::Net.as_str(),
            "_name": n.name.as_str(),
            "_type": serde_json::to_value(n.net_type)?,
            "_direction": serde_json::to_value(n.direction)?,
            "_isExternal": n.external,
            "_isGlobal": n.global,
            "+componentSet": components,
        }))
    }

    /// Routing pads are derived by flattening and are not encoded.
    fn encode_component(&self, id: ComponentId) -> Result<Option<Value>> {
        let c = self.component(id)?;
        let layer = c.layer.as_str();
        Ok(Some(match c.kind {
            ComponentKind::Contact {
                x,
                y,
                width,
                height,
            } => json!({
                "@typename": Typename::Contact.as_str(),
                "_layer": layer,
                "_x": x,
                "_y": y,
                "_width": width,
                "_height": height,
            }),
            ComponentKind::Horizontal {
                y,
                width,
                dx_source,
                dx_target,
            } => json!({
                "@typename": Typename::Horizontal.as_str(),
                "_layer": layer,
                "_y": y,
                "_width": width,
                "_dxSource": dx_source,
                "_dxTarget": dx_target,
            }),
            ComponentKind::Vertical {
                x,
                width,
                dy_source,
                dy_target,
            } => json!({
                "@typename": Typename::Vertical.as_str(),
                "_layer": layer,
                "_x": x,
                "_width": width,
                "_dySource": dy_source,
                "_dyTarget": dy_target,
            }),
            ComponentKind::Pad { rect } => json!({
                "@typename": Typename::Pad.as_str(),
                "_layer": layer,
                "_boundingBox": encode_rect(&rect),
            }),
            ComponentKind::Pin { rect } => json!({
                "@typename": Typename::Pin.as_str(),
                "_layer": layer,
                "_boundingBox": encode_rect(&rect),
            }),
            ComponentKind::RoutingPad { .. } => return Ok(None),
        }))
    }

    fn encode_instance(&self, inst: InstanceId) -> Result<Value> {
        let i = self.instance(inst)?;
        let mut plugs = Vec::new();
        for (master_net, net) in i.plugs() {
            let net = match net {
                Some(net) => Value::from(self.net(net)?.name.as_str()),
                None => Value::Null,
            };
            plugs.push(json!({
                "@typename": Typename::Plug.as_str(),
                "_masterNet": self.net(master_net)?.name.as_str(),
                "_net": net,
            }));
        }
        Ok(json!({
            "@typename": Typename::Instance.as_str(),
            "_name": i.name.as_str(),
            "_masterCell": self.cell_hierarchical_name(i.master)?.as_str(),
            "_transformation": encode_transformation(&i.transformation)?,
            "_placementStatus": serde_json::to_value(i.status)?,
            "+plugMap": plugs,
        }))
    }
}
