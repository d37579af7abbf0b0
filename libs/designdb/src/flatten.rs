//! Net flattening.
//!
//! Flattening makes every terminal of a hierarchical net reachable from a
//! net of the flattened cell. Hyper-nets rooted at the top level receive one
//! routing pad per terminal plug they reach. Hyper-nets rooted below the top
//! level get a proxy net (a *deep net*) in the flattened cell, named after
//! their root occurrence, which receives their routing pads instead.

use arcstr::ArcStr;
use geometry::prelude::*;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{span, Level};

use crate::diagnostics::{Cause, Severity};
use crate::net::{ComponentKind, NetType};
use crate::occurrence::{Entity, Occurrence};
use crate::{CellId, ComponentId, Database, InstanceId, NetId, Result};

/// How the components of a terminal plug become routing pads.
#[derive(Debug, Default, Copy, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalPolicy {
    /// One routing pad, on the component with the biggest area.
    #[default]
    BiggestArea,
    /// One routing pad per component.
    AllComponents,
}

/// Options of [`Database::flatten_nets`].
#[derive(Debug, Default, Clone)]
pub struct FlattenOpts {
    /// Skip clock nets.
    pub no_clock_flatten: bool,
    /// How terminals are collapsed.
    pub terminal_policy: TerminalPolicy,
    /// Report terminals reached through unplaced instances.
    pub warn_on_unplaced: bool,
    /// Occurrence names of nets never flattened.
    pub excluded: IndexSet<ArcStr>,
}

/// What a flattening pass did.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct FlattenReport {
    /// Deep nets created, in creation order.
    pub deep_nets: Vec<NetId>,
    /// Number of routing pads created.
    pub routing_pads: usize,
    /// Non-root hyper-nets skipped because their name was taken.
    pub skipped_duplicates: usize,
    /// Top-level nets skipped because they already carry routing pads.
    pub skipped_flattened: usize,
}

impl Database {
    /// Flattens the nets of `cell`.
    ///
    /// With a `scope`, only hyper-nets rooted below that instance are
    /// considered. Supply and blockage nets are never flattened.
    ///
    /// Running the pass again is harmless: existing deep nets are reported
    /// as duplicates and top-level nets carrying routing pads are skipped.
    pub fn flatten_nets(
        &mut self,
        cell: CellId,
        scope: Option<InstanceId>,
        opts: &FlattenOpts,
    ) -> Result<FlattenReport> {
        let span = span!(Level::INFO, "flattening nets", cell = %self.cell_name(cell));
        let _guard = span.enter();

        let mut db = self.update_session();
        db.cell_mut(cell)?.flags.flattened_nets = true;

        let mut report = FlattenReport::default();
        let mut deep = Vec::new();
        let mut top = Vec::new();
        for occurrence in db.hyper_net_root_occurrences(cell)? {
            if scope.is_some_and(|inst| !occurrence.path.contains(inst)) {
                continue;
            }
            let Entity::Net(net) = occurrence.entity else {
                continue;
            };
            let n = db.net(net)?;
            match n.net_type {
                NetType::Clock if opts.no_clock_flatten => continue,
                NetType::Power | NetType::Ground | NetType::Blockage => continue,
                _ => (),
            }
            let name = db.occurrence_name(&occurrence)?;
            if opts.excluded.contains(&name) {
                continue;
            }

            if !occurrence.path.is_empty() {
                if db.cell(cell)?.net_named(&name).is_some() {
                    let cause = Cause::DuplicateFlattenNet {
                        cell: db.cell_name(cell),
                        net: name,
                    };
                    db.report(cause, Severity::Warning);
                    report.skipped_duplicates += 1;
                } else {
                    deep.push((occurrence, name));
                }
                continue;
            }

            if !db.routing_pads(net)?.is_empty() {
                report.skipped_flattened += 1;
                continue;
            }
            top.push(occurrence);
        }

        for (root, name) in deep {
            let Entity::Net(root_net) = root.entity else {
                continue;
            };
            let net_type = db.net(root_net)?.net_type;
            let net = db.create_net(cell, name)?;
            db.set_net_type(net, net_type)?;
            db.net_mut(net)?.deep = Some(root.clone());
            db.cell_mut(cell)?.deep_nets.insert(root.clone(), net);
            tracing::event!(Level::DEBUG, net = %db.net(net)?.name, "created deep net");

            for plug in db.terminal_plug_occurrences(&root)? {
                report.routing_pads += db.create_routing_pads(cell, net, &plug, opts)?;
            }
            report.deep_nets.push(net);
        }

        for root in top {
            let Entity::Net(net) = root.entity else {
                continue;
            };
            for plug in db.terminal_plug_occurrences(&root)? {
                report.routing_pads += db.create_routing_pads(cell, net, &plug, opts)?;
            }
            let pins: Vec<(ComponentId, ArcStr, Rect)> = db
                .net(net)?
                .components()
                .filter_map(|id| {
                    let c = db.components.get(id)?;
                    match c.kind {
                        ComponentKind::Pin { rect } => Some((id, c.layer.clone(), rect)),
                        _ => None,
                    }
                })
                .collect();
            for (pin, layer, rect) in pins {
                let occurrence = Occurrence::new(Entity::Component(pin), Default::default());
                db.create_component(net, layer, ComponentKind::RoutingPad { occurrence, rect })?;
                report.routing_pads += 1;
            }
        }

        tracing::event!(
            Level::INFO,
            deep_nets = report.deep_nets.len(),
            routing_pads = report.routing_pads,
            "flattened nets"
        );
        Ok(report)
    }

    /// Materializes the terminal plug `plug` as routing pads of `net`.
    fn create_routing_pads(
        &mut self,
        cell: CellId,
        net: NetId,
        plug: &Occurrence,
        opts: &FlattenOpts,
    ) -> Result<usize> {
        let Entity::Plug {
            instance,
            master_net,
        } = plug.entity
        else {
            return Ok(0);
        };
        let path = plug.path.pushed(instance);
        let tf = self.path_transformation(&path)?;

        if opts.warn_on_unplaced && !self.is_placed_path(&path)? {
            let cause = Cause::UnplacedInstance {
                cell: self.cell_name(cell),
                occurrence: self.occurrence_name(plug)?,
            };
            self.report(cause, Severity::Warning);
        }

        let mut candidates: Vec<(ComponentId, ArcStr, Rect)> = Vec::new();
        for id in self.net(master_net)?.components() {
            let c = self.component(id)?;
            if !c.kind.is_routing_pad() {
                candidates.push((id, c.layer.clone(), c.bounding_box()));
            }
        }
        if opts.terminal_policy == TerminalPolicy::BiggestArea {
            let mut biggest: Option<(ComponentId, ArcStr, Rect)> = None;
            for candidate in candidates {
                if biggest
                    .as_ref()
                    .map_or(true, |(_, _, rect)| candidate.2.area() > rect.area())
                {
                    biggest = Some(candidate);
                }
            }
            candidates = biggest.into_iter().collect();
        }

        if candidates.is_empty() {
            let rect = Rect::from_point(tf.apply(Point::zero()));
            let kind = ComponentKind::RoutingPad {
                occurrence: plug.clone(),
                rect,
            };
            self.create_component(net, ArcStr::new(), kind)?;
            return Ok(1);
        }

        let count = candidates.len();
        for (id, layer, rect) in candidates {
            let kind = ComponentKind::RoutingPad {
                occurrence: Occurrence::new(Entity::Component(id), path.clone()),
                rect: tf.apply_rect(&rect),
            };
            self.create_component(net, layer, kind)?;
        }
        Ok(count)
    }
}
