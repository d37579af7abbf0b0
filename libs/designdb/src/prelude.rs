//! Commonly used types.

pub use geometry::prelude::*;

pub use crate::cell::{Cell, CellEvent, CellFlags, Leaf, Marker, Signature, SignatureKind};
pub use crate::codec::DecodeSession;
pub use crate::config::DatabaseConfig;
pub use crate::diagnostics::{Cause, Diagnostic, Issue, IssueSet, Severity};
pub use crate::flatten::{FlattenOpts, FlattenReport, TerminalPolicy};
pub use crate::instance::{Instance, PlacementStatus};
pub use crate::library::Library;
pub use crate::net::{Component, ComponentKind, Direction, Net, NetType};
pub use crate::occurrence::{Entity, Occurrence, Path};
pub use crate::relation::{Relation, RelationKind};
pub use crate::session::UpdateSession;
pub use crate::{
    CellId, ComponentId, Database, Error, InstanceId, LibraryId, MarkerId, NetId, ObserverId,
    RelationId, Result,
};
