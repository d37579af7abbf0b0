//! Error types.

use arcstr::ArcStr;
use geometry::rect::EmptyRectError;

/// The result type returned by fallible database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An error raised by a database operation.
///
/// Structural errors abort the attempted operation; the caller must not
/// assume that any part of it was applied. Format errors abort a decode pass.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A library handle does not refer to a live library.
    #[error("unknown library")]
    UnknownLibrary,
    /// A cell handle does not refer to a live cell.
    #[error("unknown cell")]
    UnknownCell,
    /// A net handle does not refer to a live net.
    #[error("unknown net")]
    UnknownNet,
    /// A component handle does not refer to a live component.
    #[error("unknown component")]
    UnknownComponent,
    /// An instance handle does not refer to a live instance.
    #[error("unknown instance")]
    UnknownInstance,
    /// A marker handle does not refer to a live marker.
    #[error("unknown marker")]
    UnknownMarker,
    /// An extension slice name is not defined in the cell.
    #[error("no extension slice named `{name}` in cell `{cell}`")]
    UnknownSlice {
        /// The name of the slice.
        name: ArcStr,
        /// The name of the cell that was searched.
        cell: ArcStr,
    },
    /// A required name was empty.
    #[error("{kind} name must not be empty")]
    EmptyName {
        /// The kind of object being named.
        kind: &'static str,
    },
    /// A name is already used by another object in the same scope.
    #[error("{kind} `{name}` already exists in `{scope}`")]
    DuplicateName {
        /// The kind of object being named.
        kind: &'static str,
        /// The duplicated name.
        name: ArcStr,
        /// The name of the enclosing scope.
        scope: ArcStr,
    },
    /// Instantiating a cell would make it (transitively) contain itself.
    #[error("instantiating `{master}` in `{owner}` would create a cycle")]
    CyclicInstantiation {
        /// The cell that would receive the instance.
        owner: ArcStr,
        /// The cell that would be instantiated.
        master: ArcStr,
    },
    /// Two entities that must belong to the same cell do not.
    #[error("{what} does not belong to cell `{cell}`")]
    ForeignEntity {
        /// A description of the offending entity.
        what: &'static str,
        /// The expected owning cell.
        cell: ArcStr,
    },
    /// A plug was addressed through a net that is not external in the master.
    #[error("net `{net}` is not external in `{master}`")]
    NotExternal {
        /// The master net.
        net: ArcStr,
        /// The master cell.
        master: ArcStr,
    },
    /// A distance was requested to an empty rectangle.
    #[error(transparent)]
    EmptyOperand(#[from] EmptyRectError),
    /// Every extension slice mask bit is in use.
    #[error("no extension slice mask bits left")]
    SliceMasksExhausted,
    /// A property has the right name but the wrong type.
    #[error("property `{name}` of `{owner}` is not a {expected}")]
    PropertyType {
        /// The property name.
        name: ArcStr,
        /// The owner's name.
        owner: ArcStr,
        /// The expected property type.
        expected: &'static str,
    },
    /// A cell already holds a different relation of the same kind.
    #[error("`{owner}` already holds a different `{kind}`")]
    RelationAttached {
        /// The relation kind name.
        kind: &'static str,
        /// The owner's name.
        owner: ArcStr,
    },
    /// A document object carries a typename with no registered decoder.
    #[error("unknown typename `{0}`")]
    UnknownTypename(String),
    /// A document object is missing a field, or the field has the wrong type.
    #[error("malformed field `{field}` in `{typename}` object")]
    MalformedField {
        /// The typename of the enclosing object.
        typename: &'static str,
        /// The offending field.
        field: &'static str,
    },
    /// A document object was decoded where a different typename was expected.
    #[error("expected a `{expected}` object, found `{found}`")]
    UnexpectedTypename {
        /// The typename the decoder expected.
        expected: &'static str,
        /// The typename actually found.
        found: String,
    },
    /// A hierarchical library name did not resolve.
    #[error("unresolved library `{0}`")]
    UnresolvedLibrary(String),
    /// A hierarchical cell name did not resolve.
    #[error("unresolved cell `{0}`")]
    UnresolvedCell(String),
    /// A net name in a document did not resolve.
    #[error("unresolved net `{net}` in cell `{cell}`")]
    UnresolvedNet {
        /// The net name.
        net: String,
        /// The cell that was searched.
        cell: ArcStr,
    },
    /// Relation back-references were never matched by their master record.
    #[error("unresolved relation references: {}", .0.join(", "))]
    UnresolvedReferences(Vec<String>),
    /// The document is not valid JSON.
    #[error("invalid JSON document")]
    Json(#[from] serde_json::Error),
    /// A configuration file could not be parsed.
    #[error("invalid configuration")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Returns `true` if this error was raised while building or editing the
    /// object graph.
    pub fn is_structural(&self) -> bool {
        !self.is_format() && !matches!(self, Error::Config(_))
    }

    /// Returns `true` if this error was raised while decoding a document.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Error::PropertyType { .. }
                | Error::UnknownTypename(_)
                | Error::MalformedField { .. }
                | Error::UnexpectedTypename { .. }
                | Error::UnresolvedLibrary(_)
                | Error::UnresolvedCell(_)
                | Error::UnresolvedNet { .. }
                | Error::UnresolvedReferences(_)
                | Error::Json(_)
        )
    }
}
