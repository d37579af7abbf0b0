//! The typename registry.
//!
//! Every object of a document carries a `@typename` naming one of the
//! [`Typename`]s below. Each typename is registered once with its decoder.

use indexmap::IndexMap;
use lazy_static::lazy_static;

use super::decode::{self, DecodeFn};

/// The kinds of object a document may contain.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum Typename {
    /// A rectangle.
    Box,
    /// An instance placement.
    Transformation,
    /// A library and its cells.
    Library,
    /// A cell.
    Cell,
    /// A net.
    Net,
    /// A contact component.
    Contact,
    /// A horizontal segment.
    Horizontal,
    /// A vertical segment.
    Vertical,
    /// A pad component.
    Pad,
    /// A pin component.
    Pin,
    /// An instance.
    Instance,
    /// A plug connection.
    Plug,
    /// A string property.
    Annotation,
    /// A uniquify relation, written by its master owner.
    UniquifyRelation,
    /// A reference to a uniquify relation, written by the other owners.
    UniquifyReference,
    /// A slaving relation, written by its master owner.
    SlavedsRelation,
    /// A reference to a slaving relation, written by the other owners.
    SlavedsReference,
}

impl Typename {
    /// Every typename.
    pub const ALL: [Typename; 17] = [
        Self::Box,
        Self::Transformation,
        Self::Library,
        Self::Cell,
        Self::Net,
        Self::Contact,
        Self::Horizontal,
        Self::Vertical,
        Self::Pad,
        Self::Pin,
        Self::Instance,
        Self::Plug,
        Self::Annotation,
        Self::UniquifyRelation,
        Self::UniquifyReference,
        Self::SlavedsRelation,
        Self::SlavedsReference,
    ];

    /// The `@typename` string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Box => "Box",
            Self::Transformation => "Transformation",
            Self::Library => "Library",
            Self::Cell => "Cell",
            Self::Net => "Net",
            Self::Contact => "Contact",
            Self::Horizontal => "Horizontal",
            Self::Vertical => "Vertical",
            Self::Pad => "Pad",
            Self::Pin => "Pin",
            Self::Instance => "Instance",
            Self::Plug => "Plug",
            Self::Annotation => "Annotation",
            Self::UniquifyRelation => "Cell::UniquifyRelation",
            Self::UniquifyReference => "&Cell::UniquifyRelation",
            Self::SlavedsRelation => "Cell::SlavedsRelation",
            Self::SlavedsReference => "&Cell::SlavedsRelation",
        }
    }

    /// Looks up a registered typename.
    pub fn lookup(name: &str) -> Option<Self> {
        REGISTRY.get(name).map(|(typename, _)| *typename)
    }

    fn decoder(self) -> DecodeFn {
        match self {
            Self::Box => decode::decode_box,
            Self::Transformation => decode::decode_transformation,
            Self::Library => decode::decode_library,
            Self::Cell => decode::decode_cell,
            Self::Net => decode::decode_net,
            Self::Contact | Self::Horizontal | Self::Vertical | Self::Pad | Self::Pin => {
                decode::decode_component
            }
            Self::Instance => decode::decode_instance,
            Self::Plug => decode::decode_plug,
            Self::Annotation => decode::decode_annotation,
            Self::UniquifyRelation | Self::SlavedsRelation => decode::decode_relation,
            Self::UniquifyReference | Self::SlavedsReference => decode::decode_reference,
        }
    }
}

impl std::fmt::Display for Typename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

lazy_static! {
    static ref REGISTRY: IndexMap<&'static str, (Typename, DecodeFn)> = Typename::ALL
        .into_iter()
        .map(|typename| (typename.as_str(), (typename, typename.decoder())))
        .collect();
}

/// Returns the typename registered under `name` and its decoder.
pub(crate) fn decoder(name: &str) -> Option<(Typename, DecodeFn)> {
    REGISTRY.get(name).copied()
}
