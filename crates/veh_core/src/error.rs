use thiserror::Error;

use crate::{PartTypeId, Point, PrototypeId};

/// Why a part could not be installed. Installation is a no-op on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallError {
    #[error("unknown part type '{0}'")]
    UnknownPart(PartTypeId),
    #[error("no structural part at mount ({}, {})", .0.x, .0.y)]
    NoStructure(Point),
    #[error("structural part at ({}, {}) would not touch the vehicle", .0.x, .0.y)]
    NotAdjacent(Point),
    #[error("mount ({}, {}) already has a part in slot '{location}'", .mount.x, .mount.y)]
    SlotOccupied { mount: Point, location: String },
    #[error("mount ({}, {}) already has a '{part}'", .mount.x, .mount.y)]
    Duplicate { mount: Point, part: PartTypeId },
}

/// Catalog errors detected while building a vehicle. Unrecoverable for the
/// vehicle being loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("unknown part type '{0}'")]
    UnknownPart(PartTypeId),
    #[error("unknown vehicle prototype '{0}'")]
    UnknownPrototype(PrototypeId),
    #[error("snapshot version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
}
