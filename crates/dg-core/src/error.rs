use crate::id::ShapeId;
use thiserror::Error;

/// Errors from structural diagram edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagramError {
    #[error("no shape with id `{0}`")]
    UnknownShape(ShapeId),

    #[error("shape `{0}` is not a connector")]
    NotAConnector(ShapeId),

    #[error("shape `{0}` already belongs to a group")]
    AlreadyGrouped(ShapeId),

    #[error("a group needs at least one member")]
    EmptyGroup,

    #[error("`{0}` is not a #RRGGBB or #RRGGBBAA color")]
    InvalidColor(String),

    #[error("shape `{shape}` has no connection point {point}")]
    NoSuchConnectionPoint { shape: ShapeId, point: usize },
}
