use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Interner shared by every diagram in the process.
static SHAPE_NAMES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Monotonic suffix for generated ids.
static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Handle of a shape in a [`Diagram`](crate::Diagram).
///
/// Interned, so it is `Copy` and compares in O(1). Holding a `ShapeId` never
/// keeps a shape alive: the diagram owns every shape, and a stale id simply
/// stops resolving once the shape is removed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(Spur);

impl ShapeId {
    /// Intern `name`, returning the existing id if it was seen before.
    pub fn named(name: &str) -> Self {
        ShapeId(SHAPE_NAMES.get_or_intern(name))
    }

    /// Generate a fresh id such as `box_12` or `selection_box_40`.
    pub fn fresh(prefix: &str) -> Self {
        let serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
        Self::named(&format!("{prefix}_{serial}"))
    }

    pub fn as_str(&self) -> &str {
        SHAPE_NAMES.resolve(&self.0)
    }
}

impl fmt::Debug for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ShapeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ShapeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ShapeId::named(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_id() {
        let a = ShapeId::named("start_node");
        let b = ShapeId::named("start_node");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "start_node");
        assert_eq!(format!("{a:?}"), "#start_node");
    }

    #[test]
    fn fresh_ids_carry_prefix_and_differ() {
        let a = ShapeId::fresh("box");
        let b = ShapeId::fresh("box");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("box_"));
    }
}
