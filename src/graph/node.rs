use fixedbitset::FixedBitSet;
use serde::Serialize;
use std::fmt;

/// Minimum distance from any root.
///
/// `Unreached` orders after every finite depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Depth {
    Reached(u32),
    #[default]
    Unreached,
}

impl Depth {
    pub const ROOT: Depth = Depth::Reached(0);

    pub fn value(self) -> Option<u32> {
        match self {
            Depth::Reached(depth) => Some(depth),
            Depth::Unreached => None,
        }
    }

    pub fn is_reached(self) -> bool {
        matches!(self, Depth::Reached(_))
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Depth::Reached(depth) => write!(f, "{}", depth),
            Depth::Unreached => write!(f, "unreached"),
        }
    }
}

/// One type in the class graph
#[derive(Debug, Clone)]
pub struct TypeNode {
    /// Dot separated class name
    pub name: String,

    /// Dense id, also the node's bit in every transitive set
    id: usize,

    pub depth: Depth,

    /// Whether a class file defining this type was ingested
    pub defined: bool,

    /// Number of archives defining this type (at least one)
    pub containing_archives: u32,

    /// Ids of every node reachable through one or more forward edges
    pub transitive: FixedBitSet,

    /// Cached cardinality of `transitive`
    pub transitive_count: usize,
}

impl TypeNode {
    pub(crate) fn new(name: String, id: usize, defined: bool) -> Self {
        Self {
            name,
            id,
            depth: Depth::Unreached,
            defined,
            containing_archives: 1,
            transitive: FixedBitSet::new(),
            transitive_count: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_duplicated(&self) -> bool {
        self.containing_archives > 1
    }
}
