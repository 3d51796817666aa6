//! Index types for mesh elements.
//!
//! This module provides type-safe index wrappers for vertices, faces, and
//! half-edges. The indices are generic over the underlying integer type to
//! support meshes of different sizes (u16 for small meshes, u32 for typical
//! meshes, u64 for massive meshes).
//!
//! Indices are *handles*: reference components store them instead of raw
//! pointers, so growing or reallocating a container never invalidates a
//! stored reference. The only operation that moves elements is compaction,
//! which produces an [`IndexMap`] describing where every surviving element
//! went; stored references are rewritten through that table.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Trait for types that can be used as mesh indices.
///
/// This trait is implemented for `u16`, `u32`, and `u64`, allowing users to
/// choose the appropriate index size for their mesh.
pub trait MeshIndex:
    Copy + Clone + Eq + PartialEq + Ord + PartialOrd + Hash + Debug + Send + Sync + 'static
{
    /// The maximum valid index value.
    const MAX: Self;

    /// A sentinel value representing an invalid/null index.
    const INVALID: Self;

    /// Convert from usize to this index type.
    ///
    /// # Panics
    /// Panics in debug builds if the value is too large for this index type.
    fn from_usize(v: usize) -> Self;

    /// Convert to usize.
    fn to_usize(self) -> usize;

    /// Check if this is a valid (non-sentinel) index.
    fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl MeshIndex for u16 {
    const MAX: Self = u16::MAX - 1;
    const INVALID: Self = u16::MAX;

    #[inline]
    fn from_usize(v: usize) -> Self {
        debug_assert!(v <= Self::MAX as usize, "index {} too large for u16", v);
        v as u16
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }
}

impl MeshIndex for u32 {
    const MAX: Self = u32::MAX - 1;
    const INVALID: Self = u32::MAX;

    #[inline]
    fn from_usize(v: usize) -> Self {
        debug_assert!(v <= Self::MAX as usize, "index {} too large for u32", v);
        v as u32
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }
}

impl MeshIndex for u64 {
    const MAX: Self = u64::MAX - 1;
    const INVALID: Self = u64::MAX;

    #[inline]
    fn from_usize(v: usize) -> Self {
        v as u64
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }
}

/// Common interface over the typed element indices.
///
/// Reference components ([`crate::component::RefList`]) are generic over
/// this trait so the same storage works for vertex lists, face adjacency
/// lists, and half-edge links.
pub trait ElementId:
    Copy + Clone + Eq + PartialEq + Hash + Debug + Default + Send + Sync + 'static
{
    /// The underlying integer type.
    type Raw: MeshIndex;

    /// Create an index from a raw value.
    fn new(index: usize) -> Self;

    /// Create an invalid/null index.
    fn invalid() -> Self;

    /// Get the raw index value.
    fn index(self) -> usize;

    /// Check if this is a valid (non-null) index.
    fn is_valid(self) -> bool;
}

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// A type-safe face index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

/// A type-safe half-edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId<I: MeshIndex = u32>(I);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Create a new index from a raw value.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// Create an invalid/null index.
            #[inline]
            pub fn invalid() -> Self {
                Self(I::INVALID)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Get the raw value of the underlying type.
            #[inline]
            pub fn raw(self) -> I {
                self.0
            }

            /// Check if this is a valid (non-null) index.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0.is_valid()
            }
        }

        impl<I: MeshIndex> ElementId for $name<I> {
            type Raw = I;

            #[inline]
            fn new(index: usize) -> Self {
                $name::new(index)
            }

            #[inline]
            fn invalid() -> Self {
                $name::invalid()
            }

            #[inline]
            fn index(self) -> usize {
                $name::index(self)
            }

            #[inline]
            fn is_valid(self) -> bool {
                $name::is_valid(self)
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.index())
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl<I: MeshIndex> Default for $name<I> {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl<I: MeshIndex> From<usize> for $name<I> {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(FaceId, "F");
impl_index_type!(HalfEdgeId, "HE");

/// An old-index → new-index table produced by container compaction.
///
/// Every slot of the pre-compaction container maps either to the element's
/// new position or, for removed elements, to the invalid sentinel. Reference
/// components are rewritten through this table; callers holding their own
/// element indices can translate them the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMap<I: MeshIndex = u32> {
    forward: Vec<I>,
}

impl<I: MeshIndex> IndexMap<I> {
    /// Create a map over `len` slots with every entry marked removed.
    pub fn with_removed(len: usize) -> Self {
        Self {
            forward: vec![I::INVALID; len],
        }
    }

    /// Create an identity map over `len` slots (no element moved).
    pub fn identity(len: usize) -> Self {
        Self {
            forward: (0..len).map(I::from_usize).collect(),
        }
    }

    /// Record that the element at `old` now lives at `new`.
    pub fn set(&mut self, old: usize, new: usize) {
        self.forward[old] = I::from_usize(new);
    }

    /// Number of pre-compaction slots covered by this map.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Check if the map covers zero slots.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Number of slots that were removed.
    pub fn num_removed(&self) -> usize {
        self.forward.iter().filter(|i| !i.is_valid()).count()
    }

    /// Check whether no element moved or was removed.
    pub fn is_identity(&self) -> bool {
        self.forward
            .iter()
            .enumerate()
            .all(|(i, idx)| idx.to_usize() == i)
    }

    /// Look up the new position of old slot `old`, or `None` if removed.
    #[inline]
    pub fn get(&self, old: usize) -> Option<usize> {
        let idx = self.forward[old];
        idx.is_valid().then(|| idx.to_usize())
    }

    /// Translate a typed index through the map.
    ///
    /// Invalid input stays invalid; removed targets become invalid.
    #[inline]
    pub fn map<E: ElementId<Raw = I>>(&self, id: E) -> E {
        if !id.is_valid() {
            return id;
        }
        match self.get(id.index()) {
            Some(new) => E::new(new),
            None => E::invalid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let v: VertexId = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert!(v.is_valid());

        let invalid: VertexId = VertexId::invalid();
        assert!(!invalid.is_valid());
    }

    #[test]
    fn test_type_safety() {
        // These are different types and cannot be mixed
        let v: VertexId = VertexId::new(0);
        let he: HalfEdgeId = HalfEdgeId::new(0);
        let f: FaceId = FaceId::new(0);

        // All have the same raw value but are distinct types
        assert_eq!(v.index(), he.index());
        assert_eq!(he.index(), f.index());
    }

    #[test]
    fn test_small_indices() {
        let v: VertexId<u16> = VertexId::new(1000);
        assert_eq!(v.index(), 1000);
    }

    #[test]
    fn test_debug_format() {
        let v: VertexId = VertexId::new(42);
        assert_eq!(format!("{:?}", v), "V(42)");

        let invalid: VertexId = VertexId::invalid();
        assert_eq!(format!("{:?}", invalid), "V(INVALID)");
    }

    #[test]
    fn test_index_map_identity() {
        let map: IndexMap = IndexMap::identity(4);
        assert!(map.is_identity());
        assert_eq!(map.num_removed(), 0);
        let v: VertexId = VertexId::new(3);
        assert_eq!(map.map(v), v);
    }

    #[test]
    fn test_index_map_removal() {
        // Slots 0 and 2 survive, slot 1 is removed.
        let mut map: IndexMap = IndexMap::with_removed(3);
        map.set(0, 0);
        map.set(2, 1);

        assert!(!map.is_identity());
        assert_eq!(map.num_removed(), 1);
        assert_eq!(map.get(0), Some(0));
        assert_eq!(map.get(1), None);
        assert_eq!(map.get(2), Some(1));

        let kept: FaceId = map.map(FaceId::new(2));
        assert_eq!(kept.index(), 1);
        let removed: FaceId = map.map(FaceId::new(1));
        assert!(!removed.is_valid());
    }

    #[test]
    fn test_index_map_invalid_passthrough() {
        let map: IndexMap = IndexMap::identity(2);
        let v: VertexId = map.map(VertexId::invalid());
        assert!(!v.is_valid());
    }
}
