//! Mesh capability descriptors.
//!
//! A capability descriptor names the attributes a mesh (or a file format)
//! can hold: vertices, per-vertex normals/colors/…, faces, per-face
//! attributes, half-edge topology. Codecs negotiate with a mesh by
//! intersecting the format's capabilities with the mesh type's supported
//! set, so a save step never writes an attribute the mesh cannot hold and a
//! load step only enables attributes both sides support.

use std::fmt;
use std::ops::{BitAnd, BitOr};

/// A set of mesh attribute capabilities.
///
/// Combine with `|`, intersect with `&`, query with
/// [`MeshCapabilities::has`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MeshCapabilities(u32);

impl MeshCapabilities {
    /// Has a vertex container.
    pub const VERTICES: Self = Self(1 << 0);
    /// Per-vertex normals.
    pub const VERTEX_NORMALS: Self = Self(1 << 1);
    /// Per-vertex colors.
    pub const VERTEX_COLORS: Self = Self(1 << 2);
    /// Per-vertex scalar quality.
    pub const VERTEX_QUALITY: Self = Self(1 << 3);
    /// Per-vertex texture coordinates.
    pub const VERTEX_TEX_COORDS: Self = Self(1 << 4);
    /// Per-vertex adjacent-face lists.
    pub const VERTEX_ADJACENT_FACES: Self = Self(1 << 5);
    /// Per-vertex adjacent-vertex lists.
    pub const VERTEX_ADJACENT_VERTICES: Self = Self(1 << 6);
    /// Has a face container.
    pub const FACES: Self = Self(1 << 7);
    /// Per-face normals.
    pub const FACE_NORMALS: Self = Self(1 << 8);
    /// Per-face colors.
    pub const FACE_COLORS: Self = Self(1 << 9);
    /// Per-face scalar quality.
    pub const FACE_QUALITY: Self = Self(1 << 10);
    /// Per-corner (wedge) texture coordinates.
    pub const WEDGE_TEX_COORDS: Self = Self(1 << 11);
    /// Per-face adjacent-face lists.
    pub const FACE_ADJACENT_FACES: Self = Self(1 << 12);
    /// Half-edge connectivity.
    pub const HALF_EDGES: Self = Self(1 << 13);

    /// The empty set.
    pub const fn none() -> Self {
        Self(0)
    }

    /// Check whether every capability in `other` is present in `self`.
    #[inline]
    pub const fn has(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Return `self` with the capabilities in `other` added.
    #[inline]
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Return `self` with the capabilities in `other` removed.
    #[inline]
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Check whether no capability is present.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the raw bit representation.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for MeshCapabilities {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for MeshCapabilities {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for MeshCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(MeshCapabilities, &str); 14] = [
            (MeshCapabilities::VERTICES, "VERTICES"),
            (MeshCapabilities::VERTEX_NORMALS, "VERTEX_NORMALS"),
            (MeshCapabilities::VERTEX_COLORS, "VERTEX_COLORS"),
            (MeshCapabilities::VERTEX_QUALITY, "VERTEX_QUALITY"),
            (MeshCapabilities::VERTEX_TEX_COORDS, "VERTEX_TEX_COORDS"),
            (
                MeshCapabilities::VERTEX_ADJACENT_FACES,
                "VERTEX_ADJACENT_FACES",
            ),
            (
                MeshCapabilities::VERTEX_ADJACENT_VERTICES,
                "VERTEX_ADJACENT_VERTICES",
            ),
            (MeshCapabilities::FACES, "FACES"),
            (MeshCapabilities::FACE_NORMALS, "FACE_NORMALS"),
            (MeshCapabilities::FACE_COLORS, "FACE_COLORS"),
            (MeshCapabilities::FACE_QUALITY, "FACE_QUALITY"),
            (MeshCapabilities::WEDGE_TEX_COORDS, "WEDGE_TEX_COORDS"),
            (MeshCapabilities::FACE_ADJACENT_FACES, "FACE_ADJACENT_FACES"),
            (MeshCapabilities::HALF_EDGES, "HALF_EDGES"),
        ];

        let mut first = true;
        for (cap, name) in NAMES {
            if self.has(cap) {
                if !first {
                    write!(f, " | ")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        if first {
            write!(f, "(none)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_and_has() {
        let caps = MeshCapabilities::VERTICES | MeshCapabilities::VERTEX_COLORS;
        assert!(caps.has(MeshCapabilities::VERTICES));
        assert!(caps.has(MeshCapabilities::VERTEX_COLORS));
        assert!(!caps.has(MeshCapabilities::FACES));
        // has() requires every named bit.
        assert!(!caps.has(MeshCapabilities::VERTICES | MeshCapabilities::FACES));
    }

    #[test]
    fn test_intersection_drops_unsupported() {
        // A format offering colors and wedge tex coords, against a mesh
        // that supports colors but not wedges.
        let format = MeshCapabilities::VERTEX_COLORS | MeshCapabilities::WEDGE_TEX_COORDS;
        let mesh = MeshCapabilities::VERTICES
            | MeshCapabilities::FACES
            | MeshCapabilities::VERTEX_COLORS;

        let negotiated = format & mesh;
        assert!(negotiated.has(MeshCapabilities::VERTEX_COLORS));
        assert!(!negotiated.has(MeshCapabilities::WEDGE_TEX_COORDS));
    }

    #[test]
    fn test_with_without() {
        let caps = MeshCapabilities::none().with(MeshCapabilities::FACE_NORMALS);
        assert!(caps.has(MeshCapabilities::FACE_NORMALS));
        assert!(caps.without(MeshCapabilities::FACE_NORMALS).is_empty());
    }

    #[test]
    fn test_debug_format() {
        let caps = MeshCapabilities::VERTICES | MeshCapabilities::FACES;
        assert_eq!(format!("{:?}", caps), "VERTICES | FACES");
        assert_eq!(format!("{:?}", MeshCapabilities::none()), "(none)");
    }
}
