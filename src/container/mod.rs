//! Element containers.
//!
//! A container owns the contiguous element array for one element kind plus
//! every optional ("vertical") component array attached to it. It is the
//! only legal path to create or delete elements, which is what lets it keep
//! three invariants at all times:
//!
//! - every element's `index()` equals its ordinal position in the array,
//! - every *enabled* vertical array has exactly one entry per element slot,
//!   and every disabled one is absent,
//! - the live count equals the slot count minus the tombstoned elements.
//!
//! Deletion is two-phase: [`delete`](VertexContainer::delete) only sets the
//! deleted flag, so algorithms can keep dereferencing indices mid-pass;
//! physical removal happens in an explicit `compact()` call that returns
//! the old-index → new-index table used to rewrite references held
//! elsewhere. Compaction is never triggered implicitly.

mod face;
mod vertex;

pub use face::{Face, FaceContainer, PolyFace, QuadFace, TriFace};
pub use vertex::{Vertex, VertexContainer};

/// Replace `vec` with the entries at `keep`, in order.
pub(crate) fn compact_in_place<T: Clone>(vec: &mut Vec<T>, keep: &[usize]) {
    let taken = std::mem::take(vec);
    *vec = keep.iter().map(|&i| taken[i].clone()).collect();
}

/// Generate the accessor family of one simple vertical component slot:
/// enable / disable / has, by-id get and set, and whole-array view.
macro_rules! vertical_component {
    ($slot:ident, $elems:ident, $ty:ty, $default:expr, $name:literal, $id:ty,
     $enable:ident, $disable:ident, $has:ident, $get:ident, $set:ident, $slice:ident) => {
        #[doc = concat!("Enable the ", $name, " component.")]
        ///
        /// Allocates one default value per element slot. Enabling an
        /// already-enabled component keeps the existing values.
        pub fn $enable(&mut self) {
            if self.$slot.is_none() {
                self.$slot = Some(vec![$default; self.$elems.len()]);
            }
        }

        #[doc = concat!("Disable the ", $name, " component, discarding its values.")]
        pub fn $disable(&mut self) {
            self.$slot = None;
        }

        #[doc = concat!("Check if the ", $name, " component is enabled.")]
        pub fn $has(&self) -> bool {
            self.$slot.is_some()
        }

        #[doc = concat!("Get the ", $name, " value of one element.")]
        pub fn $get(&self, id: $id) -> Result<$ty> {
            let arr = self
                .$slot
                .as_ref()
                .ok_or(MeshError::ComponentNotEnabled { component: $name })?;
            arr.get(id.index()).copied().ok_or(MeshError::OutOfRange {
                index: id.index(),
                len: arr.len(),
            })
        }

        #[doc = concat!("Set the ", $name, " value of one element.")]
        pub fn $set(&mut self, id: $id, value: $ty) -> Result<()> {
            let arr = self
                .$slot
                .as_mut()
                .ok_or(MeshError::ComponentNotEnabled { component: $name })?;
            let len = arr.len();
            let slot = arr.get_mut(id.index()).ok_or(MeshError::OutOfRange {
                index: id.index(),
                len,
            })?;
            *slot = value;
            Ok(())
        }

        #[doc = concat!("View the whole ", $name, " array, one entry per element slot.")]
        pub fn $slice(&self) -> Result<&[$ty]> {
            self.$slot
                .as_deref()
                .ok_or(MeshError::ComponentNotEnabled { component: $name })
        }
    };
}

pub(crate) use vertical_component;
