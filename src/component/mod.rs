//! Element components.
//!
//! A component is one attribute slot attachable to a mesh element. The
//! mandatory ("horizontal") components live inline in the element structs;
//! the optional ("vertical") ones live in parallel arrays owned by the
//! element's container and can be enabled and disabled at runtime. This
//! module holds the component value types and the two storage disciplines
//! that need behavior of their own:
//!
//! - [`ElementFlags`]: packed per-element booleans (deleted / selected /
//!   on-border / user bits),
//! - [`Color`]: RGBA8 attribute values,
//! - [`RefList`] with [`FixedRefs`] / [`DynRefs`]: references to sibling
//!   elements, the component that compaction has to rewrite,
//! - [`CustomComponents`] / [`CustomValues`]: runtime-named, type-erased
//!   attributes.

mod color;
mod custom;
mod flags;
mod refs;

pub use color::Color;
pub use custom::{CustomComponents, CustomValue, CustomValues};
pub use flags::ElementFlags;
pub use refs::{DynRefs, FixedRefs, RefList};
