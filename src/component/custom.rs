//! Runtime-named custom components.
//!
//! On top of the static component set, users can attach arbitrarily-typed
//! attributes by name at runtime: per-element custom components are
//! type-erased vertical arrays owned by a container and kept in lock-step
//! with it through insertion and compaction; per-mesh custom components are
//! single type-erased values.
//!
//! Typed access checks the stored [`TypeId`] on every call: asking for the
//! wrong type is a recoverable [`MeshError::TypeMismatch`], never unsafe.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::error::{MeshError, Result};

/// Value requirements for custom components.
///
/// Blanket-implemented; any `'static + Clone + Default + Send + Sync` type
/// qualifies.
pub trait CustomValue: Any + Clone + Default + Send + Sync {}

impl<T: Any + Clone + Default + Send + Sync> CustomValue for T {}

// One type-erased vertical array. Object-safe surface for the operations a
// container applies uniformly to every column.
trait ErasedColumn: Send + Sync {
    fn len(&self) -> usize;
    fn push_default(&mut self);
    fn resize_default(&mut self, n: usize);
    fn retain_indices(&mut self, keep: &[usize]);
    fn clone_box(&self) -> Box<dyn ErasedColumn>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn value_type(&self) -> TypeId;
    fn value_type_name(&self) -> &'static str;
}

struct Column<T: CustomValue>(Vec<T>);

impl<T: CustomValue> ErasedColumn for Column<T> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn push_default(&mut self) {
        self.0.push(T::default());
    }

    fn resize_default(&mut self, n: usize) {
        self.0.resize(n, T::default());
    }

    fn retain_indices(&mut self, keep: &[usize]) {
        self.0 = keep.iter().map(|&i| self.0[i].clone()).collect();
    }

    fn clone_box(&self) -> Box<dyn ErasedColumn> {
        Box::new(Column(self.0.clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Name-keyed type-erased vertical arrays for one element container.
///
/// The owning container drives `push_default` / `resize_default` /
/// `retain_indices` so every column always has exactly one slot per element
/// slot.
pub struct CustomComponents {
    columns: HashMap<String, Box<dyn ErasedColumn>>,
    len: usize,
}

impl CustomComponents {
    /// Create an empty registry for a container of length zero.
    pub(crate) fn new() -> Self {
        Self {
            columns: HashMap::new(),
            len: 0,
        }
    }

    /// Add a component named `name` with value type `T`.
    ///
    /// Every existing element gets a default value. Fails with
    /// [`MeshError::ComponentExists`] if the name is taken.
    pub fn add<T: CustomValue>(&mut self, name: &str) -> Result<()> {
        if self.columns.contains_key(name) {
            return Err(MeshError::ComponentExists {
                name: name.to_owned(),
            });
        }
        let mut column = Column::<T>(Vec::new());
        column.resize_default(self.len);
        self.columns.insert(name.to_owned(), Box::new(column));
        Ok(())
    }

    /// Remove the component named `name`, discarding its values.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        self.columns
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| MeshError::ComponentNotFound {
                name: name.to_owned(),
            })
    }

    /// Check if a component named `name` exists.
    pub fn has(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Check if a component named `name` exists with value type `T`.
    pub fn has_typed<T: CustomValue>(&self, name: &str) -> bool {
        self.columns
            .get(name)
            .is_some_and(|c| c.value_type() == TypeId::of::<T>())
    }

    /// Iterate over the component names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Number of registered components.
    pub fn num_components(&self) -> usize {
        self.columns.len()
    }

    fn typed_column<T: CustomValue>(&self, name: &str) -> Result<&Column<T>> {
        let column = self
            .columns
            .get(name)
            .ok_or_else(|| MeshError::ComponentNotFound {
                name: name.to_owned(),
            })?;
        column
            .as_any()
            .downcast_ref::<Column<T>>()
            .ok_or_else(|| {
                MeshError::type_mismatch(name, column.value_type_name(), type_name::<T>())
            })
    }

    fn typed_column_mut<T: CustomValue>(&mut self, name: &str) -> Result<&mut Column<T>> {
        let column = self
            .columns
            .get_mut(name)
            .ok_or_else(|| MeshError::ComponentNotFound {
                name: name.to_owned(),
            })?;
        let stored = column.value_type_name();
        column
            .as_any_mut()
            .downcast_mut::<Column<T>>()
            .ok_or_else(|| MeshError::type_mismatch(name, stored, type_name::<T>()))
    }

    /// Get the value of component `name` for element slot `index`.
    pub fn get<T: CustomValue>(&self, name: &str, index: usize) -> Result<&T> {
        let column = self.typed_column::<T>(name)?;
        column.0.get(index).ok_or(MeshError::OutOfRange {
            index,
            len: column.0.len(),
        })
    }

    /// Get a mutable value of component `name` for element slot `index`.
    pub fn get_mut<T: CustomValue>(&mut self, name: &str, index: usize) -> Result<&mut T> {
        let column = self.typed_column_mut::<T>(name)?;
        let len = column.0.len();
        column
            .0
            .get_mut(index)
            .ok_or(MeshError::OutOfRange { index, len })
    }

    /// Set the value of component `name` for element slot `index`.
    pub fn set<T: CustomValue>(&mut self, name: &str, index: usize, value: T) -> Result<()> {
        *self.get_mut(name, index)? = value;
        Ok(())
    }

    /// View all values of component `name` as a slice.
    pub fn column<T: CustomValue>(&self, name: &str) -> Result<&[T]> {
        Ok(&self.typed_column::<T>(name)?.0)
    }

    // Container hooks: keep every column sized in lock-step.

    pub(crate) fn push_default(&mut self) {
        self.len += 1;
        for column in self.columns.values_mut() {
            column.push_default();
        }
    }

    pub(crate) fn resize_default(&mut self, n: usize) {
        self.len = n;
        for column in self.columns.values_mut() {
            column.resize_default(n);
        }
    }

    pub(crate) fn retain_indices(&mut self, keep: &[usize]) {
        self.len = keep.len();
        for column in self.columns.values_mut() {
            column.retain_indices(keep);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
        for column in self.columns.values_mut() {
            column.resize_default(0);
        }
    }
}

impl Clone for CustomComponents {
    fn clone(&self) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.clone_box()))
                .collect(),
            len: self.len,
        }
    }
}

impl fmt::Debug for CustomComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("CustomComponents")
            .field("len", &self.len)
            .field("names", &names)
            .finish()
    }
}

impl Default for CustomComponents {
    fn default() -> Self {
        Self::new()
    }
}

// One type-erased single value, for per-mesh custom components.
trait ErasedValue: Send + Sync {
    fn clone_box(&self) -> Box<dyn ErasedValue>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn value_type_name(&self) -> &'static str;
}

struct ValueSlot<T: CustomValue>(T);

impl<T: CustomValue> ErasedValue for ValueSlot<T> {
    fn clone_box(&self) -> Box<dyn ErasedValue> {
        Box::new(ValueSlot(self.0.clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Name-keyed type-erased single values, for per-mesh custom components.
pub struct CustomValues {
    values: HashMap<String, Box<dyn ErasedValue>>,
}

impl CustomValues {
    /// Create an empty registry.
    pub(crate) fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Add a component named `name` holding `value`.
    ///
    /// Fails with [`MeshError::ComponentExists`] if the name is taken.
    pub fn add<T: CustomValue>(&mut self, name: &str, value: T) -> Result<()> {
        if self.values.contains_key(name) {
            return Err(MeshError::ComponentExists {
                name: name.to_owned(),
            });
        }
        self.values.insert(name.to_owned(), Box::new(ValueSlot(value)));
        Ok(())
    }

    /// Remove the component named `name`, discarding its value.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        self.values
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| MeshError::ComponentNotFound {
                name: name.to_owned(),
            })
    }

    /// Check if a component named `name` exists.
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate over the component names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Get the value of component `name`.
    pub fn get<T: CustomValue>(&self, name: &str) -> Result<&T> {
        let slot = self
            .values
            .get(name)
            .ok_or_else(|| MeshError::ComponentNotFound {
                name: name.to_owned(),
            })?;
        slot.as_any()
            .downcast_ref::<ValueSlot<T>>()
            .map(|s| &s.0)
            .ok_or_else(|| MeshError::type_mismatch(name, slot.value_type_name(), type_name::<T>()))
    }

    /// Get a mutable value of component `name`.
    pub fn get_mut<T: CustomValue>(&mut self, name: &str) -> Result<&mut T> {
        let slot = self
            .values
            .get_mut(name)
            .ok_or_else(|| MeshError::ComponentNotFound {
                name: name.to_owned(),
            })?;
        let stored = slot.value_type_name();
        slot.as_any_mut()
            .downcast_mut::<ValueSlot<T>>()
            .map(|s| &mut s.0)
            .ok_or_else(|| MeshError::type_mismatch(name, stored, type_name::<T>()))
    }

    /// Replace the value of component `name`, which must already store `T`.
    pub fn set<T: CustomValue>(&mut self, name: &str, value: T) -> Result<()> {
        *self.get_mut(name)? = value;
        Ok(())
    }
}

impl Clone for CustomValues {
    fn clone(&self) -> Self {
        Self {
            values: self
                .values
                .iter()
                .map(|(name, slot)| (name.clone(), slot.clone_box()))
                .collect(),
        }
    }
}

impl fmt::Debug for CustomValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("CustomValues").field("names", &names).finish()
    }
}

impl Default for CustomValues {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_typed_access() {
        let mut custom = CustomComponents::new();
        custom.push_default();
        custom.push_default();

        custom.add::<i32>("flag").unwrap();
        assert!(custom.has("flag"));
        assert_eq!(*custom.get::<i32>("flag", 0).unwrap(), 0);

        custom.set::<i32>("flag", 1, 7).unwrap();
        assert_eq!(*custom.get::<i32>("flag", 1).unwrap(), 7);
        assert_eq!(custom.column::<i32>("flag").unwrap(), &[0, 7]);
    }

    #[test]
    fn test_wrong_type_is_recoverable() {
        let mut custom = CustomComponents::new();
        custom.add::<f64>("weight").unwrap();

        let err = custom.get::<i32>("weight", 0).unwrap_err();
        match err {
            MeshError::TypeMismatch { name, stored, requested } => {
                assert_eq!(name, "weight");
                assert!(stored.contains("f64"));
                assert!(requested.contains("i32"));
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_and_duplicate_names() {
        let mut custom = CustomComponents::new();
        assert!(matches!(
            custom.get::<i32>("nope", 0),
            Err(MeshError::ComponentNotFound { .. })
        ));

        custom.add::<i32>("id").unwrap();
        assert!(matches!(
            custom.add::<i32>("id"),
            Err(MeshError::ComponentExists { .. })
        ));

        custom.remove("id").unwrap();
        assert!(!custom.has("id"));
        assert!(matches!(
            custom.remove("id"),
            Err(MeshError::ComponentNotFound { .. })
        ));
    }

    #[test]
    fn test_columns_follow_container_length() {
        let mut custom = CustomComponents::new();
        custom.add::<u8>("tag").unwrap();

        for _ in 0..4 {
            custom.push_default();
        }
        assert_eq!(custom.column::<u8>("tag").unwrap().len(), 4);

        // Late-added columns are sized to the current length.
        custom.add::<bool>("seen").unwrap();
        assert_eq!(custom.column::<bool>("seen").unwrap().len(), 4);

        custom.set::<u8>("tag", 0, 10).unwrap();
        custom.set::<u8>("tag", 3, 13).unwrap();
        custom.retain_indices(&[0, 3]);
        assert_eq!(custom.column::<u8>("tag").unwrap(), &[10, 13]);
        assert_eq!(custom.column::<bool>("seen").unwrap().len(), 2);
    }

    #[test]
    fn test_out_of_range() {
        let mut custom = CustomComponents::new();
        custom.push_default();
        custom.add::<i32>("x").unwrap();
        assert!(matches!(
            custom.get::<i32>("x", 5),
            Err(MeshError::OutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn test_clone_is_deep() {
        let mut custom = CustomComponents::new();
        custom.push_default();
        custom.add::<i32>("n").unwrap();
        custom.set::<i32>("n", 0, 1).unwrap();

        let mut copy = custom.clone();
        copy.set::<i32>("n", 0, 2).unwrap();
        assert_eq!(*custom.get::<i32>("n", 0).unwrap(), 1);
        assert_eq!(*copy.get::<i32>("n", 0).unwrap(), 2);
    }

    #[test]
    fn test_mesh_values() {
        let mut values = CustomValues::new();
        values.add::<String>("author", "anon".to_owned()).unwrap();

        assert_eq!(values.get::<String>("author").unwrap(), "anon");
        values.set::<String>("author", "tess".to_owned()).unwrap();
        assert_eq!(values.get::<String>("author").unwrap(), "tess");

        assert!(matches!(
            values.get::<i32>("author"),
            Err(MeshError::TypeMismatch { .. })
        ));

        values.remove("author").unwrap();
        assert!(!values.has("author"));
    }
}
