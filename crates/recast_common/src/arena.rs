//! Append-only arena with typed IDs.
//!
//! Graph-shaped data (schema trees with named back-references, compiled
//! resolution programs for recursive records) is stored in an [`Arena`] and
//! linked through `Copy` IDs instead of owning pointers, so cycles never
//! become ownership cycles.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Trait for opaque ID types used as arena keys.
///
/// Implementors must provide a bijection between `u32` indices and the ID type.
pub trait ArenaId: Copy {
    /// Creates an ID from a raw `u32` index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw `u32` index.
    fn as_raw(self) -> u32;
}

/// Declares a `u32` newtype ID that implements [`ArenaId`].
///
/// ```
/// recast_common::define_id!(
///     /// Identifies a widget.
///     WidgetId
/// );
/// let id = WidgetId::from_raw(3);
/// assert_eq!(id.as_raw(), 3);
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl $crate::arena::ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

/// A dense, ID-indexed container.
///
/// Items are always appended (never reordered or removed), making IDs stable
/// for the lifetime of the arena. A slot can be allocated first and filled in
/// later through [`Arena::get_mut`], which is how recursive definitions get an
/// ID before their body is known.
#[derive(Debug, Clone)]
pub struct Arena<I: ArenaId, T> {
    items: Vec<T>,
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Allocates a new item in the arena and returns its ID.
    pub fn alloc(&mut self, item: T) -> I {
        let id = I::from_raw(self.items.len() as u32);
        self.items.push(item);
        id
    }

    /// Returns a reference to the item with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get(&self, id: I) -> &T {
        &self.items[id.as_raw() as usize]
    }

    /// Returns a mutable reference to the item with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.as_raw() as usize]
    }

    /// Returns the number of items in the arena.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the arena contains no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        self.get(id)
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        self.get_mut(id)
    }
}
