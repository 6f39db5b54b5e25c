//! Typed handles with generational indices.
//!
//! A handle names an object without owning it. The slot index says where the
//! object lives, the generation says which occupant of that slot the handle
//! was issued for. Releasing an object bumps the slot generation so every
//! outstanding handle to it stops resolving.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

/// Generation counter used to detect stale handles.
///
/// `u32::MAX` is reserved: a slot that would reach it is retired rather
/// than recycled, so no `(index, generation)` pair is ever issued twice.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(u32);

impl Generation {
    /// The reserved generation carried by [`Handle::NULL`].
    pub const RESERVED: Self = Self(u32::MAX);

    /// Create a new generation (starts at 0).
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// The next generation, or `None` once the counter is exhausted.
    #[must_use]
    pub const fn checked_next(self) -> Option<Self> {
        if self.0 >= u32::MAX - 1 {
            None
        } else {
            Some(Self(self.0 + 1))
        }
    }

    /// Get the raw generation value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Build a generation from a raw value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}

/// A type-safe reference to an object of type `T` stored in a
/// [`HandleRegistry<T>`](crate::HandleRegistry).
///
/// Handles are `Copy` regardless of `T` and carry no borrow of the registry.
/// Resolving goes through the registry, which reports staleness.
pub struct Handle<T: ?Sized> {
    index: u32,
    generation: Generation,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ?Sized> Handle<T> {
    /// The "no object" sentinel. Never resolves in any registry.
    pub const NULL: Self = Self {
        index: u32::MAX,
        generation: Generation::RESERVED,
        _marker: PhantomData,
    };

    pub(crate) const fn new(index: u32, generation: Generation) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index of this handle.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of this handle.
    #[must_use]
    pub const fn generation(self) -> Generation {
        self.generation
    }

    /// Whether this is [`Handle::NULL`].
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX && self.generation.0 == u32::MAX
    }

    /// Pack into a single u64 (`generation << 32 | index`).
    ///
    /// The null handle packs to `u64::MAX`.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        ((self.generation.0 as u64) << 32) | (self.index as u64)
    }

    /// Unpack from [`Handle::to_bits`].
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self::new(bits as u32, Generation((bits >> 32) as u32))
    }

    /// Reinterpret this handle as a handle to another type.
    ///
    /// Used when one registry stores wrappers around `U` and hands out
    /// handles typed by what callers think of as the object.
    #[must_use]
    pub const fn cast<U: ?Sized>(self) -> Handle<U> {
        Handle::new(self.index, self.generation)
    }

    /// Whether this handle still resolves in `registry`.
    #[must_use]
    pub fn valid(self, registry: &crate::HandleRegistry<T>) -> bool
    where
        T: Sized,
    {
        registry.is_valid(self)
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Handle<T> {}

impl<T: ?Sized> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T: ?Sized> Eq for Handle<T> {}

impl<T: ?Sized> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bits().hash(state);
    }
}

impl<T: ?Sized> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.index, self.generation).cmp(&(other.index, other.generation))
    }
}

impl<T: ?Sized> Default for Handle<T> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<T: ?Sized> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = short_type_name(std::any::type_name::<T>());
        if self.is_null() {
            write!(f, "Handle<{name}>(null)")
        } else {
            write!(f, "Handle<{name}>({}v{})", self.index, self.generation.0)
        }
    }
}

impl<T: ?Sized> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index, self.generation.0)
        }
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
