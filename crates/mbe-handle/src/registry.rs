//! Per-type handle registry backed by a generational slot arena.
//!
//! The registry owns the objects it hands out handles for. A slot keeps its
//! generation across occupants; releasing an object advances the generation
//! so outstanding handles stop resolving, and a slot whose generation is
//! exhausted is retired for good.

use std::fmt;

use tracing::{debug, trace, warn};

use crate::{
    error::{HandleError, HandleResult},
    handle::{Generation, Handle},
    validation::Validation,
};

struct Slot<T> {
    generation: Generation,
    value: Option<T>,
}

/// Arena issuing [`Handle<T>`]s for the objects it stores.
pub struct HandleRegistry<T> {
    slots: Vec<Slot<T>>,
    /// Recycled slot indices, reused LIFO.
    free_list: Vec<u32>,
    /// Number of occupied slots.
    len: usize,
    /// Slots whose generation ran out.
    retired: usize,
    validation: Validation,
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleRegistry<T> {
    /// Create an empty registry with checked validation.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            retired: 0,
            validation: Validation::Checked,
        }
    }

    /// Create a registry with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::with_capacity(capacity / 4),
            ..Self::new()
        }
    }

    /// Create a registry with the given validation mode.
    #[must_use]
    pub fn with_validation(validation: Validation) -> Self {
        Self::with_capacity_and_validation(0, validation)
    }

    /// Create a registry with pre-allocated capacity and a validation mode.
    #[must_use]
    pub fn with_capacity_and_validation(capacity: usize, validation: Validation) -> Self {
        if !validation.is_checked() {
            warn!(
                registry = std::any::type_name::<T>(),
                "handle registry created with trusted validation; stale handles may resolve to recycled slots"
            );
        }
        Self {
            validation,
            ..Self::with_capacity(capacity)
        }
    }

    /// The validation mode used by [`get_or_fail`](Self::get_or_fail).
    #[must_use]
    pub const fn validation(&self) -> Validation {
        self.validation
    }

    /// Store `value` and return its handle.
    ///
    /// # Panics
    ///
    /// Panics if all `u32::MAX - 1` slot indices are in use, since
    /// `u32::MAX` is reserved for [`Handle::NULL`].
    pub fn issue(&mut self, value: T) -> Handle<T> {
        self.len += 1;

        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none(), "free slot {index} is occupied");
            slot.value = Some(value);
            let handle = Handle::new(index, slot.generation);
            trace!(%handle, "reissued slot");
            return handle;
        }

        let index = u32::try_from(self.slots.len())
            .ok()
            .filter(|&index| index < u32::MAX)
            .expect("handle registry exhausted its slot indices");
        let generation = Generation::new();
        self.slots.push(Slot {
            generation,
            value: Some(value),
        });
        let handle = Handle::new(index, generation);
        trace!(%handle, "issued new slot");
        handle
    }

    /// Remove the object behind `handle` and return it.
    ///
    /// Returns `None` if the handle is null, stale or was never issued;
    /// releasing twice is therefore harmless.
    pub fn release(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.live_slot_mut(handle)?;
        let value = slot.value.take();

        match slot.generation.checked_next() {
            Some(next) => {
                slot.generation = next;
                self.free_list.push(handle.index());
            }
            None => {
                slot.generation = Generation::RESERVED;
                self.retired += 1;
                debug!(%handle, "slot generation exhausted, retiring slot");
            }
        }

        self.len -= 1;
        trace!(%handle, "released");
        value
    }

    /// Resolve a handle, always comparing generations.
    #[must_use]
    pub fn resolve(&self, handle: Handle<T>) -> Option<&T> {
        let slot = self.slots.get(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    /// Mutable variant of [`resolve`](Self::resolve).
    #[must_use]
    pub fn resolve_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.live_slot_mut(handle)?.value.as_mut()
    }

    /// Whether `handle` resolves.
    #[must_use]
    pub fn is_valid(&self, handle: Handle<T>) -> bool {
        self.resolve(handle).is_some()
    }

    /// Resolve a handle that must exist.
    ///
    /// Under [`Validation::Trusted`] only slot occupancy is checked.
    pub fn get_or_fail(&self, handle: Handle<T>) -> HandleResult<&T> {
        let found = match self.validation {
            Validation::Checked => self.resolve(handle),
            Validation::Trusted => self
                .slots
                .get(handle.index() as usize)
                .and_then(|slot| slot.value.as_ref()),
        };
        found.ok_or_else(|| Self::not_found(handle))
    }

    /// Mutable variant of [`get_or_fail`](Self::get_or_fail).
    pub fn get_or_fail_mut(&mut self, handle: Handle<T>) -> HandleResult<&mut T> {
        let found = match self.validation {
            Validation::Checked => self.resolve_mut(handle),
            Validation::Trusted => self
                .slots
                .get_mut(handle.index() as usize)
                .and_then(|slot| slot.value.as_mut()),
        };
        found.ok_or_else(|| Self::not_found(handle))
    }

    /// Number of live objects.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no objects are live.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total slots, including free and retired ones.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots retired after exhausting their generation.
    #[must_use]
    pub const fn retired(&self) -> usize {
        self.retired
    }

    /// Iterate over live objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let value = slot.value.as_ref()?;
            Some((Handle::new(index as u32, slot.generation), value))
        })
    }

    /// Mutable iteration over live objects in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            let value = slot.value.as_mut()?;
            Some((Handle::new(index as u32, generation), value))
        })
    }

    /// Handles of all live objects in slot order.
    pub fn handles(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.iter().map(|(handle, _)| handle)
    }

    /// Release every object for which `pred` returns `true`.
    pub fn release_if(&mut self, mut pred: impl FnMut(Handle<T>, &T) -> bool) -> Vec<(Handle<T>, T)> {
        let doomed: Vec<Handle<T>> = self
            .iter()
            .filter(|&(handle, value)| pred(handle, value))
            .map(|(handle, _)| handle)
            .collect();

        doomed
            .into_iter()
            .filter_map(|handle| self.release(handle).map(|value| (handle, value)))
            .collect()
    }

    fn live_slot_mut(&mut self, handle: Handle<T>) -> Option<&mut Slot<T>> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() || slot.value.is_none() {
            return None;
        }
        Some(slot)
    }

    fn not_found(handle: Handle<T>) -> HandleError {
        HandleError::IdNotFound {
            handle: handle.to_bits(),
            type_name: std::any::type_name::<T>(),
        }
    }
}

impl<T> fmt::Debug for HandleRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("type", &std::any::type_name::<T>())
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .field("free", &self.free_list.len())
            .field("retired", &self.retired)
            .field("validation", &self.validation)
            .finish()
    }
}
