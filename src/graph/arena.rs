//! Dense, stably-indexed slot storage
//!
//! Freed slots are reused (newest first), and each reuse bumps the slot's
//! generation so ids handed out before the removal stop resolving.

use super::types::{EdgeId, GraphId, NodeId};
use std::marker::PhantomData;

/// Id types that can address an [`Arena`] slot
pub(crate) trait ArenaId: Copy {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn slot(&self) -> usize;
    fn slot_generation(&self) -> u32;
}

impl ArenaId for NodeId {
    fn from_parts(index: u32, generation: u32) -> Self {
        NodeId::new(index, generation)
    }
    fn slot(&self) -> usize {
        self.index()
    }
    fn slot_generation(&self) -> u32 {
        self.generation()
    }
}

impl ArenaId for EdgeId {
    fn from_parts(index: u32, generation: u32) -> Self {
        EdgeId::new(index, generation)
    }
    fn slot(&self) -> usize {
        self.index()
    }
    fn slot_generation(&self) -> u32 {
        self.generation()
    }
}

impl ArenaId for GraphId {
    fn from_parts(index: u32, generation: u32) -> Self {
        GraphId::new(index, generation)
    }
    fn slot(&self) -> usize {
        self.index()
    }
    fn slot_generation(&self) -> u32 {
        self.generation()
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug, Clone)]
pub(crate) struct Arena<I, T> {
    slots: Vec<Slot<T>>,
    /// Free slot indices for reuse
    free: Vec<u32>,
    len: usize,
    _id: PhantomData<I>,
}

impl<I: ArenaId, T> Arena<I, T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Arena {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
            _id: PhantomData,
        }
    }

    /// Id the next insertion will receive
    fn next_id(&self) -> I {
        match self.free.last() {
            Some(&index) => I::from_parts(index, self.slots[index as usize].generation),
            None => I::from_parts(self.slots.len() as u32, 0),
        }
    }

    /// Insert a value built from its own id
    pub(crate) fn insert_with(&mut self, build: impl FnOnce(I) -> T) -> I {
        let id = self.next_id();
        let value = build(id);
        self.commit(id, value)
    }

    /// Like `insert_with`, but nothing is committed if `build` fails
    pub(crate) fn try_insert_with<E>(
        &mut self,
        build: impl FnOnce(I) -> Result<T, E>,
    ) -> Result<I, E> {
        let id = self.next_id();
        let value = build(id)?;
        Ok(self.commit(id, value))
    }

    fn commit(&mut self, id: I, value: T) -> I {
        if self.free.last() == Some(&(id.slot() as u32)) {
            self.free.pop();
        } else {
            self.slots.push(Slot {
                generation: 0,
                value: None,
            });
        }
        self.slots[id.slot()].value = Some(value);
        self.len += 1;
        id
    }

    pub(crate) fn get(&self, id: I) -> Option<&T> {
        self.slots
            .get(id.slot())
            .filter(|slot| slot.generation == id.slot_generation())
            .and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots
            .get_mut(id.slot())
            .filter(|slot| slot.generation == id.slot_generation())
            .and_then(|slot| slot.value.as_mut())
    }

    pub(crate) fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    /// Remove a value, retiring its id
    pub(crate) fn remove(&mut self, id: I) -> Option<T> {
        let slot = self
            .slots
            .get_mut(id.slot())
            .filter(|slot| slot.generation == id.slot_generation())?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.slot() as u32);
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (I::from_parts(index as u32, slot.generation), value))
        })
    }

    pub(crate) fn ids(&self) -> Vec<I> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Remove every value; ids issued so far all stop resolving
    pub(crate) fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.free = (0..self.slots.len() as u32).rev().collect();
        self.len = 0;
    }
}
