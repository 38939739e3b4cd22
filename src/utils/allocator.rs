use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Stable handle into an [`Arena`], with generation tracking to reject stale handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ArenaId {
    index: usize,
    generation: u32,
}

impl ArenaId {
    pub fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn from_index(index: u32) -> Self {
        Self::new(index as usize, 0)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Generational arena used for scene nodes and per-material shadow state.
pub struct Arena<T> {
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: VecDeque<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generations: Vec::new(),
            free_list: VecDeque::new(),
        }
    }

    pub fn insert(&mut self, item: T) -> ArenaId {
        if let Some(index) = self.free_list.pop_front() {
            self.items[index] = Some(item);
            return ArenaId::new(index, self.generations[index]);
        }

        let index = self.items.len();
        self.items.push(Some(item));
        self.generations.push(0);
        ArenaId::new(index, 0)
    }

    pub fn get(&self, id: ArenaId) -> Option<&T> {
        if self.contains(id) {
            self.items[id.index()].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: ArenaId) -> Option<&mut T> {
        if self.contains(id) {
            self.items[id.index()].as_mut()
        } else {
            None
        }
    }

    pub fn remove(&mut self, id: ArenaId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }
        let item = self.items[id.index()].take();
        if item.is_some() {
            self.generations[id.index()] = self.generations[id.index()].wrapping_add(1);
            self.free_list.push_back(id.index());
        }
        item
    }

    /// Drops every item. Handles issued before the call become stale.
    pub fn clear(&mut self) {
        for (index, slot) in self.items.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.generations[index] = self.generations[index].wrapping_add(1);
                self.free_list.push_back(index);
            }
        }
    }

    pub fn contains(&self, id: ArenaId) -> bool {
        self.generations
            .get(id.index())
            .is_some_and(|gen| *gen == id.generation())
            && self.items[id.index()].is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArenaId, &T)> + '_ {
        self.items.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|item| (ArenaId::new(index, self.generations[index]), item))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ArenaId, &mut T)> + '_ {
        let generations = &self.generations;
        self.items
            .iter_mut()
            .enumerate()
            .filter_map(move |(index, slot)| {
                slot.as_mut()
                    .map(|item| (ArenaId::new(index, generations[index]), item))
            })
    }

    pub fn len(&self) -> usize {
        self.items.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_handles_go_stale() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        assert_eq!(arena.remove(a), Some("a"));

        let b = arena.insert("b");
        assert_eq!(a.index(), b.index());
        assert!(arena.get(a).is_none());
        assert_eq!(arena.get(b), Some(&"b"));
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut arena = Arena::new();
        let ids: Vec<_> = (0..4).map(|i| arena.insert(i)).collect();
        arena.clear();

        assert!(arena.is_empty());
        assert!(ids.iter().all(|id| !arena.contains(*id)));

        arena.insert(10);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn iter_skips_free_slots() {
        let mut arena = Arena::new();
        let first = arena.insert(1);
        arena.insert(2);
        arena.insert(3);
        arena.remove(first);

        let values: Vec<_> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![2, 3]);
    }
}
