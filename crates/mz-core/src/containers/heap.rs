//! Indexed binary min-heap with O(log n) decrease-key.
//!
//! Grounded on the source's `priority_queue` (array of nodes that each
//! store their own position so a swap only has to patch two integers) but
//! reshaped around a stable external `Handle` rather than a raw pointer,
//! since pathfinding here indexes cells by `y * width + x` and wants to
//! decrease a specific cell's key without searching for it.

/// A stable handle into the heap's slot table. Valid until the entry it
/// names is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

struct Slot<V> {
    /// `None` once extracted; never reused, so handles stay valid-or-stale
    /// instead of silently referring to a different later entry.
    value: Option<V>,
    key: i64,
    /// Position of this slot's id in `heap`, or `None` if not currently queued.
    heap_pos: Option<usize>,
}

/// An indexed binary min-heap keyed by `i64`.
pub struct IndexedMinHeap<V> {
    slots: Vec<Slot<V>>,
    heap: Vec<usize>,
}

impl<V> Default for IndexedMinHeap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IndexedMinHeap<V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            heap: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn key_of(&self, handle: Handle) -> Option<i64> {
        self.slots
            .get(handle.0)
            .filter(|s| s.heap_pos.is_some())
            .map(|s| s.key)
    }

    /// Insert a new entry and return a handle to it.
    pub fn insert(&mut self, value: V, key: i64) -> Handle {
        let slot_id = self.slots.len();
        let heap_pos = self.heap.len();
        self.slots.push(Slot {
            value: Some(value),
            key,
            heap_pos: Some(heap_pos),
        });
        self.heap.push(slot_id);
        self.sift_up(heap_pos);
        Handle(slot_id)
    }

    /// Lower the key of an existing entry and restore the heap invariant.
    /// No-ops if the handle was already extracted or `new_key` does not
    /// improve on the current key.
    pub fn decrease_key(&mut self, handle: Handle, new_key: i64) {
        let Some(pos) = self.slots[handle.0].heap_pos else {
            return;
        };
        if new_key >= self.slots[handle.0].key {
            return;
        }
        self.slots[handle.0].key = new_key;
        self.sift_up(pos);
    }

    /// Peek at the minimum entry without removing it.
    pub fn peek_min(&self) -> Option<(&V, i64)> {
        let slot_id = *self.heap.first()?;
        let slot = &self.slots[slot_id];
        Some((slot.value.as_ref().expect("queued slot has a value"), slot.key))
    }

    /// Remove and return the minimum entry.
    pub fn extract_min(&mut self) -> Option<(V, i64)> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap_heap_positions(0, last);
        let min_slot_id = self.heap.pop().expect("checked non-empty above");
        let slot = &mut self.slots[min_slot_id];
        slot.heap_pos = None;
        let key = slot.key;
        let value = slot.value.take().expect("queued slot has a value");
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some((value, key))
    }

    fn swap_heap_positions(&mut self, i: usize, j: usize) {
        let (si, sj) = (self.heap[i], self.heap[j]);
        self.heap.swap(i, j);
        self.slots[si].heap_pos = Some(j);
        self.slots[sj].heap_pos = Some(i);
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.slots[self.heap[parent]].key <= self.slots[self.heap[pos]].key {
                break;
            }
            self.swap_heap_positions(parent, pos);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = 2 * pos + 2;
            let mut smallest = pos;
            if left < len && self.slots[self.heap[left]].key < self.slots[self.heap[smallest]].key
            {
                smallest = left;
            }
            if right < len
                && self.slots[self.heap[right]].key < self.slots[self.heap[smallest]].key
            {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap_heap_positions(pos, smallest);
            pos = smallest;
        }
    }
}
