use rustc_hash::FxHashMap;
use std::mem;
use std::num::NonZeroUsize;

/// Node is a slot of the recency arena. `prev` points towards the most recently used end,
/// `next` towards the least recently used end.
#[derive(Debug)]
struct Node {
    key: String,
    value: String,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Lru pairs a key index with a recency list stored in an arena of nodes.
///
/// The index maps a key to its slot in `nodes`, and the slot carries the links of a doubly
/// linked list ordered from most (`head`) to least (`tail`) recently used. Links are plain
/// slot numbers, so moving an entry to the front or dropping the tail are O(1) and no
/// reference into the map is ever held.
///
/// Lru is not synchronized. `DnsCache` owns it behind a mutex.
#[derive(Debug)]
pub(crate) struct Lru {
    index: FxHashMap<String, usize>,
    nodes: Vec<Node>,
    // slots released by eviction, reused by the next insert
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: NonZeroUsize,
}

impl Lru {
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        Self {
            index: FxHashMap::default(),
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            capacity,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    /// get returns the value stored for key and marks the entry as the most recently used.
    pub(crate) fn get(&mut self, key: &str) -> Option<&str> {
        let slot = *self.index.get(key)?;
        self.promote(slot);
        Some(&self.nodes[slot].value)
    }

    /// insert sets the value for key and moves it to the front.
    ///
    /// A new key arriving while the structure is full first evicts the tail. The evicted
    /// pair is returned so the caller can report it. Refreshing an existing key never evicts.
    pub(crate) fn insert(&mut self, key: &str, value: &str) -> Option<(String, String)> {
        if let Some(&slot) = self.index.get(key) {
            let node = &mut self.nodes[slot];
            node.value.clear();
            node.value.push_str(value);
            self.promote(slot);
            return None;
        }

        // make room before the new key goes in, never after
        let evicted = if self.index.len() >= self.capacity.get() {
            self.evict()
        } else {
            None
        };

        let slot = self.allocate(key, value);
        self.index.insert(key.to_string(), slot);
        self.push_front(slot);
        evicted
    }

    /// evict removes the least recently used entry.
    fn evict(&mut self) -> Option<(String, String)> {
        let slot = self.tail?;
        self.detach(slot);
        let node = &mut self.nodes[slot];
        self.index.remove(&node.key);
        let evicted = (mem::take(&mut node.key), mem::take(&mut node.value));
        self.free.push(slot);
        Some(evicted)
    }

    fn allocate(&mut self, key: &str, value: &str) -> usize {
        let node = Node {
            key: key.to_string(),
            value: value.to_string(),
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn promote(&mut self, slot: usize) {
        if self.head == Some(slot) {
            return;
        }
        self.detach(slot);
        self.push_front(slot);
    }

    /// detach unlinks a slot from the list, fixing up its neighbours, head and tail.
    fn detach(&mut self, slot: usize) {
        let (prev, next) = {
            let node = &self.nodes[slot];
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        let node = &mut self.nodes[slot];
        node.prev = None;
        node.next = None;
    }

    fn push_front(&mut self, slot: usize) {
        self.nodes[slot].prev = None;
        self.nodes[slot].next = self.head;
        match self.head {
            Some(h) => self.nodes[h].prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    /// keys lists the keys from most to least recently used without touching the order.
    #[cfg(test)]
    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            keys.push(self.nodes[slot].key.clone());
            cursor = self.nodes[slot].next;
        }
        keys
    }

    /// assert_invariants walks the list from the head, checking back links, and cross-checks it
    /// with the index.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        use std::collections::HashSet;

        assert!(self.index.len() <= self.capacity.get(), "over capacity");

        let mut seen = HashSet::new();
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let node = &self.nodes[slot];
            assert_eq!(node.prev, prev, "broken back link at slot {}", slot);
            assert!(seen.insert(node.key.clone()), "duplicate key {}", node.key);
            assert_eq!(
                self.index.get(&node.key),
                Some(&slot),
                "index does not point back to slot {}",
                slot
            );
            prev = cursor;
            cursor = node.next;
        }
        assert_eq!(self.tail, prev, "tail is not the last node");
        assert_eq!(seen.len(), self.index.len(), "orphaned index entries");
        assert_eq!(
            seen.len() + self.free.len(),
            self.nodes.len(),
            "leaked arena slots"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lru(capacity: usize) -> Lru {
        Lru::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_insert_orders_most_recent_first() {
        let mut lru = lru(4);
        for key in ["a", "b", "c"] {
            assert_eq!(lru.insert(key, "v"), None);
        }
        assert_eq!(lru.keys(), vec!["c", "b", "a"]);
        assert_eq!(lru.len(), 3);
        lru.assert_invariants();
    }

    #[test]
    fn test_get_promotes() {
        let mut lru = lru(3);
        lru.insert("a", "1");
        lru.insert("b", "2");
        lru.insert("c", "3");

        assert_eq!(lru.get("a"), Some("1"));
        assert_eq!(lru.keys(), vec!["a", "c", "b"]);
        // middle node
        assert_eq!(lru.get("c"), Some("3"));
        assert_eq!(lru.keys(), vec!["c", "a", "b"]);
        // head stays head
        assert_eq!(lru.get("c"), Some("3"));
        assert_eq!(lru.keys(), vec!["c", "a", "b"]);
        lru.assert_invariants();
    }

    #[test]
    fn test_get_missing_key_leaves_order_untouched() {
        let mut lru = lru(2);
        lru.insert("a", "1");
        lru.insert("b", "2");
        assert_eq!(lru.get("z"), None);
        assert_eq!(lru.keys(), vec!["b", "a"]);
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_insert_evicts_tail_once() {
        let mut lru = lru(2);
        lru.insert("a", "1");
        lru.insert("b", "2");
        assert_eq!(lru.insert("c", "3"), Some(("a".to_string(), "1".to_string())));
        assert_eq!(lru.keys(), vec!["c", "b"]);
        assert_eq!(lru.len(), 2);
        lru.assert_invariants();
    }

    #[test]
    fn test_refresh_existing_key_never_evicts() {
        let mut lru = lru(2);
        lru.insert("a", "1");
        lru.insert("b", "2");
        assert_eq!(lru.insert("a", "10"), None);
        assert_eq!(lru.keys(), vec!["a", "b"]);
        assert_eq!(lru.get("a"), Some("10"));
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_capacity_one() {
        let mut lru = lru(1);
        lru.insert("a", "1");
        assert_eq!(lru.insert("b", "2"), Some(("a".to_string(), "1".to_string())));
        assert_eq!(lru.get("a"), None);
        assert_eq!(lru.get("b"), Some("2"));
        lru.assert_invariants();
    }

    #[test]
    fn test_evicted_slots_are_reused() {
        let mut lru = lru(8);
        for i in 0..1000 {
            lru.insert(&format!("key{}", i), &format!("value{}", i));
        }
        assert_eq!(lru.nodes.len(), 8);
        assert_eq!(lru.len(), 8);
        lru.assert_invariants();
    }
}
