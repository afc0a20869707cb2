//! 最近使用顺序链表
//!
//! 固定容量的侵入式双向循环链表，节点用池下标表示，不使用裸指针。
//! 下标 `0..n` 是缓冲块，下标 `n` 是哨兵头节点：
//!
//! ```text
//! head.next -> 最近释放（MRU） -> ... -> 最久未用（LRU） -> head
//! ```
//!
//! 初始化时按下标顺序逐个插到 MRU 端，因此下标 0 位于 LRU 端，是第一个回收候选。

use super::buffer::BufId;
use alloc::vec::Vec;

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: usize,
    next: usize,
}

/// 最近使用顺序链表
#[derive(Debug)]
pub(crate) struct RecencyList {
    links: Vec<Link>,
}

impl RecencyList {
    /// 创建包含 `len` 个缓冲块的链表
    pub(crate) fn new(len: usize) -> Self {
        let mut list = Self {
            links: Vec::with_capacity(len + 1),
        };
        list.links.resize(len, Link { prev: 0, next: 0 });
        list.links.push(Link { prev: len, next: len });
        for id in 0..len {
            list.push_front(id);
        }
        list
    }

    fn head(&self) -> usize {
        self.links.len() - 1
    }

    /// 缓冲块数量（不含哨兵）
    pub(crate) fn len(&self) -> usize {
        self.links.len() - 1
    }

    fn push_front(&mut self, id: BufId) {
        let head = self.head();
        let first = self.links[head].next;
        self.links[id] = Link { prev: head, next: first };
        self.links[first].prev = id;
        self.links[head].next = id;
    }

    fn unlink(&mut self, id: BufId) {
        let Link { prev, next } = self.links[id];
        self.links[prev].next = next;
        self.links[next].prev = prev;
    }

    /// 把缓冲块移到 MRU 端
    pub(crate) fn move_to_front(&mut self, id: BufId) {
        debug_assert!(id < self.len(), "recency list: slot {} out of range", id);
        self.unlink(id);
        self.push_front(id);
    }

    /// 从 MRU 端向 LRU 端遍历
    pub(crate) fn iter_mru(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.links[self.head()].next,
            forward: true,
        }
    }

    /// 从 LRU 端向 MRU 端遍历
    pub(crate) fn iter_lru(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.links[self.head()].prev,
            forward: false,
        }
    }
}

pub(crate) struct Iter<'a> {
    list: &'a RecencyList,
    cursor: usize,
    forward: bool,
}

impl Iterator for Iter<'_> {
    type Item = BufId;

    fn next(&mut self) -> Option<BufId> {
        if self.cursor == self.list.head() {
            return None;
        }
        let id = self.cursor;
        let link = self.list.links[id];
        self.cursor = if self.forward { link.next } else { link.prev };
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn mru_order(list: &RecencyList) -> Vec<BufId> {
        list.iter_mru().collect()
    }

    #[test]
    fn test_initial_order() {
        let list = RecencyList::new(4);
        assert_eq!(list.len(), 4);
        assert_eq!(mru_order(&list), vec![3, 2, 1, 0]);
        assert_eq!(list.iter_lru().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_move_to_front() {
        let mut list = RecencyList::new(4);

        list.move_to_front(0);
        assert_eq!(mru_order(&list), vec![0, 3, 2, 1]);

        list.move_to_front(2);
        assert_eq!(mru_order(&list), vec![2, 0, 3, 1]);

        // 已在 MRU 端
        list.move_to_front(2);
        assert_eq!(mru_order(&list), vec![2, 0, 3, 1]);
        assert_eq!(list.iter_lru().collect::<Vec<_>>(), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_every_slot_listed_once() {
        let mut list = RecencyList::new(8);
        for id in [5, 1, 7, 1, 0, 5, 3] {
            list.move_to_front(id);
        }

        let mut seen = mru_order(&list);
        assert_eq!(seen.len(), 8);
        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_single_slot() {
        let mut list = RecencyList::new(1);
        list.move_to_front(0);
        assert_eq!(mru_order(&list), vec![0]);
        assert_eq!(list.iter_lru().collect::<Vec<_>>(), vec![0]);
    }
}
