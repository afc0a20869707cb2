//! 缓冲块结构
//!
//! 每个缓冲块拆成两部分：
//!
//! - [`SlotMeta`] - 身份和引用计数，放在池锁保护的 `Pool` 里
//! - [`Slot`] - 数据和状态标志，数据由缓冲块锁保护
//!
//! 状态标志放在池锁之外的原子变量里：回收时必须在池锁临界区内清除
//! `VALID`，而此时并不持有（也不应等待）缓冲块锁。

use crate::lock::{SleepLock, Spin};
use crate::types::BlockId;
use alloc::boxed::Box;
use alloc::vec;
use bitflags::bitflags;
use core::sync::atomic::{AtomicU8, Ordering};

/// 缓冲块在池中的下标
pub type BufId = usize;

bitflags! {
    /// 缓冲块状态标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BufFlags: u8 {
        /// 数据与设备内容一致
        const VALID = 0x01;
        /// 持有者修改过数据且尚未写回
        const DIRTY = 0x02;
    }
}

/// 缓冲块元数据，只在持有池锁时访问
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SlotMeta {
    /// 当前身份，从未使用过的缓冲块为 `None`
    pub(crate) id: Option<BlockId>,
    /// 持有者数量（包括 pin）
    pub(crate) refcnt: u32,
}

impl SlotMeta {
    pub(crate) fn is_free(&self) -> bool {
        self.refcnt == 0
    }
}

/// 缓冲块
pub(crate) struct Slot<R = Spin> {
    flags: AtomicU8,
    pub(crate) data: SleepLock<Box<[u8]>, R>,
}

impl<R> Slot<R> {
    pub(crate) fn new(block_size: usize) -> Self {
        Self {
            flags: AtomicU8::new(BufFlags::empty().bits()),
            data: SleepLock::new(vec![0u8; block_size].into_boxed_slice(), "buffer"),
        }
    }

    pub(crate) fn flags(&self) -> BufFlags {
        BufFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    pub(crate) fn insert(&self, flags: BufFlags) {
        self.flags.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    pub(crate) fn remove(&self, flags: BufFlags) {
        self.flags.fetch_and(!flags.bits(), Ordering::AcqRel);
    }

    /// 清除全部标志，返回清除前的值
    pub(crate) fn reset(&self) -> BufFlags {
        BufFlags::from_bits_truncate(self.flags.swap(0, Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_creation() {
        let slot: Slot = Slot::new(1024);
        assert_eq!(slot.flags(), BufFlags::empty());
        assert_eq!(slot.data.lock().len(), 1024);
        assert_eq!(slot.data.name(), "buffer");
    }

    #[test]
    fn test_flag_updates() {
        let slot: Slot = Slot::new(512);

        slot.insert(BufFlags::VALID);
        slot.insert(BufFlags::DIRTY);
        assert_eq!(slot.flags(), BufFlags::VALID | BufFlags::DIRTY);

        slot.remove(BufFlags::DIRTY);
        assert_eq!(slot.flags(), BufFlags::VALID);

        let old = slot.reset();
        assert_eq!(old, BufFlags::VALID);
        assert!(slot.flags().is_empty());
    }

    #[test]
    fn test_meta_free() {
        let mut meta = SlotMeta::default();
        assert!(meta.is_free());
        assert!(meta.id.is_none());

        meta.refcnt = 1;
        assert!(!meta.is_free());
    }
}
