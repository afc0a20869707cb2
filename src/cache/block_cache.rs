//! 缓冲区缓存管理器
//!
//! # 两阶段加锁
//!
//! `get` 分两个阶段：
//!
//! 1. **池锁阶段**：查找或回收缓冲块，并把它的引用计数加一（"预定"）
//! 2. **缓冲块锁阶段**：释放池锁之后，才去等待该缓冲块的锁
//!
//! 回收只会选择引用计数为 0 的缓冲块，而预定发生在池锁释放之前，
//! 所以第 2 阶段的等待不可能与回收同一个缓冲块的操作竞争。
//! 池锁从不跨越缓冲块锁的等待或设备 I/O。

use crate::{
    block::BlockDevice,
    error::{Error, ErrorKind, Result},
    lock::{RelaxStrategy, Spin, SpinLock},
    types::{BlockId, CacheConfig},
};

use super::buffer::{BufFlags, BufId, Slot, SlotMeta};
use super::handle::BufGuard;
use super::lru::RecencyList;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

/// 缓存统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 查找命中次数
    pub hits: u64,
    /// 查找未命中次数
    pub misses: u64,
    /// 回收已有身份缓冲块的次数
    pub recycles: u64,
    /// 设备读取次数
    pub device_reads: u64,
    /// 设备写入次数
    pub device_writes: u64,
}

impl CacheStats {
    /// 计算命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// 池锁保护的共享状态
pub(crate) struct Pool {
    pub(crate) meta: Vec<SlotMeta>,
    pub(crate) lru: RecencyList,
    hits: u64,
    misses: u64,
    recycles: u64,
}

impl Pool {
    fn new(capacity: usize) -> Self {
        Self {
            meta: alloc::vec![SlotMeta::default(); capacity],
            lru: RecencyList::new(capacity),
            hits: 0,
            misses: 0,
            recycles: 0,
        }
    }

    /// 从 MRU 端查找已缓存的块
    fn lookup(&self, id: BlockId) -> Option<BufId> {
        self.lru.iter_mru().find(|&b| self.meta[b].id == Some(id))
    }

    /// 从 LRU 端查找第一个空闲缓冲块
    fn victim(&self) -> Option<BufId> {
        self.lru.iter_lru().find(|&b| self.meta[b].is_free())
    }
}

/// 缓冲区缓存
///
/// 持有固定数量的缓冲块，进程生命周期内只创建一次，通过共享引用交给所有调用者。
///
/// # 类型参数
///
/// * `D` - 块设备
/// * `R` - 等待缓冲块锁时的让出策略，内核在这里接入调度器
///
/// # 示例
///
/// ```rust,ignore
/// let bcache: BufferCache<_, KernelYield> = BufferCache::new(disk, CacheConfig::default())?;
///
/// let mut buf = bcache.read(ROOTDEV, 1)?;
/// buf.data_mut()[0] = 0x42;
/// buf.write()?;
/// buf.release();
/// ```
pub struct BufferCache<D, R = Spin> {
    device: D,
    block_size: usize,
    pool: SpinLock<Pool>,
    slots: Vec<Slot<R>>,
    device_reads: AtomicU64,
    device_writes: AtomicU64,
}

impl<D: BlockDevice, R: RelaxStrategy> BufferCache<D, R> {
    /// 创建缓冲区缓存
    ///
    /// 一次性分配全部缓冲块并串入最近使用顺序链表。
    ///
    /// # 错误
    ///
    /// * `InvalidInput` - 容量为 0，或块大小与设备块大小不一致
    pub fn new(device: D, config: CacheConfig) -> Result<Self> {
        if config.capacity == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Buffer cache capacity must be non-zero",
            ));
        }
        if config.block_size == 0 || config.block_size != device.block_size() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Buffer size must match the device block size",
            ));
        }

        let slots = (0..config.capacity)
            .map(|_| Slot::new(config.block_size))
            .collect();

        log::debug!(
            "[BCACHE] init: {} buffers x {} bytes",
            config.capacity,
            config.block_size
        );

        Ok(Self {
            device,
            block_size: config.block_size,
            pool: SpinLock::new(Pool::new(config.capacity), "bcache"),
            slots,
            device_reads: AtomicU64::new(0),
            device_writes: AtomicU64::new(0),
        })
    }

    /// 使用默认配置创建缓冲区缓存
    pub fn with_default_config(device: D) -> Result<Self> {
        Self::new(device, CacheConfig::default())
    }

    /// 获取块对应的缓冲块（不读取设备）
    ///
    /// 返回的缓冲块已被调用者独占持有，但数据不一定有效（见 [`BufGuard::is_valid`]）。
    /// 适用于调用者马上要覆盖整个块的场景。
    ///
    /// 缓冲块被其他调用者持有时会等待其释放。
    ///
    /// # 错误
    ///
    /// * `NoSpace` - 块未缓存且所有缓冲块都被引用
    pub fn get(&self, dev: u32, blockno: u32) -> Result<BufGuard<'_, D, R>> {
        let id = BlockId::new(dev, blockno);

        let index = {
            let mut pool = self.pool.lock();

            if let Some(b) = pool.lookup(id) {
                pool.meta[b].refcnt += 1;
                pool.hits += 1;
                log::trace!(
                    "[BCACHE] get {} HIT slot={} refcnt={}",
                    id,
                    b,
                    pool.meta[b].refcnt
                );
                b
            } else {
                let Some(b) = pool.victim() else {
                    log::error!(
                        "[BCACHE] get {}: no free buffers, all {} are referenced",
                        id,
                        self.slots.len()
                    );
                    return Err(Error::new(ErrorKind::NoSpace, "No free buffers"));
                };

                pool.misses += 1;
                let old = pool.meta[b].id.replace(id);
                pool.meta[b].refcnt = 1;
                let flags = self.slots[b].reset();

                if let Some(old) = old {
                    pool.recycles += 1;
                    if flags.contains(BufFlags::DIRTY) {
                        log::warn!(
                            "[BCACHE] recycling slot={} for {}: unwritten changes to {} discarded",
                            b,
                            id,
                            old
                        );
                    }
                    log::debug!("[BCACHE] get {} MISS, recycled slot={} (was {})", id, b, old);
                } else {
                    log::debug!("[BCACHE] get {} MISS, fresh slot={}", id, b);
                }
                b
            }
        };

        // 已预定（refcnt >= 1），可以在池锁之外等待
        let data = self.slots[index].data.lock();
        Ok(BufGuard::new(self, index, id, data))
    }

    /// 读取块，返回数据有效的缓冲块
    ///
    /// 数据无效时从设备同步读取。设备 I/O 只在持有缓冲块锁时进行。
    ///
    /// # 错误
    ///
    /// * `NoSpace` - 同 [`get`](Self::get)
    /// * 设备错误原样返回；此时缓冲块已释放，数据仍标记为无效
    pub fn read(&self, dev: u32, blockno: u32) -> Result<BufGuard<'_, D, R>> {
        let mut buf = self.get(dev, blockno)?;
        if !buf.is_valid() {
            let id = buf.block_id();
            if let Err(e) = self.device.read_block(id, buf.raw_data_mut()) {
                log::error!("[BCACHE] read {} failed: {}", id, e);
                return Err(e);
            }
            self.device_reads.fetch_add(1, Ordering::Relaxed);
            self.slots[buf.slot()].insert(BufFlags::VALID);
        }
        Ok(buf)
    }

    /// 读取块
    ///
    /// 文件系统层的入口，等同于 [`read`](Self::read)
    #[inline]
    pub fn acquire_for_read(&self, dev: u32, blockno: u32) -> Result<BufGuard<'_, D, R>> {
        self.read(dev, blockno)
    }

    /// 把缓冲块数据写回设备
    pub(crate) fn write_slot(&self, index: BufId, id: BlockId, data: &[u8]) -> Result<()> {
        if let Err(e) = self.device.write_block(id, data) {
            log::error!("[BCACHE] write {} failed: {}", id, e);
            return Err(e);
        }
        self.device_writes.fetch_add(1, Ordering::Relaxed);
        self.slots[index].remove(BufFlags::DIRTY);
        Ok(())
    }

    /// 释放一个引用
    ///
    /// 调用前缓冲块锁必须已经释放。引用计数归零时移到 MRU 端。
    pub(crate) fn release_slot(&self, index: BufId) {
        let mut pool = self.pool.lock();
        let pool = &mut *pool;
        let meta = &mut pool.meta[index];
        debug_assert!(meta.refcnt > 0, "brelse: slot {} not referenced", index);
        meta.refcnt -= 1;
        if meta.refcnt == 0 {
            pool.lru.move_to_front(index);
        }
    }

    /// 增加引用（不涉及缓冲块锁）
    pub(crate) fn pin_slot(&self, index: BufId) {
        let mut pool = self.pool.lock();
        pool.meta[index].refcnt += 1;
    }

    /// 减少引用（不调整最近使用顺序）
    pub(crate) fn unpin_slot(&self, index: BufId) {
        let mut pool = self.pool.lock();
        let meta = &mut pool.meta[index];
        debug_assert!(meta.refcnt > 0, "bunpin: slot {} not referenced", index);
        meta.refcnt -= 1;
    }

    pub(crate) fn slot_flags(&self, index: BufId) -> BufFlags {
        self.slots[index].flags()
    }

    pub(crate) fn mark_dirty(&self, index: BufId) {
        self.slots[index].insert(BufFlags::DIRTY);
    }

    /// 块当前是否有缓冲块对应（不改变最近使用顺序）
    pub fn contains(&self, dev: u32, blockno: u32) -> bool {
        self.pool.lock().lookup(BlockId::new(dev, blockno)).is_some()
    }
}

impl<D, R> BufferCache<D, R> {
    /// 缓冲块数量
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// 块大小（字节）
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// 底层设备
    pub fn device(&self) -> &D {
        &self.device
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> CacheStats {
        let pool = self.pool.lock();
        CacheStats {
            hits: pool.hits,
            misses: pool.misses,
            recycles: pool.recycles,
            device_reads: self.device_reads.load(Ordering::Relaxed),
            device_writes: self.device_writes.load(Ordering::Relaxed),
        }
    }
}

impl<D, R> core::fmt::Debug for BufferCache<D, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BufferCache")
            .field("capacity", &self.capacity())
            .field("block_size", &self.block_size)
            .field("stats", &self.stats())
            .finish()
    }
}
