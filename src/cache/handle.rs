//! 缓冲块句柄 - RAII 风格的缓冲块访问
//!
//! - [`BufGuard`] - 已持有缓冲块锁的缓冲块，只有它能写回和释放
//! - [`PinnedBuf`] - 只持有引用、不持有锁的 pin 凭证
//!
//! 释放在 `Drop` 中完成：先放开缓冲块锁，再在池锁下减少引用计数。

use crate::block::BlockDevice;
use crate::error::{Error, ErrorKind, Result};
use crate::lock::{RelaxStrategy, SleepLockGuard};
use crate::types::BlockId;
use alloc::boxed::Box;
use byteorder::{ByteOrder, LittleEndian};

use super::block_cache::BufferCache;
use super::buffer::{BufFlags, BufId};

/// 已持有的缓冲块
///
/// 由 [`BufferCache::get`] / [`BufferCache::read`] 返回。持有期间调用者独占缓冲块数据，
/// 其他请求同一个块的调用者会等待。不要长时间持有。
///
/// # 示例
///
/// ```rust,ignore
/// let mut buf = bcache.read(dev, blockno)?;
/// let next = buf.read_u32(idx)?;
/// buf.write_u32(idx, 0)?;
/// buf.write()?;
/// // buf 超出作用域时自动释放
/// ```
pub struct BufGuard<'a, D: BlockDevice, R: RelaxStrategy> {
    cache: &'a BufferCache<D, R>,
    index: BufId,
    id: BlockId,
    /// 始终为 `Some`，`Drop` 中先取出以释放缓冲块锁
    data: Option<SleepLockGuard<'a, Box<[u8]>>>,
}

impl<'a, D: BlockDevice, R: RelaxStrategy> BufGuard<'a, D, R> {
    pub(crate) fn new(
        cache: &'a BufferCache<D, R>,
        index: BufId,
        id: BlockId,
        data: SleepLockGuard<'a, Box<[u8]>>,
    ) -> Self {
        Self {
            cache,
            index,
            id,
            data: Some(data),
        }
    }

    /// 块标识
    pub fn block_id(&self) -> BlockId {
        self.id
    }

    /// 设备号
    pub fn dev(&self) -> u32 {
        self.id.dev
    }

    /// 块号
    pub fn blockno(&self) -> u32 {
        self.id.blockno
    }

    /// 缓冲块在池中的下标
    pub fn slot(&self) -> BufId {
        self.index
    }

    /// 数据是否与设备内容一致
    pub fn is_valid(&self) -> bool {
        self.cache.slot_flags(self.index).contains(BufFlags::VALID)
    }

    /// 数据是否被修改且尚未写回
    pub fn is_dirty(&self) -> bool {
        self.cache.slot_flags(self.index).contains(BufFlags::DIRTY)
    }

    /// 块数据
    pub fn data(&self) -> &[u8] {
        match &self.data {
            Some(data) => data,
            None => &[],
        }
    }

    /// 可变块数据（标记为脏）
    ///
    /// 修改后应在释放前调用 [`write`](Self::write)，否则回收时修改会丢失。
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.cache.mark_dirty(self.index);
        self.raw_data_mut()
    }

    pub(crate) fn raw_data_mut(&mut self) -> &mut [u8] {
        match &mut self.data {
            Some(data) => data,
            None => &mut [],
        }
    }

    /// 读取第 `index` 个小端 32 位字
    pub fn read_u32(&self, index: usize) -> Result<u32> {
        let data = self.data();
        let off = word_offset(index, data.len())?;
        Ok(LittleEndian::read_u32(&data[off..off + 4]))
    }

    /// 写入第 `index` 个小端 32 位字（标记为脏）
    pub fn write_u32(&mut self, index: usize, value: u32) -> Result<()> {
        let off = word_offset(index, self.data().len())?;
        LittleEndian::write_u32(&mut self.data_mut()[off..off + 4], value);
        Ok(())
    }

    /// 同步写回设备
    ///
    /// 不改变引用计数、身份和最近使用顺序。设备错误原样返回。
    pub fn write(&mut self) -> Result<()> {
        self.cache.write_slot(self.index, self.id, self.data())
    }

    /// 写回设备，等同于 [`write`](Self::write)
    #[inline]
    pub fn commit(&mut self) -> Result<()> {
        self.write()
    }

    /// 增加一个不持锁的引用
    ///
    /// 返回的凭证存在期间，该缓冲块不会被回收给其他块。
    pub fn pin(&self) -> PinnedBuf<'a, D, R> {
        self.cache.pin_slot(self.index);
        PinnedBuf {
            cache: self.cache,
            index: self.index,
            id: self.id,
        }
    }

    /// 释放缓冲块
    ///
    /// 引用计数归零时缓冲块成为最近使用者。与直接 drop 相同。
    pub fn release(self) {
        drop(self);
    }

    /// 释放缓冲块，等同于 [`release`](Self::release)
    #[inline]
    pub fn finish(self) {
        self.release();
    }
}

impl<D: BlockDevice, R: RelaxStrategy> Drop for BufGuard<'_, D, R> {
    fn drop(&mut self) {
        drop(self.data.take());
        self.cache.release_slot(self.index);
    }
}

impl<D: BlockDevice, R: RelaxStrategy> core::fmt::Debug for BufGuard<'_, D, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BufGuard")
            .field("id", &self.id)
            .field("slot", &self.index)
            .field("flags", &self.cache.slot_flags(self.index))
            .finish()
    }
}

/// pin 凭证
///
/// 由 [`BufGuard::pin`] 创建。不持有缓冲块锁，只保证缓冲块的身份不被回收；
/// 调用 [`unpin`](Self::unpin) 或 drop 时归还引用。归还不会调整最近使用顺序。
pub struct PinnedBuf<'a, D: BlockDevice, R: RelaxStrategy> {
    cache: &'a BufferCache<D, R>,
    index: BufId,
    id: BlockId,
}

impl<'a, D: BlockDevice, R: RelaxStrategy> PinnedBuf<'a, D, R> {
    /// 被 pin 的块
    pub fn block_id(&self) -> BlockId {
        self.id
    }

    /// 缓冲块在池中的下标
    pub fn slot(&self) -> BufId {
        self.index
    }

    /// 重新获取被 pin 的块
    ///
    /// pin 保证身份仍在缓存中，因此一定命中同一个缓冲块；数据无效时才会访问设备。
    pub fn read(&self) -> Result<BufGuard<'a, D, R>> {
        self.cache.read(self.id.dev, self.id.blockno)
    }

    /// 归还引用
    pub fn unpin(self) {
        drop(self);
    }
}

impl<D: BlockDevice, R: RelaxStrategy> Drop for PinnedBuf<'_, D, R> {
    fn drop(&mut self) {
        self.cache.unpin_slot(self.index);
    }
}

impl<D: BlockDevice, R: RelaxStrategy> core::fmt::Debug for PinnedBuf<'_, D, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PinnedBuf")
            .field("id", &self.id)
            .field("slot", &self.index)
            .finish()
    }
}

fn word_offset(index: usize, len: usize) -> Result<usize> {
    let range = index
        .checked_mul(4)
        .and_then(|off| off.checked_add(4).map(|end| (off, end)));
    match range {
        Some((off, end)) if end <= len => Ok(off),
        _ => Err(Error::new(
            ErrorKind::InvalidInput,
            "Word index out of block bounds",
        )),
    }
}
