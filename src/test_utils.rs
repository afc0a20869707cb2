//! 测试用内存块设备

use crate::block::BlockDevice;
use crate::consts::BSIZE;
use crate::error::{Error, ErrorKind, Result};
use crate::types::BlockId;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// 内存块设备
///
/// 每个设备号有 `blocks` 个块，未写过的块读出全零。
pub(crate) struct MemDisk {
    blocks: u32,
    storage: Mutex<BTreeMap<BlockId, Box<[u8]>>>,
    fail_reads: AtomicBool,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemDisk {
    pub(crate) fn new(blocks: u32) -> Self {
        Self {
            blocks,
            storage: Mutex::new(BTreeMap::new()),
            fail_reads: AtomicBool::new(false),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// 直接设置设备上的块内容
    pub(crate) fn fill(&self, dev: u32, blockno: u32, byte: u8) {
        self.storage
            .lock()
            .unwrap()
            .insert(BlockId::new(dev, blockno), alloc::vec![byte; BSIZE].into_boxed_slice());
    }

    /// 设备上的块内容
    pub(crate) fn block(&self, dev: u32, blockno: u32) -> Vec<u8> {
        self.storage
            .lock()
            .unwrap()
            .get(&BlockId::new(dev, blockno))
            .map(|b| b.to_vec())
            .unwrap_or_else(|| alloc::vec![0u8; BSIZE])
    }

    pub(crate) fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self, id: BlockId, len: usize) -> Result<()> {
        if id.blockno >= self.blocks || len != BSIZE {
            return Err(Error::new(ErrorKind::InvalidInput, "Block out of range"));
        }
        Ok(())
    }
}

impl BlockDevice for MemDisk {
    fn block_size(&self) -> usize {
        BSIZE
    }

    fn read_block(&self, id: BlockId, buf: &mut [u8]) -> Result<()> {
        self.check(id, buf.len())?;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::new(ErrorKind::Io, "Injected read failure"));
        }
        match self.storage.lock().unwrap().get(&id) {
            Some(data) => buf.copy_from_slice(data),
            None => buf.fill(0),
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn write_block(&self, id: BlockId, buf: &[u8]) -> Result<()> {
        self.check(id, buf.len())?;
        self.storage
            .lock()
            .unwrap()
            .insert(id, buf.to_vec().into_boxed_slice());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
