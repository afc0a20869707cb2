//! 缓冲区缓存模块
//!
//! 位于文件系统与块设备之间，持有固定数量的磁盘块内存副本：
//! 重复访问同一个块时不必再访问设备，并发访问同一个块的调用者看到同一份、串行化的数据。
//!
//! # 主要组件
//!
//! - [`BufferCache`] - 缓存管理器：get / read / write / release / pin / unpin
//! - [`BufGuard`] - 已独占持有的缓冲块
//! - [`PinnedBuf`] - 不持锁的引用凭证
//! - [`BufFlags`] - 缓冲块状态标志
//! - [`CacheStats`] - 缓存统计信息
//!
//! # 锁协议
//!
//! | 锁 | 保护对象 | 持有时长 |
//! |----|----------|----------|
//! | 池锁（`SpinLock`） | 身份、引用计数、最近使用顺序链表 | 只用于扫描和指针更新 |
//! | 缓冲块锁（`SleepLock`） | 单个缓冲块的数据 | 持有者使用期间，包括设备 I/O |
//!
//! 池锁从不跨越缓冲块锁的等待或设备 I/O。
//!
//! # 缓冲块状态
//!
//! ```text
//!            get（命中或回收）
//!   Free ───────────────────────▶ Claimed
//! (refcnt=0) ◀─────────────────── (refcnt≥1)
//!            release / unpin 归零
//! ```
//!
//! 只有 `release` 归零时才把缓冲块移到 MRU 端；`unpin` 归零不调整顺序。
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use bcache_core::{BufferCache, CacheConfig};
//!
//! let bcache: BufferCache<_, KernelYield> = BufferCache::new(disk, CacheConfig::default())?;
//!
//! // 读取块并修改
//! let mut buf = bcache.read(ROOTDEV, 33)?;
//! buf.write_u32(0, 1)?;
//! buf.write()?;
//!
//! // 保持缓冲块常驻，稍后再取
//! let pin = buf.pin();
//! buf.release();
//! let buf = pin.read()?;
//! drop(buf);
//! pin.unpin();
//! ```

mod block_cache;
mod buffer;
mod handle;
mod lru;

pub use block_cache::{BufferCache, CacheStats};
pub use buffer::{BufFlags, BufId};
pub use handle::{BufGuard, PinnedBuf};
