//! bcache_core: 教学内核的块缓冲区缓存
//!
//! 位于文件系统/inode 层与块设备之间的缓存层，提供：
//! - **固定容量**的缓冲池，容量在构造时配置
//! - **LRU** 回收策略，基于下标的侵入式链表，无裸指针
//! - **两级锁**：短时持有的池锁 + 可等待的缓冲块锁
//! - **类型级契约**：只有已持锁的 [`BufGuard`] 能写回和释放
//!
//! # 示例
//!
//! ```rust,ignore
//! use bcache_core::{BlockDevice, BlockId, BufferCache, CacheConfig, Result};
//!
//! struct MyDisk {
//!     // ...
//! }
//!
//! impl BlockDevice for MyDisk {
//!     // 实现必要的方法
//!     // ...
//! }
//!
//! fn main() -> Result<()> {
//!     let bcache: BufferCache<_, KernelYield> =
//!         BufferCache::new(MyDisk::new(), CacheConfig::default())?;
//!
//!     let mut buf = bcache.read(1, 0)?;
//!     buf.data_mut()[0] = 0x42;
//!     buf.write()?;
//!     buf.release();
//!
//!     Ok(())
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`block`] - 块设备接口
//! - [`lock`] - 池锁与缓冲块锁
//! - [`cache`] - 缓冲区缓存
//! - [`consts`] - 常量定义
//! - [`types`] - 块标识与配置

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 块设备抽象
pub mod block;

/// 锁原语
pub mod lock;

/// 常量定义
pub mod consts;

/// 数据结构定义
pub mod types;

/// 缓冲区缓存
pub mod cache;

#[cfg(test)]
mod test_utils;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 块设备
pub use block::BlockDevice;

// 锁
pub use lock::{RelaxStrategy, SleepLock, Spin, SpinLock};
#[cfg(feature = "std")]
pub use lock::ThreadYield;

// 类型
pub use types::{BlockId, CacheConfig};

// 缓存
pub use cache::{BufFlags, BufGuard, BufId, BufferCache, CacheStats, PinnedBuf};
