//! 块设备接口

use crate::error::Result;
use crate::types::BlockId;

/// 块设备接口
///
/// 缓冲区缓存只需要同步地读写单个定长块。实现者负责自己的并发保护
/// （例如驱动内部的队列锁），因此方法只取 `&self`：缓存会在仅持有
/// 缓冲块锁的情况下并发地调用它。
///
/// 重试与错误恢复策略由设备自行决定，缓存只把错误原样传给调用者。
///
/// # 示例
///
/// ```rust,ignore
/// use bcache_core::{BlockDevice, BlockId, Result};
///
/// struct VirtioDisk {
///     // ...
/// }
///
/// impl BlockDevice for VirtioDisk {
///     fn block_size(&self) -> usize {
///         1024
///     }
///
///     fn read_block(&self, id: BlockId, buf: &mut [u8]) -> Result<()> {
///         // 提交读请求并等待完成
///         Ok(())
///     }
///
///     fn write_block(&self, id: BlockId, buf: &[u8]) -> Result<()> {
///         // 提交写请求并等待完成
///         Ok(())
///     }
/// }
/// ```
pub trait BlockDevice: Send + Sync {
    /// 设备原生块大小（字节）
    fn block_size(&self) -> usize;

    /// 读取一个块
    ///
    /// `buf` 的长度恰好为 `block_size()`。
    fn read_block(&self, id: BlockId, buf: &mut [u8]) -> Result<()>;

    /// 写入一个块
    ///
    /// `buf` 的长度恰好为 `block_size()`。
    fn write_block(&self, id: BlockId, buf: &[u8]) -> Result<()>;
}
