//! 缓冲区缓存数据结构定义
//!
//! - [`BlockId`] - 块标识 `(设备号, 块号)`
//! - [`CacheConfig`] - 缓存配置

use crate::consts::{BSIZE, NBUF};
use core::fmt;

/// 块标识
///
/// 一个磁盘块由 `(dev, blockno)` 唯一确定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId {
    /// 设备号
    pub dev: u32,
    /// 设备内的块号
    pub blockno: u32,
}

impl BlockId {
    /// 创建块标识
    pub const fn new(dev: u32, blockno: u32) -> Self {
        Self { dev, blockno }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dev, self.blockno)
    }
}

/// 缓存配置
///
/// 缓冲块数量在缓存的整个生命周期内固定不变。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// 缓冲块数量
    pub capacity: usize,
    /// 块大小（字节），必须与设备的块大小一致
    pub block_size: usize,
}

impl CacheConfig {
    /// 指定容量，块大小取默认值
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            block_size: BSIZE,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: NBUF,
            block_size: BSIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 30);
        assert_eq!(config.block_size, 1024);
    }

    #[test]
    fn test_block_id_display() {
        assert_eq!(BlockId::new(1, 42).to_string(), "1:42");
        assert_ne!(BlockId::new(1, 42), BlockId::new(2, 42));
    }
}
