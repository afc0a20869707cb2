//! 缓冲区缓存常量定义

/// 块大小（字节）
///
/// 与块设备的原生块大小一致，是缓存唯一对外可见的结构常量。
pub const BSIZE: usize = 1024;

/// 单个文件系统操作最多写入的块数
pub const MAXOPBLOCKS: usize = 10;

/// 默认缓冲块数量
pub const NBUF: usize = MAXOPBLOCKS * 3;

