//! 块设备抽象
//!
//! 缓冲区缓存的下层协作者：按 `(设备号, 块号)` 同步读写一个定长块。

mod device;

pub use device::BlockDevice;
