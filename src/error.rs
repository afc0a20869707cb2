//! 错误类型定义
//!
//! 提供缓冲区缓存操作的错误类型。

use core::fmt;

/// 缓冲区缓存操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// I/O 错误（由块设备报告，原样向上传递）
    Io,
    /// 无效参数
    InvalidInput,
    /// 缓冲池耗尽：所有缓冲块都被引用
    NoSpace,
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_accessors() {
        let err = Error::new(ErrorKind::NoSpace, "no buffers");
        assert_eq!(err.kind(), ErrorKind::NoSpace);
        assert_eq!(err.message(), "no buffers");
    }

    #[test]
    fn test_error_display() {
        let err = Error::new(ErrorKind::Io, "disk read failed");
        assert_eq!(err.to_string(), "Io: disk read failed");
    }
}
