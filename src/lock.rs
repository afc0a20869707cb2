//! 两级锁原语
//!
//! - [`SpinLock`] - 池锁：非阻塞的自旋互斥，只用于短临界区（链表扫描和元数据更新）
//! - [`SleepLock`] - 缓冲块锁：调用者可以在上面等待，持有期间允许进行设备 I/O
//!
//! 两者都基于 `spin::mutex::SpinMutex`，区别在等待策略：
//! 池锁固定使用 [`Spin`] 忙等；缓冲块锁的等待策略 `R` 由使用者提供，
//! 内核可以实现自己的 [`RelaxStrategy`]，在 `relax()` 中让出 CPU 给调度器，
//! 这样等待缓冲块的进程就会真正睡眠而不是空转。
//!
//! 锁的释放通过守卫的 `Drop` 完成，"未持锁就释放" 在类型层面无法表达。

use core::fmt;
use spin::mutex::{SpinMutex, SpinMutexGuard};

pub use spin::relax::{RelaxStrategy, Spin};

/// 池锁
pub struct SpinLock<T> {
    name: &'static str,
    inner: SpinMutex<T, Spin>,
}

/// 池锁守卫
pub type SpinLockGuard<'a, T> = SpinMutexGuard<'a, T>;

impl<T> SpinLock<T> {
    /// 创建池锁
    pub const fn new(data: T, name: &'static str) -> Self {
        Self {
            name,
            inner: SpinMutex::new(data),
        }
    }

    /// 获取锁（忙等）
    #[inline]
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        self.inner.lock()
    }

    /// 锁名称
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> fmt::Debug for SpinLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinLock")
            .field("name", &self.name)
            .field("locked", &self.inner.is_locked())
            .finish()
    }
}

/// 缓冲块锁
///
/// 同一时刻最多一个持有者。多个等待者之间不保证 FIFO 顺序。
pub struct SleepLock<T: ?Sized, R = Spin> {
    name: &'static str,
    inner: SpinMutex<T, R>,
}

/// 缓冲块锁守卫
pub type SleepLockGuard<'a, T> = SpinMutexGuard<'a, T>;

impl<T, R> SleepLock<T, R> {
    /// 创建缓冲块锁
    pub const fn new(data: T, name: &'static str) -> Self {
        Self {
            name,
            inner: SpinMutex::new(data),
        }
    }
}

impl<T: ?Sized, R: RelaxStrategy> SleepLock<T, R> {
    /// 获取锁
    ///
    /// 锁被占用时反复调用 `R::relax()` 直到持有者释放。
    #[inline]
    pub fn lock(&self) -> SleepLockGuard<'_, T> {
        self.inner.lock()
    }

    /// 尝试获取锁，不等待
    #[inline]
    pub fn try_lock(&self) -> Option<SleepLockGuard<'_, T>> {
        self.inner.try_lock()
    }

    /// 锁当前是否被持有
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

impl<T: ?Sized, R> SleepLock<T, R> {
    /// 锁名称
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: ?Sized, R: RelaxStrategy> fmt::Debug for SleepLock<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SleepLock")
            .field("name", &self.name)
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// 让出当前 OS 线程的等待策略
///
/// 宿主环境（用户态测试、模拟器）下使用。
#[cfg(any(test, feature = "std"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadYield;

#[cfg(any(test, feature = "std"))]
impl RelaxStrategy for ThreadYield {
    #[inline]
    fn relax() {
        std::thread::yield_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin_lock() {
        let lock = SpinLock::new(0u32, "pool");
        {
            let mut guard = lock.lock();
            *guard += 1;
        }
        assert_eq!(*lock.lock(), 1);
        assert_eq!(lock.name(), "pool");
    }

    #[test]
    fn test_sleep_lock_try_lock() {
        let lock: SleepLock<u32, ThreadYield> = SleepLock::new(7, "buffer");

        let guard = lock.lock();
        assert!(lock.is_locked());
        assert!(lock.try_lock().is_none());
        drop(guard);

        assert!(!lock.is_locked());
        assert_eq!(*lock.try_lock().unwrap(), 7);
    }

    #[test]
    fn test_sleep_lock_waits_for_holder() {
        use core::sync::atomic::{AtomicBool, Ordering};
        use std::time::Duration;

        let lock: SleepLock<u32, ThreadYield> = SleepLock::new(0, "buffer");
        let acquired = AtomicBool::new(false);

        std::thread::scope(|s| {
            let mut guard = lock.lock();
            s.spawn(|| {
                let value = *lock.lock();
                acquired.store(true, Ordering::SeqCst);
                assert_eq!(value, 42);
            });

            std::thread::sleep(Duration::from_millis(50));
            assert!(!acquired.load(Ordering::SeqCst));
            *guard = 42;
            drop(guard);
        });

        assert!(acquired.load(Ordering::SeqCst));
    }
}
