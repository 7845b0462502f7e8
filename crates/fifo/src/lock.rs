//! Lock capability for the FIFO.
//!
//! The buffer is generic over [`RawLock`] so each deployment picks its own
//! exclusion primitive:
//!
//! | Lock | Target | Notes |
//! |------|--------|-------|
//! | [`ParkingLock`] | hosted | `parking_lot` mutex, parks under contention |
//! | [`SpinLock`] | bare metal | atomic CAS on a flag, loom-checked |
//! | [`LocalLock`] | single thread | `!Sync`, panics on re-entry |
//!
//! State lives in a [`Locked`] cell. Its guard releases the lock on every
//! exit path, including early error returns and unwinding.
//!
//! For loom tests:
//! ```bash
//! RUSTFLAGS="--cfg loom" cargo test -p fifo --release
//! ```

use std::cell::{Cell, UnsafeCell};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

#[cfg(loom)]
use loom::sync::atomic::{AtomicBool, Ordering};
#[cfg(not(loom))]
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::lock_api::RawMutex as _;

/// A raw mutual-exclusion primitive.
///
/// # Safety
///
/// Implementations must guarantee that between a successful `lock`/`try_lock`
/// and the matching `unlock`, no other caller can acquire the lock. If the
/// type is `Sync`, that guarantee must hold across threads.
pub unsafe trait RawLock {
    fn new() -> Self;

    /// Block (or spin) until the lock is held.
    fn lock(&self);

    /// Acquire without waiting. Returns `true` on success.
    fn try_lock(&self) -> bool;

    /// Release the lock.
    ///
    /// # Safety
    ///
    /// The caller must currently hold the lock.
    unsafe fn unlock(&self);
}

/// Spinlock over an atomic flag.
///
/// Acquire/Release ordering on the flag publishes every write made while
/// the lock was held to the next holder.
#[derive(Debug)]
pub struct SpinLock {
    locked: AtomicBool,
}

unsafe impl RawLock for SpinLock {
    fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    fn lock(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            // Read-only spin until the holder lets go.
            while self.locked.load(Ordering::Relaxed) {
                #[cfg(loom)]
                loom::thread::yield_now();
                #[cfg(not(loom))]
                std::hint::spin_loop();
            }
        }
    }

    fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    unsafe fn unlock(&self) {
        debug_assert!(self.locked.load(Ordering::Relaxed), "unlock of free SpinLock");
        self.locked.store(false, Ordering::Release);
    }
}

/// OS-friendly mutex for hosted targets.
pub struct ParkingLock(parking_lot::RawMutex);

unsafe impl RawLock for ParkingLock {
    fn new() -> Self {
        Self(parking_lot::RawMutex::INIT)
    }

    fn lock(&self) {
        self.0.lock();
    }

    fn try_lock(&self) -> bool {
        self.0.try_lock()
    }

    unsafe fn unlock(&self) {
        // Safety: forwarded from our caller, who holds the lock.
        unsafe { self.0.unlock() }
    }
}

/// Single-threaded lock flag.
///
/// Not `Sync`, so a buffer using it cannot be shared across threads.
/// Re-entering the buffer while an operation is in progress (from a
/// `Clone` or `Drop` impl, say) panics instead of aliasing state.
#[derive(Debug)]
pub struct LocalLock {
    held: Cell<bool>,
}

unsafe impl RawLock for LocalLock {
    fn new() -> Self {
        Self {
            held: Cell::new(false),
        }
    }

    fn lock(&self) {
        if self.held.replace(true) {
            panic!("FIFO re-entered while an operation was in progress");
        }
    }

    fn try_lock(&self) -> bool {
        !self.held.replace(true)
    }

    unsafe fn unlock(&self) {
        self.held.set(false);
    }
}

/// Data guarded by a [`RawLock`].
pub(crate) struct Locked<L, T> {
    lock: L,
    data: UnsafeCell<T>,
}

// Safety: access to `data` only happens through a guard, which holds `lock`.
unsafe impl<L: RawLock + Sync, T: Send> Sync for Locked<L, T> {}

impl<L: RawLock, T> Locked<L, T> {
    pub(crate) fn new(data: T) -> Self {
        Self {
            lock: L::new(),
            data: UnsafeCell::new(data),
        }
    }

    pub(crate) fn lock(&self) -> LockGuard<'_, L, T> {
        self.lock.lock();
        LockGuard {
            owner: self,
            _not_send: PhantomData,
        }
    }

    pub(crate) fn try_lock(&self) -> Option<LockGuard<'_, L, T>> {
        self.lock.try_lock().then(|| LockGuard {
            owner: self,
            _not_send: PhantomData,
        })
    }

    pub(crate) fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

/// RAII guard; unlocks on drop.
pub(crate) struct LockGuard<'a, L: RawLock, T> {
    owner: &'a Locked<L, T>,
    _not_send: PhantomData<*const ()>,
}

impl<L: RawLock, T> Deref for LockGuard<'_, L, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: the guard holds the lock.
        unsafe { &*self.owner.data.get() }
    }
}

impl<L: RawLock, T> DerefMut for LockGuard<'_, L, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: the guard holds the lock and `&mut self` is unique.
        unsafe { &mut *self.owner.data.get() }
    }
}

impl<L: RawLock, T> Drop for LockGuard<'_, L, T> {
    fn drop(&mut self) {
        // Safety: a guard only exists while its lock is held.
        unsafe { self.owner.lock.unlock() }
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn exercise<L: RawLock>() {
        let cell: Locked<L, u32> = Locked::new(0);
        {
            let mut guard = cell.lock();
            *guard += 1;
            assert!(cell.try_lock().is_none(), "lock must be exclusive");
        }
        let guard = cell.try_lock().expect("released on drop");
        assert_eq!(*guard, 1);
    }

    #[test]
    fn test_spin_lock_exclusive() {
        exercise::<SpinLock>();
    }

    #[test]
    fn test_parking_lock_exclusive() {
        exercise::<ParkingLock>();
    }

    #[test]
    fn test_local_lock_exclusive() {
        exercise::<LocalLock>();
    }

    #[test]
    #[should_panic(expected = "re-entered")]
    fn test_local_lock_reentry_panics() {
        let cell: Locked<LocalLock, u32> = Locked::new(0);
        let _outer = cell.lock();
        let _inner = cell.lock();
    }

    #[test]
    fn test_guard_released_on_unwind() {
        let cell: Locked<SpinLock, u32> = Locked::new(0);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = cell.lock();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(cell.try_lock().is_some());
    }

    #[test]
    fn test_spin_lock_concurrent_increments() {
        let cell = Arc::new(Locked::<SpinLock, u64>::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        *cell.lock() += 1;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*cell.lock(), 4000);
    }
}
