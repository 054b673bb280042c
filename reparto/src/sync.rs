//! Synchronization primitives with conditional compilation.
//!
//! Provides a reader-writer lock that uses `parking_lot::RwLock` when the
//! `fast-lock` feature is enabled, falling back to `std::sync::RwLock`
//! otherwise.
//!
//! Locks are not re-entrant: a caller holding a write guard must not call
//! back into a method that takes the same lock.

#[cfg(feature = "fast-lock")]
use parking_lot::RwLock as ParkingLotRwLock;

#[cfg(not(feature = "fast-lock"))]
use std::sync::RwLock as StdRwLock;

/// Reader-writer lock that conditionally uses parking_lot or std.
///
/// # Example
///
/// ```rust
/// use reparto::sync::{read, write, RwLock};
///
/// let data = RwLock::new(1);
/// *write(&data) = 2;
/// assert_eq!(*read(&data), 2);
/// ```
#[cfg(feature = "fast-lock")]
pub type RwLock<T> = ParkingLotRwLock<T>;

#[cfg(not(feature = "fast-lock"))]
pub type RwLock<T> = StdRwLock<T>;

/// Acquire a shared read guard, recovering from poisoning.
#[cfg(feature = "fast-lock")]
pub fn read<T>(lock: &RwLock<T>) -> parking_lot::RwLockReadGuard<'_, T> {
    lock.read()
}

#[cfg(not(feature = "fast-lock"))]
pub fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

/// Acquire an exclusive write guard, recovering from poisoning.
#[cfg(feature = "fast-lock")]
pub fn write<T>(lock: &RwLock<T>) -> parking_lot::RwLockWriteGuard<'_, T> {
    lock.write()
}

#[cfg(not(feature = "fast-lock"))]
pub fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
