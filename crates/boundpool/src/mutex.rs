#[cfg(feature = "parking-lot")]
pub(crate) use parking_lot::{Mutex, MutexGuard};
#[cfg(not(feature = "parking-lot"))]
pub(crate) use std::sync::{Mutex, MutexGuard};

/// Locks `mutex`, treating a poisoned std mutex as still usable.
///
/// Nothing the pool runs while holding one of its locks can panic, so a
/// poisoned guard still protects consistent state.
#[inline]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    #[cfg(feature = "parking-lot")]
    {
        mutex.lock()
    }
    #[cfg(not(feature = "parking-lot"))]
    {
        mutex
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
