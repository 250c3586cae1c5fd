use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A small, blocking counting semaphore.
///
/// Bounds how many files are open and being parsed at once.
pub struct Semaphore {
    permits: Mutex<usize>,
    cv: Condvar,
}

/// A held permit; dropping it (also during unwinding) returns the permit.
pub struct Permit<'a> {
    sem: &'a Semaphore,
    waited: Duration,
}

impl Permit<'_> {
    /// Time spent blocked before the permit was granted (zero if no wait was required).
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.sem.release();
    }
}

impl Semaphore {
    /// `permits` must be non-zero; the engine validates this before building one.
    pub fn new(permits: usize) -> Self {
        debug_assert!(permits > 0, "permits must be > 0");
        Self {
            permits: Mutex::new(permits),
            cv: Condvar::new(),
        }
    }

    /// Acquire one permit, blocking until available.
    pub fn acquire(&self) -> Permit<'_> {
        let start = Instant::now();
        let mut waited = false;
        // The guarded value is a plain counter, so a poisoned lock still holds a usable count.
        let mut g = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        while *g == 0 {
            waited = true;
            g = self.cv.wait(g).unwrap_or_else(PoisonError::into_inner);
        }
        *g -= 1;
        Permit {
            sem: self,
            waited: if waited { start.elapsed() } else { Duration::ZERO },
        }
    }

    fn release(&self) {
        let mut g = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        *g += 1;
        self.cv.notify_one();
    }

    #[cfg(test)]
    fn available(&self) -> usize {
        *self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::Semaphore;
    use std::panic::{self, AssertUnwindSafe};
    use std::time::Duration;

    #[test]
    fn uncontended_acquire_does_not_wait() {
        let sem = Semaphore::new(2);
        let a = sem.acquire();
        let b = sem.acquire();
        assert_eq!(a.waited(), Duration::ZERO);
        assert_eq!(b.waited(), Duration::ZERO);
        assert_eq!(sem.available(), 0);
        drop(a);
        assert_eq!(sem.available(), 1);
        assert_eq!(sem.acquire().waited(), Duration::ZERO);
        drop(b);
        assert_eq!(sem.available(), 2);
    }

    #[test]
    fn permit_is_returned_when_the_holder_panics() {
        let sem = Semaphore::new(1);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _permit = sem.acquire();
            panic!("parser blew up");
        }));
        assert!(result.is_err());
        assert_eq!(sem.available(), 1);
        assert_eq!(sem.acquire().waited(), Duration::ZERO);
    }
}
