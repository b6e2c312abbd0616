//! Completion gate.
//!
//! A binary semaphore shared between the frame dispatcher and the channel
//! notification path. The dispatcher takes it when a transmission session
//! starts and blocks until the last finishing channel gives it back.

use core::cell::Cell;

use critical_section::Mutex;

/// Binary semaphore built on critical sections.
pub struct CompletionGate {
    taken: Mutex<Cell<bool>>,
}

impl CompletionGate {
    pub const fn new() -> Self {
        Self {
            taken: Mutex::new(Cell::new(false)),
        }
    }

    /// Take the gate if it is free.
    ///
    /// Returns `false` if a session already holds it.
    pub fn try_acquire(&self) -> bool {
        critical_section::with(|cs| {
            let taken = self.taken.borrow(cs);
            if taken.get() {
                false
            } else {
                taken.set(true);
                true
            }
        })
    }

    /// Take the gate, calling `idle` while another session holds it.
    pub fn acquire(&self, mut idle: impl FnMut()) {
        while !self.try_acquire() {
            idle();
        }
    }

    /// Give the gate back, waking whoever waits on it.
    pub fn release(&self) {
        critical_section::with(|cs| self.taken.borrow(cs).set(false));
    }

    pub fn is_free(&self) -> bool {
        critical_section::with(|cs| !self.taken.borrow(cs).get())
    }
}

impl Default for CompletionGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_holder_at_a_time() {
        let gate = CompletionGate::new();
        assert!(gate.is_free());
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
        assert!(!gate.is_free());
        gate.release();
        assert!(gate.try_acquire());
    }

    #[test]
    fn acquire_idles_until_released() {
        let gate = CompletionGate::new();
        assert!(gate.try_acquire());
        let mut idle = 0;
        gate.acquire(|| {
            idle += 1;
            if idle == 2 {
                gate.release();
            }
        });
        assert_eq!(idle, 2);
        assert!(!gate.is_free());
    }
}
