//! Scoped preemption-disable guard.
//!
//! The clockless engine keeps interrupts masked for a whole frame. Holding
//! that state in a guard object releases it on every exit path, including
//! early returns and unwinding in host tests.

use core::marker::PhantomData;

use critical_section::{CriticalSection, RestoreState};

/// Interrupts stay disabled for as long as this value lives.
///
/// Nested guards must be dropped in reverse order of acquisition, which the
/// borrow scope of a local binding already ensures.
#[must_use = "interrupts are re-enabled as soon as the guard is dropped"]
pub struct InterruptGuard {
    state: RestoreState,
    // Release must happen on the context that acquired.
    _not_send: PhantomData<*mut ()>,
}

impl InterruptGuard {
    /// Disable interrupts until the guard is dropped.
    pub fn acquire() -> Self {
        // SAFETY: the state is handed back to `release` exactly once, in
        // `Drop`, and the guard cannot leave the acquiring context.
        let state = unsafe { critical_section::acquire() };
        Self {
            state,
            _not_send: PhantomData,
        }
    }

    /// Critical section token for `critical_section::Mutex` access.
    pub fn token(&self) -> CriticalSection<'_> {
        // SAFETY: interrupts are disabled for the lifetime of `self`.
        unsafe { CriticalSection::new() }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        // SAFETY: `state` came from the matching `acquire` in `acquire()`.
        unsafe { critical_section::release(self.state) };
    }
}
