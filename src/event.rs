//! Channel notifications.
//!
//! The channel peripheral's interrupt handler posts one [`ChannelEvent`] per
//! "half consumed" or "transmission done" notification. The hardware engine
//! drains them while the frame dispatcher waits on the completion gate.
//! The queue is a `heapless::Deque` behind a critical section, so posting is
//! allocation free and safe from interrupt context.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

/// Pending notifications the queue can hold.
///
/// Each active slot has at most one refill and one done notification
/// outstanding, so this covers the largest slot table.
pub const EVENT_QUEUE_SIZE: usize = 16;

/// Notification raised by a hardware channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelEvent {
    /// One half of the slot's double buffer was consumed and may be refilled.
    Refill(usize),
    /// The slot reached the end of its waveform.
    Done(usize),
}

impl ChannelEvent {
    /// Slot the event belongs to.
    pub const fn slot(self) -> usize {
        match self {
            Self::Refill(slot) | Self::Done(slot) => slot,
        }
    }
}

/// Returned when the queue has no room for another notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostError(pub ChannelEvent);

/// Bounded notification queue shared by the interrupt handler and the engine.
pub struct EventQueue {
    inner: Mutex<RefCell<Deque<ChannelEvent, EVENT_QUEUE_SIZE>>>,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Handle for the interrupt side.
    pub const fn sender(&self) -> EventSender<'_> {
        EventSender { queue: self }
    }

    /// Handle for the engine side.
    pub const fn receiver(&self) -> EventReceiver<'_> {
        EventReceiver { queue: self }
    }

    fn post(&self, event: ChannelEvent) -> Result<(), PostError> {
        critical_section::with(|cs| {
            let mut queue = self.inner.borrow(cs).borrow_mut();
            queue.push_back(event).map_err(PostError)
        })
    }

    fn take(&self) -> Option<ChannelEvent> {
        critical_section::with(|cs| self.inner.borrow(cs).borrow_mut().pop_front())
    }

    fn clear(&self) {
        critical_section::with(|cs| self.inner.borrow(cs).borrow_mut().clear());
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Posting side of an [`EventQueue`].
#[derive(Clone, Copy)]
pub struct EventSender<'a> {
    queue: &'a EventQueue,
}

impl EventSender<'_> {
    /// Post a notification; call from the peripheral's interrupt handler.
    pub fn post(&self, event: ChannelEvent) -> Result<(), PostError> {
        self.queue.post(event)
    }
}

/// Draining side of an [`EventQueue`].
#[derive(Clone, Copy)]
pub struct EventReceiver<'a> {
    queue: &'a EventQueue,
}

impl EventReceiver<'_> {
    /// Next pending notification, if any.
    pub fn try_receive(&self) -> Option<ChannelEvent> {
        self.queue.take()
    }

    /// Drop notifications left over from an earlier session.
    pub fn discard_pending(&self) {
        self.queue.clear();
    }
}
