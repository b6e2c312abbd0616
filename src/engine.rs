//! Hardware channel scheduler.
//!
//! Multiplexes any number of hardware-assisted controllers over the few
//! slots a channel peripheral offers. Controllers queued during a frame are
//! started in registration order on free slots; whenever a slot reports done
//! the next waiting controller takes it over. The session ends, and the
//! completion gate opens, once every started controller has finished.

use core::convert::Infallible;

use embassy_time::{Duration, Instant};
use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::controller::Controller;
use crate::error::{Error, Result};
use crate::event::{ChannelEvent, EventReceiver};
use crate::gate::CompletionGate;
use crate::log::log;
use crate::platform::{ChannelPeripheral, Clock};
use crate::rmt::Refill;

/// Largest slot table the engine manages.
pub const MAX_CHANNEL_SLOTS: usize = 8;

/// Channel scheduler for one peripheral.
///
/// N is the maximum number of controllers that can be queued in a session.
pub struct HardwareEngine<'a, H, const N: usize> {
    peripheral: H,
    events: EventReceiver<'a>,
    gate: &'a CompletionGate,
    /// Controller index bound to each slot.
    slots: Vec<Option<usize>, MAX_CHANNEL_SLOTS>,
    /// Controllers waiting for this session, in registration order.
    queue: Vec<usize, N>,
    next_to_start: usize,
    started: usize,
    finished: usize,
    underruns: usize,
    underrun_ratio: (u32, u32),
    last_session_end: Option<Instant>,
}

impl<'a, H: ChannelPeripheral, const N: usize> HardwareEngine<'a, H, N> {
    /// Create a scheduler over `peripheral`.
    ///
    /// `max_channels` caps the number of slots used.
    pub fn new(
        peripheral: H,
        events: EventReceiver<'a>,
        gate: &'a CompletionGate,
        max_channels: Option<usize>,
        underrun_ratio: (u32, u32),
    ) -> Result<Self> {
        let available = peripheral.slot_count();
        let count = available
            .min(max_channels.unwrap_or(MAX_CHANNEL_SLOTS))
            .min(MAX_CHANNEL_SLOTS);
        if count == 0 {
            return Err(Error::UnsupportedSlotCount(available));
        }

        let mut slots = Vec::new();
        slots
            .resize(count, None)
            .map_err(|()| Error::UnsupportedSlotCount(available))?;

        Ok(Self {
            peripheral,
            events,
            gate,
            slots,
            queue: Vec::new(),
            next_to_start: 0,
            started: 0,
            finished: 0,
            underruns: 0,
            underrun_ratio,
            last_session_end: None,
        })
    }

    /// Number of slots in use.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub const fn peripheral(&self) -> &H {
        &self.peripheral
    }

    pub fn peripheral_mut(&mut self) -> &mut H {
        &mut self.peripheral
    }

    /// Controllers started in the current or last session.
    pub const fn started(&self) -> usize {
        self.started
    }

    /// Controllers finished in the current or last session.
    pub const fn finished(&self) -> usize {
        self.finished
    }

    /// Refills that came too late since the engine was created.
    pub const fn underruns(&self) -> usize {
        self.underruns
    }

    /// Controllers waiting for the next session.
    pub fn pending(&self) -> &[usize] {
        &self.queue
    }

    /// Controller bound to `slot`, if any.
    pub fn binding(&self, slot: usize) -> Option<usize> {
        self.slots.get(slot).copied().flatten()
    }

    /// Add a controller to the next session.
    pub fn enqueue(&mut self, index: usize) -> Result<()> {
        self.queue.push(index).map_err(|_| Error::QueueFull)
    }

    /// Transmit every queued controller and return once all are done.
    ///
    /// Blocks on the completion gate, first until any other session has
    /// released it and then until the last channel of this session has
    /// finished. There is no timeout: a channel that never reports done keeps
    /// this call waiting.
    pub fn run_session<'b, P, C>(&mut self, controllers: &mut [Controller<'b, P>], clock: &C)
    where
        P: OutputPin<Error = Infallible>,
        C: Clock,
    {
        if self.queue.is_empty() {
            return;
        }

        let gate = self.gate;
        let peripheral = &mut self.peripheral;
        gate.acquire(|| peripheral.wait_for_event());
        self.events.discard_pending();

        let latch = self
            .queue
            .iter()
            .filter_map(|&index| controllers.get(index))
            .map(Controller::latch)
            .max()
            .unwrap_or(Duration::from_ticks(0));
        if let Some(end) = self.last_session_end {
            clock.wait_until(end + latch);
        }

        self.next_to_start = 0;
        self.started = 0;
        self.finished = 0;
        log!(
            "[HardwareEngine.run_session] {} controllers on {} slots",
            self.queue.len(),
            self.slots.len()
        );

        for slot in 0..self.slots.len() {
            if !self.start_next(slot, controllers, clock.now()) {
                break;
            }
        }
        if self.started == 0 {
            gate.release();
        }

        while !gate.is_free() {
            match self.events.try_receive() {
                Some(event) => self.handle(event, controllers, clock.now()),
                None => self.peripheral.wait_for_event(),
            }
        }

        self.queue.clear();
        self.last_session_end = Some(clock.now());
        log!(
            "[HardwareEngine.run_session] done, {} controllers finished",
            self.finished
        );
    }

    /// Apply one channel notification.
    pub fn handle<'b, P>(
        &mut self,
        event: ChannelEvent,
        controllers: &mut [Controller<'b, P>],
        now: Instant,
    ) where
        P: OutputPin<Error = Infallible>,
    {
        match event {
            ChannelEvent::Refill(slot) => self.refill(slot, controllers, now),
            ChannelEvent::Done(slot) => self.done_on_channel(slot, controllers, now),
        }
    }

    fn refill<'b, P>(&mut self, slot: usize, controllers: &mut [Controller<'b, P>], now: Instant)
    where
        P: OutputPin<Error = Infallible>,
    {
        let Some(index) = self.binding(slot) else {
            return;
        };
        let Some(controller) = controllers
            .get_mut(index)
            .and_then(Controller::as_hardware_mut)
        else {
            return;
        };
        if controller.refill(&mut self.peripheral, now) == Refill::Underrun {
            self.underruns += 1;
            log!(
                "[HardwareEngine.refill] underrun on slot {}, frame of controller {} truncated",
                slot,
                index
            );
        }
    }

    /// Release `slot` and hand it to the next waiting controller.
    ///
    /// Opens the completion gate when nothing is waiting and every started
    /// controller has finished.
    pub fn done_on_channel<'b, P>(
        &mut self,
        slot: usize,
        controllers: &mut [Controller<'b, P>],
        now: Instant,
    ) where
        P: OutputPin<Error = Infallible>,
    {
        let Some(index) = self.slots.get_mut(slot).and_then(Option::take) else {
            return;
        };
        if let Some(controller) = controllers
            .get_mut(index)
            .and_then(Controller::as_hardware_mut)
        {
            controller.finish(&mut self.peripheral);
        }
        self.finished += 1;

        if self.start_next(slot, controllers, now) {
            return;
        }
        if self.finished == self.started {
            self.gate.release();
        }
    }

    /// Bind the next waiting controller to `slot` and start it.
    fn start_next<'b, P>(
        &mut self,
        slot: usize,
        controllers: &mut [Controller<'b, P>],
        now: Instant,
    ) -> bool
    where
        P: OutputPin<Error = Infallible>,
    {
        while let Some(&index) = self.queue.get(self.next_to_start) {
            self.next_to_start += 1;
            let Some(controller) = controllers
                .get_mut(index)
                .and_then(Controller::as_hardware_mut)
            else {
                continue;
            };

            let budget = controller.refill_budget(self.underrun_ratio);
            controller.begin(slot, &mut self.peripheral, now, budget);
            if let Some(binding) = self.slots.get_mut(slot) {
                *binding = Some(index);
            }
            self.started += 1;
            log!(
                "[HardwareEngine.start_next] controller {} on slot {}",
                index,
                slot
            );
            return true;
        }
        false
    }
}
