#![allow(dead_code)]

//! Simulated hardware shared by the integration tests.
//!
//! A [`Bench`] holds the state every mock reads and writes: a CPU cycle
//! counter that ticks once per read, a microsecond wall clock and the log of
//! pin edges. [`MockChannels`] plays waveform halves one per
//! `wait_for_event` call and posts the notifications a real peripheral
//! would raise.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::marker::PhantomData;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};
use myrtio_led_driver::timing::CycleTiming;
use myrtio_led_driver::{
    ChannelEvent, ChannelPeripheral, ChipsetTiming, Clock, CompletionGate, EventSender,
    FrameDispatcher, Half, Instant, Platform, Rgb, WaveWord, scale_dithered,
};

pub const CPU_HZ: u32 = 16_000_000;
pub const TICK_HZ: u32 = 40_000_000;
/// Time the simulated peripheral needs to play one buffer half.
pub const HALF_INTERVAL_US: u64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub pin: usize,
    pub high: bool,
    pub cycle: u32,
}

/// One high pulse on a pin, in cycle counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub rise: u32,
    pub fall: u32,
}

impl Pulse {
    pub fn high(self) -> u32 {
        self.fall.wrapping_sub(self.rise)
    }
}

#[derive(Debug, Default)]
pub struct Bench {
    cycles: Cell<u32>,
    micros: Cell<u64>,
    edges: RefCell<Vec<Edge>>,
}

impl Bench {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn cycles(&self) -> u32 {
        self.cycles.get()
    }

    pub fn micros(&self) -> u64 {
        self.micros.get()
    }

    /// Spend `cycles` CPU cycles without reading the counter.
    pub fn charge(&self, cycles: u32) {
        self.cycles.set(self.cycles.get().wrapping_add(cycles));
    }

    pub fn advance_micros(&self, micros: u64) {
        self.micros.set(self.micros.get() + micros);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance_micros(millis * 1000);
    }

    pub fn edges_of(&self, pin: usize) -> Vec<Edge> {
        self.edges
            .borrow()
            .iter()
            .filter(|edge| edge.pin == pin)
            .copied()
            .collect()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.edges.borrow().clone()
    }

    pub fn clear_edges(&self) {
        self.edges.borrow_mut().clear();
    }

    fn record(&self, pin: usize, high: bool) {
        self.edges.borrow_mut().push(Edge {
            pin,
            high,
            cycle: self.cycles.get(),
        });
    }
}

#[derive(Debug)]
/// Byte source that burns `cost` cycles on every fetch.
pub struct Costly<I> {
    inner: I,
    bench: Rc<Bench>,
    cost: u32,
}

impl<I> Costly<I> {
    pub fn new(inner: I, bench: &Rc<Bench>, cost: u32) -> Self {
        Self {
            inner,
            bench: Rc::clone(bench),
            cost,
        }
    }
}

impl<I: Iterator<Item = u8>> Iterator for Costly<I> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        self.bench.charge(self.cost);
        self.inner.next()
    }
}

thread_local! {
    static ADJUSTER_COST: RefCell<Option<(Rc<Bench>, u32)>> = const { RefCell::new(None) };
}

/// Make [`costly_adjuster`] burn `cost` cycles of `bench` per call.
pub fn set_adjuster_cost(bench: &Rc<Bench>, cost: u32) {
    ADJUSTER_COST.with(|slot| *slot.borrow_mut() = Some((Rc::clone(bench), cost)));
}

/// Default adjustment that takes as long as a real one.
pub fn costly_adjuster(value: u8, scale: u8, dither: u8) -> u8 {
    ADJUSTER_COST.with(|slot| {
        if let Some((bench, cost)) = slot.borrow().as_ref() {
            bench.charge(*cost);
        }
    });
    scale_dithered(value, scale, dither)
}

#[derive(Debug)]
pub struct MockClock {
    bench: Rc<Bench>,
    cpu_hz: u32,
}

impl MockClock {
    pub fn new(bench: &Rc<Bench>, cpu_hz: u32) -> Self {
        Self {
            bench: Rc::clone(bench),
            cpu_hz,
        }
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.bench.micros.get())
    }

    fn cycles(&self) -> u32 {
        let cycles = self.bench.cycles.get();
        self.bench.cycles.set(cycles.wrapping_add(1));
        cycles
    }

    fn cpu_hz(&self) -> u32 {
        self.cpu_hz
    }

    fn wait_until(&self, deadline: Instant) {
        let target = deadline.as_micros();
        if target > self.bench.micros.get() {
            self.bench.micros.set(target);
        }
    }
}

#[derive(Debug)]
pub struct MockPin {
    id: usize,
    bench: Rc<Bench>,
}

impl MockPin {
    pub fn new(bench: &Rc<Bench>, id: usize) -> Self {
        Self {
            id,
            bench: Rc::clone(bench),
        }
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bench.record(self.id, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bench.record(self.id, true);
        Ok(())
    }
}

/// Peripheral activity, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotLog {
    Start { slot: usize, pin: u8 },
    Stop { slot: usize, pin: u8 },
}

#[derive(Debug, Default)]
struct SlotSim {
    pin: u8,
    halves: [Vec<WaveWord>; 2],
    playing: usize,
    active: bool,
    held: Option<ChannelEvent>,
}

pub struct MockChannels<'a> {
    bench: Rc<Bench>,
    sender: EventSender<'a>,
    slots: Vec<SlotSim>,
    words: BTreeMap<u8, Vec<WaveWord>>,
    log: Vec<SlotLog>,
    idle_calls: usize,
    start_idle_calls: Vec<usize>,
    release_gate: Option<(&'a CompletionGate, usize)>,
    stall: Option<(usize, u64)>,
    late_slot: Option<(usize, usize)>,
}

impl<'a> MockChannels<'a> {
    pub fn new(bench: &Rc<Bench>, sender: EventSender<'a>, slots: usize) -> Self {
        Self {
            bench: Rc::clone(bench),
            sender,
            slots: (0..slots).map(|_| SlotSim::default()).collect(),
            words: BTreeMap::new(),
            log: Vec::new(),
            idle_calls: 0,
            start_idle_calls: Vec::new(),
            release_gate: None,
            stall: None,
            late_slot: None,
        }
    }

    /// Give `gate` back on the `after`-th idle call, as another session would.
    pub fn release_gate_after(mut self, gate: &'a CompletionGate, after: usize) -> Self {
        self.release_gate = Some((gate, after));
        self
    }

    /// Delay the `call`-th idle call by `extra_us`.
    pub fn stall_at(mut self, call: usize, extra_us: u64) -> Self {
        self.stall = Some((call, extra_us));
        self
    }

    /// Hold back `slot`'s notification from the `call`-th idle call until
    /// the next one, while the other slots keep running.
    pub fn late_on_slot(mut self, slot: usize, call: usize) -> Self {
        self.late_slot = Some((slot, call));
        self
    }

    /// Every waveform word played on `pin`.
    pub fn words(&self, pin: u8) -> &[WaveWord] {
        self.words.get(&pin).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn log(&self) -> &[SlotLog] {
        &self.log
    }

    /// Pins in the order they were started.
    pub fn start_order(&self) -> Vec<u8> {
        self.log
            .iter()
            .filter_map(|entry| match entry {
                SlotLog::Start { pin, .. } => Some(*pin),
                SlotLog::Stop { .. } => None,
            })
            .collect()
    }

    /// Number of starts on each slot.
    pub fn starts_per_slot(&self) -> Vec<usize> {
        let mut counts = vec![0; self.slots.len()];
        for entry in &self.log {
            if let SlotLog::Start { slot, .. } = entry {
                counts[*slot] += 1;
            }
        }
        counts
    }

    /// Idle calls seen before each start.
    pub fn start_idle_calls(&self) -> &[usize] {
        &self.start_idle_calls
    }

    pub fn idle_calls(&self) -> usize {
        self.idle_calls
    }

    fn post(&self, event: ChannelEvent) {
        self.sender.post(event).expect("event queue overflow");
    }
}

impl ChannelPeripheral for MockChannels<'_> {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn tick_hz(&self) -> u32 {
        TICK_HZ
    }

    fn attach(&mut self, slot: usize, pin: u8) {
        self.slots[slot].pin = pin;
    }

    fn load(&mut self, slot: usize, half: Half, words: &[WaveWord]) {
        let index = match half {
            Half::First => 0,
            Half::Second => 1,
        };
        self.slots[slot].halves[index] = words.to_vec();
    }

    fn start(&mut self, slot: usize) {
        let sim = &mut self.slots[slot];
        sim.active = true;
        sim.playing = 0;
        self.log.push(SlotLog::Start { slot, pin: sim.pin });
        self.start_idle_calls.push(self.idle_calls);
    }

    fn stop(&mut self, slot: usize) {
        let sim = &mut self.slots[slot];
        sim.active = false;
        self.log.push(SlotLog::Stop { slot, pin: sim.pin });
    }

    fn wait_for_event(&mut self) {
        self.idle_calls += 1;
        if let Some((gate, after)) = self.release_gate
            && self.idle_calls >= after
        {
            gate.release();
            self.release_gate = None;
        }

        let mut advance = HALF_INTERVAL_US;
        if let Some((call, extra)) = self.stall
            && call == self.idle_calls
        {
            advance += extra;
        }
        self.bench.advance_micros(advance);

        let late_slot = self.late_slot;
        let call = self.idle_calls;
        let mut events = Vec::new();
        for (slot, sim) in self.slots.iter_mut().enumerate() {
            if let Some(event) = sim.held.take() {
                events.push(event);
                continue;
            }
            if !sim.active {
                continue;
            }
            let half = &sim.halves[sim.playing];
            let played: Vec<WaveWord> = half
                .iter()
                .take_while(|word| !word.is_idle())
                .copied()
                .collect();
            let reached_end = played.len() < half.len();
            self.words.entry(sim.pin).or_default().extend(played);

            let event = if reached_end {
                sim.active = false;
                ChannelEvent::Done(slot)
            } else {
                sim.playing ^= 1;
                ChannelEvent::Refill(slot)
            };
            if late_slot == Some((slot, call)) {
                sim.held = Some(event);
            } else {
                events.push(event);
            }
        }
        for event in events {
            self.post(event);
        }
    }
}

pub struct MockPlatform<'a>(PhantomData<&'a ()>);

impl<'a> Platform for MockPlatform<'a> {
    type Pin = MockPin;
    type Clock = MockClock;
    type Channels = MockChannels<'a>;
}

pub type Dispatcher<'a, const N: usize> = FrameDispatcher<'a, MockPlatform<'a>, N>;

/// Pixel buffer holding `colors`.
pub fn leds(colors: &[Rgb]) -> Vec<Cell<Rgb>> {
    colors.iter().copied().map(Cell::new).collect()
}

/// High pulses in an edge log, skipping redundant edges.
pub fn pulses(edges: &[Edge]) -> Vec<Pulse> {
    let mut pulses = Vec::new();
    let mut rise = None;
    for edge in edges {
        match (edge.high, rise) {
            (true, None) => rise = Some(edge.cycle),
            (false, Some(start)) => {
                pulses.push(Pulse {
                    rise: start,
                    fall: edge.cycle,
                });
                rise = None;
            }
            _ => {}
        }
    }
    pulses
}

/// Decode clockless pulses into bytes, checking every bit against `timing`.
pub fn decode_pulses(pulses: &[Pulse], timing: CycleTiming) -> Vec<u8> {
    assert_eq!(pulses.len() % 8, 0, "partial byte on the wire");
    pulses
        .chunks(8)
        .map(|bits| {
            bits.iter().fold(0u8, |byte, pulse| {
                let bit = if pulse.high() == timing.high(true) {
                    1
                } else {
                    assert_eq!(pulse.high(), timing.high(false), "bad pulse width");
                    0
                };
                (byte << 1) | bit
            })
        })
        .collect()
}

/// Decode waveform words into bytes.
pub fn decode_words(words: &[WaveWord], timing: ChipsetTiming) -> Vec<u8> {
    let ticks = timing.to_cycles(TICK_HZ);
    let zero = WaveWord::pulse(ticks.high(false), ticks.low(false));
    let one = WaveWord::pulse(ticks.high(true), ticks.low(true));
    assert_eq!(words.len() % 8, 0, "partial byte in waveform");
    words
        .chunks(8)
        .map(|bits| {
            bits.iter().fold(0u8, |byte, word| {
                let bit = if *word == one {
                    1
                } else {
                    assert_eq!(*word, zero, "unexpected waveform word");
                    0
                };
                (byte << 1) | bit
            })
        })
        .collect()
}

/// Decode a bit-banged clocked transmission on `data` / `clock` pins.
pub fn decode_spi(edges: &[Edge], data: usize, clock: usize) -> Vec<u8> {
    let mut level = false;
    let mut bits = Vec::new();
    for edge in edges {
        if edge.pin == data {
            level = edge.high;
        } else if edge.pin == clock && edge.high {
            bits.push(level);
        }
    }
    assert_eq!(bits.len() % 8, 0, "partial byte on the data line");
    bits.chunks(8)
        .map(|bits| bits.iter().fold(0u8, |byte, &bit| (byte << 1) | u8::from(bit)))
        .collect()
}
