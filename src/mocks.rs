use crate::can::{ControllerId, Platform};
use crate::dispatch::Frontend;
use crate::frame::CanFrame;
use crate::registers::{Register, RegisterBank};
use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;
use core::cell::RefCell;
use embedded_time::clock::Error;
use embedded_time::duration::Duration;
use embedded_time::fixed_point::FixedPoint;
use embedded_time::fraction::Fraction;
use embedded_time::timer::param::{Armed, OneShot};
use embedded_time::{Clock, Instant, Timer};
use mockall::mock;

#[derive(Debug, PartialEq, Eq)]
pub struct TestClock {
    pub next_instants: RefCell<Vec<u64>>,
}

impl TestClock {
    pub fn new(next_instants: Vec<u64>) -> Self {
        Self {
            next_instants: RefCell::new(next_instants),
        }
    }
}

impl Clock for TestClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, Error> {
        if self.next_instants.borrow().len() == 0 {
            return Err(Error::Unspecified);
        }

        Ok(Instant::new(self.next_instants.borrow_mut().remove(0)))
    }

    fn new_timer<Dur>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur>
    where
        Dur: Duration + FixedPoint,
    {
        Timer::new(self, duration)
    }
}

/// Scripted register bank.
///
/// Reads return queued values per register, the last queued value sticking
/// once the queue runs dry; unscripted registers read zero. Every write lands
/// in the log for sequence assertions.
#[derive(Default)]
pub struct TestBank {
    reads: RefCell<BTreeMap<u32, VecDeque<u32>>>,
    pub writes: RefCell<Vec<(Register, u32)>>,
}

impl TestBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues read values for the given register
    pub fn script_read(&self, register: Register, values: &[u32]) {
        self.reads
            .borrow_mut()
            .entry(register.offset())
            .or_default()
            .extend(values.iter().copied());
    }

    /// All values written to the given register, in order
    pub fn writes_to(&self, register: Register) -> Vec<u32> {
        self.writes
            .borrow()
            .iter()
            .filter(|(written, _)| *written == register)
            .map(|(_, value)| *value)
            .collect()
    }

    /// Complete write log in order
    pub fn write_log(&self) -> Vec<(Register, u32)> {
        self.writes.borrow().clone()
    }
}

impl RegisterBank for TestBank {
    fn read(&self, register: Register) -> u32 {
        let mut reads = self.reads.borrow_mut();
        match reads.get_mut(&register.offset()) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().copied().unwrap_or(0),
            None => 0,
        }
    }

    fn write(&mut self, register: Register, value: u32) {
        self.writes.borrow_mut().push((register, value));
    }
}

/// Platform service call recorded by [TestPlatform]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    ClockEnabled(ControllerId),
    ClockDisabled(ControllerId),
    InterruptsArmed(ControllerId),
    InterruptsDisarmed(ControllerId),
}

pub struct TestPlatform {
    pub clock_hz: u32,
    pub events: Vec<PlatformEvent>,
}

impl TestPlatform {
    pub fn new(clock_hz: u32) -> Self {
        Self {
            clock_hz,
            events: Vec::new(),
        }
    }
}

impl Platform for TestPlatform {
    fn peripheral_clock_hz(&self) -> u32 {
        self.clock_hz
    }

    fn enable_clock(&mut self, controller: ControllerId) {
        self.events.push(PlatformEvent::ClockEnabled(controller));
    }

    fn disable_clock(&mut self, controller: ControllerId) {
        self.events.push(PlatformEvent::ClockDisabled(controller));
    }

    fn arm_interrupts(&mut self, controller: ControllerId) {
        self.events.push(PlatformEvent::InterruptsArmed(controller));
    }

    fn disarm_interrupts(&mut self, controller: ControllerId) {
        self.events.push(PlatformEvent::InterruptsDisarmed(controller));
    }
}

/// Frontend recording every notification it receives
#[derive(Default)]
pub struct RecordingFrontend {
    pub received: RefCell<Vec<(u8, Instant<TestClock>, CanFrame)>>,
    pub completions: RefCell<Vec<(u8, bool, Instant<TestClock>)>>,
}

impl RecordingFrontend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Frontend<TestClock> for RecordingFrontend {
    fn on_frame_received(&self, queue_index: u8, timestamp: Instant<TestClock>, frame: &CanFrame) {
        self.received.borrow_mut().push((queue_index, timestamp, *frame));
    }

    fn on_tx_complete(&self, mailbox_index: u8, success: bool, timestamp: Instant<TestClock>) {
        self.completions.borrow_mut().push((mailbox_index, success, timestamp));
    }
}

/// Frontend discarding every notification
#[derive(Default)]
pub struct NoopFrontend;

impl<CLK: Clock> Frontend<CLK> for NoopFrontend {
    fn on_frame_received(&self, _queue_index: u8, _timestamp: Instant<CLK>, _frame: &CanFrame) {}

    fn on_tx_complete(&self, _mailbox_index: u8, _success: bool, _timestamp: Instant<CLK>) {}
}

mock! {
    pub Bank {}

    impl RegisterBank for Bank {
        fn read(&self, register: Register) -> u32;
        fn write(&mut self, register: Register, value: u32);
    }
}
