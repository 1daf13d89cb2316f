//! # Stub structures for doc examples
//!
//! Nothing here touches real hardware; the bank acknowledges initialization
//! immediately and the platform/frontend implementations are no-ops.
use crate::can::{ControllerId, Platform};
use crate::dispatch::Frontend;
use crate::frame::CanFrame;
use crate::registers::{Register, RegisterBank};
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use embedded_time::clock::Error;
use embedded_time::duration::{Duration, Fraction};
use embedded_time::fixed_point::FixedPoint;
use embedded_time::timer::param::{Armed, OneShot};
use embedded_time::{Clock, Instant, Timer};

/// Register bank acknowledging every request immediately
#[derive(Default, Debug)]
pub struct ExampleBank;

impl RegisterBank for ExampleBank {
    fn read(&self, register: Register) -> u32 {
        match register {
            // Initialization mode acknowledged
            Register::MasterStatus => 0x1,
            _ => 0,
        }
    }

    fn write(&mut self, _register: Register, _value: u32) {}
}

/// Platform stub with a 45 MHz peripheral clock and no interrupt controller
#[derive(Default, Debug)]
pub struct ExamplePlatform;

impl Platform for ExamplePlatform {
    fn peripheral_clock_hz(&self) -> u32 {
        45_000_000
    }

    fn enable_clock(&mut self, _controller: ControllerId) {}

    fn disable_clock(&mut self, _controller: ControllerId) {}

    fn arm_interrupts(&mut self, _controller: ControllerId) {}

    fn disarm_interrupts(&mut self, _controller: ControllerId) {}
}

/// Frontend discarding every notification
#[derive(Default, Debug)]
pub struct ExampleFrontend;

impl<CLK: Clock> Frontend<CLK> for ExampleFrontend {
    fn on_frame_received(&self, _queue_index: u8, _timestamp: Instant<CLK>, _frame: &CanFrame) {}

    fn on_tx_complete(&self, _mailbox_index: u8, _success: bool, _timestamp: Instant<CLK>) {}
}

#[derive(Debug, PartialEq, Eq)]
pub struct ExampleClock {
    pub next_instants: RefCell<Vec<u64>>,
}

impl ExampleClock {
    pub fn new(next_instants: Vec<u64>) -> Self {
        Self {
            next_instants: RefCell::new(next_instants),
        }
    }
}

impl Default for ExampleClock {
    fn default() -> Self {
        Self::new(vec![
            100, // Start: deadline of the initialization acknowledge wait
            200, // Dispatch: first batch timestamp
            300, // Dispatch: second batch timestamp
            400,
        ])
    }
}

impl Clock for ExampleClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, Error> {
        if self.next_instants.borrow().len() == 0 {
            return Err(Error::Unspecified);
        }

        Ok(Instant::new(self.next_instants.borrow_mut().remove(0)))
    }

    fn new_timer<Dur: Duration + FixedPoint>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur> {
        Timer::new(self, duration)
    }
}
