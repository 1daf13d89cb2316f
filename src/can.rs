//!# CAN controller instance
//!
//!```
//!# use bxcan_driver::can::{BxCan, CanController, Configuration, ControllerId};
//!# use bxcan_driver::example::{ExampleBank, ExampleClock, ExampleFrontend, ExamplePlatform};
//!#
//! let clock = ExampleClock::default();
//! let frontend = ExampleFrontend;
//!
//! // Register the first controller instance
//! let mut controller = BxCan::new(
//!     ControllerId::Primary,
//!     ExampleBank::default(),
//!     ExamplePlatform,
//!     &frontend,
//! );
//!
//! // Bring the bus up with the default configuration
//! controller.start(&Configuration::default(), &clock).unwrap();
//! ```

use crate::dispatch::Frontend;
use crate::filter;
use crate::frame::CanFrame;
use crate::mailbox::{self, TxMailboxState};
use crate::registers::{
    BitTimingReg, InterruptEnableReg, MasterControlReg, MasterStatusReg, Register, RegisterBank,
};
use crate::status::ErrorStatus;
use crate::timing::{BitTiming, TimingError};
use core::marker::PhantomData;
use embedded_time::duration::Milliseconds;
use embedded_time::Clock;
use log::debug;

/// Hardware transmit mailboxes per controller
pub const TX_MAILBOX_COUNT: usize = 3;

/// Hardware receive queues per controller
pub const RX_QUEUE_COUNT: usize = 2;

/// Frames one receive queue can buffer
pub const RX_QUEUE_DEPTH: usize = 3;

/// Identity of one physical controller.
///
/// Replaces context-pointer comparison for routing: every instance carries its
/// identity explicitly. [ControllerId::Primary] owns the shared filter bank.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControllerId {
    Primary,
    Secondary,
}

impl ControllerId {
    /// Bus index used to route interrupts and register banks
    pub fn index(self) -> u8 {
        match self {
            ControllerId::Primary => 0,
            ControllerId::Secondary => 1,
        }
    }

    /// The filter bank is shared hardware programmed by the primary instance only
    pub(crate) fn owns_filter_bank(self) -> bool {
        matches!(self, ControllerId::Primary)
    }
}

/// Lifecycle state of a controller instance
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControllerState {
    Stopped,
    Started,
}

/// Bus configuration applied by [CanController::start]
#[derive(Clone, Debug)]
pub struct Configuration {
    /// Target bus bit rate in bit/s
    pub bit_rate: u32,

    /// Listen without driving the bus
    pub silent: bool,

    /// Route transmitted frames back into the receive path
    pub loopback: bool,

    /// Retransmit automatically on arbitration loss or error
    pub automatic_retransmission: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            bit_rate: 500_000,
            silent: false,
            loopback: false,
            automatic_retransmission: true,
        }
    }
}

/// Possible CAN errors during controller operation
#[derive(Debug, PartialEq, Eq)]
pub enum CanError {
    /// No legal bus timing exists for the requested bit rate
    Timing(TimingError),
    /// The peripheral did not acknowledge initialization mode in time
    HardwareNotResponding,
    /// Transmit mailbox index out of range
    InvalidMailboxIndex(u8),
    /// Receive queue index out of range
    InvalidQueueIndex(u8),
    /// Internal clock error
    ClockError,
}

impl From<TimingError> for CanError {
    fn from(value: TimingError) -> Self {
        CanError::Timing(value)
    }
}

impl From<embedded_time::clock::Error> for CanError {
    fn from(_error: embedded_time::clock::Error) -> Self {
        CanError::ClockError
    }
}

/// Platform services outside the controller register bank.
///
/// Clock-tree and interrupt-controller bring-up stay with the platform layer;
/// the driver only tells it when to switch either on or off.
pub trait Platform {
    /// Frequency of the clock feeding the CAN peripherals
    fn peripheral_clock_hz(&self) -> u32;

    /// Enables the peripheral clock of the given controller
    fn enable_clock(&mut self, controller: ControllerId);

    /// Disables the peripheral clock of the given controller
    fn disable_clock(&mut self, controller: ControllerId);

    /// Arms the transmit and receive interrupt lines of the given controller
    fn arm_interrupts(&mut self, controller: ControllerId);

    /// Disarms the interrupt lines of the given controller
    fn disarm_interrupts(&mut self, controller: ControllerId);
}

/// Trait for CAN controller
pub trait CanController<CLK: Clock> {
    type Error;

    /// Starts the controller: applies bus timing for the configured bit rate,
    /// arms the interrupt sources and enables reception on all queues
    fn start(&mut self, config: &Configuration, clock: &CLK) -> Result<(), Self::Error>;

    /// Stops the controller unconditionally, valid in any state
    fn stop(&mut self);

    /// Loads a frame into the given mailbox and requests transmission.
    ///
    /// The mailbox is [TxMailboxState::Pending] afterwards. Loading a mailbox
    /// that is already pending overwrites it; avoiding that is the caller's
    /// responsibility.
    fn load_mailbox(&mut self, index: u8, frame: &CanFrame) -> Result<(), Self::Error>;

    /// Requests cancellation of a pending transmission.
    ///
    /// Best effort: the frame may be sent anyway. A completion notification
    /// follows either way.
    fn abort_mailbox(&mut self, index: u8) -> Result<(), Self::Error>;
}

/// One physical CAN controller instance.
///
/// The instance exclusively owns its mailbox and queue state; the frontend is
/// only ever reached through notification callbacks and must outlive the
/// driver.
pub struct BxCan<'f, B: RegisterBank, P: Platform, F: Frontend<CLK>, CLK: Clock> {
    id: ControllerId,
    pub(crate) bank: B,
    pub(crate) platform: P,
    pub(crate) frontend: &'f F,
    state: ControllerState,
    pub(crate) mailboxes: [TxMailboxState; TX_MAILBOX_COUNT],
    clock: PhantomData<CLK>,
}

impl<'f, B, P, F, CLK> BxCan<'f, B, P, F, CLK>
where
    B: RegisterBank,
    P: Platform,
    F: Frontend<CLK>,
    CLK: Clock,
{
    /// Registers a controller instance over the given register bank
    pub fn new(id: ControllerId, bank: B, platform: P, frontend: &'f F) -> Self {
        Self {
            id,
            bank,
            platform,
            frontend,
            state: ControllerState::Stopped,
            mailboxes: [TxMailboxState::Idle; TX_MAILBOX_COUNT],
            clock: Default::default(),
        }
    }

    /// Identity of this instance
    pub fn id(&self) -> ControllerId {
        self.id
    }

    /// Current lifecycle state
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Reads and returns the error state of the controller
    pub fn read_error_status(&self) -> ErrorStatus {
        ErrorStatus::from_register(self.bank.read(Register::ErrorStatus))
    }

    /// Blocks until the peripheral acknowledges initialization mode,
    /// giving up after 2 ms
    fn wait_for_init_ack(&mut self, clock: &CLK) -> Result<(), CanError> {
        let deadline = clock
            .try_now()?
            .checked_add(Milliseconds::new(2))
            .ok_or(CanError::ClockError)?;

        while !MasterStatusReg::from(self.bank.read(Register::MasterStatus)).inak() {
            if clock.try_now()? > deadline {
                debug!(
                    "controller {} did not acknowledge initialization mode",
                    self.id.index()
                );
                return Err(CanError::HardwareNotResponding);
            }
        }

        Ok(())
    }
}

impl<'f, B, P, F, CLK> CanController<CLK> for BxCan<'f, B, P, F, CLK>
where
    B: RegisterBank,
    P: Platform,
    F: Frontend<CLK>,
    CLK: Clock,
{
    type Error = CanError;

    fn start(&mut self, config: &Configuration, clock: &CLK) -> Result<(), CanError> {
        self.platform.enable_clock(self.id);

        critical_section::with(|_| {
            let control = MasterControlReg::from(self.bank.read(Register::MasterControl));
            self.bank.write(
                Register::MasterControl,
                control.with_sleep(false).with_inrq(true).into(),
            );

            // Interrupts stay quiet until the bus is reconfigured
            self.bank.write(Register::InterruptEnable, 0);
        });

        self.wait_for_init_ack(clock)?;

        // A timing failure leaves the controller un-programmed and stopped
        let timing = BitTiming::from_bit_rate(self.platform.peripheral_clock_hz(), config.bit_rate)?;

        let timing_reg = BitTimingReg::new()
            .with_silm(config.silent)
            .with_lbkm(config.loopback)
            .with_sjw(0)
            .with_ts1(timing.time_segment_1 - 1)
            .with_ts2(timing.time_segment_2 - 1)
            .with_brp(timing.prescaler - 1);

        critical_section::with(|_| {
            self.bank.write(Register::BitTiming, timing_reg.into());

            // Leaving INRQ clear releases the peripheral into normal mode
            self.bank.write(
                Register::MasterControl,
                MasterControlReg::new()
                    .with_abom(true)
                    .with_awum(true)
                    .with_nart(!config.automatic_retransmission)
                    .into(),
            );

            self.bank.write(
                Register::InterruptEnable,
                InterruptEnableReg::new().with_tmeie(true).with_fmpie0(true).into(),
            );
        });

        if self.id.owns_filter_bank() {
            critical_section::with(|_| filter::configure_accept_all(&mut self.bank));
        }

        self.platform.arm_interrupts(self.id);
        self.state = ControllerState::Started;

        Ok(())
    }

    fn stop(&mut self) {
        critical_section::with(|_| {
            // Reset-value configuration: sleeping, debug freeze, everything else off
            self.bank.write(
                Register::MasterControl,
                MasterControlReg::new().with_dbf(true).with_sleep(true).into(),
            );
            self.bank.write(Register::InterruptEnable, 0);
            self.mailboxes = [TxMailboxState::Idle; TX_MAILBOX_COUNT];
        });

        self.platform.disarm_interrupts(self.id);
        self.platform.disable_clock(self.id);
        self.state = ControllerState::Stopped;
    }

    fn load_mailbox(&mut self, index: u8, frame: &CanFrame) -> Result<(), CanError> {
        if index as usize >= TX_MAILBOX_COUNT {
            return Err(CanError::InvalidMailboxIndex(index));
        }

        critical_section::with(|_| {
            mailbox::write_mailbox(&mut self.bank, index, frame);
            self.mailboxes[index as usize] = TxMailboxState::Pending;
        });

        Ok(())
    }

    fn abort_mailbox(&mut self, index: u8) -> Result<(), CanError> {
        if index as usize >= TX_MAILBOX_COUNT {
            return Err(CanError::InvalidMailboxIndex(index));
        }

        critical_section::with(|_| mailbox::request_abort(&mut self.bank, index));

        Ok(())
    }
}
