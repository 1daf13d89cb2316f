#![allow(unused_braces)]
use modular_bitfield_msb::prelude::*;

/// CAN1 register bank base address on connectivity-line devices
pub const PRIMARY_BASE_ADDRESS: usize = 0x4000_6400;

/// CAN2 register bank base address on connectivity-line devices
pub const SECONDARY_BASE_ADDRESS: usize = 0x4000_6800;

/// Selects one 32-bit register of a controller bank.
///
/// Mailbox and FIFO variants carry the slot index; filter bank variants carry
/// the bank index. Only the master bank exposes the filter registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Register {
    MasterControl,
    MasterStatus,
    TransmitStatus,
    ReceiveFifo(u8),
    InterruptEnable,
    ErrorStatus,
    BitTiming,
    TxIdentifier(u8),
    TxFrameInfo(u8),
    TxDataLow(u8),
    TxDataHigh(u8),
    RxIdentifier(u8),
    RxFrameInfo(u8),
    RxDataLow(u8),
    RxDataHigh(u8),
    FilterMaster,
    FilterMode,
    FilterScale,
    FilterFifoAssignment,
    FilterActivation,
    FilterBankId(u8),
    FilterBankMask(u8),
}

impl Register {
    /// Byte offset from the bank base address
    pub fn offset(self) -> u32 {
        match self {
            Register::MasterControl => 0x000,
            Register::MasterStatus => 0x004,
            Register::TransmitStatus => 0x008,
            Register::ReceiveFifo(queue) => 0x00C + 4 * u32::from(queue),
            Register::InterruptEnable => 0x014,
            Register::ErrorStatus => 0x018,
            Register::BitTiming => 0x01C,
            Register::TxIdentifier(mailbox) => 0x180 + 0x10 * u32::from(mailbox),
            Register::TxFrameInfo(mailbox) => 0x184 + 0x10 * u32::from(mailbox),
            Register::TxDataLow(mailbox) => 0x188 + 0x10 * u32::from(mailbox),
            Register::TxDataHigh(mailbox) => 0x18C + 0x10 * u32::from(mailbox),
            Register::RxIdentifier(queue) => 0x1B0 + 0x10 * u32::from(queue),
            Register::RxFrameInfo(queue) => 0x1B4 + 0x10 * u32::from(queue),
            Register::RxDataLow(queue) => 0x1B8 + 0x10 * u32::from(queue),
            Register::RxDataHigh(queue) => 0x1BC + 0x10 * u32::from(queue),
            Register::FilterMaster => 0x200,
            Register::FilterMode => 0x204,
            Register::FilterScale => 0x20C,
            Register::FilterFifoAssignment => 0x214,
            Register::FilterActivation => 0x21C,
            Register::FilterBankId(bank) => 0x240 + 8 * u32::from(bank),
            Register::FilterBankMask(bank) => 0x244 + 8 * u32::from(bank),
        }
    }
}

/// Raw access to one controller's register bank.
///
/// This is the hardware seam of the driver: everything above it goes through
/// [Register] reads and writes, so the whole driver can be exercised against a
/// scripted bank. Read-modify-write cycles are composed by the caller inside a
/// critical section.
pub trait RegisterBank {
    fn read(&self, register: Register) -> u32;
    fn write(&mut self, register: Register, value: u32);
}

/// Volatile memory-mapped register bank.
pub struct MemoryMappedBank {
    base: usize,
}

impl MemoryMappedBank {
    /// Creates a bank rooted at the given base address.
    ///
    /// # Safety
    ///
    /// The base address must point at a CAN register bank and at most one
    /// `MemoryMappedBank` may exist per bank.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }
}

// One bank per peripheral; the peripheral itself has no thread affinity.
unsafe impl Send for MemoryMappedBank {}

impl RegisterBank for MemoryMappedBank {
    fn read(&self, register: Register) -> u32 {
        let address = (self.base + register.offset() as usize) as *const u32;
        unsafe { core::ptr::read_volatile(address) }
    }

    fn write(&mut self, register: Register, value: u32) {
        let address = (self.base + register.offset() as usize) as *mut u32;
        unsafe { core::ptr::write_volatile(address, value) }
    }
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Master control register (MCR)
pub struct MasterControlReg {
    #[skip]
    __: B15,
    /// Debug freeze bit, set at peripheral reset
    pub dbf: bool,
    /// Software master reset bit
    pub reset: bool,
    #[skip]
    __: B7,
    /// Time triggered communication mode bit
    pub ttcm: bool,
    /// Automatic bus-off management bit
    pub abom: bool,
    /// Automatic wakeup mode bit
    pub awum: bool,
    /// No automatic retransmission bit
    pub nart: bool,
    /// Receive FIFO locked mode bit
    pub rflm: bool,
    /// Transmit FIFO priority bit
    pub txfp: bool,
    /// Sleep mode request bit
    pub sleep: bool,
    /// Initialization mode request bit
    pub inrq: bool,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Master status register (MSR)
pub struct MasterStatusReg {
    #[skip]
    __: B20,
    /// Current RX pin level
    pub rx: bool,
    /// Last sample point value
    pub samp: bool,
    /// Receive mode flag
    pub rxm: bool,
    /// Transmit mode flag
    pub txm: bool,
    #[skip]
    __: B3,
    /// Sleep acknowledge interrupt flag
    pub slaki: bool,
    /// Wakeup interrupt flag
    pub wkui: bool,
    /// Error interrupt flag
    pub erri: bool,
    /// Sleep acknowledge flag
    pub slak: bool,
    /// Initialization acknowledge flag
    pub inak: bool,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Transmit status register (TSR), one flag group per mailbox
pub struct TxStatusReg {
    /// Lowest priority flags for mailboxes 2..0
    pub low: B3,
    /// Transmit mailbox empty flags for mailboxes 2..0
    pub tme: B3,
    /// Index of the next empty mailbox
    pub code: B2,
    /// Abort request bit for mailbox 2
    pub abrq2: bool,
    #[skip]
    __: B3,
    /// Transmission error flag for mailbox 2
    pub terr2: bool,
    /// Arbitration lost flag for mailbox 2
    pub alst2: bool,
    /// Transmission OK flag for mailbox 2
    pub txok2: bool,
    /// Request completed flag for mailbox 2
    pub rqcp2: bool,
    /// Abort request bit for mailbox 1
    pub abrq1: bool,
    #[skip]
    __: B3,
    /// Transmission error flag for mailbox 1
    pub terr1: bool,
    /// Arbitration lost flag for mailbox 1
    pub alst1: bool,
    /// Transmission OK flag for mailbox 1
    pub txok1: bool,
    /// Request completed flag for mailbox 1
    pub rqcp1: bool,
    /// Abort request bit for mailbox 0
    pub abrq0: bool,
    #[skip]
    __: B3,
    /// Transmission error flag for mailbox 0
    pub terr0: bool,
    /// Arbitration lost flag for mailbox 0
    pub alst0: bool,
    /// Transmission OK flag for mailbox 0
    pub txok0: bool,
    /// Request completed flag for mailbox 0
    pub rqcp0: bool,
}

impl TxStatusReg {
    /// Request-completed flag of the given mailbox
    pub fn request_completed(&self, mailbox: u8) -> bool {
        match mailbox {
            0 => self.rqcp0(),
            1 => self.rqcp1(),
            _ => self.rqcp2(),
        }
    }

    /// Transmit-OK flag of the given mailbox
    pub fn transmit_ok(&self, mailbox: u8) -> bool {
        match mailbox {
            0 => self.txok0(),
            1 => self.txok1(),
            _ => self.txok2(),
        }
    }

    /// Transmit-mailbox-empty flag of the given mailbox
    pub fn mailbox_empty(&self, mailbox: u8) -> bool {
        self.tme() & (1 << mailbox) != 0
    }

    /// Write-one-to-clear mask for the request-completed flag group
    pub fn request_complete_bit(mailbox: u8) -> u32 {
        1 << (8 * u32::from(mailbox))
    }

    /// Write mask requesting abort of a pending mailbox
    pub fn abort_request_bit(mailbox: u8) -> u32 {
        0x80 << (8 * u32::from(mailbox))
    }
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Receive FIFO register (RF0R/RF1R)
pub struct RxFifoReg {
    #[skip]
    __: B26,
    /// Release FIFO output mailbox bit
    pub rfom: bool,
    /// FIFO overrun flag
    pub fovr: bool,
    /// FIFO full flag
    pub full: bool,
    #[skip]
    __: B1,
    /// Number of pending messages
    pub fmp: B2,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Interrupt enable register (IER)
pub struct InterruptEnableReg {
    #[skip]
    __: B15,
    /// Sleep interrupt enable bit
    pub slkie: bool,
    /// Wakeup interrupt enable bit
    pub wkuie: bool,
    #[skip]
    __: B3,
    /// Error interrupt enable bit
    pub errie: bool,
    /// Last error code interrupt enable bit
    pub lecie: bool,
    /// Bus-off interrupt enable bit
    pub bofie: bool,
    /// Error passive interrupt enable bit
    pub epvie: bool,
    /// Error warning interrupt enable bit
    pub ewgie: bool,
    /// FIFO 1 overrun interrupt enable bit
    pub fovie1: bool,
    /// FIFO 1 full interrupt enable bit
    pub ffie1: bool,
    /// FIFO 1 message pending interrupt enable bit
    pub fmpie1: bool,
    /// FIFO 0 overrun interrupt enable bit
    pub fovie0: bool,
    /// FIFO 0 full interrupt enable bit
    pub ffie0: bool,
    /// FIFO 0 message pending interrupt enable bit
    pub fmpie0: bool,
    /// Transmit mailbox empty interrupt enable bit
    pub tmeie: bool,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Error status register (ESR)
pub struct ErrorStatusReg {
    /// Receive error counter
    pub rec: B8,
    /// Least significant byte of the transmit error counter
    pub tec: B8,
    #[skip]
    __: B9,
    /// Last error code
    pub lec: B3,
    #[skip]
    __: B1,
    /// Bus-off flag
    pub boff: bool,
    /// Error passive flag
    pub epvf: bool,
    /// Error warning flag
    pub ewgf: bool,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Bit timing register (BTR)
pub struct BitTimingReg {
    /// Silent mode bit
    pub silm: bool,
    /// Loop back mode bit
    pub lbkm: bool,
    #[skip]
    __: B4,
    /// Resynchronization jump width, raw quanta count minus one
    pub sjw: B2,
    #[skip]
    __: B1,
    /// Time segment 2, raw quanta count minus one
    pub ts2: B3,
    /// Time segment 1, raw quanta count minus one
    pub ts1: B4,
    #[skip]
    __: B6,
    /// Baud rate prescaler, raw divisor minus one
    pub brp: B10,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Transmit mailbox identifier register (TIxR)
pub struct TxIdReg {
    /// 29-bit identifier field; standard identifiers occupy the top 11 bits
    pub identifier: B29,
    /// Identifier extension bit
    pub ide: bool,
    /// Remote transmission request bit
    pub rtr: bool,
    /// Transmit request bit
    pub txrq: bool,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Receive FIFO identifier register (RIxR)
pub struct RxIdReg {
    /// 29-bit identifier field; standard identifiers occupy the top 11 bits
    pub identifier: B29,
    /// Identifier extension bit
    pub ide: bool,
    /// Remote transmission request bit
    pub rtr: bool,
    #[skip]
    __: B1,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Transmit mailbox frame info register (TDTxR)
pub struct TxFrameInfoReg {
    /// Transmission timestamp in time triggered mode
    pub time: B16,
    #[skip]
    __: B7,
    /// Transmit global time bit
    pub tgt: bool,
    #[skip]
    __: B4,
    /// Data length code
    pub dlc: B4,
}

#[bitfield]
#[derive(Default)]
#[repr(u32)]
/// Receive FIFO frame info register (RDTxR)
pub struct RxFrameInfoReg {
    /// Reception timestamp in time triggered mode
    pub time: B16,
    /// Index of the filter the frame matched
    pub filter_match: B8,
    #[skip]
    __: B4,
    /// Data length code
    pub dlc: B4,
}

#[bitfield]
#[derive(Copy, Clone, Default)]
#[repr(u32)]
/// Filter master register (FMR), present on the master bank only
pub struct FilterMasterReg {
    #[skip]
    __: B18,
    /// First filter bank assigned to the second controller
    pub can2_start_bank: B6,
    #[skip]
    __: B7,
    /// Filter initialization mode bit
    pub finit: bool,
}
