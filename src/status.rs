use crate::registers::ErrorStatusReg;

/// Error state read from the ESR register
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ErrorStatus {
    /// Receive error counter
    pub receive_error_count: u8,

    /// Least significant byte of the transmit error counter
    pub transmit_error_count: u8,

    /// Code of the last error observed on the bus
    pub last_error_code: LastErrorCode,

    /// True when the controller has entered bus-off and stopped transmitting
    pub bus_off: bool,

    /// True when either error counter passed the error passive limit of 127
    pub error_passive: bool,

    /// True when either error counter passed the warning limit of 96
    pub error_warning: bool,
}

impl ErrorStatus {
    pub(crate) fn from_register(register: u32) -> Self {
        let register = ErrorStatusReg::from(register);

        Self {
            receive_error_count: register.rec(),
            transmit_error_count: register.tec(),
            last_error_code: LastErrorCode::from_register(register.lec()),
            bus_off: register.boff(),
            error_passive: register.epvf(),
            error_warning: register.ewgf(),
        }
    }
}

/// Last error code as maintained by the hardware
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LastErrorCode {
    NoError = 0b000,
    StuffError = 0b001,
    FormError = 0b010,
    AcknowledgmentError = 0b011,
    BitRecessiveError = 0b100,
    BitDominantError = 0b101,
    CrcError = 0b110,
    /// Code slot writable by software for debugging
    SetBySoftware = 0b111,
}

impl LastErrorCode {
    pub(crate) fn from_register(bits: u8) -> Self {
        match bits {
            0b000 => Self::NoError,
            0b001 => Self::StuffError,
            0b010 => Self::FormError,
            0b011 => Self::AcknowledgmentError,
            0b100 => Self::BitRecessiveError,
            0b101 => Self::BitDominantError,
            0b110 => Self::CrcError,
            _ => Self::SetBySoftware,
        }
    }
}
