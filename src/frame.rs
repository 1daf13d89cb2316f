//!# CAN frames
//! Classic CAN 2.0 frames with standard and extended identifiers, up to 8
//! payload bytes, and remote transmission requests.
//!
//! ## Frame construction example
//! ```
//!# use bytes::Bytes;
//!# use bxcan_driver::frame::CanFrame;
//!# use embedded_can::{Id, StandardId};
//!#
//! // Frame ID
//! let identifier = Id::Standard(StandardId::new(0x123).unwrap());
//! // DLC is determined by the length of the payload buffer
//! let payload = Bytes::copy_from_slice(&[0x1, 0x2, 0x3]);
//! let frame = CanFrame::new(identifier, payload).unwrap();
//! ```

use crate::registers::{RxFrameInfoReg, RxIdReg, TxFrameInfoReg, TxIdReg};
use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use embedded_can::{ExtendedId, Frame, Id, StandardId};
use log::debug;

/// Maximum payload bytes of a classic CAN frame
pub const MAX_PAYLOAD_BYTES: usize = 8;

/// Bit position of a standard identifier within the 29-bit identifier field
const STANDARD_ID_OFFSET: u32 = 18;

/// Possible errors when creating a [CanFrame]
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum FrameError {
    /// Payload length exceeds 8 bytes
    InvalidPayloadLength(usize),
    /// Data length code exceeds 8
    InvalidDlc(u8),
}

/// A transmitted or received bus frame
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CanFrame {
    /// Standard or extended frame identifier
    pub identifier: Id,
    /// Remote transmission request flag
    pub rtr: bool,
    /// Data length code, 0..=8
    pub dlc: u8,
    /// Payload bytes; bytes beyond `dlc` are don't-care
    pub data: [u8; MAX_PAYLOAD_BYTES],
}

/// Register image of one mailbox or FIFO slot
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct MailboxImage {
    pub id: u32,
    pub frame_info: u32,
    pub data_low: u32,
    pub data_high: u32,
}

impl CanFrame {
    /// Creates a new data frame
    pub fn new(identifier: Id, payload: Bytes) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_BYTES {
            debug!("payload of {} bytes exceeds the 8 byte frame limit", payload.len());
            return Err(FrameError::InvalidPayloadLength(payload.len()));
        }

        let mut data = [0u8; MAX_PAYLOAD_BYTES];
        data[..payload.len()].copy_from_slice(&payload);

        Ok(Self {
            identifier,
            rtr: false,
            dlc: payload.len() as u8,
            data,
        })
    }

    /// Creates a new remote transmission request frame
    pub fn new_remote(identifier: Id, dlc: u8) -> Result<Self, FrameError> {
        if dlc as usize > MAX_PAYLOAD_BYTES {
            debug!("remote frame DLC {dlc} exceeds 8");
            return Err(FrameError::InvalidDlc(dlc));
        }

        Ok(Self {
            identifier,
            rtr: true,
            dlc,
            data: [0u8; MAX_PAYLOAD_BYTES],
        })
    }

    /// Packs the frame into mailbox register shape.
    ///
    /// The transmit request bit is left clear; requesting transmission is the
    /// mailbox manager's decision.
    pub(crate) fn encode(&self) -> MailboxImage {
        let mut id_reg = TxIdReg::new().with_rtr(self.rtr);

        match self.identifier {
            Id::Standard(id) => id_reg.set_identifier(u32::from(id.as_raw()) << STANDARD_ID_OFFSET),
            Id::Extended(id) => {
                id_reg.set_identifier(id.as_raw());
                id_reg.set_ide(true);
            }
        }

        MailboxImage {
            id: id_reg.into(),
            frame_info: TxFrameInfoReg::new().with_dlc(self.dlc).into(),
            data_low: LittleEndian::read_u32(&self.data[..4]),
            data_high: LittleEndian::read_u32(&self.data[4..]),
        }
    }

    /// Unpacks a frame from FIFO register shape
    pub(crate) fn decode(image: &MailboxImage) -> Self {
        let id_reg = RxIdReg::from(image.id);
        let frame_info = RxFrameInfoReg::from(image.frame_info);

        // The 29-bit field getter is masked, so both constructors are infallible here
        let identifier = if id_reg.ide() {
            Id::Extended(ExtendedId::new(id_reg.identifier()).unwrap())
        } else {
            Id::Standard(StandardId::new((id_reg.identifier() >> STANDARD_ID_OFFSET) as u16).unwrap())
        };

        let mut data = [0u8; MAX_PAYLOAD_BYTES];
        LittleEndian::write_u32(&mut data[..4], image.data_low);
        LittleEndian::write_u32(&mut data[4..], image.data_high);

        Self {
            identifier,
            rtr: id_reg.rtr(),
            dlc: frame_info.dlc().min(MAX_PAYLOAD_BYTES as u8),
            data,
        }
    }
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        CanFrame::new(id.into(), Bytes::copy_from_slice(data)).ok()
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_PAYLOAD_BYTES {
            return None;
        }

        CanFrame::new_remote(id.into(), dlc as u8).ok()
    }

    fn is_extended(&self) -> bool {
        matches!(self.identifier, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.rtr
    }

    fn id(&self) -> Id {
        self.identifier
    }

    fn dlc(&self) -> usize {
        self.dlc as usize
    }

    fn data(&self) -> &[u8] {
        &self.data[..self.dlc as usize]
    }
}
