//!# Mailbox and receive queue management
//! Owns the per-controller transmit mailbox state and the drain side of the
//! receive queues. All register traffic runs inside a critical section so the
//! same operations are usable from thread and interrupt context alike.

use crate::can::{BxCan, CanError, Platform, RX_QUEUE_COUNT, TX_MAILBOX_COUNT};
use crate::dispatch::Frontend;
use crate::frame::{CanFrame, MailboxImage};
use crate::registers::{Register, RegisterBank, RxFifoReg, TxIdReg, TxStatusReg};
use embedded_time::Clock;

/// Software view of one transmit mailbox slot
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TxMailboxState {
    /// Slot is free and may be loaded
    Idle,
    /// A transmission request is outstanding; the slot returns to [TxMailboxState::Idle]
    /// once the completion notification has been delivered
    Pending,
}

/// Writes one frame into a mailbox and requests transmission.
///
/// Caller validates the index and holds the critical section.
pub(crate) fn write_mailbox<B: RegisterBank>(bank: &mut B, index: u8, frame: &CanFrame) {
    let image = frame.encode();

    bank.write(Register::TxFrameInfo(index), image.frame_info);
    bank.write(Register::TxDataLow(index), image.data_low);
    bank.write(Register::TxDataHigh(index), image.data_high);

    // The identifier write carries TXRQ, so it must come last
    let id = TxIdReg::from(image.id).with_txrq(true);
    bank.write(Register::TxIdentifier(index), id.into());
}

/// Requests cancellation of a pending mailbox.
///
/// Best effort: the hardware may complete the transmission before the abort
/// takes effect. Either way a completion notification follows.
pub(crate) fn request_abort<B: RegisterBank>(bank: &mut B, index: u8) {
    bank.write(Register::TransmitStatus, TxStatusReg::abort_request_bit(index));
}

/// Number of frames a receive queue currently buffers.
pub(crate) fn rx_queue_depth<B: RegisterBank>(bank: &B, queue: u8) -> u8 {
    RxFifoReg::from(bank.read(Register::ReceiveFifo(queue))).fmp()
}

/// Decodes the frame at the output of a receive queue without releasing it.
///
/// Caller checks [rx_queue_depth] first and holds the critical section.
pub(crate) fn read_rx_slot<B: RegisterBank>(bank: &B, queue: u8) -> CanFrame {
    let image = MailboxImage {
        id: bank.read(Register::RxIdentifier(queue)),
        frame_info: bank.read(Register::RxFrameInfo(queue)),
        data_low: bank.read(Register::RxDataLow(queue)),
        data_high: bank.read(Register::RxDataHigh(queue)),
    };

    CanFrame::decode(&image)
}

/// Releases the output slot of a receive queue, advancing the hardware FIFO.
pub(crate) fn release_rx_slot<B: RegisterBank>(bank: &mut B, queue: u8) {
    bank.write(
        Register::ReceiveFifo(queue),
        RxFifoReg::new().with_rfom(true).into(),
    );
}

/// Reads one frame out of a receive queue and releases its slot.
///
/// Returns `None` once the queue's pending counter reads zero. Caller holds
/// the critical section.
pub(crate) fn pop_rx_queue<B: RegisterBank>(bank: &mut B, queue: u8) -> Option<CanFrame> {
    if rx_queue_depth(bank, queue) == 0 {
        return None;
    }

    let frame = read_rx_slot(bank, queue);
    release_rx_slot(bank, queue);

    Some(frame)
}

impl<'f, B, P, F, CLK> BxCan<'f, B, P, F, CLK>
where
    B: RegisterBank,
    P: Platform,
    F: Frontend<CLK>,
    CLK: Clock,
{
    /// Returns the software state of the given transmit mailbox
    pub fn mailbox_state(&self, index: u8) -> Result<TxMailboxState, CanError> {
        if index as usize >= TX_MAILBOX_COUNT {
            return Err(CanError::InvalidMailboxIndex(index));
        }

        Ok(self.mailboxes[index as usize])
    }

    /// Returns the number of frames buffered in the given receive queue
    pub fn pending_frames(&self, queue_index: u8) -> Result<u8, CanError> {
        if queue_index as usize >= RX_QUEUE_COUNT {
            return Err(CanError::InvalidQueueIndex(queue_index));
        }

        Ok(rx_queue_depth(&self.bank, queue_index))
    }

    /// Drains the given receive queue.
    ///
    /// The iterator yields the frames currently buffered, oldest first, and
    /// releases each hardware slot as it goes. It is finite and not
    /// restartable: every call consumes what is pending at that moment.
    pub fn drain_rx_queue(&mut self, queue_index: u8) -> Result<RxDrain<'_, B>, CanError> {
        if queue_index as usize >= RX_QUEUE_COUNT {
            return Err(CanError::InvalidQueueIndex(queue_index));
        }

        Ok(RxDrain {
            bank: &mut self.bank,
            queue: queue_index,
        })
    }
}

/// Lazy oldest-first drain of one receive queue, see [BxCan::drain_rx_queue]
pub struct RxDrain<'a, B: RegisterBank> {
    bank: &'a mut B,
    queue: u8,
}

impl<B: RegisterBank> Iterator for RxDrain<'_, B> {
    type Item = CanFrame;

    fn next(&mut self) -> Option<CanFrame> {
        critical_section::with(|_| pop_rx_queue(self.bank, self.queue))
    }
}
