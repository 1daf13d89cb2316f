//!# Event dispatch
//! Interrupt-context servicing of the receive queues and transmit mailboxes.
//! The interrupt handlers bound to a controller call [BxCan::service_rx_interrupt]
//! and [BxCan::service_tx_interrupt]; every drained frame and reaped completion
//! is handed to the registered [Frontend] synchronously.

use crate::can::{BxCan, CanError, Platform, RX_QUEUE_COUNT, TX_MAILBOX_COUNT};
use crate::frame::CanFrame;
use crate::mailbox::{self, TxMailboxState};
use crate::registers::{Register, RegisterBank, TxStatusReg};
use embedded_time::{Clock, Instant};

/// Notification sink registered with a controller instance.
///
/// Both callbacks run in interrupt context with the controller's critical
/// section held: they must return promptly and must not call back into
/// [crate::can::CanController::start] or [crate::can::CanController::stop].
pub trait Frontend<CLK: Clock> {
    /// A frame arrived on the given receive queue.
    ///
    /// Frames of one queue are delivered in hardware arrival order; no order
    /// is defined across queues. The timestamp is shared by every frame
    /// drained in the same interrupt batch.
    fn on_frame_received(&self, queue_index: u8, timestamp: Instant<CLK>, frame: &CanFrame);

    /// A transmission request completed, successfully or not.
    ///
    /// Within one interrupt batch completions arrive in mailbox index order,
    /// which carries no information about actual completion times.
    fn on_tx_complete(&self, mailbox_index: u8, success: bool, timestamp: Instant<CLK>);
}

impl<'f, B, P, F, CLK> BxCan<'f, B, P, F, CLK>
where
    B: RegisterBank,
    P: Platform,
    F: Frontend<CLK>,
    CLK: Clock,
{
    /// Drains both receive queues, delivering each frame to the frontend.
    ///
    /// Invoke from the receive interrupt handler. Each queue is drained until
    /// its pending counter reads zero; the slot release follows the frontend
    /// delivery, so an interrupted drain never loses a frame.
    pub fn service_rx_interrupt(&mut self, clock: &CLK) -> Result<(), CanError> {
        let timestamp = clock.try_now()?;
        let frontend = self.frontend;

        for queue in 0..RX_QUEUE_COUNT as u8 {
            loop {
                let delivered = critical_section::with(|_| {
                    if mailbox::rx_queue_depth(&self.bank, queue) == 0 {
                        return false;
                    }

                    let frame = mailbox::read_rx_slot(&self.bank, queue);
                    frontend.on_frame_received(queue, timestamp, &frame);
                    mailbox::release_rx_slot(&mut self.bank, queue);

                    true
                });

                if !delivered {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reaps completed transmissions, notifying the frontend per mailbox.
    ///
    /// Invoke from the transmit interrupt handler. Every mailbox whose
    /// request-completed flag is set produces exactly one notification with
    /// the hardware transmit-OK flag as the success indicator, after which
    /// the flag is cleared and the slot returns to idle.
    pub fn service_tx_interrupt(&mut self, clock: &CLK) -> Result<(), CanError> {
        let timestamp = clock.try_now()?;
        let frontend = self.frontend;

        critical_section::with(|_| {
            for index in 0..TX_MAILBOX_COUNT as u8 {
                let status = TxStatusReg::from(self.bank.read(Register::TransmitStatus));
                if !status.request_completed(index) {
                    continue;
                }

                frontend.on_tx_complete(index, status.transmit_ok(index), timestamp);
                self.bank
                    .write(Register::TransmitStatus, TxStatusReg::request_complete_bit(index));
                self.mailboxes[index as usize] = TxMailboxState::Idle;
            }
        });

        Ok(())
    }
}
