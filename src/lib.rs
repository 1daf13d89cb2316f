#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]
#![allow(clippy::identity_op)]

//! # Driver for dual-instance bxCAN controllers
//!
//! Crate currently offers the following features:
//! * Interrupt-driven servicing of 3 transmit mailboxes and 2 receive queues
//!   per controller
//! * Bus timing derivation from a requested bit rate
//! * Standard and extended ID formats for CAN frames
//! * no_std support
//!
//! The hardware is reached through the [registers::RegisterBank] trait, so the
//! driver runs against a memory-mapped bank on target and against scripted
//! fakes in tests. Inbound frames and transmit completions are handed to a
//! registered [dispatch::Frontend] from interrupt context.
//!
//! ## CAN controller example
//!
//!```
//!use bxcan_driver::can::{BxCan, CanController, Configuration, ControllerId};
//!use bxcan_driver::example::{ExampleBank, ExampleClock, ExampleFrontend, ExamplePlatform};
//!use bxcan_driver::frame::CanFrame;
//!use bytes::Bytes;
//!use embedded_can::{Id, StandardId};
//!
//!let clock = ExampleClock::default();
//!let frontend = ExampleFrontend;
//!
//!// Register the first controller instance
//!let mut controller = BxCan::new(
//!    ControllerId::Primary,
//!    ExampleBank::default(),
//!    ExamplePlatform,
//!    &frontend,
//!);
//!
//!// Bring the bus up at 1 Mbit/s
//!let config = Configuration {
//!    bit_rate: 1_000_000,
//!    ..Configuration::default()
//!};
//!controller.start(&config, &clock).unwrap();
//!
//!// Queue a frame for transmission
//!let id = Id::Standard(StandardId::new(0x55).unwrap());
//!let frame = CanFrame::new(id, Bytes::copy_from_slice(&[1, 2, 3])).unwrap();
//!controller.load_mailbox(0, &frame).unwrap();
//!
//!// Poll the receive side; the interrupt handlers normally do this
//!assert_eq!(controller.drain_rx_queue(0).unwrap().count(), 0);
//!```

extern crate alloc;

pub mod can;
pub mod dispatch;
pub mod frame;
pub mod mailbox;
pub mod status;
pub mod timing;

pub mod example;
mod filter;
#[cfg(test)]
pub(crate) mod mocks;
pub mod registers;
#[cfg(test)]
mod tests;
