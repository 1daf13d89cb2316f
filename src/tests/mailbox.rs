use crate::can::{BxCan, CanController, CanError, ControllerId};
use crate::frame::CanFrame;
use crate::mailbox::TxMailboxState;
use crate::mocks::{MockBank, NoopFrontend, TestBank, TestClock, TestPlatform};
use crate::registers::Register;
use bytes::Bytes;
use embedded_can::{ExtendedId, Id, StandardId};

fn test_can(
    bank: TestBank,
    frontend: &NoopFrontend,
) -> BxCan<'_, TestBank, TestPlatform, NoopFrontend, TestClock> {
    BxCan::new(
        ControllerId::Primary,
        bank,
        TestPlatform::new(36_000_000),
        frontend,
    )
}

#[test]
fn test_load_mailbox_register_sequence() {
    let frontend = NoopFrontend;
    let mut can = test_can(TestBank::new(), &frontend);

    let id = Id::Standard(StandardId::new(0x55).unwrap());
    let frame = CanFrame::new(id, Bytes::copy_from_slice(&[1, 2, 3])).unwrap();

    can.load_mailbox(1, &frame).unwrap();

    // The identifier word carries the transmit request, so it comes last
    assert_eq!(
        vec![
            (Register::TxFrameInfo(1), 3),
            (Register::TxDataLow(1), 0x0003_0201),
            (Register::TxDataHigh(1), 0),
            (Register::TxIdentifier(1), (0x55 << 21) | 1),
        ],
        can.bank.write_log()
    );
    assert_eq!(TxMailboxState::Pending, can.mailbox_state(1).unwrap());
    assert_eq!(TxMailboxState::Idle, can.mailbox_state(0).unwrap());
}

#[test]
fn test_load_mailbox_invalid_index() {
    let frontend = NoopFrontend;
    // No expectations: any register access panics
    let mut can: BxCan<'_, MockBank, TestPlatform, NoopFrontend, TestClock> = BxCan::new(
        ControllerId::Primary,
        MockBank::new(),
        TestPlatform::new(36_000_000),
        &frontend,
    );

    let id = Id::Standard(StandardId::new(0x55).unwrap());
    let frame = CanFrame::new(id, Bytes::new()).unwrap();

    assert_eq!(Err(CanError::InvalidMailboxIndex(3)), can.load_mailbox(3, &frame));

    for index in 0..3 {
        assert_eq!(TxMailboxState::Idle, can.mailbox_state(index).unwrap());
    }
}

#[test]
fn test_abort_mailbox() {
    let frontend = NoopFrontend;
    let mut can = test_can(TestBank::new(), &frontend);

    can.abort_mailbox(2).unwrap();

    assert_eq!(vec![0x0080_0000], can.bank.writes_to(Register::TransmitStatus));
}

#[test]
fn test_abort_mailbox_invalid_index() {
    let frontend = NoopFrontend;
    let mut can: BxCan<'_, MockBank, TestPlatform, NoopFrontend, TestClock> = BxCan::new(
        ControllerId::Primary,
        MockBank::new(),
        TestPlatform::new(36_000_000),
        &frontend,
    );

    assert_eq!(Err(CanError::InvalidMailboxIndex(5)), can.abort_mailbox(5));
}

#[test]
fn test_drain_rx_queue() {
    let bank = TestBank::new();

    // Two frames buffered in queue 0
    bank.script_read(Register::ReceiveFifo(0), &[2, 1, 0]);
    bank.script_read(Register::RxIdentifier(0), &[0x55 << 21, (0x1234 << 3) | 0b100]);
    bank.script_read(Register::RxFrameInfo(0), &[3, 2]);
    bank.script_read(Register::RxDataLow(0), &[0x0003_0201, 0xBBAA]);

    let frontend = NoopFrontend;
    let mut can = test_can(bank, &frontend);

    let frames: Vec<CanFrame> = can.drain_rx_queue(0).unwrap().collect();

    let first_id = Id::Standard(StandardId::new(0x55).unwrap());
    let second_id = Id::Extended(ExtendedId::new(0x1234).unwrap());
    assert_eq!(
        vec![
            CanFrame::new(first_id, Bytes::copy_from_slice(&[1, 2, 3])).unwrap(),
            CanFrame::new(second_id, Bytes::copy_from_slice(&[0xAA, 0xBB])).unwrap(),
        ],
        frames
    );

    // One slot release per frame, queue empty afterwards
    assert_eq!(vec![0x20, 0x20], can.bank.writes_to(Register::ReceiveFifo(0)));
    assert_eq!(0, can.pending_frames(0).unwrap());
}

#[test]
fn test_drain_empty_queue() {
    let frontend = NoopFrontend;
    let mut can = test_can(TestBank::new(), &frontend);

    assert_eq!(0, can.drain_rx_queue(1).unwrap().count());
    assert!(can.bank.write_log().is_empty());
}

#[test]
fn test_drain_invalid_queue() {
    let frontend = NoopFrontend;
    let mut can = test_can(TestBank::new(), &frontend);

    assert!(matches!(
        can.drain_rx_queue(2),
        Err(CanError::InvalidQueueIndex(2))
    ));
}

#[test]
fn test_pending_frames() {
    let bank = TestBank::new();
    bank.script_read(Register::ReceiveFifo(1), &[2]);

    let frontend = NoopFrontend;
    let can = test_can(bank, &frontend);

    assert_eq!(2, can.pending_frames(1).unwrap());
    assert_eq!(0, can.pending_frames(0).unwrap());
    assert_eq!(Err(CanError::InvalidQueueIndex(7)), can.pending_frames(7));
}

#[test]
fn test_mailbox_state_invalid_index() {
    let frontend = NoopFrontend;
    let can = test_can(TestBank::new(), &frontend);

    assert_eq!(Err(CanError::InvalidMailboxIndex(3)), can.mailbox_state(3));
}
