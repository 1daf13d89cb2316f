use crate::frame::{CanFrame, FrameError, MailboxImage};
use bytes::Bytes;
use embedded_can::{ExtendedId, Frame, Id, StandardId};

const EXTENDED_ID: u32 = 0x14C92A2B;
const STANDARD_ID: u16 = 0x6A5;

fn standard_id() -> Id {
    Id::Standard(StandardId::new(STANDARD_ID).unwrap())
}

fn extended_id() -> Id {
    Id::Extended(ExtendedId::new(EXTENDED_ID).unwrap())
}

#[test]
fn test_encode_standard_id() {
    let frame = CanFrame::new(standard_id(), Bytes::new()).unwrap();
    let image = frame.encode();

    // Standard identifiers sit in the top 11 bits, IDE and RTR stay clear
    assert_eq!(u32::from(STANDARD_ID) << 21, image.id);
    assert_eq!(0, image.frame_info);
}

#[test]
fn test_encode_extended_id() {
    let frame = CanFrame::new(extended_id(), Bytes::new()).unwrap();
    let image = frame.encode();

    assert_eq!((EXTENDED_ID << 3) | 0b100, image.id);
}

#[test]
fn test_encode_remote_request() {
    let frame = CanFrame::new_remote(standard_id(), 4).unwrap();
    let image = frame.encode();

    assert_eq!((u32::from(STANDARD_ID) << 21) | 0b010, image.id);
    assert_eq!(4, image.frame_info);
}

#[test]
fn test_encode_payload_little_endian() {
    let payload = Bytes::copy_from_slice(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
    let frame = CanFrame::new(standard_id(), payload).unwrap();
    let image = frame.encode();

    assert_eq!(8, image.frame_info);
    assert_eq!(0x4433_2211, image.data_low);
    assert_eq!(0x8877_6655, image.data_high);
}

#[test]
fn test_round_trip_standard_data() {
    let payload = Bytes::copy_from_slice(&[0xDE, 0xAD, 0xBE]);
    let frame = CanFrame::new(standard_id(), payload).unwrap();

    assert_eq!(frame, CanFrame::decode(&frame.encode()));
}

#[test]
fn test_round_trip_extended_data() {
    let payload = Bytes::copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
    let frame = CanFrame::new(extended_id(), payload).unwrap();

    assert_eq!(frame, CanFrame::decode(&frame.encode()));
}

#[test]
fn test_round_trip_remote_frames() {
    let standard = CanFrame::new_remote(standard_id(), 8).unwrap();
    let extended = CanFrame::new_remote(extended_id(), 0).unwrap();

    assert_eq!(standard, CanFrame::decode(&standard.encode()));
    assert_eq!(extended, CanFrame::decode(&extended.encode()));
}

#[test]
fn test_round_trip_empty_frame() {
    let frame = CanFrame::new(Id::Standard(StandardId::ZERO), Bytes::new()).unwrap();

    assert_eq!(frame, CanFrame::decode(&frame.encode()));
}

#[test]
fn test_decode_clamps_dlc() {
    let image = MailboxImage {
        id: u32::from(STANDARD_ID) << 21,
        frame_info: 0xF,
        data_low: 0,
        data_high: 0,
    };

    assert_eq!(8, CanFrame::decode(&image).dlc);
}

#[test]
fn test_payload_too_long() {
    assert_eq!(
        Err(FrameError::InvalidPayloadLength(9)),
        CanFrame::new(standard_id(), Bytes::copy_from_slice(&[0u8; 9]))
    );
}

#[test]
fn test_remote_dlc_too_large() {
    assert_eq!(Err(FrameError::InvalidDlc(9)), CanFrame::new_remote(standard_id(), 9));
}

#[test]
fn test_embedded_can_frame_impl() {
    let frame = <CanFrame as Frame>::new(standard_id(), &[1, 2, 3]).unwrap();

    assert!(!frame.is_extended());
    assert!(!frame.is_remote_frame());
    assert_eq!(standard_id(), Frame::id(&frame));
    assert_eq!(3, Frame::dlc(&frame));
    assert_eq!(&[1, 2, 3], Frame::data(&frame));

    assert!(<CanFrame as Frame>::new(standard_id(), &[0u8; 9]).is_none());
    assert!(<CanFrame as Frame>::new_remote(extended_id(), 9).is_none());
}
