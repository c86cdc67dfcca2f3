// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Ping {
    n: u32,
}

#[test]
fn encode_decode_round_trip() {
    let frame = encode(&Ping { n: 7 }).unwrap();
    let len = u32::from_be_bytes(frame[..4].try_into().unwrap());
    assert_eq!(len as usize, frame.len() - 4);
    let back: Ping = decode(&frame[4..]).unwrap();
    assert_eq!(back, Ping { n: 7 });
}

#[tokio::test]
async fn write_then_read_message_round_trip() {
    let mut buf = Vec::new();
    write_message(&mut buf, &Ping { n: 99 }).await.unwrap();
    let mut cursor = std::io::Cursor::new(buf);
    let back: Ping = read_message(&mut cursor).await.unwrap();
    assert_eq!(back, Ping { n: 99 });
}

#[tokio::test]
async fn read_message_rejects_oversized_frame() {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(MAX_FRAME_LEN + 1).to_be_bytes());
    let mut cursor = std::io::Cursor::new(buf);
    let err = read_message::<Ping, _>(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooLarge(_)));
}
