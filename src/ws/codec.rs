//! WebSocket frame codec (RFC 6455 subset)
//!
//! Server-to-client frames are single unmasked text frames. Inbound frames
//! are unmasked with the 4-byte key when the mask bit is set; close and ping
//! control frames are surfaced as distinct events so the session loop can
//! act on them without touching the dispatcher.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

const OPCODE_TEXT: u8 = 0x1;
const OPCODE_CLOSE: u8 = 0x8;
const OPCODE_PING: u8 = 0x9;

/// First header byte of an outbound text frame (FIN + text opcode).
const FIN_TEXT: u8 = 0x81;

/// An unmasked zero-length pong, sent verbatim in reply to a ping.
pub const PONG_FRAME: [u8; 2] = [0x8A, 0x00];

/// Upper bound on a declared payload length. The header length field is
/// attacker-controlled and must not be trusted into an allocation; any claim
/// beyond this is a forged frame and terminates the connection.
const MAX_FRAME_LEN: u64 = 1 << 20;

/// One decoded inbound frame, reduced to what the session loop acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Text frame payload: a UTF-8 JSON application message
    Text(String),
    /// Ping control frame; the connection must answer with a pong
    Ping,
    /// Close frame, truncated frame, or stream error - terminal
    Closed,
    /// Binary/pong/continuation frames, skipped without dispatch
    Ignored,
}

/// Encode a text frame around `payload`.
///
/// Payloads up to 125 bytes use the 2-byte header alone; up to 65535 a
/// 2-byte big-endian extended length; anything larger an 8-byte one.
pub fn encode_text(payload: &[u8]) -> Vec<u8> {
    let n = payload.len();
    let mut frame = Vec::with_capacity(n + 10);
    frame.push(FIN_TEXT);
    if n < 126 {
        frame.push(n as u8);
    } else if n < 65536 {
        frame.push(126);
        frame.extend_from_slice(&(n as u16).to_be_bytes());
    } else {
        frame.push(127);
        frame.extend_from_slice(&(n as u64).to_be_bytes());
    }
    frame.extend_from_slice(payload);
    frame
}

/// Read one frame from the stream.
///
/// Any read failure, including a truncated header or a forged declared
/// length, is reported as `Closed`: the connection is beyond recovery either
/// way.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Inbound {
    match try_read_frame(reader).await {
        Ok(inbound) => inbound,
        Err(_) => Inbound::Closed,
    }
}

async fn try_read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Inbound> {
    let mut header = [0u8; 2];
    reader.read_exact(&mut header).await?;

    let opcode = header[0] & 0x0F;
    let masked = header[1] & 0x80 != 0;
    let mut len = (header[1] & 0x7F) as u64;

    if len == 126 {
        let mut ext = [0u8; 2];
        reader.read_exact(&mut ext).await?;
        len = u16::from_be_bytes(ext) as u64;
    } else if len == 127 {
        let mut ext = [0u8; 8];
        reader.read_exact(&mut ext).await?;
        len = u64::from_be_bytes(ext);
    }

    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "declared frame length too large",
        ));
    }

    let mut mask = [0u8; 4];
    if masked {
        reader.read_exact(&mut mask).await?;
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;

    if masked {
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte ^= mask[i % 4];
        }
    }

    match opcode {
        OPCODE_CLOSE => Ok(Inbound::Closed),
        OPCODE_PING => Ok(Inbound::Ping),
        OPCODE_TEXT => Ok(Inbound::Text(
            String::from_utf8_lossy(&payload).into_owned(),
        )),
        _ => Ok(Inbound::Ignored),
    }
}
