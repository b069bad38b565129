//! Client-to-server message decoding.
//!
//! Each message is a type byte followed by a fixed or variable-length
//! payload. The decoder consumes the payload exactly and discards its
//! content — this server injects no input, never renegotiates the
//! pixel format and always sends RAW — with one exception: a
//! FramebufferUpdateRequest is the viewer's ready signal.
//!
//! | Type | Message                  | Payload                          |
//! |------|--------------------------|----------------------------------|
//! | 0    | SetPixelFormat           | 3 pad + 16-byte format           |
//! | 2    | SetEncodings             | 1 pad + u16 count + count × u32  |
//! | 3    | FramebufferUpdateRequest | incremental u8 + 4 × u16 rect    |
//! | 4    | KeyEvent                 | 7 bytes                          |
//! | 5    | PointerEvent             | 5 bytes                          |
//! | 6    | ClientCutText            | 3 pad + u32 length + text        |
//!
//! Any other type byte is a protocol violation: the payload length is
//! unknowable, so the session fails closed instead of desyncing.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::VncError;

// ── Message type bytes ───────────────────────────────────────────

pub const SET_PIXEL_FORMAT: u8 = 0;
pub const SET_ENCODINGS: u8 = 2;
pub const FRAMEBUFFER_UPDATE_REQUEST: u8 = 3;
pub const KEY_EVENT: u8 = 4;
pub const POINTER_EVENT: u8 = 5;
pub const CLIENT_CUT_TEXT: u8 = 6;

/// Drain ClientCutText payloads through a buffer this size, so a
/// hostile length field cannot drive a large allocation.
const CUT_TEXT_CHUNK: usize = 256;

// ── ClientMessage ────────────────────────────────────────────────

/// A decoded (and mostly discarded) client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    /// Consumed and ignored; the server format is fixed.
    SetPixelFormat,
    /// Consumed and ignored; RAW is used regardless of the offer.
    SetEncodings { count: u16 },
    /// The ready signal. Rectangle and incremental flag are ignored;
    /// every update covers the full screen.
    UpdateRequest { incremental: bool },
    /// Consumed and ignored; no input injection.
    KeyEvent,
    /// Consumed and ignored; no input injection.
    PointerEvent,
    /// Consumed and ignored; the text is drained, never stored.
    CutText { length: u32 },
}

impl ClientMessage {
    /// Read and consume the payload for an already-read type byte.
    ///
    /// Reads exactly the payload length for the type; a short read
    /// (peer closed mid-message) surfaces as an I/O error and aborts
    /// the session.
    pub async fn read_body<R>(msg_type: u8, reader: &mut R) -> Result<Self, VncError>
    where
        R: AsyncRead + Unpin,
    {
        match msg_type {
            SET_PIXEL_FORMAT => {
                let mut rest = [0u8; 19];
                reader.read_exact(&mut rest).await?;
                Ok(Self::SetPixelFormat)
            }
            SET_ENCODINGS => {
                let mut head = [0u8; 3];
                reader.read_exact(&mut head).await?;
                let count = u16::from_be_bytes([head[1], head[2]]);
                let mut encoding = [0u8; 4];
                for _ in 0..count {
                    reader.read_exact(&mut encoding).await?;
                }
                Ok(Self::SetEncodings { count })
            }
            FRAMEBUFFER_UPDATE_REQUEST => {
                let mut rest = [0u8; 9];
                reader.read_exact(&mut rest).await?;
                Ok(Self::UpdateRequest {
                    incremental: rest[0] != 0,
                })
            }
            KEY_EVENT => {
                let mut rest = [0u8; 7];
                reader.read_exact(&mut rest).await?;
                Ok(Self::KeyEvent)
            }
            POINTER_EVENT => {
                let mut rest = [0u8; 5];
                reader.read_exact(&mut rest).await?;
                Ok(Self::PointerEvent)
            }
            CLIENT_CUT_TEXT => {
                let mut head = [0u8; 7];
                reader.read_exact(&mut head).await?;
                let length = u32::from_be_bytes([head[3], head[4], head[5], head[6]]);

                let mut remaining = length as usize;
                let mut chunk = [0u8; CUT_TEXT_CHUNK];
                while remaining > 0 {
                    let n = remaining.min(CUT_TEXT_CHUNK);
                    reader.read_exact(&mut chunk[..n]).await?;
                    remaining -= n;
                }
                Ok(Self::CutText { length })
            }
            other => Err(VncError::UnknownMessageType(other)),
        }
    }

    /// Whether this message is the viewer's ready signal.
    pub fn is_ready_signal(&self) -> bool {
        matches!(self, Self::UpdateRequest { .. })
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_pixel_format_consumed() {
        let mut payload: &[u8] = &[0u8; 19];
        let msg = ClientMessage::read_body(SET_PIXEL_FORMAT, &mut payload)
            .await
            .unwrap();
        assert_eq!(msg, ClientMessage::SetPixelFormat);
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn set_encodings_consumes_list() {
        // pad + count=3 + three 4-byte encodings.
        let mut data = vec![0u8, 0, 3];
        data.extend_from_slice(&0i32.to_be_bytes());
        data.extend_from_slice(&1i32.to_be_bytes());
        data.extend_from_slice(&(-239i32).to_be_bytes());

        let mut payload: &[u8] = &data;
        let msg = ClientMessage::read_body(SET_ENCODINGS, &mut payload)
            .await
            .unwrap();
        assert_eq!(msg, ClientMessage::SetEncodings { count: 3 });
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn update_request_reports_incremental() {
        let mut payload: &[u8] = &[1u8, 0, 0, 0, 0, 0, 100, 0, 100];
        let msg = ClientMessage::read_body(FRAMEBUFFER_UPDATE_REQUEST, &mut payload)
            .await
            .unwrap();
        assert_eq!(msg, ClientMessage::UpdateRequest { incremental: true });
        assert!(msg.is_ready_signal());
    }

    #[tokio::test]
    async fn input_events_consumed_and_ignored() {
        let mut key: &[u8] = &[0u8; 7];
        let msg = ClientMessage::read_body(KEY_EVENT, &mut key).await.unwrap();
        assert_eq!(msg, ClientMessage::KeyEvent);
        assert!(!msg.is_ready_signal());

        let mut pointer: &[u8] = &[0u8; 5];
        let msg = ClientMessage::read_body(POINTER_EVENT, &mut pointer)
            .await
            .unwrap();
        assert_eq!(msg, ClientMessage::PointerEvent);
    }

    #[tokio::test]
    async fn cut_text_drained_in_chunks() {
        // Text longer than one drain chunk.
        let text_len = CUT_TEXT_CHUNK * 2 + 17;
        let mut data = vec![0u8, 0, 0];
        data.extend_from_slice(&(text_len as u32).to_be_bytes());
        data.extend(std::iter::repeat(b'x').take(text_len));

        let mut payload: &[u8] = &data;
        let msg = ClientMessage::read_body(CLIENT_CUT_TEXT, &mut payload)
            .await
            .unwrap();
        assert_eq!(
            msg,
            ClientMessage::CutText {
                length: text_len as u32
            }
        );
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn unknown_type_is_rejected() {
        let mut payload: &[u8] = &[];
        let err = ClientMessage::read_body(255, &mut payload)
            .await
            .unwrap_err();
        assert!(matches!(err, VncError::UnknownMessageType(255)));
    }

    #[tokio::test]
    async fn short_payload_is_an_error() {
        let mut payload: &[u8] = &[0u8; 3]; // KeyEvent needs 7
        let err = ClientMessage::read_body(KEY_EVENT, &mut payload)
            .await
            .unwrap_err();
        assert!(matches!(err, VncError::Io(_)));
    }

    #[tokio::test]
    async fn payload_split_across_reads() {
        // The decoder must consume exactly its payload even when the
        // transport delivers it in fragments.
        let mut reader = tokio_test::io::Builder::new()
            .read(&[1u8, 0, 0])
            .read(&[0, 0, 0, 100])
            .read(&[0, 100])
            .build();
        let msg = ClientMessage::read_body(FRAMEBUFFER_UPDATE_REQUEST, &mut reader)
            .await
            .unwrap();
        assert_eq!(msg, ClientMessage::UpdateRequest { incremental: true });
    }
}
