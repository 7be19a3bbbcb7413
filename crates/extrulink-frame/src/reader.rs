use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::codec::{decode_frame, reverse_frame, Frame, FRAME_SIZE};
use crate::error::{FrameError, Result};

/// Splits a control-pipe byte stream into frames.
///
/// Pipe peers write their readings in the outbound byte order, so each
/// 8-byte chunk is reversed before it is decoded. Handles partial reads
/// internally; use with [`tokio_util::codec::FramedRead`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec {
    _priv: (),
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        if src.len() < FRAME_SIZE {
            src.reserve(FRAME_SIZE - src.len());
            return Ok(None);
        }

        let mut wire = [0u8; FRAME_SIZE];
        src.copy_to_slice(&mut wire);
        decode_frame(&reverse_frame(wire)).map(Some)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::Truncated { len: src.len() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use futures_util::StreamExt;
    use tokio::io::{AsyncRead, ReadBuf};
    use tokio_util::codec::FramedRead;

    use super::*;
    use crate::codec::encode_command;

    #[test]
    fn waits_for_a_full_frame() {
        let mut codec = FrameCodec::new();
        let wire = encode_command(0x02, 215);
        let mut buf = BytesMut::from(&wire[..5]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&wire[5..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Frame::new(0x02, 215)));
        assert!(buf.is_empty());
    }

    #[test]
    fn trailing_bytes_at_eof_are_truncation() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&[0x01, 0x02, 0x03][..]);
        let err = codec.decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { len: 3 }));
    }

    #[test]
    fn clean_eof_yields_nothing() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_consecutive_frames_in_order() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&encode_command(0x01, 175));
        wire.extend_from_slice(&encode_command(0x02, 210));
        wire.extend_from_slice(&encode_command(0x06, 1));

        let mut framed = FramedRead::new(wire.as_slice(), FrameCodec::new());
        let mut frames = Vec::new();
        while let Some(frame) = framed.next().await {
            frames.push(frame.unwrap());
        }

        assert_eq!(
            frames,
            vec![Frame::new(0x01, 175), Frame::new(0x02, 210), Frame::new(0x06, 1)]
        );
    }

    #[tokio::test]
    async fn byte_by_byte_reads() {
        let wire = encode_command(0x04, 60);
        let reader = ByteByByteReader {
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut framed = FramedRead::new(reader, FrameCodec::new());
        let frame = framed.next().await.unwrap().unwrap();
        assert_eq!(frame, Frame::new(0x04, 60));
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn io_error_propagates() {
        let mut framed = FramedRead::new(FailingReader, FrameCodec::new());
        let err = framed.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl AsyncRead for ByteByByteReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if self.pos < self.bytes.len() && buf.remaining() > 0 {
                let byte = self.bytes[self.pos];
                buf.put_slice(&[byte]);
                self.pos += 1;
            }
            Poll::Ready(Ok(()))
        }
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::from(ErrorKind::BrokenPipe)))
        }
    }
}
