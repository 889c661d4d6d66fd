//! Message channel between the two parties.
//!
//! Protocol code is written against [`Channel`], which only knows how to send,
//! receive and close. The concrete transport is a length-delimited byte stream
//! carrying bincode-encoded messages, see [`FramedIo`].

use std::io;

use async_trait::async_trait;
use serio::{codec::Bincode, stream::IoStreamExt as _};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// Maximum size of a single frame. Garbled tables of large circuits are sent
/// in one message.
const MAX_FRAME_LEN: usize = 1 << 28;

/// Bincode-encoded messages over a length-delimited byte stream.
pub type FramedIo<T> = serio::Framed<Framed<T, LengthDelimitedCodec>, Bincode>;

/// A reliable, ordered, bidirectional message channel.
#[async_trait]
pub trait Channel: Send {
    /// Sends a message to the peer.
    async fn send<T>(&mut self, msg: T) -> io::Result<()>
    where
        T: serio::Serialize + Send + 'static;

    /// Receives the next message from the peer.
    ///
    /// Returns an error if the peer closed the channel.
    async fn receive<T>(&mut self) -> io::Result<T>
    where
        T: serio::Deserialize + Send + 'static;

    /// Flushes and closes the sending half of the channel.
    async fn close(&mut self) -> io::Result<()>;
}

#[async_trait]
impl<Io> Channel for FramedIo<Io>
where
    Io: AsyncRead + AsyncWrite + Send + Unpin,
{
    async fn send<T>(&mut self, msg: T) -> io::Result<()>
    where
        T: serio::Serialize + Send + 'static,
    {
        serio::SinkExt::send(self, msg).await
    }

    async fn receive<T>(&mut self) -> io::Result<T>
    where
        T: serio::Deserialize + Send + 'static,
    {
        self.expect_next::<T>().await
    }

    async fn close(&mut self) -> io::Result<()> {
        serio::SinkExt::close(self).await
    }
}

/// Attaches the framing and codec to a byte stream.
pub fn framed<T>(io: T) -> FramedIo<T>
where
    T: AsyncRead + AsyncWrite,
{
    serio::Framed::new(
        LengthDelimitedCodec::builder()
            .max_frame_length(MAX_FRAME_LEN)
            .new_framed(io),
        Bincode,
    )
}

/// Creates a pair of connected in-memory channels.
///
/// # Arguments
///
/// * `max_buf_size` - Number of bytes buffered in each direction.
pub fn duplex(max_buf_size: usize) -> (FramedIo<DuplexStream>, FramedIo<DuplexStream>) {
    let (a, b) = tokio::io::duplex(max_buf_size);
    (framed(a), framed(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case::small(1 << 10)]
    #[case::large(1 << 16)]
    #[tokio::test]
    async fn test_send_receive(#[case] buf: usize) {
        let (mut a, mut b) = duplex(buf);

        let msg = vec![7u8; 4096];
        let sent = msg.clone();
        let (send, recv) = tokio::join!(a.send(sent), b.receive::<Vec<u8>>());

        send.unwrap();
        assert_eq!(recv.unwrap(), msg);
    }

    #[tokio::test]
    async fn test_receive_after_close() {
        let (mut a, mut b) = duplex(1 << 10);

        a.send(42u32).await.unwrap();
        a.close().await.unwrap();

        assert_eq!(b.receive::<u32>().await.unwrap(), 42);
        assert!(b.receive::<u32>().await.is_err());
    }

    #[tokio::test]
    async fn test_receive_after_drop() {
        let (a, mut b) = duplex(1 << 10);
        drop(a);

        assert!(b.receive::<u32>().await.is_err());
    }
}
