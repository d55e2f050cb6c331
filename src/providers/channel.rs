//! In-process loopback sink

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::provider::{ChunkSink, SendStatus};

/// Sink that forwards every chunk into a bounded channel.
///
/// The receiving half plays the peer: dropping it looks like a disconnect.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelSink {
    /// Create a sink and the peer-side stream of chunks.
    pub fn channel(capacity: usize) -> (Self, ReceiverStream<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, ReceiverStream::new(rx))
    }
}

#[async_trait::async_trait]
impl ChunkSink for ChannelSink {
    async fn send(&mut self, chunk: &[u8]) -> SendStatus {
        match self.tx.send(chunk.to_vec()).await {
            Ok(()) => SendStatus::Sent,
            Err(_) => {
                debug!("Loopback peer dropped its receiver");
                SendStatus::PeerGone
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn forwards_chunks_in_order() {
        let (mut sink, stream) = ChannelSink::channel(4);
        assert_eq!(sink.send(&[1, 2]).await, SendStatus::Sent);
        assert_eq!(sink.send(&[3]).await, SendStatus::Sent);
        drop(sink);

        let received: Vec<Vec<u8>> = stream.collect().await;
        assert_eq!(received, vec![vec![1, 2], vec![3]]);
    }

    #[tokio::test]
    async fn dropped_receiver_is_peer_gone() {
        let (mut sink, stream) = ChannelSink::channel(1);
        drop(stream);
        assert_eq!(sink.send(&[1]).await, SendStatus::PeerGone);
    }
}
