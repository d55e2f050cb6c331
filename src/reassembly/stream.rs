//! Stream adapter for reassembly

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use super::{AssembledFrame, FrameAssembler};

/// Extension trait to rebuild images from any stream of chunks
pub trait ReassembleExt: Stream {
    /// Reassemble chunks into images.
    ///
    /// A partial image still buffered when the input ends is yielded last,
    /// marked truncated.
    fn reassemble(self) -> Reassemble<Self>
    where
        Self: Sized,
        Self::Item: AsRef<[u8]>,
    {
        Reassemble::new(self, FrameAssembler::default())
    }
}

impl<T: Stream> ReassembleExt for T {}

pin_project! {
    /// A stream combinator that turns chunks into images
    pub struct Reassemble<S: Stream> {
        #[pin]
        stream: S,
        assembler: FrameAssembler,
        ready: VecDeque<AssembledFrame>,
        done: bool,
    }
}

impl<S: Stream> Reassemble<S> {
    /// Wrap `stream` with a custom assembler
    pub fn new(stream: S, assembler: FrameAssembler) -> Self {
        Self { stream, assembler, ready: VecDeque::new(), done: false }
    }
}

impl<S> Stream for Reassemble<S>
where
    S: Stream,
    S::Item: AsRef<[u8]>,
{
    type Item = AssembledFrame;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(frame) = this.ready.pop_front() {
                return Poll::Ready(Some(frame));
            }
            if *this.done {
                return Poll::Ready(None);
            }

            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(chunk) => this.ready.extend(this.assembler.push(chunk.as_ref())),
                None => {
                    *this.done = true;
                    this.ready.extend(this.assembler.finish());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reassembly::FrameStatus;
    use crate::test_utils::jpeg_like;
    use futures::StreamExt;

    #[tokio::test]
    async fn yields_images_then_trailing_partial() {
        let first = jpeg_like(500, 0x01);
        let second = jpeg_like(500, 0x02);

        let mut chunks: Vec<Vec<u8>> = first.chunks(240).map(<[u8]>::to_vec).collect();
        chunks.extend(second.chunks(240).take(2).map(<[u8]>::to_vec));

        let frames: Vec<AssembledFrame> = futures::stream::iter(chunks).reassemble().collect().await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, first);
        assert!(frames[0].is_complete());
        assert_eq!(frames[1].status, FrameStatus::Truncated);
        assert_eq!(frames[1].data.len(), 480);
    }

    #[tokio::test]
    async fn empty_input_yields_nothing() {
        let frames: Vec<AssembledFrame> =
            futures::stream::iter(Vec::<Vec<u8>>::new()).reassemble().collect().await;
        assert!(frames.is_empty());
    }
}
