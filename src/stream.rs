//! Chunk-coalescing output (spec.md §4.8): batches small fragment chunks
//! into backpressure-friendly writes instead of emitting one `write()`
//! per static string and per value.

use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::fragment::Fragment;

/// Configurable knobs for turning a rendered [`Fragment`] tree into
/// bytes. The only configurable surface spec.md defines.
#[derive(Debug, Clone, Copy)]
pub struct StreamOptions {
    /// Chunks are flushed once they reach at least this many bytes.
    /// The final chunk of a render is always flushed regardless of size.
    pub chunk_size: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self { chunk_size: 8192 }
    }
}

/// A coalescing byte stream over a rendered template's chunks. Each
/// `poll_next` advances through the fragment tree's depth-first
/// iterator, accumulating chunks into `buffer` until it reaches
/// `chunk_size`, then yields the accumulated bytes.
pub struct ByteStream {
    chunks: std::vec::IntoIter<String>,
    buffer: String,
    chunk_size: usize,
}

impl ByteStream {
    pub fn new(fragment: &Fragment, options: StreamOptions) -> Self {
        let chunks: Vec<String> = fragment.iterate().map(str::to_owned).collect();
        Self { chunks: chunks.into_iter(), buffer: String::new(), chunk_size: options.chunk_size }
    }
}

impl Stream for ByteStream {
    type Item = Vec<u8>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.chunks.next() {
                Some(chunk) => {
                    self.buffer.push_str(&chunk);
                    if self.buffer.len() >= self.chunk_size {
                        let out = std::mem::take(&mut self.buffer).into_bytes();
                        return Poll::Ready(Some(out));
                    }
                }
                None => {
                    if self.buffer.is_empty() {
                        return Poll::Ready(None);
                    }
                    let out = std::mem::take(&mut self.buffer).into_bytes();
                    return Poll::Ready(Some(out));
                }
            }
        }
    }
}

/// Collects an entire rendered fragment into a single byte buffer,
/// ignoring `chunk_size` (spec.md's synchronous convenience entry
/// point, for callers that don't need streaming backpressure).
pub fn collect_sync(fragment: &Fragment) -> Vec<u8> {
    fragment.iterate().collect::<String>().into_bytes()
}

/// Drains a [`ByteStream`] into a single buffer, concatenating its
/// chunks in order.
pub async fn collect(mut stream: ByteStream) -> Vec<u8> {
    use futures::StreamExt;
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_sync_concatenates_all_chunks() {
        let tree =
            Fragment::Nested(vec![Fragment::Chunk("a".into()), Fragment::Chunk("b".into())]);
        assert_eq!(collect_sync(&tree), b"ab".to_vec());
    }

    #[test]
    fn small_chunk_size_still_yields_everything() {
        let tree = Fragment::Nested(vec![
            Fragment::Chunk("hello ".into()),
            Fragment::Chunk("world".into()),
        ]);
        let stream = ByteStream::new(&tree, StreamOptions { chunk_size: 1 });
        let collected = futures::executor::block_on(collect(stream));
        assert_eq!(collected, b"hello world".to_vec());
    }

    #[test]
    fn large_chunk_size_coalesces_into_one_write() {
        let tree = Fragment::Nested(vec![
            Fragment::Chunk("hello ".into()),
            Fragment::Chunk("world".into()),
        ]);
        let mut stream = ByteStream::new(&tree, StreamOptions::default());
        let first = futures::executor::block_on(futures::StreamExt::next(&mut stream));
        assert_eq!(first, Some(b"hello world".to_vec()));
        let second = futures::executor::block_on(futures::StreamExt::next(&mut stream));
        assert_eq!(second, None);
    }
}
