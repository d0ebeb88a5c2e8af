// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, TryStreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;
use tokio_util::sync::PollSender;

pub(crate) const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks in flight between the archive encoder and the consumer.
pub(crate) const IN_FLIGHT_CHUNKS: usize = 4;

pub(crate) type Chunk = io::Result<Bytes>;

fn consumer_gone<E>(_: E) -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "package consumer went away")
}

/// Accumulates archive bytes and hands them to a [`PackageByteStream`] in
/// fixed-size chunks. Writes stall while every channel slot is taken.
pub(crate) struct ChunkWriter {
    tx: PollSender<Chunk>,
    pending: BytesMut,
}

impl ChunkWriter {
    pub(crate) fn new(tx: mpsc::Sender<Chunk>) -> Self {
        Self {
            tx: PollSender::new(tx),
            pending: BytesMut::with_capacity(CHUNK_SIZE),
        }
    }

    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if !self.pending.is_empty() {
            ready!(self.tx.poll_reserve(cx)).map_err(consumer_gone)?;
            let chunk = self.pending.split().freeze();
            self.tx.send_item(Ok(chunk)).map_err(consumer_gone)?;
            self.pending.reserve(CHUNK_SIZE);
        }
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for ChunkWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.pending.len() >= CHUNK_SIZE {
            ready!(self.poll_drain(cx))?;
        }
        let take = (CHUNK_SIZE - self.pending.len()).min(buf.len());
        self.pending.extend_from_slice(&buf[..take]);
        Poll::Ready(Ok(take))
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.poll_drain(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.poll_drain(cx)
    }
}

/// The bytes of an opened package.
///
/// The archive is encoded on a blocking worker thread and handed over in
/// chunks through a bounded channel, so a slow consumer throttles the
/// encoder instead of letting the archive pile up in memory. A failure while
/// encoding arrives as the final `Err` item.
pub struct PackageByteStream {
    rx: mpsc::Receiver<Chunk>,
}

impl PackageByteStream {
    pub(crate) fn new(rx: mpsc::Receiver<Chunk>) -> Self {
        Self { rx }
    }

    /// Adapts the stream into an [`AsyncRead`](tokio::io::AsyncRead).
    pub fn into_async_read(self) -> StreamReader<Self, Bytes> {
        StreamReader::new(self)
    }

    /// Copies the whole package into `writer`, returning the byte count.
    pub async fn write_to<W: AsyncWrite + Unpin>(mut self, writer: &mut W) -> io::Result<u64> {
        let mut written = 0;
        while let Some(chunk) = self.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }

    /// Collects the whole package in memory.
    pub async fn into_bytes(self) -> io::Result<Bytes> {
        let chunks: Vec<Bytes> = self.try_collect().await?;
        Ok(chunks.concat().into())
    }
}

impl std::fmt::Debug for PackageByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageByteStream").finish_non_exhaustive()
    }
}

impl Stream for PackageByteStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
