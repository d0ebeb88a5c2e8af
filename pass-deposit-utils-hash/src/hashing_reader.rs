// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Digesting a resource while it is being read.
//!
//! A [`HashingReader`] feeds everything that passes through it into one
//! [`Context`] per requested algorithm. Once the inner reader reaches EOF
//! the shared [`Digests`] handle holds the resource length and all of its
//! checksums, so a resource never has to be buffered to be described.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{self, Poll};

use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, ReadBuf};

use crate::{Algorithm, Context, Hash};

/// Running checksums plus the number of bytes seen so far.
pub struct Digests {
    contexts: Vec<Context>,
    pub len: u64,
}

impl Digests {
    fn new(algorithms: &[Algorithm]) -> Self {
        Digests {
            contexts: algorithms.iter().map(|a| Context::new(*a)).collect(),
            len: 0,
        }
    }

    fn consume(&mut self, chunk: &[u8]) {
        self.contexts.iter_mut().for_each(|ctx| ctx.update(chunk));
        self.len += chunk.len() as u64;
    }

    /// One hash per algorithm, in the order the reader was built with.
    pub fn finish(self) -> Vec<Hash> {
        self.contexts.into_iter().map(Context::finish).collect()
    }

    /// Moves the accumulated digests out of the handle shared with a reader.
    pub fn take(shared: &Mutex<Digests>) -> Digests {
        let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut guard, Digests::new(&[]))
    }
}

impl std::fmt::Debug for Digests {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Digests")
            .field(
                "algorithms",
                &self.contexts.iter().map(Context::algorithm).collect::<Vec<_>>(),
            )
            .field("len", &self.len)
            .finish()
    }
}

pin_project! {
    /// [`AsyncRead`] adapter that digests the bytes it yields.
    pub struct HashingReader<R> {
        #[pin]
        inner: R,
        digests: Arc<Mutex<Digests>>,
    }
}

impl<R> HashingReader<R> {
    /// Wraps `inner`, returning the reader and the handle its digests
    /// accumulate in.
    pub fn new(inner: R, algorithms: &[Algorithm]) -> (Self, Arc<Mutex<Digests>>) {
        let digests = Arc::new(Mutex::new(Digests::new(algorithms)));
        let reader = HashingReader {
            inner,
            digests: Arc::clone(&digests),
        };
        (reader, digests)
    }
}

impl<R: AsyncRead> AsyncRead for HashingReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.project();
        let start = buf.filled().len();
        let polled = this.inner.poll_read(cx, buf);
        if matches!(polled, Poll::Ready(Ok(()))) && buf.filled().len() > start {
            this.digests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .consume(&buf.filled()[start..]);
        }
        polled
    }
}
