//! Response streaming.
//!
//! # Responsibilities
//! - Stream the backend response body to the client without buffering
//! - Hold the backend connection guard until the body is finished
//!
//! # Design Decisions
//! - The guard is released on end of stream or on the first body error
//! - If the body is dropped early (client hung up), `Drop` releases it instead
//! - Either way the release happens once

use std::pin::Pin;
use std::task::{Context, Poll};

use hyper::body::{Body, Frame, SizeHint};

use crate::load_balancer::BackendConnectionGuard;

/// A response body that owns the connection guard of the backend producing it.
pub struct GuardedBody<B> {
    inner: Pin<Box<B>>,
    guard: Option<BackendConnectionGuard>,
}

impl<B> GuardedBody<B> {
    pub fn new(inner: B, guard: BackendConnectionGuard) -> Self {
        Self {
            inner: Box::pin(inner),
            guard: Some(guard),
        }
    }
}

impl<B: Body> Body for GuardedBody<B> {
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let poll = this.inner.as_mut().poll_frame(cx);
        if matches!(poll, Poll::Ready(None) | Poll::Ready(Some(Err(_)))) {
            this.guard.take();
        }
        poll
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
