//! Response relay.
//!
//! Status and headers are copied verbatim to the caller; the backend body
//! is streamed through a counting adapter. Once headers are written they
//! are final: a body-copy failure is logged and the stream ends, but no
//! secondary error response is produced.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::{Response, StatusCode};
use hyper::body::{Body as HttpBody, Frame, Incoming, SizeHint};

/// Convert the backend response into the caller's response, streaming the
/// body. The backend stream is released when the adapter is dropped,
/// whether or not the copy completed.
pub fn relay(response: Response<Incoming>) -> Response<Body> {
    let (parts, body) = response.into_parts();
    let status = parts.status;
    Response::from_parts(parts, Body::new(RelayBody::new(body, status)))
}

/// Body adapter that counts relayed bytes and reports the outcome: total
/// bytes and status on completion, an interruption if the backend stream
/// errors mid-copy, an abort if the caller goes away first.
struct RelayBody<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
{
    inner: B,
    status: StatusCode,
    bytes: u64,
    finished: bool,
}

impl<B> RelayBody<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
{
    fn new(inner: B, status: StatusCode) -> Self {
        Self {
            inner,
            status,
            bytes: 0,
            finished: false,
        }
    }
}

impl<B> HttpBody for RelayBody<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
    B::Error: std::fmt::Display,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.bytes += data.len() as u64;
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(error))) => {
                this.finished = true;
                tracing::warn!(
                    bytes = this.bytes,
                    error = %error,
                    "relay interrupted while copying backend body"
                );
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                this.finished = true;
                tracing::info!(
                    status = this.status.as_u16(),
                    bytes = this.bytes,
                    "response relayed"
                );
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B> Drop for RelayBody<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
{
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // The server may skip the final poll for a body it knows is
        // complete; only an undrained stream means the caller went away.
        if self.inner.is_end_stream() {
            tracing::info!(
                status = self.status.as_u16(),
                bytes = self.bytes,
                "response relayed"
            );
        } else {
            tracing::warn!(
                status = self.status.as_u16(),
                bytes = self.bytes,
                "relay aborted before backend body was drained"
            );
        }
    }
}
