//! Fake instrument for session tests.
//!
//! Serves scripted replies over an in-memory pipe: for each request frame it
//! records the payload and answers with the next reply. When the script runs
//! out, or on a truncated reply, it drops its end of the pipe.

use imctl_communication::{read_frame, write_frame};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{duplex, AsyncRead, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};
use tokio::task::JoinHandle;

/// One scripted reply
pub enum Reply {
    /// Complete frame with this payload
    Frame(Vec<u8>),
    /// Header declaring `declared` bytes, followed by fewer bytes and a hangup
    Truncated { declared: u32, sent: Vec<u8> },
}

impl Reply {
    /// Function-call value or acknowledgment text
    pub fn text(text: &str) -> Self {
        Self::Frame(text.as_bytes().to_vec())
    }

    /// Plain acknowledgment
    pub fn ack() -> Self {
        Self::text("ok")
    }

    /// Error acknowledgment
    pub fn error() -> Self {
        Self::text("error")
    }

    /// Delimiter feedback carrying `value`
    pub fn delimited(value: &str) -> Self {
        Self::Frame(format!("\x02Feedback\x1f{}\x03", value).into_bytes())
    }
}

pub struct FakeInstrument {
    handle: JoinHandle<Vec<String>>,
}

impl FakeInstrument {
    /// Start serving `replies`, returning the client end of the pipe
    pub fn spawn(replies: Vec<Reply>) -> (DuplexStream, Self) {
        let (client, mut server) = duplex(4096);
        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            let mut replies = replies.into_iter();

            while let Ok(payload) = read_frame(&mut server).await {
                requests.push(String::from_utf8_lossy(&payload).into_owned());
                match replies.next() {
                    Some(Reply::Frame(bytes)) => {
                        if write_frame(&mut server, &bytes).await.is_err() {
                            break;
                        }
                    }
                    Some(Reply::Truncated { declared, sent }) => {
                        let _ = server.write_all(&declared.to_be_bytes()).await;
                        let _ = server.write_all(&sent).await;
                        break;
                    }
                    None => break,
                }
            }
            requests
        });

        (client, Self { handle })
    }

    /// Wait for the client to hang up and return the recorded requests
    pub async fn requests(self) -> Vec<String> {
        self.handle.await.expect("fake instrument task panicked")
    }
}

/// Stream whose shutdown always fails
pub struct FailingShutdown<S>(pub S);

impl<S: AsyncRead + Unpin> AsyncRead for FailingShutdown<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for FailingShutdown<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::other("shutdown refused")))
    }
}
