#![allow(dead_code)]

pub mod fake_instrument;

pub use fake_instrument::{FailingShutdown, FakeInstrument, Reply};

use imctl_communication::{create_dialect, SessionController, SessionOptions};
use imctl_core::DialectKind;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// Session over `stream` without settle delay
pub fn session<S>(stream: S, dialect: DialectKind) -> SessionController<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    init_tracing();
    SessionController::with_stream(
        stream,
        create_dialect(dialect),
        SessionOptions {
            settle_delay: Duration::ZERO,
        },
    )
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("imctl_communication=debug")
        .try_init();
}
