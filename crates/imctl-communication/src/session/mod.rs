//! Instrument sessions
//!
//! A [`SessionController`] owns the connection and serializes every
//! exchange through `&mut self`. To share one session between tasks, wrap
//! it in a [`SharedSession`].

pub mod controller;

pub use controller::{SessionController, SessionOptions};

use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Session shared between tasks; the lock keeps one command in flight
pub type SharedSession<S = TcpStream> = Arc<Mutex<SessionController<S>>>;

/// Wrap a session for sharing between tasks
pub fn shared<S>(session: SessionController<S>) -> SharedSession<S> {
    Arc::new(Mutex::new(session))
}
