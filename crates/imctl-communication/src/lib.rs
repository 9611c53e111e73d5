//! # imctl Communication
//!
//! Remote control of automated widefield imaging instruments over TCP.
//! Provides the length-prefixed frame transport, the two wire dialects
//! spoken by the instrument's control software, typed command builders
//! and the session controller that runs the request/response exchanges.

pub mod command;
pub mod communication;
pub mod dialect;
pub mod response;
pub mod session;

pub use command::{
    AcquisitionRequest, CameraRoi, ChannelSettings, Command, FilenameAttribute, PlateAxis,
    ScriptFile, TemperatureProbe, ZStack,
};
pub use communication::{
    connect, encode_frame, read_frame, write_frame, ConnectionParams, DEFAULT_CONNECT_TIMEOUT_MS,
    DEFAULT_SETTLE_DELAY_MS,
};
pub use dialect::{create_dialect, DelimiterDialect, Dialect, FunctionCallDialect};
pub use response::{cast_value, Value, ValueKind};
pub use session::{shared, SessionController, SessionOptions, SharedSession};
