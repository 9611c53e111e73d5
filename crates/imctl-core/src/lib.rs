//! # imctl Core
//!
//! Core types and error taxonomy for imctl.
//! Provides the session data model (mode, positions, light sources,
//! filename attributes) shared by the communication and settings crates.

pub mod data;
pub mod error;

pub use data::{
    ChannelMask, DialectKind, ImageFilenameAttributes, LightSource, Mode, PartialPosition, Position,
    SessionState, FLUORESCENCE_LED_COUNT,
};

pub use error::{
    ConnectionError, ControllerError, Error, ProtocolError, Result, ValidationError,
};
