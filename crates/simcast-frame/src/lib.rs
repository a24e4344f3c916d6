//! Fixed-size raw video frames and whole-frame pipe writes.
//!
//! This is the lowest layer of simcast. A [`Frame`] is a headerless buffer of
//! interleaved pixel samples whose size is fully determined by its
//! [`FrameFormat`]. The [`RawFrameWriter`] pushes one frame at a time into any
//! `Write` sink and reports exactly how far it got when the reader goes away:
//! a caller never sees a half-written frame as success.

pub mod error;
pub mod format;
pub mod frame;
pub mod writer;

pub use error::{FrameError, Result};
pub use format::{FrameFormat, PixelFormat, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use frame::Frame;
pub use writer::{FrameWriterConfig, RawFrameWriter};
