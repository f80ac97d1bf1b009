//! Command-line probe for Pairline
//!
//! A thin shell over [`pairline_app::Driver`] that connects a real client to
//! a signaling server. Commands come from stdin, one per line, and the view
//! is rendered to the log. All orchestration logic lives in the generic
//! [`pairline_app::Runtime`].
//!
//! The probe has no SFU client: media connects are answered by
//! [`LoopbackMedia`], so calls reach `connected` without audio or video.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod args;
pub mod command;
pub mod driver;
pub mod media;
pub mod render;
pub mod system_env;

pub use args::ProbeArgs;
pub use command::{Command, CommandError};
pub use driver::{ProbeDriver, ProbeError};
pub use media::LoopbackMedia;
pub use system_env::SystemEnv;
