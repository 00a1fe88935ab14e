//! Cadenza terminal application
//!
//! Text front end over `cadenza-playback`: category menu, track lists and a
//! now-playing screen, driven by typed commands and backed by an in-process
//! simulated player.

#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod router;
pub mod screens;
pub mod simulator;

pub use catalog::Library;
pub use config::AppConfig;
pub use context::{AppContext, Flow};
pub use error::{AppError, Result};
pub use router::{Route, Router};
pub use screens::{parse_command, ScreenCommand};
pub use simulator::SimulatedPlayer;
