//! HTTP gateway for a pan/tilt camera mount.
//!
//! Requests are turned into single-line commands for the motor daemon
//! (motord) through a file mailbox, motord's one-digit status is read back,
//! and everything else is served from the bundled web app.

pub mod command;
pub mod config;
pub mod error;
pub mod led;
pub mod motord;
pub mod netinfo;
pub mod server;
pub mod spa;

pub use command::{Command, Direction, Motor};
pub use config::{Cli, GatewayConfig};
pub use error::GatewayError;
pub use motord::{MotorLink, Outcome, PositionStatus};
