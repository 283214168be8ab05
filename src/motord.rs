//! File mailbox shared with motord.
//!
//! The gateway truncates and rewrites `event` with one command at a time and
//! reads back the single digit motord leaves in `status`. There is no
//! acknowledgment from the daemon, so a write and the following read are
//! paired under a lock and tagged with a sequence number.

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::error::GatewayError;

pub const EVENT_FILE: &str = "event";
pub const STATUS_FILE: &str = "status";

/// Digit motord reported after acting on the last command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionStatus(u8);

impl PositionStatus {
    pub fn code(self) -> u8 {
        self.0
    }

    pub fn outcome(self) -> Outcome {
        if self.0 == 0 {
            Outcome::Ok
        } else {
            Outcome::Overflow
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Overflow,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Overflow => "overflow",
        }
    }
}

/// Decodes the first byte of the status file.
pub fn decode_status(path: &Path, bytes: &[u8]) -> Result<PositionStatus, GatewayError> {
    match bytes.first() {
        None => Err(GatewayError::StatusEmpty(path.to_path_buf())),
        Some(b) if b.is_ascii_digit() => Ok(PositionStatus(b - b'0')),
        Some(&found) => Err(GatewayError::StatusNotDigit {
            path: path.to_path_buf(),
            found,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTrip {
    pub seq: u64,
    pub status: PositionStatus,
}

#[derive(Debug)]
pub struct MotorLink {
    event_path: PathBuf,
    status_path: PathBuf,
    settle: Duration,
    round_trip: Mutex<()>,
    seq: AtomicU64,
}

impl MotorLink {
    pub fn new(folder: impl AsRef<Path>, settle: Duration) -> Self {
        let folder = folder.as_ref();
        Self {
            event_path: folder.join(EVENT_FILE),
            status_path: folder.join(STATUS_FILE),
            settle,
            round_trip: Mutex::new(()),
            seq: AtomicU64::new(0),
        }
    }

    pub fn event_path(&self) -> &Path {
        &self.event_path
    }

    /// Replaces the pending command. Failures are logged and dropped; the
    /// caller still goes on to read the status.
    pub async fn post(&self, command: &Command) {
        let text = command.to_string();
        match tokio::fs::write(&self.event_path, text.as_bytes()).await {
            Ok(()) => debug!("wrote {:?} to {:?}", text, self.event_path),
            Err(e) => error!("❌ failed to write {:?} to {:?}: {}", text, self.event_path, e),
        }
    }

    pub async fn read_status(&self) -> Result<PositionStatus, GatewayError> {
        let bytes = tokio::fs::read(&self.status_path)
            .await
            .map_err(|source| GatewayError::StatusRead {
                path: self.status_path.clone(),
                source,
            })?;
        decode_status(&self.status_path, &bytes)
    }

    /// Posts `command` and reads the resulting status while holding the
    /// round-trip lock, so concurrent callers never see each other's result.
    pub async fn execute(&self, command: &Command) -> Result<RoundTrip, GatewayError> {
        let _guard = self.round_trip.lock().await;
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;

        info!("🎯 [#{}] {}", seq, command);
        self.post(command).await;

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let status = self.read_status().await?;
        if status.outcome() == Outcome::Overflow {
            warn!("⚠️ [#{}] motord reported overflow (status {})", seq, status.code());
        }

        Ok(RoundTrip { seq, status })
    }
}
