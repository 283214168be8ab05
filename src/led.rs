use std::{fmt, path::PathBuf};
use tracing::info;

use crate::error::GatewayError;

pub const BLUE_LED: &str = "/sys/class/gpio/gpio76/value";
pub const YELLOW_LED: &str = "/sys/class/gpio/gpio77/value";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    Blue,
    Yellow,
}

impl LedColor {
    /// Unknown color names select the blue led.
    pub fn from_name(name: &str) -> Self {
        if name == "yellow" {
            LedColor::Yellow
        } else {
            LedColor::Blue
        }
    }
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LedColor::Blue => "blue",
            LedColor::Yellow => "yellow",
        })
    }
}

/// Pass-through writer for the two GPIO value files.
#[derive(Debug, Clone)]
pub struct LedController {
    blue: PathBuf,
    yellow: PathBuf,
}

impl LedController {
    pub fn new(blue: impl Into<PathBuf>, yellow: impl Into<PathBuf>) -> Self {
        Self {
            blue: blue.into(),
            yellow: yellow.into(),
        }
    }

    pub fn path(&self, color: LedColor) -> &PathBuf {
        match color {
            LedColor::Blue => &self.blue,
            LedColor::Yellow => &self.yellow,
        }
    }

    pub async fn set(&self, color: LedColor, on: bool) -> Result<(), GatewayError> {
        let path = self.path(color);
        let value: &[u8] = if on { b"1" } else { b"0" };

        tokio::fs::write(path, value)
            .await
            .map_err(|source| GatewayError::LedWrite {
                color,
                path: path.clone(),
                source,
            })?;

        info!("💡 {} led {}", color, if on { "on" } else { "off" });
        Ok(())
    }
}
