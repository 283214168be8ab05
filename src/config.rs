use clap::Parser;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use crate::error::GatewayError;
use crate::led::{BLUE_LED, YELLOW_LED};
use crate::motord::{EVENT_FILE, STATUS_FILE};
use crate::spa::INDEX_FILE;

pub const DEFAULT_PORT: u16 = 8090;

/// Per-request deadline, covering both reading the request and writing the reply.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP gateway for the pan/tilt camera mount and status leds.
#[derive(Parser, Debug)]
#[command(name = "web-control", version)]
pub struct Cli {
    /// Directory holding the motord `event` and `status` files.
    #[arg(long = "motord_folder", env = "MOTORD_FOLDER", default_value = ".")]
    pub motord_folder: PathBuf,

    #[arg(long, env = "WEB_CONTROL_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, env = "WEB_CONTROL_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Directory with the bundled web app.
    #[arg(long = "static_dir", env = "WEB_CONTROL_STATIC", default_value = "static")]
    pub static_dir: PathBuf,

    #[arg(long = "blue_led", default_value = BLUE_LED)]
    pub blue_led: PathBuf,

    #[arg(long = "yellow_led", default_value = YELLOW_LED)]
    pub yellow_led: PathBuf,

    /// Delay between writing a command and reading motord's status.
    #[arg(long = "settle_ms", default_value_t = 0)]
    pub settle_ms: u64,
}

/// Settings fixed at startup and shared read-only with every component.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub motord_folder: PathBuf,
    pub bind: IpAddr,
    pub port: u16,
    pub static_root: PathBuf,
    pub index_file: String,
    pub blue_led: PathBuf,
    pub yellow_led: PathBuf,
    pub settle: Duration,
    pub request_timeout: Duration,
}

impl From<Cli> for GatewayConfig {
    fn from(cli: Cli) -> Self {
        Self {
            motord_folder: cli.motord_folder,
            bind: cli.bind,
            port: cli.port,
            static_root: cli.static_dir,
            index_file: INDEX_FILE.to_string(),
            blue_led: cli.blue_led,
            yellow_led: cli.yellow_led,
            settle: Duration::from_millis(cli.settle_ms),
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    pub fn event_path(&self) -> PathBuf {
        self.motord_folder.join(EVENT_FILE)
    }

    pub fn status_path(&self) -> PathBuf {
        self.motord_folder.join(STATUS_FILE)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// motord must have created the event file before the gateway starts.
    pub fn check_preconditions(&self) -> Result<(), GatewayError> {
        let event = self.event_path();
        if event.exists() {
            Ok(())
        } else {
            Err(GatewayError::EventFileMissing(event))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> GatewayConfig {
        let mut argv = vec!["web-control"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().into()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.port, 8090);
        assert_eq!(config.motord_folder, PathBuf::from("."));
        assert_eq!(config.static_root, PathBuf::from("static"));
        assert_eq!(config.index_file, "index.html");
        assert_eq!(config.blue_led, PathBuf::from("/sys/class/gpio/gpio76/value"));
        assert_eq!(config.yellow_led, PathBuf::from("/sys/class/gpio/gpio77/value"));
        assert_eq!(config.settle, Duration::ZERO);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8090");
    }

    #[test]
    fn test_flags() {
        let config = parse(&[
            "--motord_folder",
            "/tmp/motord",
            "--port",
            "9000",
            "--settle_ms",
            "25",
        ]);
        assert_eq!(config.event_path(), PathBuf::from("/tmp/motord/event"));
        assert_eq!(config.status_path(), PathBuf::from("/tmp/motord/status"));
        assert_eq!(config.port, 9000);
        assert_eq!(config.settle, Duration::from_millis(25));
    }

    #[test]
    fn test_bad_port_is_rejected() {
        assert!(Cli::try_parse_from(["web-control", "--port", "http"]).is_err());
    }

    #[test]
    fn test_help_is_a_display_request() {
        let err = Cli::try_parse_from(["web-control", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_missing_event_file_fails_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let config = parse(&["--motord_folder", dir.path().to_str().unwrap()]);

        let err = config.check_preconditions().unwrap_err();
        assert!(matches!(err, GatewayError::EventFileMissing(_)));

        std::fs::write(config.event_path(), b"").unwrap();
        assert!(config.check_preconditions().is_ok());
    }
}
