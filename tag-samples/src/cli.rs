//! Shared CLI surface for the sample clients
//!
//! Invocation shape, common to every sample:
//!
//! ```text
//! <program> [-v] <reader-uri> [--ant n[,n...]]
//! ```
//!
//! `-v` turns on transport-frame tracing; `--ant` takes one
//! comma-separated antenna list and may appear at most once. Malformed
//! input is rejected by clap with usage and a non-zero exit before any
//! connection is attempted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tag_connect::{PortScanner, ReaderUri, UriScheme};
use tag_protocol::{Direction, ReaderDriver, TransportFrame, TransportTap};
use tag_session::{ReaderSession, SessionOptions};
use tag_sim::SimReader;
use tokio::sync::mpsc;

/// Arguments shared by every sample
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Turn on transport-frame tracing
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Reader URI, e.g. "tmr:///dev/ttyUSB0", "tmr://10.11.115.32",
    /// or "sim://m6e?tags=8"
    pub reader_uri: String,

    /// Comma-separated antenna list, e.g. "--ant 1,2"
    #[arg(long = "ant", value_name = "n[,n...]", value_parser = parse_antenna_list)]
    pub ant: Option<AntennaList>,
}

impl SampleArgs {
    /// Requested antennas; empty means the device default set
    pub fn antennas(&self) -> Vec<u16> {
        self.ant.clone().map(|list| list.0).unwrap_or_default()
    }
}

/// Parsed `--ant` value
#[derive(Debug, Clone)]
pub struct AntennaList(pub Vec<u16>);

fn parse_antenna_list(raw: &str) -> Result<AntennaList, String> {
    let mut antennas = Vec::new();
    for token in raw.split(',') {
        let antenna: u16 = token
            .trim()
            .parse()
            .map_err(|_| format!("can't parse '{}' as an antenna number", token))?;
        antennas.push(antenna);
    }
    Ok(AntennaList(antennas))
}

/// Initialize logging once per sample process
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tag_samples=info,tag_protocol=info,tag_connect=info,tag_session=info,tag_sim=info"
                    .into()
            }),
        )
        .init();
}

/// Spawn the transport-frame printer and return the tap to install
///
/// Frames are printed as the conventional hex dump, sixteen bytes per
/// line, with a direction prefix.
pub fn spawn_trace_printer() -> TransportTap {
    let (tx, mut rx) = mpsc::unbounded_channel::<TransportFrame>();
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            print_frame(&frame);
        }
    });
    tx
}

fn print_frame(frame: &TransportFrame) {
    let prefix = match frame.direction {
        Direction::Tx => "Sending: ",
        Direction::Rx => "Received:",
    };
    print!("{}", prefix);
    for (i, byte) in frame.bytes.iter().enumerate() {
        if i > 0 && i % 16 == 0 {
            print!("\n         ");
        }
        print!(" {:02x}", byte);
    }
    println!();
}

/// Resolve the reader URI, build the matching driver, and open the
/// session (with baud probing where the transport allows it)
pub async fn connect(args: &SampleArgs) -> anyhow::Result<ReaderSession> {
    let uri = ReaderUri::parse(&args.reader_uri)?;

    let driver: Arc<dyn ReaderDriver> = match uri.scheme() {
        UriScheme::Sim => Arc::new(SimReader::from_uri(&uri)?),
        UriScheme::Serial => {
            // Hardware drivers live in their own crates and register the
            // tmr:// schemes; none are linked into the samples
            print_serial_port_hint();
            anyhow::bail!(
                "no hardware driver is linked for '{}'; run against a sim:// endpoint",
                uri
            );
        }
        UriScheme::Network => {
            anyhow::bail!(
                "no hardware driver is linked for '{}'; run against a sim:// endpoint",
                uri
            );
        }
    };

    let options = SessionOptions {
        label: uri.as_str().to_string(),
        connect_timeout: Duration::from_millis(1000),
        transport_tap: args.verbose.then(spawn_trace_printer),
    };
    ReaderSession::connect(driver, options)
        .await
        .with_context(|| format!("connecting {}", uri))
}

fn print_serial_port_hint() {
    if let Ok(ports) = PortScanner::new().enumerate_ports() {
        if !ports.is_empty() {
            eprintln!("serial ports on this host:");
            for port in ports {
                match port.product {
                    Some(product) => eprintln!("  {} - {}", port.port, product),
                    None => eprintln!("  {}", port.port),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_antenna_list_parsing() {
        assert_eq!(parse_antenna_list("1").unwrap().0, vec![1]);
        assert_eq!(parse_antenna_list("1,2,4").unwrap().0, vec![1, 2, 4]);
        assert!(parse_antenna_list("").is_err());
        assert!(parse_antenna_list("1,x").is_err());
        assert!(parse_antenna_list("1,").is_err());
    }

    #[test]
    fn test_args_reject_duplicate_ant() {
        let result =
            SampleArgs::try_parse_from(["read", "sim://m6e", "--ant", "1", "--ant", "2"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_args_reject_missing_ant_value() {
        let result = SampleArgs::try_parse_from(["read", "sim://m6e", "--ant"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_args_reject_unknown_token() {
        let result = SampleArgs::try_parse_from(["read", "sim://m6e", "--frobnicate"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_args_accept_verbose_and_antennas() {
        let args =
            SampleArgs::try_parse_from(["read", "-v", "sim://m6e?tags=2", "--ant", "1,2"]).unwrap();
        assert!(args.verbose);
        assert_eq!(args.reader_uri, "sim://m6e?tags=2");
        assert_eq!(args.antennas(), vec![1, 2]);
    }
}
