use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
#[cfg(feature = "serial")]
pub mod monitor;
pub mod replay;
pub mod scan;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a message and print its frame.
    Encode(EncodeArgs),
    /// Decode a single frame given as hex.
    Decode(DecodeArgs),
    /// Recover every message from a raw byte stream.
    Scan(ScanArgs),
    /// Replay the reads of a capture log through the event machine.
    Replay(ReplayArgs),
    /// Reset a USB stick and print its traffic.
    #[cfg(feature = "serial")]
    Monitor(MonitorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Scan(args) => scan::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        #[cfg(feature = "serial")]
        Command::Monitor(args) => monitor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Message name (e.g. CHANNEL_ASSIGN) or type byte (e.g. 0x42).
    pub message: String,
    /// Payload bytes as hex. Defaults to the message's default payload.
    pub payload: Vec<String>,
    /// Channel number for channel-scoped messages built from defaults.
    #[arg(long, short = 'c', conflicts_with = "payload")]
    pub channel: Option<u8>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes as hex; spaces, `:` and `|` separators are accepted.
    #[arg(required = true)]
    pub hex: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Input file, or `-` for stdin.
    pub input: PathBuf,
    /// Treat the input as hex text instead of raw bytes.
    #[arg(long)]
    pub hex: bool,
    /// Feed the scanner this many bytes at a time.
    #[arg(long, default_value = "30")]
    pub chunk: usize,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Capture log written by `--capture` or another ANT-LOG producer.
    pub capture: PathBuf,
    /// Maximum time to wait for the pump to drain the log (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[cfg(feature = "serial")]
#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial device of the USB stick.
    #[arg(long, env = "ANTWIRE_DEVICE", default_value = "/dev/ttyUSB0")]
    pub device: PathBuf,
    /// Line speed.
    #[arg(long, env = "ANTWIRE_BAUD", default_value = "115200")]
    pub baud: u32,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// How long to wait for each reply during setup (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Also write an ANT-LOG capture to this path.
    #[arg(long, value_name = "FILE")]
    pub capture: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `5s`, `500ms` or a bare number of seconds.
pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Parse hex bytes written the way frames are usually shown.
///
/// Accepts `A4 01 4A`, `a4014a`, `0xA4 0x01`, `A4:01` and `A4|01|4A`. A single
/// digit such as `0x1` is one byte; any longer odd-length token is rejected.
pub(crate) fn parse_hex<S: AsRef<str>>(parts: &[S]) -> CliResult<Vec<u8>> {
    let mut digits = String::new();
    for part in parts {
        for token in part
            .as_ref()
            .split(|c: char| c.is_whitespace() || c == ':' || c == '|' || c == ',')
        {
            let token = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            match token.len() {
                1 => digits.push('0'),
                len if len % 2 == 1 => {
                    return Err(CliError::new(
                        USAGE,
                        format!("invalid hex: odd number of digits in {token:?}"),
                    ));
                }
                _ => {}
            }
            digits.push_str(token);
        }
    }
    hex::decode(&digits).map_err(|err| CliError::new(USAGE, format!("invalid hex: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration(" ").is_err());
    }

    #[test]
    fn parse_hex_accepts_common_spellings() {
        let expected = vec![0xA4, 0x01, 0x4A, 0x00, 0xEF];
        assert_eq!(parse_hex(&["A4 01 4A 00 EF"]).unwrap(), expected);
        assert_eq!(parse_hex(&["a4014a00ef"]).unwrap(), expected);
        assert_eq!(parse_hex(&["A4", "01", "4A", "00", "EF"]).unwrap(), expected);
        assert_eq!(parse_hex(&["A4|01|4A|00|EF"]).unwrap(), expected);
        assert_eq!(parse_hex(&["0xA4 0x1 0x4A 0x0 0xEF"]).unwrap(), expected);
    }

    #[test]
    fn parse_hex_rejects_garbage() {
        let err = parse_hex(&["A4 ZZ"]).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn parse_hex_rejects_odd_length_runs() {
        let err = parse_hex(&["a4014a00e"]).unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("a4014a00e"));
        assert!(parse_hex(&["A4 014"]).is_err());
        assert_eq!(parse_hex(&["f"]).unwrap(), vec![0x0F]);
    }
}
