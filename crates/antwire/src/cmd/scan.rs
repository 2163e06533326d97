use std::io::Read;
use std::path::Path;

use antwire_frame::{FrameError, FrameScanner, Message};
use tracing::{info, warn};

use crate::cmd::{parse_hex, ScanArgs};
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_messages, OutputFormat};

pub fn run(args: ScanArgs, format: OutputFormat) -> CliResult<i32> {
    if args.chunk == 0 {
        return Err(CliError::new(USAGE, "--chunk must be greater than zero"));
    }

    let mut data = read_input(&args.input)?;
    if args.hex {
        let text = String::from_utf8_lossy(&data).into_owned();
        data = parse_hex(&[text])?;
    }

    let outcome = scan_chunks(&data, args.chunk);
    print_messages(&outcome.messages, format);
    info!(
        messages = outcome.messages.len(),
        skipped = outcome.skipped,
        "scan finished"
    );

    if let Some(err) = outcome.stalled {
        return Err(CliError::new(
            DATA_INVALID,
            format!(
                "scan stalled with {} bytes left: {err}",
                outcome.remaining
            ),
        ));
    }
    if outcome.remaining > 0 {
        warn!(bytes = outcome.remaining, "input ends inside a frame");
    }
    Ok(SUCCESS)
}

struct Outcome {
    messages: Vec<Message>,
    skipped: usize,
    remaining: usize,
    stalled: Option<FrameError>,
}

fn scan_chunks(data: &[u8], chunk: usize) -> Outcome {
    let mut scanner = FrameScanner::new();
    let mut messages = Vec::new();
    let mut stalled = None;

    for piece in data.chunks(chunk) {
        let scan = scanner.push(piece);
        messages.extend(scan.messages);
        stalled = scan.stalled;
    }

    Outcome {
        messages,
        skipped: scanner.skipped_total(),
        remaining: scanner.len(),
        stalled,
    }
}

fn read_input(path: &Path) -> CliResult<Vec<u8>> {
    let mut data = Vec::new();
    if path.as_os_str() == "-" {
        std::io::stdin()
            .read_to_end(&mut data)
            .map_err(|err| io_error("failed reading stdin", err))?;
        return Ok(data);
    }
    std::fs::read(path).map_err(|err| io_error(&format!("failed reading {}", path.display()), err))
}

#[cfg(test)]
mod tests {
    use antwire_frame::MessageKind;

    use super::*;

    const STREAM: &[u8] = &[
        0xA4, 0x01, 0x6F, 0x20, 0xEA, // startup
        0xA4, 0x03, 0x42, 0x00, 0x00, 0x00, 0x00, // corrupt assign
        0xA4, 0x03, 0x40, 0x00, 0x42, 0x00, 0xA5, // assign ack
    ];

    #[test]
    fn chunk_size_does_not_change_the_result() {
        for chunk in [1, 2, 5, 7, 30] {
            let outcome = scan_chunks(STREAM, chunk);
            let kinds: Vec<MessageKind> = outcome.messages.iter().map(Message::kind).collect();
            assert_eq!(
                kinds,
                vec![MessageKind::StartupNotification, MessageKind::ChannelEvent],
                "chunk {chunk}"
            );
            assert_eq!(outcome.skipped, 7);
            assert_eq!(outcome.remaining, 0);
            assert!(outcome.stalled.is_none());
        }
    }

    #[test]
    fn reports_a_stall() {
        let outcome = scan_chunks(
            &[0xA4, 0x01, 0x6F, 0x20, 0xEA, 0x00, 0x01, 0x4A, 0x00, 0x4B],
            30,
        );
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.remaining, 5);
        assert!(matches!(outcome.stalled, Some(FrameError::SyncMismatch(0x00))));
    }
}
