use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use antwire_event::EventMachine;
use antwire_frame::{CaptureKind, CaptureReader, Message};
use antwire_transport::CannedTransport;
use bytes::Bytes;
use tracing::{info, warn};

use crate::cmd::{parse_duration, ReplayArgs};
use crate::exit::{event_error, frame_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_messages, OutputFormat};

const DRAIN_POLL: Duration = Duration::from_millis(5);

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let reader = CaptureReader::open(&args.capture).map_err(|err| {
        frame_error(&format!("failed opening {}", args.capture.display()), err)
    })?;

    let mut reads = Vec::new();
    let mut logged = Vec::new();
    for entry in reader {
        let entry = entry.map_err(|err| frame_error("bad capture log", err))?;
        match entry.kind {
            CaptureKind::Read => reads.push(entry.data),
            CaptureKind::Message => logged.push(entry.data),
            _ => {}
        }
    }

    let decoded = replay_reads(reads, timeout)?;
    print_messages(&decoded, format);

    let matched = decoded
        .iter()
        .zip(&logged)
        .filter(|(message, raw)| message.encode() == **raw)
        .count();
    info!(
        decoded = decoded.len(),
        logged = logged.len(),
        matched,
        "replay finished"
    );
    if !logged.is_empty() && (matched != logged.len() || decoded.len() != logged.len()) {
        warn!("decoded messages differ from the ones recorded in the log");
    }
    Ok(SUCCESS)
}

/// Feed recorded reads through a fresh event machine and collect what it dispatches.
fn replay_reads(reads: Vec<Bytes>, timeout: Duration) -> CliResult<Vec<Message>> {
    let device = CannedTransport::new();
    for chunk in reads {
        device.push_read(chunk);
    }

    let decoded = Arc::new(Mutex::new(Vec::new()));
    let machine = EventMachine::new(device.clone());
    {
        let decoded = Arc::clone(&decoded);
        machine.register_fn(move |message: &Message| {
            decoded
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(message.clone());
        });
    }

    machine
        .start()
        .map_err(|err| event_error("replay failed to start", err))?;
    let deadline = Instant::now() + timeout;
    while device.pending_reads() > 0 && Instant::now() < deadline {
        thread::sleep(DRAIN_POLL);
    }
    // The pump finishes the chunk it is holding before it observes the stop.
    machine
        .stop()
        .map_err(|err| event_error("replay failed to stop", err))?;

    if device.pending_reads() > 0 {
        return Err(CliError::new(
            TIMEOUT,
            format!("replay did not drain within {timeout:?}"),
        ));
    }

    let decoded = std::mem::take(&mut *decoded.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(decoded)
}
