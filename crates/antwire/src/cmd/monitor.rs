use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use antwire_event::{EventMachine, WaitOptions};
use antwire_frame::capture::record_shared;
use antwire_frame::constants::MESSAGE_CAPABILITIES;
use antwire_frame::{
    shared_capture, Capabilities, CaptureKind, ChannelRequest, Message, MessageKind,
    MessageWriter, SharedCapture, SystemReset,
};
use antwire_transport::{SerialConfig, SerialTransport};
use tracing::info;

use crate::cmd::{parse_duration, MonitorArgs};
use crate::exit::{
    event_error, frame_error, io_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS,
};
use crate::output::{print_message, OutputFormat};

const RECV_POLL: Duration = Duration::from_millis(100);

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let config = SerialConfig {
        path: args.device.clone(),
        baud_rate: args.baud,
        ..SerialConfig::default()
    };
    let port = SerialTransport::open(&config).map_err(|err| transport_error("open failed", err))?;
    let reader = port
        .try_clone()
        .map_err(|err| transport_error("open failed", err))?;

    let capture = args.capture.as_deref().map(open_capture).transpose()?;
    let mut writer = MessageWriter::new(port);
    if let Some(capture) = &capture {
        record_shared(capture, CaptureKind::Open, &[]);
        writer = writer.with_capture(Arc::clone(capture));
    }

    let machine = EventMachine::new(reader);
    machine.set_capture(capture.clone());
    let (tx, rx) = mpsc::channel();
    machine.register_fn(move |message: &Message| {
        let _ = tx.send(message.clone());
    });
    machine
        .start()
        .map_err(|err| event_error("start failed", err))?;

    let wait = WaitOptions::timeout(timeout);
    writer
        .send(&SystemReset::new().into())
        .map_err(|err| frame_error("reset failed", err))?;
    machine
        .wait_for_message_with(MessageKind::StartupNotification, &wait)
        .map_err(|err| event_error("no startup notification", err))?;

    writer
        .send(&ChannelRequest::new(0, MESSAGE_CAPABILITIES).into())
        .map_err(|err| frame_error("capabilities request failed", err))?;
    let capabilities = machine
        .wait_for_message_with(MessageKind::Capabilities, &wait)
        .map_err(|err| event_error("no capabilities reply", err))?;
    if let Ok(capabilities) = Capabilities::try_from(capabilities) {
        info!(
            max_channels = capabilities.max_channels(),
            max_networks = capabilities.max_networks(),
            options = %capabilities.available_options().join(","),
            "device ready"
        );
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running))?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let message = match rx.recv_timeout(RECV_POLL) {
            Ok(message) => message,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        print_message(&message, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    machine
        .stop()
        .map_err(|err| event_error("stop failed", err))?;
    if let Some(capture) = &capture {
        record_shared(capture, CaptureKind::Close, &[]);
        capture
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
            .map_err(|err| frame_error("capture flush failed", err))?;
    }
    Ok(SUCCESS)
}

fn open_capture(path: &std::path::Path) -> CliResult<SharedCapture> {
    let file = File::create(path)
        .map_err(|err| io_error(&format!("failed creating {}", path.display()), err))?;
    shared_capture(file).map_err(|err| frame_error("failed writing capture header", err))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
