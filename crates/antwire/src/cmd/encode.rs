use antwire_frame::{Message, MessageKind};

use crate::cmd::{parse_hex, EncodeArgs};
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let message = build(&args)?;
    print_message(&message, format);
    Ok(SUCCESS)
}

fn build(args: &EncodeArgs) -> CliResult<Message> {
    let kind = resolve_kind(&args.message)?;

    if !args.payload.is_empty() {
        let payload = parse_hex(&args.payload)?;
        return Message::from_parts(kind.id(), &payload)
            .map_err(|err| frame_error("encode failed", err));
    }

    let message = Message::default_for(kind);
    let Some(channel) = args.channel else {
        return Ok(message);
    };
    if !kind.is_channel_scoped() {
        return Err(CliError::new(
            USAGE,
            format!("{kind} does not take a channel"),
        ));
    }
    let mut payload = message.payload().to_vec();
    if let Some(first) = payload.first_mut() {
        *first = channel;
    }
    Message::from_parts(kind.id(), &payload).map_err(|err| frame_error("encode failed", err))
}

/// Accept a catalog name or a type byte in hex.
fn resolve_kind(input: &str) -> CliResult<MessageKind> {
    if let Some(kind) = MessageKind::from_name(input) {
        return Ok(kind);
    }
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    let id = u8::from_str_radix(digits, 16)
        .map_err(|_| CliError::new(USAGE, format!("unknown message: {input}")))?;
    MessageKind::from_id(id)
        .ok_or_else(|| CliError::new(USAGE, format!("unknown message type {id:#04x}")))
}
