use antwire_frame::Message;
use tracing::warn;

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let raw = parse_hex(&args.hex)?;
    let (message, consumed) =
        Message::decode(&raw).map_err(|err| frame_error("decode failed", err))?;
    if consumed < raw.len() {
        warn!(
            consumed,
            trailing = raw.len() - consumed,
            "ignoring bytes after the first frame"
        );
    }
    print_message(&message, format);
    Ok(SUCCESS)
}
