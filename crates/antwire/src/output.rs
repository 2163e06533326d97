use std::io::{IsTerminal, Write};

use antwire_frame::constants::message_name;
use antwire_frame::{hex_spaced, Message};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ExtendedOutput {
    flag: u8,
    data: String,
    device_number: Option<u16>,
    device_type: Option<u8>,
    transmission_type: Option<u8>,
}

#[derive(Serialize)]
struct MessageOutput {
    name: &'static str,
    msg_type: u8,
    channel: Option<u8>,
    payload: String,
    checksum: u8,
    frame: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    extended: Option<ExtendedOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<Field>,
}

#[derive(Serialize)]
struct Field {
    name: &'static str,
    value: String,
}

impl MessageOutput {
    fn new(message: &Message) -> Self {
        Self {
            name: message.name(),
            msg_type: message.msg_type(),
            channel: message
                .kind()
                .is_channel_scoped()
                .then(|| message.channel_number()),
            payload: hex_spaced(message.payload()),
            checksum: message.checksum(),
            frame: hex_spaced(&message.encode()),
            extended: message.extended().map(|ext| ExtendedOutput {
                flag: ext.flag(),
                data: hex_spaced(ext.data()),
                device_number: ext.device_number(),
                device_type: ext.device_type(),
                transmission_type: ext.transmission_type(),
            }),
            fields: describe(message),
        }
    }
}

/// Typed field values worth showing for `message`.
fn describe(message: &Message) -> Vec<Field> {
    fn field(name: &'static str, value: impl ToString) -> Field {
        Field {
            name,
            value: value.to_string(),
        }
    }

    match message {
        Message::ChannelAssign(m) => vec![
            field("channel_type", format!("{:#04x}", m.channel_type())),
            field("network", m.network_number()),
        ],
        Message::ChannelId(m) => vec![
            field("device_number", m.device_number()),
            field("device_type", m.device_type()),
            field("transmission_type", m.transmission_type()),
        ],
        Message::ChannelPeriod(m) => vec![field("period", m.period())],
        Message::ChannelSearchTimeout(m) => vec![field("timeout", m.timeout())],
        Message::ChannelFrequency(m) => vec![field("frequency", m.frequency())],
        Message::ChannelTxPower(m) => vec![field("power", m.power())],
        Message::NetworkKey(m) => vec![
            field("network", m.network_number()),
            field("key", hex_spaced(&m.key())),
        ],
        Message::ChannelRequest(m) => vec![field("requested", message_name(m.requested_id()))],
        Message::BroadcastData(m) => vec![field("data", hex_spaced(m.data()))],
        Message::AcknowledgedData(m) => vec![field("data", hex_spaced(m.data()))],
        Message::BurstData(m) => vec![
            field("sequence", m.sequence()),
            field("data", hex_spaced(m.data())),
        ],
        Message::ChannelEvent(m) => vec![
            field("message", message_name(m.message_id())),
            field("code", m.code_name()),
        ],
        Message::ChannelStatus(m) => vec![field("state", m.channel_state())],
        Message::Version(m) => vec![field("version", m.version_string())],
        Message::Capabilities(m) => vec![
            field("max_channels", m.max_channels()),
            field("max_networks", m.max_networks()),
            field("options", m.available_options().join(",")),
        ],
        Message::SerialNumber(m) => vec![field("serial", m.serial())],
        Message::StartupNotification(m) => vec![field("reason", format!("{:#04x}", m.reason()))],
        _ => Vec::new(),
    }
}

/// Print one message, as it arrives.
pub fn print_message(message: &Message, format: OutputFormat) {
    print_messages(std::slice::from_ref(message), format);
}

/// Print a batch of messages; table output renders them as one table.
pub fn print_messages(messages: &[Message], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for message in messages {
                println!(
                    "{}",
                    serde_json::to_string(&MessageOutput::new(message))
                        .unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            if messages.is_empty() {
                return;
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["MESSAGE", "CHANNEL", "PAYLOAD", "DETAILS"]);
            for message in messages {
                let out = MessageOutput::new(message);
                table.add_row(vec![
                    format!("{} ({:#04x})", out.name, out.msg_type),
                    out.channel.map(|ch| ch.to_string()).unwrap_or_default(),
                    out.payload,
                    details(&out.fields),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for message in messages {
                let fields = describe(message);
                if fields.is_empty() {
                    println!("{message}");
                } else {
                    println!("{message} {}", details(&fields));
                }
            }
        }
        OutputFormat::Raw => {
            for message in messages {
                print_raw(&message.encode());
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn details(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| format!("{}={}", f.name, f.value))
        .collect::<Vec<_>>()
        .join(" ")
}
