//! The closed message catalog.
//!
//! Every wire type the engine understands is one variant of [`Message`],
//! backed by its own struct with typed field accessors. Getters never fail;
//! setters validate against the field's wire width.

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::codec::{hex_spaced, ExtendedData, Frame, Payload};
use crate::constants::*;
use crate::error::{FrameError, Result};
use crate::registry;

macro_rules! catalog {
    ($(
        $(#[$meta:meta])*
        $variant:ident => $id:path, [$($default:expr),+ $(,)?];
    )+) => {
        /// Discriminant of a [`Message`], one per wire type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum MessageKind {
            $($variant,)+
        }

        impl MessageKind {
            /// Every kind in the catalog.
            pub const ALL: &'static [MessageKind] = &[$(MessageKind::$variant,)+];

            /// Map a type byte to its kind.
            pub fn from_id(id: u8) -> Option<Self> {
                match id {
                    $($id => Some(MessageKind::$variant),)+
                    _ => None,
                }
            }

            /// The type byte on the wire.
            pub fn id(self) -> u8 {
                match self {
                    $(MessageKind::$variant => $id,)+
                }
            }
        }

        /// A decoded or caller-built message.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Message {
            $($variant($variant),)+
        }

        impl Message {
            pub fn kind(&self) -> MessageKind {
                match self {
                    $(Message::$variant(_) => MessageKind::$variant,)+
                }
            }

            /// A message of `kind` with its default field values.
            pub fn default_for(kind: MessageKind) -> Self {
                match kind {
                    $(MessageKind::$variant => Message::$variant($variant::default()),)+
                }
            }

            fn parts(&self) -> (&Payload, Option<&ExtendedData>) {
                match self {
                    $(Message::$variant(m) => (&m.payload, m.extended.as_ref()),)+
                }
            }

            pub(crate) fn assemble(
                kind: MessageKind,
                payload: Payload,
                extended: Option<ExtendedData>,
            ) -> Self {
                match kind {
                    $(MessageKind::$variant => Message::$variant($variant { payload, extended }),)+
                }
            }
        }

        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Eq)]
            pub struct $variant {
                payload: Payload,
                extended: Option<ExtendedData>,
            }

            impl $variant {
                pub const ID: u8 = $id;

                pub fn payload(&self) -> &[u8] {
                    self.payload.as_slice()
                }

                pub fn extended(&self) -> Option<&ExtendedData> {
                    self.extended.as_ref()
                }

                fn from_bytes(bytes: &[u8]) -> Self {
                    Self {
                        payload: Payload::new(bytes).unwrap_or_default(),
                        extended: None,
                    }
                }
            }

            impl Default for $variant {
                fn default() -> Self {
                    Self::from_bytes(&[$($default),+])
                }
            }

            impl From<$variant> for Message {
                fn from(message: $variant) -> Self {
                    Message::$variant(message)
                }
            }

            impl TryFrom<Message> for $variant {
                type Error = Message;

                fn try_from(message: Message) -> std::result::Result<Self, Message> {
                    match message {
                        Message::$variant(m) => Ok(m),
                        other => Err(other),
                    }
                }
            }
        )+
    };
}

catalog! {
    ChannelUnassign => MESSAGE_CHANNEL_UNASSIGN, [0];
    ChannelAssign => MESSAGE_CHANNEL_ASSIGN, [0, 0, 0];
    ChannelId => MESSAGE_CHANNEL_ID, [0, 0, 0, 0, 0];
    ChannelPeriod => MESSAGE_CHANNEL_PERIOD, [0, 0x00, 0x20];
    ChannelSearchTimeout => MESSAGE_CHANNEL_SEARCH_TIMEOUT, [0, TIMEOUT_NEVER];
    ChannelFrequency => MESSAGE_CHANNEL_FREQUENCY, [0, 66];
    ChannelTxPower => MESSAGE_CHANNEL_TX_POWER, [0, 0];
    NetworkKey => MESSAGE_NETWORK_KEY, [0, 0, 0, 0, 0, 0, 0, 0, 0];
    TxPower => MESSAGE_TX_POWER, [0, 0];
    SystemReset => MESSAGE_SYSTEM_RESET, [0];
    ChannelOpen => MESSAGE_CHANNEL_OPEN, [0];
    ChannelClose => MESSAGE_CHANNEL_CLOSE, [0];
    ChannelRequest => MESSAGE_CHANNEL_REQUEST, [0, 1];
    /// Periodic data on an open channel.
    BroadcastData => MESSAGE_CHANNEL_BROADCAST_DATA, [0, 0, 0, 0, 0, 0, 0, 0, 0];
    /// Data the remote end must acknowledge.
    AcknowledgedData => MESSAGE_CHANNEL_ACKNOWLEDGED_DATA, [0, 0, 0, 0, 0, 0, 0, 0, 0];
    /// One packet of a burst transfer. Byte 0 packs the channel (bits 0-4)
    /// with the burst sequence number (bits 5-7).
    BurstData => MESSAGE_CHANNEL_BURST_DATA, [0, 0, 0, 0, 0, 0, 0, 0, 0];
    /// Response to a command, or an RF event when the responded-to id is 1.
    ChannelEvent => MESSAGE_CHANNEL_EVENT, [0, 0, 0];
    ChannelStatus => MESSAGE_CHANNEL_STATUS, [0, 0];
    Version => MESSAGE_VERSION, [0, 0, 0, 0, 0, 0, 0, 0, 0];
    Capabilities => MESSAGE_CAPABILITIES, [0, 0, 0, 0, 0, 0, 0, 0];
    SerialNumber => MESSAGE_SERIAL_NUMBER, [0, 0, 0, 0];
    /// Sent by the device after any reset.
    StartupNotification => MESSAGE_STARTUP, [0];
}

impl MessageKind {
    pub fn name(self) -> &'static str {
        message_name(self.id())
    }

    /// Look a kind up by its wire name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// True for kinds whose payload byte 0 is a channel number.
    pub fn is_channel_scoped(self) -> bool {
        !matches!(
            self,
            MessageKind::NetworkKey
                | MessageKind::TxPower
                | MessageKind::SystemReset
                | MessageKind::Version
                | MessageKind::Capabilities
                | MessageKind::SerialNumber
                | MessageKind::StartupNotification
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Message {
    /// Build a message from a raw type byte and payload.
    pub fn from_parts(msg_type: u8, payload: &[u8]) -> Result<Self> {
        let kind = MessageKind::from_id(msg_type).ok_or(FrameError::UnknownMessageType(msg_type))?;
        Ok(Self::assemble(kind, Payload::new(payload)?, None))
    }

    /// Decode the message at the head of `raw`, returning it and the bytes consumed.
    pub fn decode(raw: &[u8]) -> Result<(Self, usize)> {
        registry::lookup(raw)
    }

    pub fn msg_type(&self) -> u8 {
        self.kind().id()
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn payload(&self) -> &[u8] {
        self.parts().0.as_slice()
    }

    pub fn extended(&self) -> Option<&ExtendedData> {
        self.parts().1
    }

    /// Payload byte 0, the channel for channel-scoped kinds; 0 when absent.
    pub fn channel_number(&self) -> u8 {
        self.parts().0.byte(0)
    }

    pub fn to_frame(&self) -> Frame {
        let (payload, extended) = self.parts();
        Frame {
            msg_type: self.msg_type(),
            payload: *payload,
            extended: extended.cloned(),
        }
    }

    pub fn wire_size(&self) -> usize {
        self.to_frame().wire_size()
    }

    pub fn encode_into(&self, dst: &mut BytesMut) {
        self.to_frame().encode_into(dst);
    }

    pub fn encode(&self) -> Bytes {
        self.to_frame().encode()
    }

    /// Checksum byte of the encoded frame.
    pub fn checksum(&self) -> u8 {
        let encoded = self.encode();
        encoded[encoded.len() - 1]
    }

    /// `A4|LL|TT|payload|CS` rendering of the frame.
    pub fn pretty(&self) -> String {
        let frame = self.to_frame();
        let encoded = frame.encode();
        let body = &encoded[3..encoded.len() - 1];
        format!(
            "{:02X}|{:02X}|{:02X}|{}|{:02X}",
            SYNC,
            frame.declared_len(),
            frame.msg_type,
            hex_spaced(body),
            encoded[encoded.len() - 1]
        )
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", self.name(), self.pretty())
    }
}

macro_rules! channel_scoped {
    ($($variant:ident),+ $(,)?) => {$(
        impl $variant {
            pub fn channel(&self) -> u8 {
                self.payload.byte(0)
            }

            pub fn set_channel(&mut self, channel: u32) -> Result<()> {
                self.payload.put_u8(0, "channel", channel)
            }
        }
    )+};
}

channel_scoped!(
    ChannelUnassign,
    ChannelAssign,
    ChannelId,
    ChannelPeriod,
    ChannelSearchTimeout,
    ChannelFrequency,
    ChannelTxPower,
    ChannelOpen,
    ChannelClose,
    ChannelRequest,
    BroadcastData,
    AcknowledgedData,
    BurstData,
    ChannelEvent,
    ChannelStatus,
);

macro_rules! byte_field {
    ($variant:ident, $get:ident, $set:ident, $index:expr, $name:literal) => {
        impl $variant {
            pub fn $get(&self) -> u8 {
                self.payload.byte($index)
            }

            pub fn $set(&mut self, value: u32) -> Result<()> {
                self.payload.put_u8($index, $name, value)
            }
        }
    };
}

fn set_exact(
    payload: &mut Payload,
    index: usize,
    field: &'static str,
    data: &[u8],
    len: usize,
) -> Result<()> {
    if data.len() != len {
        return Err(FrameError::FieldLength {
            field,
            expected: len,
            actual: data.len(),
        });
    }
    payload.put_slice(index, field, data)
}

// Channel configuration

impl ChannelUnassign {
    pub fn new(channel: u8) -> Self {
        Self::from_bytes(&[channel])
    }
}

impl ChannelAssign {
    pub fn new(channel: u8, channel_type: u8, network: u8) -> Self {
        Self::from_bytes(&[channel, channel_type, network])
    }
}

byte_field!(ChannelAssign, channel_type, set_channel_type, 1, "channel_type");
byte_field!(ChannelAssign, network_number, set_network_number, 2, "network_number");

impl ChannelId {
    pub fn new(channel: u8, device_number: u16, device_type: u8, transmission_type: u8) -> Self {
        let [lo, hi] = device_number.to_le_bytes();
        Self::from_bytes(&[channel, lo, hi, device_type, transmission_type])
    }

    /// Device number; 0 is a search wildcard.
    pub fn device_number(&self) -> u16 {
        self.payload.u16_le(1)
    }

    pub fn set_device_number(&mut self, device_number: u32) -> Result<()> {
        self.payload.put_u16_le(1, "device_number", device_number)
    }
}

byte_field!(ChannelId, device_type, set_device_type, 3, "device_type");
byte_field!(ChannelId, transmission_type, set_transmission_type, 4, "transmission_type");

impl ChannelPeriod {
    /// `period` is in units of 1/32768 s; 8192 gives 4 Hz.
    pub fn new(channel: u8, period: u16) -> Self {
        let [lo, hi] = period.to_le_bytes();
        Self::from_bytes(&[channel, lo, hi])
    }

    pub fn period(&self) -> u16 {
        self.payload.u16_le(1)
    }

    pub fn set_period(&mut self, period: u32) -> Result<()> {
        self.payload.put_u16_le(1, "period", period)
    }
}

impl ChannelSearchTimeout {
    /// `timeout` counts 2.5 s units; [`TIMEOUT_NEVER`] disables it.
    pub fn new(channel: u8, timeout: u8) -> Self {
        Self::from_bytes(&[channel, timeout])
    }
}

byte_field!(ChannelSearchTimeout, timeout, set_timeout, 1, "timeout");

impl ChannelFrequency {
    /// `frequency` is the offset from 2400 MHz.
    pub fn new(channel: u8, frequency: u8) -> Self {
        Self::from_bytes(&[channel, frequency])
    }
}

byte_field!(ChannelFrequency, frequency, set_frequency, 1, "frequency");

impl ChannelTxPower {
    pub fn new(channel: u8, power: u8) -> Self {
        Self::from_bytes(&[channel, power])
    }
}

byte_field!(ChannelTxPower, power, set_power, 1, "power");

impl NetworkKey {
    pub fn new(network: u8, key: [u8; 8]) -> Self {
        let mut bytes = [0u8; 9];
        bytes[0] = network;
        bytes[1..].copy_from_slice(&key);
        Self::from_bytes(&bytes)
    }

    pub fn key(&self) -> [u8; 8] {
        let mut key = [0u8; 8];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = self.payload.byte(i + 1);
        }
        key
    }

    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        set_exact(&mut self.payload, 1, "key", key, 8)
    }
}

byte_field!(NetworkKey, network_number, set_network_number, 0, "network_number");

impl TxPower {
    pub fn new(power: u8) -> Self {
        Self::from_bytes(&[0, power])
    }
}

byte_field!(TxPower, power, set_power, 1, "power");

// Control

impl SystemReset {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChannelOpen {
    pub fn new(channel: u8) -> Self {
        Self::from_bytes(&[channel])
    }
}

impl ChannelClose {
    pub fn new(channel: u8) -> Self {
        Self::from_bytes(&[channel])
    }
}

impl ChannelRequest {
    /// Ask the device to send a message of type `requested_id` for `channel`.
    pub fn new(channel: u8, requested_id: u8) -> Self {
        Self::from_bytes(&[channel, requested_id])
    }
}

byte_field!(ChannelRequest, requested_id, set_requested_id, 1, "requested_id");

// Data

macro_rules! data_message {
    ($($variant:ident),+) => {$(
        impl $variant {
            pub fn new(channel: u8, data: [u8; 8]) -> Self {
                let mut bytes = [0u8; 9];
                bytes[0] = channel;
                bytes[1..].copy_from_slice(&data);
                Self::from_bytes(&bytes)
            }

            /// The data bytes after the channel byte.
            pub fn data(&self) -> &[u8] {
                self.payload.tail(1)
            }

            pub fn set_data(&mut self, data: &[u8]) -> Result<()> {
                set_exact(&mut self.payload, 1, "data", data, 8)
            }
        }
    )+};
}

data_message!(BroadcastData, AcknowledgedData, BurstData);

impl BurstData {
    pub fn sequence(&self) -> u8 {
        self.payload.byte(0) >> 5
    }

    pub fn channel_index(&self) -> u8 {
        self.payload.byte(0) & 0x1F
    }
}

// Channel events and requested responses

impl ChannelEvent {
    pub fn new(channel: u8, message_id: u8, code: u8) -> Self {
        Self::from_bytes(&[channel, message_id, code])
    }

    /// True when this reports a radio event rather than a command response.
    pub fn is_rf_event(&self) -> bool {
        self.message_id() == RF_EVENT_ID
    }

    pub fn code_name(&self) -> &'static str {
        event_code_name(self.code())
    }
}

byte_field!(ChannelEvent, message_id, set_message_id, 1, "message_id");
byte_field!(ChannelEvent, code, set_code, 2, "code");

impl ChannelStatus {
    pub fn new(channel: u8, status: u8) -> Self {
        Self::from_bytes(&[channel, status])
    }

    /// Channel state from the low two status bits.
    pub fn channel_state(&self) -> u8 {
        self.status() & 0x03
    }
}

byte_field!(ChannelStatus, status, set_status, 1, "status");

impl Version {
    pub fn new(version: [u8; 9]) -> Self {
        Self::from_bytes(&version)
    }

    pub fn version(&self) -> &[u8] {
        self.payload.as_slice()
    }

    pub fn set_version(&mut self, version: &[u8]) -> Result<()> {
        set_exact(&mut self.payload, 0, "version", version, 9)
    }

    /// The NUL-terminated ASCII version string.
    pub fn version_string(&self) -> String {
        let bytes = self.payload.as_slice();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }
}

impl Capabilities {
    pub fn new(max_channels: u8, max_networks: u8, standard: u8, advanced: u8) -> Self {
        Self::from_bytes(&[max_channels, max_networks, standard, advanced, 0, 0, 0, 0])
    }

    pub fn has_standard_option(&self, option: u8) -> bool {
        self.standard_options() & option == option
    }

    pub fn has_advanced_option(&self, option: u8) -> bool {
        self.advanced_options() & option == option
    }

    pub fn has_advanced_option_2(&self, option: u8) -> bool {
        self.advanced_options_2() & option == option
    }

    pub fn has_advanced_option_3(&self, option: u8) -> bool {
        self.advanced_options_3() & option == option
    }

    /// Names of every option bit set across the four option bytes.
    pub fn available_options(&self) -> Vec<&'static str> {
        let groups = [
            (self.standard_options(), STANDARD_CAPABILITIES),
            (self.advanced_options(), ADVANCED_CAPABILITIES),
            (self.advanced_options_2(), ADVANCED_CAPABILITIES_2),
            (self.advanced_options_3(), ADVANCED_CAPABILITIES_3),
        ];
        groups
            .iter()
            .flat_map(|(value, table)| {
                table
                    .iter()
                    .filter(move |(bit, _)| value & bit == *bit)
                    .map(|(_, name)| *name)
            })
            .collect()
    }
}

byte_field!(Capabilities, max_channels, set_max_channels, 0, "max_channels");
byte_field!(Capabilities, max_networks, set_max_networks, 1, "max_networks");
byte_field!(Capabilities, standard_options, set_standard_options, 2, "standard_options");
byte_field!(Capabilities, advanced_options, set_advanced_options, 3, "advanced_options");
byte_field!(Capabilities, advanced_options_2, set_advanced_options_2, 4, "advanced_options_2");
byte_field!(
    Capabilities,
    max_sensrcore_channels,
    set_max_sensrcore_channels,
    5,
    "max_sensrcore_channels"
);
byte_field!(Capabilities, advanced_options_3, set_advanced_options_3, 6, "advanced_options_3");

impl SerialNumber {
    pub fn new(serial: [u8; 4]) -> Self {
        Self::from_bytes(&serial)
    }

    pub fn serial_bytes(&self) -> &[u8] {
        self.payload.as_slice()
    }

    /// Serial number as a little-endian u32.
    pub fn serial(&self) -> u32 {
        u32::from_le_bytes([
            self.payload.byte(0),
            self.payload.byte(1),
            self.payload.byte(2),
            self.payload.byte(3),
        ])
    }

    pub fn set_serial_number(&mut self, serial: &[u8]) -> Result<()> {
        set_exact(&mut self.payload, 0, "serial", serial, 4)
    }
}

impl StartupNotification {
    pub fn new(reason: u8) -> Self {
        Self::from_bytes(&[reason])
    }

    pub fn is_power_on_reset(&self) -> bool {
        self.reason() == STARTUP_POWER_ON_RESET
    }
}

byte_field!(StartupNotification, reason, set_reason, 0, "reason");
