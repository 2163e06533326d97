//! Wire constants: sync byte, limits, message ids and event codes.

/// Sync byte that starts every frame sent to or received from the module.
pub const SYNC: u8 = 0xA4;

/// Maximum standard payload length.
pub const MAX_PAYLOAD: usize = 9;

/// Sync + length + type + checksum.
pub const FRAME_OVERHEAD: usize = 4;

/// Smallest decodable frame (one payload byte).
pub const MIN_FRAME_SIZE: usize = 5;

/// Largest standard frame.
pub const MAX_FRAME_SIZE: usize = MAX_PAYLOAD + FRAME_OVERHEAD;

/// Flag byte marking a flagged extended data message.
pub const EXTENDED_FLAG: u8 = 0x80;

/// Offset of the extended flag byte, right after a full standard payload.
pub const EXTENDED_FLAG_OFFSET: usize = 3 + MAX_PAYLOAD;

/// Most extended bytes a frame can carry behind the flag.
pub const MAX_EXTENDED_DATA: usize = u8::MAX as usize - MAX_PAYLOAD - 1;

// Configuration messages
pub const MESSAGE_CHANNEL_UNASSIGN: u8 = 0x41;
pub const MESSAGE_CHANNEL_ASSIGN: u8 = 0x42;
pub const MESSAGE_CHANNEL_ID: u8 = 0x51;
pub const MESSAGE_CHANNEL_PERIOD: u8 = 0x43;
pub const MESSAGE_CHANNEL_SEARCH_TIMEOUT: u8 = 0x44;
pub const MESSAGE_CHANNEL_FREQUENCY: u8 = 0x45;
pub const MESSAGE_CHANNEL_TX_POWER: u8 = 0x60;
pub const MESSAGE_NETWORK_KEY: u8 = 0x46;
pub const MESSAGE_TX_POWER: u8 = 0x47;

// Control messages
pub const MESSAGE_SYSTEM_RESET: u8 = 0x4A;
pub const MESSAGE_CHANNEL_OPEN: u8 = 0x4B;
pub const MESSAGE_CHANNEL_CLOSE: u8 = 0x4C;
pub const MESSAGE_CHANNEL_REQUEST: u8 = 0x4D;

// Data messages
pub const MESSAGE_CHANNEL_BROADCAST_DATA: u8 = 0x4E;
pub const MESSAGE_CHANNEL_ACKNOWLEDGED_DATA: u8 = 0x4F;
pub const MESSAGE_CHANNEL_BURST_DATA: u8 = 0x50;

// Channel events and requested responses
pub const MESSAGE_CHANNEL_EVENT: u8 = 0x40;
pub const MESSAGE_CHANNEL_STATUS: u8 = 0x52;
pub const MESSAGE_VERSION: u8 = 0x3E;
pub const MESSAGE_CAPABILITIES: u8 = 0x54;
pub const MESSAGE_SERIAL_NUMBER: u8 = 0x61;

// Notifications
pub const MESSAGE_STARTUP: u8 = 0x6F;

/// Responded-to id carried by channel events that are RF events.
pub const RF_EVENT_ID: u8 = 0x01;

// Channel response / event codes
pub const RESPONSE_NO_ERROR: u8 = 0x00;
pub const EVENT_RX_SEARCH_TIMEOUT: u8 = 0x01;
pub const EVENT_RX_FAIL: u8 = 0x02;
pub const EVENT_TX: u8 = 0x03;
pub const EVENT_TRANSFER_RX_FAILED: u8 = 0x04;
pub const EVENT_TRANSFER_TX_COMPLETED: u8 = 0x05;
pub const EVENT_TRANSFER_TX_FAILED: u8 = 0x06;
pub const EVENT_CHANNEL_CLOSED: u8 = 0x07;
pub const EVENT_RX_FAIL_GO_TO_SEARCH: u8 = 0x08;
pub const EVENT_CHANNEL_COLLISION: u8 = 0x09;
pub const EVENT_TRANSFER_TX_START: u8 = 0x0A;
pub const CHANNEL_IN_WRONG_STATE: u8 = 0x15;
pub const CHANNEL_NOT_OPENED: u8 = 0x16;
pub const CHANNEL_ID_NOT_SET: u8 = 0x18;
pub const CLOSE_ALL_CHANNELS: u8 = 0x19;
pub const TRANSFER_IN_PROGRESS: u8 = 0x1F;
pub const TRANSFER_SEQUENCE_NUMBER_ERROR: u8 = 0x20;
pub const TRANSFER_IN_ERROR: u8 = 0x21;
pub const INVALID_MESSAGE: u8 = 0x28;
pub const INVALID_NETWORK_NUMBER: u8 = 0x29;
pub const INVALID_LIST_ID: u8 = 0x30;
pub const INVALID_SCAN_TX_CHANNEL: u8 = 0x31;
pub const INVALID_PARAMETER_PROVIDED: u8 = 0x33;
pub const EVENT_QUE_OVERFLOW: u8 = 0x35;

// Channel types
pub const CHANNEL_TYPE_TWOWAY_RECEIVE: u8 = 0x00;
pub const CHANNEL_TYPE_TWOWAY_TRANSMIT: u8 = 0x10;
pub const CHANNEL_TYPE_SHARED_RECEIVE: u8 = 0x20;
pub const CHANNEL_TYPE_SHARED_TRANSMIT: u8 = 0x30;
pub const CHANNEL_TYPE_ONEWAY_RECEIVE: u8 = 0x40;
pub const CHANNEL_TYPE_ONEWAY_TRANSMIT: u8 = 0x50;

/// Search timeout value that disables the timeout.
pub const TIMEOUT_NEVER: u8 = 0xFF;

// Channel status (low two bits of the status byte)
pub const CHANNEL_STATUS_UNASSIGNED: u8 = 0x00;
pub const CHANNEL_STATUS_ASSIGNED: u8 = 0x01;
pub const CHANNEL_STATUS_SEARCHING: u8 = 0x02;
pub const CHANNEL_STATUS_TRACKING: u8 = 0x03;

// Startup reasons
pub const STARTUP_POWER_ON_RESET: u8 = 0x00;
pub const STARTUP_HARDWARE_RESET_LINE: u8 = 0x01;
pub const STARTUP_WATCHDOG_RESET: u8 = 0x02;
pub const STARTUP_COMMAND_RESET: u8 = 0x20;
pub const STARTUP_SYNCHRONOUS_RESET: u8 = 0x40;
pub const STARTUP_SUSPEND_RESET: u8 = 0x80;

// Standard capability options (bits set mean the feature is NOT supported)
pub const CAPABILITIES_NO_RX_CHANNELS: u8 = 0x01;
pub const CAPABILITIES_NO_TX_CHANNELS: u8 = 0x02;
pub const CAPABILITIES_NO_RX_MESSAGES: u8 = 0x04;
pub const CAPABILITIES_NO_TX_MESSAGES: u8 = 0x08;
pub const CAPABILITIES_NO_ACKD_MESSAGES: u8 = 0x10;
pub const CAPABILITIES_NO_BURST_TRANSFER: u8 = 0x20;

// Advanced capability options
pub const CAPABILITIES_NETWORK_ENABLED: u8 = 0x02;
pub const CAPABILITIES_SERIAL_NUMBER_ENABLED: u8 = 0x08;
pub const CAPABILITIES_PER_CHANNEL_TX_POWER_ENABLED: u8 = 0x10;
pub const CAPABILITIES_LOW_PRIORITY_SEARCH_ENABLED: u8 = 0x20;
pub const CAPABILITIES_SCRIPT_ENABLED: u8 = 0x40;
pub const CAPABILITIES_SEARCH_LIST_ENABLED: u8 = 0x80;

// Advanced capability options 2
pub const CAPABILITIES_LED_ENABLED: u8 = 0x01;
pub const CAPABILITIES_EXT_MESSAGE_ENABLED: u8 = 0x02;
pub const CAPABILITIES_SCAN_MODE_ENABLED: u8 = 0x04;
pub const CAPABILITIES_PROX_SEARCH_ENABLED: u8 = 0x10;
pub const CAPABILITIES_EXT_ASSIGN_ENABLED: u8 = 0x20;
pub const CAPABILITIES_FS_ANTFS_ENABLED: u8 = 0x40;

// Advanced capability options 3
pub const CAPABILITIES_ADVANCED_BURST_ENABLED: u8 = 0x01;
pub const CAPABILITIES_EVENT_BUFFERING_ENABLED: u8 = 0x02;
pub const CAPABILITIES_EVENT_FILTERING_ENABLED: u8 = 0x04;
pub const CAPABILITIES_HIGH_DUTY_SEARCH_ENABLED: u8 = 0x08;
pub const CAPABILITIES_SELECTIVE_DATA_UPDATES_ENABLED: u8 = 0x40;
pub const CAPABILITIES_ENCRYPTED_CHANNEL_ENABLED: u8 = 0x80;

/// Named bits of the standard capabilities byte.
pub const STANDARD_CAPABILITIES: &[(u8, &str)] = &[
    (CAPABILITIES_NO_RX_CHANNELS, "NO_RX_CHANNELS"),
    (CAPABILITIES_NO_TX_CHANNELS, "NO_TX_CHANNELS"),
    (CAPABILITIES_NO_RX_MESSAGES, "NO_RX_MESSAGES"),
    (CAPABILITIES_NO_TX_MESSAGES, "NO_TX_MESSAGES"),
    (CAPABILITIES_NO_ACKD_MESSAGES, "NO_ACKD_MESSAGES"),
    (CAPABILITIES_NO_BURST_TRANSFER, "NO_BURST_TRANSFER"),
];

/// Named bits of the first advanced capabilities byte.
pub const ADVANCED_CAPABILITIES: &[(u8, &str)] = &[
    (CAPABILITIES_NETWORK_ENABLED, "NETWORK_ENABLED"),
    (CAPABILITIES_SERIAL_NUMBER_ENABLED, "SERIAL_NUMBER_ENABLED"),
    (CAPABILITIES_PER_CHANNEL_TX_POWER_ENABLED, "PER_CHANNEL_TX_POWER_ENABLED"),
    (CAPABILITIES_LOW_PRIORITY_SEARCH_ENABLED, "LOW_PRIORITY_SEARCH_ENABLED"),
    (CAPABILITIES_SCRIPT_ENABLED, "SCRIPT_ENABLED"),
    (CAPABILITIES_SEARCH_LIST_ENABLED, "SEARCH_LIST_ENABLED"),
];

/// Named bits of the second advanced capabilities byte.
pub const ADVANCED_CAPABILITIES_2: &[(u8, &str)] = &[
    (CAPABILITIES_LED_ENABLED, "LED_ENABLED"),
    (CAPABILITIES_EXT_MESSAGE_ENABLED, "EXT_MESSAGE_ENABLED"),
    (CAPABILITIES_SCAN_MODE_ENABLED, "SCAN_MODE_ENABLED"),
    (CAPABILITIES_PROX_SEARCH_ENABLED, "PROX_SEARCH_ENABLED"),
    (CAPABILITIES_EXT_ASSIGN_ENABLED, "EXT_ASSIGN_ENABLED"),
    (CAPABILITIES_FS_ANTFS_ENABLED, "FS_ANTFS_ENABLED"),
];

/// Named bits of the third advanced capabilities byte.
pub const ADVANCED_CAPABILITIES_3: &[(u8, &str)] = &[
    (CAPABILITIES_ADVANCED_BURST_ENABLED, "ADVANCED_BURST_ENABLED"),
    (CAPABILITIES_EVENT_BUFFERING_ENABLED, "EVENT_BUFFERING_ENABLED"),
    (CAPABILITIES_EVENT_FILTERING_ENABLED, "EVENT_FILTERING_ENABLED"),
    (CAPABILITIES_HIGH_DUTY_SEARCH_ENABLED, "HIGH_DUTY_SEARCH_ENABLED"),
    (
        CAPABILITIES_SELECTIVE_DATA_UPDATES_ENABLED,
        "SELECTIVE_DATA_UPDATES_ENABLED",
    ),
    (CAPABILITIES_ENCRYPTED_CHANNEL_ENABLED, "ENCRYPTED_CHANNEL_ENABLED"),
];

/// Returns a human-readable name for a message id.
pub fn message_name(id: u8) -> &'static str {
    match id {
        MESSAGE_CHANNEL_UNASSIGN => "CHANNEL_UNASSIGN",
        MESSAGE_CHANNEL_ASSIGN => "CHANNEL_ASSIGN",
        MESSAGE_CHANNEL_ID => "CHANNEL_ID",
        MESSAGE_CHANNEL_PERIOD => "CHANNEL_PERIOD",
        MESSAGE_CHANNEL_SEARCH_TIMEOUT => "CHANNEL_SEARCH_TIMEOUT",
        MESSAGE_CHANNEL_FREQUENCY => "CHANNEL_FREQUENCY",
        MESSAGE_CHANNEL_TX_POWER => "CHANNEL_TX_POWER",
        MESSAGE_NETWORK_KEY => "NETWORK_KEY",
        MESSAGE_TX_POWER => "TX_POWER",
        MESSAGE_SYSTEM_RESET => "SYSTEM_RESET",
        MESSAGE_CHANNEL_OPEN => "CHANNEL_OPEN",
        MESSAGE_CHANNEL_CLOSE => "CHANNEL_CLOSE",
        MESSAGE_CHANNEL_REQUEST => "CHANNEL_REQUEST",
        MESSAGE_CHANNEL_BROADCAST_DATA => "BROADCAST_DATA",
        MESSAGE_CHANNEL_ACKNOWLEDGED_DATA => "ACKNOWLEDGED_DATA",
        MESSAGE_CHANNEL_BURST_DATA => "BURST_DATA",
        MESSAGE_CHANNEL_EVENT => "CHANNEL_EVENT",
        MESSAGE_CHANNEL_STATUS => "CHANNEL_STATUS",
        MESSAGE_VERSION => "VERSION",
        MESSAGE_CAPABILITIES => "CAPABILITIES",
        MESSAGE_SERIAL_NUMBER => "SERIAL_NUMBER",
        MESSAGE_STARTUP => "STARTUP",
        _ => "UNKNOWN",
    }
}

/// Returns a human-readable name for a channel response or event code.
pub fn event_code_name(code: u8) -> &'static str {
    match code {
        RESPONSE_NO_ERROR => "RESPONSE_NO_ERROR",
        EVENT_RX_SEARCH_TIMEOUT => "EVENT_RX_SEARCH_TIMEOUT",
        EVENT_RX_FAIL => "EVENT_RX_FAIL",
        EVENT_TX => "EVENT_TX",
        EVENT_TRANSFER_RX_FAILED => "EVENT_TRANSFER_RX_FAILED",
        EVENT_TRANSFER_TX_COMPLETED => "EVENT_TRANSFER_TX_COMPLETED",
        EVENT_TRANSFER_TX_FAILED => "EVENT_TRANSFER_TX_FAILED",
        EVENT_CHANNEL_CLOSED => "EVENT_CHANNEL_CLOSED",
        EVENT_RX_FAIL_GO_TO_SEARCH => "EVENT_RX_FAIL_GO_TO_SEARCH",
        EVENT_CHANNEL_COLLISION => "EVENT_CHANNEL_COLLISION",
        EVENT_TRANSFER_TX_START => "EVENT_TRANSFER_TX_START",
        CHANNEL_IN_WRONG_STATE => "CHANNEL_IN_WRONG_STATE",
        CHANNEL_NOT_OPENED => "CHANNEL_NOT_OPENED",
        CHANNEL_ID_NOT_SET => "CHANNEL_ID_NOT_SET",
        CLOSE_ALL_CHANNELS => "CLOSE_ALL_CHANNELS",
        TRANSFER_IN_PROGRESS => "TRANSFER_IN_PROGRESS",
        TRANSFER_SEQUENCE_NUMBER_ERROR => "TRANSFER_SEQUENCE_NUMBER_ERROR",
        TRANSFER_IN_ERROR => "TRANSFER_IN_ERROR",
        INVALID_MESSAGE => "INVALID_MESSAGE",
        INVALID_NETWORK_NUMBER => "INVALID_NETWORK_NUMBER",
        INVALID_LIST_ID => "INVALID_LIST_ID",
        INVALID_SCAN_TX_CHANNEL => "INVALID_SCAN_TX_CHANNEL",
        INVALID_PARAMETER_PROVIDED => "INVALID_PARAMETER_PROVIDED",
        EVENT_QUE_OVERFLOW => "EVENT_QUE_OVERFLOW",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_bounds() {
        assert_eq!(MAX_FRAME_SIZE, 13);
        assert_eq!(EXTENDED_FLAG_OFFSET, 12);
        assert_eq!(MAX_EXTENDED_DATA, 245);
    }

    #[test]
    fn names() {
        assert_eq!(message_name(MESSAGE_SYSTEM_RESET), "SYSTEM_RESET");
        assert_eq!(message_name(0xFF), "UNKNOWN");
        assert_eq!(event_code_name(EVENT_CHANNEL_CLOSED), "EVENT_CHANNEL_CLOSED");
        assert_eq!(event_code_name(0xEE), "UNKNOWN");
    }
}
