//! Command and status alphabets spoken with the LED device.
//!
//! Outbound commands are single ASCII bytes typed on the keyboard and
//! forwarded verbatim. Inbound status bytes are decoded into [`Status`].

/// Value of `send_char` before any command has been sent.
pub const SEND_SENTINEL: u8 = b' ';

/// Value of `received_char` before any status byte has arrived.
pub const RECEIVED_SENTINEL: u8 = b'?';

/// Start blinking.
pub const CMD_START: u8 = b's';
/// Stop blinking.
pub const CMD_STOP: u8 = b'e';
/// Ask the device to shut down.
pub const CMD_BYE: u8 = b'b';
/// Local quit key. Never forwarded.
pub const KEY_QUIT: u8 = b'q';

/// What the keyboard worker does with a single keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Forward the byte to the device.
    Forward(u8),
    /// Latch the quit flag locally.
    Quit,
    /// Not part of the command alphabet.
    Ignore,
}

impl KeyAction {
    pub fn from_key(key: u8) -> Self {
        match key {
            b'1'..=b'5' | CMD_START | CMD_STOP | CMD_BYE | b'h' | b'i' => KeyAction::Forward(key),
            KEY_QUIT => KeyAction::Quit,
            _ => KeyAction::Ignore,
        }
    }
}

/// Decoded status byte received from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `b`: the device is shutting down.
    Bye,
    /// `x`: LED switched on.
    LedOn,
    /// `o`: LED switched off.
    LedOff,
    /// `a`: acknowledgment of the last command sent.
    Ack,
    /// Anything else. Recorded, never acted on.
    Other(u8),
}

impl Status {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'b' => Status::Bye,
            b'x' => Status::LedOn,
            b'o' => Status::LedOff,
            b'a' => Status::Ack,
            other => Status::Other(other),
        }
    }

    /// Whether this status is a toggle event counted for period averaging.
    pub fn is_toggle(self) -> bool {
        matches!(self, Status::LedOn | Status::LedOff)
    }
}

/// Renders a protocol byte for display, replacing control bytes with `.`.
pub fn printable(byte: u8) -> char {
    if byte.is_ascii_graphic() || byte == b' ' {
        char::from(byte)
    } else {
        '.'
    }
}
