//! Fixed-size messages passed between the receive, control and display stages.
//!
//! Nothing here allocates: a [`RadioPacket`] is exactly one over-the-air frame
//! and a [`DisplayCommand`] carries at most [`TEXT_CAPACITY`] bytes of text.
//!
//! ## Frame Layout
//!
//! | Byte  | Meaning                  |
//! |-------|--------------------------|
//! | 0     | mode tag (see [`Mode`])  |
//! | 1..32 | payload                  |
//!
//! Both link ends must agree on this layout.

use core::fmt;

use crate::consts::{PACKET_LEN, PAYLOAD_LEN, TEXT_CAPACITY};
use heapless::Vec;

/// How the payload of a [`RadioPacket`] is to be read.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Mode {
    /// Byte 0 of the payload is a single key character, 0 for none.
    Keypad,
    /// Bytes 0 and 1 of the payload are X and Y axis samples.
    Servo,
    /// The payload is a NUL-terminated text.
    Auto,
    /// Any tag the receiver does not know.
    Unknown(u8),
}

impl Mode {
    /// Wire tag for [`Mode::Keypad`].
    pub const KEYPAD_TAG: u8 = 0;
    /// Wire tag for [`Mode::Servo`].
    pub const SERVO_TAG: u8 = 1;
    /// Wire tag for [`Mode::Auto`].
    pub const AUTO_TAG: u8 = 2;

    /// Decodes a wire tag.
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            Self::KEYPAD_TAG => Mode::Keypad,
            Self::SERVO_TAG => Mode::Servo,
            Self::AUTO_TAG => Mode::Auto,
            other => Mode::Unknown(other),
        }
    }

    /// Encodes the wire tag.
    pub const fn tag(self) -> u8 {
        match self {
            Mode::Keypad => Self::KEYPAD_TAG,
            Mode::Servo => Self::SERVO_TAG,
            Mode::Auto => Self::AUTO_TAG,
            Mode::Unknown(other) => other,
        }
    }
}

impl From<u8> for Mode {
    fn from(tag: u8) -> Self {
        Mode::from_tag(tag)
    }
}

/// One received frame: a mode tag and a 31-byte payload.
///
/// Built by the receive loop from the chip FIFO, read-only afterwards, and
/// consumed exactly once by the controller.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RadioPacket {
    mode: Mode,
    payload: [u8; PAYLOAD_LEN],
}

impl RadioPacket {
    /// Creates a packet from a mode and a full payload.
    pub const fn new(mode: Mode, payload: [u8; PAYLOAD_LEN]) -> Self {
        Self { mode, payload }
    }

    /// Creates a packet whose payload starts with `bytes`, zero-filled to 31
    /// bytes; anything past 31 bytes is cut.
    pub fn with_payload(mode: Mode, bytes: &[u8]) -> Self {
        let mut payload = [0u8; PAYLOAD_LEN];
        let len = bytes.len().min(PAYLOAD_LEN);
        payload[..len].copy_from_slice(&bytes[..len]);
        Self { mode, payload }
    }

    /// Parses an over-the-air frame.
    pub fn from_bytes(frame: &[u8; PACKET_LEN]) -> Self {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&frame[1..]);
        Self {
            mode: Mode::from_tag(frame[0]),
            payload,
        }
    }

    /// Serializes to an over-the-air frame, e.g. for [`Nrf24::transmit`].
    ///
    /// [`Nrf24::transmit`]: crate::driver::Nrf24::transmit
    pub fn to_bytes(&self) -> [u8; PACKET_LEN] {
        let mut frame = [0u8; PACKET_LEN];
        frame[0] = self.mode.tag();
        frame[1..].copy_from_slice(&self.payload);
        frame
    }

    /// The mode tag.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The raw payload.
    pub fn payload(&self) -> &[u8; PAYLOAD_LEN] {
        &self.payload
    }
}

/// Display text of at most [`TEXT_CAPACITY`] bytes.
///
/// Bytes are glyph codes for the display font; they are not required to be
/// UTF-8.
#[derive(PartialEq, Eq, Clone, Default, Debug, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Text(Vec<u8, TEXT_CAPACITY>);

impl Text {
    /// An empty text.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Copies `bytes` up to the first NUL, keeping at most 31 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let end = bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(bytes.len())
            .min(TEXT_CAPACITY);
        let mut text = Vec::new();
        // cannot fail: `end` is within capacity
        let _ = text.extend_from_slice(&bytes[..end]);
        Self(text)
    }

    /// The visible bytes, without terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The text as `&str` when it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.0).ok()
    }

    /// Number of visible bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Empties the text.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Text::from_bytes(text.as_bytes())
    }
}

impl fmt::Write for Text {
    /// Appends as much of `s` as fits; reports an error if anything was cut.
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = TEXT_CAPACITY - self.0.len();
        let take = s.len().min(room);
        let _ = self.0.extend_from_slice(&s.as_bytes()[..take]);
        if take < s.len() { Err(fmt::Error) } else { Ok(()) }
    }
}

/// What the controller asks the renderer to do.
#[derive(PartialEq, Eq, Clone, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DisplayCommand {
    /// Replace the status line.
    SetStatus(Text),
    /// Replace the centered text; always hides the key.
    SetMainText(Text),
    /// Show a single centered key; always hides the main text.
    ShowKey(u8),
    /// Blank status, main text and key.
    Clear,
}
