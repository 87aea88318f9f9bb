//! MIDI channel-message parsing and encoding.
//!
//! The Twister talks in plain 3-byte channel messages for everything except
//! configuration. Anything that is not a well-formed 3-byte message is
//! treated as device noise and dropped, never escalated.

use std::fmt;

/// 3-byte MIDI channel messages used by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },
}

impl ChannelMessage {
    /// Parse a 3-byte channel message. Returns `None` for anything else.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != 3 {
            return None;
        }

        let status = data[0];
        if status < 0x80 || status >= 0xF0 {
            return None;
        }

        let channel = status & 0x0F;

        match status & 0xF0 {
            0x80 => Some(ChannelMessage::NoteOff {
                channel,
                note: data[1] & 0x7F,
                velocity: data[2] & 0x7F,
            }),
            0x90 => {
                // Note On with velocity 0 is a Note Off
                let note = data[1] & 0x7F;
                let velocity = data[2] & 0x7F;
                if velocity == 0 {
                    Some(ChannelMessage::NoteOff { channel, note, velocity: 0 })
                } else {
                    Some(ChannelMessage::NoteOn { channel, note, velocity })
                }
            }
            0xB0 => Some(ChannelMessage::ControlChange {
                channel,
                cc: data[1] & 0x7F,
                value: data[2] & 0x7F,
            }),
            _ => None,
        }
    }

    /// Encode the message to MIDI bytes.
    pub fn encode(&self) -> [u8; 3] {
        match *self {
            ChannelMessage::NoteOff { channel, note, velocity } => {
                [0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            ChannelMessage::NoteOn { channel, note, velocity } => {
                [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            ChannelMessage::ControlChange { channel, cc, value } => {
                [0xB0 | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            }
        }
    }

    /// Channel of the message (0-15).
    pub fn channel(&self) -> u8 {
        match *self {
            ChannelMessage::NoteOff { channel, .. }
            | ChannelMessage::NoteOn { channel, .. }
            | ChannelMessage::ControlChange { channel, .. } => channel,
        }
    }
}

impl fmt::Display for ChannelMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ChannelMessage::NoteOff { channel, note, velocity } => {
                write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            ChannelMessage::NoteOn { channel, note, velocity } => {
                write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            ChannelMessage::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            }
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_change_parsing() {
        let msg = ChannelMessage::parse(&[0xB0, 12, 100]).unwrap();
        assert_eq!(
            msg,
            ChannelMessage::ControlChange { channel: 0, cc: 12, value: 100 }
        );

        let msg = ChannelMessage::parse(&[0xB3, 0, 127]).unwrap();
        assert_eq!(msg.channel(), 3);
    }

    #[test]
    fn test_note_on_velocity_zero_is_note_off() {
        let msg = ChannelMessage::parse(&[0x91, 60, 0]).unwrap();
        assert_eq!(
            msg,
            ChannelMessage::NoteOff { channel: 1, note: 60, velocity: 0 }
        );
    }

    #[test]
    fn test_malformed_input_dropped() {
        assert_eq!(ChannelMessage::parse(&[]), None);
        assert_eq!(ChannelMessage::parse(&[0xB0, 12]), None);
        assert_eq!(ChannelMessage::parse(&[0xB0, 12, 1, 2]), None);
        // Data byte first (running status is not supported)
        assert_eq!(ChannelMessage::parse(&[0x12, 0x34, 0x56]), None);
        // System messages are not channel messages
        assert_eq!(ChannelMessage::parse(&[0xF0, 0x00, 0xF7]), None);
        // Pitch bend is not used by the device
        assert_eq!(ChannelMessage::parse(&[0xE0, 0x00, 0x40]), None);
    }

    #[test]
    fn test_encode_round_trip() {
        let msg = ChannelMessage::ControlChange { channel: 3, cc: 1, value: 127 };
        assert_eq!(msg.encode(), [0xB3, 1, 127]);
        assert_eq!(ChannelMessage::parse(&msg.encode()), Some(msg));
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0xF0, 0x00, 0x01, 0x79]), "F0 00 01 79");
    }
}
