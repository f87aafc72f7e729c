//! Calendar records exchanged over the bridge.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A calendar as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    pub id: String,
    pub name: String,
    pub is_read_only: bool,
    pub is_default: bool,
    pub color: Color,
    pub account_name: String,
    pub account_type: String,
}

/// Account types the platform store reports.
pub mod account_type {
    pub const LOCAL: &str = "Local";
    pub const EXCHANGE: &str = "Exchange";
    pub const CALDAV: &str = "CalDAV";
    pub const MOBILE_ME: &str = "MobileMe";
    pub const SUBSCRIBED: &str = "Subscribed";
    pub const BIRTHDAYS: &str = "Birthdays";
    pub const UNKNOWN: &str = "Unknown";
}

/// Packed ARGB color: bits 24-31 alpha, 16-23 red, 8-15 green, 0-7 blue.
///
/// The packed integer is kept as received. Platforms disagree on whether it is
/// a signed 32-bit value (`-16776961`) or a positive 64-bit one (`4278190335`);
/// both describe the same color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(i64);

impl Color {
    /// Opaque red, used when a calendar is created without a color.
    pub const DEFAULT: Color = Color(0xFFFF_0000);

    pub const fn from_packed(value: i64) -> Self {
        Color(value)
    }

    pub const fn packed(self) -> i64 {
        self.0
    }

    pub fn from_argb(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Color(i64::from(u32::from_be_bytes([alpha, red, green, blue])))
    }

    /// Parse the bridge's `0xAARRGGBB` form.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix("0x").or_else(|| hex.strip_prefix("0X"))?;
        if digits.len() != 8 {
            return None;
        }
        u32::from_str_radix(digits, 16)
            .ok()
            .map(|value| Color(i64::from(value)))
    }

    /// `(alpha, red, green, blue)`
    pub fn argb(self) -> (u8, u8, u8, u8) {
        // Only the low 32 bits carry color
        let [a, r, g, b] = (self.0 as u32).to_be_bytes();
        (a, r, g, b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::DEFAULT
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, r, g, b) = self.argb();
        write!(f, "0x{a:02X}{r:02X}{g:02X}{b:02X}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_and_unsigned_packings_are_the_same_color() {
        let signed = Color::from_packed(-16776961);
        let unsigned = Color::from_packed(4278190335);

        assert_eq!(signed.argb(), (0xFF, 0x00, 0x00, 0xFF));
        assert_eq!(signed.argb(), unsigned.argb());
        // The wire value is preserved as received
        assert_eq!(signed.packed(), -16776961);
    }

    #[test]
    fn test_from_hex() {
        let color = Color::from_hex("0x80FF8000").unwrap();
        assert_eq!(color.argb(), (0x80, 0xFF, 0x80, 0x00));
        assert_eq!(color, Color::from_argb(0x80, 0xFF, 0x80, 0x00));
        assert_eq!(color.to_string(), "0x80FF8000");

        assert!(Color::from_hex("FF8000").is_none());
        assert!(Color::from_hex("0xFF8000").is_none());
        assert!(Color::from_hex("0xZZFF8000").is_none());
    }

    #[test]
    fn test_default_is_opaque_red() {
        assert_eq!(Color::default().argb(), (0xFF, 0xFF, 0x00, 0x00));
    }
}
