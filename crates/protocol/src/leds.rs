//! LED model for the Warthog throttle indicator block
//!
//! The throttle exposes five numbered indicator LEDs plus the panel
//! backlight, all driven through a single bitmask byte in the output
//! report. Bit assignments follow the hardware, not the silkscreen
//! numbering, which is why they look shuffled.

use std::fmt;

/// One controllable indicator
///
/// The discriminant is the wire bit for that indicator in the report
/// bitmask byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Led {
    Led1 = 0x04,
    Led2 = 0x02,
    Led3 = 0x10,
    Led4 = 0x01,
    Led5 = 0x40,
    Backlight = 0x08,
}

/// The four flap indicators, in panel order top to bottom
pub const FLAP_LEDS: [Led; 4] = [Led::Led1, Led::Led2, Led::Led3, Led::Led4];

/// The landing gear indicator
pub const GEAR_LED: Led = Led::Led5;

impl Led {
    /// Wire bit for this indicator
    pub fn bit(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Led {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Led::Led1 => "LED1",
            Led::Led2 => "LED2",
            Led::Led3 => "LED3",
            Led::Led4 => "LED4",
            Led::Led5 => "LED5",
            Led::Backlight => "backlight",
        };
        write!(f, "{name}")
    }
}

/// Set of indicators as the wire bitmask byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedMask(u8);

impl LedMask {
    /// All indicators off
    pub const EMPTY: LedMask = LedMask(0);

    /// Raw bitmask byte as written to the device
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, led: Led) -> bool {
        self.0 & led.bit() != 0
    }

    pub fn set(&mut self, led: Led) {
        self.0 |= led.bit();
    }

    pub fn clear(&mut self, led: Led) {
        self.0 &= !led.bit();
    }

    /// Set or clear in one call, handy when mirroring a boolean input
    pub fn set_to(&mut self, led: Led, on: bool) {
        if on {
            self.set(led);
        } else {
            self.clear(led);
        }
    }

    pub fn toggle(&mut self, led: Led) {
        self.0 ^= led.bit();
    }

    /// Toggle every indicator present in `other`, used by the blink tick
    pub fn toggle_all(&mut self, other: LedMask) {
        self.0 ^= other.0;
    }
}

impl From<Led> for LedMask {
    fn from(led: Led) -> Self {
        LedMask(led.bit())
    }
}

impl fmt::Display for LedMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Brightness level for the whole indicator block
///
/// The wire encoding is the ordinal itself. Levels are ordered, so
/// comparisons like "at least Low" behave as expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LedIntensity {
    Off = 0,
    ExtraLow = 1,
    Low = 2,
    Med = 3,
    High = 4,
    ExtraHigh = 5,
}

impl LedIntensity {
    /// Wire byte for this level
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Parse a configuration value, case-insensitively
    ///
    /// Returns `None` for unrecognized input; callers fall back to
    /// [`LedIntensity::ExtraLow`], the dimmest visible level.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "off" => Some(Self::Off),
            "extra_low" => Some(Self::ExtraLow),
            "low" => Some(Self::Low),
            "med" => Some(Self::Med),
            "high" => Some(Self::High),
            "extra_high" => Some(Self::ExtraHigh),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::ExtraLow => "extra_low",
            Self::Low => "low",
            Self::Med => "med",
            Self::High => "high",
            Self::ExtraHigh => "extra_high",
        }
    }
}

impl fmt::Display for LedIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_bits_match_hardware() {
        assert_eq!(Led::Led1.bit(), 0x04);
        assert_eq!(Led::Led2.bit(), 0x02);
        assert_eq!(Led::Led3.bit(), 0x10);
        assert_eq!(Led::Led4.bit(), 0x01);
        assert_eq!(Led::Led5.bit(), 0x40);
        assert_eq!(Led::Backlight.bit(), 0x08);
    }

    #[test]
    fn test_mask_set_clear_contains() {
        let mut mask = LedMask::EMPTY;
        assert!(mask.is_empty());

        mask.set(Led::Led1);
        mask.set(Led::Backlight);
        assert!(mask.contains(Led::Led1));
        assert!(mask.contains(Led::Backlight));
        assert!(!mask.contains(Led::Led5));
        assert_eq!(mask.bits(), 0x04 | 0x08);

        mask.clear(Led::Led1);
        assert!(!mask.contains(Led::Led1));
        assert_eq!(mask.bits(), 0x08);
    }

    #[test]
    fn test_mask_set_is_idempotent() {
        let mut mask = LedMask::EMPTY;
        mask.set(Led::Led3);
        mask.set(Led::Led3);
        assert_eq!(mask.bits(), 0x10);
        mask.clear(Led::Led3);
        mask.clear(Led::Led3);
        assert!(mask.is_empty());
    }

    #[test]
    fn test_toggle_all_flips_only_named_bits() {
        let mut mask = LedMask::EMPTY;
        mask.set(Led::Led1);
        mask.set(Led::Led5);

        let blinking = LedMask::from(Led::Led5);
        mask.toggle_all(blinking);
        assert!(mask.contains(Led::Led1));
        assert!(!mask.contains(Led::Led5));

        mask.toggle_all(blinking);
        assert!(mask.contains(Led::Led5));
    }

    #[test]
    fn test_intensity_wire_levels() {
        assert_eq!(LedIntensity::Off.level(), 0);
        assert_eq!(LedIntensity::ExtraLow.level(), 1);
        assert_eq!(LedIntensity::ExtraHigh.level(), 5);
    }

    #[test]
    fn test_intensity_ordering() {
        assert!(LedIntensity::Off < LedIntensity::ExtraLow);
        assert!(LedIntensity::Med < LedIntensity::ExtraHigh);
    }

    #[test]
    fn test_intensity_from_name() {
        assert_eq!(LedIntensity::from_name("med"), Some(LedIntensity::Med));
        assert_eq!(
            LedIntensity::from_name("EXTRA_HIGH"),
            Some(LedIntensity::ExtraHigh)
        );
        assert_eq!(
            LedIntensity::from_name("  low "),
            Some(LedIntensity::Low)
        );
        assert_eq!(LedIntensity::from_name("blinding"), None);
        assert_eq!(LedIntensity::from_name(""), None);
    }

    #[test]
    fn test_intensity_name_roundtrip() {
        for intensity in [
            LedIntensity::Off,
            LedIntensity::ExtraLow,
            LedIntensity::Low,
            LedIntensity::Med,
            LedIntensity::High,
            LedIntensity::ExtraHigh,
        ] {
            assert_eq!(LedIntensity::from_name(intensity.name()), Some(intensity));
        }
    }
}
