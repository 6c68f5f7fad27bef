//! Addressing for 7-bit addressable buses

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lowest address probed by a default scan (0x00 is the general call address)
pub const FIRST_PROBE_ADDRESS: u8 = 0x01;
/// Highest address probed by a default scan (0x7f and up are reserved)
pub const LAST_PROBE_ADDRESS: u8 = 0x7e;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid bus address: {0:?}")]
    Invalid(String),
    #[error("Address 0x{0:02x} is outside the probe space 0x01..=0x7e")]
    OutOfRange(u8),
    #[error("Address range {first}..={last} is empty")]
    EmptyRange { first: BusAddress, last: BusAddress },
}

/// A 7-bit device address on an addressable bus.
///
/// Rendered as lowercase two-digit hex with a `0x` prefix (`0x3c`), which is
/// also the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BusAddress(pub u8);

impl BusAddress {
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl From<u8> for BusAddress {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

impl FromStr for BusAddress {
    type Err = AddressError;

    /// Accepts `0x`-prefixed hex (`"0x3C"`) or plain decimal (`"60"`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u8::from_str_radix(hex, 16),
            None => trimmed.parse::<u8>(),
        };

        match parsed {
            Ok(raw) if raw <= 0x7f => Ok(Self(raw)),
            Ok(raw) => Err(AddressError::OutOfRange(raw)),
            Err(_) => Err(AddressError::Invalid(s.to_string())),
        }
    }
}

impl Serialize for BusAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BusAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // TOML allows both `0x76` integers and `"0x76"` strings
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u8),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(raw) if raw <= 0x7f => Ok(Self(raw)),
            Raw::Int(raw) => Err(serde::de::Error::custom(AddressError::OutOfRange(raw))),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Inclusive range of addresses to probe, always within 0x01..=0x7e
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    first: BusAddress,
    last: BusAddress,
}

impl AddressRange {
    pub fn new(first: u8, last: u8) -> Result<Self, AddressError> {
        for raw in [first, last] {
            if !(FIRST_PROBE_ADDRESS..=LAST_PROBE_ADDRESS).contains(&raw) {
                return Err(AddressError::OutOfRange(raw));
            }
        }
        if first > last {
            return Err(AddressError::EmptyRange {
                first: BusAddress(first),
                last: BusAddress(last),
            });
        }
        Ok(Self {
            first: BusAddress(first),
            last: BusAddress(last),
        })
    }

    pub fn first(&self) -> BusAddress {
        self.first
    }

    pub fn last(&self) -> BusAddress {
        self.last
    }

    pub fn contains(&self, address: BusAddress) -> bool {
        self.first <= address && address <= self.last
    }

    pub fn len(&self) -> usize {
        (self.last.0 - self.first.0) as usize + 1
    }

    /// Ranges are never empty; provided for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Addresses in ascending order
    pub fn iter(&self) -> impl Iterator<Item = BusAddress> {
        (self.first.0..=self.last.0).map(BusAddress)
    }
}

impl Default for AddressRange {
    fn default() -> Self {
        Self {
            first: BusAddress(FIRST_PROBE_ADDRESS),
            last: BusAddress(LAST_PROBE_ADDRESS),
        }
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.first, self.last)
    }
}
