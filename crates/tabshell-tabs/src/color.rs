//! Tab color tags

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TabError;

/// RGB color shown on a tab's icon, label and close button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TabColor {
    /// Written for sessions without a tag. Black is the default label color,
    /// so a black tag and no tag look the same and are stored the same.
    pub const UNSET: TabColor = TabColor::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn is_unset(&self) -> bool {
        *self == Self::UNSET
    }

    /// Collapse the sentinel into `None`
    pub fn normalize(color: Option<TabColor>) -> Option<TabColor> {
        color.filter(|c| !c.is_unset())
    }

    /// Canonical `#rrggbb` form
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Text stored for an optional tag; unset becomes the sentinel.
    pub fn encode_tag(color: Option<TabColor>) -> String {
        color.unwrap_or(Self::UNSET).to_hex()
    }

    /// Parse stored text back into an optional tag; the sentinel means unset.
    pub fn decode_tag(s: &str) -> Result<Option<TabColor>, TabError> {
        Ok(Self::normalize(Some(s.parse()?)))
    }
}

impl std::fmt::Display for TabColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for TabColor {
    type Err = TabError;

    /// Accepts `#rrggbb` and `#rgb`, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TabError::InvalidColor(s.to_string());

        let digits = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |hex: &str| u8::from_str_radix(hex, 16).map_err(|_| invalid());

        match digits.len() {
            6 => Ok(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let short = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
                Ok(Self::rgb(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(invalid()),
        }
    }
}

impl Serialize for TabColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TabColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_and_short_forms() {
        assert_eq!("#ff0000".parse::<TabColor>().unwrap(), TabColor::rgb(255, 0, 0));
        assert_eq!("#00FF7f".parse::<TabColor>().unwrap(), TabColor::rgb(0, 255, 127));
        assert_eq!("#fa0".parse::<TabColor>().unwrap(), TabColor::rgb(255, 170, 0));
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["ff0000", "#ff00", "#gg0000", "", "#", "red", "#ff00001"] {
            assert!(bad.parse::<TabColor>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_hex_is_canonical_lowercase() {
        let color: TabColor = "#ABCDEF".parse().unwrap();
        assert_eq!(color.to_hex(), "#abcdef");
        assert_eq!(color.to_string(), "#abcdef");
    }

    #[test]
    fn test_unset_sentinel() {
        assert_eq!(TabColor::encode_tag(None), "#000000");
        assert_eq!(TabColor::decode_tag("#000000").unwrap(), None);
        assert_eq!(TabColor::normalize(Some(TabColor::UNSET)), None);

        let red = TabColor::rgb(255, 0, 0);
        assert_eq!(TabColor::decode_tag(&TabColor::encode_tag(Some(red))).unwrap(), Some(red));
    }

    #[test]
    fn test_serde_as_string() {
        let color = TabColor::rgb(1, 2, 3);
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, "\"#010203\"");
        let back: TabColor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, color);
    }
}
