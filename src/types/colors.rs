use serde::{Deserialize, Serialize};
use std::fmt;

/// Rich text and block color vocabulary, spelled the way the wire spells it.
///
/// Unknown values collapse to `Default` rather than failing the parse; the
/// API grows colors faster than we track them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Gray,
    Brown,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    GrayBackground,
    BrownBackground,
    RedBackground,
    OrangeBackground,
    YellowBackground,
    GreenBackground,
    BlueBackground,
    PurpleBackground,
    PinkBackground,
    // serde requires the catch-all variant to come last.
    #[default]
    #[serde(other)]
    Default,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Default => "default",
            Color::Gray => "gray",
            Color::Brown => "brown",
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
            Color::Pink => "pink",
            Color::GrayBackground => "gray_background",
            Color::BrownBackground => "brown_background",
            Color::RedBackground => "red_background",
            Color::OrangeBackground => "orange_background",
            Color::YellowBackground => "yellow_background",
            Color::GreenBackground => "green_background",
            Color::BlueBackground => "blue_background",
            Color::PurpleBackground => "purple_background",
            Color::PinkBackground => "pink_background",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        let color: Color = serde_json::from_str("\"gray_background\"").unwrap();
        assert_eq!(color, Color::GrayBackground);
        assert_eq!(serde_json::to_string(&color).unwrap(), "\"gray_background\"");
    }

    #[test]
    fn test_unknown_color_falls_back_to_default() {
        let color: Color = serde_json::from_str("\"chartreuse\"").unwrap();
        assert_eq!(color, Color::Default);
    }
}
