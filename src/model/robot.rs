use super::ids::SerialNumber;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Paint colors the factory stocks.
///
/// Parsed case-insensitively, always written lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Color {
    Red,
    Green,
    Blue,
    Cyan,
    Magenta,
    Yellow,
    Black,
    White,
    Pink,
}

impl Color {
    pub const ALL: [Color; 9] = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Cyan,
        Color::Magenta,
        Color::Yellow,
        Color::Black,
        Color::White,
        Color::Pink,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Cyan => "cyan",
            Color::Magenta => "magenta",
            Color::Yellow => "yellow",
            Color::Black => "black",
            Color::White => "white",
            Color::Pink => "pink",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown color: {0}")]
pub struct UnknownColor(pub String);

impl FromStr for Color {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Color::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownColor(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = UnknownColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A kind of robot the factory knows how to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotType {
    pub robot_type_id: String,
    pub description: String,
}

/// One entry of the factory's paint list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paint {
    pub color: Color,
}

impl Paint {
    pub fn all() -> Vec<Paint> {
        Color::ALL.into_iter().map(|color| Paint { color }).collect()
    }
}

/// A finished robot, identified by the serial number of the job that built it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Robot {
    pub serial_number: SerialNumber,
    pub robot_type_id: String,
    pub color: Color,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_parse_case_insensitively() {
        assert_eq!("RED".parse::<Color>(), Ok(Color::Red));
        assert_eq!(" Magenta ".parse::<Color>(), Ok(Color::Magenta));
        assert_eq!(
            "plaid".parse::<Color>(),
            Err(UnknownColor("plaid".to_string()))
        );
    }

    #[test]
    fn robot_wire_format() {
        let robot = Robot {
            serial_number: SerialNumber(3),
            robot_type_id: "BB-8".into(),
            color: Color::Blue,
        };
        let json = serde_json::to_value(&robot).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"serialNumber": "3", "robotTypeId": "BB-8", "color": "blue"})
        );

        let back: Robot =
            serde_json::from_str(r#"{"serialNumber": 3, "robotTypeId": "BB-8", "color": "BLUE"}"#)
                .unwrap();
        assert_eq!(back, robot);
    }
}
