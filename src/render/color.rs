use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 0RGB形式の色 (minifbバッファと同じ並び)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xFFFFFF);
    pub const BLACK: Color = Color(0x000000);
    pub const BLUE: Color = Color(0x0000FF);
    pub const RED: Color = Color(0xFF0000);
    pub const GREEN: Color = Color(0x008000);
    pub const YELLOW: Color = Color(0xFFFF00);
    pub const GRAY: Color = Color(0x808080);
    pub const LIGHT_GRAY: Color = Color(0xD3D3D3);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn b(self) -> u8 {
        self.0 as u8
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let color = match name.as_str() {
            "white" => Color::WHITE,
            "black" => Color::BLACK,
            "blue" => Color::BLUE,
            "red" => Color::RED,
            "green" => Color::GREEN,
            "yellow" => Color::YELLOW,
            "gray" | "grey" => Color::GRAY,
            "lightgray" | "lightgrey" => Color::LIGHT_GRAY,
            hex if hex.starts_with('#') && hex.len() == 7 => {
                let v = u32::from_str_radix(&hex[1..], 16)
                    .map_err(|_| format!("invalid hex color: {}", s))?;
                Color(v)
            }
            _ => return Err(format!("unknown color: {}", s)),
        };
        Ok(color)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}
