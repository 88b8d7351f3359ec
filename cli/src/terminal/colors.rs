use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 94, g: 186, b: 125 };
pub const SECONDARY: Color = Color::TrueColor { r: 120, g: 170, b: 220 };
pub const ACCENT: Color = Color::TrueColor { r: 240, g: 200, b: 90 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const PORT: Color = Color::TrueColor { r: 200, g: 140, b: 230 };
pub const URL: Color = Color::Cyan;
pub const PASS: Color = Color::Green;
pub const FAIL: Color = Color::Red;
pub const UNKNOWN: Color = Color::Yellow;
