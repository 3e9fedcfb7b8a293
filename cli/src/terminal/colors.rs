use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 120, g: 200, b: 255 };
pub const SECONDARY: Color = Color::TrueColor { r: 170, g: 140, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 200, b: 90 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 210, g: 210, b: 210 };

pub const IPV4_ADDR: Color = Color::TrueColor { r: 110, g: 230, b: 160 };
pub const IPV6_ADDR: Color = Color::TrueColor { r: 90, g: 200, b: 200 };
pub const MAC_ADDR: Color = Color::TrueColor { r: 230, g: 160, b: 230 };
pub const PORT: Color = Color::TrueColor { r: 255, g: 170, b: 120 };

pub const RISK_CLEAN: Color = Color::Green;
pub const RISK_WARNING: Color = Color::Yellow;
pub const RISK_CRITICAL: Color = Color::Red;
