use ratatui::style::Color;

// Primary colors
pub const ACCENT: Color = Color::Rgb(218, 118, 89); // warm orange
pub const SUCCESS: Color = Color::Rgb(134, 188, 111); // soft green
pub const WARNING: Color = Color::Rgb(229, 192, 123); // warm amber
pub const DANGER: Color = Color::Rgb(224, 108, 117); // soft red

// Text colors
pub const TEXT: Color = Color::Rgb(240, 240, 240);
pub const TEXT_SECONDARY: Color = Color::Rgb(180, 180, 180);
pub const TEXT_MUTED: Color = Color::Rgb(144, 144, 144);

// Background colors
pub const BG_BASE: Color = Color::Rgb(34, 34, 32);
pub const BG_INPUT: Color = Color::Rgb(58, 58, 56);

// Border colors
pub const BORDER: Color = Color::Rgb(66, 66, 64);
pub const BORDER_FOCUS: Color = Color::Rgb(218, 118, 89);

// Role-specific colors
pub const OPERATOR: Color = Color::Rgb(218, 118, 89); // warm orange for the call-taker
pub const AGENT: Color = Color::Rgb(144, 144, 144); // muted for the agent
