//! Nord palette mapped onto the theme roles, plus a named-color fallback for
//! terminals without truecolor support.

use ratatui::style::Color;

use super::roles::{Theme, ThemeRoles};

// Polar Night (base surfaces)
pub const N0: Color = Color::Rgb(0x2E, 0x34, 0x40);
pub const N1: Color = Color::Rgb(0x3B, 0x42, 0x52);
pub const N3: Color = Color::Rgb(0x4C, 0x56, 0x6A);

// Snow Storm (foregrounds)
pub const S0: Color = Color::Rgb(0xD8, 0xDE, 0xE9);
pub const S1: Color = Color::Rgb(0xE5, 0xE9, 0xF0);
pub const S2: Color = Color::Rgb(0xEC, 0xEF, 0xF4);

// Frost
pub const F0: Color = Color::Rgb(0x8F, 0xBC, 0xBB);
pub const F1: Color = Color::Rgb(0x88, 0xC0, 0xD0);
pub const F2: Color = Color::Rgb(0x81, 0xA1, 0xC1);

// Aurora
pub const A_RED: Color = Color::Rgb(0xBF, 0x61, 0x6A);
pub const A_ORANGE: Color = Color::Rgb(0xD0, 0x87, 0x70);
pub const A_YELLOW: Color = Color::Rgb(0xEB, 0xCB, 0x8B);
pub const A_GREEN: Color = Color::Rgb(0xA3, 0xBE, 0x8C);

pub const TEXT_MUTED: Color = Color::Rgb(0x61, 0x6E, 0x88);

fn build_nord_roles() -> ThemeRoles {
    ThemeRoles {
        background: N0,
        surface: N0,
        border: N1,

        text: S0,
        text_secondary: S1,
        text_muted: TEXT_MUTED,

        accent_primary: F1,
        accent_secondary: F2,

        info: F2,
        success: A_GREEN,
        warning: A_ORANGE,
        error: A_RED,

        selection_bg: N3,
        selection_fg: S2,
        focus: F1,

        json_key: F0,
        json_string: A_YELLOW,
        json_number: A_ORANGE,
    }
}

fn build_ansi_roles() -> ThemeRoles {
    ThemeRoles {
        background: Color::Reset,
        surface: Color::Reset,
        border: Color::DarkGray,

        text: Color::Gray,
        text_secondary: Color::White,
        text_muted: Color::DarkGray,

        accent_primary: Color::Cyan,
        accent_secondary: Color::Blue,

        info: Color::Blue,
        success: Color::Green,
        warning: Color::Yellow,
        error: Color::Red,

        selection_bg: Color::DarkGray,
        selection_fg: Color::White,
        focus: Color::Cyan,

        json_key: Color::Cyan,
        json_string: Color::Yellow,
        json_number: Color::Magenta,
    }
}

#[derive(Debug, Clone)]
pub struct NordTheme {
    roles: ThemeRoles,
}

impl NordTheme {
    pub fn new() -> Self {
        Self { roles: build_nord_roles() }
    }

    /// Same semantics with the terminal's named colors.
    pub fn ansi() -> Self {
        Self { roles: build_ansi_roles() }
    }
}

impl Theme for NordTheme {
    fn roles(&self) -> &ThemeRoles {
        &self.roles
    }
}
