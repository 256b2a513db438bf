//! Theme styling for the TUI.
//!
//! The Nord palette is used on truecolor terminals; everything else gets the
//! same roles with named colors. Prefer the role helpers over hard-coded
//! colors.

use std::env;

use tracing::debug;

pub mod nord;
pub mod roles;

pub use nord::NordTheme;
pub use roles::{Theme, block};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorCapability {
    Truecolor,
    Named,
}

pub fn load() -> Box<dyn Theme> {
    match detect_color_capability() {
        ColorCapability::Truecolor => Box::new(NordTheme::new()),
        ColorCapability::Named => {
            debug!("terminal without truecolor; using named colors");
            Box::new(NordTheme::ansi())
        }
    }
}

fn detect_color_capability() -> ColorCapability {
    let color_term = env::var("COLORTERM").unwrap_or_default().to_ascii_lowercase();
    if color_term.contains("truecolor") || color_term.contains("24bit") {
        return ColorCapability::Truecolor;
    }
    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term.contains("truecolor") || term.contains("direct") {
        return ColorCapability::Truecolor;
    }
    ColorCapability::Named
}
