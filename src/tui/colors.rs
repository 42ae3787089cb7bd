//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{Priority, Status};

/// To Do
pub const SLATE_BLUE: Color = Color::Rgb(70, 110, 180);
/// In Progress, and high-visibility accents
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Review
pub const DARK_PURPLE: Color = Color::Rgb(120, 80, 140);
/// Done
pub const DARK_GREEN: Color = Color::Rgb(0, 110, 40);
/// Overdue dates and high priority
pub const DARK_RED: Color = Color::Rgb(160, 20, 20);
/// Drop placeholder
pub const DROP_CYAN: Color = Color::Rgb(0, 150, 170);

pub fn column_color(status: Status) -> Color {
    match status {
        Status::Todo => SLATE_BLUE,
        Status::InProgress => GOLD,
        Status::Review => DARK_PURPLE,
        Status::Done => DARK_GREEN,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Gray,
        Priority::Medium => GOLD,
        Priority::High => DARK_RED,
    }
}

/// Foreground that stays readable on `background`.
pub fn text_on(background: Color) -> Color {
    match background {
        GOLD => Color::Rgb(20, 20, 20),
        _ => Color::White,
    }
}
