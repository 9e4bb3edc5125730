use ratatui::style::Color;

use crate::directory::Badge;
use crate::form::{DisplayStatus, NoticeLevel};

pub const BG_PRIMARY: Color = Color::Rgb(0, 0, 0);
pub const BG_PANEL: Color = Color::Rgb(12, 12, 12);
pub const FG_PRIMARY: Color = Color::Rgb(190, 190, 190);
pub const FG_DIM: Color = Color::Rgb(128, 128, 128);

pub const BAR_BG: Color = Color::Rgb(23, 52, 127);
pub const BAR_TEXT: Color = Color::Rgb(235, 240, 255);

pub const MENU_BG: Color = Color::Rgb(79, 79, 79);
pub const MENU_BORDER: Color = Color::Rgb(208, 208, 208);

pub const BORDER_IDLE: Color = Color::Rgb(61, 120, 120);
pub const BORDER_FOCUS: Color = Color::Rgb(187, 94, 0);
pub const PANEL_HIGHLIGHT_BG: Color = Color::Rgb(120, 160, 255);

pub const STATUS_OK: Color = Color::Rgb(94, 186, 125);
pub const STATUS_BUSY: Color = Color::Rgb(229, 192, 78);
pub const STATUS_ERROR: Color = Color::Rgb(224, 108, 117);

pub fn file_status_color(status: DisplayStatus) -> Color {
    match status {
        DisplayStatus::Success => STATUS_OK,
        DisplayStatus::Pending | DisplayStatus::Processing => STATUS_BUSY,
        DisplayStatus::Error => STATUS_ERROR,
        DisplayStatus::Ready | DisplayStatus::Unknown => FG_DIM,
    }
}

pub fn badge_color(badge: Badge) -> Color {
    match badge {
        Badge::Ready => STATUS_OK,
        Badge::Processing => STATUS_BUSY,
        Badge::Failed => STATUS_ERROR,
        Badge::Pending => FG_DIM,
    }
}

pub fn notice_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Info => BAR_TEXT,
        NoticeLevel::Success => STATUS_OK,
        NoticeLevel::Warning => STATUS_BUSY,
        NoticeLevel::Error => STATUS_ERROR,
    }
}
