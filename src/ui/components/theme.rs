//! Palette and status colors.

use ftui::Style;
use ftui::render::cell::PackedRgba;

use crate::model::StatusKind;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub accent: PackedRgba,
    pub accent_alt: PackedRgba,
    pub text: PackedRgba,
    pub muted: PackedRgba,
    pub surface: PackedRgba,
    pub success: PackedRgba,
    pub error: PackedRgba,
    pub warning: PackedRgba,
    pub info: PackedRgba,
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            accent: PackedRgba::rgb(86, 182, 194),
            accent_alt: PackedRgba::rgb(97, 134, 227),
            text: PackedRgba::rgb(220, 223, 228),
            muted: PackedRgba::rgb(128, 138, 150),
            surface: PackedRgba::rgb(16, 28, 42),
            success: PackedRgba::rgb(120, 190, 120),
            error: PackedRgba::rgb(224, 108, 117),
            warning: PackedRgba::rgb(229, 192, 123),
            info: PackedRgba::rgb(120, 170, 220),
        }
    }

    pub fn title(&self) -> Style {
        Style::new().fg(self.accent).bold()
    }

    pub fn text_style(&self) -> Style {
        Style::new().fg(self.text)
    }

    pub fn muted_style(&self) -> Style {
        Style::new().fg(self.muted)
    }

    pub fn pane(&self, focused: bool) -> Style {
        if focused {
            Style::new().fg(self.accent)
        } else {
            Style::new().fg(self.muted)
        }
    }

    pub fn selected_row(&self) -> Style {
        Style::new().fg(self.text).bg(self.surface).bold()
    }

    pub fn danger(&self) -> Style {
        Style::new().fg(self.error).bold()
    }

    pub fn success_style(&self) -> Style {
        Style::new().fg(self.success)
    }

    pub fn status_style(&self, status: StatusKind) -> Style {
        let color = match status {
            StatusKind::Matched => self.success,
            StatusKind::Mismatch => self.error,
            StatusKind::Missing => self.warning,
            StatusKind::PossibleMatch => self.info,
        };
        Style::new().fg(color)
    }
}
