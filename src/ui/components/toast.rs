//! Transient toast notifications.
//!
//! Every report-operation outcome and best-effort side effect surfaces
//! through here. Toasts expire on the runtime tick; nothing blocks on them.

use std::time::{Duration, Instant};

use ftui::Frame;
use ftui::core::geometry::Rect;
use ftui::widgets::Widget;
use ftui::widgets::paragraph::Paragraph;

use super::theme::Palette;

/// How long a toast stays visible.
const TOAST_TTL: Duration = Duration::from_millis(3500);

/// Most toasts shown at once; older ones are dropped first.
const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastType,
    created_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>, kind: ToastType) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at: Instant::now(),
        }
    }

    fn expired(&self) -> bool {
        self.created_at.elapsed() >= TOAST_TTL
    }
}

#[derive(Debug, Default)]
pub struct ToastManager {
    toasts: Vec<Toast>,
}

impl ToastManager {
    pub fn push(&mut self, toast: Toast) {
        self.toasts.push(toast);
        if self.toasts.len() > MAX_VISIBLE {
            let overflow = self.toasts.len() - MAX_VISIBLE;
            self.toasts.drain(..overflow);
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Toast::new(message, ToastType::Success));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Toast::new(message, ToastType::Error));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Toast::new(message, ToastType::Info));
    }

    /// Dismiss expired toasts; called on every runtime tick.
    pub fn tick(&mut self) {
        self.toasts.retain(|t| !t.expired());
    }

    pub fn visible(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Draw the stack in the top-right corner of `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        if self.toasts.is_empty() {
            return;
        }
        let width = 44u16.min(area.width);
        if width < 8 {
            return;
        }
        let x = area.x + area.width - width;
        for (i, toast) in self.toasts.iter().enumerate() {
            let y = area.y + i as u16;
            if y >= area.y + area.height {
                break;
            }
            let (marker, style) = match toast.kind {
                ToastType::Success => ("\u{2713} ", palette.success_style()),
                ToastType::Error => ("\u{2717} ", palette.danger()),
                ToastType::Info => ("\u{2139} ", palette.muted_style()),
            };
            let mut line = format!("{marker}{}", toast.message);
            if line.len() > width as usize {
                line.truncate(width as usize);
            }
            Paragraph::new(&*line)
                .style(style)
                .render(Rect::new(x, y, width, 1), frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_caps_visible_toasts() {
        let mut manager = ToastManager::default();
        for i in 0..10 {
            manager.push(Toast::new(format!("t{i}"), ToastType::Info));
        }
        assert_eq!(manager.visible().len(), MAX_VISIBLE);
        assert_eq!(manager.visible()[0].message, "t6");
    }

    #[test]
    fn fresh_toasts_survive_tick() {
        let mut manager = ToastManager::default();
        manager.success("saved");
        manager.tick();
        assert_eq!(manager.visible().len(), 1);
    }
}
