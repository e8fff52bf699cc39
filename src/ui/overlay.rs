//! Overlay controller: three mutually independent modal surfaces and a
//! single fullscreen owner.
//!
//! Fullscreen is one `Option<Surface>` slice rather than per-surface
//! booleans, so two surfaces can never report fullscreen at once. External
//! fullscreen-change notifications overwrite the slice wholesale.

/// The three overlay surfaces of the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Summary,
    Visuals,
    Analysis,
}

impl Surface {
    pub const ALL: [Surface; 3] = [Surface::Summary, Surface::Visuals, Surface::Analysis];

    pub fn title(self) -> &'static str {
        match self {
            Self::Summary => "Summary & Visuals",
            Self::Visuals => "Visuals",
            Self::Analysis => "Full Analysis",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverlayState {
    summary_open: bool,
    visuals_open: bool,
    analysis_open: bool,
    fullscreen: Option<Surface>,
}

impl OverlayState {
    fn open_flag(&mut self, surface: Surface) -> &mut bool {
        match surface {
            Surface::Summary => &mut self.summary_open,
            Surface::Visuals => &mut self.visuals_open,
            Surface::Analysis => &mut self.analysis_open,
        }
    }

    pub fn is_open(&self, surface: Surface) -> bool {
        match surface {
            Surface::Summary => self.summary_open,
            Surface::Visuals => self.visuals_open,
            Surface::Analysis => self.analysis_open,
        }
    }

    pub fn is_fullscreen(&self, surface: Surface) -> bool {
        self.fullscreen == Some(surface)
    }

    pub fn any_open(&self) -> bool {
        self.summary_open || self.visuals_open || self.analysis_open
    }

    /// Most recently meaningful surface for key routing: the fullscreen
    /// owner if open, otherwise the open surfaces in stacking order.
    pub fn topmost(&self) -> Option<Surface> {
        if let Some(owner) = self.fullscreen
            && self.is_open(owner)
        {
            return Some(owner);
        }
        [Surface::Analysis, Surface::Visuals, Surface::Summary]
            .into_iter()
            .find(|s| self.is_open(*s))
    }

    /// Surfaces are independent: opening one never closes another.
    pub fn open(&mut self, surface: Surface) {
        *self.open_flag(surface) = true;
    }

    /// Closing a surface always drops its fullscreen claim.
    pub fn close(&mut self, surface: Surface) {
        *self.open_flag(surface) = false;
        if self.fullscreen == Some(surface) {
            self.fullscreen = None;
        }
    }

    /// Optimistic fullscreen flip; the next [`reconcile`](Self::reconcile)
    /// overrides it if the environment disagrees.
    pub fn toggle_fullscreen(&mut self, surface: Surface) {
        if self.fullscreen == Some(surface) {
            self.fullscreen = None;
        } else {
            self.fullscreen = Some(surface);
        }
    }

    /// Apply an externally reported fullscreen target: exactly the reported
    /// surface owns fullscreen afterwards, every other surface does not.
    pub fn reconcile(&mut self, target: Option<Surface>) {
        self.fullscreen = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surfaces_open_independently() {
        let mut overlays = OverlayState::default();
        overlays.open(Surface::Summary);
        overlays.open(Surface::Visuals);
        assert!(overlays.is_open(Surface::Summary));
        assert!(overlays.is_open(Surface::Visuals));
        assert!(!overlays.is_open(Surface::Analysis));
    }

    #[test]
    fn closing_clears_fullscreen_for_that_surface() {
        let mut overlays = OverlayState::default();
        overlays.open(Surface::Visuals);
        overlays.toggle_fullscreen(Surface::Visuals);
        assert!(overlays.is_fullscreen(Surface::Visuals));
        overlays.close(Surface::Visuals);
        assert!(!overlays.is_open(Surface::Visuals));
        assert!(!overlays.is_fullscreen(Surface::Visuals));
    }

    #[test]
    fn reconcile_enforces_single_owner() {
        let mut overlays = OverlayState::default();
        overlays.open(Surface::Summary);
        overlays.open(Surface::Analysis);
        overlays.toggle_fullscreen(Surface::Summary);
        overlays.reconcile(Some(Surface::Analysis));
        assert!(overlays.is_fullscreen(Surface::Analysis));
        assert!(!overlays.is_fullscreen(Surface::Summary));
        assert!(!overlays.is_fullscreen(Surface::Visuals));

        overlays.reconcile(None);
        for surface in Surface::ALL {
            assert!(!overlays.is_fullscreen(surface));
        }
    }

    #[test]
    fn toggle_flips_ownership() {
        let mut overlays = OverlayState::default();
        overlays.open(Surface::Analysis);
        overlays.toggle_fullscreen(Surface::Analysis);
        assert!(overlays.is_fullscreen(Surface::Analysis));
        overlays.toggle_fullscreen(Surface::Analysis);
        assert!(!overlays.is_fullscreen(Surface::Analysis));
    }

    #[test]
    fn topmost_prefers_fullscreen_owner() {
        let mut overlays = OverlayState::default();
        overlays.open(Surface::Summary);
        overlays.open(Surface::Visuals);
        assert_eq!(overlays.topmost(), Some(Surface::Visuals));
        overlays.toggle_fullscreen(Surface::Summary);
        assert_eq!(overlays.topmost(), Some(Surface::Summary));
    }
}
