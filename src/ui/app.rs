//! FrankenTUI application model for the review workspace.
//!
//! Elm-architecture types: [`ReviewApp`] (Model) and [`ReviewMsg`]
//! (Message). State transitions are pure; remote work runs in `Cmd::task`
//! closures whose results come back as messages.
//!
//! ```text
//!   Event (key/mouse/resize/tick)
//!        │
//!        ▼
//!   ReviewMsg (from Event)
//!        │
//!        ▼
//!   ReviewApp::update(&mut self, msg) -> Cmd<ReviewMsg>
//!        │
//!        ├── Pure state transition   → Cmd::none()
//!        ├── Remote operation        → Cmd::task(ApiClient call)
//!        └── Quit                    → Cmd::quit()
//!
//!   ReviewApp::view(&self, frame)
//! ```

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use ftui::core::geometry::Rect;
use ftui::layout::{Constraint, Flex};
use ftui::text::{Line, Span, Text};
use ftui::widgets::Widget;
use ftui::widgets::block::{Alignment, Block};
use ftui::widgets::borders::{BorderType, Borders};
use ftui::widgets::paragraph::Paragraph;
use ftui::{Cmd, Event, Frame, KeyCode, Model, Modifiers};

use crate::api::{ApiClient, ApiError};
use crate::model::{AnalysisResult, ComparisonResult, ReportEntry, StatusKind};
use crate::state::PersistedUiState;
use crate::ui::components::theme::Palette;
use crate::ui::components::toast::ToastManager;
use crate::ui::detail::RowDetail;
use crate::ui::layout::{PaneLayout, PaneSide};
use crate::ui::overlay::{OverlayState, Surface};

/// Sidebar rows, top to bottom: the three view tabs plus the summary button.
const SIDEBAR_NAV_ROWS: usize = 4;

/// Width of the percentage bars in the summary surface.
const SUMMARY_BAR_WIDTH: usize = 14;

/// How many rows the summary surface previews.
const SUMMARY_TOP_ROWS: usize = 10;

/// How many structured examples the analysis surface shows.
const ANALYSIS_EXAMPLE_CAP: usize = 8;

// =========================================================================
// Enumerations
// =========================================================================

/// Main view tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    Comparator,
    Reports,
    Settings,
}

impl ActiveView {
    pub fn label(self) -> &'static str {
        match self {
            Self::Comparator => "Comparator",
            Self::Reports => "Reports",
            Self::Settings => "Settings",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Comparator => "comparator",
            Self::Reports => "reports",
            Self::Settings => "settings",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "comparator" => Some(Self::Comparator),
            "reports" => Some(Self::Reports),
            "settings" => Some(Self::Settings),
            _ => None,
        }
    }
}

/// Which comparator form input owns keystrokes; `None` routes keys to the
/// results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    SchemaUrl,
    RequirementsPath,
}

/// Normalized mouse gesture kinds. Every pointer device the terminal knows
/// about collapses into these before they reach the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseKind {
    LeftClick,
    LeftDrag,
    LeftRelease,
    ScrollUp,
    ScrollDown,
}

/// Region identified by hit-testing against last-rendered layout rects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HitRegion {
    SplitHandleSidebar,
    SplitHandleRight,
    /// Row in the sidebar menu; indices 0..=2 are views, 3 is the summary
    /// button.
    SidebarNav { row_idx: usize },
    /// Row in the comparison table. `item_idx` is absolute.
    TableRow { item_idx: usize },
    /// Row in the reports list. `item_idx` is absolute.
    ReportRow { item_idx: usize },
    Detail,
    None,
}

// =========================================================================
// Messages
// =========================================================================

#[derive(Debug)]
pub enum ReviewMsg {
    // -- Input plumbing ---------------------------------------------------
    KeyChar(char),
    KeyEnter,
    KeyEscape,
    KeyTab,
    KeyBackspace,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    Mouse { kind: MouseKind, x: u16, y: u16 },
    Resized { width: u16, height: u16 },
    Tick,
    QuitRequested,
    ForceQuit,

    // -- Workspace shell --------------------------------------------------
    ViewSelected(ActiveView),
    SidebarToggled,

    // -- Comparator -------------------------------------------------------
    CompareRequested,
    CompareCompleted(Box<ComparisonResult>),
    CompareFailed(String),
    RowSelected(usize),
    CopyExpected,
    CopyImplemented,

    // -- Summary surface --------------------------------------------------
    SummaryOpened,
    SummaryVisualsLoaded(Vec<String>),

    // -- Report operations ------------------------------------------------
    ReportsRequested,
    ReportsLoaded(Vec<ReportEntry>),
    ReportsFailed(String),
    VisualsRequested,
    VisualsLoaded { path: String, images: Vec<String> },
    VisualsFailed { path: String, message: String },
    AnalyzeRequested,
    AnalysisCompleted { seq: u64, result: Box<AnalysisResult> },
    AnalysisFailed { seq: u64, message: String },
    DeleteRequested,
    DeleteConfirmed,
    DeleteCancelled,
    DeleteCompleted,
    DeleteFailed(String),
    CopyDownloadUrl,

    // -- Overlays ---------------------------------------------------------
    OverlayClosed(Surface),
    FullscreenToggled(Surface),
    /// Externally reported fullscreen target; reconciles ownership.
    FullscreenChanged(Option<Surface>),
    CopyAnalysisText,
    CopyAnalysisJson,
}

// =========================================================================
// From<Event> — convert terminal events into messages
// =========================================================================

impl From<Event> for ReviewMsg {
    fn from(event: Event) -> Self {
        match event {
            Event::Key(key) => {
                let ctrl = key.modifiers.contains(Modifiers::CTRL);
                match key.code {
                    KeyCode::Char('c') if ctrl => ReviewMsg::ForceQuit,
                    KeyCode::Escape => ReviewMsg::KeyEscape,
                    KeyCode::Enter => ReviewMsg::KeyEnter,
                    KeyCode::Tab | KeyCode::BackTab => ReviewMsg::KeyTab,
                    KeyCode::Backspace => ReviewMsg::KeyBackspace,
                    KeyCode::Up => ReviewMsg::MoveUp,
                    KeyCode::Down => ReviewMsg::MoveDown,
                    KeyCode::PageUp => ReviewMsg::PageUp,
                    KeyCode::PageDown => ReviewMsg::PageDown,
                    KeyCode::Char(c) => ReviewMsg::KeyChar(c),
                    _ => ReviewMsg::Tick,
                }
            }
            Event::Mouse(mouse) => {
                use ftui::core::event::MouseButton;
                use ftui::core::event::MouseEventKind as Mek;
                let kind = match mouse.kind {
                    Mek::Down(MouseButton::Left) => Some(MouseKind::LeftClick),
                    Mek::Drag(MouseButton::Left) => Some(MouseKind::LeftDrag),
                    Mek::Up(MouseButton::Left) => Some(MouseKind::LeftRelease),
                    Mek::ScrollUp => Some(MouseKind::ScrollUp),
                    Mek::ScrollDown => Some(MouseKind::ScrollDown),
                    _ => None,
                };
                match kind {
                    Some(kind) => ReviewMsg::Mouse {
                        kind,
                        x: mouse.x,
                        y: mouse.y,
                    },
                    None => ReviewMsg::Tick,
                }
            }
            Event::Resize { width, height } => ReviewMsg::Resized { width, height },
            _ => ReviewMsg::Tick,
        }
    }
}

// =========================================================================
// Model
// =========================================================================

pub struct ReviewApp {
    // -- Collaborators ----------------------------------------------------
    pub api: Option<Arc<ApiClient>>,
    pub data_dir: PathBuf,
    /// Persist layout/view changes to disk. Off in tests.
    pub persist_state: bool,

    // -- Workspace shell --------------------------------------------------
    pub view: ActiveView,
    pub sidebar_visible: bool,
    pub comparison: Option<ComparisonResult>,

    // -- Comparator form --------------------------------------------------
    pub schema_url: String,
    pub requirements_path: String,
    pub form_focus: Option<FormField>,
    pub compare_loading: bool,

    // -- Row selection / detail -------------------------------------------
    pub selected_row: Option<usize>,
    pub row_detail: Option<RowDetail>,
    pub detail_scroll: u16,

    // -- Reports ----------------------------------------------------------
    pub reports: Vec<ReportEntry>,
    pub reports_selection: usize,
    pub reports_loading: bool,
    pub reports_error: Option<String>,
    pub visuals: Option<Vec<String>>,
    pub visuals_loading: bool,
    pub visuals_error: Option<String>,
    /// Report the visuals surface belongs to; recorded even when the fetch
    /// fails.
    pub visuals_for: Option<ReportEntry>,
    pub analysis: Option<AnalysisResult>,
    pub analysis_loading: bool,
    pub analysis_error: Option<String>,
    pub analysis_for: Option<ReportEntry>,
    /// Request token for analyze; stale completions are dropped.
    pub analysis_seq: u64,
    pub analysis_scroll: u16,
    pub delete_loading: bool,
    pub delete_error: Option<String>,
    /// Report awaiting delete confirmation; nothing dispatches until the
    /// reviewer confirms.
    pub pending_delete: Option<ReportEntry>,

    // -- Summary surface --------------------------------------------------
    pub summary_visuals: Option<Vec<String>>,
    pub summary_visuals_loading: bool,

    // -- Overlays & layout ------------------------------------------------
    pub overlays: OverlayState,
    pub layout: PaneLayout,

    // -- Chrome -----------------------------------------------------------
    pub toasts: ToastManager,
    pub status: String,
    palette: Palette,

    // -- Hit regions (repopulated on every render) ------------------------
    last_sidebar_handle: RefCell<Option<Rect>>,
    last_right_handle: RefCell<Option<Rect>>,
    last_sidebar_nav_rows: RefCell<Vec<(Rect, usize)>>,
    last_table_inner: RefCell<Option<Rect>>,
    last_reports_inner: RefCell<Option<Rect>>,
    last_detail_area: RefCell<Option<Rect>>,
    last_modal_area: RefCell<Option<Rect>>,
    table_scroll: Cell<usize>,
    reports_scroll: Cell<usize>,
}

impl Default for ReviewApp {
    fn default() -> Self {
        Self {
            api: None,
            data_dir: PathBuf::new(),
            persist_state: false,
            view: ActiveView::Comparator,
            sidebar_visible: true,
            comparison: None,
            schema_url: String::new(),
            requirements_path: String::new(),
            form_focus: Some(FormField::SchemaUrl),
            compare_loading: false,
            selected_row: None,
            row_detail: None,
            detail_scroll: 0,
            reports: Vec::new(),
            reports_selection: 0,
            reports_loading: false,
            reports_error: None,
            visuals: None,
            visuals_loading: false,
            visuals_error: None,
            visuals_for: None,
            analysis: None,
            analysis_loading: false,
            analysis_error: None,
            analysis_for: None,
            analysis_seq: 0,
            analysis_scroll: 0,
            delete_loading: false,
            delete_error: None,
            pending_delete: None,
            summary_visuals: None,
            summary_visuals_loading: false,
            overlays: OverlayState::default(),
            layout: PaneLayout::default(),
            toasts: ToastManager::default(),
            status: String::new(),
            palette: Palette::dark(),
            last_sidebar_handle: RefCell::new(None),
            last_right_handle: RefCell::new(None),
            last_sidebar_nav_rows: RefCell::new(Vec::new()),
            last_table_inner: RefCell::new(None),
            last_reports_inner: RefCell::new(None),
            last_detail_area: RefCell::new(None),
            last_modal_area: RefCell::new(None),
            table_scroll: Cell::new(0),
            reports_scroll: Cell::new(0),
        }
    }
}

/// Map an analyze failure to its user-facing message: explicit server
/// payloads verbatim behind the fixed prefix, everything else generic.
fn analysis_failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Server(message) => format!("Analysis failed: {message}"),
        _ => "Analysis request failed".to_string(),
    }
}

/// Map a compare failure the same way.
fn compare_failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Server(message) => message.clone(),
        _ => "Failed to run comparison".to_string(),
    }
}

impl ReviewApp {
    pub fn selected_report(&self) -> Option<&ReportEntry> {
        self.reports.get(self.reports_selection)
    }

    fn persist(&self) {
        if !self.persist_state {
            return;
        }
        PersistedUiState {
            version: 1,
            sidebar_width: Some(self.layout.sidebar_width),
            right_width: Some(self.layout.right_width),
            last_view: Some(self.view.slug().to_string()),
        }
        .save(&self.data_dir);
    }

    fn copy_with_notice(&mut self, text: &str, what: &str) {
        match copy_to_clipboard(text) {
            Ok(()) => {
                self.status = format!("Copied {what} to clipboard");
                self.toasts.success(format!("Copied {what}"));
            }
            Err(e) => {
                self.status = format!("Clipboard: {e}");
                self.toasts.error(format!("Copy failed: {e}"));
            }
        }
    }

    fn select_row(&mut self, idx: usize) {
        let Some(result) = &self.comparison else {
            return;
        };
        if result.rows.is_empty() {
            return;
        }
        let idx = idx.min(result.rows.len() - 1);
        self.selected_row = Some(idx);
        self.row_detail = Some(RowDetail::from_row(&result.rows[idx]));
        self.detail_scroll = 0;
    }

    fn move_row_selection(&mut self, delta: i32) {
        let Some(result) = &self.comparison else {
            return;
        };
        if result.rows.is_empty() {
            return;
        }
        let next = match self.selected_row {
            None => 0,
            Some(current) => {
                (current as i32 + delta).clamp(0, result.rows.len() as i32 - 1) as usize
            }
        };
        self.select_row(next);
    }

    fn move_report_selection(&mut self, delta: i32) {
        if self.reports.is_empty() {
            return;
        }
        let next =
            (self.reports_selection as i32 + delta).clamp(0, self.reports.len() as i32 - 1);
        self.reports_selection = next as usize;
    }

    // ---------------------------------------------------------------------
    // Remote operation dispatch
    // ---------------------------------------------------------------------

    fn dispatch_compare(&mut self) -> Cmd<ReviewMsg> {
        if self.requirements_path.trim().is_empty() {
            self.toasts.error("Please select a file");
            return Cmd::none();
        }
        if self.schema_url.trim().is_empty() {
            self.toasts.error("Please enter schema URL");
            return Cmd::none();
        }
        let Some(api) = self.api.clone() else {
            return Cmd::none();
        };
        self.compare_loading = true;
        self.status = "Running comparison\u{2026}".to_string();
        let requirements = PathBuf::from(self.requirements_path.trim());
        let schema_url = self.schema_url.trim().to_string();
        Cmd::task(move || match api.compare(&requirements, &schema_url) {
            Ok(result) => ReviewMsg::CompareCompleted(Box::new(result)),
            Err(e) => {
                warn!("compare failed: {e}");
                ReviewMsg::CompareFailed(compare_failure_message(&e))
            }
        })
    }

    fn dispatch_list(&mut self) -> Cmd<ReviewMsg> {
        let Some(api) = self.api.clone() else {
            return Cmd::none();
        };
        self.reports_loading = true;
        self.reports_error = None;
        Cmd::task(move || match api.list_reports() {
            Ok(reports) => ReviewMsg::ReportsLoaded(reports),
            Err(e) => ReviewMsg::ReportsFailed(e.to_string()),
        })
    }

    fn dispatch_visuals(&mut self) -> Cmd<ReviewMsg> {
        let Some(report) = self.selected_report().cloned() else {
            return Cmd::none();
        };
        let Some(api) = self.api.clone() else {
            return Cmd::none();
        };
        // Selection is recorded up front so a failure still points at the
        // report the reviewer asked about.
        self.visuals_for = Some(report.clone());
        self.visuals_loading = true;
        self.visuals_error = None;
        let path = report.path;
        Cmd::task(move || match api.fetch_visuals(&path) {
            Ok(images) => ReviewMsg::VisualsLoaded { path, images },
            Err(e) => ReviewMsg::VisualsFailed {
                path,
                message: e.to_string(),
            },
        })
    }

    fn dispatch_analyze(&mut self) -> Cmd<ReviewMsg> {
        let Some(report) = self.selected_report().cloned() else {
            return Cmd::none();
        };
        let Some(api) = self.api.clone() else {
            return Cmd::none();
        };
        self.analysis_for = Some(report.clone());
        self.analysis_loading = true;
        self.analysis_error = None;
        self.analysis_seq += 1;
        let seq = self.analysis_seq;
        let path = report.path;
        Cmd::task(move || match api.analyze(&path) {
            Ok(result) => ReviewMsg::AnalysisCompleted {
                seq,
                result: Box::new(result),
            },
            Err(e) => ReviewMsg::AnalysisFailed {
                seq,
                message: analysis_failure_message(&e),
            },
        })
    }

    fn dispatch_delete(&mut self) -> Cmd<ReviewMsg> {
        let Some(report) = self.pending_delete.take() else {
            return Cmd::none();
        };
        let Some(api) = self.api.clone() else {
            return Cmd::none();
        };
        self.delete_loading = true;
        self.delete_error = None;
        let path = report.path;
        Cmd::task(move || match api.delete_report(&path) {
            Ok(true) => ReviewMsg::DeleteCompleted,
            Ok(false) => ReviewMsg::DeleteFailed("Delete failed".to_string()),
            Err(e) => {
                warn!("delete failed: {e}");
                ReviewMsg::DeleteFailed("Delete failed".to_string())
            }
        })
    }

    fn open_summary(&mut self) -> Cmd<ReviewMsg> {
        self.overlays.open(Surface::Summary);
        self.summary_visuals = None;
        let report_path = self
            .comparison
            .as_ref()
            .and_then(|c| c.report.as_ref())
            .map(|r| r.path.clone());
        let (Some(path), Some(api)) = (report_path, self.api.clone()) else {
            return Cmd::none();
        };
        self.summary_visuals_loading = true;
        Cmd::task(move || match api.fetch_visuals(&path) {
            Ok(images) => ReviewMsg::SummaryVisualsLoaded(images),
            Err(e) => {
                // The summary degrades to the empty-visuals state on failure.
                debug!("summary visuals fetch failed: {e}");
                ReviewMsg::SummaryVisualsLoaded(Vec::new())
            }
        })
    }

    // ---------------------------------------------------------------------
    // Key routing
    // ---------------------------------------------------------------------

    fn on_escape(&mut self) -> Cmd<ReviewMsg> {
        if self.pending_delete.is_some() {
            return Cmd::msg(ReviewMsg::DeleteCancelled);
        }
        if let Some(surface) = self.overlays.topmost() {
            return Cmd::msg(ReviewMsg::OverlayClosed(surface));
        }
        if self.form_focus.is_some() {
            self.form_focus = None;
            return Cmd::none();
        }
        Cmd::msg(ReviewMsg::QuitRequested)
    }

    fn on_char(&mut self, c: char) -> Cmd<ReviewMsg> {
        // Confirm dialog swallows everything except its own answers.
        if self.pending_delete.is_some() {
            return match c {
                'y' | 'Y' => Cmd::msg(ReviewMsg::DeleteConfirmed),
                'n' | 'N' | 'q' => Cmd::msg(ReviewMsg::DeleteCancelled),
                _ => Cmd::none(),
            };
        }

        if let Some(surface) = self.overlays.topmost() {
            return match c {
                'f' => Cmd::msg(ReviewMsg::FullscreenToggled(surface)),
                'c' if surface == Surface::Analysis => Cmd::msg(ReviewMsg::CopyAnalysisText),
                'x' if surface == Surface::Analysis => Cmd::msg(ReviewMsg::CopyAnalysisJson),
                'q' => Cmd::msg(ReviewMsg::OverlayClosed(surface)),
                _ => Cmd::none(),
            };
        }

        // Form inputs own printable characters while focused.
        if self.view == ActiveView::Comparator
            && let Some(field) = self.form_focus
        {
            match field {
                FormField::SchemaUrl => self.schema_url.push(c),
                FormField::RequirementsPath => self.requirements_path.push(c),
            }
            return Cmd::none();
        }

        match c {
            'q' => Cmd::msg(ReviewMsg::QuitRequested),
            '1' => Cmd::msg(ReviewMsg::ViewSelected(ActiveView::Comparator)),
            '2' => Cmd::msg(ReviewMsg::ViewSelected(ActiveView::Reports)),
            '3' => Cmd::msg(ReviewMsg::ViewSelected(ActiveView::Settings)),
            'b' => Cmd::msg(ReviewMsg::SidebarToggled),
            's' => Cmd::msg(ReviewMsg::SummaryOpened),
            'j' => Cmd::msg(ReviewMsg::MoveDown),
            'k' => Cmd::msg(ReviewMsg::MoveUp),
            'e' if self.view == ActiveView::Comparator => Cmd::msg(ReviewMsg::CopyExpected),
            'i' if self.view == ActiveView::Comparator => Cmd::msg(ReviewMsg::CopyImplemented),
            'r' if self.view == ActiveView::Reports => Cmd::msg(ReviewMsg::ReportsRequested),
            'v' if self.view == ActiveView::Reports => Cmd::msg(ReviewMsg::VisualsRequested),
            'a' if self.view == ActiveView::Reports => Cmd::msg(ReviewMsg::AnalyzeRequested),
            'd' if self.view == ActiveView::Reports => Cmd::msg(ReviewMsg::DeleteRequested),
            'x' if self.view == ActiveView::Reports => Cmd::msg(ReviewMsg::CopyDownloadUrl),
            _ => Cmd::none(),
        }
    }

    fn on_vertical_move(&mut self, delta: i32) -> Cmd<ReviewMsg> {
        if let Some(surface) = self.overlays.topmost() {
            if surface == Surface::Analysis {
                self.analysis_scroll = (i32::from(self.analysis_scroll) + delta).max(0) as u16;
            }
            return Cmd::none();
        }
        match self.view {
            ActiveView::Comparator => {
                if self.form_focus.is_none() {
                    self.move_row_selection(delta);
                }
            }
            ActiveView::Reports => self.move_report_selection(delta),
            ActiveView::Settings => {}
        }
        Cmd::none()
    }

    // ---------------------------------------------------------------------
    // Mouse routing
    // ---------------------------------------------------------------------

    fn hit_test(&self, x: u16, y: u16) -> HitRegion {
        if let Some(rect) = *self.last_sidebar_handle.borrow()
            && rect.contains(x, y)
        {
            return HitRegion::SplitHandleSidebar;
        }
        if let Some(rect) = *self.last_right_handle.borrow()
            && rect.contains(x, y)
        {
            return HitRegion::SplitHandleRight;
        }
        if let Some((_, row_idx)) = self
            .last_sidebar_nav_rows
            .borrow()
            .iter()
            .find(|(rect, _)| rect.contains(x, y))
        {
            return HitRegion::SidebarNav { row_idx: *row_idx };
        }
        if let Some(rect) = *self.last_table_inner.borrow()
            && rect.contains(x, y)
        {
            let item_idx = self.table_scroll.get() + (y - rect.y) as usize;
            return HitRegion::TableRow { item_idx };
        }
        if let Some(rect) = *self.last_reports_inner.borrow()
            && rect.contains(x, y)
        {
            // Report rows are two lines tall.
            let item_idx = self.reports_scroll.get() + ((y - rect.y) / 2) as usize;
            return HitRegion::ReportRow { item_idx };
        }
        if let Some(rect) = *self.last_detail_area.borrow()
            && rect.contains(x, y)
        {
            return HitRegion::Detail;
        }
        HitRegion::None
    }

    fn on_mouse(&mut self, kind: MouseKind, x: u16, y: u16) -> Cmd<ReviewMsg> {
        if self.pending_delete.is_some() {
            return Cmd::none();
        }
        // While a modal is up, a click outside it closes the topmost
        // surface, like clicking the dimmed backdrop.
        if let Some(surface) = self.overlays.topmost() {
            if kind == MouseKind::LeftClick {
                let inside = self
                    .last_modal_area
                    .borrow()
                    .is_some_and(|rect| rect.contains(x, y));
                if !inside {
                    return Cmd::msg(ReviewMsg::OverlayClosed(surface));
                }
            }
            if surface == Surface::Analysis {
                match kind {
                    MouseKind::ScrollUp => {
                        self.analysis_scroll = self.analysis_scroll.saturating_sub(3);
                    }
                    MouseKind::ScrollDown => {
                        self.analysis_scroll = self.analysis_scroll.saturating_add(3);
                    }
                    _ => {}
                }
            }
            return Cmd::none();
        }

        // An active drag session consumes motion until release.
        if kind == MouseKind::LeftDrag && self.layout.dragging() {
            self.layout.drag_to(x);
            return Cmd::none();
        }
        if kind == MouseKind::LeftRelease {
            if self.layout.dragging() {
                self.layout.end_drag();
                self.persist();
            }
            return Cmd::none();
        }

        match (kind, self.hit_test(x, y)) {
            (MouseKind::LeftClick, HitRegion::SplitHandleSidebar) => {
                self.layout.begin_drag(PaneSide::Sidebar, x);
                Cmd::none()
            }
            (MouseKind::LeftClick, HitRegion::SplitHandleRight) => {
                self.layout.begin_drag(PaneSide::Right, x);
                Cmd::none()
            }
            (MouseKind::LeftClick, HitRegion::SidebarNav { row_idx }) => match row_idx {
                0 => Cmd::msg(ReviewMsg::ViewSelected(ActiveView::Comparator)),
                1 => Cmd::msg(ReviewMsg::ViewSelected(ActiveView::Reports)),
                2 => Cmd::msg(ReviewMsg::ViewSelected(ActiveView::Settings)),
                _ => Cmd::msg(ReviewMsg::SummaryOpened),
            },
            (MouseKind::LeftClick, HitRegion::TableRow { item_idx }) => {
                let row_count = self.comparison.as_ref().map_or(0, |c| c.rows.len());
                if item_idx < row_count {
                    Cmd::msg(ReviewMsg::RowSelected(item_idx))
                } else {
                    Cmd::none()
                }
            }
            (MouseKind::LeftClick, HitRegion::ReportRow { item_idx }) => {
                if item_idx < self.reports.len() {
                    self.reports_selection = item_idx;
                }
                Cmd::none()
            }
            (MouseKind::ScrollUp, HitRegion::TableRow { .. }) => self.on_vertical_move(-3),
            (MouseKind::ScrollDown, HitRegion::TableRow { .. }) => self.on_vertical_move(3),
            (MouseKind::ScrollUp, HitRegion::ReportRow { .. }) => self.on_vertical_move(-1),
            (MouseKind::ScrollDown, HitRegion::ReportRow { .. }) => self.on_vertical_move(1),
            (MouseKind::ScrollUp, HitRegion::Detail) => {
                self.detail_scroll = self.detail_scroll.saturating_sub(3);
                Cmd::none()
            }
            (MouseKind::ScrollDown, HitRegion::Detail) => {
                self.detail_scroll = self.detail_scroll.saturating_add(3);
                Cmd::none()
            }
            _ => Cmd::none(),
        }
    }
}

// =========================================================================
// ftui::Model implementation
// =========================================================================

impl Model for ReviewApp {
    type Message = ReviewMsg;

    fn init(&mut self) -> Cmd<ReviewMsg> {
        Cmd::none()
    }

    fn update(&mut self, msg: ReviewMsg) -> Cmd<ReviewMsg> {
        match msg {
            ReviewMsg::Tick => {
                self.toasts.tick();
                Cmd::none()
            }
            ReviewMsg::Resized { .. } => Cmd::none(),
            ReviewMsg::QuitRequested | ReviewMsg::ForceQuit => Cmd::quit(),

            // -- Input routing -------------------------------------------
            ReviewMsg::KeyEscape => self.on_escape(),
            ReviewMsg::KeyChar(c) => self.on_char(c),
            ReviewMsg::KeyEnter => {
                if self.pending_delete.is_some() {
                    return Cmd::msg(ReviewMsg::DeleteConfirmed);
                }
                if self.overlays.topmost().is_some() {
                    return Cmd::none();
                }
                match self.view {
                    ActiveView::Comparator if self.form_focus.is_some() => {
                        Cmd::msg(ReviewMsg::CompareRequested)
                    }
                    ActiveView::Reports => Cmd::msg(ReviewMsg::VisualsRequested),
                    _ => Cmd::none(),
                }
            }
            ReviewMsg::KeyTab => {
                if self.view == ActiveView::Comparator && self.overlays.topmost().is_none() {
                    self.form_focus = match self.form_focus {
                        Some(FormField::SchemaUrl) => Some(FormField::RequirementsPath),
                        Some(FormField::RequirementsPath) => None,
                        None => Some(FormField::SchemaUrl),
                    };
                }
                Cmd::none()
            }
            ReviewMsg::KeyBackspace => {
                if self.view == ActiveView::Comparator
                    && self.overlays.topmost().is_none()
                    && let Some(field) = self.form_focus
                {
                    match field {
                        FormField::SchemaUrl => {
                            self.schema_url.pop();
                        }
                        FormField::RequirementsPath => {
                            self.requirements_path.pop();
                        }
                    }
                }
                Cmd::none()
            }
            ReviewMsg::MoveUp => self.on_vertical_move(-1),
            ReviewMsg::MoveDown => self.on_vertical_move(1),
            ReviewMsg::PageUp => self.on_vertical_move(-10),
            ReviewMsg::PageDown => self.on_vertical_move(10),
            ReviewMsg::Mouse { kind, x, y } => self.on_mouse(kind, x, y),

            // -- Workspace shell -----------------------------------------
            ReviewMsg::ViewSelected(view) => {
                // Pure transition: the held comparison survives the switch.
                let entering_reports = view == ActiveView::Reports && self.view != view;
                self.view = view;
                self.persist();
                if entering_reports {
                    Cmd::msg(ReviewMsg::ReportsRequested)
                } else {
                    Cmd::none()
                }
            }
            ReviewMsg::SidebarToggled => {
                self.sidebar_visible = !self.sidebar_visible;
                Cmd::none()
            }

            // -- Comparator ----------------------------------------------
            ReviewMsg::CompareRequested => self.dispatch_compare(),
            ReviewMsg::CompareCompleted(result) => {
                self.compare_loading = false;
                self.status.clear();
                if !result.counts.partitions(result.rows.len()) {
                    warn!(
                        total = result.counts.total(),
                        rows = result.rows.len(),
                        "comparison counts do not partition the row set"
                    );
                }
                self.comparison = Some(*result);
                self.selected_row = None;
                self.row_detail = None;
                self.form_focus = None;
                self.toasts.success("Comparison finished");
                Cmd::none()
            }
            ReviewMsg::CompareFailed(message) => {
                self.compare_loading = false;
                self.status.clear();
                self.toasts.error(message);
                Cmd::none()
            }
            ReviewMsg::RowSelected(idx) => {
                self.select_row(idx);
                Cmd::none()
            }
            ReviewMsg::CopyExpected => {
                if let Some(detail) = self.row_detail.as_ref() {
                    let text = detail.expected.clone();
                    self.copy_with_notice(&text, "expected JSON");
                }
                Cmd::none()
            }
            ReviewMsg::CopyImplemented => {
                if let Some(detail) = self.row_detail.as_ref() {
                    let text = detail.implemented.clone();
                    self.copy_with_notice(&text, "implemented snippet");
                }
                Cmd::none()
            }

            // -- Summary surface -----------------------------------------
            ReviewMsg::SummaryOpened => self.open_summary(),
            ReviewMsg::SummaryVisualsLoaded(images) => {
                self.summary_visuals_loading = false;
                self.summary_visuals = Some(images);
                Cmd::none()
            }

            // -- Report operations ---------------------------------------
            ReviewMsg::ReportsRequested => self.dispatch_list(),
            ReviewMsg::ReportsLoaded(reports) => {
                self.reports_loading = false;
                self.reports = reports;
                if self.reports_selection >= self.reports.len() {
                    self.reports_selection = self.reports.len().saturating_sub(1);
                }
                Cmd::none()
            }
            ReviewMsg::ReportsFailed(message) => {
                // List failures leave the collection untouched; log only.
                self.reports_loading = false;
                warn!("listing reports failed: {message}");
                self.reports_error = Some(message);
                Cmd::none()
            }
            ReviewMsg::VisualsRequested => self.dispatch_visuals(),
            ReviewMsg::VisualsLoaded { path, images } => {
                self.visuals_loading = false;
                if self.visuals_for.as_ref().is_some_and(|r| r.path == path) {
                    // Empty is a valid outcome; the surface opens either way.
                    self.visuals = Some(images);
                    self.overlays.open(Surface::Visuals);
                }
                Cmd::none()
            }
            ReviewMsg::VisualsFailed { path, message } => {
                self.visuals_loading = false;
                warn!("visuals fetch for {path} failed: {message}");
                self.visuals_error = Some(message);
                self.toasts.error("Failed to load visuals");
                Cmd::none()
            }
            ReviewMsg::AnalyzeRequested => self.dispatch_analyze(),
            ReviewMsg::AnalysisCompleted { seq, result } => {
                if seq != self.analysis_seq {
                    debug!(seq, current = self.analysis_seq, "dropping stale analysis");
                    return Cmd::none();
                }
                self.analysis_loading = false;
                self.analysis = Some(*result);
                self.analysis_scroll = 0;
                self.overlays.open(Surface::Analysis);
                Cmd::none()
            }
            ReviewMsg::AnalysisFailed { seq, message } => {
                if seq != self.analysis_seq {
                    debug!(
                        seq,
                        current = self.analysis_seq,
                        "dropping stale analysis error"
                    );
                    return Cmd::none();
                }
                // The surface stays closed; no stale content is shown.
                self.analysis_loading = false;
                self.analysis_error = Some(message.clone());
                self.toasts.error(message);
                Cmd::none()
            }
            ReviewMsg::DeleteRequested => {
                // Confirmation gate: nothing is dispatched here.
                self.pending_delete = self.selected_report().cloned();
                Cmd::none()
            }
            ReviewMsg::DeleteConfirmed => self.dispatch_delete(),
            ReviewMsg::DeleteCancelled => {
                self.pending_delete = None;
                Cmd::none()
            }
            ReviewMsg::DeleteCompleted => {
                self.delete_loading = false;
                self.toasts.success("Report deleted");
                // Refetch rather than optimistically removing the entry.
                Cmd::msg(ReviewMsg::ReportsRequested)
            }
            ReviewMsg::DeleteFailed(message) => {
                self.delete_loading = false;
                self.delete_error = Some(message.clone());
                self.toasts.error(message);
                Cmd::none()
            }
            ReviewMsg::CopyDownloadUrl => {
                if let (Some(report), Some(api)) = (self.selected_report(), self.api.as_ref()) {
                    let url = api.download_url(&report.path);
                    self.copy_with_notice(&url, "download link");
                }
                Cmd::none()
            }

            // -- Overlays ------------------------------------------------
            ReviewMsg::OverlayClosed(surface) => {
                self.overlays.close(surface);
                // Surface-scoped payloads are transient.
                match surface {
                    Surface::Summary => {
                        self.summary_visuals = None;
                        self.summary_visuals_loading = false;
                    }
                    Surface::Visuals => self.visuals = None,
                    Surface::Analysis => self.analysis = None,
                }
                Cmd::none()
            }
            ReviewMsg::FullscreenToggled(surface) => {
                self.overlays.toggle_fullscreen(surface);
                Cmd::none()
            }
            ReviewMsg::FullscreenChanged(target) => {
                self.overlays.reconcile(target);
                Cmd::none()
            }
            ReviewMsg::CopyAnalysisText => {
                if let Some(analysis) = self.analysis.as_ref() {
                    let text = analysis.analysis.clone();
                    self.copy_with_notice(&text, "analysis");
                }
                Cmd::none()
            }
            ReviewMsg::CopyAnalysisJson => {
                if let Some(structured) =
                    self.analysis.as_ref().and_then(|a| a.structured.as_ref())
                {
                    match serde_json::to_string_pretty(structured) {
                        Ok(json) => self.copy_with_notice(&json, "structured JSON"),
                        Err(e) => self.toasts.error(format!("Copy failed: {e}")),
                    }
                }
                Cmd::none()
            }
        }
    }

    fn view(&self, frame: &mut Frame) {
        let area = Rect::from_size(frame.buffer.width(), frame.buffer.height());
        if area.is_empty() {
            return;
        }

        // Reset hit regions; render repopulates whichever apply.
        *self.last_sidebar_handle.borrow_mut() = None;
        *self.last_right_handle.borrow_mut() = None;
        self.last_sidebar_nav_rows.borrow_mut().clear();
        *self.last_table_inner.borrow_mut() = None;
        *self.last_reports_inner.borrow_mut() = None;
        *self.last_detail_area.borrow_mut() = None;
        *self.last_modal_area.borrow_mut() = None;

        let vertical = Flex::vertical()
            .constraints([
                Constraint::Fixed(1), // Topbar
                Constraint::Min(4),   // Workspace
                Constraint::Fixed(1), // Status footer
            ])
            .split(area);

        self.render_topbar(frame, vertical[0]);

        // ── Horizontal arrangement: sidebar | handle | main ─────────────
        let content = vertical[1];
        let mut main = content;
        if self.sidebar_visible && content.width > self.layout.sidebar_width + 10 {
            let sidebar = Rect::new(
                content.x,
                content.y,
                self.layout.sidebar_width,
                content.height,
            );
            let handle = Rect::new(content.x + sidebar.width, content.y, 1, content.height);
            *self.last_sidebar_handle.borrow_mut() = Some(handle);
            main = Rect::new(
                handle.x + 1,
                content.y,
                content.width - sidebar.width - 1,
                content.height,
            );
            self.render_sidebar(frame, sidebar);
            self.render_handle(frame, handle);
        }

        match self.view {
            ActiveView::Comparator => self.render_comparator(frame, main),
            ActiveView::Reports => self.render_reports(frame, main),
            ActiveView::Settings => self.render_settings(frame, main),
        }

        self.render_status_footer(frame, vertical[2]);

        // ── Overlays (topmost last) ─────────────────────────────────────
        if self.overlays.is_open(Surface::Summary) {
            self.render_summary_overlay(frame, area);
        }
        if self.overlays.is_open(Surface::Visuals) {
            self.render_visuals_overlay(frame, area);
        }
        if self.overlays.is_open(Surface::Analysis) {
            self.render_analysis_overlay(frame, area);
        }
        if self.pending_delete.is_some() {
            self.render_delete_confirm(frame, area);
        }

        self.toasts.render(frame, vertical[1], &self.palette);
    }
}

// =========================================================================
// Rendering
// =========================================================================

/// Pad or truncate to exactly `width` characters.
fn pad(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    while out.chars().count() < width {
        out.push(' ');
    }
    out
}

impl ReviewApp {
    fn render_topbar(&self, frame: &mut Frame, area: Rect) {
        let sidebar_marker = if self.sidebar_visible {
            "\u{27e8}"
        } else {
            "\u{27e9}"
        };
        let server = self
            .api
            .as_ref()
            .map(|api| api.base().to_string())
            .unwrap_or_default();
        let line = Line::from_spans(vec![
            Span::styled(format!(" {sidebar_marker} "), self.palette.muted_style()),
            Span::styled("reqlens".to_string(), self.palette.title()),
            Span::styled(format!("  {}", self.view.label()), self.palette.text_style()),
            Span::styled(format!("  {server}"), self.palette.muted_style()),
        ]);
        Paragraph::new(Text::from_lines(vec![line])).render(area, frame);
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect) {
        let block = Block::new()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("Navigation")
            .title_alignment(Alignment::Left)
            .style(self.palette.pane(false));
        let inner = block.inner(area);
        block.render(area, frame);
        if inner.is_empty() {
            return;
        }

        let views = [
            ActiveView::Comparator,
            ActiveView::Reports,
            ActiveView::Settings,
        ];
        let mut nav_rows = self.last_sidebar_nav_rows.borrow_mut();
        let mut y = inner.y;
        for (idx, view) in views.iter().enumerate() {
            if y >= inner.y + inner.height {
                return;
            }
            let row_area = Rect::new(inner.x, y, inner.width, 1);
            nav_rows.push((row_area, idx));
            let marker = if self.view == *view {
                "\u{25b8} "
            } else {
                "  "
            };
            let style = if self.view == *view {
                self.palette.title()
            } else {
                self.palette.text_style()
            };
            Paragraph::new(&*format!("{marker}{} [{}]", view.label(), idx + 1))
                .style(style)
                .render(row_area, frame);
            y += 1;
        }

        if y < inner.y + inner.height {
            let row_area = Rect::new(inner.x, y, inner.width, 1);
            nav_rows.push((row_area, SIDEBAR_NAV_ROWS - 1));
            Paragraph::new("  Show summary [s]")
                .style(self.palette.text_style())
                .render(row_area, frame);
            y += 2;
        }
        drop(nav_rows);

        // Mini summary of the held comparison, if any.
        if let Some(result) = &self.comparison {
            let counts = result.counts;
            let rows = [
                ("MATCHED", counts.matched, StatusKind::Matched),
                ("MISMATCH", counts.mismatch, StatusKind::Mismatch),
                ("MISSING", counts.missing, StatusKind::Missing),
                (
                    "POSSIBLE_MATCH",
                    counts.possible_match,
                    StatusKind::PossibleMatch,
                ),
            ];
            for (label, count, status) in rows {
                if y >= inner.y + inner.height {
                    return;
                }
                let row_area = Rect::new(inner.x, y, inner.width, 1);
                Paragraph::new(Text::from_lines(vec![Line::from_spans(vec![
                    Span::styled(format!("{label}: "), self.palette.muted_style()),
                    Span::styled(count.to_string(), self.palette.status_style(status)),
                ])]))
                .render(row_area, frame);
                y += 1;
            }
        } else if y < inner.y + inner.height {
            Paragraph::new("No data yet")
                .style(self.palette.muted_style())
                .render(Rect::new(inner.x, y, inner.width, 1), frame);
            y += 1;
        }

        let version_y = inner.y + inner.height.saturating_sub(1);
        if version_y > y {
            Paragraph::new(concat!("v", env!("CARGO_PKG_VERSION")))
                .style(self.palette.muted_style())
                .render(Rect::new(inner.x, version_y, inner.width, 1), frame);
        }
    }

    fn render_handle(&self, frame: &mut Frame, area: Rect) {
        for y in area.y..area.y + area.height {
            Paragraph::new("\u{2502}")
                .style(self.palette.muted_style())
                .render(Rect::new(area.x, y, 1, 1), frame);
        }
    }

    fn render_comparator(&self, frame: &mut Frame, area: Rect) {
        // Right detail pane splits off first; the rest is form + table.
        let mut center = area;
        if area.width > self.layout.right_width + 20 {
            let right = Rect::new(
                area.x + area.width - self.layout.right_width,
                area.y,
                self.layout.right_width,
                area.height,
            );
            let handle = Rect::new(right.x - 1, area.y, 1, area.height);
            *self.last_right_handle.borrow_mut() = Some(handle);
            center = Rect::new(area.x, area.y, area.width - right.width - 1, area.height);
            self.render_handle(frame, handle);
            self.render_detail_pane(frame, right);
        }

        let vertical = Flex::vertical()
            .constraints([
                Constraint::Fixed(4), // Compare form
                Constraint::Min(3),   // Results table
            ])
            .split(center);

        self.render_compare_form(frame, vertical[0]);
        self.render_results_table(frame, vertical[1]);
    }

    fn render_compare_form(&self, frame: &mut Frame, area: Rect) {
        let block = Block::new()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("Compare")
            .title_alignment(Alignment::Left)
            .style(self.palette.pane(self.form_focus.is_some()));
        let inner = block.inner(area);
        block.render(area, frame);
        if inner.is_empty() {
            return;
        }

        let field_line = |label: &str, value: &str, focused: bool| {
            let cursor = if focused { "\u{2502}" } else { "" };
            Line::from_spans(vec![
                Span::styled(format!("{label:<14}"), self.palette.muted_style()),
                Span::styled(
                    format!("{value}{cursor}"),
                    if focused {
                        self.palette.title()
                    } else {
                        self.palette.text_style()
                    },
                ),
            ])
        };
        let schema_focused = self.form_focus == Some(FormField::SchemaUrl);
        let file_focused = self.form_focus == Some(FormField::RequirementsPath);
        let file_display = if self.requirements_path.is_empty() && !file_focused {
            "No file chosen".to_string()
        } else {
            self.requirements_path.clone()
        };
        let lines = vec![
            field_line("Schema URL", &self.schema_url, schema_focused),
            field_line("Requirements", &file_display, file_focused),
        ];
        Paragraph::new(Text::from_lines(lines)).render(inner, frame);
    }

    fn render_results_table(&self, frame: &mut Frame, area: Rect) {
        let block = Block::new()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("Results")
            .title_alignment(Alignment::Left)
            .style(self.palette.pane(self.form_focus.is_none()));
        let inner = block.inner(area);
        block.render(area, frame);
        if inner.is_empty() {
            return;
        }

        let Some(result) = &self.comparison else {
            let hint = if self.compare_loading {
                "Running\u{2026}"
            } else {
                "Run a comparison to see rows here."
            };
            Paragraph::new(hint)
                .style(self.palette.muted_style())
                .render(inner, frame);
            return;
        };

        // Header row, then one line per comparison row.
        let header = Rect::new(inner.x, inner.y, inner.width, 1);
        let id_w = 10usize;
        let status_w = 16usize;
        let field_w = (inner.width as usize)
            .saturating_sub(id_w + status_w + 8)
            .clamp(8, 28);
        Paragraph::new(&*format!(
            "{} {} {} best",
            pad("req_id", id_w),
            pad("field_key", field_w),
            pad("status", status_w),
        ))
        .style(self.palette.muted_style())
        .render(header, frame);

        let body = Rect::new(
            inner.x,
            inner.y + 1,
            inner.width,
            inner.height.saturating_sub(1),
        );
        *self.last_table_inner.borrow_mut() = Some(body);

        let visible = body.height as usize;
        if visible == 0 || result.rows.is_empty() {
            return;
        }
        // Keep the selection in the viewport.
        let mut scroll = self.table_scroll.get().min(result.rows.len() - 1);
        if let Some(selected) = self.selected_row {
            if selected < scroll {
                scroll = selected;
            } else if selected >= scroll + visible {
                scroll = selected + 1 - visible;
            }
        }
        self.table_scroll.set(scroll);

        for (offset, (idx, row)) in result
            .rows
            .iter()
            .enumerate()
            .skip(scroll)
            .take(visible)
            .enumerate()
        {
            let y = body.y + offset as u16;
            let row_area = Rect::new(body.x, y, body.width, 1);
            let selected = self.selected_row == Some(idx);
            let base = if selected {
                self.palette.selected_row()
            } else {
                self.palette.text_style()
            };
            let line = Line::from_spans(vec![
                Span::styled(pad(&row.req_id, id_w), self.palette.muted_style()),
                Span::styled(format!("{} ", pad(&row.field_key, field_w)), base),
                Span::styled(
                    pad(row.status.label(), status_w),
                    self.palette.status_style(row.status),
                ),
                Span::styled(
                    row.best_match_display().to_string(),
                    self.palette.muted_style(),
                ),
            ]);
            Paragraph::new(Text::from_lines(vec![line])).render(row_area, frame);
        }
    }

    fn render_detail_pane(&self, frame: &mut Frame, area: Rect) {
        let block = Block::new()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("Details")
            .title_alignment(Alignment::Left)
            .style(self.palette.pane(false));
        let inner = block.inner(area);
        block.render(area, frame);
        *self.last_detail_area.borrow_mut() = Some(area);
        if inner.is_empty() {
            return;
        }

        let Some(detail) = &self.row_detail else {
            Paragraph::new("Select a row to view details.")
                .style(self.palette.muted_style())
                .render(inner, frame);
            return;
        };

        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from_spans(vec![Span::styled(
            detail.field_key.clone(),
            self.palette.title(),
        )]));
        lines.push(Line::from_spans(vec![
            Span::styled("Status: ".to_string(), self.palette.muted_style()),
            Span::styled(
                detail.status.label().to_string(),
                self.palette.status_style(detail.status),
            ),
            Span::styled(
                format!(" \u{2022} Best: {}", detail.best_match),
                self.palette.muted_style(),
            ),
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from_spans(vec![Span::styled(
            "Expected [e to copy]".to_string(),
            self.palette.title(),
        )]));
        for text_line in detail.expected.lines() {
            lines.push(Line::from_spans(vec![Span::styled(
                text_line.to_string(),
                self.palette.text_style(),
            )]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from_spans(vec![Span::styled(
            "Implemented (schema) [i to copy]".to_string(),
            self.palette.title(),
        )]));
        for text_line in detail.implemented.lines() {
            lines.push(Line::from_spans(vec![Span::styled(
                text_line.to_string(),
                self.palette.text_style(),
            )]));
        }

        let scroll = (self.detail_scroll as usize).min(lines.len().saturating_sub(1));
        let visible: Vec<Line> = lines
            .into_iter()
            .skip(scroll)
            .take(inner.height as usize)
            .collect();
        Paragraph::new(Text::from_lines(visible)).render(inner, frame);
    }

    fn render_reports(&self, frame: &mut Frame, area: Rect) {
        let block = Block::new()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("Reports")
            .title_alignment(Alignment::Left)
            .style(self.palette.pane(true));
        let inner = block.inner(area);
        block.render(area, frame);
        if inner.is_empty() {
            return;
        }

        if self.reports_loading && self.reports.is_empty() {
            Paragraph::new("Loading\u{2026}")
                .style(self.palette.muted_style())
                .render(inner, frame);
            return;
        }
        if self.reports.is_empty() {
            Paragraph::new("No reports available")
                .style(self.palette.muted_style())
                .render(inner, frame);
            return;
        }

        *self.last_reports_inner.borrow_mut() = Some(inner);

        // Two lines per report: name, then modified/size metadata.
        let visible = (inner.height as usize) / 2;
        if visible == 0 {
            return;
        }
        let mut scroll = self.reports_scroll.get().min(self.reports.len() - 1);
        if self.reports_selection < scroll {
            scroll = self.reports_selection;
        } else if self.reports_selection >= scroll + visible {
            scroll = self.reports_selection + 1 - visible;
        }
        self.reports_scroll.set(scroll);

        for (offset, (idx, report)) in self
            .reports
            .iter()
            .enumerate()
            .skip(scroll)
            .take(visible)
            .enumerate()
        {
            let y = inner.y + (offset * 2) as u16;
            let selected = idx == self.reports_selection;
            let marker = if selected { "\u{25b8} " } else { "  " };
            let name_style = if selected {
                self.palette.selected_row()
            } else {
                self.palette.text_style()
            };
            Paragraph::new(&*format!("{marker}{}", report.name))
                .style(name_style)
                .render(Rect::new(inner.x, y, inner.width, 1), frame);
            if y + 1 < inner.y + inner.height {
                Paragraph::new(&*format!("  {}", report.meta_line()))
                    .style(self.palette.muted_style())
                    .render(Rect::new(inner.x, y + 1, inner.width, 1), frame);
            }
        }
    }

    fn render_settings(&self, frame: &mut Frame, area: Rect) {
        let block = Block::new()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("Settings")
            .title_alignment(Alignment::Left)
            .style(self.palette.pane(false));
        let inner = block.inner(area);
        block.render(area, frame);
        if inner.is_empty() {
            return;
        }
        Paragraph::new("No settings yet.")
            .style(self.palette.muted_style())
            .render(inner, frame);
    }

    fn render_status_footer(&self, frame: &mut Frame, area: Rect) {
        let mut busy = Vec::new();
        if self.compare_loading {
            busy.push("comparing");
        }
        if self.reports_loading {
            busy.push("loading reports");
        }
        if self.visuals_loading || self.summary_visuals_loading {
            busy.push("fetching visuals");
        }
        if self.analysis_loading {
            busy.push("generating analysis");
        }
        if self.delete_loading {
            busy.push("deleting");
        }
        let busy_tag = if busy.is_empty() {
            String::new()
        } else {
            format!(" | {}\u{2026}", busy.join(", "))
        };
        let line = if !self.status.is_empty() {
            format!(" {}{busy_tag}", self.status)
        } else {
            let hints = match self.view {
                ActiveView::Comparator => {
                    "Tab=fields Enter=compare j/k=rows e/i=copy s=summary 1/2/3=view q=quit"
                }
                ActiveView::Reports => {
                    "j/k=select v=visuals a=analyze d=delete x=copy link r=refresh q=quit"
                }
                ActiveView::Settings => "1/2/3=view q=quit",
            };
            format!(" {hints}{busy_tag}")
        };
        Paragraph::new(&*line)
            .style(self.palette.muted_style())
            .render(area, frame);
    }

    // ---------------------------------------------------------------------
    // Overlays
    // ---------------------------------------------------------------------

    /// Popup rect for a surface: centered at the given fraction, or the
    /// whole area when the surface owns fullscreen.
    fn modal_rect(&self, surface: Surface, area: Rect, pct_w: u32, pct_h: u32) -> Rect {
        if self.overlays.is_fullscreen(surface) {
            return area;
        }
        let popup_w = ((area.width as u32 * pct_w) / 100).min(area.width as u32) as u16;
        let popup_h = ((area.height as u32 * pct_h) / 100).min(area.height as u32) as u16;
        let popup_x = area.x + (area.width.saturating_sub(popup_w)) / 2;
        let popup_y = area.y + (area.height.saturating_sub(popup_h)) / 2;
        Rect::new(popup_x, popup_y, popup_w, popup_h)
    }

    fn modal_frame(&self, frame: &mut Frame, surface: Surface, popup: Rect, title: &str) -> Rect {
        *self.last_modal_area.borrow_mut() = Some(popup);
        Block::new()
            .style(self.palette.text_style())
            .render(popup, frame);
        let fs_hint = if self.overlays.is_fullscreen(surface) {
            "f=exit fullscreen"
        } else {
            "f=fullscreen"
        };
        let full_title = format!("{title} \u{2014} {fs_hint} Esc=close");
        let outer = Block::new()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(&full_title)
            .title_alignment(Alignment::Left)
            .style(self.palette.pane(true));
        let inner = outer.inner(popup);
        outer.render(popup, frame);
        inner
    }

    fn render_summary_overlay(&self, frame: &mut Frame, area: Rect) {
        let popup = self.modal_rect(Surface::Summary, area, 70, 80);
        if popup.width < 24 || popup.height < 8 {
            return;
        }
        let inner = self.modal_frame(frame, Surface::Summary, popup, Surface::Summary.title());
        if inner.is_empty() {
            return;
        }

        let mut lines: Vec<Line> = Vec::new();
        match &self.comparison {
            Some(result) => {
                lines.push(Line::from_spans(vec![Span::styled(
                    "Counts".to_string(),
                    self.palette.title(),
                )]));
                for status in [
                    StatusKind::Matched,
                    StatusKind::Mismatch,
                    StatusKind::Missing,
                    StatusKind::PossibleMatch,
                ] {
                    let count = result.counts.get(status);
                    let pct = result.counts.percent(status);
                    let filled = (SUMMARY_BAR_WIDTH * pct as usize) / 100;
                    let bar: String = "\u{2588}".repeat(filled)
                        + &"\u{2500}".repeat(SUMMARY_BAR_WIDTH - filled);
                    lines.push(Line::from_spans(vec![
                        Span::styled(pad(status.label(), 16), self.palette.status_style(status)),
                        Span::styled(format!("{count:>4} "), self.palette.text_style()),
                        Span::styled(format!("({pct:>3}%) "), self.palette.muted_style()),
                        Span::styled(bar, self.palette.status_style(status)),
                    ]));
                }
                lines.push(Line::from(""));
                lines.push(Line::from_spans(vec![Span::styled(
                    "Report".to_string(),
                    self.palette.title(),
                )]));
                match &result.report {
                    Some(report) => lines.push(Line::from_spans(vec![Span::styled(
                        report.url.clone(),
                        self.palette.text_style(),
                    )])),
                    None => lines.push(Line::from_spans(vec![Span::styled(
                        "No report".to_string(),
                        self.palette.muted_style(),
                    )])),
                }
                lines.push(Line::from(""));
                lines.push(Line::from_spans(vec![Span::styled(
                    "Top rows".to_string(),
                    self.palette.title(),
                )]));
                for row in result.rows.iter().take(SUMMARY_TOP_ROWS) {
                    lines.push(Line::from_spans(vec![
                        Span::styled(
                            format!("{} ", pad(&row.field_key, 24)),
                            self.palette.text_style(),
                        ),
                        Span::styled(
                            pad(row.status.label(), 16),
                            self.palette.status_style(row.status),
                        ),
                        Span::styled(
                            format!("best: {}", row.best_match_display()),
                            self.palette.muted_style(),
                        ),
                    ]));
                }
            }
            None => lines.push(Line::from_spans(vec![Span::styled(
                "No summary yet".to_string(),
                self.palette.muted_style(),
            )])),
        }

        lines.push(Line::from(""));
        lines.push(Line::from_spans(vec![Span::styled(
            "Visuals".to_string(),
            self.palette.title(),
        )]));
        if self.summary_visuals_loading {
            lines.push(Line::from_spans(vec![Span::styled(
                "Generating visuals\u{2026}".to_string(),
                self.palette.muted_style(),
            )]));
        } else {
            match &self.summary_visuals {
                Some(images) if images.is_empty() => {
                    lines.push(Line::from_spans(vec![Span::styled(
                        "No visuals available".to_string(),
                        self.palette.muted_style(),
                    )]));
                }
                Some(images) => {
                    for url in images {
                        lines.push(Line::from_spans(vec![Span::styled(
                            url.clone(),
                            self.palette.text_style(),
                        )]));
                    }
                }
                None => {}
            }
        }

        let visible: Vec<Line> = lines.into_iter().take(inner.height as usize).collect();
        Paragraph::new(Text::from_lines(visible)).render(inner, frame);
    }

    fn render_visuals_overlay(&self, frame: &mut Frame, area: Rect) {
        let popup = self.modal_rect(Surface::Visuals, area, 70, 60);
        if popup.width < 24 || popup.height < 6 {
            return;
        }
        let name = self
            .visuals_for
            .as_ref()
            .map(|r| r.name.as_str())
            .unwrap_or("report");
        let title = format!("{name} \u{2014} {}", Surface::Visuals.title());
        let inner = self.modal_frame(frame, Surface::Visuals, popup, &title);
        if inner.is_empty() {
            return;
        }

        let mut lines: Vec<Line> = Vec::new();
        match &self.visuals {
            Some(images) if images.is_empty() => {
                lines.push(Line::from_spans(vec![Span::styled(
                    "No visuals available".to_string(),
                    self.palette.muted_style(),
                )]));
            }
            Some(images) => {
                for url in images {
                    lines.push(Line::from_spans(vec![Span::styled(
                        url.clone(),
                        self.palette.text_style(),
                    )]));
                }
            }
            None => {
                lines.push(Line::from_spans(vec![Span::styled(
                    "Loading\u{2026}".to_string(),
                    self.palette.muted_style(),
                )]));
            }
        }
        let visible: Vec<Line> = lines.into_iter().take(inner.height as usize).collect();
        Paragraph::new(Text::from_lines(visible)).render(inner, frame);
    }

    fn render_analysis_overlay(&self, frame: &mut Frame, area: Rect) {
        let popup = self.modal_rect(Surface::Analysis, area, 80, 80);
        if popup.width < 24 || popup.height < 6 {
            return;
        }
        let name = self
            .analysis_for
            .as_ref()
            .map(|r| r.name.as_str())
            .unwrap_or("report");
        let title = format!("{name} \u{2014} {}", Surface::Analysis.title());
        let inner = self.modal_frame(frame, Surface::Analysis, popup, &title);
        if inner.is_empty() {
            return;
        }

        let Some(analysis) = &self.analysis else {
            Paragraph::new("No analysis available")
                .style(self.palette.muted_style())
                .render(inner, frame);
            return;
        };

        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from_spans(vec![Span::styled(
            "c=copy analysis  x=copy JSON  \u{2191}/\u{2193}=scroll".to_string(),
            self.palette.muted_style(),
        )]));
        lines.push(Line::from(""));
        if let Some(structured) = &analysis.structured {
            lines.push(Line::from_spans(vec![Span::styled(
                "Structured result".to_string(),
                self.palette.title(),
            )]));
            if let Ok(pretty) = serde_json::to_string_pretty(structured) {
                for text_line in pretty.lines() {
                    lines.push(Line::from_spans(vec![Span::styled(
                        text_line.to_string(),
                        self.palette.muted_style(),
                    )]));
                }
            }
            if !structured.examples.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from_spans(vec![Span::styled(
                    "Top mismatches (examples)".to_string(),
                    self.palette.title(),
                )]));
                for example in structured.examples.iter().take(ANALYSIS_EXAMPLE_CAP) {
                    lines.push(Line::from_spans(vec![Span::styled(
                        format!(
                            "{} {} {}",
                            example.req_id.as_deref().unwrap_or("-"),
                            example.field_key.as_deref().unwrap_or("-"),
                            example.status.as_deref().unwrap_or("-"),
                        ),
                        self.palette.text_style(),
                    )]));
                    if let Some(snippet) = &example.raw_snippet {
                        let mut preview: String = snippet.chars().take(400).collect();
                        preview.retain(|c| c != '\n');
                        lines.push(Line::from_spans(vec![Span::styled(
                            format!("  {preview}"),
                            self.palette.muted_style(),
                        )]));
                    }
                }
            }
            lines.push(Line::from(""));
        }
        for text_line in analysis.analysis.lines() {
            lines.push(Line::from_spans(vec![Span::styled(
                text_line.to_string(),
                self.palette.text_style(),
            )]));
        }

        let scroll = (self.analysis_scroll as usize).min(lines.len().saturating_sub(1));
        let visible: Vec<Line> = lines
            .into_iter()
            .skip(scroll)
            .take(inner.height as usize)
            .collect();
        Paragraph::new(Text::from_lines(visible)).render(inner, frame);
    }

    fn render_delete_confirm(&self, frame: &mut Frame, area: Rect) {
        let Some(report) = &self.pending_delete else {
            return;
        };
        let popup_w = 50u16.min(area.width.saturating_sub(2));
        let popup_h = 5u16.min(area.height);
        if popup_w < 20 || popup_h < 4 {
            return;
        }
        let popup = Rect::new(
            area.x + (area.width.saturating_sub(popup_w)) / 2,
            area.y + (area.height.saturating_sub(popup_h)) / 2,
            popup_w,
            popup_h,
        );
        Block::new()
            .style(self.palette.text_style())
            .render(popup, frame);
        let outer = Block::new()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("Confirm delete")
            .title_alignment(Alignment::Left)
            .style(self.palette.danger());
        let inner = outer.inner(popup);
        outer.render(popup, frame);
        if inner.is_empty() {
            return;
        }
        let lines = vec![
            Line::from_spans(vec![Span::styled(
                format!("Delete {}?", report.name),
                self.palette.text_style(),
            )]),
            Line::from_spans(vec![Span::styled(
                "y = delete   n/Esc = keep".to_string(),
                self.palette.muted_style(),
            )]),
        ];
        Paragraph::new(Text::from_lines(lines)).render(inner, frame);
    }
}

// =========================================================================
// Clipboard
// =========================================================================

#[cfg(test)]
fn copy_to_clipboard(_text: &str) -> Result<(), String> {
    Ok(())
}

/// Copy text to the system clipboard using OSC52 with fallback to external
/// tools (works over SSH and in multiplexers).
#[cfg(not(test))]
fn copy_to_clipboard(text: &str) -> Result<(), String> {
    use ftui::TerminalCapabilities;
    use ftui_extras::clipboard::{Clipboard, ClipboardSelection};

    if text.is_empty() {
        return Ok(());
    }

    let caps = TerminalCapabilities::detect();
    let clipboard = Clipboard::auto(caps);

    if !clipboard.is_available() {
        return Err(
            "no clipboard backend available (no OSC52 support and no clipboard tool found)"
                .to_string(),
        );
    }

    let mut stdout = std::io::stdout();
    clipboard
        .set(text, ClipboardSelection::Clipboard, &mut stdout)
        .map_err(|e| format!("{e}"))
}

// =========================================================================
// Entry point
// =========================================================================

/// Launch the workspace TUI in fullscreen alternate-screen mode.
pub fn run_tui(
    api: ApiClient,
    data_dir: PathBuf,
    requirements: Option<PathBuf>,
    schema_url: Option<String>,
) -> anyhow::Result<()> {
    use ftui::render::budget::FrameBudgetConfig;

    let persisted = PersistedUiState::load(&data_dir);
    let mut model = ReviewApp {
        api: Some(Arc::new(api)),
        data_dir,
        persist_state: true,
        ..ReviewApp::default()
    };
    if let (Some(sidebar), Some(right)) = (persisted.sidebar_width, persisted.right_width) {
        model.layout = PaneLayout::with_widths(sidebar, right);
    }
    if let Some(view) = persisted
        .last_view
        .as_deref()
        .and_then(ActiveView::from_slug)
    {
        model.view = view;
    }
    if let Some(path) = requirements {
        model.requirements_path = path.display().to_string();
    }
    if let Some(url) = schema_url {
        model.schema_url = url;
    }

    ftui::App::fullscreen(model)
        .with_mouse()
        .with_budget(FrameBudgetConfig::default())
        .run()
        .map_err(|e| anyhow::anyhow!("ftui runtime error: {e}"))
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::buffer_to_text;
    use crate::model::{ComparisonRow, ReportRef, StatusCounts};

    fn make_row(req_id: &str, field_key: &str, status: StatusKind) -> ComparisonRow {
        ComparisonRow {
            req_id: req_id.to_string(),
            field_key: field_key.to_string(),
            status,
            best_match_key: None,
            raw_snippet: Some("int32".to_string()),
            expected_type: Some("integer".to_string()),
            expected_required: Some(true),
        }
    }

    fn single_mismatch_result() -> ComparisonResult {
        ComparisonResult {
            rows: vec![make_row("R1", "age", StatusKind::Mismatch)],
            counts: StatusCounts {
                mismatch: 1,
                ..StatusCounts::default()
            },
            report: Some(ReportRef {
                path: "reports/r1.xlsx".to_string(),
                url: "/download?path=reports%2Fr1.xlsx".to_string(),
            }),
        }
    }

    fn make_report(name: &str) -> ReportEntry {
        ReportEntry {
            name: name.to_string(),
            path: format!("reports/{name}"),
            modified: 1_754_000_000,
            size: 2048,
        }
    }

    fn app_with_api() -> ReviewApp {
        ReviewApp {
            api: Some(Arc::new(
                ApiClient::new("http://127.0.0.1:1").expect("client"),
            )),
            ..ReviewApp::default()
        }
    }

    fn render(app: &ReviewApp, width: u16, height: u16) -> ftui::Buffer {
        let mut pool = ftui::GraphemePool::new();
        let mut frame = ftui::Frame::new(width, height, &mut pool);
        app.view(&mut frame);
        frame.buffer
    }

    // ── Workspace shell ────────────────────────────────────────────────

    #[test]
    fn initial_state_matches_contract() {
        let app = ReviewApp::default();
        assert_eq!(app.view, ActiveView::Comparator);
        assert!(app.sidebar_visible);
        assert!(app.comparison.is_none());
        assert!(app.pending_delete.is_none());
        assert!(!app.overlays.any_open());
    }

    #[test]
    fn view_switching_preserves_comparison() {
        let mut app = ReviewApp::default();
        app.comparison = Some(single_mismatch_result());
        let _ = app.update(ReviewMsg::ViewSelected(ActiveView::Reports));
        assert_eq!(app.view, ActiveView::Reports);
        let _ = app.update(ReviewMsg::ViewSelected(ActiveView::Comparator));
        assert!(app.comparison.is_some());
    }

    #[test]
    fn entering_reports_view_requests_list() {
        let mut app = app_with_api();
        let cmd = app.update(ReviewMsg::ViewSelected(ActiveView::Reports));
        assert!(matches!(cmd, Cmd::Msg(ReviewMsg::ReportsRequested)));
    }

    // ── Compare validation ─────────────────────────────────────────────

    #[test]
    fn compare_without_file_is_blocked_before_dispatch() {
        let mut app = app_with_api();
        app.schema_url = "http://example.com/schema.json".to_string();
        let cmd = app.update(ReviewMsg::CompareRequested);
        assert!(matches!(cmd, Cmd::None));
        assert!(!app.compare_loading);
        assert!(
            app.toasts
                .visible()
                .iter()
                .any(|t| t.message == "Please select a file")
        );
    }

    #[test]
    fn compare_without_schema_url_is_blocked_before_dispatch() {
        let mut app = app_with_api();
        app.requirements_path = "/tmp/reqs.xlsx".to_string();
        let cmd = app.update(ReviewMsg::CompareRequested);
        assert!(matches!(cmd, Cmd::None));
        assert!(
            app.toasts
                .visible()
                .iter()
                .any(|t| t.message == "Please enter schema URL")
        );
    }

    #[test]
    fn compare_completion_replaces_result_wholesale() {
        let mut app = ReviewApp::default();
        app.comparison = Some(ComparisonResult {
            rows: vec![make_row("OLD", "old_field", StatusKind::Matched)],
            counts: StatusCounts {
                matched: 1,
                ..StatusCounts::default()
            },
            report: None,
        });
        let _ = app.update(ReviewMsg::CompareCompleted(Box::new(
            single_mismatch_result(),
        )));
        let result = app.comparison.as_ref().unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].req_id, "R1");
        assert!(app.selected_row.is_none());
        assert!(app.row_detail.is_none());
    }

    // ── Row detail ─────────────────────────────────────────────────────

    #[test]
    fn last_selected_row_wins_detail_pane() {
        let mut app = ReviewApp::default();
        app.comparison = Some(ComparisonResult {
            rows: vec![
                make_row("R1", "age", StatusKind::Mismatch),
                make_row("R2", "name", StatusKind::Matched),
            ],
            counts: StatusCounts {
                matched: 1,
                mismatch: 1,
                ..StatusCounts::default()
            },
            report: None,
        });
        let _ = app.update(ReviewMsg::RowSelected(0));
        assert_eq!(app.row_detail.as_ref().unwrap().field_key, "age");
        let _ = app.update(ReviewMsg::RowSelected(1));
        assert_eq!(app.row_detail.as_ref().unwrap().field_key, "name");
        assert_eq!(app.selected_row, Some(1));
    }

    #[test]
    fn detail_renders_placeholder_for_missing_best_match() {
        let mut app = ReviewApp::default();
        app.comparison = Some(single_mismatch_result());
        let _ = app.update(ReviewMsg::RowSelected(0));
        let text = buffer_to_text(&render(&app, 140, 40));
        assert!(
            text.contains("Best: -"),
            "detail should render '-' placeholder:\n{text}"
        );
    }

    // ── Delete confirmation gate ───────────────────────────────────────

    #[test]
    fn delete_without_confirmation_dispatches_nothing() {
        let mut app = app_with_api();
        app.reports = vec![make_report("r1.xlsx")];
        let cmd = app.update(ReviewMsg::DeleteRequested);
        assert!(matches!(cmd, Cmd::None));
        assert!(app.pending_delete.is_some());
        assert!(!app.delete_loading);
    }

    #[test]
    fn confirmed_delete_dispatches_remote_call() {
        let mut app = app_with_api();
        app.reports = vec![make_report("r1.xlsx")];
        let _ = app.update(ReviewMsg::DeleteRequested);
        let cmd = app.update(ReviewMsg::DeleteConfirmed);
        assert!(!matches!(cmd, Cmd::None));
        assert!(app.delete_loading);
        assert!(app.pending_delete.is_none());
    }

    #[test]
    fn cancelled_delete_clears_pending_state() {
        let mut app = app_with_api();
        app.reports = vec![make_report("r1.xlsx")];
        let _ = app.update(ReviewMsg::DeleteRequested);
        let cmd = app.update(ReviewMsg::DeleteCancelled);
        assert!(matches!(cmd, Cmd::None));
        assert!(app.pending_delete.is_none());
        assert!(!app.delete_loading);
    }

    #[test]
    fn delete_completion_triggers_list_refresh() {
        let mut app = app_with_api();
        let cmd = app.update(ReviewMsg::DeleteCompleted);
        assert!(matches!(cmd, Cmd::Msg(ReviewMsg::ReportsRequested)));
    }

    #[test]
    fn delete_failure_keeps_collection() {
        let mut app = ReviewApp::default();
        app.reports = vec![make_report("r1.xlsx"), make_report("r2.xlsx")];
        let _ = app.update(ReviewMsg::DeleteFailed("Delete failed".to_string()));
        assert_eq!(app.reports.len(), 2);
        assert!(
            app.toasts
                .visible()
                .iter()
                .any(|t| t.message == "Delete failed")
        );
    }

    // ── Analyze ────────────────────────────────────────────────────────

    #[test]
    fn analysis_explicit_error_surfaces_verbatim_and_stays_closed() {
        let mut app = ReviewApp::default();
        app.analysis_seq = 1;
        app.analysis_loading = true;
        let _ = app.update(ReviewMsg::AnalysisFailed {
            seq: 1,
            message: analysis_failure_message(&ApiError::Server("timeout".to_string())),
        });
        assert!(!app.analysis_loading);
        assert!(!app.overlays.is_open(Surface::Analysis));
        assert!(app.analysis.is_none());
        assert!(
            app.toasts
                .visible()
                .iter()
                .any(|t| t.message == "Analysis failed: timeout")
        );
    }

    #[test]
    fn analysis_generic_failure_message_for_transport_errors() {
        let err = ApiError::Status(reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(analysis_failure_message(&err), "Analysis request failed");
    }

    #[test]
    fn stale_analysis_completion_is_dropped() {
        let mut app = ReviewApp::default();
        app.analysis_seq = 2;
        let _ = app.update(ReviewMsg::AnalysisCompleted {
            seq: 1,
            result: Box::new(AnalysisResult {
                analysis: "stale".to_string(),
                structured: None,
            }),
        });
        assert!(app.analysis.is_none());
        assert!(!app.overlays.is_open(Surface::Analysis));
    }

    #[test]
    fn analysis_completion_opens_surface_and_close_discards_payload() {
        let mut app = ReviewApp::default();
        app.analysis_seq = 1;
        let _ = app.update(ReviewMsg::AnalysisCompleted {
            seq: 1,
            result: Box::new(AnalysisResult {
                analysis: "Schema drift in two fields.".to_string(),
                structured: None,
            }),
        });
        assert!(app.overlays.is_open(Surface::Analysis));
        assert!(app.analysis.is_some());
        let _ = app.update(ReviewMsg::OverlayClosed(Surface::Analysis));
        assert!(!app.overlays.is_open(Surface::Analysis));
        assert!(app.analysis.is_none(), "analysis payload is transient");
    }

    // ── Visuals ────────────────────────────────────────────────────────

    #[test]
    fn empty_visuals_open_surface_with_explicit_empty_state() {
        let mut app = ReviewApp::default();
        app.visuals_for = Some(make_report("r1.xlsx"));
        let _ = app.update(ReviewMsg::VisualsLoaded {
            path: "reports/r1.xlsx".to_string(),
            images: Vec::new(),
        });
        assert!(app.overlays.is_open(Surface::Visuals));
        assert_eq!(app.visuals.as_deref(), Some(&[][..]));
        let text = buffer_to_text(&render(&app, 120, 36));
        assert!(text.contains("No visuals available"), "{text}");
    }

    #[test]
    fn visuals_failure_keeps_selection_and_surface_closed() {
        let mut app = ReviewApp::default();
        app.visuals_for = Some(make_report("r1.xlsx"));
        app.visuals_loading = true;
        let _ = app.update(ReviewMsg::VisualsFailed {
            path: "reports/r1.xlsx".to_string(),
            message: "boom".to_string(),
        });
        assert!(!app.visuals_loading);
        assert!(!app.overlays.is_open(Surface::Visuals));
        assert!(app.visuals_for.is_some(), "selection is still recorded");
        assert!(
            app.toasts
                .visible()
                .iter()
                .any(|t| t.message == "Failed to load visuals")
        );
    }

    // ── Reports list ───────────────────────────────────────────────────

    #[test]
    fn list_failure_leaves_collection_unchanged() {
        let mut app = ReviewApp::default();
        app.reports = vec![make_report("r1.xlsx")];
        app.reports_loading = true;
        let _ = app.update(ReviewMsg::ReportsFailed("offline".to_string()));
        assert_eq!(app.reports.len(), 1);
        assert!(!app.reports_loading);
        assert!(
            app.toasts.is_empty(),
            "list failures are logged, not toasted"
        );
    }

    // ── Overlays & fullscreen ──────────────────────────────────────────

    #[test]
    fn external_fullscreen_change_reconciles_single_owner() {
        let mut app = ReviewApp::default();
        app.overlays.open(Surface::Summary);
        app.overlays.open(Surface::Analysis);
        let _ = app.update(ReviewMsg::FullscreenToggled(Surface::Summary));
        let _ = app.update(ReviewMsg::FullscreenChanged(Some(Surface::Analysis)));
        assert!(app.overlays.is_fullscreen(Surface::Analysis));
        assert!(!app.overlays.is_fullscreen(Surface::Summary));
        assert!(!app.overlays.is_fullscreen(Surface::Visuals));
    }

    #[test]
    fn escape_closes_topmost_overlay_before_quitting() {
        let mut app = ReviewApp::default();
        app.overlays.open(Surface::Visuals);
        let cmd = app.update(ReviewMsg::KeyEscape);
        assert!(matches!(
            cmd,
            Cmd::Msg(ReviewMsg::OverlayClosed(Surface::Visuals))
        ));
    }

    // ── Summary surface ────────────────────────────────────────────────

    #[test]
    fn summary_renders_hundred_percent_for_single_mismatch() {
        let mut app = ReviewApp::default();
        app.comparison = Some(single_mismatch_result());
        app.overlays.open(Surface::Summary);
        app.summary_visuals = Some(Vec::new());
        let text = buffer_to_text(&render(&app, 120, 40));
        assert!(text.contains("(100%)"), "{text}");
        assert!(text.contains("No visuals available"), "{text}");
    }

    // ── Layout engine wiring ───────────────────────────────────────────

    #[test]
    fn sidebar_handle_drag_resizes_and_release_detaches() {
        let app = ReviewApp::default();
        render(&app, 140, 40);
        let handle = app.last_sidebar_handle.borrow().unwrap();
        let mut app = app;
        let _ = app.update(ReviewMsg::Mouse {
            kind: MouseKind::LeftClick,
            x: handle.x,
            y: handle.y + 1,
        });
        assert!(app.layout.dragging());
        let _ = app.update(ReviewMsg::Mouse {
            kind: MouseKind::LeftDrag,
            x: handle.x + 6,
            y: handle.y + 1,
        });
        let widened = app.layout.sidebar_width;
        assert_eq!(widened, crate::ui::layout::SIDEBAR_DEFAULT + 6);
        let _ = app.update(ReviewMsg::Mouse {
            kind: MouseKind::LeftRelease,
            x: handle.x + 6,
            y: handle.y + 1,
        });
        // Unrelated motion after release must not resize.
        let _ = app.update(ReviewMsg::Mouse {
            kind: MouseKind::LeftDrag,
            x: handle.x + 30,
            y: handle.y + 1,
        });
        assert_eq!(app.layout.sidebar_width, widened);
    }

    #[test]
    fn hit_regions_recorded_after_render() {
        let mut app = ReviewApp::default();
        app.comparison = Some(single_mismatch_result());
        render(&app, 140, 40);
        assert!(app.last_sidebar_handle.borrow().is_some());
        assert!(app.last_right_handle.borrow().is_some());
        assert!(app.last_table_inner.borrow().is_some());
        assert!(app.last_detail_area.borrow().is_some());
        assert!(!app.last_sidebar_nav_rows.borrow().is_empty());
    }

    #[test]
    fn table_click_selects_row() {
        let mut app = ReviewApp::default();
        app.comparison = Some(single_mismatch_result());
        render(&app, 140, 40);
        let table = app.last_table_inner.borrow().unwrap();
        let cmd = app.update(ReviewMsg::Mouse {
            kind: MouseKind::LeftClick,
            x: table.x + 1,
            y: table.y,
        });
        assert!(matches!(cmd, Cmd::Msg(ReviewMsg::RowSelected(0))));
    }

    #[test]
    fn click_outside_modal_closes_topmost_surface() {
        let mut app = ReviewApp::default();
        app.overlays.open(Surface::Summary);
        render(&app, 120, 40);
        let cmd = app.update(ReviewMsg::Mouse {
            kind: MouseKind::LeftClick,
            x: 0,
            y: 0,
        });
        assert!(matches!(
            cmd,
            Cmd::Msg(ReviewMsg::OverlayClosed(Surface::Summary))
        ));
    }

    // ── Form routing ───────────────────────────────────────────────────

    #[test]
    fn typed_characters_land_in_focused_field() {
        let mut app = ReviewApp::default();
        app.form_focus = Some(FormField::SchemaUrl);
        for c in "http://x".chars() {
            let _ = app.update(ReviewMsg::KeyChar(c));
        }
        assert_eq!(app.schema_url, "http://x");
        let _ = app.update(ReviewMsg::KeyTab);
        let _ = app.update(ReviewMsg::KeyChar('/'));
        assert_eq!(app.requirements_path, "/");
        let _ = app.update(ReviewMsg::KeyBackspace);
        assert!(app.requirements_path.is_empty());
    }

    #[test]
    fn view_renders_without_panic_at_small_sizes() {
        let mut app = ReviewApp::default();
        app.comparison = Some(single_mismatch_result());
        app.reports = vec![make_report("r1.xlsx")];
        for (w, h) in [(20, 6), (40, 12), (80, 24), (200, 60)] {
            let _ = render(&app, w, h);
        }
    }

    #[test]
    fn view_deterministic_under_repeated_renders() {
        let mut app = ReviewApp::default();
        app.comparison = Some(single_mismatch_result());
        let a = buffer_to_text(&render(&app, 100, 30));
        let b = buffer_to_text(&render(&app, 100, 30));
        assert_eq!(a, b);
    }
}
