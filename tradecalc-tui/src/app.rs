//! Application state: single-owner, main-thread only.
//!
//! The `LocationStore` is the source of truth. The active form reads from
//! it, every edit writes to it, and a store subscription flags navigation so
//! the form is re-synced (or remounted for another tool) before the next draw.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tradecalc_core::input::{Keystroke, NumericField};
use tradecalc_core::params::{LocationStore, NavigationEvent, ParamStore, SubscriptionId};
use tradecalc_core::tools::{
    mount_form, Edit, FieldId, FieldValue, FieldView, ListEdit, Tool, ToolDefaults, ToolForm, ToolReport,
};
use tradecalc_core::SetupError;

/// How long a changed result stays highlighted.
pub const HIGHLIGHT_FOR: Duration = Duration::from_secs(1);

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Help,
}

/// A number field being typed into.
#[derive(Debug, Clone, PartialEq)]
pub struct Editor {
    pub id: FieldId,
    pub field: NumericField,
}

/// Highlights the results for a while after they change. Every change
/// restarts the window.
#[derive(Debug, Clone, Default)]
pub struct Highlight {
    shown: Option<String>,
    changed_at: Option<Instant>,
}

impl Highlight {
    /// Record what is displayed now. Returns whether it differs from before.
    pub fn observe(&mut self, shown: &str, now: Instant) -> bool {
        if self.shown.as_deref() == Some(shown) {
            return false;
        }
        // The first value is not a change.
        if self.shown.is_some() {
            self.changed_at = Some(now);
        }
        self.shown = Some(shown.to_string());
        true
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.changed_at
            .is_some_and(|at| now.saturating_duration_since(at) < HIGHLIGHT_FOR)
    }
}

pub struct App {
    pub store: LocationStore,
    pub defaults: ToolDefaults,
    pub tool: Tool,
    pub form: Box<dyn ToolForm>,
    pub fields: Vec<FieldView>,
    pub report: Result<ToolReport, SetupError>,
    pub cursor: usize,
    pub editor: Option<Editor>,
    pub highlight: Highlight,
    pub status_message: Option<(String, StatusLevel)>,
    pub overlay: Overlay,
    pub running: bool,
    navigated: Rc<Cell<bool>>,
    subscription: SubscriptionId,
}

impl App {
    /// Mount the tool named by the store's `#/route`, or `fallback`.
    pub fn new(mut store: LocationStore, defaults: ToolDefaults, fallback: Tool) -> Self {
        let tool = store.fragment().and_then(Tool::from_route).unwrap_or(fallback);
        if store.fragment().and_then(Tool::from_route).is_none() {
            store.set_fragment(Some(tool.route()));
        }

        let navigated = Rc::new(Cell::new(false));
        let flag = Rc::clone(&navigated);
        let subscription = store.subscribe(Box::new(move |_: &NavigationEvent| flag.set(true)));

        let form = mount_form(tool, &store, &defaults);
        let mut app = Self {
            store,
            defaults,
            tool,
            form,
            fields: Vec::new(),
            report: Err(SetupError::ZeroRiskUnit),
            cursor: 0,
            editor: None,
            highlight: Highlight::default(),
            status_message: None,
            overlay: Overlay::None,
            running: true,
            navigated,
            subscription,
        };
        app.refresh();
        tracing::info!(%tool, href = %app.store.href(), "app started");
        app
    }

    /// The link to share: the current URL.
    pub fn share_url(&self) -> String {
        self.store.href()
    }

    pub fn selected(&self) -> Option<&FieldView> {
        self.fields.get(self.cursor)
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    /// Re-read fields and recompute the report.
    pub fn refresh(&mut self) {
        self.fields = self.form.fields();
        self.report = self.form.report();
        if self.cursor >= self.fields.len() {
            self.cursor = self.fields.len().saturating_sub(1);
        }

        let shown = match &self.report {
            Ok(report) => report.headline(),
            Err(err) => err.to_string(),
        };
        self.highlight.observe(&shown, Instant::now());

        // Constraints can depend on other inputs, e.g. the lock ceiling.
        if let Some(id) = self.editor.as_ref().map(|e| e.id) {
            let constraints = self.fields.iter().find(|f| f.id == id).and_then(|f| match f.value {
                FieldValue::Number { constraints, .. } => Some(constraints),
                _ => None,
            });
            match constraints {
                Some(constraints) => {
                    if let Some(editor) = self.editor.as_mut() {
                        editor.field.set_constraints(constraints);
                    }
                }
                // The field is gone, e.g. its rung was removed.
                None => self.editor = None,
            }
        }
    }

    // ── Edits ────────────────────────────────────────────────────────

    fn apply(&mut self, id: FieldId, edit: Edit) {
        if self.form.apply(&mut self.store, id, edit) {
            tracing::debug!(?id, ?edit, "field committed");
            self.refresh();
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        self.finish_edit();
        let len = self.fields.len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor as isize + delta).rem_euclid(len as isize) as usize;
    }

    /// Enter on the selected field: edit numbers, flip toggles, cycle menus.
    pub fn activate(&mut self) {
        let Some(view) = self.selected().cloned() else {
            return;
        };
        match view.value {
            FieldValue::Number { value, constraints, .. } => {
                self.editor = Some(Editor {
                    id: view.id,
                    field: NumericField::new(value, constraints),
                });
            }
            FieldValue::Toggle(_) => self.apply(view.id, Edit::Toggle),
            FieldValue::Choice { .. } => self.cycle_choice(1),
        }
    }

    /// Step a menu or flip a toggle with left/right.
    pub fn cycle_choice(&mut self, delta: isize) {
        let Some(view) = self.selected().cloned() else {
            return;
        };
        match view.value {
            FieldValue::Choice { selected, options } if !options.is_empty() => {
                let len = options.len() as isize;
                let current = selected.min(options.len() - 1) as isize;
                let next = (current + delta).rem_euclid(len) as usize;
                self.apply(view.id, Edit::Choose(next));
            }
            FieldValue::Toggle(_) => self.apply(view.id, Edit::Toggle),
            _ => {}
        }
    }

    /// Clear the selected number back to its placeholder.
    pub fn clear_selected(&mut self) {
        if let Some(FieldView {
            id,
            value: FieldValue::Number { .. },
            ..
        }) = self.selected().cloned()
        {
            self.apply(id, Edit::Number(None));
        }
    }

    /// Start typing into the selected number field.
    pub fn type_char(&mut self, c: char) {
        if self.editor.is_none() {
            match self.selected().cloned() {
                Some(FieldView {
                    id,
                    value: FieldValue::Number { constraints, .. },
                    ..
                }) => {
                    self.editor = Some(Editor {
                        id,
                        field: NumericField::new(None, constraints),
                    });
                }
                _ => return,
            }
        }
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let id = editor.id;
        let keystroke = editor.field.push_char(c);
        self.on_keystroke(id, keystroke);
    }

    pub fn backspace(&mut self) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let id = editor.id;
        let keystroke = editor.field.backspace();
        self.on_keystroke(id, keystroke);
    }

    fn on_keystroke(&mut self, id: FieldId, keystroke: Keystroke) {
        match keystroke {
            Keystroke::Rejected => {}
            // Complete numbers go live while typing; partial text waits.
            Keystroke::Reported(Some(value)) => self.apply(id, Edit::Number(Some(value))),
            Keystroke::Reported(None) => {}
        }
    }

    /// Leave the field: commit what was typed, or clear it.
    pub fn finish_edit(&mut self) {
        let Some(mut editor) = self.editor.take() else {
            return;
        };
        let committed = editor.field.on_blur();
        self.apply(editor.id, Edit::Number(committed));
    }

    pub fn append_entry(&mut self) {
        self.finish_edit();
        if self.form.apply_list(&mut self.store, ListEdit::Append) {
            self.refresh();
            self.set_status("entry added");
        } else {
            self.set_warning(format!("{} has no list to extend", self.tool.title()));
        }
    }

    /// Remove the ladder rung or dip level under the cursor.
    pub fn remove_entry(&mut self) {
        self.finish_edit();
        let index = match self.selected().map(|f| f.id) {
            Some(FieldId::RungTrigger(i) | FieldId::RungLock(i) | FieldId::Dip(i)) => i,
            _ => {
                self.set_warning("select a trailing stop or dip to remove it");
                return;
            }
        };
        if self.form.apply_list(&mut self.store, ListEdit::Remove(index)) {
            self.refresh();
            self.set_status(format!("entry #{} removed", index + 1));
        }
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Open another tool on a fresh URL. Back returns to the previous one.
    pub fn switch_tool(&mut self, tool: Tool) {
        self.finish_edit();
        if tool == self.tool {
            return;
        }
        let mut url = self.store.url().clone();
        url.set_query(None);
        url.set_fragment(Some(tool.route()));
        self.store.navigate(url);
        self.after_navigation();
    }

    pub fn back(&mut self) {
        self.finish_edit();
        if self.store.back() {
            self.after_navigation();
        } else {
            self.set_warning("no earlier page");
        }
    }

    pub fn forward(&mut self) {
        self.finish_edit();
        if self.store.forward() {
            self.after_navigation();
        } else {
            self.set_warning("no later page");
        }
    }

    /// Bring the form in line with the store after a navigation event.
    pub fn after_navigation(&mut self) {
        if !self.navigated.replace(false) {
            return;
        }
        let tool = self.store.fragment().and_then(Tool::from_route).unwrap_or(self.tool);
        if tool != self.tool {
            // Keys overlap between tools, so a new form decodes from scratch.
            self.tool = tool;
            self.form = mount_form(tool, &self.store, &self.defaults);
            self.cursor = 0;
            self.editor = None;
        } else {
            self.form.sync(&self.store);
        }
        self.refresh();
        if let Some(editor) = self.editor.as_mut() {
            let value = self.fields.iter().find(|f| f.id == editor.id).and_then(|f| match f.value {
                FieldValue::Number { value, .. } => value,
                _ => None,
            });
            editor.field.sync_external(value);
        }
        tracing::debug!(tool = %self.tool, href = %self.store.href(), "resynced after navigation");
    }

    pub fn quit(&mut self) {
        self.finish_edit();
        self.store.unsubscribe(self.subscription);
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(query: &str) -> App {
        App::new(LocationStore::from_query(query), ToolDefaults::default(), Tool::PositionSizing)
    }

    fn select(app: &mut App, id: FieldId) {
        app.cursor = app.fields.iter().position(|f| f.id == id).unwrap();
    }

    #[test]
    fn starts_on_route_tool() {
        let store = LocationStore::open("http://localhost/?p=1000#/risk-reward");
        let app = App::new(store, ToolDefaults::default(), Tool::PositionSizing);
        assert_eq!(app.tool, Tool::RiskReward);
        assert!(app.report.is_ok());
    }

    #[test]
    fn missing_route_is_filled_in() {
        let app = app("");
        assert_eq!(app.store.fragment(), Some("/position-sizing"));
    }

    #[test]
    fn typing_commits_complete_numbers_live() {
        let mut app = app("");
        select(&mut app, FieldId::Param("entry"));
        app.type_char('1');
        assert_eq!(app.store.get("entry").as_deref(), Some("1"));
        app.type_char('0');
        app.type_char('.');
        // "10." is partial; the URL keeps the last complete value.
        assert_eq!(app.store.get("entry").as_deref(), Some("10"));
        app.type_char('5');
        assert_eq!(app.store.get("entry").as_deref(), Some("10.5"));
        app.finish_edit();
        assert!(app.editor.is_none());
        assert_eq!(app.store.history_len(), 1);
    }

    #[test]
    fn blur_snaps_to_the_field_grid() {
        let mut app = app("");
        select(&mut app, FieldId::Param("ml"));
        for c in "12.34".chars() {
            app.type_char(c);
        }
        app.finish_edit();
        assert_eq!(app.store.get("ml").as_deref(), Some("12.3"));
    }

    #[test]
    fn tool_switch_and_back_restore_form() {
        let mut app = app("entry=100&sl=90&tp=120");
        app.switch_tool(Tool::FibSizing);
        assert_eq!(app.tool, Tool::FibSizing);
        assert_eq!(app.store.query(), None);
        assert_eq!(app.store.history_len(), 2);

        app.back();
        assert_eq!(app.tool, Tool::PositionSizing);
        assert_eq!(app.store.get("sl").as_deref(), Some("90"));

        app.forward();
        assert_eq!(app.tool, Tool::FibSizing);
    }

    #[test]
    fn toggles_and_menus_cycle() {
        let mut app = App::new(
            LocationStore::open("http://localhost/#/fib-sizing"),
            ToolDefaults::default(),
            Tool::PositionSizing,
        );
        select(&mut app, FieldId::Param("sl"));
        app.cycle_choice(1);
        assert_eq!(app.store.get("sl").as_deref(), Some("0"));
        app.cycle_choice(-1);
        assert_eq!(app.store.get("sl"), None);

        select(&mut app, FieldId::Param("short"));
        app.activate();
        assert_eq!(app.store.get("short").as_deref(), Some("true"));
    }

    #[test]
    fn remove_needs_a_list_row() {
        let mut app = app("");
        select(&mut app, FieldId::Param("entry"));
        app.remove_entry();
        assert!(matches!(app.status_message, Some((_, StatusLevel::Warning))));

        select(&mut app, FieldId::RungLock(0));
        app.remove_entry();
        assert_eq!(app.form.fields().iter().filter(|f| matches!(f.id, FieldId::RungTrigger(_))).count(), 1);
    }

    #[test]
    fn highlight_restarts_on_each_change() {
        let t0 = Instant::now();
        let mut h = Highlight::default();
        assert!(h.observe("a", t0));
        assert!(!h.is_active(t0));

        assert!(h.observe("b", t0));
        assert!(h.is_active(t0 + Duration::from_millis(900)));
        assert!(!h.is_active(t0 + Duration::from_millis(1100)));

        assert!(h.observe("c", t0 + Duration::from_millis(800)));
        assert!(h.is_active(t0 + Duration::from_millis(1700)));
        assert!(!h.observe("c", t0 + Duration::from_millis(1700)));
    }
}
