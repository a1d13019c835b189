use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Position, Terminal};
use serde::Serialize;
use std::io;
use std::rc::Rc;

use crate::{
    config::{AppConfig, ConfigError},
    listener::{dispatch, EventRegistry, SharedRegistry, UiEvent},
    picker::{DatePicker, PickerEvent, PickerLayout},
    theme::ThemeConfig,
    ui::draw,
};

// ─── App state ────────────────────────────────────────────────────────────────

pub struct Field {
    pub label:  String,
    pub picker: DatePicker,
}

#[derive(Debug, Serialize)]
pub struct FieldValue<'a> {
    pub label: &'a str,
    pub value: &'a str,
}

pub struct App {
    pub theme:          ThemeConfig,
    pub display_format: String,
    pub fields:         Vec<Field>,
    pub focus:          usize,
    pub status:         String,
    pub running:        bool,
    registry:           SharedRegistry,
}

impl App {
    pub fn from_config(cfg: &AppConfig, theme: ThemeConfig) -> Result<Self, ConfigError> {
        let registry = EventRegistry::shared();
        let fields = cfg.fields.iter().map(|fc| {
            let options = cfg.picker_options(fc)?;
            Ok(Field {
                label:  fc.label.clone(),
                picker: DatePicker::new(options, &fc.value, Rc::clone(&registry)),
            })
        }).collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            theme,
            display_format: cfg.display_format.clone(),
            fields,
            focus:   0,
            status:  String::new(),
            running: true,
            registry,
        })
    }

    pub fn values(&self) -> Vec<FieldValue<'_>> {
        self.fields.iter()
            .map(|f| FieldValue { label: &f.label, value: f.picker.model_value() })
            .collect()
    }

    // ── TUI loop ──────────────────────────────────────────────────────────────

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend  = CrosstermBackend::new(stdout);
        let mut term = Terminal::new(backend)?;

        let result = self.event_loop(&mut term);

        disable_raw_mode()?;
        execute!(term.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        term.show_cursor()?;
        result
    }

    fn event_loop(&mut self, term: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        let tick = std::time::Duration::from_millis(50);
        while self.running {
            let mut layouts = Vec::new();
            term.draw(|f| layouts = draw(f, self))?;
            self.apply_layouts(layouts);

            if event::poll(tick)? {
                self.on_event(event::read()?);
            }
        }
        Ok(())
    }

    pub fn apply_layouts(&mut self, layouts: Vec<PickerLayout>) {
        for (field, layout) in self.fields.iter_mut().zip(layouts) {
            field.picker.set_layout(layout);
        }
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    pub fn on_event(&mut self, ev: Event) {
        match ev {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.on_key(key),
            Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                self.on_click(Position::new(m.column, m.row));
            }
            _ => {}
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c') | KeyCode::Char('q'), KeyModifiers::CONTROL) => {
                self.running = false;
                return;
            }
            (KeyCode::Tab, _)     => { self.shift_focus(1);  return; }
            (KeyCode::BackTab, _) => { self.shift_focus(-1); return; }
            _ => {}
        }

        let Some(field) = self.fields.get_mut(self.focus) else { return };
        let ev = field.picker.handle_key(key);
        self.apply(self.focus, ev);

        self.broadcast(&UiEvent::KeyUp { key: key.code });
    }

    fn on_click(&mut self, at: Position) {
        // Open popovers sit on top of the inputs.
        let hit = self.fields.iter()
            .position(|f| f.picker.layout().popover.is_some_and(|p| p.contains(at)))
            .or_else(|| self.fields.iter().position(|f| f.picker.layout().input.contains(at)));
        if let Some(idx) = hit {
            if idx != self.focus { self.set_focus(idx); }
            let ev = self.fields[idx].picker.handle_click(at);
            self.apply(idx, ev);
        }

        self.broadcast(&UiEvent::Click { at });
    }

    fn shift_focus(&mut self, delta: isize) {
        let n = self.fields.len() as isize;
        if n == 0 { return; }
        let next = (self.focus as isize + delta).rem_euclid(n) as usize;
        self.set_focus(next);
    }

    fn set_focus(&mut self, idx: usize) {
        if let Some(prev) = self.fields.get_mut(self.focus) {
            let ev = prev.picker.blur();
            self.apply(self.focus, ev);
        }
        self.focus = idx;
        let area = self.fields[idx].picker.layout().input;
        self.broadcast(&UiEvent::FocusIn { area });
    }

    /// Feeds a document-level event to every registered listener, then lets
    /// each picker catch up with whatever the listeners did to it.
    fn broadcast(&mut self, event: &UiEvent) {
        dispatch(&self.registry, event);
        for field in &mut self.fields { field.picker.sync_listener(); }
    }

    fn apply(&mut self, idx: usize, ev: Option<PickerEvent>) {
        let Some(PickerEvent::Update(value)) = ev else { return };
        let field = &mut self.fields[idx];
        tracing::info!(field = %field.label, %value, "value updated");
        field.picker.set_model_value(&value);
        self.status = format!("{}: {}", field.label, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};
    use ratatui::{backend::TestBackend, layout::Rect};

    fn app(values: &[&str]) -> App {
        let mut cfg = AppConfig::default();
        cfg.display_format = "yyyy-MM-dd".into();
        for (field, v) in cfg.fields.iter_mut().zip(values) { field.value = (*v).into(); }
        let mut app = App::from_config(&cfg, ThemeConfig::default()).unwrap();
        redraw(&mut app);
        app
    }

    fn redraw(app: &mut App) {
        let mut term = Terminal::new(TestBackend::new(60, 24)).unwrap();
        let mut layouts = Vec::new();
        term.draw(|f| layouts = draw(f, app)).unwrap();
        app.apply_layouts(layouts);
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_event(Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind:      KeyEventKind::Press,
            state:     KeyEventState::NONE,
        }));
    }

    fn click(app: &mut App, x: u16, y: u16) {
        app.on_event(Event::Mouse(MouseEvent {
            kind:      MouseEventKind::Down(MouseButton::Left),
            column:    x,
            row:       y,
            modifiers: KeyModifiers::NONE,
        }));
    }

    fn centre(r: Rect) -> (u16, u16) { (r.x + r.width / 2, r.y + r.height / 2) }

    #[test]
    fn keyboard_pick_flow() {
        let mut a = app(&["2024-05-10"]);
        press(&mut a, KeyCode::Enter);
        assert!(a.fields[0].picker.is_open());
        press(&mut a, KeyCode::Left);
        press(&mut a, KeyCode::Enter);
        assert!(!a.fields[0].picker.is_open());
        assert_eq!(a.fields[0].picker.model_value(), "2024-05-09");
        assert_eq!(a.registry.borrow().listener_count(), 0);
    }

    #[test]
    fn escape_closes_via_document_listener() {
        let mut a = app(&[]);
        press(&mut a, KeyCode::Down);
        assert!(a.fields[0].picker.is_listening());
        press(&mut a, KeyCode::Esc);
        assert!(!a.fields[0].picker.is_open());
        assert!(!a.fields[0].picker.is_listening());
    }

    #[test]
    fn tab_away_closes_and_normalizes() {
        let mut a = app(&["2024-5-1"]);
        press(&mut a, KeyCode::Enter);
        press(&mut a, KeyCode::Tab);
        assert_eq!(a.focus, 1);
        assert!(!a.fields[0].picker.is_open());
        assert_eq!(a.fields[0].picker.model_value(), "2024-05-01");
    }

    #[test]
    fn click_outside_closes() {
        let mut a = app(&["2024-05-10"]);
        let (x, y) = centre(a.fields[0].picker.layout().input);
        click(&mut a, x, y);
        assert!(a.fields[0].picker.is_open());
        redraw(&mut a);

        click(&mut a, 59, 0);
        assert!(!a.fields[0].picker.is_open());
        assert_eq!(a.registry.borrow().listener_count(), 0);
    }

    #[test]
    fn click_on_day_selects_it() {
        let mut a = app(&["2024-05-10"]);
        press(&mut a, KeyCode::Enter);
        redraw(&mut a);

        let target = chrono::NaiveDate::from_ymd_opt(2024, 5, 21).unwrap();
        let (cell, _) = a.fields[0].picker.layout().cells.iter()
            .copied()
            .find(|(_, d)| *d == target)
            .unwrap();
        click(&mut a, cell.x + 1, cell.y);
        assert_eq!(a.fields[0].picker.model_value(), "2024-05-21");
        assert!(!a.fields[0].picker.is_open());
    }

    #[test]
    fn clicking_other_field_moves_focus() {
        let mut a = app(&["2024-05-10", ""]);
        let (x, y) = centre(a.fields[1].picker.layout().input);
        click(&mut a, x, y);
        assert_eq!(a.focus, 1);
        assert!(a.fields[1].picker.is_open());
        assert!(!a.fields[0].picker.is_open());
    }

    #[test]
    fn open_popover_takes_clicks_over_field_beneath() {
        let mut a = app(&["2024-05-10", ""]);
        press(&mut a, KeyCode::Enter);
        redraw(&mut a);

        // The first popover drops over the second input.
        let (x, y) = centre(a.fields[1].picker.layout().input);
        assert!(a.fields[0].picker.layout().popover.is_some_and(|p| p.contains(Position::new(x, y))));
        click(&mut a, x, y);
        assert_eq!(a.focus, 0);
        assert!(!a.fields[1].picker.is_open());
    }

    #[test]
    fn typing_updates_value() {
        let mut a = app(&[]);
        for c in "2024-02-30".chars() { press(&mut a, KeyCode::Char(c)); }
        assert_eq!(a.fields[0].picker.model_value(), "2024-02-30");
        press(&mut a, KeyCode::Tab);
        assert_eq!(a.fields[0].picker.model_value(), "2024-02-30");
    }

    #[test]
    fn values_serialize_in_order() {
        let a = app(&["2024-05-10", "2024-06-01"]);
        let json = serde_json::to_string(&a.values()).unwrap();
        assert_eq!(
            json,
            r#"[{"label":"Start date","value":"2024-05-10"},{"label":"End date","value":"2024-06-01"}]"#
        );
    }

    #[test]
    fn quit_keys() {
        let mut a = app(&[]);
        a.on_event(Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)));
        assert!(!a.running);
    }
}
