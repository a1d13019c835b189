use chrono::{Duration, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Position, Rect};
use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    calendar::WEEK_LEN,
    dates::{self, CalendarDay, DateUtilities, DisplayFormat, Period},
    listener::{CloseEventListener, ElementRef, SharedRegistry},
    toggle::Toggle,
};

pub type DatePredicate = Box<dyn Fn(NaiveDate) -> bool>;

// ─── Options / events ─────────────────────────────────────────────────────────

pub struct PickerOptions {
    pub disabled:         bool,
    pub placeholder:      String,
    pub display_format:   DisplayFormat,
    /// Days this returns `true` for cannot be picked.
    pub is_date_disabled: Option<DatePredicate>,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            disabled:         false,
            placeholder:      String::new(),
            display_format:   DisplayFormat::default(),
            is_date_disabled: None,
        }
    }
}

/// Values the picker proposes to its host. The host owns the field value and
/// hands it back through [`DatePicker::set_model_value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    Update(String),
}

/// Hit-test geometry from the last draw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickerLayout {
    pub input:   Rect,
    pub popover: Option<Rect>,
    pub prev:    Rect,
    pub next:    Rect,
    pub cells:   Vec<(Rect, NaiveDate)>,
}

// ─── Picker ───────────────────────────────────────────────────────────────────

pub struct DatePicker {
    options:     PickerOptions,
    utils:       DateUtilities,
    model_value: String,
    period:      Period,
    cursor:      NaiveDate,
    toggle:      Rc<RefCell<Toggle>>,
    element:     ElementRef,
    listener:    CloseEventListener,
    layout:      PickerLayout,
}

impl DatePicker {
    pub fn new(options: PickerOptions, model_value: &str, registry: SharedRegistry) -> Self {
        let utils   = DateUtilities::new(options.display_format.clone());
        let toggle  = Rc::new(RefCell::new(Toggle::default()));
        let element = ElementRef::default();

        let target   = Rc::clone(&toggle);
        let listener = CloseEventListener::new(
            registry,
            element.clone(),
            Rc::new(move || { target.borrow_mut().close(); }),
        );

        let today  = dates::today();
        let cursor = utils.parse_date_string(Some(model_value)).unwrap_or(today);
        Self {
            period: utils.get_period_from_value_at(model_value, today),
            cursor,
            model_value: model_value.to_owned(),
            options, utils, toggle, element, listener,
            layout: PickerLayout::default(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn model_value(&self) -> &str        { &self.model_value }
    pub fn placeholder(&self) -> &str        { &self.options.placeholder }
    pub fn is_disabled(&self) -> bool        { self.options.disabled }
    pub fn is_open(&self)     -> bool        { self.toggle.borrow().is_open() }
    pub fn is_listening(&self) -> bool       { self.listener.is_active() }
    pub fn period(&self)      -> Period      { self.period }
    pub fn cursor(&self)      -> NaiveDate   { self.cursor }
    pub fn layout(&self)      -> &PickerLayout  { &self.layout }

    pub fn is_date_disabled(&self, date: NaiveDate) -> bool {
        self.options.is_date_disabled.as_ref().is_some_and(|f| f(date))
    }

    /// Host pushes the authoritative field value. The calendar follows it
    /// whenever it parses.
    pub fn set_model_value(&mut self, value: &str) {
        self.model_value = value.to_owned();
        if let Some(date) = self.utils.parse_date_string(Some(value)) {
            self.period = Period::of(date);
            self.cursor = date;
        }
    }

    /// Records where the picker was drawn; this is also the area that counts
    /// as "inside" for the close listener.
    pub fn set_layout(&mut self, layout: PickerLayout) {
        let mut areas = vec![layout.input];
        areas.extend(layout.popover);
        self.element.set(&areas);
        self.layout = layout;
    }

    // ── Open state ────────────────────────────────────────────────────────────

    pub fn open(&mut self) {
        if self.options.disabled { return; }
        if self.toggle.borrow_mut().open() { self.on_opened(); }
        self.sync_listener();
    }

    pub fn close(&mut self) {
        self.toggle.borrow_mut().close();
        self.sync_listener();
    }

    pub fn toggle(&mut self) {
        if self.options.disabled && !self.is_open() { return; }
        self.toggle.borrow_mut().toggle();
        if self.is_open() { self.on_opened(); }
        self.sync_listener();
    }

    /// Attaches the close listener while open and detaches it while closed.
    /// Call after dispatching document events, since those may close us.
    pub fn sync_listener(&mut self) {
        match (self.is_open(), self.listener.is_active()) {
            (true, false) => self.listener.add_close_events(),
            (false, true) => self.listener.remove_close_events(),
            _ => {}
        }
    }

    fn on_opened(&mut self) {
        let today = dates::today();
        self.period = self.utils.get_period_from_value_at(&self.model_value, today);
        self.cursor = self.utils.parse_date_string(Some(&self.model_value)).unwrap_or(today);
        if !self.period.contains(self.cursor) {
            self.cursor = self.period.first_day().unwrap_or(today);
        }
    }

    // ── Navigation ────────────────────────────────────────────────────────────

    pub fn prev_month(&mut self) { self.show_period(self.period.prev()); }
    pub fn next_month(&mut self) { self.show_period(self.period.next()); }

    fn show_period(&mut self, period: Period) {
        self.period = period;
        if !period.contains(self.cursor) {
            if let Some(first) = period.first_day() { self.cursor = first; }
        }
    }

    pub fn move_cursor(&mut self, days: i64) {
        let Some(next) = self.cursor.checked_add_signed(Duration::days(days)) else { return };
        self.cursor = next;
        self.period = Period::of(next);
    }

    // ── Value changes ─────────────────────────────────────────────────────────

    /// Picks `date`: emits it in the display format and closes the popover.
    pub fn select(&mut self, date: NaiveDate) -> Option<PickerEvent> {
        if self.options.disabled || self.is_date_disabled(date) { return None; }
        let value = self.utils.format_date_to_string(Some(date));
        tracing::debug!(%value, "date selected");
        self.cursor = date;
        self.close();
        Some(PickerEvent::Update(value))
    }

    fn edit(&mut self, value: String) -> Option<PickerEvent> {
        if let Some(date) = self.utils.parse_date_string(Some(&value)) {
            self.period = Period::of(date);
            self.cursor = date;
        }
        Some(PickerEvent::Update(value))
    }

    /// Focus left the field: normalize what was typed if it parses.
    pub fn blur(&mut self) -> Option<PickerEvent> {
        if self.options.disabled { return None; }
        let normalized = self.utils.value_to_input_format(&self.model_value);
        (normalized != self.model_value).then_some(PickerEvent::Update(normalized))
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PickerEvent> {
        if self.options.disabled { return None; }
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) { return None; }

        match key.code {
            KeyCode::Char(c) => {
                let mut value = self.model_value.clone();
                value.push(c);
                return self.edit(value);
            }
            KeyCode::Backspace if !self.model_value.is_empty() => {
                let mut value = self.model_value.clone();
                value.pop();
                return self.edit(value);
            }
            _ => {}
        }

        if !self.is_open() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Down) { self.open(); }
            return None;
        }

        match key.code {
            KeyCode::Left     => self.move_cursor(-1),
            KeyCode::Right    => self.move_cursor(1),
            KeyCode::Up       => self.move_cursor(-(WEEK_LEN as i64)),
            KeyCode::Down     => self.move_cursor(WEEK_LEN as i64),
            KeyCode::PageUp   => self.prev_month(),
            KeyCode::PageDown => self.next_month(),
            KeyCode::Enter    => return self.select(self.cursor),
            _ => {}
        }
        None
    }

    pub fn handle_click(&mut self, at: Position) -> Option<PickerEvent> {
        if self.options.disabled { return None; }
        if self.layout.input.contains(at) {
            self.toggle();
            return None;
        }
        if !self.is_open() { return None; }

        if self.layout.prev.contains(at) {
            self.prev_month();
        } else if self.layout.next.contains(at) {
            self.next_month();
        } else if let Some(&(_, date)) = self.layout.cells.iter().find(|(r, _)| r.contains(at)) {
            return self.select(date);
        }
        None
    }

    // ── Grid ──────────────────────────────────────────────────────────────────

    pub fn weeks(&self) -> Vec<Vec<CalendarDay>> { self.weeks_at(dates::today()) }

    pub fn weeks_at(&self, today: NaiveDate) -> Vec<Vec<CalendarDay>> {
        self.utils.calendar_weeks(
            self.period,
            &self.model_value,
            today,
            &|d: NaiveDate| self.is_date_disabled(d),
        )
    }
}
