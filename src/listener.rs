//! Document-level interaction listeners and the "interact outside to close"
//! helper built on them.
//!
//! The app owns one [`EventRegistry`] and feeds it every click, key and focus
//! change after the focused widget has had its turn. Widgets register into it
//! for interactions that happen anywhere on screen.

use crossterm::event::KeyCode;
use ratatui::layout::{Position, Rect};
use std::cell::RefCell;
use std::rc::Rc;

// ─── Events ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind { Click, KeyUp, FocusIn }

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Click   { at: Position },
    KeyUp   { key: KeyCode },
    /// Focus moved to the widget occupying `area`.
    FocusIn { area: Rect },
}

impl UiEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            UiEvent::Click { .. }   => EventKind::Click,
            UiEvent::KeyUp { .. }   => EventKind::KeyUp,
            UiEvent::FocusIn { .. } => EventKind::FocusIn,
        }
    }

    pub fn key(&self) -> Option<KeyCode> {
        match self {
            UiEvent::KeyUp { key } => Some(*key),
            _ => None,
        }
    }
}

// ─── Element reference ────────────────────────────────────────────────────────

/// Screen areas covered by a widget and its descendants, refreshed after every
/// draw. Clones share the same areas.
#[derive(Debug, Clone, Default)]
pub struct ElementRef(Rc<RefCell<Vec<Rect>>>);

impl ElementRef {
    pub fn set(&self, areas: &[Rect]) {
        let mut cur = self.0.borrow_mut();
        cur.clear();
        cur.extend(areas.iter().copied().filter(|a| !a.is_empty()));
    }

    #[cfg(test)]
    pub fn clear(&self) { self.0.borrow_mut().clear(); }

    /// Whether the event's target is this element or one of its descendants.
    pub fn contains(&self, event: &UiEvent) -> bool {
        let areas = self.0.borrow();
        match event {
            UiEvent::Click { at }     => areas.iter().any(|a| a.contains(*at)),
            UiEvent::FocusIn { area } => areas.iter().any(|a| encloses(*a, *area)),
            UiEvent::KeyUp { .. }     => false,
        }
    }
}

fn encloses(outer: Rect, inner: Rect) -> bool {
    inner.x >= outer.x && inner.y >= outer.y
        && inner.right() <= outer.right() && inner.bottom() <= outer.bottom()
}

// ─── Registry ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Handler = Rc<dyn Fn(&UiEvent)>;

#[derive(Default)]
pub struct EventRegistry {
    next_id:   u64,
    listeners: Vec<(ListenerId, EventKind, Handler)>,
}

pub type SharedRegistry = Rc<RefCell<EventRegistry>>;

impl EventRegistry {
    pub fn shared() -> SharedRegistry { Rc::new(RefCell::new(Self::default())) }

    pub fn add_listener(&mut self, kind: EventKind, handler: Handler) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, kind, handler));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        self.listeners.len() != before
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize { self.listeners.len() }

    fn handlers_for(&self, kind: EventKind) -> Vec<Handler> {
        self.listeners.iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| Rc::clone(h))
            .collect()
    }
}

/// Runs every listener registered for the event's kind. Handlers are
/// snapshotted first, so they may add or remove listeners while running.
pub fn dispatch(registry: &SharedRegistry, event: &UiEvent) {
    let handlers = registry.borrow().handlers_for(event.kind());
    for h in handlers { h(event); }
}

// ─── Close-on-outside-interaction ─────────────────────────────────────────────

const CLOSE_EVENTS: [EventKind; 3] = [EventKind::Click, EventKind::KeyUp, EventKind::FocusIn];

/// Calls `close` on Escape, or when a click/focus lands outside `element`,
/// while attached. Detaches on drop, including during unwinding.
pub struct CloseEventListener {
    registry: SharedRegistry,
    element:  ElementRef,
    close:    Rc<dyn Fn()>,
    attached: Option<Vec<ListenerId>>,
}

impl CloseEventListener {
    pub fn new(registry: SharedRegistry, element: ElementRef, close: Rc<dyn Fn()>) -> Self {
        Self { registry, element, close, attached: None }
    }

    pub fn is_active(&self) -> bool { self.attached.is_some() }

    pub fn add_close_events(&mut self) {
        if self.attached.is_some() { return; }

        let element = self.element.clone();
        let close   = Rc::clone(&self.close);
        let handler: Handler = Rc::new(move |event: &UiEvent| {
            if let Some(key) = event.key() {
                if key == KeyCode::Esc { close(); }
            } else if !element.contains(event) {
                close();
            }
        });

        let mut registry = self.registry.borrow_mut();
        let ids = CLOSE_EVENTS.iter()
            .map(|&kind| registry.add_listener(kind, Rc::clone(&handler)))
            .collect();
        self.attached = Some(ids);
        tracing::debug!("close listeners attached");
    }

    pub fn remove_close_events(&mut self) {
        let Some(ids) = self.attached.take() else { return };
        let mut registry = self.registry.borrow_mut();
        for id in ids { registry.remove_listener(id); }
        tracing::debug!("close listeners detached");
    }
}

impl Drop for CloseEventListener {
    fn drop(&mut self) { self.remove_close_events(); }
}
