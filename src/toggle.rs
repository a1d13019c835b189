/// Open/closed flag for the calendar popover. Starts closed.
///
/// `open` and `close` only act on a real transition and report whether one
/// happened, so redundant calls (several close listeners firing in the same
/// turn) are harmless.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Toggle {
    opened: bool,
}

impl Toggle {
    pub fn new(initial: bool) -> Self { Self { opened: initial } }

    pub fn is_open(&self) -> bool { self.opened }

    pub fn open(&mut self) -> bool {
        if self.opened { return false; }
        self.opened = true;
        tracing::debug!("popover opened");
        true
    }

    pub fn close(&mut self) -> bool {
        if !self.opened { return false; }
        self.opened = false;
        tracing::debug!("popover closed");
        true
    }

    pub fn toggle(&mut self) {
        self.opened = !self.opened;
        tracing::debug!(opened = self.opened, "popover toggled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        assert!(!Toggle::default().is_open());
        assert!(Toggle::new(true).is_open());
    }

    #[test]
    fn open_is_idempotent() {
        let mut t = Toggle::default();
        assert!(t.open());
        assert!(!t.open());
        assert!(t.is_open());
    }

    #[test]
    fn close_on_fresh_instance_is_noop() {
        let mut t = Toggle::default();
        assert!(!t.close());
        assert!(!t.is_open());
    }

    #[test]
    fn toggle_flips() {
        let mut t = Toggle::default();
        t.toggle();
        assert!(t.is_open());
        t.toggle();
        assert!(!t.is_open());
        assert!(!t.close());
    }
}
