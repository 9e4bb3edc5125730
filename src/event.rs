use crossterm::event::KeyEvent;

/// Console events.
#[derive(Debug)]
pub enum Event {
    /// Sent at a regular interval; drains the form's poll events.
    Tick,
    Key(KeyEvent),
    /// Terminal size changed; the next frame redraws everything.
    Resize,
}
