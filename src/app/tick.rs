use super::{App, Screen};

impl App {
    /// Called on every tick of the main loop.
    ///
    /// Applies whatever the form's status poller has reported since the last
    /// tick and surfaces the notices that produced.
    pub(crate) fn on_tick(&mut self) {
        if let Screen::AgentForm(form) = &mut self.screen {
            if form.controller.poll_events() > 0 {
                form.clamp_selection();
            }
        }
        self.absorb_form_notices();
    }
}
