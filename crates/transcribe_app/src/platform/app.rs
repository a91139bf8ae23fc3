use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use tokio::sync::mpsc::UnboundedReceiver;
use transcribe_core::{update, AppState, AppViewModel, Msg, UrlState};
use transcribe_engine::SessionHistory;

use super::effects::EffectRunner;
use super::render;
use crate::cli::Action;

/// How often the loop rechecks for idleness while waiting on messages.
const IDLE_CHECK: Duration = Duration::from_millis(100);

/// Single-actor session loop: every message goes through `update`, and the
/// resulting effects run before the next message is taken.
pub(crate) struct App {
    state: AppState,
    runner: EffectRunner,
    msg_rx: UnboundedReceiver<Msg>,
    last_status: Option<String>,
}

impl App {
    pub(crate) fn new(runner: EffectRunner, msg_rx: UnboundedReceiver<Msg>) -> Self {
        Self {
            state: AppState::new(),
            runner,
            msg_rx,
            last_status: None,
        }
    }

    /// Restores stored state against the current address. `arrival` is pushed
    /// first, as if the session was opened from that link.
    pub(crate) fn boot(&mut self, arrival: Option<UrlState>) {
        if let Some(url) = arrival {
            let query = url.to_query();
            self.runner
                .session_mut()
                .navigate(|history| history.push(query));
        }
        let persisted = self.runner.session().snapshot();
        let url = UrlState::from_query(self.runner.session().navigation().current());
        self.dispatch(Msg::Boot { persisted, url });
    }

    pub(crate) fn perform(&mut self, action: Action) {
        match action {
            Action::Send(msg) => self.dispatch(msg),
            Action::Back => self.replay("back", |history| history.back().map(str::to_string)),
            Action::Forward => {
                self.replay("forward", |history| history.forward().map(str::to_string))
            }
        }
    }

    /// Processes messages until no remote work is left or the user interrupts.
    pub(crate) async fn drain(&mut self) {
        loop {
            while let Ok(msg) = self.msg_rx.try_recv() {
                self.dispatch(msg);
            }
            if self.runner.is_idle() {
                match self.msg_rx.try_recv() {
                    Ok(msg) => {
                        self.dispatch(msg);
                        continue;
                    }
                    Err(_) => return,
                }
            }
            tokio::select! {
                msg = self.msg_rx.recv() => match msg {
                    Some(msg) => self.dispatch(msg),
                    None => return,
                },
                _ = tokio::signal::ctrl_c() => {
                    engine_warn!("Interrupted; abandoning outstanding jobs");
                    return;
                }
                _ = tokio::time::sleep(IDLE_CHECK) => {}
            }
        }
    }

    pub(crate) fn shutdown(&mut self) {
        self.runner.shutdown();
    }

    pub(crate) fn view(&self) -> AppViewModel {
        self.state.view()
    }

    fn replay(
        &mut self,
        direction: &str,
        step: impl FnOnce(&mut SessionHistory) -> Option<String>,
    ) {
        if !self.runner.session().navigation().is_listening() {
            engine_warn!("Ignoring {}: no navigation listener", direction);
            return;
        }
        match self.runner.session_mut().navigate(step) {
            Some(query) => {
                engine_debug!("Replaying {} to ?{}", direction, query);
                self.dispatch(Msg::Navigated(UrlState::from_query(&query)));
            }
            None => println!("Nothing to go {direction} to."),
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let dirty = state.consume_dirty();
        self.state = state;
        self.runner.run(effects);

        if dirty {
            let status = render::status_line(&self.state.view());
            if status.is_some() && status != self.last_status {
                if let Some(line) = &status {
                    println!("{line}");
                }
                self.last_status = status;
            }
        }
    }
}
