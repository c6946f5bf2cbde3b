use std::sync::Arc;

use crate::core::backend::{ChatBackend, ChatSession};
use crate::ui::theme::Theme;

pub mod actions;
pub mod conversation;
pub mod session;
pub mod ui_state;


pub use actions::{
    apply_action, apply_actions, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand,
};
pub use conversation::{ConversationController, SubmitOutcome};
pub use session::SessionContext;
pub use ui_state::UiState;

pub struct App {
    pub session: SessionContext,
    pub ui: UiState,
}

impl App {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        chat: Option<Arc<dyn ChatSession>>,
        theme: Theme,
    ) -> Self {
        Self {
            session: SessionContext::new(backend, chat),
            ui: UiState::new(theme),
        }
    }

    /// Returns a controller for conversation operations.
    ///
    /// The conversation controller owns the submit / stream / finish cycle
    /// and keeps the transcript scrolled while replies arrive.
    pub fn conversation(&mut self) -> ConversationController<'_> {
        ConversationController::new(&mut self.session, &mut self.ui)
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.session.is_current_stream(stream_id)
    }

    pub fn input_area_height(&self, term_width: u16) -> u16 {
        self.ui.calculate_input_area_height(term_width)
    }

    /// Rows left for the transcript in a terminal of the given size.
    pub fn transcript_height(&self, ctx: AppActionContext) -> u16 {
        let input_area_height = self.input_area_height(ctx.term_width);
        // Title row, status row, and the input's top and bottom borders.
        ctx.term_height.saturating_sub(input_area_height + 4)
    }

    pub fn title(&self) -> String {
        format!(
            "Parley v{} - {} ({})",
            env!("CARGO_PKG_VERSION"),
            self.session.provider_name,
            self.session.model
        )
    }
}
