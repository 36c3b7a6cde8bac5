pub mod dispatcher;
pub mod handler;

use crate::config::Settings;
use crate::providers::Services;
use crate::session::Session;

pub use dispatcher::{Command, dispatch};

pub const CLEAR_SUCCESS: &str = "Conversation history cleared";
pub const NO_HISTORY: &str = "No history available.";
pub const HISTORY_TITLE: &str = "Recent Conversation History";
pub const EXPORT_SUCCESS: &str = "Full log exported";
pub const NO_HISTORY_EXPORT: &str = "No history to export";
pub const BLANK_PROMPT: &str = "Type a prompt, or try \"clear history\", \"view history\", \
    \"export full log\", \"generate image [prompt]\"...";
pub const IMAGE_GENERATED: &str = "Image generated";
pub const IMAGE_FAILED: &str = "Image generation failed";
pub const IMAGE_KEY_REQUIRED: &str = "Image generation requires DALL-E API key";
pub const NO_MODELS: &str = "No models found";
pub const NO_PRESETS: &str = "No presets configured";

/// Everything a command may read or change while handling one query.
pub struct CommandContext<'a> {
    pub settings: &'a Settings,
    pub services: &'a Services,
    pub session: &'a mut Session,
}

impl<'a> CommandContext<'a> {
    pub fn new(settings: &'a Settings, services: &'a Services, session: &'a mut Session) -> Self {
        Self {
            settings,
            services,
            session,
        }
    }
}
