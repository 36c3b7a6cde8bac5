use super::CommandContext;
use super::handler::{
    BlankCommand, ChatCommand, ClearHistoryCommand, CommandHandler, ExportLogCommand,
    GenerateImageCommand, ListPresetsCommand, SearchModelsCommand, ViewHistoryCommand,
};
use crate::config::Keywords;
use crate::display::ResultItem;
use tracing::{debug, error};

const CLEAR_HISTORY: &str = "clear history";
const VIEW_HISTORY: &str = "view history";
const EXPORT_FULL_LOG: &str = "export full log";
const GENERATE_IMAGE: &str = "generate image";

/// One query, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Blank,
    ClearHistory,
    ViewHistory,
    ExportLog,
    GenerateImage(String),
    SearchModels(String),
    ListPresets(String),
    Chat(String),
}

impl Command {
    pub fn parse(keyword: Option<&str>, query: &str, keywords: &Keywords) -> Self {
        let query = query.trim();

        if let Some(keyword) = keyword.map(str::trim) {
            if keyword.eq_ignore_ascii_case(&keywords.models) {
                return Command::SearchModels(query.to_string());
            }
            if keyword.eq_ignore_ascii_case(&keywords.presets) {
                return Command::ListPresets(query.to_string());
            }
        }

        if query.is_empty() {
            return Command::Blank;
        }

        match query.to_lowercase().as_str() {
            CLEAR_HISTORY => return Command::ClearHistory,
            VIEW_HISTORY => return Command::ViewHistory,
            EXPORT_FULL_LOG => return Command::ExportLog,
            _ => {}
        }

        if let Some(prompt) = strip_phrase(query, GENERATE_IMAGE) {
            return Command::GenerateImage(prompt.to_string());
        }

        Command::Chat(query.to_string())
    }

    fn handler(&self) -> &'static dyn CommandHandler {
        match self {
            Command::Blank => &BlankCommand,
            Command::ClearHistory => &ClearHistoryCommand,
            Command::ViewHistory => &ViewHistoryCommand,
            Command::ExportLog => &ExportLogCommand,
            Command::GenerateImage(_) => &GenerateImageCommand,
            Command::SearchModels(_) => &SearchModelsCommand,
            Command::ListPresets(_) => &ListPresetsCommand,
            Command::Chat(_) => &ChatCommand,
        }
    }

    fn args(&self) -> &str {
        match self {
            Command::GenerateImage(text)
            | Command::SearchModels(text)
            | Command::ListPresets(text)
            | Command::Chat(text) => text,
            Command::Blank | Command::ClearHistory | Command::ViewHistory | Command::ExportLog => "",
        }
    }
}

/// `phrase` at the start of `query` (any case), followed by whitespace or nothing.
fn strip_phrase<'a>(query: &'a str, phrase: &str) -> Option<&'a str> {
    let head = query.get(..phrase.len())?;
    if !head.eq_ignore_ascii_case(phrase) {
        return None;
    }
    let rest = &query[phrase.len()..];
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Phrases offered for completion in the interactive editor.
pub fn command_phrases() -> Vec<&'static str> {
    vec![CLEAR_HISTORY, VIEW_HISTORY, EXPORT_FULL_LOG, GENERATE_IMAGE]
}

/// Run `command` and return what the host should render.
///
/// Never fails and never returns an empty list: handler errors become a
/// single error item.
pub async fn dispatch(command: &Command, ctx: &mut CommandContext<'_>) -> Vec<ResultItem> {
    debug!("Dispatching {:?}", command);
    match command.handler().execute(ctx, command.args()).await {
        Ok(items) if !items.is_empty() => items,
        Ok(_) => vec![ResultItem::info(super::BLANK_PROMPT, "")],
        Err(e) => {
            error!("{}: {}", e.title(), e);
            vec![ResultItem::from_error(&e)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> Command {
        Command::parse(Some("gpt"), query, &Keywords::default())
    }

    #[test]
    fn classifies_fixed_phrases_in_any_case() {
        assert_eq!(parse(""), Command::Blank);
        assert_eq!(parse("   "), Command::Blank);
        assert_eq!(parse("clear history"), Command::ClearHistory);
        assert_eq!(parse("Clear History "), Command::ClearHistory);
        assert_eq!(parse("VIEW HISTORY"), Command::ViewHistory);
        assert_eq!(parse("export full log"), Command::ExportLog);
    }

    #[test]
    fn generate_image_takes_the_rest_as_prompt() {
        assert_eq!(
            parse("generate image a red fox"),
            Command::GenerateImage("a red fox".into())
        );
        assert_eq!(parse("Generate Image"), Command::GenerateImage(String::new()));
        assert_eq!(
            parse("generate imagery of cats"),
            Command::Chat("generate imagery of cats".into())
        );
    }

    #[test]
    fn everything_else_is_chat() {
        assert_eq!(parse("Hello"), Command::Chat("Hello".into()));
        assert_eq!(
            parse("clear history please"),
            Command::Chat("clear history please".into())
        );
        assert_eq!(parse("héllo wörld"), Command::Chat("héllo wörld".into()));
    }

    #[test]
    fn alternate_keywords_route_to_models_and_presets() {
        let keywords = Keywords::default();
        assert_eq!(
            Command::parse(Some("models"), " gpt ", &keywords),
            Command::SearchModels("gpt".into())
        );
        assert_eq!(
            Command::parse(Some("Presets"), "", &keywords),
            Command::ListPresets(String::new())
        );
        assert_eq!(
            Command::parse(None, "models", &keywords),
            Command::Chat("models".into())
        );
    }

    #[test]
    fn custom_keywords_are_honoured() {
        let keywords = Keywords {
            chat: "ai".into(),
            models: "m".into(),
            presets: "p".into(),
        };
        assert_eq!(
            Command::parse(Some("m"), "claude", &keywords),
            Command::SearchModels("claude".into())
        );
        assert_eq!(
            Command::parse(Some("models"), "claude", &keywords),
            Command::Chat("claude".into())
        );
    }
}
