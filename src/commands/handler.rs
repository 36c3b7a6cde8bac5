use super::*;
use crate::core::error::LchatError;
use crate::display::{Action, ResultItem};
use crate::logbook::{self, LogDocument};
use crate::providers::openrouter::filter_models;
use crate::session::QUOTA_LIMIT;
use crate::utils::text::{truncate_preview, wrap_text};
use async_trait::async_trait;
use chrono::Local;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const HISTORY_PREVIEW_COUNT: usize = 5;
const HISTORY_PREVIEW_CHARS: usize = 50;
const REPLY_PREVIEW_CHARS: usize = 200;
const MODEL_RESULTS_LIMIT: usize = 8;

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        args: &str,
    ) -> Result<Vec<ResultItem>, LchatError>;

    fn help(&self) -> &'static str;
}

pub struct BlankCommand;
pub struct ClearHistoryCommand;
pub struct ViewHistoryCommand;
pub struct ExportLogCommand;
pub struct GenerateImageCommand;
pub struct SearchModelsCommand;
pub struct ListPresetsCommand;
pub struct ChatCommand;

#[async_trait]
impl CommandHandler for BlankCommand {
    async fn execute(
        &self,
        _ctx: &mut CommandContext<'_>,
        _args: &str,
    ) -> Result<Vec<ResultItem>, LchatError> {
        let help_text = [
            ChatCommand.help(),
            ClearHistoryCommand.help(),
            ViewHistoryCommand.help(),
            ExportLogCommand.help(),
            GenerateImageCommand.help(),
        ]
        .join("\n");
        Ok(vec![ResultItem::info(BLANK_PROMPT, help_text)])
    }

    fn help(&self) -> &'static str {
        "(empty) - Show this help"
    }
}

#[async_trait]
impl CommandHandler for ClearHistoryCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _args: &str,
    ) -> Result<Vec<ResultItem>, LchatError> {
        ctx.session.clear();
        info!("Conversation history cleared");
        Ok(vec![ResultItem::info(CLEAR_SUCCESS, "")])
    }

    fn help(&self) -> &'static str {
        "clear history - Forget the current conversation"
    }
}

#[async_trait]
impl CommandHandler for ViewHistoryCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _args: &str,
    ) -> Result<Vec<ResultItem>, LchatError> {
        let preview = ctx
            .session
            .recent(HISTORY_PREVIEW_COUNT)
            .iter()
            .map(|ex| {
                format!(
                    "User: {} AI: {}",
                    truncate_preview(&ex.user, HISTORY_PREVIEW_CHARS),
                    truncate_preview(&ex.ai, HISTORY_PREVIEW_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let preview = if preview.is_empty() {
            NO_HISTORY.to_string()
        } else {
            preview
        };
        Ok(vec![ResultItem::new(
            HISTORY_TITLE,
            preview.clone(),
            Action::CopyToClipboard { text: preview },
        )])
    }

    fn help(&self) -> &'static str {
        "view history - Preview the last five exchanges"
    }
}

#[async_trait]
impl CommandHandler for ExportLogCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _args: &str,
    ) -> Result<Vec<ResultItem>, LchatError> {
        if ctx.session.is_empty() {
            return Ok(vec![ResultItem::info(NO_HISTORY_EXPORT, "")]);
        }

        let endpoint = ctx.services.chat.endpoint();
        let settings = ctx.settings;
        let document = LogDocument {
            timestamp: Local::now(),
            model: &settings.model,
            system_prompt: &settings.system_prompt,
            temperature: settings.temperature,
            line_wrap: settings.line_wrap,
            endpoint: &endpoint,
            response_time: Default::default(),
            history: ctx.session.exchanges(),
            user_prompt: "",
            ai_response: "",
            error: None,
        };
        let path = logbook::save_log(&settings.log_directory, &document.render())?;
        info!("Full log exported to {}", path.display());

        Ok(vec![ResultItem::new(
            EXPORT_SUCCESS,
            format!("Path: {}", path.display()),
            Action::OpenFile { path },
        )])
    }

    fn help(&self) -> &'static str {
        "export full log - Write the whole conversation to a markdown file"
    }
}

#[async_trait]
impl CommandHandler for GenerateImageCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        prompt: &str,
    ) -> Result<Vec<ResultItem>, LchatError> {
        let Some(images) = &ctx.services.images else {
            return Ok(vec![ResultItem::info(
                IMAGE_KEY_REQUIRED,
                "Set dalle_api_key in preferences",
            )]);
        };
        if prompt.is_empty() {
            return Ok(vec![ResultItem::info(
                "Describe the image",
                "Usage: generate image <prompt>",
            )]);
        }

        match images.generate(prompt).await {
            Ok(url) => Ok(vec![ResultItem::copy(IMAGE_GENERATED, url)]),
            Err(e) => {
                warn!("Image generation failed: {}", e);
                Ok(vec![ResultItem::copy(IMAGE_FAILED, format!("Error: {}", e))])
            }
        }
    }

    fn help(&self) -> &'static str {
        "generate image <prompt> - Create an image (needs dalle_api_key)"
    }
}

#[async_trait]
impl CommandHandler for SearchModelsCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        term: &str,
    ) -> Result<Vec<ResultItem>, LchatError> {
        let models = ctx.services.openrouter.list_models().await?;
        let items: Vec<ResultItem> = filter_models(&models, term, MODEL_RESULTS_LIMIT)
            .into_iter()
            .map(|m| {
                ResultItem::new(
                    m.id.clone(),
                    m.display_name(),
                    Action::CopyToClipboard { text: m.id.clone() },
                )
            })
            .collect();

        if items.is_empty() {
            return Ok(vec![ResultItem::info(
                NO_MODELS,
                format!("Nothing matches '{}'", term),
            )]);
        }
        Ok(items)
    }

    fn help(&self) -> &'static str {
        "<models keyword> <term> - Search the model catalog"
    }
}

/// Parse the `custom_presets` preference: a JSON object of name to prompt.
pub fn parse_presets(raw: &str) -> Result<BTreeMap<String, String>, LchatError> {
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(raw).map_err(|e| LchatError::PresetJson(e.to_string()))
}

#[async_trait]
impl CommandHandler for ListPresetsCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        filter: &str,
    ) -> Result<Vec<ResultItem>, LchatError> {
        let presets = parse_presets(&ctx.settings.custom_presets)?;
        if presets.is_empty() {
            return Ok(vec![ResultItem::info(
                NO_PRESETS,
                "Add a JSON object to custom_presets",
            )]);
        }

        let needle = filter.to_lowercase();
        let items: Vec<ResultItem> = presets
            .into_iter()
            .filter(|(name, _)| name.to_lowercase().contains(&needle))
            .map(|(name, prompt)| ResultItem::copy(name, prompt))
            .collect();

        if items.is_empty() {
            return Ok(vec![ResultItem::info(
                NO_PRESETS,
                format!("No preset matches '{}'", filter),
            )]);
        }
        Ok(items)
    }

    fn help(&self) -> &'static str {
        "<presets keyword> [name] - Copy a saved prompt"
    }
}

#[async_trait]
impl CommandHandler for ChatCommand {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        query: &str,
    ) -> Result<Vec<ResultItem>, LchatError> {
        if ctx.session.quota_exhausted() {
            let err = LchatError::QuotaExceeded(QUOTA_LIMIT);
            warn!("{}", err);
            return Ok(vec![ResultItem::from_error(&err)]);
        }

        let settings = ctx.settings;
        let started = Instant::now();
        let result = ctx
            .services
            .chat
            .complete(&settings.system_prompt, ctx.session.exchanges(), query)
            .await;

        match result {
            Ok(reply) => {
                let formatted = if settings.enable_wrapping {
                    wrap_text(&reply, settings.line_wrap, settings.theme)
                } else {
                    reply.clone()
                };
                ctx.session.record_completion(query.to_string(), reply.clone());
                debug!(
                    "Completion {} of {} this session",
                    ctx.session.completions(),
                    QUOTA_LIMIT
                );

                if let Some(path) = write_log(ctx, started, query, &reply, None) {
                    info!("Log saved to: {}", path.display());
                }

                Ok(vec![ResultItem::new(
                    format!("Response from {}", settings.model_short_name()),
                    truncate_preview(&formatted, REPLY_PREVIEW_CHARS),
                    Action::CopyToClipboard { text: reply },
                )])
            }
            Err(e) => {
                error!("Chat request failed: {}", e);
                let message = e.to_string();
                write_log(ctx, started, query, "", Some(&message));
                Ok(vec![ResultItem::from_error(&e)])
            }
        }
    }

    fn help(&self) -> &'static str {
        "<anything else> - Ask the model"
    }
}

/// Best-effort conversation log; failures are logged and swallowed.
fn write_log(
    ctx: &CommandContext<'_>,
    started: Instant,
    prompt: &str,
    response: &str,
    error: Option<&str>,
) -> Option<PathBuf> {
    let endpoint = ctx.services.chat.endpoint();
    let settings = ctx.settings;
    let document = LogDocument {
        timestamp: Local::now(),
        model: &settings.model,
        system_prompt: &settings.system_prompt,
        temperature: settings.temperature,
        line_wrap: settings.line_wrap,
        endpoint: &endpoint,
        response_time: started.elapsed(),
        history: ctx.session.exchanges(),
        user_prompt: prompt,
        ai_response: response,
        error,
    };

    match logbook::save_log(&settings.log_directory, &document.render()) {
        Ok(path) => Some(path),
        Err(e) => {
            error!("Failed to save log: {}", e);
            None
        }
    }
}
