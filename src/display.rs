use crate::core::error::LchatError;
use console::style;
use serde::Serialize;
use std::path::PathBuf;

pub const EXTENSION_ICON: &str = "images/icon.png";

/// What the host does when the user picks an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    #[serde(rename = "copy")]
    CopyToClipboard { text: String },
    #[serde(rename = "none")]
    DoNothing,
    #[serde(rename = "open")]
    OpenFile { path: PathBuf },
}

/// One row of the result list handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultItem {
    pub icon: String,
    pub name: String,
    pub description: String,
    pub on_enter: Action,
}

impl ResultItem {
    pub fn new(name: impl Into<String>, description: impl Into<String>, on_enter: Action) -> Self {
        Self {
            icon: EXTENSION_ICON.to_string(),
            name: name.into(),
            description: description.into(),
            on_enter,
        }
    }

    /// Item whose description is also what gets copied.
    pub fn copy(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(
            name,
            text.clone(),
            Action::CopyToClipboard { text },
        )
    }

    pub fn info(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, Action::DoNothing)
    }

    pub fn from_error(err: &LchatError) -> Self {
        Self::copy(err.title(), err.to_string())
    }
}

#[derive(Serialize)]
struct RenderResultList<'a> {
    items: &'a [ResultItem],
}

/// Serialize a result list as one line of JSON for the host.
pub fn items_to_json(items: &[ResultItem]) -> Result<String, LchatError> {
    Ok(serde_json::to_string(&RenderResultList { items })?)
}

/// Print a result list for a person at a terminal.
pub fn display_items(items: &[ResultItem]) {
    for (i, item) in items.iter().enumerate() {
        println!(
            "\n{} {}",
            style(format!("[{}]", i + 1)).dim(),
            style(&item.name).bold().cyan()
        );
        if !item.description.is_empty() {
            display_markdown(&item.description);
        }
        match &item.on_enter {
            Action::CopyToClipboard { text } if *text != item.description => {
                println!("{} {}", style("⏎ copy:").dim(), text);
            }
            Action::OpenFile { path } => {
                println!("{} {}", style("⏎ open:").dim(), path.display());
            }
            _ => {}
        }
    }
}

pub fn display_markdown(text: &str) {
    let skin = termimad::MadSkin::default();
    skin.print_text(text);
}
