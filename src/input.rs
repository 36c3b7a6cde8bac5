use crate::commands::dispatcher::command_phrases;
use crate::config::Preferences;
use crate::core::error::LchatError;

use console::style;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, EditMode, Editor, Helper};
use std::path::PathBuf;

/// Completes the router's fixed phrases ("clear history", ...) from the line start.
pub struct PhraseCompleter {
    phrases: Vec<&'static str>,
}

impl PhraseCompleter {
    pub fn new() -> Self {
        Self {
            phrases: command_phrases(),
        }
    }

    fn candidates(&self, typed: &str) -> Vec<Pair> {
        let typed = typed.to_lowercase();
        self.phrases
            .iter()
            .filter(|phrase| !typed.is_empty() && phrase.starts_with(&typed))
            .map(|phrase| Pair {
                display: phrase.to_string(),
                replacement: phrase.to_string(),
            })
            .collect()
    }
}

impl Completer for PhraseCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok((0, self.candidates(&line[..pos])))
    }
}

pub struct LchatHelper {
    completer: PhraseCompleter,
    hinter: HistoryHinter,
}

impl LchatHelper {
    pub fn new() -> Self {
        Self {
            completer: PhraseCompleter::new(),
            hinter: HistoryHinter {},
        }
    }
}

impl Helper for LchatHelper {}

impl Completer for LchatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Hinter for LchatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for LchatHelper {}

impl Validator for LchatHelper {}

fn history_path() -> PathBuf {
    Preferences::config_dir().join("input_history.txt")
}

pub fn create_editor() -> Result<Editor<LchatHelper, FileHistory>, LchatError> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();

    let mut editor = Editor::with_config(config)
        .map_err(|e| LchatError::Input(format!("Failed to create line editor: {}", e)))?;
    editor.set_helper(Some(LchatHelper::new()));
    let _ = editor.load_history(&history_path());

    Ok(editor)
}

/// Read one line. `None` means the user asked to leave (Ctrl-C / Ctrl-D).
pub fn read_input(
    editor: &mut Editor<LchatHelper, FileHistory>,
) -> Result<Option<String>, LchatError> {
    let prompt = style("lchat> ").bold().cyan().to_string();
    match editor.readline(&prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                editor
                    .add_history_entry(line.as_str())
                    .map_err(|e| LchatError::Input(format!("Failed to add history entry: {}", e)))?;
            }
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(err) => Err(LchatError::Input(format!("Input error: {}", err))),
    }
}

pub fn save_history(editor: &mut Editor<LchatHelper, FileHistory>) -> Result<(), LchatError> {
    let path = history_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    editor
        .save_history(&path)
        .map_err(|e| LchatError::Input(format!("Failed to save history: {}", e)))
}
