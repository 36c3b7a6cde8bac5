use crate::cli::Args;
use crate::commands::{Command, CommandContext, dispatch};
use crate::config::{Keywords, Settings};
use crate::core::error::LchatError;
use crate::display::{self, ResultItem};
use crate::input;
use crate::providers::Services;
use crate::session::Session;
use console::style;
use is_terminal::IsTerminal;
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use tracing::{debug, warn};

/// Settings and clients, built once per process.
pub struct Ready {
    pub settings: Settings,
    pub services: Services,
}

impl Ready {
    pub fn new(settings: Settings) -> Result<Self, LchatError> {
        let services = Services::from_settings(&settings)?;
        Ok(Self { settings, services })
    }
}

/// One line of serve-mode input.
#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
struct HostEvent {
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default)]
    query: String,
}

impl HostEvent {
    /// A JSON object with `keyword`/`query`, or else the whole line as a query.
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.starts_with('{') {
            match serde_json::from_str(trimmed) {
                Ok(event) => return event,
                Err(e) => debug!("Treating line as plain text: {}", e),
            }
        }
        HostEvent {
            keyword: None,
            query: line.to_string(),
        }
    }
}

pub struct Application {
    pub args: Args,
    ready: Result<Ready, LchatError>,
    session: Session,
}

impl Application {
    /// A preferences error is kept and reported on every query instead of
    /// aborting, so the host always gets a result list back.
    pub fn new(args: Args, settings: Result<Settings, LchatError>) -> Self {
        Self {
            args,
            ready: settings.and_then(Ready::new),
            session: Session::new(),
        }
    }

    /// Route one query and return its result list. Never empty.
    pub async fn handle(&mut self, keyword: Option<&str>, query: &str) -> Vec<ResultItem> {
        let ready = match &self.ready {
            Ok(ready) => ready,
            Err(e) => {
                warn!("{}: {}", e.title(), e);
                return vec![ResultItem::from_error(e)];
            }
        };
        let command = Command::parse(keyword, query, &ready.settings.keywords);
        let mut ctx = CommandContext::new(&ready.settings, &ready.services, &mut self.session);
        dispatch(&command, &mut ctx).await
    }

    pub async fn run(&mut self) -> Result<(), LchatError> {
        if let Some(query) = self.args.query_text() {
            return self.handle_one_shot(&query).await;
        }
        if io::stdin().is_terminal() {
            self.handle_interactive_mode().await
        } else {
            self.handle_serve_mode().await
        }
    }

    async fn handle_one_shot(&mut self, query: &str) -> Result<(), LchatError> {
        let keyword = self.args.keyword.clone();
        let items = self.handle(keyword.as_deref(), query).await;

        if self.args.json || !io::stdout().is_terminal() {
            println!("{}", display::items_to_json(&items)?);
        } else {
            display::display_items(&items);
        }
        Ok(())
    }

    async fn handle_serve_mode(&mut self) -> Result<(), LchatError> {
        let stdin = io::stdin();
        self.serve(stdin.lock(), io::stdout()).await
    }

    /// Answer every input line with one JSON result line until EOF.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than ending the loop.
    pub async fn serve<R: BufRead, W: Write>(
        &mut self,
        mut reader: R,
        mut writer: W,
    ) -> Result<(), LchatError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            let raw = String::from_utf8_lossy(&buf);
            let line = raw.trim_end_matches(['\n', '\r']);
            let event = HostEvent::parse(line);
            let keyword = event.keyword.or_else(|| self.args.keyword.clone());
            let items = self.handle(keyword.as_deref(), &event.query).await;

            writeln!(writer, "{}", display::items_to_json(&items)?)?;
            writer.flush()?;
        }
    }

    async fn handle_interactive_mode(&mut self) -> Result<(), LchatError> {
        println!(
            "{}",
            style("Ask anything, or try \"view history\", \"clear history\", \"export full log\". Ctrl+D to exit.")
                .dim()
        );

        let mut editor = input::create_editor()?;

        while let Some(line) = input::read_input(&mut editor)? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (keyword, query) = match &self.ready {
                Ok(ready) => split_keyword(line, &ready.settings.keywords),
                Err(_) => (None, line),
            };
            let items = self.handle(keyword, query).await;
            display::display_items(&items);
        }

        if let Err(e) = input::save_history(&mut editor) {
            warn!("{}", e);
        }
        Ok(())
    }
}

/// Let a typed line start with one of the routing keywords.
fn split_keyword<'a>(line: &'a str, keywords: &Keywords) -> (Option<&'a str>, &'a str) {
    let (first, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    if first.eq_ignore_ascii_case(&keywords.models)
        || first.eq_ignore_ascii_case(&keywords.presets)
        || first.eq_ignore_ascii_case(&keywords.chat)
    {
        (Some(first), rest.trim())
    } else {
        (None, line)
    }
}
