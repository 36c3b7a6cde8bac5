use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Chat with OpenRouter models from a launcher or the terminal", long_about = None)]
pub struct Args {
    /// Query to handle. Omit to read queries from stdin or an interactive prompt
    #[arg(trailing_var_arg = true)]
    pub query: Vec<String>,

    /// Keyword the query was typed after (chat, model search or presets keyword)
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Preferences file to use instead of ~/.lchat/config.yaml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override a preference, e.g. --set model=openai/gpt-4o
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Print results as JSON even on a terminal
    #[arg(long)]
    pub json: bool,

    /// Skip deleting old conversation logs at startup
    #[arg(long)]
    pub no_cleanup: bool,
}

impl Args {
    /// The positional words joined back into one query, if any were given.
    pub fn query_text(&self) -> Option<String> {
        if self.query.is_empty() {
            None
        } else {
            Some(self.query.join(" "))
        }
    }
}
