//! Command line parsing for the interactive shell

use thiserror::Error;

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `go [url]`: optionally seed a URL, then run a round
    Go(Option<String>),

    /// `/re/ /re2/ ...`: filter by URL regex, then run a round
    Regex(Vec<String>),

    /// `save <dir>`: choose the download directory
    Save(String),

    /// `title <re> ...`: filter by anchor text, then run a round
    Title(Vec<String>),

    /// `wc <pattern> ...`: filter by URL wildcard, then run a round
    Wildcard(Vec<String>),

    /// `mime <type|alias> ...`: choose which downloads are saved
    Mime(Vec<String>),

    /// `domain <name> ...`: filter by domain, then run a round
    Domain(Vec<String>),

    /// `clear`: stop and forget everything
    Clear,

    /// `links`: list the links the current filters accept
    Links,

    /// `stats`: show the last round's statistics
    Stats,

    Help,
    Quit,

    /// A blank line
    Empty,
}

impl Command {
    /// Returns true if running the command starts a round
    pub fn starts_round(&self) -> bool {
        matches!(
            self,
            Self::Go(_) | Self::Regex(_) | Self::Title(_) | Self::Wildcard(_) | Self::Domain(_)
        )
    }
}

/// Errors produced while parsing a command line
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}' (type 'help' for a list)")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
}

/// Parses one line of user input
///
/// # Examples
///
/// ```
/// use roundcrawl::shell::{parse_command, Command};
///
/// assert_eq!(
///     parse_command("domain a.test b.test").unwrap(),
///     Command::Domain(vec!["a.test".to_string(), "b.test".to_string()])
/// );
/// assert_eq!(
///     parse_command("/\\.mp3$/").unwrap(),
///     Command::Regex(vec!["\\.mp3$".to_string()])
/// );
/// ```
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }

    if line.starts_with('/') {
        return Ok(Command::Regex(regex_arguments(line)));
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    let words = || rest.split_whitespace().map(str::to_string).collect();

    let command = match name {
        "go" => Command::Go((!rest.is_empty()).then(|| rest.to_string())),
        "save" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument("save"));
            }
            Command::Save(rest.to_string())
        }
        "title" => Command::Title(words()),
        "wc" => Command::Wildcard(words()),
        "mime" => Command::Mime(words()),
        "domain" => Command::Domain(words()),
        "clear" => Command::Clear,
        "links" => Command::Links,
        "stats" => Command::Stats,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(command)
}

/// Collects the patterns of every `/.../` token; other tokens are ignored
fn regex_arguments(line: &str) -> Vec<String> {
    line.split_whitespace()
        .filter_map(|token| {
            let inner = token.strip_prefix('/')?.strip_suffix('/');
            if inner.is_none() {
                tracing::warn!("Ignoring '{}': patterns are written as /regex/", token);
            }
            inner.map(str::to_string)
        })
        .collect()
}

/// Text printed by `help`
pub const HELP: &str = "\
Commands:
  go [url]            add a seed (optional) and run a round
  /regex/ ...         keep links whose URL matches, then run a round
  title <regex> ...   keep links whose text matches, then run a round
  wc <pattern> ...    keep links whose URL contains the wildcard, then run a round
  domain <name> ...   keep links on these domains, then run a round
  mime <type> ...     save downloads of these types (MP3, APP, IMG or a prefix)
  save <dir>          save downloads into an existing directory
  links               list links accepted by the current filters
  stats               show statistics of the last round
  clear               stop and forget all links and filters
  quit                leave

Ctrl-C stops a running round; at the prompt it leaves like quit.";
