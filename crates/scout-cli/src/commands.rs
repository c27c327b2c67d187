//! REPL input parsing.

use std::path::PathBuf;
use std::str::FromStr;

use scout_chat::QuickAction;
use scout_search::SearchEngineType;

pub const HELP: &str = "\
Commands:
  /models                          list models on the server
  /model <name>                    select a model
  /ps                              list models loaded on the server
  /version                         show the server version
  /server <url> [api-key]          change server and reconnect
  /search on|off                   toggle web search
  /stream on|off                   toggle streaming
  /engines                         list search engines
  /engine <id>                     select a search engine
  /engine-add <type> <name> <url> [api-key] [auth-header]
                                   add an engine (DUCKDUCKGO, API_GET, API_POST)
  /engine-rm <id>                  remove a search engine
  /image <path>                    attach an image to the next message
  /history                         show the conversation
  /delete <turn-id>                delete one turn
  /summarize                       summarize the conversation
  /tasks                           extract action items
  /simplify                        explain the last answer simply
  /cancel                          stop the current answer
  /clear                           clear the conversation
  /help                            show this help
  /quit                            exit
Anything else is sent as a message.";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(String),
    Models,
    Model(String),
    Running,
    Version,
    Server { url: String, api_key: Option<String> },
    WebSearch(bool),
    Streaming(bool),
    Engines,
    Engine(String),
    EngineAdd {
        engine_type: SearchEngineType,
        name: String,
        url: String,
        api_key: Option<String>,
        auth_header: Option<String>,
    },
    EngineRemove(String),
    Image(PathBuf),
    History,
    Delete(u64),
    Quick(QuickAction),
    Cancel,
    Clear,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: /{0} (try /help)")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Send(line.to_string()));
        };

        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        let command = match (name, args.as_slice()) {
            ("models", []) => Command::Models,
            ("model", [model]) => Command::Model(model.to_string()),
            ("model", _) => return Err(CommandError::Usage("/model <name>")),
            ("ps", []) => Command::Running,
            ("version", []) => Command::Version,
            ("server", [url]) => Command::Server { url: url.to_string(), api_key: None },
            ("server", [url, key]) => Command::Server {
                url: url.to_string(),
                api_key: Some(key.to_string()),
            },
            ("server", _) => return Err(CommandError::Usage("/server <url> [api-key]")),
            ("search", [flag]) => Command::WebSearch(parse_switch(flag, "/search on|off")?),
            ("search", _) => return Err(CommandError::Usage("/search on|off")),
            ("stream", [flag]) => Command::Streaming(parse_switch(flag, "/stream on|off")?),
            ("stream", _) => return Err(CommandError::Usage("/stream on|off")),
            ("engines", []) => Command::Engines,
            ("engine", [id]) => Command::Engine(id.to_string()),
            ("engine", _) => return Err(CommandError::Usage("/engine <id>")),
            ("engine-add", [kind, name, url, extra @ ..]) if extra.len() <= 2 => {
                let engine_type = kind
                    .parse::<SearchEngineType>()
                    .ok()
                    .filter(|t| *t != SearchEngineType::Unknown)
                    .ok_or(CommandError::Usage("engine type is DUCKDUCKGO, API_GET or API_POST"))?;
                Command::EngineAdd {
                    engine_type,
                    name: name.to_string(),
                    url: url.to_string(),
                    api_key: extra.first().map(|s| s.to_string()),
                    auth_header: extra.get(1).map(|s| s.to_string()),
                }
            }
            ("engine-add", _) => {
                return Err(CommandError::Usage(
                    "/engine-add <type> <name> <url> [api-key] [auth-header]",
                ))
            }
            ("engine-rm", [id]) => Command::EngineRemove(id.to_string()),
            ("engine-rm", _) => return Err(CommandError::Usage("/engine-rm <id>")),
            ("image", [path]) => Command::Image(PathBuf::from(path)),
            ("image", _) => return Err(CommandError::Usage("/image <path>")),
            ("history", []) => Command::History,
            ("delete", [id]) => Command::Delete(
                id.parse()
                    .map_err(|_| CommandError::Usage("/delete <turn-id>"))?,
            ),
            ("delete", _) => return Err(CommandError::Usage("/delete <turn-id>")),
            ("summarize", []) => Command::Quick(QuickAction::Summarize),
            ("tasks", []) => Command::Quick(QuickAction::ActionItems),
            ("simplify", []) => Command::Quick(QuickAction::Simplify),
            ("cancel", []) => Command::Cancel,
            ("clear", []) => Command::Clear,
            ("help", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            (other, _) => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn parse_switch(flag: &str, usage: &'static str) -> Result<bool, CommandError> {
    match flag.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => Err(CommandError::Usage(usage)),
    }
}
