use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scout_chat::{ChatEngine, EngineConfig, Settings};
use scout_cli::{
    commands::{Command, HELP},
    config::Config,
    render,
    store::SettingsStore,
};
use scout_llm::{LlmClient, OllamaClient, OllamaConfig};
use scout_search::{SearchClientConfig, SearchEngineConfig, WebSearchClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Scout");

    let store = SettingsStore::new(&config.storage.settings_path);
    let settings = store.load_or_else(|| {
        let mut settings = Settings::new(&config.ollama.url);
        settings.api_key = config.ollama_api_key.clone();
        settings
    });

    let llm = build_llm(&config, &settings.server_url, settings.api_key.clone())?;
    let search = Arc::new(WebSearchClient::new(SearchClientConfig::from(&config.search))?);
    let engine = ChatEngine::new(llm, search, settings, EngineConfig::from(&config.engine));

    let autosave = store.autosave(engine.subscribe_settings());
    let renderer = render::spawn(engine.subscribe());

    if engine.connect().await.is_err() {
        tracing::warn!("Starting without a reachable server");
    }
    println!("Type a message, or /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = execute(&engine, &config, command).await {
            eprintln!("{:#}", e);
        }
    }

    engine.cancel().await;
    renderer.abort();
    drop(engine);
    let _ = autosave.await;
    Ok(())
}

async fn execute(engine: &ChatEngine, config: &Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Send(text) => {
            // Errors are shown through the session's error banner.
            let _ = engine.send(text).await;
        }
        Command::Models => {
            let models = engine.refresh_models().await?;
            let current = engine.settings().model;
            for model in models {
                let marker = if current.as_deref() == Some(model.as_str()) { "*" } else { " " };
                println!("{} {}", marker, model);
            }
        }
        Command::Model(model) => {
            engine.select_model(model.as_str());
            println!("Model set to {}", model);
        }
        Command::Running => {
            let running = engine.running_models().await?;
            if running.is_empty() {
                println!("No models loaded");
            }
            for model in running {
                println!("{}  {:.1} GB", model.name, model.size as f64 / 1e9);
            }
        }
        Command::Version => println!("Ollama {}", engine.server_version().await?),
        Command::Server { url, api_key } => {
            let llm = build_llm(config, &url, api_key.clone())?;
            engine.set_connection(url, api_key, llm).await?;
        }
        Command::WebSearch(enabled) => {
            engine.toggle_web_search(enabled);
            println!("Web search {}", if enabled { "on" } else { "off" });
        }
        Command::Streaming(enabled) => {
            engine.toggle_streaming(enabled);
            println!("Streaming {}", if enabled { "on" } else { "off" });
        }
        Command::Engines => {
            let settings = engine.settings();
            let selected = settings.search_engines.selected();
            for e in settings.search_engines.engines() {
                let marker = if e.id == selected.id { "*" } else { " " };
                println!("{} {}  {} ({}) {}", marker, e.id, e.name, e.engine_type, e.url);
            }
        }
        Command::Engine(id) => {
            engine.select_search_engine(&id)?;
            println!("Search engine set to {}", id);
        }
        Command::EngineAdd { engine_type, name, url, api_key, auth_header } => {
            let mut search_engine = SearchEngineConfig::new(name, engine_type, url);
            if let Some(key) = api_key {
                search_engine = search_engine.with_api_key(key);
            }
            if let Some(header) = auth_header {
                search_engine = search_engine.with_auth_header(header);
            }
            let id = engine.add_search_engine(search_engine);
            println!("Added search engine {}", id);
        }
        Command::EngineRemove(id) => {
            engine.remove_search_engine(&id)?;
            println!("Removed search engine {}", id);
        }
        Command::Image(path) => {
            let bytes = tokio::fs::read(&path).await?;
            engine.attach_images(vec![BASE64.encode(bytes)]);
            println!("Attached {}", path.display());
        }
        Command::History => print!("{}", render::history(&engine.session())),
        Command::Delete(id) => {
            if !engine.delete_turn(id) {
                println!("No turn #{}", id);
            }
        }
        Command::Quick(action) => {
            let _ = engine.quick_action(action).await;
        }
        Command::Cancel => engine.cancel().await,
        Command::Clear => engine.clear_history().await,
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

fn build_llm(
    config: &Config,
    server_url: &str,
    api_key: Option<String>,
) -> anyhow::Result<Arc<dyn LlmClient>> {
    let mut ollama = OllamaConfig::new(server_url).with_connect_timeout(config.connect_timeout());
    if let Some(key) = api_key {
        ollama = ollama.with_api_key(key);
    }
    Ok(Arc::new(OllamaClient::new(ollama)?))
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stdout carries the conversation; logs go to stderr.
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
