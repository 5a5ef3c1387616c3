use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::{prelude::*, reload, EnvFilter, Registry};

use vidchat::{ChatError, ChatMessage, ChatService, Config, ResponseMode};

fn cli() -> Command {
    Command::new("vidchat")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Ask questions about a video and get answers grounded in its transcript")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Configuration file")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("ask")
                .about("Ask a single question about a video")
                .arg(Arg::new("url").required(true).help("Video link or id"))
                .arg(Arg::new("question").required(true).help("Question to ask"))
                .arg(
                    Arg::new("detailed")
                        .short('d')
                        .long("detailed")
                        .help("Ask for a detailed answer")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("chat")
                .about("Start an interactive chat about a video")
                .arg(Arg::new("url").required(true).help("Video link or id")),
        )
        .subcommand(Command::new("history").about("List videos with saved chats"))
        .subcommand(
            Command::new("clear")
                .about("Delete saved chats")
                .arg(
                    Arg::new("video")
                        .long("video")
                        .value_name("ID")
                        .help("Only clear chats for this video id")
                        .conflicts_with("all"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .help("Clear every saved chat")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(&PathBuf::from(path))?,
        None => Config::load()?,
    };
    config.validate()?;
    Ok(config)
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

fn log_directive(level: &str, verbose: bool) -> String {
    let level = if verbose { "debug" } else { level };
    format!("vidchat={},warn", level)
}

/// Installs the subscriber before anything else runs. Without `RUST_LOG` the
/// returned handle lets the configured level replace the startup default.
fn init_tracing(verbose: bool) -> Option<FilterHandle> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let (filter, handle) = reload::Layer::new(EnvFilter::new(log_directive("info", verbose)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    Some(handle)
}

fn apply_log_level(handle: Option<FilterHandle>, level: &str, verbose: bool) {
    let Some(handle) = handle else { return };
    if verbose {
        return;
    }
    if let Err(e) = handle.reload(EnvFilter::new(log_directive(level, false))) {
        warn!("Failed to apply log level {}: {}", level, e);
    }
}

fn print_reply(reply: &ChatMessage) {
    match &reply.relevant_timestamp {
        Some(ts) => println!("\n{}\n  ⏱  {}\n", reply.content, ts),
        None => println!("\n{}\n", reply.content),
    }
}

fn print_sessions(service: &ChatService) {
    let active = service.active_session().map(|s| s.id.clone());
    for (i, session) in service.sessions().iter().enumerate() {
        let marker = if Some(&session.id) == active.as_ref() { "*" } else { " " };
        println!(
            "{} {}. {} ({} messages)",
            marker,
            i + 1,
            session.title,
            session.exchanged_messages()
        );
    }
}

fn session_id_at(service: &ChatService, arg: Option<&str>) -> Result<String> {
    let n: usize = arg
        .ok_or_else(|| anyhow!("expected a session number"))?
        .parse()?;
    service
        .sessions()
        .get(n.wrapping_sub(1))
        .map(|s| s.id.clone())
        .ok_or_else(|| anyhow!("no session number {}", n))
}

async fn open(service: &mut ChatService, url: &str) -> Result<()> {
    match service.open_video(url).await {
        Ok(video) => {
            info!("🎬 Opened \"{}\" by {}", video.title, video.channel_title);
            Ok(())
        }
        Err(ChatError::Video(e)) => {
            let hint = e.guidance();
            Err(anyhow!("{}\n{}", e, hint))
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_chat(service: &mut ChatService, default_mode: ResponseMode) -> Result<()> {
    let mut mode = default_mode;
    if let Some(greeting) = service
        .active_session()
        .and_then(|s| s.messages.last())
        .map(|m| m.content.clone())
    {
        println!("\n{}\n", greeting);
    }
    println!("Commands: /new /sessions /switch N /delete N /detailed /brief /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let outcome: Result<()> = match parts.next() {
            Some("/quit") | Some("/exit") => break,
            Some("/new") => match service.new_chat() {
                Ok(_) => {
                    println!("Started a new chat.");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
            Some("/sessions") => {
                print_sessions(service);
                Ok(())
            }
            Some("/switch") => session_id_at(service, parts.next())
                .and_then(|id| service.switch_session(&id).map_err(Into::into))
                .map(|_| print_sessions(service)),
            Some("/delete") => session_id_at(service, parts.next())
                .and_then(|id| service.delete_session(&id).map_err(Into::into))
                .map(|_| print_sessions(service)),
            Some("/detailed") => {
                mode = ResponseMode::Detailed;
                println!("Detailed answers on.");
                Ok(())
            }
            Some("/brief") => {
                mode = ResponseMode::Brief;
                println!("Brief answers on.");
                Ok(())
            }
            _ => service
                .send_message(line, mode)
                .await
                .map(|reply| print_reply(&reply))
                .map_err(Into::into),
        };

        if let Err(e) = outcome {
            warn!("{}", e);
            println!("⚠️  {}", e);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let verbose = matches.get_flag("verbose");

    let log_handle = init_tracing(verbose);
    let config = load_config(&matches)?;
    apply_log_level(log_handle, &config.logging.level, verbose);
    debug!("{}", config.summary());

    let mut service = ChatService::from_config(&config)?;

    match matches.subcommand() {
        Some(("ask", sub)) => {
            let url = sub.get_one::<String>("url").ok_or_else(|| anyhow!("missing url"))?;
            let question = sub
                .get_one::<String>("question")
                .ok_or_else(|| anyhow!("missing question"))?;
            let mode = if sub.get_flag("detailed") {
                ResponseMode::Detailed
            } else {
                config.chat.default_mode
            };

            open(&mut service, url).await?;
            let reply = service.send_message(question, mode).await?;
            print_reply(&reply);
        }
        Some(("chat", sub)) => {
            let url = sub.get_one::<String>("url").ok_or_else(|| anyhow!("missing url"))?;
            open(&mut service, url).await?;
            run_chat(&mut service, config.chat.default_mode).await?;
        }
        Some(("history", _)) => {
            let history = service.history();
            if history.is_empty() {
                println!("No saved chats.");
            }
            for video in history {
                println!(
                    "{}  {}  ({} chats, {} messages, last active {})",
                    video.video_id,
                    video.video_title,
                    video.session_count,
                    video.total_message_count,
                    video.last_activity.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Some(("clear", sub)) => {
            if let Some(video_id) = sub.get_one::<String>("video") {
                service.clear_history_for(video_id)?;
                println!("Cleared chats for {}.", video_id);
            } else if sub.get_flag("all") {
                service.clear_all_history()?;
                println!("Cleared all chats.");
            } else {
                return Err(anyhow!("pass --video ID or --all"));
            }
        }
        _ => return Err(anyhow!("unknown command")),
    }

    Ok(())
}
