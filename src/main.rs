use anyhow::Result;
use clap::{Parser, Subcommand};
use flowchat::config::{Config, FLOW_ID_ENV};
use flowchat::flow::FlowClient;
use flowchat::session::ChatSession;
use flowchat::ui::conversation::ConversationManager;
use flowchat::{FlowError, logging};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "flowchat")]
#[command(version)]
#[command(about = "Chat with a hosted Langflow flow from the terminal", long_about = None)]
struct Cli {
    /// Flow profile to use instead of the configured active one
    #[arg(long, short, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// List configured flow profiles
    Profiles,
    /// Write a default config.toml if none exists
    Init,
}

fn list_profiles(config: &Config) {
    println!("📋 Flow profiles:\n");
    for (name, profile) in &config.profiles {
        let marker = if *name == config.active_profile { " (active)" } else { "" };
        let endpoint = profile
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("${}", FLOW_ID_ENV));
        let tweaks = if profile.tweaks.is_some() { ", with tweaks" } else { "" };
        println!("  • {}{}: {} [endpoint {}{}]", name, marker, profile.title, endpoint, tweaks);
    }
}

fn init_config(config: &Config) -> Result<()> {
    let path = config.config_path();
    if path.exists() {
        println!("⚙️  Config already exists at {}", path.display());
        return Ok(());
    }
    config.save()?;
    println!("✅ Wrote default config to {}", path.display());
    Ok(())
}

async fn ask(config: &Config, profile: Option<&str>, question: &str) -> Result<ExitCode> {
    let settings = config.settings(profile)?;
    let client = FlowClient::new(&settings, config.request_timeout())?;
    let mut session = ChatSession::new(Arc::new(client), settings.tweaks);

    match session.submit(question).await {
        Ok(entry) => {
            println!("{}", entry.answer());
            Ok(ExitCode::SUCCESS)
        }
        Err(FlowError::EmptyInput) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("{}", err.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let _log_guard = logging::init(&config.log_dir(), &config.log_filter)?;
    let profile = cli.profile.as_deref();

    match cli.command {
        None => {
            let settings = config.settings(profile)?;
            let client = FlowClient::new(&settings, config.request_timeout())?;
            flowchat::ui::run(ConversationManager::new(settings, client)).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Ask { question }) => ask(&config, profile, &question.join(" ")).await,
        Some(Commands::Profiles) => {
            list_profiles(&config);
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Init) => {
            init_config(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("❌ Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
