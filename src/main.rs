use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use pythia::banner::{BannerInfo, print_banner, print_session_summary};
use pythia::consts::{self, ANSWER_LABEL, API_KEY_NAME, EMPTY_PROMPT_MSG, MODEL};
use pythia::generator::TokenUsage;
use pythia::generator::gemini::GeminiGenerator;
use pythia::handler::{AskHandler, Outcome};
use pythia::secrets::SecretStore;

#[derive(Parser)]
#[command(name = "pythia", version, about = "Ask a question, get an answer.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// SQLite database path for secret storage (use :memory: for ephemeral)
    #[arg(short, long)]
    db: Option<String>,

    /// Ask a single prompt and exit (non-interactive)
    #[arg(short, long)]
    run: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Store the generation service API key
    Login,
    /// Remove the stored API key
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let db_path = match cli.db {
        Some(path) => path,
        None => {
            let path = consts::default_db_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            path.to_string_lossy().into_owned()
        }
    };

    if let Some(command) = &cli.command {
        match command {
            Command::Login => return handle_login(&db_path),
            Command::Logout => return handle_logout(&db_path),
        }
    }

    let secrets = SecretStore::open(&db_path)?;

    // The credential is a startup requirement: refuse to serve anything
    // without it rather than fail on the first request.
    let api_key = secrets.resolve(API_KEY_NAME)?.ok_or_else(|| {
        anyhow::anyhow!("no API key found. Run `pythia login` or set {API_KEY_NAME}.")
    })?;
    let auth_status = if secrets.get(API_KEY_NAME)?.is_some() {
        "API key (stored) ✓"
    } else {
        "API key (env) ✓"
    };

    let generator = Arc::new(GeminiGenerator::new(&api_key)?);
    let handler = AskHandler::new(generator);

    let secrets_label = if db_path == ":memory:" {
        "ephemeral"
    } else {
        &db_path
    };

    print_banner(&BannerInfo {
        model: MODEL,
        auth_status,
        secrets: secrets_label,
    });

    let mut session_usage = TokenUsage::default();

    // Single prompt mode
    if let Some(prompt) = cli.run {
        render(handler.ask(&prompt).await, &mut session_usage);
        print_session_summary(session_usage);
        return Ok(());
    }

    // REPL — async stdin so Ctrl+C is caught at the prompt too
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\npythia> ");
        io::stdout().flush()?;

        // Read next line, interruptible by Ctrl+C
        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {e}");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let prompt = line.trim();
        if prompt == "quit" || prompt == "exit" {
            break;
        }

        // An empty line is still a trigger: the handler answers it with
        // the empty-prompt message. Ctrl+C during a pending call
        // abandons that interaction, not the session.
        tokio::select! {
            outcome = handler.ask(prompt) => render(outcome, &mut session_usage),
            _ = tokio::signal::ctrl_c() => println!("\n\ninterrupted"),
        }
    }

    print_session_summary(session_usage);
    Ok(())
}

/// One rendering update per terminal state.
fn render(outcome: Outcome, session_usage: &mut TokenUsage) {
    match outcome {
        Outcome::EmptyPrompt => eprintln!("{EMPTY_PROMPT_MSG}"),
        Outcome::Answer(generation) => {
            println!("\n{ANSWER_LABEL}");
            println!("{}", generation.text);
            if let Some(usage) = generation.usage {
                session_usage.add(usage);
            }
        }
        Outcome::Failed(err) => eprintln!("\nerror: {err}"),
    }
}

fn handle_login(db_path: &str) -> anyhow::Result<()> {
    print!("Paste your {API_KEY_NAME}: ");
    io::stdout().flush()?;
    let mut key = String::new();
    io::stdin().read_line(&mut key)?;
    let key = key.trim();

    if key.is_empty() {
        anyhow::bail!("no API key provided");
    }

    let secrets = SecretStore::open(db_path)?;
    secrets.set(API_KEY_NAME, key)?;
    println!("✓ API key saved.");
    Ok(())
}

fn handle_logout(db_path: &str) -> anyhow::Result<()> {
    let secrets = SecretStore::open(db_path)?;
    secrets.remove(API_KEY_NAME)?;
    println!("✓ API key removed.");
    Ok(())
}
