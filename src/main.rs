mod commands;
#[cfg(feature = "mcp")]
mod mcp;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "notes")]
#[command(about = "Personal notes with hybrid keyword + semantic search", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a new note
    Add {
        title: String,
        #[arg(default_value = "")]
        content: String,
        #[arg(long, env = "USER", help = "Note owner")]
        user: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Replace a note's title and content (its embedding is not refreshed)
    Edit {
        id: i64,
        title: String,
        #[arg(default_value = "")]
        content: String,
    },
    /// Delete a note
    Delete { id: i64 },
    /// List your notes
    List {
        #[arg(long, env = "USER", help = "Note owner")]
        user: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Hybrid keyword + semantic search over your notes
    Search {
        query: String,
        #[arg(long, env = "USER", help = "Note owner")]
        user: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Embed every note and report
    Index {
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== MCP Server =====
    /// Start MCP server for Claude integration
    #[cfg(feature = "mcp")]
    Mcp {
        #[arg(long, help = "Show Claude configuration instructions")]
        install: bool,
        #[arg(long, env = "USER", help = "Owner whose notes the server exposes")]
        user: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output and the MCP transport.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notes_search=info,notes=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match cli.command {
        Commands::Add {
            title,
            content,
            user,
            json,
        } => commands::add::run(&user, &title, &content, json),
        Commands::Edit { id, title, content } => commands::edit::run(id, &title, &content),
        Commands::Delete { id } => commands::delete::run(id),
        Commands::List { user, json } => commands::list::run(&user, json),
        Commands::Search { query, user, json } => {
            runtime()?.block_on(commands::search::run(&user, &query, json))
        }
        Commands::Index { json } => runtime()?.block_on(commands::index::run(json)),

        // MCP Server
        #[cfg(feature = "mcp")]
        Commands::Mcp { install, user } => {
            if install {
                print_mcp_install_instructions(&user);
                Ok(())
            } else {
                runtime()?.block_on(mcp::run_mcp_server(user))
            }
        }
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}

#[cfg(feature = "mcp")]
fn print_mcp_install_instructions(user: &str) {
    use colored::Colorize;

    let notes_path = std::env::current_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "/path/to/your/notes".to_string());

    let binary_path = std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "notes".to_string());

    println!("{}", "MCP Server Installation Guide".bold().cyan());
    println!();
    println!("Add the following to your Claude configuration:");
    println!();
    println!(r#"{{
  "mcpServers": {{
    "notes-search": {{
      "command": "{}",
      "args": ["mcp", "--user", "{}"],
      "cwd": "{}",
      "env": {{ "HF_API_KEY": "hf_..." }}
    }}
  }}
}}"#, binary_path, user, notes_path);
    println!();
    println!("{}", "Available tools:".bold());
    println!("  • {} - Hybrid keyword + semantic search", "notes_search".green());
    println!("  • {} - Save a new note", "notes_create".green());
    println!("  • {} - List notes", "notes_list".green());
    println!("  • {} - Get a note by id", "notes_get".green());
    println!("  • {} - Delete a note", "notes_delete".green());
    println!("  • {} - Embedding status for a note", "notes_index_status".green());
}
