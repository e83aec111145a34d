//! fileport CLI Client
//!
//! Command-line interface for interacting with a fileport server.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use fileport::{FileMetadata, Result, Session};
use tracing_subscriber::{fmt, EnvFilter};

/// fileport CLI
#[derive(Parser, Debug)]
#[command(name = "fileport-cli")]
#[command(about = "CLI for the fileport file server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8888")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List files on the server
    List,

    /// Upload a local file
    Upload {
        /// Path of the file to upload
        path: PathBuf,
    },

    /// Download a file
    Download {
        /// Name of the file on the server
        name: String,

        /// Where to save it (defaults to the same name here)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a file
    Delete {
        /// Name of the file on the server
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Interactive prompt
    Shell,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    let mut session = match Session::connect(args.server.as_str()) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            std::process::exit(1);
        }
    };

    let outcome = match args.command {
        Commands::List => list(&mut session),
        Commands::Upload { path } => upload(&mut session, &path),
        Commands::Download { name, output } => download(&mut session, &name, output.as_deref()),
        Commands::Delete { name, yes } => {
            if yes || confirm(&name) {
                delete(&mut session, &name)
            } else {
                println!("[INFO] Delete cancelled");
                Ok(())
            }
        }
        Commands::Shell => shell(&mut session),
    };

    session.disconnect();

    if let Err(e) = outcome {
        eprintln!("[ERROR] {}", e);
        std::process::exit(1);
    }
}

// =============================================================================
// Commands
// =============================================================================

fn list(session: &mut Session) -> Result<()> {
    let files = session.list()?;
    print_listing(&files);
    Ok(())
}

fn upload(session: &mut Session, path: &Path) -> Result<()> {
    let size = session.upload(path)?;
    println!("[SUCCESS] Uploaded {} ({})", path.display(), format_size(size));
    Ok(())
}

fn download(session: &mut Session, name: &str, output: Option<&Path>) -> Result<()> {
    let size = session.download(name, output)?;
    let saved = output.unwrap_or_else(|| Path::new(name));
    println!("[SUCCESS] Downloaded {} ({})", saved.display(), format_size(size));
    Ok(())
}

fn delete(session: &mut Session, name: &str) -> Result<()> {
    let message = session.delete(name)?;
    println!("[SUCCESS] {}", message);
    Ok(())
}

/// Interactive loop; errors from single commands are reported, not fatal
fn shell(session: &mut Session) -> Result<()> {
    print_help();

    let stdin = io::stdin();
    loop {
        print!("\nfileport> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((command, rest)) = words.split_first() else {
            continue;
        };

        let result = match (command.to_lowercase().as_str(), rest.first()) {
            ("list", _) => list(session),
            ("upload", Some(path)) => upload(session, Path::new(path)),
            ("download", Some(name)) => download(session, name, rest.get(1).map(Path::new)),
            ("delete", Some(name)) => {
                if confirm(name) {
                    delete(session, name)
                } else {
                    println!("[INFO] Delete cancelled");
                    Ok(())
                }
            }
            ("upload", None) => usage("upload <filepath>"),
            ("download", None) => usage("download <filename> [savepath]"),
            ("delete", None) => usage("delete <filename>"),
            ("help", _) => {
                print_help();
                Ok(())
            }
            ("quit" | "exit", _) => return Ok(()),
            (other, _) => {
                println!("[ERROR] Unknown command: {}. Type 'help' for available commands.", other);
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("[ERROR] {}", e);
        }
    }
}

// =============================================================================
// Display Helpers
// =============================================================================

fn usage(text: &str) -> Result<()> {
    println!("[ERROR] Usage: {}", text);
    Ok(())
}

fn confirm(name: &str) -> bool {
    print!("Are you sure you want to delete '{}'? (y/N): ", name);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer).is_ok() && answer.trim().eq_ignore_ascii_case("y")
}

fn print_help() {
    println!("Commands:");
    println!("  list                           - List files on server");
    println!("  upload <filepath>              - Upload file to server");
    println!("  download <filename> [savepath] - Download file from server");
    println!("  delete <filename>              - Delete file from server");
    println!("  quit                           - Exit client");
}

fn print_listing(files: &[FileMetadata]) {
    if files.is_empty() {
        println!("[INFO] No files found on server");
        return;
    }

    println!("{:<30} {:<15} {:<20}", "Filename", "Size", "Modified");
    println!("{}", "-".repeat(65));
    for file in files {
        println!(
            "{:<30} {:<15} {:<20}",
            file.name,
            format_size(file.size),
            file.modified.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!("\nTotal files: {}", files.len());
}

/// Human-readable size, one decimal
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", size, UNITS[unit])
}
