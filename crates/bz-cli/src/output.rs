//! Terminal output formatting
//!
//! Renders conversation entries and status feedback for the interactive
//! client. Entries are printed in append order; each kind gets its own
//! prefix and color so tool notices and errors stand apart from the
//! conversation itself.

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

use bz_core::{ConversationEntry, EntryKind};

/// Print the startup banner
pub fn print_banner(server_url: &str) {
    println!("Bazaar shopping assistant");
    println!("Connected to {}", server_url);
    println!("Type a question, or /help for commands.");
    println!();
}

/// Print the command reference
pub fn print_help() {
    println!("Commands:");
    println!("  /attach <path>   Attach an image to the next query");
    println!("  /remove          Discard the pending attachment");
    println!("  /reset           Start a fresh conversation");
    println!("  /health          Check backend health");
    println!("  /status          Show channel and attachment state");
    println!("  /quit            Exit");
    println!();
    println!("Anything else is sent to the assistant as a query.");
}

/// Render one conversation entry
pub fn print_entry(entry: &ConversationEntry) {
    let (color, prefix) = match entry.kind {
        EntryKind::User => (Color::White, "you"),
        EntryKind::Agent => (Color::Green, "agent"),
        EntryKind::Tool => (Color::DarkGrey, "tool"),
        EntryKind::Error => (Color::Red, "error"),
    };

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(color),
        Print(format!("{:>5}> ", prefix)),
        ResetColor,
        Print(&entry.content),
        Print("\n")
    );

    if let Some(attachment) = &entry.attachment {
        println!("       [image: {}]", attachment);
    }
    for image in &entry.result_images {
        println!("       [result: {}]", image);
    }
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
pub fn print_error(msg: &str) {
    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow with a warning symbol prefix
pub fn print_warning(msg: &str) {
    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
