//! Status line formatting for the CLI
//!
//! Command results are printed plain to stdout so they can be piped;
//! status lines are coloured and prefixed with a symbol.

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

/// Which stream a status line goes to
#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn print_status(stream: Stream, color: Color, symbol: &str, msg: &str) {
    let result = match stream {
        Stream::Stdout => crossterm::execute!(
            std::io::stdout(),
            SetForegroundColor(color),
            Print(symbol),
            ResetColor,
            Print(msg),
            Print("\n")
        ),
        Stream::Stderr => crossterm::execute!(
            std::io::stderr(),
            SetForegroundColor(color),
            Print(symbol),
            ResetColor,
            Print(msg),
            Print("\n")
        ),
    };

    if let Err(e) = result {
        tracing::debug!("Failed to write status line: {}", e);
    }
}

/// Print a success message in green with a checkmark prefix
///
/// Goes to stderr so that stdout carries only command results.
pub fn print_success(msg: &str) {
    print_status(Stream::Stderr, Color::Green, "✓ ", msg);
}

/// Print an error message in red with an X prefix
pub fn print_error(msg: &str) {
    print_status(Stream::Stderr, Color::Red, "✗ ", msg);
}

/// Print a warning message in yellow with a warning symbol prefix
pub fn print_warning(msg: &str) {
    print_status(Stream::Stderr, Color::Yellow, "⚠ ", msg);
}

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
    print_status(Stream::Stdout, Color::Cyan, "ℹ ", msg);
}
