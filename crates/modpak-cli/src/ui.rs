//! Terminal output helpers.

use crossterm::style::Stylize;

/// Simple status-line printer shared by all commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    pub fn quiet(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Print a success line.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{} {msg}", "ok".green().bold());
        }
    }

    /// Print an informational line.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("   {msg}");
        }
    }

    /// Print a warning line. Not suppressed by quiet mode.
    pub fn warning(&self, msg: &str) {
        println!("{} {msg}", "warning:".yellow().bold());
    }

    /// Print an error line. Not suppressed by quiet mode.
    pub fn error(&self, msg: &str) {
        eprintln!("{} {msg}", "error:".red().bold());
    }
}

/// Render a byte count as a short human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(17), "17 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
    }
}
