//! UI context for environment detection and configuration.

use super::mode::{OutputFormat, OutputMode, Terminal};
use crate::cli::{Cli, OutputArgs};

/// Terminal and environment context for UI decisions.
#[derive(Debug, Clone)]
pub struct UiContext {
    /// Whether color output is enabled
    pub color: bool,
    /// Whether unicode symbols are enabled
    pub unicode: bool,
    /// Terminal width (columns)
    pub width: usize,
    /// Resolved output mode
    pub mode: OutputMode,
}

impl UiContext {
    /// Create context from environment and CLI flags.
    pub fn from_env(
        json_flag: bool,
        format: Option<OutputFormat>,
        no_color_flag: bool,
        ascii_flag: bool,
    ) -> Self {
        let terminal = Terminal::detect();
        let no_color_env = std::env::var("NO_COLOR").is_ok();

        let color = terminal.is_tty && !no_color_flag && !no_color_env && !terminal.dumb;
        let unicode = !ascii_flag;
        let width = terminal_width().unwrap_or(80);
        let mode = OutputMode::resolve(json_flag, format, terminal);

        Self {
            color,
            unicode,
            width,
            mode,
        }
    }

    /// Context for a command's output flags plus the global style flags.
    pub fn for_command(cli: &Cli, output: &OutputArgs) -> Self {
        Self::from_env(output.json, output.format, cli.no_color, cli.ascii)
    }

    /// Context for commands that only print receipts.
    pub fn for_receipts(cli: &Cli) -> Self {
        Self::from_env(false, None, cli.no_color, cli.ascii)
    }
}

fn terminal_width() -> Option<usize> {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|cols| cols.parse::<usize>().ok())
        .filter(|width| *width > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_mode_from_flag() {
        let ctx = UiContext::from_env(true, None, false, false);
        assert_eq!(ctx.mode, OutputMode::Json);
    }

    #[test]
    fn test_plain_format_from_flag() {
        let ctx = UiContext::from_env(false, Some(OutputFormat::Plain), false, false);
        assert_eq!(ctx.mode, OutputMode::Plain);
    }

    #[test]
    fn test_ascii_disables_unicode() {
        let ctx = UiContext::from_env(false, None, false, true);
        assert!(!ctx.unicode);
    }

    #[test]
    fn test_no_color_disables_color() {
        let ctx = UiContext::from_env(false, None, true, false);
        assert!(!ctx.color);
        assert!(ctx.width > 0);
    }
}
