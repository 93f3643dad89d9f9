use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, IsTerminal, Write};

use carwatch_core::{Severity, Status};

use crate::cli::OutputFormat;
use crate::monitor::TickReport;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const NORMAL: Color = Color::Green;
    const WARNING: Color = Color::Yellow;
    const SERIOUS: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;

    fn for_status(status: Status) -> Color {
        match status {
            Status::Normal => Self::NORMAL,
            Status::Warning => Self::WARNING,
            Status::SeriousProblem => Self::SERIOUS,
        }
    }

    fn for_severity(severity: Severity) -> Color {
        match severity {
            Severity::Info => Self::DIM,
            Severity::Warning => Self::WARNING,
            Severity::Critical => Self::SERIOUS,
        }
    }
}

/// Writes tick reports to stdout.
pub struct Terminal {
    format: OutputFormat,
}

impl Terminal {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the startup banner. Suppressed in JSON mode so stdout stays
    /// machine-readable.
    pub fn print_banner(&self, source: &str, anomaly: &str) -> Result<()> {
        if self.format == OutputFormat::Json {
            return Ok(());
        }
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("carwatch"),
            ResetColor,
            Print(" - Vehicle Health Monitor\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!("Source: {} | Anomaly check: {}\n", source, anomaly)),
            Print("Ctrl+C stops monitoring.\n"),
            Print("---\n"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn display(&self, report: &TickReport) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let mut stdout = io::stdout();
                writeln!(stdout, "{}", json_line(report)?)?;
                stdout.flush()?;
            }
            OutputFormat::Text if io::stdout().is_terminal() => self.display_text(report)?,
            OutputFormat::Text => {
                let mut stdout = io::stdout();
                writeln!(stdout, "{}", text_line(report))?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    fn display_text(&self, report: &TickReport) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(tick_label(report)),
            ResetColor,
            SetForegroundColor(Colors::for_status(report.verdict.status)),
            Print(format!("{}\n", report.verdict.status)),
            ResetColor,
        )?;
        for message in &report.verdict.messages {
            execute!(
                stdout,
                SetForegroundColor(Colors::for_severity(message.severity)),
                Print(format!("  {}: {}\n", message.severity, message.text)),
                ResetColor,
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    pub fn print_info(&self, msg: &str) -> Result<()> {
        if self.format == OutputFormat::Json {
            return Ok(());
        }
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }
}

fn tick_label(report: &TickReport) -> String {
    format!("[{} #{}] ", report.at.format("%H:%M:%S"), report.tick)
}

/// Plain single-line rendering, e.g.
/// `[12:00:01 #3] Warning - Warning: Engine temperature is high.`
pub fn text_line(report: &TickReport) -> String {
    format!(
        "{}{} - {}",
        tick_label(report),
        report.verdict.status,
        report.verdict.details()
    )
}

/// One JSON object per tick: `tick`, `at` (RFC 3339), `reading`, `verdict`.
pub fn json_line(report: &TickReport) -> Result<String> {
    Ok(serde_json::to_string(report)?)
}
