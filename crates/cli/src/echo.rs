use std::time::Duration;

use nongjeong_core::{ProgressStatus, SiteReport, SiteStatus, SourceProgress};
use owo_colors::OwoColorize;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Nongjeong".bold().bright_green(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "농업 뉴스 수집기\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// One line per source while a timeline fills in
pub fn print_progress(progress: &SourceProgress) {
    let line = progress.to_string();
    match progress.status {
        ProgressStatus::Idle => eprintln!("  {}", line.dimmed()),
        ProgressStatus::Loading => eprintln!("  {}", line.bright_blue()),
        ProgressStatus::Done => eprintln!("  {}", line.green()),
        ProgressStatus::Error => eprintln!("  {}", line.red()),
    }
}

/// Outcome of each site in an all-sites run
pub fn print_site_reports(sites: &[SiteReport]) {
    for site in sites {
        match site.status {
            SiteStatus::Done => eprintln!("  {} {} {}", "✔".green(), site.source.label(), site.count.to_string().bright_white()),
            SiteStatus::TimedOut => eprintln!(
                "  {} {} {} {}",
                "⏱".yellow(),
                site.source.label(),
                site.count.to_string().bright_white(),
                site.error.as_deref().unwrap_or("").dimmed()
            ),
            SiteStatus::Failed => eprintln!(
                "  {} {} {}",
                "✖".red(),
                site.source.label(),
                site.error.as_deref().unwrap_or("").dimmed()
            ),
        }
    }
}

/// Print elapsed time, colored by how long the network took
pub fn print_timing(label: &str, duration: Duration) {
    let secs = duration.as_secs_f64();
    let shown = format!("{secs:>6.1}s");
    if secs < 10.0 {
        eprintln!("  {} {}", format!("{}:", label).dimmed(), shown.green());
    } else if secs < 30.0 {
        eprintln!("  {} {}", format!("{}:", label).dimmed(), shown.bright_yellow());
    } else {
        eprintln!("  {} {}", format!("{}:", label).dimmed(), shown.bright_red());
    }
}
