//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner; plain mode prints the message once
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", style("[OK]").green(), message),
        }
    }

    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None => println!("{} {}", style("[FAIL]").red(), message),
        }
    }

    /// Remove the spinner without a message, e.g. before JSON output
    pub fn clear(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.clear();
        }
    }
}

/// Progress over a fixed list of portal resources.
///
/// Shows an indicatif bar in interactive mode and one line per resource
/// otherwise.
pub struct SyncProgress {
    bar: Option<ProgressBar>,
    total: usize,
    done: usize,
}

impl SyncProgress {
    pub fn new(ctx: &UiContext, total: usize) -> Self {
        let bar = ctx.use_fancy_output().then(|| {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("  {spinner:.cyan} Syncing  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}")
            {
                bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ").progress_chars("━╸─"));
            }
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            bar
        });
        Self {
            bar,
            total,
            done: 0,
        }
    }

    /// Announce the resource about to be fetched
    pub fn begin(&self, resource: &str) {
        match &self.bar {
            Some(bar) => bar.set_message(resource.to_string()),
            None => println!("  [{}/{}] {}", self.done + 1, self.total, resource),
        }
    }

    /// Record a finished resource with a short outcome
    pub fn finish_one(&mut self, resource: &str, outcome: &str) {
        self.done += 1;
        match &self.bar {
            Some(bar) => {
                bar.inc(1);
                bar.println(format!("  {} {}: {}", style("✓").green(), resource, outcome));
            }
            None => println!("        {}", outcome),
        }
    }

    pub fn fail_one(&mut self, resource: &str, error: &str) {
        self.done += 1;
        match &self.bar {
            Some(bar) => {
                bar.inc(1);
                bar.println(format!("  {} {}: {}", style("✗").red(), resource, error));
            }
            None => println!("        {} {}", style("[FAIL]").red(), error),
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}
