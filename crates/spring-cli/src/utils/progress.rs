use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use springpp::engine::progress::{Progress, ProgressCallback};
use std::fmt::Write;
use std::time::Duration;

const SPINNER_TICK_MS: u64 = 80;
const CANDIDATE_LABEL: &str = "Template pairs";

/// Renders library progress events: a spinner per phase and a bar over template pairs.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: ProgressBar,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// A handler that tracks progress without drawing, for `--quiet` runs.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    pub fn for_output(quiet: bool) -> Self {
        if quiet { Self::hidden() } else { Self::new() }
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        pb.finish_and_clear();
        Self { pb }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = self.pb.clone();
        Box::new(move |progress: Progress| render(&pb, progress))
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn render(pb: &ProgressBar, progress: Progress) {
    match progress {
        Progress::PhaseStart { name } => {
            pb.reset();
            pb.set_length(0);
            pb.set_style(spinner_style());
            pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            pb.set_message(name);
        }
        Progress::PhaseFinish => {
            pb.disable_steady_tick();
            pb.finish_with_message("✓ Done");
        }
        Progress::CandidateStart { total } => {
            pb.disable_steady_tick();
            pb.reset();
            pb.set_length(total);
            pb.set_style(bar_style());
            pb.set_message(CANDIDATE_LABEL);
        }
        Progress::CandidateEvaluated => pb.inc(1),
        Progress::CandidateFinish => {
            if let Some(total) = pb.length() {
                pb.set_position(total);
            }
            pb.finish();
        }
        Progress::Message(msg) if pb.is_finished() => pb.set_message(msg),
        Progress::Message(msg) => pb.println(format!("  {}", msg)),
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<20} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
        })
        .progress_chars("##-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn handler_initializes_in_a_clean_state() {
        let handler = CliProgressHandler::hidden();
        assert_eq!(handler.pb.length(), Some(0));
        assert!(handler.pb.is_finished());
    }

    #[test]
    fn callback_follows_a_candidate_scan() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();
        let pb = &handler.pb;

        callback(Progress::PhaseStart {
            name: "Reading Homology Hits",
        });
        assert_eq!(pb.message(), "Reading Homology Hits");
        assert!(!pb.is_finished());

        callback(Progress::CandidateStart { total: 20 });
        assert_eq!(pb.length(), Some(20));
        assert_eq!(pb.position(), 0);
        assert_eq!(pb.message(), CANDIDATE_LABEL);

        callback(Progress::CandidateEvaluated);
        callback(Progress::CandidateEvaluated);
        assert_eq!(pb.position(), 2);

        callback(Progress::CandidateFinish);
        assert!(pb.is_finished());
        assert_eq!(pb.position(), 20);

        callback(Progress::PhaseFinish);
        assert_eq!(pb.message(), "✓ Done");

        callback(Progress::Message("No model".to_string()));
        assert_eq!(pb.message(), "No model");
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = CliProgressHandler::for_output(true);
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart {
                name: "Evaluating Template Pairs",
            });
            callback(Progress::Message("1abc_A / 1abc_B".to_string()));
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        assert!(handler.pb.is_finished());
        assert_eq!(handler.pb.message(), "✓ Done");
    }
}
