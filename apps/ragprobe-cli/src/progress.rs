use std::cell::RefCell;

use indicatif::{ProgressBar, ProgressStyle};

use ragprobe_core::types::EvaluationResult;
use ragprobe_eval::{Pass, PassObserver};

/// One progress bar per pass, drawn on stderr.
pub struct ProgressReporter {
    enabled: bool,
    bar: RefCell<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self { Self { enabled, bar: RefCell::new(None) } }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:>8} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} questions {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl PassObserver for ProgressReporter {
    fn pass_started(&self, pass: Pass, questions: usize) {
        if !self.enabled {
            return;
        }
        let bar = ProgressBar::new(questions as u64);
        bar.set_style(Self::style());
        bar.set_prefix(pass.as_str());
        *self.bar.borrow_mut() = Some(bar);
    }

    fn question_finished(&self, _pass: Pass, result: &EvaluationResult) {
        if let Some(bar) = self.bar.borrow().as_ref() {
            bar.inc(1);
            bar.set_message(result.failure_mode.label());
        }
    }

    fn pass_finished(&self, pass: Pass) {
        if let Some(bar) = self.bar.borrow_mut().take() {
            bar.finish_with_message(format!("{} pass done", pass.as_str()));
        }
    }
}
