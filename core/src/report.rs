//! report.rs
//! Sink for the one message a host shows when a pipeline call fails.

use tracing::debug;

use crate::types::{PipelineError, ReportCategory};

pub trait Reporter {
    fn report(&mut self, category: ReportCategory, message: &str);
}

/// Map `err` to its category and hand the fixed message to `reporter`.
/// The raw code is logged, never reported.
pub fn report_error(err: &PipelineError, reporter: &mut dyn Reporter) -> ReportCategory {
    let category = err.category();
    debug!(code = err.code().raw(), ?category, error = %err, "reporting failure");
    reporter.report(category, category.message());
    category
}

/// Collects reports in memory.
#[derive(Debug, Default, Clone)]
pub struct VecReporter {
    pub entries: Vec<(ReportCategory, String)>,
}

impl Reporter for VecReporter {
    fn report(&mut self, category: ReportCategory, message: &str) {
        self.entries.push((category, message.to_owned()));
    }
}
