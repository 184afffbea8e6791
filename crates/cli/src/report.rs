//! Report sink: renders a completed run's [`msim_core::Statistics`] as CSV
//! or human-readable text.
//!
//! Both writers are pure over an already-computed [`PolicyRun`] — no
//! simulation work happens here, and nothing is retained between runs. The
//! text layout (section header, aligned columns, percentages) follows the
//! `SimStats::print_sections` texture this workspace is descended from.

use std::io::Write;
use std::path::Path;

use msim_core::Statistics;
use thiserror::Error;

/// Errors writing a report to disk.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The output path could not be created or written to.
    #[error("failed to write report to {path}: {source}")]
    Io {
        /// The path that could not be written.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// One run's statistics plus the configuration that produced them, the unit
/// both report writers render one row/section from.
#[derive(Debug, Clone, Copy)]
pub struct PolicyRun<'a> {
    /// Short policy name, as accepted by `--policy`.
    pub policy: &'a str,
    /// Number of cores the run used.
    pub cores: usize,
    /// The computed run statistics.
    pub stats: Statistics,
    /// Shared-tier cache hits across the run.
    pub cache_hits: u64,
    /// Shared-tier cache misses across the run.
    pub cache_misses: u64,
}

impl PolicyRun<'_> {
    fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

/// Writes one CSV row per run to `path`, one column per §4.6 statistic plus
/// `{policy, cores, cache_hits, cache_misses, hit_rate}`.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if `path` cannot be created or written.
pub fn write_csv(runs: &[PolicyRun<'_>], path: &Path) -> Result<(), ReportError> {
    let mut out = String::new();
    out.push_str(
        "policy,cores,avg_wait_nanos,avg_turnaround_nanos,avg_response_nanos,avg_cpu_util,\
         throughput_per_sec,context_switches,finished_count,failed_count,\
         cache_hits,cache_misses,hit_rate\n",
    );
    for run in runs {
        let s = &run.stats;
        out.push_str(&format!(
            "{},{},{},{},{},{:.6},{:.6},{},{},{},{},{},{:.6}\n",
            run.policy,
            run.cores,
            s.avg_wait_nanos,
            s.avg_turnaround_nanos,
            s.avg_response_nanos,
            s.avg_cpu_util,
            s.throughput_per_sec,
            s.context_switches,
            s.finished_count,
            s.failed_count,
            run.cache_hits,
            run.cache_misses,
            run.hit_rate(),
        ));
    }
    write_file(path, &out)
}

/// Writes a human-readable summary of every run to `path`: one bordered
/// section per run, aligned columns, percentages where meaningful.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if `path` cannot be created or written.
pub fn write_text(runs: &[PolicyRun<'_>], path: &Path) -> Result<(), ReportError> {
    write_file(path, &render_text(runs))
}

/// Builds the same text [`write_text`] writes to disk, for printing to
/// stdout when no `--report` path was given.
#[must_use]
pub fn render_text(runs: &[PolicyRun<'_>]) -> String {
    let mut out = String::new();
    for run in runs {
        let s = &run.stats;
        out.push_str("==========================================================\n");
        out.push_str(&format!("SCHEDULER RUN  policy={}  cores={}\n", run.policy, run.cores));
        out.push_str("==========================================================\n");
        out.push_str(&format!("finished                 {}\n", s.finished_count));
        out.push_str(&format!("failed                   {}\n", s.failed_count));
        out.push_str(&format!("context_switches         {}\n", s.context_switches));
        out.push_str("----------------------------------------------------------\n");
        out.push_str(&format!("avg_wait                 {:.2} ns\n", s.avg_wait_nanos));
        out.push_str(&format!("avg_turnaround           {:.2} ns\n", s.avg_turnaround_nanos));
        out.push_str(&format!("avg_response             {:.2} ns\n", s.avg_response_nanos));
        out.push_str(&format!("cpu_util                 {:.2}%\n", s.avg_cpu_util * 100.0));
        out.push_str(&format!("throughput               {:.2} procs/s\n", s.throughput_per_sec));
        out.push_str("----------------------------------------------------------\n");
        out.push_str("MEMORY HIERARCHY\n");
        let total = run.cache_hits + run.cache_misses;
        out.push_str(&format!(
            "  L1     accesses: {:<10} | hits: {:<10} | hit_rate: {:.2}%\n",
            total,
            run.cache_hits,
            run.hit_rate() * 100.0
        ));
        out.push_str("==========================================================\n");
    }
    out
}

fn write_file(path: &Path, contents: &str) -> Result<(), ReportError> {
    let mut file = std::fs::File::create(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(contents.as_bytes()).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats() -> Statistics {
        msim_core::stats::compute(&[], 0, &[])
    }

    #[test]
    fn csv_has_a_header_and_one_row_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let run = PolicyRun {
            policy: "rr",
            cores: 2,
            stats: sample_stats(),
            cache_hits: 9,
            cache_misses: 1,
        };
        write_csv(&[run], &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("policy,cores"));
        assert!(lines[1].starts_with("rr,2,"));
    }

    #[test]
    fn text_report_includes_policy_and_hit_rate() {
        let run = PolicyRun {
            policy: "fcfs",
            cores: 1,
            stats: sample_stats(),
            cache_hits: 3,
            cache_misses: 1,
        };
        let rendered = render_text(&[run]);
        assert!(rendered.contains("policy=fcfs"));
        assert!(rendered.contains("hit_rate: 75.00%"));
    }

    #[test]
    fn hit_rate_is_zero_with_no_accesses() {
        let run = PolicyRun {
            policy: "sjn",
            cores: 1,
            stats: sample_stats(),
            cache_hits: 0,
            cache_misses: 0,
        };
        assert_eq!(run.hit_rate(), 0.0);
    }
}
