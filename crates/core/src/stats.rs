//! Aggregate scheduling statistics, derived once from a finished-process
//! snapshot and per-core cycle counters.

use crate::process::Pcb;

/// Per-run summary statistics, computed from immutable snapshots at
/// [`crate::scheduler::SchedulerCore::statistics`] time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Mean time (nanoseconds) spent in the ready queue, over finished
    /// processes.
    pub avg_wait_nanos: f64,
    /// Mean `finish - arrival` (nanoseconds).
    pub avg_turnaround_nanos: f64,
    /// Mean `start - arrival` (nanoseconds); processes that never started
    /// contribute 0.
    pub avg_response_nanos: f64,
    /// `sum(busy) / sum(busy + idle)` across cores, or 0 if the denominator
    /// is 0.
    pub avg_cpu_util: f64,
    /// Completed processes per second of wall-clock between the first
    /// arrival and the last finish, or 0 if that interval is 0.
    pub throughput_per_sec: f64,
    /// Scheduler-global dispatch-boundary transition count.
    pub context_switches: u64,
    /// Count of processes that reached `Finished`.
    pub finished_count: u64,
    /// Count of processes that reached `Failed`.
    pub failed_count: u64,
}

/// Computes [`Statistics`] from a finished-process list, the scheduler's
/// global context-switch counter, and every core's busy/idle cycle totals.
///
/// `finished` must contain every PCB that reached `Finished` or `Failed`;
/// the two counts are distinguished by `Pcb::state`.
#[must_use]
pub fn compute(finished: &[Pcb], context_switches: u64, core_cycles: &[(u64, u64)]) -> Statistics {
    let finished_count = finished
        .iter()
        .filter(|p| p.state == crate::process::ProcessState::Finished)
        .count() as u64;
    let failed_count = finished.len() as u64 - finished_count;

    let avg_wait_nanos = mean(finished.iter().map(|p| p.wait_total_nanos as f64));
    let avg_turnaround_nanos = mean(
        finished
            .iter()
            .filter_map(Pcb::turnaround_nanos)
            .map(|v| v as f64),
    );
    let avg_response_nanos = mean(
        finished
            .iter()
            .map(|p| p.response_nanos().unwrap_or(0) as f64),
    );

    let (busy, idle) = core_cycles
        .iter()
        .fold((0u64, 0u64), |(b, i), &(cb, ci)| (b + cb, i + ci));
    let avg_cpu_util = if busy + idle == 0 {
        0.0
    } else {
        busy as f64 / (busy + idle) as f64
    };

    let throughput_per_sec = throughput(finished);

    Statistics {
        avg_wait_nanos,
        avg_turnaround_nanos,
        avg_response_nanos,
        avg_cpu_util,
        throughput_per_sec,
        context_switches,
        finished_count,
        failed_count,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut count = 0u64;
    let mut sum = 0.0;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn throughput(finished: &[Pcb]) -> f64 {
    let arrivals: Vec<u64> = finished.iter().filter_map(|p| p.timestamps.arrival).collect();
    let finishes: Vec<u64> = finished.iter().filter_map(|p| p.timestamps.finish).collect();
    let (Some(&min_arrival), Some(&max_finish)) = (arrivals.iter().min(), finishes.iter().max())
    else {
        return 0.0;
    };
    let span_nanos = max_finish.saturating_sub(min_arrival);
    if span_nanos == 0 {
        0.0
    } else {
        finished.len() as f64 / (span_nanos as f64 / 1_000_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::MemoryWeights;
    use crate::process::ProcessState;

    fn finished_pcb(pid: u64, arrival: u64, start: u64, finish: u64, wait: u64) -> Pcb {
        let mut pcb = Pcb::new(pid, "p", 0, 1, 0, 0, MemoryWeights::default());
        pcb.state = ProcessState::Finished;
        pcb.timestamps.arrival = Some(arrival);
        pcb.timestamps.start = Some(start);
        pcb.timestamps.finish = Some(finish);
        pcb.wait_total_nanos = wait;
        pcb
    }

    #[test]
    fn empty_input_is_all_zero() {
        let stats = compute(&[], 0, &[]);
        assert_eq!(stats.avg_wait_nanos, 0.0);
        assert_eq!(stats.avg_cpu_util, 0.0);
        assert_eq!(stats.throughput_per_sec, 0.0);
        assert_eq!(stats.finished_count, 0);
    }

    #[test]
    fn averages_over_finished_processes() {
        let procs = vec![
            finished_pcb(1, 0, 10, 1_000_000_000, 5),
            finished_pcb(2, 0, 20, 2_000_000_000, 15),
        ];
        let stats = compute(&procs, 4, &[(80, 20), (60, 40)]);
        assert_eq!(stats.avg_wait_nanos, 10.0);
        assert_eq!(stats.finished_count, 2);
        assert_eq!(stats.failed_count, 0);
        assert_eq!(stats.context_switches, 4);
        assert!((stats.avg_cpu_util - 0.7).abs() < 1e-9);
    }

    #[test]
    fn failed_processes_are_counted_separately() {
        let mut failed = finished_pcb(3, 0, 5, 100, 1);
        failed.state = ProcessState::Failed;
        let stats = compute(&[failed], 0, &[]);
        assert_eq!(stats.finished_count, 0);
        assert_eq!(stats.failed_count, 1);
    }

    #[test]
    fn throughput_is_zero_over_a_zero_span() {
        let procs = vec![finished_pcb(1, 5, 5, 5, 0)];
        let stats = compute(&procs, 0, &[]);
        assert_eq!(stats.throughput_per_sec, 0.0);
    }
}
