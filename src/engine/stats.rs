//! Process resource usage with running maxima.

use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::time::Instant;
use tracing::warn;

/// One reading of process resource usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSample {
    /// Live async tasks in the runtime.
    pub concurrent_tasks: usize,
    pub memory_bytes: u64,
    pub sampled_at: Instant,
}

/// Current usage plus the highest values seen since start.
#[derive(Debug, Clone)]
pub struct ResourceStats {
    started_at: Instant,
    current: ResourceSample,
    max_tasks: usize,
    max_memory_bytes: u64,
}

impl ResourceStats {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(started_at: Instant) -> Self {
        Self {
            started_at,
            current: ResourceSample {
                concurrent_tasks: 0,
                memory_bytes: 0,
                sampled_at: started_at,
            },
            max_tasks: 0,
            max_memory_bytes: 0,
        }
    }

    pub fn sample(&mut self, concurrent_tasks: usize, memory_bytes: u64) {
        self.record(ResourceSample {
            concurrent_tasks,
            memory_bytes,
            sampled_at: Instant::now(),
        });
    }

    pub fn record(&mut self, sample: ResourceSample) {
        self.current = sample;
        self.max_tasks = self.max_tasks.max(sample.concurrent_tasks);
        self.max_memory_bytes = self.max_memory_bytes.max(sample.memory_bytes);
    }

    /// Time since start, truncated to whole seconds.
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs(self.started_at.elapsed().as_secs())
    }

    pub fn current(&self) -> &ResourceSample {
        &self.current
    }

    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    pub fn max_memory_bytes(&self) -> u64 {
        self.max_memory_bytes
    }

    pub fn current_memory_kb(&self) -> u64 {
        self.current.memory_bytes / 1024
    }

    pub fn max_memory_kb(&self) -> u64 {
        self.max_memory_bytes / 1024
    }
}

impl Default for ResourceStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Somewhere to read resource usage from on each sample tick.
pub trait UsageSource: Send {
    fn read(&mut self) -> ResourceSample;
}

/// Usage of the current process: alive tokio tasks and resident memory.
pub struct ProcessUsage {
    system: System,
    pid: Option<Pid>,
}

impl ProcessUsage {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("Cannot determine own pid, memory will read as 0: {}", e);
                None
            }
        };
        Self {
            system: System::new(),
            pid,
        }
    }

    fn memory_bytes(&mut self) -> u64 {
        let Some(pid) = self.pid else {
            return 0;
        };
        // Only our own process; a full scan would touch every pid on the host.
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::new().with_memory(),
        );
        self.system.process(pid).map(|p| p.memory()).unwrap_or(0)
    }
}

impl Default for ProcessUsage {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageSource for ProcessUsage {
    fn read(&mut self) -> ResourceSample {
        let concurrent_tasks = tokio::runtime::Handle::try_current()
            .map(|h| h.metrics().num_alive_tasks())
            .unwrap_or(0);
        ResourceSample {
            concurrent_tasks,
            memory_bytes: self.memory_bytes(),
            sampled_at: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maxima_track_highest_values() {
        let mut stats = ResourceStats::new();

        stats.sample(5, 1024);
        assert_eq!(stats.max_tasks(), 5);
        assert_eq!(stats.max_memory_bytes(), 1024);

        // Lower values keep the maxima.
        stats.sample(3, 512);
        assert_eq!(stats.max_tasks(), 5);
        assert_eq!(stats.max_memory_bytes(), 1024);
        assert_eq!(stats.current().concurrent_tasks, 3);
        assert_eq!(stats.current().memory_bytes, 512);

        stats.sample(10, 2048);
        assert_eq!(stats.max_tasks(), 10);
        assert_eq!(stats.max_memory_bytes(), 2048);
    }

    #[test]
    fn test_maxima_dominate_and_never_decrease() {
        let readings = [
            (4, 9_000),
            (1, 12_000),
            (7, 3_000),
            (0, 0),
            (7, 12_001),
            (2, 500),
        ];
        let mut stats = ResourceStats::new();
        let (mut prev_tasks, mut prev_mem) = (0, 0);
        for (tasks, mem) in readings {
            stats.sample(tasks, mem);
            assert!(stats.max_tasks() >= stats.current().concurrent_tasks);
            assert!(stats.max_memory_bytes() >= stats.current().memory_bytes);
            assert!(stats.max_tasks() >= prev_tasks);
            assert!(stats.max_memory_bytes() >= prev_mem);
            prev_tasks = stats.max_tasks();
            prev_mem = stats.max_memory_bytes();
        }
        assert_eq!(stats.max_tasks(), 7);
        assert_eq!(stats.max_memory_bytes(), 12_001);
    }

    #[test]
    fn test_memory_in_kilobytes() {
        let mut stats = ResourceStats::new();
        stats.sample(1, 2048 + 1023);
        assert_eq!(stats.current_memory_kb(), 2);
        assert_eq!(stats.max_memory_kb(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_truncates_to_seconds() {
        let stats = ResourceStats::new();
        tokio::time::advance(Duration::from_millis(2_750)).await;
        assert_eq!(stats.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_process_usage_reads_live_values() {
        let task = tokio::spawn(std::future::pending::<()>());
        let mut usage = ProcessUsage::new();
        let sample = usage.read();
        task.abort();
        assert!(sample.concurrent_tasks >= 1);
        assert!(sample.memory_bytes > 0);
    }
}
