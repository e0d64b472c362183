//! The worker loop and the pool that runs it.

use std::thread;

use tracing::{debug, warn};

use crate::encode::Encoder;

use super::affinity::{AffinityProvider, NoAffinity};
use super::queue::JobQueue;
use super::reduce::BestResult;
use super::{EncodedResult, SearchError};

/// What one worker did before the queue ran dry.
#[derive(Debug, Clone, Default)]
pub struct WorkerReport {
    pub worker: usize,
    pub best: BestResult,
    pub attempted: usize,
    pub failed: usize,
}

/// Drain `queue`, encoding each job and keeping the smallest result.
///
/// Encode failures are logged and counted; they never stop the worker.
pub fn run_worker<E>(worker: usize, queue: &JobQueue<'_>, encoder: &E) -> WorkerReport
where
    E: Encoder + ?Sized,
{
    let mut report = WorkerReport {
        worker,
        ..WorkerReport::default()
    };

    while let Some(job) = queue.try_dequeue() {
        report.attempted += 1;
        match encoder.encode(job.raster, &job.params) {
            Ok(bytes) => {
                debug!(worker, seq = job.seq, size = bytes.len(), params = %job.params, "job encoded");
                report.best.offer(EncodedResult {
                    bytes,
                    params: job.params,
                    seq: job.seq,
                });
            }
            Err(err) => {
                warn!(worker, seq = job.seq, params = %job.params, error = %err, "job failed");
                report.failed += 1;
            }
        }
    }

    report
}

/// A fixed set of scoped worker threads.
pub struct WorkerPool {
    workers: usize,
    affinity: Box<dyn AffinityProvider>,
}

impl WorkerPool {
    /// A pool of `workers` threads (at least one) that are not pinned.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            affinity: Box::new(NoAffinity),
        }
    }

    pub fn with_affinity<A: AffinityProvider + 'static>(mut self, affinity: A) -> Self {
        self.affinity = Box::new(affinity);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run workers until `queue` is empty and collect their reports in
    /// worker index order.
    ///
    /// When no thread can be spawned the calling thread drains the queue as
    /// worker 0.
    pub fn run<E>(&self, queue: &JobQueue<'_>, encoder: &E) -> Result<Vec<WorkerReport>, SearchError>
    where
        E: Encoder + ?Sized,
    {
        let affinity: &dyn AffinityProvider = self.affinity.as_ref();

        let joined: Vec<thread::Result<WorkerReport>> = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.workers);
            for worker in 0..self.workers {
                let spawned = thread::Builder::new()
                    .name(format!("mcpng-worker-{worker}"))
                    .spawn_scoped(scope, move || {
                        affinity.pin_current(worker);
                        run_worker(worker, queue, encoder)
                    });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        debug!(worker, error = %err, "could not spawn worker");
                        break;
                    }
                }
            }

            if handles.is_empty() {
                return vec![Ok(run_worker(0, queue, encoder))];
            }
            // Join every handle before leaving the scope so a panic is
            // reported here rather than re-raised by the scope.
            handles.into_iter().map(|h| h.join()).collect()
        });

        joined
            .into_iter()
            .map(|report| report.map_err(|_| SearchError::WorkerPanicked))
            .collect()
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{BitDepth, ColorType, RasterImage};
    use crate::encode::{EncodeError, ParameterTuple};
    use crate::search::{generate_jobs, EffortLevel};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn raster() -> RasterImage {
        RasterImage::from_packed(1, 1, ColorType::Grayscale, BitDepth::Eight, &[7]).unwrap()
    }

    fn length_by_level(_: &RasterImage, params: &ParameterTuple) -> Result<Vec<u8>, EncodeError> {
        if params.compression_level == 3 {
            return Err(EncodeError::Deflate("refused".to_string()));
        }
        Ok(vec![0; 100 - usize::from(params.compression_level)])
    }

    #[test]
    fn test_run_worker_counts_failures() {
        let raster = raster();
        let mut queue = JobQueue::new();
        queue.enqueue_all(generate_jobs(&raster, EffortLevel::MAX));
        let report = run_worker(0, &queue, &length_by_level);

        assert_eq!(report.attempted, 1050);
        assert_eq!(report.failed, 150);
        let best = report.best.into_inner().unwrap();
        assert_eq!(best.len(), 91);
        assert_eq!(best.seq, 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pool_reports_every_job_once() {
        let raster = raster();
        let mut queue = JobQueue::new();
        queue.enqueue_all(generate_jobs(&raster, EffortLevel::new(6)));
        let calls = AtomicUsize::new(0);
        let encoder = |_: &RasterImage, _: &ParameterTuple| {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok::<_, EncodeError>(vec![1])
        };

        let reports = WorkerPool::new(4).run(&queue, &encoder).unwrap();
        assert_eq!(reports.len(), 4);
        assert_eq!(reports.iter().map(|r| r.attempted).sum::<usize>(), 288);
        assert_eq!(calls.load(Ordering::Relaxed), 288);
        let workers: Vec<usize> = reports.iter().map(|r| r.worker).collect();
        assert_eq!(workers, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_pool_surfaces_panics() {
        let raster = raster();
        let mut queue = JobQueue::new();
        queue.enqueue_all(generate_jobs(&raster, EffortLevel::new(3)));
        let encoder = |_: &RasterImage, params: &ParameterTuple| -> Result<Vec<u8>, EncodeError> {
            if params.strategy == crate::encode::Strategy::Filtered {
                panic!("encoder bug");
            }
            Ok(vec![0])
        };

        let result = WorkerPool::new(2).run(&queue, &encoder);
        assert!(matches!(result, Err(SearchError::WorkerPanicked)));
    }

    #[test]
    fn test_pool_with_affinity() {
        let raster = raster();
        let mut queue = JobQueue::new();
        queue.enqueue_all(generate_jobs(&raster, EffortLevel::new(4)));
        let pool = WorkerPool::new(3).with_affinity(crate::search::CoreAffinity::detect());
        let reports = pool.run(&queue, &length_by_level).unwrap();
        assert_eq!(reports.iter().map(|r| r.attempted).sum::<usize>(), 36);
    }

    #[test]
    fn test_zero_workers_means_one() {
        assert_eq!(WorkerPool::new(0).workers(), 1);
    }
}
