//! Shared pending-job queue.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::Job;

/// FIFO of pending jobs behind a single lock.
///
/// Filling needs `&mut self`, so it cannot race with workers; draining takes
/// `&self` and hands each job to exactly one caller.
#[derive(Debug, Default)]
pub struct JobQueue<'a> {
    pending: Mutex<VecDeque<Job<'a>>>,
}

impl<'a> JobQueue<'a> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Append every job in order.
    pub fn enqueue_all<I>(&mut self, jobs: I)
    where
        I: IntoIterator<Item = Job<'a>>,
    {
        self.pending.get_mut().extend(jobs);
    }

    /// Remove the oldest job, or `None` once the queue is drained.
    #[inline]
    pub fn try_dequeue(&self) -> Option<Job<'a>> {
        self.pending.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{BitDepth, ColorType, RasterImage};
    use crate::search::{generate_jobs, EffortLevel};
    use std::collections::HashSet;

    fn raster() -> RasterImage {
        RasterImage::from_packed(2, 2, ColorType::Grayscale, BitDepth::Eight, &[1, 2, 3, 4]).unwrap()
    }

    #[test]
    fn test_fifo_order() {
        let raster = raster();
        let mut queue = JobQueue::new();
        queue.enqueue_all(generate_jobs(&raster, EffortLevel::new(3)));
        assert_eq!(queue.len(), 12);

        let seqs: Vec<usize> = std::iter::from_fn(|| queue.try_dequeue()).map(|j| j.seq).collect();
        assert_eq!(seqs, (0..12).collect::<Vec<_>>());
        assert!(queue.is_empty());
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_concurrent_drain_is_a_partition() {
        let raster = raster();
        let mut queue = JobQueue::new();
        queue.enqueue_all(generate_jobs(&raster, EffortLevel::MAX));
        let total = queue.len();

        let taken: Vec<Vec<usize>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        let mut seqs = Vec::new();
                        while let Some(job) = queue.try_dequeue() {
                            seqs.push(job.seq);
                        }
                        seqs
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let all: Vec<usize> = taken.into_iter().flatten().collect();
        let unique: HashSet<usize> = all.iter().copied().collect();
        assert_eq!(all.len(), total);
        assert_eq!(unique.len(), total);
    }
}
