//! The scheduler's pending-job FIFO, matching the source's "Assumed FIFO"
//! `workload_queue: List[Job]`.

use std::collections::VecDeque;

use skyshift_types::Job;

#[derive(Default)]
pub struct WorkloadQueue {
    jobs: VecDeque<Job>,
}

impl WorkloadQueue {
    pub fn push(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    pub fn pop_front(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use skyshift_types::Metadata;

    use super::*;

    fn job_named(name: &str) -> Job {
        Job { metadata: Metadata::namespaced(name, "default"), ..Default::default() }
    }

    #[test]
    fn fifo_order() {
        let mut queue = WorkloadQueue::default();
        queue.push(job_named("a"));
        queue.push(job_named("b"));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop_front().unwrap().metadata.name, "a");
        assert_eq!(queue.pop_front().unwrap().metadata.name, "b");
        assert!(queue.is_empty());
    }
}
