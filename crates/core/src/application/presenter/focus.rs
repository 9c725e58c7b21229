// Focus tracking: which job the result view shows

use crate::domain::JobId;

#[derive(Debug, Clone)]
struct Candidate {
    job_id: JobId,
    ended_at: i64,
    position: usize,
}

/// Decides the focused job.
///
/// An explicit selection always wins at the time it is made. A job that
/// reaches a terminal status takes the focus; when several finish inside
/// one batch (a refresh cycle), the latest `ended_at` wins and ties go to
/// the job further down the dashboard.
#[derive(Debug, Default)]
pub struct FocusTracker {
    focused: Option<JobId>,
    batch: Option<Vec<Candidate>>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<&JobId> {
        self.focused.as_ref()
    }

    pub fn select(&mut self, job_id: JobId) {
        self.focused = Some(job_id);
    }

    pub fn clear(&mut self) {
        self.focused = None;
    }

    /// Start collecting terminal transitions instead of applying them
    pub fn begin_batch(&mut self) {
        if self.batch.is_none() {
            self.batch = Some(Vec::new());
        }
    }

    /// A job reached a terminal status
    pub fn offer(&mut self, job_id: JobId, ended_at: i64, position: usize) {
        match self.batch.as_mut() {
            Some(batch) => batch.push(Candidate {
                job_id,
                ended_at,
                position,
            }),
            None => self.focused = Some(job_id),
        }
    }

    /// Close the batch and move focus to its winner, if any
    pub fn end_batch(&mut self) -> Option<&JobId> {
        let batch = self.batch.take().unwrap_or_default();
        if let Some(winner) = batch
            .into_iter()
            .max_by_key(|c| (c.ended_at, c.position))
        {
            self.focused = Some(winner.job_id);
        }
        self.focused.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_outside_batch_takes_focus() {
        let mut focus = FocusTracker::new();
        focus.select(JobId::remote("a"));
        focus.offer(JobId::remote("b"), 10, 1);
        assert_eq!(focus.focused(), Some(&JobId::remote("b")));
    }

    #[test]
    fn test_batch_prefers_latest_end_then_lower_row() {
        let mut focus = FocusTracker::new();
        focus.begin_batch();
        focus.offer(JobId::remote("a"), 500, 0);
        focus.offer(JobId::remote("b"), 700, 1);
        focus.offer(JobId::remote("c"), 600, 2);
        assert_eq!(focus.end_batch(), Some(&JobId::remote("b")));

        focus.begin_batch();
        focus.offer(JobId::remote("c"), 900, 2);
        focus.offer(JobId::remote("a"), 900, 0);
        assert_eq!(focus.end_batch(), Some(&JobId::remote("c")));
    }

    #[test]
    fn test_empty_batch_keeps_focus() {
        let mut focus = FocusTracker::new();
        focus.select(JobId::local("1"));
        focus.begin_batch();
        assert_eq!(focus.end_batch(), Some(&JobId::local("1")));
    }
}
