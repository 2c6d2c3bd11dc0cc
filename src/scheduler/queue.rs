//! Deadline-ordered job registry.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::{BTreeSet, HashMap};

use super::jobs::JobFn;
use super::trigger::Trigger;

pub type JobId = u64;

pub struct ScheduledJob {
    pub name: String,
    pub description: String,
    pub trigger: Trigger,
    pub registered_at: DateTime<Utc>,
    pub custom: bool,
    pub(crate) action: JobFn,
    next_run: NaiveDateTime,
}

/// A job popped from the queue because its deadline passed.
pub struct DueJob {
    pub id: JobId,
    pub name: String,
    pub deadline: NaiveDateTime,
    pub action: JobFn,
}

/// Read-only view of one registered job.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub name: String,
    pub description: String,
    pub trigger: String,
    pub custom: bool,
    pub next_run: NaiveDateTime,
}

#[derive(Default)]
pub struct JobQueue {
    jobs: HashMap<JobId, ScheduledJob>,
    deadlines: BTreeSet<(NaiveDateTime, JobId)>,
    next_id: JobId,
    next_custom: u64,
}

impl JobQueue {
    /// Register a job relative to `now`. Returns `None` when the trigger never fires.
    pub fn insert(
        &mut self,
        name: &str,
        description: &str,
        trigger: Trigger,
        custom: bool,
        action: JobFn,
        now: NaiveDateTime,
    ) -> Option<JobId> {
        let next_run = trigger.first_after(now)?;
        let id = self.next_id;
        self.next_id += 1;

        self.jobs.insert(
            id,
            ScheduledJob {
                name: name.to_string(),
                description: description.to_string(),
                trigger,
                registered_at: Utc::now(),
                custom,
                action,
                next_run,
            },
        );
        self.deadlines.insert((next_run, id));
        Some(id)
    }

    pub fn remove(&mut self, id: JobId) -> bool {
        match self.jobs.remove(&id) {
            Some(job) => {
                self.deadlines.remove(&(job.next_run, id));
                true
            }
            None => false,
        }
    }

    pub fn next_deadline(&self) -> Option<NaiveDateTime> {
        self.deadlines.first().map(|(at, _)| *at)
    }

    /// Take every job whose deadline is at or before `now` and reschedule it
    /// from `now`. Exhausted one-shot jobs are dropped.
    pub fn pop_due(&mut self, now: NaiveDateTime) -> Vec<DueJob> {
        let mut due = Vec::new();
        while let Some(&(deadline, id)) = self.deadlines.first() {
            if deadline > now {
                break;
            }
            self.deadlines.pop_first();

            let Some(job) = self.jobs.get_mut(&id) else {
                continue;
            };
            due.push(DueJob {
                id,
                name: job.name.clone(),
                deadline,
                action: job.action.clone(),
            });

            match job.trigger.next_after(now) {
                Some(next) => {
                    job.next_run = next;
                    self.deadlines.insert((next, id));
                }
                None => {
                    self.jobs.remove(&id);
                }
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// A `custom_<n>` name never handed out before, even if earlier
    /// custom jobs have since been removed.
    pub fn next_custom_name(&mut self) -> String {
        let name = format!("custom_{}", self.next_custom);
        self.next_custom += 1;
        name
    }

    pub fn custom_count(&self) -> usize {
        self.jobs.values().filter(|j| j.custom).count()
    }

    /// Jobs in deadline order.
    pub fn summaries(&self) -> Vec<JobSummary> {
        self.deadlines
            .iter()
            .filter_map(|(_, id)| {
                let job = self.jobs.get(id)?;
                Some(JobSummary {
                    id: *id,
                    name: job.name.clone(),
                    description: job.description.clone(),
                    trigger: job.trigger.to_string(),
                    custom: job.custom,
                    next_run: job.next_run,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::jobs::job_fn;
    use chrono::{Duration, NaiveDate};

    fn noop() -> JobFn {
        job_fn(|_ctx| async { Ok(()) })
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn daily_job_fires_once_per_day_under_minute_ticks() {
        let mut queue = JobQueue::default();
        let start = at(10, 8, 0);
        queue.insert("report", "", Trigger::daily("09:00").unwrap(), false, noop(), start);

        let mut fired = Vec::new();
        let mut now = start;
        while now < at(12, 8, 0) {
            now += Duration::minutes(1);
            fired.extend(queue.pop_due(now).into_iter().map(|d| d.deadline));
        }

        assert_eq!(fired, vec![at(10, 9, 0), at(11, 9, 0)]);
        assert_eq!(queue.next_deadline(), Some(at(12, 9, 0)));
    }

    #[test]
    fn once_job_is_dropped_after_firing() {
        let mut queue = JobQueue::default();
        let now = at(10, 12, 0);
        queue.insert("reminder", "", Trigger::Once { at: at(10, 12, 5) }, true, noop(), now);
        assert_eq!(queue.custom_count(), 1);

        assert!(queue.pop_due(at(10, 12, 4)).is_empty());
        assert_eq!(queue.pop_due(at(10, 12, 5)).len(), 1);
        assert!(queue.is_empty());
        assert_eq!(queue.next_deadline(), None);
    }

    #[test]
    fn late_tick_fires_each_job_once_and_reschedules_from_now() {
        let mut queue = JobQueue::default();
        let start = at(10, 0, 0);
        queue.insert("a", "", Trigger::hours(1).unwrap(), false, noop(), start);
        queue.insert("b", "", Trigger::hours(2).unwrap(), false, noop(), start);

        // Six hours late: no catch-up burst.
        let due = queue.pop_due(at(10, 6, 0));
        let mut names: Vec<String> = due.into_iter().map(|d| d.name).collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(queue.next_deadline(), Some(at(10, 7, 0)));
    }

    #[test]
    fn summaries_are_deadline_ordered_and_remove_works() {
        let mut queue = JobQueue::default();
        let now = at(10, 0, 0);
        let late = queue
            .insert("late", "", Trigger::hours(5).unwrap(), false, noop(), now)
            .unwrap();
        queue.insert("soon", "", Trigger::minutes(5).unwrap(), false, noop(), now);

        let names: Vec<String> = queue.summaries().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["soon", "late"]);

        assert!(queue.remove(late));
        assert!(!queue.remove(late));
        assert_eq!(queue.len(), 1);
    }
}
