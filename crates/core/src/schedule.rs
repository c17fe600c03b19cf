//! Deferred work on a host-supplied clock.
//!
//! The host event loop is single-threaded, so nothing here blocks or
//! spawns. The host reports the current time through [`Scheduler::take_due`]
//! and dispatches whatever keys come back. Tasks are keyed: scheduling a key
//! that is already pending replaces it, so a key is never live twice.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKey {
    /// Hide a section's exiting overlay once its CSS transition is over.
    HideOverlay(String),
    /// Advance the timeline during playback.
    PlayTick,
    /// Drop a section's fullscreen entrance animation class.
    FullscreenEntered(String),
    /// Finish an animated exit from fullscreen.
    FullscreenExited(String),
}

#[derive(Debug, Clone)]
struct Task {
    key: TaskKey,
    due_ms: u64,
    repeat_ms: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `key` once, `delay_ms` after `now_ms`. Returns `true` when a
    /// pending task with the same key was replaced.
    pub fn schedule_once(&mut self, key: TaskKey, now_ms: u64, delay_ms: u64) -> bool {
        let replaced = self.cancel(&key);
        self.tasks.push(Task {
            key,
            due_ms: now_ms + delay_ms,
            repeat_ms: None,
        });
        replaced
    }

    /// Run `key` every `interval_ms`, first at `now_ms + interval_ms`.
    pub fn schedule_repeating(&mut self, key: TaskKey, now_ms: u64, interval_ms: u64) -> bool {
        let interval_ms = interval_ms.max(1);
        let replaced = self.cancel(&key);
        self.tasks.push(Task {
            key,
            due_ms: now_ms + interval_ms,
            repeat_ms: Some(interval_ms),
        });
        replaced
    }

    /// Drop a pending task. Returns whether one existed.
    pub fn cancel(&mut self, key: &TaskKey) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| &t.key != key);
        before != self.tasks.len()
    }

    pub fn is_scheduled(&self, key: &TaskKey) -> bool {
        self.tasks.iter().any(|t| &t.key == key)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Earliest due time, if anything is pending.
    pub fn next_due(&self) -> Option<u64> {
        self.tasks.iter().map(|t| t.due_ms).min()
    }

    /// Collect every firing due at or before `now_ms`, in due order.
    ///
    /// One-shot tasks are removed. A repeating task fires at most once per
    /// call, however many intervals have passed, and is rescheduled one
    /// interval after `now_ms`. Missed ticks are dropped.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<TaskKey> {
        let mut fired: Vec<(u64, TaskKey)> = Vec::new();
        self.tasks.retain_mut(|task| {
            match task.repeat_ms {
                None => {
                    if task.due_ms <= now_ms {
                        fired.push((task.due_ms, task.key.clone()));
                        return false;
                    }
                }
                Some(interval) => {
                    if task.due_ms <= now_ms {
                        fired.push((task.due_ms, task.key.clone()));
                        task.due_ms = now_ms + interval;
                    }
                }
            }
            true
        });
        fired.sort_by_key(|(due, _)| *due);
        fired.into_iter().map(|(_, key)| key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_fires_once() {
        let mut s = Scheduler::new();
        s.schedule_once(TaskKey::HideOverlay("compare".into()), 1_000, 400);
        assert!(s.take_due(1_399).is_empty());
        assert_eq!(
            s.take_due(1_400),
            vec![TaskKey::HideOverlay("compare".into())]
        );
        assert!(s.take_due(5_000).is_empty());
        assert!(s.is_empty());
    }

    #[test]
    fn same_key_replaces() {
        let mut s = Scheduler::new();
        let key = TaskKey::HideOverlay("find".into());
        assert!(!s.schedule_once(key.clone(), 0, 400));
        assert!(s.schedule_once(key.clone(), 300, 400));
        assert_eq!(s.len(), 1);
        assert!(s.take_due(400).is_empty());
        assert_eq!(s.take_due(700), vec![key]);
    }

    #[test]
    fn repeating_reschedules_from_now_and_cancels() {
        let mut s = Scheduler::new();
        s.schedule_repeating(TaskKey::PlayTick, 0, 100);
        assert!(s.take_due(99).is_empty());
        assert_eq!(s.take_due(250), vec![TaskKey::PlayTick]);
        assert_eq!(s.next_due(), Some(350));
        assert!(s.take_due(300).is_empty());
        assert_eq!(s.take_due(350).len(), 1);
        assert!(s.cancel(&TaskKey::PlayTick));
        assert!(s.take_due(1_000).is_empty());
    }

    #[test]
    fn long_gap_fires_repeating_task_once() {
        let mut s = Scheduler::new();
        s.schedule_repeating(TaskKey::PlayTick, 0, 100);
        assert_eq!(s.take_due(3_600_000), vec![TaskKey::PlayTick]);
        assert_eq!(s.next_due(), Some(3_600_100));
        assert!(s.take_due(3_600_050).is_empty());
    }

    #[test]
    fn fired_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule_once(TaskKey::HideOverlay("b".into()), 0, 300);
        s.schedule_repeating(TaskKey::PlayTick, 0, 100);
        s.schedule_once(TaskKey::HideOverlay("a".into()), 0, 150);
        let fired = s.take_due(300);
        assert_eq!(
            fired,
            vec![
                TaskKey::PlayTick,
                TaskKey::HideOverlay("a".into()),
                TaskKey::HideOverlay("b".into()),
            ]
        );
    }

    #[test]
    fn ties_keep_scheduling_order() {
        let mut s = Scheduler::new();
        s.schedule_once(TaskKey::HideOverlay("find".into()), 0, 400);
        s.schedule_once(TaskKey::HideOverlay("compare".into()), 100, 300);
        assert_eq!(
            s.take_due(400),
            vec![
                TaskKey::HideOverlay("find".into()),
                TaskKey::HideOverlay("compare".into()),
            ]
        );
    }
}
