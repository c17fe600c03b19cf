use log::debug;

use crate::config::TimelineConfig;
use crate::model::{HousingDataset, RankSnapshot};
use crate::schedule::{Scheduler, TaskKey};
use crate::viz::surface::Surfaces;

/// Slider position and the play loop.
#[derive(Debug, Clone)]
pub struct TimelineController {
    config: TimelineConfig,
    index: usize,
    playing: bool,
}

impl TimelineController {
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            config,
            index: 0,
            playing: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Show the date at `index` (clamped): restyle the map and re-join the
    /// rank dots. Returns the index actually shown.
    pub fn set_date(&mut self, dataset: &HousingDataset, surfaces: &mut Surfaces, index: usize) -> usize {
        let index = dataset.timeline().clamp(index);
        self.index = index;

        let slice = dataset.slice(index);
        surfaces.map.set_slice(slice, self.config.map_transition_ms);
        if let Some(slice) = slice {
            let snapshot = RankSnapshot::from_slice(slice);
            surfaces.rank.join(&snapshot, self.config.dot_transition_ms);
        }
        surfaces.line.cursor = index;
        surfaces.rank.cursor = index;
        index
    }

    /// Advance one step, wrapping to 0 after the last date.
    pub fn tick(&mut self, dataset: &HousingDataset, surfaces: &mut Surfaces) -> usize {
        let next = if self.index >= dataset.timeline().slider_max() {
            0
        } else {
            self.index + 1
        };
        self.set_date(dataset, surfaces, next)
    }

    /// Start the play loop, replacing any existing one.
    pub fn play(&mut self, scheduler: &mut Scheduler, now_ms: u64) {
        scheduler.schedule_repeating(TaskKey::PlayTick, now_ms, self.config.play_interval_ms);
        self.playing = true;
        debug!("timeline playing every {}ms", self.config.play_interval_ms);
    }

    pub fn pause(&mut self, scheduler: &mut Scheduler) {
        scheduler.cancel(&TaskKey::PlayTick);
        self.playing = false;
    }

    /// Play/pause button. Returns whether the timeline is now playing.
    pub fn toggle(&mut self, scheduler: &mut Scheduler, now_ms: u64) -> bool {
        if self.playing {
            self.pause(scheduler);
        } else {
            self.play(scheduler, now_ms);
        }
        self.playing
    }

    /// Run a fired scheduler task. Returns whether it belonged here.
    pub fn on_task(&mut self, key: &TaskKey, dataset: &HousingDataset, surfaces: &mut Surfaces) -> bool {
        if *key != TaskKey::PlayTick {
            return false;
        }
        if self.playing {
            self.tick(dataset, surfaces);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CalendarDate, TimeSeriesRecord};

    fn fixture(months: u32) -> (HousingDataset, Surfaces) {
        let mut records = Vec::new();
        for m in 1..=months {
            for (i, b) in ["Camden", "Barnet", "Brent"].iter().enumerate() {
                records.push(TimeSeriesRecord {
                    region: b.to_string(),
                    date: CalendarDate::new(2024, m, 1),
                    average_price: Some(f64::from(m) * 1_000.0 + (i as f64) * 300.0 * f64::from(m % 2)),
                    change_1m: None,
                    change_12m: None,
                });
            }
        }
        let dataset = HousingDataset::from_records(records);
        let surfaces = Surfaces::new(&dataset, Vec::new());
        (dataset, surfaces)
    }

    #[test]
    fn set_date_clamps() {
        let (ds, mut s) = fixture(3);
        let mut tl = TimelineController::new(TimelineConfig::default());
        assert_eq!(tl.set_date(&ds, &mut s, 99), 2);
        assert_eq!(s.rank.cursor, 2);
        assert_eq!(s.map.transition.duration_ms, 500);
    }

    #[test]
    fn ranks_are_a_permutation() {
        let (ds, mut s) = fixture(4);
        let mut tl = TimelineController::new(TimelineConfig::default());
        for i in 0..4 {
            tl.set_date(&ds, &mut s, i);
            s.advance(1_000);
            let mut ranks: Vec<usize> = s.rank.live_dots().map(|d| d.rank).collect();
            ranks.sort_unstable();
            assert_eq!(ranks, vec![1, 2, 3]);
        }
    }

    #[test]
    fn play_wraps_and_pause_stops() {
        let (ds, mut s) = fixture(3);
        let mut tl = TimelineController::new(TimelineConfig::default());
        let mut sched = Scheduler::new();
        tl.set_date(&ds, &mut s, 1);

        tl.play(&mut sched, 0);
        tl.play(&mut sched, 0);
        assert_eq!(sched.len(), 1);

        for key in sched.take_due(200) {
            tl.on_task(&key, &ds, &mut s);
        }
        assert_eq!(tl.index(), 0);

        assert!(!tl.toggle(&mut sched, 200));
        assert!(sched.is_empty());
        for key in sched.take_due(10_000) {
            tl.on_task(&key, &ds, &mut s);
        }
        assert_eq!(tl.index(), 0);
        assert!(tl.toggle(&mut sched, 300));
        assert_eq!(sched.next_due(), Some(400));
    }

    #[test]
    fn empty_timeline_stays_at_zero() {
        let ds = HousingDataset::from_records(Vec::new());
        let mut s = Surfaces::new(&ds, Vec::new());
        let mut tl = TimelineController::new(TimelineConfig::default());
        assert_eq!(tl.tick(&ds, &mut s), 0);
        assert_eq!(tl.set_date(&ds, &mut s, 5), 0);
    }
}
