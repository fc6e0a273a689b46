// 📊 Progress reporting
//
// Observational only: the writer calls `update` after each successful batch
// with the cumulative count for the phase. Reporters never fail the pipeline;
// a poisoned lock just means the update is dropped.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::ProgressMode;
use crate::entities::Entity;

pub trait Progress: Send + Sync {
    /// A phase is about to write `total` records
    fn start(&self, _entity: Entity, _total: u64) {}

    /// `completed` records of `entity` have been written so far
    fn update(&self, entity: Entity, completed: u64);

    fn finish(&self, _entity: Entity) {}
}

/// Reporter for the configured mode
///
/// `Bars` falls back to log lines when the crate is built without the
/// `progress-bars` feature.
pub fn reporter(mode: ProgressMode) -> Box<dyn Progress> {
    match mode {
        #[cfg(feature = "progress-bars")]
        ProgressMode::Bars => Box::new(BarProgress::new()),
        #[cfg(not(feature = "progress-bars"))]
        ProgressMode::Bars => Box::new(LogProgress::new()),
        ProgressMode::Log => Box::new(LogProgress::new()),
        ProgressMode::None => Box::new(NoProgress),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn update(&self, _entity: Entity, _completed: u64) {}
}

// ============================================================================
// Log lines
// ============================================================================

#[derive(Debug, Default)]
pub struct LogProgress {
    totals: Mutex<HashMap<Entity, u64>>,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn total(&self, entity: Entity) -> Option<u64> {
        self.totals.lock().ok()?.get(&entity).copied()
    }
}

impl Progress for LogProgress {
    fn start(&self, entity: Entity, total: u64) {
        if let Ok(mut totals) = self.totals.lock() {
            totals.insert(entity, total);
        }
        tracing::info!("Writing {} {}", total, entity.table());
    }

    fn update(&self, entity: Entity, completed: u64) {
        match self.total(entity) {
            Some(total) if total > 0 => {
                let percent = completed as f64 / total as f64 * 100.0;
                tracing::info!("{}: {}/{} ({:.1}%)", entity.table(), completed, total, percent);
            }
            _ => tracing::info!("{}: {} written", entity.table(), completed),
        }
    }

    fn finish(&self, entity: Entity) {
        tracing::info!("Finished writing {}", entity.table());
    }
}

// ============================================================================
// Terminal bars
// ============================================================================

#[cfg(feature = "progress-bars")]
pub use bars::BarProgress;

#[cfg(feature = "progress-bars")]
mod bars {
    use super::*;
    use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

    const TEMPLATE: &str =
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

    /// One bar per phase, drawn on stderr
    pub struct BarProgress {
        multi: MultiProgress,
        bars: Mutex<HashMap<Entity, ProgressBar>>,
    }

    impl BarProgress {
        pub fn new() -> Self {
            Self::with_draw_target(ProgressDrawTarget::stderr())
        }

        pub fn with_draw_target(target: ProgressDrawTarget) -> Self {
            Self {
                multi: MultiProgress::with_draw_target(target),
                bars: Mutex::new(HashMap::new()),
            }
        }

        pub fn position(&self, entity: Entity) -> Option<u64> {
            let bars = self.bars.lock().ok()?;
            bars.get(&entity).map(|bar| bar.position())
        }
    }

    impl Default for BarProgress {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Progress for BarProgress {
        fn start(&self, entity: Entity, total: u64) {
            let bar = self.multi.add(ProgressBar::new(total));
            let style = ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style);
            bar.set_message(entity.table());

            if let Ok(mut bars) = self.bars.lock() {
                bars.insert(entity, bar);
            }
        }

        fn update(&self, entity: Entity, completed: u64) {
            if let Ok(bars) = self.bars.lock() {
                if let Some(bar) = bars.get(&entity) {
                    bar.set_position(completed);
                }
            }
        }

        fn finish(&self, entity: Entity) {
            if let Ok(bars) = self.bars.lock() {
                if let Some(bar) = bars.get(&entity) {
                    bar.finish();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_tracks_totals() {
        let progress = LogProgress::new();
        assert_eq!(progress.total(Entity::Account), None);

        progress.start(Entity::Account, 250);
        progress.update(Entity::Account, 100);
        progress.finish(Entity::Account);

        assert_eq!(progress.total(Entity::Account), Some(250));
        // Update without start still just logs
        progress.update(Entity::Transaction, 5);
    }

    #[test]
    fn test_reporter_for_every_mode() {
        for mode in [ProgressMode::Bars, ProgressMode::Log, ProgressMode::None] {
            let progress = reporter(mode);
            progress.start(Entity::Customer, 10);
            progress.update(Entity::Customer, 10);
            progress.finish(Entity::Customer);
        }
    }

    #[cfg(feature = "progress-bars")]
    #[test]
    fn test_bar_progress_follows_updates() {
        let progress = BarProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden());

        // Updates for a phase that never started are ignored
        progress.update(Entity::Customer, 3);
        assert_eq!(progress.position(Entity::Customer), None);

        progress.start(Entity::Customer, 2500);
        progress.update(Entity::Customer, 1000);
        progress.update(Entity::Customer, 2000);
        assert_eq!(progress.position(Entity::Customer), Some(2000));

        progress.update(Entity::Customer, 2500);
        progress.finish(Entity::Customer);
        assert_eq!(progress.position(Entity::Customer), Some(2500));
    }
}
