#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system that paces enemy spawns and wave transitions.

use plot_defence_core::{Command, Event, SimulationConfig, WaveProgress};

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_period_ticks: u32,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence in ticks.
    #[must_use]
    pub const fn new(spawn_period_ticks: u32) -> Self {
        Self { spawn_period_ticks }
    }
}

impl From<&SimulationConfig> for Config {
    fn from(config: &SimulationConfig) -> Self {
        Self::new(config.spawn_period_ticks)
    }
}

/// Pure system that emits one spawn decision per elapsed spawn period.
#[derive(Debug)]
pub struct Spawning {
    spawn_period_ticks: u32,
    accumulator: u32,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_period_ticks: config.spawn_period_ticks,
            accumulator: 0,
        }
    }

    /// Consumes events and the wave progress view to emit spawn commands.
    ///
    /// At most one command is emitted per call: `AdvanceWave` once every
    /// enemy of the wave was killed, otherwise `SpawnEnemy` while the wave
    /// still has enemies to spawn.
    pub fn handle(&mut self, events: &[Event], progress: WaveProgress, out: &mut Vec<Command>) {
        if !progress.running {
            self.accumulator = 0;
            return;
        }

        if self.spawn_period_ticks == 0 {
            return;
        }

        let elapsed = events
            .iter()
            .filter(|event| matches!(event, Event::TimeAdvanced { .. }))
            .count();
        if elapsed == 0 {
            return;
        }

        self.accumulator = self
            .accumulator
            .saturating_add(u32::try_from(elapsed).unwrap_or(u32::MAX));
        if self.accumulator < self.spawn_period_ticks {
            return;
        }
        self.accumulator -= self.spawn_period_ticks;

        if progress.is_cleared() {
            out.push(Command::AdvanceWave);
        } else if progress.needs_spawn() {
            out.push(Command::SpawnEnemy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(spawned: u32, killed: u32) -> WaveProgress {
        WaveProgress {
            running: true,
            wave: 1,
            enemy_count: 4,
            spawned,
            killed,
        }
    }

    #[test]
    fn zero_period_never_spawns() {
        let mut spawning = Spawning::new(Config::new(0));
        let mut out = Vec::new();
        spawning.handle(&[Event::TimeAdvanced { tick: 1 }], progress(0, 0), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn cleared_waves_advance_before_spawning() {
        let mut spawning = Spawning::new(Config::new(1));
        let mut out = Vec::new();
        spawning.handle(&[Event::TimeAdvanced { tick: 1 }], progress(4, 4), &mut out);
        assert_eq!(out, vec![Command::AdvanceWave]);
    }

    #[test]
    fn fully_spawned_waves_wait_for_kills() {
        let mut spawning = Spawning::new(Config::new(1));
        let mut out = Vec::new();
        spawning.handle(&[Event::TimeAdvanced { tick: 1 }], progress(4, 2), &mut out);
        assert!(out.is_empty());
    }
}
