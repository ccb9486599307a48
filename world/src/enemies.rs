//! Enemy actors walking the layout path.

use plot_defence_core::{CellCoord, DeathCause, Direction, EnemyId, EnemySnapshot, Path, ProxyHandle};

/// Result of advancing an enemy by one movement tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The enemy was already dead and did not move.
    Dead,
    /// The enemy progressed inside its current cell.
    Moved,
    /// The enemy crossed into the next cell of the path.
    Entered {
        /// Cell the enemy left.
        from: CellCoord,
        /// Cell the enemy entered.
        to: CellCoord,
        /// Path index the enemy is now traversing.
        path_index: u32,
    },
    /// The enemy walked off the end of the path and died.
    Finished {
        /// Death notice; present exactly once.
        cause: Option<DeathCause>,
    },
}

/// Mobile, damageable actor owned by a layout.
#[derive(Clone, Debug)]
pub struct Enemy {
    id: EnemyId,
    health: u32,
    max_health: u32,
    path_index: u32,
    cell: CellCoord,
    progress: u32,
    death: Option<DeathCause>,
    proxy: Option<ProxyHandle>,
}

impl Enemy {
    /// Creates a live enemy standing on `cell` at the start of the path.
    #[must_use]
    pub fn new(id: EnemyId, cell: CellCoord, health: u32, proxy: Option<ProxyHandle>) -> Self {
        Self {
            id,
            health,
            max_health: health,
            path_index: 0,
            cell,
            progress: 0,
            death: None,
            proxy,
        }
    }

    /// Identifier of the enemy.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Whether the enemy is still alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.death.is_none()
    }

    /// Reason the enemy died, if it did.
    #[must_use]
    pub const fn death_cause(&self) -> Option<DeathCause> {
        self.death
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Health the enemy spawned with.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Index of the path step the enemy is currently taking.
    #[must_use]
    pub const fn path_index(&self) -> u32 {
        self.path_index
    }

    /// Cell the enemy currently stands on.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Movement ticks accumulated inside the current cell.
    #[must_use]
    pub const fn progress(&self) -> u32 {
        self.progress
    }

    /// Handle of the proxy entity representing the enemy in the world.
    #[must_use]
    pub const fn proxy(&self) -> Option<ProxyHandle> {
        self.proxy
    }

    /// Direction the enemy is heading in.
    #[must_use]
    pub fn heading(&self, path: &Path) -> Option<Direction> {
        path.step(self.path_index)
    }

    /// Deals `amount` damage, returning the death notice if this hit was lethal.
    pub fn damage(&mut self, amount: u32) -> Option<DeathCause> {
        if !self.is_alive() {
            return None;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            return self.die(DeathCause::Health);
        }
        None
    }

    /// Restores up to `amount` health without exceeding the spawn health.
    pub fn heal(&mut self, amount: u32) {
        if !self.is_alive() {
            return;
        }
        self.health = self.health.saturating_add(amount).min(self.max_health);
    }

    /// Kills the enemy outright, returning the death notice if it was alive.
    pub fn kill(&mut self) -> Option<DeathCause> {
        self.die(DeathCause::Health)
    }

    /// Kills the enemy without producing a death notice.
    pub fn kill_silently(&mut self) {
        if self.is_alive() {
            self.health = 0;
            self.death = Some(DeathCause::Health);
        }
    }

    /// Advances the enemy by one movement tick along `path`.
    ///
    /// Crossing into a new cell takes `substeps` ticks. Stepping past the
    /// final path step kills the enemy by path.
    pub fn advance(&mut self, path: &Path, substeps: u32) -> StepOutcome {
        if !self.is_alive() {
            return StepOutcome::Dead;
        }

        self.progress = self.progress.saturating_add(1);
        if self.progress < substeps.max(1) {
            return StepOutcome::Moved;
        }
        self.progress = 0;

        let from = self.cell;
        let next = self
            .heading(path)
            .and_then(|direction| self.cell.step(direction));
        if let Some(to) = next {
            self.cell = to;
        }
        self.path_index = self.path_index.saturating_add(1);

        match next {
            Some(to) if (self.path_index as usize) < path.len() => StepOutcome::Entered {
                from,
                to,
                path_index: self.path_index,
            },
            _ => StepOutcome::Finished {
                cause: self.die(DeathCause::Path),
            },
        }
    }

    /// Captures a read-only snapshot of the enemy.
    #[must_use]
    pub fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            cell: self.cell,
            path_index: self.path_index,
            health: self.health,
            max_health: self.max_health,
        }
    }

    fn die(&mut self, cause: DeathCause) -> Option<DeathCause> {
        if !self.is_alive() {
            return None;
        }
        if cause == DeathCause::Health {
            self.health = 0;
        }
        self.death = Some(cause);
        Some(cause)
    }
}
