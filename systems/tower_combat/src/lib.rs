#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits tower attack commands for ready towers.

use plot_defence_core::{Command, TowerCooldownView};

/// Tower combat system that queues attack commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::TowerAttack` entries, in tower order, for towers whose
    /// cooldown has elapsed.
    pub fn handle(
        &mut self,
        running: bool,
        tower_cooldowns: TowerCooldownView,
        out: &mut Vec<Command>,
    ) {
        if !running {
            return;
        }

        let cooldowns = tower_cooldowns.into_vec();
        if cooldowns.is_empty() {
            return;
        }

        self.scratch.clear();
        self.scratch.extend(
            cooldowns
                .iter()
                .filter(|snapshot| snapshot.cooldown == 0)
                .map(|snapshot| Command::TowerAttack {
                    tower: snapshot.tower,
                }),
        );

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plot_defence_core::{TowerCooldownSnapshot, TowerId};

    #[test]
    fn stopped_layouts_are_silent() {
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![snapshot(1, 0)]);
        let mut out = Vec::new();

        system.handle(false, cooldowns, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn attacks_follow_tower_order() {
        let mut system = TowerCombat::new();
        let cooldowns =
            TowerCooldownView::from_snapshots(vec![snapshot(5, 0), snapshot(2, 0)]);
        let mut out = Vec::new();

        system.handle(true, cooldowns, &mut out);

        assert_eq!(
            out,
            vec![
                Command::TowerAttack {
                    tower: TowerId::new(2),
                },
                Command::TowerAttack {
                    tower: TowerId::new(5),
                },
            ],
        );
    }

    #[test]
    fn cooling_down_towers_are_skipped() {
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![
            snapshot(3, 4),
            snapshot(8, 0),
            snapshot(9, 1),
        ]);
        let mut out = Vec::new();

        system.handle(true, cooldowns, &mut out);

        assert_eq!(
            out,
            vec![Command::TowerAttack {
                tower: TowerId::new(8),
            }],
        );
    }

    fn snapshot(tower: u32, cooldown: u32) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: TowerId::new(tower),
            cooldown,
        }
    }
}
