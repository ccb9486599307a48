//! Placed towers and their range bookkeeping.

use std::collections::BTreeSet;

use plot_defence_core::{
    CellCoord, CellRect, DeathCause, EnemyId, TowerCooldownSnapshot, TowerId, TowerSnapshot,
    TowerTemplate,
};

use crate::{
    enemies::Enemy,
    grid::{Cell, Grid, GridItem},
};

/// Outcome of a tower damaging a single enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hit {
    /// Enemy that was damaged.
    pub enemy: EnemyId,
    /// Health the enemy has left.
    pub remaining: u32,
    /// Death notice if the hit was lethal.
    pub death: Option<DeathCause>,
}

/// Tower instance living on a layout.
#[derive(Clone, Debug)]
pub struct Tower {
    id: TowerId,
    template: TowerTemplate,
    anchor: Option<CellCoord>,
    cooldown: u32,
    accessible: Option<BTreeSet<u32>>,
}

impl Tower {
    /// Creates an unplaced tower from its template.
    #[must_use]
    pub fn new(id: TowerId, template: TowerTemplate) -> Self {
        let cooldown = template.attack_delay;
        Self {
            id,
            template,
            anchor: None,
            cooldown,
            accessible: None,
        }
    }

    /// Identifier allocated by the layout.
    #[must_use]
    pub const fn id(&self) -> TowerId {
        self.id
    }

    /// Template the tower was built from.
    #[must_use]
    pub const fn template(&self) -> &TowerTemplate {
        &self.template
    }

    /// Template name of the tower.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.template.name
    }

    /// Cell anchoring the tower, once placed.
    #[must_use]
    pub const fn anchor(&self) -> Option<CellCoord> {
        self.anchor
    }

    /// Region occupied by the tower, once placed.
    #[must_use]
    pub fn region(&self) -> Option<CellRect> {
        self.anchor
            .map(|anchor| CellRect::from_origin_and_size(anchor, self.template.footprint()))
    }

    /// Ticks left before the tower may attack again.
    #[must_use]
    pub const fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Cell the tower's range is centred on.
    ///
    /// # Panics
    ///
    /// Panics when the tower has not been placed.
    #[must_use]
    pub fn emission_cell(&self) -> CellCoord {
        let anchor = self.anchor.expect("tower must be placed before use");
        let emission = self.template.emission_point;
        CellCoord::new(
            anchor.column().saturating_add(emission.x),
            anchor.row().saturating_add(emission.z),
        )
    }

    /// Anchors the tower and recomputes which path indices lie within range.
    ///
    /// Every cell within Chebyshev distance `range` of the emission cell is
    /// inspected; path cells contribute their index.
    pub fn compute_accessible_path_indices(&mut self, anchor: CellCoord, grid: &Grid<GridItem>) {
        self.anchor = Some(anchor);
        let center = self.emission_cell();
        let range = self.template.range;
        let side = range.saturating_mul(2).saturating_add(1);

        let mut accessible = BTreeSet::new();
        grid.scan_area(
            i64::from(center.column()) - i64::from(range),
            i64::from(center.row()) - i64::from(range),
            side,
            side,
            |_, _, cell| {
                if let Cell::Anchor(GridItem::Path { index }) = cell {
                    let _ = accessible.insert(*index);
                }
            },
        );
        self.accessible = Some(accessible);
    }

    /// Path indices within range.
    ///
    /// # Panics
    ///
    /// Panics when the tower has not been placed.
    #[must_use]
    pub fn accessible_path_indices(&self) -> &BTreeSet<u32> {
        self.accessible
            .as_ref()
            .expect("tower must be placed before use")
    }

    /// Whether the tower can reach enemies on `path_index`.
    #[must_use]
    pub fn can_reach(&self, path_index: u32) -> bool {
        self.accessible_path_indices().contains(&path_index)
    }

    /// Whether the cooldown has elapsed.
    #[must_use]
    pub const fn can_attack(&self) -> bool {
        self.cooldown == 0
    }

    /// Counts the cooldown down by one tick, stopping at zero.
    pub fn tick(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    /// Attacks up to `targets` live enemies within range, in list order.
    ///
    /// The cooldown is reset even when nothing was hit.
    pub fn attack_all(&mut self, enemies: &mut [Enemy]) -> Vec<Hit> {
        self.cooldown = self.template.attack_delay;
        let limit = self.template.targets as usize;
        let mut hits = Vec::new();
        for enemy in enemies.iter_mut() {
            if hits.len() >= limit {
                break;
            }
            if !enemy.is_alive() || !self.can_reach(enemy.path_index()) {
                continue;
            }
            hits.push(self.attack(enemy));
        }
        hits
    }

    /// Damages a single enemy directly, ignoring range and cooldown.
    pub fn attack(&mut self, enemy: &mut Enemy) -> Hit {
        let death = enemy.damage(self.template.damage);
        Hit {
            enemy: enemy.id(),
            remaining: enemy.health(),
            death,
        }
    }

    /// Captures a read-only snapshot of the tower.
    ///
    /// # Panics
    ///
    /// Panics when the tower has not been placed.
    #[must_use]
    pub fn snapshot(&self) -> TowerSnapshot {
        let region = self.region().expect("tower must be placed before use");
        TowerSnapshot {
            id: self.id,
            name: self.template.name.clone(),
            region,
            cooldown: self.cooldown,
            accessible_path_indices: self.accessible_path_indices().iter().copied().collect(),
        }
    }

    /// Captures the cooldown state of the tower.
    #[must_use]
    pub const fn cooldown_snapshot(&self) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: self.id,
            cooldown: self.cooldown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plot_defence_core::{BlockPattern, EmissionPoint};

    fn template(range: u32, targets: u32, attack_delay: u32) -> TowerTemplate {
        TowerTemplate {
            name: "archer".to_owned(),
            pattern: BlockPattern::filled(1, 1, 2, "oak_planks"),
            emission_point: EmissionPoint::default(),
            range,
            damage: 4,
            cost: 10,
            targets,
            attack_delay,
        }
    }

    fn straight_path_grid() -> Grid<GridItem> {
        let mut grid = Grid::new(11, 11);
        for column in 0..11 {
            let added = grid.add(GridItem::Path { index: column }, column, 5);
            assert_eq!(added, Ok(true));
        }
        grid
    }

    fn enemy_on(id: u32, path_index: u32, health: u32) -> Enemy {
        let mut enemy = Enemy::new(EnemyId::new(id), CellCoord::new(0, 5), health, None);
        let path = plot_defence_core::Path::new(vec![plot_defence_core::Direction::East; 11])
            .expect("non-empty path");
        for _ in 0..path_index {
            let _ = enemy.advance(&path, 1);
        }
        enemy
    }

    #[test]
    fn range_box_is_symmetric_around_the_emission_cell() {
        let grid = straight_path_grid();
        let mut tower = Tower::new(TowerId::new(0), template(2, 1, 1));
        tower.compute_accessible_path_indices(CellCoord::new(5, 3), &grid);

        let indices: Vec<u32> = tower.accessible_path_indices().iter().copied().collect();
        assert_eq!(indices, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn out_of_range_towers_see_nothing() {
        let grid = straight_path_grid();
        let mut tower = Tower::new(TowerId::new(0), template(1, 1, 1));
        tower.compute_accessible_path_indices(CellCoord::new(5, 2), &grid);
        assert!(tower.accessible_path_indices().is_empty());
    }

    #[test]
    fn emission_point_shifts_the_range_center() {
        let grid = straight_path_grid();
        let mut template = template(0, 1, 1);
        template.pattern = BlockPattern::filled(3, 3, 1, "stone");
        template.emission_point = EmissionPoint { x: 2, y: 0, z: 2 };
        let mut tower = Tower::new(TowerId::new(0), template);
        tower.compute_accessible_path_indices(CellCoord::new(1, 3), &grid);

        let indices: Vec<u32> = tower.accessible_path_indices().iter().copied().collect();
        assert_eq!(indices, vec![3]);
    }

    #[test]
    fn cooldown_starts_at_attack_delay_and_saturates() {
        let mut tower = Tower::new(TowerId::new(0), template(1, 1, 2));
        assert!(!tower.can_attack());
        tower.tick();
        tower.tick();
        assert!(tower.can_attack());
        tower.tick();
        assert_eq!(tower.cooldown(), 0);
    }

    #[test]
    fn attack_all_respects_target_limit_and_range() {
        let grid = straight_path_grid();
        let mut tower = Tower::new(TowerId::new(0), template(1, 2, 3));
        tower.compute_accessible_path_indices(CellCoord::new(2, 4), &grid);

        let mut enemies = vec![
            enemy_on(1, 9, 10),
            enemy_on(2, 1, 10),
            enemy_on(3, 2, 10),
            enemy_on(4, 3, 10),
        ];
        let hits = tower.attack_all(&mut enemies);

        let hit_ids: Vec<u32> = hits.iter().map(|hit| hit.enemy.get()).collect();
        assert_eq!(hit_ids, vec![2, 3]);
        assert_eq!(enemies[0].health(), 10);
        assert_eq!(enemies[3].health(), 10);
        assert_eq!(tower.cooldown(), 3);
    }

    #[test]
    fn attack_all_skips_dead_enemies_and_reports_deaths() {
        let grid = straight_path_grid();
        let mut tower = Tower::new(TowerId::new(0), template(1, 1, 0));
        tower.compute_accessible_path_indices(CellCoord::new(2, 4), &grid);

        let mut enemies = vec![enemy_on(1, 2, 10), enemy_on(2, 2, 4)];
        enemies[0].kill_silently();
        let hits = tower.attack_all(&mut enemies);

        assert_eq!(
            hits,
            vec![Hit {
                enemy: EnemyId::new(2),
                remaining: 0,
                death: Some(DeathCause::Health),
            }]
        );
    }

    #[test]
    fn single_attack_ignores_range() {
        let mut tower = Tower::new(TowerId::new(0), template(0, 1, 5));
        let mut enemy = enemy_on(1, 0, 10);
        let hit = tower.attack(&mut enemy);
        assert_eq!(hit.remaining, 6);
        assert_eq!(tower.cooldown(), 5);
    }

    #[test]
    #[should_panic(expected = "tower must be placed before use")]
    fn querying_range_before_placement_panics() {
        let tower = Tower::new(TowerId::new(0), template(1, 1, 1));
        let _ = tower.can_reach(0);
    }
}
