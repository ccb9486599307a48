#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative layout state management for Plot Defence.
//!
//! A [`Layout`] owns one play-field: the placement grid, the enemy path, the
//! wave manager, placed towers and live enemies. All mutations flow through
//! [`apply`], which reports what happened as [`Event`] values; read access is
//! provided by the [`query`] module.

pub mod enemies;
pub mod grid;
mod headless;
pub mod registry;
pub mod snapshot;
pub mod towers;
pub mod waves;

use std::{collections::HashSet, fmt};

use plot_defence_core::{
    BlockPosition, CellCoord, CellRect, CellRectSize, Command, DeathCause, EffectKind, EnemyId,
    Event, FeedbackAdapter, LayoutTemplate, Path, PathError, PlacementError, RemovalError,
    SimulationConfig, TowerId, TowerTemplate, WorldAdapter, WorldPoint,
};
use tracing::{debug, info};

use crate::{
    enemies::{Enemy, StepOutcome},
    grid::{Grid, GridItem},
    towers::Tower,
    waves::WaveManager,
};

pub use headless::{HeadlessWorld, AIR};

/// Errors raised while building a layout from its template.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// No layout template with the requested name exists.
    #[error("unknown layout template `{name}`")]
    UnknownTemplate {
        /// Requested template name.
        name: String,
    },
    /// The layout pattern covers no cells.
    #[error("layout pattern must cover at least one cell")]
    EmptyPattern,
    /// The path does not fit the grid.
    #[error(transparent)]
    Path(#[from] PathError),
    /// The path crosses the same cell twice.
    #[error("path visits cell ({}, {}) more than once", cell.column(), cell.row())]
    PathRevisits {
        /// First cell visited twice.
        cell: CellCoord,
    },
    /// Enemies would never leave their cell.
    #[error("movement_substeps must be at least 1")]
    ZeroMovementSubsteps,
}

/// Walks `path` from `start` and returns the visited cells.
///
/// Cell `i` of the result is the cell path index `i` refers to; the final cell
/// is where enemies leave the path.
pub fn trace_path(
    start: CellCoord,
    path: &Path,
    columns: u32,
    rows: u32,
) -> Result<Vec<CellCoord>, LayoutError> {
    let cells = path.cells(start, columns, rows)?;
    let mut seen = HashSet::with_capacity(cells.len());
    for cell in &cells {
        if !seen.insert(*cell) {
            return Err(LayoutError::PathRevisits { cell: *cell });
        }
    }
    Ok(cells)
}

/// One play-field instance.
pub struct Layout<W: WorldAdapter = HeadlessWorld> {
    name: String,
    origin: BlockPosition,
    footprint: CellRectSize,
    start: CellCoord,
    path: Path,
    path_cells: Vec<CellCoord>,
    grid: Grid<GridItem>,
    placement_area: CellRect,
    waves: WaveManager,
    towers: Vec<Tower>,
    enemies: Vec<Enemy>,
    running: bool,
    spawned: u32,
    killed: u32,
    next_enemy_id: u32,
    next_tower_id: u32,
    tick_index: u64,
    movement_substeps: u32,
    world: W,
    feedback: Option<Box<dyn FeedbackAdapter>>,
}

impl<W: WorldAdapter> Layout<W> {
    /// Builds a layout from its template with its lowest corner at `origin`.
    ///
    /// The template pattern is placed into `world` and every path cell is
    /// reserved on the grid.
    pub fn new(
        template: &LayoutTemplate,
        origin: BlockPosition,
        mut world: W,
        config: &SimulationConfig,
    ) -> Result<Self, LayoutError> {
        if config.movement_substeps == 0 {
            return Err(LayoutError::ZeroMovementSubsteps);
        }
        let footprint = template.pattern.footprint();
        if footprint.width() == 0 || footprint.height() == 0 {
            return Err(LayoutError::EmptyPattern);
        }

        let path_cells = trace_path(
            template.start,
            &template.path,
            footprint.width(),
            footprint.height(),
        )?;
        let mut grid = Grid::new(footprint.width(), footprint.height());
        for (index, cell) in path_cells.iter().enumerate() {
            let reserved = grid.add(
                GridItem::Path {
                    index: index as u32,
                },
                cell.column(),
                cell.row(),
            );
            debug_assert_eq!(reserved, Ok(true), "traced path cells are unique");
        }

        world.place_footprint(origin, &template.pattern);
        info!(
            layout = %template.name,
            steps = template.path.len(),
            "layout constructed"
        );

        Ok(Self {
            name: template.name.clone(),
            origin,
            footprint,
            start: template.start,
            path: template.path.clone(),
            path_cells,
            grid,
            placement_area: placement_area(footprint),
            waves: WaveManager::new(config.start_wave),
            towers: Vec::new(),
            enemies: Vec::new(),
            running: false,
            spawned: 0,
            killed: 0,
            next_enemy_id: 0,
            next_tower_id: 0,
            tick_index: 0,
            movement_substeps: config.movement_substeps,
            world,
            feedback: None,
        })
    }

    /// Attaches an adapter that receives cosmetic effects.
    pub fn set_feedback(&mut self, feedback: Box<dyn FeedbackAdapter>) {
        self.feedback = Some(feedback);
    }

    /// Mutable access to the world adapter.
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Places a tower anchored at `origin`.
    ///
    /// Bounds, grid occupancy and world obstruction are checked before
    /// anything is mutated.
    pub fn place_tower(
        &mut self,
        template: &TowerTemplate,
        origin: CellCoord,
    ) -> Result<TowerId, PlacementError> {
        let size = template.footprint();
        let region = CellRect::from_origin_and_size(origin, size);
        if size.width() == 0 || size.height() == 0 || !self.placement_area.contains_rect(&region) {
            return Err(PlacementError::OutOfBounds);
        }

        let id = TowerId::new(self.next_tower_id);
        let item = GridItem::Tower { id, size };
        if !self.grid.can_add(&item, origin.column(), origin.row()) {
            return Err(PlacementError::Occupied);
        }

        let block = self.block_position(origin);
        if !self.world.is_footprint_clear(block, size) {
            return Err(PlacementError::Obstructed);
        }

        self.world.place_footprint(block, &template.pattern);
        let reserved = self.grid.add(item, origin.column(), origin.row());
        debug_assert_eq!(reserved, Ok(true), "placement was checked beforehand");

        let mut tower = Tower::new(id, template.clone());
        tower.compute_accessible_path_indices(origin, &self.grid);
        debug!(
            tower = id.get(),
            name = %template.name,
            reach = tower.accessible_path_indices().len(),
            "tower placed"
        );
        self.next_tower_id = self.next_tower_id.saturating_add(1);
        self.towers.push(tower);
        Ok(id)
    }

    /// Removes the tower covering `cell` from the grid and the world.
    ///
    /// Returns `Ok(None)` when no tower covers the cell.
    pub fn remove_tower(&mut self, cell: CellCoord) -> Result<Option<Tower>, RemovalError> {
        if !self.placement_area.contains(cell) {
            return Err(RemovalError::OutOfBounds);
        }
        let Some(GridItem::Tower { id, .. }) = self.grid.get(cell.column(), cell.row()).copied()
        else {
            return Ok(None);
        };
        let Some(index) = self.towers.iter().position(|tower| tower.id() == id) else {
            return Ok(None);
        };

        let released = self.grid.remove_at(cell.column(), cell.row());
        debug_assert!(
            matches!(released, Ok(Some(GridItem::Tower { .. }))),
            "tower cell resolved to an anchor"
        );
        let tower = self.towers.remove(index);
        if let Some(region) = tower.region() {
            let block = self.block_position(region.origin());
            self.world.clear_footprint(block, region.size());
        }
        debug!(tower = id.get(), name = %tower.name(), "tower removed");
        Ok(Some(tower))
    }

    /// Stops the layout, clears every tower and the layout pattern from the
    /// world, and hands the world back.
    pub fn dismantle(mut self) -> W {
        for enemy in &mut self.enemies {
            enemy.kill_silently();
        }
        self.sweep_dead();
        for tower in &self.towers {
            if let Some(region) = tower.region() {
                let block = self.block_position(region.origin());
                self.world.clear_footprint(block, region.size());
            }
        }
        self.world.clear_footprint(self.origin, self.footprint);
        info!(layout = %self.name, "layout dismantled");
        self.world
    }

    fn block_position(&self, cell: CellCoord) -> BlockPosition {
        self.origin
            .offset(cell.column() as i32, 1, cell.row() as i32)
    }

    fn cell_center(&self, cell: CellCoord) -> WorldPoint {
        WorldPoint::new(
            self.origin.x as f32 + cell.column() as f32 + 0.5,
            self.origin.y as f32 + 1.0,
            self.origin.z as f32 + cell.row() as f32 + 0.5,
        )
    }

    fn enemy_position(&self, enemy: &Enemy) -> WorldPoint {
        let mut point = self.cell_center(enemy.cell());
        if let Some(direction) = enemy.heading(&self.path) {
            let fraction = enemy.progress() as f32 / self.movement_substeps as f32;
            let (dx, dz) = direction.delta();
            point.x += dx as f32 * fraction;
            point.z += dz as f32 * fraction;
        }
        point
    }

    fn emission_position(&self, tower: &Tower) -> WorldPoint {
        let mut point = self.cell_center(tower.emission_cell());
        point.y += tower.template().emission_point.y as f32;
        point
    }

    fn start(&mut self, out_events: &mut Vec<Event>) {
        if self.running {
            debug!(layout = %self.name, "layout already running");
            return;
        }
        self.running = true;
        info!(layout = %self.name, wave = self.waves.wave(), "layout started");
        out_events.push(Event::LayoutStarted);
    }

    fn stop(&mut self, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }
        self.running = false;
        let cleared = self.clear_enemies();
        self.sweep_dead();
        self.spawned = 0;
        self.killed = 0;
        info!(layout = %self.name, cleared, "layout stopped");
        out_events.push(Event::LayoutStopped { cleared });
    }

    fn tick(&mut self, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced {
            tick: self.tick_index,
        });

        for tower in &mut self.towers {
            tower.tick();
        }

        for index in 0..self.enemies.len() {
            let outcome = self.enemies[index].advance(&self.path, self.movement_substeps);
            match outcome {
                StepOutcome::Dead => continue,
                StepOutcome::Moved => {}
                StepOutcome::Entered {
                    from,
                    to,
                    path_index,
                } => out_events.push(Event::EnemyAdvanced {
                    enemy: self.enemies[index].id(),
                    from,
                    to,
                    path_index,
                }),
                StepOutcome::Finished { cause } => {
                    if let Some(cause) = cause {
                        self.handle_death(index, cause, out_events);
                    }
                    continue;
                }
            }

            let enemy = &self.enemies[index];
            let Some(proxy) = enemy.proxy() else {
                continue;
            };
            let position = self.enemy_position(enemy);
            if !self.world.teleport_proxy(proxy, position) {
                debug!(enemy = enemy.id().get(), "enemy proxy vanished");
                if let Some(cause) = self.enemies[index].kill() {
                    self.handle_death(index, cause, out_events);
                }
            }
        }
        self.sweep_dead();
    }

    fn spawn_enemy(&mut self, out_events: &mut Vec<Event>) {
        if !self.running || self.spawned >= self.waves.enemy_count() {
            return;
        }

        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.wrapping_add(1);
        let health = self.waves.enemy_health();
        let position = self.cell_center(self.start);
        let proxy = self.world.spawn_proxy(position);
        self.enemies
            .push(Enemy::new(id, self.start, health, Some(proxy)));
        self.spawned = self.spawned.saturating_add(1);
        debug!(
            enemy = id.get(),
            wave = self.waves.wave(),
            spawned = self.spawned,
            "enemy spawned"
        );
        out_events.push(Event::EnemySpawned {
            enemy: id,
            cell: self.start,
            health,
        });
    }

    fn advance_wave(&mut self, out_events: &mut Vec<Event>) {
        if !self.running || self.killed < self.waves.enemy_count() {
            return;
        }

        let completed = self.waves.wave();
        self.waves.next();
        self.spawned = 0;
        self.killed = 0;
        info!(
            layout = %self.name,
            completed,
            next = self.waves.wave(),
            "wave completed"
        );
        out_events.push(Event::WaveCompleted {
            completed,
            next: self.waves.wave(),
        });
        grant_coins(self.waves.completion_coin_yield(), out_events);
    }

    fn tower_attack(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }
        let Some(tower_index) = self.towers.iter().position(|candidate| candidate.id() == tower)
        else {
            debug!(tower = tower.get(), "attack requested for unknown tower");
            return;
        };
        if !self.towers[tower_index].can_attack() {
            return;
        }

        let hits = self.towers[tower_index].attack_all(&mut self.enemies);
        out_events.push(Event::TowerAttacked {
            tower,
            hits: hits.len() as u32,
        });

        for hit in hits {
            out_events.push(Event::EnemyDamaged {
                enemy: hit.enemy,
                tower,
                remaining: hit.remaining,
            });
            let Some(index) = self.enemies.iter().position(|enemy| enemy.id() == hit.enemy)
            else {
                continue;
            };
            if self.feedback.is_some() {
                let from = self.emission_position(&self.towers[tower_index]);
                let to = self.enemy_position(&self.enemies[index]);
                if let Some(feedback) = self.feedback.as_mut() {
                    feedback.emit_effect(EffectKind::TowerAttack, from, to);
                }
            }
            if let Some(cause) = hit.death {
                self.handle_death(index, cause, out_events);
            }
        }
        self.sweep_dead();
    }

    fn handle_death(&mut self, index: usize, cause: DeathCause, out_events: &mut Vec<Event>) {
        let enemy = self.enemies[index].id();
        out_events.push(Event::EnemyDied { enemy, cause });

        match cause {
            DeathCause::Path => {
                let failed = self.waves.wave();
                self.waves.set_wave(failed.saturating_sub(1));
                let cleared = self.clear_enemies();
                self.spawned = 0;
                self.killed = 0;
                info!(
                    layout = %self.name,
                    failed,
                    next = self.waves.wave(),
                    cleared,
                    "wave failed"
                );
                out_events.push(Event::WaveFailed {
                    failed,
                    next: self.waves.wave(),
                    cleared,
                });
            }
            DeathCause::Health => {
                self.killed = self.killed.saturating_add(1);
                if self.feedback.is_some() {
                    let point = self.enemy_position(&self.enemies[index]);
                    if let Some(feedback) = self.feedback.as_mut() {
                        feedback.emit_effect(EffectKind::EnemyDefeated, point, point);
                    }
                }
                grant_coins(self.waves.enemy_coin_yield(), out_events);
            }
        }
    }

    fn clear_enemies(&mut self) -> usize {
        let mut cleared = 0;
        for enemy in &mut self.enemies {
            if enemy.is_alive() {
                enemy.kill_silently();
                cleared += 1;
            }
        }
        cleared
    }

    fn sweep_dead(&mut self) {
        let world = &mut self.world;
        self.enemies.retain(|enemy| {
            if enemy.is_alive() {
                return true;
            }
            if let Some(proxy) = enemy.proxy() {
                world.remove_proxy(proxy);
            }
            false
        });
    }
}

impl<W: WorldAdapter + fmt::Debug> fmt::Debug for Layout<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layout")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("wave", &self.waves.wave())
            .field("running", &self.running)
            .field("towers", &self.towers.len())
            .field("enemies", &self.enemies.len())
            .field("world", &self.world)
            .finish_non_exhaustive()
    }
}

fn placement_area(footprint: CellRectSize) -> CellRect {
    CellRect::from_origin_and_size(
        CellCoord::new(1, 1),
        CellRectSize::new(
            footprint.width().saturating_sub(2),
            footprint.height().saturating_sub(2),
        ),
    )
}

fn grant_coins(amount: u32, out_events: &mut Vec<Event>) {
    if amount > 0 {
        out_events.push(Event::CoinsGranted { amount });
    }
}

/// Applies the provided command to the layout, mutating state deterministically.
pub fn apply<W: WorldAdapter>(layout: &mut Layout<W>, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Start => layout.start(out_events),
        Command::Stop => layout.stop(out_events),
        Command::Tick => layout.tick(out_events),
        Command::SpawnEnemy => layout.spawn_enemy(out_events),
        Command::AdvanceWave => layout.advance_wave(out_events),
        Command::TowerAttack { tower } => layout.tower_attack(tower, out_events),
        Command::SetWave { wave } => {
            layout.waves.set_wave(wave);
            info!(layout = %layout.name, wave = layout.waves.wave(), "wave set");
            out_events.push(Event::WaveChanged {
                wave: layout.waves.wave(),
            });
        }
        Command::PlaceTower { template, origin } => {
            match layout.place_tower(&template, origin) {
                Ok(tower) => {
                    let region = CellRect::from_origin_and_size(origin, template.footprint());
                    out_events.push(Event::TowerPlaced {
                        tower,
                        name: template.name,
                        region,
                    });
                }
                Err(reason) => {
                    debug!(name = %template.name, ?origin, %reason, "tower placement rejected");
                    out_events.push(Event::TowerPlacementRejected {
                        name: template.name,
                        origin,
                        reason,
                    });
                }
            }
        }
        Command::RemoveTower { cell } => match layout.remove_tower(cell) {
            Ok(None) => debug!(?cell, "no tower to remove"),
            Ok(Some(tower)) => {
                if let Some(region) = tower.region() {
                    out_events.push(Event::TowerRemoved {
                        tower: tower.id(),
                        name: tower.name().to_owned(),
                        region,
                    });
                }
            }
            Err(reason) => {
                debug!(?cell, ?reason, "tower removal rejected");
                out_events.push(Event::TowerRemovalRejected { cell, reason });
            }
        },
    }
}

/// Query functions that provide read-only access to the layout state.
pub mod query {
    use plot_defence_core::{
        BlockPosition, CellCoord, CellRect, EnemyView, Path, TowerCooldownView, TowerId,
        TowerView, WaveProgress, WorldAdapter,
    };

    use super::Layout;
    use crate::{grid::Grid, grid::GridItem, towers::Tower, waves::WaveManager};

    /// Name of the template the layout was built from.
    #[must_use]
    pub fn name<W: WorldAdapter>(layout: &Layout<W>) -> &str {
        &layout.name
    }

    /// Block position of the layout's lowest corner.
    #[must_use]
    pub fn origin<W: WorldAdapter>(layout: &Layout<W>) -> BlockPosition {
        layout.origin
    }

    /// Whether the spawn and attack loops are running.
    #[must_use]
    pub fn is_running<W: WorldAdapter>(layout: &Layout<W>) -> bool {
        layout.running
    }

    /// Number of ticks the layout has processed.
    #[must_use]
    pub fn tick_index<W: WorldAdapter>(layout: &Layout<W>) -> u64 {
        layout.tick_index
    }

    /// Wave manager of the layout.
    #[must_use]
    pub fn waves<W: WorldAdapter>(layout: &Layout<W>) -> &WaveManager {
        &layout.waves
    }

    /// Spawn bookkeeping of the active wave.
    #[must_use]
    pub fn wave_progress<W: WorldAdapter>(layout: &Layout<W>) -> WaveProgress {
        WaveProgress {
            running: layout.running,
            wave: layout.waves.wave(),
            enemy_count: layout.waves.enemy_count(),
            spawned: layout.spawned,
            killed: layout.killed,
        }
    }

    /// Start cell of the path.
    #[must_use]
    pub fn start<W: WorldAdapter>(layout: &Layout<W>) -> CellCoord {
        layout.start
    }

    /// Path enemies follow.
    #[must_use]
    pub fn path<W: WorldAdapter>(layout: &Layout<W>) -> &Path {
        &layout.path
    }

    /// Cells crossed by the path; cell `i` carries path index `i`.
    #[must_use]
    pub fn path_cells<W: WorldAdapter>(layout: &Layout<W>) -> &[CellCoord] {
        &layout.path_cells
    }

    /// Occupancy grid of the layout.
    #[must_use]
    pub fn grid<W: WorldAdapter>(layout: &Layout<W>) -> &Grid<GridItem> {
        &layout.grid
    }

    /// Area towers may be placed in.
    #[must_use]
    pub fn placement_area<W: WorldAdapter>(layout: &Layout<W>) -> CellRect {
        layout.placement_area
    }

    /// Placed towers in placement order.
    #[must_use]
    pub fn towers<W: WorldAdapter>(layout: &Layout<W>) -> &[Tower] {
        &layout.towers
    }

    /// Tower with the provided identifier.
    #[must_use]
    pub fn tower<W: WorldAdapter>(layout: &Layout<W>, tower: TowerId) -> Option<&Tower> {
        layout.towers.iter().find(|candidate| candidate.id() == tower)
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view<W: WorldAdapter>(layout: &Layout<W>) -> EnemyView {
        EnemyView::from_snapshots(
            layout
                .enemies
                .iter()
                .filter(|enemy| enemy.is_alive())
                .map(|enemy| enemy.snapshot())
                .collect(),
        )
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view<W: WorldAdapter>(layout: &Layout<W>) -> TowerView {
        TowerView::from_snapshots(layout.towers.iter().map(Tower::snapshot).collect())
    }

    /// Captures the cooldown of every placed tower.
    #[must_use]
    pub fn tower_cooldowns<W: WorldAdapter>(layout: &Layout<W>) -> TowerCooldownView {
        TowerCooldownView::from_snapshots(
            layout
                .towers
                .iter()
                .map(Tower::cooldown_snapshot)
                .collect(),
        )
    }

    /// World adapter the layout renders into.
    #[must_use]
    pub fn world<W: WorldAdapter>(layout: &Layout<W>) -> &W {
        &layout.world
    }
}
