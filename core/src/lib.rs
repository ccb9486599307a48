#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Plot Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative layout, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the layout executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. The traits at the bottom of the
//! crate describe the external collaborators (world, feedback, economy) the
//! layout talks to without holding any presentation state itself.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Side length, in blocks, of every layout including its one-block border.
pub const LAYOUT_SIZE: u32 = 11;

/// Number of ticks between two spawn decisions.
pub const DEFAULT_SPAWN_PERIOD_TICKS: u32 = 20;

/// Number of movement ticks an enemy needs to cross one cell.
pub const DEFAULT_MOVEMENT_SUBSTEPS: u32 = 10;

/// Commands that express all permissible layout mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Starts the spawn and attack loops of the layout.
    Start,
    /// Stops both loops and clears every live enemy without death handling.
    Stop,
    /// Advances the simulation by one tick-quantum.
    Tick,
    /// Requests that one enemy of the current wave be spawned at the path start.
    SpawnEnemy,
    /// Requests that the layout advance to the next wave if the current one is cleared.
    AdvanceWave,
    /// Requests that a tower attack the enemies within its reach.
    TowerAttack {
        /// Identifier of the tower that should attack.
        tower: TowerId,
    },
    /// Overrides the current wave number.
    SetWave {
        /// Wave to activate; values below one are clamped.
        wave: u32,
    },
    /// Requests placement of a tower anchored at the provided grid cell.
    PlaceTower {
        /// Template describing the tower to construct.
        template: TowerTemplate,
        /// Cell that anchors the tower's footprint.
        origin: CellCoord,
    },
    /// Requests removal of the tower covering the provided grid cell.
    RemoveTower {
        /// Any cell inside the footprint of the tower to remove.
        cell: CellCoord,
    },
}

/// Events broadcast by the layout after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced by one tick-quantum.
    TimeAdvanced {
        /// Monotonic index of the tick that just elapsed.
        tick: u64,
    },
    /// Announces that the layout's loops started.
    LayoutStarted,
    /// Announces that the layout's loops stopped.
    LayoutStopped {
        /// Number of live enemies that were cleared by the stop.
        cleared: usize,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Cell the enemy starts from.
        cell: CellCoord,
        /// Health the enemy spawned with.
        health: u32,
    },
    /// Confirms that an enemy crossed into the next cell of the path.
    EnemyAdvanced {
        /// Identifier of the enemy that advanced.
        enemy: EnemyId,
        /// Cell the enemy left.
        from: CellCoord,
        /// Cell the enemy entered.
        to: CellCoord,
        /// Path index the enemy is now traversing.
        path_index: u32,
    },
    /// Reports that a tower damaged an enemy.
    EnemyDamaged {
        /// Identifier of the enemy that was hit.
        enemy: EnemyId,
        /// Identifier of the tower that dealt the damage.
        tower: TowerId,
        /// Health remaining after the hit.
        remaining: u32,
    },
    /// Reports that an enemy died and the layout reacted to it.
    EnemyDied {
        /// Identifier of the enemy that died.
        enemy: EnemyId,
        /// Reason the enemy died.
        cause: DeathCause,
    },
    /// Reports that every enemy of a wave was defeated.
    WaveCompleted {
        /// Wave that was cleared.
        completed: u32,
        /// Wave that is now active.
        next: u32,
    },
    /// Reports that an enemy reached the end of the path.
    WaveFailed {
        /// Wave that was failed.
        failed: u32,
        /// Wave that is now active.
        next: u32,
        /// Number of other live enemies that were cleared.
        cleared: usize,
    },
    /// Reports that the active wave was set explicitly.
    WaveChanged {
        /// Wave that is now active.
        wave: u32,
    },
    /// Reports that coins are owed to the layout's owner.
    CoinsGranted {
        /// Number of coins granted.
        amount: u32,
    },
    /// Confirms that a tower was placed into the layout.
    TowerPlaced {
        /// Identifier assigned to the tower by the layout.
        tower: TowerId,
        /// Template name of the tower.
        name: String,
        /// Region of grid cells occupied by the tower.
        region: CellRect,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Template name of the tower requested for placement.
        name: String,
        /// Origin cell provided in the placement request.
        origin: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was removed from the layout.
    TowerRemoved {
        /// Identifier of the tower that was removed.
        tower: TowerId,
        /// Template name of the tower.
        name: String,
        /// Region of grid cells previously occupied by the tower.
        region: CellRect,
    },
    /// Reports that a tower removal request was rejected.
    TowerRemovalRejected {
        /// Cell provided in the removal request.
        cell: CellCoord,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Reports that a tower resolved an attack.
    TowerAttacked {
        /// Identifier of the tower that attacked.
        tower: TowerId,
        /// Number of enemies damaged by the attack.
        hits: u32,
    },
}

/// Planar compass directions used to describe the enemy path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Direction obtained by turning a quarter to the left.
    #[must_use]
    pub const fn left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// Direction obtained by turning a quarter to the right.
    #[must_use]
    pub const fn right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        self.left().left()
    }

    /// Applies a relative turn to this heading.
    #[must_use]
    pub const fn turn(self, turn: Turn) -> Self {
        match turn {
            Turn::Forward => self,
            Turn::Left => self.left(),
            Turn::Right => self.right(),
        }
    }

    /// Unit displacement `(column, row)` of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }
}

/// Relative turn used by editors that build paths step by step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Turn {
    /// Keep the previous heading.
    Forward,
    /// Turn a quarter to the left of the previous heading.
    Left,
    /// Turn a quarter to the right of the previous heading.
    Right,
}

/// Ordered, non-empty route enemies follow from the layout's start cell.
///
/// Index `0` is the step taken immediately after the start cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Direction>", into = "Vec<Direction>")]
pub struct Path {
    steps: Vec<Direction>,
}

impl Path {
    /// Creates a path from absolute directions, rejecting empty input.
    pub fn new(steps: Vec<Direction>) -> Result<Self, PathError> {
        if steps.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self { steps })
    }

    /// Builds an absolute path from an initial heading followed by relative turns.
    #[must_use]
    pub fn from_turns(initial: Direction, turns: &[Turn]) -> Self {
        let mut steps = Vec::with_capacity(turns.len() + 1);
        let mut heading = initial;
        steps.push(heading);
        for turn in turns {
            heading = heading.turn(*turn);
            steps.push(heading);
        }
        Self { steps }
    }

    /// Number of steps in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always `false`; paths are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Direction of the step at `index`, if it exists.
    #[must_use]
    pub fn step(&self, index: u32) -> Option<Direction> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.steps.get(index).copied())
    }

    /// Steps of the path in traversal order.
    #[must_use]
    pub fn steps(&self) -> &[Direction] {
        &self.steps
    }

    /// Walks the path from `start` and returns every visited cell.
    ///
    /// The result holds `len() + 1` cells: the start cell followed by the cell
    /// reached after each step. Steps that would leave a `columns × rows`
    /// grid are rejected.
    pub fn cells(
        &self,
        start: CellCoord,
        columns: u32,
        rows: u32,
    ) -> Result<Vec<CellCoord>, PathError> {
        if start.column() >= columns || start.row() >= rows {
            return Err(PathError::StartOutOfBounds { start });
        }

        let mut cells = Vec::with_capacity(self.steps.len() + 1);
        let mut current = start;
        cells.push(current);
        for (index, direction) in self.steps.iter().enumerate() {
            let next = current
                .step(*direction)
                .filter(|cell| cell.column() < columns && cell.row() < rows)
                .ok_or(PathError::LeavesGrid {
                    index,
                    from: current,
                    direction: *direction,
                })?;
            cells.push(next);
            current = next;
        }
        Ok(cells)
    }
}

impl TryFrom<Vec<Direction>> for Path {
    type Error = PathError;

    fn try_from(steps: Vec<Direction>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

impl From<Path> for Vec<Direction> {
    fn from(path: Path) -> Self {
        path.steps
    }
}

/// Reasons a path cannot be used on a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path contained no steps.
    #[error("path must contain at least one direction")]
    Empty,
    /// The start cell lies outside the grid.
    #[error("path start {start:?} lies outside the grid")]
    StartOutOfBounds {
        /// Offending start cell.
        start: CellCoord,
    },
    /// A step left the grid.
    #[error("path step {index} ({direction:?}) from {from:?} leaves the grid")]
    LeavesGrid {
        /// Index of the offending step.
        index: usize,
        /// Cell the step started from.
        from: CellCoord,
        /// Direction of the offending step.
        direction: Direction,
    },
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle to a movable proxy entity owned by the world adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyHandle(u64);

impl ProxyHandle {
    /// Wraps a raw handle value issued by a world adapter.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the raw handle value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Neighbouring cell one step in `direction`, if it has non-negative coordinates.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (dx, dy) = direction.delta();
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        Some(CellCoord::new(column, row))
    }

    /// Computes the Chebyshev distance between two cell coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Reports whether the cell lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let column = u64::from(cell.column());
        let row = u64::from(cell.row());
        let left = u64::from(self.origin.column());
        let top = u64::from(self.origin.row());
        column >= left
            && row >= top
            && column < left + u64::from(self.size.width())
            && row < top + u64::from(self.size.height())
    }

    /// Reports whether `other` lies entirely inside the rectangle.
    #[must_use]
    pub fn contains_rect(&self, other: &CellRect) -> bool {
        if other.size.width() == 0 || other.size.height() == 0 {
            return self.contains(other.origin);
        }
        let far_column = u64::from(other.origin.column()) + u64::from(other.size.width()) - 1;
        let far_row = u64::from(other.origin.row()) + u64::from(other.size.height()) - 1;
        match (u32::try_from(far_column), u32::try_from(far_row)) {
            (Ok(column), Ok(row)) => {
                self.contains(other.origin) && self.contains(CellCoord::new(column, row))
            }
            _ => false,
        }
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Integer block position in the external world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPosition {
    /// East-west block coordinate.
    pub x: i32,
    /// Vertical block coordinate.
    pub y: i32,
    /// North-south block coordinate.
    pub z: i32,
}

impl BlockPosition {
    /// Creates a new block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position displaced by the provided offsets, saturating at the integer limits.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }
}

/// Continuous position in the external world, used for proxies and effects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldPoint {
    /// East-west coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
    /// North-south coordinate.
    pub z: f32,
}

impl WorldPoint {
    /// Creates a new world point.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Rectangular pattern of named blocks placed into the world.
///
/// Blocks are stored layer by layer (`height`), then row by row (`depth`),
/// then column by column (`width`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPattern {
    /// Extent along the grid's columns.
    pub width: u32,
    /// Extent along the grid's rows.
    pub depth: u32,
    /// Number of vertical layers.
    pub height: u32,
    /// Block names in layer, row, column order.
    pub blocks: Vec<String>,
}

impl BlockPattern {
    /// Creates a pattern filled entirely with a single block.
    #[must_use]
    pub fn filled(width: u32, depth: u32, height: u32, block: &str) -> Self {
        let count = expected_block_count(width, depth, height);
        Self {
            width,
            depth,
            height,
            blocks: vec![block.to_owned(); count],
        }
    }

    /// Number of blocks the declared dimensions require.
    #[must_use]
    pub fn expected_len(&self) -> usize {
        expected_block_count(self.width, self.depth, self.height)
    }

    /// Reports whether the block list matches the declared dimensions.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.width > 0 && self.depth > 0 && self.height > 0 && self.blocks.len() == self.expected_len()
    }

    /// Grid footprint covered by the pattern.
    #[must_use]
    pub const fn footprint(&self) -> CellRectSize {
        CellRectSize::new(self.width, self.depth)
    }

    /// Block at the provided relative coordinate, if it exists.
    #[must_use]
    pub fn block(&self, x: u32, y: u32, z: u32) -> Option<&str> {
        if x >= self.width || y >= self.height || z >= self.depth {
            return None;
        }
        let layer = u64::from(y) * u64::from(self.depth) * u64::from(self.width);
        let index = layer + u64::from(z) * u64::from(self.width) + u64::from(x);
        usize::try_from(index)
            .ok()
            .and_then(|index| self.blocks.get(index))
            .map(String::as_str)
    }
}

fn expected_block_count(width: u32, depth: u32, height: u32) -> usize {
    let count = u64::from(width) * u64::from(depth) * u64::from(height);
    usize::try_from(count).unwrap_or(usize::MAX)
}

/// Relative point inside a tower footprint where attacks originate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmissionPoint {
    /// Offset along the grid's columns.
    pub x: u32,
    /// Offset above the tower's base.
    #[serde(default)]
    pub y: u32,
    /// Offset along the grid's rows.
    pub z: u32,
}

/// Immutable description of a tower type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TowerTemplate {
    /// Unique template name; persisted as the registry key.
    #[serde(skip)]
    pub name: String,
    /// Blocks placed into the world; its width and depth form the footprint.
    pub pattern: BlockPattern,
    /// Point inside the footprint that serves as the range center.
    pub emission_point: EmissionPoint,
    /// Chebyshev radius, in cells, covered by the tower.
    pub range: u32,
    /// Damage dealt to each targeted enemy.
    pub damage: u32,
    /// Price charged by the shop.
    pub cost: u32,
    /// Maximum number of enemies damaged by one attack.
    pub targets: u32,
    /// Ticks the tower must wait after attacking.
    pub attack_delay: u32,
}

impl TowerTemplate {
    /// Footprint of the tower on the layout grid.
    #[must_use]
    pub const fn footprint(&self) -> CellRectSize {
        self.pattern.footprint()
    }
}

/// Immutable description of a play-field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutTemplate {
    /// Unique template name; persisted as the registry key.
    #[serde(skip)]
    pub name: String,
    /// Grid cell enemies spawn on.
    pub start: CellCoord,
    /// Route enemies follow from the start cell.
    pub path: Path,
    /// Blocks forming the play-field; its width and depth size the grid.
    pub pattern: BlockPattern,
}

/// Reasons an enemy died.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// Health dropped to zero or the enemy was killed outright.
    Health,
    /// The enemy walked past the end of the path.
    Path,
}

/// Reasons a tower placement request may be rejected by the layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The footprint extends beyond the layout's placement area.
    OutOfBounds,
    /// The footprint overlaps a path cell or another tower.
    Occupied,
    /// The world reported blocks in the way of the footprint.
    Obstructed,
    /// The owner cannot pay for the tower.
    InsufficientFunds,
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "tower does not fit inside the plot"),
            Self::Occupied => write!(f, "tower overlaps the path or another tower"),
            Self::Obstructed => write!(f, "tower is obstructed by blocks in the world"),
            Self::InsufficientFunds => write!(f, "not enough coins to buy the tower"),
        }
    }
}

/// Reasons a tower removal request may be rejected by the layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// The cell lies outside the layout's placement area.
    OutOfBounds,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Grid cell currently occupied by the enemy.
    pub cell: CellCoord,
    /// Path segment the enemy is traversing.
    pub path_index: u32,
    /// Remaining health.
    pub health: u32,
    /// Health the enemy spawned with.
    pub max_health: u32,
}

/// Read-only snapshot describing all live enemies on the layout.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the layout.
    pub id: TowerId,
    /// Template name of the tower.
    pub name: String,
    /// Region of cells occupied by the tower.
    pub region: CellRect,
    /// Ticks left before the tower may attack again.
    pub cooldown: u32,
    /// Path indices within the tower's range, in ascending order.
    pub accessible_path_indices: Vec<u32>,
}

/// Read-only snapshot describing all towers placed on the layout.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Cooldown state of a single tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerCooldownSnapshot {
    /// Identifier of the tower.
    pub tower: TowerId,
    /// Ticks left before the tower may attack again.
    pub cooldown: u32,
}

/// Read-only view of every tower's cooldown, ordered by tower identifier.
#[derive(Clone, Debug, Default)]
pub struct TowerCooldownView {
    snapshots: Vec<TowerCooldownSnapshot>,
}

impl TowerCooldownView {
    /// Creates a new cooldown view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerCooldownSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.tower);
        Self { snapshots }
    }

    /// Iterator over the captured cooldowns in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerCooldownSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerCooldownSnapshot> {
        self.snapshots
    }
}

/// Spawn bookkeeping of the active wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveProgress {
    /// Whether the layout's loops are running.
    pub running: bool,
    /// Active wave number.
    pub wave: u32,
    /// Enemies the active wave requires.
    pub enemy_count: u32,
    /// Enemies spawned so far in the active wave.
    pub spawned: u32,
    /// Enemies killed by towers so far in the active wave.
    pub killed: u32,
}

impl WaveProgress {
    /// Reports whether enough enemies died for the wave to complete.
    #[must_use]
    pub const fn is_cleared(&self) -> bool {
        self.killed >= self.enemy_count
    }

    /// Reports whether the wave still has enemies left to spawn.
    #[must_use]
    pub const fn needs_spawn(&self) -> bool {
        self.spawned < self.enemy_count
    }
}

/// Tunable cadence of the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ticks between two spawn decisions.
    pub spawn_period_ticks: u32,
    /// Movement ticks an enemy needs to cross one cell.
    pub movement_substeps: u32,
    /// Wave new layouts start on.
    pub start_wave: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            spawn_period_ticks: DEFAULT_SPAWN_PERIOD_TICKS,
            movement_substeps: DEFAULT_MOVEMENT_SUBSTEPS,
            start_wave: 1,
        }
    }
}

/// Cosmetic effects the layout may request from a feedback adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// A tower hit an enemy.
    TowerAttack,
    /// An enemy was defeated by a tower.
    EnemyDefeated,
}

/// External world the layout realises its blocks and proxies in.
pub trait WorldAdapter {
    /// Places the pattern with its lowest corner at `origin`.
    fn place_footprint(&mut self, origin: BlockPosition, pattern: &BlockPattern);

    /// Clears every block of a `size` footprint starting at `origin`.
    fn clear_footprint(&mut self, origin: BlockPosition, size: CellRectSize);

    /// Reports whether a `size` footprint starting at `origin` is free of blocks.
    fn is_footprint_clear(&self, origin: BlockPosition, size: CellRectSize) -> bool;

    /// Spawns a movable proxy entity and returns its handle.
    fn spawn_proxy(&mut self, position: WorldPoint) -> ProxyHandle;

    /// Moves a proxy; returns `false` when the proxy no longer exists.
    fn teleport_proxy(&mut self, handle: ProxyHandle, position: WorldPoint) -> bool;

    /// Removes a proxy; unknown handles are ignored.
    fn remove_proxy(&mut self, handle: ProxyHandle);
}

/// Optional sink for purely cosmetic effects.
pub trait FeedbackAdapter {
    /// Emits an effect travelling from `from` to `to`.
    fn emit_effect(&mut self, kind: EffectKind, from: WorldPoint, to: WorldPoint);
}

/// Owner of a layout that receives coin rewards.
pub trait EconomySink {
    /// Credits the owner with `amount` coins.
    fn grant_coins(&mut self, amount: u32);
}
