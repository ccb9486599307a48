//! In-memory world used when no game world is attached.

use std::collections::{BTreeMap, HashMap};

use plot_defence_core::{
    BlockPattern, BlockPosition, CellRectSize, ProxyHandle, WorldAdapter, WorldPoint,
};

/// Block name treated as empty space.
pub const AIR: &str = "air";

/// World adapter that records blocks and proxies in memory.
#[derive(Clone, Debug, Default)]
pub struct HeadlessWorld {
    blocks: HashMap<BlockPosition, String>,
    proxies: BTreeMap<ProxyHandle, WorldPoint>,
    next_proxy: u64,
}

impl HeadlessWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block stored at `position`, if any.
    #[must_use]
    pub fn block(&self, position: BlockPosition) -> Option<&str> {
        self.blocks.get(&position).map(String::as_str)
    }

    /// Sets or clears a single block.
    pub fn set_block(&mut self, position: BlockPosition, block: &str) {
        if block == AIR {
            let _ = self.blocks.remove(&position);
        } else {
            let _ = self.blocks.insert(position, block.to_owned());
        }
    }

    /// Number of non-air blocks in the world.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Current position of a proxy.
    #[must_use]
    pub fn proxy_position(&self, handle: ProxyHandle) -> Option<WorldPoint> {
        self.proxies.get(&handle).copied()
    }

    /// Number of live proxies.
    #[must_use]
    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    fn in_column(origin: BlockPosition, size: CellRectSize, position: BlockPosition) -> bool {
        let dx = i64::from(position.x) - i64::from(origin.x);
        let dz = i64::from(position.z) - i64::from(origin.z);
        position.y >= origin.y
            && (0..i64::from(size.width())).contains(&dx)
            && (0..i64::from(size.height())).contains(&dz)
    }
}

impl WorldAdapter for HeadlessWorld {
    fn place_footprint(&mut self, origin: BlockPosition, pattern: &BlockPattern) {
        for y in 0..pattern.height {
            for z in 0..pattern.depth {
                for x in 0..pattern.width {
                    if let Some(block) = pattern.block(x, y, z) {
                        let position = origin.offset(x as i32, y as i32, z as i32);
                        self.set_block(position, block);
                    }
                }
            }
        }
    }

    fn clear_footprint(&mut self, origin: BlockPosition, size: CellRectSize) {
        self.blocks
            .retain(|position, _| !Self::in_column(origin, size, *position));
    }

    fn is_footprint_clear(&self, origin: BlockPosition, size: CellRectSize) -> bool {
        !self
            .blocks
            .keys()
            .any(|position| Self::in_column(origin, size, *position))
    }

    fn spawn_proxy(&mut self, position: WorldPoint) -> ProxyHandle {
        let handle = ProxyHandle::new(self.next_proxy);
        self.next_proxy = self.next_proxy.wrapping_add(1);
        let _ = self.proxies.insert(handle, position);
        handle
    }

    fn teleport_proxy(&mut self, handle: ProxyHandle, position: WorldPoint) -> bool {
        match self.proxies.get_mut(&handle) {
            Some(current) => {
                *current = position;
                true
            }
            None => false,
        }
    }

    fn remove_proxy(&mut self, handle: ProxyHandle) {
        let _ = self.proxies.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footprints_occupy_the_column_above_their_origin() {
        let mut world = HeadlessWorld::new();
        let origin = BlockPosition::new(10, 64, -4);
        world.place_footprint(origin, &BlockPattern::filled(2, 2, 3, "stone"));

        assert_eq!(world.block_count(), 12);
        assert_eq!(world.block(origin.offset(1, 2, 1)), Some("stone"));
        assert!(!world.is_footprint_clear(origin.offset(1, 0, 1), CellRectSize::new(1, 1)));
        assert!(world.is_footprint_clear(origin.offset(2, 0, 0), CellRectSize::new(2, 2)));
        assert!(world.is_footprint_clear(origin.offset(0, 3, 0), CellRectSize::new(2, 2)));

        world.clear_footprint(origin, CellRectSize::new(2, 2));
        assert_eq!(world.block_count(), 0);
    }

    #[test]
    fn air_blocks_are_not_stored() {
        let mut world = HeadlessWorld::new();
        let mut pattern = BlockPattern::filled(1, 1, 2, "stone");
        pattern.blocks[1] = AIR.to_owned();
        world.place_footprint(BlockPosition::new(0, 0, 0), &pattern);

        assert_eq!(world.block_count(), 1);
        assert_eq!(world.block(BlockPosition::new(0, 1, 0)), None);
    }

    #[test]
    fn proxies_can_be_moved_until_removed() {
        let mut world = HeadlessWorld::new();
        let handle = world.spawn_proxy(WorldPoint::new(0.5, 1.0, 0.5));
        assert!(world.teleport_proxy(handle, WorldPoint::new(1.5, 1.0, 0.5)));
        assert_eq!(
            world.proxy_position(handle),
            Some(WorldPoint::new(1.5, 1.0, 0.5))
        );

        world.remove_proxy(handle);
        assert!(!world.teleport_proxy(handle, WorldPoint::new(0.0, 0.0, 0.0)));
        assert_eq!(world.proxy_count(), 0);
    }
}
