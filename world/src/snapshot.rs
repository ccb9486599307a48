//! Persisted form of a running plot.

use plot_defence_core::{BlockPosition, CellCoord, Command, SimulationConfig, WorldAdapter};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{apply, query, registry::TemplateRegistry, Layout, LayoutError};

/// Tower recorded by template name and anchor cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTower {
    /// Template name of the tower.
    pub tower: String,
    /// Column of the anchor cell.
    pub x: u32,
    /// Row of the anchor cell.
    pub y: u32,
}

/// Layout template, wave and towers of a plot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotSnapshot {
    /// Name of the layout template.
    pub layout: String,
    /// Active wave.
    pub wave: u32,
    /// Placed towers in placement order.
    #[serde(default)]
    pub towers: Vec<PlacedTower>,
}

impl PlotSnapshot {
    /// Records the persistent state of `layout`.
    #[must_use]
    pub fn capture<W: WorldAdapter>(layout: &Layout<W>) -> Self {
        let towers = query::towers(layout)
            .iter()
            .filter_map(|tower| {
                let anchor = tower.anchor()?;
                Some(PlacedTower {
                    tower: tower.name().to_owned(),
                    x: anchor.column(),
                    y: anchor.row(),
                })
            })
            .collect();
        Self {
            layout: query::name(layout).to_owned(),
            wave: query::waves(layout).wave(),
            towers,
        }
    }

    /// Rebuilds the plot into `world`.
    ///
    /// Towers whose template is unknown or whose placement is rejected are
    /// skipped and returned alongside the layout.
    pub fn restore<W: WorldAdapter>(
        &self,
        registry: &TemplateRegistry,
        origin: BlockPosition,
        world: W,
        config: &SimulationConfig,
    ) -> Result<(Layout<W>, Vec<PlacedTower>), LayoutError> {
        let mut layout = registry.instantiate_layout(&self.layout, origin, world, config)?;
        let mut events = Vec::new();
        apply(
            &mut layout,
            Command::SetWave { wave: self.wave },
            &mut events,
        );

        let mut skipped = Vec::new();
        for placed in &self.towers {
            let Some(template) = registry.tower(&placed.tower) else {
                warn!(tower = %placed.tower, "unknown tower template in snapshot");
                skipped.push(placed.clone());
                continue;
            };
            let cell = CellCoord::new(placed.x, placed.y);
            if let Err(reason) = layout.place_tower(template, cell) {
                warn!(
                    tower = %placed.tower,
                    x = placed.x,
                    y = placed.y,
                    %reason,
                    "snapshot tower could not be placed"
                );
                skipped.push(placed.clone());
            }
        }

        info!(
            layout = %self.layout,
            wave = self.wave,
            towers = self.towers.len() - skipped.len(),
            skipped = skipped.len(),
            "plot restored"
        );
        Ok((layout, skipped))
    }
}
