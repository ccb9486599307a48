#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Single-threaded driver that runs one layout against its systems.
//!
//! Every tick the session applies `Command::Tick` to the layout, lets the
//! spawning system react to the elapsed time, lets the tower combat system
//! react to the refreshed cooldowns, and forwards coin grants to the owner.

use plot_defence_core::{
    CellCoord, Command, EconomySink, Event, PlacementError, SimulationConfig, TowerTemplate,
    WorldAdapter,
};
use plot_defence_system_spawning::{Config as SpawningConfig, Spawning};
use plot_defence_system_tower_combat::TowerCombat;
use plot_defence_world::{self as world, query, HeadlessWorld, Layout};
use tracing::debug;

/// Economy sink that accumulates coins in memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Wallet {
    balance: u64,
}

impl Wallet {
    /// Creates a wallet holding `balance` coins.
    #[must_use]
    pub const fn new(balance: u64) -> Self {
        Self { balance }
    }

    /// Coins currently held.
    #[must_use]
    pub const fn balance(&self) -> u64 {
        self.balance
    }

    /// Takes `amount` coins when the balance covers all of it.
    ///
    /// Returns `false` and leaves the balance untouched otherwise.
    pub fn try_spend(&mut self, amount: u32) -> bool {
        match self.balance.checked_sub(u64::from(amount)) {
            Some(rest) => {
                self.balance = rest;
                true
            }
            None => false,
        }
    }
}

impl EconomySink for Wallet {
    fn grant_coins(&mut self, amount: u32) {
        self.balance = self.balance.saturating_add(u64::from(amount));
    }
}

/// Runs one layout on behalf of its owner.
pub struct Session<E: EconomySink, W: WorldAdapter = HeadlessWorld> {
    layout: Layout<W>,
    owner: E,
    spawning: Spawning,
    tower_combat: TowerCombat,
    commands: Vec<Command>,
}

impl<E: EconomySink, W: WorldAdapter> Session<E, W> {
    /// Wraps `layout` with freshly configured systems.
    #[must_use]
    pub fn new(layout: Layout<W>, config: &SimulationConfig, owner: E) -> Self {
        Self {
            layout,
            owner,
            spawning: Spawning::new(SpawningConfig::from(config)),
            tower_combat: TowerCombat::new(),
            commands: Vec::new(),
        }
    }

    /// Read-only access to the layout.
    #[must_use]
    pub const fn layout(&self) -> &Layout<W> {
        &self.layout
    }

    /// Owner receiving coin grants.
    #[must_use]
    pub const fn owner(&self) -> &E {
        &self.owner
    }

    /// Mutable access to the owner.
    pub fn owner_mut(&mut self) -> &mut E {
        &mut self.owner
    }

    /// Consumes the session, returning the layout and its owner.
    #[must_use]
    pub fn into_parts(self) -> (Layout<W>, E) {
        (self.layout, self.owner)
    }

    /// Starts the layout's loops.
    pub fn start(&mut self) -> Vec<Event> {
        self.submit(Command::Start)
    }

    /// Stops the layout's loops, clearing live enemies.
    pub fn stop(&mut self) -> Vec<Event> {
        self.submit(Command::Stop)
    }

    /// Requests placement of a tower anchored at `origin`.
    pub fn place_tower(&mut self, template: TowerTemplate, origin: CellCoord) -> Vec<Event> {
        self.submit(Command::PlaceTower { template, origin })
    }

    /// Requests removal of the tower covering `cell`.
    pub fn remove_tower(&mut self, cell: CellCoord) -> Vec<Event> {
        self.submit(Command::RemoveTower { cell })
    }

    /// Applies an arbitrary command and settles the resulting events.
    pub fn submit(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.layout, command, &mut events);
        self.settle(&events);
        events
    }

    /// Advances the simulation by one tick.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.layout, Command::Tick, &mut events);

        self.spawning.handle(
            &events,
            query::wave_progress(&self.layout),
            &mut self.commands,
        );
        self.dispatch(&mut events);

        self.tower_combat.handle(
            query::is_running(&self.layout),
            query::tower_cooldowns(&self.layout),
            &mut self.commands,
        );
        self.dispatch(&mut events);

        self.settle(&events);
        events
    }

    /// Advances the simulation by `ticks` ticks and returns every event produced.
    pub fn run(&mut self, ticks: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(self.tick());
        }
        events
    }

    fn dispatch(&mut self, events: &mut Vec<Event>) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.layout, command, events);
        }
    }

    fn settle(&mut self, events: &[Event]) {
        for event in events {
            if let Event::CoinsGranted { amount } = event {
                debug!(amount, "coins granted to owner");
                self.owner.grant_coins(*amount);
            }
        }
    }
}

impl<W: WorldAdapter> Session<Wallet, W> {
    /// Buys a tower from the owner's wallet and places it at `origin`.
    ///
    /// The purchase is refused when the wallet cannot cover the template's
    /// cost. A placement the layout rejects is refunded in full.
    pub fn purchase_tower(&mut self, template: TowerTemplate, origin: CellCoord) -> Vec<Event> {
        let cost = template.cost;
        if !self.owner.try_spend(cost) {
            debug!(
                name = %template.name,
                cost,
                balance = self.owner.balance(),
                "tower purchase refused"
            );
            return vec![Event::TowerPlacementRejected {
                name: template.name,
                origin,
                reason: PlacementError::InsufficientFunds,
            }];
        }

        let events = self.place_tower(template, origin);
        if !events
            .iter()
            .any(|event| matches!(event, Event::TowerPlaced { .. }))
        {
            debug!(cost, "tower purchase refunded");
            self.owner.grant_coins(cost);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_spends_all_or_nothing() {
        let mut wallet = Wallet::new(5);
        wallet.grant_coins(3);
        assert!(wallet.try_spend(6));
        assert_eq!(wallet.balance(), 2);
        assert!(!wallet.try_spend(3));
        assert_eq!(wallet.balance(), 2);
        assert!(wallet.try_spend(2));
        assert_eq!(wallet.balance(), 0);
    }
}
