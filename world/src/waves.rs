//! Wave progression and the values derived from the wave number.

use serde::{Deserialize, Serialize};

/// Derives enemy count, health and coin yields from the active wave.
///
/// Only the wave number is persisted; every other value is recomputed
/// whenever the wave changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct WaveManager {
    wave: u32,
    enemy_count: u32,
    enemy_health: u32,
    enemy_coin_yield: u32,
    completion_coin_yield: u32,
}

impl WaveManager {
    /// Creates a manager positioned on `wave`, clamped to at least one.
    #[must_use]
    pub fn new(wave: u32) -> Self {
        let mut manager = Self {
            wave: 1,
            enemy_count: 0,
            enemy_health: 0,
            enemy_coin_yield: 0,
            completion_coin_yield: 0,
        };
        manager.set_wave(wave);
        manager
    }

    /// Moves to `wave`, clamped to at least one, and recomputes derived values.
    pub fn set_wave(&mut self, wave: u32) {
        self.wave = wave.max(1);
        self.enemy_count = integer_sqrt(self.wave).saturating_add(3);
        self.enemy_health = self.wave.saturating_mul(self.wave).saturating_add(9);
        self.enemy_coin_yield = (self.enemy_health / 5).saturating_add(self.wave);
        self.completion_coin_yield = 0;
    }

    /// Advances to the following wave.
    pub fn next(&mut self) {
        self.set_wave(self.wave.saturating_add(1));
    }

    /// Active wave number.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Number of enemies the wave spawns.
    #[must_use]
    pub const fn enemy_count(&self) -> u32 {
        self.enemy_count
    }

    /// Health every enemy of the wave spawns with.
    #[must_use]
    pub const fn enemy_health(&self) -> u32 {
        self.enemy_health
    }

    /// Coins granted for each enemy killed by a tower.
    #[must_use]
    pub const fn enemy_coin_yield(&self) -> u32 {
        self.enemy_coin_yield
    }

    /// Coins granted when the wave is completed.
    #[must_use]
    pub const fn completion_coin_yield(&self) -> u32 {
        self.completion_coin_yield
    }
}

impl Default for WaveManager {
    fn default() -> Self {
        Self::new(1)
    }
}

impl From<u32> for WaveManager {
    fn from(wave: u32) -> Self {
        Self::new(wave)
    }
}

impl From<WaveManager> for u32 {
    fn from(manager: WaveManager) -> Self {
        manager.wave
    }
}

fn integer_sqrt(value: u32) -> u32 {
    let mut root = f64::from(value).sqrt() as u32;
    while u64::from(root) * u64::from(root) > u64::from(value) {
        root -= 1;
    }
    while u64::from(root + 1) * u64::from(root + 1) <= u64::from(value) {
        root += 1;
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_wave_values() {
        let manager = WaveManager::new(1);
        assert_eq!(manager.wave(), 1);
        assert_eq!(manager.enemy_count(), 4);
        assert_eq!(manager.enemy_health(), 10);
        assert_eq!(manager.enemy_coin_yield(), 3);
        assert_eq!(manager.completion_coin_yield(), 0);
    }

    #[test]
    fn derived_values_follow_the_wave_formulas() {
        let expectations = [
            (2, 4, 13, 4),
            (3, 4, 18, 6),
            (4, 5, 25, 9),
            (9, 6, 90, 27),
            (10, 6, 109, 31),
            (16, 7, 265, 69),
        ];
        for (wave, count, health, coins) in expectations {
            let manager = WaveManager::new(wave);
            assert_eq!(manager.enemy_count(), count, "count of wave {wave}");
            assert_eq!(manager.enemy_health(), health, "health of wave {wave}");
            assert_eq!(manager.enemy_coin_yield(), coins, "coins of wave {wave}");
        }
    }

    #[test]
    fn enemy_count_and_health_never_decrease() {
        let mut previous = WaveManager::new(1);
        for wave in 2..=200 {
            let current = WaveManager::new(wave);
            assert!(
                current.enemy_count() >= previous.enemy_count(),
                "count drops at wave {wave}"
            );
            assert!(
                current.enemy_health() >= previous.enemy_health(),
                "health drops at wave {wave}"
            );
            previous = current;
        }
    }

    #[test]
    fn wave_is_clamped_to_one() {
        let mut manager = WaveManager::new(0);
        assert_eq!(manager, WaveManager::new(1));

        manager.set_wave(3);
        manager.set_wave(manager.wave().saturating_sub(5));
        assert_eq!(manager.wave(), 1);
        assert_eq!(manager.enemy_count(), 4);
    }

    #[test]
    fn next_recomputes_derived_values() {
        let mut manager = WaveManager::new(3);
        manager.next();
        assert_eq!(manager, WaveManager::new(4));
    }

    #[test]
    fn persists_as_a_single_integer() {
        let json = serde_json::to_string(&WaveManager::new(7)).expect("serialize");
        assert_eq!(json, "7");

        let restored: WaveManager = serde_json::from_str("0").expect("deserialize");
        assert_eq!(restored, WaveManager::new(1));
    }

    #[test]
    fn integer_square_root_is_exact_near_squares() {
        for root in [1_u32, 2, 3, 100, 65_535] {
            let square = root * root;
            assert_eq!(integer_sqrt(square), root);
            assert_eq!(integer_sqrt(square - 1), root - 1);
        }
    }
}
