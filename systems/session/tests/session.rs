use plot_defence_core::{
    BlockPattern, BlockPosition, CellCoord, DeathCause, Direction, EmissionPoint, Event,
    LayoutTemplate, Path, PlacementError, SimulationConfig, TowerTemplate, LAYOUT_SIZE,
};
use plot_defence_session::{Session, Wallet};
use plot_defence_world::{query, HeadlessWorld, Layout};

fn lane(steps: usize) -> LayoutTemplate {
    LayoutTemplate {
        name: "lane".to_owned(),
        start: CellCoord::new(0, 5),
        path: Path::new(vec![Direction::East; steps]).expect("non-empty path"),
        pattern: BlockPattern::filled(LAYOUT_SIZE, LAYOUT_SIZE, 1, "grass_block"),
    }
}

fn tower(name: &str, range: u32, damage: u32, targets: u32, attack_delay: u32) -> TowerTemplate {
    TowerTemplate {
        name: name.to_owned(),
        pattern: BlockPattern::filled(1, 1, 2, "stone"),
        emission_point: EmissionPoint { x: 0, y: 1, z: 0 },
        range,
        damage,
        cost: 20,
        targets,
        attack_delay,
    }
}

fn session(steps: usize) -> Session<Wallet> {
    funded_session(steps, 0)
}

fn funded_session(steps: usize, coins: u64) -> Session<Wallet> {
    let config = SimulationConfig::default();
    let layout = Layout::new(
        &lane(steps),
        BlockPosition::new(0, 64, 0),
        HeadlessWorld::new(),
        &config,
    )
    .expect("lane builds");
    Session::new(layout, &config, Wallet::new(coins))
}

fn count(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

#[test]
fn first_wave_spawns_four_enemies_with_ten_health() {
    let mut session = session(10);
    let _ = session.start();
    let events = session.run(80);

    let spawned: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { health, .. } => Some(*health),
            _ => None,
        })
        .collect();
    assert_eq!(spawned, vec![10, 10, 10, 10]);

    let later = session.run(20);
    assert_eq!(
        count(&later, |event| matches!(event, Event::EnemySpawned { .. })),
        0,
        "no fifth enemy in wave one"
    );
}

#[test]
fn reaching_the_end_of_a_short_path_fails_the_wave() {
    let mut session = session(5);
    let _ = session.submit(plot_defence_core::Command::SetWave { wave: 2 });
    let _ = session.start();
    let events = session.run(70);

    assert!(events.contains(&Event::EnemyDied {
        enemy: plot_defence_core::EnemyId::new(0),
        cause: DeathCause::Path,
    }));
    assert!(events.contains(&Event::WaveFailed {
        failed: 2,
        next: 1,
        cleared: 2,
    }));
    assert_eq!(session.owner().balance(), 0, "failures never pay out");

    let progress = query::wave_progress(session.layout());
    assert_eq!(progress.wave, 1);
    assert_eq!(progress.spawned, 0);
    assert_eq!(progress.killed, 0);
    assert!(query::enemy_view(session.layout()).is_empty());
}

#[test]
fn wave_failure_never_drops_below_the_first_wave() {
    let mut session = session(5);
    let _ = session.start();
    let events = session.run(70);

    assert!(events.contains(&Event::WaveFailed {
        failed: 1,
        next: 1,
        cleared: 2,
    }));
}

#[test]
fn killing_every_enemy_pays_out_and_advances_the_wave() {
    let mut session = session(10);
    let placed = session.place_tower(tower("flamethrower", 2, 10, 4, 0), CellCoord::new(4, 3));
    assert!(matches!(placed.as_slice(), [Event::TowerPlaced { .. }]));
    let _ = session.start();

    let events = session.run(110);
    let kills = count(&events, |event| {
        matches!(
            event,
            Event::EnemyDied {
                cause: DeathCause::Health,
                ..
            }
        )
    });
    assert_eq!(kills, 4);
    assert_eq!(session.owner().balance(), 12, "three coins per wave one kill");
    assert_eq!(query::wave_progress(session.layout()).killed, 4);

    let events = session.run(10);
    assert!(events.contains(&Event::WaveCompleted {
        completed: 1,
        next: 2,
    }));
    let progress = query::wave_progress(session.layout());
    assert_eq!((progress.wave, progress.spawned, progress.killed), (2, 0, 0));
    assert_eq!(session.owner().balance(), 12, "completion yields nothing");
}

#[test]
fn overlapping_placement_is_rejected_without_touching_existing_reach() {
    let mut session = session(10);
    let mut wide = tower("bastion", 2, 2, 1, 5);
    wide.pattern = BlockPattern::filled(2, 2, 2, "stone");
    let _ = session.place_tower(wide.clone(), CellCoord::new(3, 3));
    let before = query::tower_view(session.layout()).into_vec();

    let events = session.place_tower(wide, CellCoord::new(4, 2));
    assert_eq!(
        events,
        vec![Event::TowerPlacementRejected {
            name: "bastion".to_owned(),
            origin: CellCoord::new(4, 2),
            reason: PlacementError::Occupied,
        }]
    );
    assert_eq!(query::tower_view(session.layout()).into_vec(), before);
    assert_eq!(before[0].accessible_path_indices, vec![1, 2, 3, 4, 5]);
}

#[test]
fn attacks_never_exceed_the_target_limit() {
    let mut session = session(10);
    let _ = session.place_tower(tower("volley", 5, 1, 2, 5), CellCoord::new(5, 2));
    let _ = session.start();
    let events = session.run(90);

    let hits: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::TowerAttacked { hits, .. } => Some(*hits),
            _ => None,
        })
        .collect();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|hits| *hits <= 2));
    assert!(hits.contains(&2), "two enemies were in range together");
}

#[test]
fn stopped_sessions_stay_quiet() {
    let mut session = session(10);
    let _ = session.place_tower(tower("archer", 3, 1, 1, 50), CellCoord::new(5, 4));
    let _ = session.start();
    let _ = session.run(30);

    let stopped = session.stop();
    assert_eq!(stopped, vec![Event::LayoutStopped { cleared: 1 }]);

    let events = session.run(100);
    assert!(events
        .iter()
        .all(|event| matches!(event, Event::TimeAdvanced { .. })));
    assert_eq!(query::world(session.layout()).proxy_count(), 0);
}

#[test]
fn removing_a_tower_frees_its_cells() {
    let mut session = session(10);
    let _ = session.place_tower(tower("archer", 1, 1, 1, 3), CellCoord::new(2, 2));

    let removed = session.remove_tower(CellCoord::new(2, 2));
    assert!(matches!(removed.as_slice(), [Event::TowerRemoved { .. }]));
    assert_eq!(query::grid(session.layout()).get(2, 2), None);

    let placed = session.place_tower(tower("archer", 1, 1, 1, 3), CellCoord::new(2, 2));
    assert!(matches!(placed.as_slice(), [Event::TowerPlaced { .. }]));
}

#[test]
fn purchases_beyond_the_balance_are_refused() {
    let mut session = funded_session(10, 19);
    let events = session.purchase_tower(tower("archer", 1, 1, 1, 3), CellCoord::new(2, 2));

    assert_eq!(
        events,
        vec![Event::TowerPlacementRejected {
            name: "archer".to_owned(),
            origin: CellCoord::new(2, 2),
            reason: PlacementError::InsufficientFunds,
        }]
    );
    assert_eq!(session.owner().balance(), 19);
    assert!(query::towers(session.layout()).is_empty());
    assert_eq!(query::grid(session.layout()).get(2, 2), None);
}

#[test]
fn exact_funds_buy_the_tower() {
    let mut session = funded_session(10, 20);
    let events = session.purchase_tower(tower("archer", 1, 1, 1, 3), CellCoord::new(2, 2));

    assert!(matches!(events.as_slice(), [Event::TowerPlaced { .. }]));
    assert_eq!(session.owner().balance(), 0);
    assert_eq!(query::towers(session.layout()).len(), 1);
}

#[test]
fn rejected_placements_are_refunded() {
    let mut session = funded_session(10, 50);
    let events = session.purchase_tower(tower("archer", 1, 1, 1, 3), CellCoord::new(4, 5));

    assert_eq!(
        events,
        vec![Event::TowerPlacementRejected {
            name: "archer".to_owned(),
            origin: CellCoord::new(4, 5),
            reason: PlacementError::Occupied,
        }]
    );
    assert_eq!(session.owner().balance(), 50);
    assert!(query::towers(session.layout()).is_empty());
}
