use plot_defence_core::{
    BlockPattern, BlockPosition, CellCoord, Command, Direction, Event, LayoutTemplate, Path,
    SimulationConfig, WaveProgress,
};
use plot_defence_system_spawning::{Config, Spawning};
use plot_defence_world::{self as world, query, HeadlessWorld, Layout};

fn running(spawned: u32) -> WaveProgress {
    WaveProgress {
        running: true,
        wave: 1,
        enemy_count: 4,
        spawned,
        killed: 0,
    }
}

fn ticks(count: u64) -> Vec<Event> {
    (1..=count).map(|tick| Event::TimeAdvanced { tick }).collect()
}

#[test]
fn first_spawn_happens_after_one_full_period() {
    let mut spawning = Spawning::new(Config::new(20));
    let mut commands = Vec::new();

    for _ in 0..19 {
        spawning.handle(&ticks(1), running(0), &mut commands);
    }
    assert!(commands.is_empty(), "no spawn before the period elapsed");

    spawning.handle(&ticks(1), running(0), &mut commands);
    assert_eq!(commands, vec![Command::SpawnEnemy]);
}

#[test]
fn large_batches_still_emit_a_single_decision() {
    let mut spawning = Spawning::new(Config::new(5));
    let mut commands = Vec::new();

    spawning.handle(&ticks(12), running(0), &mut commands);
    assert_eq!(commands, vec![Command::SpawnEnemy]);

    commands.clear();
    spawning.handle(&ticks(1), running(1), &mut commands);
    assert_eq!(
        commands,
        vec![Command::SpawnEnemy],
        "leftover ticks carry into the next call"
    );
}

#[test]
fn stopped_layouts_reset_the_accumulator() {
    let mut spawning = Spawning::new(Config::new(3));
    let mut commands = Vec::new();

    spawning.handle(&ticks(2), running(0), &mut commands);
    let stopped = WaveProgress {
        running: false,
        ..running(0)
    };
    spawning.handle(&ticks(5), stopped, &mut commands);
    assert!(commands.is_empty(), "stopped layouts never spawn");

    spawning.handle(&ticks(2), running(0), &mut commands);
    assert!(commands.is_empty(), "accumulator restarted from zero");

    spawning.handle(&ticks(1), running(0), &mut commands);
    assert_eq!(commands, vec![Command::SpawnEnemy]);
}

#[test]
fn drives_a_layout_through_its_first_wave_spawns() {
    let template = LayoutTemplate {
        name: "lane".to_owned(),
        start: CellCoord::new(0, 5),
        path: Path::new(vec![Direction::East; 10]).expect("non-empty path"),
        pattern: BlockPattern::filled(11, 11, 1, "grass_block"),
    };
    let config = SimulationConfig {
        movement_substeps: 1_000,
        ..SimulationConfig::default()
    };
    let mut layout: Layout =
        Layout::new(&template, BlockPosition::new(0, 0, 0), HeadlessWorld::new(), &config)
            .expect("layout builds");
    let mut spawning = Spawning::new(Config::from(&config));
    let mut events = Vec::new();
    world::apply(&mut layout, Command::Start, &mut events);

    for _ in 0..200 {
        events.clear();
        world::apply(&mut layout, Command::Tick, &mut events);
        let mut commands = Vec::new();
        spawning.handle(&events, query::wave_progress(&layout), &mut commands);
        for command in commands {
            world::apply(&mut layout, command, &mut events);
        }
    }

    let progress = query::wave_progress(&layout);
    assert_eq!(progress.spawned, 4, "wave one spawns exactly four enemies");
    assert_eq!(query::enemy_view(&layout).len(), 4);
}
