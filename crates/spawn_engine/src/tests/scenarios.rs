use crate::config::{ObstacleTemplate, PlatformTemplate, SpawnConfig, StageTheme};
use crate::director::{SpawnDirector, TickReport};
use crate::entity::ItemKind;
use crate::events::{EventLog, NullSink, SpawnEvent};
use crate::foundation::math::Vec2;
use crate::foundation::random::StdRandom;
use crate::foundation::time::{Clock, ManualClock};
use crate::placement::Layout;
use crate::spatial::{ColliderWorld, LayerMask, NoColliders, SpatialQuery};
use approx::assert_relative_eq;

const TICK: f64 = 1.0 / 60.0;

fn build(config: SpawnConfig, seed: u64, spatial: Box<dyn SpatialQuery>) -> (SpawnDirector, EventLog) {
    let log = EventLog::new();
    let director = SpawnDirector::new(
        config,
        Box::new(StdRandom::seeded(seed)),
        spatial,
        Box::new(log.clone()),
    )
    .unwrap();
    (director, log)
}

fn run(
    director: &mut SpawnDirector,
    clock: &mut ManualClock,
    seconds: f64,
    mut each: impl FnMut(&SpawnDirector, &TickReport),
) {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let ticks = (seconds / TICK).round() as usize;
    for _ in 0..ticks {
        clock.advance(TICK);
        let report = director.tick(clock);
        each(director, &report);
    }
}

#[test]
fn test_active_set_never_exceeds_capacity() {
    let (mut director, _) = build(SpawnConfig::default(), 1, Box::new(NoColliders));
    let mut clock = ManualClock::new();
    let mut peak = 0;

    run(&mut director, &mut clock, 120.0, |director, _| {
        let active = director.active_platforms().len();
        assert!(active <= 4);
        peak = peak.max(active);
    });

    assert!(peak >= 3);
    let stats = director.stats();
    assert!(stats.platforms_spawned > 40);
    assert!(stats.platforms_recycled > 30);
    assert_eq!(
        stats.platforms_spawned - stats.platforms_recycled,
        director.active_platforms().len() as u64
    );
}

#[test]
fn test_recycled_platforms_release_their_items() {
    let (mut director, _) = build(SpawnConfig::default(), 2, Box::new(NoColliders));
    let mut clock = ManualClock::new();

    run(&mut director, &mut clock, 90.0, |director, _| {
        let attached: usize = director
            .active_platforms()
            .iter()
            .map(|handle| director.platform(*handle).unwrap().items().len())
            .sum();
        assert_eq!(director.item_pools().active_count(), attached);
    });
}

#[test]
fn test_stages_advance_and_reset_counters() {
    let (mut director, log) = build(SpawnConfig::default(), 3, Box::new(NoColliders));
    let mut clock = ManualClock::new();

    run(&mut director, &mut clock, 120.0, |director, report| {
        if report.stage_advanced.is_some() {
            let stage = director.stage();
            // The platform that triggered the advance was counted before the reset;
            // its items are counted against the new stage.
            assert_eq!(stage.platforms_this_stage, 0);
            assert!(stage.pills_spawned_this_stage <= 1);
            assert!(stage.sunlight_spawned_this_stage <= 1);
        }
        assert!(director.stage().pills_spawned_this_stage <= 3);
        assert!(director.stage().sunlight_spawned_this_stage <= 1);
    });

    let advances: Vec<u32> = log
        .events()
        .iter()
        .filter_map(|event| match event {
            SpawnEvent::StageAdvanced(stage) => Some(*stage),
            _ => None,
        })
        .collect();
    assert!(advances.len() >= 2);
    assert_eq!(advances[0], 2);
    assert!(advances.windows(2).all(|pair| pair[1] == pair[0] + 1));
    assert_eq!(director.stage().current_stage, *advances.last().unwrap());
}

#[test]
fn test_later_stages_use_their_theme() {
    let mut config = SpawnConfig::default();
    config.stage.platforms_per_stage = 1;
    let (mut director, _) = build(config, 4, Box::new(NoColliders));
    let mut clock = ManualClock::new();

    let mut seen_stage4 = false;
    let mut seen_advance = false;
    run(&mut director, &mut clock, 60.0, |director, report| {
        if let Some(handle) = report.spawned {
            let template = director.platform(handle).unwrap().template().to_string();
            // Themed for the stage it was counted in, including the one that
            // rolled the stage over
            let stage = director.stage().current_stage.min(4);
            assert!(
                template.starts_with(&format!("stage{stage}/")),
                "{template} spawned in stage {stage}"
            );
            seen_advance |= report.stage_advanced.is_some();
            seen_stage4 |= stage == 4;
        }
    });
    assert!(seen_advance);
    assert!(seen_stage4);
}

#[test]
fn test_infeasible_placement_keeps_session_running() {
    let mut config = SpawnConfig::default();
    config.stage.obstacle_chance_denominator = 1;
    let mut world = ColliderWorld::new();
    world.insert(Vec2::new(0.0, 0.0), 1000.0, LayerMask::OBSTACLE);
    let (mut director, _) = build(config, 5, Box::new(world));
    let mut clock = ManualClock::new();

    run(&mut director, &mut clock, 90.0, |_, report| {
        if let Some(placement) = report.placement {
            assert_eq!(placement.layout, Layout::LineFallback);
            assert!(placement.placed() >= 3);
        }
    });

    let stats = director.stats();
    assert!(stats.platforms_spawned > 20);
    assert_eq!(stats.fallback_layouts, stats.platforms_spawned);
    assert!(director.stage().current_stage >= 2);
    assert!(stats.platforms_recycled > 0);
}

#[test]
fn test_restart_totality() {
    let (mut director, log) = build(SpawnConfig::default(), 6, Box::new(NoColliders));
    let mut clock = ManualClock::new();
    run(&mut director, &mut clock, 40.0, |_, _| {});
    director.apply_speed_boost(clock.now(), 1.5, 5.0);

    let old_platforms = director.active_platforms().to_vec();
    let old_item = director.platform(old_platforms[0]).unwrap().items()[0];

    director.restart();

    assert!(director.active_platforms().is_empty());
    assert_eq!(director.platform_pools().active_count(), 0);
    assert_eq!(director.item_pools().active_count(), 0);
    assert!(director.item(old_item).is_none());
    assert!(old_platforms.iter().all(|handle| director.platform(*handle).is_none()));
    assert_eq!(director.stage(), crate::stage::StageState::default());
    assert_relative_eq!(director.speed_multiplier(), 1.0);
    assert_eq!(director.boost_remaining(clock.now()), None);

    // Next tick spawns straight away, on stage 1
    log.drain();
    clock.advance(TICK);
    let report = director.tick(&clock);
    let handle = report.spawned.unwrap();
    assert!(director.platform(handle).unwrap().template().starts_with("stage1/"));
    assert_eq!(director.platform_position(handle).unwrap().x, 20.0);
}

#[test]
fn test_speed_boost_expires() {
    let (mut director, _) = build(SpawnConfig::default(), 7, Box::new(NoColliders));
    let mut clock = ManualClock::new();
    let handle = director.tick(&clock).spawned.unwrap();

    director.apply_speed_boost(0.0, 1.5, 5.0);
    clock.advance(1.0);
    director.tick(&clock);
    // 6 units/s boosted by 1.5
    assert_relative_eq!(director.platform_position(handle).unwrap().x, 11.0, epsilon = 1e-4);
    assert_relative_eq!(director.boost_remaining(1.0).unwrap(), 4.0, epsilon = 1e-9);

    let mut expired_at = None;
    run(&mut director, &mut clock, 5.0, |director, report| {
        if report.boost_expired {
            expired_at = Some(report.now);
            assert_relative_eq!(director.speed_multiplier(), 1.0);
        }
    });
    let expired_at = expired_at.unwrap();
    assert!((5.0..5.0 + 2.0 * TICK).contains(&expired_at));
    assert_eq!(director.boost_remaining(clock.now()), None);
}

#[test]
fn test_reapplied_boost_replaces_running_one() {
    let (mut director, _) = build(SpawnConfig::default(), 8, Box::new(NoColliders));
    let clock = ManualClock::new();
    director.tick(&clock);

    director.apply_speed_boost(0.0, 1.5, 5.0);
    director.apply_speed_boost(3.0, 2.0, 5.0);
    assert_relative_eq!(director.speed_multiplier(), 2.0);
    assert_relative_eq!(director.boost_remaining(3.0).unwrap(), 5.0, epsilon = 1e-9);
}

#[test]
fn test_time_based_stage_advance() {
    let mut config = SpawnConfig::default();
    config.stage.platforms_per_stage = 1000;
    config.stage.stage_duration = Some(34.0);
    let (mut director, log) = build(config, 9, Box::new(NoColliders));
    let mut clock = ManualClock::new();

    run(&mut director, &mut clock, 33.0, |_, _| {});
    assert_eq!(director.stage().current_stage, 1);

    run(&mut director, &mut clock, 2.0, |_, _| {});
    assert_eq!(director.stage().current_stage, 2);
    assert_eq!(log.count(|event| *event == SpawnEvent::StageAdvanced(2)), 1);
}

#[test]
fn test_consumed_pill_frees_quota() {
    let mut config = SpawnConfig::default();
    config.placement.pill_chance = 1.0;
    config.placement.sunlight_chance = 0.0;
    config.stage.max_pills_per_stage = 1;
    let (mut director, _) = build(config, 10, Box::new(NoColliders));
    let clock = ManualClock::new();

    let first = director.tick(&clock).spawned.unwrap();
    assert_eq!(director.stage().pills_spawned_this_stage, 1);
    let pill = director
        .platform(first)
        .unwrap()
        .items()
        .iter()
        .copied()
        .find(|item| director.item(*item).unwrap().kind() == ItemKind::Pill)
        .unwrap();

    assert_eq!(director.collect_item(pill), Some(ItemKind::Pill));
    assert_eq!(director.stage().pills_spawned_this_stage, 0);
    assert_eq!(director.stats().items_collected, [0, 1, 0]);
}

#[test]
fn test_item_pools_grow_under_load() {
    let mut config = SpawnConfig::default();
    config.pools.water_pool_size = 1;
    config.pools.grow_by = 1;
    let (mut director, _) = build(config, 11, Box::new(NoColliders));
    let mut clock = ManualClock::new();

    run(&mut director, &mut clock, 30.0, |_, report| {
        if let Some(placement) = report.placement {
            assert_eq!(placement.skipped, 0);
        }
    });

    let water = director.item_pools().pool(ItemKind::Water);
    assert!(water.stats().growth_events > 0);
    assert!(water.capacity() > 1);
}

#[test]
fn test_seeded_sessions_replay_identically() {
    let record = |seed| {
        let (mut director, log) = build(SpawnConfig::default(), seed, Box::new(NoColliders));
        let mut clock = ManualClock::new();
        run(&mut director, &mut clock, 30.0, |_, _| {});
        log.events()
    };

    let first = record(42);
    assert!(!first.is_empty());
    assert_eq!(first, record(42));
}

#[test]
fn test_null_sink_session() {
    let mut director = SpawnDirector::new(
        SpawnConfig::default(),
        Box::new(StdRandom::seeded(12)),
        Box::new(NoColliders),
        Box::new(NullSink),
    )
    .unwrap();
    let mut clock = ManualClock::new();
    run(&mut director, &mut clock, 10.0, |_, _| {});
    assert!(director.stats().platforms_spawned > 0);
}

#[test]
fn test_curve_layout_over_enabled_obstacle() {
    let mut config = SpawnConfig::default();
    config.stage.obstacle_chance_denominator = 1;
    config.themes = vec![StageTheme {
        platforms: vec![PlatformTemplate {
            name: "rock".to_string(),
            width: 4.5,
            height: 1.0,
            obstacles: vec![ObstacleTemplate {
                offset: [0.0, 0.9],
                radius: 0.4,
            }],
        }],
    }];
    let (mut director, _) = build(config, 13, Box::new(NoColliders));
    let clock = ManualClock::new();

    let report = director.tick(&clock);
    let placement = report.placement.unwrap();
    assert_eq!(placement.layout, Layout::Curve);

    let handle = report.spawned.unwrap();
    let platform_position = director.platform_position(handle).unwrap();
    let obstacle = platform_position + Vec2::new(0.0, 0.9);
    for item in director.platform(handle).unwrap().items() {
        let position = director.item_world_position(*item).unwrap();
        assert!((position - obstacle).norm() > 0.8 + 0.4);
    }
}
