use crate::config::{Config, ConfigError, SpawnConfig};
use std::io::Write;

fn path_in(dir: &tempfile::TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

#[test]
fn test_toml_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = path_in(&dir, "spawn.toml");

    let mut config = SpawnConfig::default();
    config.seed = Some(77);
    config.stage.stage_duration = Some(34.0);
    config.themes.truncate(2);
    config.themes[1].platforms[0].width = 5.25;

    config.save_to_file(&path).unwrap();
    let loaded = SpawnConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_ron_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = path_in(&dir, "spawn.ron");

    let mut config = SpawnConfig::default();
    config.scheduler.max_active_platforms = 6;
    config.placement.sunlight_chance = 0.5;

    config.save_to_file(&path).unwrap();
    let loaded = SpawnConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_hand_written_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = path_in(&dir, "custom.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"
seed = 5

[scheduler]
max_active_platforms = 3
scroll_speed = 8.0

[[themes]]
[[themes.platforms]]
name = "meadow"
width = 6.0
height = 1.0
obstacles = [{{ offset = [1.0, 0.9], radius = 0.5 }}]
"#
    )
    .unwrap();

    let config = SpawnConfig::load_from_file(&path).unwrap();
    assert_eq!(config.seed, Some(5));
    assert_eq!(config.scheduler.max_active_platforms, 3);
    assert_eq!(config.scheduler.spawn_x, 20.0);
    assert_eq!(config.themes.len(), 1);
    assert_eq!(config.themes[0].platforms[0].obstacles[0].radius, 0.5);
    assert!(config.validate().is_ok());
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = path_in(&dir, "broken.toml");
    std::fs::write(&path, "[scheduler\nmax_active_platforms = ").unwrap();

    assert!(matches!(
        SpawnConfig::load_from_file(&path),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = path_in(&dir, "absent.ron");
    assert!(matches!(
        SpawnConfig::load_from_file(&path),
        Err(ConfigError::Io(_))
    ));
}
