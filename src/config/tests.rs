use super::validation::validate_config;
use super::*;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn accessory(name: &str, latitude: f64, longitude: f64) -> AccessoryConfig {
    AccessoryConfig {
        name: name.to_string(),
        version: None,
        location: LocationConfig::Pair([latitude, longitude]),
        period: Some("sunset".to_string()),
        offset: None,
        enabled: Some(true),
    }
}

fn config_with(accessories: Vec<AccessoryConfig>) -> Config {
    Config {
        socket: None,
        state_dir: None,
        accessories,
    }
}

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("suncontact.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_config_load_default_creation() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("suncontact").join("suncontact.toml");

    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let result = Config::load(None);

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    let config = result.unwrap();
    assert!(config_path.exists());
    assert_eq!(config.accessories.len(), 1);
    assert_eq!(config.accessories[0].name, "Sunset");
    assert!(!config.accessories[0].enabled());
}

#[test]
fn test_custom_config_dir() {
    let temp_dir = tempdir().unwrap();
    let path = get_config_path(Some(temp_dir.path())).unwrap();
    assert_eq!(path, temp_dir.path().join("suncontact.toml"));

    let config = Config::load(Some(temp_dir.path())).unwrap();
    assert!(path.exists());
    assert_eq!(config.accessories[0].period_name(), "sunset");
}

#[test]
fn test_load_full_example() {
    let temp_dir = tempdir().unwrap();
    let path = write_config(
        temp_dir.path(),
        r#"
socket = "/tmp/suncontact-test.sock"
state_dir = "/tmp/suncontact-state"

[[accessory]]
name = "Sunset"
version = "2.1.0"
location = [52.52, 13.40]
period = "Sunset"
offset = -15
enabled = true

[[accessory]]
name = "Dawn"
location = { lat = -33.86, lng = 151.21 }
period = "dawn"
"#,
    );

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.socket_path(), PathBuf::from("/tmp/suncontact-test.sock"));
    assert_eq!(
        config.state_dir().unwrap(),
        PathBuf::from("/tmp/suncontact-state")
    );

    let sunset = config.find("Sunset").unwrap();
    assert_eq!(sunset.version(), "2.1.0");
    assert_eq!(sunset.location.latitude(), 52.52);
    assert_eq!(sunset.offset_minutes(), -15);
    assert!(sunset.enabled());

    let dawn = config.find("Dawn").unwrap();
    assert_eq!(dawn.location.longitude(), 151.21);
    assert_eq!(dawn.offset_minutes(), 0);
    assert!(!dawn.enabled());
    assert_eq!(dawn.version(), env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_location_table_spellings() {
    for location in [
        "{ latitude = 10.0, longitude = 20.0 }",
        "{ lat = 10.0, lon = 20.0 }",
        "{ lat = 10.0, lng = 20.0 }",
        "[10.0, 20.0]",
    ] {
        let temp_dir = tempdir().unwrap();
        let path = write_config(
            temp_dir.path(),
            &format!("[[accessory]]\nname = \"A\"\nlocation = {location}\n"),
        );

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.accessories[0].location.latitude(), 10.0);
        assert_eq!(config.accessories[0].location.longitude(), 20.0);
    }
}

#[test]
fn test_missing_file_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let result = Config::load_from_path(&temp_dir.path().join("absent.toml"));
    assert!(result.unwrap_err().to_string().contains("not found"));
}

#[test]
fn test_malformed_toml_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let path = write_config(temp_dir.path(), "[[accessory]\nname = ");
    assert!(Config::load_from_path(&path).is_err());
}

#[test]
fn test_config_validation_basic() {
    let config = config_with(vec![accessory("Sunset", 52.5, 13.4)]);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_config_validation_requires_accessories() {
    let err = validate_config(&config_with(Vec::new())).unwrap_err();
    assert!(err.to_string().contains("No accessories"));
}

#[test]
fn test_config_validation_rejects_bad_location() {
    let config = config_with(vec![accessory("North", 91.0, 0.0)]);
    assert!(validate_config(&config).is_err());

    let config = config_with(vec![accessory("East", 0.0, 180.5)]);
    assert!(validate_config(&config).is_err());

    let config = config_with(vec![accessory("Nowhere", f64::NAN, 0.0)]);
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_config_validation_duplicate_names() {
    let config = config_with(vec![
        accessory("Sunset", 0.0, 0.0),
        accessory("Sunset", 1.0, 1.0),
    ]);
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("more than once"));
}

#[test]
fn test_config_validation_state_file_collision() {
    let config = config_with(vec![
        accessory("Front door", 0.0, 0.0),
        accessory("front-door", 0.0, 0.0),
    ]);
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("front-door.json"));
}

#[test]
fn test_config_validation_empty_name() {
    let config = config_with(vec![accessory("   ", 0.0, 0.0)]);
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_unknown_period_and_huge_offset_only_warn() {
    let mut entry = accessory("Odd", 0.0, 0.0);
    entry.period = Some("elevenses".to_string());
    entry.offset = Some(20_000);
    assert!(validate_config(&config_with(vec![entry])).is_ok());
}

#[test]
fn test_missing_period_uses_first_catalog_entry() {
    let mut entry = accessory("Plain", 0.0, 0.0);
    entry.period = None;
    assert_eq!(entry.period_name(), "sunrise");
}

#[test]
fn test_tilde_expansion() {
    if let Some(home) = dirs::home_dir() {
        assert_eq!(
            expand_tilde(Path::new("~/state")),
            home.join("state")
        );
    }
    assert_eq!(
        expand_tilde(Path::new("/var/lib/x")),
        PathBuf::from("/var/lib/x")
    );
}
