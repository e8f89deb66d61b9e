use cityclicker_core::{
    engine::CityEngine,
    zone::ZoneType,
    CityConfig, CityError, CityState, EconomyConfig, SaveGateway,
};
use std::fs;
use tempfile::TempDir;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn gateway(dir: &TempDir) -> SaveGateway {
    SaveGateway::new(dir.path().join("save.json"))
}

/// A city that has been through every kind of action.
fn played_city() -> CityState {
    let config = CityConfig::standard();
    let mut start = CityState::new(&config.economy);
    start.treasury = 2_000.0;
    let mut engine = CityEngine::with_state(config, start);

    engine.zone(ZoneType::Residential).unwrap();
    engine.zone(ZoneType::Commercial).unwrap();
    engine.buy_upgrade("tax_hike_1").unwrap();
    engine.buy_upgrade("build_school").unwrap();
    engine.buy_upgrade("billboards").unwrap();
    engine.buy_upgrade("build_mall").unwrap();
    engine.buy_upgrade("city_charter").unwrap();
    engine.rename_city("Roundtripton").unwrap();
    engine.run_ticks(37);
    engine.snapshot().clone()
}

#[test]
fn load_after_save_returns_the_same_city() {
    init_logs();
    let dir = TempDir::new().unwrap();
    let gateway = gateway(&dir);
    let state = played_city();

    gateway.save(&state).unwrap();
    let loaded = gateway.load(&EconomyConfig::default()).unwrap();
    assert_eq!(loaded, state);
}

#[test]
fn fresh_city_round_trips() {
    let dir = TempDir::new().unwrap();
    let gateway = gateway(&dir);
    gateway.save(&CityState::default()).unwrap();
    assert_eq!(gateway.load(&EconomyConfig::default()).unwrap(), CityState::default());
}

#[test]
fn second_save_replaces_the_first() {
    let dir = TempDir::new().unwrap();
    let gateway = gateway(&dir);

    gateway.save(&CityState::default()).unwrap();
    let state = played_city();
    gateway.save(&state).unwrap();

    assert_eq!(gateway.load(&EconomyConfig::default()).unwrap(), state);
}

#[test]
fn missing_file_is_a_fresh_city() {
    let dir = TempDir::new().unwrap();
    let loaded = gateway(&dir).load(&EconomyConfig::default()).unwrap();
    assert_eq!(loaded, CityState::default());
}

#[test]
fn unparseable_file_is_corrupt() {
    init_logs();
    let dir = TempDir::new().unwrap();
    let gateway = gateway(&dir);
    fs::write(gateway.path(), "{ this is not json").unwrap();

    let err = gateway.load(&EconomyConfig::default()).unwrap_err();
    assert!(matches!(err, CityError::CorruptSave { .. }), "got {err:?}");
    assert_eq!(gateway.load_or_default(&EconomyConfig::default()), CityState::default());
}

#[test]
fn wrong_types_are_corrupt() {
    let dir = TempDir::new().unwrap();
    let gateway = gateway(&dir);
    fs::write(gateway.path(), r#"{"treasury": "lots"}"#).unwrap();

    assert!(matches!(
        gateway.load(&EconomyConfig::default()),
        Err(CityError::CorruptSave { .. })
    ));
}

#[test]
fn missing_fields_take_fresh_values_and_extras_are_ignored() {
    let dir = TempDir::new().unwrap();
    let gateway = gateway(&dir);
    fs::write(
        gateway.path(),
        r#"{
            "cityName": "Partial Falls",
            "treasury": 42.5,
            "zoneCounts": { "commercial": 3 },
            "ownedUpgrades": ["tax_hike_1"],
            "taxRate": 0.1,
            "weather": "sunny"
        }"#,
    )
    .unwrap();

    let loaded = gateway.load(&EconomyConfig::default()).unwrap();
    assert_eq!(loaded.city_name, "Partial Falls");
    assert_eq!(loaded.treasury, 42.5);
    assert_eq!(loaded.population, 0.0);
    assert_eq!(loaded.zone_counts.commercial, 3);
    assert_eq!(loaded.zone_counts.residential, 0);
    assert_eq!(loaded.demand.industrial, 50.0);
    assert!(loaded.owns("tax_hike_1"));
    assert_eq!(loaded.day, 0);
}

#[test]
fn out_of_range_values_are_clamped_on_load() {
    let dir = TempDir::new().unwrap();
    let gateway = gateway(&dir);
    fs::write(
        gateway.path(),
        r#"{"cityName": "   ", "treasury": -5, "demand": {"residential": 250, "industrial": -3}}"#,
    )
    .unwrap();

    let loaded = gateway.load(&EconomyConfig::default()).unwrap();
    assert_eq!(loaded.city_name, "The City");
    assert_eq!(loaded.treasury, 0.0);
    assert_eq!(loaded.demand.residential, 100.0);
    assert_eq!(loaded.demand.commercial, 50.0);
    assert_eq!(loaded.demand.industrial, 0.0);
}

#[test]
fn loaded_city_keeps_playing_where_it_left_off() {
    let dir = TempDir::new().unwrap();
    let gateway = gateway(&dir);
    let config = CityConfig::standard();

    let mut original = CityEngine::with_state(config.clone(), played_city());
    gateway.save(original.snapshot()).unwrap();

    let loaded = gateway.load(&config.economy).unwrap();
    let mut resumed = CityEngine::with_state(config, loaded);

    original.run_ticks(25);
    resumed.run_ticks(25);
    assert_eq!(original.snapshot(), resumed.snapshot());
}

#[test]
fn discard_removes_the_save_and_tolerates_absence() {
    let dir = TempDir::new().unwrap();
    let gateway = gateway(&dir);

    gateway.save(&played_city()).unwrap();
    assert!(gateway.path().exists());

    gateway.discard().unwrap();
    assert!(!gateway.path().exists());
    gateway.discard().unwrap();
    assert_eq!(gateway.load(&EconomyConfig::default()).unwrap(), CityState::default());
}

#[test]
fn save_creates_missing_directories() {
    let dir = TempDir::new().unwrap();
    let gateway = SaveGateway::new(dir.path().join("nested").join("slot1").join("city.json"));
    gateway.save(&CityState::default()).unwrap();
    assert!(gateway.path().exists());
}
