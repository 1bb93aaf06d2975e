//! Integration tests: settings persistence, config overrides and log
//! rotation on a host directory standing in for the SD card.

use std::fs;
use std::path::Path;

use log::{Level, LevelFilter, Log, Metadata, Record};

use sprayctl::adapters::log_sink::TeeLogger;
use sprayctl::config::SystemConfig;
use sprayctl::settings::{LoadStatus, Settings, SettingsStore};
use sprayctl::storage::log_rotator::{LogRotator, RotatorConfig, list_logs, log_file_name};

use crate::mock_ui::temp_dir;

/// Console stand-in that discards everything.
struct NullConsole;

impl Log for NullConsole {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }
    fn log(&self, _: &Record<'_>) {}
    fn flush(&self) {}
}

fn leaked_tee() -> &'static TeeLogger {
    Box::leak(Box::new(TeeLogger::new(Box::new(NullConsole), LevelFilter::Info, 512)))
}

fn rotator_config(dir: &Path, max_files: usize) -> RotatorConfig {
    RotatorConfig {
        dir: dir.to_path_buf(),
        prefix: "L".to_string(),
        max_files,
        sync_interval_ms: 20,
    }
}

fn emit(tee: &TeeLogger, msg: &str) {
    tee.log(
        &Record::builder()
            .level(Level::Info)
            .target("storage_tests")
            .args(format_args!("{msg}"))
            .build(),
    );
}

// ── Settings ──────────────────────────────────────────────────

#[test]
fn settings_survive_a_save_and_reload() {
    let dir = temp_dir("settings-roundtrip");
    let path = dir.join("system").join("SETTINGS.TXT");

    let mut store = SettingsStore::new(&path);
    {
        let s = store.current_mut();
        s.set_trigger_temp(55);
        s.set_spray_duration(3.5);
        s.set_spray_interval(20);
        s.set_brightness(25);
    }
    store.save().unwrap();

    let mut reloaded = SettingsStore::new(&path);
    assert_eq!(reloaded.load().unwrap(), LoadStatus::Loaded { applied: 4, rejected: 0 });
    assert_eq!(reloaded.get_current(), store.get_current());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn out_of_range_values_on_the_card_are_ignored() {
    let dir = temp_dir("settings-range");
    let path = dir.join("SETTINGS.TXT");
    fs::write(
        &path,
        "# edited by hand\ntrigger_temp=90\nspray_duration=0.5\nspray_interval=4\nbrightness=101\nnoise\n",
    )
    .unwrap();

    let mut store = SettingsStore::new(&path);
    assert_eq!(store.load().unwrap(), LoadStatus::Loaded { applied: 1, rejected: 3 });
    let s = store.get_current();
    let d = Settings::default();
    assert_eq!(s.trigger_temp(), d.trigger_temp());
    assert!((s.spray_duration() - 0.5).abs() < f32::EPSILON);
    assert_eq!(s.spray_interval(), d.spray_interval());
    assert_eq!(s.brightness(), d.brightness());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn missing_settings_file_keeps_defaults() {
    let dir = temp_dir("settings-missing");
    let mut store = SettingsStore::new(dir.join("SETTINGS.TXT"));
    assert_eq!(store.load().unwrap(), LoadStatus::NotFound);
    assert_eq!(store.get_current(), Settings::default());
    let _ = fs::remove_dir_all(dir);
}

// ── Config overrides ──────────────────────────────────────────

#[test]
fn config_override_file_replaces_selected_fields() {
    let root = temp_dir("config");
    fs::create_dir_all(root.join("system")).unwrap();
    fs::write(
        root.join("system").join("CONFIG.JSN"),
        r#"{ "nav_cooldown_ms": 250, "log_max_files": 3 }"#,
    )
    .unwrap();

    let cfg = SystemConfig::load_or_default(&root);
    assert_eq!(cfg.nav_cooldown_ms, 250);
    assert_eq!(cfg.log_max_files, 3);
    assert_eq!(cfg.inactivity_timeout_ms, SystemConfig::default().inactivity_timeout_ms);
    assert_eq!(cfg.settings_path(), root.join("system").join("SETTINGS.TXT"));
    let _ = fs::remove_dir_all(root);
}

// ── Log rotation ──────────────────────────────────────────────

#[test]
fn init_on_an_empty_card_starts_at_one() {
    let dir = temp_dir("logs-empty").join("system").join("logs");
    let tee = leaked_tee();
    let rotator = LogRotator::init(&rotator_config(&dir, 5), tee).unwrap();
    assert_eq!(rotator.seq(), 1);
    assert_eq!(rotator.path(), dir.join("L00001.txt"));
    assert!(tee.has_file());

    let text = fs::read_to_string(rotator.path()).unwrap();
    assert_eq!(text, "=== Log #1 started ===\n");
    rotator.deinit().unwrap();
    assert!(!tee.has_file());
}

#[test]
fn rotation_keeps_the_newest_files_and_continues_the_sequence() {
    let dir = temp_dir("logs-rotate");
    for seq in 3..=10 {
        fs::write(dir.join(log_file_name("L", seq)), format!("old {seq}\n")).unwrap();
    }
    fs::write(dir.join("notes.txt"), "keep me").unwrap();
    fs::write(dir.join("L00002.bak"), "keep me too").unwrap();

    let rotator = LogRotator::init(&rotator_config(&dir, 5), leaked_tee()).unwrap();
    assert_eq!(rotator.seq(), 11);

    let remaining = list_logs(&dir, "L").unwrap();
    assert_eq!(
        remaining,
        ["L00007.txt", "L00008.txt", "L00009.txt", "L00010.txt", "L00011.txt"]
    );
    assert!(dir.join("notes.txt").exists());
    assert!(dir.join("L00002.bak").exists());
    rotator.deinit().unwrap();
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn each_boot_opens_a_new_file() {
    let dir = temp_dir("logs-reboot");
    let tee = leaked_tee();
    let mut seen = Vec::new();
    for _ in 0..7 {
        let rotator = LogRotator::init(&rotator_config(&dir, 5), tee).unwrap();
        seen.push(rotator.seq());
        rotator.deinit().unwrap();
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(list_logs(&dir, "L").unwrap().len(), 5);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn records_reach_the_file_after_flush() {
    let dir = temp_dir("logs-flush");
    let tee = leaked_tee();
    let rotator = LogRotator::init(&rotator_config(&dir, 5), tee).unwrap();

    emit(tee, "spray cycle armed");
    rotator.flush().unwrap();

    let text = fs::read_to_string(rotator.path()).unwrap();
    let last = text.lines().last().unwrap();
    assert!(last.starts_with("I ("), "{last}");
    assert!(last.ends_with("storage_tests: spray cycle armed"), "{last}");
    assert_eq!(rotator.sink().dropped_lines(), 0);

    let path = rotator.path().to_path_buf();
    rotator.deinit().unwrap();
    emit(tee, "after deinit");
    assert_eq!(fs::read_to_string(path).unwrap(), text);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn init_fails_cleanly_when_the_card_is_not_writable() {
    let dir = temp_dir("logs-blocked");
    let blocker = dir.join("system");
    fs::write(&blocker, b"file, not a directory").unwrap();
    let tee = leaked_tee();
    assert!(LogRotator::init(&rotator_config(&blocker.join("logs"), 5), tee).is_err());
    assert!(!tee.has_file());
    let _ = fs::remove_dir_all(dir);
}
