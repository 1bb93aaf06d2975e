//! Fuzz target: `SettingsStore::load`
//!
//! Writes arbitrary bytes as the settings file and loads it. Loading must
//! never panic, and whatever it accepts must stay inside the valid ranges.
//!
//! cargo fuzz run fuzz_settings_file

#![no_main]

use libfuzzer_sys::fuzz_target;
use sprayctl::settings::{
    BRIGHTNESS_MAX, SPRAY_DURATION_RANGE, SPRAY_INTERVAL_RANGE, SettingsStore, TRIGGER_TEMP_RANGE,
};

fuzz_target!(|data: &[u8]| {
    let path = std::env::temp_dir().join(format!("sprayctl-fuzz-{}.txt", std::process::id()));
    if std::fs::write(&path, data).is_err() {
        return;
    }
    let mut store = SettingsStore::new(&path);
    let _ = store.load();

    let s = store.get_current();
    assert!(TRIGGER_TEMP_RANGE.contains(&s.trigger_temp()));
    assert!(SPRAY_DURATION_RANGE.contains(&s.spray_duration()));
    assert!(SPRAY_INTERVAL_RANGE.contains(&s.spray_interval()));
    assert!(s.brightness() <= BRIGHTNESS_MAX);
});
