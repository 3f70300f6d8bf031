//! Integration tests for songfinder-config: file-backed persistence of the
//! full parameter snapshot.

use songfinder_config::{BlobStore, ConfigError, FileBlobStore, STATE_KEY, StateCodec};
use songfinder_core::{GainSetting, ProcessingParameters, WindowKind};
use std::sync::Arc;
use tempfile::TempDir;

fn snapshot() -> ProcessingParameters {
    let mut params = ProcessingParameters {
        cutoff_hz: 2500,
        pitch_shift_divisor: 4,
        window_kind: WindowKind::SongFinder,
        window_size_ms: 12,
        app_gain_db: 7.5,
        balance_db: 3.0,
        ..ProcessingParameters::default()
    };
    for (name, setting) in [
        (
            "Built-In Microphone",
            GainSetting {
                input_gain_percent: Some(42.0),
                app_gain_db: 0.0,
            },
        ),
        (
            "Headset Microphone",
            GainSetting {
                input_gain_percent: None,
                app_gain_db: 10.0,
            },
        ),
        (
            "USB Audio \"Pro\" [2]",
            GainSetting {
                input_gain_percent: Some(100.0),
                app_gain_db: 5.0,
            },
        ),
    ] {
        params.per_port_gains.insert(name.to_string(), setting);
    }
    params
}

#[test]
fn file_roundtrip_preserves_every_field() {
    let dir = TempDir::new().unwrap();
    let codec = StateCodec::new(Arc::new(FileBlobStore::new(dir.path().join("state"))));

    codec.save(&snapshot()).unwrap();
    let loaded = codec.load().unwrap();

    assert_eq!(loaded, snapshot());
    assert_eq!(loaded.per_port_gains.len(), 3);
    assert_eq!(
        loaded.per_port_gains["Built-In Microphone"].input_gain_percent,
        Some(42.0)
    );
}

#[test]
fn saved_file_is_readable_toml() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileBlobStore::new(dir.path()));
    let codec = StateCodec::new(store.clone());
    codec.save(&snapshot()).unwrap();

    let path = store.location(STATE_KEY).unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("cutoff_hz = 2500"), "got: {text}");
    assert!(text.contains("window_kind = \"songfinder\""), "got: {text}");
    assert!(text.contains("Headset Microphone"), "got: {text}");
}

#[test]
fn overwrite_replaces_previous_snapshot() {
    let dir = TempDir::new().unwrap();
    let codec = StateCodec::new(Arc::new(FileBlobStore::new(dir.path())));
    codec.save(&snapshot()).unwrap();
    codec.save(&ProcessingParameters::default()).unwrap();
    assert_eq!(codec.load().unwrap(), ProcessingParameters::default());
}

#[test]
fn corrupted_file_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileBlobStore::new(dir.path()));
    store.write(STATE_KEY, b"[[[not toml").unwrap();
    let codec = StateCodec::new(store);
    assert!(matches!(codec.load(), Err(ConfigError::TomlParse(_))));
}

#[test]
fn reset_removes_snapshot() {
    let dir = TempDir::new().unwrap();
    let codec = StateCodec::new(Arc::new(FileBlobStore::new(dir.path())));
    codec.save(&snapshot()).unwrap();
    assert!(codec.reset().unwrap());
    assert!(!codec.reset().unwrap());
    assert_eq!(codec.load().unwrap(), ProcessingParameters::default());
}

#[test]
fn unwritable_location_is_reported() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "file, not a directory").unwrap();
    let codec = StateCodec::new(Arc::new(FileBlobStore::new(blocker.join("state"))));
    assert!(codec.save(&snapshot()).is_err());
}
