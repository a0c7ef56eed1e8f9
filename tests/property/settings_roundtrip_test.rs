//! Property-based tests for AppSettings persistence.
//!
//! Arbitrary settings survive JSON serialization, and values written through
//! the settings engine are read back unchanged by a fresh engine.

use gemmarks::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use gemmarks::types::settings::{AppSettings, BookmarkSettings, LoggingSettings, NetworkSettings};
use proptest::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn arb_bookmark_settings() -> impl Strategy<Value = BookmarkSettings> {
    (any::<bool>(), any::<bool>()).prop_map(|(add_to_bottom, refresh_on_startup)| {
        BookmarkSettings {
            add_to_bottom,
            refresh_on_startup,
        }
    })
}

fn arb_network_settings() -> impl Strategy<Value = NetworkSettings> {
    (0u64..3600, 1usize..64 * 1024 * 1024, "[a-zA-Z0-9/. ()-]{1,40}").prop_map(
        |(request_timeout_secs, max_response_bytes, user_agent)| NetworkSettings {
            request_timeout_secs,
            max_response_bytes,
            user_agent,
        },
    )
}

fn arb_logging_settings() -> impl Strategy<Value = LoggingSettings> {
    prop_oneof![
        Just("error"),
        Just("warn"),
        Just("info"),
        Just("debug"),
        Just("gemmarks=trace"),
    ]
    .prop_map(|level| LoggingSettings {
        level: level.to_string(),
    })
}

fn arb_app_settings() -> impl Strategy<Value = AppSettings> {
    (arb_bookmark_settings(), arb_network_settings(), arb_logging_settings()).prop_map(
        |(bookmarks, network, logging)| AppSettings {
            bookmarks,
            network,
            logging,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn settings_json_roundtrip(settings in arb_app_settings()) {
        let json = serde_json::to_string(&settings).expect("serialize");
        let restored: AppSettings = serde_json::from_str(&json).expect("deserialize");
        prop_assert_eq!(restored, settings);
    }

    #[test]
    fn set_value_survives_reload(
        timeout in 0u64..3600,
        add_to_bottom in any::<bool>(),
        agent in "[a-z]{1,12}/[0-9]\\.[0-9]",
    ) {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("settings.json").to_string_lossy().to_string();

        let mut engine = SettingsEngine::new(Some(path.clone()));
        engine.load().expect("load defaults");
        engine.set_value("network.request_timeout_secs", json!(timeout)).expect("set timeout");
        engine.set_value("bookmarks.add_to_bottom", json!(add_to_bottom)).expect("set placement");
        engine.set_value("network.user_agent", json!(agent.clone())).expect("set agent");

        let mut reloaded = SettingsEngine::new(Some(path));
        let settings = reloaded.load().expect("reload");
        prop_assert_eq!(settings.network.request_timeout_secs, timeout);
        prop_assert_eq!(settings.bookmarks.add_to_bottom, add_to_bottom);
        prop_assert_eq!(settings.network.user_agent, agent);
        prop_assert_eq!(settings.logging, LoggingSettings::default());
    }
}
