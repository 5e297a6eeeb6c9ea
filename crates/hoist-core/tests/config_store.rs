use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use hoist_core::config::paths::config_path_for_scope;
use hoist_core::config::{ConfigFile, ConfigScope, ConfigStore, SignerSection, load_layered};
use hoist_core::ledger::Network;
use hoist_core::signer::SignerKind;

#[test]
fn scopes_resolve_to_hoist_toml() {
    let global_dir = PathBuf::from("/tmp/hoist-config");
    let project_root = PathBuf::from("/workspace/arca");

    assert_eq!(
        config_path_for_scope(ConfigScope::Global, &global_dir, &project_root),
        PathBuf::from("/tmp/hoist-config/hoist.toml")
    );
    assert_eq!(
        config_path_for_scope(ConfigScope::Project, &global_dir, &project_root),
        PathBuf::from("/workspace/arca/hoist.toml")
    );
}

#[test]
fn load_missing_returns_empty_config() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_paths(
        ConfigScope::Global,
        &temp.path().join("config"),
        &temp.path().join("project"),
    );

    assert_eq!(store.load().unwrap(), ConfigFile::new());
}

#[test]
fn project_store_loads_written_file() {
    let temp = TempDir::new().unwrap();
    let project_root = temp.path().join("project");
    std::fs::create_dir_all(&project_root).unwrap();
    std::fs::write(
        project_root.join("hoist.toml"),
        "network = \"testnet\"\ngas_budget = 100000000\nbuild_dir = \"/var/tmp/hoist\"\n\n[signer]\nkind = \"hardware\"\nsecret_key = \"c2VjcmV0\"\ntimeout_secs = 90\n",
    )
    .unwrap();
    let store = ConfigStore::from_paths(ConfigScope::Project, &temp.path().join("config"), &project_root);

    let loaded = store.load().unwrap();

    assert_eq!(store.scope(), ConfigScope::Project);
    assert_eq!(loaded.network, Some(Network::Testnet));
    assert_eq!(loaded.gas_budget, Some(100_000_000));
    assert_eq!(loaded.build_dir, Some(PathBuf::from("/var/tmp/hoist")));
    assert_eq!(
        loaded.signer,
        SignerSection {
            kind: Some(SignerKind::Hardware),
            secret_key: Some(hoist_core::config::SecretText::new("c2VjcmV0")),
            timeout_secs: Some(90),
            ..Default::default()
        }
    );
    assert!(!format!("{loaded:?}").contains("c2VjcmV0"));
}

#[test]
fn project_config_overrides_global() {
    let temp = TempDir::new().unwrap();
    let global_dir = temp.path().join("config");
    let project_root = temp.path().join("project");
    std::fs::create_dir_all(&global_dir).unwrap();
    std::fs::create_dir_all(&project_root).unwrap();

    std::fs::write(
        global_dir.join("hoist.toml"),
        "network = \"testnet\"\ngas_budget = 42\n\n[signer]\ntimeout_secs = 30\n",
    )
    .unwrap();
    std::fs::write(
        project_root.join("hoist.toml"),
        "network = \"mainnet\"\ncompiler = \"cargo run --bin sui\"\n",
    )
    .unwrap();

    let config = load_layered(&global_dir, &project_root, None).unwrap();

    assert_eq!(config.network, Network::Mainnet);
    assert_eq!(config.gas_budget, 42);
    assert_eq!(config.compiler, "cargo run --bin sui");
    assert_eq!(config.signer.timeout, Duration::from_secs(30));
    assert_eq!(config.signer_kind(false), SignerKind::Hardware);
}

#[test]
fn explicit_config_file_replaces_project_file() {
    let temp = TempDir::new().unwrap();
    let project_root = temp.path().join("project");
    std::fs::create_dir_all(&project_root).unwrap();
    std::fs::write(project_root.join("hoist.toml"), "network = \"mainnet\"\n").unwrap();
    let explicit = temp.path().join("ci.toml");
    std::fs::write(&explicit, "network = \"devnet\"\n").unwrap();

    let config = load_layered(&temp.path().join("config"), &project_root, Some(&explicit)).unwrap();

    assert_eq!(config.network, Network::Devnet);
}

#[test]
fn missing_explicit_config_is_an_error() {
    let temp = TempDir::new().unwrap();
    let result = load_layered(
        &temp.path().join("config"),
        temp.path(),
        Some(&temp.path().join("absent.toml")),
    );
    assert!(result.is_err());
}

#[test]
fn unknown_keys_are_rejected_with_location() {
    let temp = TempDir::new().unwrap();
    let project_root = temp.path().to_path_buf();
    std::fs::write(project_root.join("hoist.toml"), "network = \"devnet\"\ngas = 1\n").unwrap();

    let err = load_layered(&temp.path().join("config"), &project_root, None).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("gas"), "{message}");
    assert!(message.contains("line 2"), "{message}");
}
