use clap::Parser;
use mantle_agent::config::{AppConfig, Cli};
use serial_test::serial;
use std::env;
use std::fs;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("MANTLE_SERVER__PORT");
        env::remove_var("MANTLE_STORAGE__DB_PATH");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
        env::remove_var("HOST");
        env::remove_var("MANTLE_DB_PATH");
    }
}

fn parse_cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(args.iter().copied()).expect("cli args should parse")
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let cli = parse_cli(&["mantle-agent"]);
    let config = AppConfig::load(&cli).expect("defaults should load");

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.storage.db_path, "mantle_agent_workflows.db");
    assert!(config.agent.show_tool_calls);
    assert_eq!(config.agent.search_max_results, 3);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("MANTLE_SERVER__PORT", "9090");
    }

    let cli = parse_cli(&["mantle-agent"]);
    let config = AppConfig::load(&cli).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_flag_beats_env() {
    clear_env_vars();
    unsafe {
        env::set_var("MANTLE_SERVER__PORT", "9090");
    }

    let cli = parse_cli(&["mantle-agent", "--port", "7171"]);
    let config = AppConfig::load(&cli).expect("Failed to load config");
    assert_eq!(config.server.port, 7171);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().expect("tempdir");
    let file_path = dir.path().join("test_config.yaml");
    fs::write(
        &file_path,
        "server:\n  port: 7070\nstorage:\n  db_path: from_file.db\n",
    )
    .expect("Failed to write temp config");

    let path = file_path.to_string_lossy().to_string();
    let cli = parse_cli(&["mantle-agent", "--config", &path]);
    let config = AppConfig::load(&cli).expect("Failed to load config from file");

    assert_eq!(config.server.port, 7070);
    assert_eq!(config.storage.db_path, "from_file.db");
}

#[test]
#[serial]
fn test_config_file_env_var() {
    clear_env_vars();

    let dir = tempfile::tempdir().expect("tempdir");
    let file_path = dir.path().join("env_config.yaml");
    fs::write(&file_path, "server:\n  port: 6060\n").expect("Failed to write temp config");

    unsafe {
        env::set_var("CONFIG_FILE", file_path.to_string_lossy().to_string());
    }

    let cli = parse_cli(&["mantle-agent"]);
    let config = AppConfig::load(&cli).expect("Failed to load config");
    assert_eq!(config.server.port, 6060);

    clear_env_vars();
}
