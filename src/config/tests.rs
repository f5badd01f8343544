use super::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn config_file_persistence() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let config_path = temp_dir.path().join("config.toml");

    let original_config = Config {
        ollama: OllamaConfig {
            protocol: "https".to_string(),
            host: "test-host".to_string(),
            port: 8080,
            embedding_model: "test-embed".to_string(),
            generation_model: "test-gen".to_string(),
            embedding_dimension: 512,
            max_response_tokens: 256,
        },
        search: SearchConfig::default(),
        base_dir: temp_dir.path().to_path_buf(),
    };

    let toml_content = toml::to_string_pretty(&original_config)
        .expect("config should convert to toml string successfully");
    fs::write(&config_path, toml_content).expect("should write to config_path successfully");

    let content =
        fs::read_to_string(&config_path).expect("should read from config_path successfully");
    let mut loaded_config: Config = toml::from_str(&content).expect("should parse toml correctly");
    loaded_config.base_dir = temp_dir.path().to_path_buf();

    assert_eq!(original_config, loaded_config);
}

#[test]
fn invalid_toml_handling() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let config_path = temp_dir.path().join("config.toml");

    fs::write(&config_path, "this is not [valid toml").expect("should write file");

    assert!(Config::load(temp_dir.path()).is_err());
}
