use crate::adapters::llm::ModelConfig;
use crate::core::chunker::DEFAULT_MAX_CHUNK_CHARS;
use crate::core::filter::{ExclusionSet, DEFAULT_EXCLUDED_EXTENSIONS};
use crate::core::prompt::{PromptConfig, ReviewPromptBuilder};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENV_FILE: &str = "local.env";

const GITHUB_TOKEN_KEYS: &[&str] = &["GITHUB_API_KEY", "GITHUB_TOKEN"];
const OPENAI_KEY_KEYS: &[&str] = &["OPEN_AI_API_KEY", "OPENAI_API_KEY"];
const GITHUB_API_URL_KEYS: &[&str] = &["GITHUB_API_URL"];
const OPENAI_BASE_URL_KEYS: &[&str] = &["OPENAI_BASE_URL"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    #[serde(default = "default_exclude_extensions")]
    pub exclude_extensions: Vec<String>,

    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    pub review_prompt: Option<String>,

    pub github_token: Option<String>,
    pub openai_api_key: Option<String>,
    pub github_api_url: Option<String>,
    pub openai_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_chunk_chars: default_max_chunk_chars(),
            exclude_extensions: default_exclude_extensions(),
            temperature: None,
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
            review_prompt: None,
            github_token: None,
            openai_api_key: None,
            github_api_url: None,
            openai_base_url: None,
        }
    }
}

impl Config {
    /// Builds the effective configuration: YAML file, then the env file,
    /// then the process environment. The process environment is only read.
    pub fn resolve(config_path: Option<&Path>, env_file: &Path) -> Result<Self> {
        let process_vars: HashMap<String, String> = std::env::vars().collect();
        Self::resolve_with(config_path, env_file, &process_vars)
    }

    fn resolve_with(
        config_path: Option<&Path>,
        env_file: &Path,
        process_vars: &HashMap<String, String>,
    ) -> Result<Self> {
        let mut config = Self::load(config_path)?;
        let file_vars = read_env_file(env_file)?;
        config.apply_env(&file_vars);
        config.apply_env(process_vars);
        Ok(config)
    }

    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::from_yaml_file(path);
        }

        for candidate in [".prscope.yml", ".prscope.yaml"] {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Self::from_yaml_file(&path);
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".prscope.yml");
            if home_config.exists() {
                return Self::from_yaml_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Overlays recognized keys from `vars`; empty values are ignored.
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) {
        let lookup = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| vars.get(*key))
                .map(|value| value.trim())
                .find(|value| !value.is_empty())
                .map(str::to_string)
        };

        if let Some(token) = lookup(GITHUB_TOKEN_KEYS) {
            self.github_token = Some(token);
        }
        if let Some(key) = lookup(OPENAI_KEY_KEYS) {
            self.openai_api_key = Some(key);
        }
        if let Some(url) = lookup(GITHUB_API_URL_KEYS) {
            self.github_api_url = Some(url);
        }
        if let Some(url) = lookup(OPENAI_BASE_URL_KEYS) {
            self.openai_base_url = Some(url);
        }
    }

    pub fn merge_with_cli(
        &mut self,
        cli_model: Option<String>,
        cli_max_chars: Option<usize>,
        cli_exclude: Vec<String>,
    ) {
        if let Some(model) = cli_model {
            self.model = model;
        }
        if let Some(max_chars) = cli_max_chars {
            self.max_chunk_chars = max_chars;
        }
        if !cli_exclude.is_empty() {
            self.exclude_extensions = cli_exclude;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_chars == 0 {
            anyhow::bail!("max_chunk_chars must be greater than zero");
        }
        if self.model.trim().is_empty() {
            anyhow::bail!("model must not be empty");
        }
        Ok(())
    }

    pub fn exclusion_set(&self) -> ExclusionSet {
        ExclusionSet::new(&self.exclude_extensions)
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model_name: self.model.clone(),
            api_key: self.openai_api_key.clone(),
            base_url: self.openai_base_url.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout_secs,
        }
    }

    pub fn prompt_builder(&self) -> ReviewPromptBuilder {
        match &self.review_prompt {
            Some(template) => ReviewPromptBuilder::new(PromptConfig {
                user_prompt_template: template.clone(),
            }),
            None => ReviewPromptBuilder::default(),
        }
    }
}

/// Reads `KEY=VALUE` pairs from an env file. A missing file yields no pairs.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let mut vars = HashMap::new();
    let entries = dotenvy::from_path_iter(path)
        .with_context(|| format!("Failed to open env file {}", path.display()))?;
    for entry in entries {
        let (key, value) =
            entry.with_context(|| format!("Failed to parse env file {}", path.display()))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}

fn default_exclude_extensions() -> Vec<String> {
    DEFAULT_EXCLUDED_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_timeout_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.max_chunk_chars, 24_000);
        assert_eq!(config.exclude_extensions, vec![".ipynb", ".md", ".lock"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model: gpt-4o\nexclude_extensions: [\".json\"]\ntemperature: 0.1").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.exclude_extensions, vec![".json"]);
        assert_eq!(config.temperature, Some(0.1));
        assert_eq!(config.max_chunk_chars, 24_000);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.yml"))).is_err());
    }

    #[test]
    fn test_env_overrides_and_fallback_keys() {
        let mut config = Config {
            github_token: Some("from-yaml".to_string()),
            ..Config::default()
        };
        config.apply_env(&vars(&[
            ("GITHUB_TOKEN", "ghp_fallback"),
            ("OPENAI_API_KEY", "sk-fallback"),
            ("OPEN_AI_API_KEY", "sk-primary"),
            ("OPENAI_BASE_URL", "  "),
        ]));

        assert_eq!(config.github_token.as_deref(), Some("ghp_fallback"));
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-primary"));
        assert_eq!(config.openai_base_url, None);
    }

    #[test]
    fn test_env_file_is_read_without_touching_process_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.env");
        std::fs::write(
            &path,
            "# credentials\nGITHUB_API_KEY=ghp_file\nPRSCOPE_TEST_ONLY_KEY=\"quoted value\"\n",
        )
        .unwrap();

        let file_vars = read_env_file(&path).unwrap();
        assert_eq!(file_vars.get("GITHUB_API_KEY").map(String::as_str), Some("ghp_file"));
        assert_eq!(
            file_vars.get("PRSCOPE_TEST_ONLY_KEY").map(String::as_str),
            Some("quoted value")
        );
        assert!(std::env::var("PRSCOPE_TEST_ONLY_KEY").is_err());
    }

    #[test]
    fn test_missing_env_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_env_file(&dir.path().join("local.env")).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("prscope.yml");
        std::fs::write(&config_path, "model: gpt-4\n").unwrap();
        let env_path = dir.path().join("local.env");
        std::fs::write(&env_path, "GITHUB_API_KEY=x\nthis is not valid\n").unwrap();

        assert!(read_env_file(&env_path).is_err());
        let err = Config::resolve(Some(&config_path), &env_path).unwrap_err();
        assert!(format!("{:#}", err).contains("local.env"));
    }

    #[test]
    fn test_process_env_beats_env_file_beats_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("prscope.yml");
        std::fs::write(
            &config_path,
            "github_token: ghp_yaml\nopenai_api_key: sk-yaml\ngithub_api_url: https://ghe.yaml/api/v3\n",
        )
        .unwrap();
        let env_path = dir.path().join("local.env");
        std::fs::write(&env_path, "GITHUB_API_KEY=ghp_file\nOPEN_AI_API_KEY=sk-file\n").unwrap();

        let config = Config::resolve_with(
            Some(&config_path),
            &env_path,
            &vars(&[("OPEN_AI_API_KEY", "sk-process")]),
        )
        .unwrap();

        assert_eq!(config.github_api_url.as_deref(), Some("https://ghe.yaml/api/v3"));
        assert_eq!(config.github_token.as_deref(), Some("ghp_file"));
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-process"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();
        config.merge_with_cli(Some("gpt-4o-mini".to_string()), Some(500), vec!["rs".to_string()]);

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_chunk_chars, 500);
        assert_eq!(config.exclusion_set().extensions(), &[".rs".to_string()]);

        config.merge_with_cli(None, None, Vec::new());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.exclude_extensions, vec!["rs"]);
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = Config {
            max_chunk_chars: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_model_config_carries_credentials() {
        let config = Config {
            openai_api_key: Some("sk-x".to_string()),
            timeout_secs: 5,
            ..Config::default()
        };
        let model = config.model_config();
        assert_eq!(model.model_name, "gpt-4");
        assert_eq!(model.api_key.as_deref(), Some("sk-x"));
        assert_eq!(model.timeout_secs, 5);
    }
}
