#[cfg(test)]
mod tests {
    use crate::config::{Config, LLMConfig, RoleOverrides, SearchConfig};
    use crate::i18n::TargetLanguage;
    use crate::llm::ModelRole;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o");
        assert!(config.llm.api_key.is_empty());
        assert!(config.llm.api_base_url.is_none());
        assert_eq!(config.roles.get(ModelRole::Review), None);
        assert_eq!(config.search.configured_backends(), 0);
        assert!(config.history.enabled);
        assert_eq!(config.history.data_dir, PathBuf::from("history_data"));
        assert!(!config.analysis.is_full_translation);
        assert!(!config.analysis.use_vlm_parsing);
        assert!(!config.analysis.enable_round_table);
        assert_eq!(config.analysis.target_language, TargetLanguage::Chinese);
        assert_eq!(config.output_path, PathBuf::from("paper_analysis_report.md"));
        assert!(!config.verbose);
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("paper-insight.toml");

        let content = r#"output_path = "reports/latest.md"

[llm]
provider = "deepseek"
api_key = "sk-core"
model = "deepseek-reasoner"

[roles.translation]
provider = "openai-compatible"
api_key = "sk-translate"
api_base_url = "http://localhost:8000/v1"
model = "qwen-mt"

[search]
tavily_api_key = "tvly-key"
results_per_query = 5

[history]
enabled = false

[analysis]
enable_round_table = true
target_language = "en"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.llm.provider, "deepseek");
        assert_eq!(config.llm.model, "deepseek-reasoner");
        assert_eq!(config.llm.max_tokens, LLMConfig::default().max_tokens);

        let translation = config.roles.get(ModelRole::Translation).unwrap();
        assert_eq!(translation.model, "qwen-mt");
        assert_eq!(
            translation.api_base_url.as_deref(),
            Some("http://localhost:8000/v1")
        );
        assert!(config.roles.get(ModelRole::RelatedWork).is_none());

        assert_eq!(config.search.configured_backends(), 1);
        assert_eq!(config.search.results_per_query, 5);
        assert_eq!(config.search.timeout_seconds, 30);
        assert!(!config.history.enabled);
        assert_eq!(config.history.data_dir, PathBuf::from("history_data"));
        assert!(config.analysis.enable_round_table);
        assert_eq!(config.analysis.target_language, TargetLanguage::English);
        assert_eq!(config.output_path, PathBuf::from("reports/latest.md"));
    }

    #[test]
    fn test_from_file_errors() {
        assert!(Config::from_file(&PathBuf::from("/nonexistent/config.toml")).is_err());

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "[llm\nprovider = ").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_core_env_overrides() {
        let config = Config::default().with_overrides_from(lookup(&[
            ("LLM_PROVIDER", "anthropic"),
            ("LLM_API_KEY", "sk-ant"),
            ("LLM_MODEL", "claude-sonnet"),
            ("LLM_API_BASE_URL", "https://proxy.example.com"),
        ]));

        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.api_key, "sk-ant");
        assert_eq!(config.llm.model, "claude-sonnet");
        assert_eq!(
            config.llm.api_base_url.as_deref(),
            Some("https://proxy.example.com")
        );
        assert_eq!(config.roles, RoleOverrides::default());
    }

    #[test]
    fn test_role_env_overrides() {
        let config = Config::default().with_overrides_from(lookup(&[
            ("TRANSLATION_LLM_PROVIDER", "deepseek"),
            ("TRANSLATION_LLM_MODEL", "deepseek-chat"),
            ("REVIEW_LLM_PROVIDER", "moonshot"),
            ("VLM_LLM_PROVIDER", "gemini"),
            ("VLM_LLM_MODEL", "gemini-2.0-flash"),
        ]));

        let translation = config.roles.get(ModelRole::Translation).unwrap();
        assert_eq!(translation.provider, "deepseek");
        assert_eq!(translation.model, "deepseek-chat");

        let review = config.roles.get(ModelRole::Review).unwrap();
        assert_eq!(review.provider, "moonshot");
        assert!(review.model.is_empty());

        assert_eq!(
            config.roles.get(ModelRole::Vision).unwrap().model,
            "gemini-2.0-flash"
        );
        assert!(config.roles.get(ModelRole::RelatedWork).is_none());
        assert_eq!(config.llm, LLMConfig::default());
    }

    #[test]
    fn test_role_env_updates_file_role() {
        let mut base = Config::default();
        base.roles.related_work = Some(LLMConfig {
            provider: "openai".to_string(),
            api_key: "sk-file".to_string(),
            api_base_url: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
        });

        let config = base.with_overrides_from(lookup(&[("RELATED_WORK_LLM_API_KEY", "sk-env")]));

        let related = config.roles.get(ModelRole::RelatedWork).unwrap();
        assert_eq!(related.api_key, "sk-env");
        assert_eq!(related.model, "gpt-4o-mini");
        assert_eq!(related.max_tokens, 4096);
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = Config::default().with_overrides_from(lookup(&[
            ("LLM_PROVIDER", "   "),
            ("TRANSLATION_LLM_PROVIDER", ""),
            ("EXA_API_KEY", " "),
        ]));

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_search_env_overrides() {
        let config = Config::default().with_overrides_from(lookup(&[
            ("EXA_API_KEY", "exa"),
            ("TAVILY_API_KEY", "tvly"),
            ("SERPAPI_API_KEY", "serp"),
        ]));

        assert_eq!(config.search.exa_api_key.as_deref(), Some("exa"));
        assert_eq!(config.search.tavily_api_key.as_deref(), Some("tvly"));
        assert_eq!(config.search.serpapi_api_key.as_deref(), Some("serp"));
        assert_eq!(config.search.configured_backends(), 3);
    }

    #[test]
    fn test_configured_backends_skips_blank_keys() {
        let search = SearchConfig {
            exa_api_key: Some("  ".to_string()),
            tavily_api_key: Some("tvly".to_string()),
            ..SearchConfig::default()
        };

        assert_eq!(search.configured_backends(), 1);
    }

    #[test]
    fn test_is_configured() {
        assert!(LLMConfig::default().is_configured());
        assert!(!LLMConfig::unset().is_configured());

        let mut config = LLMConfig::default();
        config.provider = "NONE".to_string();
        assert!(!config.is_configured());
        config.provider = " ".to_string();
        assert!(!config.is_configured());
    }
}
