#[cfg(test)]
mod tests {
    use crate::cli::{AnalyzeArgs, Args, Command, HistoryAction, analysis_options};
    use crate::config::Config;
    use crate::history::ExportFormat;
    use crate::i18n::TargetLanguage;
    use clap::Parser;
    use std::path::PathBuf;

    fn analyze(args: &Args) -> &AnalyzeArgs {
        match &args.command {
            Command::Analyze(analyze) => analyze,
            other => panic!("expected analyze, got {:?}", other),
        }
    }

    #[test]
    fn test_analyze_default_values() {
        let args = Args::try_parse_from(["paper-insight", "analyze", "https://arxiv.org/abs/1512.03385"])
            .unwrap();

        assert!(args.config.is_none());
        assert!(!args.verbose);
        let analyze = analyze(&args);
        assert_eq!(analyze.source, "https://arxiv.org/abs/1512.03385");
        assert!(!analyze.full_translation);
        assert!(!analyze.vlm);
        assert!(!analyze.round_table);
        assert!(!analyze.stream);
        assert!(!analyze.no_history);
        assert!(analyze.output.is_none());
    }

    #[test]
    fn test_analyze_flags() {
        let args = Args::try_parse_from([
            "paper-insight",
            "analyze",
            "paper.pdf",
            "--full-translation",
            "--vlm",
            "--round-table",
            "--stream",
            "-o",
            "/tmp/report.md",
            "--no-history",
            "--target-language",
            "en",
            "-v",
        ])
        .unwrap();

        let analyze = analyze(&args);
        assert!(analyze.full_translation);
        assert!(analyze.vlm);
        assert!(analyze.round_table);
        assert!(analyze.stream);
        assert!(analyze.no_history);
        assert_eq!(analyze.output, Some(PathBuf::from("/tmp/report.md")));
        assert_eq!(analyze.target_language.as_deref(), Some("en"));
        assert!(args.verbose);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = Args::try_parse_from([
            "paper-insight",
            "history",
            "list",
            "-c",
            "custom.toml",
            "--history-dir",
            "/data/history",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(args.history_dir, Some(PathBuf::from("/data/history")));
        assert!(matches!(
            args.command,
            Command::History {
                action: HistoryAction::List
            }
        ));
    }

    #[test]
    fn test_other_subcommands() {
        let args = Args::try_parse_from(["paper-insight", "discuss", "abc", "--simple"]).unwrap();
        assert!(matches!(args.command, Command::Discuss { ref id, simple: true } if id == "abc"));

        let args = Args::try_parse_from(["paper-insight", "ask", "abc", "What is new?"]).unwrap();
        assert!(
            matches!(args.command, Command::Ask { ref question, .. } if question == "What is new?")
        );

        let args = Args::try_parse_from(["paper-insight", "history", "export", "abc"]).unwrap();
        assert!(matches!(
            args.command,
            Command::History {
                action: HistoryAction::Export {
                    format: ExportFormat::Markdown,
                    ..
                }
            }
        ));

        let args =
            Args::try_parse_from(["paper-insight", "history", "export", "abc", "--format", "json"])
                .unwrap();
        assert!(matches!(
            args.command,
            Command::History {
                action: HistoryAction::Export {
                    format: ExportFormat::Json,
                    ..
                }
            }
        ));

        assert!(Args::try_parse_from(["paper-insight", "history", "export", "abc", "--format", "pdf"]).is_err());
        assert!(Args::try_parse_from(["paper-insight"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::try_parse_from([
            "paper-insight",
            "analyze",
            "paper.pdf",
            "--round-table",
            "-o",
            "out.md",
            "--no-history",
            "--target-language",
            "ja",
            "--llm-provider",
            "deepseek",
            "--llm-model",
            "deepseek-chat",
            "--llm-api-key",
            "sk-cli",
            "--max-tokens",
            "4096",
        ])
        .unwrap();

        let mut base = Config::default();
        base.analysis.is_full_translation = true;
        let config = args.apply_to(base);

        assert_eq!(config.llm.provider, "deepseek");
        assert_eq!(config.llm.model, "deepseek-chat");
        assert_eq!(config.llm.api_key, "sk-cli");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.output_path, PathBuf::from("out.md"));
        assert!(!config.history.enabled);

        let options = analysis_options(&config);
        assert!(options.is_full_translation);
        assert!(options.enable_round_table);
        assert!(!options.use_vlm_parsing);
        assert_eq!(options.target_language, TargetLanguage::Japanese);
    }

    #[test]
    fn test_unknown_target_language_keeps_config_value() {
        let args = Args::try_parse_from([
            "paper-insight",
            "analyze",
            "paper.pdf",
            "--target-language",
            "klingon",
        ])
        .unwrap();

        let mut base = Config::default();
        base.analysis.target_language = TargetLanguage::German;
        let config = args.apply_to(base);

        assert_eq!(config.analysis.target_language, TargetLanguage::German);
    }

    #[test]
    fn test_non_analyze_commands_keep_analysis_defaults() {
        let args = Args::try_parse_from(["paper-insight", "history", "list"]).unwrap();
        let config = args.apply_to(Config::default());

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_explicit_config_file_is_loaded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[history]\ndata_dir = \"/srv/papers\"\n").unwrap();

        let args = Args::try_parse_from([
            "paper-insight",
            "history",
            "list",
            "-c",
            path.to_str().unwrap(),
        ])
        .unwrap();
        let config = args.into_config().unwrap();

        assert_eq!(config.history.data_dir, PathBuf::from("/srv/papers"));
    }

    #[test]
    fn test_missing_explicit_config_file_is_an_error() {
        let args = Args::try_parse_from([
            "paper-insight",
            "history",
            "list",
            "-c",
            "/nonexistent/paper-insight.toml",
        ])
        .unwrap();

        assert!(args.into_config().is_err());
    }
}
