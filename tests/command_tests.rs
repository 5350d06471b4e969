//! Admin command unit tests

#[cfg(test)]
mod tests {
    use chunk_monitor::command::{execute, help_lines};
    use chunk_monitor::{AdminCommand, CommandError, CommandResponse, ConfigProvider};
    use tempfile::TempDir;

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parses_subcommands_with_optional_prefix() {
        assert_eq!("".parse::<AdminCommand>().unwrap(), AdminCommand::Help);
        assert_eq!("help".parse::<AdminCommand>().unwrap(), AdminCommand::Help);
        assert_eq!("cm".parse::<AdminCommand>().unwrap(), AdminCommand::Help);
        assert_eq!("reload".parse::<AdminCommand>().unwrap(), AdminCommand::Reload);
        assert_eq!("cm reload".parse::<AdminCommand>().unwrap(), AdminCommand::Reload);
        assert_eq!(
            "  ChunkMonitor RELOAD ".parse::<AdminCommand>().unwrap(),
            AdminCommand::Reload
        );
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert_eq!(
            "cm unload".parse::<AdminCommand>(),
            Err(CommandError::UnknownSubcommand("unload".into()))
        );
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    #[test]
    fn help_lists_reload() {
        let provider = ConfigProvider::in_memory(Default::default());
        let response = execute(AdminCommand::Help, &provider);
        assert_eq!(response, CommandResponse::Help(help_lines()));
        assert!(response.to_string().contains("reload"));
    }

    #[test]
    fn reload_reports_success_and_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let provider = ConfigProvider::load(&path).unwrap();

        let ok = execute(AdminCommand::Reload, &provider);
        assert_eq!(ok, CommandResponse::ReloadSucceeded);
        assert!(ok.is_success());

        std::fs::write(&path, "not json at all").unwrap();
        let failed = execute(AdminCommand::Reload, &provider);
        assert!(!failed.is_success());
        assert_eq!(failed.to_string(), "reload failed: invalid configuration");
    }
}
