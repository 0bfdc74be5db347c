//! Interface de linha de comando do jobreplay baseada em clap.
//!
//! Define a struct [`Cli`]: caminhos de registros de job posicionais e
//! flags (--debug, --config, --output-dir, --abort, --list-plugins).

use std::path::PathBuf;

use clap::Parser;

/// jobreplay: reexecuta jobs gravados contra um plugin, fase a fase.
#[derive(Debug, Parser)]
#[command(name = "jobreplay", version, about)]
pub struct Cli {
    /// Caminhos para os registros de job (JSON).
    #[arg(required_unless_present = "list_plugins")]
    pub jobs: Vec<PathBuf>,

    /// Aumenta a verbosidade do log para debug.
    #[arg(long, short, default_value_t = false)]
    pub debug: bool,

    /// Arquivo de configuração (padrão: ./jobreplay.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Diretório onde os relatórios de job são gravados.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Executa a fase abort em vez da sequência setup/process/teardown.
    #[arg(long, default_value_t = false)]
    pub abort: bool,

    /// Lista os plugins registrados.
    #[arg(long, default_value_t = false)]
    pub list_plugins: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_job_paths() {
        let cli = Cli::parse_from(["jobreplay", "a.json", "b/c.json"]);
        assert_eq!(
            cli.jobs,
            vec![PathBuf::from("a.json"), PathBuf::from("b/c.json")]
        );
        assert!(!cli.debug);
        assert!(!cli.abort);
        assert!(cli.config.is_none());
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from([
            "jobreplay",
            "-d",
            "--config",
            "custom.toml",
            "--output-dir",
            "out",
            "--abort",
            "job.json",
        ]);
        assert!(cli.debug);
        assert!(cli.abort);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.jobs, vec![PathBuf::from("job.json")]);
    }

    #[test]
    fn cli_requires_a_job() {
        assert!(Cli::try_parse_from(["jobreplay"]).is_err());
    }

    #[test]
    fn cli_list_plugins_without_jobs() {
        let cli = Cli::parse_from(["jobreplay", "--list-plugins"]);
        assert!(cli.list_plugins);
        assert!(cli.jobs.is_empty());
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
