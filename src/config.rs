//! Configuração do jobreplay carregada a partir de `jobreplay.toml`.
//!
//! A struct [`HarnessConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `JOBREPLAY_OUTPUT_DIR` tem precedência sobre o arquivo.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::HarnessError;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "jobreplay.toml";

/// Variável de ambiente que sobrescreve `output_dir`.
pub const OUTPUT_DIR_ENV: &str = "JOBREPLAY_OUTPUT_DIR";

/// Configuração de nível superior carregada de `jobreplay.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessConfig {
    /// Nível de log padrão quando `RUST_LOG` não está definido.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Diretório onde os relatórios de job são gravados (opcional).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Imprime a saída dos plugins formatada (pretty-print).
    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Imprime a tabela de estatísticas ao final do lote.
    #[serde(default = "default_true")]
    pub statistics: bool,
}

// Valor padrão para o nível de log: "info".
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            output_dir: None,
            pretty: true,
            statistics: true,
        }
    }
}

impl HarnessConfig {
    /// Carrega a configuração de `jobreplay.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::parse_file(path)?
        } else {
            Self::default()
        };
        config.apply_env(std::env::var(OUTPUT_DIR_ENV).ok());
        Ok(config)
    }

    /// Carrega a configuração de um caminho explícito, que precisa existir.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(HarnessError::Config(format!(
                "config file not found: {}",
                path.display()
            ))
            .into());
        }
        let mut config = Self::parse_file(path)?;
        config.apply_env(std::env::var(OUTPUT_DIR_ENV).ok());
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str::<HarnessConfig>(&contents).map_err(HarnessError::from)?;
        Ok(config)
    }

    /// Variável de ambiente tem precedência sobre o arquivo de configuração.
    pub fn apply_env(&mut self, output_dir: Option<String>) {
        if let Some(dir) = output_dir
            && !dir.is_empty()
        {
            self.output_dir = Some(PathBuf::from(dir));
        }
    }
}
