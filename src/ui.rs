//! Interface de terminal do jobreplay: spinners e saída colorida.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`JobProgress`] acompanha visualmente
//! a execução de um job no terminal.

use std::path::Path;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::HarnessError;
use crate::record::render_output;
use crate::state_machine::{ExecutionState, JobReport};
use crate::stats::BatchStatistics;

/// Estilo usado para exibir cada estado de execução.
pub fn state_style(state: ExecutionState) -> Style {
    match state {
        ExecutionState::Success => Style::new().green().bold(),
        ExecutionState::Failure => Style::new().red().bold(),
        ExecutionState::Aborted => Style::new().yellow().bold(),
        ExecutionState::Uninitialized | ExecutionState::Running => Style::new().cyan(),
    }
}

// Spinner sem tick automático; oculto em modo debug.
fn spinner(debug: bool) -> ProgressBar {
    if debug {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb
}

/// Indicador visual de progresso para a execução de um job no terminal.
///
/// Exibe um spinner animado durante o processamento e o estado final
/// colorido: sucesso (verde), falha (vermelho) e abortado (amarelo).
pub struct JobProgress {
    // Barra de progresso/spinner do indicatif.
    pb: ProgressBar,
    // Estilo vermelho para erros de resolução.
    red: Style,
}

impl JobProgress {
    /// Imprime a linha de progresso e desenha o spinner.
    ///
    /// O spinner só é redesenhado a partir desta thread, para não se
    /// misturar com os logs em stderr; com `--debug` ele fica oculto.
    pub fn start(path: &Path, plugin_name: &str, debug: bool) -> Self {
        println!("Processing {} with {plugin_name}", path.display());

        let pb = spinner(debug);
        pb.set_message(plugin_name.to_string());
        pb.tick();

        Self {
            pb,
            red: Style::new().red().bold(),
        }
    }

    /// Finaliza o spinner e exibe o estado final e a saída do plugin.
    pub fn complete(&self, report: &JobReport, pretty: bool) {
        self.pb.finish_and_clear();
        let style = state_style(report.state);
        println!(
            "  {} {} ({}ms)",
            style.apply_to("State:"),
            style.apply_to(report.state),
            report.duration_ms
        );
        println!("{}", render_output(&report.output, pretty).unwrap_or_default());
    }

    /// Finaliza o spinner quando o job não chegou a executar fase alguma.
    pub fn fail(&self, err: &HarnessError) {
        self.pb.finish_and_clear();
        println!("  {} {err}", self.red.apply_to("✗"));
    }
}

/// Informa que um registro de job foi ignorado.
pub fn skipped(path: &Path) {
    println!(
        "  {} Skipping {}",
        Style::new().yellow().apply_to("↷"),
        path.display()
    );
}

/// Imprime a tabela de estatísticas do lote.
pub fn print_statistics(stats: &BatchStatistics) {
    println!();
    println!("{}", Style::new().bold().apply_to("─── Statistics ───"));
    println!("{}", stats.render(stats.elapsed_ms()));
}
