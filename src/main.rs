use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use duty_roster::display::{print_roster, write_roster_to_file};
use duty_roster::export::export_roster;
use duty_roster::logging;
use duty_roster::parser::load_availability;
use duty_roster::schedule::{Allocator, RandomTieBreak, Slot, TieBreak, DEFAULT_WORKLOAD_CAP};
use duty_roster::web;

#[derive(Parser)]
#[command(name = "duty-roster", author, version, about = "Gerador da escala semanal de plantões", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Gera a escala a partir do CSV do formulário de disponibilidade
    Generate {
        /// CSV exportado do formulário
        csv: PathBuf,
        /// Pasta onde a planilha escala_axis.xlsx é salva
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Semente para repetir a mesma escala
        #[arg(long)]
        seed: Option<u64>,
        /// Máximo de plantões por pessoa ao preencher horários vazios
        #[arg(long, default_value_t = DEFAULT_WORKLOAD_CAP)]
        cap: u32,
        /// Também salva a escala em texto neste arquivo
        #[arg(long)]
        text: Option<PathBuf>,
        /// Só imprime, sem gerar a planilha
        #[arg(long)]
        no_export: bool,
    },
    /// Sobe a API de envio e geração da escala
    Web {
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: String,
        #[arg(long, default_value_t = DEFAULT_WORKLOAD_CAP)]
        cap: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate { csv, out_dir, seed, cap, text, no_export } => {
            let people = load_availability(&csv).with_context(|| format!("failed to load {}", csv.display()))?;
            println!("{} respostas de disponibilidade carregadas", people.len());

            let mut tie_break: Box<dyn TieBreak> = match seed {
                Some(seed) => Box::new(RandomTieBreak::seeded(seed)),
                None => Box::new(RandomTieBreak::from_thread_rng()),
            };
            let allocator = Allocator::with_workload_cap(cap);
            info!(workload_cap = allocator.workload_cap(), seeded = seed.is_some(), "allocating roster");
            let roster = allocator.allocate(&people, &Slot::universe(), tie_break.as_mut());
            print_roster(&roster);

            if let Some(path) = text {
                write_roster_to_file(&roster, &path).with_context(|| format!("failed to write {}", path.display()))?;
                println!("\nEscala em texto salva em {}", path.display());
            }

            if !no_export {
                let path = export_roster(&roster, &out_dir).context("failed to export roster workbook")?;
                println!("\nPlanilha salva em {}", path.display());
            }
        }
        Commands::Web { port, admin_password, cap } => {
            let allocator = Allocator::with_workload_cap(cap);
            info!(port, workload_cap = allocator.workload_cap(), "starting web server");
            println!("API disponível em http://localhost:{}", port);
            web::start_server(port, admin_password, allocator)
                .await
                .context("web server stopped with an error")?;
        }
    }

    Ok(())
}
