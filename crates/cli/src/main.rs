use anyhow::Context;
use clap::{Parser, Subcommand};
use obsview_core::config::{locale_from_env_value, page_size_from_env_value};
use obsview_core::{
    flatten_all, load_column_configs, load_concept_map, load_encounters, EncounterListView,
    RowPage, ViewConfig,
};
use obsview_types::Locale;
use openmrs::ConceptMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "obsview")]
#[command(about = "Render OpenMRS encounters as list rows and detail panels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one page of encounter rows
    Rows {
        /// Encounters JSON (array or REST `results` page)
        #[arg(long)]
        encounters: PathBuf,
        /// Column configuration YAML
        #[arg(long)]
        columns: PathBuf,
        /// Concept map (JSON, or YAML with a .yaml/.yml extension)
        #[arg(long)]
        concept_map: Option<PathBuf>,
        /// Page number (1-indexed)
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Page size (defaults to OBSVIEW_PAGE_SIZE, then 10)
        #[arg(long)]
        page_size: Option<usize>,
        /// Display locale (defaults to OBSVIEW_LOCALE, then en)
        #[arg(long)]
        locale: Option<String>,
        /// Print JSON instead of a text table
        #[arg(long)]
        json: bool,
    },
    /// Print the detail panel of one encounter
    Detail {
        /// Encounters JSON (array or REST `results` page)
        #[arg(long)]
        encounters: PathBuf,
        /// Uuid of the encounter to expand
        #[arg(long)]
        encounter: String,
        /// Concept map (JSON, or YAML with a .yaml/.yml extension)
        #[arg(long)]
        concept_map: Option<PathBuf>,
        /// Display locale (defaults to OBSVIEW_LOCALE, then en)
        #[arg(long)]
        locale: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Entry point for the obsview CLI.
///
/// # Environment Variables
/// - `OBSVIEW_LOCALE`: display locale (default: "en")
/// - `OBSVIEW_PAGE_SIZE`: rows per page (default: 10)
/// - `RUST_LOG`: log filter (default directive: "obsview=info")
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("obsview=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rows {
            encounters,
            columns,
            concept_map,
            page,
            page_size,
            locale,
            json,
        } => {
            let config = view_config(locale, page_size)?;
            let page_size = config.page_size();
            let encounters = load_encounters(&encounters)
                .with_context(|| format!("loading encounters from {}", encounters.display()))?;
            let column_configs = load_column_configs(&columns)
                .with_context(|| format!("loading columns from {}", columns.display()))?;
            let concept_map = optional_concept_map(concept_map.as_deref())?;

            let view = EncounterListView::from_column_configs(config, concept_map, &column_configs);
            let row_page = view.page(&encounters, page_size, page);

            if json {
                println!("{}", serde_json::to_string_pretty(&row_page)?);
            } else {
                print_table(&view, &row_page);
            }
        }
        Commands::Detail {
            encounters,
            encounter,
            concept_map,
            locale,
            json,
        } => {
            let config = view_config(locale, None)?;
            let encounters = load_encounters(&encounters)
                .with_context(|| format!("loading encounters from {}", encounters.display()))?;
            let concept_map = optional_concept_map(concept_map.as_deref())?;

            let found = encounters
                .iter()
                .find(|e| e.uuid == encounter)
                .with_context(|| format!("encounter {encounter} not found"))?;
            let entries = flatten_all(&found.obs, Some(&concept_map), Some(config.locale()));

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No observations recorded.");
            } else {
                for entry in entries {
                    println!("{}: {}", entry.label, entry.value);
                }
            }
        }
    }

    Ok(())
}

/// Flags win over environment variables.
fn view_config(locale: Option<String>, page_size: Option<usize>) -> anyhow::Result<ViewConfig> {
    let locale = match locale {
        Some(raw) => Locale::new(raw)?,
        None => locale_from_env_value(std::env::var("OBSVIEW_LOCALE").ok())?,
    };
    let page_size = match page_size {
        Some(size) => size,
        None => page_size_from_env_value(std::env::var("OBSVIEW_PAGE_SIZE").ok())?,
    };

    Ok(ViewConfig::default()
        .with_locale(locale)
        .with_page_size(page_size)?)
}

fn optional_concept_map(path: Option<&Path>) -> anyhow::Result<ConceptMap> {
    match path {
        Some(path) => load_concept_map(path)
            .with_context(|| format!("loading concept map from {}", path.display())),
        None => Ok(ConceptMap::new()),
    }
}

fn print_table(view: &EncounterListView, page: &RowPage) {
    let headers = view.headers();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.header.chars().count()).collect();
    for row in &page.rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.value.as_text().chars().count());
        }
    }

    let line = |values: Vec<&str>| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, &width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(headers.iter().map(|h| h.header.as_str()).collect()));
    for row in &page.rows {
        println!("{}", line(row.cells.iter().map(|c| c.value.as_text()).collect()));
    }

    println!(
        "Page {} of {} ({} encounters)",
        page.page,
        page.total_pages.max(1),
        page.total_items
    );
}
