#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line tools for the landslide viewer.
//!
//! Runs the filter pipeline against the configured sources from the
//! terminal, manages users, and starts the API server. Without a
//! subcommand an interactive menu is shown.

mod range_arg;

use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Password, Select};
use landslide_viewer_auth::FileUserStore;
use landslide_viewer_incident_models::Selection;
use landslide_viewer_pipeline::{Dataset, FilterSelection, PipelineOutput};
use landslide_viewer_source::config::AppConfig;
use landslide_viewer_source::load_dataset;

use crate::range_arg::RangeArg;

#[derive(Parser)]
#[command(name = "landslide_viewer_cli", about = "Landslide viewer tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the region choices
    Regions,
    /// List the district choices for a region
    Districts {
        /// Region name (omit for every region)
        #[arg(long)]
        region: Option<String>,
    },
    /// Run the filter pipeline and print the summary
    Summary {
        /// Region name (omit for every region)
        #[arg(long)]
        region: Option<String>,
        /// District name (omit for every district)
        #[arg(long)]
        district: Option<String>,
        /// Range filter as FIELD=LO,HI (e.g. `elevation=750,1300`).
        /// May be repeated.
        #[arg(long = "range")]
        ranges: Vec<RangeArg>,
    },
    /// Register a user for the web viewer
    Register {
        /// Username to register
        #[arg(long)]
        username: String,
    },
    /// Start the API server
    Serve {
        /// Prompt for the bind address and port
        #[arg(long)]
        interactive: bool,
    },
}

/// Top-level actions offered by the interactive menu.
enum Tool {
    Summary,
    Register,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::Summary, Self::Register, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Summary => "Show summary",
            Self::Register => "Register user",
            Self::Server => "Start server",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive().await;
    };

    match command {
        Commands::Regions => {
            let dataset = load(&AppConfig::load()?).await?;
            for region in dataset.region_choices() {
                println!("{region}");
            }
        }
        Commands::Districts { region } => {
            let config = AppConfig::load()?;
            let dataset = load(&config).await?;
            let selection = FilterSelection {
                region: Selection::from_optional(region.as_deref()),
                ..FilterSelection::default()
            };
            let output =
                landslide_viewer_pipeline::run(&dataset, &selection, &config.labels.entire_area);
            for district in output.district_choices {
                println!("{district}");
            }
        }
        Commands::Summary {
            region,
            district,
            ranges,
        } => {
            let config = AppConfig::load()?;
            let dataset = load(&config).await?;
            let selection = FilterSelection {
                region: Selection::from_optional(region.as_deref()),
                district: Selection::from_optional(district.as_deref()),
                ranges: ranges
                    .into_iter()
                    .map(|arg| (arg.field, arg.request))
                    .collect::<BTreeMap<_, _>>(),
            };
            let output =
                landslide_viewer_pipeline::run(&dataset, &selection, &config.labels.entire_area);
            print_summary(&output);
        }
        Commands::Register { username } => register(&username).await?,
        Commands::Serve { interactive } => serve(interactive).await?,
    }

    Ok(())
}

async fn interactive() -> Result<(), Box<dyn std::error::Error>> {
    println!("Landslide Viewer");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Summary => {
            let config = AppConfig::load()?;
            let dataset = load(&config).await?;

            let regions = dataset.region_choices();
            let region_idx = Select::new()
                .with_prompt("Region")
                .items(&regions)
                .default(0)
                .interact()?;
            let region = Selection::from_optional(Some(regions[region_idx].as_str()));

            let selection = FilterSelection {
                region,
                ..FilterSelection::default()
            };
            let output =
                landslide_viewer_pipeline::run(&dataset, &selection, &config.labels.entire_area);
            let district_idx = Select::new()
                .with_prompt("District")
                .items(&output.district_choices)
                .default(0)
                .interact()?;
            let district = output.district_choices[district_idx].as_str();
            let selection = FilterSelection {
                district: Selection::from_optional(Some(district)),
                ..selection
            };

            let output =
                landslide_viewer_pipeline::run(&dataset, &selection, &config.labels.entire_area);
            print_summary(&output);
        }
        Tool::Register => {
            let username: String = Input::new().with_prompt("Username").interact_text()?;
            register(&username).await?;
        }
        Tool::Server => serve(true).await?,
    }

    Ok(())
}

async fn load(config: &AppConfig) -> Result<Dataset, Box<dyn std::error::Error>> {
    let dataset = load_dataset(config).await?;
    log::info!(
        "Loaded {} incidents ({} rows dropped) and {} boundary polygons",
        dataset.incidents.len(),
        dataset.dropped,
        dataset.boundaries.len()
    );
    Ok(dataset)
}

async fn register(username: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;

    let store = FileUserStore::open(&config.users.path).await?;
    landslide_viewer_auth::register(&store, username, &password).await?;
    println!("Registered {username}");
    Ok(())
}

async fn serve(interactive: bool) -> Result<(), Box<dyn std::error::Error>> {
    // The server uses actix-web's runtime, so it runs in a blocking task
    // to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(async move {
            if interactive {
                landslide_viewer_server::interactive::run().await
            } else {
                landslide_viewer_server::run_server().await
            }
        })
    })
    .await??;
    Ok(())
}

fn print_summary(output: &PipelineOutput<'_>) {
    let summary = &output.summary;
    println!("{:<24} {}", "Region", summary.region_label);
    println!("{:<24} {}", "Total incidents", summary.total_count);
    match summary.mean_elevation {
        Some(mean) => println!("{:<24} {mean:.1} m", "Mean elevation"),
        None => println!("{:<24} -", "Mean elevation"),
    }
    println!("{:<24} {}", "Boundary polygons", output.boundary.len());

    if !output.range_controls.is_empty() {
        println!();
        println!("{:<24} {:>8} {:>8} {:>8} {:>8}", "FIELD", "MIN", "MAX", "FROM", "TO");
        println!("{}", "-".repeat(60));
        for control in &output.range_controls {
            println!(
                "{:<24} {:>8} {:>8} {:>8} {:>8}",
                control.field.column_name(),
                control.min,
                control.max,
                control.selected_min,
                control.selected_max
            );
        }
    }
}
