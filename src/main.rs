//! Competitive Research CLI
//!
//! Command-line front end for the research pipeline. The core emits a
//! normalized output record; this layer only formats it, prints it, and
//! writes the export files.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use competitive_research::{
    report, run_research, search_backends_from_env, AnalysisKind, CompanyIdentity,
    CompetitorDiscovery, PositioningTable, ResearchConfig, ScrapeOutcome, Scraper,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "competitive-research")]
#[command(about = "Discover and analyze competitors for any company using web search and OpenAI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and export the competitive research report
    Research {
        /// Target company website URL
        #[arg(short, long)]
        url: String,

        /// Display name (derived from the URL if not provided)
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory for the report files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Print the JSON report to stdout instead of writing files
        #[arg(long)]
        json: bool,
    },

    /// Discover competitors without scraping or analysis
    Discover {
        /// Target company website URL
        #[arg(short, long)]
        url: String,

        /// Display name (derived from the URL if not provided)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Scrape one site and show the extracted record (without analysis)
    Scrape {
        /// URL to scrape
        #[arg(short, long)]
        url: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Research {
            url,
            name,
            output_dir,
            json,
        } => {
            info!("Researching competitors for: {}", url);
            info!("This can take several minutes: the run performs up to six scraping passes and six LLM calls");

            let config = ResearchConfig::from_env().map_err(|e| {
                anyhow::anyhow!("{} (set it in the environment or a .env file)", e)
            })?;

            let output = run_research(&url, name.as_deref(), &config).await?;
            let generated_at = Utc::now();

            if json {
                println!(
                    "{}",
                    report::export_json_string(&output.company.name, &output.analyses, generated_at)?
                );
                return Ok(());
            }

            println!("\nCompetitive research complete!");
            println!("  Company: {}", output.company.name);
            println!("  Competitors found: {}", output.competitors.len());
            for (i, competitor) in output.competitors.iter().enumerate() {
                println!(
                    "    {}. {} ({}) [{}]",
                    i + 1,
                    competitor.name,
                    competitor.url,
                    competitor.source
                );
            }

            let positioning =
                PositioningTable::from_response(output.analyses.get(AnalysisKind::TableData));
            println!("  Positioning:");
            let target_row = positioning.row_for(&output.company.name);
            println!(
                "    {} (target): {}",
                target_row.company_name, target_row.market_positioning
            );
            for competitor in &output.competitors {
                let row = positioning.row_for(&competitor.name);
                println!("    {}: {}", row.company_name, row.market_positioning);
            }

            let failed: Vec<&str> = output
                .competitor_records
                .iter()
                .filter(|(_, outcome)| outcome.is_failed())
                .map(|(name, _)| name.as_str())
                .collect();
            if !failed.is_empty() {
                println!("  Sites that could not be scraped: {}", failed.join(", "));
            }

            std::fs::create_dir_all(&output_dir)?;
            let stem = report::report_file_stem(&output.company.name);

            let json_path = output_dir.join(format!("{}_competitive_research.json", stem));
            std::fs::write(
                &json_path,
                report::export_json_string(&output.company.name, &output.analyses, generated_at)?,
            )?;
            info!("Written: {}", json_path.display());

            let text_path = output_dir.join(format!("{}_competitive_research.txt", stem));
            std::fs::write(
                &text_path,
                report::export_text(&output.company.name, &output.analyses, generated_at),
            )?;
            info!("Written: {}", text_path.display());

            println!("  Files:");
            println!("    - {}", json_path.display());
            println!("    - {}", text_path.display());
        }

        Commands::Discover { url, name } => {
            let company = CompanyIdentity::from_url(&url, name.as_deref());
            info!("Discovering competitors for: {}", company.name);

            let backends = search_backends_from_env();
            if backends.is_empty() {
                println!("No search credentials configured (SERPAPI_KEY or GOOGLE_SEARCH_API_KEY + GOOGLE_SEARCH_ENGINE_ID); discovery will return nothing.");
            }

            let discovery = CompetitorDiscovery::new(backends);
            let competitors = discovery.discover(&company).await;

            println!("=== Competitors for {} ({}) ===\n", company.name, company.url);
            if competitors.is_empty() {
                println!("No competitors discovered.");
            }
            for (i, competitor) in competitors.iter().enumerate() {
                println!(
                    "{}. {} -> {} [{}]",
                    i + 1,
                    competitor.name,
                    competitor.url,
                    competitor.source
                );
            }
        }

        Commands::Scrape { url, json } => {
            info!("Scraping: {}", url);

            let scraper = Scraper::new()?;
            let name = competitive_research::company_name_from_url(&url);
            let outcome = scraper.scrape(&url, &name).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
                return Ok(());
            }

            match &outcome {
                ScrapeOutcome::Failed { error } => {
                    println!("Scrape failed: {}", error);
                }
                ScrapeOutcome::Scraped(record) => {
                    println!("=== Scraped Record ===\n");
                    println!("Title: {}", record.homepage.title);
                    println!("Headline: {}", record.homepage.headline);
                    println!("Subheadline: {}", record.homepage.subheadline);
                    println!("Description: {}", record.homepage.description);

                    println!(
                        "\n=== Homepage Features ({}) ===",
                        record.homepage.features.len()
                    );
                    for feature in &record.homepage.features {
                        println!("  - {}", feature);
                    }

                    match &record.pricing {
                        Some(tiers) => {
                            println!("\n=== Pricing Tiers ({}) ===", tiers.len());
                            for tier in tiers {
                                println!("  - {}: {}", tier.name, tier.price);
                            }
                        }
                        None => println!("\nNo pricing page found"),
                    }

                    match &record.features {
                        Some(features) => {
                            println!("\n=== Feature Page ({}) ===", features.len());
                            for feature in features {
                                println!("  - {}", feature);
                            }
                        }
                        None => println!("No features page found"),
                    }

                    match &record.about {
                        Some(about) => {
                            println!("\n=== About ===");
                            println!("Description: {}", about.description);
                            println!("Mission: {}", about.mission);
                            println!("Team: {}", about.team_info);
                        }
                        None => println!("No about page found"),
                    }
                }
            }
        }
    }

    Ok(())
}
