//! Tellco xDR dashboard
//!
//! Loads the session table once, then either serves the dashboard or renders
//! a page from the command line.
//!
//! Usage:
//!   tellco_dashboard [--data PATH] serve [--host HOST] [--port PORT]
//!   tellco_dashboard [--data PATH] render <Handsets|Applications> [--output FILE]
//!   tellco_dashboard [--data PATH] report [PAGE]
//!   tellco_dashboard [--data PATH] aggregate --group COL --metric COL [--agg FN] [--name NAME] [--ascending]
//!   tellco_dashboard [--data PATH] export --output FILE

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tellco_dashboard::api::{self, service::AggregateQuery, DashboardService};
use tellco_dashboard::loader::{self, DEFAULT_DATA_PATH};
use tellco_dashboard::report;
use tellco_dashboard::views::Page;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Read-only dashboard over telecom session records
#[derive(Parser, Debug)]
#[command(name = "tellco_dashboard")]
#[command(version, about)]
struct Cli {
    /// Path to the cleaned xDR CSV
    #[arg(long, global = true, env = "TELLCO_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboard and JSON API
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, env = "TELLCO_PORT", default_value = "8080")]
        port: u16,
    },
    /// Render one page as JSON chart specifications
    Render {
        page: Page,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print pages as a text report (all pages when none is given)
    Report { page: Option<Page> },
    /// Group by one column and reduce another
    Aggregate {
        #[arg(long)]
        group: String,

        #[arg(long)]
        metric: String,

        /// count, size, sum, mean, min or max
        #[arg(long, default_value = "count")]
        agg: String,

        /// Name of the result column
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        ascending: bool,

        #[arg(long)]
        limit: Option<usize>,
    },
    /// Write the derived 18-column table as CSV
    Export {
        #[arg(long)]
        output: PathBuf,
    },
}

fn print_banner(addr: &SocketAddr, service: &DashboardService) {
    let summary = service.summary();
    println!("============================================================");
    println!("              TELLCO xDR DASHBOARD");
    println!("============================================================");
    println!();
    println!("  Sessions:   {}", summary.rows);
    println!("  Dashboard:  http://{}/", addr);
    println!();
    println!("REST Endpoints:");
    println!("  GET /api/v1/health              Health check");
    println!("  GET /api/v1/pages               Available pages");
    println!("  GET /api/v1/pages/:page         Rendered page");
    println!("  GET /api/v1/table               Table summary");
    println!("  GET /api/v1/aggregate           Group-by query");
    println!();
    println!("============================================================");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let cli = Cli::parse();

    // No page is offered until the table has loaded
    let service = match DashboardService::from_path(&cli.data) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("Cannot start dashboard: {:#}", e);
            return Err(e);
        }
    };

    match cli.command {
        Command::Serve { host, port } => {
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            print_banner(&addr, &service);

            let app = api::create_router(service);
            info!("Starting REST server on {}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
        Command::Render { page, output } => {
            let view = service.render_page(page);
            match output {
                Some(path) => {
                    let file = File::create(&path).with_context(|| format!("cannot create {:?}", path))?;
                    let mut out = BufWriter::new(file);
                    serde_json::to_writer_pretty(&mut out, &view)?;
                    out.flush()?;
                    info!("Wrote {} page to {:?}", page, path);
                }
                None => {
                    let stdout = io::stdout();
                    let mut out = stdout.lock();
                    serde_json::to_writer_pretty(&mut out, &view)?;
                    writeln!(out)?;
                }
            }
        }
        Command::Report { page } => {
            let pages = page.map_or_else(|| service.pages(), |p| vec![p]);
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for page in pages {
                report::write_page(&mut out, &service.render_page(page))?;
            }
        }
        Command::Aggregate { group, metric, agg, name, ascending, limit } => {
            let query = AggregateQuery { group, metric, agg, name, ascending, limit };
            let table = service.aggregate(&query)?;

            let [key_header, value_header] = table.headers();
            println!("{:40} {:>18}", key_header, value_header);
            println!("{}", "-".repeat(59));
            for row in &table.rows {
                let value = row.value.map_or_else(|| "-".to_string(), |v| v.to_string());
                println!("{:40} {:>18}", row.key, value);
            }
        }
        Command::Export { output } => {
            let file = File::create(&output).with_context(|| format!("cannot create {:?}", output))?;
            loader::export(service.table(), BufWriter::new(file))?;
            info!("Exported {} sessions to {:?}", service.table().len(), output);
        }
    }

    Ok(())
}
