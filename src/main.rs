use clap::Parser;
use fabric_cutter::config::{DEFAULT_FABRIC_WIDTH_CM, SearchConfig};
use fabric_cutter::demand::normalize;
use fabric_cutter::render;
use fabric_cutter::types::{FabricSize, default_fabric_sizes, parse_length};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "fabric_cutter",
    about = "Split a fabric roll into standard lengths with as little leftover as possible"
)]
struct Cli {
    /// Total roll length in metres (e.g. 32.5); anything non-numeric plans nothing
    #[arg(long, allow_hyphen_values = true)]
    length: String,

    /// Catalogue entries as SIZE:WEEKLY_DEMAND (e.g. 2.5:10 3:7); defaults to the built-in catalogue
    #[arg(long = "demand", num_args = 1.., value_parser = parse_demand)]
    demand: Vec<FabricSize>,

    /// Fabric width (panna) in centimetres
    #[arg(long, default_value_t = DEFAULT_FABRIC_WIDTH_CM)]
    width: u32,

    /// Show an ASCII strip of the cuts along the roll
    #[arg(long)]
    layout: bool,

    /// Show the catalogue with demand shares and priority classes
    #[arg(long)]
    catalogue: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Log search progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_demand(s: &str) -> Result<FabricSize, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("invalid demand '{}', expected SIZE:WEEKLY_DEMAND", s));
    }
    let size = parts[0]
        .parse::<f64>()
        .map_err(|_| format!("invalid size in '{}'", s))?;
    if size.is_nan() || size <= 0.0 || size.is_infinite() {
        return Err(format!("size must be a positive length in '{}'", s));
    }
    let weekly_demand = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid weekly demand in '{}'", s))?;
    Ok(FabricSize::new(size, weekly_demand))
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let sizes = if cli.demand.is_empty() {
        default_fabric_sizes()
    } else {
        cli.demand
    };
    let config = SearchConfig::default();

    if cli.catalogue {
        let normalized = normalize(&sizes).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
        print!(
            "{}",
            render::render_catalogue(&normalized, config.priority_threshold)
        );
        println!();
    }

    let length = parse_length(&cli.length);
    let result =
        fabric_cutter::calculate_optimal_cuts_with(length, Some(&sizes), cli.width, config)
            .unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if result.cuts.is_empty() {
        println!("No pieces fit in {}m.", cli.length.trim());
    } else {
        print!("{}", render::render_table(&result));
        println!();
    }
    if cli.layout {
        print!("{}", render::render_strip(length, &result));
        println!();
    }
    print!("{}", render::render_summary(&result));
}
