//! CLI application for body-measurement and clothing-size estimation.
//!
//! Usage:
//!   size-estimator estimate <image> --height 178 --weight 74 --gender male
//!   size-estimator estimate <image> --keypoints pose.json --json
//!   size-estimator estimate <image> --annotated overlay.jpg -o result.json --json
//!   size-estimator chart [--json]

use clap::{Args, Parser, Subcommand};
use size_estimator::{
    annotate, reference_charts, EstimationResult, EstimatorConfig, PoseDetector, RecordedPose,
    SizeEstimator,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "size-estimator")]
#[command(author, version, about = "Body measurement and clothing size estimation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Estimate measurements and a size from a full-body photo
    Estimate(EstimateArgs),
    /// Print the reference size charts
    Chart {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct EstimateArgs {
    /// Input image file
    #[arg(required = true)]
    image: PathBuf,

    /// Body height in centimeters (default: 170)
    #[arg(long)]
    height: Option<f64>,

    /// Body weight in kilograms (default: 70)
    #[arg(long)]
    weight: Option<f64>,

    /// male, female or child (default: male)
    #[arg(long)]
    gender: Option<String>,

    /// Estimator configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recorded keypoints (JSON) to use instead of a pose model
    #[arg(long)]
    keypoints: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the annotated image (JPEG) to this path
    #[arg(long)]
    annotated: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let verbose = matches!(&cli.command, Commands::Estimate(args) if args.verbose);
    init_tracing(verbose);

    let outcome = match &cli.command {
        Commands::Estimate(args) => run_estimate(args),
        Commands::Chart { json } => run_chart(*json),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn run_estimate(args: &EstimateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => EstimatorConfig::load(path)?,
        None => EstimatorConfig::default(),
    };

    let detector = match &args.keypoints {
        Some(path) => {
            tracing::info!("Loading recorded keypoints from {:?}", path);
            PoseDetector::new(RecordedPose::load(path)?)
        }
        None => {
            tracing::info!("No keypoints supplied; estimating without pose landmarks");
            PoseDetector::Unavailable
        }
    };
    let estimator = SizeEstimator::new(detector, config);

    tracing::info!("Reading image {:?}", args.image);
    let bytes = std::fs::read(&args.image)?;
    let result = estimator.estimate(&bytes, args.height, args.weight, args.gender.as_deref());

    if let (Some(path), Some(estimation)) = (&args.annotated, &result.estimation) {
        std::fs::write(path, annotate::decode_data_uri(&estimation.annotated_image)?)?;
        tracing::info!("Annotated image written to {:?}", path);
    }

    let output_str = if args.json {
        serde_json::to_string_pretty(&result)?
    } else {
        format_human_readable(args, &result)
    };
    write_output(args.output.as_ref(), &output_str)?;

    match result.error {
        Some(message) => Err(message.into()),
        None => Ok(()),
    }
}

fn run_chart(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let charts = reference_charts();
    if json {
        println!("{}", serde_json::to_string_pretty(&charts)?);
        return Ok(());
    }

    for chart in &charts {
        println!("{} ({}, cm)", chart.name, chart.measure);
        for row in &chart.rows {
            println!("  {:<3} {:>3}-{}", row.size, row.min_cm, row.max_cm);
        }
    }
    Ok(())
}

fn write_output(path: Option<&PathBuf>, output_str: &str) -> std::io::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, output_str)?;
            tracing::info!("Output written to {:?}", path);
        }
        None => println!("{}", output_str),
    }
    Ok(())
}

fn format_human_readable(args: &EstimateArgs, result: &EstimationResult) -> String {
    let mut s = String::new();

    s.push_str(&format!("Image: {}\n", args.image.display()));

    let estimation = match &result.estimation {
        Some(estimation) => estimation,
        None => {
            let message = result.error.as_deref().unwrap_or("unknown error");
            s.push_str(&format!("\nEstimation failed: {}\n", message));
            return s;
        }
    };

    s.push_str(&format!(
        "Method: {} (confidence {:.2})\n",
        estimation.method_used.title(),
        estimation.confidence
    ));
    s.push_str(&format!("Notes: {}\n", estimation.notes));

    let m = &estimation.measurements;
    s.push_str("\nMeasurements:\n");
    s.push_str(&format!("  Height:   {:.1} cm\n", m.height_cm));
    s.push_str(&format!("  Shoulder: {:.1} cm\n", m.widths.shoulder));
    s.push_str(&format!("  Chest:    {:.1} cm\n", m.widths.chest));
    s.push_str(&format!("  Waist:    {:.1} cm\n", m.widths.waist));
    s.push_str(&format!("  Hip:      {:.1} cm\n", m.widths.hip));

    s.push_str(&format!(
        "\nRecommended size: {} ({})\n",
        estimation.recommended_size, estimation.size_details
    ));

    s
}
