//! ringfit CLI: fit circles/ellipses to point clusters stored as JSON.

use clap::{Args, Parser, Subcommand, ValueEnum};
use ringfit::{
    find_most_divergent_pair, fit_circle_with, fit_ellipse_with, rms_sampson_distance, EdgePoint,
    Ellipse, EllipseParams, FitConfig, FitError,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "ringfit")]
#[command(about = "Fit circles and ellipses to ring-marker boundary point clusters")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit every cluster in a JSON file.
    Fit(CliFitArgs),

    /// Run the gradient divergence probe on edge-point clusters.
    Divergence(CliDivergenceArgs),

    /// Emit a synthetic cluster sampled from an ellipse.
    Sample(CliSampleArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
enum CliModel {
    /// Direct least-squares ellipse.
    Ellipse,
    /// Algebraic least-squares circle.
    Circle,
    /// Ellipse, falling back to a circle when the ellipse fit fails.
    Auto,
}

#[derive(Debug, Clone, Args)]
struct CliFitArgs {
    /// Input JSON: array of `{ "points": [[x, y], ...] }`.
    #[arg(long)]
    input: PathBuf,

    /// Output JSON path; prints to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Model to fit.
    #[arg(long, value_enum, default_value = "auto")]
    model: CliModel,

    /// Optional FitConfig JSON (missing fields use defaults).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliDivergenceArgs {
    /// Input JSON: array of `{ "edges": [{"x":..,"y":..,"dx":..,"dy":..}, ...] }`.
    #[arg(long)]
    input: PathBuf,

    /// Cosine threshold the minimal inner product is compared against.
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    threshold: f64,
}

#[derive(Debug, Clone, Args)]
struct CliSampleArgs {
    #[arg(long, allow_hyphen_values = true)]
    cx: f64,
    #[arg(long, allow_hyphen_values = true)]
    cy: f64,
    /// Semi-axis along the rotated x direction.
    #[arg(long)]
    a: f64,
    /// Semi-axis along the rotated y direction.
    #[arg(long)]
    b: f64,
    /// Rotation in radians.
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    angle: f64,
    /// Number of samples.
    #[arg(long, default_value = "32")]
    n: usize,
}

#[derive(Debug, Deserialize, Serialize)]
struct PointCluster {
    points: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct EdgeCluster {
    edges: Vec<EdgePoint>,
}

#[derive(Debug, Serialize)]
struct ClusterFit {
    index: usize,
    n_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<CliModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ellipse: Option<EllipseParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rms_residual: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClusterDivergence {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pair: Option<[usize; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_inner_product: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    below_threshold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fit(args) => run_fit(&args),
        Commands::Divergence(args) => run_divergence(&args),
        Commands::Sample(args) => run_sample(&args),
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> CliResult<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    let value = serde_json::from_str(&text)
        .map_err(|e| format!("failed to parse {}: {}", path.display(), e))?;
    Ok(value)
}

fn fit_cluster(
    points: &[[f64; 2]],
    model: CliModel,
    config: &FitConfig,
) -> Result<(CliModel, Ellipse), FitError> {
    match model {
        CliModel::Ellipse => fit_ellipse_with(points, config).map(|e| (CliModel::Ellipse, e)),
        CliModel::Circle => fit_circle_with(points, config).map(|e| (CliModel::Circle, e)),
        CliModel::Auto => match fit_ellipse_with(points, config) {
            Ok(e) => Ok((CliModel::Ellipse, e)),
            Err(err) => {
                tracing::debug!("ellipse fit failed ({}), trying circle", err);
                fit_circle_with(points, config).map(|e| (CliModel::Circle, e))
            }
        },
    }
}

fn run_fit(args: &CliFitArgs) -> CliResult<()> {
    let config: FitConfig = match &args.config {
        Some(path) => read_json(path)?,
        None => FitConfig::default(),
    };
    let clusters: Vec<PointCluster> = read_json(&args.input)?;
    tracing::info!("Loaded {} clusters from {}", clusters.len(), args.input.display());

    let fits: Vec<ClusterFit> = clusters
        .iter()
        .enumerate()
        .map(|(index, cluster)| {
            let n_points = cluster.points.len();
            match fit_cluster(&cluster.points, args.model, &config) {
                Ok((model, ellipse)) => ClusterFit {
                    index,
                    n_points,
                    model: Some(model),
                    rms_residual: Some(rms_sampson_distance(&ellipse, &cluster.points)),
                    ellipse: Some(EllipseParams::from(&ellipse)),
                    error: None,
                },
                Err(err) => ClusterFit {
                    index,
                    n_points,
                    model: None,
                    ellipse: None,
                    rms_residual: None,
                    error: Some(err.to_string()),
                },
            }
        })
        .collect();

    let n_ok = fits.iter().filter(|f| f.error.is_none()).count();
    tracing::info!("Fitted {}/{} clusters", n_ok, fits.len());
    if n_ok < fits.len() {
        tracing::warn!("{} clusters rejected", fits.len() - n_ok);
    }

    let json = serde_json::to_string_pretty(&fits)?;
    match &args.out {
        Some(out) => {
            std::fs::write(out, &json)?;
            tracing::info!("Results written to {}", out.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_divergence(args: &CliDivergenceArgs) -> CliResult<()> {
    let clusters: Vec<EdgeCluster> = read_json(&args.input)?;
    tracing::info!("Loaded {} edge clusters", clusters.len());

    let report: Vec<ClusterDivergence> = clusters
        .iter()
        .enumerate()
        .map(
            |(index, cluster)| match find_most_divergent_pair(&cluster.edges, args.threshold) {
                Ok(pair) => ClusterDivergence {
                    index,
                    pair: Some([pair.first_index, pair.second_index]),
                    min_inner_product: Some(pair.min_inner_product),
                    below_threshold: Some(pair.below_threshold),
                    error: None,
                },
                Err(err) => ClusterDivergence {
                    index,
                    pair: None,
                    min_inner_product: None,
                    below_threshold: None,
                    error: Some(err.to_string()),
                },
            },
        )
        .collect();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_sample(args: &CliSampleArgs) -> CliResult<()> {
    let ellipse = Ellipse::new(args.cx, args.cy, args.a, args.b, args.angle)
        .map_err(|e| format!("invalid ellipse: {}", e))?;
    let cluster = PointCluster {
        points: ellipse.sample_points(args.n),
    };
    println!("{}", serde_json::to_string_pretty(&[cluster])?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_falls_back_to_circle_on_four_points() {
        let pts = [[0.0, 10.0], [10.0, 0.0], [0.0, -10.0], [-10.0, 0.0]];
        let (model, fitted) = fit_cluster(&pts, CliModel::Auto, &FitConfig::default()).unwrap();
        assert_eq!(model, CliModel::Circle);
        assert!((fitted.a() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn explicit_ellipse_reports_error() {
        let pts = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        let err = fit_cluster(&pts, CliModel::Ellipse, &FitConfig::default()).unwrap_err();
        assert!(matches!(err, FitError::InsufficientData { needed: 5, .. }));
    }

    #[test]
    fn clusters_parse_from_json() {
        let clusters: Vec<PointCluster> =
            serde_json::from_str(r#"[{"points": [[1.0, 2.0], [3.5, -1.0]]}]"#).unwrap();
        assert_eq!(clusters[0].points.len(), 2);

        let edges: Vec<EdgeCluster> =
            serde_json::from_str(r#"[{"edges": [{"x": 1, "y": 2, "dx": 0.5, "dy": -0.5}]}]"#)
                .unwrap();
        assert_eq!(edges[0].edges[0], EdgePoint::new(1, 2, 0.5, -0.5));
    }
}
