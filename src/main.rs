mod io;
mod render;
mod types;

use anyhow::{bail, Context};
use clap::Parser;
use render::{RenderOptions, DEFAULT_SCRIPT_URL};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use types::{ChartData, Layout};

const LOG_ENV: &str = "TSV2CHART_LOG";

#[derive(Parser)]
#[command(version, about = "Turn a tab-separated file into an HTML line chart")]
struct Cli {
    #[arg(short, long, help = "Tab-separated input file", value_name = "FILE")]
    input: PathBuf,

    #[arg(
        short,
        long,
        help = "Output path, \".html\" is appended [default: the input without its extension]",
        value_name = "STEM"
    )]
    output: Option<PathBuf>,

    #[arg(
        long,
        value_enum,
        default_value_t = Layout::Units,
        help = "Which lines hold the axis units and the legend"
    )]
    layout: Layout,

    #[arg(
        long,
        default_value = DEFAULT_SCRIPT_URL,
        help = "Charting library script",
        value_name = "URL"
    )]
    script_url: String,

    #[arg(long, default_value_t = 900, help = "Chart width in pixels")]
    width: u32,

    #[arg(long, default_value_t = 500, help = "Chart height in pixels")]
    height: u32,
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let output = output_path(&cli.input, cli.output.as_deref())?;

    let lines = io::read_lines(io::TsvFileReader::new(&cli.input)?)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let chart = ChartData::from_lines(cli.layout, lines)
        .with_context(|| format!("parsing {}", cli.input.display()))?;

    info!(
        layout = %cli.layout,
        series = chart.series.len(),
        points = chart.x_categories.len(),
        "parsed chart"
    );
    for series in &chart.series {
        debug!(
            name = %series.name,
            average = ?series.average(),
            max = ?series.max(),
            min = ?series.min(),
            "series"
        );
    }

    let options = RenderOptions {
        layout: cli.layout,
        script_url: cli.script_url,
        width: cli.width,
        height: cli.height,
    };
    let html = render::render(&chart, &options)?;
    io::write_document(&output, &html)?;

    info!(path = %output.display(), bytes = html.len(), "wrote chart");
    println!("output file : {}", output.display());

    Ok(())
}

/// `<stem>.html`, where the stem is `output` or else the input minus its extension.
fn output_path(input: &Path, output: Option<&Path>) -> anyhow::Result<PathBuf> {
    let stem = match output {
        Some(output) => output.to_path_buf(),
        None => input.with_extension(""),
    };

    let path = if stem
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("html"))
    {
        stem
    } else {
        let mut path = stem.into_os_string();
        path.push(".html");
        PathBuf::from(path)
    };

    if path == input || same_file(input, &path) {
        bail!("output {} would overwrite the input", path.display());
    }
    Ok(path)
}

/// Both paths resolve to the same file on disk. A missing output can't be the input.
fn same_file(input: &Path, output: &Path) -> bool {
    match (input.canonicalize(), output.canonicalize()) {
        (Ok(input), Ok(output)) => input == output,
        _ => false,
    }
}
