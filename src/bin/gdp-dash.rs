use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gdp_dashboard::config::{DashboardConfig, load_config};
use gdp_dashboard::models::{ChartKind, DisplayMode};
use gdp_dashboard::{
    Client, Dashboard, DataProvider, Selection, WideCsvProvider, WorldBankProvider, YearRange,
};
use gdp_dashboard::{chart, present, storage};
use std::io::Write;
use std::path::PathBuf;

/// Range used for API queries when neither flags nor config give one.
const API_DEFAULT_RANGE: YearRange = YearRange {
    start: 2000,
    end: 2020,
};

#[derive(Parser, Debug)]
#[command(
    name = "gdp-dash",
    version,
    about = "Explore GDP series: indexed charts, CAGR indicators and CSV export"
)]
struct Cli {
    /// JSON config file (defaults for countries, range, locale, API settings).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print indicators and the raw table (and optionally plot and save).
    Show(ShowArgs),
    /// Write the filtered table as CSV.
    Export(ExportArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Absolute,
    Index,
}

impl From<ModeArg> for DisplayMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Absolute => DisplayMode::Absolute,
            ModeArg::Index => DisplayMode::Index,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ChartArg {
    Line,
    Bar,
}

impl From<ChartArg> for ChartKind {
    fn from(c: ChartArg) -> Self {
        match c {
            ChartArg::Line => ChartKind::Line,
            ChartArg::Bar => ChartKind::Bar,
        }
    }
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// ISO3 country codes separated by comma or semicolon (e.g., DEU,FRA)
    #[arg(short, long)]
    countries: Option<String>,
    /// Year (YYYY) or range (YYYY:YYYY)
    #[arg(short = 'd', long)]
    date: Option<String>,
    /// Read a World Bank bulk CSV (one column per year) instead of calling the API.
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ShowArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Chart values as absolute GDP or as an index (first year = 100).
    #[arg(long, value_enum, default_value = "absolute")]
    mode: ModeArg,
    /// Chart type.
    #[arg(long, value_enum, default_value = "line")]
    chart: ChartArg,
    /// Create an SVG chart at the given path.
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Width of the plot (default 1000).
    #[arg(long, default_value_t = 1000)]
    width: u32,
    /// Height of the plot (default 600).
    #[arg(long, default_value_t = 600)]
    height: u32,
    /// Save the dashboard (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Locale for number formatting (e.g., en, de, fr).
    #[arg(long)]
    locale: Option<String>,
    /// Do not print the raw data table.
    #[arg(long, default_value_t = false)]
    no_table: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Output file; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("command line: {cli:?}");
    let cfg = match &cli.config {
        Some(p) => load_config(p)?,
        None => DashboardConfig::default(),
    };
    match cli.cmd {
        Command::Show(args) => cmd_show(&cfg, args),
        Command::Export(args) => cmd_export(&cfg, args),
    }
}

/// Resolve the provider and the country/range part of the selection.
fn open_source(
    cfg: &DashboardConfig,
    args: &SourceArgs,
) -> Result<(Box<dyn DataProvider>, Vec<String>, YearRange)> {
    let countries = match &args.countries {
        Some(s) => parse_list(s),
        None => cfg.default_countries.clone(),
    };

    let provider: Box<dyn DataProvider> = match &args.file {
        Some(path) => Box::new(WideCsvProvider::from_path(path)?),
        None => Box::new(WorldBankProvider::new(
            Client::from_config(cfg)?,
            cfg.indicator.clone(),
            cfg.source,
        )),
    };

    let range = match &args.date {
        Some(s) => YearRange::parse(s)
            .ok_or_else(|| anyhow::anyhow!("invalid --date, expected YYYY or YYYY:YYYY"))?,
        None => cfg
            .default_range
            .or_else(|| provider.available_range())
            .unwrap_or(API_DEFAULT_RANGE),
    };
    Ok((provider, countries, range))
}

fn cmd_show(cfg: &DashboardConfig, args: ShowArgs) -> Result<()> {
    let (provider, countries, range) = open_source(cfg, &args.source)?;
    let selection = Selection {
        countries,
        range,
        mode: args.mode.into(),
        chart: args.chart.into(),
    };
    let dash = Dashboard::build(provider.as_ref(), &selection)?;
    let locale = args.locale.as_deref().unwrap_or(&cfg.locale);

    print!("{}", present::render_indicators(&dash, locale));
    if !args.no_table {
        println!();
        print!("{}", present::render_table(&dash.table, locale));
    }

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_csv(&dash.table, path)?,
            "json" => storage::save_json(&dash, path)?,
            other => anyhow::bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} rows to {}", dash.table.len(), path.display());
    }

    if let Some(plot_path) = args.plot.as_ref() {
        let title = match selection.mode {
            DisplayMode::Absolute => format!("GDP {}-{}", range.start, range.end),
            DisplayMode::Index => format!("GDP index {}-{}", range.start, range.end),
        };
        chart::render_svg(
            &dash.chart,
            selection.chart,
            plot_path,
            args.width,
            args.height,
            &title,
        )?;
        eprintln!("Wrote plot to {}", plot_path.display());
    }

    Ok(())
}

fn cmd_export(cfg: &DashboardConfig, args: ExportArgs) -> Result<()> {
    let (provider, countries, range) = open_source(cfg, &args.source)?;
    let selection = Selection {
        countries,
        range,
        mode: DisplayMode::Absolute,
        chart: ChartKind::Line,
    };
    let dash = Dashboard::build(provider.as_ref(), &selection)?;
    let bytes = dash.csv()?;
    match args.out.as_ref() {
        Some(path) => {
            std::fs::write(path, &bytes).with_context(|| format!("write {}", path.display()))?;
            eprintln!("Saved {} rows to {}", dash.table.len(), path.display());
        }
        None => std::io::stdout().write_all(&bytes)?,
    }
    Ok(())
}
