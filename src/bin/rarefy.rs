use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use rarefy_rs::config::{ChartConfig, YExtent};
use rarefy_rs::{LegendTarget, Session, storage, viz};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rarefy",
    version,
    about = "Render alpha-rarefaction curves with per-sample line and dot toggles"
)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a chart (and optionally dump the session state).
    Plot(PlotArgs),
    /// List metrics and their categories.
    Inspect(InspectArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum YExtentArg {
    Statistic,
    Envelope,
}

#[derive(Args, Debug)]
struct PlotArgs {
    /// Report (.json) or single dataset (.csv / .tsv).
    #[arg(short, long)]
    input: PathBuf,
    /// Metric to show (default: first in the report).
    #[arg(short, long)]
    metric: Option<String>,
    /// Category to group by (default: first of the metric).
    #[arg(short, long)]
    category: Option<String>,
    /// Chart output path (.svg or .png).
    #[arg(short, long)]
    out: PathBuf,
    /// Chart config JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Plot area width in pixels.
    #[arg(long)]
    width: Option<u32>,
    /// Plot area height in pixels.
    #[arg(long)]
    height: Option<u32>,
    /// Locale for tick labels (en, de, fr, ...).
    #[arg(long)]
    locale: Option<String>,
    /// Y domain from the plotted statistic or the min/max envelope.
    #[arg(long, value_enum)]
    y_extent: Option<YExtentArg>,
    /// Legend click to replay, in order: `line:KEY`, `dots:KEY`,
    /// `all-lines` or `all-dots`. Repeatable.
    #[arg(long = "click", value_parser = parse_click)]
    clicks: Vec<LegendTarget>,
    /// Write the session state (legend, visibility, elements) as JSON.
    #[arg(long)]
    state: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Report (.json) or single dataset (.csv / .tsv).
    #[arg(short, long)]
    input: PathBuf,
}

fn parse_click(s: &str) -> Result<LegendTarget, String> {
    match s {
        "all-lines" => return Ok(LegendTarget::AllLines),
        "all-dots" => return Ok(LegendTarget::AllDots),
        _ => {}
    }
    match s.split_once(':') {
        Some(("line", key)) if !key.is_empty() => Ok(LegendTarget::Line(key.to_string())),
        Some(("dots", key)) if !key.is_empty() => Ok(LegendTarget::Dots(key.to_string())),
        _ => Err(format!(
            "invalid click `{s}`, expected line:KEY, dots:KEY, all-lines or all-dots"
        )),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    match cli.cmd {
        Command::Plot(args) => cmd_plot(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn load_config(args: &PlotArgs) -> Result<ChartConfig> {
    let mut cfg = match &args.config {
        Some(p) => ChartConfig::from_json_file(p)?,
        None => ChartConfig::default(),
    };
    if let Some(w) = args.width {
        cfg.width = w;
    }
    if let Some(h) = args.height {
        cfg.height = h;
    }
    if let Some(l) = &args.locale {
        cfg.locale = l.clone();
    }
    if let Some(y) = args.y_extent {
        cfg.y_extent = match y {
            YExtentArg::Statistic => YExtent::Statistic,
            YExtentArg::Envelope => YExtent::Envelope,
        };
    }
    Ok(cfg)
}

fn cmd_plot(args: PlotArgs) -> Result<()> {
    let cfg = load_config(&args)?;
    let report = storage::load_report(&args.input)?;
    let mut session = match &args.metric {
        Some(m) => Session::with_selection(report, cfg, m.as_str(), args.category.clone())?,
        None => {
            let mut s = Session::new(report, cfg)?;
            if let Some(c) = &args.category {
                s.set_category(c)?;
            }
            s
        }
    };

    for click in &args.clicks {
        let changed = session
            .click(click)
            .with_context(|| format!("replaying click {click:?}"))?;
        log::debug!("click {click:?}: {changed} element(s) changed");
    }

    viz::write_chart(&session, &args.out)?;
    eprintln!(
        "Wrote {} ({} / {}) to {}",
        session.metric(),
        session.category().unwrap_or("-"),
        session.download_target(),
        args.out.display()
    );

    if let Some(path) = &args.state {
        let json = serde_json::to_string_pretty(&session.snapshot())
            .map_err(|e| anyhow!("serializing session state: {e}"))?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        eprintln!("Wrote state to {}", path.display());
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> Result<()> {
    let report = storage::load_report(&args.input)?;
    for metric in report.metrics() {
        let cats = report.categories(metric);
        if cats.is_empty() {
            println!("{metric}");
        } else {
            println!("{metric}: {}", cats.join(", "));
        }
    }
    Ok(())
}
