mod renderer;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use borough_lens_core::config::ExplorerConfig;
use borough_lens_core::model::SceneTree;
use borough_lens_core::viz::SurfaceKind;
use borough_lens_core::Explorer;
use borough_lens_protocol::Viewport;

const USAGE: &str = "\
Usage:
  borough-lens view   <housing.csv> <boroughs.topojson> [--config <file.json>]
  borough-lens export <housing.csv> <boroughs.topojson> <map|line|rank> <out.svg>
                      [--date <index>] [--dark] [--config <file.json>]
  borough-lens detail <page-url> [--config <file.json>]";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config, args) = take_config(args)?;
    match args.first().map(String::as_str) {
        Some("view") if args.len() == 3 => {
            let mut explorer = load(&config, Path::new(&args[1]), Path::new(&args[2]))?;
            renderer::run_tui(&mut explorer)
        }
        Some("export") if args.len() >= 5 => export(&config, &args[1..]),
        Some("detail") if args.len() == 2 => detail(&config, &args[1]),
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }
}

/// Strip `--config <file>` from `args` and load it; defaults otherwise.
fn take_config(mut args: Vec<String>) -> Result<(ExplorerConfig, Vec<String>)> {
    let Some(pos) = args.iter().position(|a| a == "--config") else {
        return Ok((ExplorerConfig::default(), args));
    };
    if pos + 1 >= args.len() {
        bail!("--config needs a file");
    }
    let path = PathBuf::from(args.remove(pos + 1));
    args.remove(pos);
    let data = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let config = ExplorerConfig::from_json(&data).with_context(|| format!("loading {}", path.display()))?;
    Ok((config, args))
}

fn load(config: &ExplorerConfig, csv: &Path, topology: &Path) -> Result<Explorer> {
    let csv = std::fs::read(csv).with_context(|| format!("reading {}", csv.display()))?;
    let topology = std::fs::read(topology).with_context(|| format!("reading {}", topology.display()))?;
    let mut explorer = Explorer::new(config.clone(), SceneTree::new());
    explorer.load_datasets(&csv, &topology)?;
    Ok(explorer)
}

fn export(config: &ExplorerConfig, args: &[String]) -> Result<()> {
    let surface = match args[2].as_str() {
        "map" => SurfaceKind::Map,
        "line" => SurfaceKind::Line,
        "rank" => SurfaceKind::Rank,
        other => bail!("unknown surface {other:?}, expected map, line or rank"),
    };
    let out = PathBuf::from(&args[3]);
    let flags = &args[4..];
    let dark = flags.iter().any(|f| f == "--dark");
    let date = match flags.iter().position(|f| f == "--date") {
        Some(i) => Some(
            flags
                .get(i + 1)
                .context("--date needs an index")?
                .parse::<usize>()
                .context("--date must be a non-negative integer")?,
        ),
        None => None,
    };

    let mut explorer = load(config, Path::new(&args[0]), Path::new(&args[1]))?;
    if let Some(date) = date {
        explorer.set_date(date);
        // Settle the fill and dot transitions before drawing.
        explorer.advance_clock(config.timeline.map_transition_ms.max(config.timeline.dot_transition_ms));
    }
    let viewport = match surface {
        SurfaceKind::Map => Viewport::new(960.0, 600.0),
        SurfaceKind::Line | SurfaceKind::Rank => Viewport::new(640.0, 320.0),
    };
    let svg = explorer.render_svg(surface, &viewport, dark);
    std::fs::write(&out, svg).with_context(|| format!("writing {}", out.display()))?;
    log::info!(
        "wrote {} for {}",
        out.display(),
        explorer.date_label().unwrap_or("no data")
    );
    Ok(())
}

#[cfg(feature = "http")]
fn detail(config: &ExplorerConfig, page_url: &str) -> Result<()> {
    use borough_lens_core::detail::{DetailLoader, DetailView, HttpSource, MemoryStore, unix_millis};

    let mut loader = DetailLoader::new(config.detail.clone(), MemoryStore::new(), HttpSource::new());
    match loader.open_page(page_url, unix_millis()) {
        DetailView::Ready(page) => {
            let body = format!(
                "{}\n\n{}\n\nLocation\n{}\n\nHistory\n{}\n\nLiving\n{}\n\nImage: {} ({})\n",
                page.title,
                page.description,
                page.location,
                page.history,
                page.living,
                page.image_src,
                page.image_alt
            );
            std::io::Write::write_all(&mut std::io::stdout(), body.as_bytes())?;
            Ok(())
        }
        DetailView::Error { message } => bail!(message),
        DetailView::Loading => bail!("detail page never finished loading"),
    }
}

#[cfg(not(feature = "http"))]
fn detail(_config: &ExplorerConfig, _page_url: &str) -> Result<()> {
    bail!("built without the `http` feature; rebuild with --features http to fetch borough details")
}
