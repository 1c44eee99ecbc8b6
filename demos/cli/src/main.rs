use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use timeline_core::{ActiveCategories, ConfigOverrides, TimelineConfig, WorkingSet};
use timeline_sources::{load_working_set, SourceFormat, SourceSpec};

#[derive(Parser, Debug)]
#[command(
    name = "timeline-cli",
    about = "Dựng timeline sự kiện từ các file CSV/JSON."
)]
struct Args {
    /// Đường dẫn file nguồn (.csv hoặc .json), có thể lặp lại.
    #[arg(short, long = "input", required = true)]
    inputs: Vec<PathBuf>,

    /// Chỉ hiện các loại này (mặc định: tất cả).
    #[arg(short, long = "category")]
    categories: Vec<String>,

    /// Ẩn các loại này.
    #[arg(long = "hide")]
    hidden: Vec<String>,

    /// File JSON ghi đè một phần cấu hình mặc định.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Số tháng đệm quanh khung hiển thị.
    #[arg(long)]
    padding_months: Option<u32>,

    /// In payload dạng JSON thay vì bảng văn bản.
    #[arg(long)]
    json: bool,

    /// Bật log debug (tương đương RUST_LOG=debug).
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    let specs = args
        .inputs
        .iter()
        .map(|path| {
            let format = SourceFormat::from_path(path)
                .ok_or_else(|| anyhow!("Không nhận diện được định dạng của {:?}", path))?;
            Ok(SourceSpec::new(path.display().to_string(), format))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let fetch = |spec: &SourceSpec| tokio::fs::read_to_string(PathBuf::from(&spec.name));
    let loaded = load_working_set(&specs, fetch, &config).await;

    let (working_set, failure) = match loaded {
        Ok(working_set) => (working_set, None),
        Err(err) => {
            tracing::error!(error = %err, "load aborted");
            (WorkingSet::empty(&config), Some(err))
        }
    };

    let active = active_categories(&working_set, &args);
    if args.json {
        print_json(&working_set, &active)?;
    } else {
        print_text(&working_set, &active);
    }

    match failure {
        Some(err) => Err(err).context("Không nạp được dữ liệu timeline"),
        None => Ok(()),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<TimelineConfig> {
    let mut config = TimelineConfig::default();

    if let Some(path) = &args.config {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Không đọc được file {:?}", path))?;
        let overrides: ConfigOverrides = serde_json::from_str(&data)
            .with_context(|| format!("Config không hợp lệ: {:?}", path))?;
        overrides.apply(&mut config);
    }

    if let Some(months) = args.padding_months {
        config.window_padding_months = months;
    }

    Ok(config)
}

fn active_categories(working_set: &WorkingSet, args: &Args) -> ActiveCategories {
    let mut active = if args.categories.is_empty() {
        ActiveCategories::all(working_set.palette())
    } else {
        args.categories.iter().cloned().collect()
    };
    for category in &args.hidden {
        active.set(category, false);
    }
    active
}

fn print_json(working_set: &WorkingSet, active: &ActiveCategories) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "window": working_set.window(),
        "categories": working_set
            .palette()
            .entries()
            .iter()
            .map(|entry| serde_json::json!({
                "category": entry.category,
                "color": entry.color.css(),
                "active": active.contains(&entry.category),
            }))
            .collect::<Vec<_>>(),
        "items": working_set.render_items(active),
        "stats": working_set.stats(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text(working_set: &WorkingSet, active: &ActiveCategories) {
    let window = working_set.window();
    println!("Window: {} -> {}", window.start, window.end);

    for entry in working_set.palette().entries() {
        let marker = if active.contains(&entry.category) { "x" } else { " " };
        println!("[{marker}] {} ({})", entry.category, entry.color.css());
    }

    let mut shown = 0usize;
    for record in working_set.visible(active) {
        shown += 1;
        println!(
            "{}  {:<40}  {}",
            record.occurs_at, record.title, record.detail
        );
    }

    let stats = working_set.stats();
    println!(
        "Events: {shown} shown / {} total\nRejected rows: {}\nDate fallbacks: {} ({:.1}%)",
        working_set.len(),
        stats.rows_rejected,
        stats.date_fallbacks,
        stats.fallback_ratio() * 100.0
    );
}
