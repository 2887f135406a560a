//! Subcommand implementations

use crate::app::{
    build_checkpoint, build_compositor, build_pipeline, build_poller, build_source, load_config,
    stop_on_ctrl_c,
};
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use hnforge_core::{AttributeSource, BatchScheduler, ForgeConfig, IdRange, LiveRegenerator, RegenerationScope};
use hnforge_metadata::{file_stem, format_score};
use hnforge_render::{ImageComposer, OutputFormat};
use hnforge_traits::{layers_for, DerivedProfile, EntityId, Level, Series, ITEM_SLOTS};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

/// Exit code of a backfill that left ids pending
pub const EXIT_PENDING: u8 = 2;

/// Dispatch the parsed command line
///
/// # Errors
/// Configuration, wiring or I/O failures of the selected subcommand
pub async fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let Some((name, args)) = matches.subcommand() else {
        bail!("no subcommand given");
    };
    let config = load_config(args.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match name {
        "backfill" => backfill(config, args).await,
        "watch" => watch(config).await,
        "render" => render(&config, args).await,
        "derive" => derive(&config, args).await,
        other => bail!("unknown subcommand {other}"),
    }
}

fn required<T: Clone + Send + Sync + 'static>(args: &ArgMatches, name: &str) -> Result<T> {
    args.get_one::<T>(name)
        .cloned()
        .with_context(|| format!("--{name} is required"))
}

async fn backfill(mut config: ForgeConfig, args: &ArgMatches) -> Result<ExitCode> {
    if let Some(concurrency) = args.get_one::<usize>("concurrency") {
        config = config.with_concurrency(*concurrency);
    }
    if let Some(attempts) = args.get_one::<u32>("max-attempts") {
        config.scheduler.max_attempts = *attempts;
    }
    if args.get_flag("metadata-only") {
        config.scheduler.scope = RegenerationScope::MetadataOnly;
    }
    config.validate()?;

    let from: u64 = required(args, "from")?;
    let to: u64 = required(args, "to")?;
    if to < from {
        bail!("--to ({to}) must not be below --from ({from})");
    }

    let scheduler = BatchScheduler::new(
        Arc::new(build_pipeline(&config)?),
        build_checkpoint(&config),
    )
    .with_options(config.scheduler.options())
    .with_stop_signal(stop_on_ctrl_c());

    let report = scheduler.run_backfill(IdRange::new(from, to)).await?;

    println!("range      {}", report.range);
    println!("succeeded  {}", report.succeeded);
    println!("failed     {}", report.failed.len());
    println!("pending    {}", report.pending.len());
    if report.stopped {
        println!("stopped before completion; re-run to resume");
    }
    if !report.pending.is_empty() {
        let preview: Vec<String> = report.pending.iter().take(20).map(ToString::to_string).collect();
        println!("pending ids {}", preview.join(" "));
    }

    Ok(if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_PENDING)
    })
}

async fn watch(config: ForgeConfig) -> Result<ExitCode> {
    let poller = build_poller(&config)?;
    let live = LiveRegenerator::new(Arc::new(build_pipeline(&config)?), config.live.filter())
        .with_scope(config.live.scope)
        .with_concurrency(config.live.concurrency)
        .with_stop_signal(stop_on_ctrl_c());

    info!(
        min_entity_id = config.live.min_entity_id,
        scope = ?config.live.scope,
        "watching contract events"
    );
    let report = live.run(poller.into_stream()).await;
    println!(
        "events {} accepted {} succeeded {} failed {}",
        report.received, report.accepted, report.succeeded, report.failed
    );
    Ok(ExitCode::SUCCESS)
}

async fn render(config: &ForgeConfig, args: &ArgMatches) -> Result<ExitCode> {
    let id = EntityId::new(required(args, "id")?);
    let levels: Vec<Level> = match args.get_one::<u8>("level") {
        Some(level) => vec![Level::new(*level)?],
        None => Level::up_to(config.collection.max_level).collect(),
    };
    let out: PathBuf = required(args, "out")?;
    tokio::fs::create_dir_all(&out)
        .await
        .with_context(|| format!("creating {}", out.display()))?;

    let compositor = Arc::new(build_compositor(config));
    let profile = DerivedProfile::derive(id);
    let slug = config.series_profile().slug;
    let ext = match config.render.format {
        OutputFormat::Jpeg => "jpg",
        OutputFormat::Png => "png",
    };

    for level in levels {
        let composer = Arc::clone(&compositor);
        let bytes = tokio::task::spawn_blocking(move || composer.compose(&profile, level))
            .await?
            .with_context(|| format!("rendering #{id} level {level}"))?;
        let path = out.join(format!("{}.{ext}", file_stem(&slug, id, level)));
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        println!("{}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

/// Live values shown by `derive --live`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveView {
    /// Current level
    pub level: u8,
    /// Formatted HC score
    pub hc: String,
    /// Formatted BTC score
    pub btc: String,
    /// Ultra flag
    pub ultra: bool,
}

/// Derived traits of one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeriveReport {
    /// Entity id
    pub id: u64,
    /// Series the layers are for
    pub series: Series,
    /// Class index, 1-based
    pub class: u8,
    /// Class name
    pub class_name: &'static str,
    /// Item variants, `item1` first
    pub items: [u8; ITEM_SLOTS as usize],
    /// Hero layer order per level
    pub layers: BTreeMap<u8, Vec<String>>,
    /// Live values, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live: Option<LiveView>,
}

impl DeriveReport {
    /// Derive `id` for `series` up to `max_level`
    ///
    /// # Errors
    /// Layer table lookups for out-of-range levels
    pub fn new(id: EntityId, series: Series, max_level: u8) -> Result<Self> {
        let profile = DerivedProfile::derive(id);
        let layers = Level::up_to(max_level)
            .map(|level| -> Result<(u8, Vec<String>)> {
                let refs = layers_for(series, profile.class, level.get())?;
                Ok((level.get(), refs.iter().map(ToString::to_string).collect()))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            id: id.get(),
            series,
            class: profile.class.index(),
            class_name: profile.class.name(),
            items: profile.items,
            layers,
            live: None,
        })
    }

    /// Human-readable rendering
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let items: Vec<String> = self.items.iter().map(ToString::to_string).collect();
        let _ = writeln!(text, "entity #{} ({})", self.id, self.series.label());
        let _ = writeln!(text, "class    {} {}", self.class, self.class_name);
        let _ = writeln!(text, "items    {}", items.join(" "));
        for (level, layers) in &self.layers {
            let _ = writeln!(text, "level {level}  {}", layers.join(" "));
        }
        if let Some(live) = &self.live {
            let _ = writeln!(
                text,
                "live     level {} hc {} btc {} ultra {}",
                live.level, live.hc, live.btc, live.ultra
            );
        }
        text
    }
}

async fn derive(config: &ForgeConfig, args: &ArgMatches) -> Result<ExitCode> {
    let id = EntityId::new(required(args, "id")?);
    let mut report = DeriveReport::new(id, config.collection.series, config.collection.max_level)?;

    if args.get_flag("live") {
        let source = build_source(config);
        let (level, attrs) = futures::try_join!(source.level(id), source.attributes(id))
            .with_context(|| format!("reading live values of #{id}"))?;
        report.live = Some(LiveView {
            level,
            hc: format_score(attrs.scores[0]),
            btc: format_score(attrs.scores[1]),
            ultra: attrs.ultra,
        });
    }

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_text());
    }
    Ok(ExitCode::SUCCESS)
}
