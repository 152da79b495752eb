use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use photowork::{
    BulkFieldUpdateEngine, Collaborators, FsThumbnailCache, FsWorkStore, MutationCoalescer,
    PersistenceGateway as _, PhotoworkConfig, Rect, ResourceRef, SubmitTicket, TracingProjector,
    TracingReporter, WorkMutation,
};

#[derive(Parser, Debug)]
#[command(name = "photowork", version)]
struct Cli {
    /// JSON config file (engine options and library layout).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Library root; overrides the config file.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply edits to one photo. All edits are merged against a single read of its state.
    Edit(EditArgs),
    /// Flag photos.
    Flag(BatchArgs),
    /// Remove the flag from photos.
    Unflag(BatchArgs),
    /// Move photos to the trash.
    Trash(BatchArgs),
    /// Restore photos from the trash.
    Restore(BatchArgs),
    /// Print the stored edit state of a photo as JSON.
    Show(ShowArgs),
    /// Print the cache-busted thumbnail URL of a photo.
    ///
    /// The version token starts from the wall clock on every run, so each run prints a new
    /// `v=` unless `engine.initial_version` is set in the config file.
    ThumbUrl(ShowArgs),
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Master path of the photo, relative to the library root or absolute.
    resource: String,

    /// Rotate by this many clockwise quarter turns (negative for counter-clockwise).
    #[arg(long, allow_negative_numbers = true)]
    rotate: Option<i32>,

    /// Set the rotation to an absolute number of quarter turns.
    #[arg(long)]
    set_rotation: Option<i32>,

    /// Set the tilt angle in degrees.
    #[arg(
        long,
        allow_negative_numbers = true,
        value_parser = parse_tilt,
        conflicts_with = "clear_tilt"
    )]
    tilt: Option<f64>,

    /// Remove the tilt.
    #[arg(long)]
    clear_tilt: bool,

    /// Set the crop rectangle as `x0,y0,x1,y1`.
    #[arg(long, value_parser = parse_crop, conflicts_with = "clear_crop")]
    crop: Option<Rect>,

    /// Remove the crop rectangle.
    #[arg(long)]
    clear_crop: bool,

    /// Set the pick flag.
    #[arg(long, conflicts_with = "unflag")]
    flag: bool,

    /// Clear the pick flag.
    #[arg(long)]
    unflag: bool,

    /// Add a tag (repeatable).
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Remove a tag (repeatable).
    #[arg(long = "untag")]
    untags: Vec<String>,

    /// Drop every edit before applying the others.
    #[arg(long)]
    reset: bool,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Master paths of the photos.
    #[arg(required = true)]
    resources: Vec<String>,
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Master path of the photo.
    resource: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => PhotoworkConfig::load_json(path)?,
        None => PhotoworkConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.library.root = root.clone();
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    runtime.block_on(run(cli.cmd, config))
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

struct App {
    store: Arc<FsWorkStore>,
    thumbnails: Arc<FsThumbnailCache>,
    reporter: Arc<TracingReporter>,
    coalescer: MutationCoalescer,
}

impl App {
    fn new(config: &PhotoworkConfig) -> anyhow::Result<Self> {
        let store = Arc::new(FsWorkStore::new(config.library.clone())?);
        let thumbnails = Arc::new(FsThumbnailCache::new(&config.library));
        let reporter = Arc::new(TracingReporter::default());
        let coalescer = MutationCoalescer::new(
            Collaborators {
                gateway: store.clone(),
                invalidator: thumbnails.clone(),
                projector: Arc::new(TracingProjector),
                reporter: reporter.clone(),
            },
            &config.engine,
        )?;
        Ok(Self {
            store,
            thumbnails,
            reporter,
            coalescer,
        })
    }

    /// Wait for background persistence and fail if anything was reported along the way.
    async fn finish(&self) -> anyhow::Result<()> {
        self.coalescer.drain().await;
        match self.reporter.failures() {
            0 => Ok(()),
            n => anyhow::bail!("{n} operation(s) failed, see log output"),
        }
    }
}

async fn run(cmd: Command, config: PhotoworkConfig) -> anyhow::Result<()> {
    let app = App::new(&config)?;
    match cmd {
        Command::Edit(args) => cmd_edit(&app, args).await,
        Command::Flag(args) => cmd_batch(&app, args, BatchOp::Flag(true)).await,
        Command::Unflag(args) => cmd_batch(&app, args, BatchOp::Flag(false)).await,
        Command::Trash(args) => cmd_batch(&app, args, BatchOp::Trash(true)).await,
        Command::Restore(args) => cmd_batch(&app, args, BatchOp::Trash(false)).await,
        Command::Show(args) => cmd_show(&app, args).await,
        Command::ThumbUrl(args) => cmd_thumb_url(&app, args),
    }
}

fn edit_mutations(args: &EditArgs) -> Vec<WorkMutation> {
    let mut out = Vec::new();
    if args.reset {
        out.push(WorkMutation::Reset);
    }
    if let Some(turns) = args.set_rotation {
        out.push(WorkMutation::SetRotation(turns));
    }
    if let Some(delta) = args.rotate {
        out.push(WorkMutation::Rotate(delta));
    }
    if let Some(tilt) = args.tilt {
        out.push(WorkMutation::SetTilt(Some(tilt)));
    }
    if args.clear_tilt {
        out.push(WorkMutation::SetTilt(None));
    }
    if let Some(rect) = args.crop {
        out.push(WorkMutation::SetCrop(Some(rect)));
    }
    if args.clear_crop {
        out.push(WorkMutation::SetCrop(None));
    }
    if args.flag || args.unflag {
        out.push(WorkMutation::SetFlagged(args.flag));
    }
    out.extend(args.tags.iter().cloned().map(WorkMutation::AddTag));
    out.extend(args.untags.iter().cloned().map(WorkMutation::RemoveTag));
    out
}

async fn cmd_edit(app: &App, args: EditArgs) -> anyhow::Result<()> {
    let resource = parse_resource(&args.resource)?;
    let mutations = edit_mutations(&args);
    if mutations.is_empty() {
        anyhow::bail!("no edits given");
    }

    let tickets: Vec<SubmitTicket> = mutations
        .into_iter()
        .map(|m| app.coalescer.submit(resource.clone(), m))
        .collect();

    let mut merged = None;
    for ticket in tickets {
        merged = Some(ticket.published().await?);
    }
    app.finish().await?;

    if let Some(outcome) = merged {
        println!("{}", serde_json::to_string_pretty(&outcome.after)?);
        if outcome.refreshes_derived() {
            eprintln!(
                "thumbnail invalidated, version {}",
                app.coalescer.refresher().version()
            );
        }
    }
    Ok(())
}

#[derive(Clone, Copy, Debug)]
enum BatchOp {
    Flag(bool),
    Trash(bool),
}

async fn cmd_batch(app: &App, args: BatchArgs, op: BatchOp) -> anyhow::Result<()> {
    let resources = args
        .resources
        .iter()
        .map(|r| parse_resource(r))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let engine = BulkFieldUpdateEngine::new(app.coalescer.clone());
    match op {
        BatchOp::Flag(flagged) => engine.set_flagged(&resources, flagged).await?,
        BatchOp::Trash(true) => engine.move_to_trash(&resources).await?,
        BatchOp::Trash(false) => engine.restore_from_trash(&resources).await?,
    }
    app.finish().await?;

    eprintln!("updated {} photo(s)", resources.len());
    Ok(())
}

async fn cmd_show(app: &App, args: ShowArgs) -> anyhow::Result<()> {
    let resource = parse_resource(&args.resource)?;
    let state = app
        .store
        .fetch(&resource)
        .await
        .with_context(|| format!("read edit state of '{resource}'"))?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn cmd_thumb_url(app: &App, args: ShowArgs) -> anyhow::Result<()> {
    let resource = parse_resource(&args.resource)?;
    let url = app.thumbnails.thumbnail_url(&resource);
    println!("{}", app.coalescer.refresher().derived_src(&url));
    Ok(())
}

fn parse_resource(raw: &str) -> anyhow::Result<ResourceRef> {
    ResourceRef::new(raw).with_context(|| format!("invalid photo path '{raw}'"))
}

fn parse_tilt(raw: &str) -> Result<f64, String> {
    let tilt = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("tilt must be a number: {e}"))?;
    if !tilt.is_finite() {
        return Err(format!("tilt must be finite, got {tilt}"));
    }
    Ok(tilt)
}

fn parse_crop(raw: &str) -> Result<Rect, String> {
    let parts = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("crop must be four numbers: {e}"))?;
    let &[x0, y0, x1, y1] = parts.as_slice() else {
        return Err(format!("crop must be x0,y0,x1,y1, got {} value(s)", parts.len()));
    };
    if !parts.iter().all(|v| v.is_finite()) {
        return Err("crop values must be finite".to_string());
    }
    if x1 <= x0 || y1 <= y0 {
        return Err("crop must have x1 > x0 and y1 > y0".to_string());
    }
    Ok(Rect::new(x0, y0, x1, y1))
}
