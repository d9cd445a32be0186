use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use wg_app::{
    AppError, AppResult, DeviceLocks, OutputSource, ResolveOptions, ResolveProgressEvent,
    ResolveTiming, Resolver, RunContext, Wec, WecSpec, cache_service, project_service, query,
};
use wg_core::DeviceId;
use wg_engine::MatlabEngine;
use wg_project::Project;
use wg_results::{OutputStore, SqliteStore, output_table_name};

#[derive(Parser)]
#[command(name = "wg-cli")]
#[command(about = "WecGrid CLI - WEC device output resolution", long_about = None)]
struct Cli {
    /// Path to the project YAML file
    #[arg(short, long, env = "WG_PROJECT")]
    project: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate,
    /// List devices in the project
    Devices,
    /// Resolve one device's output, simulating it when not cached
    Resolve {
        /// Device id
        device_id: DeviceId,
        /// Drop the cached table and simulate again
        #[arg(long)]
        refresh: bool,
    },
    /// Resolve every device in the project, in file order
    ResolveAll {
        /// Drop cached tables and simulate again
        #[arg(long)]
        refresh: bool,
    },
    /// Show the cached output and run manifest of a device
    Show {
        /// Device id
        device_id: DeviceId,
    },
    /// List cached output tables in the project store
    Cached,
    /// Drop a device's cached output
    Invalidate {
        /// Device id
        device_id: DeviceId,
    },
    /// Export one column (or `all`) of a device's cached output as CSV
    Export {
        /// Device id
        device_id: DeviceId,
        /// Column name (time, pg, pmax, pmin, qmax, qmin, or any extra
        /// formatter column) or `all`
        column: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a CSV file as a device's cached output
    Import {
        /// Device id
        device_id: DeviceId,
        /// CSV file with time, pg, pmax, pmin, qmax, qmin columns; other
        /// columns are stored alongside them
        csv_path: PathBuf,
    },
}

/// Everything a command needs to resolve devices of one project.
struct Workspace {
    project: Project,
    store: SqliteStore,
    engine: MatlabEngine,
    locks: DeviceLocks,
}

impl Workspace {
    fn open(project_path: &Path) -> AppResult<Self> {
        let project = project_service::load_project(project_path)?;
        let paths = project_service::project_paths(&project, project_path);
        let store = project_service::open_store(&paths)?;
        let engine = project_service::build_engine(&project, &paths);
        Ok(Self {
            project,
            store,
            engine,
            locks: DeviceLocks::new(),
        })
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.store, &self.engine, &self.locks)
    }

    fn context(&self) -> RunContext {
        RunContext::from(&self.project.context)
    }

    fn resolve(&self, device_id: DeviceId, options: ResolveOptions) -> AppResult<Wec> {
        let def = project_service::get_device(&self.project, device_id)?;
        let resolver = self.resolver();

        let mut last_emit = Instant::now();
        let mut last_stage = None;
        let wec = Wec::with_progress(
            &self.context(),
            WecSpec::from_def(def),
            &resolver,
            options,
            Some(&mut |event: ResolveProgressEvent| {
                let emit_now =
                    last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
                if emit_now {
                    render_cli_progress(&event);
                    last_stage = Some(event.stage);
                    last_emit = Instant::now();
                }
            }),
        )?;
        clear_progress_line();
        Ok(wec)
    }
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let project_path = cli.project.as_path();

    match cli.command {
        Commands::Validate => cmd_validate(project_path),
        Commands::Devices => cmd_devices(project_path),
        Commands::Resolve { device_id, refresh } => cmd_resolve(project_path, device_id, refresh),
        Commands::ResolveAll { refresh } => cmd_resolve_all(project_path, refresh),
        Commands::Show { device_id } => cmd_show(project_path, device_id),
        Commands::Cached => cmd_cached(project_path),
        Commands::Invalidate { device_id } => cmd_invalidate(project_path, device_id),
        Commands::Export {
            device_id,
            column,
            output,
        } => cmd_export(project_path, device_id, &column, output.as_deref()),
        Commands::Import {
            device_id,
            csv_path,
        } => cmd_import(project_path, device_id, &csv_path),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    println!("✓ Project is valid ({} devices)", project.devices.len());
    Ok(())
}

fn cmd_devices(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let devices = project_service::list_devices(&project);

    if devices.is_empty() {
        println!("No devices found in project");
    } else {
        println!("Devices in project:");
        for dev in devices {
            println!(
                "  {} - {} via {} (bus {}, {} params)",
                dev.id, dev.model, dev.entry_point, dev.bus_location, dev.param_count
            );
        }
    }
    Ok(())
}

fn cmd_resolve(project_path: &Path, device_id: DeviceId, refresh: bool) -> AppResult<()> {
    println!("Resolving output for device: {}", device_id);
    let workspace = Workspace::open(project_path)?;
    let wec = workspace.resolve(
        device_id,
        ResolveOptions {
            force_refresh: refresh,
            ..ResolveOptions::default()
        },
    )?;
    print_resolved(&wec)?;
    print_timing_summary(wec.timing());
    Ok(())
}

fn cmd_resolve_all(project_path: &Path, refresh: bool) -> AppResult<()> {
    let workspace = Workspace::open(project_path)?;
    let ids: Vec<DeviceId> = workspace.project.devices.iter().map(|d| d.id).collect();
    println!("Resolving {} devices", ids.len());

    let mut simulated = 0usize;
    for device_id in ids {
        let wec = workspace.resolve(
            device_id,
            ResolveOptions {
                force_refresh: refresh,
                ..ResolveOptions::default()
            },
        )?;
        if wec.source() == OutputSource::Simulation {
            simulated += 1;
        }
        print_resolved(&wec)?;
    }
    println!("\n{} simulated, the rest loaded from cache", simulated);
    Ok(())
}

fn cmd_show(project_path: &Path, device_id: DeviceId) -> AppResult<()> {
    let workspace = Workspace::open(project_path)?;
    let table = output_table_name(device_id);
    let Some(wec) = resolve_cached(&workspace, device_id)? else {
        return Ok(());
    };
    let summary = query::get_output_summary(wec.output())?;

    println!("Device {} ({})", device_id, table);
    println!("  Model: {} via {}", wec.model(), wec.model().entry_point());
    println!("  Bus: {}", wec.bus_location());
    let bounds = wec.bounds();
    println!(
        "  Bounds: P [{}, {}]  Q [{}, {}]  MBASE {}",
        bounds.pmin,
        bounds.pmax,
        bounds.qmin,
        bounds.qmax,
        wec.mbase()
    );
    println!("  Rows: {}", summary.row_count);
    println!(
        "  Time range: {:.1} - {:.1} s",
        summary.time_range.0, summary.time_range.1
    );
    println!(
        "  Snapshots: {} - {}",
        summary.snapshot_range.0, summary.snapshot_range.1
    );
    println!(
        "  Pg range: {:.6} - {:.6}",
        summary.pg_range.0, summary.pg_range.1
    );
    if !wec.output().extra_columns().is_empty() {
        let extra: Vec<&str> = wec
            .output()
            .extra_columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        println!("  Extra columns: {}", extra.join(", "));
    }

    match workspace.store.load_manifest(device_id)? {
        Some(manifest) => {
            println!("\nRun manifest:");
            println!("  Model: {}", manifest.model);
            println!("  Completed: {}", manifest.completed_at);
            println!("  Rows: {}", manifest.row_count);
            println!("  Params hash: {}", manifest.params_hash);
        }
        None => println!("\nNo run manifest (table was imported or written externally)"),
    }
    Ok(())
}

fn cmd_cached(project_path: &Path) -> AppResult<()> {
    let workspace = Workspace::open(project_path)?;
    let cached = cache_service::list_cached(&workspace.store)?;

    if cached.is_empty() {
        println!("No cached device output in {}", workspace.store.location().display());
    } else {
        println!("Cached device output:");
        for entry in cached {
            match entry.manifest {
                Some(m) => println!(
                    "  {} - {} rows, {} ({})",
                    entry.table, m.row_count, m.model, m.completed_at
                ),
                None => println!("  {} - external", entry.table),
            }
        }
    }
    Ok(())
}

fn cmd_invalidate(project_path: &Path, device_id: DeviceId) -> AppResult<()> {
    let workspace = Workspace::open(project_path)?;
    if cache_service::invalidate(&workspace.store, &workspace.locks, device_id)? {
        println!("✓ Dropped cached output for device {}", device_id);
    } else {
        println!("Device {} had no cached output", device_id);
    }
    Ok(())
}

fn cmd_export(
    project_path: &Path,
    device_id: DeviceId,
    column: &str,
    output: Option<&Path>,
) -> AppResult<()> {
    let workspace = Workspace::open(project_path)?;
    let Some(wec) = resolve_cached(&workspace, device_id)? else {
        return Ok(());
    };

    let mut buffer = Vec::new();
    if column.eq_ignore_ascii_case("all") {
        query::write_csv(wec.output(), &mut buffer)?;
    } else {
        let series = query::extract_series(wec.output(), column)?;
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(["snapshot", column])?;
        for (snapshot, value) in &series {
            writer.write_record([snapshot.to_string(), value.to_string()])?;
        }
        writer.flush()?;
    }

    // Write to file or stdout
    if let Some(path) = output {
        std::fs::write(path, &buffer)?;
        println!("✓ Exported {} rows to {}", wec.output().len(), path.display());
    } else {
        io::stdout().write_all(&buffer)?;
    }
    Ok(())
}

fn cmd_import(project_path: &Path, device_id: DeviceId, csv_path: &Path) -> AppResult<()> {
    let workspace = Workspace::open(project_path)?;
    let file = std::fs::File::open(csv_path).map_err(|e| {
        AppError::InvalidInput(format!("Cannot open {}: {}", csv_path.display(), e))
    })?;
    let table = query::read_output_csv(file)?;
    cache_service::import_csv(&workspace.store, &workspace.locks, device_id, &table)?;
    println!(
        "✓ Imported {} rows as {}",
        table.len(),
        output_table_name(device_id)
    );
    Ok(())
}

/// Resolve from the cache only; inspection commands never start the engine.
fn resolve_cached(workspace: &Workspace, device_id: DeviceId) -> AppResult<Option<Wec>> {
    let options = ResolveOptions {
        cached_only: true,
        ..ResolveOptions::default()
    };
    match workspace.resolve(device_id, options) {
        Ok(wec) => Ok(Some(wec)),
        Err(AppError::NotCached { table, .. }) => {
            println!("No cached output for device {} ({})", device_id, table);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn print_resolved(wec: &Wec) -> AppResult<()> {
    match wec.source() {
        OutputSource::Cache => println!("✓ Loaded from cache: device {}", wec.id()),
        OutputSource::Simulation => println!("✓ Simulation completed: device {}", wec.id()),
    }
    let summary = query::get_output_summary(wec.output())?;
    println!(
        "  Rows: {}  ({} - {})",
        summary.row_count, summary.snapshot_range.0, summary.snapshot_range.1
    );
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &ResolveProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} device {}: {}  elapsed={:.2}s",
        spinner[spin_idx],
        event.device_id,
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
}

fn print_timing_summary(timing: &ResolveTiming) {
    let total = timing.total_time_s.max(1.0e-12);
    let simulate_pct = 100.0 * timing.simulate_time_s / total;
    let load_pct = 100.0 * timing.load_time_s / total;

    println!("\nTiming summary:");
    println!("  Lookup:   {:.3}s", timing.lookup_time_s);
    if timing.simulate_time_s > 0.0 {
        println!("  Drop:     {:.3}s", timing.drop_time_s);
        println!(
            "  Simulate: {:.3}s ({:.1}%)",
            timing.simulate_time_s, simulate_pct
        );
    }
    println!("  Load:     {:.3}s ({:.1}%)", timing.load_time_s, load_pct);
    println!("  Total:    {:.3}s", timing.total_time_s);
}
