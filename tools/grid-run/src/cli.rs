// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Argument handling and demo dispatch for `grid-run`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use grid_rpc::{DispatchStats, HandlerRegistry};
use grid_runtime::{
    Backend, BackendKind, Emulated, Geometry, Grid, GridConfig, Polled, RunReport, RuntimeError,
    TileProgram,
};
use log::{error, info};

use crate::demos::{image_checksum, BarrierRounds, Hello, ImageFrames};

/// Runs a demo program on an emulated tile grid.
#[derive(Debug, Parser)]
#[command(name = "grid-run", version, about, long_about = None)]
pub struct Cli {
    /// Grid description in TOML; overrides the shape options.
    #[arg(long, value_name = "FILE", conflicts_with_all = ["width", "height", "backend"])]
    pub config: Option<PathBuf>,
    /// Number of columns.
    #[arg(long, default_value_t = 2)]
    pub width: u32,
    /// Number of rows.
    #[arg(long, default_value_t = 2)]
    pub height: u32,
    /// Lock backend (emulated or polled).
    #[arg(long, default_value = "emulated")]
    pub backend: BackendKind,
    /// Program every tile runs.
    #[arg(long, value_enum, default_value_t = Demo::Hello)]
    pub demo: Demo,
    /// Barrier rounds or image frames.
    #[arg(long, default_value_t = 1)]
    pub rounds: u32,
}

/// Available tile programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// Each tile logs a greeting.
    Hello,
    /// Full-grid barriers, `--rounds` times.
    Barrier,
    /// Each tile announces `--rounds` frames.
    Image,
}

/// What a finished run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Host loop counters.
    pub stats: DispatchStats,
    /// Tiles whose program failed.
    pub failed_tiles: usize,
}

impl From<&RunReport> for Summary {
    fn from(report: &RunReport) -> Self {
        Self { stats: report.stats, failed_tiles: report.failures.len() }
    }
}

/// Configuration selected by the arguments, with its validated geometry.
pub fn resolve_config(cli: &Cli) -> Result<(GridConfig, Geometry), RuntimeError> {
    let config = match &cli.config {
        Some(path) => GridConfig::load(path)?,
        None => GridConfig::new(cli.width, cli.height, cli.backend),
    };
    let geometry = config.validate()?;
    Ok((config, geometry))
}

/// Runs the selected demo with `registry` serving the tile log requests.
pub fn execute(cli: &Cli, registry: HandlerRegistry) -> Result<Summary, RuntimeError> {
    let (config, geometry) = resolve_config(cli)?;
    match config.grid.backend {
        BackendKind::Emulated => launch::<Emulated>(&config, geometry, cli, registry),
        BackendKind::Polled => launch::<Polled>(&config, geometry, cli, registry),
    }
}

fn launch<B: Backend>(
    config: &GridConfig,
    geometry: Geometry,
    cli: &Cli,
    mut registry: HandlerRegistry,
) -> Result<Summary, RuntimeError> {
    let grid: Arc<Grid<B>> = Arc::new(Grid::new(geometry));
    let report = match cli.demo {
        Demo::Hello => start(&grid, config, Hello, registry)?,
        Demo::Barrier => start(&grid, config, BarrierRounds::new(cli.rounds), registry)?,
        Demo::Image => {
            registry.on_image_update(image_checksum)?;
            start(&grid, config, ImageFrames::new(cli.rounds), registry)?
        }
    };
    Ok(Summary::from(&report))
}

fn start<B, P>(
    grid: &Arc<Grid<B>>,
    config: &GridConfig,
    program: P,
    registry: HandlerRegistry,
) -> Result<RunReport, RuntimeError>
where
    B: Backend,
    P: TileProgram<B> + 'static,
{
    grid.run_with(config.dispatch_config(), program, registry)
}

/// Executes the command line and returns the process exit code.
pub fn run(cli: &Cli) -> i32 {
    match execute(cli, HandlerRegistry::with_stdout_log()) {
        Ok(summary) if summary.failed_tiles == 0 => {
            info!("{} requests served, {} tiles done", summary.stats.handled, summary.stats.done);
            0
        }
        Ok(summary) => {
            eprintln!("grid-run: {} tile program(s) failed", summary.failed_tiles);
            1
        }
        Err(err) => {
            error!("run aborted: {err}");
            eprintln!("grid-run: {err}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_rpc::LogPrinter;
    use parking_lot::Mutex;
    use std::io::Write;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }

        fn registry(&self) -> HandlerRegistry {
            let mut registry = HandlerRegistry::new();
            registry.on_log(LogPrinter::new(self.clone())).unwrap();
            registry
        }
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("grid-run").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_describe_a_small_grid() {
        let cli = parse(&[]);
        assert_eq!((cli.width, cli.height, cli.backend), (2, 2, BackendKind::Emulated));
        assert_eq!(cli.demo, Demo::Hello);
    }

    #[test]
    fn config_conflicts_with_shape() {
        let err = Cli::try_parse_from(["grid-run", "--config", "a.toml", "--width", "3"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
        assert!(Cli::try_parse_from(["grid-run", "--backend", "fpga"]).is_err());
    }

    #[test]
    fn hello_greets_from_every_tile() {
        let out = Captured::default();
        let summary = execute(&parse(&["--width", "3", "--height", "2"]), out.registry()).unwrap();
        assert_eq!(summary.stats.done, 6);
        assert_eq!(summary.stats.handled, 6);
        let text = out.text();
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("hello from tile (2, 1)"));
    }

    #[test]
    fn barrier_demo_on_polled_backend() {
        let out = Captured::default();
        let cli = parse(&["--backend", "polled", "--demo", "barrier", "--rounds", "3"]);
        let summary = execute(&cli, out.registry()).unwrap();
        assert_eq!(summary.failed_tiles, 0);
        assert_eq!(
            out.text(),
            "barrier round 1 passed\nbarrier round 2 passed\nbarrier round 3 passed\n"
        );
    }

    #[test]
    fn image_demo_round_trips_frames() {
        let out = Captured::default();
        let cli = parse(&["--demo", "image", "--rounds", "4"]);
        let summary = execute(&cli, out.registry()).unwrap();
        assert_eq!(summary.failed_tiles, 0);
        // 4 tiles x 4 frames, plus the closing line of tile 0.
        assert_eq!(summary.stats.handled, 17);
        assert_eq!(out.text(), "4 frames per tile sent\n");
    }

    #[test]
    fn config_file_selects_the_grid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[grid]\nwidth = 1\nheight = 3\nbackend = \"polled\"").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let cli = parse(&["--config", path.as_str()]);
        let (config, geometry) = resolve_config(&cli).unwrap();
        assert_eq!(config.grid.backend, BackendKind::Polled);
        assert_eq!((geometry.width(), geometry.height()), (1, 3));
        assert_eq!(execute(&cli, Captured::default().registry()).unwrap().stats.done, 3);
    }

    #[test]
    fn stdout_registry_serves_the_hello_demo() {
        let cli = parse(&["--width", "1", "--height", "1"]);
        let summary = execute(&cli, HandlerRegistry::with_stdout_log()).unwrap();
        assert_eq!(summary.stats.handled, 1);
    }

    #[test]
    fn bad_shape_exits_with_failure() {
        assert_eq!(run(&parse(&["--width", "0"])), 1);
    }
}
