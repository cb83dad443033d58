//!
//! Command-line interface for synseg segment review data.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand};

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

use synseg_core::{DataRange, Levels, ReviewSession, Verdict};
use synseg_io::{read_overrides, read_segment_table, write_segment_heatmap, SegmentTableWriter};
use synseg_volume::{assign_voxels, reduce_centroids, splat_kernel};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("interchange error: {0}")]
    SynsegIo(#[from] synseg_io::Error),

    #[error("core error: {0}")]
    Core(#[from] synseg_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Interactive-review data processor for detected segment tables.
#[derive(Parser)]
#[command(name = "synseg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Threshold levels shared by the classifying subcommands, normalized
/// to the display scale. Unset levels fall back to the batch-derived
/// startup values.
#[derive(clap::Args)]
struct LevelArgs {
    /// Small-feature (core) floor level
    #[arg(long)]
    floor: Option<f32>,

    /// Nuclei-scale (hollow) ceiling level
    #[arg(long)]
    nuclear: Option<f32>,

    /// Red-channel mask ceiling level
    #[arg(long)]
    mask: Option<f32>,
}

impl LevelArgs {
    fn resolve(&self, mut levels: Levels) -> Levels {
        if let Some(floor) = self.floor {
            levels.floor = floor;
        }
        if let Some(nuclear) = self.nuclear {
            levels.nuclear = nuclear;
        }
        if let Some(mask) = self.mask {
            levels.mask = mask;
        }
        levels
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a segment table
    Info {
        /// Input segment table
        input: PathBuf,

        /// Emit machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Classify segments under threshold levels
    Classify {
        /// Input segment table
        input: PathBuf,

        #[command(flatten)]
        levels: LevelArgs,

        /// Write the included segments to this table
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rasterize the label volume and report occupancy
    Label {
        /// Input segment table
        input: PathBuf,

        /// Reduced volume shape as Z Y X
        #[arg(long, num_args = 3, required = true)]
        shape: Vec<usize>,

        /// Per-axis spatial reduction as Z Y X
        #[arg(long, num_args = 3, default_values_t = [1usize, 1, 1])]
        reduction: Vec<usize>,

        /// Physical segment diameter per axis (same units as spacing)
        #[arg(long, num_args = 3, default_values_t = [2.75f32, 1.5, 1.5])]
        diameter: Vec<f32>,

        /// Physical voxel spacing per axis
        #[arg(long, num_args = 3, default_values_t = [0.4f32, 0.26, 0.26])]
        spacing: Vec<f32>,

        /// Dump the byte-tuple encoded volume to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the classification heatmap
    Heatmap {
        /// Input segment table
        input: PathBuf,

        /// Output PNG path
        output: PathBuf,

        #[command(flatten)]
        levels: LevelArgs,
    },

    /// Merge manual overrides into a segment table
    Merge {
        /// Live segment table
        table: PathBuf,

        /// Override file exported from an earlier review of the same run
        overrides: PathBuf,

        /// Output table with the merged overrides
        output: PathBuf,

        /// Retire the merged overrides instead of leaving them clickable
        #[arg(long)]
        retire: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { input, json } => {
            let (batch, statuses) = read_segment_table(&input)?;
            let range = DataRange::from_batch(&batch);
            let levels = Levels::reset(&batch, range);
            let overrides = statuses.iter().filter(|s| s.has_override()).count();

            if json {
                let info = serde_json::json!({
                    "file": input.display().to_string(),
                    "segments": batch.len(),
                    "columns": batch.columns().len(),
                    "overrides": overrides,
                    "core_mean": batch.core_mean(),
                    "hollow_mean": batch.hollow_mean(),
                    "data_min": range.min,
                    "data_max": range.max,
                });
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", serde_json::to_string_pretty(&info)?)?;
            } else {
                println!("File: {}", input.display());
                println!("Segments: {}", batch.len());
                println!("Measure columns: {}", batch.columns().len());
                println!("Overrides present: {}", overrides);
                println!("Core mean: {}", batch.core_mean());
                println!("Hollow mean: {}", batch.hollow_mean());
                println!("Data range: [{}, {}]", range.min, range.max);
                println!("{}", levels.report(range));
            }
        }

        Commands::Classify {
            input,
            levels,
            output,
        } => {
            let (batch, _) = read_segment_table(&input)?;
            let range = DataRange::from_batch(&batch);
            let base = Levels::reset(&batch, range);
            let session = ReviewSession::new(batch, range)?.with_levels(levels.resolve(base));
            let mut included = 0usize;
            let mut keep = Vec::new();
            for index in 0..session.len() {
                if session.classify_auto(index) == Verdict::Included {
                    included += 1;
                    keep.push(index);
                }
            }
            println!("Included: {}", included);
            println!("Excluded: {}", session.len() - included);

            if let Some(output) = output {
                let mut filtered =
                    synseg_core::SegmentBatch::new(session.batch().columns());
                for &index in &keep {
                    filtered.push(
                        session.batch().centroid(index),
                        session.batch().measures_row(index),
                    )?;
                }
                let statuses =
                    vec![synseg_core::SegmentStatus::Default; filtered.len()];
                let mut writer = SegmentTableWriter::create(&output)?;
                writer.write_overrides(&filtered, &statuses)?;
                println!("Wrote {} segments to {}", keep.len(), output.display());
            }
        }

        Commands::Label {
            input,
            shape,
            reduction,
            diameter,
            spacing,
            output,
        } => {
            let (batch, _) = read_segment_table(&input)?;
            let shape = [shape[0], shape[1], shape[2]];
            let reduction = [reduction[0], reduction[1], reduction[2]];

            let start = Instant::now();
            let kernel = splat_kernel(
                [diameter[0], diameter[1], diameter[2]],
                [spacing[0], spacing[1], spacing[2]],
                reduction,
            );
            let centroids = reduce_centroids(&batch, reduction);
            let weights: Vec<f32> = (0..batch.len()).map(|i| batch.core(i)).collect();
            let volume = assign_voxels(&weights, &centroids, shape, kernel.view())?;

            println!(
                "Rasterized {} segments in {:.2}s",
                batch.len(),
                start.elapsed().as_secs_f64()
            );
            println!(
                "Occupied voxels: {} of {}",
                volume.occupied(),
                shape.iter().product::<usize>()
            );
            println!("Encoding width: {} bytes", volume.codec().width());

            if let Some(output) = output {
                let encoded = volume.encoded();
                let bytes: Vec<u8> = encoded.iter().copied().collect();
                std::fs::write(&output, bytes)?;
                println!("Wrote encoded volume to {}", output.display());
            }
        }

        Commands::Heatmap {
            input,
            output,
            levels,
        } => {
            let (batch, _) = read_segment_table(&input)?;
            let range = DataRange::from_batch(&batch);
            let resolved = levels.resolve(Levels::reset(&batch, range));
            write_segment_heatmap(&output, &batch, &resolved, range)?;
            println!("Wrote heatmap to {}", output.display());
        }

        Commands::Merge {
            table,
            overrides,
            output,
            retire,
        } => {
            let (batch, statuses) = read_segment_table(&table)?;
            let range = DataRange::from_batch(&batch);
            let mut session = ReviewSession::new(batch, range)?;

            // The table's own override column reloads first, then the
            // separately saved override file on top of it.
            let own: Vec<(usize, synseg_core::SegmentStatus)> = statuses
                .iter()
                .enumerate()
                .filter(|(_, s)| s.has_override())
                .map(|(i, s)| (i, s.reloaded()))
                .collect();
            session.apply_overrides(&own);

            let matches = read_overrides(&overrides, session.batch())?;
            session.apply_overrides(&matches);
            println!(
                "Applied {} overrides from {}",
                matches.len(),
                overrides.display()
            );

            if retire {
                let retired = session.retire();
                println!("Retired {} overrides", retired);
            }

            let mut writer = SegmentTableWriter::create(&output)?;
            writer.write_overrides(session.batch(), session.statuses())?;
            println!("Wrote merged table to {}", output.display());
        }
    }

    Ok(())
}
