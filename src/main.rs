//! field-map: CLI for inspecting and sampling magnetic field maps

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use field_map::gnuplot::{generate_gnuplot_script, PlotConfig};
use field_map::sweep::{sweep, write_sweep_table, SweepRegion};
use field_map::{FieldConfig, FieldUnit, LengthUnit, MapFrame, MapRegistry, MappedMagneticField};
use nalgebra::Vector3;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "field-map")]
#[command(about = "Inspect and evaluate tabulated magnetic field maps")]
#[command(version)]
struct Cli {
    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the map header
    Info(FieldArgs),
    /// Evaluate the field at one position
    Eval {
        #[command(flatten)]
        field: FieldArgs,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        #[arg(allow_negative_numbers = true)]
        z: f64,
    },
    /// Evaluate the field over a region and write a vector table
    Sweep {
        #[command(flatten)]
        field: FieldArgs,

        /// Lower corner "x,y,z"
        #[arg(long, default_value = "-1,-3,-2", allow_hyphen_values = true)]
        min: String,

        /// Upper corner "x,y,z"
        #[arg(long, default_value = "1,3,2", allow_hyphen_values = true)]
        max: String,

        /// Step per axis "dx,dy,dz"
        #[arg(long, default_value = "0.125,0.25,0.15")]
        step: String,

        /// Keep only the slice at this y value
        #[arg(long, allow_negative_numbers = true)]
        y_slice: Option<f64>,

        /// Multiply field values by this factor in the table
        #[arg(long, default_value = "1")]
        scale: f64,

        /// Output table (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write a gnuplot script drawing the table
        #[arg(long, requires = "output")]
        gnuplot: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct FieldArgs {
    /// Map file (takes precedence over the config's map_file)
    #[arg(short, long)]
    map: Option<PathBuf>,

    /// JSON field configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame of positions and results (map, detector)
    #[arg(long)]
    frame: Option<String>,

    /// Position unit (m, cm, mm, um)
    #[arg(long)]
    length_unit: Option<String>,

    /// Field unit (mG, G, T)
    #[arg(long)]
    unit: Option<String>,

    /// Fail outside the map instead of reporting a zero field
    #[arg(long)]
    strict: bool,
}

fn parse_triple(s: &str) -> Result<Vector3<f64>> {
    let values: Vec<f64> = s
        .split(',')
        .map(|t| t.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Invalid coordinate triple: {}", s))?;
    match values.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => anyhow::bail!("Expected 3 comma-separated values, got {}", s),
    }
}

impl FieldArgs {
    fn build_config(&self) -> Result<FieldConfig> {
        let mut config = match &self.config {
            Some(path) => FieldConfig::from_path(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?,
            None => FieldConfig::default(),
        };
        if let Some(map) = &self.map {
            config.map_file = Some(map.to_string_lossy().into_owned());
        }
        if let Some(frame) = &self.frame {
            config.frame = frame.parse::<MapFrame>()?;
        }
        if let Some(unit) = &self.length_unit {
            config.length_unit = unit.parse::<LengthUnit>()?;
        }
        if let Some(unit) = &self.unit {
            config.field_unit = unit.parse::<FieldUnit>()?;
        }
        if self.strict {
            config.zero_field_outside_map = false;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let field_args = match &cli.command {
        Command::Info(field) => field,
        Command::Eval { field, .. } => field,
        Command::Sweep { field, .. } => field,
    };
    let config = field_args.build_config()?;

    let mut registry = MapRegistry::new();
    let map_path = config.resolved_map_file()?;
    let handle = config
        .load_into(&mut registry)
        .with_context(|| format!("Failed to load field map: {:?}", map_path))?;
    let grid = registry.get(handle)?;
    let field = MappedMagneticField::new(grid, &config);

    match &cli.command {
        Command::Info(_) => {
            println!("{}", field.describe());
            let (min, max) = grid.extent();
            println!(
                "  extent = ({}, {}, {}) .. ({}, {}, {}) m",
                min.x, min.y, min.z, max.x, max.y, max.z
            );
        }
        Command::Eval { x, y, z, .. } => {
            let position = Vector3::new(*x, *y, *z);
            let value = field.field_value(&position);
            let b = field.compute_magnetic_field(&position)?;
            println!(
                "B = ({}, {}, {}) {}  in_map={}",
                b.x,
                b.y,
                b.z,
                config.field_unit.symbol(),
                value.in_bounds
            );
        }
        Command::Sweep {
            min,
            max,
            step,
            y_slice,
            scale,
            output,
            gnuplot,
            ..
        } => {
            let region = SweepRegion {
                min: parse_triple(min)?,
                max: parse_triple(max)?,
                step: parse_triple(step)?,
                y_slice: *y_slice,
            };
            let result = sweep(&field, &region).context("Sweep failed")?;

            match output {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("Failed to create output file: {:?}", path))?;
                    write_sweep_table(&result.points, *scale, BufWriter::new(file))
                        .with_context(|| format!("Failed to write output file: {:?}", path))?;
                    eprintln!("Wrote {} field vectors: {:?}", result.points.len(), path);
                }
                None => write_sweep_table(&result.points, *scale, std::io::stdout().lock())?,
            }

            if let (Some(script_path), Some(data_path)) = (gnuplot, output) {
                let plot = PlotConfig {
                    length_unit: config.length_unit.symbol().to_string(),
                    field_unit: config.field_unit.symbol().to_string(),
                    scale: *scale,
                    projection: y_slice.is_some(),
                    ..PlotConfig::default()
                };
                let script = generate_gnuplot_script(&data_path.to_string_lossy(), &region, &plot)?;
                fs::write(script_path, &script)
                    .with_context(|| format!("Failed to write gnuplot script: {:?}", script_path))?;
                eprintln!("Generated gnuplot script: {:?}", script_path);
            }

            eprintln!(
                "B(max)  is : {} {}",
                result.b_max,
                config.field_unit.symbol()
            );
            eprintln!(
                "Bz(max) is : {} {}",
                result.bz_max,
                config.field_unit.symbol()
            );
        }
    }

    Ok(())
}
