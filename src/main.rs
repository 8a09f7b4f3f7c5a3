//! Sprite atlas packer CLI
//!
//! Subcommands:
//!   pack    Combine a directory of .png sprites into one grid atlas with
//!           cell-size tags (default when no subcommand is given, over the
//!           working directory)
//!   inspect Report an atlas's dimensions, cell tags, and occupancy
//!
//! Example pack:
//!   cargo run -- pack frames/ --cell-size min --manifest

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use sprite_packer::atlas::{self, CellSizePolicy, PackConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about="Pack same-size sprites into a grid atlas", long_about=None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack .png sprites from a directory into a single atlas
    Pack(PackArgs),
    /// Inspect an existing atlas PNG for cell geometry and occupancy
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct PackArgs {
    /// Directory scanned for .png inputs
    #[arg(default_value=".")] dir: PathBuf,
    /// Cell sizing: min lets larger sprites overflow, max fits every sprite
    #[arg(long, value_enum, default_value_t=CellSizePolicy::Min)] cell_size: CellSizePolicy,
    /// Override the derived `<stem>atlas.png` output path
    #[arg(long)] out_png: Option<PathBuf>,
    /// Also write a JSON manifest with per-frame pixel and UV rects
    #[arg(long)] manifest: bool,
    #[arg(long)] out_json: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    atlas_png: PathBuf,
}

fn cmd_pack(a: PackArgs) -> Result<()> {
    let cfg = PackConfig {
        input_dir: a.dir,
        cell_size_policy: a.cell_size,
        out_png: a.out_png,
        out_json: a.out_json,
        write_manifest: a.manifest,
    };
    let artifact = atlas::pack_directory(&cfg)?;
    atlas::write_outputs(&artifact, &cfg)?;
    let d = artifact.descriptor;
    println!(
        "Packed {} sprites into {} ({}x{}, grid {}x{}, cell {}x{})",
        artifact.manifest.frames.len(),
        artifact.png_path.display(),
        artifact.image.width(),
        artifact.image.height(),
        d.grid_size,
        d.grid_size,
        d.cell_width,
        d.cell_height
    );
    if cfg.write_manifest {
        println!("Wrote manifest {}", artifact.json_path.display());
    }
    Ok(())
}

fn cmd_inspect(a: InspectArgs) -> Result<()> {
    let res = atlas::inspect(&a.atlas_png)?;
    match (res.cell, res.grid_size) {
        (Some((cw, ch)), Some(g)) => println!(
            "Atlas: {}x{} cell={}x{} grid={} occupied={}/{}",
            res.atlas_dim.0, res.atlas_dim.1, cw, ch, g, res.occupied, res.total_cells
        ),
        _ => println!("Atlas: {}x{} (no cell tags)", res.atlas_dim.0, res.atlas_dim.1),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Pack(PackArgs {
        dir: PathBuf::from("."),
        cell_size: CellSizePolicy::Min,
        out_png: None,
        manifest: false,
        out_json: None,
    }));
    match command {
        Commands::Pack(a) => cmd_pack(a),
        Commands::Inspect(a) => cmd_inspect(a),
    }
}
