use std::{path::PathBuf, process};

use anyhow::Result;
use clap::{Parser, ValueEnum};

use model2scene::{
    ConvertOptions,
    export::{JsonSceneExporter, export_model, export_models},
    model::Model,
    texture::{RawTextureDecoder, ResizeInterpolation, TextureDatabase},
};

/// Converts model dumps into a scene graph with side-car textures.
#[derive(Debug, Parser)]
#[command(name = "model2scene", version, about)]
struct Cli {
    /// Model JSON files. Several inputs are merged into one scene.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output scene file.
    #[arg(short, long)]
    output: PathBuf,

    /// Texture database JSON used to give textures readable names.
    #[arg(long)]
    texture_db: Option<PathBuf>,

    /// Append `_ID=<id>_` tags to bone and mesh node names.
    #[arg(long)]
    tags: bool,

    /// Skip writing side-car textures.
    #[arg(long)]
    no_textures: bool,

    /// Downscale textures larger than this many pixels.
    #[arg(long, value_name = "PX")]
    max_texture_size: Option<u32>,

    /// Interpolation used when downscaling textures.
    #[arg(long, value_enum, default_value_t = ResizeArg::Bilinear)]
    resize: ResizeArg,

    /// Write compact JSON instead of pretty-printed output.
    #[arg(long)]
    compact: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResizeArg {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<ResizeArg> for ResizeInterpolation {
    fn from(value: ResizeArg) -> Self {
        match value {
            ResizeArg::Nearest => ResizeInterpolation::Nearest,
            ResizeArg::Bilinear => ResizeInterpolation::Bilinear,
            ResizeArg::Bicubic => ResizeInterpolation::Bicubic,
            ResizeArg::Lanczos3 => ResizeInterpolation::Lanczos3,
        }
    }
}

impl Cli {
    fn options(&self) -> ConvertOptions {
        ConvertOptions {
            append_tags: self.tags,
            export_textures: !self.no_textures,
            max_texture_size: self.max_texture_size,
            texture_resize_method: self.resize.into(),
            pretty_json: !self.compact,
        }
    }
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = cli.options();
    let texture_database = cli
        .texture_db
        .as_deref()
        .map(TextureDatabase::load)
        .transpose()?;
    let models = cli
        .inputs
        .iter()
        .map(|path| Model::load(path))
        .collect::<Result<Vec<_>>>()?;

    let exporter = JsonSceneExporter {
        pretty: options.pretty_json,
    };
    let report = match models.as_slice() {
        [model] => export_model(
            model,
            &cli.output,
            texture_database.as_ref(),
            &exporter,
            &RawTextureDecoder,
            &options,
        )?,
        models => export_models(
            models,
            &cli.output,
            texture_database.as_ref(),
            &exporter,
            &RawTextureDecoder,
            &options,
        )?,
    };

    println!("Output: {}", report.output_path.display());
    println!(
        "Nodes: {}, Meshes: {}, Materials: {}",
        report.node_count, report.mesh_count, report.material_count
    );
    println!("Bones: {}", report.bone_count);
    println!("Textures: {}", report.texture_count);

    Ok(())
}
