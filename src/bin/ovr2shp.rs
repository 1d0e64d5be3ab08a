//! ovr2shp
//!
//! Converts the vector annotations of Erdas Imagine overlay files (`.ovr`)
//! into Shapefiles or GeoJSON.
//!
//! Without `--output` the tool only reads a single overlay and prints what it
//! found; `--tree` and `--dict` add the raw entry tree and data dictionary.
//!
//! ```bash
//! ovr2shp site.ovr -d --tree
//! ovr2shp surveys/ -o out --format geojson
//! ```

use clap::Parser;
use hfa_anno::annotation::{AnnotationLayer, ExtractOptions};
use hfa_anno::convert::{ConvertOptions, convert_path, is_overlay};
use hfa_anno::export::OutputFormat;
use hfa_anno::hfa::{HfaFile, PairLayout};
use hfa_anno::srs::SpatialReference;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Extract annotations from Erdas Imagine overlay files
#[derive(Parser, Debug)]
#[command(name = "ovr2shp", version)]
#[command(about = "Convert Erdas Imagine .ovr annotations to Shapefile or GeoJSON")]
struct Args {
    /// Overlay file, or a directory searched recursively for .ovr files
    src: PathBuf,

    /// Output directory; without it the overlay is only read and displayed
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: shp or geojson
    #[arg(short, long, default_value = "shp")]
    format: OutputFormat,

    /// PROJ.4 definition overriding the overlay's spatial reference
    #[arg(long, value_name = "PROJ4")]
    srs: Option<String>,

    /// Vertex pairing in coordinate matrices: interleaved or planar
    #[arg(long, default_value = "interleaved")]
    pair_layout: PairLayout,

    /// Name of the element list entry
    #[arg(long, default_value = "ElementList")]
    element_list: String,

    /// Print the decoded annotations
    #[arg(short, long)]
    display: bool,

    /// Print the HFA entry tree
    #[arg(long)]
    tree: bool,

    /// Print the HFA data dictionary
    #[arg(long)]
    dict: bool,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions::new()
            .with_pair_layout(self.pair_layout)
            .with_element_list(self.element_list.clone())
    }
}

fn read(args: &Args) -> hfa_anno::Result<()> {
    if !is_overlay(&args.src) {
        return Err(hfa_anno::Error::InvalidInput(format!(
            "'{}' is not an .ovr file",
            args.src.display()
        )));
    }
    let file = HfaFile::open(&args.src)?;

    if args.dict {
        println!("{}", file.dictionary());
    }
    if args.tree {
        println!("{}", file.root().dump());
    }
    if args.display || !(args.tree || args.dict) {
        let mut layer = AnnotationLayer::from_file(&file, &args.extract_options())?;
        if let Some(proj4) = &args.srs {
            layer.set_srs(SpatialReference::from_proj4(proj4)?);
        }
        println!("{}", layer);
    }
    Ok(())
}

fn convert(args: &Args, output: &Path) -> hfa_anno::Result<bool> {
    if args.display || args.tree || args.dict {
        warn!("display options are ignored when converting");
    }

    let mut options = ConvertOptions::new(output)
        .with_format(args.format)
        .with_extract_options(args.extract_options());
    if let Some(proj4) = &args.srs {
        options = options.with_srs_override(proj4.clone());
    }

    let report = convert_path(&args.src, &options)?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).map_err(|e| hfa_anno::Error::Other(e.to_string()))?
        );
    } else {
        print!("{}", report);
    }
    Ok(report.is_success())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hfa_anno=info,ovr2shp=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let result = match &args.output {
        Some(output) => convert(&args, output),
        None => read(&args).map(|()| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        },
    }
}
