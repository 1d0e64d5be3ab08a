//! Overlay to vector conversion, for single files and directory trees.
//!
//! ```no_run
//! use hfa_anno::convert::{ConvertOptions, convert_path};
//! use hfa_anno::export::OutputFormat;
//!
//! # fn main() -> Result<(), hfa_anno::Error> {
//! let options = ConvertOptions::new("out").with_format(OutputFormat::GeoJson);
//! let report = convert_path("surveys/", &options)?;
//! print!("{}", report);
//! # Ok(())
//! # }
//! ```

use crate::annotation::{AnnotationLayer, ExtractOptions, GeometryKind};
use crate::common::{Error, Result};
use crate::export::OutputFormat;
use crate::srs::SpatialReference;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span, warn};
use walkdir::WalkDir;

/// Overlay file extension, matched case-insensitively.
pub const OVERLAY_EXTENSION: &str = "ovr";

/// Conversion options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Root output directory; each input gets a `<stem>/` subdirectory
    pub output_dir: PathBuf,

    /// Output format (default: Shapefile)
    pub format: OutputFormat,

    /// PROJ.4 definition replacing the file's spatial reference
    pub srs_override: Option<String>,

    /// Annotation extraction options
    pub extract: ExtractOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            format: OutputFormat::default(),
            srs_override: None,
            extract: ExtractOptions::default(),
        }
    }
}

impl ConvertOptions {
    /// Create options writing below `output_dir`.
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Use a PROJ.4 definition instead of the file's map information.
    pub fn with_srs_override<S: Into<String>>(mut self, proj4: S) -> Self {
        self.srs_override = Some(proj4.into());
        self
    }

    pub fn with_extract_options(mut self, extract: ExtractOptions) -> Self {
        self.extract = extract;
        self
    }
}

/// Outcome of one successful file conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertSummary {
    pub source: PathBuf,
    pub annotations: usize,
    /// Elements found but not decodable
    pub skipped: usize,
    /// Feature count per output layer
    pub layers: Vec<(GeometryKind, usize)>,
    pub outputs: Vec<PathBuf>,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub converted: Vec<ConvertSummary>,
    /// Input path and the error that stopped it
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Converted {} file(s), {} failed",
            self.converted.len(),
            self.failed.len()
        )?;
        if !self.failed.is_empty() {
            writeln!(f, "Failed to convert:")?;
            for (path, reason) in &self.failed {
                writeln!(f, "  ✗ {}: {}", path.display(), reason)?;
            }
        }
        Ok(())
    }
}

/// Whether `path` has the overlay extension.
pub fn is_overlay(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(OVERLAY_EXTENSION))
}

/// All overlay files below `dir`, sorted by path.
pub fn find_overlays(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if is_overlay(entry.path()) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Convert one overlay into `<output_dir>/<stem>/<stem>_<kind>.*`.
///
/// Files without any supported annotation fail with
/// [`Error::NoAnnotations`] and write nothing.
pub fn convert_file<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<ConvertSummary> {
    let path = path.as_ref();
    let span = info_span!("ovr", path = %path.display());
    let _guard = span.enter();

    let srs_override = options
        .srs_override
        .as_deref()
        .map(SpatialReference::from_proj4)
        .transpose()?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("'{}' has no file name", path.display())))?;

    let mut layer = AnnotationLayer::open(path, &options.extract)?;
    if layer.is_empty() {
        warn!(skipped = layer.skipped(), "no supported annotations");
        return Err(Error::NoAnnotations);
    }
    if let Some(srs) = srs_override {
        layer.set_srs(srs);
    }

    let dir = options.output_dir.join(&stem);
    let mut writer = options.format.writer(&dir, &stem);
    let export = layer.export(writer.as_mut())?;

    info!(
        annotations = layer.len(),
        files = export.files.len(),
        output = %dir.display(),
        "converted"
    );
    Ok(ConvertSummary {
        source: path.to_path_buf(),
        annotations: layer.len(),
        skipped: layer.skipped(),
        layers: export.layers,
        outputs: export.files,
    })
}

/// Convert a single `.ovr` file or every `.ovr` file below a directory.
///
/// Per-file failures are collected in the report; only an unusable `path`
/// fails the whole call.
pub fn convert_path<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<BatchReport> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::InvalidInput(format!(
            "'{}' does not exist",
            path.display()
        )));
    }

    let inputs = if path.is_dir() {
        let found = find_overlays(path)?;
        if found.is_empty() {
            warn!(dir = %path.display(), "no .ovr files found");
        }
        found
    } else if is_overlay(path) {
        vec![path.to_path_buf()]
    } else {
        return Err(Error::InvalidInput(format!(
            "'{}' is not an .ovr file",
            path.display()
        )));
    };

    let mut report = BatchReport::default();
    for input in inputs {
        match convert_file(&input, options) {
            Ok(summary) => report.converted.push(summary),
            Err(e) => {
                error!(path = %input.display(), error = %e, "conversion failed");
                report.failed.push((input, e.to_string()));
            },
        }
    }
    info!(
        converted = report.converted.len(),
        failed = report.failed.len(),
        "batch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::fixture::{OvrBuilder, ShapeSpec};
    use std::fs;

    fn overlay() -> Vec<u8> {
        let mut b = OvrBuilder::new();
        b.map_info((500000.0, 6000000.0), "meters")
            .projection(1, 55, false, "WGS 84");
        b.element(1, "Lake", 10, ShapeSpec::text((5.0, 5.0), "Lake"));
        b.element(2, "Field", 12, ShapeSpec::rectangle((10.0, 20.0), 4.0, 2.0, 0.0));
        b.build_bytes()
    }

    #[test]
    fn test_convert_single_file() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let path = input.path().join("site.OVR");
        fs::write(&path, overlay()).unwrap();

        let report = convert_path(&path, &ConvertOptions::new(output.path())).unwrap();
        assert!(report.is_success());
        let summary = &report.converted[0];
        assert_eq!(summary.annotations, 2);
        assert_eq!(
            summary.layers,
            [(GeometryKind::Point, 1), (GeometryKind::Polygon, 1)]
        );
        assert!(output.path().join("site/site_points.shp").exists());
        assert!(output.path().join("site/site_polygons.dbf").exists());
        assert!(output.path().join("site/site_polygons.prj").exists());
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::create_dir(input.path().join("nested")).unwrap();
        fs::write(input.path().join("a.ovr"), overlay()).unwrap();
        fs::write(
            input.path().join("b.ovr"),
            OvrBuilder::without_element_list().build_bytes(),
        )
        .unwrap();
        fs::write(input.path().join("nested/c.ovr"), overlay()).unwrap();
        fs::write(input.path().join("notes.txt"), "not an overlay").unwrap();

        let options = ConvertOptions::new(output.path()).with_format(OutputFormat::GeoJson);
        let report = convert_path(input.path(), &options).unwrap();

        assert_eq!(report.converted.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("b.ovr"));
        assert!(report.failed[0].1.contains("ElementList"));
        assert!(output.path().join("a/a_points.geojson").exists());
        assert!(output.path().join("c/c_polygons.geojson").exists());
        assert!(!output.path().join("b").exists());

        let shown = report.to_string();
        assert!(shown.contains("Failed to convert:"));
        assert!(shown.contains("✗"));
    }

    #[test]
    fn test_input_validation() {
        let dir = tempfile::tempdir().unwrap();
        let options = ConvertOptions::new(dir.path());
        assert!(matches!(
            convert_path(dir.path().join("missing.ovr"), &options),
            Err(Error::InvalidInput(_))
        ));
        let img = dir.path().join("scene.img");
        fs::write(&img, overlay()).unwrap();
        assert!(matches!(convert_path(&img, &options), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_fatal_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let options = ConvertOptions::new(dir.path().join("out"));

        let garbage = dir.path().join("garbage.ovr");
        fs::write(&garbage, b"definitely not an HFA image").unwrap();
        assert!(matches!(convert_file(&garbage, &options), Err(Error::NotHfaFile)));

        let mut b = OvrBuilder::new();
        b.element(1, "Odd", 99, ShapeSpec::point((1.0, 1.0)));
        let empty = dir.path().join("empty.ovr");
        fs::write(&empty, b.build_bytes()).unwrap();
        assert!(matches!(convert_file(&empty, &options), Err(Error::NoAnnotations)));
        assert!(!dir.path().join("out/empty").exists());
    }

    #[test]
    fn test_srs_override() {
        let input = tempfile::tempdir().unwrap();
        let path = input.path().join("site.ovr");
        fs::write(&path, overlay()).unwrap();

        let options = ConvertOptions::new(input.path().join("out"))
            .with_srs_override("+proj=utm +zone=56 +south +datum=WGS84 +units=m +no_defs");
        convert_file(&path, &options).unwrap();
        let prj = fs::read_to_string(input.path().join("out/site/site_points.prj")).unwrap();
        assert!(prj.contains("UTM_Zone_56S"));

        let bad = options.clone().with_srs_override("utm zone 56");
        assert!(matches!(convert_file(&path, &bad), Err(Error::InvalidInput(_))));
    }
}
