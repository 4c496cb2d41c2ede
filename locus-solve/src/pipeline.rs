//! Batch driver: load inputs, locate every track, write outputs.

use crate::aggregate::{AggregateStats, aggregate_with_stats};
use crate::error::PipelineError;
use crate::triangulate::triangulate_all;
use locus_data::{
    DEFAULT_COLOR, Intrinsics, PoseRegistry, TrackPoint, export_boxes, export_labels,
    export_points, export_wireframe, load_detections, load_poses,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default edge length of exported boxes, in world units.
pub const DEFAULT_BOX_SIZE: f64 = 0.2;

/// Fixed pinhole intrinsics for runs without a `cameras.txt`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl From<FallbackIntrinsics> for Intrinsics {
    fn from(k: FallbackIntrinsics) -> Self {
        Intrinsics::new(k.fx, k.fy, k.cx, k.cy)
    }
}

/// Input and output locations for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Detection table (CSV).
    pub detections: PathBuf,
    /// COLMAP `cameras.txt`; when absent, `fallback_intrinsics` is required.
    pub cameras: Option<PathBuf>,
    /// COLMAP `images.txt`.
    pub images: PathBuf,
    /// Point cloud PLY.
    pub output: PathBuf,
    pub box_output: Option<PathBuf>,
    pub box_size: f64,
    pub wireframe_output: Option<PathBuf>,
    pub labels_output: Option<PathBuf>,
    pub fallback_intrinsics: Option<FallbackIntrinsics>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detections: PathBuf::from("tracking_with_cls.csv"),
            cameras: None,
            images: PathBuf::from("images.txt"),
            output: PathBuf::from("defect_points.ply"),
            box_output: None,
            box_size: DEFAULT_BOX_SIZE,
            wireframe_output: None,
            labels_output: None,
            fallback_intrinsics: None,
        }
    }
}

impl PipelineConfig {
    /// Standard workspace layout produced by the reconstruction step.
    pub fn from_workspace<P: AsRef<Path>>(workspace: P) -> Self {
        let w = workspace.as_ref();
        let sparse = w.join("sparse").join("0");
        Self {
            detections: w.join("tracking_with_cls.csv"),
            cameras: Some(sparse.join("cameras.txt")),
            images: sparse.join("images.txt"),
            output: w.join("defect_points.ply"),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if !(self.box_size.is_finite() && self.box_size > 0.0) {
            return Err(PipelineError::InvalidBoxSize(self.box_size));
        }
        if let Some(k) = self.fallback_intrinsics {
            if !Intrinsics::from(k).is_valid() {
                return Err(PipelineError::InvalidIntrinsics([k.fx, k.fy, k.cx, k.cy]));
            }
        }
        if self.cameras.is_none() && self.fallback_intrinsics.is_none() {
            return Err(PipelineError::NoIntrinsics);
        }
        Ok(())
    }

    /// Load the pose registry this configuration describes.
    pub fn load_registry(&self) -> Result<PoseRegistry, PipelineError> {
        self.validate()?;
        match (&self.cameras, self.fallback_intrinsics) {
            (Some(cameras), fallback) => {
                if fallback.is_some() {
                    warn!("Both a cameras file and fallback intrinsics given, using the cameras file");
                }
                Ok(PoseRegistry::load(cameras, &self.images)?)
            }
            (None, Some(k)) => {
                let registry = PoseRegistry::with_shared_intrinsics(k.into(), load_poses(&self.images)?);
                info!(
                    "Pose registry ready: shared intrinsics, {} frames",
                    registry.frame_count()
                );
                Ok(registry)
            }
            (None, None) => Err(PipelineError::NoIntrinsics),
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: AggregateStats,
    pub points: Vec<TrackPoint>,
}

/// Run the whole batch step.
///
/// Zero surviving tracks is not an error: empty but valid files are written.
#[tracing::instrument(skip_all, fields(detections = %config.detections.display()))]
pub fn run(config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    let registry = config.load_registry()?;
    let detections = load_detections(&config.detections)?;

    let (bundles, stats) = aggregate_with_stats(&detections, &registry);
    let points = triangulate_all(bundles);
    if points.is_empty() {
        warn!("No track could be located, writing an empty point set");
    }

    export_points(&config.output, &points, DEFAULT_COLOR)?;
    if let Some(path) = &config.box_output {
        export_boxes(path, &points, config.box_size, DEFAULT_COLOR)?;
    }
    if let Some(path) = &config.wireframe_output {
        export_wireframe(path, &points, config.box_size)?;
    }
    if let Some(path) = &config.labels_output {
        export_labels(path, &points)?;
    }

    info!(
        "Done. Saved {} points to {}",
        points.len(),
        config.output.display()
    );
    Ok(RunSummary { stats, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use locus_data::{DataError, load_labels, read_header};
    use std::fs;
    use std::io::BufReader;

    const CAMERAS: &str = "\
# Camera list with one line of data per camera:
1 PINHOLE 1920 1080 1000 1000 960 540
";

    fn write_workspace(dir: &Path, images: &str, detections: &str) -> PipelineConfig {
        let sparse = dir.join("sparse").join("0");
        fs::create_dir_all(&sparse).unwrap();
        fs::write(sparse.join("cameras.txt"), CAMERAS).unwrap();
        fs::write(sparse.join("images.txt"), images).unwrap();
        fs::write(dir.join("tracking_with_cls.csv"), detections).unwrap();
        PipelineConfig::from_workspace(dir)
    }

    fn header_count(path: &Path, element: &str) -> Option<usize> {
        let file = fs::File::open(path).unwrap();
        read_header(BufReader::new(file)).unwrap().element_count(element)
    }

    #[test]
    fn test_two_camera_parallel_axes() {
        // Camera A at the origin, camera B with t = (-1, 0, 0), both seeing
        // track 7 at the principal point. The rays are parallel; the
        // minimum-norm solution lies midway between the two optical axes.
        let dir = tempfile::tempdir().unwrap();
        let images = "\
1 1 0 0 0 0 0 0 1 frame_0000.jpg

2 1 0 0 0 -1 0 0 1 frame_0001.jpg

";
        let detections = "frame,track_id,class,center_x,center_y\n0,7,crack,960,540\n1,7,crack,960,540\n";
        let config = write_workspace(dir.path(), images, detections);

        let summary = run(&config).unwrap();
        assert_eq!(summary.points.len(), 1);
        let point = &summary.points[0];
        assert_eq!(point.track_id, 7);
        assert!(point.position.is_finite());
        assert!(point.position.y.abs() < 1e-6);
        assert!(point.position.z >= -1e-9);
        assert!((point.position.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_two_camera_converging_rays() {
        // Same rig, camera B looks at (0, 0, 5) from (1, 0, 0).
        let dir = tempfile::tempdir().unwrap();
        let images = "\
1 1 0 0 0 0 0 0 1 frame_0000.jpg

2 1 0 0 0 -1 0 0 1 frame_0001.jpg

";
        let detections = "frame,track_id,class,center_x,center_y\n0,7,crack,960,540\n1,7,crack,760,540\n";
        let mut config = write_workspace(dir.path(), images, detections);
        config.box_output = Some(dir.path().join("boxes.ply"));
        config.labels_output = Some(dir.path().join("labels.json"));

        let summary = run(&config).unwrap();
        let point = &summary.points[0];
        assert!(point.position.z > 0.0);
        assert!(point.position.x.abs() < 1e-6);
        assert!(point.position.y.abs() < 1e-6);
        assert!((point.position.z - 5.0).abs() < 1e-6);

        assert_eq!(header_count(&config.output, "vertex"), Some(1));
        assert_eq!(header_count(&dir.path().join("boxes.ply"), "face"), Some(12));
        let labels = load_labels(dir.path().join("labels.json")).unwrap();
        assert_eq!(labels[0].class_label, "crack");
        assert_eq!(labels[0].rays, 2);
    }

    #[test]
    fn test_no_surviving_tracks_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let images = "1 1 0 0 0 0 0 0 1 frame_0000.jpg\n\n";
        let detections = "frame,track_id,class,center_x,center_y\n0,1,crack,960,540\n5,1,crack,960,540\n";
        let mut config = write_workspace(dir.path(), images, detections);
        config.wireframe_output = Some(dir.path().join("wire.ply"));

        let summary = run(&config).unwrap();
        assert!(summary.points.is_empty());
        assert_eq!(summary.stats.tracks_too_short, 1);
        assert_eq!(header_count(&config.output, "vertex"), Some(0));
        assert_eq!(header_count(&dir.path().join("wire.ply"), "edge"), Some(0));
    }

    #[test]
    fn test_fallback_intrinsics_without_cameras_file() {
        let dir = tempfile::tempdir().unwrap();
        let images_path = dir.path().join("images.txt");
        fs::write(
            &images_path,
            "1 1 0 0 0 0 0 0 3 frame_0000.png\n\n2 1 0 0 0 -1 0 0 4 frame_0001.png\n\n",
        )
        .unwrap();
        let detections_path = dir.path().join("centers.csv");
        fs::write(
            &detections_path,
            "frame,track_id,class,center_x,center_y\n0,1,crack,960,540\n1,1,crack,760,540\n",
        )
        .unwrap();

        let config = PipelineConfig {
            detections: detections_path,
            images: images_path,
            output: dir.path().join("out.ply"),
            fallback_intrinsics: Some(FallbackIntrinsics {
                fx: 1000.0,
                fy: 1000.0,
                cx: 960.0,
                cy: 540.0,
            }),
            ..PipelineConfig::default()
        };
        let summary = run(&config).unwrap();
        assert_eq!(summary.points.len(), 1);
        assert!((summary.points[0].position.z - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_columns_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let images = "1 1 0 0 0 0 0 0 1 frame_0000.jpg\n\n";
        let config = write_workspace(dir.path(), images, "frame,id,x,y\n0,1,2,3\n");
        let err = run(&config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Data(DataError::MissingColumns { .. })
        ));
        assert!(!config.output.exists());
    }

    #[test]
    fn test_unwritable_output_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let images = "1 1 0 0 0 0 0 0 1 frame_0000.jpg\n\n";
        let mut config = write_workspace(
            dir.path(),
            images,
            "frame,track_id,class,center_x,center_y\n",
        );
        config.output = dir.path().join("missing-dir").join("out.ply");
        let err = run(&config).unwrap_err();
        assert!(err.to_string().contains("missing-dir"));
    }

    #[test]
    fn test_load_registry_from_cameras_file() {
        let dir = tempfile::tempdir().unwrap();
        let images = "1 1 0 0 0 0 0 0 1 frame_0000.jpg\n\n2 1 0 0 0 -1 0 0 2 frame_0001.jpg\n\n";
        let mut config = write_workspace(dir.path(), images, "frame,track_id,class,center_x,center_y\n");

        let registry = config.load_registry().unwrap();
        assert_eq!(registry.camera_count(), 1);
        assert_eq!(registry.frame_count(), 2);
        assert!(registry.intrinsics(1).is_some());
        assert!(registry.intrinsics(2).is_none());

        config.cameras = Some(dir.path().join("no-such-cameras.txt"));
        let err = config.load_registry().unwrap_err();
        assert!(matches!(err, PipelineError::Data(DataError::Io { .. })));
        assert!(err.to_string().contains("no-such-cameras.txt"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = PipelineConfig::default();
        assert!(matches!(config.load_registry(), Err(PipelineError::NoIntrinsics)));

        config.cameras = Some(PathBuf::from("cameras.txt"));
        config.box_size = 0.0;
        assert!(matches!(
            config.load_registry(),
            Err(PipelineError::InvalidBoxSize(_))
        ));

        config.box_size = DEFAULT_BOX_SIZE;
        config.fallback_intrinsics = Some(FallbackIntrinsics {
            fx: 0.0,
            fy: 1000.0,
            cx: 0.0,
            cy: 0.0,
        });
        assert!(matches!(
            config.load_registry(),
            Err(PipelineError::InvalidIntrinsics(_))
        ));
    }

    #[test]
    fn test_config_json_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"images": "sparse/images.txt", "box_size": 0.5}"#).unwrap();
        assert_eq!(config.images, PathBuf::from("sparse/images.txt"));
        assert_eq!(config.box_size, 0.5);
        assert_eq!(config.output, PathBuf::from("defect_points.ply"));
        assert!(config.cameras.is_none());
    }
}
