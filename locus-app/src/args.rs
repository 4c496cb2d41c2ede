//! Command line arguments and their merge into a pipeline configuration.

use clap::Parser;
use locus_solve::{FallbackIntrinsics, PipelineConfig};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArgsError {
    #[error("cannot read config {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("intrinsics must be FX,FY,CX,CY, got {0:?}")]
    Intrinsics(String),

    #[error("no input given: pass --workspace, --config, or --detections with --images")]
    NoInput,
}

/// Locus - locate tracked detections in 3D from COLMAP poses
#[derive(Parser, Debug, Default)]
#[command(name = "locus")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Workspace with tracking_with_cls.csv and sparse/0/{cameras,images}.txt
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// JSON run configuration; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Detection table (frame, track_id, class, center_x, center_y)
    #[arg(long)]
    pub detections: Option<PathBuf>,

    /// COLMAP cameras.txt
    #[arg(long)]
    pub cameras: Option<PathBuf>,

    /// COLMAP images.txt
    #[arg(long)]
    pub images: Option<PathBuf>,

    /// Output point cloud PLY
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write a box mesh PLY
    #[arg(long)]
    pub boxes: Option<PathBuf>,

    /// Edge length of boxes and wireframes
    #[arg(long)]
    pub box_size: Option<f64>,

    /// Also write a wireframe PLY
    #[arg(long)]
    pub wireframe: Option<PathBuf>,

    /// Also write a JSON label sidecar
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Shared intrinsics FX,FY,CX,CY used when no cameras file is given
    #[arg(long)]
    pub intrinsics: Option<String>,
}

impl Args {
    /// Build the run configuration: workspace layout, then config file,
    /// then explicit flags.
    pub fn into_config(self) -> Result<PipelineConfig, ArgsError> {
        let has_explicit_inputs = self.detections.is_some() && self.images.is_some();
        let mut config = match (&self.config, &self.workspace) {
            (Some(path), _) => read_config(path)?,
            (None, Some(workspace)) => PipelineConfig::from_workspace(workspace),
            (None, None) if has_explicit_inputs => PipelineConfig::default(),
            (None, None) => return Err(ArgsError::NoInput),
        };

        if let (Some(_), Some(workspace)) = (&self.config, &self.workspace) {
            // Relative config paths are taken as relative to the workspace.
            let rebase = |p: &mut PathBuf| {
                if p.is_relative() {
                    *p = workspace.join(&*p);
                }
            };
            rebase(&mut config.detections);
            rebase(&mut config.images);
            rebase(&mut config.output);
            for p in [
                &mut config.cameras,
                &mut config.box_output,
                &mut config.wireframe_output,
                &mut config.labels_output,
            ]
            .into_iter()
            .flatten()
            {
                rebase(p);
            }
        }

        if let Some(p) = self.detections {
            config.detections = p;
        }
        if let Some(p) = self.cameras {
            config.cameras = Some(p);
        }
        if let Some(p) = self.images {
            config.images = p;
        }
        if let Some(p) = self.output {
            config.output = p;
        }
        if let Some(p) = self.boxes {
            config.box_output = Some(p);
        }
        if let Some(size) = self.box_size {
            config.box_size = size;
        }
        if let Some(p) = self.wireframe {
            config.wireframe_output = Some(p);
        }
        if let Some(p) = self.labels {
            config.labels_output = Some(p);
        }
        if let Some(raw) = self.intrinsics {
            config.fallback_intrinsics = Some(parse_intrinsics(&raw)?);
        }

        Ok(config)
    }
}

fn read_config(path: &PathBuf) -> Result<PipelineConfig, ArgsError> {
    let file = File::open(path).map_err(|source| ArgsError::ConfigIo {
        path: path.clone(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ArgsError::ConfigParse {
        path: path.clone(),
        source,
    })
}

fn parse_intrinsics(raw: &str) -> Result<FallbackIntrinsics, ArgsError> {
    let values = raw
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ArgsError::Intrinsics(raw.to_string()))?;
    match values.as_slice() {
        [fx, fy, cx, cy] => Ok(FallbackIntrinsics {
            fx: *fx,
            fy: *fy,
            cx: *cx,
            cy: *cy,
        }),
        _ => Err(ArgsError::Intrinsics(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    #[test]
    fn test_workspace_layout() {
        let args = Args::parse_from(["locus", "--workspace", "/data/run1"]);
        let config = args.into_config().unwrap();
        assert_eq!(config.detections, Path::new("/data/run1/tracking_with_cls.csv"));
        assert_eq!(
            config.cameras.as_deref(),
            Some(Path::new("/data/run1/sparse/0/cameras.txt"))
        );
        assert_eq!(config.images, Path::new("/data/run1/sparse/0/images.txt"));
        assert_eq!(config.output, Path::new("/data/run1/defect_points.ply"));
    }

    #[test]
    fn test_flags_override_workspace() {
        let args = Args::parse_from([
            "locus",
            "--workspace",
            "/data/run1",
            "--output",
            "/tmp/out.ply",
            "--boxes",
            "/tmp/boxes.ply",
            "--box-size",
            "0.5",
        ]);
        let config = args.into_config().unwrap();
        assert_eq!(config.output, Path::new("/tmp/out.ply"));
        assert_eq!(config.box_output.as_deref(), Some(Path::new("/tmp/boxes.ply")));
        assert_eq!(config.box_size, 0.5);
    }

    #[test]
    fn test_explicit_inputs_with_intrinsics() {
        let args = Args::parse_from([
            "locus",
            "--detections",
            "centers.csv",
            "--images",
            "images.txt",
            "--intrinsics",
            "1000, 1000, 960, 540",
        ]);
        let config = args.into_config().unwrap();
        assert!(config.cameras.is_none());
        assert_eq!(
            config.fallback_intrinsics,
            Some(FallbackIntrinsics {
                fx: 1000.0,
                fy: 1000.0,
                cx: 960.0,
                cy: 540.0
            })
        );
    }

    #[test]
    fn test_bad_intrinsics() {
        assert!(parse_intrinsics("1000,1000,960").is_err());
        assert!(parse_intrinsics("a,b,c,d").is_err());
    }

    #[test]
    fn test_no_input() {
        let args = Args::parse_from(["locus", "--detections", "centers.csv"]);
        assert!(matches!(args.into_config(), Err(ArgsError::NoInput)));
    }

    #[test]
    fn test_config_file_rebased_on_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("run.json");
        fs::write(
            &config_path,
            r#"{"detections": "centers.csv", "images": "poses/images.txt", "cameras": "/abs/cameras.txt", "labels_output": "labels.json"}"#,
        )
        .unwrap();

        let args = Args {
            workspace: Some(PathBuf::from("/data/run2")),
            config: Some(config_path),
            ..Args::default()
        };
        let config = args.into_config().unwrap();
        assert_eq!(config.detections, Path::new("/data/run2/centers.csv"));
        assert_eq!(config.images, Path::new("/data/run2/poses/images.txt"));
        assert_eq!(config.cameras.as_deref(), Some(Path::new("/abs/cameras.txt")));
        assert_eq!(
            config.labels_output.as_deref(),
            Some(Path::new("/data/run2/labels.json"))
        );
    }

    #[test]
    fn test_unreadable_config() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/locus/run.json")),
            ..Args::default()
        };
        let err = args.into_config().unwrap_err();
        assert!(err.to_string().contains("run.json"));
    }
}
