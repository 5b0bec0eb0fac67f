use serde_derive::Deserialize;

use crate::canvas::CanvasGeometry;
use crate::error::Error;
use crate::perspective::Quadrilateral;

use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub name: String,

    // video file, stream URL or device index
    pub source: String,

    /// Calibration corners at the source resolution: TL, TR, BR, BL as `x, y` pairs.
    pub keypoints: Vec<i32>,

    /// JSON-lines dump of the external tracker output for this camera, boxes
    /// at the source resolution.
    #[serde(default)]
    pub tracks: Option<PathBuf>,
}

impl CameraConfig {
    /// Calibration scaled the same way as the frames.
    pub fn quadrilateral(&self, video_scale: f64) -> Result<Quadrilateral, Error> {
        let scaled: Vec<i32> = self
            .keypoints
            .iter()
            .map(|k| (*k as f64 * video_scale) as i32)
            .collect();

        Quadrilateral::from_keypoints(&scaled)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub cameras: Vec<CameraConfig>,
    pub fps_divider: u64,
    pub video_scale: f64,
    pub radius_meters: f64,

    /// Ground length covered by the map background box.
    pub reference_extent_meters: f64,
    pub canvas_size: i32,
    pub debug: bool,
    pub show_titles: bool,
    pub margin: i32,
    pub window_size: (i32, i32),

    // draw every camera on one shared map
    pub combined_map: bool,
    pub color_seed: Option<u64>,
    pub output: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cameras: Vec::new(),
            fps_divider: 5,
            video_scale: 0.5,
            radius_meters: 1.0,
            reference_extent_meters: 3.0,
            canvas_size: 300,
            debug: false,
            show_titles: true,
            margin: 10,
            window_size: (720, 720),
            combined_map: false,
            color_seed: None,
            output: None,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        let config: Config = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.cameras.is_empty() {
            return Err(Error::Config("at least one camera is required".into()));
        }

        for cam in &self.cameras {
            if cam.keypoints.len() != 8 {
                return Err(Error::InvalidKeypoints(cam.keypoints.len()));
            }
        }

        if self.fps_divider == 0 {
            return Err(Error::Config("fps_divider must be positive".into()));
        }

        if !(self.reference_extent_meters > 0.0) {
            return Err(Error::Config(
                "reference_extent_meters must be positive".into(),
            ));
        }

        if !(self.video_scale > 0.0) {
            return Err(Error::Config("video_scale must be positive".into()));
        }

        if self.canvas_size <= 2 * (crate::canvas::CANVAS_BUFFER + crate::canvas::MAP_PADDING) {
            return Err(Error::Config(format!(
                "canvas_size {} leaves no room for the map",
                self.canvas_size
            )));
        }

        Ok(())
    }

    #[inline]
    pub fn geometry(&self) -> CanvasGeometry {
        CanvasGeometry::new(self.canvas_size)
    }

    /// Association radius in canvas pixels.
    pub fn radius_pixels(&self) -> f64 {
        self.geometry()
            .radius_pixels(self.radius_meters, self.reference_extent_meters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "cameras": [
            {"name": "cam1", "source": "input/cam1.mp4", "keypoints": [217, 346, 555, 364, 543, 627, 59, 580], "tracks": "input/cam1.jsonl"},
            {"name": "cam2", "source": "0", "keypoints": [188, 340, 532, 332, 632, 602, 104, 598]}
        ],
        "fps_divider": 3,
        "debug": true
    }"#;

    #[test]
    fn parses_with_defaults() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        config.validate().unwrap();

        assert_eq!(config.cameras.len(), 2);
        assert_eq!(config.fps_divider, 3);
        assert!(config.debug);
        assert_eq!(config.video_scale, 0.5);
        assert_eq!(config.canvas_size, 300);
        assert_eq!(config.window_size, (720, 720));
        assert_eq!(config.cameras[1].tracks, None);
        assert!((config.radius_pixels() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn keypoints_are_scaled_with_the_video() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        let quad = config.cameras[0].quadrilateral(config.video_scale).unwrap();

        assert_eq!(quad.top_left.x, 108.0);
        assert_eq!(quad.top_left.y, 173.0);
        assert_eq!(quad.bottom_left.x, 29.0);
    }

    #[test]
    fn rejects_bad_keypoints() {
        let mut config: Config = serde_json::from_str(SAMPLE).unwrap();
        config.cameras[0].keypoints.pop();

        assert!(matches!(config.validate(), Err(Error::InvalidKeypoints(7))));
    }

    #[test]
    fn rejects_empty_camera_list() {
        assert!(matches!(Config::default().validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_zero_reference_extent() {
        let mut config: Config = serde_json::from_str(SAMPLE).unwrap();
        config.reference_extent_meters = 0.0;

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
