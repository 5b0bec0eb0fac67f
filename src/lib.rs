pub mod association;
pub mod bbox;
pub mod canvas;
pub mod config;
pub mod detection;
pub mod entity;
pub mod error;
pub mod frame;
pub mod math;
pub mod perspective;
pub mod population;
pub mod scene;
pub mod tracks;

#[cfg(feature = "opencv")]
pub mod capture;
#[cfg(feature = "opencv")]
pub mod display;
#[cfg(feature = "opencv")]
pub mod render;

pub use association::Associations;
pub use detection::Detection;
pub use entity::{Color, Entity, Person, SecondaryObject};
pub use frame::{Frame, FrameDecimator};
pub use perspective::{PerspectiveMapper, Quadrilateral};
pub use scene::Scene;

use canvas::CanvasGeometry;
use error::Error;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

pub trait Monitoring {
    fn update(&mut self, frame: &Frame, src: &str) -> Result<&Associations, Error>;
    fn scene(&self, src: &str) -> Option<&Scene>;
}

/// Keeps one independent [`Scene`] per camera.
pub struct Monitor {
    scenes: HashMap<String, Scene>,
    order: Vec<String>,
    geometry: CanvasGeometry,
    radius: f64,
    seed: Option<u64>,
}

impl Monitor {
    /// `radius` is the association radius in canvas pixels.
    pub fn new(geometry: CanvasGeometry, radius: f64) -> Self {
        Self {
            scenes: HashMap::new(),
            order: Vec::new(),
            geometry,
            radius,
            seed: None,
        }
    }

    /// Makes person colors reproducible; each camera derives its own stream.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn add_camera<S: ToString>(&mut self, src: S, quad: Quadrilateral) -> &mut Scene {
        let src = src.to_string();
        let seed = self.seed.map(|s| s.wrapping_add(self.order.len() as u64));
        let scene = Scene::new(quad, self.geometry, self.radius, seed);

        log::info!("camera {} registered", src);

        match self.scenes.entry(src) {
            Entry::Occupied(mut entry) => {
                entry.insert(scene);
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.order.push(entry.key().clone());
                entry.insert(scene)
            }
        }
    }

    /// Camera names in registration order.
    #[inline]
    pub fn cameras(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    #[inline]
    pub fn geometry(&self) -> &CanvasGeometry {
        &self.geometry
    }
}

impl Monitoring for Monitor {
    fn update(&mut self, frame: &Frame, src: &str) -> Result<&Associations, Error> {
        let scene = self
            .scenes
            .get_mut(src)
            .ok_or_else(|| Error::UnknownCamera(src.to_string()))?;

        Ok(scene.update(frame))
    }

    #[inline]
    fn scene(&self, src: &str) -> Option<&Scene> {
        self.scenes.get(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> Monitor {
        let geometry = CanvasGeometry::default();
        let mut monitor = Monitor::new(geometry, geometry.radius_pixels(1.0, 3.0)).with_seed(3);

        monitor.add_camera(
            "hall",
            Quadrilateral::from_keypoints(&[100, 100, 300, 90, 340, 260, 60, 270]).unwrap(),
        );
        monitor.add_camera(
            "gate",
            Quadrilateral::from_keypoints(&[141, 122, 271, 125, 320, 194, 79, 184]).unwrap(),
        );

        monitor
    }

    #[test]
    fn unknown_camera_is_an_error() {
        let mut monitor = monitor();

        assert!(matches!(
            monitor.update(&Frame::empty(0), "lobby"),
            Err(Error::UnknownCamera(_))
        ));
    }

    #[test]
    fn cameras_keep_separate_identity_spaces() {
        let mut monitor = monitor();
        let frame = Frame {
            index: 0,
            persons: vec![Detection::ltrb(1, 180.0, 60.0, 220.0, 180.0)],
            objects: vec![],
        };

        monitor.update(&frame, "hall").unwrap();

        assert_eq!(monitor.scene("hall").unwrap().persons().len(), 1);
        assert!(monitor.scene("gate").unwrap().persons().is_empty());
        assert_eq!(monitor.scene("gate").unwrap().persons().known_ids(), 0);
        assert_eq!(monitor.cameras().collect::<Vec<_>>(), vec!["hall", "gate"]);
    }
}
