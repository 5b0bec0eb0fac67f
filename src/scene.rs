use crate::association::{self, Associations};
use crate::canvas::CanvasGeometry;
use crate::entity::{Color, Person, SecondaryObject};
use crate::frame::Frame;
use crate::perspective::{PerspectiveMapper, Quadrilateral};
use crate::population::{FixedColor, Population, RandomColors};

use std::collections::HashMap;

/// Everything one camera knows about its ground region.
pub struct Scene {
    mapper: PerspectiveMapper,
    geometry: CanvasGeometry,
    radius: f64,
    persons: Population<Person>,
    objects: Population<SecondaryObject>,
    associations: Associations,

    // last evaluated lost flag per object id, kept through tracking gaps
    lost: HashMap<i32, bool>,
    last_frame: Option<u64>,
}

impl Scene {
    /// `radius` is the association radius in canvas pixels.
    pub fn new(quad: Quadrilateral, geometry: CanvasGeometry, radius: f64, seed: Option<u64>) -> Self {
        let palette = match seed {
            Some(seed) => RandomColors::seeded(seed),
            None => RandomColors::from_entropy(),
        };

        Self {
            mapper: PerspectiveMapper::new(quad),
            geometry,
            radius,
            persons: Population::new(palette),
            objects: Population::new(FixedColor(Color::RED)),
            associations: Associations::default(),
            lost: HashMap::new(),
            last_frame: None,
        }
    }

    /// Rebuilds both populations from the frame and re-runs the association.
    pub fn update(&mut self, frame: &Frame) -> &Associations {
        self.objects
            .rebuild(&frame.objects, &self.mapper, &self.geometry);
        for object in self.objects.iter_mut() {
            if let Some(lost) = self.lost.get(&object.id) {
                object.set_lost(*lost);
            }
        }

        self.persons
            .rebuild(&frame.persons, &self.mapper, &self.geometry);

        self.associations = association::associate(&self.persons, &mut self.objects, self.radius);
        for object in self.objects.iter() {
            self.lost.insert(object.id, object.lost());
        }
        self.last_frame = Some(frame.index);

        log::debug!(
            "frame {}: {} persons, {} objects, {} linked",
            frame.index,
            self.persons.len(),
            self.objects.len(),
            self.associations.len()
        );

        &self.associations
    }

    #[inline]
    pub fn mapper(&self) -> &PerspectiveMapper {
        &self.mapper
    }

    #[inline]
    pub fn geometry(&self) -> &CanvasGeometry {
        &self.geometry
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn persons(&self) -> &Population<Person> {
        &self.persons
    }

    #[inline]
    pub fn objects(&self) -> &Population<SecondaryObject> {
        &self.objects
    }

    #[inline]
    pub fn associations(&self) -> &Associations {
        &self.associations
    }

    /// Lost flag of the last evaluation of `id`, also for ids missing from
    /// the current frame.
    #[inline]
    pub fn was_lost(&self, id: i32) -> Option<bool> {
        self.lost.get(&id).copied()
    }

    #[inline]
    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }

    /// Color the object is drawn with: its owner's when it has one.
    pub fn object_color(&self, object: &SecondaryObject) -> Color {
        self.associations
            .owner_color(object.id, &self.persons)
            .unwrap_or(object.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Detection;

    fn scene() -> Scene {
        let quad = Quadrilateral::from_keypoints(&[100, 100, 300, 90, 340, 260, 60, 270]).unwrap();
        let geometry = CanvasGeometry::default();
        let radius = geometry.radius_pixels(1.0, 3.0);

        Scene::new(quad, geometry, radius, Some(11))
    }

    #[test]
    fn suitcase_next_to_owner_takes_owner_color() {
        let mut scene = scene();
        let frame = Frame {
            index: 0,
            persons: vec![Detection::ltrb(1, 180.0, 60.0, 220.0, 180.0)],
            objects: vec![Detection::ltrb(5, 200.0, 170.0, 220.0, 190.0)],
        };

        let links = scene.update(&frame).clone();

        assert_eq!(links.owner_of(5), Some(1));
        let object = scene.objects().get(5).unwrap();
        assert!(!object.lost());
        assert_eq!(scene.object_color(object), scene.persons().color_of(1).unwrap());
        assert_eq!(scene.last_frame(), Some(0));
    }

    #[test]
    fn abandoned_suitcase_stays_lost_while_unmapped() {
        let mut scene = scene();
        let owner = Detection::ltrb(1, 180.0, 60.0, 220.0, 180.0);
        let suitcase = Detection::ltrb(5, 200.0, 170.0, 220.0, 190.0);

        scene.update(&Frame {
            index: 0,
            persons: vec![owner],
            objects: vec![suitcase],
        });
        assert!(!scene.objects().get(5).unwrap().lost());

        // owner walked out of the calibrated region
        scene.update(&Frame {
            index: 5,
            persons: vec![Detection::ltrb(1, 10.0, 60.0, 30.0, 180.0)],
            objects: vec![suitcase],
        });
        let object = scene.objects().get(5).unwrap();
        assert!(object.lost());
        assert_eq!(scene.object_color(object), Color::RED);

        // suitcase occluded into an unmappable position
        scene.update(&Frame {
            index: 10,
            persons: vec![],
            objects: vec![Detection::ltrb(5, 10.0, 160.0, 30.0, 180.0)],
        });
        assert!(scene.objects().get(5).unwrap().mapped.is_none());
        assert!(scene.objects().get(5).unwrap().lost());
    }

    #[test]
    fn lost_flag_outlives_a_tracking_gap() {
        let mut scene = scene();
        let suitcase = Detection::ltrb(5, 200.0, 170.0, 220.0, 190.0);

        scene.update(&Frame {
            index: 0,
            persons: vec![],
            objects: vec![suitcase],
        });
        assert!(scene.objects().get(5).unwrap().lost());

        // tracker missed every object on this frame
        scene.update(&Frame::empty(5));
        assert!(scene.objects().is_empty());
        assert_eq!(scene.was_lost(5), Some(true));

        scene.update(&Frame {
            index: 10,
            persons: vec![],
            objects: vec![Detection::ltrb(5, 10.0, 160.0, 30.0, 180.0)],
        });
        let object = scene.objects().get(5).unwrap();
        assert!(object.mapped.is_none());
        assert!(object.lost());
    }

    #[test]
    fn owner_returning_after_a_gap_clears_lost() {
        let mut scene = scene();
        let owner = Detection::ltrb(1, 180.0, 60.0, 220.0, 180.0);
        let suitcase = Detection::ltrb(5, 200.0, 170.0, 220.0, 190.0);

        scene.update(&Frame {
            index: 0,
            persons: vec![],
            objects: vec![suitcase],
        });
        scene.update(&Frame::empty(5));
        scene.update(&Frame {
            index: 10,
            persons: vec![owner],
            objects: vec![suitcase],
        });

        assert!(!scene.objects().get(5).unwrap().lost());
        assert_eq!(scene.was_lost(5), Some(false));
        assert_eq!(scene.was_lost(6), None);
    }
}
