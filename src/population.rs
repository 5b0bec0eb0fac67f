use crate::canvas::CanvasGeometry;
use crate::detection::Detection;
use crate::entity::{Color, Entity};
use crate::perspective::PerspectiveMapper;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Supplies colors for ids seen for the first time.
pub trait ColorSource {
    fn next_color(&mut self) -> Color;
}

/// Uniform random colors from a seedable generator.
pub struct RandomColors {
    rng: StdRng,
}

impl RandomColors {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl ColorSource for RandomColors {
    fn next_color(&mut self) -> Color {
        Color::new(
            self.rng.gen_range(0..255),
            self.rng.gen_range(0..255),
            self.rng.gen_range(0..255),
        )
    }
}

/// Same color for everyone.
pub struct FixedColor(pub Color);

impl ColorSource for FixedColor {
    #[inline]
    fn next_color(&mut self) -> Color {
        self.0
    }
}

/// Entities of one class seen by one camera in the current frame.
///
/// The entity list is rebuilt every processed frame, while the id → color
/// table lives for the whole session and only grows.
pub struct Population<E> {
    entities: Vec<E>,
    colors: HashMap<i32, Color>,
    palette: Box<dyn ColorSource>,
}

impl<E: Entity> Population<E> {
    pub fn new<C: ColorSource + 'static>(palette: C) -> Self {
        Self {
            entities: Vec::with_capacity(32),
            colors: HashMap::new(),
            palette: Box::new(palette),
        }
    }

    /// Replaces the population with this frame's detections, in tracker order.
    pub fn rebuild(
        &mut self,
        detections: &[Detection],
        mapper: &PerspectiveMapper,
        geometry: &CanvasGeometry,
    ) {
        self.entities.clear();

        for det in detections {
            let mapped = mapper
                .project(det.bbox.foot())
                .map(|(h, v)| geometry.map_to_canvas(h, v));

            let color = self.palette.next_color();
            self.insert(E::new(det.id, det.bbox, mapped, color));
        }

        log::debug!(
            "population rebuilt: {} entities, {} known ids",
            self.entities.len(),
            self.colors.len()
        );
    }

    /// Appends an entity, giving it the color its id already owns.
    pub fn insert(&mut self, mut entity: E) {
        match self.colors.get(&entity.id()) {
            Some(color) => entity.set_color(*color),
            None => {
                self.colors.insert(entity.id(), entity.color());
            }
        }

        self.entities.push(entity);
    }

    /// Drops the entities; the color table is kept.
    #[inline]
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entities.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.entities.iter_mut()
    }

    #[inline]
    pub fn as_slice(&self) -> &[E] {
        &self.entities
    }

    pub fn get(&self, id: i32) -> Option<&E> {
        self.entities.iter().find(|e| e.id() == id)
    }

    #[inline]
    pub fn color_of(&self, id: i32) -> Option<Color> {
        self.colors.get(&id).copied()
    }

    #[inline]
    pub fn known_ids(&self) -> usize {
        self.colors.len()
    }
}
