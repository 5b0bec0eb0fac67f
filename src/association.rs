//! Binds secondary objects to the persons standing next to them.
//!
//! Persons are scanned in population order and the first one within the
//! radius wins, even when a later person is closer.

use crate::entity::{Color, Entity, Person, SecondaryObject};
use crate::population::Population;

use nalgebra as na;
use std::collections::HashMap;

/// `secondary id -> person id` for the current frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Associations {
    links: HashMap<i32, i32>,
}

impl Associations {
    #[inline]
    pub fn owner_of(&self, object_id: i32) -> Option<i32> {
        self.links.get(&object_id).copied()
    }

    /// Color of the person the object is with, if any.
    pub fn owner_color(&self, object_id: i32, persons: &Population<Person>) -> Option<Color> {
        let owner = self.owner_of(object_id)?;

        persons.get(owner).map(|p| p.color())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&i32, &i32)> {
        self.links.iter()
    }
}

/// Links every mapped secondary object to the first person within `radius`
/// canvas pixels and updates its lost flag.
///
/// Objects without a ground position are skipped and keep their flag.
pub fn associate(
    persons: &Population<Person>,
    objects: &mut Population<SecondaryObject>,
    radius: f64,
) -> Associations {
    let mut links = HashMap::new();

    for object in objects.iter_mut() {
        let pos = match object.mapped() {
            Some(pos) => pos.cast::<f64>(),
            None => continue,
        };

        let owner = persons.iter().find(|person| match person.mapped() {
            Some(p) => na::distance(&pos, &p.cast::<f64>()) <= radius,
            None => false,
        });

        match owner {
            Some(person) => {
                links.insert(object.id(), person.id());
                object.set_lost(false);
            }
            None => {
                if !object.lost() {
                    log::warn!("{} lost", object);
                }
                object.set_lost(true);
            }
        }
    }

    Associations { links }
}
