use serde_derive::{Deserialize, Serialize};

use crate::detection::Detection;

/// Tracker output for one processed frame of one camera.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Frame {
    #[serde(rename = "frame")]
    pub index: u64,
    #[serde(default)]
    pub persons: Vec<Detection>,
    #[serde(default)]
    pub objects: Vec<Detection>,
}

impl Frame {
    #[inline]
    pub fn empty(index: u64) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.persons.len() + self.objects.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.persons.iter().chain(self.objects.iter())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.objects.is_empty()
    }

    /// Moves every box into a frame resized by `factor`.
    pub fn scaled(mut self, factor: f32) -> Self {
        self.persons
            .iter_mut()
            .chain(self.objects.iter_mut())
            .for_each(|det| det.bbox = det.bbox.scaled(factor));

        self
    }
}

/// Selects every Nth input frame for processing.
#[derive(Debug, Clone)]
pub struct FrameDecimator {
    divider: u64,
    counter: u64,
}

impl FrameDecimator {
    pub fn new(divider: u64) -> Self {
        Self {
            divider: divider.max(1),
            counter: 0,
        }
    }

    /// Index of the next input frame.
    #[inline]
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Counts one input frame; true when it has to be processed.
    pub fn tick(&mut self) -> bool {
        let process = self.counter % self.divider == 0;
        self.counter += 1;
        process
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processes_every_nth_frame() {
        let mut decimator = FrameDecimator::new(5);
        let processed: Vec<u64> = (0..12)
            .filter(|_| decimator.tick())
            .collect();

        assert_eq!(processed, vec![0, 5, 10]);
        assert_eq!(decimator.counter(), 12);
    }

    #[test]
    fn zero_divider_processes_everything() {
        let mut decimator = FrameDecimator::new(0);

        assert!((0..4).all(|_| decimator.tick()));
    }

    #[test]
    fn frame_counts_both_classes() {
        let frame = Frame {
            index: 3,
            persons: vec![Detection::ltrb(1, 0.0, 0.0, 1.0, 1.0)],
            objects: vec![Detection::ltrb(2, 0.0, 0.0, 1.0, 1.0)],
        };

        assert_eq!(frame.len(), 2);
        assert!(!frame.is_empty());
        assert!(Frame::empty(0).is_empty());
    }

    #[test]
    fn scaling_moves_both_classes() {
        let frame = Frame {
            index: 3,
            persons: vec![Detection::ltrb(1, 100.0, 40.0, 200.0, 400.0)],
            objects: vec![Detection::ltrb(2, 10.0, 20.0, 30.0, 40.0)],
        }
        .scaled(0.5);

        assert_eq!(frame.persons[0], Detection::ltrb(1, 50.0, 20.0, 100.0, 200.0));
        assert_eq!(frame.objects[0], Detection::ltrb(2, 5.0, 10.0, 15.0, 20.0));
        assert_eq!(frame.index, 3);
    }
}
