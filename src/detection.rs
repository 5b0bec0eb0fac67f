use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};

/// One tracked object in one frame, as reported by the external tracker.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(from = "RawDetection", into = "RawDetection")]
pub struct Detection {
    pub id: i32,
    pub bbox: BBox<Ltrb>,
}

impl Detection {
    #[inline]
    pub fn new(id: i32, bbox: BBox<Ltrb>) -> Self {
        Self { id, bbox }
    }

    #[inline]
    pub fn ltrb(id: i32, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::new(id, BBox::ltrb(left, top, right, bottom))
    }
}

/// Contains the persistent id and (left, top, right, bottom) of the bbox
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
struct RawDetection {
    id: i32,
    bbox: [f32; 4],
}

impl From<RawDetection> for Detection {
    fn from(raw: RawDetection) -> Self {
        Detection::new(raw.id, BBox::assigned(&raw.bbox))
    }
}

impl From<Detection> for RawDetection {
    fn from(det: Detection) -> Self {
        RawDetection {
            id: det.id,
            bbox: det.bbox.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_flat_bbox() {
        let det: Detection = serde_json::from_str(r#"{"id": 4, "bbox": [1, 2, 3, 4]}"#).unwrap();

        assert_eq!(det, Detection::ltrb(4, 1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn writes_flat_bbox() {
        let json = serde_json::to_string(&Detection::ltrb(1, 0.0, 0.5, 2.0, 3.0)).unwrap();

        assert_eq!(json, r#"{"id":1,"bbox":[0.0,0.5,2.0,3.0]}"#);
    }
}
