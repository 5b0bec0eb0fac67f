//! Drawing of the top-down map and of the overlays on the source frames.

use crate::association::Associations;
use crate::canvas::CanvasGeometry;
use crate::entity::{CanvasPoint, Color, Entity, Person, SecondaryObject};
use crate::error::Error;
use crate::perspective::{ProjectionTrace, Quadrilateral};
use crate::population::Population;
use crate::scene::Scene;

use opencv::{
    core::{self, Mat, Point, Rect, Scalar},
    imgproc,
    prelude::*,
};

const MAP_LABEL_SCALE: f64 = 0.2;
const FRAME_LABEL_SCALE: f64 = 0.4;

// on-map markers are squares of 2 * MARKER_HALF + 1 pixels
const MARKER_HALF: i32 = 2;

/// Background box opacity.
const BACKGROUND_ALPHA: f64 = 0.5;

/// How far the debug projection lines run past the foot point, in multiples
/// of the vanishing point offset.
const PROJECTION_EXTENT: f64 = 5.0;

/// OpenCV expects BGR channel order.
#[inline]
pub fn scalar(color: Color) -> Scalar {
    Scalar::new(color.b as f64, color.g as f64, color.r as f64, 0.0)
}

#[inline]
fn point(p: &CanvasPoint) -> Point {
    Point::new(p.x, p.y)
}

fn label(frame: &mut Mat, text: &str, org: Point, scale: f64, color: Scalar) -> Result<(), Error> {
    imgproc::put_text(
        frame,
        text,
        org,
        imgproc::FONT_HERSHEY_SIMPLEX,
        scale,
        color,
        1,
        imgproc::LINE_AA,
        false,
    )?;

    Ok(())
}

pub struct MapRenderer {
    geometry: CanvasGeometry,
}

impl MapRenderer {
    pub fn new(geometry: CanvasGeometry) -> Self {
        Self { geometry }
    }

    #[inline]
    pub fn geometry(&self) -> &CanvasGeometry {
        &self.geometry
    }

    /// White square canvas of the configured size.
    pub fn blank_canvas(&self) -> Result<Mat, Error> {
        let size = self.geometry.size;

        Ok(Mat::new_rows_cols_with_default(
            size,
            size,
            core::CV_8UC3,
            Scalar::all(255.0),
        )?)
    }

    /// Background box, calibration outline and corner markers.
    pub fn render_base(&self, canvas: &Mat) -> Result<Mat, Error> {
        let mut frame = self.draw_background(canvas)?;
        self.draw_boundaries(&mut frame)?;
        self.draw_corners(&mut frame)?;

        Ok(frame)
    }

    /// Full map for one camera: base layer, then every placed person and
    /// secondary object, the latter in its owner's color when it has one.
    pub fn render(
        &self,
        canvas: &Mat,
        persons: &Population<Person>,
        objects: &Population<SecondaryObject>,
        associations: &Associations,
    ) -> Result<Mat, Error> {
        let mut frame = self.render_base(canvas)?;
        self.draw_population(&mut frame, persons, objects, associations)?;

        Ok(frame)
    }

    /// Several cameras on one map; each keeps its own identity space.
    pub fn render_scenes<'a, I>(&self, canvas: &Mat, scenes: I) -> Result<Mat, Error>
    where
        I: IntoIterator<Item = &'a Scene>,
    {
        let mut frame = self.render_base(canvas)?;

        for scene in scenes {
            self.draw_population(
                &mut frame,
                scene.persons(),
                scene.objects(),
                scene.associations(),
            )?;
        }

        Ok(frame)
    }

    #[inline]
    pub fn render_scene(&self, canvas: &Mat, scene: &Scene) -> Result<Mat, Error> {
        self.render_scenes(canvas, std::iter::once(scene))
    }

    fn draw_population(
        &self,
        frame: &mut Mat,
        persons: &Population<Person>,
        objects: &Population<SecondaryObject>,
        associations: &Associations,
    ) -> Result<(), Error> {
        for person in persons.iter() {
            self.draw_marker(frame, person, person.color())?;
        }

        for object in objects.iter() {
            let color = associations
                .owner_color(object.id(), persons)
                .unwrap_or(object.color());

            self.draw_marker(frame, object, color)?;
        }

        Ok(())
    }

    fn draw_background(&self, canvas: &Mat) -> Result<Mat, Error> {
        let (start, end) = (self.geometry.start, self.geometry.end);

        let mut overlay = canvas.try_clone()?;
        imgproc::rectangle(
            &mut overlay,
            Rect::new(start.x, start.y, end.x - start.x + 1, end.y - start.y + 1),
            scalar(Color::WHITE),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        let mut frame = Mat::default();
        core::add_weighted(
            canvas,
            BACKGROUND_ALPHA,
            &overlay,
            1.0 - BACKGROUND_ALPHA,
            0.0,
            &mut frame,
            -1,
        )?;

        Ok(frame)
    }

    fn draw_boundaries(&self, frame: &mut Mat) -> Result<(), Error> {
        let corners = self.geometry.corners();

        for (i, from) in corners.iter().enumerate() {
            let to = &corners[(i + 1) % corners.len()];

            imgproc::line(
                frame,
                point(from),
                point(to),
                scalar(Color::BLACK),
                1,
                imgproc::LINE_8,
                0,
            )?;
        }

        Ok(())
    }

    fn draw_corners(&self, frame: &mut Mat) -> Result<(), Error> {
        for (i, corner) in self.geometry.corners().iter().enumerate() {
            imgproc::circle(
                frame,
                point(corner),
                2,
                scalar(Color::new(0, 0, 255)),
                imgproc::FILLED,
                imgproc::LINE_8,
                0,
            )?;

            label(
                frame,
                &format!("KP: {}", i),
                point(corner),
                MAP_LABEL_SCALE,
                scalar(Color::WHITE),
            )?;
        }

        Ok(())
    }

    fn draw_marker<E: Entity>(&self, frame: &mut Mat, entity: &E, color: Color) -> Result<(), Error> {
        let pos = match entity.mapped() {
            Some(pos) => pos,
            None => return Ok(()),
        };

        imgproc::rectangle(
            frame,
            Rect::new(
                pos.x - MARKER_HALF,
                pos.y - MARKER_HALF,
                2 * MARKER_HALF + 1,
                2 * MARKER_HALF + 1,
            ),
            scalar(color),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        label(
            frame,
            &format!("ID: {}", entity.id()),
            point(&pos),
            MAP_LABEL_SCALE,
            scalar(Color::BLACK),
        )
    }
}

fn bbox_rect<E: Entity>(entity: &E) -> Rect {
    let bbox = entity.bbox().as_ltwh();

    Rect::new(
        bbox.left() as i32,
        bbox.top() as i32,
        bbox.width() as i32,
        bbox.height() as i32,
    )
}

/// Calibration corners on the source frame.
pub fn draw_keypoints(frame: &mut Mat, quad: &Quadrilateral) -> Result<(), Error> {
    for (i, corner) in quad.corners().iter().enumerate() {
        let center = Point::new(corner.x as i32, corner.y as i32);

        imgproc::circle(
            frame,
            center,
            3,
            scalar(Color::WHITE),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        label(frame, &format!("KP: {}", i), center, 0.5, scalar(Color::WHITE))?;
    }

    Ok(())
}

pub fn draw_person(frame: &mut Mat, person: &Person) -> Result<(), Error> {
    let rect = bbox_rect(person);

    label(
        frame,
        &format!("ID: {}", person.id),
        Point::new(rect.x, rect.y - 10),
        FRAME_LABEL_SCALE,
        scalar(Color::WHITE),
    )?;

    imgproc::rectangle(frame, rect, scalar(person.color), 2, imgproc::LINE_8, 0)?;

    Ok(())
}

/// `color` is the owner's color for associated objects.
pub fn draw_secondary(frame: &mut Mat, object: &SecondaryObject, color: Color) -> Result<(), Error> {
    let rect = bbox_rect(object);

    if object.lost() {
        label(
            frame,
            "LOST",
            Point::new(rect.x, rect.y - 10),
            FRAME_LABEL_SCALE,
            scalar(Color::RED),
        )?;
    }

    imgproc::rectangle(frame, rect, scalar(color), 2, imgproc::LINE_8, 0)?;

    Ok(())
}

/// Lines from both vanishing points through the foot point.
pub fn draw_projection(frame: &mut Mat, trace: &ProjectionTrace) -> Result<(), Error> {
    for vanishing in [trace.vanishing_x, trace.vanishing_y] {
        let offset = trace.point - vanishing;
        let far = trace.point + offset * PROJECTION_EXTENT;

        imgproc::line(
            frame,
            Point::new(vanishing.x as i32, vanishing.y as i32),
            Point::new(far.x as i32, far.y as i32),
            scalar(Color::WHITE),
            1,
            imgproc::LINE_8,
            0,
        )?;
    }

    Ok(())
}

/// Everything one camera knows, drawn over its own frame.
pub fn annotate(frame: &mut Mat, scene: &Scene, debug: bool) -> Result<(), Error> {
    if debug {
        draw_keypoints(frame, scene.mapper().quadrilateral())?;
    }

    for person in scene.persons().iter() {
        if debug {
            if let Some(trace) = scene.mapper().trace(person.bbox.foot()) {
                draw_projection(frame, &trace)?;
            }
        }

        draw_person(frame, person)?;
    }

    for object in scene.objects().iter() {
        draw_secondary(frame, object, scene.object_color(object))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::population::{FixedColor, RandomColors};
    use nalgebra as na;

    fn pixel(frame: &Mat, x: i32, y: i32) -> [u8; 3] {
        frame.at_2d::<core::Vec3b>(y, x).unwrap().0
    }

    fn black_canvas() -> Mat {
        Mat::new_rows_cols_with_default(300, 300, core::CV_8UC3, Scalar::all(0.0)).unwrap()
    }

    #[test]
    fn blank_canvas_is_white() {
        let renderer = MapRenderer::new(CanvasGeometry::default());
        let canvas = renderer.blank_canvas().unwrap();

        assert_eq!(canvas.rows(), 300);
        assert_eq!(canvas.cols(), 300);
        assert_eq!(pixel(&canvas, 150, 150), [255, 255, 255]);
    }

    #[test]
    fn background_box_is_half_transparent() {
        let renderer = MapRenderer::new(CanvasGeometry::default());
        let frame = renderer.render_base(&black_canvas()).unwrap();

        // inside the buffer box, outside the map outline
        let [b, g, r] = pixel(&frame, 15, 150);
        assert!((127..=128).contains(&b));
        assert_eq!(b, g);
        assert_eq!(g, r);

        // outside the buffer box
        assert_eq!(pixel(&frame, 5, 5), [0, 0, 0]);
        assert_eq!(pixel(&frame, 290, 150), [0, 0, 0]);
    }

    #[test]
    fn outline_is_drawn_in_black() {
        let renderer = MapRenderer::new(CanvasGeometry::default());
        let canvas = renderer.blank_canvas().unwrap();
        let frame = renderer.render_base(&canvas).unwrap();

        // middle of the top edge, away from the corner labels
        assert_eq!(pixel(&frame, 145, 30), [0, 0, 0]);
        assert_eq!(pixel(&frame, 145, 150), [255, 255, 255]);
    }

    #[test]
    fn markers_take_entity_and_owner_colors() {
        let renderer = MapRenderer::new(CanvasGeometry::default());
        let canvas = renderer.blank_canvas().unwrap();

        let mut persons = Population::new(RandomColors::seeded(0));
        persons.insert(Person::new(
            1,
            BBox::ltrb(0.0, 0.0, 1.0, 1.0),
            Some(na::Point2::new(100, 100)),
            Color::new(10, 20, 30),
        ));

        let mut objects = Population::new(FixedColor(Color::RED));
        objects.insert(SecondaryObject::new(
            5,
            BBox::ltrb(0.0, 0.0, 1.0, 1.0),
            Some(na::Point2::new(100, 190)),
            Color::RED,
        ));
        objects.insert(SecondaryObject::new(
            6,
            BBox::ltrb(0.0, 0.0, 1.0, 1.0),
            Some(na::Point2::new(200, 200)),
            Color::RED,
        ));

        let associations = crate::association::associate(&persons, &mut objects, 100.0);
        let frame = renderer
            .render(&canvas, &persons, &objects, &associations)
            .unwrap();

        // bottom-left corner of each marker, clear of its label
        assert_eq!(pixel(&frame, 98, 102), [30, 20, 10]);
        assert_eq!(pixel(&frame, 98, 192), [30, 20, 10]);
        assert_eq!(pixel(&frame, 198, 202), [0, 0, 255]);
    }

    #[test]
    fn person_box_on_source_frame() {
        let mut frame = black_canvas();
        let person = Person::new(
            1,
            BBox::ltrb(50.0, 60.0, 120.0, 200.0),
            None,
            Color::new(0, 255, 0),
        );

        draw_person(&mut frame, &person).unwrap();

        assert_eq!(pixel(&frame, 80, 199), [0, 255, 0]);
        assert_eq!(pixel(&frame, 80, 130), [0, 0, 0]);
    }
}
