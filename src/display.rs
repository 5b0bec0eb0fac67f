//! Grid compositor: primary views (camera streams) on the first row,
//! secondary views (maps) below, shown in one window.

use crate::error::Error;

use opencv::{
    core::{self, Mat, Point, Scalar, Size, Vector},
    highgui, imgproc,
    prelude::*,
};

const DEFAULT_WIDTH: i32 = 640;
const DEFAULT_HEIGHT: i32 = 480;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewGroup {
    Primary,
    Secondary,
}

#[derive(Debug, Clone)]
struct View {
    title: String,
    group: ViewGroup,
}

pub struct MultiViewDisplay {
    window_name: String,
    show_titles: bool,
    margin: i32,
    window_size: (i32, i32),
    views: Vec<View>,
    window_open: bool,
    log_clicks: bool,
}

/// True for the keys that end a session: `q`, `Q` and Esc.
pub fn is_quit_key(key: i32) -> bool {
    let key = key & 0xff;

    key == 27 || key == 'q' as i32 || key == 'Q' as i32
}

/// Pixel position of a left click on the combined image.
pub fn click_position(event: i32, x: i32, y: i32) -> Option<(i32, i32)> {
    if event == highgui::EVENT_LBUTTONDOWN {
        Some((x, y))
    } else {
        None
    }
}

fn black(rows: i32, cols: i32) -> Result<Mat, Error> {
    Ok(Mat::new_rows_cols_with_default(
        rows,
        cols,
        core::CV_8UC3,
        Scalar::all(0.0),
    )?)
}

fn resize(frame: &Mat, width: i32, height: i32) -> Result<Mat, Error> {
    let mut out = Mat::default();
    imgproc::resize(
        frame,
        &mut out,
        Size::new(width.max(1), height.max(1)),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    Ok(out)
}

/// Resizes to `width`, keeping the aspect ratio.
fn fit_width(frame: Mat, width: i32) -> Result<Mat, Error> {
    if frame.cols() == width {
        return Ok(frame);
    }

    let scale = width as f64 / frame.cols() as f64;
    resize(&frame, width, (frame.rows() as f64 * scale) as i32)
}

impl MultiViewDisplay {
    pub fn new<S: ToString>(window_name: S, show_titles: bool, margin: i32, window_size: (i32, i32)) -> Self {
        Self {
            window_name: window_name.to_string(),
            show_titles,
            margin: margin.max(0),
            window_size,
            views: Vec::new(),
            window_open: false,
            log_clicks: false,
        }
    }

    /// Logs left clicks on the window, used to read calibration keypoints.
    pub fn with_click_logging(mut self, enabled: bool) -> Self {
        self.log_clicks = enabled;
        self
    }

    /// Registers a view and returns its index in the frame list.
    pub fn add_view<S: ToString>(&mut self, title: S, group: ViewGroup) -> usize {
        self.views.push(View {
            title: title.to_string(),
            group,
        });

        self.views.len() - 1
    }

    #[inline]
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Substitutes missing frames and adds the titles.
    ///
    /// A missing frame becomes a black frame the size of the first prepared
    /// one, or 640x480 when there is none yet.
    pub fn prepare(&self, frames: &[Option<Mat>]) -> Result<Vec<Mat>, Error> {
        if frames.len() != self.views.len() {
            return Err(Error::ViewCountMismatch {
                expected: self.views.len(),
                got: frames.len(),
            });
        }

        let mut prepared: Vec<Mat> = Vec::with_capacity(frames.len());

        for (frame, view) in frames.iter().zip(self.views.iter()) {
            let mut frame = match frame {
                Some(frame) => frame.try_clone()?,
                None => match prepared.first() {
                    Some(first) => black(first.rows(), first.cols())?,
                    None => black(DEFAULT_HEIGHT, DEFAULT_WIDTH)?,
                },
            };

            if self.show_titles {
                imgproc::put_text(
                    &mut frame,
                    &view.title,
                    Point::new(10, 30),
                    imgproc::FONT_HERSHEY_SIMPLEX,
                    0.5,
                    Scalar::new(0.0, 255.0, 0.0, 0.0),
                    2,
                    imgproc::LINE_8,
                    false,
                )?;
            }

            prepared.push(frame);
        }

        Ok(prepared)
    }

    /// Builds the combined image, one frame per registered view in
    /// registration order.
    pub fn compose(&self, frames: &[Option<Mat>]) -> Result<Mat, Error> {
        let prepared = self.prepare(frames)?;

        let mut primary = Vec::new();
        let mut secondary = Vec::new();

        for (frame, view) in prepared.into_iter().zip(self.views.iter()) {
            match view.group {
                ViewGroup::Primary => primary.push(frame),
                ViewGroup::Secondary => secondary.push(frame),
            }
        }

        let primary = Self::same_width(primary)?;
        let mut secondary = Self::same_width(secondary)?;

        if !primary.is_empty() && !secondary.is_empty() {
            let primary_width = self.row_width(&primary);
            let secondary_width = self.row_width(&secondary);

            if primary_width != secondary_width {
                let scale = primary_width as f64 / secondary_width as f64;

                secondary = secondary
                    .iter()
                    .map(|f| {
                        resize(
                            f,
                            (f.cols() as f64 * scale) as i32,
                            (f.rows() as f64 * scale) as i32,
                        )
                    })
                    .collect::<Result<Vec<Mat>, Error>>()?;
            }
        }

        let mut rows = Vec::with_capacity(2);
        for group in [primary, secondary] {
            if !group.is_empty() {
                rows.push(self.combine_horizontally(group)?);
            }
        }

        self.combine_vertically(rows)
    }

    /// Composes and shows the frames, opening the window on first use.
    /// Returns the combined image.
    pub fn display(&mut self, frames: &[Option<Mat>]) -> Result<Mat, Error> {
        let combined = self.compose(frames)?;

        if !self.window_open {
            highgui::named_window(&self.window_name, highgui::WINDOW_NORMAL)?;
            self.window_open = true;

            if self.log_clicks {
                let window = self.window_name.clone();
                highgui::set_mouse_callback(
                    &self.window_name,
                    Some(Box::new(move |event, x, y, _flags| {
                        if let Some((x, y)) = click_position(event, x, y) {
                            log::info!("{}: click at ({}, {})", window, x, y);
                        }
                    })),
                )?;
            }
        }

        highgui::imshow(&self.window_name, &combined)?;
        highgui::resize_window(&self.window_name, self.window_size.0, self.window_size.1)?;

        Ok(combined)
    }

    pub fn close(&mut self) -> Result<(), Error> {
        if self.window_open {
            highgui::destroy_window(&self.window_name)?;
            self.window_open = false;
        }

        Ok(())
    }

    fn same_width(frames: Vec<Mat>) -> Result<Vec<Mat>, Error> {
        let width = match frames.iter().map(|f| f.cols()).max() {
            Some(width) => width,
            None => return Ok(frames),
        };

        frames.into_iter().map(|f| fit_width(f, width)).collect()
    }

    fn row_width(&self, frames: &[Mat]) -> i32 {
        frames.iter().map(|f| f.cols()).sum::<i32>() + self.margin * (frames.len() as i32 - 1)
    }

    /// Bottom-pads to the tallest frame and joins with black margins.
    fn combine_horizontally(&self, frames: Vec<Mat>) -> Result<Mat, Error> {
        let height = frames.iter().map(|f| f.rows()).max().unwrap_or(DEFAULT_HEIGHT);
        let last = frames.len().saturating_sub(1);

        let mut padded = Vector::<Mat>::new();
        for (i, frame) in frames.iter().enumerate() {
            let right = if i == last { 0 } else { self.margin };

            let mut out = Mat::default();
            core::copy_make_border(
                frame,
                &mut out,
                0,
                height - frame.rows(),
                0,
                right,
                core::BORDER_CONSTANT,
                Scalar::all(0.0),
            )?;

            padded.push(out);
        }

        let mut row = Mat::default();
        core::hconcat(&padded, &mut row)?;

        Ok(row)
    }

    /// Stacks the rows with margins, rescaling narrower rows to the widest.
    fn combine_vertically(&self, rows: Vec<Mat>) -> Result<Mat, Error> {
        if rows.is_empty() {
            return black(DEFAULT_HEIGHT, DEFAULT_WIDTH);
        }

        let rows = Self::same_width(rows)?;
        let last = rows.len() - 1;

        let mut padded = Vector::<Mat>::new();
        for (i, row) in rows.iter().enumerate() {
            let bottom = if i == last { 0 } else { self.margin };

            let mut out = Mat::default();
            core::copy_make_border(
                row,
                &mut out,
                0,
                bottom,
                0,
                0,
                core::BORDER_CONSTANT,
                Scalar::all(0.0),
            )?;

            padded.push(out);
        }

        let mut combined = Mat::default();
        core::vconcat(&padded, &mut combined)?;

        Ok(combined)
    }
}

impl Drop for MultiViewDisplay {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("closing {}: {}", self.window_name, err);
        }
    }
}
