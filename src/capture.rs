use crate::error::Error;

use opencv::{
    core::{Mat, Size},
    imgproc,
    prelude::*,
    videoio,
};

/// A video file, stream or capture device.
///
/// A source that cannot be opened is logged and then behaves as exhausted,
/// so the other cameras keep running.
pub struct Camera {
    name: String,
    capture: Option<videoio::VideoCapture>,
    scale: f64,
}

impl Camera {
    /// `source` is a device index when it parses as one, a path or URL otherwise.
    pub fn open<S: ToString>(name: S, source: &str, scale: f64) -> Result<Self, Error> {
        let name = name.to_string();

        let capture = match source.parse::<i32>() {
            Ok(index) => videoio::VideoCapture::new(index, videoio::CAP_ANY),
            Err(_) => videoio::VideoCapture::from_file(source, videoio::CAP_ANY),
        };

        let capture = match capture {
            Ok(capture) if capture.is_opened()? => {
                log::info!(
                    "camera {}: {} opened, {}x{}",
                    name,
                    source,
                    capture.get(videoio::CAP_PROP_FRAME_WIDTH)?,
                    capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?
                );

                Some(capture)
            }
            Ok(_) => {
                log::error!("camera {}: unable to open {}", name, source);
                None
            }
            Err(err) => {
                log::error!("camera {}: unable to open {}: {}", name, source, err);
                None
            }
        };

        Ok(Self {
            name,
            capture,
            scale,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_opened(&self) -> bool {
        self.capture.is_some()
    }

    /// Next frame scaled by the video scale; `None` once the source is exhausted.
    pub fn read(&mut self) -> Result<Option<Mat>, Error> {
        let capture = match self.capture.as_mut() {
            Some(capture) => capture,
            None => return Ok(None),
        };

        let mut frame = Mat::default();
        if !capture.read(&mut frame)? || frame.cols() == 0 || frame.rows() == 0 {
            log::warn!("camera {}: no more frames", self.name);
            return Ok(None);
        }

        Ok(Some(scale_frame(&frame, self.scale)?))
    }

    pub fn release(&mut self) -> Result<(), Error> {
        if let Some(mut capture) = self.capture.take() {
            capture.release()?;
        }

        Ok(())
    }
}

/// Uniform resize by `scale`; a scale of one returns a copy.
pub fn scale_frame(frame: &Mat, scale: f64) -> Result<Mat, Error> {
    if scale == 1.0 {
        return Ok(frame.try_clone()?);
    }

    let mut out = Mat::default();
    imgproc::resize(
        frame,
        &mut out,
        Size::new(0, 0),
        scale,
        scale,
        imgproc::INTER_CUBIC,
    )?;

    Ok(out)
}

/// Writes the combined frames to a video file, reopening the writer
/// whenever the frame size changes.
pub struct VideoWriter {
    writer: Option<videoio::VideoWriter>,
    size: Option<(i32, i32)>,
    out_file: String,
    fps: f64,
}

impl VideoWriter {
    pub fn new<S: ToString>(out_file: S, fps: f64) -> Self {
        Self {
            writer: None,
            size: None,
            out_file: out_file.to_string(),
            fps,
        }
    }

    pub fn release(&mut self) -> Result<(), Error> {
        if let Some(mut w) = self.writer.take() {
            w.release()?;
        }

        Ok(())
    }

    fn reinit(&mut self, size: (i32, i32)) -> Result<(), Error> {
        log::debug!("{}: writer size {:?}", self.out_file, size);
        self.release()?;

        self.size = Some(size);
        self.writer = Some(videoio::VideoWriter::new(
            &self.out_file,
            videoio::VideoWriter::fourcc('X', 'V', 'I', 'D')?,
            self.fps,
            Size::new(size.0, size.1),
            true,
        )?);

        Ok(())
    }

    pub fn feed(&mut self, m: &Mat) -> Result<(), Error> {
        let size = (m.cols(), m.rows());

        if self.writer.is_none() || self.size != Some(size) {
            self.reinit(size)?;
        }

        if let Some(writer) = self.writer.as_mut() {
            writer.write(m)?;
        }

        Ok(())
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            log::warn!("{}: {}", self.out_file, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{self, Scalar};

    #[test]
    fn scales_both_dimensions() {
        let frame =
            Mat::new_rows_cols_with_default(480, 640, core::CV_8UC3, Scalar::all(0.0)).unwrap();

        let half = scale_frame(&frame, 0.5).unwrap();
        assert_eq!(half.cols(), 320);
        assert_eq!(half.rows(), 240);

        let same = scale_frame(&frame, 1.0).unwrap();
        assert_eq!(same.cols(), 640);
    }

    #[test]
    fn missing_file_reads_nothing() {
        let mut camera = Camera::open("void", "/nonexistent/void.mp4", 0.5).unwrap();

        assert!(!camera.is_opened());
        assert!(camera.read().unwrap().is_none());
        camera.release().unwrap();
    }
}
