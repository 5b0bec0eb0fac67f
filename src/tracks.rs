//! Replays tracker output recorded as JSON lines, one processed frame per line.

use crate::error::Error;
use crate::frame::Frame;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Something that hands out the tracked detections of a processed frame.
pub trait DetectionSource {
    fn next_frame(&mut self, index: u64) -> Result<Frame, Error>;
}

pub struct TrackFile<R> {
    reader: R,
    pending: Option<Frame>,
    line: String,
    exhausted: bool,
}

impl TrackFile<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path.as_ref())?;
        log::info!("replaying tracks from {}", path.as_ref().display());

        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> TrackFile<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: None,
            line: String::new(),
            exhausted: false,
        }
    }

    fn peek(&mut self) -> Result<Option<&Frame>, Error> {
        while self.pending.is_none() && !self.exhausted {
            self.line.clear();

            if self.reader.read_line(&mut self.line)? == 0 {
                self.exhausted = true;
                break;
            }

            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }

            self.pending = Some(serde_json::from_str(line)?);
        }

        Ok(self.pending.as_ref())
    }
}

impl<R: BufRead> DetectionSource for TrackFile<R> {
    /// Frames must be asked for in increasing order; recorded frames older
    /// than `index` are skipped.
    fn next_frame(&mut self, index: u64) -> Result<Frame, Error> {
        loop {
            match self.peek()?.map(|frame| frame.index) {
                Some(recorded) if recorded < index => {
                    log::debug!("skipping recorded frame {}", recorded);
                    self.pending = None;
                }
                Some(recorded) if recorded == index => {
                    return Ok(self.pending.take().unwrap_or_else(|| Frame::empty(index)));
                }
                _ => return Ok(Frame::empty(index)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Detection;
    use std::io::Cursor;

    const DUMP: &str = r#"{"frame": 0, "persons": [{"id": 1, "bbox": [180, 60, 220, 180]}]}

{"frame": 5, "persons": [{"id": 1, "bbox": [182, 60, 222, 181]}], "objects": [{"id": 7, "bbox": [200, 170, 220, 190]}]}
{"frame": 15, "objects": [{"id": 7, "bbox": [200, 170, 220, 190]}]}
"#;

    #[test]
    fn replays_recorded_frames() {
        let mut tracks = TrackFile::new(Cursor::new(DUMP));

        let first = tracks.next_frame(0).unwrap();
        assert_eq!(first.persons, vec![Detection::ltrb(1, 180.0, 60.0, 220.0, 180.0)]);
        assert!(first.objects.is_empty());

        let second = tracks.next_frame(5).unwrap();
        assert_eq!(second.index, 5);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn missing_frames_are_empty() {
        let mut tracks = TrackFile::new(Cursor::new(DUMP));

        tracks.next_frame(0).unwrap();
        tracks.next_frame(5).unwrap();

        let gap = tracks.next_frame(10).unwrap();
        assert!(gap.is_empty());
        assert_eq!(gap.index, 10);

        assert_eq!(tracks.next_frame(15).unwrap().objects.len(), 1);
        assert!(tracks.next_frame(20).unwrap().is_empty());
    }

    #[test]
    fn skips_frames_never_asked_for() {
        let mut tracks = TrackFile::new(Cursor::new(DUMP));

        let frame = tracks.next_frame(15).unwrap();

        assert_eq!(frame.index, 15);
        assert_eq!(frame.objects[0].id, 7);
    }

    #[test]
    fn malformed_line_is_an_error() {
        let mut tracks = TrackFile::new(Cursor::new("{\"frame\": 0, \"persons\": [\n"));

        assert!(matches!(tracks.next_frame(0), Err(Error::JsonError(_))));
    }
}
