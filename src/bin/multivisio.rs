use anyhow::{bail, Context};
use clap::Parser;
use opencv::{core::Mat, highgui};

use multivisio::capture::{Camera, VideoWriter};
use multivisio::config::Config;
use multivisio::display::{is_quit_key, MultiViewDisplay, ViewGroup};
use multivisio::render::{self, MapRenderer};
use multivisio::tracks::{DetectionSource, TrackFile};
use multivisio::{Frame, FrameDecimator, Monitor, Monitoring};

use std::path::PathBuf;

const OUTPUT_FPS: f64 = 24.0;
const WINDOW_NAME: &str = "Multi-View Display";

/// Projects tracked people and luggage from several cameras onto a top-down map
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session configuration (JSON)
    #[arg(short, long, default_value = "multivisio.json")]
    config: PathBuf,

    /// Process one input frame out of N
    #[arg(long)]
    fps_divider: Option<u64>,

    /// Draw calibration keypoints and projection lines on the streams
    #[arg(long)]
    debug: bool,

    /// Also write the combined view to this video file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

struct Feed {
    name: String,
    camera: Camera,
    tracks: Option<Box<dyn DetectionSource>>,
}

fn main() -> anyhow::Result<()> {
    simple_log::quick!();

    let args = Args::parse();
    let mut config = Config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    if let Some(divider) = args.fps_divider {
        config.fps_divider = divider;
    }
    config.debug |= args.debug;
    if args.output.is_some() {
        config.output = args.output;
    }
    config.validate()?;

    let geometry = config.geometry();
    let mut monitor = Monitor::new(geometry, config.radius_pixels());
    if let Some(seed) = config.color_seed {
        monitor = monitor.with_seed(seed);
    }

    let mut feeds = Vec::with_capacity(config.cameras.len());
    for cam in &config.cameras {
        monitor.add_camera(&cam.name, cam.quadrilateral(config.video_scale)?);

        let tracks: Option<Box<dyn DetectionSource>> = match &cam.tracks {
            Some(path) => Some(Box::new(TrackFile::open(path)?)),
            None => {
                log::warn!("camera {}: no track file, its map stays empty", cam.name);
                None
            }
        };

        feeds.push(Feed {
            name: cam.name.clone(),
            camera: Camera::open(&cam.name, &cam.source, config.video_scale)?,
            tracks,
        });
    }

    if !feeds.iter().any(|feed| feed.camera.is_opened()) {
        bail!("none of the {} cameras could be opened", feeds.len());
    }

    let mut display = MultiViewDisplay::new(
        WINDOW_NAME,
        config.show_titles,
        config.margin,
        config.window_size,
    )
    .with_click_logging(config.debug);

    for feed in &feeds {
        display.add_view(&feed.name, ViewGroup::Primary);
    }

    if config.combined_map {
        display.add_view("Map", ViewGroup::Secondary);
    } else {
        for feed in &feeds {
            display.add_view(format!("{} map", feed.name), ViewGroup::Secondary);
        }
    }

    let renderer = MapRenderer::new(geometry);
    let canvas = renderer.blank_canvas()?;
    let mut writer = config
        .output
        .as_ref()
        .map(|path| VideoWriter::new(path.display(), OUTPUT_FPS));
    let mut decimator = FrameDecimator::new(config.fps_divider);

    'session: loop {
        let index = decimator.counter();
        let process = decimator.tick();

        let mut frames: Vec<Option<Mat>> = Vec::with_capacity(feeds.len());
        for feed in feeds.iter_mut() {
            let opened = feed.camera.is_opened();

            match feed.camera.read()? {
                Some(frame) => frames.push(Some(frame)),
                None if opened => break 'session,
                None => frames.push(None),
            }
        }

        if process {
            for (feed, frame) in feeds.iter_mut().zip(frames.iter_mut()) {
                let detections = match feed.tracks.as_mut() {
                    Some(tracks) => tracks.next_frame(index)?.scaled(config.video_scale as f32),
                    None => Frame::empty(index),
                };

                monitor.update(&detections, &feed.name)?;

                if let (Some(frame), Some(scene)) = (frame.as_mut(), monitor.scene(&feed.name)) {
                    render::annotate(frame, scene, config.debug)?;
                }
            }

            let mut views = frames;
            if config.combined_map {
                let scenes = feeds.iter().filter_map(|feed| monitor.scene(&feed.name));
                views.push(Some(renderer.render_scenes(&canvas, scenes)?));
            } else {
                for feed in &feeds {
                    let map = monitor
                        .scene(&feed.name)
                        .map(|scene| renderer.render_scene(&canvas, scene))
                        .transpose()?;

                    views.push(map);
                }
            }

            let combined = display.display(&views)?;
            if let Some(writer) = writer.as_mut() {
                writer.feed(&combined)?;
            }
        }

        // window events and the quit key on every input frame
        let key = highgui::wait_key(1)?;
        if is_quit_key(key) {
            log::info!("stopped at frame {}", index);
            break;
        }
    }

    for feed in feeds.iter_mut() {
        feed.camera.release()?;
    }
    if let Some(writer) = writer.as_mut() {
        writer.release()?;
    }
    display.close()?;

    log::info!("{} input frames read", decimator.counter());

    Ok(())
}
