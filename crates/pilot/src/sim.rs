//! Simulated world
//!
//! A kinematic vehicle and one face in a room, seen through a pinhole
//! camera. The same world backs a `FrameSource`, a `VehicleLink` and a
//! `FaceRecognizer`, so the real control loop runs without hardware.
//!
//! Axes: x right, y forward, z up (metres). Heading is measured clockwise
//! from +y, so positive yaw commands turn right.

use crate::PilotError;
use camera_capture::{CameraError, FrameSource, VideoFrame};
use face_id::{BoundingBox, Embedding, FaceIdError, FaceRecognizer, RawFace};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use vehicle_link::{LinkError, VehicleLink};

const BACKGROUND: [u8; 3] = [40, 40, 40];
const FACE_COLOUR: [u8; 3] = [200, 160, 130];

/// Point in world coordinates (metres)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Pre-enroll the face under this label; unset leaves it unknown
    pub face_label: Option<String>,

    pub face_position: SimPoint,

    /// Initial heading (degrees clockwise from +y)
    pub start_heading_deg: f64,

    /// Altitude after takeoff (metres)
    pub takeoff_altitude: f64,

    pub focal_length_px: f64,

    /// Side length of the face (metres)
    pub face_size_m: f64,

    /// Speed at command 100 (m/s)
    pub max_speed: f64,

    /// Yaw rate at command 100 (deg/s)
    pub max_yaw_rate: f64,

    /// End the video stream after this many frames
    pub max_frames: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            face_label: None,
            face_position: SimPoint {
                x: 0.5,
                y: 3.0,
                z: 1.1,
            },
            start_heading_deg: 0.0,
            takeoff_altitude: 1.0,
            focal_length_px: 700.0,
            face_size_m: 0.2,
            max_speed: 1.0,
            max_yaw_rate: 60.0,
            max_frames: None,
        }
    }
}

/// Face as seen by the camera (full-frame pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub cx: f64,
    pub cy: f64,
    pub size: f64,
}

/// Observable world state for inspection
#[derive(Debug, Clone)]
pub struct SimSnapshot {
    pub position: SimPoint,
    pub heading_deg: f64,
    pub connected: bool,
    pub streaming: bool,
    pub airborne: bool,
    pub ended: bool,
    pub frames: u64,
    pub commands_sent: u64,
    pub last_command: (i32, i32, i32, i32),
    pub projection: Option<Projection>,
}

struct World {
    config: SimConfig,
    width: u32,
    height: u32,
    dt: f64,
    position: SimPoint,
    heading: f64,
    connected: bool,
    streaming: bool,
    airborne: bool,
    ended: bool,
    command: (i32, i32, i32, i32),
    frames: u64,
    commands_sent: u64,
}

impl World {
    /// Integrate the current command over one frame period
    fn advance(&mut self) {
        if !self.airborne {
            return;
        }
        let (lr, fb, ud, yaw) = self.command;
        let v = self.config.max_speed / 100.0 * self.dt;
        let (s, c) = self.heading.sin_cos();
        let (fb, lr) = (f64::from(fb), f64::from(lr));

        self.position.x += (fb * s + lr * c) * v;
        self.position.y += (fb * c - lr * s) * v;
        self.position.z = (self.position.z + f64::from(ud) * v).max(0.0);
        self.heading += (f64::from(yaw) / 100.0 * self.config.max_yaw_rate).to_radians() * self.dt;
    }

    fn project(&self) -> Option<Projection> {
        let face = self.config.face_position;
        let (dx, dy, dz) = (
            face.x - self.position.x,
            face.y - self.position.y,
            face.z - self.position.z,
        );
        let (s, c) = self.heading.sin_cos();
        let depth = dx * s + dy * c;
        if depth < 0.05 {
            return None;
        }
        let lateral = dx * c - dy * s;
        let f = self.config.focal_length_px;
        let (w, h) = (f64::from(self.width), f64::from(self.height));

        let projection = Projection {
            cx: w / 2.0 + f * lateral / depth,
            cy: h / 2.0 - f * dz / depth,
            size: f * self.config.face_size_m / depth,
        };
        let visible = (0.0..w).contains(&projection.cx) && (0.0..h).contains(&projection.cy);
        visible.then_some(projection)
    }

    fn render(&self) -> VideoFrame {
        let (w, h) = (self.width, self.height);
        let mut data = BACKGROUND.repeat((w * h) as usize);

        if let Some(p) = self.project() {
            let half = p.size / 2.0;
            let x0 = (p.cx - half).clamp(0.0, f64::from(w)) as usize;
            let x1 = (p.cx + half).clamp(0.0, f64::from(w)) as usize;
            let y0 = (p.cy - half).clamp(0.0, f64::from(h)) as usize;
            let y1 = (p.cy + half).clamp(0.0, f64::from(h)) as usize;
            let stride = w as usize * 3;

            for row in data.chunks_exact_mut(stride).take(y1).skip(y0) {
                for px in row[x0 * 3..x1 * 3].chunks_exact_mut(3) {
                    px.copy_from_slice(&FACE_COLOUR);
                }
            }
        }

        VideoFrame::new(data, w, h, (self.frames as f64 * self.dt * 1e9) as u64, self.frames as u32)
    }

    fn battery(&self) -> u8 {
        100u64.saturating_sub(self.frames / 1500) as u8
    }

    fn require_connection(&self) -> Result<(), LinkError> {
        if self.connected {
            Ok(())
        } else {
            Err(LinkError::NotConnected)
        }
    }
}

fn colour_embedding(rgb: [u8; 3]) -> Embedding {
    Embedding::from(rgb.iter().map(|&c| f32::from(c) / 255.0).collect::<Vec<_>>())
}

/// Shared world handle. Clone it to hand out the camera, vehicle and recognizer.
#[derive(Clone)]
pub struct SimWorld {
    inner: Arc<Mutex<World>>,
}

impl SimWorld {
    pub fn new(config: SimConfig, width: u32, height: u32, fps: u32) -> Self {
        let heading = config.start_heading_deg.to_radians();
        info!(
            "Simulated face at ({:.2}, {:.2}, {:.2}), {}",
            config.face_position.x,
            config.face_position.y,
            config.face_position.z,
            config.face_label.as_deref().unwrap_or("not enrolled")
        );
        let world = World {
            config,
            width,
            height,
            dt: 1.0 / f64::from(fps.max(1)),
            position: SimPoint {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
            heading,
            connected: false,
            streaming: false,
            airborne: false,
            ended: false,
            command: (0, 0, 0, 0),
            frames: 0,
            commands_sent: 0,
        };
        Self {
            inner: Arc::new(Mutex::new(world)),
        }
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn camera(&self) -> SimCamera {
        SimCamera { world: self.clone() }
    }

    pub fn vehicle(&self) -> SimVehicle {
        SimVehicle { world: self.clone() }
    }

    pub fn recognizer(&self) -> SimRecognizer {
        SimRecognizer { world: self.clone() }
    }

    pub fn snapshot(&self) -> SimSnapshot {
        let world = self.world();
        SimSnapshot {
            position: world.position,
            heading_deg: world.heading.to_degrees(),
            connected: world.connected,
            streaming: world.streaming,
            airborne: world.airborne,
            ended: world.ended,
            frames: world.frames,
            commands_sent: world.commands_sent,
            last_command: world.command,
            projection: world.project(),
        }
    }
}

/// Write an identity image for the simulated face into `known_dir`
pub fn seed_known_face(known_dir: &Path, label: &str) -> Result<PathBuf, PilotError> {
    std::fs::create_dir_all(known_dir)?;
    let path = known_dir.join(format!("{label}.png"));
    VideoFrame::filled(64, 64, FACE_COLOUR, 0).save_png(&path)?;
    debug!("Seeded known face {} at {}", label, path.display());
    Ok(path)
}

/// Simulated onboard camera
pub struct SimCamera {
    world: SimWorld,
}

impl FrameSource for SimCamera {
    fn read(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        let mut world = self.world.world();
        if world.config.max_frames.is_some_and(|max| world.frames >= max) {
            info!("Simulated stream ended after {} frames", world.frames);
            return Ok(None);
        }
        if !world.streaming {
            return Err(CameraError::Stream("video stream is off".to_string()));
        }
        world.advance();
        world.frames += 1;
        Ok(Some(world.render()))
    }

    fn stop(&mut self) {
        debug!("Simulated camera released");
    }
}

/// Simulated vehicle link
pub struct SimVehicle {
    world: SimWorld,
}

impl VehicleLink for SimVehicle {
    fn connect(&mut self) -> Result<(), LinkError> {
        self.world.world().connected = true;
        Ok(())
    }

    fn set_speed(&mut self, speed: u32) -> Result<(), LinkError> {
        self.world.world().require_connection()?;
        debug!("Simulated speed set to {}", speed);
        Ok(())
    }

    fn stream_on(&mut self) -> Result<(), LinkError> {
        let mut world = self.world.world();
        world.require_connection()?;
        world.streaming = true;
        Ok(())
    }

    fn stream_off(&mut self) -> Result<(), LinkError> {
        let mut world = self.world.world();
        world.require_connection()?;
        world.streaming = false;
        Ok(())
    }

    fn send_velocity(
        &mut self,
        left_right: i32,
        forward_back: i32,
        up_down: i32,
        yaw: i32,
    ) -> Result<(), LinkError> {
        let mut world = self.world.world();
        world.require_connection()?;
        world.command = (left_right, forward_back, up_down, yaw);
        world.commands_sent += 1;
        Ok(())
    }

    fn takeoff(&mut self) -> Result<(), LinkError> {
        let mut world = self.world.world();
        world.require_connection()?;
        world.airborne = true;
        world.position.z = world.config.takeoff_altitude;
        Ok(())
    }

    fn land(&mut self) -> Result<(), LinkError> {
        let mut world = self.world.world();
        world.require_connection()?;
        world.airborne = false;
        world.position.z = 0.0;
        world.command = (0, 0, 0, 0);
        Ok(())
    }

    fn battery(&mut self) -> Result<u8, LinkError> {
        let world = self.world.world();
        world.require_connection()?;
        Ok(world.battery())
    }

    fn end(&mut self) {
        let mut world = self.world.world();
        world.connected = false;
        world.streaming = false;
        world.ended = true;
    }
}

/// Recognizer that reads the face straight from the world geometry.
///
/// Embeddings are the face colour, so identity images written by the store
/// (crops of rendered frames) embed to the same vector.
pub struct SimRecognizer {
    world: SimWorld,
}

impl FaceRecognizer for SimRecognizer {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<RawFace>, FaceIdError> {
        let world = self.world.world();
        let Some(p) = world.project() else {
            return Ok(Vec::new());
        };
        let scale = f64::from(frame.width) / f64::from(world.width);
        let size = ((p.size * scale) as i32).max(1);
        let bbox = BoundingBox::from_center((p.cx * scale) as i32, (p.cy * scale) as i32, size, size)?;

        Ok(vec![RawFace {
            bbox,
            embedding: colour_embedding(FACE_COLOUR),
        }])
    }

    fn embed_image(&mut self, path: &Path) -> Result<Option<Embedding>, FaceIdError> {
        let img = image::open(path)?.to_rgb8();
        let (w, h) = img.dimensions();
        let Some(pixel) = img.get_pixel_checked(w / 2, h / 2) else {
            return Ok(None);
        };
        if pixel.0 == BACKGROUND {
            return Ok(None);
        }
        Ok(Some(colour_embedding(pixel.0)))
    }
}
