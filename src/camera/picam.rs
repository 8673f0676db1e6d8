//! Raspberry Pi camera module backend.
//!
//! The camera stack on current Raspberry Pi OS is libcamera, reached here
//! through `rpicam-vid` (or its older name `libcamera-vid`) writing raw
//! YUV420 frames to stdout. Each read pulls exactly one frame off the pipe.
//! Widths that are a multiple of 64 avoid stride padding in the raw output.

use std::io::{self, BufRead, BufReader, ErrorKind, Read};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::frame_utils::{i420_frame_len, i420_to_rgb};
use super::types::{CameraError, CameraSettings, Frame, Resolution};

/// Executable names tried in order.
pub const CAPTURE_BINARIES: [&str; 2] = ["rpicam-vid", "libcamera-vid"];

/// How long `open` waits for the first frame before giving up on the camera.
pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Row alignment of the raw YUV420 output. Other widths get padded rows.
pub const STRIDE_ALIGN: u32 = 64;

/// True if rows of `width` pixels come out without padding.
pub fn is_stride_aligned(width: u32) -> bool {
    width % STRIDE_ALIGN == 0
}

/// Build the capture arguments for a raw YUV420 stream on stdout.
pub fn capture_args(settings: &CameraSettings) -> Vec<String> {
    let mut args = vec![
        "--timeout".to_string(),
        "0".to_string(),
        "--nopreview".to_string(),
        "--codec".to_string(),
        "yuv420".to_string(),
        "--width".to_string(),
        settings.resolution.width.to_string(),
        "--height".to_string(),
        settings.resolution.height.to_string(),
        "--framerate".to_string(),
        settings.fps.to_string(),
    ];
    if settings.mirror {
        args.push("--hflip".to_string());
    }
    args.extend(["--output".to_string(), "-".to_string()]);
    args
}

/// A running Pi camera capture process.
pub struct PiCamera {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_thread: Option<JoinHandle<()>>,
    resolution: Resolution,
    buffer: Vec<u8>,
    /// First frame, read during `open` to prove the camera works
    pending: Option<Frame>,
}

impl std::fmt::Debug for PiCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiCamera")
            .field("resolution", &self.resolution)
            .field("running", &self.child.is_some())
            .finish_non_exhaustive()
    }
}

impl PiCamera {
    /// Spawn the capture process and wait for the first frame.
    ///
    /// Fails if no capture binary is installed, if the process exits before
    /// producing a frame (no camera attached), or if no frame arrives within
    /// [`FIRST_FRAME_TIMEOUT`].
    pub fn open(settings: &CameraSettings) -> Result<Self, CameraError> {
        let Resolution { width, height } = settings.resolution;
        if width == 0 || height == 0 {
            return Err(CameraError::OpenFailed(format!(
                "invalid capture size {}x{}",
                width, height
            )));
        }
        if !is_stride_aligned(width) {
            log::warn!(
                "Pi camera width {} is not a multiple of {}; rows may be padded and frames skewed",
                width,
                STRIDE_ALIGN
            );
        }

        let args = capture_args(settings);
        let mut child = spawn_first_available(&args)?;

        let stdout = child.stdout.take();
        let stderr_thread = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines() {
                    match line {
                        Ok(l) => log::debug!("[rpicam] {}", l),
                        Err(_) => break,
                    }
                }
            })
        });

        let mut camera = Self {
            child: Some(child),
            stdout: None,
            stderr_thread,
            resolution: settings.resolution,
            buffer: Vec::new(),
            pending: None,
        };

        let Some(stdout) = stdout else {
            camera.release();
            return Err(CameraError::OpenFailed("capture process has no stdout".to_string()));
        };
        let buffer = vec![0; i420_frame_len(width, height)];
        let first = read_first_frame(stdout, buffer, FIRST_FRAME_TIMEOUT).and_then(
            |(stdout, buffer)| {
                camera.stdout = Some(stdout);
                let frame = i420_to_rgb(&buffer, width, height);
                camera.buffer = buffer;
                frame.ok_or_else(|| CameraError::ReadFailed("short YUV420 frame".to_string()))
            },
        );

        match first {
            Ok(frame) => {
                log::info!(
                    "Pi camera streaming at {}x{} @ {} fps",
                    settings.resolution.width,
                    settings.resolution.height,
                    settings.fps
                );
                camera.pending = Some(frame);
                Ok(camera)
            }
            Err(e) => {
                camera.release();
                match e {
                    CameraError::OpenFailed(_) => Err(e),
                    other => Err(CameraError::OpenFailed(other.to_string())),
                }
            }
        }
    }

    /// Resolution of the raw stream.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Return the next whole frame.
    pub fn capture(&mut self) -> Result<Frame, CameraError> {
        if let Some(frame) = self.pending.take() {
            return Ok(frame);
        }
        self.read_frame()
    }

    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        let stdout = self.stdout.as_mut().ok_or(CameraError::Released)?;
        stdout.read_exact(&mut self.buffer).map_err(read_error)?;
        i420_to_rgb(&self.buffer, self.resolution.width, self.resolution.height)
            .ok_or_else(|| CameraError::ReadFailed("short YUV420 frame".to_string()))
    }

    /// Stop the capture process. Safe to call twice.
    pub fn release(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                // already exited
                log::debug!("Pi camera process kill: {}", e);
            }
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PiCamera {
    fn drop(&mut self) {
        self.release();
    }
}

fn read_error(e: io::Error) -> CameraError {
    if e.kind() == ErrorKind::UnexpectedEof {
        CameraError::ReadFailed("capture process ended".to_string())
    } else {
        CameraError::ReadFailed(e.to_string())
    }
}

/// Fill `buffer` from `reader` on a helper thread, waiting at most `timeout`.
///
/// On success the reader and the filled buffer are handed back. On timeout
/// the helper thread keeps the reader until its read returns; killing the
/// capture process closes the pipe and ends it.
fn read_first_frame<R>(
    mut reader: R,
    mut buffer: Vec<u8>,
    timeout: Duration,
) -> Result<(R, Vec<u8>), CameraError>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = reader.read_exact(&mut buffer).map(|()| (reader, buffer));
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result.map_err(read_error),
        Err(RecvTimeoutError::Timeout) => Err(CameraError::OpenFailed(format!(
            "no frame within {:.1}s",
            timeout.as_secs_f64()
        ))),
        Err(RecvTimeoutError::Disconnected) => Err(CameraError::ReadFailed(
            "first frame reader stopped".to_string(),
        )),
    }
}

fn spawn_first_available(args: &[String]) -> Result<Child, CameraError> {
    for binary in CAPTURE_BINARIES {
        match Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => {
                log::debug!("Spawned {} {}", binary, args.join(" "));
                return Ok(child);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(CameraError::OpenFailed(format!("{}: {}", binary, e))),
        }
    }
    Err(CameraError::OpenFailed(format!(
        "none of {} found",
        CAPTURE_BINARIES.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_args_raw_stream_to_stdout() {
        let settings = CameraSettings::default();
        let args = capture_args(&settings);
        let joined = args.join(" ");
        assert!(joined.contains("--codec yuv420"));
        assert!(joined.contains("--width 1280"));
        assert!(joined.contains("--height 720"));
        assert!(joined.contains("--framerate 30"));
        assert!(joined.ends_with("--output -"));
        assert!(!joined.contains("--hflip"));
    }

    #[test]
    fn test_stride_alignment() {
        assert!(is_stride_aligned(640));
        assert!(is_stride_aligned(1280));
        assert!(!is_stride_aligned(800));
        assert!(!is_stride_aligned(1000));
    }

    #[test]
    fn test_zero_size_rejected_before_spawn() {
        let settings = CameraSettings {
            resolution: Resolution {
                width: 0,
                height: 720,
            },
            ..CameraSettings::default()
        };
        match PiCamera::open(&settings) {
            Err(CameraError::OpenFailed(msg)) => assert!(msg.contains("0x720")),
            other => panic!("Expected OpenFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_first_frame_read() {
        let data = vec![9u8; 12];
        let (_, buffer) =
            read_first_frame(io::Cursor::new(data), vec![0; 12], Duration::from_secs(1)).unwrap();
        assert_eq!(buffer, vec![9u8; 12]);
    }

    #[test]
    fn test_first_frame_short_stream() {
        let result = read_first_frame(
            io::Cursor::new(vec![1u8; 4]),
            vec![0; 12],
            Duration::from_secs(1),
        );
        match result {
            Err(CameraError::ReadFailed(msg)) => assert_eq!(msg, "capture process ended"),
            other => panic!("Expected ReadFailed, got {:?}", other.map(|_| ())),
        }
    }

    /// Reader that stalls like a camera process that never starts streaming.
    struct Stalled(Duration);

    impl Read for Stalled {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            thread::sleep(self.0);
            Ok(0)
        }
    }

    #[test]
    fn test_first_frame_times_out() {
        let start = std::time::Instant::now();
        let result = read_first_frame(
            Stalled(Duration::from_secs(2)),
            vec![0; 12],
            Duration::from_millis(50),
        );
        assert!(matches!(result, Err(CameraError::OpenFailed(_))));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_capture_args_mirror() {
        let settings = CameraSettings {
            mirror: true,
            ..CameraSettings::default()
        };
        assert!(capture_args(&settings).contains(&"--hflip".to_string()));
    }
}
