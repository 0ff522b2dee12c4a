use std::{fs::File, io::BufReader, path::Path, time::Duration};

use anyhow::{Context, Result, anyhow};
use image::{AnimationDecoder, codecs::gif::GifDecoder};
use rayon::prelude::*;

const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// A fully-decoded character clip: an RGBA frame sequence plus the pacing
/// metadata playback needs. Shared immutably between the preload cache, the
/// display and playback workers.
#[derive(Debug)]
pub struct Clip {
    frames: Vec<Vec<u8>>,
    width: u32,
    height: u32,
    frame_interval: Duration,
}

impl Clip {
    pub fn decode(path: &Path) -> Result<Clip> {
        let file = File::open(path)
            .with_context(|| format!("failed to open clip {}", path.display()))?;
        let decoder = GifDecoder::new(BufReader::new(file))
            .with_context(|| format!("failed to read clip {}", path.display()))?;

        let raw_frames = decoder
            .into_frames()
            .collect_frames()
            .with_context(|| format!("failed to decode clip {}", path.display()))?;

        let first = raw_frames
            .first()
            .ok_or_else(|| anyhow!("clip {} has no frames", path.display()))?;

        let (numer, denom) = first.delay().numer_denom_ms();
        let frame_interval = if numer == 0 || denom == 0 {
            DEFAULT_FRAME_INTERVAL
        } else {
            Duration::from_millis(u64::from(numer / denom).max(1))
        };

        let (width, height) = first.buffer().dimensions();
        for frame in &raw_frames {
            if frame.buffer().dimensions() != (width, height) {
                return Err(anyhow!(
                    "clip {} frames disagree on dimensions",
                    path.display()
                ));
            }
        }

        // Flatten each frame onto an opaque background up front so playback
        // and rendering never have to composite.
        let frames: Vec<Vec<u8>> = raw_frames
            .into_par_iter()
            .map(|frame| flatten_alpha(frame.into_buffer().into_raw()))
            .collect();

        Ok(Clip {
            frames,
            width,
            height,
            frame_interval,
        })
    }

    /// Build a clip from already-prepared RGBA buffers.
    pub fn from_frames(
        frames: Vec<Vec<u8>>,
        width: u32,
        height: u32,
        frame_interval: Duration,
    ) -> Clip {
        Clip {
            frames,
            width,
            height,
            frame_interval,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn frame_rgba(&self, index: usize) -> &[u8] {
        &self.frames[index]
    }
}

/// Composite RGBA pixels over opaque black in place.
fn flatten_alpha(mut rgba: Vec<u8>) -> Vec<u8> {
    rgba.par_chunks_mut(4).for_each(|px| {
        let alpha = u16::from(px[3]);
        if alpha < 255 {
            px[0] = ((u16::from(px[0]) * alpha) / 255) as u8;
            px[1] = ((u16::from(px[1]) * alpha) / 255) as u8;
            px[2] = ((u16::from(px[2]) * alpha) / 255) as u8;
            px[3] = 255;
        }
    });
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_makes_pixels_opaque() {
        // One transparent pixel, one half-transparent white, one opaque red.
        let rgba = vec![
            10, 20, 30, 0, //
            255, 255, 255, 127, //
            200, 0, 0, 255,
        ];
        let out = flatten_alpha(rgba);
        assert_eq!(&out[0..4], &[0, 0, 0, 255]);
        assert_eq!(out[7], 255);
        assert!(out[4] < 255 && out[4] > 100);
        assert_eq!(&out[8..12], &[200, 0, 0, 255]);
    }

    #[test]
    fn from_frames_keeps_metadata() {
        let clip = Clip::from_frames(
            vec![vec![0; 16], vec![255; 16]],
            2,
            2,
            Duration::from_millis(40),
        );
        assert_eq!(clip.frame_count(), 2);
        assert_eq!((clip.width(), clip.height()), (2, 2));
        assert_eq!(clip.frame_interval(), Duration::from_millis(40));
        assert_eq!(clip.frame_rgba(1)[0], 255);
    }
}
