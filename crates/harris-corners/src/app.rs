//! Application-level helpers shared by the CLI and examples.
//!
//! These functions wire up I/O (load image, JSON/PNG output) around the core
//! detection API so both the CLI and examples share the same behavior.

use crate::image::{view_u16, view_u8, Gray16Image};
use anyhow::{Context, Result};
use harris_corners_core::detect::find_candidates_with_trace;
use harris_corners_core::{Candidate, HarrisParams, ImageView, StageTimings};
use image::{DynamicImage, GrayImage, ImageReader, Luma};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Write, path::Path, path::PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    pub image: PathBuf,
    pub threshold_abs: Option<f32>,
    pub output_json: Option<PathBuf>,
    pub output_png: Option<PathBuf>,
    /// Run the detector this many times and log per-stage timing statistics.
    pub repeat: Option<u32>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateOut {
    pub row: usize,
    pub col: usize,
    pub score: f32,
}

impl From<&Candidate> for CandidateOut {
    fn from(c: &Candidate) -> Self {
        Self {
            row: c.row,
            col: c.col,
            score: c.score,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetectionDump {
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub threshold_abs: f32,
    pub candidates: Vec<CandidateOut>,
}

/// Decoded input on the 8- or 16-bit path.
pub enum LoadedImage {
    Gray8(GrayImage),
    Gray16(Gray16Image),
}

impl LoadedImage {
    /// 16-bit encodings keep their depth; everything else becomes 8-bit luma.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        match img {
            DynamicImage::ImageLuma16(g) => LoadedImage::Gray16(g),
            DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_) => LoadedImage::Gray16(img.to_luma16()),
            other => LoadedImage::Gray8(other.to_luma8()),
        }
    }

    pub fn view(&self) -> ImageView<'_> {
        match self {
            LoadedImage::Gray8(g) => view_u8(g),
            LoadedImage::Gray16(g) => view_u16(g),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            LoadedImage::Gray8(g) => g.dimensions(),
            LoadedImage::Gray16(g) => g.dimensions(),
        }
    }

    /// 8-bit copy for visualization.
    pub fn to_gray8(&self) -> GrayImage {
        match self {
            LoadedImage::Gray8(g) => g.clone(),
            LoadedImage::Gray16(g) => DynamicImage::ImageLuma16(g.clone()).to_luma8(),
        }
    }
}

pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = ImageReader::open(path)
        .with_context(|| format!("opening image {}", path.display()))?
        .decode()
        .with_context(|| format!("decoding image {}", path.display()))?;
    Ok(LoadedImage::from_dynamic(img))
}

pub fn run_detection(cfg: DetectionConfig) -> Result<DetectionDump> {
    let repeat = cfg.repeat.unwrap_or(1);
    if repeat == 0 {
        anyhow::bail!("repeat must be >= 1");
    }
    let params = HarrisParams {
        threshold_abs: cfg.threshold_abs.unwrap_or(HarrisParams::default().threshold_abs),
    };
    if params.threshold_abs.is_nan() {
        anyhow::bail!("threshold_abs must be a number");
    }

    let img = load_image(&cfg.image)?;
    let view = img.view();
    let (width, height) = img.dimensions();
    debug!(
        "loaded {} ({width}x{height}, {}-bit)",
        cfg.image.display(),
        view.depth().bits()
    );

    let mut timings = StageTimings::new();
    let mut candidates = Vec::new();
    for _ in 0..repeat {
        let res = find_candidates_with_trace(view, &params, &mut timings);
        debug!("scores {:.3} ms, maxima {:.3} ms", res.scores_ms, res.maxima_ms);
        candidates = res.candidates;
    }
    info!("{} candidates", candidates.len());
    if repeat > 1 {
        info!("stage timings over {repeat} runs:\n{}", timings.summary());
    }

    let dump = DetectionDump {
        image: cfg.image.to_string_lossy().into_owned(),
        width,
        height,
        depth: view.depth().bits(),
        threshold_abs: params.threshold_abs,
        candidates: candidates.iter().map(CandidateOut::from).collect(),
    };

    let json_out = cfg
        .output_json
        .unwrap_or_else(|| cfg.image.with_extension("candidates.json"));
    write_json(&json_out, &dump)?;
    info!("wrote {}", json_out.display());

    if let Some(png_out) = cfg.output_png {
        let mut vis = img.to_gray8();
        draw_candidates(&mut vis, &dump.candidates);
        vis.save(&png_out)
            .with_context(|| format!("writing {}", png_out.display()))?;
        info!("wrote {}", png_out.display());
    }

    Ok(dump)
}

/// Mark each candidate with a 3×3 white square.
pub fn draw_candidates(vis: &mut GrayImage, candidates: &[CandidateOut]) {
    let (w, h) = (vis.width() as i64, vis.height() as i64);
    for c in candidates {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let xx = c.col as i64 + dx;
                let yy = c.row as i64 + dy;
                if xx >= 0 && yy >= 0 && xx < w && yy < h {
                    vis.put_pixel(xx as u32, yy as u32, Luma([255u8]));
                }
            }
        }
    }
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let mut json_file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(&mut json_file, value)?;
    json_file.write_all(b"\n")?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<DetectionConfig> {
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    let cfg: DetectionConfig = serde_json::from_reader(file)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
