//! Match-day banner: two team crests side by side on a white canvas.

use futures_util::future;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use reqwest::Client;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{WatchError, WatchResult};

pub const CANVAS_WIDTH: u32 = 1200;
pub const CANVAS_HEIGHT: u32 = 500;
/// Every crest is scaled to this width, height follows the aspect ratio
pub const LOGO_WIDTH: u32 = 300;

pub const BANNER_FILE: &str = "match_banner.png";
const HOME_LOGO_FILE: &str = "home_logo.img";
const AWAY_LOGO_FILE: &str = "away_logo.img";

/// Downloaded asset that is removed from disk when dropped.
struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// Builds banners inside `work_dir`.
#[derive(Clone)]
pub struct BannerCompositor {
    http: Client,
    work_dir: PathBuf,
}

impl BannerCompositor {
    pub fn new(work_dir: impl Into<PathBuf>, timeout: Duration) -> WatchResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WatchError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(BannerCompositor {
            http,
            work_dir: work_dir.into(),
        })
    }

    pub fn output_path(&self) -> PathBuf {
        self.work_dir.join(BANNER_FILE)
    }

    /// Download both crests, composite them and write the banner PNG.
    ///
    /// Downloaded crests are deleted on every exit path.
    pub async fn generate(&self, home_logo_url: &str, away_logo_url: &str) -> WatchResult<PathBuf> {
        let (home, away) = future::join(
            self.download(home_logo_url, self.work_dir.join(HOME_LOGO_FILE)),
            self.download(away_logo_url, self.work_dir.join(AWAY_LOGO_FILE)),
        )
        .await;
        let home = home?;
        let away = away?;

        let home_img = decode(home.path())?;
        let away_img = decode(away.path())?;
        let canvas = compose(&home_img, &away_img);

        let output = self.output_path();
        canvas
            .save_with_format(&output, ImageFormat::Png)
            .map_err(|e| WatchError::Encode(format!("{}: {}", output.display(), e)))?;
        info!("Banner written to {}", output.display());
        Ok(output)
    }

    async fn download(&self, url: &str, dest: PathBuf) -> WatchResult<TempFile> {
        let download_err = |reason: String| WatchError::Download {
            url: url.to_string(),
            reason,
        };
        // guard first, so a partial write is cleaned up too
        let file = TempFile { path: dest };

        debug!("Downloading {} to {}", url, file.path().display());
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| download_err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(download_err(format!("HTTP {}", resp.status())));
        }
        let bytes = resp.bytes().await.map_err(|e| download_err(e.to_string()))?;
        tokio::fs::write(file.path(), &bytes)
            .await
            .map_err(|e| download_err(format!("cannot write {}: {}", file.path().display(), e)))?;
        Ok(file)
    }
}

fn decode(path: &Path) -> WatchResult<DynamicImage> {
    let decode_err = |reason: String| WatchError::Decode {
        path: path.display().to_string(),
        reason,
    };
    ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_err(e.to_string()))?
        .decode()
        .map_err(|e| decode_err(e.to_string()))
}

/// Scale to `width` keeping the aspect ratio, using Lanczos3.
pub fn scale_to_width(img: &DynamicImage, width: u32) -> RgbaImage {
    let height = (u64::from(img.height()) * u64::from(width) / u64::from(img.width().max(1))).max(1);
    imageops::resize(&img.to_rgba8(), width, height as u32, FilterType::Lanczos3)
}

/// Place `home` centred at 25% and `away` at 75% of the canvas width, both
/// vertically centred, on a white background.
pub fn compose(home: &DynamicImage, away: &DynamicImage) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgba([255, 255, 255, 255]));
    for (logo, center_x) in [(home, CANVAS_WIDTH / 4), (away, CANVAS_WIDTH * 3 / 4)] {
        let scaled = scale_to_width(logo, LOGO_WIDTH);
        let x = i64::from(center_x) - i64::from(scaled.width()) / 2;
        let y = i64::from(CANVAS_HEIGHT / 2) - i64::from(scaled.height()) / 2;
        imageops::overlay(&mut canvas, &scaled, x, y);
    }
    canvas
}
