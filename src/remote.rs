//! Talking to the gesture recognizer: predictions, cameras and the live
//! video feed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::components::Direction;
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::player::parse_prediction;

/// Anything that can be polled for the latest direction hint.
#[async_trait]
pub trait PredictionSource: Send + Sync {
    async fn fetch(&self) -> Result<Option<Direction>>;
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    prediction: String,
}

/// HTTP client for the recognizer's JSON endpoints.
pub struct GestureServer {
    client: reqwest::Client,
    base_url: String,
    csrf_token: Option<String>,
}

impl GestureServer {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("gesture-pacman/0.1")
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            csrf_token: config.csrf_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = self.url(path);
        let resp = self.client.get(&url).send().await?;
        check_status(url, resp)
    }

    pub async fn cameras(&self) -> Result<Vec<u32>> {
        Ok(self.get("get_cameras").await?.json().await?)
    }

    pub async fn set_camera(&self, camera_id: u32) -> Result<()> {
        let url = self.url("set_camera");
        let id = camera_id.to_string();
        let token = self.csrf_token.as_deref().unwrap_or_default();
        let resp = self
            .client
            .post(&url)
            .form(&[("camera_id", id.as_str()), ("csrf_token", token)])
            .send()
            .await?;
        check_status(url, resp)?;
        info!(camera_id, "camera selected");
        Ok(())
    }
}

fn check_status(url: String, resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(Error::Status { url, status })
    }
}

#[async_trait]
impl PredictionSource for GestureServer {
    async fn fetch(&self) -> Result<Option<Direction>> {
        let body: PredictionResponse = self.get("get_prediction").await?.json().await?;
        debug!(prediction = %body.prediction, "prediction received");
        Ok(parse_prediction(&body.prediction))
    }
}

/// A prediction source fed by hand, for playing without a camera.
#[derive(Debug, Default)]
pub struct ManualPrediction {
    latest: Mutex<Option<Direction>>,
}

impl ManualPrediction {
    pub fn set(&self, dir: Option<Direction>) {
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = dir;
    }
}

#[async_trait]
impl PredictionSource for ManualPrediction {
    async fn fetch(&self) -> Result<Option<Direction>> {
        Ok(*self.latest.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Cycles through the cameras the server reports.
pub struct CameraSelector {
    server: Arc<GestureServer>,
    selected: Mutex<Option<u32>>,
}

impl CameraSelector {
    pub fn new(server: Arc<GestureServer>) -> Self {
        Self {
            server,
            selected: Mutex::new(None),
        }
    }

    pub fn selected(&self) -> Option<u32> {
        *self.selected.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Switches to the camera listed after the current one. Returns the new
    /// camera, or `None` when the server has none.
    pub async fn cycle(&self) -> Result<Option<u32>> {
        let cameras = self.server.cameras().await?;
        let Some(next) = next_camera(&cameras, self.selected()) else {
            return Ok(None);
        };
        self.server.set_camera(next).await?;
        *self.selected.lock().unwrap_or_else(|e| e.into_inner()) = Some(next);
        Ok(Some(next))
    }
}

fn next_camera(cameras: &[u32], current: Option<u32>) -> Option<u32> {
    let pos = current.and_then(|c| cameras.iter().position(|id| *id == c));
    match pos {
        Some(i) => cameras.get((i + 1) % cameras.len()).copied(),
        None => cameras.first().copied(),
    }
}

/// The camera stream shown next to the maze.
pub trait VideoFeed: Send + Sync {
    fn start(&self);
    fn stop(&self);
}

/// Points the video surface at either the live stream or the "video off"
/// page.
#[derive(Debug)]
pub struct FeedToggle {
    video_url: String,
    no_video_url: String,
    live: AtomicBool,
}

impl FeedToggle {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            video_url: config.video_url.clone(),
            no_video_url: config.no_video_url.clone(),
            live: AtomicBool::new(false),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn current_url(&self) -> &str {
        if self.is_live() {
            &self.video_url
        } else {
            &self.no_video_url
        }
    }
}

impl VideoFeed for FeedToggle {
    fn start(&self) {
        self.live.store(true, Ordering::SeqCst);
        info!(url = %self.video_url, "video feed on");
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
        info!(url = %self.no_video_url, "video feed off");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_prediction_body() {
        let body: PredictionResponse =
            serde_json::from_str(r#"{"prediction": "left"}"#).unwrap();
        assert_eq!(parse_prediction(&body.prediction), Some(Direction::Left));
        let body: PredictionResponse =
            serde_json::from_str(r#"{"prediction": "none"}"#).unwrap();
        assert_eq!(parse_prediction(&body.prediction), None);
    }

    #[test]
    fn camera_cycle_wraps_around() {
        assert_eq!(next_camera(&[0, 2, 3], None), Some(0));
        assert_eq!(next_camera(&[0, 2, 3], Some(0)), Some(2));
        assert_eq!(next_camera(&[0, 2, 3], Some(3)), Some(0));
        assert_eq!(next_camera(&[0, 2, 3], Some(7)), Some(0));
        assert_eq!(next_camera(&[], Some(1)), None);
    }

    #[test]
    fn feed_toggle_switches_urls() {
        let feed = FeedToggle::new(&ServerConfig::default());
        assert!(feed.current_url().ends_with("/video_off"));
        feed.start();
        assert!(feed.is_live());
        assert!(feed.current_url().ends_with("/video_feed"));
        feed.stop();
        assert!(!feed.is_live());
    }

    #[tokio::test]
    async fn manual_source_returns_latest() {
        let source = ManualPrediction::default();
        assert_eq!(source.fetch().await.unwrap(), None);
        source.set(Some(Direction::Up));
        source.set(Some(Direction::Down));
        assert_eq!(source.fetch().await.unwrap(), Some(Direction::Down));
    }

    #[test]
    fn server_urls_ignore_trailing_slash() {
        let config = ServerConfig {
            base_url: "http://localhost:5000/".into(),
            ..ServerConfig::default()
        };
        let server = GestureServer::new(&config).unwrap();
        assert_eq!(server.url("get_prediction"), "http://localhost:5000/get_prediction");
    }
}
