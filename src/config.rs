//! Pipeline configuration.
//!
//! All process configuration (endpoint, token, capture parameters, stream
//! profiles) is carried by explicit structs built once at startup and passed
//! into the components that need them. There are no ambient globals.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::channel::ReconnectPolicy;

/// Color treatment applied before JPEG compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Keep the source colors.
    Color,
    /// Collapse to single-channel luminance before encoding.
    Grayscale,
}

/// Encoding profile for one logical stream.
///
/// Each profile yields one payload per captured frame, addressed to the
/// stream channel named by `stream`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamProfile {
    /// Logical stream identifier presented to the collector (`stream=` query
    /// parameter).
    pub stream: String,

    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,

    /// Color treatment for this stream.
    pub color_mode: ColorMode,
}

impl StreamProfile {
    /// Color profile at the default quality.
    pub fn color(stream: impl Into<String>) -> Self {
        Self { stream: stream.into(), jpeg_quality: 80, color_mode: ColorMode::Color }
    }

    /// Grayscale profile at the default quality.
    pub fn grayscale(stream: impl Into<String>) -> Self {
        Self { stream: stream.into(), jpeg_quality: 80, color_mode: ColorMode::Grayscale }
    }

    /// Override the JPEG quality.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}

/// Capture device parameters handed to real frame sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Device index in the system camera enumeration.
    pub device_index: u32,

    /// Requested capture width in pixels.
    pub width: u32,

    /// Requested capture height in pixels.
    pub height: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { device_index: 0, width: 640, height: 480 }
    }
}

/// Configuration for the ingestion side of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Collector endpoint, e.g. `ws://host:8080/ws`.
    pub endpoint: Url,

    /// Credential presented as the `token` query parameter. The collector
    /// validates it; this crate only presents it.
    pub token: String,

    /// One profile per logical stream. Must not be empty.
    pub profiles: Vec<StreamProfile>,

    /// Maximum production rate in frames per second. `0` disables limiting.
    pub fps_limit: u32,

    /// Reconnect pacing applied to every stream channel.
    pub reconnect: ReconnectPolicy,

    /// Deadline for a single connection open attempt.
    pub connect_timeout: Duration,

    /// Pause between polls while the source reports no frame ready.
    pub idle_poll: Duration,
}

impl IngestConfig {
    /// Configuration with the stock dual-stream setup: color on stream "A",
    /// grayscale on "B", 20 fps, exponential reconnect.
    pub fn new(endpoint: Url, token: impl Into<String>) -> Self {
        Self {
            endpoint,
            token: token.into(),
            profiles: vec![StreamProfile::color("A"), StreamProfile::grayscale("B")],
            fps_limit: 20,
            reconnect: ReconnectPolicy::default_ingest(),
            connect_timeout: Duration::from_secs(10),
            idle_poll: Duration::from_millis(10),
        }
    }

    /// Replace the stream profiles.
    pub fn with_profiles(mut self, profiles: Vec<StreamProfile>) -> Self {
        self.profiles = profiles;
        self
    }

    /// Full connection URL for one stream channel.
    pub fn stream_url(&self, stream: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("role", "ingest")
            .append_pair("stream", stream)
            .append_pair("token", &self.token);
        url
    }

    /// Validate invariants that cannot be expressed in the type system.
    pub fn validate(&self) -> crate::Result<()> {
        if self.profiles.is_empty() {
            return Err(crate::LinkError::config("at least one stream profile is required"));
        }
        for profile in &self.profiles {
            if profile.stream.is_empty() {
                return Err(crate::LinkError::config("stream identifiers must be non-empty"));
            }
            if profile.jpeg_quality == 0 || profile.jpeg_quality > 100 {
                return Err(crate::LinkError::config(format!(
                    "jpeg_quality for stream '{}' must be in 1..=100",
                    profile.stream
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for the robot command channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Collector endpoint, e.g. `ws://host:8080/ws`.
    pub endpoint: Url,

    /// Credential presented as the `token` query parameter.
    pub token: String,

    /// Identifier announced in the `robot_id` query parameter and the hello
    /// handshake.
    pub robot_id: String,

    /// Reconnect pacing. The observed collector behavior uses a flat delay
    /// here rather than the ingest side's exponential schedule.
    pub reconnect: ReconnectPolicy,

    /// Deadline for a single connection open attempt.
    pub connect_timeout: Duration,

    /// Inbound silence tolerated before the connection is pinged. A ping
    /// that draws no traffic within another such interval marks the
    /// connection dead.
    pub keepalive: Duration,
}

impl RobotConfig {
    /// Configuration with the stock robot defaults.
    pub fn new(endpoint: Url, token: impl Into<String>, robot_id: impl Into<String>) -> Self {
        Self {
            endpoint,
            token: token.into(),
            robot_id: robot_id.into(),
            reconnect: ReconnectPolicy::default_robot(),
            connect_timeout: Duration::from_secs(10),
            keepalive: Duration::from_secs(20),
        }
    }

    /// Full connection URL for the command channel.
    pub fn robot_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("role", "robot")
            .append_pair("robot_id", &self.robot_id)
            .append_pair("token", &self.token);
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        Url::parse("ws://collector.local:8080/ws").expect("static url")
    }

    #[test]
    fn stream_url_carries_role_stream_and_token() {
        let config = IngestConfig::new(endpoint(), "super_secret");
        let url = config.stream_url("A");

        let pairs: Vec<(String, String)> =
            url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert!(pairs.contains(&("role".into(), "ingest".into())));
        assert!(pairs.contains(&("stream".into(), "A".into())));
        assert!(pairs.contains(&("token".into(), "super_secret".into())));
    }

    #[test]
    fn robot_url_carries_role_id_and_token() {
        let config = RobotConfig::new(endpoint(), "tok", "r1");
        let url = config.robot_url();

        let pairs: Vec<(String, String)> =
            url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert!(pairs.contains(&("role".into(), "robot".into())));
        assert!(pairs.contains(&("robot_id".into(), "r1".into())));
        assert!(pairs.contains(&("token".into(), "tok".into())));
    }

    #[test]
    fn validate_rejects_empty_profiles() {
        let config = IngestConfig::new(endpoint(), "tok").with_profiles(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_quality() {
        let mut config = IngestConfig::new(endpoint(), "tok");
        config.profiles[0].jpeg_quality = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(IngestConfig::new(endpoint(), "tok").validate().is_ok());
    }
}
