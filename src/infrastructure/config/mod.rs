use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::infrastructure::media::AudioFormat;
use crate::infrastructure::repositories::google_tts_repository::DEFAULT_GOOGLE_TTS_ENDPOINT;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // TTS providers
    pub aws_region: String,
    pub polly_engine: PollyEngine,
    pub google_tts_api_key: String,
    pub google_tts_endpoint: String,
    // Storage
    pub storage_backend: StorageBackend,
    pub gcs_bucket: Option<String>,
    pub gcs_access_token: Option<String>,
    pub local_storage_dir: String,
    pub public_base_url: String,
    // Media tooling
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub audio_bitrate: String,
    pub audio_sample_rate: u32,
    pub audio_channels: u16,
    // Job queue
    pub job_workers: usize,
    pub job_max_attempts: u32,
    pub job_retry_backoff_secs: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PollyEngine {
    Neural,
    Standard,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Gcs,
    Local,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "gcs" => StorageBackend::Gcs,
            _ => StorageBackend::Local,
        };

        let config = Config {
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            environment: match env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .as_str()
            {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "eu-west-1".to_string()),
            polly_engine: match env::var("POLLY_ENGINE")
                .unwrap_or_else(|_| "neural".to_string())
                .to_lowercase()
                .as_str()
            {
                "standard" => PollyEngine::Standard,
                _ => PollyEngine::Neural,
            },
            google_tts_api_key: env::var("GOOGLE_TTS_API_KEY")?,
            google_tts_endpoint: env::var("GOOGLE_TTS_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_GOOGLE_TTS_ENDPOINT.to_string()),
            gcs_bucket: env::var("GCS_BUCKET").ok(),
            gcs_access_token: env::var("GCS_ACCESS_TOKEN").ok(),
            storage_backend,
            local_storage_dir: env::var("LOCAL_STORAGE_DIR")
                .unwrap_or_else(|_| "./storage".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080/files".to_string()),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            audio_bitrate: env::var("AUDIO_BITRATE").unwrap_or_else(|_| "128k".to_string()),
            audio_sample_rate: env::var("AUDIO_SAMPLE_RATE")
                .unwrap_or_else(|_| "44100".to_string())
                .parse()?,
            audio_channels: env::var("AUDIO_CHANNELS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()?,
            job_workers: env::var("JOB_WORKERS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()?,
            job_max_attempts: env::var("JOB_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            job_retry_backoff_secs: env::var("JOB_RETRY_BACKOFF_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
        };

        if config.storage_backend == StorageBackend::Gcs
            && (config.gcs_bucket.is_none() || config.gcs_access_token.is_none())
        {
            return Err("STORAGE_BACKEND=gcs requires GCS_BUCKET and GCS_ACCESS_TOKEN".into());
        }

        Ok(config)
    }

    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat {
            bitrate: self.audio_bitrate.clone(),
            sample_rate: self.audio_sample_rate,
            channels: self.audio_channels,
        }
    }

    pub fn job_retry_backoff(&self) -> Duration {
        Duration::from_secs(self.job_retry_backoff_secs)
    }
}
