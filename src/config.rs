use crate::{
    services::UploadServiceConfig,
    state::UploadLimits,
    storage::{
        CloudCredentials, CloudProvider, CloudStorageConfig, LocalStorageConfig, StorageConfig,
        StorageKind, VolumeStorageConfig,
    },
};
use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::{env, path::PathBuf, str::FromStr};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub storage_kind: StorageKind,
    pub local_path: PathBuf,
    pub volume_path: PathBuf,
    pub base_url: Option<String>,
    pub cloud_provider: Option<CloudProvider>,
    pub cloud_bucket: Option<String>,
    pub cloud_region: Option<String>,
    pub cloud_credentials: CloudCredentials,
    pub max_file_size: u64,
    pub max_files: usize,
    pub max_concurrency: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "File upload pipeline API")]
pub struct Args {
    /// Host to bind to (overrides UPLOAD_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Storage backend: local, volume or cloud (overrides STORAGE_TYPE)
    #[arg(long)]
    pub storage_type: Option<String>,

    /// Directory for the local backend (overrides STORAGE_LOCAL_PATH)
    #[arg(long)]
    pub local_path: Option<PathBuf>,

    /// Mount point for the volume backend (overrides STORAGE_VOLUME_PATH)
    #[arg(long)]
    pub volume_path: Option<PathBuf>,

    /// Public base URL for stored files (overrides STORAGE_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Per-file size ceiling in bytes (overrides UPLOAD_MAX_FILE_SIZE)
    #[arg(long)]
    pub max_file_size: Option<u64>,

    /// Files accepted per batch request (overrides UPLOAD_MAX_FILES)
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Pipelines run concurrently per batch (overrides UPLOAD_MAX_CONCURRENCY)
    #[arg(long)]
    pub max_concurrency: Option<usize>,
}

/// Read `name`, parsing it when set; `default` when absent.
fn env_parsed<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|err| anyhow!("{err}"))
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

/// Read `name`, treating empty values as unset.
fn env_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_storage_kind(value: &str) -> Result<StorageKind> {
    match value.to_ascii_lowercase().as_str() {
        "local" => Ok(StorageKind::Local),
        // `docker` kept as an alias for the mounted-volume backend
        "volume" | "docker" => Ok(StorageKind::Volume),
        "cloud" => Ok(StorageKind::Cloud),
        other => bail!("unknown storage type `{}`", other),
    }
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_env_with(Args::parse())
    }

    /// Merge already-parsed CLI args over the environment.
    pub fn from_env_with(args: Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = env::var("UPLOAD_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = env_parsed("PORT", 3000u16)?;
        let env_storage = env::var("STORAGE_TYPE").unwrap_or_else(|_| "local".into());
        let env_local = env::var("STORAGE_LOCAL_PATH").unwrap_or_else(|_| "./uploads".into());
        let env_volume = env::var("STORAGE_VOLUME_PATH")
            .or_else(|_| env::var("STORAGE_DOCKER_VOLUME"))
            .unwrap_or_else(|_| "/app/uploads".into());
        let env_max_file_size = env_parsed("UPLOAD_MAX_FILE_SIZE", 10 * 1024 * 1024u64)?;
        let env_max_files = env_parsed("UPLOAD_MAX_FILES", 10usize)?;
        let env_max_concurrency = env_parsed("UPLOAD_MAX_CONCURRENCY", 8usize)?;

        let cloud_provider = env_optional("STORAGE_CLOUD_PROVIDER")
            .map(|value| value.parse::<CloudProvider>().map_err(|err| anyhow!(err)))
            .transpose()
            .context("parsing STORAGE_CLOUD_PROVIDER")?;

        // --- Merge ---
        let storage_type = args.storage_type.unwrap_or(env_storage);
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            environment: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            storage_kind: parse_storage_kind(&storage_type)?,
            local_path: args.local_path.unwrap_or_else(|| env_local.into()),
            volume_path: args.volume_path.unwrap_or_else(|| env_volume.into()),
            base_url: args.base_url.or_else(|| env_optional("STORAGE_BASE_URL")),
            cloud_provider,
            cloud_bucket: env_optional("STORAGE_CLOUD_BUCKET"),
            cloud_region: env_optional("STORAGE_CLOUD_REGION"),
            cloud_credentials: CloudCredentials {
                access_key_id: env_optional("STORAGE_CLOUD_ACCESS_KEY"),
                secret_access_key: env_optional("STORAGE_CLOUD_SECRET_KEY"),
                project_id: env_optional("STORAGE_CLOUD_PROJECT_ID"),
            },
            max_file_size: args.max_file_size.unwrap_or(env_max_file_size),
            max_files: args.max_files.unwrap_or(env_max_files),
            max_concurrency: args.max_concurrency.unwrap_or(env_max_concurrency),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The explicit backend configuration for the selected storage kind.
    pub fn storage_config(&self) -> Result<StorageConfig> {
        Ok(match self.storage_kind {
            StorageKind::Local => StorageConfig::Local(LocalStorageConfig {
                path: self.local_path.clone(),
                base_url: self.base_url.clone(),
            }),
            StorageKind::Volume => StorageConfig::Volume(VolumeStorageConfig {
                volume_path: self.volume_path.clone(),
                base_url: self.base_url.clone(),
            }),
            StorageKind::Cloud => StorageConfig::Cloud(CloudStorageConfig {
                provider: self
                    .cloud_provider
                    .context("cloud storage requires STORAGE_CLOUD_PROVIDER")?,
                bucket: self.cloud_bucket.clone().unwrap_or_default(),
                region: self.cloud_region.clone(),
                credentials: self.cloud_credentials.clone(),
                base_url: self.base_url.clone(),
            }),
        })
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_size: self.max_file_size,
            max_files: self.max_files,
        }
    }

    /// Service defaults: the configured request ceiling also caps validation.
    pub fn service_config(&self) -> UploadServiceConfig {
        let mut config = UploadServiceConfig {
            max_concurrent_uploads: self.max_concurrency.max(1),
            ..Default::default()
        };
        config.default_validation_rules.max_size = Some(self.max_file_size);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".into(),
            port: 3000,
            environment: "test".into(),
            storage_kind: StorageKind::Local,
            local_path: "./uploads".into(),
            volume_path: "/app/uploads".into(),
            base_url: None,
            cloud_provider: None,
            cloud_bucket: None,
            cloud_region: None,
            cloud_credentials: CloudCredentials::default(),
            max_file_size: 1024,
            max_files: 3,
            max_concurrency: 0,
        }
    }

    #[test]
    fn storage_kind_aliases() {
        assert_eq!(parse_storage_kind("LOCAL").unwrap(), StorageKind::Local);
        assert_eq!(parse_storage_kind("docker").unwrap(), StorageKind::Volume);
        assert!(parse_storage_kind("ftp").is_err());
    }

    #[test]
    fn cloud_without_provider_is_a_config_error() {
        let cfg = AppConfig {
            storage_kind: StorageKind::Cloud,
            ..base()
        };
        assert!(cfg.storage_config().is_err());

        let cfg = AppConfig {
            cloud_provider: Some(CloudProvider::Azure),
            cloud_bucket: Some("media".into()),
            ..cfg
        };
        match cfg.storage_config().unwrap() {
            StorageConfig::Cloud(cloud) => assert_eq!(cloud.bucket, "media"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn service_config_follows_limits() {
        let service = base().service_config();
        assert_eq!(service.max_concurrent_uploads, 1);
        assert_eq!(service.default_validation_rules.max_size, Some(1024));
        assert_eq!(base().upload_limits().max_files, 3);
        assert_eq!(base().addr(), "127.0.0.1:3000");
    }
}
