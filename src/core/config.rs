use std::env;
use std::time::Duration;

use uuid::Uuid;

use crate::features::assets::TagStorage;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub catalog: CatalogConfig,
    pub database: Option<DatabaseConfig>,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub minio: Option<MinIOConfig>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

/// Which catalog store backs the repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogBackend {
    Postgres,
    /// Process-local store, lost on restart. Meant for local development.
    Memory,
}

/// Which content store holds uploaded bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentBackend {
    Minio,
    Memory,
}

/// Behavior switches for the asset catalog
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub backend: CatalogBackend,
    pub content_backend: ContentBackend,
    pub tag_storage: TagStorage,
    /// When true, non-admin actors only see and download assets they uploaded
    pub restrict_listing_to_owner: bool,
    /// When true, uploads without credentials are attributed to the system uploader
    pub allow_anonymous_uploads: bool,
    /// Username of the pre-provisioned fallback uploader account
    pub system_uploader_username: String,
    /// Storage quota reported by the storage stats endpoint
    pub storage_limit_bytes: i64,
    /// Admin account provisioned at startup so tokens have someone to resolve to
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Pre-provisioned administrator, keyed by the `sub` its tokens carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl BootstrapAdmin {
    const DEFAULT_USERNAME: &'static str = "admin";

    /// Build from raw settings. No id means no bootstrap admin.
    pub fn from_parts(
        id: Option<&str>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Self>, String> {
        let Some(id) = id.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        let id = Uuid::parse_str(id)
            .map_err(|e| format!("BOOTSTRAP_ADMIN_ID must be a UUID: {}", e))?;

        let username = username
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(Self::DEFAULT_USERNAME)
            .to_string();
        let email = email
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}@localhost", username));

        Ok(Some(Self {
            id,
            username,
            email,
        }))
    }

    pub fn from_env() -> Result<Option<Self>, String> {
        let id = env::var("BOOTSTRAP_ADMIN_ID").ok();
        let username = env::var("BOOTSTRAP_ADMIN_USERNAME").ok();
        let email = env::var("BOOTSTRAP_ADMIN_EMAIL").ok();
        Self::from_parts(id.as_deref(), username.as_deref(), email.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Bearer token validation settings.
///
/// Tokens are issued by an external identity provider that shares `secret`.
#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub leeway: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("leeway", &self.leeway)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// MinIO/S3 storage configuration for asset content
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing asset content
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Key prefix for every stored object (e.g., "assets")
    pub prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        let catalog = CatalogConfig::from_env()?;

        let database = match catalog.backend {
            CatalogBackend::Postgres => Some(DatabaseConfig::from_env()?),
            CatalogBackend::Memory => None,
        };

        let minio = match catalog.content_backend {
            ContentBackend::Minio => Some(MinIOConfig::from_env()?),
            ContentBackend::Memory => None,
        };

        Ok(Config {
            app: AppConfig::from_env()?,
            catalog,
            database,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            minio,
        })
    }
}

/// Parse a boolean flag the way operators tend to write them
pub fn parse_flag(name: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(format!("{} must be a boolean, got '{}'", name, other)),
    }
}

fn flag_from_env(name: &str, default: bool) -> Result<bool, String> {
    match env::var(name) {
        Ok(value) => parse_flag(name, &value),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 100 * 1024 * 1024; // 100MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl CatalogConfig {
    const DEFAULT_STORAGE_LIMIT_BYTES: i64 = 250 * 1024 * 1024 * 1024; // 250GB
    const DEFAULT_SYSTEM_UPLOADER: &'static str = "system";

    pub fn from_env() -> Result<Self, String> {
        let backend = match env::var("CATALOG_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => CatalogBackend::Postgres,
            "memory" => CatalogBackend::Memory,
            other => return Err(format!("Unknown CATALOG_BACKEND '{}'", other)),
        };

        let content_backend = match env::var("CONTENT_BACKEND")
            .unwrap_or_else(|_| "minio".to_string())
            .to_lowercase()
            .as_str()
        {
            "minio" | "s3" => ContentBackend::Minio,
            "memory" => ContentBackend::Memory,
            other => return Err(format!("Unknown CONTENT_BACKEND '{}'", other)),
        };

        let tag_storage = env::var("TAG_STORAGE")
            .unwrap_or_else(|_| "normalized".to_string())
            .parse::<TagStorage>()?;

        let restrict_listing_to_owner = flag_from_env("RESTRICT_LISTING_TO_OWNER", false)?;
        let allow_anonymous_uploads = flag_from_env("ALLOW_ANONYMOUS_UPLOADS", false)?;

        let system_uploader_username = env::var("SYSTEM_UPLOADER_USERNAME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_SYSTEM_UPLOADER.to_string());

        let storage_limit_bytes = env::var("STORAGE_LIMIT_BYTES")
            .unwrap_or_else(|_| Self::DEFAULT_STORAGE_LIMIT_BYTES.to_string())
            .parse::<i64>()
            .map_err(|_| "STORAGE_LIMIT_BYTES must be a valid number".to_string())?;

        Ok(Self {
            backend,
            content_backend,
            tag_storage,
            restrict_listing_to_owner,
            allow_anonymous_uploads,
            system_uploader_username,
            storage_limit_bytes,
            bootstrap_admin: BootstrapAdmin::from_env()?,
        })
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: CatalogBackend::Memory,
            content_backend: ContentBackend::Memory,
            tag_storage: TagStorage::Normalized,
            restrict_listing_to_owner: false,
            allow_anonymous_uploads: false,
            system_uploader_username: Self::DEFAULT_SYSTEM_UPLOADER.to_string(),
            storage_limit_bytes: Self::DEFAULT_STORAGE_LIMIT_BYTES,
            bootstrap_admin: None,
        }
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for small-medium apps)
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl AuthConfig {
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60; // 1 minute

    pub fn from_env() -> Result<Self, String> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET environment variable is required".to_string())?;

        if secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters".to_string());
        }

        let issuer = env::var("JWT_ISSUER").ok().filter(|s| !s.is_empty());

        let leeway_secs = env::var("JWT_LEEWAY")
            .unwrap_or_else(|_| Self::DEFAULT_JWT_LEEWAY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWT_LEEWAY must be a valid number".to_string())?;

        Ok(Self {
            secret,
            issuer,
            leeway: Duration::from_secs(leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Asset Catalog API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "API documentation for the asset catalog".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl MinIOConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let bucket = env::var("MINIO_BUCKET").unwrap_or_else(|_| "asset-catalog".to_string());

        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let prefix = env::var("MINIO_PREFIX").unwrap_or_else(|_| "assets".to_string());

        Ok(Self {
            endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            prefix,
        })
    }
}
