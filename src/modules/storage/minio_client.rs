//! MinIO/S3-compatible content store
//!
//! Asset content is private: every read goes through the catalog's access
//! policy. An existing bucket policy is inspected at startup but never
//! modified, since the bucket may be shared with other tooling.
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::content_store::{content_key, ContentStore, StoredContent};
use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    prefix: String,
    /// Access key for AWS Signature v4 signing
    access_key: String,
    /// Secret key for AWS Signature v4 signing
    secret_key: String,
    /// Region name for AWS Signature v4 signing
    region_name: String,
    /// HTTP client for bucket policy operations
    http_client: Client,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration
    ///
    /// This will:
    /// 1. Create the bucket if it doesn't exist
    /// 2. Warn if the bucket policy grants anonymous access
    pub async fn new(config: MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let client = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            prefix: config.prefix,
            access_key: config.access_key,
            secret_key: config.secret_key,
            region_name: config.region,
            http_client,
        };

        client.ensure_bucket_exists().await?;
        client.ensure_private_bucket().await?;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}, prefix: {}",
            client.endpoint,
            client.bucket.name(),
            client.prefix
        );

        Ok(client)
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<()> {
        match self.create_bucket().await {
            Ok(_) => {
                info!("Bucket '{}' created successfully", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
                Ok(())
            }
        }
    }

    async fn create_bucket(&self) -> Result<()> {
        let bucket_config = BucketConfiguration::default();

        Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            bucket_config,
        )
        .await
        .map_err(|e| {
            AppError::Internal(format!(
                "Failed to create bucket '{}': {}",
                self.bucket.name(),
                e
            ))
        })?;

        Ok(())
    }

    /// Check the bucket policy for anonymous access. Read-only.
    async fn ensure_private_bucket(&self) -> Result<()> {
        let bucket_name = self.bucket.name();

        match self.fetch_bucket_policy(&bucket_name).await {
            Ok(None) => {
                info!("Bucket '{}' has no bucket policy", bucket_name);
            }
            Ok(Some(policy)) if grants_anonymous_access(&policy) => {
                warn!(
                    "Bucket '{}' grants anonymous access, so stored assets bypass the catalog. \
                    Review it with: mc anonymous get minio/{}",
                    bucket_name, bucket_name
                );
            }
            Ok(Some(_)) => {
                debug!("Bucket '{}' has a policy without anonymous grants", bucket_name);
            }
            Err(e) => {
                warn!("Could not read bucket policy for '{}': {}", bucket_name, e);
            }
        }

        Ok(())
    }

    /// Fetch the `?policy` document, signed with AWS Signature v4.
    ///
    /// Returns `None` when the bucket has no policy.
    async fn fetch_bucket_policy(&self, bucket_name: &str) -> Result<Option<String>> {
        let method = Method::GET;
        let body = "";
        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let endpoint_url = Url::parse(&self.endpoint)
            .map_err(|e| AppError::Internal(format!("Invalid endpoint URL: {}", e)))?;
        let host = endpoint_url
            .host_str()
            .ok_or_else(|| AppError::Internal("Endpoint URL has no host".to_string()))?;
        let host_header = match endpoint_url.port() {
            Some(p) => format!("{}:{}", host, p),
            None => host.to_string(),
        };

        let url = format!("{}/{}?policy", self.endpoint, bucket_name);
        let payload_hash = hex::encode(Sha256::digest(body.as_bytes()));

        let canonical_uri = format!("/{}", bucket_name);
        let canonical_querystring = "policy=";
        let canonical_headers = format!(
            "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
            host_header, payload_hash, amz_date
        );
        let signed_headers = "host;x-amz-content-sha256;x-amz-date";

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method.as_str(),
            canonical_uri,
            canonical_querystring,
            canonical_headers,
            signed_headers,
            payload_hash
        );

        let algorithm = "AWS4-HMAC-SHA256";
        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region_name);
        let canonical_request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            algorithm, amz_date, credential_scope, canonical_request_hash
        );

        let signature =
            signature_v4(&self.secret_key, &self.region_name, &date_stamp, &string_to_sign)?;

        let authorization_header = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            algorithm, self.access_key, credential_scope, signed_headers, signature
        );

        let response = self
            .http_client
            .request(method, &url)
            .header("Host", &host_header)
            .header("x-amz-date", &amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("Authorization", &authorization_header)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send policy request: {}", e)))?;

        if response.status().as_u16() == 404 {
            Ok(None)
        } else if response.status().is_success() {
            let policy = response
                .text()
                .await
                .map_err(|e| AppError::Internal(format!("Failed to read bucket policy: {}", e)))?;
            Ok(Some(policy))
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(AppError::Internal(format!(
                "Bucket policy request failed: {} - {}",
                status, body
            )))
        }
    }

    /// Get the bucket name
    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

/// Derive the Signature v4 signing key and sign `string_to_sign`
fn signature_v4(
    secret_key: &str,
    region: &str,
    date_stamp: &str,
    string_to_sign: &str,
) -> Result<String> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        date_stamp.as_bytes(),
    )?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, b"s3")?;
    let k_signing = hmac_sha256(&k_service, b"aws4_request")?;

    let signature = hmac_sha256(&k_signing, string_to_sign.as_bytes())?;
    Ok(hex::encode(signature))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Whether any `Allow` statement names the anonymous principal `*`
fn grants_anonymous_access(policy: &str) -> bool {
    let Ok(document) = serde_json::from_str::<serde_json::Value>(policy) else {
        return false;
    };

    let statements = match document.get("Statement") {
        Some(serde_json::Value::Array(items)) => items.clone(),
        Some(single) => vec![single.clone()],
        None => return false,
    };

    statements.iter().any(|statement| {
        let allows = statement.get("Effect").and_then(|e| e.as_str()) == Some("Allow");
        let principal = statement.get("Principal");
        allows && principal.is_some_and(names_everyone)
    })
}

fn names_everyone(principal: &serde_json::Value) -> bool {
    match principal {
        serde_json::Value::String(s) => s == "*",
        serde_json::Value::Array(items) => items.iter().any(names_everyone),
        serde_json::Value::Object(map) => map.values().any(names_everyone),
        _ => false,
    }
}

fn is_missing_object(error: &str) -> bool {
    error.contains("404") || error.contains("NoSuchKey")
}

#[async_trait]
impl ContentStore for MinIOClient {
    async fn put(&self, key_hint: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let key = content_key(&self.prefix, key_hint, Utc::now());

        let response = self
            .bucket
            .put_object_with_content_type(&key, &bytes, content_type)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to upload file '{}': {}", key, e)))?;

        if response.status_code() >= 300 {
            return Err(AppError::Internal(format!(
                "Failed to upload file '{}': status {}",
                key,
                response.status_code()
            )));
        }

        debug!("Uploaded file '{}' to bucket '{}'", key, self.bucket.name());
        Ok(key)
    }

    async fn get(&self, content_ref: &str) -> Result<Option<StoredContent>> {
        let response = match self.bucket.get_object(content_ref).await {
            Ok(response) => response,
            Err(e) if is_missing_object(&e.to_string()) => return Ok(None),
            Err(e) => {
                return Err(AppError::Internal(format!(
                    "Failed to download file '{}': {}",
                    content_ref, e
                )))
            }
        };

        match response.status_code() {
            200..=299 => {
                debug!(
                    "Downloaded file '{}' from bucket '{}'",
                    content_ref,
                    self.bucket.name()
                );
                Ok(Some(StoredContent::new(response.to_vec())))
            }
            404 => Ok(None),
            status => Err(AppError::Internal(format!(
                "Failed to download file '{}': status {}",
                content_ref, status
            ))),
        }
    }

    async fn exists(&self, content_ref: &str) -> Result<bool> {
        match self.bucket.head_object(content_ref).await {
            Ok((_, status)) => Ok((200..300).contains(&status)),
            Err(e) => {
                if is_missing_object(&e.to_string()) {
                    Ok(false)
                } else {
                    Err(AppError::Internal(format!(
                        "Failed to check if file '{}' exists: {}",
                        content_ref, e
                    )))
                }
            }
        }
    }
}
