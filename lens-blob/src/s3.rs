use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::{primitives::ByteStream as AwsByteStream, Client};

use lens_core::StorageKey;

use crate::store::expiry_from_now;
use crate::types::collect_stream;
use crate::{BlobError, BlobResult, ByteStream, GetResult, ObjectStore, PutAck, SignedUrl};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone, Default)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, RustFS, R2). Enables path-style addressing.
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// S3-compatible store using the AWS SDK.
///
/// Read URLs are SigV4 presigned GETs, so they work without credentials
/// until they expire.
#[derive(Clone, Debug)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub async fn connect(settings: S3Settings) -> BlobResult<Self> {
        if settings.bucket.trim().is_empty() {
            return Err(BlobError::invalid("storage.s3.bucket is required"));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(settings.region.clone()));
        if let (Some(access_key_id), Some(secret_access_key)) = (settings.access_key_id, settings.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "lens",
            ));
        }
        if let Some(endpoint_url) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let aws_config = loader.load().await;

        let client = Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(settings.endpoint_url.is_some())
                .build(),
        );

        Ok(Self::from_client(client, settings.bucket))
    }

    pub fn from_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    fn map_sdk_error<E, R>(key: &StorageKey, err: SdkError<E, R>) -> BlobError
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug + Send + Sync + 'static,
    {
        match err.code() {
            Some("NoSuchKey") | Some("NotFound") => BlobError::not_found(key.as_str()),
            Some("QuotaExceeded") | Some("EntityTooLarge") | Some("InsufficientStorage") => {
                BlobError::quota_exceeded(key.as_str())
            }
            code => BlobError::backend(
                format!("s3 request for {key} failed ({})", code.unwrap_or("no error code")),
                err,
            ),
        }
    }

    async fn exists(&self, key: &StorageKey) -> BlobResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(Self::map_sdk_error(key, err)),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &StorageKey, stream: ByteStream, content_type: &str) -> BlobResult<PutAck> {
        let data = collect_stream(stream).await?;
        let size_bytes = data.len() as u64;

        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .content_type(content_type)
            .body(AwsByteStream::from(data))
            .send()
            .await
            .map_err(|e| Self::map_sdk_error(key, e))?;

        tracing::debug!(key = %key, size_bytes, bucket = %self.bucket, "wrote object to s3");
        Ok(PutAck {
            key: key.clone(),
            size_bytes,
            etag: result.e_tag,
        })
    }

    async fn get(&self, key: &StorageKey) -> BlobResult<GetResult> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    BlobError::not_found(key.as_str())
                } else {
                    Self::map_sdk_error(key, err)
                }
            })?;

        let size_bytes = result.content_length.and_then(|len| u64::try_from(len).ok());
        let content_type = result.content_type;
        let stream = futures::stream::try_unfold(result.body, |mut body| async move {
            let chunk = body.try_next().await.map_err(std::io::Error::other)?;
            Ok::<_, std::io::Error>(chunk.map(|chunk| (chunk, body)))
        });

        Ok(GetResult {
            stream: Box::pin(stream),
            content_type,
            size_bytes,
        })
    }

    async fn signed_read_url(&self, key: &StorageKey, ttl: Duration) -> BlobResult<SignedUrl> {
        if !self.exists(key).await? {
            return Err(BlobError::not_found(key.as_str()));
        }

        let presign = PresigningConfig::expires_in(ttl)
            .map_err(|e| BlobError::invalid(format!("invalid signed url ttl: {e}")))?;
        let expires_at = expiry_from_now(ttl);
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .presigned(presign)
            .await
            .map_err(|e| Self::map_sdk_error(key, e))?;

        Ok(SignedUrl {
            url: request.uri().to_string(),
            expires_at,
        })
    }

    async fn delete(&self, key: &StorageKey) -> BlobResult<bool> {
        if !self.exists(key).await? {
            return Ok(false);
        }
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|e| Self::map_sdk_error(key, e))?;
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "s3"
    }
}
