//! Update checking against a package's declared update location.
//!
//! Runs entirely off the resolution path: network failures, stale
//! descriptors, and cancellations never affect an already-resolved load
//! order. [`check_update`] is total; every failure mode becomes a
//! [`UpdateStatus::CheckFailed`] the caller can display and retry on its
//! own schedule.

use std::path::{Path, PathBuf};

use modpak_schema::{ModId, PackageMetadata, Sha256Digest, UpdateDescriptor};
use reqwest::Client;
use semver::Version;
use tracing::{debug, warn};

/// Outcome of one update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Installed version matches the newest published release.
    UpToDate,

    /// A newer compatible release exists.
    UpdateAvailable {
        /// The remote version.
        version: Version,
        /// Where to download it from.
        reference: String,
    },

    /// The author has deprecated this mod.
    Deprecated {
        /// Why, if stated.
        reason: Option<String>,
        /// Suggested replacement, if any.
        alternative: Option<ModId>,
    },

    /// The check could not complete. Recoverable; retried on the
    /// checker's own schedule, never escalated to resolution.
    CheckFailed {
        /// What went wrong.
        cause: CheckError,
    },
}

/// Why an update check failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// The package declares no update location.
    #[error("no update location declared")]
    NoUpdateLocation,

    /// The fetch itself failed (connection, DNS, non-2xx status).
    #[error("network error: {0}")]
    Network(String),

    /// The remote descriptor could not be decoded.
    #[error("malformed descriptor: {0}")]
    MalformedDescriptor(String),

    /// The remote version is older than the installed one. Reported,
    /// never auto-downgraded.
    #[error("remote version {remote} is older than installed {installed}")]
    RemoteOlder {
        /// Version the descriptor advertises.
        remote: Version,
        /// Version currently installed.
        installed: Version,
    },
}

/// Error downloading or verifying a replacement package.
#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    /// The fetch failed.
    #[error("network error: {0}")]
    Network(String),

    /// Downloaded bytes do not match the descriptor's declared hash.
    /// The download is discarded; nothing on disk is touched.
    #[error("content hash mismatch: descriptor declares {expected}, payload is {actual}")]
    HashMismatch {
        /// Digest the descriptor declares.
        expected: Sha256Digest,
        /// Digest of the bytes actually downloaded.
        actual: Sha256Digest,
    },

    /// Filesystem failure while persisting the verified download.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetch the remote descriptor and compare versions.
///
/// Version comparison uses the same ordering as constraint evaluation:
/// numeric fields, pre-release below release. Total: never panics or
/// returns `Err`.
pub async fn check_update(client: &Client, meta: &PackageMetadata) -> UpdateStatus {
    let Some(url) = meta.update_url.as_deref() else {
        return UpdateStatus::CheckFailed {
            cause: CheckError::NoUpdateLocation,
        };
    };

    let descriptor = match fetch_descriptor(client, url).await {
        Ok(d) => d,
        Err(cause) => {
            warn!(mod_id = %meta.mod_id, %url, %cause, "update check failed");
            return UpdateStatus::CheckFailed { cause };
        }
    };

    if descriptor.is_deprecated {
        return UpdateStatus::Deprecated {
            reason: descriptor.deprecation_reason,
            alternative: descriptor.alternative_mod_id,
        };
    }

    match descriptor.current_version.cmp(&meta.version) {
        std::cmp::Ordering::Greater => {
            debug!(
                mod_id = %meta.mod_id,
                installed = %meta.version,
                remote = %descriptor.current_version,
                "update available"
            );
            UpdateStatus::UpdateAvailable {
                version: descriptor.current_version,
                reference: descriptor.download_reference,
            }
        }
        std::cmp::Ordering::Equal => UpdateStatus::UpToDate,
        std::cmp::Ordering::Less => UpdateStatus::CheckFailed {
            cause: CheckError::RemoteOlder {
                remote: descriptor.current_version,
                installed: meta.version.clone(),
            },
        },
    }
}

async fn fetch_descriptor(client: &Client, url: &str) -> Result<UpdateDescriptor, CheckError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await
        .map_err(|e| CheckError::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(CheckError::Network(format!("HTTP {}", response.status())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CheckError::Network(e.to_string()))?;

    UpdateDescriptor::from_slice(&bytes).map_err(|e| CheckError::MalformedDescriptor(e.to_string()))
}

/// Download the release a descriptor points at and persist it into
/// `dest_dir` only after its SHA256 matches the declared content hash.
///
/// The download lands in a temporary file first; on any failure the
/// temporary is discarded and whatever package is already installed is
/// left byte-for-byte untouched.
///
/// # Errors
///
/// [`DownloadError::Network`] for fetch failures,
/// [`DownloadError::HashMismatch`] when the payload does not match the
/// descriptor, [`DownloadError::Io`] for filesystem failures.
pub async fn download_verified(
    client: &Client,
    descriptor: &UpdateDescriptor,
    dest_dir: &Path,
) -> Result<PathBuf, DownloadError> {
    let response = client
        .get(&descriptor.download_reference)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await
        .map_err(|e| DownloadError::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(DownloadError::Network(format!(
            "HTTP {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DownloadError::Network(e.to_string()))?;

    let actual = Sha256Digest::compute(&bytes);
    if actual != descriptor.content_hash {
        return Err(DownloadError::HashMismatch {
            expected: descriptor.content_hash.clone(),
            actual,
        });
    }

    let filename = filename_from_reference(&descriptor.download_reference);
    let dest = dest_dir.join(filename);

    let mut tmp = tempfile::NamedTempFile::new_in(dest_dir)?;
    std::io::Write::write_all(&mut tmp, &bytes)?;
    tmp.persist(&dest).map_err(|e| DownloadError::Io(e.error))?;

    debug!(path = %dest.display(), bytes = bytes.len(), "verified download persisted");
    Ok(dest)
}

/// Extract the filename from a download reference, falling back to a
/// fixed name for opaque URLs.
fn filename_from_reference(reference: &str) -> &str {
    let tail = reference
        .split('/')
        .next_back()
        .unwrap_or("")
        .split('?')
        .next()
        .unwrap_or("");
    if tail.is_empty() { "download.mpk" } else { tail }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn meta_with_url(url: Option<&str>) -> PackageMetadata {
        let mut m = PackageMetadata::from_slice(
            br#"{"mod_id": "subject", "version": "1.2.0"}"#,
        )
        .unwrap();
        m.update_url = url.map(str::to_string);
        m
    }

    fn descriptor_body(version: &str, hash: &str, base: &str) -> String {
        format!(
            r#"{{
                "current_version": "{version}",
                "download_reference": "{base}/subject-{version}.mpk",
                "content_hash": "{hash}"
            }}"#
        )
    }

    #[tokio::test]
    async fn test_update_available() {
        let mut server = Server::new_async().await;
        let body = descriptor_body("2.0.0", &"ab".repeat(32), &server.url());
        let _m = server
            .mock("GET", "/subject.json")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let meta = meta_with_url(Some(&format!("{}/subject.json", server.url())));
        let status = check_update(&Client::new(), &meta).await;
        assert!(matches!(
            status,
            UpdateStatus::UpdateAvailable { version, .. } if version == Version::new(2, 0, 0)
        ));
    }

    #[tokio::test]
    async fn test_up_to_date() {
        let mut server = Server::new_async().await;
        let body = descriptor_body("1.2.0", &"ab".repeat(32), &server.url());
        let _m = server
            .mock("GET", "/subject.json")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let meta = meta_with_url(Some(&format!("{}/subject.json", server.url())));
        assert_eq!(
            check_update(&Client::new(), &meta).await,
            UpdateStatus::UpToDate
        );
    }

    #[tokio::test]
    async fn test_remote_older_is_check_failed() {
        let mut server = Server::new_async().await;
        let body = descriptor_body("1.0.0", &"ab".repeat(32), &server.url());
        let _m = server
            .mock("GET", "/subject.json")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let meta = meta_with_url(Some(&format!("{}/subject.json", server.url())));
        assert!(matches!(
            check_update(&Client::new(), &meta).await,
            UpdateStatus::CheckFailed {
                cause: CheckError::RemoteOlder { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_deprecated() {
        let mut server = Server::new_async().await;
        let body = format!(
            r#"{{
                "current_version": "2.0.0",
                "download_reference": "{}/x.mpk",
                "content_hash": "{}",
                "is_deprecated": true,
                "deprecation_reason": "superseded",
                "alternative_mod_id": "subject-next"
            }}"#,
            server.url(),
            "ab".repeat(32)
        );
        let _m = server
            .mock("GET", "/subject.json")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let meta = meta_with_url(Some(&format!("{}/subject.json", server.url())));
        let status = check_update(&Client::new(), &meta).await;
        let UpdateStatus::Deprecated {
            reason,
            alternative,
        } = status
        else {
            panic!("expected Deprecated, got {status:?}");
        };
        assert_eq!(reason.as_deref(), Some("superseded"));
        assert_eq!(alternative.unwrap(), "subject-next");
    }

    #[tokio::test]
    async fn test_malformed_descriptor() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/subject.json")
            .with_status(200)
            .with_body("definitely not json")
            .create_async()
            .await;

        let meta = meta_with_url(Some(&format!("{}/subject.json", server.url())));
        assert!(matches!(
            check_update(&Client::new(), &meta).await,
            UpdateStatus::CheckFailed {
                cause: CheckError::MalformedDescriptor(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_http_error_is_network_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/subject.json")
            .with_status(500)
            .create_async()
            .await;

        let meta = meta_with_url(Some(&format!("{}/subject.json", server.url())));
        assert!(matches!(
            check_update(&Client::new(), &meta).await,
            UpdateStatus::CheckFailed {
                cause: CheckError::Network(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_no_update_location() {
        let meta = meta_with_url(None);
        assert!(matches!(
            check_update(&Client::new(), &meta).await,
            UpdateStatus::CheckFailed {
                cause: CheckError::NoUpdateLocation
            }
        ));
    }

    #[tokio::test]
    async fn test_download_hash_mismatch_leaves_disk_untouched() {
        let mut server = Server::new_async().await;
        let payload = b"new release bytes";
        let _m = server
            .mock("GET", "/subject-2.0.0.mpk")
            .with_status(200)
            .with_body(payload.as_slice())
            .create_async()
            .await;

        // Descriptor declares a hash that does not match the payload.
        let descriptor = UpdateDescriptor::from_slice(
            descriptor_body("2.0.0", &"00".repeat(32), &server.url()).as_bytes(),
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("subject-1.2.0.mpk");
        std::fs::write(&existing, b"installed package").unwrap();

        let err = download_verified(&Client::new(), &descriptor, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::HashMismatch { .. }));

        // Installed package untouched, no stray download left behind.
        assert_eq!(std::fs::read(&existing).unwrap(), b"installed package");
        assert!(!dir.path().join("subject-2.0.0.mpk").exists());
    }

    #[tokio::test]
    async fn test_download_verified_persists_on_match() {
        let mut server = Server::new_async().await;
        let payload = b"new release bytes";
        let hash = Sha256Digest::compute(payload);
        let _m = server
            .mock("GET", "/subject-2.0.0.mpk")
            .with_status(200)
            .with_body(payload.as_slice())
            .create_async()
            .await;

        let descriptor = UpdateDescriptor::from_slice(
            descriptor_body("2.0.0", hash.as_str(), &server.url()).as_bytes(),
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = download_verified(&Client::new(), &descriptor, dir.path())
            .await
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), payload);
    }

    #[test]
    fn test_filename_from_reference() {
        assert_eq!(
            filename_from_reference("https://cdn.example.com/a/b/mod-1.0.0.mpk"),
            "mod-1.0.0.mpk"
        );
        assert_eq!(
            filename_from_reference("https://cdn.example.com/dl?id=7"),
            "dl"
        );
        assert_eq!(filename_from_reference("https://cdn.example.com/"), "download.mpk");
    }
}
