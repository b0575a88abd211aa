//! Certificate store.
//!
//! Ensures a self-signed TLS bundle exists for a subject. An existing
//! pair of non-empty files is considered valid and is never touched;
//! otherwise both files are regenerated together as an atomic pair, so
//! no observable state has one file without the other.

use std::fs;
use std::path::{Path, PathBuf};

use rcgen::{CertificateParams, DnType, KeyPair};
use tracing::{debug, info};

use slipway_types::CertificateBundle;

use crate::error::{CertError, CertResult};

const CERT_FILE: &str = "cert.pem";
const KEY_FILE: &str = "key.pem";
const VALIDITY_DAYS: u32 = 365;

/// Provisions and reuses self-signed certificate bundles.
pub struct CertificateStore {
    cert_dir: PathBuf,
    validity_days: u32,
}

impl CertificateStore {
    /// Store rooted at `cert_dir` with the default 365-day validity.
    pub fn new(cert_dir: impl Into<PathBuf>) -> Self {
        Self {
            cert_dir: cert_dir.into(),
            validity_days: VALIDITY_DAYS,
        }
    }

    /// Path of the certificate file.
    pub fn cert_path(&self) -> PathBuf {
        self.cert_dir.join(CERT_FILE)
    }

    /// Path of the private key file.
    pub fn key_path(&self) -> PathBuf {
        self.cert_dir.join(KEY_FILE)
    }

    /// Ensure a bundle exists for `subject`, creating it if absent.
    ///
    /// Idempotent: if both files exist and are non-empty the existing
    /// bundle is returned byte-for-byte untouched.
    pub fn ensure(&self, subject: &str) -> CertResult<CertificateBundle> {
        let cert_path = self.cert_path();
        let key_path = self.key_path();

        if Self::non_empty(&cert_path) && Self::non_empty(&key_path) {
            debug!(cert = %cert_path.display(), "existing certificate bundle is valid");
            return Ok(self.bundle(subject, cert_path, key_path));
        }

        fs::create_dir_all(&self.cert_dir)
            .map_err(|e| CertError::from_io(&self.cert_dir, e))?;
        self.remove_transients()?;

        let (cert_pem, key_pem) = self.generate(subject)?;
        self.write_pair(&cert_path, &key_path, &cert_pem, &key_pem)?;

        info!(
            subject,
            cert = %cert_path.display(),
            "generated self-signed certificate bundle"
        );
        Ok(self.bundle(subject, cert_path, key_path))
    }

    fn bundle(&self, subject: &str, cert_path: PathBuf, key_path: PathBuf) -> CertificateBundle {
        CertificateBundle {
            cert_path,
            key_path,
            subject: subject.to_string(),
            validity_days: self.validity_days,
        }
    }

    fn non_empty(path: &Path) -> bool {
        fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
    }

    /// Generate a fresh key and self-signed certificate for `subject`.
    ///
    /// The SAN list always includes localhost and the loopback address so
    /// local probes resolve against the same bundle the proxy serves.
    fn generate(&self, subject: &str) -> CertResult<(String, String)> {
        let mut params = CertificateParams::new(Self::san_list(subject))
            .map_err(|e| CertError::ToolingUnavailable(e.to_string()))?;
        params
            .distinguished_name
            .push(DnType::CommonName, subject);
        params.not_before = time::OffsetDateTime::now_utc();
        params.not_after =
            params.not_before + time::Duration::days(i64::from(self.validity_days));

        let key_pair =
            KeyPair::generate().map_err(|e| CertError::ToolingUnavailable(e.to_string()))?;
        let cert = params
            .self_signed(&key_pair)
            .map_err(|e| CertError::ToolingUnavailable(e.to_string()))?;

        Ok((cert.pem(), key_pair.serialize_pem()))
    }

    /// SANs for `subject`, with the fixed local names appended unless
    /// the subject already is one of them.
    fn san_list(subject: &str) -> Vec<String> {
        let mut sans = vec![subject.to_string()];
        for name in ["localhost", "127.0.0.1"] {
            if subject != name {
                sans.push(name.to_string());
            }
        }
        sans
    }

    /// Write cert and key as an atomic pair: both land via temp+rename,
    /// and a failure part-way cleans up so neither temp file survives.
    fn write_pair(
        &self,
        cert_path: &Path,
        key_path: &Path,
        cert_pem: &str,
        key_pem: &str,
    ) -> CertResult<()> {
        let cert_tmp = cert_path.with_extension("pem.tmp");
        let key_tmp = key_path.with_extension("pem.tmp");

        let result = (|| -> CertResult<()> {
            fs::write(&cert_tmp, cert_pem).map_err(|e| CertError::from_io(&cert_tmp, e))?;
            fs::write(&key_tmp, key_pem).map_err(|e| CertError::from_io(&key_tmp, e))?;
            Self::restrict_key(&key_tmp)?;
            fs::rename(&cert_tmp, cert_path).map_err(|e| CertError::from_io(cert_path, e))?;
            fs::rename(&key_tmp, key_path).map_err(|e| CertError::from_io(key_path, e))?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&cert_tmp);
            let _ = fs::remove_file(&key_tmp);
        }
        result
    }

    #[cfg(unix)]
    fn restrict_key(path: &Path) -> CertResult<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|e| CertError::from_io(path, e))
    }

    #[cfg(not(unix))]
    fn restrict_key(_path: &Path) -> CertResult<()> {
        Ok(())
    }

    /// Drop transient artifacts from earlier interrupted runs (stale
    /// temp files, leftover signing requests from the old tooling).
    fn remove_transients(&self) -> CertResult<()> {
        for name in ["cert.pem.tmp", "key.pem.tmp", "server.csr"] {
            let path = self.cert_dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed transient artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(CertError::from_io(&path, e)),
            }
        }
        Ok(())
    }
}
