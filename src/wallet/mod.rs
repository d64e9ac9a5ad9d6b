//! Wallet keypair loading
//!
//! Two sources, checked in order:
//! 1. `PRIVATE_KEY` env var holding a base58-encoded secret key
//! 2. `KEYPAIR_PATH` env var pointing at a JSON byte-array keypair file
//!
//! Keypair files with group or world access are rejected outright.

use solana_sdk::signature::Keypair;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{Error, Result};

/// Load the signing keypair from the environment
pub fn load_keypair() -> Result<Keypair> {
    if let Ok(encoded) = std::env::var("PRIVATE_KEY") {
        let bytes = bs58::decode(encoded.trim())
            .into_vec()
            .map_err(|_| Error::InvalidKeypair("PRIVATE_KEY is not valid base58".into()))?;
        let keypair = Keypair::from_bytes(&bytes)
            .map_err(|e| Error::InvalidKeypair(format!("PRIVATE_KEY rejected: {e}")))?;
        info!("loaded keypair from PRIVATE_KEY");
        return Ok(keypair);
    }

    let path = std::env::var("KEYPAIR_PATH").map_err(|_| {
        Error::InvalidKeypair("set PRIVATE_KEY or KEYPAIR_PATH to locate the wallet".into())
    })?;
    load_keypair_file(Path::new(&path))
}

/// Load a keypair from a JSON byte-array file, refusing lax permissions
pub fn load_keypair_file(path: &Path) -> Result<Keypair> {
    check_permissions(path)?;

    let contents = fs::read_to_string(path)?;
    let bytes: Vec<u8> = serde_json::from_str(&contents)?;
    let keypair = Keypair::from_bytes(&bytes)
        .map_err(|e| Error::InvalidKeypair(format!("{}: {e}", path.display())))?;

    info!(path = %path.display(), "loaded keypair from file");
    Ok(keypair)
}

#[cfg(unix)]
fn check_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)?.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(Error::InsecureKeypair(format!(
            "{} is readable by other users (mode {:o}), run: chmod 600 {}",
            path.display(),
            mode & 0o777,
            path.display()
        )));
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signer::Signer;
    use std::io::Write;

    fn write_keypair_file(keypair: &Keypair, mode: u32) -> tempfile::NamedTempFile {
        use std::os::unix::fs::PermissionsExt;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        let bytes: Vec<u8> = keypair.to_bytes().to_vec();
        write!(file, "{}", serde_json::to_string(&bytes).unwrap()).unwrap();
        fs::set_permissions(file.path(), fs::Permissions::from_mode(mode)).unwrap();
        file
    }

    #[test]
    fn test_load_keypair_file_round_trip() {
        let keypair = Keypair::new();
        let file = write_keypair_file(&keypair, 0o600);

        let loaded = load_keypair_file(file.path()).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_rejects_world_readable_file() {
        let keypair = Keypair::new();
        let file = write_keypair_file(&keypair, 0o644);

        let err = load_keypair_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::InsecureKeypair(_)));
    }

    #[test]
    fn test_rejects_garbage_contents() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o600)).unwrap();

        let err = load_keypair_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
