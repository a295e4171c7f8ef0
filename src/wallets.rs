use crate::chain::Address;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use eth_keystore::decrypt_key;
use rpassword::prompt_password;
use sha2::{
    Digest,
    Sha256,
};
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

#[derive(Clone, Debug)]
pub struct KeystoreEntry {
    pub name: String,
    pub path: PathBuf,
}

pub fn default_keystore_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".dragonkeep").join("wallets"))
}

pub fn resolve_keystore_dir(dir: Option<&str>) -> Result<PathBuf> {
    match dir {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => default_keystore_dir(),
    }
}

pub fn find_keystore(dir: &Path, name: &str) -> Result<KeystoreEntry> {
    if !dir.exists() {
        return Err(eyre!(
            "Keystore directory {} does not exist",
            dir.to_string_lossy()
        ));
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).wrap_err("Failed to read keystore directory")? {
        let path = entry.wrap_err("Failed to read keystore entry")?.path();
        if !path.is_file()
            || path.extension().and_then(|ext| ext.to_str()) != Some("wallet")
        {
            continue;
        }
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| eyre!("Invalid keystore filename {:?}", path))?
            .to_owned();
        entries.push(KeystoreEntry { name: stem, path });
    }
    entries
        .into_iter()
        .find(|entry| entry.name == name)
        .ok_or_else(|| {
            eyre!("Wallet '{name}' not found in {}", dir.to_string_lossy())
        })
}

/// Prompts for the password, decrypts the keystore, and derives the
/// account address from the key material.
pub fn unlock(entry: &KeystoreEntry) -> Result<Address> {
    let prompt = format!("Enter password for wallet '{}': ", entry.name);
    let password = prompt_password(prompt).wrap_err("Failed to read wallet password")?;

    let secret = decrypt_key(&entry.path, password.as_bytes())
        .map_err(|_| eyre!("Invalid password for wallet '{}'", entry.name))?;

    Ok(derive_address(&secret))
}

/// Account ids on the dragon chain are the sha256 of the key material.
pub fn derive_address(secret: &[u8]) -> Address {
    Address::new(Sha256::digest(secret).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_address__is_stable_for_the_same_secret() {
        let secret = [42u8; 32];
        assert_eq!(derive_address(&secret), derive_address(&secret));
        assert_ne!(derive_address(&secret), derive_address(&[43u8; 32]));
    }

    #[test]
    fn resolve_keystore_dir__expands_tilde() {
        let dir = resolve_keystore_dir(Some("~/wallets")).unwrap();
        assert!(dir.ends_with("wallets"));
        assert!(!dir.to_string_lossy().contains('~'));
    }
}
