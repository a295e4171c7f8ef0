use crate::chain::Address;
use chrono::Utc;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    fs,
    path::{
        Path,
        PathBuf,
    },
};

pub const DEPLOYMENTS_ROOT: &str = ".deployments";
const DEPLOYMENTS_FILE: &str = "deployments.json";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeploymentEnv {
    Dev,
    Test,
    Local,
}

impl DeploymentEnv {
    pub fn dir_name(self) -> &'static str {
        match self {
            DeploymentEnv::Dev => "dev",
            DeploymentEnv::Test => "test",
            DeploymentEnv::Local => "local",
        }
    }
}

impl fmt::Display for DeploymentEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentEnv::Dev => "Devnet",
            DeploymentEnv::Test => "Testnet",
            DeploymentEnv::Local => "Local",
        };
        write!(f, "{name}")
    }
}

/// One deployed roster: where the gateway lives and which dragon
/// contracts the client should watch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub recorded_at: String,
    pub gateway_url: String,
    pub dragons: Vec<Address>,
}

#[derive(Debug)]
pub struct DeploymentStore {
    path: PathBuf,
}

impl DeploymentStore {
    pub fn new(env: DeploymentEnv) -> Result<Self> {
        let path = ensure_store(env)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<DeploymentRecord>> {
        read_record(&self.path)
    }

    pub fn save(&self, record: &DeploymentRecord) -> Result<()> {
        write_record(&self.path, record)
    }
}

pub fn ensure_structure() -> Result<()> {
    for env in [
        DeploymentEnv::Dev,
        DeploymentEnv::Test,
        DeploymentEnv::Local,
    ] {
        let _ = ensure_store(env)?;
    }
    Ok(())
}

pub fn record_deployment(
    env: DeploymentEnv,
    gateway_url: impl AsRef<str>,
    dragons: Vec<Address>,
) -> Result<()> {
    let store = DeploymentStore::new(env)?;
    let record = DeploymentRecord {
        recorded_at: Utc::now().to_rfc3339(),
        gateway_url: gateway_url.as_ref().to_string(),
        dragons,
    };
    store.save(&record)
}

fn ensure_store(env: DeploymentEnv) -> Result<PathBuf> {
    let env_dir = Path::new(DEPLOYMENTS_ROOT).join(env.dir_name());
    if !env_dir.exists() {
        fs::create_dir_all(&env_dir).wrap_err_with(|| {
            format!("Failed to create .deployments/{} directory", env.dir_name())
        })?;
    }
    Ok(env_dir.join(DEPLOYMENTS_FILE))
}

fn read_record(path: impl AsRef<Path>) -> Result<Option<DeploymentRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(path).wrap_err("Failed to read deployment record")?;
    if data.is_empty() || data.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let record = serde_json::from_slice(&data)
        .map_err(|_| eyre!("Failed to parse deployment record JSON"))?;
    Ok(Some(record))
}

fn write_record(path: impl AsRef<Path>, record: &DeploymentRecord) -> Result<()> {
    let json = serde_json::to_vec_pretty(record)
        .wrap_err("Failed to serialize deployment record")?;
    fs::write(path.as_ref(), json).wrap_err("Failed to write deployment record")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record__round_trips_through_disk() {
        // given
        let dir = std::env::temp_dir().join("dragonkeep-deployment-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(DEPLOYMENTS_FILE);
        let record = DeploymentRecord {
            recorded_at: Utc::now().to_rfc3339(),
            gateway_url: String::from("http://localhost:4100"),
            dragons: vec![Address::new([1u8; 32]), Address::new([2u8; 32])],
        };

        // when
        write_record(&path, &record).unwrap();
        let loaded = read_record(&path).unwrap().unwrap();

        // then
        assert_eq!(loaded.gateway_url, record.gateway_url);
        assert_eq!(loaded.dragons, record.dragons);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn read_record__missing_file__is_none() {
        let missing = std::env::temp_dir().join("dragonkeep-no-such-record.json");
        assert!(read_record(&missing).unwrap().is_none());
    }
}
