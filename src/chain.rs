use color_eyre::eyre::{
    Result,
    eyre,
};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
    de,
};
use std::{
    fmt,
    str::FromStr,
};

pub mod fake;
pub mod gateway;

/// 32-byte account/contract identity on the dragon chain.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Address([u8; 32]);

impl Address {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = color_eyre::eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|_| eyre!("invalid address: {s}"))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| eyre!("address must be 32 bytes: {s}"))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A write accepted by the chain but not yet final.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTx {
    pub id: String,
}

/// Contract-call collaborator for a single dragon. Reads return the
/// current on-chain value; writes carry the sender address and hand
/// back the pending transaction. User-entered parameters stay free
/// text all the way down; the chain is what rejects garbage.
pub trait DragonContract {
    fn address(&self) -> Address;

    fn name(&self) -> impl Future<Output = Result<String>>;
    fn health(&self) -> impl Future<Output = Result<u64>>;
    fn max_health(&self) -> impl Future<Output = Result<u64>>;
    fn attack_cooldown(&self) -> impl Future<Output = Result<u64>>;
    fn health_regeneration(&self) -> impl Future<Output = Result<u64>>;
    fn damage(&self) -> impl Future<Output = Result<u64>>;
    fn trust(&self, player: &Address) -> impl Future<Output = Result<u64>>;
    fn can_attack(&self) -> impl Future<Output = Result<bool>>;
    fn hunger(&self) -> impl Future<Output = Result<u64>>;
    fn sleepiness(&self) -> impl Future<Output = Result<u64>>;
    fn uncleanliness(&self) -> impl Future<Output = Result<u64>>;
    fn boredom(&self) -> impl Future<Output = Result<u64>>;

    fn attack(
        &self,
        from: &Address,
        target: &str,
    ) -> impl Future<Output = Result<PendingTx>>;
    fn feed(&self, from: &Address) -> impl Future<Output = Result<PendingTx>>;
    fn sleep(&self, from: &Address) -> impl Future<Output = Result<PendingTx>>;
    fn clean(&self, from: &Address) -> impl Future<Output = Result<PendingTx>>;
    fn play(&self, from: &Address) -> impl Future<Output = Result<PendingTx>>;
    fn heal(&self, from: &Address) -> impl Future<Output = Result<PendingTx>>;
    fn breed(
        &self,
        from: &Address,
        partner: &str,
        hatchling: &str,
    ) -> impl Future<Output = Result<PendingTx>>;
    fn propose_breed(
        &self,
        from: &Address,
        partner: &str,
    ) -> impl Future<Output = Result<PendingTx>>;
}

/// Factory for fresh contract handles. `dragons` is expected to hand
/// out new handles on every call; cached ones live in [`Session`].
pub trait GameChain {
    type Dragon: DragonContract;

    fn dragons(&self) -> impl Future<Output = Result<Vec<Self::Dragon>>>;
}

/// Account collaborator: the active address plus the cached contract
/// handles for the roster. `reset` throws the handles away and
/// rebuilds them from the chain.
pub struct Session<C: GameChain> {
    chain: C,
    address: Address,
    dragons: Vec<C::Dragon>,
}

impl<C: GameChain> Session<C> {
    pub async fn connect(chain: C, address: Address) -> Result<Self> {
        let dragons = chain.dragons().await?;
        Ok(Self {
            chain,
            address,
            dragons,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn dragons(&self) -> &[C::Dragon] {
        &self.dragons
    }

    pub async fn reset(&mut self) -> Result<()> {
        self.dragons = self.chain.dragons().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address__round_trips_through_display_and_parse() {
        // given
        let address = Address::new([7u8; 32]);

        // when
        let rendered = address.to_string();
        let parsed: Address = rendered.parse().unwrap();

        // then
        assert!(rendered.starts_with("0x"));
        assert_eq!(address, parsed);
    }

    #[test]
    fn address__rejects_wrong_length_input() {
        let err = "0xabcd".parse::<Address>();
        assert!(err.is_err());
    }
}
