use crate::chain::{
    Address,
    DragonContract,
    GameChain,
    PendingTx,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use serde::{
    Deserialize,
    Serialize,
};

/// HTTP collaborator for the dragon chain's JSON gateway. Reads go
/// through `POST /call`, writes through `POST /submit`. Numeric values
/// ride the wire as decimal strings so the gateway never has to fit
/// chain integers into JSON numbers.
#[derive(Clone)]
pub struct GatewayClient {
    base_url: String,
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .build()
            .wrap_err("failed to build HTTP client for gateway")?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(
        &self,
        contract: &Address,
        method: &str,
        args: &[String],
    ) -> Result<ValueDto> {
        let url = format!("{}/call", self.base_url);
        let request = CallRequestDto {
            contract: *contract,
            method,
            args,
        };
        let res = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .wrap_err("gateway request failed")?;
        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .wrap_err("failed to read gateway response body")?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(eyre!(
                "gateway responded with {status} when calling {method}: {body}"
            ));
        }
        let dto: CallResponseDto =
            serde_json::from_slice(&bytes).wrap_err("invalid gateway call payload")?;
        Ok(dto.value)
    }

    async fn submit(
        &self,
        from: &Address,
        contract: &Address,
        method: &str,
        args: &[String],
    ) -> Result<PendingTx> {
        let url = format!("{}/submit", self.base_url);
        let request = SubmitRequestDto {
            from: *from,
            contract: *contract,
            method,
            args,
        };
        let res = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .wrap_err("gateway request failed")?;
        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .wrap_err("failed to read gateway response body")?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(eyre!(
                "gateway responded with {status} when submitting {method}: {body}"
            ));
        }
        let dto: SubmitResponseDto =
            serde_json::from_slice(&bytes).wrap_err("invalid gateway submit payload")?;
        Ok(PendingTx { id: dto.tx_id })
    }

    async fn read_u64(&self, contract: &Address, method: &str) -> Result<u64> {
        self.call(contract, method, &[]).await?.into_u64(method)
    }
}

#[derive(Serialize)]
struct CallRequestDto<'a> {
    contract: Address,
    method: &'a str,
    args: &'a [String],
}

#[derive(Serialize)]
struct SubmitRequestDto<'a> {
    from: Address,
    contract: Address,
    method: &'a str,
    args: &'a [String],
}

#[derive(Deserialize)]
struct CallResponseDto {
    value: ValueDto,
}

#[derive(Deserialize)]
struct SubmitResponseDto {
    tx_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValueDto {
    Bool(bool),
    Number(u64),
    Text(String),
}

impl ValueDto {
    fn into_u64(self, method: &str) -> Result<u64> {
        match self {
            ValueDto::Number(n) => Ok(n),
            ValueDto::Text(s) => s
                .parse()
                .map_err(|_| eyre!("gateway returned non-numeric {method}: {s}")),
            ValueDto::Bool(_) => Err(eyre!("gateway returned a bool for {method}")),
        }
    }

    fn into_bool(self, method: &str) -> Result<bool> {
        match self {
            ValueDto::Bool(b) => Ok(b),
            _ => Err(eyre!("gateway returned a non-bool for {method}")),
        }
    }

    fn into_text(self, method: &str) -> Result<String> {
        match self {
            ValueDto::Text(s) => Ok(s),
            _ => Err(eyre!("gateway returned a non-string for {method}")),
        }
    }
}

/// One dragon contract reached through the gateway.
#[derive(Clone)]
pub struct GatewayDragon {
    address: Address,
    client: GatewayClient,
}

impl DragonContract for GatewayDragon {
    fn address(&self) -> Address {
        self.address
    }

    async fn name(&self) -> Result<String> {
        self.client
            .call(&self.address, "name", &[])
            .await?
            .into_text("name")
    }

    async fn health(&self) -> Result<u64> {
        self.client.read_u64(&self.address, "health").await
    }

    async fn max_health(&self) -> Result<u64> {
        self.client.read_u64(&self.address, "maxHealth").await
    }

    async fn attack_cooldown(&self) -> Result<u64> {
        self.client.read_u64(&self.address, "attackCooldown").await
    }

    async fn health_regeneration(&self) -> Result<u64> {
        self.client
            .read_u64(&self.address, "healthRegeneration")
            .await
    }

    async fn damage(&self) -> Result<u64> {
        self.client.read_u64(&self.address, "damage").await
    }

    async fn trust(&self, player: &Address) -> Result<u64> {
        self.client
            .call(&self.address, "trust", &[player.to_string()])
            .await?
            .into_u64("trust")
    }

    async fn can_attack(&self) -> Result<bool> {
        self.client
            .call(&self.address, "canAttack", &[])
            .await?
            .into_bool("canAttack")
    }

    async fn hunger(&self) -> Result<u64> {
        self.client.read_u64(&self.address, "getHunger").await
    }

    async fn sleepiness(&self) -> Result<u64> {
        self.client.read_u64(&self.address, "getSleepiness").await
    }

    async fn uncleanliness(&self) -> Result<u64> {
        self.client.read_u64(&self.address, "getUncleanliness").await
    }

    async fn boredom(&self) -> Result<u64> {
        self.client.read_u64(&self.address, "getBoredom").await
    }

    async fn attack(&self, from: &Address, target: &str) -> Result<PendingTx> {
        self.client
            .submit(from, &self.address, "attack", &[target.to_string()])
            .await
    }

    async fn feed(&self, from: &Address) -> Result<PendingTx> {
        self.client.submit(from, &self.address, "feed", &[]).await
    }

    async fn sleep(&self, from: &Address) -> Result<PendingTx> {
        self.client.submit(from, &self.address, "sleep", &[]).await
    }

    async fn clean(&self, from: &Address) -> Result<PendingTx> {
        self.client.submit(from, &self.address, "clean", &[]).await
    }

    async fn play(&self, from: &Address) -> Result<PendingTx> {
        self.client.submit(from, &self.address, "play", &[]).await
    }

    async fn heal(&self, from: &Address) -> Result<PendingTx> {
        self.client.submit(from, &self.address, "heal", &[]).await
    }

    async fn breed(
        &self,
        from: &Address,
        partner: &str,
        hatchling: &str,
    ) -> Result<PendingTx> {
        self.client
            .submit(
                from,
                &self.address,
                "breed",
                &[partner.to_string(), hatchling.to_string()],
            )
            .await
    }

    async fn propose_breed(&self, from: &Address, partner: &str) -> Result<PendingTx> {
        self.client
            .submit(
                from,
                &self.address,
                "proposeBreed",
                &[partner.to_string()],
            )
            .await
    }
}

/// The configured dragon roster behind one gateway. Handles are cheap
/// to build, so `dragons` always hands out fresh ones; that is all a
/// session reset needs.
pub struct GatewayChain {
    client: GatewayClient,
    roster: Vec<Address>,
}

impl GatewayChain {
    pub fn new(client: GatewayClient, roster: Vec<Address>) -> Self {
        Self { client, roster }
    }
}

impl GameChain for GatewayChain {
    type Dragon = GatewayDragon;

    async fn dragons(&self) -> Result<Vec<GatewayDragon>> {
        Ok(self
            .roster
            .iter()
            .map(|address| GatewayDragon {
                address: *address,
                client: self.client.clone(),
            })
            .collect())
    }
}
