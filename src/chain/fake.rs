use crate::chain::{
    Address,
    DragonContract,
    GameChain,
    PendingTx,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use rand::Rng;
use sha2::{
    Digest,
    Sha256,
};
use std::sync::{
    Arc,
    Mutex,
};

/// Initial state for one fake dragon.
#[derive(Clone, Debug)]
pub struct DragonSpec {
    pub address: Address,
    pub name: String,
    pub health: u64,
    pub max_health: u64,
    pub attack_cooldown: u64,
    pub health_regeneration: u64,
    pub damage: u64,
    pub trust: u64,
    pub can_attack: bool,
    pub hunger: u64,
    pub sleepiness: u64,
    pub uncleanliness: u64,
    pub boredom: u64,
}

impl Default for DragonSpec {
    fn default() -> Self {
        DragonSpec {
            address: seed_address("dragonkeep-fake-default"),
            name: String::from("Dragon"),
            health: 80,
            max_health: 100,
            attack_cooldown: 60,
            health_regeneration: 10,
            damage: 12,
            trust: 0,
            can_attack: true,
            hunger: 0,
            sleepiness: 0,
            uncleanliness: 0,
            boredom: 0,
        }
    }
}

#[derive(Debug)]
struct DragonState {
    name: String,
    health: u64,
    max_health: u64,
    attack_cooldown: u64,
    health_regeneration: u64,
    damage: u64,
    trust: u64,
    can_attack: bool,
    hunger: u64,
    sleepiness: u64,
    uncleanliness: u64,
    boredom: u64,
}

#[derive(Debug, Default)]
struct Shared {
    calls: Vec<String>,
    fail_reads: bool,
    fail_writes: bool,
    reads_served: u64,
    handle_fetches: u64,
    tx_counter: u64,
}

/// In-process stand-in for the chain: serves the demo mode and the
/// unit tests. Writes apply a toy mutation so a follow-up refresh has
/// something new to observe. Clones share the same roster and log.
#[derive(Clone)]
pub struct FakeChain {
    dragons: Arc<Mutex<Vec<FakeDragon>>>,
    shared: Arc<Mutex<Shared>>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self {
            dragons: Arc::new(Mutex::new(Vec::new())),
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    pub fn with_dragons(specs: Vec<DragonSpec>) -> Self {
        let chain = Self::new();
        for spec in specs {
            chain.push_dragon(spec);
        }
        chain
    }

    /// Three dragons with staggered trust so every gate in the action
    /// catalogue can be seen both open and closed.
    pub fn demo() -> Self {
        let mut rng = rand::rng();
        let epithets = ["Ashen", "Gilded", "Sleepless", "Verdant", "Umbral"];
        let mut specs = Vec::new();
        for (i, trust) in [12u64, 4, 0].into_iter().enumerate() {
            let epithet = epithets[rng.random_range(0..epithets.len())];
            specs.push(DragonSpec {
                address: seed_address(&format!("dragonkeep-demo-{i}")),
                name: format!("{} the {}", fakeit::name::first(), epithet),
                health: rng.random_range(40..=90),
                max_health: 100,
                attack_cooldown: rng.random_range(0..=120),
                health_regeneration: 10,
                damage: rng.random_range(5..=25),
                trust,
                can_attack: i != 2,
                hunger: rng.random_range(0..=9),
                sleepiness: rng.random_range(0..=9),
                uncleanliness: rng.random_range(0..=9),
                boredom: rng.random_range(0..=9),
            });
        }
        Self::with_dragons(specs)
    }

    pub fn demo_player() -> Address {
        seed_address("dragonkeep-demo-player")
    }

    pub fn push_dragon(&self, spec: DragonSpec) -> Address {
        let address = spec.address;
        let dragon = FakeDragon {
            address,
            state: Arc::new(Mutex::new(DragonState {
                name: spec.name,
                health: spec.health,
                max_health: spec.max_health,
                attack_cooldown: spec.attack_cooldown,
                health_regeneration: spec.health_regeneration,
                damage: spec.damage,
                trust: spec.trust,
                can_attack: spec.can_attack,
                hunger: spec.hunger,
                sleepiness: spec.sleepiness,
                uncleanliness: spec.uncleanliness,
                boredom: spec.boredom,
            })),
            shared: self.shared.clone(),
        };
        self.dragons.lock().unwrap().push(dragon);
        address
    }

    pub fn remove_dragon(&self, address: &Address) {
        self.dragons
            .lock()
            .unwrap()
            .retain(|dragon| dragon.address != *address);
    }

    pub fn calls(&self) -> Vec<String> {
        self.shared.lock().unwrap().calls.clone()
    }

    pub fn set_fail_reads(&self, on: bool) {
        self.shared.lock().unwrap().fail_reads = on;
    }

    pub fn set_fail_writes(&self, on: bool) {
        self.shared.lock().unwrap().fail_writes = on;
    }

    pub fn reads_served(&self) -> u64 {
        self.shared.lock().unwrap().reads_served
    }

    pub fn handle_fetches(&self) -> u64 {
        self.shared.lock().unwrap().handle_fetches
    }
}

impl Default for FakeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl GameChain for FakeChain {
    type Dragon = FakeDragon;

    async fn dragons(&self) -> Result<Vec<FakeDragon>> {
        self.shared.lock().unwrap().handle_fetches += 1;
        Ok(self.dragons.lock().unwrap().clone())
    }
}

#[derive(Clone)]
pub struct FakeDragon {
    address: Address,
    state: Arc<Mutex<DragonState>>,
    shared: Arc<Mutex<Shared>>,
}

impl FakeDragon {
    fn read<T>(&self, f: impl FnOnce(&DragonState) -> T) -> Result<T> {
        {
            let mut shared = self.shared.lock().unwrap();
            if shared.fail_reads {
                return Err(eyre!("injected read failure"));
            }
            shared.reads_served += 1;
        }
        let state = self.state.lock().unwrap();
        Ok(f(&state))
    }

    fn write(
        &self,
        call: String,
        f: impl FnOnce(&mut DragonState) -> Result<()>,
    ) -> Result<PendingTx> {
        let id = {
            let mut shared = self.shared.lock().unwrap();
            if shared.fail_writes {
                return Err(eyre!("injected write failure"));
            }
            shared.calls.push(call);
            shared.tx_counter += 1;
            format!("0x{:064x}", shared.tx_counter)
        };
        let mut state = self.state.lock().unwrap();
        f(&mut state)?;
        Ok(PendingTx { id })
    }
}

impl DragonContract for FakeDragon {
    fn address(&self) -> Address {
        self.address
    }

    async fn name(&self) -> Result<String> {
        self.read(|s| s.name.clone())
    }

    async fn health(&self) -> Result<u64> {
        self.read(|s| s.health)
    }

    async fn max_health(&self) -> Result<u64> {
        self.read(|s| s.max_health)
    }

    async fn attack_cooldown(&self) -> Result<u64> {
        self.read(|s| s.attack_cooldown)
    }

    async fn health_regeneration(&self) -> Result<u64> {
        self.read(|s| s.health_regeneration)
    }

    async fn damage(&self) -> Result<u64> {
        self.read(|s| s.damage)
    }

    async fn trust(&self, _player: &Address) -> Result<u64> {
        self.read(|s| s.trust)
    }

    async fn can_attack(&self) -> Result<bool> {
        self.read(|s| s.can_attack)
    }

    async fn hunger(&self) -> Result<u64> {
        self.read(|s| s.hunger)
    }

    async fn sleepiness(&self) -> Result<u64> {
        self.read(|s| s.sleepiness)
    }

    async fn uncleanliness(&self) -> Result<u64> {
        self.read(|s| s.uncleanliness)
    }

    async fn boredom(&self) -> Result<u64> {
        self.read(|s| s.boredom)
    }

    async fn attack(&self, _from: &Address, target: &str) -> Result<PendingTx> {
        let target: Address = target.parse()?;
        self.write(format!("{} attack {}", self.address, target), |s| {
            if !s.can_attack {
                return Err(eyre!("attack is cooling down"));
            }
            s.can_attack = false;
            Ok(())
        })
    }

    async fn feed(&self, _from: &Address) -> Result<PendingTx> {
        self.write(format!("{} feed", self.address), |s| {
            s.hunger = 0;
            Ok(())
        })
    }

    async fn sleep(&self, _from: &Address) -> Result<PendingTx> {
        self.write(format!("{} sleep", self.address), |s| {
            s.sleepiness = 0;
            Ok(())
        })
    }

    async fn clean(&self, _from: &Address) -> Result<PendingTx> {
        self.write(format!("{} clean", self.address), |s| {
            s.uncleanliness = 0;
            Ok(())
        })
    }

    async fn play(&self, _from: &Address) -> Result<PendingTx> {
        self.write(format!("{} play", self.address), |s| {
            s.boredom = 0;
            s.trust = s.trust.saturating_add(1);
            Ok(())
        })
    }

    async fn heal(&self, _from: &Address) -> Result<PendingTx> {
        self.write(format!("{} heal", self.address), |s| {
            s.health = s.max_health.min(s.health.saturating_add(s.health_regeneration));
            Ok(())
        })
    }

    async fn breed(
        &self,
        _from: &Address,
        partner: &str,
        hatchling: &str,
    ) -> Result<PendingTx> {
        let partner: Address = partner.parse()?;
        self.write(
            format!("{} breed {} {}", self.address, partner, hatchling),
            |s| {
                if s.trust < 10 {
                    return Err(eyre!("the dragon does not trust you enough"));
                }
                Ok(())
            },
        )
    }

    async fn propose_breed(&self, _from: &Address, partner: &str) -> Result<PendingTx> {
        let partner: Address = partner.parse()?;
        self.write(
            format!("{} proposeBreed {}", self.address, partner),
            |s| {
                if s.trust < 10 {
                    return Err(eyre!("the dragon does not trust you enough"));
                }
                Ok(())
            },
        )
    }
}

fn seed_address(seed: &str) -> Address {
    Address::new(Sha256::digest(seed.as_bytes()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo__builds_three_named_dragons() {
        // given / when
        let chain = FakeChain::demo();

        // then
        let dragons = chain.dragons.lock().unwrap();
        assert_eq!(dragons.len(), 3);
        for dragon in dragons.iter() {
            assert!(!dragon.state.lock().unwrap().name.is_empty());
        }
    }

    #[tokio::test]
    async fn feed__resets_hunger_and_logs_the_call() {
        // given
        let chain = FakeChain::with_dragons(vec![DragonSpec {
            hunger: 9,
            ..DragonSpec::default()
        }]);
        let dragon = chain.dragons().await.unwrap().remove(0);

        // when
        dragon.feed(&FakeChain::demo_player()).await.unwrap();

        // then
        assert_eq!(dragon.hunger().await.unwrap(), 0);
        assert_eq!(chain.calls().len(), 1);
        assert!(chain.calls()[0].contains("feed"));
    }
}
