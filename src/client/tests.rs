use super::*;
use crate::chain::fake::{
    DragonSpec,
    FakeChain,
};

fn player() -> Address {
    Address::new([0xAB; 32])
}

fn spec(name: &str, tag: u8) -> DragonSpec {
    DragonSpec {
        address: Address::new([tag; 32]),
        name: name.to_string(),
        ..DragonSpec::default()
    }
}

async fn controller_for(chain: &FakeChain) -> AppController<FakeChain> {
    let session = Session::connect(chain.clone(), player()).await.unwrap();
    AppController::new(session)
}

fn snapshot_with(trust: u64, can_attack: bool) -> DragonSnapshot {
    let mut snapshot = DragonSnapshot {
        address: Address::new([1u8; 32]),
        name: String::from("Probe"),
        health: 80,
        max_health: 100,
        attack_cooldown: 0,
        health_regeneration: 10,
        damage: 12,
        player_trust: trust,
        can_attack,
        hunger: 0,
        sleepiness: 0,
        uncleanliness: 0,
        boredom: 0,
        actions: Vec::new(),
    };
    snapshot.actions = available_actions(&snapshot);
    snapshot
}

#[tokio::test]
async fn refresh__loads_every_configured_dragon() {
    // given
    let chain =
        FakeChain::with_dragons(vec![spec("Ember", 1), spec("Sooty", 2)]);
    let mut controller = controller_for(&chain).await;

    // when
    controller.refresh().await;

    // then
    let game = controller.game();
    assert!(game.loaded);
    let names: Vec<_> = game.dragons.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Ember", "Sooty"]);
}

#[tokio::test]
async fn refresh__after_roster_shrinks__replaces_the_list() {
    // given
    let mut fed = spec("Ember", 1);
    fed.hunger = 9;
    let chain = FakeChain::with_dragons(vec![fed, spec("Sooty", 2)]);
    let sooty = Address::new([2u8; 32]);
    let mut controller = controller_for(&chain).await;
    controller.refresh().await;
    assert_eq!(controller.game().dragons.len(), 2);

    // when: the roster changes under us and an action forces the
    // reset-then-refresh cycle
    chain.remove_dragon(&sooty);
    controller.invoke(0, ActionKind::Feed, &[]).await;

    // then: the old entry is gone, not merged in
    let names: Vec<_> = controller
        .game()
        .dragons
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(names, vec!["Ember"]);
}

#[tokio::test]
async fn refresh__initial_read_failure__stays_unloaded() {
    // given
    let chain = FakeChain::with_dragons(vec![spec("Ember", 1)]);
    chain.set_fail_reads(true);
    let mut controller = controller_for(&chain).await;

    // when
    controller.refresh().await;

    // then
    assert!(!controller.game().loaded);
    assert!(controller.game().dragons.is_empty());
}

#[tokio::test]
async fn refresh__single_read_failure__keeps_previous_state() {
    // given
    let mut hungry = spec("Ember", 1);
    hungry.hunger = 9;
    let chain = FakeChain::with_dragons(vec![hungry]);
    let mut controller = controller_for(&chain).await;
    controller.refresh().await;
    assert_eq!(controller.game().dragons[0].hunger, 9);

    // when: the chain changes but every further read fails
    let dragon = chain.dragons().await.unwrap().remove(0);
    dragon.feed(&player()).await.unwrap();
    chain.set_fail_reads(true);
    controller.refresh().await;

    // then: the stale snapshot survives untouched
    let game = controller.game();
    assert!(game.loaded);
    assert_eq!(game.dragons[0].hunger, 9);
}

#[test]
fn available_actions__catalogue_is_presented_reversed() {
    // given / when
    let snapshot = snapshot_with(0, false);

    // then
    let kinds: Vec<_> = snapshot.actions.iter().map(|a| a.kind).collect();
    assert_eq!(kinds.first(), Some(&ActionKind::ProposeBreed));
    assert_eq!(kinds.last(), Some(&ActionKind::Attack));
    assert_eq!(kinds.len(), 8);
}

#[test]
fn available_actions__attack_needs_trust_and_readiness() {
    let find = |snapshot: &DragonSnapshot| {
        snapshot
            .actions
            .iter()
            .find(|a| a.kind == ActionKind::Attack)
            .unwrap()
            .disabled
    };
    assert!(find(&snapshot_with(3, true)));
    assert!(find(&snapshot_with(9, false)));
    assert!(!find(&snapshot_with(4, true)));
}

#[test]
fn available_actions__needs_enable_care_strictly_above_threshold() {
    let mut snapshot = snapshot_with(0, false);
    snapshot.hunger = NEEDS_THRESHOLD;
    snapshot.actions = available_actions(&snapshot);
    let feed = |s: &DragonSnapshot| {
        s.actions
            .iter()
            .find(|a| a.kind == ActionKind::Feed)
            .unwrap()
            .disabled
    };
    assert!(feed(&snapshot));

    snapshot.hunger = NEEDS_THRESHOLD + 1;
    snapshot.actions = available_actions(&snapshot);
    assert!(!feed(&snapshot));
}

#[test]
fn available_actions__heal_needs_missing_health_and_trust() {
    let heal = |health: u64, trust: u64| {
        let mut snapshot = snapshot_with(trust, false);
        snapshot.health = health;
        snapshot.actions = available_actions(&snapshot);
        snapshot
            .actions
            .iter()
            .find(|a| a.kind == ActionKind::Heal)
            .unwrap()
            .disabled
    };
    // regeneration is 10 against max health 100
    assert!(!heal(90, 1));
    assert!(heal(91, 1));
    assert!(heal(90, 0));
}

#[tokio::test]
async fn invoke__disabled_action__is_never_dispatched() {
    // given: zero trust, so Attack is disabled
    let chain = FakeChain::with_dragons(vec![spec("Ember", 1)]);
    let mut controller = controller_for(&chain).await;
    controller.refresh().await;

    // when
    controller
        .invoke(0, ActionKind::Attack, &[player().to_string()])
        .await;

    // then
    assert!(chain.calls().is_empty());
    assert!(controller.status().contains("not available"));
}

#[tokio::test]
async fn invoke__success__mutates_chain_and_refreshes() {
    // given
    let mut hungry = spec("Ember", 1);
    hungry.hunger = 9;
    let chain = FakeChain::with_dragons(vec![hungry]);
    let mut controller = controller_for(&chain).await;
    controller.refresh().await;

    // when
    controller.invoke(0, ActionKind::Feed, &[]).await;

    // then: the follow-up refresh already sees the write applied
    assert_eq!(controller.game().dragons[0].hunger, 0);
    assert_eq!(chain.calls().len(), 1);
    assert!(controller.status().starts_with("Feed sent"));
}

#[tokio::test]
async fn invoke__write_failure__still_resets_and_refreshes() {
    // given
    let mut hungry = spec("Ember", 1);
    hungry.hunger = 9;
    let chain = FakeChain::with_dragons(vec![hungry]);
    let mut controller = controller_for(&chain).await;
    controller.refresh().await;
    chain.set_fail_writes(true);
    let fetches_before = chain.handle_fetches();
    let reads_before = chain.reads_served();

    // when
    controller.invoke(0, ActionKind::Feed, &[]).await;

    // then
    assert!(chain.calls().is_empty());
    assert!(controller.status().contains("failed"));
    assert!(chain.handle_fetches() > fetches_before);
    assert!(chain.reads_served() > reads_before);
}

#[tokio::test]
async fn invoke__passes_free_text_args_in_call_order() {
    // given
    let mut trusted = spec("Ember", 1);
    trusted.trust = 10;
    let chain = FakeChain::with_dragons(vec![trusted]);
    let mut controller = controller_for(&chain).await;
    controller.refresh().await;
    let partner = Address::new([7u8; 32]).to_string();

    // when
    controller
        .invoke(
            0,
            ActionKind::AcceptBreed,
            &[partner.clone(), String::from("Smoulder")],
        )
        .await;

    // then
    let calls = chain.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("breed"));
    assert!(calls[0].contains(&partner));
    assert!(calls[0].ends_with("Smoulder"));
}

#[tokio::test]
async fn invoke__malformed_address__is_dropped_but_still_refreshes() {
    // given: trust high enough that Attack is enabled
    let mut fierce = spec("Ember", 1);
    fierce.trust = 4;
    let chain = FakeChain::with_dragons(vec![fierce]);
    let mut controller = controller_for(&chain).await;
    controller.refresh().await;
    let reads_before = chain.reads_served();

    // when: free text that no chain would accept
    controller
        .invoke(0, ActionKind::Attack, &[String::from("castle greyskull")])
        .await;

    // then
    assert!(chain.calls().is_empty());
    assert!(controller.status().contains("failed"));
    assert!(chain.reads_served() > reads_before);
}

mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn available_actions__gates_follow_the_snapshot(
            health in 0u64..=200,
            max_health in 0u64..=200,
            regen in 0u64..=50,
            trust in 0u64..=20,
            can_attack in any::<bool>(),
            hunger in 0u64..=10,
            sleepiness in 0u64..=10,
            uncleanliness in 0u64..=10,
            boredom in 0u64..=10,
        ) {
            let mut snapshot = DragonSnapshot {
                address: Address::new([1u8; 32]),
                name: String::from("Probe"),
                health,
                max_health,
                attack_cooldown: 0,
                health_regeneration: regen,
                damage: 0,
                player_trust: trust,
                can_attack,
                hunger,
                sleepiness,
                uncleanliness,
                boredom,
                actions: Vec::new(),
            };
            snapshot.actions = available_actions(&snapshot);
            let disabled = |kind: ActionKind| {
                snapshot.actions.iter().find(|a| a.kind == kind).unwrap().disabled
            };

            prop_assert_eq!(
                disabled(ActionKind::Attack),
                !(can_attack && trust >= ATTACK_TRUST_THRESHOLD)
            );
            prop_assert_eq!(disabled(ActionKind::Feed), hunger <= NEEDS_THRESHOLD);
            prop_assert_eq!(disabled(ActionKind::Sleep), sleepiness <= NEEDS_THRESHOLD);
            prop_assert_eq!(
                disabled(ActionKind::Clean),
                uncleanliness <= NEEDS_THRESHOLD
            );
            prop_assert_eq!(disabled(ActionKind::Play), boredom <= NEEDS_THRESHOLD);
            prop_assert_eq!(
                disabled(ActionKind::Heal),
                !(max_health.saturating_sub(health) >= regen
                    && trust >= HEAL_TRUST_THRESHOLD)
            );
            prop_assert_eq!(
                disabled(ActionKind::AcceptBreed),
                trust < BREED_TRUST_THRESHOLD
            );
            prop_assert_eq!(
                disabled(ActionKind::ProposeBreed),
                trust < BREED_TRUST_THRESHOLD
            );
        }
    }
}
