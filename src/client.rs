use crate::{
    chain::{
        Address,
        DragonContract,
        GameChain,
        PendingTx,
        Session,
    },
    ui,
};
use chrono::{
    DateTime,
    Local,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use futures::future::try_join_all;
use std::time::Duration;
use tokio::time;
use tracing::{
    error,
    info,
};

#[cfg(test)]
mod tests;

/// A need only asks for care once it climbs past this level.
pub const NEEDS_THRESHOLD: u64 = 5;
pub const ATTACK_TRUST_THRESHOLD: u64 = 4;
pub const BREED_TRUST_THRESHOLD: u64 = 10;
pub const HEAL_TRUST_THRESHOLD: u64 = 1;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActionKind {
    Attack,
    Feed,
    AcceptBreed,
    Sleep,
    Clean,
    Play,
    Heal,
    ProposeBreed,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Attack => "Attack",
            ActionKind::Feed => "Feed",
            ActionKind::AcceptBreed => "Accept Breed",
            ActionKind::Sleep => "Sleep",
            ActionKind::Clean => "Clean",
            ActionKind::Play => "Play",
            ActionKind::Heal => "Heal",
            ActionKind::ProposeBreed => "Propose Breed",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ActionKind::Attack => "🔥",
            ActionKind::Feed => "🍖",
            ActionKind::AcceptBreed => "🐣",
            ActionKind::Sleep => "💤",
            ActionKind::Clean => "🛁",
            ActionKind::Play => "🎮",
            ActionKind::Heal => "🩹",
            ActionKind::ProposeBreed => "❤",
        }
    }

    /// Free-text parameters the confirmation dialog collects, in call
    /// order.
    pub fn params(self) -> &'static [&'static str] {
        match self {
            ActionKind::Attack => &["address"],
            ActionKind::AcceptBreed => &["address", "name"],
            ActionKind::ProposeBreed => &["address"],
            _ => &[],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub kind: ActionKind,
    pub disabled: bool,
}

#[derive(Clone, Debug)]
pub struct DragonSnapshot {
    pub address: Address,
    pub name: String,
    pub health: u64,
    pub max_health: u64,
    pub attack_cooldown: u64,
    pub health_regeneration: u64,
    pub damage: u64,
    pub player_trust: u64,
    pub can_attack: bool,
    pub hunger: u64,
    pub sleepiness: u64,
    pub uncleanliness: u64,
    pub boredom: u64,
    pub actions: Vec<ActionDescriptor>,
}

#[derive(Clone, Debug, Default)]
pub struct GameState {
    pub dragons: Vec<DragonSnapshot>,
    pub loaded: bool,
}

/// Derives the action catalogue from a snapshot. Pure: the flags say
/// what was true at fetch time and nothing keeps them honest until the
/// next refresh.
pub fn available_actions(snapshot: &DragonSnapshot) -> Vec<ActionDescriptor> {
    let attack_ready =
        snapshot.can_attack && snapshot.player_trust >= ATTACK_TRUST_THRESHOLD;
    let breed_trusted = snapshot.player_trust >= BREED_TRUST_THRESHOLD;
    let heal_useful = snapshot.max_health.saturating_sub(snapshot.health)
        >= snapshot.health_regeneration
        && snapshot.player_trust >= HEAL_TRUST_THRESHOLD;

    let mut actions = vec![
        ActionDescriptor {
            kind: ActionKind::Attack,
            disabled: !attack_ready,
        },
        ActionDescriptor {
            kind: ActionKind::Feed,
            disabled: !(snapshot.hunger > NEEDS_THRESHOLD),
        },
        ActionDescriptor {
            kind: ActionKind::AcceptBreed,
            disabled: !breed_trusted,
        },
        ActionDescriptor {
            kind: ActionKind::Sleep,
            disabled: !(snapshot.sleepiness > NEEDS_THRESHOLD),
        },
        ActionDescriptor {
            kind: ActionKind::Clean,
            disabled: !(snapshot.uncleanliness > NEEDS_THRESHOLD),
        },
        ActionDescriptor {
            kind: ActionKind::Play,
            disabled: !(snapshot.boredom > NEEDS_THRESHOLD),
        },
        ActionDescriptor {
            kind: ActionKind::Heal,
            disabled: !heal_useful,
        },
        ActionDescriptor {
            kind: ActionKind::ProposeBreed,
            disabled: !breed_trusted,
        },
    ];
    actions.reverse();
    actions
}

async fn fetch_dragon<D: DragonContract>(
    dragon: &D,
    player: Address,
) -> Result<DragonSnapshot> {
    let (
        name,
        max_health,
        health,
        attack_cooldown,
        player_trust,
        health_regeneration,
        damage,
        can_attack,
        hunger,
        sleepiness,
        uncleanliness,
        boredom,
    ) = futures::try_join!(
        dragon.name(),
        dragon.max_health(),
        dragon.health(),
        dragon.attack_cooldown(),
        dragon.trust(&player),
        dragon.health_regeneration(),
        dragon.damage(),
        dragon.can_attack(),
        dragon.hunger(),
        dragon.sleepiness(),
        dragon.uncleanliness(),
        dragon.boredom(),
    )?;

    let mut snapshot = DragonSnapshot {
        address: dragon.address(),
        name,
        health,
        max_health,
        attack_cooldown,
        health_regeneration,
        damage,
        player_trust,
        can_attack,
        hunger,
        sleepiness,
        uncleanliness,
        boredom,
        actions: Vec::new(),
    };
    snapshot.actions = available_actions(&snapshot);
    Ok(snapshot)
}

pub struct AppController<C: GameChain> {
    session: Session<C>,
    game: GameState,
    selected_dragon: usize,
    selected_action: usize,
    status: String,
    last_refresh: Option<DateTime<Local>>,
}

impl<C: GameChain> AppController<C> {
    pub fn new(session: Session<C>) -> Self {
        Self {
            session,
            game: GameState::default(),
            selected_dragon: 0,
            selected_action: 0,
            status: String::from("Ready"),
            last_refresh: None,
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn player(&self) -> Address {
        self.session.address()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn selected_dragon(&self) -> usize {
        self.selected_dragon
    }

    pub fn selected_action(&self) -> usize {
        self.selected_action
    }

    pub fn select_next_dragon(&mut self) {
        let len = self.game.dragons.len();
        if len > 0 {
            self.selected_dragon = (self.selected_dragon + 1) % len;
            self.selected_action = 0;
        }
    }

    pub fn select_prev_dragon(&mut self) {
        let len = self.game.dragons.len();
        if len > 0 {
            self.selected_dragon = (self.selected_dragon + len - 1) % len;
            self.selected_action = 0;
        }
    }

    pub fn select_next_action(&mut self) {
        if let Some(dragon) = self.game.dragons.get(self.selected_dragon) {
            let len = dragon.actions.len();
            if len > 0 {
                self.selected_action = (self.selected_action + 1) % len;
            }
        }
    }

    pub fn select_prev_action(&mut self) {
        if let Some(dragon) = self.game.dragons.get(self.selected_dragon) {
            let len = dragon.actions.len();
            if len > 0 {
                self.selected_action = (self.selected_action + len - 1) % len;
            }
        }
    }

    pub fn dashboard(&self) -> ui::Dashboard<'_> {
        ui::Dashboard {
            player: self.session.address(),
            game: &self.game,
            selected_dragon: self.selected_dragon,
            selected_action: self.selected_action,
            status: &self.status,
            last_refresh: self.last_refresh,
        }
    }

    /// Re-fetches every dragon wholesale and swaps the aggregate in.
    /// One failed read abandons the whole pass; the previous state is
    /// kept untouched.
    pub async fn refresh(&mut self) {
        let player = self.session.address();
        let fetches = self
            .session
            .dragons()
            .iter()
            .map(|dragon| fetch_dragon(dragon, player));
        match try_join_all(fetches).await {
            Ok(dragons) => {
                self.game = GameState {
                    dragons,
                    loaded: true,
                };
                self.last_refresh = Some(Local::now());
                let len = self.game.dragons.len();
                self.selected_dragon = self.selected_dragon.min(len.saturating_sub(1));
                let actions = self
                    .game
                    .dragons
                    .get(self.selected_dragon)
                    .map_or(0, |d| d.actions.len());
                self.selected_action =
                    self.selected_action.min(actions.saturating_sub(1));
            }
            Err(err) => {
                // TODO: surface refresh failures in the UI.
                error!(error = %err, "refresh abandoned");
            }
        }
    }

    /// Dispatches one action with the user's free-text arguments. A
    /// descriptor flagged disabled never reaches the chain. Whatever
    /// the write's outcome, handles are reset and a full refresh runs.
    pub async fn invoke(
        &mut self,
        dragon_idx: usize,
        kind: ActionKind,
        args: &[String],
    ) {
        let Some(snapshot) = self.game.dragons.get(dragon_idx) else {
            return;
        };
        let dragon_name = snapshot.name.clone();
        let descriptor = snapshot.actions.iter().find(|a| a.kind == kind);
        if descriptor.is_none_or(|a| a.disabled) {
            self.status =
                format!("{} is not available for {dragon_name}", kind.label());
            return;
        }

        let from = self.session.address();
        match self.dispatch(dragon_idx, kind, args, from).await {
            Ok(tx) => {
                info!(action = kind.label(), dragon = %dragon_name, tx = %tx.id, "action dispatched");
                self.status =
                    format!("{} sent to {dragon_name} ({})", kind.label(), tx.id);
            }
            Err(err) => {
                error!(error = %err, action = kind.label(), dragon = %dragon_name, "action dispatch failed");
                self.status = format!("{} failed for {dragon_name}", kind.label());
            }
        }

        // Handles are stale after any write attempt.
        if let Err(err) = self.session.reset().await {
            error!(error = %err, "session reset failed");
        }
        self.refresh().await;
    }

    async fn dispatch(
        &self,
        dragon_idx: usize,
        kind: ActionKind,
        args: &[String],
        from: Address,
    ) -> Result<PendingTx> {
        let dragon = self
            .session
            .dragons()
            .get(dragon_idx)
            .ok_or_else(|| eyre!("no contract handle for dragon {dragon_idx}"))?;
        let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or_default();
        match kind {
            ActionKind::Attack => dragon.attack(&from, arg(0)).await,
            ActionKind::Feed => dragon.feed(&from).await,
            ActionKind::AcceptBreed => dragon.breed(&from, arg(0), arg(1)).await,
            ActionKind::Sleep => dragon.sleep(&from).await,
            ActionKind::Clean => dragon.clean(&from).await,
            ActionKind::Play => dragon.play(&from).await,
            ActionKind::Heal => dragon.heal(&from).await,
            ActionKind::ProposeBreed => dragon.propose_breed(&from, arg(0)).await,
        }
    }
}

pub async fn run_app<C: GameChain>(session: Session<C>) -> Result<()> {
    let mut controller = AppController::new(session);
    let mut ui_state = ui::UiState::default();

    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(&mut controller, &mut ui_state).await;
    ui::terminal_exit()?;
    res
}

async fn run_loop<C: GameChain>(
    controller: &mut AppController<C>,
    ui_state: &mut ui::UiState,
) -> Result<()> {
    let mut ticker = time::interval(POLL_INTERVAL);
    controller.refresh().await;
    ui::draw(ui_state, &controller.dashboard())?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => { break; }
            _ = ticker.tick() => {
                controller.refresh().await;
                ui::draw(ui_state, &controller.dashboard())?;
            }
            ev = ui::next_event(ui_state) => {
                match ev? {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::NextDragon => controller.select_next_dragon(),
                    ui::UserEvent::PrevDragon => controller.select_prev_dragon(),
                    ui::UserEvent::NextAction => controller.select_next_action(),
                    ui::UserEvent::PrevAction => controller.select_prev_action(),
                    ui::UserEvent::Refresh => controller.refresh().await,
                    ui::UserEvent::ConfirmAction { dragon, kind, args } => {
                        controller.invoke(dragon, kind, &args).await;
                    }
                    ui::UserEvent::OpenConfirm | ui::UserEvent::Redraw => {
                        // UI-only update; redraw without touching the chain.
                        ui::draw(ui_state, &controller.dashboard())?;
                        continue;
                    }
                }
                ui::draw(ui_state, &controller.dashboard())?;
            }
        }
    }
    Ok(())
}
