use crate::{
    chain::Address,
    client::{
        ActionDescriptor,
        ActionKind,
        GameState,
    },
    identicon,
    lore,
};
use chrono::{
    DateTime,
    Local,
};
use color_eyre::eyre::Result;
use crossterm::event::{
    self,
    Event,
    KeyCode,
    KeyEventKind,
};
use crossterm::terminal::{
    disable_raw_mode,
    enable_raw_mode,
};
use itertools::Itertools;
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::{
    io::stdout,
    time::Duration,
};
use tokio::time;
use unicode_width::UnicodeWidthStr;

pub enum UserEvent {
    Quit,
    NextDragon,
    PrevDragon,
    NextAction,
    PrevAction,
    Refresh,
    OpenConfirm,
    ConfirmAction {
        dragon: usize,
        kind: ActionKind,
        args: Vec<String>,
    },
    Redraw,
}

/// Everything one frame needs, borrowed from the controller.
pub struct Dashboard<'a> {
    pub player: Address,
    pub game: &'a GameState,
    pub selected_dragon: usize,
    pub selected_action: usize,
    pub status: &'a str,
    pub last_refresh: Option<DateTime<Local>>,
}

pub struct UiState {
    mode: Mode,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
    // caches for modal interactions between draws
    actions: Vec<Vec<ActionDescriptor>>,
    names: Vec<String>,
    selected_dragon: usize,
    selected_action: usize,
}

impl Default for UiState {
    fn default() -> Self {
        UiState {
            mode: Mode::Normal,
            terminal: None,
            actions: Vec::new(),
            names: Vec::new(),
            selected_dragon: 0,
            selected_action: 0,
        }
    }
}

#[derive(Clone, Debug, Default)]
enum Mode {
    #[default]
    Normal,
    Confirm(ConfirmState),
    QuitModal,
}

#[derive(Clone, Debug)]
struct ConfirmState {
    dragon: usize,
    dragon_name: String,
    kind: ActionKind,
    inputs: Vec<String>,
    field: usize,
}

impl UiState {
    fn open_confirm(&mut self) -> Option<()> {
        let descriptor = self
            .actions
            .get(self.selected_dragon)?
            .get(self.selected_action)?;
        if descriptor.disabled {
            return None;
        }
        let kind = descriptor.kind;
        self.mode = Mode::Confirm(ConfirmState {
            dragon: self.selected_dragon,
            dragon_name: self
                .names
                .get(self.selected_dragon)
                .cloned()
                .unwrap_or_default(),
            kind,
            inputs: vec![String::new(); kind.params().len()],
            field: 0,
        });
        Some(())
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    // One persistent Terminal so buffers survive across draws
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn draw(state: &mut UiState, dash: &Dashboard<'_>) -> Result<()> {
    // keep what the modal state machine needs between frames
    state.actions = dash
        .game
        .dragons
        .iter()
        .map(|dragon| dragon.actions.clone())
        .collect();
    state.names = dash
        .game
        .dragons
        .iter()
        .map(|dragon| dragon.name.clone())
        .collect();
    state.selected_dragon = dash.selected_dragon;
    state.selected_action = dash.selected_action;

    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, dash))?;
        state.terminal = Some(term);
    }
    Ok(())
}

pub async fn next_event(state: &mut UiState) -> Result<UserEvent> {
    loop {
        // a bare event::read would park the select loop and starve the
        // poll ticker, so only read once a key is actually pending
        if !event::poll(Duration::from_millis(0))? {
            time::sleep(Duration::from_millis(25)).await;
            continue;
        }
        let Event::Key(k) = event::read()? else {
            continue;
        };
        if k.kind != KeyEventKind::Press {
            continue;
        }

        match &mut state.mode {
            Mode::Confirm(cs) => match k.code {
                KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Tab => {
                    if !cs.inputs.is_empty() {
                        cs.field = (cs.field + 1) % cs.inputs.len();
                    }
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Backspace => {
                    if let Some(input) = cs.inputs.get_mut(cs.field) {
                        input.pop();
                    }
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Enter => {
                    let ev = UserEvent::ConfirmAction {
                        dragon: cs.dragon,
                        kind: cs.kind,
                        args: cs.inputs.clone(),
                    };
                    state.mode = Mode::Normal;
                    return Ok(ev);
                }
                KeyCode::Char(c) => {
                    if let Some(input) = cs.inputs.get_mut(cs.field) {
                        input.push(c);
                    }
                    return Ok(UserEvent::Redraw);
                }
                _ => {}
            },
            Mode::QuitModal => match k.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    return Ok(UserEvent::Quit);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    return Ok(UserEvent::Redraw);
                }
                _ => {}
            },
            Mode::Normal => {}
        }
        if !matches!(state.mode, Mode::Normal) {
            continue;
        }

        return Ok(match k.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                state.mode = Mode::QuitModal;
                UserEvent::Redraw
            }
            KeyCode::Right => UserEvent::NextDragon,
            KeyCode::Left => UserEvent::PrevDragon,
            KeyCode::Down => UserEvent::NextAction,
            KeyCode::Up => UserEvent::PrevAction,
            KeyCode::Char('r') => UserEvent::Refresh,
            KeyCode::Enter => match state.open_confirm() {
                Some(()) => UserEvent::OpenConfirm,
                // disabled or missing action: nothing to confirm
                None => UserEvent::Redraw,
            },
            _ => continue,
        });
    }
}

fn ui(f: &mut Frame, state: &UiState, dash: &Dashboard<'_>) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // status
            Constraint::Min(0),    // dragon cards
            Constraint::Length(3), // help
        ])
        .split(f.area());

    draw_top(f, chunks[0], dash);
    draw_cards(f, chunks[1], dash);
    draw_help(f, chunks[2]);
    draw_modals(f, state);
}

fn draw_top(f: &mut Frame, area: Rect, dash: &Dashboard<'_>) {
    let updated = dash
        .last_refresh
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| String::from("never"));
    let top = Paragraph::new(format!(
        "Player: {} | Dragons: {} | Updated: {} | {}",
        short_address(&dash.player),
        dash.game.dragons.len(),
        updated,
        dash.status,
    ))
    .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(top, area);
}

fn draw_cards(f: &mut Frame, area: Rect, dash: &Dashboard<'_>) {
    if !dash.game.loaded {
        let loading = Paragraph::new("Loading dragons…")
            .block(Block::default().borders(Borders::ALL).title("Dragons"));
        f.render_widget(loading, area);
        return;
    }
    if dash.game.dragons.is_empty() {
        let empty = Paragraph::new("No dragons on the roster")
            .block(Block::default().borders(Borders::ALL).title("Dragons"));
        f.render_widget(empty, area);
        return;
    }

    let cols = dash.game.dragons.len() as u16;
    let col_w = area.width / cols;
    for (i, dragon) in dash.game.dragons.iter().enumerate() {
        let rect = Rect::new(area.x + i as u16 * col_w, area.y, col_w, area.height);
        let selected = i == dash.selected_dragon;
        let title_style = if selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(fit(&dragon.name, rect.width as usize), title_style));
        let inner = block.inner(rect);
        f.render_widget(&block, rect);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),  // identicon
                Constraint::Length(1),  // trust
                Constraint::Length(9),  // actions
                Constraint::Length(6),  // stats
                Constraint::Min(0),     // lore
            ])
            .split(inner);

        f.render_widget(Paragraph::new(identicon::lines(&dragon.address)), rows[0]);
        f.render_widget(
            Paragraph::new(format!("Trust: {}", dragon.player_trust)),
            rows[1],
        );
        draw_actions(f, rows[2], dragon.actions.as_slice(), selected, dash);
        draw_stats(f, rows[3], dragon);
        let lore_text = lore::dragon_lore(&dragon.address);
        f.render_widget(
            Paragraph::new(lore_text)
                .style(Style::default().add_modifier(Modifier::ITALIC))
                .wrap(Wrap { trim: true }),
            rows[4],
        );
    }
}

fn draw_actions(
    f: &mut Frame,
    area: Rect,
    actions: &[ActionDescriptor],
    selected_card: bool,
    dash: &Dashboard<'_>,
) {
    let mut lines = Vec::new();
    for (i, action) in actions.iter().enumerate() {
        let cursor = if selected_card && i == dash.selected_action {
            ">"
        } else {
            " "
        };
        let text = format!("{cursor} {} {}", action.kind.icon(), action.kind.label());
        if action.disabled {
            lines.push(Line::styled(text, Style::default().fg(Color::DarkGray)));
        } else {
            lines.push(Line::from(text));
        }
    }
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_stats(f: &mut Frame, area: Rect, dragon: &crate::client::DragonSnapshot) {
    let rows = [
        Row::new(vec![String::from("Health"), dragon.health.to_string()]),
        Row::new(vec![String::from("Max Health"), dragon.max_health.to_string()]),
        Row::new(vec![String::from("Damage"), dragon.damage.to_string()]),
        Row::new(vec![
            String::from("Attack Cooldown"),
            dragon.attack_cooldown.to_string(),
        ]),
        Row::new(vec![
            String::from("Health Regen."),
            dragon.health_regeneration.to_string(),
        ]),
    ];
    let table = Table::new(
        rows,
        [Constraint::Length(16), Constraint::Fill(1)],
    );
    f.render_widget(table, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        "←/→ dragon | ↑/↓ action | Enter confirm | r refresh | q/Esc quit",
    )
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_modals(f: &mut Frame, state: &UiState) {
    match &state.mode {
        Mode::Confirm(cs) => {
            let area = centered_rect(46, 40, f.area());
            let block = Block::default()
                .borders(Borders::ALL)
                .title(format!("{} {}", cs.kind.icon(), cs.kind.label()));
            let mut lines = vec![Line::from(format!("Dragon: {}", cs.dragon_name))];
            let params = cs.kind.params();
            if params.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(format!(
                    "Send {} to {}?",
                    cs.kind.label(),
                    cs.dragon_name
                )));
            } else {
                lines.push(Line::from(format!(
                    "Needs: {}",
                    params.iter().join(", ")
                )));
                for (i, (param, value)) in
                    params.iter().zip(cs.inputs.iter()).enumerate()
                {
                    let cursor = if i == cs.field { ">" } else { " " };
                    lines.push(Line::from(format!("{cursor} {param}: {value}_")));
                }
            }
            lines.push(Line::from(""));
            lines.push(Line::from(if params.is_empty() {
                "Enter=confirm Esc=cancel"
            } else {
                "Enter=confirm Tab=next field Esc=cancel"
            }));
            f.render_widget(Clear, area);
            f.render_widget(&block, area);
            f.render_widget(Paragraph::new(lines), block.inner(area));
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
            let p = Paragraph::new("Leave the roost? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(&block, area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal => {}
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1]);

    vertical[1]
}

fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        if out.width() + 2 > width {
            out.push('…');
            break;
        }
        out.push(c);
    }
    out
}
