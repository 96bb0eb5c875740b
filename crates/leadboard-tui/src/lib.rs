// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use leadboard_app::{
    BackendError, ChatHandle, ChatLookup, DashboardCommand, DashboardEvent, DashboardState,
    LEADS_ENDPOINT, LOAD_FAILED_MESSAGE, LeadRecord, LoadPhase, NO_ANALYSIS, NO_COMPANY,
    NO_SUMMARY, NOT_AVAILABLE, PriorityBucket, RefreshToken, ScoreBucket, UserId, chat_link,
    display_or, display_or_na, format_breakdown_value, format_loan_amount, format_processed_at,
    humanize_key, lead_count_label, priority_bucket, score_bucket, score_percentage,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState, Wrap,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::UtcOffset;
use tracing::{debug, warn};

const PAGE_ROWS: isize = 10;
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const LOADING_TEXT: &str = "Loading leads...";
const DASHBOARD_TITLE: &str = "Lead Dashboard";

/// Everything the dashboard needs from the outside world.
///
/// The `spawn_*` methods default to running the request inline and posting
/// the result on `tx`; real runtimes override them to move the request onto
/// a worker thread so the UI keeps drawing.
pub trait AppRuntime {
    fn backend_url(&self) -> &str;
    fn list_leads(&mut self) -> Result<Vec<LeadRecord>, BackendError>;
    fn resolve_chat_handle(&mut self, user_id: &UserId) -> Result<ChatHandle, BackendError>;
    fn open_link(&mut self, url: &str) -> Result<()>;

    fn spawn_refresh(&mut self, token: RefreshToken, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self.list_leads();
        tx.send(InternalEvent::RefreshFinished { token, result })
            .map_err(|_| anyhow!("refresh event channel closed"))?;
        Ok(())
    }

    fn spawn_chat_lookup(&mut self, user_id: UserId, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self.resolve_chat_handle(&user_id);
        tx.send(InternalEvent::ChatFinished { user_id, result })
            .map_err(|_| anyhow!("chat event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    RefreshFinished {
        token: RefreshToken,
        result: Result<Vec<LeadRecord>, BackendError>,
    },
    ChatFinished {
        user_id: UserId,
        result: Result<ChatHandle, BackendError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    backend_url: String,
    local_offset: UtcOffset,
    selected: usize,
    help_visible: bool,
    status_token: u64,
}

impl ViewData {
    fn new(backend_url: impl Into<String>, local_offset: UtcOffset) -> Self {
        Self {
            backend_url: backend_url.into(),
            local_offset,
            selected: 0,
            help_visible: false,
            status_token: 0,
        }
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    local_offset: UtcOffset,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(runtime.backend_url(), local_offset);
    let (internal_tx, internal_rx) = mpsc::channel();

    begin_refresh(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(DashboardCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::RefreshFinished { token, result } => {
                let events = state.dispatch(DashboardCommand::FinishRefresh { token, result });
                apply_events(state, runtime, view_data, tx, events);
            }
            InternalEvent::ChatFinished { user_id, result } => {
                let events = state.dispatch(DashboardCommand::FinishChat { user_id, result });
                apply_events(state, runtime, view_data, tx, events);
            }
        }
    }
}

fn apply_events<R: AppRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    events: Vec<DashboardEvent>,
) {
    for event in events {
        match event {
            DashboardEvent::LeadsLoaded { count } => {
                view_data.selected = view_data.selected.min(count.saturating_sub(1));
                emit_status(state, view_data, tx, lead_count_label(count));
            }
            DashboardEvent::RefreshDiscarded(token) => {
                debug!(token = token.get(), "dropped stale refresh result");
            }
            DashboardEvent::ChatFailed { message, .. } => {
                emit_status(state, view_data, tx, message);
            }
            DashboardEvent::OpenLink(url) => {
                debug!(%url, "opening chat link");
                match runtime.open_link(&url) {
                    Ok(()) => emit_status(state, view_data, tx, format!("opened {url}")),
                    Err(error) => {
                        warn!(%url, %error, "could not open chat link");
                        emit_status(
                            state,
                            view_data,
                            tx,
                            format!("could not open {url}: {error}"),
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut DashboardState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(DashboardCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn begin_refresh<R: AppRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    state.dispatch(DashboardCommand::BeginRefresh);
    let token = state.latest_refresh();
    if let Err(error) = runtime.spawn_refresh(token, internal_tx.clone()) {
        warn!(%error, "could not start lead refresh");
        let events = state.dispatch(DashboardCommand::FinishRefresh {
            token,
            result: Err(BackendError::Transport(error.to_string())),
        });
        apply_events(state, runtime, view_data, internal_tx, events);
    }
}

fn begin_chat<R: AppRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if state.phase != LoadPhase::Ready {
        emit_status(state, view_data, internal_tx, "leads are not loaded yet");
        return;
    }
    let Some(user_id) = selected_lead(state, view_data).map(|lead| lead.user_id.clone()) else {
        emit_status(state, view_data, internal_tx, "no lead selected");
        return;
    };
    if state.chat_lookup(&user_id) == ChatLookup::Pending {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("chat lookup for {user_id} already running"),
        );
        return;
    }

    state.dispatch(DashboardCommand::BeginChat(user_id.clone()));
    if let Err(error) = runtime.spawn_chat_lookup(user_id.clone(), internal_tx.clone()) {
        warn!(%user_id, %error, "could not start chat lookup");
        let events = state.dispatch(DashboardCommand::FinishChat {
            user_id,
            result: Err(BackendError::Transport(error.to_string())),
        });
        apply_events(state, runtime, view_data, internal_tx, events);
    }
}

fn toggle_sort(
    state: &mut DashboardState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let selected_id = selected_lead(state, view_data).map(|lead| lead.user_id.clone());
    state.dispatch(DashboardCommand::ToggleSortOrder);
    if let Some(user_id) = selected_id
        && let Some(index) = state
            .sorted_leads()
            .iter()
            .position(|lead| lead.user_id == user_id)
    {
        view_data.selected = index;
    }
    let status = format!(
        "sorted by lead score {} {}",
        state.sort_order.as_str(),
        state.sort_order.indicator()
    );
    emit_status(state, view_data, internal_tx, status);
}

fn visible_lead_count(state: &DashboardState) -> usize {
    if state.phase == LoadPhase::Ready {
        state.leads.len()
    } else {
        0
    }
}

fn move_selection(state: &DashboardState, view_data: &mut ViewData, delta: isize) {
    let count = visible_lead_count(state);
    if count == 0 {
        return;
    }
    view_data.selected = view_data
        .selected
        .saturating_add_signed(delta)
        .min(count - 1);
}

fn selected_lead<'a>(state: &'a DashboardState, view_data: &ViewData) -> Option<&'a LeadRecord> {
    if state.phase != LoadPhase::Ready {
        return None;
    }
    state.sorted_leads().get(view_data.selected).copied()
}

fn handle_key_event<R: AppRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('j') | KeyCode::Down => move_selection(state, view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_selection(state, view_data, -1),
        KeyCode::PageDown => move_selection(state, view_data, PAGE_ROWS),
        KeyCode::PageUp => move_selection(state, view_data, -PAGE_ROWS),
        KeyCode::Char('g') | KeyCode::Home => view_data.selected = 0,
        KeyCode::Char('G') | KeyCode::End => move_selection(state, view_data, isize::MAX),
        KeyCode::Char('s') => toggle_sort(state, view_data, internal_tx),
        KeyCode::Char('r') => {
            emit_status(state, view_data, internal_tx, "refreshing leads");
            begin_refresh(state, runtime, view_data, internal_tx);
        }
        KeyCode::Char('t') | KeyCode::Enter => begin_chat(state, runtime, view_data, internal_tx),
        KeyCode::Char('?') => view_data.help_visible = true,
        _ => {}
    }
    false
}

fn help_overlay_text() -> &'static str {
    "nav: j/k or up/down move | g/G first/last | pgup/pgdn page\n\
sort: s toggle lead score order\n\
data: r refresh leads\n\
chat: t or enter open the selected lead's Telegram chat\n\
global: ? help | q or esc quit | ctrl+c quit"
}

fn status_text(state: &DashboardState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }
    let default = "j/k move | s sort | r refresh | t chat | ? help | q quit";
    match &state.status_line {
        Some(status) => format!("{status} | {default}"),
        None => default.to_owned(),
    }
}

fn header_text(state: &DashboardState, view_data: &ViewData) -> String {
    let count = match state.phase {
        LoadPhase::Loading => "loading".to_owned(),
        LoadPhase::Failed => "unavailable".to_owned(),
        LoadPhase::Ready => lead_count_label(state.leads.len()),
    };
    format!(
        "{count} | Backend: {} | Sort by Lead Score {}",
        view_data.backend_url,
        state.sort_order.indicator()
    )
}

fn error_text(state: &DashboardState, view_data: &ViewData) -> String {
    [
        "Error Loading Data".to_owned(),
        state
            .error
            .clone()
            .unwrap_or_else(|| LOAD_FAILED_MESSAGE.to_owned()),
        String::new(),
        format!("Backend URL: {}", view_data.backend_url),
        format!("Endpoint: {LEADS_ENDPOINT}"),
        String::new(),
        "press r to retry".to_owned(),
    ]
    .join("\n")
}

fn empty_text(view_data: &ViewData) -> String {
    [
        "No Leads Found".to_owned(),
        "No lead data is available. Please check your backend configuration.".to_owned(),
        String::new(),
        format!("Backend URL: {}", view_data.backend_url),
        format!("Endpoint: {LEADS_ENDPOINT}"),
    ]
    .join("\n")
}

fn chat_column_label(lookup: &ChatLookup) -> &'static str {
    match lookup {
        ChatLookup::Idle => "",
        ChatLookup::Pending => "...",
        ChatLookup::Opened(_) => "opened",
        ChatLookup::Failed(_) => "failed",
    }
}

fn chat_state_line(lookup: &ChatLookup) -> String {
    match lookup {
        ChatLookup::Idle => "press t to open the Telegram chat".to_owned(),
        ChatLookup::Pending => "looking up Telegram username...".to_owned(),
        ChatLookup::Opened(username) => format!("opened {}", chat_link(username)),
        ChatLookup::Failed(message) => message.clone(),
    }
}

fn lead_row_cells(lead: &LeadRecord, lookup: &ChatLookup) -> [String; 5] {
    let company = display_or(lead.company.as_deref(), NO_COMPANY).to_owned();
    let (score, priority, category) = match &lead.inference {
        Some(inference) => (
            format!("{}/{}", inference.lead_score, inference.total_possible_score),
            display_or_na(Some(inference.priority.as_str())).to_owned(),
            display_or_na(Some(inference.lead_category.as_str())).to_owned(),
        ),
        None => (
            NOT_AVAILABLE.to_owned(),
            NOT_AVAILABLE.to_owned(),
            NOT_AVAILABLE.to_owned(),
        ),
    };
    [
        company,
        score,
        priority,
        category,
        chat_column_label(lookup).to_owned(),
    ]
}

fn lead_detail_text(lead: &LeadRecord, lookup: &ChatLookup, offset: UtcOffset) -> String {
    let mut lines = vec![
        format!("User ID: {}", lead.user_id),
        format!(
            "Company: {}",
            display_or(lead.company.as_deref(), NO_COMPANY)
        ),
        format!(
            "Type of Business: {}",
            display_or_na(lead.business_type.as_deref())
        ),
        format!("Turnover: {}", display_or_na(lead.turnover.as_deref())),
        format!(
            "Profit Margin: {}",
            display_or_na(lead.profit_margin.as_deref())
        ),
        format!("Loan Amount: {}", format_loan_amount(lead.loan_amount)),
        format!(
            "Reason for Loan: {}",
            display_or_na(lead.loan_reason.as_deref())
        ),
        format!(
            "Duration of Loan: {}",
            display_or_na(lead.loan_duration.as_deref())
        ),
        format!("Collateral: {}", display_or_na(lead.collateral.as_deref())),
        String::new(),
        format!(
            "Summary: {}",
            display_or(lead.summary.as_deref(), NO_SUMMARY)
        ),
        String::new(),
    ];

    match &lead.inference {
        Some(inference) => {
            let percentage =
                score_percentage(inference.lead_score, inference.total_possible_score);
            lines.push(format!(
                "Lead Score: {}/{} ({percentage:.1}%, {})",
                inference.lead_score,
                inference.total_possible_score,
                score_bucket(inference.lead_score).as_str()
            ));
            lines.push(format!(
                "Category: {}",
                display_or_na(Some(inference.lead_category.as_str()))
            ));
            lines.push(format!(
                "Priority: {}",
                display_or_na(Some(inference.priority.as_str()))
            ));
            lines.push(format!(
                "Recommended Action: {}",
                display_or_na(Some(inference.recommended_action.as_str()))
            ));
            lines.push(format!(
                "Conversion Probability: {}",
                display_or_na(Some(inference.conversion_probability.as_str()))
            ));
            if !inference.score_breakdown.is_empty() {
                lines.push("Score Breakdown:".to_owned());
                for component in inference.score_breakdown.components() {
                    lines.push(format!(
                        "  {}: {}",
                        humanize_key(&component.name),
                        format_breakdown_value(component.value)
                    ));
                }
            }
            lines.push(format!(
                "Processed: {}",
                format_processed_at(&inference.processed_at, offset)
            ));
        }
        None => lines.push(NO_ANALYSIS.to_owned()),
    }

    lines.push(String::new());
    lines.push(format!("Telegram: {}", chat_state_line(lookup)));
    lines.join("\n")
}

fn score_color(bucket: ScoreBucket) -> Color {
    match bucket {
        ScoreBucket::Strong => Color::Green,
        ScoreBucket::Good => Color::Yellow,
        ScoreBucket::Fair => Color::LightRed,
        ScoreBucket::Weak => Color::Red,
    }
}

fn priority_color(bucket: PriorityBucket) -> Color {
    match bucket {
        PriorityBucket::High => Color::Red,
        PriorityBucket::Medium => Color::Yellow,
        PriorityBucket::Low => Color::Green,
        PriorityBucket::Default => Color::Gray,
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &DashboardState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state, view_data))
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title(DASHBOARD_TITLE)
                .borders(Borders::ALL),
        );
    frame.render_widget(header, layout[0]);

    match state.phase {
        LoadPhase::Loading => {
            let body = Paragraph::new(LOADING_TEXT)
                .style(Style::default().fg(Color::Cyan))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(body, layout[1]);
        }
        LoadPhase::Failed => {
            let body = Paragraph::new(error_text(state, view_data))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("error"));
            frame.render_widget(body, layout[1]);
        }
        LoadPhase::Ready if state.leads.is_empty() => {
            let body = Paragraph::new(empty_text(view_data))
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("leads"));
            frame.render_widget(body, layout[1]);
        }
        LoadPhase::Ready => render_leads(frame, layout[1], state, view_data),
    }

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .wrap(Wrap { trim: false })
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_leads(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &DashboardState,
    view_data: &ViewData,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let sorted = state.sorted_leads();

    let header_cells = ["Company", "Score", "Priority", "Category", "Chat"]
        .into_iter()
        .map(|label| {
            Cell::from(label).style(
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = Row::new(header_cells);

    let rows = sorted.iter().map(|lead| {
        let [company, score, priority, category, chat] =
            lead_row_cells(lead, &state.chat_lookup(&lead.user_id));
        let (score_style, priority_style) = match &lead.inference {
            Some(inference) => (
                Style::default().fg(score_color(score_bucket(inference.lead_score))),
                Style::default().fg(priority_color(priority_bucket(&inference.priority))),
            ),
            None => (
                Style::default().fg(Color::DarkGray),
                Style::default().fg(Color::DarkGray),
            ),
        };
        Row::new(vec![
            Cell::from(company),
            Cell::from(score).style(score_style),
            Cell::from(priority).style(priority_style),
            Cell::from(category),
            Cell::from(chat),
        ])
    });

    let widths = [
        Constraint::Min(16),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Min(10),
        Constraint::Length(7),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .title(format!("leads {}", state.sort_order.indicator()))
                .borders(Borders::ALL),
        );
    let mut table_state = TableState::default();
    table_state.select(Some(view_data.selected));
    frame.render_stateful_widget(table, columns[0], &mut table_state);

    let Some(lead) = sorted.get(view_data.selected).copied() else {
        return;
    };

    let detail_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(columns[1]);

    let (ratio, label, color) = match &lead.inference {
        Some(inference) => {
            let percentage =
                score_percentage(inference.lead_score, inference.total_possible_score);
            (
                (percentage / 100.0).clamp(0.0, 1.0),
                format!("{percentage:.1}%"),
                score_color(score_bucket(inference.lead_score)),
            )
        }
        None => (0.0, NOT_AVAILABLE.to_owned(), Color::DarkGray),
    };
    let gauge = Gauge::default()
        .block(Block::default().title("lead score").borders(Borders::ALL))
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, detail_layout[0]);

    let lookup = state.chat_lookup(&lead.user_id);
    let detail = Paragraph::new(lead_detail_text(lead, &lookup, view_data.local_offset))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(display_or(lead.company.as_deref(), NO_COMPANY).to_owned())
                .borders(Borders::ALL),
        );
    frame.render_widget(detail, detail_layout[1]);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InternalEvent, ViewData, begin_refresh, empty_text, error_text,
        handle_key_event, header_text, lead_detail_text, lead_row_cells,
        process_internal_events, status_text,
    };
    use anyhow::{Result, anyhow};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use leadboard_app::{
        BackendError, CHAT_LOOKUP_FAILED_MESSAGE, ChatHandle, ChatLookup, DashboardCommand,
        DashboardState, LOAD_FAILED_MESSAGE, LeadRecord, LoadPhase, NO_ANALYSIS,
        NO_CHAT_HANDLE_MESSAGE, NO_COMPANY, NO_SUMMARY, SortOrder, UserId, humanize_key,
    };
    use leadboard_testkit::{LeadFaker, breakdown_keys, lead_with_score};
    use std::sync::mpsc;
    use time::UtcOffset;

    const BACKEND_URL: &str = "http://leads.test:3001";

    struct TestRuntime {
        leads: Result<Vec<LeadRecord>, BackendError>,
        username: Option<String>,
        chat_error: Option<BackendError>,
        open_fails: bool,
        list_calls: usize,
        chat_calls: Vec<UserId>,
        opened: Vec<String>,
    }

    impl TestRuntime {
        fn with_leads(leads: Vec<LeadRecord>) -> Self {
            Self {
                leads: Ok(leads),
                username: Some("alice".to_owned()),
                chat_error: None,
                open_fails: false,
                list_calls: 0,
                chat_calls: Vec::new(),
                opened: Vec::new(),
            }
        }

        fn scored() -> Self {
            Self::with_leads(vec![
                lead_with_score("forty", Some(40), "low"),
                lead_with_score("ninety", Some(90), "high"),
                lead_with_score("seventy", Some(70), "medium"),
            ])
        }
    }

    impl AppRuntime for TestRuntime {
        fn backend_url(&self) -> &str {
            BACKEND_URL
        }

        fn list_leads(&mut self) -> Result<Vec<LeadRecord>, BackendError> {
            self.list_calls += 1;
            self.leads.clone()
        }

        fn resolve_chat_handle(&mut self, user_id: &UserId) -> Result<ChatHandle, BackendError> {
            self.chat_calls.push(user_id.clone());
            match &self.chat_error {
                Some(error) => Err(error.clone()),
                None => Ok(ChatHandle {
                    username: self.username.clone(),
                }),
            }
        }

        fn open_link(&mut self, url: &str) -> Result<()> {
            if self.open_fails {
                return Err(anyhow!("no browser available"));
            }
            self.opened.push(url.to_owned());
            Ok(())
        }
    }

    struct Harness {
        state: DashboardState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: mpsc::Sender<InternalEvent>,
        rx: mpsc::Receiver<InternalEvent>,
    }

    impl Harness {
        fn new(runtime: TestRuntime) -> Self {
            let (tx, rx) = mpsc::channel();
            Self {
                state: DashboardState::default(),
                runtime,
                view_data: ViewData::new(BACKEND_URL, UtcOffset::UTC),
                tx,
                rx,
            }
        }

        fn loaded(runtime: TestRuntime) -> Self {
            let mut harness = Self::new(runtime);
            begin_refresh(
                &mut harness.state,
                &mut harness.runtime,
                &mut harness.view_data,
                &harness.tx,
            );
            harness.drain();
            harness
        }

        fn press(&mut self, code: KeyCode) -> bool {
            self.press_with(code, KeyModifiers::NONE)
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, modifiers),
            )
        }

        fn drain(&mut self) {
            process_internal_events(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                &self.rx,
            );
        }

        fn selected_id(&self) -> Option<String> {
            self.state
                .sorted_leads()
                .get(self.view_data.selected)
                .map(|lead| lead.user_id.to_string())
        }
    }

    #[test]
    fn mount_refresh_loads_leads_through_channel() {
        let mut harness = Harness::new(TestRuntime::scored());
        begin_refresh(
            &mut harness.state,
            &mut harness.runtime,
            &mut harness.view_data,
            &harness.tx,
        );
        assert_eq!(harness.state.phase, LoadPhase::Loading);

        harness.drain();
        assert_eq!(harness.state.phase, LoadPhase::Ready);
        assert_eq!(harness.state.leads.len(), 3);
        assert_eq!(harness.state.status_line.as_deref(), Some("3 leads found"));
        assert_eq!(harness.selected_id().as_deref(), Some("ninety"));
    }

    #[test]
    fn refresh_key_fetches_again() {
        let mut harness = Harness::loaded(TestRuntime::scored());
        assert!(!harness.press(KeyCode::Char('r')));
        assert_eq!(harness.state.phase, LoadPhase::Loading);
        harness.drain();
        assert_eq!(harness.state.phase, LoadPhase::Ready);
        assert_eq!(harness.runtime.list_calls, 2);
    }

    #[test]
    fn failed_refresh_shows_error_screen_with_backend_details() {
        let mut runtime = TestRuntime::scored();
        runtime.leads = Err(BackendError::Transport("connection refused".to_owned()));
        let harness = Harness::loaded(runtime);

        assert_eq!(harness.state.phase, LoadPhase::Failed);
        let text = error_text(&harness.state, &harness.view_data);
        assert!(text.contains(LOAD_FAILED_MESSAGE));
        assert!(text.contains("Backend URL: http://leads.test:3001"));
        assert!(text.contains("Endpoint: /webhook/get-leads"));
        assert!(text.contains("press r to retry"));
    }

    #[test]
    fn empty_response_renders_empty_state() {
        let harness = Harness::loaded(TestRuntime::with_leads(Vec::new()));
        assert_eq!(harness.state.phase, LoadPhase::Ready);
        assert_eq!(harness.state.status_line.as_deref(), Some("0 leads found"));

        let text = empty_text(&harness.view_data);
        assert!(text.contains("No Leads Found"));
        assert!(text.contains(BACKEND_URL));
        assert!(text.contains("/webhook/get-leads"));
    }

    #[test]
    fn stale_refresh_result_is_dropped() {
        let mut harness = Harness::new(TestRuntime::scored());
        harness.state.dispatch(DashboardCommand::BeginRefresh);
        let stale = harness.state.latest_refresh();
        harness.state.dispatch(DashboardCommand::BeginRefresh);

        harness
            .tx
            .send(InternalEvent::RefreshFinished {
                token: stale,
                result: Ok(vec![lead_with_score("old", Some(10), "low")]),
            })
            .expect("channel open");
        harness.drain();

        assert_eq!(harness.state.phase, LoadPhase::Loading);
        assert!(harness.state.leads.is_empty());
    }

    #[test]
    fn sort_key_flips_order_and_keeps_selected_lead() {
        let mut harness = Harness::loaded(TestRuntime::scored());
        assert_eq!(harness.selected_id().as_deref(), Some("ninety"));

        harness.press(KeyCode::Char('s'));
        assert_eq!(harness.state.sort_order, SortOrder::Ascending);
        assert_eq!(harness.view_data.selected, 2);
        assert_eq!(harness.selected_id().as_deref(), Some("ninety"));
        assert!(
            harness
                .state
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("asc"))
        );
    }

    #[test]
    fn selection_moves_and_clamps() {
        let mut harness = Harness::loaded(TestRuntime::scored());

        harness.press(KeyCode::Char('k'));
        assert_eq!(harness.view_data.selected, 0);
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Down);
        harness.press(KeyCode::Down);
        assert_eq!(harness.view_data.selected, 2);
        assert_eq!(harness.selected_id().as_deref(), Some("forty"));

        harness.press(KeyCode::Char('g'));
        assert_eq!(harness.view_data.selected, 0);
        harness.press(KeyCode::Char('G'));
        assert_eq!(harness.view_data.selected, 2);
    }

    #[test]
    fn chat_key_opens_telegram_link_for_selected_lead() {
        let mut harness = Harness::loaded(TestRuntime::scored());
        harness.press(KeyCode::Char('t'));

        let ninety = UserId::from("ninety");
        assert_eq!(harness.state.chat_lookup(&ninety), ChatLookup::Pending);

        harness.drain();
        assert_eq!(harness.runtime.chat_calls, vec![ninety.clone()]);
        assert_eq!(harness.runtime.opened, vec!["https://t.me/alice".to_owned()]);
        assert_eq!(
            harness.state.chat_lookup(&ninety),
            ChatLookup::Opened("alice".to_owned())
        );
    }

    #[test]
    fn missing_username_fails_only_that_lead() {
        let mut runtime = TestRuntime::scored();
        runtime.username = None;
        let mut harness = Harness::loaded(runtime);

        harness.press(KeyCode::Enter);
        harness.drain();

        assert!(harness.runtime.opened.is_empty());
        assert_eq!(
            harness.state.chat_lookup(&UserId::from("ninety")),
            ChatLookup::Failed(NO_CHAT_HANDLE_MESSAGE.to_owned())
        );
        assert_eq!(
            harness.state.chat_lookup(&UserId::from("seventy")),
            ChatLookup::Idle
        );
        assert_eq!(
            harness.state.status_line.as_deref(),
            Some(NO_CHAT_HANDLE_MESSAGE)
        );
    }

    #[test]
    fn chat_lookup_error_lands_on_lead_slot() {
        let mut runtime = TestRuntime::scored();
        runtime.chat_error = Some(BackendError::Status {
            status: 500,
            detail: None,
        });
        let mut harness = Harness::loaded(runtime);

        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Char('t'));
        harness.drain();

        assert_eq!(
            harness.state.chat_lookup(&UserId::from("seventy")),
            ChatLookup::Failed(CHAT_LOOKUP_FAILED_MESSAGE.to_owned())
        );
        assert_eq!(harness.state.phase, LoadPhase::Ready);
    }

    #[test]
    fn pending_chat_is_not_requested_twice() {
        let mut harness = Harness::loaded(TestRuntime::scored());
        harness.press(KeyCode::Char('t'));
        harness.press(KeyCode::Char('t'));
        harness.drain();
        assert_eq!(harness.runtime.chat_calls.len(), 1);
    }

    #[test]
    fn open_failure_is_reported_on_status_line() {
        let mut runtime = TestRuntime::scored();
        runtime.open_fails = true;
        let mut harness = Harness::loaded(runtime);

        harness.press(KeyCode::Char('t'));
        harness.drain();

        let status = harness.state.status_line.clone().unwrap_or_default();
        assert!(status.contains("could not open https://t.me/alice"), "{status}");
    }

    #[test]
    fn chat_key_is_ignored_while_loading() {
        let mut harness = Harness::new(TestRuntime::scored());
        harness.press(KeyCode::Char('t'));
        assert!(harness.runtime.chat_calls.is_empty());
        assert_eq!(
            harness.state.status_line.as_deref(),
            Some("leads are not loaded yet")
        );
    }

    #[test]
    fn help_overlay_swallows_keys_until_closed() {
        let mut harness = Harness::loaded(TestRuntime::scored());
        harness.press(KeyCode::Char('?'));
        assert!(harness.view_data.help_visible);
        assert!(status_text(&harness.state, &harness.view_data).is_empty());

        assert!(!harness.press(KeyCode::Char('q')));
        assert!(!harness.press(KeyCode::Char('s')));
        assert_eq!(harness.state.sort_order, SortOrder::Descending);

        harness.press(KeyCode::Esc);
        assert!(!harness.view_data.help_visible);
    }

    #[test]
    fn quit_keys_exit() {
        let mut harness = Harness::loaded(TestRuntime::scored());
        assert!(harness.press(KeyCode::Char('q')));
        assert!(harness.press(KeyCode::Esc));
        assert!(harness.press_with(KeyCode::Char('c'), KeyModifiers::CONTROL));
    }

    #[test]
    fn clear_status_ignores_superseded_tokens() {
        let mut harness = Harness::loaded(TestRuntime::scored());
        let current = harness.view_data.status_token;
        assert!(harness.state.status_line.is_some());

        harness
            .tx
            .send(InternalEvent::ClearStatus {
                token: current.saturating_sub(1),
            })
            .expect("channel open");
        harness.drain();
        assert!(harness.state.status_line.is_some());

        harness
            .tx
            .send(InternalEvent::ClearStatus { token: current })
            .expect("channel open");
        harness.drain();
        assert!(harness.state.status_line.is_none());
    }

    #[test]
    fn header_reports_count_backend_and_sort_indicator() {
        let mut harness = Harness::loaded(TestRuntime::scored());
        let header = header_text(&harness.state, &harness.view_data);
        assert!(header.contains("3 leads found"));
        assert!(header.contains("Backend: http://leads.test:3001"));
        assert!(header.contains('↓'));

        harness.press(KeyCode::Char('s'));
        assert!(header_text(&harness.state, &harness.view_data).contains('↑'));
    }

    #[test]
    fn row_cells_fall_back_for_unscored_lead() {
        let cells = lead_row_cells(&lead_with_score("bare", None, ""), &ChatLookup::Idle);
        assert_eq!(cells[1], "N/A");
        assert_eq!(cells[2], "N/A");

        let scored = lead_row_cells(
            &lead_with_score("hot", Some(82), "High"),
            &ChatLookup::Opened("alice".to_owned()),
        );
        assert_eq!(scored[1], "82/100");
        assert_eq!(scored[2], "High");
        assert_eq!(scored[4], "opened");
    }

    #[test]
    fn detail_uses_fallbacks_for_sparse_lead() {
        let mut lead = lead_with_score("bare", None, "");
        lead.company = None;
        let text = lead_detail_text(&lead, &ChatLookup::Idle, UtcOffset::UTC);

        assert!(text.contains(NO_COMPANY));
        assert!(text.contains(NO_SUMMARY));
        assert!(text.contains(NO_ANALYSIS));
        assert!(text.contains("Loan Amount: ₹N/A"));
        assert!(text.contains("Turnover: N/A"));
        assert!(text.contains("press t to open the Telegram chat"));
    }

    #[test]
    fn detail_lists_breakdown_in_wire_order() -> Result<()> {
        let mut faker = LeadFaker::new(11);
        let lead = faker.scored_lead();
        let text = lead_detail_text(&lead, &ChatLookup::Pending, UtcOffset::UTC);

        let mut last = 0;
        for key in breakdown_keys() {
            let label = format!("  {}: ", humanize_key(key));
            let position = text
                .find(&label)
                .ok_or_else(|| anyhow!("missing breakdown line {label:?}"))?;
            assert!(position >= last, "{label} out of order");
            last = position;
        }
        assert!(text.contains("looking up Telegram username..."));
        Ok(())
    }

    #[test]
    fn detail_formats_processed_time_and_percentage() {
        let lead = lead_with_score("hot", Some(82), "high");
        let text = lead_detail_text(
            &lead,
            &ChatLookup::Opened("alice".to_owned()),
            UtcOffset::UTC,
        );
        assert!(text.contains("Processed: 2026-02-19 12:34:56"));
        assert!(text.contains("Lead Score: 82/100 (82.0%, strong)"));
        assert!(text.contains("Telegram: opened https://t.me/alice"));
    }
}
