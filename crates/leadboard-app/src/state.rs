// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::backend::BackendError;
use crate::ids::{RefreshToken, UserId};
use crate::model::{ChatHandle, LeadRecord};
use crate::presentation::chat_link;

pub const LOAD_FAILED_MESSAGE: &str =
    "Failed to load leads. Please check your backend URL configuration.";
pub const NO_CHAT_HANDLE_MESSAGE: &str = "No Telegram username found for this lead";
pub const CHAT_LOOKUP_FAILED_MESSAGE: &str = "Failed to fetch Telegram username. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Descending => "desc",
            Self::Ascending => "asc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "desc" => Some(Self::Descending),
            "asc" => Some(Self::Ascending),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Descending => Self::Ascending,
            Self::Ascending => Self::Descending,
        }
    }

    pub const fn indicator(self) -> &'static str {
        match self {
            Self::Descending => "↓",
            Self::Ascending => "↑",
        }
    }
}

/// Per-lead chat-handle lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChatLookup {
    #[default]
    Idle,
    Pending,
    Opened(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub phase: LoadPhase,
    pub leads: Vec<LeadRecord>,
    pub error: Option<String>,
    pub sort_order: SortOrder,
    pub status_line: Option<String>,
    latest_refresh: RefreshToken,
    chat: BTreeMap<UserId, ChatLookup>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            phase: LoadPhase::Loading,
            leads: Vec::new(),
            error: None,
            sort_order: SortOrder::default(),
            status_line: None,
            latest_refresh: RefreshToken::default(),
            chat: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardCommand {
    BeginRefresh,
    FinishRefresh {
        token: RefreshToken,
        result: Result<Vec<LeadRecord>, BackendError>,
    },
    ToggleSortOrder,
    BeginChat(UserId),
    FinishChat {
        user_id: UserId,
        result: Result<ChatHandle, BackendError>,
    },
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    RefreshStarted(RefreshToken),
    LeadsLoaded { count: usize },
    LoadFailed(String),
    RefreshDiscarded(RefreshToken),
    SortOrderChanged(SortOrder),
    ChatPending(UserId),
    ChatFailed { user_id: UserId, message: String },
    OpenLink(String),
    StatusUpdated(String),
    StatusCleared,
}

impl DashboardState {
    pub fn with_sort_order(sort_order: SortOrder) -> Self {
        Self {
            sort_order,
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: DashboardCommand) -> Vec<DashboardEvent> {
        match command {
            DashboardCommand::BeginRefresh => {
                self.latest_refresh = self.latest_refresh.next();
                self.phase = LoadPhase::Loading;
                self.error = None;
                vec![DashboardEvent::RefreshStarted(self.latest_refresh)]
            }
            DashboardCommand::FinishRefresh { token, result } => self.finish_refresh(token, result),
            DashboardCommand::ToggleSortOrder => {
                self.sort_order = self.sort_order.toggled();
                vec![DashboardEvent::SortOrderChanged(self.sort_order)]
            }
            DashboardCommand::BeginChat(user_id) => {
                self.chat.insert(user_id.clone(), ChatLookup::Pending);
                vec![DashboardEvent::ChatPending(user_id)]
            }
            DashboardCommand::FinishChat { user_id, result } => self.finish_chat(user_id, result),
            DashboardCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![DashboardEvent::StatusUpdated(message)]
            }
            DashboardCommand::ClearStatus => {
                self.status_line = None;
                vec![DashboardEvent::StatusCleared]
            }
        }
    }

    pub fn latest_refresh(&self) -> RefreshToken {
        self.latest_refresh
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    /// Leads ordered by effective score. Equal scores keep fetch order in
    /// both directions.
    pub fn sorted_leads(&self) -> Vec<&LeadRecord> {
        let mut sorted: Vec<&LeadRecord> = self.leads.iter().collect();
        match self.sort_order {
            SortOrder::Descending => {
                sorted.sort_by(|left, right| right.effective_score().cmp(&left.effective_score()))
            }
            SortOrder::Ascending => {
                sorted.sort_by(|left, right| left.effective_score().cmp(&right.effective_score()))
            }
        }
        sorted
    }

    pub fn chat_lookup(&self, user_id: &UserId) -> ChatLookup {
        self.chat.get(user_id).cloned().unwrap_or_default()
    }

    pub fn pending_chat_count(&self) -> usize {
        self.chat
            .values()
            .filter(|lookup| **lookup == ChatLookup::Pending)
            .count()
    }

    fn finish_refresh(
        &mut self,
        token: RefreshToken,
        result: Result<Vec<LeadRecord>, BackendError>,
    ) -> Vec<DashboardEvent> {
        if token != self.latest_refresh {
            return vec![DashboardEvent::RefreshDiscarded(token)];
        }

        match result {
            Ok(leads) => {
                let count = leads.len();
                self.chat
                    .retain(|user_id, _| leads.iter().any(|lead| &lead.user_id == user_id));
                self.leads = leads;
                self.phase = LoadPhase::Ready;
                self.error = None;
                vec![DashboardEvent::LeadsLoaded { count }]
            }
            Err(_) => {
                self.leads.clear();
                self.phase = LoadPhase::Failed;
                self.error = Some(LOAD_FAILED_MESSAGE.to_owned());
                vec![DashboardEvent::LoadFailed(LOAD_FAILED_MESSAGE.to_owned())]
            }
        }
    }

    fn finish_chat(
        &mut self,
        user_id: UserId,
        result: Result<ChatHandle, BackendError>,
    ) -> Vec<DashboardEvent> {
        let failure = match result {
            Ok(handle) => match handle.username() {
                Some(username) => {
                    let link = chat_link(username);
                    self.record_chat(user_id, ChatLookup::Opened(username.to_owned()));
                    return vec![DashboardEvent::OpenLink(link)];
                }
                None => NO_CHAT_HANDLE_MESSAGE,
            },
            Err(_) => CHAT_LOOKUP_FAILED_MESSAGE,
        };

        self.record_chat(user_id.clone(), ChatLookup::Failed(failure.to_owned()));
        vec![DashboardEvent::ChatFailed {
            user_id,
            message: failure.to_owned(),
        }]
    }

    /// A lookup that outlives its lead (pruned by a refresh) leaves no entry.
    fn record_chat(&mut self, user_id: UserId, lookup: ChatLookup) {
        let tracked = self.chat.contains_key(&user_id)
            || self.leads.iter().any(|lead| lead.user_id == user_id);
        if tracked {
            self.chat.insert(user_id, lookup);
        }
    }
}
