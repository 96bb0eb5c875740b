// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, warn};

use crate::backend::{LeadBackend, LinkOpener};
use crate::ids::UserId;
use crate::state::{DashboardCommand, DashboardEvent, DashboardState, SortOrder};

/// Drives [`DashboardState`] against a backend synchronously, one request at
/// a time.
pub struct Controller<B> {
    backend: B,
    state: DashboardState,
}

impl<B: LeadBackend> Controller<B> {
    pub fn new(backend: B) -> Self {
        Self::with_sort_order(backend, SortOrder::default())
    }

    pub fn with_sort_order(backend: B, sort_order: SortOrder) -> Self {
        Self {
            backend,
            state: DashboardState::with_sort_order(sort_order),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn refresh(&mut self) -> Vec<DashboardEvent> {
        let mut events = self.state.dispatch(DashboardCommand::BeginRefresh);
        let token = self.state.latest_refresh();
        let result = self.backend.list_leads();
        match &result {
            Ok(leads) => debug!(count = leads.len(), "leads loaded"),
            Err(error) => warn!(url = %self.backend.leads_url(), %error, "lead fetch failed"),
        }
        events.extend(
            self.state
                .dispatch(DashboardCommand::FinishRefresh { token, result }),
        );
        events
    }

    pub fn toggle_sort_order(&mut self) -> Vec<DashboardEvent> {
        self.state.dispatch(DashboardCommand::ToggleSortOrder)
    }

    /// Looks up the lead's Telegram handle and opens the chat link when one
    /// exists. The outcome lands in that lead's own chat slot.
    pub fn chat_action(
        &mut self,
        user_id: &UserId,
        opener: &mut impl LinkOpener,
    ) -> Vec<DashboardEvent> {
        let mut events = self
            .state
            .dispatch(DashboardCommand::BeginChat(user_id.clone()));
        let result = self.backend.resolve_chat_handle(user_id);
        if let Err(error) = &result {
            warn!(%user_id, %error, "chat handle lookup failed");
        }
        let finished = self.state.dispatch(DashboardCommand::FinishChat {
            user_id: user_id.clone(),
            result,
        });

        let links: Vec<String> = finished
            .iter()
            .filter_map(|event| match event {
                DashboardEvent::OpenLink(url) => Some(url.clone()),
                _ => None,
            })
            .collect();
        events.extend(finished);

        for url in links {
            debug!(%url, "opening chat link");
            if let Err(error) = opener.open_link(&url) {
                events.extend(self.state.dispatch(DashboardCommand::SetStatus(format!(
                    "could not open {url}: {error}"
                ))));
            }
        }
        events
    }
}
