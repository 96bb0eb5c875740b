// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use thiserror::Error;

use crate::ids::UserId;
use crate::model::{ChatHandle, LeadRecord};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";
pub const LEADS_ENDPOINT: &str = "/webhook/get-leads";
pub const CHAT_ENDPOINT: &str = "/webhook/get-chat";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend returned HTTP {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },
    #[error("cannot reach backend: {0}")]
    Transport(String),
    #[error("decode backend response: {0}")]
    Parse(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(text) => format!(": {text}"),
        None => String::new(),
    }
}

/// The two webhook calls the dashboard depends on.
pub trait LeadBackend {
    fn base_url(&self) -> &str;
    fn list_leads(&self) -> Result<Vec<LeadRecord>, BackendError>;
    fn resolve_chat_handle(&self, user_id: &UserId) -> Result<ChatHandle, BackendError>;

    fn leads_url(&self) -> String {
        format!("{}{LEADS_ENDPOINT}", self.base_url())
    }
}

impl<B: LeadBackend + ?Sized> LeadBackend for &B {
    fn base_url(&self) -> &str {
        (**self).base_url()
    }

    fn list_leads(&self) -> Result<Vec<LeadRecord>, BackendError> {
        (**self).list_leads()
    }

    fn resolve_chat_handle(&self, user_id: &UserId) -> Result<ChatHandle, BackendError> {
        (**self).resolve_chat_handle(user_id)
    }
}

/// Hands a URL to whatever opens links on this machine.
pub trait LinkOpener {
    fn open_link(&mut self, url: &str) -> Result<()>;
}
