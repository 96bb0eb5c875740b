// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use leadboard_app::{BackendError, ChatHandle, LeadRecord, LinkOpener, RefreshToken, UserId};
use leadboard_client::Client;
use leadboard_testkit::{LeadFaker, demo_leads};
use leadboard_tui::{AppRuntime, InternalEvent};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;

pub const DEMO_BACKEND_LABEL: &str = "demo (built-in leads)";

/// Opens links with the platform's default handler.
pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn open_link(&mut self, url: &str) -> Result<()> {
        open::that(url).with_context(|| format!("open {url} with the system browser"))
    }
}

/// Talks to the live webhook backend, one worker thread per request.
pub struct ClientRuntime<O> {
    client: Client,
    opener: O,
}

impl<O: LinkOpener> ClientRuntime<O> {
    pub fn new(client: Client, opener: O) -> Self {
        Self { client, opener }
    }
}

impl<O: LinkOpener> AppRuntime for ClientRuntime<O> {
    fn backend_url(&self) -> &str {
        self.client.base_url()
    }

    fn list_leads(&mut self) -> Result<Vec<LeadRecord>, BackendError> {
        self.client.list_leads()
    }

    fn resolve_chat_handle(&mut self, user_id: &UserId) -> Result<ChatHandle, BackendError> {
        self.client.resolve_chat_handle(user_id)
    }

    fn open_link(&mut self, url: &str) -> Result<()> {
        self.opener.open_link(url)
    }

    fn spawn_refresh(&mut self, token: RefreshToken, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name("leadboard-refresh".to_owned())
            .spawn(move || {
                let result = client.list_leads();
                if tx
                    .send(InternalEvent::RefreshFinished { token, result })
                    .is_err()
                {
                    debug!(token = token.get(), "refresh finished after dashboard closed");
                }
            })
            .context("spawn refresh worker")?;
        Ok(())
    }

    fn spawn_chat_lookup(&mut self, user_id: UserId, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name("leadboard-chat".to_owned())
            .spawn(move || {
                let result = client.resolve_chat_handle(&user_id);
                if tx
                    .send(InternalEvent::ChatFinished { user_id, result })
                    .is_err()
                {
                    debug!("chat lookup finished after dashboard closed");
                }
            })
            .context("spawn chat lookup worker")?;
        Ok(())
    }
}

/// Serves the seeded fixture leads; chat handles come from the faker.
pub struct DemoRuntime<O> {
    leads: Vec<LeadRecord>,
    opener: O,
}

impl<O: LinkOpener> DemoRuntime<O> {
    pub fn new(opener: O) -> Self {
        Self {
            leads: demo_leads(),
            opener,
        }
    }
}

impl<O: LinkOpener> AppRuntime for DemoRuntime<O> {
    fn backend_url(&self) -> &str {
        DEMO_BACKEND_LABEL
    }

    fn list_leads(&mut self) -> Result<Vec<LeadRecord>, BackendError> {
        Ok(self.leads.clone())
    }

    fn resolve_chat_handle(&mut self, user_id: &UserId) -> Result<ChatHandle, BackendError> {
        Ok(LeadFaker::chat_handle_for(user_id))
    }

    fn open_link(&mut self, url: &str) -> Result<()> {
        self.opener.open_link(url)
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientRuntime, DEMO_BACKEND_LABEL, DemoRuntime};
    use anyhow::{Result, anyhow};
    use leadboard_app::{LinkOpener, RefreshToken, UserId};
    use leadboard_client::{Client, ClientConfig};
    use leadboard_testkit::{LeadFaker, demo_leads};
    use leadboard_tui::{AppRuntime, InternalEvent};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Header, Response, Server};

    #[derive(Default)]
    struct RecordingOpener {
        opened: Vec<String>,
    }

    impl LinkOpener for RecordingOpener {
        fn open_link(&mut self, url: &str) -> Result<()> {
            self.opened.push(url.to_owned());
            Ok(())
        }
    }

    #[test]
    fn demo_runtime_serves_fixture_leads() -> Result<()> {
        let mut runtime = DemoRuntime::new(RecordingOpener::default());
        assert_eq!(runtime.backend_url(), DEMO_BACKEND_LABEL);
        assert_eq!(runtime.list_leads()?, demo_leads());
        Ok(())
    }

    #[test]
    fn demo_runtime_chat_handles_match_faker() -> Result<()> {
        let mut runtime = DemoRuntime::new(RecordingOpener::default());
        for lead in demo_leads() {
            assert_eq!(
                runtime.resolve_chat_handle(&lead.user_id)?,
                LeadFaker::chat_handle_for(&lead.user_id)
            );
        }
        runtime.open_link("https://t.me/demo")?;
        assert_eq!(runtime.opener.opened, vec!["https://t.me/demo".to_owned()]);
        Ok(())
    }

    #[test]
    fn client_runtime_refresh_reports_back_from_worker() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());
        let client = Client::new(&ClientConfig::new(addr).with_timeout(Duration::from_secs(2)))?;
        let mut runtime = ClientRuntime::new(client, RecordingOpener::default());

        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            let header = Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header");
            let response = Response::from_string(r#"[{"userid":"u1","company":"Acme"}]"#)
                .with_status_code(200)
                .with_header(header);
            request.respond(response).expect("response should succeed");
        });

        let (tx, rx) = mpsc::channel();
        let token = RefreshToken::new(3);
        runtime.spawn_refresh(token, tx)?;

        match rx.recv_timeout(Duration::from_secs(5))? {
            InternalEvent::RefreshFinished {
                token: received,
                result,
            } => {
                assert_eq!(received, token);
                let leads = result?;
                assert_eq!(leads.len(), 1);
                assert_eq!(leads[0].user_id, UserId::from("u1"));
            }
            other => panic!("unexpected event {other:?}"),
        }

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn client_runtime_chat_lookup_reports_transport_errors() -> Result<()> {
        let client = Client::new(
            &ClientConfig::new("http://127.0.0.1:1").with_timeout(Duration::from_millis(200)),
        )?;
        let mut runtime = ClientRuntime::new(client, RecordingOpener::default());

        let (tx, rx) = mpsc::channel();
        runtime.spawn_chat_lookup(UserId::from("u9"), tx)?;

        match rx.recv_timeout(Duration::from_secs(5))? {
            InternalEvent::ChatFinished { user_id, result } => {
                assert_eq!(user_id, UserId::from("u9"));
                assert!(result.is_err());
            }
            other => panic!("unexpected event {other:?}"),
        }
        Ok(())
    }
}
