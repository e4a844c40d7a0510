//! In-memory browser used by tests.
//!
//! A [`FakeSession`] holds a list of pages; each page holds elements keyed
//! by locator text. Elements can appear only after a number of lookups, and
//! clicking an element with a target page switches the current page.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{BrowserSession, SessionFactory};
use crate::config::{ScrapeConfig, WaitLocator};
use crate::error::{DriverError, SetupError};

#[derive(Debug, Clone)]
pub(crate) struct FakeNode {
    pub visible: bool,
    pub enabled: bool,
    /// Number of lookups that miss before the element shows up.
    pub appears_after: usize,
    /// Page shown after clicking this element.
    pub target: Option<usize>,
}

impl FakeNode {
    pub fn clickable() -> Self {
        Self {
            visible: true,
            enabled: true,
            appears_after: 0,
            target: None,
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::clickable()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::clickable()
        }
    }

    pub fn after(mut self, lookups: usize) -> Self {
        self.appears_after = lookups;
        self
    }

    pub fn leads_to(mut self, page: usize) -> Self {
        self.target = Some(page);
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakePage {
    pub html: String,
    pub nodes: HashMap<String, FakeNode>,
}

impl FakePage {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            nodes: HashMap::new(),
        }
    }

    pub fn with_node(mut self, locator_text: &str, node: FakeNode) -> Self {
        self.nodes.insert(locator_text.to_string(), node);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FakeElement {
    pub page: usize,
    pub locator_text: String,
}

#[derive(Debug, Default)]
struct FakeState {
    pages: Vec<FakePage>,
    current: usize,
    lookups: HashMap<(usize, String), usize>,
    navigations: Vec<String>,
    clicks: usize,
    page_load_timeout: Option<Duration>,
}

pub(crate) struct FakeSession {
    state: Mutex<FakeState>,
    fail_navigation: bool,
    fail_click: bool,
}

impl FakeSession {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                pages,
                ..FakeState::default()
            }),
            fail_navigation: false,
            fail_click: false,
        }
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn failing_click(mut self) -> Self {
        self.fail_click = true;
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    pub fn clicks(&self) -> usize {
        self.lock().clicks
    }

    pub fn page_load_timeout(&self) -> Option<Duration> {
        self.lock().page_load_timeout
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn node(&self, element: &FakeElement) -> Option<FakeNode> {
        let state = self.lock();
        state
            .pages
            .get(element.page)
            .and_then(|p| p.nodes.get(&element.locator_text))
            .cloned()
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        if self.fail_navigation {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        let mut state = self.lock();
        state.navigations.push(url.to_string());
        state.current = 0;
        Ok(())
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        let state = self.lock();
        Ok(state
            .pages
            .get(state.current)
            .map(|p| p.html.clone())
            .unwrap_or_default())
    }

    async fn find_element(&self, locator: &WaitLocator) -> Option<FakeElement> {
        let mut state = self.lock();
        let page = state.current;
        let node = state.pages.get(page)?.nodes.get(locator.text())?.clone();

        let seen = state
            .lookups
            .entry((page, locator.text().to_string()))
            .or_insert(0);
        *seen += 1;
        if *seen <= node.appears_after {
            return None;
        }

        Some(FakeElement {
            page,
            locator_text: locator.text().to_string(),
        })
    }

    async fn is_visible(&self, element: &FakeElement) -> bool {
        self.node(element).map(|n| n.visible).unwrap_or(false)
    }

    async fn is_enabled(&self, element: &FakeElement) -> bool {
        self.node(element).map(|n| n.enabled).unwrap_or(false)
    }

    async fn click(&self, element: &FakeElement) -> Result<(), DriverError> {
        if self.fail_click {
            return Err(DriverError::Protocol("element is detached".to_string()));
        }
        let target = self.node(element).and_then(|n| n.target);
        let mut state = self.lock();
        state.clicks += 1;
        if let Some(page) = target {
            state.current = page;
        }
        Ok(())
    }

    fn set_page_load_timeout(&self, timeout: Duration) {
        self.lock().page_load_timeout = Some(timeout);
    }
}

/// Factory handing out [`FakeSession`]s and counting open/close calls.
pub(crate) struct FakeFactory {
    pages: Vec<FakePage>,
    fail_navigation: bool,
    fail_open: bool,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl FakeFactory {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            fail_navigation: false,
            fail_open: false,
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn opened_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.opened)
    }

    pub fn closed_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    async fn open(&self, _config: &ScrapeConfig) -> Result<FakeSession, SetupError> {
        if self.fail_open {
            return Err(SetupError::BrowserNotFound);
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        let session = FakeSession::new(self.pages.clone());
        Ok(if self.fail_navigation {
            session.failing_navigation()
        } else {
            session
        })
    }

    async fn close(&self, _session: FakeSession) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
