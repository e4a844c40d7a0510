//! Page-readiness conditions evaluated against a live browser session.
//!
//! A [`ScraperWait`] is checked repeatedly by [`poll_until`]. Elements are
//! remembered once found, so a condition satisfied on one tick stays
//! satisfied for the rest of the wait.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::browser::BrowserSession;
use crate::config::{WaitCondition, WaitLogic, WaitType};
use crate::error::{ConfigError, WaitTimeout};

/// Delay between two evaluations.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct ScraperWait<E> {
    conditions: Vec<(String, WaitCondition)>,
    found: Vec<(String, E)>,
    must_have_found: usize,
    optional_found: usize,
    satisfied: bool,
}

/// Check that condition keys are unique.
pub fn validate_conditions(conditions: &[WaitCondition]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for condition in conditions {
        let key = condition.key();
        if !seen.insert(key.clone()) {
            return Err(ConfigError::DuplicateCondition(key));
        }
    }
    Ok(())
}

impl<E> ScraperWait<E> {
    /// Build an evaluator; condition keys must be unique.
    pub fn new(conditions: Vec<WaitCondition>) -> Result<Self, ConfigError> {
        validate_conditions(&conditions)?;
        let keyed = conditions.into_iter().map(|c| (c.key(), c)).collect();

        Ok(Self {
            conditions: keyed,
            found: Vec::new(),
            must_have_found: 0,
            optional_found: 0,
            satisfied: false,
        })
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn must_have_found(&self) -> usize {
        self.must_have_found
    }

    pub fn optional_found(&self) -> usize {
        self.optional_found
    }

    /// Element found for `key`, if any.
    pub fn found(&self, key: &str) -> Option<&E> {
        self.found.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    /// Earliest element found.
    pub fn first_found(&self) -> Option<&E> {
        self.found.first().map(|(_, e)| e)
    }

    /// Keys of found elements in the order they were found.
    pub fn found_keys(&self) -> impl Iterator<Item = &str> {
        self.found.iter().map(|(k, _)| k.as_str())
    }

    /// Result of the last evaluation: the first found element when every
    /// must-have is present and at least one condition matched.
    pub fn check(&self) -> Option<&E> {
        if self.satisfied {
            self.first_found()
        } else {
            None
        }
    }

    /// Evaluate all pending conditions once. Returns whether the set is
    /// satisfied.
    pub async fn tick<S>(&mut self, session: &S) -> bool
    where
        S: BrowserSession<Element = E>,
    {
        let mut must_have_missing = false;

        for (key, condition) in &self.conditions {
            if self.found.iter().any(|(k, _)| k == key) {
                continue;
            }

            match (resolve(session, condition).await, condition.logic) {
                (Some(element), WaitLogic::MustHave) => {
                    debug!("Found required element {}", key);
                    self.must_have_found += 1;
                    self.found.push((key.clone(), element));
                }
                (Some(element), WaitLogic::Optional) => {
                    debug!("Found optional element {}", key);
                    self.optional_found += 1;
                    self.found.push((key.clone(), element));
                }
                (None, WaitLogic::MustHave) => must_have_missing = true,
                (None, WaitLogic::Optional) => {}
            }
        }

        self.satisfied =
            !must_have_missing && (self.must_have_found > 0 || self.optional_found > 0);
        self.satisfied
    }
}

async fn resolve<S: BrowserSession>(session: &S, condition: &WaitCondition) -> Option<S::Element> {
    let element = session.find_element(&condition.locator).await?;
    match condition.wait_type {
        WaitType::Presence => Some(element),
        WaitType::Clickable => {
            if session.is_visible(&element).await && session.is_enabled(&element).await {
                Some(element)
            } else {
                None
            }
        }
    }
}

/// Evaluate `waiter` every `interval` until it is satisfied or `timeout`
/// elapses.
pub async fn poll_until<S: BrowserSession>(
    session: &S,
    waiter: &mut ScraperWait<S::Element>,
    timeout: Duration,
    interval: Duration,
) -> Result<(), WaitTimeout> {
    let started = Instant::now();

    let polling = async {
        loop {
            if waiter.tick(session).await {
                return;
            }
            tokio::time::sleep(interval).await;
        }
    };

    tokio::time::timeout(timeout, polling).await.map_err(|_| {
        let waited_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!("Wait conditions not met after {}ms", waited_ms);
        WaitTimeout { waited_ms }
    })
}
