use crate::backend::Backend;
use crate::config::schema::VerificationConfig;
use lodestar_common::protocol::{LocatorStrategy, MatchedElement};
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, sleep, timeout};
use tracing::debug;

/// Why a strategy attempt was not accepted. Never surfaced to callers; the
/// waterfall moves on to the next attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no element matched")]
    NoMatch,
    #[error("{live} of {total} matches are visible and enabled")]
    Ambiguous { live: usize, total: usize },
    #[error("probe failed: {0}")]
    ProbeFailed(String),
}

pub struct Verifier<'a> {
    config: &'a VerificationConfig,
}

impl<'a> Verifier<'a> {
    pub fn new(config: &'a VerificationConfig) -> Self {
        Self { config }
    }

    /// Accept the strategy only if exactly one live match is visible and
    /// enabled. Waits up to `wait_ms` for matches to appear; no retries
    /// once they have.
    pub async fn verify(
        &self,
        backend: &mut dyn Backend,
        strategy: &LocatorStrategy,
    ) -> Result<(), Rejection> {
        let selector = strategy.selector();
        let deadline = Instant::now() + Duration::from_millis(self.config.wait_ms);
        let probe_timeout = Duration::from_millis(self.config.probe_timeout_ms);

        let matches = loop {
            let matches = match timeout(probe_timeout, backend.find_all(&selector)).await {
                Ok(Ok(matches)) => matches,
                Ok(Err(e)) => return Err(self.reject(strategy, Rejection::ProbeFailed(e.to_string()))),
                Err(_) => {
                    return Err(self.reject(
                        strategy,
                        Rejection::ProbeFailed(format!(
                            "timed out after {}ms",
                            self.config.probe_timeout_ms
                        )),
                    ));
                }
            };
            if !matches.is_empty() || Instant::now() >= deadline {
                break matches;
            }
            sleep(Duration::from_millis(self.config.poll_interval_ms.max(1))).await;
        };

        match judge(&matches) {
            Ok(()) => {
                debug!("Accepted {} ({})", strategy, selector);
                Ok(())
            }
            Err(rejection) => Err(self.reject(strategy, rejection)),
        }
    }

    fn reject(&self, strategy: &LocatorStrategy, rejection: Rejection) -> Rejection {
        debug!("Rejected {}: {}", strategy, rejection);
        rejection
    }
}

/// Exactly one visible and enabled element is required.
pub fn judge(matches: &[MatchedElement]) -> Result<(), Rejection> {
    if matches.is_empty() {
        return Err(Rejection::NoMatch);
    }
    let live = matches.iter().filter(|m| m.is_interactable()).count();
    if live == 1 {
        Ok(())
    } else {
        Err(Rejection::Ambiguous {
            live,
            total: matches.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIVE: MatchedElement = MatchedElement {
        visible: true,
        enabled: true,
    };
    const HIDDEN: MatchedElement = MatchedElement {
        visible: false,
        enabled: true,
    };
    const DISABLED: MatchedElement = MatchedElement {
        visible: true,
        enabled: false,
    };

    #[test]
    fn test_judge() {
        assert_eq!(judge(&[]), Err(Rejection::NoMatch));
        assert_eq!(judge(&[LIVE]), Ok(()));
        assert_eq!(judge(&[LIVE, HIDDEN, DISABLED]), Ok(()));
        assert_eq!(
            judge(&[LIVE, LIVE]),
            Err(Rejection::Ambiguous { live: 2, total: 2 })
        );
        assert_eq!(
            judge(&[HIDDEN]),
            Err(Rejection::Ambiguous { live: 0, total: 1 })
        );
    }
}
