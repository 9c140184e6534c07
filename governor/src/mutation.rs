//! Bounded policy-violation retry around platform writes.
//!
//! Every write goes out as given. If the platform rejects it for policy
//! reasons, the reported topics (and only those) are marked ignorable and the
//! write is retried exactly once. Anything else is returned untouched.

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::io::platform::{
    Mutation, MutationOutcome, Mutator, PlatformError, PolicyExemption, RetryableOperation,
};

#[derive(Debug, Error)]
pub enum MutationError {
    /// The exempted retry was rejected as well. Never retried further.
    #[error("{mutation} still rejected after exempting policy topics [{}]", topics.join(", "))]
    PolicyViolationPersisted {
        mutation: Mutation,
        topics: Vec<String>,
        #[source]
        source: PlatformError,
    },
    /// The first attempt failed for a reason other than policy.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Issues writes through a [`Mutator`] with at most one exempted retry.
pub struct MutationRetryGovernor<'a, M: Mutator + ?Sized> {
    mutator: &'a M,
}

impl<'a, M: Mutator + ?Sized> MutationRetryGovernor<'a, M> {
    pub fn new(mutator: &'a M) -> Self {
        Self { mutator }
    }

    /// Execute `mutation`, making at most two platform calls.
    #[instrument(skip_all, fields(mutation = %mutation))]
    pub fn execute(&self, mutation: Mutation) -> Result<MutationOutcome, MutationError> {
        let operation = RetryableOperation::new(mutation);
        let first_failure = match self.mutator.execute(&operation) {
            Ok(outcome) => {
                debug!(resource = %outcome.resource_name, "mutation accepted");
                return Ok(outcome);
            }
            Err(err) => err,
        };

        let topics = first_failure.policy_topics().to_vec();
        if topics.is_empty() {
            warn!(error = %first_failure, "mutation failed");
            return Err(MutationError::Platform(first_failure));
        }

        info!(?topics, "policy violation, retrying with exemption");
        let retry = operation.with_exemption(PolicyExemption {
            ignorable_policy_topics: topics.clone(),
        });
        match self.mutator.execute(&retry) {
            Ok(outcome) => {
                info!(resource = %outcome.resource_name, "exempted retry accepted");
                Ok(outcome)
            }
            Err(source) => {
                warn!(error = %source, "exempted retry rejected");
                Err(MutationError::PolicyViolationPersisted {
                    mutation: retry.mutation,
                    topics,
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedPlatform, policy_error};

    fn pause_ad() -> Mutation {
        Mutation::PauseAd {
            resource_name: "customers/1/adGroupAds/2~3".to_string(),
        }
    }

    fn accepted() -> MutationOutcome {
        MutationOutcome {
            resource_name: "customers/1/adGroupAds/2~3".to_string(),
        }
    }

    #[test]
    fn success_makes_one_call() {
        let platform = ScriptedPlatform::new().with_mutation_results(vec![Ok(accepted())]);

        let outcome = MutationRetryGovernor::new(&platform)
            .execute(pause_ad())
            .expect("mutation");

        assert_eq!(outcome, accepted());
        assert_eq!(platform.mutation_calls().len(), 1);
    }

    /// First call is rejected on policy grounds, the exempted retry goes through.
    #[test]
    fn policy_violation_retries_once_with_exact_topics() {
        let platform = ScriptedPlatform::new().with_mutation_results(vec![
            Err(policy_error(&["TRADEMARKS", "HEALTH_CLAIMS"])),
            Ok(accepted()),
        ]);

        let outcome = MutationRetryGovernor::new(&platform)
            .execute(pause_ad())
            .expect("mutation");
        assert_eq!(outcome, accepted());

        let calls = platform.mutation_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].exemption, None);
        assert_eq!(
            calls[1].exemption,
            Some(PolicyExemption {
                ignorable_policy_topics: vec!["TRADEMARKS".to_string(), "HEALTH_CLAIMS".to_string()],
            })
        );
        assert_eq!(calls[1].mutation, pause_ad());
    }

    #[test]
    fn failed_retry_surfaces_terminal_error() {
        let platform = ScriptedPlatform::new().with_mutation_results(vec![
            Err(policy_error(&["TRADEMARKS"])),
            Err(policy_error(&["TRADEMARKS", "DESTINATION_MISMATCH"])),
            Ok(accepted()),
        ]);

        let err = MutationRetryGovernor::new(&platform)
            .execute(pause_ad())
            .unwrap_err();

        match err {
            MutationError::PolicyViolationPersisted {
                mutation,
                topics,
                source,
            } => {
                assert_eq!(mutation, pause_ad());
                assert_eq!(topics, vec!["TRADEMARKS"]);
                assert_eq!(
                    source.policy_topics(),
                    ["TRADEMARKS", "DESTINATION_MISMATCH"]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let calls = platform.mutation_calls();
        assert_eq!(calls.len(), 2);
        // The second failure's extra topic never widens the exemption.
        assert_eq!(
            calls[1].exemption.as_ref().map(|e| e.ignorable_policy_topics.clone()),
            Some(vec!["TRADEMARKS".to_string()])
        );
    }

    #[test]
    fn non_policy_failure_propagates_without_retry() {
        let rejection = PlatformError::Rejected("RESOURCE_EXHAUSTED".to_string());
        let platform =
            ScriptedPlatform::new().with_mutation_results(vec![Err(rejection.clone()), Ok(accepted())]);

        let err = MutationRetryGovernor::new(&platform)
            .execute(pause_ad())
            .unwrap_err();

        assert!(matches!(err, MutationError::Platform(ref inner) if *inner == rejection));
        assert_eq!(err.to_string(), rejection.to_string());
        assert_eq!(platform.mutation_calls().len(), 1);
    }

    #[test]
    fn policy_finding_without_topics_is_not_retried() {
        let platform = ScriptedPlatform::new().with_mutation_results(vec![
            Err(policy_error(&[])),
            Ok(accepted()),
        ]);

        let err = MutationRetryGovernor::new(&platform)
            .execute(pause_ad())
            .unwrap_err();

        assert!(matches!(err, MutationError::Platform(_)));
        assert_eq!(platform.mutation_calls().len(), 1);
    }
}
