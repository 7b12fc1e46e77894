//! Concurrent per-type requests.

use crate::models::media::{MediaType, TypeFailure};
use crate::{Error, Result};
use futures::future::join_all;
use std::future::Future;

/// Outcome of a fan-out over every media type.
#[derive(Debug)]
pub struct FanOut<T> {
    /// Successful results, in [`MediaType::ALL`] order.
    pub successes: Vec<(MediaType, T)>,
    pub failures: Vec<TypeFailure>,
}

/// Run `request` for every media type concurrently and wait for all of them.
///
/// A failing type does not cancel the others; it is reported in
/// `failures`. Only when every type fails is the first error returned.
pub async fn fan_out<T, F, Fut>(operation: &str, request: F) -> Result<FanOut<T>>
where
    F: Fn(MediaType) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let outcomes = join_all(MediaType::ALL.iter().map(|&t| request(t))).await;

    let mut successes = Vec::new();
    let mut failures = Vec::new();
    let mut first_error: Option<Error> = None;

    for (media_type, outcome) in MediaType::ALL.iter().copied().zip(outcomes) {
        match outcome {
            Ok(value) => successes.push((media_type, value)),
            Err(e) => {
                tracing::warn!("{} failed for {}: {}", operation, media_type, e);
                failures.push(TypeFailure {
                    media_type,
                    message: e.to_string(),
                });
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if successes.is_empty() => Err(e),
        _ => Ok(FanOut {
            successes,
            failures,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_partial_failure_keeps_successes() {
        let outcome = fan_out("count", |t| async move {
            match t {
                MediaType::Tv => Err(Error::from_status("/tv/all", 500)),
                other => Ok(other.as_str().len()),
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome.successes.len(), 5);
        assert_eq!(outcome.successes[0].0, MediaType::Movie);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].media_type, MediaType::Tv);
    }

    #[tokio::test]
    async fn test_total_failure_returns_first_error() {
        let result: Result<FanOut<()>> = fan_out("list", |t| async move {
            Err(Error::other(format!("{} down", t)))
        })
        .await;

        match result {
            Err(Error::Other(message)) => assert_eq!(message, "movie down"),
            other => panic!("Expected first error, got {:?}", other),
        }
    }
}
