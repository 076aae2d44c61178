use std::future::Future;
use std::time::{SystemTime, UNIX_EPOCH};

use ethers::types::H256;

/// Runs `operation` over `candidates` in order and returns the first success
/// together with the candidate that produced it. Later candidates are never
/// attempted once one succeeds.
pub async fn first_success<I, C, F, Fut, T, E>(candidates: I, mut operation: F) -> Option<(C, T)>
where
    I: IntoIterator<Item = C>,
    C: Clone,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    for candidate in candidates {
        if let Ok(value) = operation(candidate.clone()).await {
            return Some((candidate, value));
        }
    }
    None
}

/// Seconds since the unix epoch; zero if the clock is before the epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// An all-zero merkle root means no proof is required.
pub fn requires_proof(root: &H256) -> bool {
    !root.is_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_first_success_stops_at_first_ok() {
        let attempts = Cell::new(0);
        let result = first_success(["a", "b", "c"], |name| {
            attempts.set(attempts.get() + 1);
            async move {
                if name == "b" {
                    Ok(2u32)
                } else {
                    Err(())
                }
            }
        })
        .await;

        assert_eq!(result, Some(("b", 2)));
        assert_eq!(attempts.get(), 2);
    }

    #[tokio::test]
    async fn test_first_success_none_when_all_fail() {
        let result: Option<(u8, ())> = first_success([1u8, 2], |_| async { Err::<(), ()>(()) }).await;
        assert!(result.is_none());
    }

    #[test]
    fn test_requires_proof() {
        assert!(!requires_proof(&H256::zero()));
        assert!(requires_proof(&H256::repeat_byte(1)));
    }
}
