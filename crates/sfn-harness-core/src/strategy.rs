//! "First success wins" over an ordered sequence of fallible attempts.

use std::future::Future;

/// Try `attempt` on each candidate in order and return the first success.
///
/// No candidate after the first success is attempted. On exhaustion every
/// error is returned in attempt order, so `errors.len()` is the number of
/// attempts made.
pub async fn first_success<I, C, F, Fut, T, E>(
    candidates: I,
    mut attempt: F,
) -> Result<T, Vec<E>>
where
    I: IntoIterator<Item = C>,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut errors = Vec::new();
    for candidate in candidates {
        match attempt(candidate).await {
            Ok(value) => return Ok(value),
            Err(e) => errors.push(e),
        }
    }
    Err(errors)
}
