// 🔁 Ordered fallback - try candidates in order, keep the first success
//
// Shared by encoding detection and delimiter detection: both are "here is a
// ranked list of guesses, give me the first one that works".

/// One failed candidate and why it was rejected
#[derive(Debug, Clone, PartialEq)]
pub struct FailedAttempt<S, E> {
    pub candidate: S,
    pub error: E,
}

/// Run `attempt` on each candidate in order.
///
/// Returns the winning candidate with its output, or every failure in the
/// order they were tried.
pub fn first_success<S, T, E, F>(
    candidates: impl IntoIterator<Item = S>,
    mut attempt: F,
) -> Result<(S, T), Vec<FailedAttempt<S, E>>>
where
    S: Clone,
    F: FnMut(&S) -> Result<T, E>,
{
    let mut failures = Vec::new();

    for candidate in candidates {
        match attempt(&candidate) {
            Ok(output) => return Ok((candidate, output)),
            Err(error) => failures.push(FailedAttempt { candidate, error }),
        }
    }

    Err(failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_success_stops_at_winner() {
        let mut tried = Vec::new();
        let result = first_success([1, 2, 3, 4], |n| {
            tried.push(*n);
            if *n >= 2 {
                Ok(n * 10)
            } else {
                Err("too small")
            }
        });

        assert_eq!(result, Ok((2, 20)));
        assert_eq!(tried, vec![1, 2]);
    }

    #[test]
    fn test_all_failures_reported_in_order() {
        let result: Result<(char, ()), _> = first_success([',', ';'], |c| Err(format!("{} failed", c)));

        let failures = result.unwrap_err();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].candidate, ',');
        assert_eq!(failures[1].error, "; failed");
    }

    #[test]
    fn test_empty_candidate_list() {
        let result: Result<(u8, u8), Vec<FailedAttempt<u8, ()>>> = first_success(Vec::new(), |_| Ok(0));
        assert!(result.unwrap_err().is_empty());
    }
}
