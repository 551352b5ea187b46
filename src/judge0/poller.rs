use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{ExecutionResult, ExecutionService, Token};
use crate::error::PollError;

/// Waits until every token in the batch reaches a terminal state.
///
/// All tokens are re-queried together each cycle, so one slow execution
/// delays reporting of the whole batch: the verdict must reflect all test
/// cases or none. Results come back in token order regardless of the order
/// the service answers in.
///
/// The loop sleeps `interval` between cycles and gives up once `deadline`
/// has elapsed, returning whichever terminal results exist at that point.
/// A fired `cancel` token stops polling immediately; the remote executions
/// keep running on the service side.
pub async fn await_batch(
    service: &dyn ExecutionService,
    tokens: &[Token],
    interval: Duration,
    deadline: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<ExecutionResult>, PollError> {
    let give_up = Instant::now() + deadline;
    let mut latest: HashMap<Token, ExecutionResult> = HashMap::with_capacity(tokens.len());

    loop {
        match service.fetch_batch(tokens).await {
            Ok(results) => {
                for result in results {
                    latest.insert(result.token.clone(), result);
                }

                // Done only when the whole set is terminal.
                let done: Option<Vec<ExecutionResult>> = tokens
                    .iter()
                    .map(|t| latest.get(t).filter(|r| r.is_terminal()).cloned())
                    .collect();
                if let Some(results) = done {
                    return Ok(results);
                }
            }
            Err(e) => {
                // Transient failure; the next cycle retries unless the
                // deadline hits first.
                log::warn!("Failed to query the execution service, will retry: {e}");
            }
        }

        let now = Instant::now();
        if now >= give_up {
            let partial = tokens
                .iter()
                .map(|t| latest.get(t).filter(|r| r.is_terminal()).cloned())
                .collect();
            return Err(PollError::DeadlineElapsed { partial });
        }

        let sleep_for = interval.min(give_up - now);
        tokio::select! {
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            _ = tokio::time::sleep(sleep_for) => {}
        }
    }
}
