//! Execution dispatcher.
//!
//! Hands a finalized [`Statement`] to the session collaborator and times the
//! call. Collaborator failures are returned unchanged; nothing is retried.

use std::time::{Duration, Instant};

use fluentdb_core::{Error, RawResult, Result, Session, SessionError, Statement};

use crate::stage::StatementKind;

/// Collaborator output plus the time it took.
#[derive(Debug)]
pub(crate) struct Dispatched {
    pub raw: RawResult,
    pub elapsed: Duration,
}

/// Run `statement` on `session`.
pub(crate) fn execute(
    session: &dyn Session,
    kind: StatementKind,
    function: &str,
    statement: &Statement,
) -> Result<Dispatched> {
    if !session.is_open() {
        return Err(Error::illegal_state(function, "session is closed"));
    }

    let target = statement
        .target()
        .map(|t| t.to_string())
        .unwrap_or_default();
    let start = Instant::now();
    let outcome = session.run_statement(statement);
    let elapsed = start.elapsed();

    match outcome {
        Ok(raw) => {
            tracing::debug!(
                target: "fluentdb::dispatch",
                kind = %kind,
                target_object = %target,
                affected = raw.affected_items,
                elapsed_us = elapsed.as_micros() as u64,
                "Statement executed"
            );
            Ok(Dispatched { raw, elapsed })
        }
        Err(e) => {
            tracing::warn!(
                target: "fluentdb::dispatch",
                kind = %kind,
                target_object = %target,
                code = e.code,
                error = %e,
                "Statement failed"
            );
            Err(Error::Session(e))
        }
    }
}

/// Run an administrative command that has no statement form.
pub(crate) fn admin<F>(
    session: &dyn Session,
    kind: StatementKind,
    function: &str,
    target: &str,
    command: F,
) -> Result<Duration>
where
    F: FnOnce(&dyn Session) -> std::result::Result<(), SessionError>,
{
    if !session.is_open() {
        return Err(Error::illegal_state(function, "session is closed"));
    }

    let start = Instant::now();
    let outcome = command(session);
    let elapsed = start.elapsed();

    match outcome {
        Ok(()) => {
            tracing::debug!(
                target: "fluentdb::dispatch",
                kind = %kind,
                target_object = %target,
                elapsed_us = elapsed.as_micros() as u64,
                "Admin command executed"
            );
            Ok(elapsed)
        }
        Err(e) => {
            tracing::warn!(
                target: "fluentdb::dispatch",
                kind = %kind,
                target_object = %target,
                code = e.code,
                error = %e,
                "Admin command failed"
            );
            Err(Error::Session(e))
        }
    }
}
