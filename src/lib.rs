//! Retry-with-backoff execution wrapper for hardening fallible calls, such as
//! database queries issued by request handlers, against transient failures.
//!
//! An operation is invoked up to [`config::RetryConfig::max_attempts`] times
//! (3 by default). After the failed attempt `n` the executor waits
//! `n × delay` (200ms by default, so 200ms then 400ms) and tries again. The
//! first success is returned immediately; if every attempt fails, the error
//! from the final attempt is returned unchanged.
//!
//! # Idempotency
//!
//! The executor re-runs the operation blindly. It must be safe to invoke more
//! than once: a read, an upsert, or a write guarded by an idempotency key.
//! Retrying a plain insert whose first attempt actually reached the database
//! can insert the row twice. Nothing here can check this for you.
//!
//! # Limitations
//!
//! Without a [`retry_condition`](config::RetryConfig::retry_condition) every
//! error is treated as transient, so a permanent failure such as a uniqueness
//! violation burns all attempts before it is surfaced. Only the last error is
//! returned; earlier ones are dropped. Attempts that are already running are
//! never aborted.

/// The `asynchronous` module retries operations that return futures. Backoff
/// pauses suspend the task instead of blocking the thread.
pub mod asynchronous;

/// The `cancellation` module provides the token used to stop a retry loop early.
pub mod cancellation;

/// The `config` module provides [`RetryConfig`](config::RetryConfig): attempt
/// limit, delay unit, strategy, retry condition and jitter.
pub mod config;

/// The `error` module defines the error returned by the cancellable entry points.
pub mod error;

/// The `strategies` module defines how the delay unit is scaled by the attempt
/// number: fixed, linear, exponential or Fibonacci.
pub mod strategies;

/// The `synchronous` module retries blocking operations.
pub mod synchronous;
