//! # Result Pipeline
//!
//! Every stage of a fetch produces a `FetchResult<T>`. Stages are chained with
//! the std operators (`map`, `map_err`, `and_then`) plus the extras in
//! [`Pipeline`]:
//!
//! ```text
//! Ok(raw) ─▶ flat_map_optional_or(extract) ─▶ flat_map_optional(decode) ─▶ on_success / on_failure
//! Err(e)  ─────────────── passes through every stage unchanged ──────────▶ on_failure
//! ```
//!
//! A failure is never turned back into a success. Stages either forward the
//! existing cause or replace an absent value with a freshly built cause.

use thiserror::Error;

use super::transport::TransportError;

/// Why a fetch did not produce a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The exchange itself failed (bad URL, network, status, body encoding).
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    /// The response key path did not resolve inside the payload.
    #[error("no value at key path '{path}'")]
    Extraction { path: String },
    /// A transform step returned nothing for data that was present.
    #[error("transform json data error: {0}")]
    Transform(String),
    /// Anything that doesn't fit the categories above.
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl FetchError {
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_))
    }

    pub fn is_extraction(&self) -> bool {
        matches!(self, FetchError::Extraction { .. })
    }

    pub fn is_transform(&self) -> bool {
        matches!(self, FetchError::Transform(_))
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Pipeline operators that `Result` doesn't provide out of the box.
pub trait Pipeline<T>: Sized {
    /// Runs `f` on a success; an absent output becomes `FetchError::Transform`.
    fn flat_map_optional<U, F>(self, f: F) -> FetchResult<U>
    where
        F: FnOnce(T) -> Option<U>;

    /// Like [`flat_map_optional`](Pipeline::flat_map_optional), but the caller
    /// builds the failure for an absent output.
    fn flat_map_optional_or<U, F, E>(self, f: F, err: E) -> FetchResult<U>
    where
        F: FnOnce(T) -> Option<U>,
        E: FnOnce() -> FetchError;

    /// Runs `f` on a success and returns whatever it returns, so a later stage
    /// can introduce its own failure.
    fn flat_map_result<U, F>(self, f: F) -> FetchResult<U>
    where
        F: FnOnce(T) -> FetchResult<U>;

    /// Terminal consumer for the success value. Fires only on `Ok`.
    fn on_success<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&T);

    /// Terminal consumer for the failure cause. Fires only on `Err`.
    fn on_failure<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&FetchError);
}

impl<T> Pipeline<T> for FetchResult<T> {
    fn flat_map_optional<U, F>(self, f: F) -> FetchResult<U>
    where
        F: FnOnce(T) -> Option<U>,
    {
        self.flat_map_optional_or(f, || {
            FetchError::Transform("transform returned no value".to_string())
        })
    }

    fn flat_map_optional_or<U, F, E>(self, f: F, err: E) -> FetchResult<U>
    where
        F: FnOnce(T) -> Option<U>,
        E: FnOnce() -> FetchError,
    {
        match self {
            Ok(value) => f(value).ok_or_else(err),
            Err(e) => Err(e),
        }
    }

    fn flat_map_result<U, F>(self, f: F) -> FetchResult<U>
    where
        F: FnOnce(T) -> FetchResult<U>,
    {
        self.and_then(f)
    }

    fn on_success<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&T),
    {
        if let Ok(value) = self {
            f(value);
        }
        self
    }

    fn on_failure<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&FetchError),
    {
        if let Err(e) = self {
            f(e);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn network_failure() -> FetchError {
        FetchError::Transport(TransportError::Network("connection refused".to_string()))
    }

    #[test]
    fn test_map_preserves_failure_cause() {
        let failed: FetchResult<i32> = Err(network_failure());
        assert_eq!(failed.map(|v| v * 2), Err(network_failure()));
    }

    #[test]
    fn test_map_keeps_success_a_success() {
        let ok: FetchResult<i32> = Ok(21);
        assert_eq!(ok.map(|v| v * 2), Ok(42));
    }

    #[test]
    fn test_flat_map_optional_absent_becomes_transform_error() {
        let ok: FetchResult<i32> = Ok(1);
        let out = ok.flat_map_optional(|_| None::<i32>);
        assert!(matches!(out, Err(FetchError::Transform(_))));
    }

    #[test]
    fn test_flat_map_optional_present_unwraps() {
        let ok: FetchResult<&str> = Ok("7");
        let out = ok.flat_map_optional(|s| s.parse::<u8>().ok());
        assert_eq!(out, Ok(7));
    }

    #[test]
    fn test_flat_map_optional_is_idempotent_on_failure() {
        let ok: FetchResult<i32> = Ok(1);
        let once = ok.flat_map_optional(|_| None::<i32>);
        let twice = once.clone().flat_map_optional(|_| None::<i32>);
        assert_eq!(once, twice);

        let failed: FetchResult<i32> = Err(network_failure());
        let out = failed.flat_map_optional(|_| None::<i32>);
        assert_eq!(out, Err(network_failure()));
    }

    #[test]
    fn test_flat_map_optional_or_uses_caller_cause() {
        let ok: FetchResult<i32> = Ok(1);
        let out = ok.flat_map_optional_or(
            |_| None::<i32>,
            || FetchError::Extraction { path: "a.b".to_string() },
        );
        assert_eq!(out, Err(FetchError::Extraction { path: "a.b".to_string() }));
    }

    #[test]
    fn test_flat_map_result_can_introduce_new_failure() {
        let ok: FetchResult<i32> = Ok(-1);
        let out = ok.flat_map_result(|v| {
            if v < 0 {
                Err(FetchError::Unknown("negative".to_string()))
            } else {
                Ok(v)
            }
        });
        assert_eq!(out, Err(FetchError::Unknown("negative".to_string())));
    }

    #[test]
    fn test_failure_is_absorbing() {
        let failed: FetchResult<i32> = Err(network_failure());
        let out = failed
            .map(|v| v + 1)
            .flat_map_optional(|v| Some(v.to_string()))
            .flat_map_result(|s| Ok(s.len()));
        assert_eq!(out, Err(network_failure()));
    }

    #[test]
    fn test_map_err_translates_cause() {
        let failed: FetchResult<i32> = Err(network_failure());
        let out = failed.map_err(|e| FetchError::Unknown(e.to_string()));
        assert!(matches!(out, Err(FetchError::Unknown(msg)) if msg.contains("connection refused")));

        let ok: FetchResult<i32> = Ok(3);
        assert_eq!(ok.map_err(|_| FetchError::Unknown(String::new())), Ok(3));
    }

    #[test]
    fn test_only_matching_consumer_fires() {
        let successes = Cell::new(0);
        let failures = Cell::new(0);

        let ok: FetchResult<i32> = Ok(5);
        ok.on_success(|_| successes.set(successes.get() + 1))
            .on_failure(|_| failures.set(failures.get() + 1));

        let failed: FetchResult<i32> = Err(network_failure());
        failed
            .on_success(|_| successes.set(successes.get() + 1))
            .on_failure(|_| failures.set(failures.get() + 1));

        assert_eq!(successes.get(), 1);
        assert_eq!(failures.get(), 1);
    }
}
