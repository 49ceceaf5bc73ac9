// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured logging of coordinator activity.

use std::time::Duration;

use readthru_store::QueryKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Get,
    Invalidate,
}

impl Operation {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Get => "readthru.get",
            Self::Invalidate => "readthru.invalidate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Activity {
    Hit,
    Miss,
    Coalesced,
    Computed,
    Inserted,
    Invalidated,
    Detached,
    StoreError,
    CodecError,
    ComputeFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
    Debug,
    Info,
    Warn,
}

impl Activity {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::Miss => "cache.miss",
            Self::Coalesced => "cache.coalesced",
            Self::Computed => "cache.computed",
            Self::Inserted => "cache.inserted",
            Self::Invalidated => "cache.invalidated",
            Self::Detached => "cache.detached",
            Self::StoreError => "cache.store_error",
            Self::CodecError => "cache.codec_error",
            Self::ComputeFailed => "cache.compute_failed",
        }
    }

    pub(crate) fn severity(self) -> Severity {
        match self {
            Self::Hit | Self::Miss | Self::Coalesced | Self::Inserted => Severity::Debug,
            Self::Computed | Self::Invalidated | Self::Detached => Severity::Info,
            Self::StoreError | Self::CodecError | Self::ComputeFailed => Severity::Warn,
        }
    }
}

/// Emits one activity event.
///
/// Field names are part of the log contract; see `field_names_are_stable`.
pub(crate) fn emit(
    cache_name: &str,
    operation: Operation,
    activity: Activity,
    key: &QueryKey,
    duration: Option<Duration>,
    detail: Option<&dyn std::fmt::Display>,
) {
    let op = operation.as_str();
    let ev = activity.as_str();
    let key = key.as_str();
    let duration_ns = duration.map(|d| d.as_nanos());

    // Tracing level must be constant, so a macro selects the level.
    macro_rules! emit_event {
        ($level:ident) => {
            match detail {
                Some(detail) => tracing::$level!(
                    cache.name = cache_name,
                    cache.operation = op,
                    cache.activity = ev,
                    cache.key = key,
                    cache.duration_ns = ?duration_ns,
                    error = %detail,
                    "cache.event"
                ),
                None => tracing::$level!(
                    cache.name = cache_name,
                    cache.operation = op,
                    cache.activity = ev,
                    cache.key = key,
                    cache.duration_ns = ?duration_ns,
                    "cache.event"
                ),
            }
        };
    }

    match activity.severity() {
        Severity::Debug => emit_event!(debug),
        Severity::Info => emit_event!(info),
        Severity::Warn => emit_event!(warn),
    }
}
