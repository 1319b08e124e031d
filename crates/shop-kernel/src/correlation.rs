//! # Correlation Context
//!
//! A W3C Trace Context (`traceparent`) carried explicitly across every call boundary. Each
//! service reads the inbound header (or starts a new trace), derives a child span for the
//! work it does, and sends the child's header on every outbound request.
//!
//! Header format: `00-<32 hex trace id>-<16 hex span id>-<2 hex flags>`.

use crate::error::CorrelationError;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// HTTP header carrying the correlation context.
pub const TRACEPARENT_HEADER: &str = "traceparent";

const VERSION: &str = "00";
const SAMPLED: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationContext {
    trace_id: u128,
    span_id: u64,
    parent_span_id: Option<u64>,
    flags: u8,
}

impl CorrelationContext {
    /// Starts a new trace.
    pub fn new_root() -> Self {
        Self {
            trace_id: Uuid::new_v4().as_u128(),
            span_id: new_span_id(),
            parent_span_id: None,
            flags: SAMPLED,
        }
    }

    /// A new span in the same trace, parented on this one.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: new_span_id(),
            parent_span_id: Some(self.span_id),
            flags: self.flags,
        }
    }

    /// Parses an inbound header, falling back to a new root when it is absent or invalid.
    pub fn from_header_or_root(header: Option<&str>) -> Self {
        match header.map(str::parse::<Self>) {
            Some(Ok(remote)) => remote.child(),
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Ignoring inbound traceparent");
                Self::new_root()
            }
            None => Self::new_root(),
        }
    }

    pub fn trace_id(&self) -> String {
        format!("{:032x}", self.trace_id)
    }

    pub fn span_id(&self) -> String {
        format!("{:016x}", self.span_id)
    }

    pub fn parent_span_id(&self) -> Option<String> {
        self.parent_span_id.map(|id| format!("{id:016x}"))
    }

    pub fn to_traceparent(&self) -> String {
        format!(
            "{VERSION}-{:032x}-{:016x}-{:02x}",
            self.trace_id, self.span_id, self.flags
        )
    }
}

impl fmt::Display for CorrelationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_traceparent())
    }
}

impl FromStr for CorrelationContext {
    type Err = CorrelationError;

    fn from_str(header: &str) -> Result<Self, Self::Err> {
        let malformed = || CorrelationError::Malformed(header.to_string());
        let parts: Vec<&str> = header.trim().split('-').collect();
        let [version, trace, span, flags] = parts.as_slice() else {
            return Err(malformed());
        };
        if *version != VERSION {
            return Err(CorrelationError::UnsupportedVersion(version.to_string()));
        }
        if trace.len() != 32 || span.len() != 16 || flags.len() != 2 {
            return Err(malformed());
        }
        let trace_id = u128::from_str_radix(trace, 16).map_err(|_| malformed())?;
        let span_id = u64::from_str_radix(span, 16).map_err(|_| malformed())?;
        let flags = u8::from_str_radix(flags, 16).map_err(|_| malformed())?;
        if trace_id == 0 || span_id == 0 {
            return Err(malformed());
        }
        Ok(Self {
            trace_id,
            span_id,
            parent_span_id: None,
            flags,
        })
    }
}

fn new_span_id() -> u64 {
    // Low half of a v4 uuid; zero is reserved as "invalid" by the header format.
    (Uuid::new_v4().as_u128() as u64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_survives_a_round_trip() {
        let root = CorrelationContext::new_root();
        let parsed: CorrelationContext = root.to_traceparent().parse().unwrap();
        assert_eq!(parsed.trace_id(), root.trace_id());
        assert_eq!(parsed.span_id(), root.span_id());
    }

    #[test]
    fn child_keeps_trace_and_links_parent() {
        let root = CorrelationContext::new_root();
        let child = root.child();
        assert_eq!(child.trace_id(), root.trace_id());
        assert_ne!(child.span_id(), root.span_id());
        assert_eq!(child.parent_span_id(), Some(root.span_id()));
    }

    #[test]
    fn parses_the_reference_header() {
        let ctx: CorrelationContext = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
            .parse()
            .unwrap();
        assert_eq!(ctx.trace_id(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(ctx.span_id(), "00f067aa0ba902b7");
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(matches!(
            "01-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01".parse::<CorrelationContext>(),
            Err(CorrelationError::UnsupportedVersion(_))
        ));
        for bad in [
            "",
            "00-abc-def-01",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
            "00-4bf92f3577b34da6a3ce929d0e0e473z-00f067aa0ba902b7-01",
        ] {
            assert!(
                matches!(bad.parse::<CorrelationContext>(), Err(CorrelationError::Malformed(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn invalid_inbound_header_starts_a_new_trace() {
        let ctx = CorrelationContext::from_header_or_root(Some("garbage"));
        assert!(ctx.parent_span_id().is_none());

        let remote = CorrelationContext::new_root();
        let header = remote.to_traceparent();
        let ctx = CorrelationContext::from_header_or_root(Some(&header));
        assert_eq!(ctx.trace_id(), remote.trace_id());
        assert_eq!(ctx.parent_span_id(), Some(remote.span_id()));
    }
}
