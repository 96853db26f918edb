// Inbound connectivity events.
//
// The OS-level notification source is an external collaborator; the link
// manager is a pure consumer of this stream and never shares mutable state
// with the producer.

/// A connectivity change reported by the platform's network monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A usable network path appeared.
    LinkAvailable,
    /// The network path went away entirely.
    LinkLost,
    /// The path's capabilities changed; `internet` reflects whether general
    /// internet reachability is currently present.
    CapabilityChanged { internet: bool },
}
