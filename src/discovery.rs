//! Service discovery - finding the remote channel to dial.
//!
//! Discovery is an external collaborator: how a channel is located (SDP
//! lookup, `sdptool` parsing, brute-force channel scan) is the resolver's
//! own business, including any internal retries. The core only sees the two
//! outcomes: a channel number, or
//! [`LinkError::ServiceNotFound`](crate::error::LinkError::ServiceNotFound).
//!
//! Resolution failure is a configuration problem for the operator. It is
//! performed by the caller before entering the reconnect loop and is never
//! retried automatically by the core.

use std::future::Future;

use crate::error::Result;

/// Resolves a remote address to an RFCOMM channel number.
pub trait ChannelResolver: Send {
    /// Find the service channel on `address`.
    ///
    /// # Errors
    ///
    /// [`LinkError::ServiceNotFound`](crate::error::LinkError::ServiceNotFound)
    /// when the device does not expose the service.
    fn find_channel(&self, address: &str) -> impl Future<Output = Result<u8>> + Send;
}

/// A resolver that always answers with a preconfigured channel.
///
/// Used when the operator pins the channel explicitly instead of relying on
/// discovery.
#[derive(Debug, Clone, Copy)]
pub struct FixedChannel(pub u8);

impl ChannelResolver for FixedChannel {
    async fn find_channel(&self, _address: &str) -> Result<u8> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_channel_ignores_address() {
        let resolver = FixedChannel(5);
        assert_eq!(resolver.find_channel("AA:BB:CC:DD:EE:FF").await.unwrap(), 5);
        assert_eq!(resolver.find_channel("anything").await.unwrap(), 5);
    }
}
