//! Opens message channels for the session controller.

use crate::error::SignalingError;
use crate::link::ChannelLink;

/// Produces a running [`ChannelLink`] per connection attempt
#[trait_variant::make(ChannelConnector: Send)]
pub trait LocalChannelConnector {
    /// Where this connector points, for logs
    fn endpoint(&self) -> String;

    async fn connect(&self) -> Result<ChannelLink, SignalingError>;
}
