//! Send the channel opener ("new promotions today").

use tracing::info;

use crate::channel::Channel;
use crate::dispatch::send_greeting;
use crate::error::Result;

/// Post `greeting` to the channel. An empty greeting is a no-op.
pub async fn run(channel: &dyn Channel, greeting: &str) -> Result<bool> {
    let sent = send_greeting(channel, greeting).await?;
    if sent {
        info!("Greeting sent");
    }
    Ok(sent)
}
