//! Message producer - creates the channel and stages one message.
//!
//! The message is a single chunk, so `send` returns before any consumer
//! attaches; the named objects keep it available until the consumer runs.
//!
//! Usage:
//! ```bash
//! cargo run --example producer
//! cargo run --example consumer
//! ```

use segchan_core::Channel;

const NAME: &str = "/segchan_demo";
const WSEM: &str = "/segchan_demo_w";
const RSEM: &str = "/segchan_demo_r";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut chan = Channel::create(NAME, WSEM, RSEM)?;
    let msg = b"Hello from producer! This went through shared memory.";
    chan.send(msg)?;

    println!("Staged {} bytes on {}", msg.len(), NAME);
    println!("Run the consumer example to pick it up.");
    Ok(())
}
