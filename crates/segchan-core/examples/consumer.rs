//! Message consumer - attaches to the producer's channel, reads one message
//! and tears the named objects down.
//!
//! Usage:
//! ```bash
//! cargo run --example consumer
//! ```

use segchan_core::Channel;

const NAME: &str = "/segchan_demo";
const WSEM: &str = "/segchan_demo_w";
const RSEM: &str = "/segchan_demo_r";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut chan = Channel::open(NAME, WSEM, RSEM)?;
    let msg = chan.recv()?;
    println!(
        "Received {} bytes: {}",
        msg.len(),
        String::from_utf8_lossy(&msg)
    );

    drop(chan);
    Channel::close(NAME, WSEM, RSEM);
    Ok(())
}
