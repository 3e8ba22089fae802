//! User-facing notifications.

use std::net::SocketAddr;

use tracing::info;

/// Receives short messages meant for the player's on-screen queue.
pub trait Notifier {
    /// Show `message`.
    fn notify(&mut self, message: &str);
}

/// Collects messages; handy for frontends that render a queue later.
impl Notifier for Vec<String> {
    fn notify(&mut self, message: &str) {
        self.push(message.to_owned());
    }
}

/// Forwards messages to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, message: &str) {
        info!(target: "netreplay::notify", "{message}");
    }
}

/// Announce an accepted peer.
pub(crate) fn log_connection(
    notifier: &mut dyn Notifier,
    addr: Option<SocketAddr>,
    slot: u32,
    nick: &str,
) {
    let msg = match addr {
        Some(addr) => {
            info!(%addr, slot, nick, "peer connected");
            format!("Got connection from: \"{nick} ({})\" (#{slot})", addr.ip())
        }
        None => {
            info!(slot, nick, "peer connected (address unknown)");
            format!("Got connection from: \"{nick}\" (#{slot})")
        }
    };
    notifier.notify(&msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_message_format() {
        let mut messages = Vec::new();
        log_connection(&mut messages, Some("10.0.0.2:1234".parse().unwrap()), 0, "bob");
        assert_eq!(messages, vec!["Got connection from: \"bob (10.0.0.2)\" (#0)"]);
    }

    #[test]
    fn unknown_address_announced_without_ip() {
        let mut messages: Vec<String> = Vec::new();
        log_connection(&mut messages, None, 2, "bob");
        assert_eq!(messages, vec!["Got connection from: \"bob\" (#2)"]);
    }
}
