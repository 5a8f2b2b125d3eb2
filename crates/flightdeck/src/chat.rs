//! Chat lines and slash commands.
//!
//! A line starting with `/` is a command and is never relayed as text.
//! The only command is `/spectate`:
//!
//! | Input              | Effect                                      |
//! |--------------------|---------------------------------------------|
//! | `/spectate 7`      | spectate the player with id 7               |
//! | `/spectate bo`     | spectate the one player whose name starts with "bo" |
//! | `/spectate`        | stop spectating                             |
//!
//! Targets are only ever players in the game; spectators cannot be
//! spectated. Every failure is answered privately in red.

use flightdeck_protocol::{ChatMessage, Codec, Color, DisconnectReason, PlayerId, ServerMessage};
use flightdeck_transport::{PeerId, Transport};

use crate::SessionServer;
use crate::dispatch::fault;

/// A chat line after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Ordinary text, relayed to everyone.
    PlainMessage(String),
    SpectateByName(String),
    /// Any integer argument. Values outside the id range name nobody.
    SpectateById(i64),
    StopSpectating,
    /// A slash command nobody knows. Dropped without a reply.
    Unrecognized(String),
}

impl ChatCommand {
    /// Parses an already trimmed line.
    ///
    /// An integer argument is always an id, so a player named "12" can
    /// only be spectated by id.
    pub fn parse(line: &str) -> Self {
        let Some(command) = line.strip_prefix('/') else {
            return Self::PlainMessage(line.to_owned());
        };
        let (word, arg) = match command.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (command, ""),
        };
        if !word.eq_ignore_ascii_case("spectate") {
            return Self::Unrecognized(word.to_owned());
        }
        if arg.is_empty() {
            Self::StopSpectating
        } else if let Ok(id) = arg.parse::<i64>() {
            Self::SpectateById(id)
        } else {
            Self::SpectateByName(arg.to_owned())
        }
    }
}

/// Trims `text` and caps it at `max_chars` characters. `None` if nothing
/// is left.
pub fn sanitize(text: &str, max_chars: usize) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max_chars).collect())
}

impl<T: Transport, C: Codec> SessionServer<T, C> {
    pub(crate) fn handle_chat(
        &mut self,
        peer: PeerId,
        chat: ChatMessage,
    ) -> Result<(), DisconnectReason> {
        let Some(line) = sanitize(&chat.text, self.config.max_chat_len) else {
            tracing::debug!(%peer, "empty chat line dropped");
            return Ok(());
        };

        match ChatCommand::parse(&line) {
            ChatCommand::PlainMessage(text) => self.relay_chat(peer, text),
            ChatCommand::SpectateById(id) => {
                let target = u32::try_from(id)
                    .ok()
                    .and_then(|id| self.players.by_id(PlayerId(id)))
                    .filter(|p| !p.is_spectating())
                    .map(|p| p.id())
                    .ok_or_else(|| format!("no player with id {id}"));
                self.spectate(peer, target)
            }
            ChatCommand::SpectateByName(prefix) => {
                let target = match self.players.find_by_name_prefix(&prefix).as_slice() {
                    [] => Err(format!("no player with name starting with '{prefix}'")),
                    [only] => Ok(only.id()),
                    many => Err(format!(
                        "{} players match '{prefix}', be more specific or use /spectate <id>",
                        many.len()
                    )),
                };
                self.spectate(peer, target)
            }
            ChatCommand::StopSpectating => {
                self.stop_spectating(peer);
                Ok(())
            }
            ChatCommand::Unrecognized(word) => {
                tracing::debug!(%peer, command = %word, "unrecognized chat command ignored");
                Ok(())
            }
        }
    }

    fn relay_chat(&mut self, peer: PeerId, text: String) -> Result<(), DisconnectReason> {
        let Some(sender) = self.players.get(peer) else {
            return Ok(());
        };
        let msg = ServerMessage::Chat(ChatMessage::from_player(sender.name(), text));
        let everyone = self.players.peers();
        self.send_to_many(&everyone, &msg)
            .map_err(|e| fault(peer, e))
    }

    /// Points `peer` at a resolved target, or tells it why not.
    fn spectate(
        &mut self,
        peer: PeerId,
        target: Result<PlayerId, String>,
    ) -> Result<(), DisconnectReason> {
        let target = match target {
            Ok(target) => target,
            Err(reason) => return self.reply(peer, Color::RED, reason),
        };
        let Some(player) = self.players.get_mut(peer) else {
            return Ok(());
        };
        if player.spectate(target).is_err() {
            return self.reply(peer, Color::RED, "you cannot spectate yourself".to_owned());
        }
        tracing::debug!(%peer, target_id = %target, "now spectating");

        let name = self
            .players
            .by_id(target)
            .map(|p| p.name().to_owned())
            .unwrap_or_default();
        self.reply(peer, Color::YELLOW, format!("now spectating {name}"))
    }

    /// A server line only `peer` sees.
    fn reply(&mut self, peer: PeerId, color: Color, text: String) -> Result<(), DisconnectReason> {
        self.send_to(peer, &ServerMessage::Chat(ChatMessage::system(color, text)))
            .map_err(|e| fault(peer, e))
    }
}
