use super::{AppState, Delivery};
use crate::protocol::ServerMessage;
use crate::types::*;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Display name must not be empty")]
    EmptyName,

    #[error("Display name '{0}' is already in use")]
    NameTaken(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum KickOutcome {
    Kicked(Participant),
    NotFound,
}

/// Connected participants in registration order, one per connection
#[derive(Debug, Default)]
pub struct Directory {
    entries: Vec<Participant>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) the participant behind `connection_id`.
    ///
    /// Re-registering replaces the previous entry in place. A name held by a
    /// different connection is refused so name lookups stay unambiguous.
    pub fn register(
        &mut self,
        connection_id: &str,
        name: &str,
        role: Role,
    ) -> Result<Participant, DirectoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DirectoryError::EmptyName);
        }
        if self
            .entries
            .iter()
            .any(|p| p.name == name && p.connection_id != connection_id)
        {
            return Err(DirectoryError::NameTaken(name.to_string()));
        }

        let participant = Participant {
            name: name.to_string(),
            role,
            connection_id: connection_id.to_string(),
        };

        match self
            .entries
            .iter_mut()
            .find(|p| p.connection_id == connection_id)
        {
            Some(existing) => *existing = participant.clone(),
            None => self.entries.push(participant.clone()),
        }

        Ok(participant)
    }

    /// Names compare after trimming, the same way `register` stores them
    pub fn find_by_name(&self, name: &str) -> Option<&Participant> {
        let name = name.trim();
        self.entries.iter().find(|p| p.name == name)
    }

    pub fn remove_by_connection(&mut self, connection_id: &str) -> Option<Participant> {
        let index = self
            .entries
            .iter()
            .position(|p| p.connection_id == connection_id)?;
        Some(self.entries.remove(index))
    }

    /// Remove the first participant called `name`; presenters are never kicked
    pub fn kick(&mut self, name: &str) -> KickOutcome {
        let name = name.trim();
        match self
            .entries
            .iter()
            .position(|p| p.name == name && p.role == Role::Participant)
        {
            Some(index) => KickOutcome::Kicked(self.entries.remove(index)),
            None => KickOutcome::NotFound,
        }
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AppState {
    /// Register the user behind a connection and broadcast the new presence list
    pub async fn register_user(
        &self,
        connection_id: &ConnectionId,
        name: &str,
        role: Role,
    ) -> Result<Participant, DirectoryError> {
        let mut directory = self.directory.write().await;
        let participant = directory.register(connection_id, name, role)?;

        tracing::info!(
            "Registered {} as {:?} on connection {}",
            participant.name,
            participant.role,
            connection_id
        );
        self.router
            .broadcast(ServerMessage::UpdateOnlineUsers(directory.participants()))
            .await;

        Ok(participant)
    }

    /// Kick a participant by display name
    pub async fn kick_student(&self, name: &str) -> KickOutcome {
        let mut directory = self.directory.write().await;
        let outcome = directory.kick(name);

        match &outcome {
            KickOutcome::Kicked(participant) => {
                tracing::info!(
                    "Kicked {} (connection {})",
                    participant.name,
                    participant.connection_id
                );
                let delivery = self
                    .router
                    .unicast(&participant.connection_id, ServerMessage::Kicked)
                    .await;
                if delivery != Delivery::Delivered {
                    tracing::debug!("Kick notice for {} not delivered: {:?}", name, delivery);
                }
                self.router
                    .broadcast(ServerMessage::UpdateOnlineUsers(directory.participants()))
                    .await;
            }
            KickOutcome::NotFound => {
                tracing::info!("Kick requested for {}, but no such participant", name);
            }
        }

        outcome
    }

    /// Reconcile state after a connection closed
    pub async fn handle_disconnect(&self, connection_id: &ConnectionId) -> Option<Participant> {
        self.router.disconnect(connection_id).await;

        let mut directory = self.directory.write().await;
        let departed = directory.remove_by_connection(connection_id)?;

        tracing::info!("{} left (connection {})", departed.name, connection_id);
        self.router
            .broadcast(ServerMessage::UpdateOnlineUsers(directory.participants()))
            .await;

        Some(departed)
    }
}
