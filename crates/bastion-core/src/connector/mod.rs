// SPDX-License-Identifier: Apache-2.0

//! Credentialed connector.
//!
//! Validates a [`ConnectionDescriptor`] against the configured scheme and host
//! allow-lists, then runs a [`Handshake`] bounded by a deadline. The connector
//! keeps no mutable state after construction, so one instance can serve any
//! number of concurrent callers. It never retries; retry policy belongs to
//! the caller.

pub mod descriptor;
pub mod statement;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

pub use descriptor::ConnectionDescriptor;
pub use statement::{SqlValue, Statement};

use crate::config::ConnectorConfig;
use crate::error::ConnectionError;
use crate::users::NewUser;

/// The step that actually opens a session with the datastore.
///
/// A real driver implements this; the connector only decides whether the
/// handshake may run and how long it may take.
#[async_trait]
pub trait Handshake: Send + Sync {
    /// Opens a session for `descriptor`.
    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<(), ConnectionError>;
}

/// Handshake that succeeds immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptHandshake;

#[async_trait]
impl Handshake for AcceptHandshake {
    async fn open(&self, _descriptor: &ConnectionDescriptor) -> Result<(), ConnectionError> {
        Ok(())
    }
}

/// Lifecycle state of a [`ConnectionHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// The handle is usable.
    Connected,
    /// The handle has been closed.
    Closed,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Closed => write!(f, "closed"),
        }
    }
}

/// An open connection, owned exclusively by the caller.
#[derive(Debug, Serialize)]
pub struct ConnectionHandle {
    id: Uuid,
    scheme: String,
    host: String,
    status: ConnectionStatus,
    opened_at: DateTime<Utc>,
}

impl ConnectionHandle {
    fn open(descriptor: &ConnectionDescriptor) -> Self {
        Self {
            id: Uuid::new_v4(),
            scheme: descriptor.scheme().to_string(),
            host: descriptor.host().to_string(),
            status: ConnectionStatus::Connected,
            opened_at: Utc::now(),
        }
    }

    /// Unique handle identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Scheme of the descriptor this handle was opened with.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host this handle is connected to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// When the handshake completed.
    #[must_use]
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Closes the handle. Closing twice is a no-op.
    pub fn close(&mut self) -> ConnectionStatus {
        if self.status == ConnectionStatus::Connected {
            debug!(id = %self.id, host = %self.host, "Closing connection");
            self.status = ConnectionStatus::Closed;
        }
        self.status
    }

    /// Prepares a parameterised statement on this connection.
    pub fn prepare(&self, sql: &str, params: Vec<SqlValue>) -> Result<Statement, ConnectionError> {
        if self.status == ConnectionStatus::Closed {
            return Err(ConnectionError::Closed);
        }
        Statement::new(sql, params)
    }

    /// Looks up one user by id.
    pub fn user_lookup(&self, id: i64) -> Result<Statement, ConnectionError> {
        self.prepare(
            "SELECT id, name, email FROM users WHERE id = ?1",
            vec![id.into()],
        )
    }

    /// Inserts a validated user.
    pub fn user_insert(&self, user: &NewUser) -> Result<Statement, ConnectionError> {
        self.prepare(
            "INSERT INTO users (name, email) VALUES (?1, ?2)",
            vec![user.name().into(), user.email().into()],
        )
    }
}

/// Validates descriptors and opens connections to allow-listed hosts.
pub struct Connector {
    config: ConnectorConfig,
    handshake: Arc<dyn Handshake>,
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Connector {
    /// Creates a connector with the default [`AcceptHandshake`].
    #[must_use]
    pub fn new(config: &ConnectorConfig) -> Self {
        Self::with_handshake(config, Arc::new(AcceptHandshake))
    }

    /// Creates a connector with a custom handshake.
    #[must_use]
    pub fn with_handshake(config: &ConnectorConfig, handshake: Arc<dyn Handshake>) -> Self {
        Self {
            config: config.clone(),
            handshake,
        }
    }

    /// Connects using the configured timeout as the deadline.
    ///
    /// # Errors
    ///
    /// See [`Connector::connect_descriptor`].
    #[instrument(skip_all)]
    pub async fn connect(&self, descriptor: &str) -> Result<ConnectionHandle, ConnectionError> {
        let deadline = Instant::now() + self.config.connect_timeout();
        self.connect_until(descriptor, deadline).await
    }

    /// Connects, giving up once `deadline` passes.
    ///
    /// # Errors
    ///
    /// See [`Connector::connect_descriptor`].
    pub async fn connect_until(
        &self,
        descriptor: &str,
        deadline: Instant,
    ) -> Result<ConnectionHandle, ConnectionError> {
        let descriptor = ConnectionDescriptor::parse(descriptor)?;
        self.connect_descriptor(&descriptor, deadline).await
    }

    /// Connects with an already-built descriptor.
    ///
    /// Checks run in order and stop at the first failure; nothing touches the
    /// network before the allow-lists pass.
    ///
    /// # Errors
    ///
    /// - `InvalidDescriptor` if the scheme is not allowed
    /// - `ConnectionRefused` if the host is not allowed
    /// - `Timeout` if `deadline` has passed or passes during the handshake
    /// - whatever the handshake itself reports
    #[instrument(skip_all, fields(scheme = %descriptor.scheme(), host = %descriptor.host()))]
    pub async fn connect_descriptor(
        &self,
        descriptor: &ConnectionDescriptor,
        deadline: Instant,
    ) -> Result<ConnectionHandle, ConnectionError> {
        if !self.config.is_scheme_allowed(descriptor.scheme()) {
            return Err(ConnectionError::InvalidDescriptor {
                reason: format!("scheme '{}' is not allowed", descriptor.scheme()),
            });
        }

        if !self.config.is_host_allowed(descriptor.host()) {
            warn!("Refusing connection to host outside the allow-list");
            return Err(ConnectionError::ConnectionRefused {
                host: descriptor.host().to_string(),
            });
        }

        let started = Instant::now();
        if started >= deadline {
            return Err(ConnectionError::Timeout { elapsed_ms: 0 });
        }

        // Dropping the handshake future on expiry cancels it.
        match tokio::time::timeout_at(deadline, self.handshake.open(descriptor)).await {
            Ok(Ok(())) => {
                let handle = ConnectionHandle::open(descriptor);
                debug!(id = %handle.id(), "Connection established");
                Ok(handle)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                #[allow(clippy::cast_possible_truncation)]
                let elapsed_ms = started.elapsed().as_millis() as u64;
                warn!(elapsed_ms, "Connection handshake timed out");
                Err(ConnectionError::Timeout { elapsed_ms })
            }
        }
    }
}
