use crate::{
    auth::{Authenticator, RootResolver, UserDetail},
    notification::{DataListener, PresenceListener},
    options::PassiveHost,
    server::{
        chancomms::ControlChanMsg,
        controlchan::{Reply, command::Command, error::ControlChanError},
        datachan::TransferOpts,
        listing::ListingConfig,
        passive::PassivePool,
        session::SharedSession,
    },
    storage::{NameResolver, StorageBackend},
};
use async_trait::async_trait;
use rustls::ServerConfig;
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::mpsc::Sender;

// Common interface for all handlers of `Command`s
#[async_trait]
pub(crate) trait CommandHandler<Storage, User>: Send + Sync
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError>;
}

// Represents arguments passed to a `CommandHandler`
pub(crate) struct CommandContext<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    pub parsed_command: Command,
    pub session: SharedSession<Storage, User>,
    pub authenticator: Arc<dyn Authenticator<User>>,
    pub root_resolver: Arc<dyn RootResolver<User>>,
    pub name_resolver: Arc<dyn NameResolver>,
    pub tls_configured: bool,
    pub tls_config: Option<Arc<ServerConfig>>,
    pub tls_only: bool,
    pub pool: Arc<PassivePool>,
    pub passive_host: PassiveHost,
    pub tx_control_chan: Sender<ControlChanMsg>,
    pub local_addr: SocketAddr,
    pub listing: ListingConfig,
    pub transfer: TransferOpts,
    pub data_listener: Arc<dyn DataListener>,
    pub presence_listener: Arc<dyn PresenceListener>,
    pub logger: slog::Logger,
}
