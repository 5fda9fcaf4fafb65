//! Contains the [`Server`] and [`ServerBuilder`] that are used to configure
//! and run an FTP server instance.

pub mod error;
pub mod options;

use self::error::{ServerError, ServerErrorKind};
use self::options::{FilenameSortFunc, FilenameSortMap, FtpsClientAuth, PassiveHost, TlsFlags};
use crate::auth::{AnonymousAuthenticator, Authenticator, DefaultRootResolver, DefaultUser, RootResolver, UserDetail};
use crate::notification::{DataListener, PresenceListener, nop::NopListener};
use crate::server::controlchan::{ControlParams, spawn_control_channel_loop};
use crate::server::datachan::TransferOpts;
use crate::server::listing::ListingConfig;
use crate::server::passive::PassivePool;
use crate::server::tls::{self, FtpsConfig};
use crate::storage::{NameResolver, StaticNameResolver, StorageBackend};

use slog::Drain;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, ToSocketAddrs};

/// An instance of an FTP(S) server. It aggregates an
/// [`Authenticator`](crate::auth::Authenticator) implementation that will be
/// used for authentication and a
/// [`StorageBackend`](crate::storage::StorageBackend) implementation that
/// will be used as the virtual file system.
///
/// The server can be started with the [`listen`](Server::listen) method.
///
/// # Example
///
/// ```no_run
/// use ftpserve::Server;
///
/// #[tokio::main]
/// async fn main() {
///     let server = Server::with_fs("/srv/ftp").build().unwrap();
///     server.listen("127.0.0.1:2121").await.unwrap();
/// }
/// ```
pub struct Server<Storage, User>
where
    Storage: StorageBackend<User>,
    User: UserDetail,
{
    storage: Arc<dyn (Fn() -> Storage) + Send + Sync>,
    greeting: &'static str,
    authenticator: Arc<dyn Authenticator<User>>,
    root_resolver: Arc<dyn RootResolver<User>>,
    name_resolver: Arc<dyn NameResolver>,
    passive_ports: RangeInclusive<u16>,
    passive_host: PassiveHost,
    ftps: FtpsConfig,
    tls_only: bool,
    allow_unauthorized_tls: bool,
    allowed_commands: Option<HashSet<String>>,
    listing: ListingConfig,
    transfer: TransferOpts,
    idle_session_timeout: Duration,
    data_listener: Arc<dyn DataListener>,
    presence_listener: Arc<dyn PresenceListener>,
    logger: slog::Logger,
}

/// Used to create [`Server`]s.
pub struct ServerBuilder<Storage, User>
where
    Storage: StorageBackend<User>,
    User: UserDetail,
{
    storage: Arc<dyn (Fn() -> Storage) + Send + Sync>,
    greeting: &'static str,
    authenticator: Arc<dyn Authenticator<User>>,
    root_resolver: Arc<dyn RootResolver<User>>,
    name_resolver: Arc<dyn NameResolver>,
    passive_ports: RangeInclusive<u16>,
    passive_host: PassiveHost,
    ftps_certs_file: Option<PathBuf>,
    ftps_key_file: Option<PathBuf>,
    ftps_client_auth: FtpsClientAuth,
    ftps_trust_store: PathBuf,
    ftps_tls_flags: TlsFlags,
    tls_only: bool,
    allow_unauthorized_tls: bool,
    allowed_commands: Option<Vec<String>>,
    use_read_file: bool,
    use_write_file: bool,
    upload_max_slurp_size: usize,
    max_stats_at_once: usize,
    hide_dot_files: bool,
    dont_sort_filenames: bool,
    filename_sort_map: Option<Arc<FilenameSortMap>>,
    filename_sort_func: Option<Arc<FilenameSortFunc>>,
    destroy_sockets: bool,
    idle_session_timeout: Duration,
    data_listener: Arc<dyn DataListener>,
    presence_listener: Arc<dyn PresenceListener>,
    logger: slog::Logger,
}

impl Server<crate::storage::Filesystem, DefaultUser> {
    /// Shorthand for a server over a local directory tree with anonymous
    /// authentication. Returns a [`ServerBuilder`] for further configuration.
    pub fn with_fs<P: Into<PathBuf>>(root: P) -> ServerBuilder<crate::storage::Filesystem, DefaultUser> {
        let root = root.into();
        ServerBuilder::new(Box::new(move || crate::storage::Filesystem::new(root.clone())))
    }
}

impl<Storage> ServerBuilder<Storage, DefaultUser>
where
    Storage: StorageBackend<DefaultUser> + 'static,
{
    /// Construct a new [`ServerBuilder`] with the given
    /// [`StorageBackend`] generator and an
    /// [`AnonymousAuthenticator`](crate::auth::AnonymousAuthenticator).
    pub fn new(sbe_generator: Box<dyn (Fn() -> Storage) + Send + Sync>) -> Self {
        Self::with_authenticator(sbe_generator, Arc::new(AnonymousAuthenticator {}))
    }
}

impl<Storage, User> ServerBuilder<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    /// Construct a new [`ServerBuilder`] with the given [`StorageBackend`]
    /// generator and [`Authenticator`]. The other parameters are set to
    /// defaults.
    pub fn with_authenticator(sbe_generator: Box<dyn (Fn() -> Storage) + Send + Sync>, authenticator: Arc<dyn Authenticator<User>>) -> Self {
        ServerBuilder {
            storage: Arc::from(sbe_generator),
            greeting: options::DEFAULT_GREETING,
            authenticator,
            root_resolver: Arc::new(DefaultRootResolver {}),
            name_resolver: Arc::new(StaticNameResolver {}),
            passive_ports: options::DEFAULT_PASSIVE_PORTS,
            passive_host: options::DEFAULT_PASSIVE_HOST,
            ftps_certs_file: None,
            ftps_key_file: None,
            ftps_client_auth: FtpsClientAuth::default(),
            ftps_trust_store: options::DEFAULT_FTPS_TRUST_STORE.into(),
            ftps_tls_flags: TlsFlags::default(),
            tls_only: false,
            allow_unauthorized_tls: false,
            allowed_commands: None,
            use_read_file: false,
            use_write_file: false,
            upload_max_slurp_size: 0,
            max_stats_at_once: options::DEFAULT_MAX_STATS_AT_ONCE,
            hide_dot_files: false,
            dont_sort_filenames: false,
            filename_sort_map: None,
            filename_sort_func: None,
            destroy_sockets: false,
            idle_session_timeout: Duration::from_secs(options::DEFAULT_IDLE_SESSION_TIMEOUT_SECS),
            data_listener: Arc::new(NopListener {}),
            presence_listener: Arc::new(NopListener {}),
            logger: slog::Logger::root(slog_stdlog::StdLog {}.fuse(), slog::o!()),
        }
    }

    /// Sets the greeting that is sent when a client connects.
    pub fn greeting(mut self, greeting: &'static str) -> Self {
        self.greeting = greeting;
        self
    }

    /// Replaces the [`Authenticator`].
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator<User>>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Sets the [`RootResolver`] that determines each user's filesystem root
    /// and initial working directory at login time.
    pub fn root_resolver(mut self, resolver: Arc<dyn RootResolver<User>>) -> Self {
        self.root_resolver = resolver;
        self
    }

    /// Sets the [`NameResolver`] used to turn uid/gid numbers into the names
    /// shown in directory listings.
    pub fn name_resolver(mut self, resolver: Arc<dyn NameResolver>) -> Self {
        self.name_resolver = resolver;
        self
    }

    /// Sets the range of passive ports that we'll use for passive
    /// connections.
    pub fn passive_ports(mut self, range: RangeInclusive<u16>) -> Self {
        self.passive_ports = range;
        self
    }

    /// Specifies how the IP address that we advertise in PASV replies is
    /// determined.
    pub fn passive_host<H: Into<PassiveHost>>(mut self, host: H) -> Self {
        self.passive_host = host.into();
        self
    }

    /// Configures the server to be able to accept TLS connections (AUTH TLS
    /// and PROT P), using the certificate chain and private key in the given
    /// PEM files.
    pub fn ftps<P: Into<PathBuf>>(mut self, certs_file: P, key_file: P) -> Self {
        self.ftps_certs_file = Some(certs_file.into());
        self.ftps_key_file = Some(key_file.into());
        self
    }

    /// Tells if and how client certificates are requested during the TLS
    /// handshake.
    pub fn ftps_client_auth<C: Into<FtpsClientAuth>>(mut self, auth: C) -> Self {
        self.ftps_client_auth = auth.into();
        self
    }

    /// Sets the PEM file with the trust anchors used to validate client
    /// certificates.
    pub fn ftps_trust_store<P: Into<PathBuf>>(mut self, trust_store: P) -> Self {
        self.ftps_trust_store = trust_store.into();
        self
    }

    /// Chooses the enabled TLS protocol versions.
    pub fn ftps_tls_flags(mut self, flags: TlsFlags) -> Self {
        self.ftps_tls_flags = flags;
        self
    }

    /// When enabled, clients must upgrade to TLS before they can log in or
    /// do anything else; plaintext commands are refused with a 522.
    pub fn tls_only(mut self, tls_only: bool) -> Self {
        self.tls_only = tls_only;
        self
    }

    /// When client certificates are requested but the peer's certificate did
    /// not verify, accept the connection anyway.
    pub fn allow_unauthorized_tls(mut self, allow: bool) -> Self {
        self.allow_unauthorized_tls = allow;
        self
    }

    /// Restricts the command set to the given verbs; anything else is
    /// answered with a 502.
    pub fn allowed_commands(mut self, verbs: Vec<String>) -> Self {
        self.allowed_commands = Some(verbs);
        self
    }

    /// Makes RETR read the whole file into memory and send it in one write
    /// instead of streaming it.
    pub fn use_read_file(mut self, on: bool) -> Self {
        self.use_read_file = on;
        self
    }

    /// Makes STOR/APPE buffer the upload in memory and store it with a
    /// single write, falling back to streaming past
    /// [`upload_max_slurp_size`](ServerBuilder::upload_max_slurp_size).
    pub fn use_write_file(mut self, on: bool) -> Self {
        self.use_write_file = on;
        self
    }

    /// The largest upload that will be buffered whole in memory when
    /// [`use_write_file`](ServerBuilder::use_write_file) is on; 0 means no
    /// limit.
    pub fn upload_max_slurp_size(mut self, bytes: usize) -> Self {
        self.upload_max_slurp_size = bytes;
        self
    }

    /// Bounds how many stat and name-lookup calls a single listing keeps in
    /// flight.
    pub fn max_stats_at_once(mut self, max: usize) -> Self {
        self.max_stats_at_once = max;
        self
    }

    /// Hides names starting with a dot from listings.
    pub fn hide_dot_files(mut self, hide: bool) -> Self {
        self.hide_dot_files = hide;
        self
    }

    /// Leaves listings in the order the storage backend returned them.
    pub fn dont_sort_filenames(mut self, dont: bool) -> Self {
        self.dont_sort_filenames = dont;
        self
    }

    /// Replaces the key the default listing comparator sorts on.
    pub fn filename_sort_map(mut self, map: Arc<FilenameSortMap>) -> Self {
        self.filename_sort_map = Some(map);
        self
    }

    /// Replaces the listing comparator altogether.
    pub fn filename_sort_func(mut self, func: Arc<FilenameSortFunc>) -> Self {
        self.filename_sort_func = Some(func);
        self
    }

    /// When set, sockets of a dying session are dropped without a graceful
    /// shutdown.
    pub fn destroy_sockets(mut self, destroy: bool) -> Self {
        self.destroy_sockets = destroy;
        self
    }

    /// Closes a session after it has been idle this long.
    pub fn idle_session_timeout(mut self, timeout: Duration) -> Self {
        self.idle_session_timeout = timeout;
        self
    }

    /// Registers a listener for transfer and storage-mutation events.
    pub fn notify_data(mut self, listener: Arc<dyn DataListener>) -> Self {
        self.data_listener = listener;
        self
    }

    /// Registers a listener for connect/login/logout events.
    pub fn notify_presence(mut self, listener: Arc<dyn PresenceListener>) -> Self {
        self.presence_listener = listener;
        self
    }

    /// Sets the logger that all connections and the passive pool log to.
    pub fn logger(mut self, logger: slog::Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Finalizes the options and creates the [`Server`]; fails when the TLS
    /// material cannot be loaded or the configuration is contradictory.
    pub fn build(self) -> Result<Server<Storage, User>, ServerError> {
        let ftps = match (&self.ftps_certs_file, &self.ftps_key_file) {
            (Some(certs), Some(key)) => {
                let config = tls::new_config(certs, key, self.ftps_tls_flags, self.ftps_client_auth, &self.ftps_trust_store)
                    .map_err(|e| ServerError::with_source(ServerErrorKind::TlsConfig, e))?;
                FtpsConfig::On { tls_config: config }
            }
            (None, None) => FtpsConfig::Off,
            _ => return Err(ServerError::new(ServerErrorKind::Config)),
        };
        if self.tls_only && !ftps.is_configured() {
            return Err(ServerError::new(ServerErrorKind::Config));
        }
        if self.passive_ports.is_empty() {
            return Err(ServerError::new(ServerErrorKind::Config));
        }

        Ok(Server {
            storage: self.storage,
            greeting: self.greeting,
            authenticator: self.authenticator,
            root_resolver: self.root_resolver,
            name_resolver: self.name_resolver,
            passive_ports: self.passive_ports,
            passive_host: self.passive_host,
            ftps,
            tls_only: self.tls_only,
            allow_unauthorized_tls: self.allow_unauthorized_tls,
            allowed_commands: self
                .allowed_commands
                .map(|verbs| verbs.into_iter().map(|v| v.trim().to_uppercase()).collect()),
            listing: ListingConfig {
                hide_dot_files: self.hide_dot_files,
                max_stats_at_once: self.max_stats_at_once,
                dont_sort_filenames: self.dont_sort_filenames,
                filename_sort_map: self.filename_sort_map,
                filename_sort_func: self.filename_sort_func,
            },
            transfer: TransferOpts {
                use_read_file: self.use_read_file,
                use_write_file: self.use_write_file,
                upload_max_slurp_size: self.upload_max_slurp_size,
                destroy_sockets: self.destroy_sockets,
            },
            idle_session_timeout: self.idle_session_timeout,
            data_listener: self.data_listener,
            presence_listener: self.presence_listener,
            logger: self.logger,
        })
    }
}

impl<Storage, User> Server<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    /// Starts accepting and serving control connections on the given
    /// address. One passive listener pool, bound to the same interface,
    /// serves every session.
    pub async fn listen<A: ToSocketAddrs>(&self, bind_address: A) -> Result<(), ServerError> {
        let listener = TcpListener::bind(bind_address)
            .await
            .map_err(|e| ServerError::with_source(ServerErrorKind::Bind, e))?;
        let local_addr = listener.local_addr().map_err(|e| ServerError::with_source(ServerErrorKind::Bind, e))?;
        let pool = Arc::new(PassivePool::new(local_addr.ip(), self.passive_ports.clone(), self.logger.clone()));
        slog::info!(self.logger, "Listening"; "address" => %local_addr);

        loop {
            let (tcp_stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    slog::warn!(self.logger, "Failed to accept control connection: {}", err);
                    continue;
                }
            };
            // FTP dialogues are short request/reply lines; Nagle only adds
            // latency here.
            if let Err(err) = tcp_stream.set_nodelay(true) {
                slog::warn!(self.logger, "Could not disable Nagle on {}: {}", peer, err);
            }

            let params = ControlParams {
                storage: (self.storage)(),
                greeting: self.greeting,
                authenticator: Arc::clone(&self.authenticator),
                root_resolver: Arc::clone(&self.root_resolver),
                name_resolver: Arc::clone(&self.name_resolver),
                pool: Arc::clone(&pool),
                passive_host: self.passive_host,
                ftps: self.ftps.clone(),
                tls_only: self.tls_only,
                allow_unauthorized_tls: self.allow_unauthorized_tls,
                allowed_commands: self.allowed_commands.clone(),
                listing: self.listing.clone(),
                transfer: self.transfer.clone(),
                idle_session_timeout: self.idle_session_timeout,
                data_listener: Arc::clone(&self.data_listener),
                presence_listener: Arc::clone(&self.presence_listener),
                logger: self.logger.clone(),
            };
            let logger = self.logger.clone();
            tokio::spawn(async move {
                if let Err(err) = spawn_control_channel_loop(params, tcp_stream).await {
                    slog::warn!(logger, "Control channel loop ended with error: {}", err);
                }
            });
        }
    }
}
