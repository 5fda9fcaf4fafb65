//! The per-connection control channel event loop: reads commands, runs them
//! through the middleware chain, writes replies, performs AUTH TLS upgrades
//! and drives prepared data transfers in strict sequence with the dialogue.

use crate::auth::{Authenticator, RootResolver, UserDetail};
use crate::notification::{DataListener, PresenceEvent, PresenceListener};
use crate::options::PassiveHost;
use crate::server::chancomms::ControlChanMsg;
use crate::server::controlchan::auth::AuthMiddleware;
use crate::server::controlchan::codecs::FtpCodec;
use crate::server::controlchan::error::{ControlChanError, ControlChanErrorKind};
use crate::server::controlchan::ftps::TlsOnlyMiddleware;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::log::LoggingMiddleware;
use crate::server::controlchan::middleware::ControlChanMiddleware;
use crate::server::controlchan::whitelist::WhitelistMiddleware;
use crate::server::controlchan::{Event, Reply, ReplyCode, commands};
use crate::server::datachan::{DataCommandExecutor, TransferOpts};
use crate::server::io::{ControlStream, PrefixedStream};
use crate::server::listing::ListingConfig;
use crate::server::passive::PassivePool;
use crate::server::session::{DataChan, Session, SharedSession};
use crate::server::tls::FtpsConfig;
use crate::server::{Command, tls};
use crate::storage::StorageBackend;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{Receiver, Sender, channel, error::TryRecvError};
use tokio::sync::{Mutex, oneshot};
use tokio_util::codec::Framed;

pub struct ControlParams<Storage, User>
where
    Storage: StorageBackend<User>,
    User: UserDetail,
{
    pub storage: Storage,
    pub greeting: &'static str,
    pub authenticator: Arc<dyn Authenticator<User>>,
    pub root_resolver: Arc<dyn RootResolver<User>>,
    pub name_resolver: Arc<dyn crate::storage::NameResolver>,
    pub pool: Arc<PassivePool>,
    pub passive_host: PassiveHost,
    pub ftps: FtpsConfig,
    pub tls_only: bool,
    pub allow_unauthorized_tls: bool,
    pub allowed_commands: Option<HashSet<String>>,
    pub listing: ListingConfig,
    pub transfer: TransferOpts,
    pub idle_session_timeout: Duration,
    pub data_listener: Arc<dyn DataListener>,
    pub presence_listener: Arc<dyn PresenceListener>,
    pub logger: slog::Logger,
}

enum LoopAction {
    Incoming(Result<Command, ControlChanError>),
    Upgrade,
    Quit,
    Timeout,
    Disconnected,
}

/// Runs the control channel dialogue for one client until it quits,
/// disconnects, idles out or fails.
pub async fn spawn_control_channel_loop<Storage, User>(params: ControlParams<Storage, User>, tcp_stream: TcpStream) -> Result<(), ControlChanError>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    let local_addr = tcp_stream.local_addr()?;
    let source = tcp_stream.peer_addr()?;
    let logger = params.logger.new(slog::o!("client" => source.to_string()));

    let session: SharedSession<Storage, User> = Arc::new(Mutex::new(Session::new(Arc::new(params.storage), source)));
    let (tx, mut rx): (Sender<ControlChanMsg>, Receiver<ControlChanMsg>) = channel(8);

    {
        let meta = session.lock().await.event_meta();
        params.presence_listener.receive_presence_event(PresenceEvent::Connected, meta).await;
    }

    let mut framed = Framed::new(ControlStream::Plain(tcp_stream), FtpCodec::new());
    framed.send(Reply::new(ReplyCode::ServiceReady, params.greeting)).await?;

    let dispatcher = Dispatcher {
        session: Arc::clone(&session),
        authenticator: Arc::clone(&params.authenticator),
        root_resolver: Arc::clone(&params.root_resolver),
        name_resolver: Arc::clone(&params.name_resolver),
        pool: Arc::clone(&params.pool),
        passive_host: params.passive_host,
        ftps: params.ftps.clone(),
        tls_only: params.tls_only,
        tx: tx.clone(),
        local_addr,
        listing: params.listing.clone(),
        transfer: params.transfer.clone(),
        data_listener: Arc::clone(&params.data_listener),
        presence_listener: Arc::clone(&params.presence_listener),
        logger: logger.clone(),
    };
    let mut chain = LoggingMiddleware {
        logger: logger.clone(),
        sequence_nr: 0,
        next: WhitelistMiddleware {
            allowed: params.allowed_commands.clone(),
            next: TlsOnlyMiddleware {
                session: Arc::clone(&session),
                tls_only: params.tls_only,
                next: AuthMiddleware {
                    session: Arc::clone(&session),
                    next: dispatcher,
                },
            },
        },
    };

    // Commands that arrive while a transfer is running are read but their
    // dispatch waits for the transfer's closing reply.
    let mut deferred: VecDeque<Result<Command, ControlChanError>> = VecDeque::new();

    'outer: loop {
        // Internal messages beat new input: a finished AUTH TLS reply means
        // the next wire bytes are handshake, and a QUIT reply means the
        // session is over.
        loop {
            match rx.try_recv() {
                Ok(ControlChanMsg::ExitControlLoop) => break 'outer,
                Ok(ControlChanMsg::SecureControlChannel) => {
                    framed = match secure_channel(framed, &session, &params.ftps, params.allow_unauthorized_tls, &logger).await {
                        Some(framed) => framed,
                        None => break 'outer,
                    };
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        let action: LoopAction = match deferred.pop_front() {
            Some(item) => LoopAction::Incoming(item),
            None => {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Some(ControlChanMsg::SecureControlChannel) => LoopAction::Upgrade,
                        Some(ControlChanMsg::ExitControlLoop) | None => LoopAction::Quit,
                    },
                    item = framed.next() => match item {
                        Some(item) => LoopAction::Incoming(item),
                        None => LoopAction::Disconnected,
                    },
                    _ = tokio::time::sleep(params.idle_session_timeout) => LoopAction::Timeout,
                }
            }
        };

        let incoming = match action {
            LoopAction::Quit | LoopAction::Disconnected => break,
            LoopAction::Timeout => {
                slog::info!(logger, "Connection timed out");
                let _ = framed
                    .send(Reply::new(ReplyCode::ClosingControlConnection, "Session timed out. Closing control connection"))
                    .await;
                break;
            }
            LoopAction::Upgrade => {
                framed = match secure_channel(framed, &session, &params.ftps, params.allow_unauthorized_tls, &logger).await {
                    Some(framed) => framed,
                    None => break,
                };
                continue;
            }
            LoopAction::Incoming(incoming) => incoming,
        };

        let command = match incoming {
            Ok(command) => command,
            Err(err) => {
                if *err.kind() == ControlChanErrorKind::IoError {
                    slog::warn!(logger, "Control channel IO error: {}", err);
                    break;
                }
                if framed.send(error_reply(&err)).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let reply = match chain.handle(Event::Command(command)).await {
            Ok(reply) => reply,
            Err(err) => {
                slog::warn!(logger, "Event handler chain error: {:?}", err);
                error_reply(&err)
            }
        };
        if framed.send(reply).await.is_err() {
            break;
        }

        // The handler may have prepared a transfer; it starts only now, with
        // the preliminary reply already on the wire, and the closing reply
        // goes out only after the data socket is closed. New commands are
        // queued, not dispatched, until then.
        let job = { session.lock().await.data_job.take() };
        if let Some(job) = job {
            let executor = {
                let session = session.lock().await;
                DataCommandExecutor {
                    storage: Arc::clone(&session.storage),
                    user: Arc::clone(&session.user),
                    listener: Arc::clone(&params.data_listener),
                    username: session.username.clone().unwrap_or_default(),
                    trace_id: session.trace_id(),
                    sequence: session.event_counter(),
                    opts: params.transfer.clone(),
                    logger: logger.clone(),
                }
            };
            let (abort_tx, abort_rx) = oneshot::channel();
            let mut task = tokio::spawn(executor.execute(job, abort_rx));
            let closing_reply = loop {
                tokio::select! {
                    result = &mut task => break match result {
                        Ok(reply) => reply,
                        Err(err) => {
                            slog::error!(logger, "Transfer task failed: {}", err);
                            Reply::new(ReplyCode::LocalError, "Local error")
                        }
                    },
                    item = framed.next() => match item {
                        Some(item) => deferred.push_back(item),
                        None => {
                            // Control channel gone mid-transfer: destroy the
                            // data socket and give up.
                            let _ = abort_tx.send(());
                            let _ = task.await;
                            break 'outer;
                        }
                    },
                }
            };
            if framed.send(closing_reply).await.is_err() {
                break;
            }
        }
    }

    // Teardown: any reserved or live data endpoint goes away with the
    // session.
    {
        let mut session = session.lock().await;
        let chan = session.take_data_chan();
        if !params.transfer.destroy_sockets {
            if let DataChan::PassiveReady(mut stream) = chan {
                let _ = stream.shutdown().await;
            }
        }
        let meta = session.event_meta();
        params.presence_listener.receive_presence_event(PresenceEvent::Disconnected, meta).await;
    }
    slog::info!(logger, "Control connection closed");
    Ok(())
}

// Swaps the plaintext control stream for a TLS one. Bytes the codec already
// buffered are replayed into the handshake. Returning None ends the session;
// a handshake failure never touches other connections.
async fn secure_channel<Storage, User>(
    framed: Framed<ControlStream, FtpCodec>,
    session: &SharedSession<Storage, User>,
    ftps: &FtpsConfig,
    allow_unauthorized: bool,
    logger: &slog::Logger,
) -> Option<Framed<ControlStream, FtpCodec>>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    let config = match ftps.config() {
        Some(config) => config,
        None => {
            slog::error!(logger, "TLS upgrade requested but TLS is not configured");
            return None;
        }
    };
    let parts = framed.into_parts();
    let tcp = match parts.io {
        ControlStream::Plain(tcp) => tcp,
        ControlStream::Tls(_) => {
            slog::error!(logger, "TLS upgrade requested on an already secure channel");
            return None;
        }
    };
    let prefixed = PrefixedStream::new(parts.read_buf.freeze(), tcp);
    match tls::accept(config, prefixed).await {
        Ok((stream, authorized)) => {
            if !authorized && !allow_unauthorized {
                slog::info!(logger, "Closing connection: client certificate missing or not verified");
                return None;
            }
            session.lock().await.cmd_tls = true;
            slog::info!(logger, "Control channel upgraded to TLS");
            Some(Framed::new(ControlStream::Tls(Box::new(stream)), FtpCodec::new()))
        }
        Err(err) => {
            slog::warn!(logger, "TLS handshake on control channel failed: {}", err);
            None
        }
    }
}

fn error_reply(err: &ControlChanError) -> Reply {
    match err.kind() {
        ControlChanErrorKind::Utf8Error => Reply::new(ReplyCode::CommandSyntaxError, "Invalid UTF8 in command"),
        ControlChanErrorKind::InvalidCommand => Reply::new(ReplyCode::ParameterSyntaxError, "Invalid Parameter"),
        ControlChanErrorKind::ControlChannelTimeout => Reply::new(ReplyCode::ClosingControlConnection, "Session timed out. Closing control connection"),
        _ => Reply::new(ReplyCode::LocalError, "Unknown internal server error, please try again later"),
    }
}

// The end of the middleware chain: picks the handler for the parsed command
// and runs it with a fresh context.
struct Dispatcher<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    session: SharedSession<Storage, User>,
    authenticator: Arc<dyn Authenticator<User>>,
    root_resolver: Arc<dyn RootResolver<User>>,
    name_resolver: Arc<dyn crate::storage::NameResolver>,
    pool: Arc<PassivePool>,
    passive_host: PassiveHost,
    ftps: FtpsConfig,
    tls_only: bool,
    tx: Sender<ControlChanMsg>,
    local_addr: std::net::SocketAddr,
    listing: ListingConfig,
    transfer: TransferOpts,
    data_listener: Arc<dyn DataListener>,
    presence_listener: Arc<dyn PresenceListener>,
    logger: slog::Logger,
}

#[async_trait]
impl<Storage, User> ControlChanMiddleware for Dispatcher<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    async fn handle(&mut self, event: Event) -> Result<Reply, ControlChanError> {
        let command = match event {
            Event::Command(command) => command,
            Event::InternalMsg(_) => return Ok(Reply::none()),
        };

        let handler: Box<dyn CommandHandler<Storage, User>> = match &command {
            Command::User { .. } => Box::new(commands::User),
            Command::Pass { .. } => Box::new(commands::Pass),
            Command::Acct => Box::new(commands::Acct),
            Command::Syst => Box::new(commands::Syst),
            Command::Stat { .. } => Box::new(commands::Stat),
            Command::Type { .. } => Box::new(commands::Type),
            Command::Noop => Box::new(commands::Noop),
            Command::Allo => Box::new(commands::Allo),
            Command::Pasv => Box::new(commands::Pasv),
            Command::Epsv => Box::new(commands::Epsv),
            Command::Port { .. } => Box::new(commands::Port),
            Command::Eprt { .. } => Box::new(commands::Eprt),
            Command::Retr { .. } => Box::new(commands::Retr),
            Command::Stor { .. } => Box::new(commands::Stor),
            Command::Appe { .. } => Box::new(commands::Appe),
            Command::List { .. } => Box::new(commands::List),
            Command::Nlst { .. } => Box::new(commands::Nlst),
            Command::Feat => Box::new(commands::Feat),
            Command::Opts { .. } => Box::new(commands::Opts),
            Command::Pwd => Box::new(commands::Pwd),
            Command::Cwd { .. } => Box::new(commands::Cwd),
            Command::Cdup => Box::new(commands::Cdup),
            Command::Dele { .. } => Box::new(commands::Dele),
            Command::Rmd { .. } => Box::new(commands::Rmd),
            Command::Mkd { .. } => Box::new(commands::Mkd),
            Command::Quit => Box::new(commands::Quit),
            Command::Rnfr { .. } => Box::new(commands::Rnfr),
            Command::Rnto { .. } => Box::new(commands::Rnto),
            Command::Auth { .. } => Box::new(commands::Auth),
            Command::Pbsz { .. } => Box::new(commands::Pbsz),
            Command::Prot { .. } => Box::new(commands::Prot),
            Command::Size { .. } => Box::new(commands::Size),
            Command::Mdtm { .. } => Box::new(commands::Mdtm),
            // The whitelist middleware already answered these.
            Command::Other { .. } => return Ok(Reply::new(ReplyCode::CommandNotImplemented, "Command not implemented")),
        };

        let context = CommandContext {
            parsed_command: command,
            session: Arc::clone(&self.session),
            authenticator: Arc::clone(&self.authenticator),
            root_resolver: Arc::clone(&self.root_resolver),
            name_resolver: Arc::clone(&self.name_resolver),
            tls_configured: self.ftps.is_configured(),
            tls_config: self.ftps.config(),
            tls_only: self.tls_only,
            pool: Arc::clone(&self.pool),
            passive_host: self.passive_host,
            tx_control_chan: self.tx.clone(),
            local_addr: self.local_addr,
            listing: self.listing.clone(),
            transfer: self.transfer.clone(),
            data_listener: Arc::clone(&self.data_listener),
            presence_listener: Arc::clone(&self.presence_listener),
            logger: self.logger.clone(),
        };
        handler.handle(context).await
    }
}
