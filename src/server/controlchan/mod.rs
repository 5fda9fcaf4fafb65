//! Contains code pertaining to the FTP *control* channel

pub mod command;
pub(crate) use command::Command;

pub(crate) mod handler;

pub(crate) mod control_loop;
pub(crate) use control_loop::{ControlParams, spawn_control_channel_loop};

pub(crate) mod commands;

pub(crate) mod event;
pub(crate) use event::Event;

pub(crate) mod codecs;
pub(crate) use codecs::FtpCodec;

mod line_parser;

pub(crate) mod reply;
pub(crate) use reply::{Reply, ReplyCode};

mod error;
pub(crate) use error::{ControlChanError, ControlChanErrorKind};

pub(crate) mod middleware;
pub(crate) use middleware::ControlChanMiddleware;

pub(crate) mod auth;
pub(crate) mod ftps;
pub(crate) mod log;
pub(crate) mod whitelist;
