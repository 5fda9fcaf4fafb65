//! One handler per control-channel verb.

mod acct;
mod allo;
mod appe;
mod auth;
mod cdup;
mod cwd;
mod dele;
mod eprt;
mod epsv;
mod feat;
mod list;
mod mdtm;
mod mkd;
mod nlst;
mod noop;
mod opts;
mod pass;
mod passive_common;
mod pasv;
mod pbsz;
mod port;
mod prot;
mod pwd;
mod quit;
mod retr;
mod rmd;
mod rnfr;
mod rnto;
mod size;
mod stat;
mod stor;
mod stor_common;
mod syst;
mod type_;
mod user;

pub(crate) use acct::Acct;
pub(crate) use allo::Allo;
pub(crate) use appe::Appe;
pub(crate) use auth::Auth;
pub(crate) use cdup::Cdup;
pub(crate) use cwd::Cwd;
pub(crate) use dele::Dele;
pub(crate) use eprt::Eprt;
pub(crate) use epsv::Epsv;
pub(crate) use feat::Feat;
pub(crate) use list::List;
pub(crate) use mdtm::Mdtm;
pub(crate) use mkd::Mkd;
pub(crate) use nlst::Nlst;
pub(crate) use noop::Noop;
pub(crate) use opts::Opts;
pub(crate) use pass::Pass;
pub(crate) use pasv::Pasv;
pub(crate) use pbsz::Pbsz;
pub(crate) use port::Port;
pub(crate) use prot::Prot;
pub(crate) use pwd::Pwd;
pub(crate) use quit::Quit;
pub(crate) use retr::Retr;
pub(crate) use rmd::Rmd;
pub(crate) use rnfr::Rnfr;
pub(crate) use rnto::Rnto;
pub(crate) use size::Size;
pub(crate) use stat::Stat;
pub(crate) use stor::Stor;
pub(crate) use syst::Syst;
pub(crate) use type_::Type;
pub(crate) use user::User;

// The parameter that can be given to the `AUTH` command.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AuthParam {
    Ssl,
    Tls,
}

// The parameter that can be given to the `PROT` command.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProtParam {
    // 'C' - Clear - neither Integrity nor Privacy
    Clear,
    // 'S' - Safe - Integrity without Privacy
    Safe,
    // 'E' - Confidential - Privacy without Integrity
    Confidential,
    // 'P' - Private - Integrity and Privacy
    Private,
}

// The parameter that can be given to the `TYPE` command.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TypeParam {
    Ascii,
    Image,
    Other,
}
