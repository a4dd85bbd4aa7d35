use std::io;
use std::time::Duration;

use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("list is closed and drained"))]
    Closed,
    #[snafu(display("no item arrived within {timeout:?}"))]
    Timeout { timeout: Duration },
    #[snafu(display("io error: {source}"))]
    Io { source: io::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
