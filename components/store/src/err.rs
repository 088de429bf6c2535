use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("unsupported store dsn: {dsn}"))]
    UnsupportedStoreDsn {
        #[snafu(implicit)]
        location: Location,
        dsn: String,
    },

    /// Transient or fatal failures inside a concrete map backend. The
    /// namespace layer never retries these; retry policy belongs to the
    /// backend or its caller.
    #[snafu(display("store backend failed"))]
    Backend {
        #[snafu(implicit)]
        location: Location,
        source: std::io::Error,
    },

    #[snafu(display("lock {name} is already held"))]
    LockHeld {
        #[snafu(implicit)]
        location: Location,
        name: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
