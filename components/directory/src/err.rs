use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("file not found: {name}"))]
    FileNotFound {
        #[snafu(implicit)]
        location: Location,
        name: String,
    },

    #[snafu(display("read past EOF: {resource} (position {position}, length {length})"))]
    ReadPastEof {
        #[snafu(implicit)]
        location: Location,
        resource: String,
        position: u64,
        length: u64,
    },

    #[snafu(display(
        "slice {description} out of bounds: offset {offset} + len {len} > length {length}"
    ))]
    SliceOutOfBounds {
        #[snafu(implicit)]
        location: Location,
        description: String,
        offset: u64,
        len: u64,
        length: u64,
    },

    #[snafu(display("writer was created with checksumming disabled"))]
    ChecksumDisabled {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("file too large for a reader: {resource} length {length}"))]
    FileTooLarge {
        #[snafu(implicit)]
        location: Location,
        resource: String,
        length: u64,
    },

    #[snafu(display("namespace is closed"))]
    DirectoryClosed {
        #[snafu(implicit)]
        location: Location,
    },

    StoreError {
        source: kura_store::Error,
    },

    CodecError {
        source: kura_types::codec::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<kura_store::Error> for Error {
    fn from(value: kura_store::Error) -> Self {
        Self::StoreError { source: value }
    }
}

impl From<kura_types::codec::Error> for Error {
    fn from(value: kura_types::codec::Error) -> Self {
        Self::CodecError { source: value }
    }
}
