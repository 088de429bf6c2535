use bytes::Bytes;
use snafu::{ensure, Location, ResultExt, Snafu};

use crate::file::ChunkedFile;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("failed to encode file for the store"))]
    Encode {
        #[snafu(implicit)]
        location: Location,
        source: bincode::Error,
    },

    #[snafu(display("failed to decode file fetched from the store"))]
    Decode {
        #[snafu(implicit)]
        location: Location,
        source: bincode::Error,
    },

    #[snafu(display("store entry is corrupt: {reason}"))]
    CorruptEntry {
        #[snafu(implicit)]
        location: Location,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Serialization seam between the namespace and the cluster map. The only
/// contract is exact round-trip of the (length, size_in_bytes, chunk run)
/// triple; anything the concrete codec adds on the wire is its own business.
pub trait FileCodec: Send + Sync + 'static {
    fn encode(&self, file: &ChunkedFile) -> Result<Bytes>;
    fn decode(&self, buf: &[u8]) -> Result<ChunkedFile>;
}

/// Default codec: bincode over the `ChunkedFile` serde layout, which writes
/// the fields in declaration order and length-prefixes every chunk.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeCodec;

impl FileCodec for BincodeCodec {
    fn encode(&self, file: &ChunkedFile) -> Result<Bytes> {
        let buf = bincode::serialize(file).context(EncodeSnafu)?;
        Ok(Bytes::from(buf))
    }

    fn decode(&self, buf: &[u8]) -> Result<ChunkedFile> {
        let file: ChunkedFile = bincode::deserialize(buf).context(DecodeSnafu)?;
        validate(&file)?;
        Ok(file)
    }
}

// Entries come back from a remote map; a decoded file that violates the
// size accounting would let a bogus length drive the reader's chunk
// arithmetic out of the allocated chunks.
fn validate(file: &ChunkedFile) -> Result<()> {
    let capacity: u64 = (0..file.chunk_count())
        .map(|idx| file.chunk(idx).len() as u64)
        .sum();
    ensure!(
        capacity == file.size_in_bytes(),
        CorruptEntrySnafu {
            reason: format!(
                "size_in_bytes {} does not match chunk capacity {}",
                file.size_in_bytes(),
                capacity
            ),
        }
    );
    ensure!(
        file.length() <= file.size_in_bytes(),
        CorruptEntrySnafu {
            reason: format!(
                "length {} exceeds allocated capacity {}",
                file.length(),
                file.size_in_bytes()
            ),
        }
    );
    Ok(())
}
