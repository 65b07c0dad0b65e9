use crate::Compression;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::io::{Read, Write};
use tracing::instrument;

impl Compression {
    /// Put the decode layer for this format in front of `reader`.
    ///
    /// ```
    /// use std::io::{Cursor, Read};
    /// use vexcat_compress::Compression;
    ///
    /// let packed = Compression::Bzip2.compress(b"{}").unwrap();
    /// let mut text = String::new();
    /// Compression::Bzip2.wrap_reader(Cursor::new(packed)).unwrap().read_to_string(&mut text).unwrap();
    /// assert_eq!(text, "{}");
    /// ```
    pub fn wrap_reader<'a, R: Read + Send + 'a>(&self, reader: R) -> Result<Box<dyn Read + Send + 'a>> {
        let reader: Box<dyn Read + Send + 'a> = match self {
            Self::None => Box::new(reader),
            Self::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            Self::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
            #[cfg(feature = "xz")]
            Self::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
            #[cfg(feature = "zstd")]
            Self::Zstd => Box::new(zstd::stream::read::Decoder::new(reader).or_raise(|| ErrorKind::Codec)?),
        };
        Ok(reader)
    }

    /// Decode everything from `reader` into `writer`; returns the decoded size.
    #[instrument(level = "debug", skip(reader, writer), fields(compression = %self))]
    pub fn decompress_stream<'a, R: Read + Send + 'a, W: Write>(&self, reader: R, mut writer: W) -> Result<u64> {
        let mut reader = self.wrap_reader(reader)?;
        std::io::copy(&mut reader, &mut writer).or_raise(|| ErrorKind::Corrupt)
    }

    pub fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len());
        self.decompress_stream(input, &mut output)?;
        Ok(output)
    }

    /// Encode `input` in memory, for staging archives and test fixtures.
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        match self {
            Self::None => output.extend_from_slice(input),
            Self::Bzip2 => finish(
                bzip2::write::BzEncoder::new(&mut output, bzip2::Compression::default()),
                input,
                |encoder| encoder.finish().map(drop),
            )?,
            Self::Gzip => finish(
                flate2::write::GzEncoder::new(&mut output, flate2::Compression::default()),
                input,
                |encoder| encoder.finish().map(drop),
            )?,
            #[cfg(feature = "xz")]
            Self::Xz => finish(xz2::write::XzEncoder::new(&mut output, 6), input, |encoder| {
                encoder.finish().map(drop)
            })?,
            #[cfg(feature = "zstd")]
            Self::Zstd => {
                let encoder = zstd::stream::write::Encoder::new(&mut output, 0).or_raise(|| ErrorKind::Codec)?;
                finish(encoder, input, |encoder| encoder.finish().map(drop))?
            },
        }
        Ok(output)
    }
}

fn finish<W: Write>(mut encoder: W, input: &[u8], done: impl FnOnce(W) -> std::io::Result<()>) -> Result<()> {
    encoder.write_all(input).or_raise(|| ErrorKind::Io)?;
    done(encoder).or_raise(|| ErrorKind::Io)
}
