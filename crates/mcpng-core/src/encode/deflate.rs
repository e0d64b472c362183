//! zlib stream compression.

use miniz_oxide::deflate::core::{
    compress, create_comp_flags_from_zip_params, CompressorOxide, TDEFLFlush, TDEFLStatus,
};

use super::params::Strategy;
use super::EncodeError;

/// Window size in bits; positive means a zlib header and Adler-32 trailer.
const ZLIB_WINDOW_BITS: i32 = 15;

/// Compress `data` into a zlib stream.
///
/// The compressor state is created and dropped inside this call.
pub fn zlib_compress(data: &[u8], level: u8, strategy: Strategy) -> Result<Vec<u8>, EncodeError> {
    let flags = create_comp_flags_from_zip_params(i32::from(level), ZLIB_WINDOW_BITS, strategy.code());
    let mut compressor = CompressorOxide::new(flags);

    // The output grows by reallocation; a short first guess is fine.
    let mut output = vec![0u8; (data.len() / 2).max(64)];
    let mut out_pos = 0;
    let mut input = data;

    loop {
        let (status, bytes_in, bytes_out) = compress(
            &mut compressor,
            input,
            &mut output[out_pos..],
            TDEFLFlush::Finish,
        );
        out_pos += bytes_out;

        match status {
            TDEFLStatus::Done => {
                output.truncate(out_pos);
                return Ok(output);
            }
            TDEFLStatus::Okay if bytes_in <= input.len() => {
                input = &input[bytes_in..];
                if output.len() - out_pos < 64 {
                    let grown = output.len() * 2;
                    output.resize(grown, 0);
                }
            }
            other => {
                return Err(EncodeError::Deflate(format!(
                    "compressor stopped with status {other:?}"
                )));
            }
        }
    }
}
