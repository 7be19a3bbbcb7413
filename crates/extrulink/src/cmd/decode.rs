use extrulink_frame::decode_hex_frame;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_decoded, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = decode_hex_frame(&args.hex).map_err(|err| frame_error("decode failed", err))?;
    print_decoded(&frame, format);
    Ok(SUCCESS)
}
