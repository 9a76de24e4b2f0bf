use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("hidlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: hidlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("HIDLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "features: usb={}, async={}, cli=true",
        cfg!(feature = "usb"),
        cfg!(feature = "async")
    );
    println!(
        "packet: {} bytes ({} payload)",
        hidlink_frame::REPORT_SIZE,
        hidlink_frame::DEFAULT_PAYLOAD_SIZE
    );

    Ok(SUCCESS)
}
