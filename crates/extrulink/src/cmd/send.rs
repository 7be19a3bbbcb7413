use extrulink_frame::{encode_command, ControlCommand};

use crate::cmd::SendArgs;
use crate::config::BridgeConfig;
use crate::exit::{link_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_sent, OutputFormat, SentCommand};

pub fn run(args: SendArgs, config: &BridgeConfig, format: OutputFormat) -> CliResult<i32> {
    let command = ControlCommand::from(args.command);
    let value = resolve_value(command, args.value)?;
    let link = config.link_settings().command_link();

    let runtime = super::runtime()?;
    runtime.block_on(async {
        let sent = link.send_command(command, value).await;
        link.close().await;
        sent
    })
    .map_err(|err| link_error("send failed", err))?;

    let wire = encode_command(command.id(), value);
    print_sent(
        &SentCommand {
            command: command.name(),
            id: command.id(),
            value,
            endpoint: link.endpoint().to_string(),
            wire: hex::encode(wire),
        },
        &wire,
        format,
    );
    Ok(SUCCESS)
}

fn resolve_value(command: ControlCommand, value: Option<u32>) -> CliResult<u32> {
    value.or(command.default_value()).ok_or_else(|| {
        CliError::new(
            USAGE,
            format!("{} requires a value", command.name()),
        )
    })
}
