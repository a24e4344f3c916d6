use std::time::Duration;

use simcast::demo::{DiscRenderer, MassSpringSim, SimParams};
use simcast_pipeline::{StopHandle, StreamingPipeline};
use tracing::info;

use crate::cmd::StreamArgs;
use crate::exit::{report_code, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_plan, print_report, OutputFormat};
use crate::settings::{Overrides, StreamPlan, StreamSettings};

pub fn run(args: StreamArgs, format: OutputFormat) -> CliResult<i32> {
    let settings = match &args.config {
        Some(path) => StreamSettings::load(path)?,
        None => StreamSettings::default(),
    };
    let flags = Overrides {
        url: args.url,
        width: args.width,
        height: args.height,
        pixel_format: args.pixel_format,
        fps: args.fps,
        frames: args.frames,
        encoder: args.encoder,
        encoder_args: args.encoder_args,
        transport: args.transport,
        control: args.control,
        control_value: args.control_value,
        control_count: args.control_count,
        seed: args.seed,
        bodies: args.bodies,
        realtime: args.realtime,
        write_timeout: args.write_timeout.as_deref().map(parse_duration).transpose()?,
        exit_timeout: args.exit_timeout.as_deref().map(parse_duration).transpose()?,
    };
    let plan = StreamPlan::resolve(settings, flags)?;

    if args.dry_run {
        print_plan(&plan, format);
        return Ok(SUCCESS);
    }

    let mut pipeline = StreamingPipeline::new(plan.pipeline.clone());
    install_ctrlc_handler(pipeline.stop_handle())?;

    info!(
        command = %plan.encoder.command_line(),
        frames = plan.pipeline.max_frames,
        control = %plan.control_summary(),
        "starting stream"
    );

    let mut launcher = plan.encoder.clone();
    let mut sim = MassSpringSim::new(SimParams {
        bodies: plan.bodies,
        ..SimParams::default()
    });
    let mut renderer = DiscRenderer::new(plan.encoder.input);
    let mut policy = plan.control_policy();

    let report = pipeline.run(&mut launcher, &mut sim, &mut renderer, &mut policy);
    print_report(&report, format);
    Ok(report_code(&report))
}

fn install_ctrlc_handler(stop: StopHandle) -> CliResult<()> {
    ctrlc::set_handler(move || stop.request_stop())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
