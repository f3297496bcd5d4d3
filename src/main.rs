use clap::Parser;
use privacytool::cli::{Cli, Command, RemoveMetadataArgs, SecureDeleteArgs};
use privacytool::progress::EraseEvent;
use privacytool::{output, CancelToken, ErasureReport, MetadataDispatcher, Overwriter, StripError, TreeEraser};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// At least one node failed, or the run was cancelled.
const EXIT_FAILURES: u8 = 1;
/// The target could not be processed at all.
const EXIT_PRECONDITION: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Command::SecureDelete(args) => run_secure_delete(&args),
        Command::RemoveMetadata(args) => run_remove_metadata(&args),
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|e| {
            output::print_warning(&format!("invalid log level {level:?} ({e}), using warn"));
            EnvFilter::new("warn")
        }),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_secure_delete(args: &SecureDeleteArgs) -> ExitCode {
    let options = match args.options() {
        Ok(options) => options,
        Err(e) => {
            output::print_error(&e.to_string());
            return ExitCode::from(EXIT_PRECONDITION);
        }
    };
    let sink = |event: &EraseEvent<'_>| output::print_event(event);

    let report = match (&args.file, &args.dir) {
        (Some(path), _) => {
            let result = Overwriter::local(options).erase_with(path, &sink);
            ErasureReport::single(path, result)
        }
        (None, Some(dir)) => {
            let cancel = CancelToken::new();
            install_interrupt_handler(&cancel);
            match TreeEraser::local(options)
                .with_cancel(cancel)
                .erase_tree_with(dir, &sink)
            {
                Ok(report) => report,
                Err(e) => {
                    output::print_error(&e.to_string());
                    return ExitCode::from(EXIT_PRECONDITION);
                }
            }
        }
        // clap requires exactly one of --file / --dir
        (None, None) => return ExitCode::from(EXIT_PRECONDITION),
    };

    if args.json {
        if let Err(e) = output::print_json(&report) {
            output::print_error(&format!("cannot encode report: {e}"));
        }
    } else {
        output::print_summary(&report);
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILURES)
    }
}

/// First Ctrl-C stops after the node in flight; a second one exits at once.
fn install_interrupt_handler(cancel: &CancelToken) {
    let cancel = cancel.clone();
    let result = ctrlc::set_handler(move || {
        if cancel.is_cancelled() {
            std::process::exit(130);
        }
        output::print_warning("interrupted, finishing the current entry");
        cancel.cancel();
    });
    if let Err(e) = result {
        warn!(error = %e, "could not install Ctrl-C handler");
    }
}

fn run_remove_metadata(args: &RemoveMetadataArgs) -> ExitCode {
    let dispatcher = MetadataDispatcher::default();

    if args.list_formats {
        output::print_formats(dispatcher.table());
        return ExitCode::SUCCESS;
    }
    let Some(file) = args.file.as_deref() else {
        output::print_error("please provide a file path using --file or -f");
        return ExitCode::from(EXIT_PRECONDITION);
    };

    match dispatcher.strip_metadata(file, args.output.as_deref()) {
        Ok(written) => {
            output::print_stripped(&written);
            ExitCode::SUCCESS
        }
        Err(e @ StripError::UnsupportedFormat { .. }) => {
            output::print_error(&e.to_string());
            output::print_supported(dispatcher.table());
            ExitCode::from(EXIT_PRECONDITION)
        }
        Err(e) => {
            output::print_error(&e.to_string());
            ExitCode::from(EXIT_FAILURES)
        }
    }
}
