use progress_core::logging;
use progress_core::ProgressError;

mod cli;

fn main() {
    // Initialize logging as early as possible; never let it stop the copy.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = cli::run_from_args() {
        eprintln!("progress: {:#}", err);
        let code = err
            .downcast_ref::<ProgressError>()
            .map(ProgressError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
