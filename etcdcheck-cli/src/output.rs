///! Plugin output
///!
///! One `<STATUS>: <summary>` line, then the optional detail body. The status
///! also selects the process exit code.

use etcdcheck_common::{Error, Status, Verdict};

/// Render a verdict as plugin text
pub fn render(verdict: &Verdict) -> String {
    match &verdict.detail {
        Some(detail) => format!("{}: {}\n{}", verdict.status, verdict.summary, detail),
        None => format!("{}: {}", verdict.status, verdict.summary),
    }
}

/// Print the verdict and return the exit code for it
pub fn emit(verdict: &Verdict) -> i32 {
    println!("{}", render(verdict));
    verdict.status.exit_code()
}

/// Verdict for a failed run. Known conditions keep their own status;
/// anything else is reported as an UNKNOWN `UnexpectedError`.
pub fn failure(err: &anyhow::Error) -> Verdict {
    match err.downcast_ref::<Error>() {
        Some(err) => Verdict::from_error(err),
        None => Verdict::new(Status::Unknown, format!("UnexpectedError: {:#}", err)),
    }
}

/// Verdict for rejected command-line arguments
pub fn bad_arguments(err: &clap::Error) -> Verdict {
    let rendered = err.to_string();
    let message = rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("invalid arguments");
    let message = message.strip_prefix("error: ").unwrap_or(message);

    Verdict::new(Status::Unknown, format!("Bad arguments (see --help): {}", message))
}
