//! cpubench CLI entry point.

fn main() {
    if let Err(e) = cpubench_cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
