use std::process;

fn main() {
    if let Err(e) = plugbuild::cli::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
