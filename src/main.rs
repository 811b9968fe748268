//! Unwinnability analyzer entry point.

use unwinnable::repl::{self, Options};

fn main() {
    unwinnable::init();

    let options = match Options::from_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    };

    if let Err(error) = repl::run(&options) {
        eprintln!("input error: {error}");
        std::process::exit(1);
    }
}
