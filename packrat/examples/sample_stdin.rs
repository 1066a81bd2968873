use packrat::runtime::Setting;
use packrat::sample::parse_sample_with;
use std::io::{self, Read};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    // Read the sample
    let mut buffer = vec![];
    io::stdin()
        .read_to_end(&mut buffer)
        .expect("Failed to read from STDIN");

    // Trace evaluation steps when logging is enabled at the trace level
    let settings = vec![
        Setting::Memoize(true),
        Setting::Debug(log::log_enabled!(log::Level::Trace)),
    ];

    match parse_sample_with(0, &buffer, settings) {
        Ok(tokens) => {
            for token in tokens {
                if token.is_keyword {
                    println!("keyword    {}", token.value);
                } else {
                    println!("identifier {}", token.value);
                }
            }

            ExitCode::SUCCESS
        }
        Err(diagnostics) => {
            eprintln!("{}", diagnostics);
            ExitCode::FAILURE
        }
    }
}
