use clap::Parser;
use idgen::{run, Args};

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(&args) {
        Ok(summary) => println!("{summary}"),
        Err(err) => {
            eprintln!("{err:?}");
            std::process::exit(1);
        }
    }
}
