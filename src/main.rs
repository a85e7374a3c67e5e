use cardinal_rs::cli::args::Cli;
use cardinal_rs::cli::dispatch::handle;
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    handle(cli);
}
