//! Parses a formula from the command line and prints the resulting tree.
//!
//! ```text
//! cargo run --example dump-ast -- 'x^2 + \frac{1}{2}' --json
//! ```

use clap::Parser;

#[derive(Parser)]
#[command(about = "Parse a TeX formula and dump its syntax tree")]
struct Args {
    /// The formula to parse.
    formula: String,

    /// Print the tree as JSON instead of Rust debug output.
    #[arg(long)]
    json: bool,

    /// Degrade unknown commands into error-colored text.
    #[arg(long)]
    lenient: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut settings = textree::Settings::default();
    settings.throw_on_error = !args.lenient;

    match textree::parse_with_settings(&args.formula, &settings) {
        Ok(nodes) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&nodes).expect("serializable tree"));
            } else {
                println!("{:#?}", nodes);
            }
        }
        Err(err) => {
            eprintln!("parse error: {}", err);
            std::process::exit(1);
        }
    }
}
