//! Print the metadata of the built-in nodes as JSON.
//!
//! ```text
//! toolkit-metadata            # every node, sorted by name
//! toolkit-metadata replace    # a single node
//! ```
//!
//! Logging follows `RUST_LOG` (default: `warn`).

use std::process::ExitCode;

use toolkit_sdk::Result;

fn run(node_name: Option<String>) -> Result<String> {
    let registry = toolkit_nodes::registry()?;
    match node_name {
        Some(name) => registry.get_handler(&name)?.get_metadata().to_json_pretty(),
        None => Ok(serde_json::to_string_pretty(&registry.all_metadata())?),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(std::env::args().nth(1)) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
