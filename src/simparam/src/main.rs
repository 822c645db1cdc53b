use log::{error, info};

use simparam::{ArgError, RunConfig};

fn main() {
    logging::init_log();

    let mut run_config = RunConfig::default();
    if let Err(e) = run_config.parse(std::env::args().skip(1)) {
        match &e {
            ArgError::Help(usage) => println!("{}", usage),
            e => error!("{}", e),
        }
        std::process::exit(e.exit_code());
    }

    info!(
        "{} workload(s), gpus: {:?}, mode: {:?}",
        run_config.workload.len(),
        run_config.gpus,
        run_config.mode
    );
    simparam::install(run_config);

    match simparam::config().to_toml() {
        Ok(dump) => print!("{}", dump),
        Err(e) => {
            error!("fail to serialize the configuration: {}", e);
            std::process::exit(2);
        }
    }
}
