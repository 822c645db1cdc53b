use log::info;

fn builder() -> env_logger::Builder {
    use chrono::Utc;
    use std::io::Write;

    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    builder.format(|buf, record| {
        let level_style = buf.default_level_style(record.level());
        writeln!(
            buf,
            "[{} {} {}:{}] {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S%.6f"),
            level_style.value(record.level()),
            record.file().unwrap_or("<unnamed>"),
            record.line().unwrap_or(0),
            &record.args()
        )
    });
    builder
}

pub fn init_log() {
    builder().init();
    info!("env_logger initialized");
}

/// Safe to call from every test, only the first call installs the logger.
pub fn init_test_log() {
    let _ = builder().is_test(true).try_init();
}
