use simparam::RunConfig;

#[test]
fn same_store_everywhere() {
    let here = simparam::instance() as *const _ as usize;
    let there = std::thread::spawn(|| simparam::instance() as *const _ as usize)
        .join()
        .unwrap();
    assert_eq!(here, there);
    assert!(std::ptr::eq(simparam::instance(), simparam::instance()));
}

#[test]
fn install_parsed_config() {
    let mut cfg = RunConfig::default();
    cfg.parse(vec!["-w", "gpt_13b.txt", "-g", "32", "-g_p_s", "8"])
        .unwrap();
    simparam::install(cfg.clone());

    let stored = simparam::config();
    assert_eq!(*stored, cfg);
    assert_eq!(stored.network.node_num, 4 + 128 + 32);
}
