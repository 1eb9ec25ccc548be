use std::sync::Once;

static INIT: Once = Once::new();

/// Route `log` output through the test harness. Safe to call from every test.
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}
