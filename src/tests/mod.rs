mod test_assigner;
mod test_kernels;
mod test_laplacian;
mod test_operators;
mod test_precision;

/// Route `log` output through the test harness; safe to call from every test.
pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
