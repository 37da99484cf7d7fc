pub mod check;
pub mod probe;
pub mod run;
pub mod test_gate;

// SHARED BUILD DIR FOR test-gate (sudo cargo test LEAVES ROOT-OWNED FILES)
pub const TARGET_DIR: &str = "/tmp/letsched-build";
