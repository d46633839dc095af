//! Compiler fuzz target: feed arbitrary text to the script compiler and the
//! highlighter. Neither may panic; the compiler returns Ok(bytes) or a CompileError.
//! Build with: cargo fuzz run compile_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let config = hexwriter::Config::default().with_max_depth(8);
    if let Ok(compiler) = hexwriter::Compiler::new(config) {
        let _ = compiler.compile(s);
    }
    if let Ok(highlighter) = hexwriter::Highlighter::new() {
        let _ = highlighter.highlight(s);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run compile_fuzz");
}
