// 说明见 s14_can 的 build.rs

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() {
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());
    println!("cargo:rustc-link-search={}", out.display());

    File::create(out.join("memory.x"))
        .unwrap()
        .write_all(include_bytes!("memory.x"))
        .unwrap();

    println!("cargo:rerun-if-changed=memory.x");

    if env::var("TARGET").unwrap().starts_with("thumb") {
        println!("cargo:rustc-link-arg=-Tlink.x");
    }
}
