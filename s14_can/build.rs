// 编译当前 crate 前，需要预先执行的操作
//
// 本文件修改自 https://github.com/rust-embedded/cortex-m-quickstart 仓库，可搭配 cortex-m-rt crate 一同使用
//
// 其它例程的 build.rs 与本文件相同，只是省略了注释

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() {
    // OUT_DIR 为当前这个 build script 存放其生成的文件的目录
    // 一般为 ./taget/<target-platform-triple>/debug/build/<crate-name-with-id>/out
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());
    // 告知编译器，让连接器的搜索目录包含 OUT_DIR
    println!("cargo:rustc-link-search={}", out.display());

    // 在编译 build.rs 时，memory.x 的内容会被注入到 build script 自身的二进制文件中
    // build script 运行时，再将这些数据写入到 OUT_DIR 下的 memory.x 文件中
    File::create(out.join("memory.x"))
        .unwrap()
        .write_all(include_bytes!("memory.x"))
        .unwrap();

    // 仅在 memory.x 修改后，才重新编译和运行 build script
    println!("cargo:rerun-if-changed=memory.x");

    // 只有在编译固件时才使用 cortex-m-rt crate 提供的 link.x
    // 在电脑上执行 cargo check --workspace 之类的命令时，主机的连接器并不认识这个脚本
    if env::var("TARGET").unwrap().starts_with("thumb") {
        println!("cargo:rustc-link-arg=-Tlink.x");
    }
}
