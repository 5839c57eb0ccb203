use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Where `cargo build --release` in `user/` leaves the init program.
const INIT_ELF: &str = "../user/target/riscv64gc-unknown-none-elf/release/init";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=linker.ld");
    println!("cargo:rerun-if-changed={}", INIT_ELF);
    println!("cargo:rerun-if-env-changed=LOG");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    let os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if arch != "riscv64" || os != "none" {
        // host builds only compile the library and a stub binary
        return;
    }

    println!(
        "cargo:rustc-link-arg-bins=-T{}",
        manifest_dir.join("linker.ld").display()
    );

    // Copy the init ELF next to the generated assembly. Without one the
    // image embeds nothing and boots into the smoke test.
    let elf_file = out_dir.join("init.elf");
    let elf = fs::read(manifest_dir.join(INIT_ELF)).unwrap_or_default();
    if elf.is_empty() {
        println!("cargo:warning=no init program at {}, embedding none", INIT_ELF);
    }
    fs::write(&elf_file, &elf).unwrap();

    // Reference: rCore uses .S assembly file to embed binaries
    let mut f = fs::File::create(out_dir.join("link_init.S")).unwrap();
    writeln!(f, ".section .data.init").unwrap();
    writeln!(f, ".align 3").unwrap();
    writeln!(f, ".global _init_start").unwrap();
    writeln!(f, ".global _init_end").unwrap();
    writeln!(f, "_init_start:").unwrap();
    writeln!(f, ".incbin \"{}\"", elf_file.display()).unwrap();
    writeln!(f, "_init_end:").unwrap();
}
