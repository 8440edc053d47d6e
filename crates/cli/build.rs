use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("reddit-epub")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Turn chains of linked Reddit threads into an EPUB")
        .arg(clap::arg!(-t --title <TITLE> "Title of the book").required(true))
        .arg(clap::arg!(<URL> ... "Thread URLs to start each chain from"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(--"cache-dir" <DIR> "Directory for cached responses (default: system temp dir)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"no-cache" "Keep responses in memory for this run only"))
        .arg(clap::arg!(--"max-age" <SECS> "Refetch cached responses older than this many seconds"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds (default: none)"))
        .arg(clap::arg!(--lang <LANG> "Language of the book").default_value("en"))
        .arg(
            clap::arg!(--"on-cycle" <POLICY> "What to do when a chain links back to a visited page")
                .default_value("stop")
                .value_parser(["stop", "fail"]),
        )
        .arg(clap::arg!(-v --verbose ... "More logging (-v debug, -vv trace)"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "reddit-epub", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "reddit-epub", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "reddit-epub", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "reddit-epub", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
