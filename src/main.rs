use clap::Parser;
use kernel_sbom::KernelSbom;

fn main() {
    let cli = KernelSbom::parse();
    if cli.verbose {
        kernel_sbom::report::set_verbose(true);
    }
    if let Err(e) = cli.run() {
        e.print();
        std::process::exit(1);
    }
}
