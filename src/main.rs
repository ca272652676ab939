pub mod cli;
pub mod scanner;
pub mod schema;
pub mod tree;
pub mod value;

fn main() -> anyhow::Result<()> {
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.run()
}
