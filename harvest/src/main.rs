use colored::Colorize;
use harvest::commands::command_argument_builder;
use harvest::handlers::{
    handle_reset, handle_run, handle_status, handle_visit, init_tracing, print_banner,
};

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    init_tracing(verbose, quiet);

    let result = match chosen_command.subcommand() {
        Some(("run", primary_command)) => handle_run(primary_command).await,
        Some(("visit", primary_command)) => handle_visit(primary_command).await,
        Some(("status", primary_command)) => handle_status(primary_command),
        Some(("reset", primary_command)) => handle_reset(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
