// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version};

fn month_arg() -> Arg {
    Arg::new("month")
        .long("month")
        .help("Month as YYYY-MM")
}

fn actor_arg() -> Arg {
    Arg::new("by")
        .long("by")
        .help("Who performed the action")
}

pub fn build_cli() -> Command {
    Command::new("hearthbook")
        .about("Hearthbook: household ledger reconciliation, net worth and monthly close")
        .version(crate_version!())
        .arg(
            Arg::new("workspace")
                .long("workspace")
                .short('w')
                .global(true)
                .help("Workspace id (defaults to the configured workspace)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print JSON instead of tables"),
        )
        .arg(
            Arg::new("jsonl")
                .long("jsonl")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print one JSON object per line"),
        )
        .subcommand(Command::new("init").about("Create the database and show its location"))
        .subcommand(
            Command::new("tx")
                .about("Ledger transactions")
                .subcommand(
                    Command::new("add")
                        .about("Record a transaction")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_hyphen_values(true)
                                .help("Signed amount; negative is money out"),
                        )
                        .arg(Arg::new("description").long("description"))
                        .arg(Arg::new("account").long("account").required(true))
                        .arg(Arg::new("currency").long("currency"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("direction")
                                .long("direction")
                                .value_parser(["credit", "debit"]),
                        )
                        .arg(Arg::new("id").long("id").help("Explicit id (default: random)"))
                        .arg(
                            Arg::new("transfer")
                                .long("transfer")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(
                            Arg::new("review")
                                .long("review")
                                .action(ArgAction::SetTrue)
                                .help("Flag for review"),
                        ),
                )
                .subcommand(
                    Command::new("list")
                        .about("Ledger, newest first")
                        .arg(month_arg())
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(clap::value_parser!(usize)),
                        ),
                )
                .subcommand(Command::new("review").about("Transactions waiting for review")),
        )
        .subcommand(
            Command::new("transfers")
                .about("Transfer pairing")
                .subcommand(Command::new("review").about("Suggestions, unmatched and paired"))
                .subcommand(
                    Command::new("confirm")
                        .about("Pair an outflow with an inflow")
                        .arg(Arg::new("outflow").long("outflow").required(true))
                        .arg(Arg::new("inflow").long("inflow").required(true)),
                )
                .subcommand(
                    Command::new("confirm-all").about("Accept every current suggestion"),
                )
                .subcommand(
                    Command::new("unpair")
                        .about("Delete a pair")
                        .arg(Arg::new("id").long("id").required(true)),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Monthly reports")
                .subcommand(
                    Command::new("expenses")
                        .about("Spending by category")
                        .arg(month_arg()),
                )
                .subcommand(
                    Command::new("cashflow")
                        .about("Income, spending per category, net")
                        .arg(month_arg()),
                ),
        )
        .subcommand(
            Command::new("asset")
                .about("Assets, liabilities and valuations")
                .subcommand(
                    Command::new("add")
                        .about("Register an asset or liability")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .required(true)
                                .help("e.g. cash, property, pension, mortgage, loan"),
                        )
                        .arg(Arg::new("owner").long("owner"))
                        .arg(Arg::new("currency").long("currency"))
                        .arg(Arg::new("id").long("id")),
                )
                .subcommand(
                    Command::new("value")
                        .about("Record a valuation")
                        .arg(Arg::new("asset").long("asset").help("Asset id"))
                        .arg(
                            Arg::new("name")
                                .long("name")
                                .help("Name for a valuation not linked to an asset"),
                        )
                        .arg(Arg::new("type").long("type"))
                        .arg(
                            Arg::new("value")
                                .long("value")
                                .required(true)
                                .allow_hyphen_values(true),
                        )
                        .arg(Arg::new("currency").long("currency"))
                        .arg(
                            Arg::new("home-value")
                                .long("home-value")
                                .allow_hyphen_values(true),
                        )
                        .arg(Arg::new("fx-rate").long("fx-rate"))
                        .arg(Arg::new("fx-source").long("fx-source"))
                        .arg(
                            Arg::new("at")
                                .long("at")
                                .help("Recorded at (date or timestamp, default now)"),
                        )
                        .arg(Arg::new("notes").long("notes")),
                )
                .subcommand(
                    Command::new("remove-value")
                        .about("Tombstone a valuation")
                        .arg(Arg::new("id").long("id").required(true)),
                )
                .subcommand(
                    Command::new("dispose")
                        .about("Mark an asset disposed")
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(Arg::new("at").long("at").help("Disposal date (default today)")),
                )
                .subcommand(Command::new("overview").about("Latest value per asset"))
                .subcommand(Command::new("networth").about("Monthly net worth series")),
        )
        .subcommand(
            Command::new("close")
                .about("Monthly close")
                .subcommand(
                    Command::new("status")
                        .about("Checklist and totals for a month")
                        .arg(month_arg().required(true)),
                )
                .subcommand(
                    Command::new("close")
                        .about("Freeze a month's totals")
                        .arg(month_arg().required(true))
                        .arg(actor_arg()),
                )
                .subcommand(
                    Command::new("reopen")
                        .about("Reopen a closed month")
                        .arg(month_arg().required(true))
                        .arg(actor_arg()),
                )
                .subcommand(
                    Command::new("history")
                        .about("Stored snapshots")
                        .arg(month_arg()),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("ledger")
                        .about("Export ledger rows")
                        .arg(Arg::new("format").long("format").default_value("csv"))
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Configuration")
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(
                    Command::new("set-currency")
                        .about("Override the home currency for this database")
                        .arg(Arg::new("code").required(true)),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn global_flags_reach_leaf_commands() {
        let m = build_cli().get_matches_from([
            "hearthbook",
            "report",
            "expenses",
            "--month",
            "2024-03",
            "--workspace",
            "home",
            "--json",
        ]);
        let (_, report) = m.subcommand().unwrap();
        let (_, leaf) = report.subcommand().unwrap();
        assert_eq!(leaf.get_one::<String>("workspace").unwrap(), "home");
        assert!(leaf.get_flag("json"));
        assert_eq!(leaf.get_one::<String>("month").unwrap(), "2024-03");
    }

    #[test]
    fn negative_amounts_parse() {
        let m = build_cli().get_matches_from([
            "hearthbook", "tx", "add", "--date", "2024-03-01", "--amount", "-12.50", "--account",
            "Card",
        ]);
        let (_, tx) = m.subcommand().unwrap();
        let (_, add) = tx.subcommand().unwrap();
        assert_eq!(add.get_one::<String>("amount").unwrap(), "-12.50");
    }
}
